//! Application service: scope negotiation with an ExApp.

use exapp_common::{ExAppInfo, ScopeGroup, ScopeRequest};

use crate::application::ports::ExAppClient;
use crate::domain::error::NegotiationError;
use crate::domain::scopes::{self, normalize};

/// Ask the ExApp which scope groups it needs. Duplicates are removed and a
/// group listed in both partitions counts as required.
///
/// # Errors
///
/// Returns an error if the callback fails, answers with a non-2xx status or
/// an undecodable body. There is no retry.
pub async fn fetch_requested(
    client: &impl ExAppClient,
    app: &ExAppInfo,
) -> Result<ScopeRequest, NegotiationError> {
    let request = normalize(client.fetch_scopes(app).await?);
    tracing::debug!(
        appid = %app.appid,
        required = request.required.len(),
        optional = request.optional.len(),
        "fetched requested scopes"
    );
    Ok(request)
}

/// Display names for prompts and reports, in request order.
#[must_use]
pub fn map_to_display_names(groups: &[ScopeGroup]) -> Vec<String> {
    scopes::map_to_display_names(groups)
}
