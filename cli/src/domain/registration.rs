//! Registration saga states, stages and outcome types.

use std::fmt;

use exapp_common::ScopeGroup;
use serde::Serialize;
use thiserror::Error;

/// Where a registration run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    Unregistered,
    MetadataResolved,
    Persisted,
    ScopesFetched,
    RequiredApproved,
    RequiredRejected,
    OptionalApplied,
    Enabled,
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unregistered => "unregistered",
            Self::MetadataResolved => "metadata_resolved",
            Self::Persisted => "persisted",
            Self::ScopesFetched => "scopes_fetched",
            Self::RequiredApproved => "required_approved",
            Self::RequiredRejected => "required_rejected",
            Self::OptionalApplied => "optional_applied",
            Self::Enabled => "enabled",
        })
    }
}

/// A step of the registration saga that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStage {
    CheckExisting,
    ResolveMetadata,
    Persist,
    ApplySystemFlag,
    FetchScopes,
    ConfirmScopes,
    RegisterScopes,
    Enable,
}

/// Action that undoes the effects of earlier stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compensation {
    UnregisterApp,
}

impl SagaStage {
    /// What must run when this stage fails. Nothing is persisted before
    /// [`SagaStage::Persist`] succeeds, so earlier stages need no undo.
    #[must_use]
    pub fn compensation(self) -> Option<Compensation> {
        match self {
            Self::CheckExisting | Self::ResolveMetadata | Self::Persist => None,
            Self::ApplySystemFlag
            | Self::FetchScopes
            | Self::ConfirmScopes
            | Self::RegisterScopes
            | Self::Enable => Some(Compensation::UnregisterApp),
        }
    }
}

impl fmt::Display for SagaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CheckExisting => "check-existing",
            Self::ResolveMetadata => "resolve-metadata",
            Self::Persist => "persist",
            Self::ApplySystemFlag => "apply-system-flag",
            Self::FetchScopes => "fetch-scopes",
            Self::ConfirmScopes => "confirm-scopes",
            Self::RegisterScopes => "register-scopes",
            Self::Enable => "enable",
        })
    }
}

/// A scope group that could not be granted. Never fatal.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeGrantFailure {
    pub group: ScopeGroup,
    pub reason: String,
}

/// Outcome of a successful registration run.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReport {
    pub appid: String,
    pub final_state: RegistrationState,
    pub trace: Vec<RegistrationState>,
    pub granted: Vec<ScopeGroup>,
    pub failed_grants: Vec<ScopeGrantFailure>,
    /// Optional groups declined during confirmation.
    pub skipped_optional: Vec<ScopeGroup>,
    pub enabled: bool,
}

/// Why a registration run did not complete.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("ExApp '{0}' is already registered.")]
    AlreadyRegistered(String),

    #[error("Registration of '{appid}' failed at {stage}{}: {cause:#}", rollback_note(.rolled_back))]
    Failed {
        appid: String,
        stage: SagaStage,
        cause: anyhow::Error,
        rolled_back: bool,
        trace: Vec<RegistrationState>,
    },

    /// The compensating unregister failed and a record was left behind.
    #[error(
        "Registration of '{appid}' failed at {stage}: {cause:#}. Rolling back also failed ({rollback:#}); remove the record with: exapp unregister {appid}"
    )]
    Inconsistent {
        appid: String,
        stage: SagaStage,
        cause: anyhow::Error,
        rollback: anyhow::Error,
        trace: Vec<RegistrationState>,
    },
}

fn rollback_note(rolled_back: &bool) -> &'static str {
    if *rolled_back { " (rolled back)" } else { "" }
}

impl RegistrationError {
    /// Stage that failed, if the run got past the existence check.
    #[must_use]
    pub fn stage(&self) -> Option<SagaStage> {
        match self {
            Self::AlreadyRegistered(_) => None,
            Self::Failed { stage, .. } | Self::Inconsistent { stage, .. } => Some(*stage),
        }
    }

    #[must_use]
    pub fn trace(&self) -> &[RegistrationState] {
        match self {
            Self::AlreadyRegistered(_) => &[],
            Self::Failed { trace, .. } | Self::Inconsistent { trace, .. } => trace,
        }
    }
}
