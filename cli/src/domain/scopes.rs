//! Scope-group normalization and display names.

use std::collections::HashSet;

use exapp_common::{ScopeGroup, ScopeRequest};

/// Known scope groups and the names shown to operators.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("basic", "Basic access"),
    ("system", "System"),
    ("files", "Files"),
    ("files:read", "Read files"),
    ("files:write", "Write files"),
    ("files_sharing", "File sharing"),
    ("user_info", "User information"),
    ("user_status", "User status"),
    ("notifications", "Notifications"),
    ("weather_status", "Weather status"),
    ("talk", "Talk"),
    ("talk_bot", "Talk bots"),
    ("ai_providers", "AI providers"),
    ("activities", "Activities"),
    ("all", "All"),
];

/// Which half of a [`ScopeRequest`] a confirmation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePartition {
    Required,
    Optional,
}

impl std::fmt::Display for ScopePartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Required => "required",
            Self::Optional => "optional",
        })
    }
}

/// Drop blanks and duplicates, keeping first-seen order. A group listed in
/// both partitions is only kept as required.
#[must_use]
pub fn normalize(request: ScopeRequest) -> ScopeRequest {
    let mut seen = HashSet::new();
    let mut keep = |groups: Vec<ScopeGroup>| -> Vec<ScopeGroup> {
        groups
            .into_iter()
            .map(|g| ScopeGroup::new(g.as_str().trim()))
            .filter(|g| !g.as_str().is_empty() && seen.insert(g.clone()))
            .collect()
    };
    let required = keep(request.required);
    let optional = keep(request.optional);
    ScopeRequest { required, optional }
}

/// Human-readable name of a scope group. Unknown ids are returned verbatim.
#[must_use]
pub fn display_name(group: &ScopeGroup) -> &str {
    DISPLAY_NAMES
        .iter()
        .find(|(id, _)| *id == group.as_str())
        .map_or(group.as_str(), |(_, name)| name)
}

/// Display names for `groups`, in the same order.
#[must_use]
pub fn map_to_display_names(groups: &[ScopeGroup]) -> Vec<String> {
    groups.iter().map(|g| display_name(g).to_string()).collect()
}
