/// Deploy-action kinds a daemon can accept.
pub mod deploy_kind {
    /// Containers provisioned through the Docker Engine API.
    pub const DOCKER_INSTALL: &str = "docker-install";

    /// ExApps started by an operator; metadata is supplied as JSON.
    pub const MANUAL_INSTALL: &str = "manual-install";
}

/// Environment variables an ExApp container declares about itself.
pub mod env {
    /// Version of the orchestrator API the ExApp was built against.
    pub const AA_VERSION: &str = "AA_VERSION";

    /// Shared secret used to authenticate callbacks in both directions.
    pub const APP_SECRET: &str = "APP_SECRET";

    pub const APP_ID: &str = "APP_ID";
    pub const APP_DISPLAY_NAME: &str = "APP_DISPLAY_NAME";
    pub const APP_VERSION: &str = "APP_VERSION";

    /// `http` or `https`.
    pub const APP_PROTOCOL: &str = "APP_PROTOCOL";

    /// Listen address inside the container. Not used for reachability.
    pub const APP_HOST: &str = "APP_HOST";
    pub const APP_PORT: &str = "APP_PORT";

    /// Optional; the ExApp runs without a bound end-user context.
    pub const IS_SYSTEM_APP: &str = "IS_SYSTEM_APP";

    /// Base URL of the platform the ExApp calls back into.
    pub const PLATFORM_URL: &str = "PLATFORM_URL";

    /// Every key the resolver keeps; anything else in the container
    /// environment is ignored.
    pub const RECOGNIZED: &[&str] = &[
        AA_VERSION,
        APP_SECRET,
        APP_ID,
        APP_DISPLAY_NAME,
        APP_VERSION,
        APP_PROTOCOL,
        APP_HOST,
        APP_PORT,
        IS_SYSTEM_APP,
        PLATFORM_URL,
    ];

    /// Keys that must be present for a container-based resolution.
    pub const REQUIRED: &[&str] = &[
        AA_VERSION,
        APP_SECRET,
        APP_ID,
        APP_DISPLAY_NAME,
        APP_VERSION,
        APP_PROTOCOL,
        APP_PORT,
        PLATFORM_URL,
    ];

    /// Format a `KEY=VALUE` entry.
    #[must_use]
    pub fn entry(key: &str, value: &str) -> String {
        format!("{key}={value}")
    }
}

/// Headers carried by authenticated callbacks to and from ExApps.
pub mod headers {
    /// `base64("<user>:<secret>")`; the user is empty for system calls.
    pub const AUTHORIZATION_APP_API: &str = "AUTHORIZATION-APP-API";
    pub const EX_APP_ID: &str = "EX-APP-ID";
    pub const EX_APP_VERSION: &str = "EX-APP-VERSION";
    pub const AA_VERSION: &str = "AA-VERSION";
}

/// Routes every ExApp serves.
pub mod routes {
    pub const SCOPES: &str = "/scopes";
    pub const ENABLED: &str = "/enabled";
    pub const HEARTBEAT: &str = "/heartbeat";
}
