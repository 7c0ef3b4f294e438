use thiserror::Error;

/// All errors produced by the Eco-Village Monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The vendor rejected the credentials, or the login exchange failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The vendor API could not be reached at all.
    #[error(
        "Cannot reach the Emporia API at {endpoint}: {reason}. \
         Run with --demo to explore the dashboard with simulated data."
    )]
    Unreachable { endpoint: String, reason: String },

    /// Usage history for a single resident could not be fetched.
    #[error("Failed to fetch usage for {resident}: {reason}")]
    ResidentFetch { resident: String, reason: String },

    /// The text-generation service failed or returned an unusable reply.
    #[error("Text generation failed: {0}")]
    Service(String),

    /// An operation that needs a logged-in session was called without one.
    #[error("Not logged in")]
    NotAuthenticated,

    /// Login was attempted while a session is already active.
    #[error("A session is already active; log out first")]
    SessionActive,

    /// A request failed in transit for a reason other than an unreachable host.
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The vendor API answered with an unexpected HTTP status.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Writing the CSV export failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MonitorError {
    /// `true` for errors that belong on the login screen and stop the user
    /// from reaching the dashboard. Everything else degrades gracefully.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Unreachable { .. })
    }
}

/// Convenience alias used throughout the monitor crates.
pub type Result<T> = std::result::Result<T, MonitorError>;
