//! Error types for the triage run.
//!
//! Transport and input failures are fatal and abort the run. Dispatch
//! failures are isolated to a single reply and only reported.

/// A request to the mail service failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

/// Sending one reply failed. The run continues with the next reply.
#[derive(Debug, thiserror::Error)]
#[error("Error sending reply to {recipient} (Message-ID {in_reply_to}): {source}")]
pub struct DispatchError {
    pub recipient: String,
    pub in_reply_to: String,
    #[source]
    pub source: TransportError,
}

/// The operator can no longer be asked for confirmation.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Unable to read confirmation from console: {0}")]
    Io(#[from] std::io::Error),

    #[error("Console input closed while waiting for confirmation")]
    Closed,
}

/// Invalid settings, detected before any network work starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required flag --{0}")]
    MissingRequired(&'static str),

    #[error("Invalid {flag} {value:?}: expected YYYY/MM/DD")]
    InvalidDate { flag: &'static str, value: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Errors that end a triage run.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Mail service error: {0}")]
    Transport(#[from] TransportError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Mail service returned an empty operator address")]
    EmptyOperatorAddress,
}
