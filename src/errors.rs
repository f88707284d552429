use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum RelayError {
    // Inbound frame errors
    #[error("Failed to parse frame: {message}")]
    Parse { message: String },

    #[error("Missing or invalid field '{field}'")]
    MissingField { field: &'static str },

    // Outbound errors
    #[error("Failed to serialize response: {message}")]
    Serialization { message: String },

    #[error("Outbound queue for connection '{connection_id}' is closed")]
    ChannelClosed { connection_id: String },

    #[error("WebSocket error: {message}")]
    WebSocket { message: String },

    // Bootstrap errors
    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ParseFailure,
    SendFailure,
    Fatal,
}

impl RelayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::Parse { .. } | RelayError::MissingField { .. } => {
                ErrorCategory::ParseFailure
            }

            RelayError::Serialization { .. }
            | RelayError::ChannelClosed { .. }
            | RelayError::WebSocket { .. } => ErrorCategory::SendFailure,

            RelayError::Io { .. } | RelayError::Config { .. } => ErrorCategory::Fatal,
        }
    }

    /// Only bootstrap failures may stop the process; everything else is dropped locally.
    pub fn is_fatal(&self) -> bool {
        matches!(self.category(), ErrorCategory::Fatal)
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Parse {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Io {
            message: err.to_string(),
        }
    }
}

impl From<tungstenite::Error> for RelayError {
    fn from(err: tungstenite::Error) -> Self {
        RelayError::WebSocket {
            message: err.to_string(),
        }
    }
}
