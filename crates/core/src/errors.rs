use thiserror::Error;

/// Unified error type for the entire confirmation-manager-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote / Network ────────────────────────────────────────────
    #[error("Request to {endpoint} failed: {status} {reason}")]
    Transport {
        endpoint: String,
        status: u16,
        reason: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered `success: false`. The message is shown verbatim.
    #[error("{0}")]
    Rejected(String),

    // ── Data shape ──────────────────────────────────────────────────
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Local ───────────────────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Coarse classification used by the shell to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure or non-2xx status.
    Transport,
    /// The backend declared the operation failed.
    Application,
    /// A payload did not have the expected shape.
    DataShape,
    /// Local configuration, file or validation problem.
    Local,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Transport { .. } | CoreError::Network(_) => ErrorKind::Transport,
            CoreError::Rejected(_) => ErrorKind::Application,
            CoreError::Deserialization(_) => ErrorKind::DataShape,
            CoreError::FileIO(_) | CoreError::Config(_) | CoreError::ValidationError(_) => {
                ErrorKind::Local
            }
        }
    }

    /// Text for a blocking notification after a user-initiated action.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Rejected(message) => format!("Operation failed: {message}"),
            other => format!("Error: {other}"),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return CoreError::Transport {
                endpoint: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            };
        }
        if e.is_decode() {
            return CoreError::Deserialization(e.to_string());
        }
        // Strip query parameters so URLs in messages never carry request data.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
