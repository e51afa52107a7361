use thiserror::Error;

/// Deployment error taxonomy. Classification decides what the retry wrapper
/// does with a failure: only `Transient` is retried, everything else halts
/// the failing step immediately.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing or invalid settings. Raised before any remote call.
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential rejected by the dashboard.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A named entity (template, inventory device) is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// More than one inventory device matched a role. Never auto-resolved.
    #[error("ambiguous inventory: {0}")]
    AmbiguousInventory(String),

    /// Duplicate network without reuse, or a device claimed elsewhere.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit or server-side failure. Retried with backoff up to the
    /// attempt ceiling, then surfaced as-is.
    #[error("transient API error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Transient { status: Option<u16>, message: String },

    /// External cancellation or run deadline. Treated as a failed run with
    /// no rollback.
    #[error("run cancelled")]
    Cancelled,
}

impl DeployError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::AmbiguousInventory(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn transient(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transient {
            status,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Network-level failures (connect, timeout) have no response status and are
/// assumed transient.
impl From<reqwest::Error> for DeployError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transient {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

pub type DeployResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DeployError::transient(Some(429), "rate limited").is_transient());
        assert!(DeployError::transient(None, "connection reset").is_transient());
        assert!(!DeployError::conflict("network exists").is_transient());
        assert!(!DeployError::not_found("template 'Branch'").is_transient());
        assert!(!DeployError::Cancelled.is_transient());
    }

    #[test]
    fn test_display_includes_status() {
        let e = DeployError::transient(Some(503), "upstream unavailable");
        assert_eq!(e.to_string(), "transient API error (503): upstream unavailable");
        let e = DeployError::transient(None, "timed out");
        assert_eq!(e.to_string(), "transient API error: timed out");
    }
}
