//! Error types for keyplan.

use thiserror::Error;

/// Result type alias using keyplan's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for keyplan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (credentials, settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The metrics provider reported a failure for a task
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Text generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Request scheduler is unavailable or gave up on a task
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl Error {
    /// Whether the failure came from an external collaborator call rather than local state.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Provider(_) | Error::Request(_) | Error::Inference(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("Missing DataForSEO credentials.".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing DataForSEO credentials."
        );
    }

    #[test]
    fn test_error_display_provider() {
        let err = Error::Provider("task error: Invalid Field".to_string());
        assert_eq!(err.to_string(), "Provider error: task error: Invalid Field");
    }

    #[test]
    fn test_error_display_scheduler() {
        let err = Error::Scheduler("worker stopped".to_string());
        assert_eq!(err.to_string(), "Scheduler error: worker stopped");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_is_upstream() {
        assert!(Error::Provider("x".into()).is_upstream());
        assert!(Error::Request("x".into()).is_upstream());
        assert!(Error::Inference("x".into()).is_upstream());
        assert!(!Error::Config("x".into()).is_upstream());
        assert!(!Error::Scheduler("x".into()).is_upstream());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
