use thiserror::Error;

/// Top-level error type for the Hushtype system.
///
/// Each variant covers one subsystem. Structural variants are used where a
/// caller needs to branch on the failure (`AlreadyRecording`, `Cancelled`,
/// `Remote`); string-wrapping variants cover everything else.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HushError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recording already in progress")]
    AlreadyRecording,

    #[error("Audio input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("No API credential configured")]
    NotConfigured,

    #[error("Remote transcription failed ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error("Transcription cancelled")]
    Cancelled,

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Dictation error: {0}")]
    Dictation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HushError {
    /// Whether this error is the cooperative-cancellation outcome.
    ///
    /// Callers use this to avoid surfacing a user-initiated cancel as a
    /// failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HushError::Cancelled)
    }
}

impl From<toml::de::Error> for HushError {
    fn from(err: toml::de::Error) -> Self {
        HushError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HushError {
    fn from(err: toml::ser::Error) -> Self {
        HushError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HushError {
    fn from(err: serde_json::Error) -> Self {
        HushError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Hushtype operations.
pub type Result<T> = std::result::Result<T, HushError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HushError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_remote_error_display() {
        let err = HushError::Remote {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote transcription failed (401): invalid api key"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let hush_err: HushError = io_err.into();
        assert!(matches!(hush_err, HushError::Io(_)));
        assert!(hush_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_is_cancelled() {
        assert!(HushError::Cancelled.is_cancelled());
        assert!(!HushError::NotConfigured.is_cancelled());
        assert!(!HushError::Remote {
            status: 500,
            body: String::new()
        }
        .is_cancelled());
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let err: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(err.is_err());
        let hush_err: HushError = err.unwrap_err().into();
        assert!(matches!(hush_err, HushError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(err.is_err());
        let hush_err: HushError = err.unwrap_err().into();
        assert!(matches!(hush_err, HushError::Serialization(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(HushError::AlreadyRecording)
        }

        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_debug_impl() {
        let err = HushError::DeviceUnavailable("no default input".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("DeviceUnavailable"));
        assert!(debug_str.contains("no default input"));
    }
}
