// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading transcript files.
///
/// The reconstruction pipeline itself never fails: malformed records degrade
/// to inert output. Only the loader — the seam to the log source — returns
/// these.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Transcript file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied reading file: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {message}")]
    MalformedJson { path: PathBuf, message: String },
}

impl ParseError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    pub fn malformed_json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::MalformedJson {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::not_found("/path/to/log.json");
        assert!(err.to_string().contains("/path/to/log.json"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_error_io_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ParseError::io("/test/path", io_err);
        assert!(matches!(err, ParseError::NotFound { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = ParseError::io("/test/path", io_err);
        assert!(matches!(err, ParseError::PermissionDenied { .. }));
    }

    #[test]
    fn test_parse_error_io_other() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout");
        let err = ParseError::io("/test/path", io_err);
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_carries_message() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ParseError::malformed_json("/test/log.json", json_err);
        match err {
            ParseError::MalformedJson { path, message } => {
                assert_eq!(path, PathBuf::from("/test/log.json"));
                assert!(!message.is_empty());
            }
            other => panic!("Expected MalformedJson, got: {:?}", other),
        }
    }
}
