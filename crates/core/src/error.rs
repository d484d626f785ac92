//! Unified error types for sigcache.
//!
//! Every message carries a stable upper-case code prefix so callers on the
//! MCP side can branch on it without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the signature cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty intent text).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Structural extraction failed inside a live page.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// No cache entry found for the given intent or locator.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Signature string does not follow the three-segment hex grammar.
    #[error("INVALID_SIGNATURE: {0}")]
    InvalidSignature(String),

    /// A persisted record could not be encoded or decoded.
    #[error("SERIALIZATION: {0}")]
    Serialization(String),

    /// Live page extraction is disabled by configuration.
    #[error("RENDER_DISABLED")]
    RenderDisabled,

    /// Headless rendering failed.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::ExtractFailed(msg) => (-32000, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::InvalidSignature(msg) => (-32003, msg.clone()),
            Error::Serialization(msg) => (-32004, msg.clone()),
            Error::RenderDisabled => (-32011, "Live page extraction is disabled".to_string()),
            Error::RenderFailed(msg) => (-32012, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("click login".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("click login"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::CacheMiss("click login".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);
    }

    #[test]
    fn test_invalid_signature_code() {
        let mcp_err: McpError = Error::InvalidSignature("abc-123".into()).into();
        assert_eq!(mcp_err.code.0, -32003);
        assert_eq!(mcp_err.message, "abc-123");
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(err.to_string().starts_with("SERIALIZATION"));
    }
}
