//! Error types for the connector

/// Main error type for connector operations
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Document that cannot be handed to a server
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Command name that is not one of the supported conversions
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Malformed message on the wire
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered a request with a JSON-RPC error
    #[error("Server error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message reported by the server
        message: String,
        /// Optional structured error data
        data: Option<serde_json::Value>,
    },

    /// The session's transport ended before a response arrived
    #[error("Session closed")]
    SessionClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_display() {
        let err = ConnectorError::Rpc {
            code: -32602,
            message: "Missing URI argument".to_string(),
            data: None,
        };
        assert_eq!(err.to_string(), "Server error -32602: Missing URI argument");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: ConnectorError = io.into();
        assert!(matches!(err, ConnectorError::Io(_)));
        assert!(err.to_string().contains("pipe closed"));
    }
}
