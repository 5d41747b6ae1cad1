use thiserror::Error;

/// Error types for the enrichment and normalization pipeline.
///
/// Per-item failures inside a batch never surface as these errors; they are
/// absorbed into fallback values and `RunStats`. These variants cover the
/// boundaries that are allowed to fail loudly: configuration, the wire
/// protocol, and export I/O.
#[derive(Error, Debug)]
pub enum StudioError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid configuration file: {path}")]
    InvalidConfig { path: String },

    // Network errors
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("HTTP request failed: {url} - {status}")]
    HttpStatus { url: String, status: u16 },

    // Search errors
    #[error("Search error: {message}")]
    Search { message: String },

    // LLM errors
    #[error("LLM processing error: {message}")]
    Llm { message: String },

    #[error("No parsable JSON object in response: {message}")]
    JsonExtraction { message: String },

    // Input validation errors
    #[error("Input validation failed: {message}")]
    Validation { message: String },

    // Export errors
    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StudioError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Create a search error
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search { message: message.into() }
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm { message: message.into() }
    }

    /// Create an input validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export { message: message.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } | Self::InvalidConfig { .. } => "configuration",
            Self::Network { .. } | Self::HttpStatus { .. } => "network",
            Self::Search { .. } => "search",
            Self::Llm { .. } | Self::JsonExtraction { .. } => "llm",
            Self::Validation { .. } => "validation",
            Self::Export { .. } | Self::UnsupportedFormat { .. } => "export",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether the failure mode is expected and absorbable into fallback data
    pub fn is_absorbable(&self) -> bool {
        match self {
            Self::Network { .. }
            | Self::HttpStatus { .. }
            | Self::Search { .. }
            | Self::Llm { .. }
            | Self::JsonExtraction { .. } => true,

            Self::Configuration { .. }
            | Self::InvalidConfig { .. }
            | Self::Validation { .. }
            | Self::Export { .. }
            | Self::UnsupportedFormat { .. }
            | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for whiskey-studio
pub type StudioResult<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = StudioError::config("missing api key");
        assert_eq!(error.category(), "configuration");
        assert!(!error.is_absorbable());
    }

    #[test]
    fn test_absorbable_errors() {
        let network_error = StudioError::network("connection reset");
        assert!(network_error.is_absorbable());

        let status_error = StudioError::HttpStatus {
            url: "http://example.com/chat/completions".to_string(),
            status: 503,
        };
        assert_eq!(status_error.category(), "network");
        assert!(status_error.is_absorbable());

        let export_error = StudioError::export("disk full");
        assert!(!export_error.is_absorbable());
    }
}
