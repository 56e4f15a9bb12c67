//! Error types for scour.
//!
//! Sanitization itself is total — every input has a defined output — so
//! errors only arise while building a `Config` or parsing a `Specification`.

/// Error type for configuration and specification building.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The compact specification grammar could not be parsed.
    #[error("specification parse failed: {0}")]
    SpecParse(String),

    /// A JSON specification document was malformed.
    #[error("specification JSON failed: {0}")]
    SpecJson(#[from] serde_json::Error),

    /// A rule pattern inside a specification did not compile.
    #[error("invalid rule pattern `{pattern}`: {reason}")]
    BadPattern {
        /// The offending pattern text.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A configuration value could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for configuration and specification building.
pub type Result<T> = std::result::Result<T, Error>;
