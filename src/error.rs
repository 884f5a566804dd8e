//! Error types for confdiff.

/// Errors that can occur while loading inputs, configuration or planning
/// a deployment.
#[derive(Debug, thiserror::Error)]
pub enum ConfdiffError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be parsed or serialized as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file is not valid TOML for [`crate::ConfdiffConfig`].
    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The desired application moves to a different durable object namespace.
    #[error(
        "application \"{application}\" is assigned to durable object {previous}, but a new namespace {desired} is being assigned; delete the application and deploy again"
    )]
    NamespaceMismatch {
        application: String,
        previous: String,
        desired: String,
    },

    /// The deployed application was never bound to a durable object namespace.
    #[error("the previous deploy of application \"{0}\" was not associated with a durable object")]
    MissingNamespace(String),
}

/// Convenience alias for confdiff results.
pub type Result<T> = std::result::Result<T, ConfdiffError>;
