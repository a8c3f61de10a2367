//! Typed errors: config validation vs. remote deployment failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing authorizer: '{name}' referenced by {verb} {path}")]
    MissingAuthorizer { name: String, verb: String, path: String },
    #[error("invalid method '{verb}' for path '{path}': must be an uppercase HTTP verb or ANY")]
    InvalidMethod { verb: String, path: String },
    #[error("authorizer '{0}' must set exactly one of lambdaArn or lambdaName")]
    AmbiguousAuthorizerTarget(String),
    #[error("invalid function arn: {0}")]
    InvalidArn(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    /// Rate-limit rejection from the remote control plane. The retry wrapper
    /// re-attempts these transparently; anything else propagates on first
    /// occurrence.
    #[error("throttled: {operation}: {message}")]
    Throttled { operation: String, message: String },
    #[error("remote: {operation}: {message}")]
    Remote { operation: String, message: String },
    #[error("serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DeployError {
    pub fn is_throttle(&self) -> bool {
        matches!(self, DeployError::Throttled { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DeployError::NotFound(_))
    }

    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        DeployError::Remote {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn throttled(operation: impl Into<String>, message: impl Into<String>) -> Self {
        DeployError::Throttled {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
