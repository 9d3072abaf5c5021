//! Error types for the ClickHouseInstallation compiler

use thiserror::Error;

/// Main error type for compiler operations
///
/// Most irregularities in an installation degrade to built-in defaults
/// (missing templates, unset deployment fields). Only the conditions below
/// abort a compile.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The installation cannot drive generation (e.g. it has no name)
    #[error("validation error: {0}")]
    Validation(String),

    /// The pod template selected for a deployment declares no containers
    #[error("pod template '{template}' selected for deployment {deployment} has no containers")]
    EmptyPodTemplate {
        /// Name of the offending pod template
        template: String,
        /// Deployment that selected it
        deployment: String,
    },

    /// An intermediate index disagrees with another one
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an empty pod template error
    pub fn empty_pod_template(template: impl Into<String>, deployment: impl Into<String>) -> Self {
        Self::EmptyPodTemplate {
            template: template.into(),
            deployment: deployment.into(),
        }
    }

    /// Create an internal invariant error with the given message
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
