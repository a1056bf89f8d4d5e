//! Error types for Warden
//!
//! A single error enum covers both the system-user pipeline failures
//! (which map onto wire error codes) and the infrastructure failures
//! raised by the datastore, signer and HTTP layers.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = WardenError> = std::result::Result<T, E>;

/// Category used when logging system-user pipeline failures
pub const USER_LOG_CATEGORY: &str = "USER";

#[derive(Debug, Error)]
pub enum WardenError {
    /// The request body was empty
    #[error("No system-user data supplied")]
    NoUserData,

    /// The request body was not valid JSON for a system-user request
    #[error("{0}")]
    DecodeJson(String),

    /// The model does not exist or the caller is not entitled to it
    #[error("Cannot find model with the selected ID")]
    InvalidModel,

    /// The model exists but its system-user signing key is not active
    #[error("The model is linked with an inactive signing-key")]
    InactiveSigningKey,

    /// The account assertion for the model's authority could not be loaded
    #[error("{0}")]
    AccountAssertions(String),

    /// Salt material could not be generated
    #[error("Failed to generate the system-user assertion: {0}")]
    GenerateAssertion(String),

    /// The signer rejected or failed to sign the assertion
    #[error("{0}")]
    SigningAssertion(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WardenError {
    /// Machine-readable error code returned to API callers
    pub fn code(&self) -> &'static str {
        match self {
            WardenError::NoUserData => "error-user-data",
            WardenError::DecodeJson(_) => "error-decode-json",
            WardenError::InvalidModel | WardenError::InactiveSigningKey => "invalid-model",
            WardenError::AccountAssertions(_) => "account-assertions",
            WardenError::GenerateAssertion(_) => "generate-assertion",
            WardenError::SigningAssertion(_) => "signing-assertion",
            WardenError::Database(_) => "database",
            WardenError::NotFound(_) => "not-found",
            WardenError::Config(_) => "configuration",
            WardenError::Http(_) => "http",
            WardenError::Internal(_) | WardenError::Io(_) => "internal",
        }
    }

    /// Optional subcode; none of the current failures carry one
    pub fn subcode(&self) -> &'static str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_codes() {
        assert_eq!(WardenError::NoUserData.code(), "error-user-data");
        assert_eq!(WardenError::DecodeJson("eof".into()).code(), "error-decode-json");
        assert_eq!(WardenError::InvalidModel.code(), "invalid-model");
        assert_eq!(WardenError::InactiveSigningKey.code(), "invalid-model");
        assert_eq!(WardenError::AccountAssertions("x".into()).code(), "account-assertions");
        assert_eq!(WardenError::SigningAssertion("x".into()).code(), "signing-assertion");
    }

    #[test]
    fn test_invalid_model_messages_are_distinct() {
        let missing = WardenError::InvalidModel.to_string();
        let inactive = WardenError::InactiveSigningKey.to_string();

        assert_eq!(missing, "Cannot find model with the selected ID");
        assert!(inactive.contains("linked with an inactive signing-key"));
        assert_ne!(missing, inactive);
    }

    #[test]
    fn test_passthrough_messages() {
        let err = WardenError::SigningAssertion("key id mismatch".into());
        assert_eq!(err.to_string(), "key id mismatch");

        let err = WardenError::DecodeJson("expected value at line 1 column 1".into());
        assert_eq!(err.to_string(), "expected value at line 1 column 1");
    }
}
