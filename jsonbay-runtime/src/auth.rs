//! Auth strategies - how requests into a served instance are gated

use thiserror::Error;

/// Header carrying the shared secret, matching the served API's contract:
/// `{"authorization": apikey}`.
pub const AUTH_HEADER: &str = "authorization";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Invalid API key")]
    InvalidCredentials,

    #[error("API key auth requires non-empty key material")]
    EmptyKeyMaterial,
}

/// Request gate installed on a served instance
pub trait AuthStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decide whether a request with the given `authorization` header value
    /// may pass.
    fn authorize(&self, authorization: Option<&str>) -> Result<(), AuthError>;
}

/// No-op gate: every request passes
pub struct PublicStrategy;

impl AuthStrategy for PublicStrategy {
    fn name(&self) -> &'static str {
        "public"
    }

    fn authorize(&self, _authorization: Option<&str>) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Shared-secret header check
#[derive(Debug)]
pub struct ApiKeyStrategy {
    api_key: String,
}

impl ApiKeyStrategy {
    /// Construction fails without non-empty key material.
    pub fn new(api_key: impl Into<String>) -> Result<Self, AuthError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AuthError::EmptyKeyMaterial);
        }
        Ok(Self { api_key })
    }
}

impl AuthStrategy for ApiKeyStrategy {
    fn name(&self) -> &'static str {
        "apikey"
    }

    fn authorize(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        match authorization {
            None => Err(AuthError::MissingCredentials),
            Some(value) if value == self.api_key => Ok(()),
            Some(_) => Err(AuthError::InvalidCredentials),
        }
    }
}
