use thiserror::Error;

/// Domain error shared by the store, the services and the HTTP handlers.
///
/// Handlers never let these escape as raw responses; each variant maps to a
/// redirect with a flash notice or to a re-rendered form.
#[derive(Debug, Error)]
pub enum WarblerError {
    /// A field was missing or carried the wrong primitive type.
    #[error("type error: {0}")]
    Type(String),

    /// The types were right but the value breaks a domain rule.
    #[error("{0}")]
    Value(String),

    /// Anonymous session on a gated operation, or a resource owned by someone else.
    #[error("Access unauthorized.")]
    Unauthorized,

    /// Submitted password did not match the stored hash.
    #[error("Invalid password.")]
    BadCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WarblerError {
    pub fn value(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, WarblerError>;
