//! Error taxonomy for request handling
//!
//! Every error carries the short code that goes out on the wire as
//! `{"error": <code>}`. Internal detail stays server-side; the API layer
//! logs it before responding with the generic `error` code.

use thiserror::Error;

pub type CorpusResult<T> = Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed id or body. The payload is the wire code.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A bearer token was presented but did not resolve to a user.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Unrecognized API key or insufficient permission.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    /// Advisory lock acquisition failed. Not retried here.
    #[error("lock error: {0}")]
    Lock(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn invalid() -> Self {
        Error::BadRequest("invalid".to_string())
    }

    pub fn bearer_invalid() -> Self {
        Error::Unauthorized("bearer token invalid".to_string())
    }

    pub fn forbidden() -> Self {
        Error::Forbidden("forbidden".to_string())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// The code serialized into the response body. `Lock` and `Internal`
    /// deliberately collapse to a generic code.
    pub fn code(&self) -> &str {
        match self {
            Error::BadRequest(code) => code,
            Error::Unauthorized(code) => code,
            Error::Forbidden(code) => code,
            Error::NotFound => "notfound",
            Error::Lock(_) | Error::Internal(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_never_reaches_the_wire() {
        let err = Error::internal("connection refused at 10.0.0.7:27017");
        assert_eq!(err.code(), "error");
    }

    #[test]
    fn bearer_code_is_stable() {
        assert_eq!(Error::bearer_invalid().code(), "bearer token invalid");
    }
}
