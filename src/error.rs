use std::time::SystemTimeError;

use warp::reject::Reject;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no credential stored for that username")]
    NotFound,
    #[error("error during store operation")]
    Backend {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    /// The request body could not be decoded. The message is returned to the client.
    #[error("{source}")]
    MalformedBody { source: serde_json::Error },
    #[error("username or password incorrect")]
    LoginFailed,
    #[error("error during registration")]
    RegistrationFailed { source: StoreError },
    #[error("error with token")]
    TokenError {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
    #[error("error encoding token")]
    TokenEncoding { source: serde_json::Error },
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
    #[error("token expired")]
    TokenExpired,
    #[error("system clock is before the unix epoch")]
    InvalidClock {
        #[from]
        source: SystemTimeError,
    },
}

impl Reject for AuthError {}
