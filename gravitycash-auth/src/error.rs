use gravitycash_api::error::GravityError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Action requires authentication")]
    AuthRequired,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Failed to access session storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed session record: {0}")]
    Json(#[from] serde_json::Error),
}

impl GravityError for Error {
    fn subtype() -> &'static str {
        "gravitycash_auth"
    }

    fn code(&self) -> u16 {
        match self {
            Error::AuthRequired => 0,
            Error::InvalidCredentials => 1,
            Error::Io(_) => 2,
            Error::Json(_) => 3,
        }
    }

    fn status(&self) -> u16 {
        match self {
            Error::AuthRequired => 401,
            Error::InvalidCredentials => 401,
            Error::Io(_) => 500,
            Error::Json(_) => 500,
        }
    }
}
