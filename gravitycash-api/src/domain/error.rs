use thiserror::Error;

pub use crate::error::ErrorMessage;
pub use crate::error::GravityError;
pub use crate::error::Result;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown withdrawal method: {0}")]
    UnknownMethod(String),
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Unknown contactless mode: {0}")]
    UnknownMode(String),
}

impl GravityError for Error {
    fn subtype() -> &'static str {
        "gravitycash_api"
    }

    fn code(&self) -> u16 {
        match self {
            Error::UnknownMethod(_) => 0,
            Error::UnknownCurrency(_) => 1,
            Error::UnknownMode(_) => 2,
        }
    }

    fn status(&self) -> u16 {
        400
    }
}
