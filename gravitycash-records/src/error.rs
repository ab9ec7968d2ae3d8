use thiserror::Error;
pub use gravitycash_api::error::GravityError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(String),
    #[error("Unknown transaction status: {0}")]
    UnknownTransactionStatus(String),
    #[error("Unknown location type: {0}")]
    UnknownLocationType(String),
    #[error("No location with id {0}")]
    UnknownLocation(u32),
}

impl GravityError for Error {
    fn subtype() -> &'static str {
        "gravitycash_records"
    }

    fn code(&self) -> u16 {
        match self {
            Error::UnknownTransactionType(_) => 0,
            Error::UnknownTransactionStatus(_) => 1,
            Error::UnknownLocationType(_) => 2,
            Error::UnknownLocation(_) => 3,
        }
    }

    fn status(&self) -> u16 {
        match self {
            Error::UnknownLocation(_) => 404,
            _ => 400,
        }
    }
}
