use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, ErrorMessage>;

pub trait GravityError {
    /// Error subtype, defines concrete error enum: gravitycash_withdraw, gravitycash_auth etc
    fn subtype() -> &'static str;
    /// Internal error code. Paired with subtype uniquely defines the error
    fn code(&self) -> u16;
    /// Status code in HTTP terms: 400, 403, 500 etc
    fn status(&self) -> u16;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Internal code of the error. Paired with subtype uniquely defines the error
    pub code: u16,
    /// Subtype
    pub subtype: String,
    /// Status code of the error: 400, 403, 500 etc
    pub status: u16,
    /// Error message
    pub message: String,
}

impl ErrorMessage {
    /// Stable identifier of the error kind, e.g. `gravitycash_withdraw:0`
    pub fn id(&self) -> String {
        format!("{}:{}", self.subtype, self.code)
    }
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]: {}", self.id(), self.message)
    }
}

impl std::error::Error for ErrorMessage {}

impl<E: GravityError + Display> From<E> for ErrorMessage {
    fn from(err: E) -> ErrorMessage {
        ErrorMessage {
            code: err.code(),
            status: err.status(),
            message: format!("{err}"),
            subtype: E::subtype().to_string(),
        }
    }
}
