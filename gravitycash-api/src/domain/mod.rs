pub mod currency;
pub mod error;

use std::fmt;
use std::str::FromStr;

pub use currency::*;
use serde::{Deserialize, Serialize};

use error::Error;

/// Way the money leaves the account. Exactly one is active for a request.
#[derive(
    Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalMethod {
    /// Standard card withdrawal
    #[default]
    Card,
    /// Transfer to any IBAN account
    Iban,
    /// Tap the device to pay
    Nfc,
    /// Expedited card withdrawal, a small fee may apply
    Instant,
}

impl WithdrawalMethod {
    pub fn all() -> [WithdrawalMethod; 4] {
        [
            WithdrawalMethod::Instant,
            WithdrawalMethod::Card,
            WithdrawalMethod::Iban,
            WithdrawalMethod::Nfc,
        ]
    }

    pub fn to_alpha(&self) -> &'static str {
        match self {
            WithdrawalMethod::Card => "card",
            WithdrawalMethod::Iban => "iban",
            WithdrawalMethod::Nfc => "nfc",
            WithdrawalMethod::Instant => "instant",
        }
    }

    /// Card and instant both settle to a card and need the card fields
    pub fn is_card_based(&self) -> bool {
        matches!(self, WithdrawalMethod::Card | WithdrawalMethod::Instant)
    }

    pub fn is_contactless(&self) -> bool {
        matches!(self, WithdrawalMethod::Nfc)
    }

    pub fn title(&self) -> &'static str {
        match self {
            WithdrawalMethod::Card => "Credit Card",
            WithdrawalMethod::Iban => "IBAN Transfer",
            WithdrawalMethod::Nfc => "NFC Payment",
            WithdrawalMethod::Instant => "Instant",
        }
    }
}

impl fmt::Display for WithdrawalMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_alpha())
    }
}

impl FromStr for WithdrawalMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(WithdrawalMethod::Card),
            "iban" => Ok(WithdrawalMethod::Iban),
            "nfc" => Ok(WithdrawalMethod::Nfc),
            "instant" => Ok(WithdrawalMethod::Instant),
            other => Err(Error::UnknownMethod(other.to_owned())),
        }
    }
}

/// Direction of a contactless transfer
#[derive(
    Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum ContactlessMode {
    #[default]
    Pay,
    Recharge,
}

impl ContactlessMode {
    pub fn to_alpha(&self) -> &'static str {
        match self {
            ContactlessMode::Pay => "pay",
            ContactlessMode::Recharge => "recharge",
        }
    }
}

impl fmt::Display for ContactlessMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_alpha())
    }
}

impl FromStr for ContactlessMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pay" => Ok(ContactlessMode::Pay),
            "recharge" => Ok(ContactlessMode::Recharge),
            other => Err(Error::UnknownMode(other.to_owned())),
        }
    }
}
