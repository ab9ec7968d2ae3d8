use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// Fiat currency an account is denominated in. Can be extended in future.
#[derive(
    Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Fiat {
    #[default]
    EUR,
    USD,
    GBP,
    CHF,
}

impl Fiat {
    /// List supported currencies at the moment
    pub fn supported() -> Vec<Fiat> {
        vec![Fiat::EUR, Fiat::USD, Fiat::GBP, Fiat::CHF]
    }

    /// ISO 4217 code
    pub fn ticker(&self) -> &'static str {
        match self {
            Fiat::EUR => "EUR",
            Fiat::USD => "USD",
            Fiat::GBP => "GBP",
            Fiat::CHF => "CHF",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Fiat::EUR => "€",
            Fiat::USD => "$",
            Fiat::GBP => "£",
            Fiat::CHF => "CHF ",
        }
    }

    /// Render an amount the way it is shown to the user: `€5,280.42`.
    ///
    /// Always two fraction digits, midpoints rounded away from zero.
    pub fn format(&self, amount: Decimal) -> String {
        let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let text = rounded.abs().to_string();
        let (units, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
        format!("{}{}{}.{}", sign, self.symbol(), group_thousands(units), cents)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

impl fmt::Display for Fiat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

impl FromStr for Fiat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fiat::supported()
            .into_iter()
            .find(|fiat| fiat.ticker().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownCurrency(s.to_owned()))
    }
}
