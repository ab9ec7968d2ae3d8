use std::collections::BTreeMap;
use std::str::FromStr;

use gravitycash_api::domain::WithdrawalMethod;
use gravitycash_api::types::{AccountSnapshot, WithdrawalSubmission};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ValidationError;

/// Input names the form understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Amount,
    CardNumber,
    ExpiryDate,
    Cvv,
    AccountName,
    Iban,
    BankName,
    Reference,
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Amount => "amount",
            FormField::CardNumber => "cardNumber",
            FormField::ExpiryDate => "expiryDate",
            FormField::Cvv => "cvv",
            FormField::AccountName => "accountName",
            FormField::Iban => "iban",
            FormField::BankName => "bankName",
            FormField::Reference => "reference",
        }
    }

    pub fn from_name(name: &str) -> Option<FormField> {
        match name {
            "amount" => Some(FormField::Amount),
            "cardNumber" => Some(FormField::CardNumber),
            "expiryDate" => Some(FormField::ExpiryDate),
            "cvv" => Some(FormField::Cvv),
            "accountName" => Some(FormField::AccountName),
            "iban" => Some(FormField::Iban),
            "bankName" => Some(FormField::BankName),
            "reference" => Some(FormField::Reference),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IbanFields {
    pub account_name: String,
    pub iban: String,
    pub bank_name: String,
    pub reference: String,
}

/// Transient state of one withdrawal request as the user types it in.
///
/// Fields of every method are kept side by side, only the ones of the active
/// method are looked at on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawalForm {
    pub method: WithdrawalMethod,
    /// Raw user input, parsed on submit
    pub amount: String,
    pub card: CardFields,
    pub iban: IbanFields,
    /// Inputs with names the form doesn't know. Kept, never validated or sent
    pub extra: BTreeMap<String, String>,
}

impl WithdrawalForm {
    pub fn new(method: WithdrawalMethod) -> Self {
        WithdrawalForm {
            method,
            ..Default::default()
        }
    }

    pub fn set_field(&mut self, name: &str, value: String) {
        match FormField::from_name(name) {
            Some(field) => *self.slot_mut(field) = value,
            None => {
                self.extra.insert(name.to_owned(), value);
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        match FormField::from_name(name) {
            Some(field) => Some(self.slot(field)),
            None => self.extra.get(name).map(|v| v.as_str()),
        }
    }

    fn slot(&self, field: FormField) -> &str {
        match field {
            FormField::Amount => &self.amount,
            FormField::CardNumber => &self.card.card_number,
            FormField::ExpiryDate => &self.card.expiry_date,
            FormField::Cvv => &self.card.cvv,
            FormField::AccountName => &self.iban.account_name,
            FormField::Iban => &self.iban.iban,
            FormField::BankName => &self.iban.bank_name,
            FormField::Reference => &self.iban.reference,
        }
    }

    fn slot_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Amount => &mut self.amount,
            FormField::CardNumber => &mut self.card.card_number,
            FormField::ExpiryDate => &mut self.card.expiry_date,
            FormField::Cvv => &mut self.card.cvv,
            FormField::AccountName => &mut self.iban.account_name,
            FormField::Iban => &mut self.iban.iban,
            FormField::BankName => &mut self.iban.bank_name,
            FormField::Reference => &mut self.iban.reference,
        }
    }

    /// Empty every input, the selected method stays
    pub fn clear(&mut self) {
        *self = WithdrawalForm::new(self.method);
    }

    /// Entered amount if it is a positive number written as plain digits with
    /// an optional fraction. Exponents, digit separators and signs other than
    /// a leading `+` are rejected.
    pub fn parse_amount(&self) -> Option<Decimal> {
        let raw = self.amount.trim();
        if !plain_amount(raw) {
            return None;
        }
        let digits = raw.strip_prefix('+').unwrap_or(raw);
        let parsed = match digits.strip_prefix('.') {
            Some(fraction) => Decimal::from_str(&format!("0.{fraction}")),
            None => Decimal::from_str(digits),
        };
        parsed.ok().filter(|amount| *amount > Decimal::ZERO)
    }

    /// Check the request against the account, stopping at the first problem
    pub fn validate(&self, account: &AccountSnapshot) -> Result<ValidatedWithdrawal, ValidationError> {
        let amount = self.parse_amount().ok_or(ValidationError::InvalidAmount)?;
        if amount > account.balance {
            return Err(ValidationError::InsufficientFunds);
        }
        let details = match self.method {
            method if method.is_card_based() => SettlementDetails::Card(self.card_details()?),
            WithdrawalMethod::Iban => SettlementDetails::Iban(self.iban_details()?),
            _ => SettlementDetails::Contactless,
        };
        Ok(ValidatedWithdrawal {
            method: self.method,
            amount,
            details,
        })
    }

    fn card_details(&self) -> Result<CardDetails, ValidationError> {
        let card_number = required(&self.card.card_number);
        let expiry_date = required(&self.card.expiry_date);
        let cvv = required(&self.card.cvv);
        match (card_number, expiry_date, cvv) {
            (Some(card_number), Some(expiry_date), Some(cvv)) => Ok(CardDetails {
                card_number,
                expiry_date,
                cvv,
            }),
            _ => Err(ValidationError::MissingCardFields),
        }
    }

    fn iban_details(&self) -> Result<IbanDetails, ValidationError> {
        let account_name = required(&self.iban.account_name);
        let iban = required(&self.iban.iban);
        let bank_name = required(&self.iban.bank_name);
        match (account_name, iban, bank_name) {
            (Some(account_name), Some(iban), Some(bank_name)) => Ok(IbanDetails {
                account_name,
                iban,
                bank_name,
                reference: required(&self.iban.reference),
            }),
            _ => Err(ValidationError::MissingIbanFields),
        }
    }
}

const AMOUNT_SHAPE: &str = r"^\+?[0-9]*\.?[0-9]+$";

fn plain_amount(raw: &str) -> bool {
    Regex::new(AMOUNT_SHAPE)
        .map(|shape| shape.is_match(raw))
        .unwrap_or(false)
}

fn required(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbanDetails {
    pub account_name: String,
    pub iban: String,
    pub bank_name: String,
    pub reference: Option<String>,
}

/// Payout target of a validated request, one variant per settlement path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementDetails {
    Card(CardDetails),
    Iban(IbanDetails),
    /// Handled by the contactless initiator
    Contactless,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWithdrawal {
    pub method: WithdrawalMethod,
    pub amount: Decimal,
    pub details: SettlementDetails,
}

impl ValidatedWithdrawal {
    /// Build the request for the withdrawal-processing endpoint. The CVV is
    /// only used for validation and never leaves the controller.
    pub fn into_submission(self, id: Uuid, account_id: &str) -> WithdrawalSubmission {
        let mut metadata = Map::new();
        let mut reference = None;
        match self.details {
            SettlementDetails::Card(card) => {
                metadata.insert(
                    FormField::CardNumber.name().to_owned(),
                    Value::String(card.card_number),
                );
                metadata.insert(
                    FormField::ExpiryDate.name().to_owned(),
                    Value::String(card.expiry_date),
                );
            }
            SettlementDetails::Iban(iban) => {
                metadata.insert(
                    FormField::AccountName.name().to_owned(),
                    Value::String(iban.account_name),
                );
                metadata.insert(FormField::Iban.name().to_owned(), Value::String(iban.iban));
                metadata.insert(
                    FormField::BankName.name().to_owned(),
                    Value::String(iban.bank_name),
                );
                reference = iban.reference;
            }
            SettlementDetails::Contactless => {}
        }
        WithdrawalSubmission {
            id,
            account_id: account_id.to_owned(),
            amount: self.amount,
            method: self.method,
            reference,
            metadata,
        }
    }
}
