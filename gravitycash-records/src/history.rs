use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use gravitycash_api::domain::Fiat;
use log::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn all() -> [TransactionStatus; 3] {
        [
            TransactionStatus::Completed,
            TransactionStatus::Pending,
            TransactionStatus::Failed,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl FromStr for TransactionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionStatus::all()
            .into_iter()
            .find(|status| status.title().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownTransactionStatus(s.to_owned()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
    Transfer,
}

impl TransactionType {
    pub fn all() -> [TransactionType; 3] {
        [
            TransactionType::Withdrawal,
            TransactionType::Deposit,
            TransactionType::Transfer,
        ]
    }

    pub fn to_alpha(&self) -> &'static str {
        match self {
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_alpha())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::all()
            .into_iter()
            .find(|kind| kind.to_alpha().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownTransactionType(s.to_owned()))
    }
}

/// Past movement on the account. Negative amounts leave the account.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: u32,
    pub date: NaiveDate,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: TransactionStatus,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub method: Option<String>,
    pub location: Option<String>,
}

impl Transaction {
    pub fn formatted_amount(&self, currency: Fiat) -> String {
        currency.format(self.amount)
    }
}

/// Criteria of the history view. `None` stands for every type or status.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Case insensitive part of the description
    pub search: String,
    pub kind: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

impl HistoryFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let search = self.search.to_lowercase();
        transaction.description.to_lowercase().contains(&search)
            && self.kind.map_or(true, |kind| kind == transaction.kind)
            && self.status.map_or(true, |status| status == transaction.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHistory {
    transactions: Vec<Transaction>,
}

impl TransactionHistory {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        TransactionHistory { transactions }
    }

    /// Fixed table shown to every demo account
    pub fn demo() -> Self {
        use TransactionStatus::*;
        use TransactionType::*;
        #[rustfmt::skip]
        let rows = [
            ((2025, 4, 12), "ATM Withdrawal", Decimal::from(-200), Completed, Withdrawal, Some("Card"), Some("CityBank ATM, Main Street")),
            ((2025, 4, 10), "Salary Deposit", Decimal::from(2500), Completed, Deposit, None, None),
            ((2025, 4, 8), "IBAN Transfer to John Doe", Decimal::from(-350), Completed, Transfer, Some("IBAN"), None),
            ((2025, 4, 5), "ATM Withdrawal", Decimal::from(-100), Completed, Withdrawal, Some("Card"), Some("Metro ATM, 5th Avenue")),
            ((2025, 4, 2), "Online Purchase Refund", Decimal::new(7550, 2), Completed, Deposit, None, None),
            ((2025, 3, 28), "IBAN Transfer to Jane Smith", Decimal::from(-120), Failed, Transfer, Some("IBAN"), None),
            ((2025, 3, 25), "ATM Withdrawal", Decimal::from(-50), Completed, Withdrawal, Some("Card"), Some("QuickCash Partner, Broadway")),
            ((2025, 3, 20), "Subscription Payment", Decimal::new(-1599, 2), Completed, Withdrawal, None, None),
            ((2025, 3, 15), "Freelance Payment", Decimal::from(450), Completed, Deposit, None, None),
            ((2025, 3, 10), "IBAN Transfer to Supplier", Decimal::from(-230), Pending, Transfer, Some("IBAN"), None),
        ];
        let transactions = rows
            .into_iter()
            .zip(1..)
            .filter_map(|(((y, m, d), description, amount, status, kind, method, location), id)| {
                let date = NaiveDate::from_ymd_opt(y, m, d)?;
                Some(Transaction {
                    id,
                    date,
                    description: description.to_owned(),
                    amount,
                    status,
                    kind,
                    method: method.map(str::to_owned),
                    location: location.map(str::to_owned),
                })
            })
            .collect();
        TransactionHistory::new(transactions)
    }

    pub fn all(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Matching transactions, newest first. Same day entries keep table order.
    pub fn filter(&self, filter: &HistoryFilter) -> Vec<&Transaction> {
        let mut found: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|transaction| filter.matches(transaction))
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        debug!("{} of {} transactions match {filter:?}", found.len(), self.transactions.len());
        found
    }
}
