//! Basic types shared by the record models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Identifier assigned by the backend
pub type RecordId = i64;

/// Transaction direction, also used to classify categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl Default for TransactionType {
    fn default() -> Self {
        TransactionType::Expense
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" | "expenses" => Ok(TransactionType::Expense),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

/// Active/inactive flag on master records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Active
    }
}

impl RecordStatus {
    pub fn toggled(self) -> Self {
        match self {
            RecordStatus::Active => RecordStatus::Inactive,
            RecordStatus::Inactive => RecordStatus::Active,
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(RecordStatus::Active),
            "inactive" => Ok(RecordStatus::Inactive),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStatus::Active => write!(f, "active"),
            RecordStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Value of a named record field, used for sorting and searching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Absent optional value; sorts before everything else
    Missing,
    Text(String),
    Amount(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        value.map(FieldValue::text).unwrap_or(FieldValue::Missing)
    }

    /// Case-insensitive substring match; `needle` must already be lowercase
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            FieldValue::Missing => false,
            FieldValue::Text(text) => text.to_lowercase().contains(needle),
            other => other.to_string().to_lowercase().contains(needle),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Missing => 0,
            FieldValue::Text(_) => 1,
            FieldValue::Amount(_) => 2,
            FieldValue::Date(_) => 3,
            FieldValue::Timestamp(_) => 4,
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => {
                a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
            }
            (FieldValue::Amount(a), FieldValue::Amount(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Missing => Ok(()),
            FieldValue::Text(text) => write!(f, "{}", text),
            FieldValue::Amount(amount) => write!(f, "{}", amount),
            FieldValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transaction_type_from_str() {
        assert_eq!("income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!("Expense".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(RecordStatus::Active.toggled(), RecordStatus::Inactive);
        assert_eq!(RecordStatus::Inactive.toggled(), RecordStatus::Active);
        assert_eq!("INACTIVE".parse::<RecordStatus>().unwrap(), RecordStatus::Inactive);
    }

    #[test]
    fn test_text_ordering_ignores_case() {
        let mut values = vec![
            FieldValue::text("zeta"),
            FieldValue::text("Alpha"),
            FieldValue::Missing,
            FieldValue::text("beta"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                FieldValue::Missing,
                FieldValue::text("Alpha"),
                FieldValue::text("beta"),
                FieldValue::text("zeta"),
            ]
        );
    }

    #[test]
    fn test_amount_ordering_is_numeric() {
        let small = FieldValue::Amount(Decimal::from_str("9.50").unwrap());
        let large = FieldValue::Amount(Decimal::from_str("120").unwrap());
        assert!(small < large);
    }

    #[test]
    fn test_contains() {
        assert!(FieldValue::text("Monthly Rent").contains("rent"));
        assert!(!FieldValue::Missing.contains(""));
        let date = FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert!(date.contains("2024-03"));
    }
}
