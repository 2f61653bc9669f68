//! Month summary for the report view

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Category, PaymentMode, Transaction};
use crate::types::TransactionType;

/// A calendar month, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthRange {
    /// The month `date` falls in
    pub fn containing(date: NaiveDate) -> Self {
        let start = date - Days::new(u64::from(date.day0()));
        let end = start + Months::new(1) - Days::new(1);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl std::fmt::Display for MonthRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Table counts and the money moved in one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub month: MonthRange,
    pub payment_modes: usize,
    pub categories: usize,
    pub transaction_count: usize,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    /// Income minus expenses
    pub net_change: Decimal,
}

impl MonthSummary {
    /// Summarise the month containing `today`
    pub fn build(
        categories: &[Category],
        payment_modes: &[PaymentMode],
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> Self {
        let month = MonthRange::containing(today);
        let in_month: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| month.contains(t.transaction_date))
            .collect();
        let total = |kind: TransactionType| -> Decimal {
            in_month.iter().filter(|t| t.kind == kind).map(|t| t.amount).sum()
        };

        Self {
            month,
            payment_modes: payment_modes.len(),
            categories: categories.len(),
            transaction_count: in_month.len(),
            total_income: total(TransactionType::Income),
            total_expenses: total(TransactionType::Expense),
            net_change: in_month.iter().map(|t| t.signed_amount()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryDraft, PaymentModeDraft, TransactionDraft};
    use crate::row::Record;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn transaction(id: i64, on: NaiveDate, amount: &str, kind: TransactionType) -> Transaction {
        let draft = TransactionDraft {
            transaction_date: Some(on),
            amount: Some(Decimal::from_str(amount).unwrap()),
            kind,
            category: "Any".to_string(),
            payment_mode: "Cash".to_string(),
            ..TransactionDraft::default()
        };
        Transaction::create(id, draft, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_month_range_bounds() {
        let may = MonthRange::containing(date(2024, 5, 17));
        assert_eq!(may.start, date(2024, 5, 1));
        assert_eq!(may.end, date(2024, 5, 31));
        assert_eq!(may.to_string(), "2024-05-01 to 2024-05-31");

        assert_eq!(MonthRange::containing(date(2024, 2, 29)).end, date(2024, 2, 29));
        assert_eq!(MonthRange::containing(date(2023, 2, 1)).end, date(2023, 2, 28));
        let december = MonthRange::containing(date(2024, 12, 31));
        assert_eq!((december.start, december.end), (date(2024, 12, 1), date(2024, 12, 31)));
    }

    #[test]
    fn test_expenses_counted_only_inside_the_month() {
        let transactions = vec![
            transaction(1, date(2024, 4, 30), "999.00", TransactionType::Expense),
            transaction(2, date(2024, 5, 1), "100.25", TransactionType::Expense),
            transaction(3, date(2024, 5, 31), "49.75", TransactionType::Expense),
            transaction(4, date(2024, 5, 15), "1000.00", TransactionType::Income),
            transaction(5, date(2024, 6, 1), "500.00", TransactionType::Expense),
        ];

        let summary = MonthSummary::build(&[], &[], &transactions, date(2024, 5, 20));

        assert_eq!(summary.total_expenses, Decimal::from_str("150.00").unwrap());
        assert_eq!(summary.total_income, Decimal::from_str("1000.00").unwrap());
        assert_eq!(summary.net_change, Decimal::from_str("850.00").unwrap());
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn test_counts_cover_whole_tables() {
        let now = Utc::now();
        let categories: Vec<Category> = ["Rent", "Salary", "Health"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let draft = CategoryDraft {
                    name: name.to_string(),
                    ..CategoryDraft::default()
                };
                Category::create(i as i64 + 1, draft, now)
            })
            .collect();
        let modes = vec![
            PaymentMode::create(1, PaymentModeDraft { mode: "Cash".to_string() }, now),
            PaymentMode::create(2, PaymentModeDraft { mode: "UPI".to_string() }, now),
        ];

        let summary = MonthSummary::build(&categories, &modes, &[], date(2024, 5, 20));

        assert_eq!(summary.categories, 3);
        assert_eq!(summary.payment_modes, 2);
        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.total_expenses, Decimal::ZERO);
    }
}
