//! Seed data for the in-memory backend

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{
    BankAccount, BankAccountDraft, Category, CategoryDraft, PaymentMode, PaymentModeDraft, Transaction,
    TransactionDraft,
};
use crate::row::Record;
use crate::types::{RecordId, RecordStatus, TransactionType};

/// Records for all four tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub payment_modes: Vec<PaymentMode>,
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

const CATEGORIES: &[(&str, TransactionType)] = &[
    ("Salary", TransactionType::Income),
    ("Freelance", TransactionType::Income),
    ("Interest", TransactionType::Income),
    ("Rent", TransactionType::Expense),
    ("Groceries", TransactionType::Expense),
    ("Utilities", TransactionType::Expense),
    ("Transport", TransactionType::Expense),
    ("Dining Out", TransactionType::Expense),
    ("Health", TransactionType::Expense),
];

const PAYMENT_MODES: &[&str] = &["Cash", "UPI", "Debit Card", "Credit Card", "Net Banking"];

const BANK_ACCOUNTS: &[(&str, &str, &str, &str, &str)] = &[
    ("HDFC Bank", "Asha Rao", "50100234567812", "HDFC0001234", "Indiranagar"),
    ("State Bank of India", "Asha Rao", "30211876543", "SBIN0004321", "MG Road"),
    ("ICICI Bank", "Vikram Rao", "001201554433", "ICIC0000012", "Koramangala"),
    ("Axis Bank", "Vikram Rao", "917010045566778", "UTIB0000456", ""),
];

const DESCRIPTIONS: &[&str] = &[
    "Monthly salary",
    "Logo design project",
    "Savings interest",
    "Apartment rent",
    "Weekly vegetables",
    "Electricity bill",
    "Metro card top-up",
    "Dinner with friends",
    "Pharmacy",
];

/// Number of transactions in the demo set, enough for several pages
const DEMO_TRANSACTIONS: usize = 37;

impl Fixtures {
    /// Read fixtures from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures from {}", path.display()))?;
        let fixtures: Fixtures = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixtures in {}", path.display()))?;
        log::info!(
            "Loaded fixtures: {} categories, {} payment modes, {} bank accounts, {} transactions",
            fixtures.categories.len(),
            fixtures.payment_modes.len(),
            fixtures.bank_accounts.len(),
            fixtures.transactions.len()
        );
        Ok(fixtures)
    }

    /// Built-in demo data, dated over the last three months
    pub fn demo() -> Self {
        let start = Utc::now() - Duration::days(90);
        let at = |step: usize| -> DateTime<Utc> { start + Duration::hours(step as i64 * 40) };

        let categories = CATEGORIES
            .iter()
            .enumerate()
            .map(|(i, (name, kind))| {
                let draft = CategoryDraft {
                    name: name.to_string(),
                    kind: *kind,
                    status: RecordStatus::Active,
                };
                Category::create(next_id(i), draft, at(i))
            })
            .collect();

        let payment_modes = PAYMENT_MODES
            .iter()
            .enumerate()
            .map(|(i, mode)| {
                let draft = PaymentModeDraft { mode: mode.to_string() };
                PaymentMode::create(next_id(i), draft, at(i))
            })
            .collect();

        let bank_accounts = BANK_ACCOUNTS
            .iter()
            .enumerate()
            .map(|(i, (bank, holder, number, ifsc, branch))| {
                let draft = BankAccountDraft {
                    bank_name: bank.to_string(),
                    holder_name: holder.to_string(),
                    account_number: number.to_string(),
                    ifsc_code: ifsc.to_string(),
                    branch: branch.to_string(),
                    status: RecordStatus::Active,
                };
                BankAccount::create(next_id(i), draft, at(i))
            })
            .collect();

        let transactions = (0..DEMO_TRANSACTIONS)
            .map(|i| {
                let (category, kind) = CATEGORIES[i % CATEGORIES.len()];
                let mode = PAYMENT_MODES[i % PAYMENT_MODES.len()];
                let bank = match mode {
                    "Cash" => String::new(),
                    _ => BANK_ACCOUNTS[i % BANK_ACCOUNTS.len()].0.to_string(),
                };
                let created = at(i + 1);
                let draft = TransactionDraft {
                    transaction_date: Some(created.date_naive()),
                    amount: Some(demo_amount(i, kind)),
                    kind,
                    category: category.to_string(),
                    payment_mode: mode.to_string(),
                    bank_account: bank,
                    description: DESCRIPTIONS[i % DESCRIPTIONS.len()].to_string(),
                };
                Transaction::create(next_id(i), draft, created)
            })
            .collect();

        Self {
            categories,
            payment_modes,
            bank_accounts,
            transactions,
        }
    }
}

fn next_id(index: usize) -> RecordId {
    index as RecordId + 1
}

fn demo_amount(index: usize, kind: TransactionType) -> Decimal {
    let cents = (index as i64 * 7919) % 250_000 + 1_500;
    match kind {
        TransactionType::Income => Decimal::new(cents * 20, 2),
        TransactionType::Expense => Decimal::new(cents, 2),
    }
}
