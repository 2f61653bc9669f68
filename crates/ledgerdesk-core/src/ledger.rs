//! The four tables of one workspace
//!
//! Each table is served by its own `InMemorySource`. Transactions name their
//! category, payment mode and bank account, so the transaction source checks
//! every draft against the other three tables before storing it.

use chrono::{Local, NaiveDate};
use log::info;
use std::sync::Arc;

use ledgerdesk_config::{DataConfig, TablesConfig};

use crate::error::{CoreError, CoreResult};
use crate::fixtures::Fixtures;
use crate::models::{BankAccount, Category, PaymentMode, Transaction, TransactionDraft};
use crate::report::MonthSummary;
use crate::store::{InMemorySource, ReferenceCheck};
use crate::types::RecordStatus;

/// Sources for every table, sharing lookups between them
pub struct Ledger {
    pub categories: Arc<InMemorySource<Category>>,
    pub payment_modes: Arc<InMemorySource<PaymentMode>>,
    pub bank_accounts: Arc<InMemorySource<BankAccount>>,
    pub transactions: Arc<InMemorySource<Transaction>>,
}

impl Ledger {
    pub fn new(fixtures: Fixtures, tables: &TablesConfig, data: &DataConfig) -> Self {
        let categories = Arc::new(InMemorySource::from_config(fixtures.categories, &tables.categories, data));
        let payment_modes = Arc::new(InMemorySource::from_config(
            fixtures.payment_modes,
            &tables.payment_modes,
            data,
        ));
        let bank_accounts = Arc::new(InMemorySource::from_config(
            fixtures.bank_accounts,
            &tables.bank_accounts,
            data,
        ));
        let references = TransactionReferences {
            categories: categories.clone(),
            payment_modes: payment_modes.clone(),
            bank_accounts: bank_accounts.clone(),
        };
        let transactions = Arc::new(
            InMemorySource::from_config(fixtures.transactions, &tables.transactions, data)
                .with_references(Arc::new(references)),
        );

        Self {
            categories,
            payment_modes,
            bank_accounts,
            transactions,
        }
    }

    /// Summary of the month containing `today`
    pub fn summary(&self, today: NaiveDate) -> MonthSummary {
        MonthSummary::build(
            &self.categories.records(),
            &self.payment_modes.records(),
            &self.transactions.records(),
            today,
        )
    }

    /// Summary of the current local month
    pub fn this_month(&self) -> MonthSummary {
        let summary = self.summary(Local::now().date_naive());
        info!(
            "Summary for {}: {} transaction(s), expenses {}",
            summary.month, summary.transaction_count, summary.total_expenses
        );
        summary
    }
}

fn same_name(stored: &str, wanted: &str) -> bool {
    stored.trim().eq_ignore_ascii_case(wanted)
}

/// Category, payment mode and bank account lookups for transaction drafts
struct TransactionReferences {
    categories: Arc<InMemorySource<Category>>,
    payment_modes: Arc<InMemorySource<PaymentMode>>,
    bank_accounts: Arc<InMemorySource<BankAccount>>,
}

impl TransactionReferences {
    fn check_category(&self, draft: &TransactionDraft) -> CoreResult<()> {
        let name = draft.category.trim();
        let categories = self.categories.records();
        let category = categories
            .iter()
            .find(|c| same_name(&c.name, name))
            .ok_or_else(|| CoreError::validation(format!("Unknown category '{}'", name)))?;
        if category.status != RecordStatus::Active {
            return Err(CoreError::validation(format!("Category '{}' is inactive", category.name)));
        }
        if category.kind != draft.kind {
            return Err(CoreError::validation(format!(
                "Category '{}' is for {} transactions, not {}",
                category.name, category.kind, draft.kind
            )));
        }
        Ok(())
    }

    fn check_payment_mode(&self, draft: &TransactionDraft) -> CoreResult<()> {
        let mode = draft.payment_mode.trim();
        if !self.payment_modes.records().iter().any(|m| same_name(&m.mode, mode)) {
            return Err(CoreError::validation(format!("Unknown payment mode '{}'", mode)));
        }
        Ok(())
    }

    /// Blank means no account
    fn check_bank_account(&self, draft: &TransactionDraft) -> CoreResult<()> {
        let bank = draft.bank_account.trim();
        if bank.is_empty() {
            return Ok(());
        }
        let accounts = self.bank_accounts.records();
        let mut named = accounts.iter().filter(|a| same_name(&a.bank_name, bank)).peekable();
        if named.peek().is_none() {
            return Err(CoreError::validation(format!("Unknown bank account '{}'", bank)));
        }
        if !named.any(|a| a.status == RecordStatus::Active) {
            return Err(CoreError::validation(format!("Bank account '{}' is inactive", bank)));
        }
        Ok(())
    }
}

impl ReferenceCheck<Transaction> for TransactionReferences {
    fn check(&self, draft: &TransactionDraft) -> CoreResult<()> {
        self.check_category(draft)?;
        self.check_payment_mode(draft)?;
        self.check_bank_account(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{Draft, TableRow};
    use crate::source::{Mutation, RemoteDataSource};
    use rust_decimal::Decimal;
    use ledgerdesk_config::Config;

    fn ledger() -> Ledger {
        let config = Config::default();
        Ledger::new(Fixtures::demo(), &config.tables, &config.data)
    }

    fn expense(category: &str, mode: &str, bank: &str) -> TransactionDraft {
        let mut draft = TransactionDraft::default();
        draft.set_field("date", "2024-05-02").unwrap();
        draft.set_field("amount", "420.00").unwrap();
        draft.set_field("type", "expense").unwrap();
        draft.set_field("category", category).unwrap();
        draft.set_field("payment_mode", mode).unwrap();
        draft.set_field("bank_account", bank).unwrap();
        draft
    }

    async fn create(ledger: &Ledger, draft: TransactionDraft) -> CoreResult<()> {
        ledger.transactions.mutate(Mutation::Create(draft)).await
    }

    #[tokio::test]
    async fn test_transaction_with_known_references_is_stored() {
        let ledger = ledger();
        let before = ledger.transactions.records().len();

        create(&ledger, expense("Groceries", "UPI", "HDFC Bank")).await.unwrap();
        create(&ledger, expense("rent", "cash", "")).await.unwrap();

        assert_eq!(ledger.transactions.records().len(), before + 2);
    }

    #[test]
    fn test_demo_transactions_reference_existing_rows() {
        let ledger = ledger();
        let references = TransactionReferences {
            categories: ledger.categories.clone(),
            payment_modes: ledger.payment_modes.clone(),
            bank_accounts: ledger.bank_accounts.clone(),
        };
        for transaction in ledger.transactions.records() {
            assert_eq!(references.check(&transaction.to_draft()), Ok(()), "#{}", transaction.id);
        }
    }

    #[tokio::test]
    async fn test_category_of_other_kind_rejected() {
        let ledger = ledger();
        let result = create(&ledger, expense("Salary", "UPI", "")).await;

        assert_eq!(
            result,
            Err(CoreError::validation(
                "Category 'Salary' is for income transactions, not expense"
            ))
        );
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let ledger = ledger();
        assert_eq!(
            create(&ledger, expense("Gadgets", "UPI", "")).await,
            Err(CoreError::validation("Unknown category 'Gadgets'"))
        );
    }

    #[tokio::test]
    async fn test_inactive_category_rejected() {
        let ledger = ledger();
        let health = ledger.categories.records().into_iter().find(|c| c.name == "Health").unwrap();
        ledger.categories.mutate(Mutation::ToggleStatus(health.id)).await.unwrap();

        assert_eq!(
            create(&ledger, expense("Health", "UPI", "")).await,
            Err(CoreError::validation("Category 'Health' is inactive"))
        );
    }

    #[tokio::test]
    async fn test_unknown_payment_mode_rejected() {
        let ledger = ledger();
        assert_eq!(
            create(&ledger, expense("Rent", "Carrier Pigeon", "")).await,
            Err(CoreError::validation("Unknown payment mode 'Carrier Pigeon'"))
        );
    }

    #[tokio::test]
    async fn test_unknown_or_inactive_bank_account_rejected() {
        let ledger = ledger();
        assert_eq!(
            create(&ledger, expense("Rent", "UPI", "Gringotts")).await,
            Err(CoreError::validation("Unknown bank account 'Gringotts'"))
        );

        let axis = ledger
            .bank_accounts
            .records()
            .into_iter()
            .find(|a| a.bank_name == "Axis Bank")
            .unwrap();
        ledger.bank_accounts.mutate(Mutation::ToggleStatus(axis.id)).await.unwrap();
        assert_eq!(
            create(&ledger, expense("Rent", "UPI", "Axis Bank")).await,
            Err(CoreError::validation("Bank account 'Axis Bank' is inactive"))
        );
    }

    #[tokio::test]
    async fn test_update_checks_references_too() {
        let ledger = ledger();
        let existing = ledger.transactions.records().remove(0);
        let mut draft = existing.to_draft();
        draft.set_field("payment_mode", "Barter").unwrap();

        let result = ledger.transactions.mutate(Mutation::Update(existing.id, draft)).await;

        assert_eq!(result, Err(CoreError::validation("Unknown payment mode 'Barter'")));
        assert_eq!(ledger.transactions.records()[0], existing);
    }

    #[tokio::test]
    async fn test_summary_follows_mutations() {
        let ledger = ledger();
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let before = ledger.summary(today);

        create(&ledger, expense("Rent", "UPI", "")).await.unwrap();
        ledger.payment_modes.mutate(Mutation::Delete(1)).await.unwrap();
        let after = ledger.summary(today);

        assert_eq!(after.payment_modes, before.payment_modes - 1);
        assert_eq!(after.categories, 9);
        assert_eq!(after.total_expenses - before.total_expenses, Decimal::new(42000, 2));
        assert_eq!(after.transaction_count, before.transaction_count + 1);
    }
}
