//! Record models for the four master/ledger tables

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::row::{Draft, Record, TableRow};
use crate::types::{FieldValue, RecordId, RecordStatus, TransactionType};

fn parse_field<T: std::str::FromStr<Err = String>>(value: &str) -> CoreResult<T> {
    value.trim().parse::<T>().map_err(CoreError::validation)
}

fn unknown_field(table: &str, field: &str) -> CoreError {
    CoreError::validation(format!("{} has no field '{}'", table, field))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ==================== Category ====================

/// Income or expense category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub status: RecordStatus,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub kind: TransactionType,
    pub status: RecordStatus,
}

impl Draft for CategoryDraft {
    fn set_field(&mut self, field: &str, value: &str) -> CoreResult<()> {
        match field {
            "name" => self.name = value.to_string(),
            "kind" | "type" => self.kind = parse_field(value)?,
            "status" => self.status = parse_field(value)?,
            _ => return Err(unknown_field(Category::TABLE, field)),
        }
        Ok(())
    }

    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("Category name is required"));
        }
        Ok(())
    }
}

impl TableRow for Category {
    type Draft = CategoryDraft;
    const TABLE: &'static str = "categories";

    fn id(&self) -> RecordId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(FieldValue::text(&self.name)),
            "kind" | "type" => Some(FieldValue::text(self.kind.to_string())),
            "status" => Some(FieldValue::text(self.status.to_string())),
            "created_on" => Some(FieldValue::Timestamp(self.created_on)),
            "updated_on" => Some(FieldValue::Timestamp(self.updated_on)),
            _ => None,
        }
    }

    fn fields() -> &'static [&'static str] {
        &["name", "kind", "type", "status", "created_on", "updated_on"]
    }

    fn columns() -> &'static [&'static str] {
        &["name", "kind", "status", "created_on"]
    }

    fn to_draft(&self) -> CategoryDraft {
        CategoryDraft {
            name: self.name.clone(),
            kind: self.kind,
            status: self.status,
        }
    }
}

impl Record for Category {
    fn create(id: RecordId, draft: CategoryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            kind: draft.kind,
            status: draft.status,
            created_on: now,
            updated_on: now,
        }
    }

    fn apply(&mut self, draft: CategoryDraft, now: DateTime<Utc>) {
        self.name = draft.name.trim().to_string();
        self.kind = draft.kind;
        self.status = draft.status;
        self.updated_on = now;
    }

    fn toggle_status(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.status = self.status.toggled();
        self.updated_on = now;
        Ok(())
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

// ==================== Payment mode ====================

/// How a transaction was paid (cash, card, UPI, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMode {
    pub id: RecordId,
    pub mode: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentModeDraft {
    pub mode: String,
}

impl Draft for PaymentModeDraft {
    fn set_field(&mut self, field: &str, value: &str) -> CoreResult<()> {
        match field {
            "mode" | "name" => self.mode = value.to_string(),
            _ => return Err(unknown_field(PaymentMode::TABLE, field)),
        }
        Ok(())
    }

    fn validate(&self) -> CoreResult<()> {
        if self.mode.trim().is_empty() {
            return Err(CoreError::validation("Payment mode is required"));
        }
        Ok(())
    }
}

impl TableRow for PaymentMode {
    type Draft = PaymentModeDraft;
    const TABLE: &'static str = "payment_modes";

    fn id(&self) -> RecordId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "mode" => Some(FieldValue::text(&self.mode)),
            "created_on" => Some(FieldValue::Timestamp(self.created_on)),
            "updated_on" => Some(FieldValue::Timestamp(self.updated_on)),
            _ => None,
        }
    }

    fn fields() -> &'static [&'static str] {
        &["mode", "created_on", "updated_on"]
    }

    fn columns() -> &'static [&'static str] {
        &["mode", "created_on"]
    }

    fn to_draft(&self) -> PaymentModeDraft {
        PaymentModeDraft {
            mode: self.mode.clone(),
        }
    }
}

impl Record for PaymentMode {
    fn create(id: RecordId, draft: PaymentModeDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            mode: draft.mode.trim().to_string(),
            created_on: now,
            updated_on: now,
        }
    }

    fn apply(&mut self, draft: PaymentModeDraft, now: DateTime<Utc>) {
        self.mode = draft.mode.trim().to_string();
        self.updated_on = now;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.mode.clone())
    }
}

// ==================== Bank account ====================

/// Bank account a transaction may be booked against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: RecordId,
    pub bank_name: String,
    pub holder_name: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub ifsc_code: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankAccountDraft {
    pub bank_name: String,
    pub holder_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub branch: String,
    pub status: RecordStatus,
}

impl Draft for BankAccountDraft {
    fn set_field(&mut self, field: &str, value: &str) -> CoreResult<()> {
        match field {
            "bank_name" => self.bank_name = value.to_string(),
            "holder_name" => self.holder_name = value.to_string(),
            "account_number" => self.account_number = value.to_string(),
            "ifsc_code" => self.ifsc_code = value.to_string(),
            "branch" => self.branch = value.to_string(),
            "status" => self.status = parse_field(value)?,
            _ => return Err(unknown_field(BankAccount::TABLE, field)),
        }
        Ok(())
    }

    fn validate(&self) -> CoreResult<()> {
        if self.bank_name.trim().is_empty() || self.holder_name.trim().is_empty() {
            return Err(CoreError::validation("Bank Name and Holder Name are required"));
        }
        Ok(())
    }
}

impl TableRow for BankAccount {
    type Draft = BankAccountDraft;
    const TABLE: &'static str = "bank_accounts";

    fn id(&self) -> RecordId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "bank_name" => Some(FieldValue::text(&self.bank_name)),
            "holder_name" => Some(FieldValue::text(&self.holder_name)),
            "account_number" => Some(FieldValue::optional_text(self.account_number.as_deref())),
            "ifsc_code" => Some(FieldValue::optional_text(self.ifsc_code.as_deref())),
            "branch" => Some(FieldValue::optional_text(self.branch.as_deref())),
            "status" => Some(FieldValue::text(self.status.to_string())),
            "created_on" => Some(FieldValue::Timestamp(self.created_on)),
            "updated_on" => Some(FieldValue::Timestamp(self.updated_on)),
            _ => None,
        }
    }

    fn fields() -> &'static [&'static str] {
        &[
            "bank_name",
            "holder_name",
            "account_number",
            "ifsc_code",
            "branch",
            "status",
            "created_on",
            "updated_on",
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["bank_name", "holder_name", "account_number", "ifsc_code", "branch", "status"]
    }

    fn to_draft(&self) -> BankAccountDraft {
        BankAccountDraft {
            bank_name: self.bank_name.clone(),
            holder_name: self.holder_name.clone(),
            account_number: self.account_number.clone().unwrap_or_default(),
            ifsc_code: self.ifsc_code.clone().unwrap_or_default(),
            branch: self.branch.clone().unwrap_or_default(),
            status: self.status,
        }
    }
}

impl Record for BankAccount {
    fn create(id: RecordId, draft: BankAccountDraft, now: DateTime<Utc>) -> Self {
        let mut account = Self {
            id,
            bank_name: String::new(),
            holder_name: String::new(),
            account_number: None,
            ifsc_code: None,
            branch: None,
            status: draft.status,
            created_on: now,
            updated_on: now,
        };
        account.apply(draft, now);
        account
    }

    fn apply(&mut self, draft: BankAccountDraft, now: DateTime<Utc>) {
        self.bank_name = draft.bank_name.trim().to_string();
        self.holder_name = draft.holder_name.trim().to_string();
        self.account_number = non_empty(&draft.account_number);
        self.ifsc_code = non_empty(&draft.ifsc_code);
        self.branch = non_empty(&draft.branch);
        self.status = draft.status;
        self.updated_on = now;
    }

    fn toggle_status(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.status = self.status.toggled();
        self.updated_on = now;
        Ok(())
    }
}

// ==================== Transaction ====================

/// A single income or expense entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub transaction_date: NaiveDate,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Category name
    #[serde(default)]
    pub category: Option<String>,
    /// Payment mode name
    #[serde(default)]
    pub payment_mode: Option<String>,
    /// Bank name, when booked against an account
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl Transaction {
    /// Amount with its sign applied: expenses are negative
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDraft {
    pub transaction_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub kind: TransactionType,
    pub category: String,
    pub payment_mode: String,
    pub bank_account: String,
    pub description: String,
}

impl Draft for TransactionDraft {
    fn set_field(&mut self, field: &str, value: &str) -> CoreResult<()> {
        match field {
            "transaction_date" | "date" => {
                let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                    .map_err(|_| CoreError::validation(format!("Invalid date '{}', expected YYYY-MM-DD", value)))?;
                self.transaction_date = Some(date);
            }
            "amount" => {
                let amount = value
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|_| CoreError::validation("Please enter a valid amount"))?;
                self.amount = Some(amount);
            }
            "kind" | "type" => self.kind = parse_field(value)?,
            "category" => self.category = value.to_string(),
            "payment_mode" => self.payment_mode = value.to_string(),
            "bank_account" => self.bank_account = value.to_string(),
            "description" => self.description = value.to_string(),
            _ => return Err(unknown_field(Transaction::TABLE, field)),
        }
        Ok(())
    }

    fn validate(&self) -> CoreResult<()> {
        if self.transaction_date.is_none() {
            return Err(CoreError::validation("Please select a date"));
        }
        match self.amount {
            Some(amount) if amount > Decimal::ZERO => {}
            _ => return Err(CoreError::validation("Please enter a valid amount")),
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::validation("Please select a category"));
        }
        if self.payment_mode.trim().is_empty() {
            return Err(CoreError::validation("Please select a payment mode"));
        }
        Ok(())
    }
}

impl TableRow for Transaction {
    type Draft = TransactionDraft;
    const TABLE: &'static str = "transactions";

    fn id(&self) -> RecordId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "transaction_date" | "date" => Some(FieldValue::Date(self.transaction_date)),
            "amount" => Some(FieldValue::Amount(self.amount)),
            "kind" | "type" => Some(FieldValue::text(self.kind.to_string())),
            "category" => Some(FieldValue::optional_text(self.category.as_deref())),
            "payment_mode" => Some(FieldValue::optional_text(self.payment_mode.as_deref())),
            "bank_account" => Some(FieldValue::optional_text(self.bank_account.as_deref())),
            "description" => Some(FieldValue::optional_text(self.description.as_deref())),
            "created_on" => Some(FieldValue::Timestamp(self.created_on)),
            _ => None,
        }
    }

    fn fields() -> &'static [&'static str] {
        &[
            "transaction_date",
            "date",
            "amount",
            "kind",
            "type",
            "category",
            "payment_mode",
            "bank_account",
            "description",
            "created_on",
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["transaction_date", "kind", "category", "payment_mode", "bank_account", "description", "amount"]
    }

    fn to_draft(&self) -> TransactionDraft {
        TransactionDraft {
            transaction_date: Some(self.transaction_date),
            amount: Some(self.amount),
            kind: self.kind,
            category: self.category.clone().unwrap_or_default(),
            payment_mode: self.payment_mode.clone().unwrap_or_default(),
            bank_account: self.bank_account.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
        }
    }
}

impl Record for Transaction {
    fn create(id: RecordId, draft: TransactionDraft, now: DateTime<Utc>) -> Self {
        let mut transaction = Self {
            id,
            transaction_date: now.date_naive(),
            amount: Decimal::ZERO,
            kind: draft.kind,
            category: None,
            payment_mode: None,
            bank_account: None,
            description: None,
            created_on: now,
        };
        transaction.apply(draft, now);
        transaction
    }

    fn apply(&mut self, draft: TransactionDraft, _now: DateTime<Utc>) {
        if let Some(date) = draft.transaction_date {
            self.transaction_date = date;
        }
        if let Some(amount) = draft.amount {
            self.amount = amount;
        }
        self.kind = draft.kind;
        self.category = non_empty(&draft.category);
        self.payment_mode = non_empty(&draft.payment_mode);
        self.bank_account = non_empty(&draft.bank_account);
        self.description = non_empty(&draft.description);
    }
}

// ==================== Tests ====================
