//! Record models, data source contract and the paged table controller

pub mod controller;
pub mod editor;
pub mod error;
pub mod fixtures;
pub mod ledger;
pub mod models;
pub mod report;
pub mod row;
pub mod source;
pub mod store;
pub mod types;

pub use controller::{Outcome, PagedTableController, Seed, SkipReason, TableSnapshot, TableStatus};
pub use editor::{EditorMode, EditorSession};
pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger, ErrorSeverity};
pub use fixtures::Fixtures;
pub use ledger::Ledger;
pub use models::{
    BankAccount, BankAccountDraft, Category, CategoryDraft, PaymentMode, PaymentModeDraft, Transaction,
    TransactionDraft,
};
pub use report::{MonthRange, MonthSummary};
pub use row::{Draft, Record, TableRow};
pub use source::{Mutation, PageRequest, PageResult, RemoteDataSource, SortDirection, SortSpec};
pub use store::{InMemorySource, ReferenceCheck};
pub use types::{FieldValue, RecordId, RecordStatus, TransactionType};
