//! Row traits shared by the controller, the editor and data sources

use chrono::{DateTime, Utc};
use std::fmt::Debug;

use crate::error::{CoreError, CoreResult};
use crate::types::{FieldValue, RecordId};

/// Form values for creating or updating a record
pub trait Draft: Default + Clone + Debug + Send + Sync + 'static {
    /// Set one form field from user input
    fn set_field(&mut self, field: &str, value: &str) -> CoreResult<()>;

    /// Check the form before it is submitted
    fn validate(&self) -> CoreResult<()>;
}

/// A row displayed by a paged table
pub trait TableRow: Clone + Debug + Send + Sync + 'static {
    type Draft: Draft;

    /// Table name, used in logs and error context
    const TABLE: &'static str;

    fn id(&self) -> RecordId;

    /// Value of a named field, `None` when the row has no such field
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Every name `field` answers to, aliases included
    fn fields() -> &'static [&'static str];

    /// Fields shown as columns, in display order
    fn columns() -> &'static [&'static str];

    /// Pre-filled form for editing this row
    fn to_draft(&self) -> Self::Draft;
}

/// A row a backend can create and modify
pub trait Record: TableRow {
    fn create(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    fn apply(&mut self, draft: Self::Draft, now: DateTime<Utc>);

    fn toggle_status(&mut self, _now: DateTime<Utc>) -> CoreResult<()> {
        Err(CoreError::NotSupported {
            operation: format!("toggle status of {}", Self::TABLE),
        })
    }

    /// Key that must be unique across the table, compared case-insensitively
    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// Whether any of `fields` contains `text`, ignoring case. Empty text matches every row.
pub fn matches_search<R: TableRow>(row: &R, fields: &[String], text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .filter_map(|field| row.field(field))
        .any(|value| value.contains(&needle))
}

/// Rows matching `text`, order preserved
pub fn filter_rows<R: TableRow>(rows: &[R], fields: &[String], text: &str) -> Vec<R> {
    rows.iter()
        .filter(|row| matches_search(*row, fields, text))
        .cloned()
        .collect()
}
