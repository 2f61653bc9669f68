//! In-memory backend
//!
//! Serves pages of any `Record` table from a `Vec`, applying search, sort and
//! slicing the same way a remote service would. Used by the terminal client
//! and as a realistic source in tests.

use chrono::Utc;
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ledgerdesk_config::{DataConfig, SortDirection, TableConfig};

use crate::error::{CoreError, CoreResult};
use crate::row::{matches_search, Draft, Record, TableRow};
use crate::source::{Mutation, PageRequest, PageResult, RemoteDataSource};
use crate::types::{FieldValue, RecordId};

/// Checks a draft against records held by other tables
pub trait ReferenceCheck<R: TableRow>: Send + Sync {
    fn check(&self, draft: &R::Draft) -> CoreResult<()>;
}

struct StoreInner<R> {
    /// Insertion order, oldest first
    records: Vec<R>,
    next_id: RecordId,
}

/// Records of one table held in memory
pub struct InMemorySource<R: Record> {
    inner: Mutex<StoreInner<R>>,
    searchable_fields: Vec<String>,
    latency: Duration,
    references: Option<Arc<dyn ReferenceCheck<R>>>,
}

impl<R: Record> InMemorySource<R> {
    pub fn new(records: Vec<R>, searchable_fields: Vec<String>) -> Self {
        let next_id = records.iter().map(|r| r.id()).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(StoreInner { records, next_id }),
            searchable_fields,
            latency: Duration::ZERO,
            references: None,
        }
    }

    /// Source configured from the table and data sections
    pub fn from_config(records: Vec<R>, table: &TableConfig, data: &DataConfig) -> Self {
        Self::new(records, table.searchable_fields.clone()).with_latency(Duration::from_millis(data.latency_ms))
    }

    /// Delay every call by `latency`, to mimic a network round trip
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Run `references` on every created or updated draft
    pub fn with_references(mut self, references: Arc<dyn ReferenceCheck<R>>) -> Self {
        self.references = Some(references);
        self
    }

    /// Copy of every record, oldest first
    pub fn records(&self) -> Vec<R> {
        self.lock().records.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn serve(&self, request: &PageRequest) -> CoreResult<PageResult<R>> {
        if request.count == 0 {
            return Err(CoreError::backend("page size must be positive"));
        }
        if let Some(sort) = &request.sort {
            if !R::fields().contains(&sort.field.as_str()) {
                return Err(CoreError::backend(format!("unsupported sort field: {}", sort.field)));
            }
        }
        let inner = self.lock();
        let text = request.search_text.as_deref().unwrap_or("");

        // Newest first unless a sort is requested
        let mut matching: Vec<&R> = inner
            .records
            .iter()
            .rev()
            .filter(|r| matches_search(*r, &self.searchable_fields, text))
            .collect();

        if let Some(sort) = &request.sort {
            let mut keyed: Vec<(FieldValue, &R)> = matching
                .into_iter()
                .map(|record| (record.field(&sort.field).unwrap_or(FieldValue::Missing), record))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| match sort.direction {
                SortDirection::Ascending => a.cmp(b),
                SortDirection::Descending => b.cmp(a),
            });
            matching = keyed.into_iter().map(|(_, record)| record).collect();
        }

        let total = matching.len();
        let rows: Vec<R> = matching
            .into_iter()
            .skip(request.offset)
            .take(request.count)
            .cloned()
            .collect();
        debug!(
            "{}: served offset={} count={} -> {} row(s) of {}",
            R::TABLE,
            request.offset,
            request.count,
            rows.len(),
            total
        );
        Ok(PageResult::new(rows, total))
    }

    fn apply_mutation(&self, mutation: Mutation<R>) -> CoreResult<()> {
        if let Mutation::Create(draft) | Mutation::Update(_, draft) = &mutation {
            draft.validate()?;
            if let Some(references) = &self.references {
                references.check(draft)?;
            }
        }

        let now = Utc::now();
        let mut inner = self.lock();
        match mutation {
            Mutation::Create(draft) => {
                let record = R::create(inner.next_id, draft, now);
                ensure_unique(&inner.records, &record)?;
                info!("{}: created #{}", R::TABLE, record.id());
                inner.next_id += 1;
                inner.records.push(record);
            }
            Mutation::Update(id, draft) => {
                let index = position(&inner.records, id)?;
                let mut updated = inner.records[index].clone();
                updated.apply(draft, now);
                ensure_unique(&inner.records, &updated)?;
                inner.records[index] = updated;
                info!("{}: updated #{}", R::TABLE, id);
            }
            Mutation::Delete(id) => {
                let index = position(&inner.records, id)?;
                inner.records.remove(index);
                info!("{}: deleted #{}", R::TABLE, id);
            }
            Mutation::ToggleStatus(id) => {
                let index = position(&inner.records, id)?;
                inner.records[index].toggle_status(now)?;
                info!("{}: toggled status of #{}", R::TABLE, id);
            }
        }
        Ok(())
    }
}

fn position<R: Record>(records: &[R], id: RecordId) -> CoreResult<usize> {
    records
        .iter()
        .position(|r| r.id() == id)
        .ok_or(CoreError::NotFound { id })
}

fn ensure_unique<R: Record>(records: &[R], candidate: &R) -> CoreResult<()> {
    let Some(key) = candidate.unique_key() else {
        return Ok(());
    };
    let lowered = key.to_lowercase();
    let clash = records.iter().any(|other| {
        other.id() != candidate.id()
            && other
                .unique_key()
                .map(|k| k.to_lowercase() == lowered)
                .unwrap_or(false)
    });
    if clash {
        return Err(CoreError::DuplicateEntry { entry: key });
    }
    Ok(())
}

#[async_trait]
impl<R: Record> RemoteDataSource<R> for InMemorySource<R> {
    async fn query(&self, request: &PageRequest) -> CoreResult<PageResult<R>> {
        self.simulate_latency().await;
        self.serve(request)
    }

    async fn mutate(&self, mutation: Mutation<R>) -> CoreResult<()> {
        self.simulate_latency().await;
        self.apply_mutation(mutation)
    }
}
