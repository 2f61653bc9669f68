//! Remote data source contract
//!
//! The controller treats its backend as a pure request/response service: a
//! `PageRequest` goes in, a `PageResult` comes out. Mutations are forwarded
//! unchanged and never inspected.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::row::TableRow;
use crate::types::RecordId;

pub use ledgerdesk_config::{SortDirection, SortSpec};

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Index of the first row; always a multiple of `count`
    pub offset: usize,
    /// Page size
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

impl PageRequest {
    /// Request for 1-based `page` of size `count`
    pub fn page(page: usize, count: usize) -> Self {
        Self {
            offset: page.saturating_sub(1) * count,
            count,
            sort: None,
            search_text: None,
        }
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_search(mut self, search_text: Option<String>) -> Self {
        self.search_text = search_text;
        self
    }
}

/// Response to a `PageRequest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<R> {
    /// Contiguous slice of the requested ordering, starting at the offset
    pub rows: Vec<R>,
    /// Rows matching the search text, ignoring offset and count
    pub total_matching: usize,
}

impl<R> PageResult<R> {
    pub fn new(rows: Vec<R>, total_matching: usize) -> Self {
        Self { rows, total_matching }
    }
}

/// Change forwarded to the backend
#[derive(Debug, Clone)]
pub enum Mutation<R: TableRow> {
    Create(R::Draft),
    Update(RecordId, R::Draft),
    Delete(RecordId),
    ToggleStatus(RecordId),
}

impl<R: TableRow> Mutation<R> {
    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Update(..) => "update",
            Mutation::Delete(_) => "delete",
            Mutation::ToggleStatus(_) => "toggle_status",
        }
    }
}

/// Backend serving pages of `R`
///
/// Failures are `CoreError::Transport` for connectivity problems and
/// `CoreError::Backend` for rejected requests. Callers never retry on their
/// own; retry policy belongs to the transport.
#[async_trait]
pub trait RemoteDataSource<R: TableRow>: Send + Sync {
    async fn query(&self, request: &PageRequest) -> CoreResult<PageResult<R>>;

    async fn mutate(&self, mutation: Mutation<R>) -> CoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offsets() {
        assert_eq!(PageRequest::page(1, 10).offset, 0);
        assert_eq!(PageRequest::page(3, 10).offset, 20);
        assert_eq!(PageRequest::page(0, 10).offset, 0);
    }

    #[test]
    fn test_page_request_serializes_without_empty_options() {
        let json = serde_json::to_value(PageRequest::page(2, 20)).unwrap();
        assert_eq!(json, serde_json::json!({ "offset": 20, "count": 20 }));

        let json = serde_json::to_value(
            PageRequest::page(1, 10)
                .with_sort(Some(SortSpec::ascending("name")))
                .with_search(Some("rent".to_string())),
        )
        .unwrap();
        assert_eq!(json["sort"]["direction"], "ascending");
        assert_eq!(json["search_text"], "rent");
    }
}
