//! Paged, sorted and searchable table controller
//!
//! One `PagedTableController` backs one list view. It turns user intent
//! (page, page size, sort column, search text, "data changed") into a single
//! `PageRequest`, sends it to the injected `RemoteDataSource`, and replaces
//! the displayed page only with the result of the most recently issued
//! request.
//!
//! Ordering:
//! - every issued request bumps a generation counter; a response is applied
//!   only while its generation is still current, stale ones are dropped
//! - no lock is held across an await, so operations on `&self` may be
//!   interleaved freely on one task
//! - the in-flight marker is cleared on success, on failure, and when the
//!   caller drops an operation before its response arrives
//! - after `destroy` nothing is applied or published any more

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use ledgerdesk_config::{PagingPolicy, SearchPolicy, SortSpec, TableConfig};

use crate::error::{CoreError, CoreResult};
use crate::row::{filter_rows, TableRow};
use crate::source::{Mutation, PageRequest, PageResult, RemoteDataSource};

/// How many times a request may be moved back to the last valid page
const MAX_CLAMPS: usize = 3;

/// Loading state of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Nothing loaded and nothing in flight
    Idle,
    /// First load in flight
    InitialLoading,
    /// A page is displayed and a newer one is in flight
    Paging,
    Ready,
}

/// Why an operation left the table untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The requested value is already in effect
    Unchanged,
    /// A fetch is outstanding and the paging policy drops new requests
    Busy,
    AlreadyInitialized,
    Destroyed,
}

/// Result of a controller operation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The table now shows the result of this operation
    Applied,
    /// Nothing was fetched
    Skipped(SkipReason),
    /// A newer request was issued before this one's response arrived
    Superseded,
}

/// First page rendered ahead of time, adopted without a fetch
#[derive(Debug, Clone)]
pub struct Seed<R> {
    pub rows: Vec<R>,
    pub total: usize,
}

impl<R: TableRow> Seed<R> {
    /// Fetch the page a fresh controller with `options` would load first
    pub async fn first_page(source: &dyn RemoteDataSource<R>, options: &TableConfig) -> CoreResult<Self> {
        let request = PageRequest::page(1, options.default_page_size).with_sort(options.default_sort.clone());
        let page = source.query(&request).await?;
        debug!("{}: prefetched {} row(s) of {}", R::TABLE, page.rows.len(), page.total_matching);
        Ok(Self {
            rows: page.rows,
            total: page.total_matching,
        })
    }
}

/// Read-only view of a table
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot<R> {
    pub rows: Vec<R>,
    pub total_count: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub sort: Option<SortSpec>,
    pub search_text: String,
    pub status: TableStatus,
}

impl<R> TableSnapshot<R> {
    pub fn is_loading(&self) -> bool {
        matches!(self.status, TableStatus::InitialLoading | TableStatus::Paging)
    }
}

/// Number of pages needed for `total` rows
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Next state of the three-way sort toggle for `field`
pub fn next_sort(current: Option<&SortSpec>, field: &str) -> Option<SortSpec> {
    match current {
        Some(sort) if sort.field == field => match sort.direction {
            ledgerdesk_config::SortDirection::Ascending => Some(SortSpec::descending(field)),
            ledgerdesk_config::SortDirection::Descending => None,
        },
        _ => Some(SortSpec::ascending(field)),
    }
}

/// What is on screen
struct View<R> {
    /// Rows exactly as the source returned them
    fetched: Vec<R>,
    /// `fetched` after client-side search
    rows: Vec<R>,
    total: usize,
    page: usize,
    page_size: usize,
    sort: Option<SortSpec>,
}

/// What the user asked for last
struct Intent {
    page: usize,
    page_size: usize,
    sort: Option<SortSpec>,
    search_text: String,
}

struct ControllerState<R> {
    view: View<R>,
    intent: Intent,
    status: TableStatus,
    generation: u64,
    in_flight: Option<u64>,
    loaded: bool,
    live: bool,
}

struct Ticket {
    generation: u64,
    page: usize,
    request: PageRequest,
    clamps: usize,
}

enum Settled {
    Applied,
    Stale,
    Reissue(Ticket),
}

/// Clears the in-flight marker if the owning operation is dropped mid-fetch
struct InFlightGuard<'a, R: TableRow> {
    controller: &'a PagedTableController<R>,
    generation: u64,
    armed: bool,
}

impl<R: TableRow> Drop for InFlightGuard<'_, R> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.abandon(self.generation);
        }
    }
}

/// Pagination, sort and search state of one list view
pub struct PagedTableController<R: TableRow> {
    options: TableConfig,
    source: Arc<dyn RemoteDataSource<R>>,
    state: Mutex<ControllerState<R>>,
    snapshots: watch::Sender<TableSnapshot<R>>,
}

impl<R: TableRow> PagedTableController<R> {
    pub fn new(source: Arc<dyn RemoteDataSource<R>>, options: TableConfig) -> CoreResult<Self> {
        if options.default_page_size == 0 || !options.allows_page_size(options.default_page_size) {
            return Err(CoreError::Config {
                message: format!(
                    "{}: default page size {} is not one of {:?}",
                    R::TABLE, options.default_page_size, options.page_size_options
                ),
            });
        }

        let state = ControllerState {
            view: View {
                fetched: Vec::new(),
                rows: Vec::new(),
                total: 0,
                page: 1,
                page_size: options.default_page_size,
                sort: None,
            },
            intent: Intent {
                page: 1,
                page_size: options.default_page_size,
                sort: None,
                search_text: String::new(),
            },
            status: TableStatus::Idle,
            generation: 0,
            in_flight: None,
            loaded: false,
            live: true,
        };
        let (snapshots, _) = watch::channel(Self::build_snapshot(&state));

        Ok(Self {
            options,
            source,
            state: Mutex::new(state),
            snapshots,
        })
    }

    pub fn options(&self) -> &TableConfig {
        &self.options
    }

    /// Current state of the table
    pub fn snapshot(&self) -> TableSnapshot<R> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<TableSnapshot<R>> {
        self.snapshots.subscribe()
    }

    pub fn is_live(&self) -> bool {
        self.lock().live
    }

    /// Adopt `seed` as the first page, or fetch page 1 when there is none
    pub async fn initialize(&self, seed: Option<Seed<R>>) -> CoreResult<Outcome> {
        let ticket = {
            let mut state = self.lock();
            if !state.live {
                return Ok(Outcome::Skipped(SkipReason::Destroyed));
            }
            if state.loaded || state.in_flight.is_some() {
                return Ok(Outcome::Skipped(SkipReason::AlreadyInitialized));
            }
            match seed {
                Some(seed) => {
                    self.adopt_seed(&mut state, seed);
                    return Ok(Outcome::Applied);
                }
                None => self.issue(&mut state, 1),
            }
        };
        self.run(ticket).await
    }

    /// Show page `page` (1-based)
    pub async fn go_to_page(&self, page: usize) -> CoreResult<Outcome> {
        let ticket = {
            let mut state = self.lock();
            if !state.live {
                return Ok(Outcome::Skipped(SkipReason::Destroyed));
            }
            if page == state.intent.page {
                return Ok(Outcome::Skipped(SkipReason::Unchanged));
            }
            let pages = total_pages(state.view.total, state.intent.page_size);
            if page < 1 || page > pages {
                return Err(CoreError::validation(format!(
                    "page {} is out of range, {} has {} page(s)",
                    page, R::TABLE, pages
                )));
            }
            if self.is_busy(&state) {
                debug!("{}: dropping page {} request, fetch in flight", R::TABLE, page);
                return Ok(Outcome::Skipped(SkipReason::Busy));
            }
            self.issue(&mut state, page)
        };
        self.run(ticket).await
    }

    /// Switch to `page_size` rows per page and return to the first page.
    ///
    /// Under `LatestWins` this supersedes an outstanding fetch; under
    /// `DropWhileBusy` it is skipped while one is in flight.
    pub async fn change_page_size(&self, page_size: usize) -> CoreResult<Outcome> {
        let ticket = {
            let mut state = self.lock();
            if !state.live {
                return Ok(Outcome::Skipped(SkipReason::Destroyed));
            }
            if !self.options.allows_page_size(page_size) {
                return Err(CoreError::validation(format!(
                    "page size {} is not one of {:?}",
                    page_size, self.options.page_size_options
                )));
            }
            if page_size == state.intent.page_size {
                return Ok(Outcome::Skipped(SkipReason::Unchanged));
            }
            if self.is_busy(&state) {
                debug!("{}: dropping page size {} request, fetch in flight", R::TABLE, page_size);
                return Ok(Outcome::Skipped(SkipReason::Busy));
            }
            state.intent.page_size = page_size;
            self.issue(&mut state, 1)
        };
        self.run(ticket).await
    }

    /// Cycle `field` through ascending, descending and unsorted. The page is kept.
    pub async fn toggle_sort(&self, field: &str) -> CoreResult<Outcome> {
        let ticket = {
            let mut state = self.lock();
            if !state.live {
                return Ok(Outcome::Skipped(SkipReason::Destroyed));
            }
            if field.trim().is_empty() {
                return Err(CoreError::validation("sort field must not be empty"));
            }
            state.intent.sort = next_sort(state.intent.sort.as_ref(), field);
            let page = state.intent.page;
            self.issue(&mut state, page)
        };
        self.run(ticket).await
    }

    /// Update the search text and resolve it according to the search policy
    pub async fn set_search_text(&self, text: &str) -> CoreResult<Outcome> {
        let ticket = {
            let mut state = self.lock();
            if !state.live {
                return Ok(Outcome::Skipped(SkipReason::Destroyed));
            }
            if text == state.intent.search_text {
                return Ok(Outcome::Skipped(SkipReason::Unchanged));
            }
            state.intent.search_text = text.to_string();
            match self.options.search_policy {
                SearchPolicy::Client => {
                    state.view.rows = filter_rows(&state.view.fetched, &self.options.searchable_fields, text);
                    self.publish(&state);
                    return Ok(Outcome::Applied);
                }
                SearchPolicy::Server => self.issue(&mut state, 1),
            }
        };
        self.run(ticket).await
    }

    /// Re-fetch the current page after the underlying data changed
    pub async fn notify_mutation(&self) -> CoreResult<Outcome> {
        let ticket = {
            let mut state = self.lock();
            if !state.live {
                return Ok(Outcome::Skipped(SkipReason::Destroyed));
            }
            let page = state.intent.page;
            self.issue(&mut state, page)
        };
        self.run(ticket).await
    }

    /// Forward `mutation` to the source, then refresh the current page
    pub async fn mutate(&self, mutation: Mutation<R>) -> CoreResult<Outcome> {
        if !self.is_live() {
            return Ok(Outcome::Skipped(SkipReason::Destroyed));
        }
        let label = mutation.label();
        if let Err(error) = self.source.mutate(mutation).await {
            warn!("{}: {} failed: {}", R::TABLE, label, error);
            return Err(error);
        }
        info!("{}: {} succeeded", R::TABLE, label);
        self.notify_mutation().await
    }

    /// Detach from the view; later responses and operations are ignored
    pub fn destroy(&self) {
        let mut state = self.lock();
        if state.live {
            debug!("{}: destroyed at generation {}", R::TABLE, state.generation);
        }
        state.live = false;
        state.in_flight = None;
    }

    // ==================== Internals ====================

    fn lock(&self) -> MutexGuard<'_, ControllerState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_busy(&self, state: &ControllerState<R>) -> bool {
        self.options.paging_policy == PagingPolicy::DropWhileBusy && state.in_flight.is_some()
    }

    fn adopt_seed(&self, state: &mut ControllerState<R>, seed: Seed<R>) {
        let mut rows = seed.rows;
        rows.truncate(state.intent.page_size);
        state.view.total = seed.total.max(rows.len());
        state.view.rows = self.visible_rows(&rows, &state.intent.search_text);
        state.view.fetched = rows;
        state.view.page = 1;
        state.intent.page = 1;
        state.loaded = true;
        state.status = TableStatus::Ready;
        debug!("{}: adopted seed of {} row(s), total {}", R::TABLE, state.view.fetched.len(), state.view.total);
        self.publish(state);
    }

    fn visible_rows(&self, rows: &[R], search_text: &str) -> Vec<R> {
        match self.options.search_policy {
            SearchPolicy::Client => filter_rows(rows, &self.options.searchable_fields, search_text),
            SearchPolicy::Server => rows.to_vec(),
        }
    }

    fn issue(&self, state: &mut ControllerState<R>, page: usize) -> Ticket {
        state.generation += 1;
        state.in_flight = Some(state.generation);
        state.intent.page = page;
        state.status = if state.loaded {
            TableStatus::Paging
        } else {
            TableStatus::InitialLoading
        };

        let sort = state.intent.sort.clone().or_else(|| self.options.default_sort.clone());
        let search = match self.options.search_policy {
            SearchPolicy::Server if !state.intent.search_text.is_empty() => Some(state.intent.search_text.clone()),
            _ => None,
        };
        let request = PageRequest::page(page, state.intent.page_size)
            .with_sort(sort)
            .with_search(search);

        debug!(
            "{}: issuing generation {} offset={} count={} sort={:?} search={:?}",
            R::TABLE, state.generation, request.offset, request.count, request.sort, request.search_text
        );
        self.publish(state);

        Ticket {
            generation: state.generation,
            page,
            request,
            clamps: 0,
        }
    }

    async fn run(&self, mut ticket: Ticket) -> CoreResult<Outcome> {
        loop {
            let mut guard = InFlightGuard {
                controller: self,
                generation: ticket.generation,
                armed: true,
            };
            let result = self.source.query(&ticket.request).await;
            guard.armed = false;

            match self.settle(ticket, result)? {
                Settled::Applied => return Ok(Outcome::Applied),
                Settled::Stale => return Ok(Outcome::Superseded),
                Settled::Reissue(next) => ticket = next,
            }
        }
    }

    fn settle(&self, ticket: Ticket, result: CoreResult<PageResult<R>>) -> CoreResult<Settled> {
        let mut state = self.lock();
        if !state.live {
            debug!("{}: discarding generation {} after destroy", R::TABLE, ticket.generation);
            return Ok(Settled::Stale);
        }
        if state.generation != ticket.generation {
            debug!(
                "{}: discarding generation {}, superseded by {}",
                R::TABLE, ticket.generation, state.generation
            );
            return Ok(Settled::Stale);
        }

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                warn!("{}: fetch of generation {} failed: {}", R::TABLE, ticket.generation, error);
                self.settle_idle(&mut state);
                self.publish(&state);
                return Err(error);
            }
        };

        let offset = ticket.request.offset;
        if page.rows.is_empty() && offset > 0 && offset >= page.total_matching {
            if ticket.clamps >= MAX_CLAMPS {
                self.settle_idle(&mut state);
                self.publish(&state);
                return Err(CoreError::backend(format!(
                    "offset {} still beyond {} matching row(s) after {} attempts",
                    offset, page.total_matching, MAX_CLAMPS
                )));
            }
            let last_page = total_pages(page.total_matching, ticket.request.count).max(1);
            debug!(
                "{}: page {} is past the end of {} row(s), moving to page {}",
                R::TABLE, ticket.page, page.total_matching, last_page
            );
            let mut next = self.issue(&mut state, last_page);
            next.clamps = ticket.clamps + 1;
            return Ok(Settled::Reissue(next));
        }

        state.view.rows = self.visible_rows(&page.rows, &state.intent.search_text);
        state.view.fetched = page.rows;
        state.view.total = page.total_matching;
        state.view.page = ticket.page;
        state.view.page_size = ticket.request.count;
        state.view.sort = state.intent.sort.clone();
        state.in_flight = None;
        state.loaded = true;
        state.status = TableStatus::Ready;
        debug!(
            "{}: applied generation {} page {} ({} row(s) of {})",
            R::TABLE, ticket.generation, ticket.page, state.view.fetched.len(), state.view.total
        );
        self.publish(&state);
        Ok(Settled::Applied)
    }

    /// Stop loading and fall back to the parameters of the displayed page
    fn settle_idle(&self, state: &mut ControllerState<R>) {
        state.in_flight = None;
        state.status = if state.loaded {
            TableStatus::Ready
        } else {
            TableStatus::Idle
        };
        state.intent.page = state.view.page;
        state.intent.page_size = state.view.page_size;
        state.intent.sort = state.view.sort.clone();
    }

    fn abandon(&self, generation: u64) {
        let mut state = self.lock();
        if state.live && state.in_flight == Some(generation) {
            debug!("{}: generation {} abandoned before its response", R::TABLE, generation);
            self.settle_idle(&mut state);
            self.publish(&state);
        }
    }

    fn publish(&self, state: &ControllerState<R>) {
        if state.live {
            self.snapshots.send_replace(Self::build_snapshot(state));
        }
    }

    fn build_snapshot(state: &ControllerState<R>) -> TableSnapshot<R> {
        TableSnapshot {
            rows: state.view.rows.clone(),
            total_count: state.view.total,
            current_page: state.view.page,
            page_size: state.view.page_size,
            total_pages: total_pages(state.view.total, state.view.page_size),
            sort: state.intent.sort.clone(),
            search_text: state.intent.search_text.clone(),
            status: state.status,
        }
    }
}

// ==================== Tests ====================
