//! The run list: filters, cursor pagination and countdown polling for one
//! pipeline.
//!
//! [`RunListView`] never performs I/O. Operations that need data queue a
//! [`FetchTicket`]; the event loop takes it with
//! [`RunListView::take_pending_fetch`], runs the query and hands the outcome
//! back through [`RunListView::complete`]. Only the most recently issued
//! ticket is applied, so a slow response can never overwrite a newer one.

use crate::countdown::{Countdown, CountdownState, POLL_INTERVAL};
use crate::dagit::model::{RunRecord, RunsQueryResult, RunsRequest};
use crate::filter::{self, FilterToken, RunFilterTokenType};
use crate::pagination::{self, CursorPagination, Direction, PAGE_SIZE};
use crate::path::{PathError, PipelinePath};
use crate::persist::FilterStore;
use std::time::Duration;

/// Transport failures arrive as their display message.
pub type FetchOutcome = Result<RunsQueryResult, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub request: RunsRequest,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewConfig {
    pub page_size: usize,
    pub poll_interval: Duration,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            poll_interval: POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    /// Nothing has resolved yet.
    Loading,
    Loaded(Vec<RunRecord>),
    /// The server rejected the filter.
    QueryError(String),
    BackendError(String),
    NetworkError(String),
}

pub struct RunListView {
    path: PipelinePath,
    tokens: Vec<FilterToken>,
    store: Box<dyn FilterStore>,
    pagination: CursorPagination,
    countdown: Countdown,
    status: ViewStatus,
    last_ticket: u64,
    in_flight: Option<u64>,
    pending: Option<FetchTicket>,
    mounted: bool,
}

impl RunListView {
    /// Mounts the view: restores persisted filters and queues the first
    /// fetch.
    pub fn initialize(
        pipeline_path: &str,
        store: Box<dyn FilterStore>,
        config: ViewConfig,
    ) -> Result<Self, PathError> {
        let path = PipelinePath::parse(pipeline_path)?;
        let tokens = match store.load() {
            Ok(tokens) => filter::retain_enabled(tokens),
            Err(e) => {
                tracing::warn!("could not restore filters: {e}");
                Vec::new()
            }
        };

        let mut view = Self {
            path,
            tokens,
            store,
            pagination: CursorPagination::new(config.page_size),
            countdown: Countdown::new(config.poll_interval),
            status: ViewStatus::Loading,
            last_ticket: 0,
            in_flight: None,
            pending: None,
            mounted: true,
        };
        view.queue_fetch();
        Ok(view)
    }

    // --- Queries ---

    pub fn path(&self) -> &PipelinePath {
        &self.path
    }

    pub fn pipeline_name(&self) -> &str {
        &self.path.pipeline_name
    }

    pub fn snapshot_id(&self) -> Option<&str> {
        self.path.snapshot_id.as_deref()
    }

    pub fn title(&self) -> String {
        format!("Pipeline: {}", self.path.pipeline_name)
    }

    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    /// Tokens shown in the filter bar: the pipeline, the user filters, then
    /// the pinned snapshot if any.
    pub fn display_tokens(&self) -> Vec<FilterToken> {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 2);
        tokens.push(FilterToken::new(
            RunFilterTokenType::Pipeline,
            self.path.pipeline_name.clone(),
        ));
        tokens.extend(self.tokens.iter().cloned());
        if let Some(snapshot) = &self.path.snapshot_id {
            tokens.push(FilterToken::new(
                RunFilterTokenType::SnapshotId,
                snapshot.clone(),
            ));
        }
        tokens
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    /// At most `page_size` records.
    pub fn displayed_runs(&self) -> &[RunRecord] {
        match &self.status {
            ViewStatus::Loaded(runs) => runs,
            _ => &[],
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        self.pagination.cursor()
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size()
    }

    pub fn page_number(&self) -> usize {
        self.pagination.page_number()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.has_next_cursor()
    }

    pub fn has_prev_page(&self) -> bool {
        self.pagination.has_prev_cursor()
    }

    pub fn show_pagination_controls(&self) -> bool {
        self.has_next_page() || self.has_prev_page()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn countdown_state(&self) -> CountdownState {
        self.countdown.state()
    }

    /// Variables for the current filters and cursor.
    pub fn request(&self) -> RunsRequest {
        RunsRequest::new(
            &self.path.pipeline_name,
            self.path.snapshot_id.as_deref(),
            &self.tokens,
            self.pagination.cursor(),
            self.pagination.page_size(),
        )
    }

    // --- Interaction ---

    /// Replaces the filters and returns to the first page.
    pub fn set_filters(&mut self, tokens: Vec<FilterToken>) {
        if !self.mounted {
            return;
        }
        let tokens = filter::retain_enabled(tokens);
        if let Err(e) = self.store.save(&tokens) {
            tracing::warn!("could not persist filters: {e}");
        }
        self.tokens = tokens;
        self.pagination.reset();
        self.queue_fetch();
    }

    /// Appends one filter unless an identical one is active.
    pub fn add_filter(&mut self, token: FilterToken) {
        if self.tokens.contains(&token) {
            return;
        }
        let mut tokens = self.tokens.clone();
        tokens.push(token);
        self.set_filters(tokens);
    }

    /// Swaps out any active filter of the same kind for `token`.
    pub fn replace_filter(&mut self, token: FilterToken) {
        if self.tokens.contains(&token) {
            return;
        }
        let mut tokens: Vec<FilterToken> = self
            .tokens
            .iter()
            .filter(|t| t.token != token.token)
            .cloned()
            .collect();
        tokens.push(token);
        self.set_filters(tokens);
    }

    pub fn pop_filter(&mut self) {
        if self.tokens.is_empty() {
            return;
        }
        let mut tokens = self.tokens.clone();
        tokens.pop();
        self.set_filters(tokens);
    }

    /// Returns `false` when there is no page in that direction.
    pub fn advance_page(&mut self, direction: Direction) -> bool {
        if !self.mounted || !self.pagination.advance(direction) {
            return false;
        }
        self.queue_fetch();
        true
    }

    /// Manual refresh. Ignored while a fetch is in flight.
    pub fn refetch(&mut self) -> bool {
        if !self.mounted || self.in_flight.is_some() {
            return false;
        }
        self.queue_fetch();
        true
    }

    /// Advances the countdown; reaching zero queues a refetch of the current
    /// page.
    pub fn tick(&mut self, elapsed: Duration) -> CountdownState {
        if !self.mounted {
            return self.countdown.state();
        }
        if self.in_flight.is_some() {
            self.countdown.suspend();
        } else if self.countdown.advance(elapsed) {
            tracing::debug!(pipeline = %self.path.pipeline_name, "poll interval elapsed");
            self.queue_fetch();
        }
        self.countdown.state()
    }

    pub fn take_pending_fetch(&mut self) -> Option<FetchTicket> {
        self.pending.take()
    }

    /// Applies a fetch outcome. Returns `false` when it was discarded.
    pub fn complete(&mut self, ticket: u64, outcome: FetchOutcome) -> bool {
        if !self.mounted {
            tracing::debug!(ticket, "view unmounted, dropping fetch result");
            return false;
        }
        if self.in_flight != Some(ticket) {
            tracing::debug!(
                ticket,
                latest = self.last_ticket,
                "discarding superseded fetch result"
            );
            return false;
        }
        self.in_flight = None;
        self.countdown.restart();

        self.status = match outcome {
            Ok(RunsQueryResult::RunsPage(results)) => {
                let (page, next) =
                    pagination::split_page(results, self.pagination.page_size(), |r| {
                        r.run_id.clone()
                    });
                self.pagination.set_next_cursor(next);
                ViewStatus::Loaded(page)
            }
            Ok(RunsQueryResult::FilterError { message }) => {
                self.pagination.set_next_cursor(None);
                ViewStatus::QueryError(message)
            }
            Ok(RunsQueryResult::GenericError { message }) => {
                self.pagination.set_next_cursor(None);
                ViewStatus::BackendError(message)
            }
            Err(message) => {
                tracing::warn!("run fetch failed: {message}");
                self.pagination.set_next_cursor(None);
                ViewStatus::NetworkError(message)
            }
        };
        true
    }

    /// Unmounts. Later ticks, results and interactions leave state untouched.
    pub fn teardown(&mut self) {
        self.mounted = false;
        self.pending = None;
        self.in_flight = None;
    }

    fn queue_fetch(&mut self) {
        self.last_ticket += 1;
        let ticket = FetchTicket {
            id: self.last_ticket,
            request: self.request(),
        };
        self.in_flight = Some(ticket.id);
        self.pending = Some(ticket);
        self.countdown.suspend();
    }
}
