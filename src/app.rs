//! Terminal UI state wrapped around the run list view.

use crate::dagit::model::RunRecord;
use crate::filter::{FilterToken, FilterTokenError, RunFilterTokenType};
use crate::pagination::Direction;
use crate::tui::spinner::SPINNER_FRAME_COUNT;
use crate::view::{FetchOutcome, RunListView};
use chrono::{DateTime, Utc};
use std::time::Instant;

pub const NOTICE_TTL_SECS: u64 = 6;
pub const NARROW_WIDTH_THRESHOLD: u16 = 70;

/// Format a duration in seconds into a human-readable string (e.g. "2m 5s").
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Elapsed time of a run; open-ended runs are measured up to `now`.
pub fn run_duration(
    started: Option<DateTime<Utc>>,
    ended: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<String> {
    let start = started?;
    let end = ended.unwrap_or(now);
    Some(format_duration(end.signed_duration_since(start).num_seconds()))
}

/// Parses the filter editor text: comma-separated `token:value` entries.
pub fn parse_filter_input(input: &str) -> Result<Vec<FilterToken>, FilterTokenError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(FilterToken::parse_enabled)
        .collect()
}

pub fn format_filter_input(tokens: &[FilterToken]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingFilters(String),
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
    pub timestamp: Instant,
}

pub struct AppState {
    pub view: RunListView,
    pub endpoint: String,

    pub selected: usize,
    pub input: InputMode,

    pub notice: Option<Notice>,
    pub spinner_frame: usize,
    pub should_quit: bool,
    /// Set when the terminal stopped delivering input.
    pub fatal_error: Option<String>,
}

impl AppState {
    pub fn new(view: RunListView, endpoint: String) -> Self {
        Self {
            view,
            endpoint,
            selected: 0,
            input: InputMode::Normal,
            notice: None,
            spinner_frame: 0,
            should_quit: false,
            fatal_error: None,
        }
    }

    pub fn selected_run(&self) -> Option<&RunRecord> {
        self.view.displayed_runs().get(self.selected)
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.view.displayed_runs().len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.view.displayed_runs().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn apply_fetch(&mut self, ticket: u64, outcome: FetchOutcome) {
        if self.view.complete(ticket, outcome) {
            self.clamp_selection();
        }
    }

    pub fn change_page(&mut self, direction: Direction) {
        if self.view.advance_page(direction) {
            self.selected = 0;
        }
    }

    pub fn set_filters(&mut self, tokens: Vec<FilterToken>) {
        self.view.set_filters(tokens);
        self.selected = 0;
    }

    pub fn pop_filter(&mut self) {
        self.view.pop_filter();
        self.selected = 0;
    }

    /// Show runs sharing the selected run's status. Replaces an active
    /// status filter.
    pub fn filter_by_selected_status(&mut self) {
        let Some(value) = self
            .selected_run()
            .and_then(|r| r.status.as_filter_value())
        else {
            return;
        };
        self.view
            .replace_filter(FilterToken::new(RunFilterTokenType::Status, value));
        self.selected = 0;
    }

    /// Narrow the list to the selected run's first user tag.
    pub fn filter_by_selected_tag(&mut self) {
        let Some(tag) = self
            .selected_run()
            .and_then(|r| r.user_tags().next())
            .map(|t| format!("{}={}", t.key, t.value))
        else {
            self.set_notice("Selected run has no tags".to_string(), false);
            return;
        };
        self.view
            .add_filter(FilterToken::new(RunFilterTokenType::Tag, tag));
        self.selected = 0;
    }

    // --- Filter editor ---

    pub fn is_editing(&self) -> bool {
        matches!(self.input, InputMode::EditingFilters(_))
    }

    pub fn begin_filter_edit(&mut self) {
        self.input = InputMode::EditingFilters(format_filter_input(self.view.tokens()));
    }

    pub fn edit_push(&mut self, c: char) {
        if let InputMode::EditingFilters(ref mut text) = self.input {
            text.push(c);
        }
    }

    pub fn edit_backspace(&mut self) {
        if let InputMode::EditingFilters(ref mut text) = self.input {
            text.pop();
        }
    }

    pub fn cancel_filter_edit(&mut self) {
        self.input = InputMode::Normal;
    }

    /// Applies the editor text. On a parse error the editor stays open.
    pub fn submit_filter_edit(&mut self) {
        let InputMode::EditingFilters(ref text) = self.input else {
            return;
        };
        match parse_filter_input(text) {
            Ok(tokens) => {
                self.input = InputMode::Normal;
                self.clear_notice();
                self.set_filters(tokens);
            }
            Err(e) => self.set_notice(e.to_string(), true),
        }
    }

    /// The input thread has exited, so no key (not even `q`) would arrive.
    pub fn input_failed(&mut self, message: String) {
        self.fatal_error = Some(message);
        self.should_quit = true;
    }

    // --- Notices ---

    pub fn set_notice(&mut self, message: String, is_error: bool) {
        self.notice = Some(Notice {
            message,
            is_error,
            timestamp: Instant::now(),
        });
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn prune_notice(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.timestamp.elapsed().as_secs() >= NOTICE_TTL_SECS)
        {
            self.notice = None;
        }
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }
}
