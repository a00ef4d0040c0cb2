//! Forward-only cursor pagination with a history stack for going back.
//!
//! Each request asks for `page_size + 1` records. The extra record is never
//! displayed; its id becomes the cursor for the next page.

pub const PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone)]
pub struct CursorPagination {
    page_size: usize,
    cursor: Option<String>,
    /// Cursors of the pages before the current one. `None` is the first page.
    history: Vec<Option<String>>,
    next_cursor: Option<String>,
}

impl CursorPagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            cursor: None,
            history: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Number of records to request for one page.
    pub fn request_limit(&self) -> usize {
        self.page_size + 1
    }

    pub fn has_next_cursor(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn has_prev_cursor(&self) -> bool {
        !self.history.is_empty()
    }

    /// 1-based page number.
    pub fn page_number(&self) -> usize {
        self.history.len() + 1
    }

    /// Back to the first page, forgetting all history.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.history.clear();
        self.next_cursor = None;
    }

    /// Record the overflow id from a freshly fetched page.
    pub fn set_next_cursor(&mut self, next: Option<String>) {
        self.next_cursor = next;
    }

    /// Returns `false` when there is nowhere to go.
    pub fn advance(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Next => {
                let Some(next) = self.next_cursor.take() else {
                    return false;
                };
                self.history.push(self.cursor.take());
                self.cursor = Some(next);
                true
            }
            Direction::Prev => {
                let Some(prev) = self.history.pop() else {
                    return false;
                };
                self.cursor = prev;
                self.next_cursor = None;
                true
            }
        }
    }
}

impl Default for CursorPagination {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

/// Splits a fetched result into the displayed page and the next cursor.
///
/// `id` extracts the cursor identifier from a record. Only the record at
/// index `page_size` is consulted; anything past it is ignored.
pub fn split_page<T, F>(mut results: Vec<T>, page_size: usize, id: F) -> (Vec<T>, Option<String>)
where
    F: Fn(&T) -> String,
{
    let next = results.get(page_size).map(id);
    results.truncate(page_size);
    (results, next)
}
