//! Persistence port for the active filter tokens.
//!
//! Tokens are stored in query-string form: one `q=<token>:<value>` pair per
//! token, form-urlencoded, in display order.

use crate::filter::FilterToken;
use color_eyre::eyre::{eyre, Result};
use std::path::PathBuf;
use std::sync::Mutex;

const QUERY_KEY: &str = "q";

pub trait FilterStore: Send {
    fn load(&self) -> Result<Vec<FilterToken>>;
    fn save(&self, tokens: &[FilterToken]) -> Result<()>;
}

pub fn encode_query(tokens: &[FilterToken]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for token in tokens {
        serializer.append_pair(QUERY_KEY, &token.to_string());
    }
    serializer.finish()
}

/// Entries that are not `q` pairs or do not parse as tokens are skipped.
pub fn decode_query(query: &str) -> Vec<FilterToken> {
    let query = query.trim().trim_start_matches('?');
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == QUERY_KEY)
        .filter_map(|(_, value)| match value.parse::<FilterToken>() {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!("ignoring persisted filter {value:?}: {e}");
                None
            }
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct MemoryFilterStore {
    query: Mutex<String>,
}

impl MemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Mutex::new(query.into()),
        }
    }

    pub fn query(&self) -> String {
        self.query
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

impl FilterStore for MemoryFilterStore {
    fn load(&self) -> Result<Vec<FilterToken>> {
        let query = self
            .query
            .lock()
            .map_err(|_| eyre!("filter store lock poisoned"))?;
        Ok(decode_query(&query))
    }

    fn save(&self, tokens: &[FilterToken]) -> Result<()> {
        let mut query = self
            .query
            .lock()
            .map_err(|_| eyre!("filter store lock poisoned"))?;
        *query = encode_query(tokens);
        Ok(())
    }
}

/// Keeps the query string in a file so filters survive restarts.
#[derive(Debug, Clone)]
pub struct FileFilterStore {
    path: PathBuf,
}

impl FileFilterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FilterStore for FileFilterStore {
    fn load(&self) -> Result<Vec<FilterToken>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(decode_query(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(eyre!(
                "Failed to read filters from {}: {}",
                self.path.display(),
                e
            )),
        }
    }

    fn save(&self, tokens: &[FilterToken]) -> Result<()> {
        std::fs::write(&self.path, encode_query(tokens)).map_err(|e| {
            eyre!(
                "Failed to write filters to {}: {}",
                self.path.display(),
                e
            )
        })
    }
}
