use crate::dagit::client::DEFAULT_ENDPOINT;
use crate::filter::FilterToken;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "prw", version = VERSION, about = "Pipeline Runs Watcher TUI")]
pub struct Cli {
    /// Pipeline path: name, optionally pinned to a snapshot (name@snapshotId)
    pub pipeline_path: String,

    /// Dagit GraphQL endpoint
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Run filter as token:value (id, snapshotId, status, tag). Repeatable;
    /// replaces any persisted filters
    #[arg(short, long = "filter", value_parser = FilterToken::parse_enabled)]
    pub filters: Vec<FilterToken>,

    /// Poll interval in seconds
    #[arg(short, long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Persist filters in this file between sessions
    #[arg(long)]
    pub filters_file: Option<PathBuf>,

    /// Write logs to this file (no logging when unset)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level (falls back to PRW_LOG, then info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
