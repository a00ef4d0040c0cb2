use crate::filter::{FilterToken, RunsFilter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Queued,
    NotStarted,
    Managed,
    Starting,
    Started,
    Success,
    Failure,
    Canceling,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// The enum value the server expects in a `status` filter.
    pub fn as_filter_value(self) -> Option<&'static str> {
        Some(match self {
            Self::Queued => "QUEUED",
            Self::NotStarted => "NOT_STARTED",
            Self::Managed => "MANAGED",
            Self::Starting => "STARTING",
            Self::Started => "STARTED",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Canceling => "CANCELING",
            Self::Canceled => "CANCELED",
            Self::Unknown => return None,
        })
    }

    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Queued | Self::NotStarted | Self::Starting | Self::Started | Self::Canceling
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunTag {
    pub key: String,
    pub value: String,
}

/// Timing stats; absent fields when the server could not load them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub steps_failed: Option<u64>,
}

fn from_epoch(secs: f64) -> Option<DateTime<Utc>> {
    let whole = secs.trunc() as i64;
    let nanos = (secs.fract() * 1e9) as u32;
    DateTime::from_timestamp(whole, nanos)
}

impl RunStats {
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_time.and_then(from_epoch)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end_time.and_then(from_epoch)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub run_id: String,
    pub status: RunStatus,
    pub pipeline_name: String,
    #[serde(default)]
    pub pipeline_snapshot_id: Option<String>,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub root_run_id: Option<String>,
    #[serde(default)]
    pub parent_run_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<RunTag>,
    #[serde(default)]
    pub stats: Option<RunStats>,
}

impl RunRecord {
    pub fn short_id(&self) -> &str {
        self.run_id.get(..8).unwrap_or(&self.run_id)
    }

    /// Tags set by the user, skipping the `dagster/` system namespace.
    pub fn user_tags(&self) -> impl Iterator<Item = &RunTag> {
        self.tags.iter().filter(|t| !t.key.starts_with("dagster/"))
    }
}

/// Outcome of one `pipelineRunsOrError` query.
#[derive(Debug, Clone, PartialEq)]
pub enum RunsQueryResult {
    /// May carry one record past the page size.
    RunsPage(Vec<RunRecord>),
    /// The server rejected the filter.
    FilterError { message: String },
    GenericError { message: String },
}

/// GraphQL variables for one page of runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunsRequest {
    pub limit: usize,
    pub cursor: Option<String>,
    pub filter: RunsFilter,
}

impl RunsRequest {
    /// Requests `page_size + 1` records so the next page can be detected.
    pub fn new(
        pipeline_name: &str,
        snapshot_id: Option<&str>,
        tokens: &[FilterToken],
        cursor: Option<&str>,
        page_size: usize,
    ) -> Self {
        Self {
            limit: page_size + 1,
            cursor: cursor.map(str::to_string),
            filter: RunsFilter::for_pipeline(tokens, pipeline_name, snapshot_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RunFilterTokenType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_variables_for_status_filter() {
        let tokens = [FilterToken::new(RunFilterTokenType::Status, "FAILURE")];
        let request = RunsRequest::new("foo", None, &tokens, None, 25);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "limit": 26,
                "cursor": null,
                "filter": {"pipelineName": "foo", "snapshotId": null, "status": "FAILURE"}
            })
        );
    }

    #[test]
    fn request_carries_cursor() {
        let request = RunsRequest::new("foo", Some("snap"), &[], Some("abc"), 10);
        assert_eq!(request.limit, 11);
        assert_eq!(request.cursor.as_deref(), Some("abc"));
        assert_eq!(request.filter.snapshot_id.as_deref(), Some("snap"));
    }

    #[test]
    fn stats_convert_epoch_seconds() {
        let stats = RunStats {
            start_time: Some(1_700_000_000.5),
            end_time: None,
            steps_failed: None,
        };
        let started = stats.started_at().unwrap();
        assert_eq!(started.timestamp(), 1_700_000_000);
        assert_eq!(started.timestamp_subsec_millis(), 500);
        assert_eq!(stats.ended_at(), None);
    }

    #[test]
    fn short_id_handles_short_ids() {
        let run: RunRecord = serde_json::from_value(json!({
            "id": "x", "runId": "abc", "status": "SUCCESS", "pipelineName": "foo"
        }))
        .unwrap();
        assert_eq!(run.short_id(), "abc");
    }

    #[test]
    fn status_filter_values() {
        assert_eq!(RunStatus::NotStarted.as_filter_value(), Some("NOT_STARTED"));
        assert_eq!(RunStatus::Unknown.as_filter_value(), None);
    }
}
