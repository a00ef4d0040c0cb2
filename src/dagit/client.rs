use crate::dagit::model::{RunsQueryResult, RunsRequest};
use crate::dagit::parser;
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/graphql";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const RUNS_QUERY: &str = r"
query PipelineRunsRootQuery($limit: Int, $cursor: String, $filter: PipelineRunsFilter!) {
  pipelineRunsOrError(limit: $limit, cursor: $cursor, filter: $filter) {
    __typename
    ... on PipelineRuns {
      results {
        id
        runId
        status
        pipelineName
        pipelineSnapshotId
        mode
        rootRunId
        parentRunId
        tags {
          key
          value
        }
        stats {
          __typename
          ... on PipelineRunStatsSnapshot {
            startTime
            endTime
            stepsFailed
          }
        }
      }
    }
    ... on InvalidPipelineRunsFilterError {
      message
    }
    ... on PythonError {
      message
    }
  }
}
";

const PING_QUERY: &str = "query { __typename }";

/// HTTP status and body of one GraphQL reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunsReply {
    pub status: StatusCode,
    pub body: String,
}

impl RunsReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    // A JSON body with a 4xx status still carries GraphQL errors
    fn is_graphql(&self) -> bool {
        self.status.is_success() || self.body.trim_start().starts_with('{')
    }
}

/// Transport for the runs query. `Err` means Dagit could not be reached.
#[async_trait]
pub trait RunsExecutor: Send + Sync {
    async fn check_available(&self) -> Result<()>;
    async fn fetch_runs(&self, request: &RunsRequest) -> Result<RunsReply>;
}

/// Runs one page query end to end. Only transport failures are `Err`.
pub async fn fetch_page(
    executor: &dyn RunsExecutor,
    request: &RunsRequest,
) -> Result<RunsQueryResult> {
    let reply = executor.fetch_runs(request).await?;
    Ok(classify_reply(&reply))
}

/// Maps a reply that did arrive onto a query result. Error statuses and
/// bodies that are not a runs response become [`RunsQueryResult::GenericError`].
pub fn classify_reply(reply: &RunsReply) -> RunsQueryResult {
    if !reply.is_graphql() {
        return RunsQueryResult::GenericError {
            message: format!("Dagit returned HTTP {}", reply.status),
        };
    }
    parser::parse_runs_response(&reply.body).unwrap_or_else(|e| {
        tracing::warn!(status = %reply.status, "unreadable runs response: {e}");
        RunsQueryResult::GenericError {
            message: format!("Unexpected response from Dagit: {e}"),
        }
    })
}

#[derive(Debug, Clone)]
pub struct HttpExecutor {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let parsed = url::Url::parse(&endpoint)
            .map_err(|e| eyre!("Invalid endpoint {endpoint:?}: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(eyre!("Endpoint must be http or https, got {endpoint:?}"));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("prw/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {e}"))?;
        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, body: serde_json::Value) -> Result<RunsReply> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    eyre!("Cannot reach Dagit at {}. Is it running?", self.endpoint)
                } else if e.is_timeout() {
                    eyre!("Request to {} timed out", self.endpoint)
                } else {
                    eyre!("Request failed: {e}")
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| eyre!("Failed to read response: {e}"))?;
        Ok(RunsReply { status, body })
    }
}

#[async_trait]
impl RunsExecutor for HttpExecutor {
    async fn check_available(&self) -> Result<()> {
        let reply = self.post(serde_json::json!({ "query": PING_QUERY })).await?;
        if !reply.is_graphql() {
            return Err(eyre!(
                "{} is not a GraphQL endpoint (HTTP {})",
                self.endpoint,
                reply.status
            ));
        }
        Ok(())
    }

    async fn fetch_runs(&self, request: &RunsRequest) -> Result<RunsReply> {
        tracing::debug!(
            endpoint = %self.endpoint,
            limit = request.limit,
            cursor = ?request.cursor,
            "fetching runs"
        );
        self.post(serde_json::json!({
            "operationName": "PipelineRunsRootQuery",
            "query": RUNS_QUERY,
            "variables": request,
        }))
        .await
    }
}
