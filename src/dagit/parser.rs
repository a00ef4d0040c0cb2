use crate::dagit::model::{RunRecord, RunsQueryResult};
use color_eyre::eyre::{eyre, Result};
use serde::Deserialize;

#[derive(Deserialize)]
struct Envelope {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Data {
    pipeline_runs_or_error: Option<RunsOrError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(tag = "__typename")]
enum RunsOrError {
    PipelineRuns {
        results: Vec<RunRecord>,
    },
    InvalidPipelineRunsFilterError {
        message: String,
    },
    PythonError {
        message: String,
    },
    #[serde(other)]
    Unknown,
}

/// Maps a GraphQL response body onto [`RunsQueryResult`].
///
/// Errors only for bodies that are not a GraphQL response at all.
pub fn parse_runs_response(json: &str) -> Result<RunsQueryResult> {
    let envelope: Envelope = serde_json::from_str(json)?;

    match envelope.data.and_then(|d| d.pipeline_runs_or_error) {
        Some(RunsOrError::PipelineRuns { results }) => Ok(RunsQueryResult::RunsPage(results)),
        Some(RunsOrError::InvalidPipelineRunsFilterError { message }) => {
            Ok(RunsQueryResult::FilterError { message })
        }
        Some(RunsOrError::PythonError { message }) => Ok(RunsQueryResult::GenericError { message }),
        Some(RunsOrError::Unknown) => Ok(RunsQueryResult::GenericError {
            message: "Unexpected response type for pipelineRunsOrError".to_string(),
        }),
        None if !envelope.errors.is_empty() => {
            let message = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            Ok(RunsQueryResult::GenericError { message })
        }
        None => Err(eyre!("Response is missing pipelineRunsOrError")),
    }
}
