//! Run filter tokens and the structured filter sent upstream.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunFilterTokenType {
    Id,
    SnapshotId,
    Status,
    Tag,
    Pipeline,
}

/// Token types the run list accepts from the user.
pub const ENABLED_FILTERS: &[RunFilterTokenType] = &[
    RunFilterTokenType::Id,
    RunFilterTokenType::SnapshotId,
    RunFilterTokenType::Status,
    RunFilterTokenType::Tag,
];

impl RunFilterTokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::SnapshotId => "snapshotId",
            Self::Status => "status",
            Self::Tag => "tag",
            Self::Pipeline => "pipeline",
        }
    }

    pub fn is_enabled(self) -> bool {
        ENABLED_FILTERS.contains(&self)
    }
}

impl fmt::Display for RunFilterTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterTokenError {
    #[error("expected token:value, got {0:?}")]
    MissingSeparator(String),
    #[error("unknown filter token {0:?}")]
    UnknownToken(String),
    #[error("filter token {0} is not supported here")]
    NotEnabled(RunFilterTokenType),
    #[error("filter {0} has an empty value")]
    EmptyValue(RunFilterTokenType),
}

impl FromStr for RunFilterTokenType {
    type Err = FilterTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "snapshotId" => Ok(Self::SnapshotId),
            "status" => Ok(Self::Status),
            "tag" => Ok(Self::Tag),
            "pipeline" => Ok(Self::Pipeline),
            other => Err(FilterTokenError::UnknownToken(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToken {
    pub token: RunFilterTokenType,
    pub value: String,
}

impl FilterToken {
    pub fn new(token: RunFilterTokenType, value: impl Into<String>) -> Self {
        Self {
            token,
            value: value.into(),
        }
    }

    /// Parse a user-entered token and check it against [`ENABLED_FILTERS`].
    pub fn parse_enabled(s: &str) -> Result<Self, FilterTokenError> {
        let token: Self = s.parse()?;
        if !token.token.is_enabled() {
            return Err(FilterTokenError::NotEnabled(token.token));
        }
        Ok(token)
    }
}

impl FromStr for FilterToken {
    type Err = FilterTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (token, value) = s
            .split_once(':')
            .ok_or_else(|| FilterTokenError::MissingSeparator(s.to_string()))?;
        let token: RunFilterTokenType = token.trim().parse()?;
        let value = value.trim();
        if value.is_empty() {
            return Err(FilterTokenError::EmptyValue(token));
        }
        let value = if token == RunFilterTokenType::Status {
            value.to_ascii_uppercase()
        } else {
            value.to_string()
        };
        Ok(Self { token, value })
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.token, self.value)
    }
}

/// Drops tokens outside [`ENABLED_FILTERS`], keeping order.
pub fn retain_enabled(tokens: Vec<FilterToken>) -> Vec<FilterToken> {
    tokens
        .into_iter()
        .filter(|t| {
            let keep = t.token.is_enabled();
            if !keep {
                tracing::warn!(token = %t, "dropping filter token outside the allow-list");
            }
            keep
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

/// Structured filter for the `pipelineRunsOrError` query.
///
/// `pipelineName` and `snapshotId` are always serialized (as `null` when
/// absent); the remaining fields only when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsFilter {
    pub pipeline_name: Option<String>,
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagFilter>>,
}

impl RunsFilter {
    /// Later tokens of the same kind overwrite earlier ones, except tags
    /// which accumulate.
    pub fn from_tokens(tokens: &[FilterToken]) -> Self {
        let mut filter = Self::default();
        for item in tokens {
            match item.token {
                RunFilterTokenType::Pipeline => filter.pipeline_name = Some(item.value.clone()),
                RunFilterTokenType::Id => filter.run_id = Some(item.value.clone()),
                RunFilterTokenType::Status => filter.status = Some(item.value.clone()),
                RunFilterTokenType::SnapshotId => filter.snapshot_id = Some(item.value.clone()),
                RunFilterTokenType::Tag => {
                    let (key, value) = item
                        .value
                        .split_once('=')
                        .unwrap_or((item.value.as_str(), ""));
                    filter.tags.get_or_insert_with(Vec::new).push(TagFilter {
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                }
            }
        }
        filter
    }

    /// Pins the filter to the pipeline being viewed. A snapshot from the
    /// path wins over a `snapshotId` token.
    pub fn for_pipeline(
        tokens: &[FilterToken],
        pipeline_name: &str,
        snapshot_id: Option<&str>,
    ) -> Self {
        let mut filter = Self::from_tokens(tokens);
        filter.pipeline_name = Some(pipeline_name.to_string());
        if let Some(snapshot) = snapshot_id {
            filter.snapshot_id = Some(snapshot.to_string());
        }
        filter
    }
}
