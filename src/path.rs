//! Pipeline path parsing.
//!
//! A pipeline path names the pipeline whose runs are listed and can pin a
//! historical snapshot: `name[@snapshotId][~solidsQuery][/solid/...]`.
//! Only the name and snapshot drive the run query; the solid portion is kept
//! so a path round-trips through [`PipelinePath::to_string`].

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("pipeline path is empty")]
    Empty,
    #[error("invalid pipeline name {0:?}: use letters, digits and underscores")]
    InvalidName(String),
    #[error("snapshot id after '@' is empty")]
    EmptySnapshot,
    #[error("invalid snapshot id {0:?}")]
    InvalidSnapshot(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePath {
    pub pipeline_name: String,
    pub snapshot_id: Option<String>,
    pub solids_query: String,
    pub path_solids: Vec<String>,
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl PipelinePath {
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let input = input.trim().trim_start_matches('/');
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = input.split('/');
        let root = segments.next().unwrap_or_default();
        let path_solids: Vec<String> = segments
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let (root, solids_query) = match root.split_once('~') {
            Some((r, q)) => (r, q.to_string()),
            None => (root, String::new()),
        };

        let (name, snapshot_id) = match root.split_once('@') {
            Some((_, "")) => return Err(PathError::EmptySnapshot),
            Some((n, s)) => {
                if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                    return Err(PathError::InvalidSnapshot(s.to_string()));
                }
                (n, Some(s.to_string()))
            }
            None => (root, None),
        };

        if !is_valid_name(name) {
            return Err(PathError::InvalidName(name.to_string()));
        }

        Ok(Self {
            pipeline_name: name.to_string(),
            snapshot_id,
            solids_query,
            path_solids,
        })
    }
}

impl fmt::Display for PipelinePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pipeline_name)?;
        if let Some(snapshot) = &self.snapshot_id {
            write!(f, "@{snapshot}")?;
        }
        if !self.solids_query.is_empty() {
            write!(f, "~{}", self.solids_query)?;
        }
        for solid in &self.path_solids {
            write!(f, "/{solid}")?;
        }
        Ok(())
    }
}
