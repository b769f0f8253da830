use crate::model::{Occurrence, OccurrenceKind};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PATH: &str = ".flakewatch/events.jsonl";

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("invalid event log path {0}")]
    InvalidPath(PathBuf),
    #[error("create event log directory: {0}")]
    CreateDir(#[source] std::io::Error),
    #[error("open event log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize occurrence: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("write occurrence: {0}")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub kind: Option<OccurrenceKind>,
    /// Substring of the entity name.
    pub name: Option<String>,
}

/// Append-only JSON-lines feed of occurrences.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, occurrence: &Occurrence) -> Result<(), EventLogError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| EventLogError::InvalidPath(self.path.clone()))?;

        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(EventLogError::CreateDir)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| EventLogError::Open {
                path: self.path.clone(),
                source,
            })?;

        let line = serde_json::to_vec(occurrence)?;
        file.write_all(&line)
            .and_then(|_| file.write_all(b"\n"))
            .map_err(EventLogError::Write)
    }

    /// Reads occurrences in file order. A missing file is an empty log;
    /// unreadable or malformed lines are skipped.
    pub fn read(&self, filter: &Filter) -> Result<Vec<Occurrence>, EventLogError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(EventLogError::Open {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut occurrences = Vec::new();
        let reader = BufReader::new(file);

        for (index, line) in reader.lines().enumerate() {
            let Ok(line) = line else {
                debug!(line = index + 1, "skipping unreadable event log line");
                continue;
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let occurrence = match serde_json::from_str::<Occurrence>(trimmed) {
                Ok(occurrence) => occurrence,
                Err(err) => {
                    debug!(line = index + 1, error = %err, "skipping malformed occurrence");
                    continue;
                }
            };

            if !matches_filter(&occurrence, filter) {
                continue;
            }

            occurrences.push(occurrence);
        }

        Ok(occurrences)
    }
}

fn matches_filter(occurrence: &Occurrence, filter: &Filter) -> bool {
    if let Some(kind) = filter.kind
        && occurrence.kind() != kind
    {
        return false;
    }

    if let Some(name) = &filter.name
        && !occurrence.name().contains(name.as_str())
    {
        return false;
    }

    true
}
