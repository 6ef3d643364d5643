//! Track search via yt-dlp.
//!
//! Resolves free-text queries into playable candidates.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::SearchResult;
use crate::process::{run_command, CollaboratorError};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Resolves a query to a short list of candidate tracks.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CollaboratorError>;
}

/// Search provider backed by the `yt-dlp` binary.
pub struct YtDlpSearch {
    program: String,
    limit: u32,
    timeout: Duration,
}

impl YtDlpSearch {
    pub fn new(program: String, limit: u32, timeout: Duration) -> Self {
        Self {
            program,
            limit,
            timeout,
        }
    }
}

#[async_trait]
impl SearchProvider for YtDlpSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CollaboratorError> {
        let target = format!("ytsearch{}:{}", self.limit, query);
        tracing::debug!(query, limit = self.limit, "search request");
        let output = run_command(
            &self.program,
            [
                target.as_str(),
                "--dump-json",
                "--flat-playlist",
                "--skip-download",
            ],
            self.timeout,
        )
        .await?;
        let results = parse_search_output(&self.program, &output)?;
        tracing::debug!(query, count = results.len(), "search finished");
        Ok(results)
    }
}

/// Subset of the yt-dlp info JSON we care about.
#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    duration_string: Option<String>,
}

/// Parse line-delimited yt-dlp JSON into search results.
///
/// Blank lines are ignored; any other line must be a JSON object.
pub fn parse_search_output(
    program: &str,
    output: &str,
) -> Result<Vec<SearchResult>, CollaboratorError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let entry: FlatEntry =
                serde_json::from_str(line).map_err(|err| CollaboratorError::MalformedOutput {
                    program: program.to_string(),
                    reason: err.to_string(),
                })?;
            let url = format!("{}{}", WATCH_URL_PREFIX, entry.id.as_deref().unwrap_or_default());
            Ok(SearchResult {
                id: entry.id,
                title: entry.title,
                uploader: entry.uploader,
                duration: entry.duration_string,
                url,
            })
        })
        .collect()
}
