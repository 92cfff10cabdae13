//! Search -> fetch -> normalize -> standardize, for one query.

use crate::config::PipelineConfig;
use crate::dates;
use crate::entrez::{EntrezClient, EntrezService};
use crate::error::{PubmedError, Result};
use crate::fetch::{self, ChunkFailure};
use crate::rate_gate::RateGate;
use crate::progress;
use crate::record::{self, NormalizedRow};
use crate::retry::RetryPolicy;
use crate::search;
use indicatif::ProgressBar;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// What one pipeline run produced, including how far short of the request it fell.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub query: String,
    /// `max_results` the caller asked for
    pub requested: usize,
    /// Identifiers returned by the search stage
    pub found: usize,
    /// Raw records returned by the fetch stage
    pub fetched: usize,
    /// Chunks skipped after exhausting retries
    pub failures: Vec<ChunkFailure>,
    /// Records dropped for a missing or duplicate PMID
    pub dropped: usize,
    pub rows: Vec<NormalizedRow>,
}

impl PipelineReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifiers lost to failed chunks.
    pub fn skipped_ids(&self) -> usize {
        self.failures.iter().map(|f| f.ids.len()).sum()
    }

    /// True when fewer rows came back than identifiers were found.
    pub fn is_partial(&self) -> bool {
        self.rows.len() < self.found
    }

    pub fn summary(&self) -> String {
        format!("fetched {} of {} requested", self.rows.len(), self.requested)
    }
}

pub struct Pipeline<S> {
    service: S,
    policy: RetryPolicy,
    chunk_size: usize,
    page_size: usize,
    show_progress: bool,
}

impl Pipeline<EntrezClient> {
    /// Pipeline against the real E-utilities service, with its own rate gate.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let gate = Arc::new(RateGate::new(config.effective_min_interval()));
        let client = EntrezClient::new(config, gate)?;
        Ok(Self::new(client, config))
    }
}

impl<S: EntrezService> Pipeline<S> {
    pub fn new(service: S, config: &PipelineConfig) -> Self {
        Self {
            service,
            policy: config.retry_policy(),
            chunk_size: config.chunk_size,
            page_size: config.page_size,
            show_progress: false,
        }
    }

    /// Draw a fetch progress bar on stderr when it is a terminal.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run the whole pipeline for `query`.
    ///
    /// Zero matches is a successful, empty report. A failing first search
    /// page, or identifiers with not a single fetchable record, is an error.
    pub async fn run(&self, query: &str, max_results: usize) -> Result<PipelineReport> {
        let mut report = PipelineReport {
            query: query.to_string(),
            requested: max_results,
            ..PipelineReport::default()
        };

        let ids = search::search_ids(&self.service, query, max_results, self.page_size, &self.policy).await?;
        report.found = ids.len();
        if ids.is_empty() {
            info!(query, "No matching records");
            return Ok(report);
        }

        let pb = if self.show_progress {
            progress::chunk_bar(ids.len().div_ceil(self.chunk_size.max(1)))
        } else {
            ProgressBar::hidden()
        };
        let outcome = fetch::fetch_all(&self.service, &ids, self.chunk_size, &self.policy, &pb).await;
        pb.finish_and_clear();

        report.fetched = outcome.records.len();
        report.failures = outcome.failures;
        if outcome.records.is_empty() {
            return Err(PubmedError::NothingFetched { requested: ids.len() });
        }

        let rank: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
        let mut seen = HashSet::new();
        let mut rows: Vec<NormalizedRow> = Vec::with_capacity(outcome.records.len());
        for raw in &outcome.records {
            match record::normalize(raw) {
                Some(row) if seen.insert(row.pmid.clone()) => rows.push(row),
                Some(row) => {
                    warn!(pmid = %row.pmid, "Duplicate record dropped");
                    report.dropped += 1;
                }
                None => {
                    warn!("Record without PMID dropped");
                    report.dropped += 1;
                }
            }
        }

        // stable: records the search never ranked keep their relative order at the end
        rows.sort_by_key(|row| rank.get(row.pmid.as_str()).copied().unwrap_or(usize::MAX));

        dates::standardize(&mut rows);
        report.rows = rows;

        if report.is_partial() {
            warn!(
                found = report.found,
                rows = report.rows.len(),
                failed_chunks = report.failures.len(),
                skipped_ids = report.skipped_ids(),
                "Partial result"
            );
        }
        info!(summary = %report.summary(), "Pipeline complete");
        Ok(report)
    }
}
