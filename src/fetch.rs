//! Chunked record retrieval.

use crate::entrez::{EntrezService, RawRecord};
use crate::retry::{self, RetryPolicy};
use indicatif::ProgressBar;
use tracing::{info, warn};

/// A chunk that could not be fetched even after retries.
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    /// 0-based chunk index
    pub index: usize,
    /// Identifiers that were skipped
    pub ids: Vec<String>,
    pub error: String,
}

/// Records from every chunk that succeeded, plus the chunks that did not.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<RawRecord>,
    pub failures: Vec<ChunkFailure>,
}

/// Fetch full records for `ids` in consecutive batches of at most `chunk_size`.
///
/// A batch that still fails after retries is logged and skipped; the rest
/// carry on. Records come back in chunk order. `pb` advances once per chunk.
pub async fn fetch_all<S: EntrezService>(
    service: &S,
    ids: &[String],
    chunk_size: usize,
    policy: &RetryPolicy,
    pb: &ProgressBar,
) -> FetchOutcome {
    let chunk_size = chunk_size.max(1);
    let total_chunks = ids.len().div_ceil(chunk_size);
    let mut outcome = FetchOutcome::default();

    info!(ids = ids.len(), chunks = total_chunks, chunk_size, "Fetching records");

    for (index, chunk) in ids.chunks(chunk_size).enumerate() {
        match retry::execute(policy, "efetch", || service.fetch(chunk)).await {
            Ok(records) => {
                info!(
                    chunk = index + 1,
                    total_chunks,
                    requested = chunk.len(),
                    returned = records.len(),
                    "Chunk fetched"
                );
                outcome.records.extend(records);
            }
            Err(e) => {
                warn!(chunk = index + 1, total_chunks, skipped = chunk.len(), error = %e, "Chunk failed, skipping");
                outcome.failures.push(ChunkFailure {
                    index,
                    ids: chunk.to_vec(),
                    error: e.to_string(),
                });
                pb.set_message(format!("{} chunk(s) skipped", outcome.failures.len()));
            }
        }
        pb.inc(1);
    }

    outcome
}
