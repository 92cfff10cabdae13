//! # pubmed_scraper
//!
//! Retrieve PubMed records for a query and flatten them into an
//! eleven-column table.
//!
//! ## Modules
//!
//! - [`entrez`] - E-utilities client (esearch/efetch) and the [`EntrezService`] seam
//! - [`rate_gate`] - Minimum spacing between requests
//! - [`retry`] - Bounded retry with exponential backoff
//! - [`search`] - Paginated identifier search
//! - [`fetch`] - Chunked record retrieval
//! - [`progress`] - Terminal progress bar for the fetch stage
//! - [`xml_tree`] - efetch XML to generic trees
//! - [`record`] - Tree to row normalization
//! - [`dates`] - Year/Month/Day standardization
//! - [`pipeline`] - The stages composed for one query
//! - [`output`] - CSV/JSON writers
//! - [`config`] - Pipeline configuration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubmed_scraper::{output, Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::new("you@example.org");
//!     let pipeline = Pipeline::from_config(&config)?;
//!     let report = pipeline.run("crispr[tiab] AND 2023[dp]", 50).await?;
//!     println!("{}", report.summary());
//!     output::write_csv("pubmed_data.csv".as_ref(), &report.rows)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dates;
pub mod entrez;
pub mod error;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod rate_gate;
pub mod record;
pub mod retry;
pub mod search;
pub mod xml_tree;

#[cfg(test)]
pub(crate) mod testing;

pub use config::PipelineConfig;
pub use entrez::{EntrezClient, EntrezService, RawRecord, SearchPage};
pub use error::{PubmedError, Result};
pub use pipeline::{Pipeline, PipelineReport};
pub use record::NormalizedRow;
