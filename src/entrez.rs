//! NCBI E-utilities client (esearch + efetch).
//!
//! API details:
//! - esearch returns at most 10,000 identifiers per request (`retmax`)
//! - every request should carry `tool` and `email`; an `api_key` raises the
//!   allowed rate from 3 to 10 requests per second
//! - efetch only speaks XML for PubMed records, so records come back as
//!   generic trees (see [`crate::xml_tree`])

use crate::config::PipelineConfig;
use crate::error::{OptionExt, PubmedError, Result};
use crate::rate_gate::RateGate;
use crate::xml_tree;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Largest page esearch will hand back in one call
pub const SEARCH_PAGE_CEILING: usize = 10_000;

/// One untyped `PubmedArticle` tree as returned by efetch.
pub type RawRecord = serde_json::Value;

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Total number of matches for the query
    pub total_count: usize,
    /// Identifiers on this page, in ranking order
    pub ids: Vec<String>,
}

/// The remote bibliographic service, one network round trip per call.
///
/// Implemented by [`EntrezClient`] for the real service and by stubs in tests.
#[allow(async_fn_in_trait)]
pub trait EntrezService {
    async fn search(&self, query: &str, start: usize, page_size: usize) -> Result<SearchPage>;

    async fn fetch(&self, ids: &[String]) -> Result<Vec<RawRecord>>;
}

// === esearch JSON response ===

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: Option<ESearchResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

/// E-utilities HTTP client. All requests pass through a shared [`RateGate`].
pub struct EntrezClient {
    client: Client,
    base_url: String,
    tool: String,
    email: String,
    api_key: Option<String>,
    sort: Option<String>,
    gate: Arc<RateGate>,
}

impl EntrezClient {
    pub fn new(config: &PipelineConfig, gate: Arc<RateGate>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("{}/1.0 (mailto:{})", config.tool, config.email))
            .build()
            .map_err(|e| PubmedError::Config(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            base_url = %config.base_url,
            min_interval_ms = gate.min_interval().as_millis() as u64,
            api_key = config.api_key.is_some(),
            "E-utilities client ready"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tool: config.tool.clone(),
            email: config.email.clone(),
            api_key: config.api_key.clone(),
            sort: config.sort.clone(),
            gate,
        })
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("tool", self.tool.clone()),
            ("email", self.email.clone()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Send one GET through the rate gate and return the body of a 2xx response.
    async fn get_text(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<String> {
        self.gate.wait().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(url = %url, "Sending E-utilities request");

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(PubmedError::Service {
                code: status.as_u16(),
                message: format!("{} returned {}: {}", endpoint, status, snippet.trim()),
            });
        }

        Ok(response.text().await?)
    }
}

impl EntrezService for EntrezClient {
    async fn search(&self, query: &str, start: usize, page_size: usize) -> Result<SearchPage> {
        let mut params = self.base_params();
        params.push(("term", query.to_string()));
        params.push(("retstart", start.to_string()));
        params.push(("retmax", page_size.min(SEARCH_PAGE_CEILING).to_string()));
        params.push(("retmode", "json".to_string()));
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }

        let body = self.get_text("esearch.fcgi", &params).await?;
        let page = parse_search_response(&body)?;
        debug!(start, returned = page.ids.len(), total = page.total_count, "esearch page");
        Ok(page)
    }

    async fn fetch(&self, ids: &[String]) -> Result<Vec<RawRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = self.base_params();
        params.push(("id", ids.join(",")));
        params.push(("retmode", "xml".to_string()));

        let body = self.get_text("efetch.fcgi", &params).await?;
        let records = xml_tree::parse_article_set(&body)?;
        debug!(requested = ids.len(), returned = records.len(), "efetch batch");
        Ok(records)
    }
}

/// Decode an esearch JSON body.
fn parse_search_response(body: &str) -> Result<SearchPage> {
    let response: ESearchResponse = serde_json::from_str(body)
        .map_err(|e| PubmedError::Parse(format!("Failed to parse esearch response: {}", e)))?;

    if let Some(message) = response.error {
        return Err(PubmedError::Service { code: 200, message });
    }

    let result = response.esearchresult.ok_or_parse("esearch response has no esearchresult")?;
    if let Some(message) = result.error {
        return Err(PubmedError::Service { code: 200, message });
    }

    let total_count = result
        .count
        .ok_or_parse("esearch response has no count")?
        .trim()
        .parse::<usize>()
        .map_err(|e| PubmedError::Parse(format!("Invalid esearch count: {}", e)))?;

    Ok(SearchPage {
        total_count,
        ids: result.idlist,
    })
}
