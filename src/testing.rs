//! In-memory stand-in for the E-utilities service, used by unit tests.

use crate::entrez::{EntrezService, RawRecord, SearchPage};
use crate::error::{PubmedError, Result};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Mutex;

pub(crate) fn sample_record(pmid: &str) -> RawRecord {
    json!({
        "MedlineCitation": {
            "@Status": "MEDLINE",
            "PMID": { "@Version": "1", "#text": pmid },
            "Article": {
                "Journal": {
                    "Title": "Journal of Tests",
                    "JournalIssue": {
                        "PubDate": { "Year": "2021", "Month": "Mar", "Day": "04" }
                    }
                },
                "ArticleTitle": format!("Article {}", pmid),
                "Abstract": { "AbstractText": "Something was measured." },
                "AuthorList": {
                    "@CompleteYN": "Y",
                    "Author": { "LastName": "Curie", "ForeName": "Marie", "Initials": "M" }
                },
                "Language": "eng"
            }
        },
        "PubmedData": {
            "ArticleIdList": {
                "ArticleId": [
                    { "@IdType": "pubmed", "#text": pmid },
                    { "@IdType": "doi", "#text": format!("10.1000/{}", pmid) }
                ]
            }
        }
    })
}

#[derive(Default)]
pub(crate) struct StubService {
    pub ids: Vec<String>,
    pub total_count: Option<usize>,
    pub failing_offsets: HashSet<usize>,
    pub failing_ids: HashSet<String>,
    search_log: Mutex<Vec<(usize, usize)>>,
    fetch_log: Mutex<Vec<Vec<String>>>,
}

impl StubService {
    /// `n` identifiers "1000", "1001", ...
    pub fn with_ids(n: usize) -> Self {
        Self {
            ids: (0..n).map(|i| (1000 + i).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn search_calls(&self) -> Vec<(usize, usize)> {
        self.search_log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn fetch_calls(&self) -> Vec<Vec<String>> {
        self.fetch_log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl EntrezService for StubService {
    async fn search(&self, _query: &str, start: usize, page_size: usize) -> Result<SearchPage> {
        if let Ok(mut log) = self.search_log.lock() {
            log.push((start, page_size));
        }
        if self.failing_offsets.contains(&start) {
            return Err(PubmedError::Transport(format!("search at {} refused", start)));
        }
        let from = start.min(self.ids.len());
        let to = (start + page_size).min(self.ids.len());
        Ok(SearchPage {
            total_count: self.total_count.unwrap_or(self.ids.len()),
            ids: self.ids[from..to].to_vec(),
        })
    }

    async fn fetch(&self, ids: &[String]) -> Result<Vec<RawRecord>> {
        if let Ok(mut log) = self.fetch_log.lock() {
            log.push(ids.to_vec());
        }
        if ids.iter().any(|id| self.failing_ids.contains(id)) {
            return Err(PubmedError::Transport("connection reset by peer".to_string()));
        }
        Ok(ids.iter().map(|id| sample_record(id)).collect())
    }
}
