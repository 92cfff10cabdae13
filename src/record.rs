//! Flatten raw `PubmedArticle` trees into fixed eleven-column rows.
//!
//! Each column has a pure extractor `fn(&RawRecord) -> Option<String>` and a
//! sentinel used when the extractor finds nothing. Only a missing PMID drops
//! the record.

use crate::entrez::RawRecord;
use crate::xml_tree::as_list;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const NO_TITLE: &str = "No Title";
pub const NO_ABSTRACT: &str = "No Abstract";
pub const NO_JOURNAL: &str = "No Journal";
pub const UNKNOWN_LANGUAGE: &str = "Unknown";
pub const NO_DATE: &str = "No Data";
pub const NO_AUTHORS: &str = "No Authors";
pub const NO_KEYWORDS: &str = "No Keywords";
pub const NO_DOI: &str = "No DOI";

/// Separator for multi-valued columns
pub const LIST_SEPARATOR: &str = "; ";

/// Output columns, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Pmid,
    Title,
    Abstract,
    Journal,
    Language,
    Year,
    Month,
    Day,
    Authors,
    Keywords,
    Doi,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Pmid,
        Column::Title,
        Column::Abstract,
        Column::Journal,
        Column::Language,
        Column::Year,
        Column::Month,
        Column::Day,
        Column::Authors,
        Column::Keywords,
        Column::Doi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Pmid => "PMID",
            Column::Title => "Title",
            Column::Abstract => "Abstract",
            Column::Journal => "Journal",
            Column::Language => "Language",
            Column::Year => "Year",
            Column::Month => "Month",
            Column::Day => "Day",
            Column::Authors => "Authors",
            Column::Keywords => "Keywords",
            Column::Doi => "DOI",
        }
    }
}

/// One output row. Field order matches [`Column::ALL`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    #[serde(rename = "PMID")]
    pub pmid: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Abstract")]
    pub abstract_text: String,
    #[serde(rename = "Journal")]
    pub journal: String,
    #[serde(rename = "Language")]
    pub language: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Day")]
    pub day: String,
    #[serde(rename = "Authors")]
    pub authors: String,
    #[serde(rename = "Keywords")]
    pub keywords: String,
    #[serde(rename = "DOI")]
    pub doi: String,
}

impl NormalizedRow {
    pub fn get(&self, column: Column) -> &str {
        match column {
            Column::Pmid => &self.pmid,
            Column::Title => &self.title,
            Column::Abstract => &self.abstract_text,
            Column::Journal => &self.journal,
            Column::Language => &self.language,
            Column::Year => &self.year,
            Column::Month => &self.month,
            Column::Day => &self.day,
            Column::Authors => &self.authors,
            Column::Keywords => &self.keywords,
            Column::Doi => &self.doi,
        }
    }

    fn slot(&mut self, column: Column) -> &mut String {
        match column {
            Column::Pmid => &mut self.pmid,
            Column::Title => &mut self.title,
            Column::Abstract => &mut self.abstract_text,
            Column::Journal => &mut self.journal,
            Column::Language => &mut self.language,
            Column::Year => &mut self.year,
            Column::Month => &mut self.month,
            Column::Day => &mut self.day,
            Column::Authors => &mut self.authors,
            Column::Keywords => &mut self.keywords,
            Column::Doi => &mut self.doi,
        }
    }

    pub fn set(&mut self, column: Column, value: String) {
        *self.slot(column) = value;
    }
}

// === Tree lookups ===

/// Follow `path` through nested objects. An array met on the way is entered
/// through its first element.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| {
        let node = match node {
            Value::Array(items) => items.first()?,
            other => other,
        };
        node.as_object()?.get(*key)
    })
}

/// Text content of a node: strings as-is, elements through `#text`, lists
/// through their first item. Blank text counts as absent.
pub fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(node) => return node.get("#text").and_then(text_of),
        Value::Array(items) => return items.first().and_then(text_of),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    lookup(value, path).and_then(text_of)
}

fn attr_is(value: &Value, attr: &str, expected: &str) -> bool {
    value
        .get(attr)
        .and_then(Value::as_str)
        .is_some_and(|v| v.eq_ignore_ascii_case(expected))
}

fn join_nonempty(parts: Vec<String>) -> Option<String> {
    (!parts.is_empty()).then(|| parts.join(LIST_SEPARATOR))
}

// === Field extractors ===

const ARTICLE: [&str; 2] = ["MedlineCitation", "Article"];

fn article(raw: &RawRecord) -> Option<&Value> {
    lookup(raw, &ARTICLE)
}

fn pub_date(raw: &RawRecord) -> Option<&Value> {
    article(raw).and_then(|a| lookup(a, &["Journal", "JournalIssue", "PubDate"]))
}

fn article_date(raw: &RawRecord) -> Option<&Value> {
    article(raw).and_then(|a| lookup(a, &["ArticleDate"]))
}

fn extract_pmid(raw: &RawRecord) -> Option<String> {
    text_at(raw, &["MedlineCitation", "PMID"])
}

fn extract_title(raw: &RawRecord) -> Option<String> {
    article(raw).and_then(|a| text_at(a, &["ArticleTitle"]))
}

fn extract_abstract(raw: &RawRecord) -> Option<String> {
    let sections = article(raw).and_then(|a| lookup(a, &["Abstract", "AbstractText"]))?;
    let parts: Vec<String> = as_list(sections).into_iter().filter_map(text_of).collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn extract_journal(raw: &RawRecord) -> Option<String> {
    article(raw).and_then(|a| text_at(a, &["Journal", "Title"]))
}

fn extract_language(raw: &RawRecord) -> Option<String> {
    article(raw).and_then(|a| text_at(a, &["Language"]))
}

fn extract_year(raw: &RawRecord) -> Option<String> {
    match pub_date(raw) {
        Some(date) => text_at(date, &["Year"]).or_else(|| text_at(date, &["MedlineDate"])),
        None => article_date(raw).and_then(|d| text_at(d, &["Year"])),
    }
}

/// First alphabetic token of a free-form date such as "1998 Dec-1999 Jan".
fn medline_month(medline_date: &str) -> Option<String> {
    medline_date
        .split(|c: char| c.is_whitespace() || c == '-')
        .find(|token| token.chars().next().is_some_and(char::is_alphabetic))
        .map(str::to_string)
}

fn extract_month(raw: &RawRecord) -> Option<String> {
    match pub_date(raw) {
        Some(date) => text_at(date, &["Month"])
            .or_else(|| text_at(date, &["MedlineDate"]).and_then(|d| medline_month(&d))),
        None => article_date(raw).and_then(|d| text_at(d, &["Month"])),
    }
}

fn extract_day(raw: &RawRecord) -> Option<String> {
    match pub_date(raw) {
        Some(date) => text_at(date, &["Day"]),
        None => article_date(raw).and_then(|d| text_at(d, &["Day"])),
    }
}

fn author_name(author: &Value) -> Option<String> {
    let last = text_at(author, &["LastName"]);
    let given = text_at(author, &["Initials"]).or_else(|| text_at(author, &["ForeName"]));
    match (last, given) {
        (Some(last), Some(given)) => Some(format!("{} {}", last, given)),
        (Some(last), None) => Some(last),
        (None, _) => text_at(author, &["CollectiveName"]),
    }
}

fn extract_authors(raw: &RawRecord) -> Option<String> {
    let authors = article(raw).and_then(|a| lookup(a, &["AuthorList", "Author"]))?;
    join_nonempty(as_list(authors).into_iter().filter_map(author_name).collect())
}

/// Keywords from every owner group (NLM, NOTNLM, ...), first occurrence wins.
fn extract_keywords(raw: &RawRecord) -> Option<String> {
    let groups = lookup(raw, &["MedlineCitation", "KeywordList"])?;
    let mut seen = HashSet::new();
    let keywords: Vec<String> = as_list(groups)
        .into_iter()
        .filter_map(|group| group.get("Keyword"))
        .flat_map(as_list)
        .filter_map(text_of)
        .filter(|k| seen.insert(k.to_lowercase()))
        .collect();
    join_nonempty(keywords)
}

fn extract_doi(raw: &RawRecord) -> Option<String> {
    let from_ids = lookup(raw, &["PubmedData", "ArticleIdList", "ArticleId"]).and_then(|ids| {
        as_list(ids)
            .into_iter()
            .find(|id| attr_is(id, "@IdType", "doi"))
            .and_then(text_of)
    });
    from_ids.or_else(|| {
        let locations = article(raw).and_then(|a| a.get("ELocationID"))?;
        as_list(locations)
            .into_iter()
            .find(|loc| attr_is(loc, "@EIdType", "doi"))
            .and_then(text_of)
    })
}

type Extractor = fn(&RawRecord) -> Option<String>;

struct FieldSpec {
    column: Column,
    extract: Extractor,
    default: &'static str,
}

/// Every column except PMID, which decides whether there is a row at all.
const FIELDS: [FieldSpec; 10] = [
    FieldSpec { column: Column::Title, extract: extract_title, default: NO_TITLE },
    FieldSpec { column: Column::Abstract, extract: extract_abstract, default: NO_ABSTRACT },
    FieldSpec { column: Column::Journal, extract: extract_journal, default: NO_JOURNAL },
    FieldSpec { column: Column::Language, extract: extract_language, default: UNKNOWN_LANGUAGE },
    FieldSpec { column: Column::Year, extract: extract_year, default: NO_DATE },
    FieldSpec { column: Column::Month, extract: extract_month, default: NO_DATE },
    FieldSpec { column: Column::Day, extract: extract_day, default: NO_DATE },
    FieldSpec { column: Column::Authors, extract: extract_authors, default: NO_AUTHORS },
    FieldSpec { column: Column::Keywords, extract: extract_keywords, default: NO_KEYWORDS },
    FieldSpec { column: Column::Doi, extract: extract_doi, default: NO_DOI },
];

/// Normalize one raw record. Returns `None` only when the PMID is missing.
pub fn normalize(raw: &RawRecord) -> Option<NormalizedRow> {
    let mut row = NormalizedRow {
        pmid: extract_pmid(raw)?,
        ..NormalizedRow::default()
    };
    for field in &FIELDS {
        let value = (field.extract)(raw).unwrap_or_else(|| field.default.to_string());
        row.set(field.column, value);
    }
    Some(row)
}
