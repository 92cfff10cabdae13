//! Rewrite the raw Year/Month/Day columns into numeric form.
//!
//! - Year: first standalone run of four ASCII digits, else `"Unknown"`
//! - Month: numbers 1-12 as plain integers; names matched on their first three
//!   letters; anything else `"1"`
//! - Day: numbers 1-31 as plain integers; anything else `"1"`
//!
//! Output values are fixed points of the same rules, so the pass is idempotent.

use crate::record::NormalizedRow;
use regex::Regex;
use std::sync::OnceLock;

pub const UNKNOWN_YEAR: &str = "Unknown";
pub const DEFAULT_MONTH: &str = "1";
pub const DEFAULT_DAY: &str = "1";

const MONTHS: [(&str, u32); 12] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

fn year_pattern() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)").expect("valid year regex"))
}

fn numeric_in(raw: &str, range: std::ops::RangeInclusive<u32>) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|n| range.contains(n))
}

pub fn standardize_year(raw: &str) -> String {
    year_pattern()
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}

pub fn standardize_month(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(n) = numeric_in(raw, 1..=12) {
        return n.to_string();
    }
    let prefix: String = raw.chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| *name == prefix)
        .map(|(_, n)| n.to_string())
        .unwrap_or_else(|| DEFAULT_MONTH.to_string())
}

pub fn standardize_day(raw: &str) -> String {
    numeric_in(raw.trim(), 1..=31)
        .map(|n| n.to_string())
        .unwrap_or_else(|| DEFAULT_DAY.to_string())
}

/// Rewrite the date columns of every row in place. Never adds or removes rows.
pub fn standardize(rows: &mut [NormalizedRow]) {
    for row in rows.iter_mut() {
        row.year = standardize_year(&row.year);
        row.month = standardize_month(&row.month);
        row.day = standardize_day(&row.day);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: &str, month: &str, day: &str) -> NormalizedRow {
        NormalizedRow {
            pmid: "1".to_string(),
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
            ..NormalizedRow::default()
        }
    }

    #[test]
    fn test_month_names() {
        assert_eq!(standardize_month("Jan"), "1");
        assert_eq!(standardize_month("January"), "1");
        assert_eq!(standardize_month("jan"), "1");
        assert_eq!(standardize_month("DECEMBER"), "12");
        assert_eq!(standardize_month("Sept"), "9");
    }

    #[test]
    fn test_numeric_months() {
        assert_eq!(standardize_month("11"), "11");
        assert_eq!(standardize_month("05"), "5");
        assert_eq!(standardize_month("13"), "1");
        assert_eq!(standardize_month("0"), "1");
    }

    #[test]
    fn test_unparseable_month_defaults() {
        assert_eq!(standardize_month("Spring"), "1");
        assert_eq!(standardize_month("Winter"), "1");
        assert_eq!(standardize_month("No Data"), "1");
        assert_eq!(standardize_month(""), "1");
    }

    #[test]
    fn test_years() {
        assert_eq!(standardize_year("2020"), "2020");
        assert_eq!(standardize_year("2020 Jan 15"), "2020");
        assert_eq!(standardize_year("1998 Dec-1999 Jan"), "1998");
        assert_eq!(standardize_year("No Data"), "Unknown");
        assert_eq!(standardize_year("20201"), "Unknown");
        assert_eq!(standardize_year("Unknown"), "Unknown");
    }

    #[test]
    fn test_year_ignores_non_ascii_digits() {
        assert_eq!(standardize_year("٢٠٢٠"), "Unknown");
        assert_eq!(standardize_year("２０２０"), "Unknown");
        assert_eq!(standardize_year("٢٠٢٠ (2020)"), "2020");
        assert_eq!(standardize_day("٤"), "1");
    }

    #[test]
    fn test_days() {
        assert_eq!(standardize_day("04"), "4");
        assert_eq!(standardize_day("31"), "31");
        assert_eq!(standardize_day("32"), "1");
        assert_eq!(standardize_day("No Data"), "1");
    }

    #[test]
    fn test_standardize_is_idempotent() {
        let mut rows = vec![
            row("2021", "Mar", "04"),
            row("1998 Dec-1999 Jan", "Dec", "No Data"),
            row("No Data", "Winter", "15"),
            row("2019", "09", "7"),
        ];
        standardize(&mut rows);
        let once = rows.clone();
        standardize(&mut rows);
        assert_eq!(rows, once);
        assert_eq!(rows.len(), 4);
        assert_eq!((once[0].year.as_str(), once[0].month.as_str(), once[0].day.as_str()), ("2021", "3", "4"));
        assert_eq!((once[2].year.as_str(), once[2].month.as_str()), ("Unknown", "1"));
    }

    #[test]
    fn test_other_columns_untouched() {
        let mut rows = vec![NormalizedRow {
            title: "Keep me".to_string(),
            ..row("2020", "Jan", "1")
        }];
        standardize(&mut rows);
        assert_eq!(rows[0].title, "Keep me");
        assert_eq!(rows[0].pmid, "1");
    }
}
