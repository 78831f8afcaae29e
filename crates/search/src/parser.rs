//! Parser for the advanced query syntax.
//!
//! Recognized tokens: `date:YYYY-MM-DD..YYYY-MM-DD`, `from:<word>`, and
//! `sort:(date|relevance)`. Everything else is a keyword.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;

/// A parsed search query with engine filter expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub keywords: Vec<String>,
    pub filters: Vec<String>,
    pub sort: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub source: Option<String>,
}

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"date:(\d{4}-\d{2}-\d{2})\.\.(\d{4}-\d{2}-\d{2})").expect("valid date regex")
});
static SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"from:(\w+)").expect("valid source regex"));
static SORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sort:(date|relevance)").expect("valid sort regex"));

/// Parse a free-form query string.
///
/// Recognized tokens are stripped from the working string in order; an
/// inverted date range is swapped to keep it ascending, and a range that
/// fails to parse leaves both dates unset with the token retained as a
/// keyword.
pub fn parse_query(query: &str) -> ParsedQuery {
    let mut result = ParsedQuery::default();
    let mut working = query.to_owned();

    if let Some(caps) = DATE_RANGE.captures(&working) {
        let from = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d");
        let to = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d");
        if let (Ok(from), Ok(to)) = (from, to) {
            let mut from = from.and_time(NaiveTime::MIN).and_utc();
            let mut to = to.and_time(NaiveTime::MIN).and_utc();
            if from > to {
                std::mem::swap(&mut from, &mut to);
            }
            result.date_from = Some(from);
            result.date_to = Some(to);
            working = DATE_RANGE.replace_all(&working, "").into_owned();
        }
    }

    if let Some(caps) = SOURCE.captures(&working) {
        result.source = Some(caps[1].to_owned());
        working = SOURCE.replace_all(&working, "").into_owned();
    }

    if let Some(caps) = SORT.captures(&working) {
        result.sort = Some(caps[1].to_owned());
        working = SORT.replace_all(&working, "").into_owned();
    }

    result.keywords = working.split_whitespace().map(str::to_owned).collect();
    result.filters = build_filters(&result);
    result
}

/// Build engine filter expressions from the parsed parts. Dates compare
/// against the index's Unix-second integers; order is preserved.
pub fn build_filters(parsed: &ParsedQuery) -> Vec<String> {
    let mut filters = Vec::new();

    if let (Some(from), Some(to)) = (parsed.date_from, parsed.date_to) {
        filters.push(format!(
            "date >= {} AND date <= {}",
            from.timestamp(),
            to.timestamp()
        ));
    }
    if let Some(source) = &parsed.source {
        filters.push(format!("chat_username = \"{source}\""));
    }

    filters
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
