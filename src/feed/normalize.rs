//! Conversion of raw Atom entries into [`ArticleRecord`]s.

use crate::error::MalformedEntryError;
use crate::feed::atom::RawEntry;
use crate::models::ArticleRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;

/// Map one feed entry to a record.
///
/// `id` and `updated` are required. Title, abstract, authors and categories
/// fall back to empty values when absent.
pub fn normalize(entry: RawEntry) -> Result<ArticleRecord, MalformedEntryError> {
    let link = entry
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(MalformedEntryError::MissingField("id"))?;

    let raw_updated = entry
        .updated
        .filter(|u| !u.trim().is_empty())
        .ok_or(MalformedEntryError::MissingField("updated"))?;
    let updated = parse_timestamp(&raw_updated).ok_or_else(|| MalformedEntryError::InvalidTimestamp {
        field: "updated",
        value: raw_updated.clone(),
    })?;

    let authors = entry
        .authors
        .into_iter()
        .filter_map(|a| a.name)
        .map(|name| collapse_lines(&name))
        .filter(|name| !name.is_empty())
        .collect();

    let tags = entry
        .categories
        .into_iter()
        .filter_map(|c| c.term)
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty())
        .collect();

    Ok(ArticleRecord {
        title: entry.title.as_deref().map(collapse_lines).unwrap_or_default(),
        link,
        abstract_text: entry.summary.as_deref().map(collapse_lines).unwrap_or_default(),
        updated,
        authors,
        tags,
    })
}

/// Parse an ISO-8601 style timestamp as UTC.
///
/// Accepts RFC 3339 (`2026-10-17T17:59:59Z`, with any offset), a timestamp
/// without offset (taken as UTC), or a bare date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Join wrapped lines into one, dropping the indentation the feed adds.
fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .join(" ")
}
