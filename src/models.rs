//! Data models shared by the fetch, aggregation and report stages.
//!
//! - [`ArticleRecord`]: one paper as normalized from a feed entry
//! - [`AggregationEntry`]: a deduplicated record plus the keywords that found it
//! - [`TagFilter`]: the ordered set of tags an operator wants reported
//!
//! A record's `link` is its identity. Two records with the same link are the
//! same paper, whichever keyword search produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One search term. Each keyword is queried on its own.
pub type Keyword = String;

/// A paper as read from the search feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Title with embedded line breaks collapsed to single spaces.
    pub title: String,
    /// The entry's `<id>` URL. Stable across keyword searches; used as the dedup key.
    pub link: String,
    /// The paper abstract (`<summary>`).
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Last-updated timestamp of the entry.
    pub updated: DateTime<Utc>,
    /// Author names in feed order.
    pub authors: Vec<String>,
    /// Category terms attached to the entry.
    pub tags: BTreeSet<String>,
}

impl ArticleRecord {
    /// Whether any of this record's tags is in `filter`.
    pub fn is_of_interest(&self, filter: &TagFilter) -> bool {
        self.tags.iter().any(|tag| filter.contains(tag))
    }
}

/// A deduplicated record and every keyword whose search returned it.
///
/// The record payload is the first sighting's; later sightings only add to
/// `matched_keywords`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationEntry {
    pub record: ArticleRecord,
    pub matched_keywords: BTreeSet<Keyword>,
}

/// Tags of interest, in the order their report sections should appear.
///
/// Duplicates are dropped on construction so each tag yields one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    tags: Vec<String>,
}

impl TagFilter {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !ordered.contains(&tag) {
                ordered.push(tag);
            }
        }
        Self { tags: ordered }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Tags in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }
}
