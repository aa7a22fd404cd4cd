//! Cross-keyword deduplication and grouping by tag.
//!
//! Each keyword is searched on its own, so the same paper regularly comes back
//! from several searches. [`Aggregator`] keeps one [`AggregationEntry`] per
//! link for the whole run and records every keyword that produced it; at the
//! end the entries are bucketed under each tag of the [`TagFilter`].
//!
//! Invariants:
//!
//! - an entry is created only for a record whose tags intersect the filter;
//! - the first sighting of a link fixes the displayed fields;
//! - `matched_keywords` is the exact union of keywords whose results contained
//!   the link, whatever order the keywords were processed in;
//! - an entry appears at most once per bucket, possibly in several buckets.

use crate::models::{AggregationEntry, ArticleRecord, Keyword, TagFilter};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// Entries sharing one tag of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagBucket {
    pub tag: String,
    pub entries: Vec<AggregationEntry>,
}

/// Result of aggregating one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    /// One bucket per filter tag, in filter order. Buckets may be empty.
    pub buckets: Vec<TagBucket>,
    /// Every tag seen on any fetched record, filtered or not.
    pub all_tags: BTreeSet<String>,
    /// Number of distinct links that passed the filter.
    pub unique_records: usize,
}

/// Accumulates fetch results for one run.
#[derive(Debug)]
pub struct Aggregator {
    filter: TagFilter,
    entries: Vec<AggregationEntry>,
    by_link: HashMap<String, usize>,
    /// Keywords that saw a link while it had no entry yet.
    unmatched: HashMap<String, BTreeSet<Keyword>>,
    all_tags: BTreeSet<String>,
}

impl Aggregator {
    pub fn new(filter: TagFilter) -> Self {
        Self {
            filter,
            entries: Vec::new(),
            by_link: HashMap::new(),
            unmatched: HashMap::new(),
            all_tags: BTreeSet::new(),
        }
    }

    /// Merge the records one keyword's search returned.
    pub fn observe<I>(&mut self, keyword: &str, records: I)
    where
        I: IntoIterator<Item = ArticleRecord>,
    {
        for record in records {
            self.all_tags.extend(record.tags.iter().cloned());

            if let Some(&idx) = self.by_link.get(&record.link) {
                self.entries[idx].matched_keywords.insert(keyword.to_string());
            } else if record.is_of_interest(&self.filter) {
                let mut matched_keywords = self.unmatched.remove(&record.link).unwrap_or_default();
                matched_keywords.insert(keyword.to_string());
                debug!(link = %record.link, %keyword, "New entry");
                self.by_link.insert(record.link.clone(), self.entries.len());
                self.entries.push(AggregationEntry {
                    record,
                    matched_keywords,
                });
            } else {
                self.unmatched
                    .entry(record.link)
                    .or_default()
                    .insert(keyword.to_string());
            }
        }
    }

    /// Bucket the entries by filter tag, in filter order.
    #[instrument(level = "info", skip_all)]
    pub fn finish(self) -> Aggregation {
        let buckets: Vec<TagBucket> = self
            .filter
            .iter()
            .map(|tag| TagBucket {
                tag: tag.to_string(),
                entries: self
                    .entries
                    .iter()
                    .filter(|entry| entry.record.tags.contains(tag))
                    .cloned()
                    .collect(),
            })
            .collect();

        info!(
            unique = self.entries.len(),
            buckets = buckets.len(),
            all_tags = ?self.all_tags,
            "Aggregated records"
        );

        Aggregation {
            buckets,
            all_tags: self.all_tags,
            unique_records: self.entries.len(),
        }
    }
}

/// Aggregate per-keyword fetch results in one call.
///
/// # Arguments
///
/// * `per_keyword` - Each keyword with the records its search returned, in
///   the order the keywords were searched
/// * `filter` - Tags of interest; records carrying none of them are dropped
///
/// # Returns
///
/// An [`Aggregation`] with one bucket per filter tag. Records seen under
/// several keywords appear once, listing every keyword that found them.
pub fn aggregate(per_keyword: &[(Keyword, Vec<ArticleRecord>)], filter: &TagFilter) -> Aggregation {
    let mut aggregator = Aggregator::new(filter.clone());
    for (keyword, records) in per_keyword {
        aggregator.observe(keyword, records.iter().cloned());
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;

    fn links(bucket: &TagBucket) -> Vec<&str> {
        bucket.entries.iter().map(|e| e.record.link.as_str()).collect()
    }

    fn keywords(entry: &AggregationEntry) -> Vec<&str> {
        entry.matched_keywords.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_single_keyword_scenario() {
        let results = vec![(
            "diffusion models".to_string(),
            vec![
                record("a", &["cs.CV"], 17),
                record("b", &["cs.LG"], 17),
                record("c", &["cs.CV", "cs.LG"], 16),
                record("d", &["stat.ML"], 16),
                record("e", &["cs.CL"], 15),
            ],
        )];

        let agg = aggregate(&results, &TagFilter::new(["cs.CV"]));

        assert_eq!(agg.buckets.len(), 1);
        assert_eq!(agg.buckets[0].tag, "cs.CV");
        assert_eq!(links(&agg.buckets[0]), vec!["a", "c"]);
        assert_eq!(agg.unique_records, 2);
        assert_eq!(
            agg.all_tags.iter().collect::<Vec<_>>(),
            vec!["cs.CL", "cs.CV", "cs.LG", "stat.ML"]
        );
    }

    #[test]
    fn test_same_link_from_two_keywords_is_merged() {
        let results = vec![
            ("diffusion".to_string(), vec![record("x", &["cs.CV"], 17)]),
            ("denoising".to_string(), vec![record("x", &["cs.CV", "cs.LG"], 17)]),
        ];

        let agg = aggregate(&results, &TagFilter::new(["cs.CV", "cs.LG"]));

        assert_eq!(agg.unique_records, 1);
        let entry = &agg.buckets[0].entries[0];
        assert_eq!(keywords(entry), vec!["denoising", "diffusion"]);
        // first sighting wins for display fields
        assert_eq!(entry.record.tags.len(), 1);
        assert_eq!(links(&agg.buckets[0]), vec!["x"]);
        assert!(agg.buckets[1].entries.is_empty());
    }

    #[test]
    fn test_filter_correctness() {
        let results = vec![(
            "k".to_string(),
            vec![record("cl", &["cs.CL"], 17), record("both", &["cs.CL", "cs.CV"], 17)],
        )];

        let agg = aggregate(&results, &TagFilter::new(["cs.CV"]));

        assert_eq!(agg.buckets.len(), 1);
        assert_eq!(links(&agg.buckets[0]), vec!["both"]);
    }

    #[test]
    fn test_entry_appears_in_every_matching_bucket_once() {
        let results = vec![
            (
                "k1".to_string(),
                vec![record("m", &["cs.CV", "cs.LG"], 17), record("m", &["cs.CV", "cs.LG"], 17)],
            ),
            ("k2".to_string(), vec![record("m", &["cs.CV", "cs.LG"], 17)]),
        ];

        let agg = aggregate(&results, &TagFilter::new(["cs.LG", "cs.CV"]));

        assert_eq!(agg.buckets[0].tag, "cs.LG");
        assert_eq!(links(&agg.buckets[0]), vec!["m"]);
        assert_eq!(links(&agg.buckets[1]), vec!["m"]);
        assert_eq!(keywords(&agg.buckets[1].entries[0]), vec!["k1", "k2"]);
    }

    #[test]
    fn test_repeated_aggregation_is_idempotent() {
        let records = vec![record("a", &["cs.CV"], 17), record("b", &["cs.CV"], 16)];
        let once = aggregate(&[("k".to_string(), records.clone())], &TagFilter::new(["cs.CV"]));

        let twice = aggregate(
            &[("k".to_string(), records.clone()), ("k".to_string(), records)],
            &TagFilter::new(["cs.CV"]),
        );

        assert_eq!(once.buckets, twice.buckets);
        assert_eq!(keywords(&twice.buckets[0].entries[0]), vec!["k"]);
    }

    #[test]
    fn test_keyword_union_does_not_depend_on_fetch_order() {
        // The same paper seen with different categories by the two searches;
        // only the second sighting passes the filter.
        let filtered_out = ("nlp".to_string(), vec![record("p", &["cs.CL"], 17)]);
        let of_interest = ("vision".to_string(), vec![record("p", &["cs.CV"], 17)]);
        let filter = TagFilter::new(["cs.CV"]);

        let forward = aggregate(&[filtered_out.clone(), of_interest.clone()], &filter);
        let backward = aggregate(&[of_interest, filtered_out], &filter);

        for agg in [&forward, &backward] {
            assert_eq!(agg.unique_records, 1);
            assert_eq!(keywords(&agg.buckets[0].entries[0]), vec!["nlp", "vision"]);
        }
    }

    #[test]
    fn test_dedup_map_is_independent_of_keyword_order() {
        let first = (
            "a".to_string(),
            vec![record("1", &["cs.CV"], 17), record("2", &["cs.LG"], 16)],
        );
        let second = (
            "b".to_string(),
            vec![record("2", &["cs.LG"], 16), record("3", &["cs.CV"], 15)],
        );
        let filter = TagFilter::new(["cs.CV", "cs.LG"]);

        let ab = aggregate(&[first.clone(), second.clone()], &filter);
        let ba = aggregate(&[second, first], &filter);

        let by_link = |agg: &Aggregation| {
            let mut seen: Vec<(String, Vec<String>)> = agg
                .buckets
                .iter()
                .flat_map(|b| b.entries.iter())
                .map(|e| {
                    (
                        e.record.link.clone(),
                        e.matched_keywords.iter().cloned().collect(),
                    )
                })
                .collect();
            seen.sort();
            seen.dedup();
            seen
        };
        assert_eq!(by_link(&ab), by_link(&ba));
        assert_eq!(ab.all_tags, ba.all_tags);
    }

    #[test]
    fn test_unmatched_links_never_reach_buckets() {
        let mut aggregator = Aggregator::new(TagFilter::new(["cs.CV"]));
        aggregator.observe("k1", vec![record("q", &["cs.CL"], 17)]);
        aggregator.observe("k2", vec![record("q", &["cs.CL"], 17)]);

        let agg = aggregator.finish();

        assert_eq!(agg.unique_records, 0);
        assert!(agg.buckets[0].entries.is_empty());
        assert!(agg.all_tags.contains("cs.CL"));
    }
}
