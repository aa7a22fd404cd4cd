//! Atom feed decoding.
//!
//! Only the elements the pipeline consumes are declared; everything else in
//! the arXiv response (`link`, `published`, `opensearch:*`, `arxiv:*`) is
//! ignored. All fields are optional at this layer so that a single bad entry
//! can be rejected by the normalizer without failing the whole page.

use crate::error::FeedError;
use quick_xml::de::from_str;
use serde::Deserialize;

/// One page of the search feed.
#[derive(Debug, Default, Deserialize)]
pub struct RawFeed {
    /// Feed-level last-updated timestamp, the reference point for the cutoff.
    pub updated: Option<String>,
    #[serde(rename = "entry", default)]
    pub entries: Vec<RawEntry>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub updated: Option<String>,
    #[serde(rename = "author", default)]
    pub authors: Vec<RawAuthor>,
    #[serde(rename = "category", default)]
    pub categories: Vec<RawCategory>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawAuthor {
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawCategory {
    #[serde(rename = "@term")]
    pub term: Option<String>,
}

/// Decode one response body.
pub fn parse_feed(xml: &str) -> Result<RawFeed, FeedError> {
    from_str(xml).map_err(|e| FeedError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/"
      xmlns:arxiv="http://arxiv.org/schemas/atom">
  <link href="http://arxiv.org/api/query" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2026-10-18T00:00:00-04:00</updated>
  <opensearch:totalResults>2</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2610.00001v1</id>
    <updated>2026-10-17T17:59:59Z</updated>
    <published>2026-10-17T17:59:59Z</published>
    <title>Denoising
      Diffusion Everywhere</title>
    <summary>  We study diffusion.
    </summary>
    <author>
      <name>Jane Doe</name>
    </author>
    <author>
      <name>John Roe</name>
    </author>
    <link href="http://arxiv.org/abs/2610.00001v1" rel="alternate" type="text/html"/>
    <arxiv:primary_category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2610.00002v2</id>
    <updated>2026-10-16T08:00:00Z</updated>
  </entry>
</feed>
"#;

    #[test]
    fn test_parse_feed_reads_consumed_elements() {
        let feed = parse_feed(PAGE).unwrap();
        assert_eq!(feed.updated.as_deref(), Some("2026-10-18T00:00:00-04:00"));
        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.id.as_deref(), Some("http://arxiv.org/abs/2610.00001v1"));
        assert_eq!(first.authors.len(), 2);
        assert_eq!(first.authors[1].name.as_deref(), Some("John Roe"));
        let terms: Vec<_> = first
            .categories
            .iter()
            .filter_map(|c| c.term.as_deref())
            .collect();
        assert_eq!(terms, vec!["cs.CV", "cs.LG"]);
    }

    #[test]
    fn test_parse_feed_tolerates_sparse_entries() {
        let feed = parse_feed(PAGE).unwrap();
        let second = &feed.entries[1];
        assert!(second.title.is_none());
        assert!(second.summary.is_none());
        assert!(second.authors.is_empty());
        assert!(second.categories.is_empty());
    }

    #[test]
    fn test_parse_feed_without_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><updated>2026-10-18T00:00:00Z</updated></feed>"#;
        let feed = parse_feed(xml).unwrap();
        assert!(feed.entries.is_empty());
        assert!(feed.updated.is_some());
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        let err = parse_feed("<feed><entry></feed>").unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));
    }
}
