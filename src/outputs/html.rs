//! HTML report rendering.
//!
//! [`assemble`] turns an [`Aggregation`] into the report body: one section per
//! tag bucket, in configured order. A paper is rendered in full the first time
//! it appears; in any later section it is listed under "Already shown" with
//! its title and link only. [`render_document`] wraps the body into a complete,
//! styled page for delivery.
//!
//! # Layout
//!
//! ```text
//! <h2>ArXiv Report - October 18, 2026</h2>
//! <h3>cs.CV</h3>
//! <ul>
//! <li> title/link, tag badges, authors, date, matched keywords, abstract </li>
//! </ul>
//! <h4 class="xref-heading">Already shown</h4>
//! <ul class="xref"> <li> title/link </li> </ul>
//! ```

use crate::aggregate::Aggregation;
use crate::models::AggregationEntry;
use chrono::NaiveDate;
use itertools::Itertools;
use quick_xml::escape::escape;
use std::collections::HashSet;
use tracing::{info, instrument};

/// Outcome of assembling a run's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    Report(Report),
    /// Nothing qualified for the report; delivery should be skipped.
    NoContent,
}

/// A finished report body with the data needed to deliver it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub body: String,
    /// Distinct papers rendered in full.
    pub total_articles: usize,
    pub sections: Vec<SectionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub tag: String,
    /// Entries rendered in full in this section.
    pub full: usize,
    /// Entries listed as already shown.
    pub cross_references: usize,
}

/// Render the tag buckets of `aggregation` as a report dated `date`.
#[instrument(level = "info", skip(aggregation))]
pub fn assemble(aggregation: &Aggregation, date: NaiveDate) -> Assembled {
    let long_date = date.format("%B %d, %Y").to_string();
    let mut displayed: HashSet<&str> = HashSet::new();
    let mut sections = Vec::with_capacity(aggregation.buckets.len());
    let mut sections_html = String::new();

    for bucket in &aggregation.buckets {
        let (fresh, seen): (Vec<&AggregationEntry>, Vec<&AggregationEntry>) = bucket
            .entries
            .iter()
            .partition(|entry| displayed.insert(entry.record.link.as_str()));

        sections_html.push_str(&format!("<h3>{}</h3>\n<ul>\n", escape(bucket.tag.as_str())));
        for entry in &fresh {
            sections_html.push_str(&render_full(entry));
        }
        sections_html.push_str("</ul>\n");

        if !seen.is_empty() {
            sections_html.push_str("<h4 class=\"xref-heading\">Already shown</h4>\n<ul class=\"xref\">\n");
            for entry in &seen {
                sections_html.push_str(&render_cross_reference(entry));
            }
            sections_html.push_str("</ul>\n");
        }

        sections.push(SectionSummary {
            tag: bucket.tag.clone(),
            full: fresh.len(),
            cross_references: seen.len(),
        });
    }

    let total_articles = displayed.len();
    if total_articles == 0 {
        info!("No qualifying articles; nothing to report");
        return Assembled::NoContent;
    }

    let subject = format!("ArXiv Report - {long_date} - {total_articles} New Articles");
    let body = format!(
        "<h2>ArXiv Report - {long_date}</h2>\n<h2>Your Research Summary</h2>\n{sections_html}"
    );
    info!(total_articles, %subject, "Assembled report");

    Assembled::Report(Report {
        subject,
        body,
        total_articles,
        sections,
    })
}

fn render_full(entry: &AggregationEntry) -> String {
    let record = &entry.record;
    let mut html = String::from("<li>\n");
    html.push_str(&format!(
        "\t<b><a href=\"{}\">{}</a></b><br>\n",
        escape(record.link.as_str()),
        escape(record.title.as_str())
    ));
    html.push_str("\t<div class=\"tag-container\">\n");
    for tag in &record.tags {
        html.push_str(&format!("\t\t<span class=\"tag\">{}</span>\n", escape(tag.as_str())));
    }
    html.push_str("\t</div>\n");
    html.push_str(&format!(
        "\t<i class=\"authors\">{}</i><br>\n",
        escape(record.authors.iter().join(", ").as_str())
    ));
    html.push_str(&format!(
        "\t<span class=\"date\">{}</span>\n",
        record.updated.format("%Y-%m-%d")
    ));
    html.push_str(&format!(
        "\t<p class=\"keywords\">Matched: {}</p>\n",
        escape(entry.matched_keywords.iter().join(", ").as_str())
    ));
    html.push_str(&format!(
        "\t<p class=\"abstract\">{}</p>\n",
        escape(record.abstract_text.as_str())
    ));
    html.push_str("</li>\n");
    html
}

fn render_cross_reference(entry: &AggregationEntry) -> String {
    format!(
        "<li><a href=\"{}\">{}</a> <span class=\"seen\">(already shown)</span></li>\n",
        escape(entry.record.link.as_str()),
        escape(entry.record.title.as_str())
    )
}

const STYLESHEET: &str = r#"
@page { background-color: #1a1a1a; margin: 1cm; }
body { background-color: #1a1a1a; color: #e0e0e0; font-family: sans-serif; line-height: 1.5; margin: 0; padding: 0; }
h1, h2, h3 { color: #ffffff; border-bottom: 1px solid #444; padding-bottom: 10px; }
h3 { color: #ffcc80; border-bottom: 2px solid #444; margin-top: 30px; }
a { color: #88ccff; text-decoration: none; }
li { margin-bottom: 15px; padding: 10px; background-color: #262626; border-radius: 5px; }
b { color: #ffcc80; }
.tag-container { margin: 5px 0; }
.tag { background-color: #334455; color: #88ccff; padding: 2px 8px; border-radius: 8px; font-size: 0.75em; font-weight: bold; display: inline-block; margin-right: 5px; border: 1px solid #445566; }
.authors { color: #bbbbbb; font-size: 0.85em; }
.date, .seen { color: #888888; font-size: 0.8em; }
.keywords { color: #ffcc80; font-size: 0.8em; }
.xref li { padding: 4px 10px; margin-bottom: 5px; }
"#;

/// Wrap a report body into a standalone HTML page.
pub fn render_document(report: &Report) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(report.subject.as_str()),
        STYLESHEET,
        report.body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::TagFilter;
    use crate::models::fixtures::record;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn report(assembled: Assembled) -> Report {
        match assembled {
            Assembled::Report(report) => report,
            Assembled::NoContent => panic!("expected a report"),
        }
    }

    #[test]
    fn test_single_tag_scenario() {
        let results = vec![(
            "diffusion models".to_string(),
            vec![
                record("a", &["cs.CV"], 17),
                record("b", &["cs.LG"], 17),
                record("c", &["cs.CV"], 16),
                record("d", &["cs.AI"], 16),
                record("e", &["cs.CL"], 15),
            ],
        )];
        let agg = aggregate(&results, &TagFilter::new(["cs.CV"]));

        let report = report(assemble(&agg, date()));

        assert_eq!(report.total_articles, 2);
        assert_eq!(
            report.sections,
            vec![SectionSummary {
                tag: "cs.CV".to_string(),
                full: 2,
                cross_references: 0
            }]
        );
        assert!(!report.body.contains("Already shown"));
        assert_eq!(report.subject, "ArXiv Report - October 18, 2026 - 2 New Articles");
    }

    #[test]
    fn test_paper_is_rendered_in_full_once() {
        let results = vec![("k".to_string(), vec![record("both", &["cs.CV", "cs.LG"], 17)])];
        let agg = aggregate(&results, &TagFilter::new(["cs.LG", "cs.CV"]));

        let report = report(assemble(&agg, date()));

        assert_eq!(report.total_articles, 1);
        assert_eq!(report.sections[0].tag, "cs.LG");
        assert_eq!(report.sections[0].full, 1);
        assert_eq!(report.sections[1].full, 0);
        assert_eq!(report.sections[1].cross_references, 1);
        assert_eq!(report.body.matches("class=\"abstract\"").count(), 1);
        assert_eq!(report.body.matches("(already shown)").count(), 1);

        let lg = report.body.find("<h3>cs.LG</h3>").unwrap();
        let cv = report.body.find("<h3>cs.CV</h3>").unwrap();
        let abstract_at = report.body.find("class=\"abstract\"").unwrap();
        assert!(lg < abstract_at && abstract_at < cv);
    }

    #[test]
    fn test_total_counts_distinct_papers() {
        let results = vec![(
            "k".to_string(),
            vec![
                record("x", &["cs.CV", "cs.LG"], 17),
                record("y", &["cs.LG"], 17),
                record("z", &["cs.CV"], 16),
            ],
        )];
        let agg = aggregate(&results, &TagFilter::new(["cs.CV", "cs.LG"]));

        let report = report(assemble(&agg, date()));

        // bucket sizes sum to 4, but only three papers exist
        assert_eq!(report.total_articles, 3);
        assert!(report.subject.ends_with("3 New Articles"));
    }

    #[test]
    fn test_no_content_when_nothing_qualifies() {
        let results = vec![("k".to_string(), vec![record("a", &["cs.CL"], 17)])];
        let agg = aggregate(&results, &TagFilter::new(["cs.CV"]));
        assert_eq!(assemble(&agg, date()), Assembled::NoContent);
    }

    #[test]
    fn test_full_entry_contents_are_escaped() {
        let mut paper = record("http://arxiv.org/abs/1?a=1&b=2", &["cs.CV"], 17);
        paper.title = "Tables <and> Chairs".to_string();
        paper.abstract_text = "x < y & y > z".to_string();
        let results = vec![("graph & net".to_string(), vec![paper])];
        let agg = aggregate(&results, &TagFilter::new(["cs.CV"]));

        let body = report(assemble(&agg, date())).body;

        assert!(body.contains("<a href=\"http://arxiv.org/abs/1?a=1&amp;b=2\">Tables &lt;and&gt; Chairs</a>"));
        assert!(body.contains("<span class=\"tag\">cs.CV</span>"));
        assert!(body.contains("<i class=\"authors\">Ada Lovelace, Alan Turing</i>"));
        assert!(body.contains("<span class=\"date\">2026-10-17</span>"));
        assert!(body.contains("Matched: graph &amp; net"));
        assert!(body.contains("x &lt; y &amp; y &gt; z"));
    }

    #[test]
    fn test_render_document_wraps_body() {
        let results = vec![("k".to_string(), vec![record("a", &["cs.CV"], 17)])];
        let agg = aggregate(&results, &TagFilter::new(["cs.CV"]));
        let report = report(assemble(&agg, date()));

        let doc = render_document(&report);

        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>ArXiv Report - October 18, 2026 - 1 New Articles</title>"));
        assert!(doc.contains(".tag-container"));
        assert!(doc.contains(&report.body));
    }
}
