//! Search query construction for the arXiv API.

use url::Url;

/// Build the query string for one page of results.
///
/// Each keyword is percent-encoded on its own and wrapped in double quotes so
/// the API treats it as an exact phrase; phrases are joined with `+OR+`. An
/// empty keyword list produces an empty phrase (`""`), which matches nothing.
///
/// Results are always requested newest-update first, which the fetcher's
/// cutoff logic relies on.
pub fn build_query<S: AsRef<str>>(keywords: &[S], offset: usize, page_size: usize) -> String {
    let search = if keywords.is_empty() {
        "\"\"".to_string()
    } else {
        keywords
            .iter()
            .map(|k| format!("\"{}\"", urlencoding::encode(k.as_ref())))
            .collect::<Vec<_>>()
            .join("+OR+")
    };

    format!(
        "search_query={search}&sortBy=lastUpdatedDate&sortOrder=descending&start={offset}&max_results={page_size}"
    )
}

/// Full request URL for one page against `base`.
///
/// The quote characters are percent-encoded by [`Url`] when the query is
/// attached.
pub fn page_url<S: AsRef<str>>(
    base: &str,
    keywords: &[S],
    offset: usize,
    page_size: usize,
) -> Result<Url, url::ParseError> {
    let separator = if base.contains('?') { '&' } else { '?' };
    Url::parse(&format!(
        "{}{}{}",
        base,
        separator,
        build_query(keywords, offset, page_size)
    ))
}
