//! Retrieval of recently updated papers from the arXiv search API.
//!
//! The stages run leaves first:
//!
//! | Module | Role |
//! |--------|------|
//! | [`query`] | Builds the `search_query` string and page URLs |
//! | [`fetcher`] | Walks result pages, applies the history-window cutoff and the politeness delay |
//! | [`atom`] | Decodes one Atom response page |
//! | [`normalize`] | Turns a raw entry into an [`ArticleRecord`](crate::models::ArticleRecord) |

pub mod atom;
pub mod fetcher;
pub mod normalize;
pub mod query;
