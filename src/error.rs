//! Error types for each stage of a run.
//!
//! Every boundary of the pipeline returns its own error type so the caller can
//! decide how far a failure reaches:
//!
//! - [`FeedError`]: a page request failed; only the current keyword stops.
//! - [`MalformedEntryError`]: one feed entry is unusable; it is skipped.
//! - [`ConfigError`]: the run never starts.
//! - [`DeliveryError`]: the report was built but could not be handed off.
//!
//! An empty report is not an error at all, see
//! [`Assembled::NoContent`](crate::outputs::html::Assembled::NoContent).

use std::path::PathBuf;
use thiserror::Error;

/// Failure while retrieving or decoding one page of the search feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid feed url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("could not decode atom feed: {0}")]
    Decode(String),

    #[error("feed has no usable top-level <updated> timestamp")]
    MissingFeedTimestamp,
}

/// A single feed entry that cannot become an [`ArticleRecord`](crate::models::ArticleRecord).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedEntryError {
    #[error("entry is missing required field <{0}>")]
    MissingField(&'static str),

    #[error("entry field <{field}> is not a timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// Problems with the configuration, reported before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required configuration value `{0}`")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure handing the finished report to a delivery channel.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request URL is stripped, it carries the bot token.
    #[error("delivery request failed: {0}")]
    Http(reqwest::Error),

    #[error("chat {chat_id} rejected the document (HTTP {status}): {body}")]
    Rejected {
        chat_id: String,
        status: u16,
        body: String,
    },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        DeliveryError::Http(e.without_url())
    }
}
