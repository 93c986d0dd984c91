pub mod blocklist;
pub mod container;
pub mod generic;
pub mod json;

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Deserializer};
use url::Url;

pub use blocklist::Blocklist;
pub use container::Container;
pub use generic::Generic;
pub use json::Json;

use crate::errors::ExtractError;

/// A fetched chapter page handed to a [`Strategy`].
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// Chapter URL, used to resolve relative image sources.
    pub url: &'a Url,
    pub body: &'a str,
}

/// Site-specific way of finding page images in a chapter document.
///
/// Strategies are selected per site and deserialized from site
/// configuration by their `type` tag.
#[typetag::deserialize(tag = "type")]
pub trait Strategy: Send + Sync {
    /// Page image URLs in reading order.
    ///
    /// `Err` is only returned when nothing was found and the reason was
    /// unreadable content; an empty `Ok` means "well-formed, no match".
    fn extract(&self, page: &Page) -> Result<Vec<String>, ExtractError>;
}

/// Outcome of extracting one chapter.
#[derive(Debug)]
pub enum Extraction {
    /// No strategy applies to this site. Nothing was fetched.
    Unsupported,
    /// A strategy ran and produced nothing. `failure` is set when the page
    /// could not be fetched or parsed.
    Empty { failure: Option<ExtractError> },
    /// Page image URLs in reading order, never empty.
    Extracted(Vec<String>),
}

impl Extraction {
    pub fn from_urls(urls: Vec<String>) -> Self {
        if urls.is_empty() {
            Self::Empty { failure: None }
        } else {
            Self::Extracted(urls)
        }
    }

    pub fn failed(error: ExtractError) -> Self {
        Self::Empty {
            failure: Some(error),
        }
    }

    pub fn images(&self) -> &[String] {
        match self {
            Self::Extracted(urls) => urls,
            _ => &[],
        }
    }

    pub fn into_images(self) -> Vec<String> {
        match self {
            Self::Extracted(urls) => urls,
            _ => Vec::new(),
        }
    }

    pub fn failure(&self) -> Option<&ExtractError> {
        match self {
            Self::Empty { failure } => failure.as_ref(),
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }
}

fn default_source_attrs() -> Vec<String> {
    vec!["src".to_owned(), "data-src".to_owned()]
}

fn deserialize_selector<'de, D>(deserializer: D) -> Result<Selector, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;

    Selector::parse(&s).map_err(|e| serde::de::Error::custom(format!("Invalid selector: {}", e)))
}

fn deserialize_selectors<'de, D>(deserializer: D) -> Result<Vec<Selector>, D::Error>
where
    D: Deserializer<'de>,
{
    let list: Vec<String> = Vec::deserialize(deserializer)?;

    list.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            Selector::parse(s)
                .map_err(|e| serde::de::Error::custom(format!("Invalid selector '{}': {}", s, e)))
        })
        .collect()
}

fn deserialize_regex<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;

    Regex::new(&s).map_err(|e| serde::de::Error::custom(format!("Invalid pattern '{}': {}", s, e)))
}
