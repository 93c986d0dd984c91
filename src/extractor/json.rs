use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{
    Blocklist, Page, Strategy, default_source_attrs, deserialize_regex, deserialize_selector,
};
use crate::crawler::parser;
use crate::errors::ExtractError;

/// Page list dug out of JSON the site embeds in its HTML.
///
/// Three sources are tried in order and the first one yielding any URL wins:
/// the framework data script, a `window.__DATA__ = {...}` assignment, and
/// finally every blocklist-clean `img` in the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Json {
    #[serde(deserialize_with = "deserialize_selector")]
    pub script: Selector,
    /// Keys (or array indices) leading from the script's JSON to the page array.
    pub pages_path: Vec<String>,
    pub page_fields: Vec<String>,
    /// Matches up to the `=` of the global assignment; the object literal
    /// must start right after the match.
    #[serde(deserialize_with = "deserialize_regex")]
    pub assignment: Regex,
    pub data_key: String,
    pub pages_key: String,
    pub assignment_fields: Vec<String>,
    pub blocklist: Blocklist,
    pub source_attrs: Vec<String>,
}

impl Default for Json {
    fn default() -> Self {
        Self {
            script: Selector::parse("script#__NEXT_DATA__")
                .expect("built-in script selector is valid"),
            pages_path: ["props", "pageProps", "chapter", "pages"]
                .map(String::from)
                .to_vec(),
            page_fields: ["url", "src", "image", "imageUrl"].map(String::from).to_vec(),
            assignment: Regex::new(r"window\.__DATA__\s*=\s*")
                .expect("built-in assignment pattern is valid"),
            data_key: "data".to_owned(),
            pages_key: "pages".to_owned(),
            assignment_fields: ["url", "src", "image"].map(String::from).to_vec(),
            blocklist: Blocklist::default(),
            source_attrs: default_source_attrs(),
        }
    }
}

#[typetag::deserialize(name = "json")]
impl Strategy for Json {
    fn extract(&self, page: &Page) -> Result<Vec<String>, ExtractError> {
        let document = Html::parse_document(page.body);
        let mut failure = None;

        match self.from_script(&document, page.url) {
            Ok(urls) if !urls.is_empty() => {
                debug!("{} pages found in embedded data script", urls.len());
                return Ok(urls);
            }
            Ok(_) => debug!("embedded data script has no pages"),
            Err(e) => {
                warn!("{}, trying global assignment", e);
                failure = Some(e);
            }
        }

        match self.from_assignment(page) {
            Ok(urls) if !urls.is_empty() => {
                debug!("{} pages found in global assignment", urls.len());
                return Ok(urls);
            }
            Ok(_) => debug!("global assignment has no pages"),
            Err(e) => {
                warn!("{}, falling back to document images", e);
                failure = Some(e);
            }
        }

        let body = parser::body(&document);
        let urls: Vec<String> = parser::images(body, page.url, &self.source_attrs)
            .into_iter()
            .filter(|img| !self.blocklist.is_blocked(&img.src))
            .map(|img| img.src)
            .collect();

        match failure {
            Some(e) if urls.is_empty() => Err(e),
            _ => Ok(urls),
        }
    }
}

impl Json {
    fn from_script(&self, document: &Html, base: &Url) -> Result<Vec<String>, ExtractError> {
        let Some(script) = document.select(&self.script).next() else {
            return Ok(Vec::new());
        };

        let text = script.text().collect::<String>();
        let value: Value = serde_json::from_str(&text).map_err(|source| ExtractError::Parse {
            what: "embedded data script",
            source,
        })?;

        let pages = descend(&value, &self.pages_path).and_then(Value::as_array);
        Ok(pages.map_or_else(Vec::new, |pages| page_urls(pages, &self.page_fields, base)))
    }

    fn from_assignment(&self, page: &Page) -> Result<Vec<String>, ExtractError> {
        let Some(found) = self.assignment.find(page.body) else {
            return Ok(Vec::new());
        };

        // The literal is followed by `;` and more script; read only the first value.
        let rest = &page.body[found.end()..];
        let value = match serde_json::Deserializer::from_str(rest)
            .into_iter::<Value>()
            .next()
        {
            Some(Ok(value)) => value,
            Some(Err(source)) => {
                return Err(ExtractError::Parse {
                    what: "global data assignment",
                    source,
                });
            }
            None => return Ok(Vec::new()),
        };

        let pages = value
            .get(&self.data_key)
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .find_map(|item| item.get(&self.pages_key).and_then(Value::as_array))
            });
        Ok(pages.map_or_else(Vec::new, |pages| {
            page_urls(pages, &self.assignment_fields, page.url)
        }))
    }
}

fn descend<'v>(value: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, key| match current {
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => current.get(key),
    })
}

/// First non-empty candidate field of each page; bare strings count as URLs.
fn page_urls(pages: &[Value], fields: &[String], base: &Url) -> Vec<String> {
    pages
        .iter()
        .filter_map(|page| match page {
            Value::String(url) => Some(url.as_str()),
            _ => fields
                .iter()
                .filter_map(|field| page.get(field).and_then(Value::as_str))
                .find(|url| !url.trim().is_empty()),
        })
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| parser::resolve(base, url))
        .collect()
}
