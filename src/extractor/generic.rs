use scraper::Html;
use serde::Deserialize;

use super::{Blocklist, Page, Strategy, default_source_attrs};
use crate::crawler::parser;
use crate::errors::ExtractError;

/// Every large, non-blocklisted image in the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Generic {
    /// Images must be strictly wider than this.
    pub min_width: u32,
    pub min_height: u32,
    pub blocklist: Blocklist,
    pub source_attrs: Vec<String>,
}

impl Default for Generic {
    fn default() -> Self {
        Self {
            min_width: 200,
            min_height: 200,
            blocklist: Blocklist::default(),
            source_attrs: default_source_attrs(),
        }
    }
}

#[typetag::deserialize(name = "generic")]
impl Strategy for Generic {
    fn extract(&self, page: &Page) -> Result<Vec<String>, ExtractError> {
        let document = Html::parse_document(page.body);

        let urls = parser::images(document.root_element(), page.url, &self.source_attrs)
            .into_iter()
            .filter(|img| img.width > self.min_width && img.height > self.min_height)
            .filter(|img| !self.blocklist.is_blocked(&img.src))
            .map(|img| img.src)
            .collect();
        Ok(urls)
    }
}
