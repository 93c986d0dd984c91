use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

use super::{Blocklist, Page, Strategy, default_source_attrs, deserialize_selectors};
use crate::crawler::parser;
use crate::errors::ExtractError;

static DEFAULT_SELECTORS: &[&str] = &[
    ".container-chapter-reader",
    ".reading-content",
    "#readerarea",
    ".chapter-images",
];

/// Images inside the site's reader container, blocklist filtered.
///
/// Selectors are tried in order and the first matching element wins. When
/// none matches the whole document body is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Container {
    #[serde(deserialize_with = "deserialize_selectors")]
    pub selectors: Vec<Selector>,
    pub blocklist: Blocklist,
    pub source_attrs: Vec<String>,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_SELECTORS
                .iter()
                .map(|s| Selector::parse(s).expect("built-in container selector is valid"))
                .collect(),
            blocklist: Blocklist::default(),
            source_attrs: default_source_attrs(),
        }
    }
}

#[typetag::deserialize(name = "container")]
impl Strategy for Container {
    fn extract(&self, page: &Page) -> Result<Vec<String>, ExtractError> {
        let document = Html::parse_document(page.body);

        let container = match self.selectors.iter().find_map(|s| document.select(s).next()) {
            Some(container) => container,
            None => {
                debug!("no reader container found, using document body");
                parser::body(&document)
            }
        };

        let urls = parser::images(container, page.url, &self.source_attrs)
            .into_iter()
            .filter(|img| !self.blocklist.is_blocked(&img.src))
            .map(|img| img.src)
            .collect();
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn run(strategy: &Container, body: &str) -> Vec<String> {
        let url = Url::parse("https://chapmanganato.test/manga-aa/chapter-1").unwrap();
        strategy.extract(&Page { url: &url, body }).unwrap()
    }

    #[test]
    fn scopes_to_the_reader_container() {
        let body = r#"
            <body>
              <header><img src="https://cdn.test/header-art.jpg"></header>
              <div class="container-chapter-reader">
                <img src="https://cdn.test/1.jpg">
                <img src="https://cdn.test/ad-slot.jpg">
                <img src="https://cdn.test/2.jpg">
              </div>
              <aside><img src="https://cdn.test/popular.jpg"></aside>
            </body>"#;

        assert_eq!(
            run(&Container::default(), body),
            vec!["https://cdn.test/1.jpg", "https://cdn.test/2.jpg"]
        );
    }

    #[test]
    fn selectors_are_tried_in_priority_order() {
        let body = r#"
            <div id="readerarea"><img src="https://cdn.test/late.jpg"></div>
            <div class="reading-content"><img src="https://cdn.test/early.jpg"></div>
        "#;
        assert_eq!(
            run(&Container::default(), body),
            vec!["https://cdn.test/early.jpg"]
        );
    }

    #[test]
    fn falls_back_to_the_whole_body_without_size_filter() {
        let body = r#"
            <div class="page"><img src="https://cdn.test/1.jpg" width="10" height="10"></div>
            <div class="page"><img src="https://cdn.test/logo.png"></div>
            <div class="page"><img src="https://cdn.test/2.jpg"></div>
        "#;
        assert_eq!(
            run(&Container::default(), body),
            vec!["https://cdn.test/1.jpg", "https://cdn.test/2.jpg"]
        );
    }
}
