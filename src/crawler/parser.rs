use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector is valid"));
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));

/// An `img` element with its source already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub src: String,
    /// Declared `width` attribute, 0 when absent or unreadable.
    pub width: u32,
    pub height: u32,
}

/// Every image under `scope` that has a usable source, in document order.
pub fn images(scope: ElementRef, base: &Url, source_attrs: &[String]) -> Vec<PageImage> {
    let mut images = Vec::new();

    for img in scope.select(&IMG) {
        let element = img.value();
        let Some(src) = source_attrs
            .iter()
            .filter_map(|name| element.attr(name))
            .map(str::trim)
            .find(|src| !src.is_empty() && !src.starts_with("data:"))
        else {
            continue;
        };

        images.push(PageImage {
            src: resolve(base, src),
            width: element.attr("width").map_or(0, parse_dimension),
            height: element.attr("height").map_or(0, parse_dimension),
        });
    }
    images
}

/// The document body, or the root when the markup has none.
pub fn body(document: &Html) -> ElementRef<'_> {
    document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element())
}

/// Resolves `src` against the chapter URL, keeping it verbatim if that fails.
pub fn resolve(base: &Url, src: &str) -> String {
    base.join(src)
        .map(String::from)
        .unwrap_or_else(|_| src.to_owned())
}

/// Leading decimal digits of an attribute, so `"300px"` reads as 300.
pub fn parse_dimension(value: &str) -> u32 {
    let value = value.trim_start();
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value, |end| &value[..end]);
    digits.parse().unwrap_or(0)
}
