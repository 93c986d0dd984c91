pub mod downloader;
pub mod parser;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use downloader::{Fetch, ProxyFetcher};

use crate::config::{Config, GENERIC_SITE, SiteConfig, UnmatchedPolicy, load_sites};
use crate::errors::ExtractError;
use crate::extractor::{Extraction, Page};

/// Turns a chapter URL into its ordered page image URLs.
///
/// Sites form a dispatch table: the first site whose marker occurs in the
/// URL wins, then a site named by the caller's label, then the generic
/// default depending on [`UnmatchedPolicy`].
pub struct ChapterImageExtractor<F = ProxyFetcher> {
    fetcher: F,
    sites: Vec<SiteConfig>,
    default: SiteConfig,
    unmatched: UnmatchedPolicy,
}

impl ChapterImageExtractor<ProxyFetcher> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = ProxyFetcher::new(config.proxy.clone())?;
        let sites = load_sites(&config.sites_dir)?;
        Ok(Self::new(fetcher, sites, config.unmatched))
    }
}

impl<F: Fetch> ChapterImageExtractor<F> {
    /// A site named `generic` in `sites` replaces the built-in default.
    pub fn new(fetcher: F, mut sites: Vec<SiteConfig>, unmatched: UnmatchedPolicy) -> Self {
        let default = match sites.iter().position(|s| s.is_named(GENERIC_SITE)) {
            Some(index) => sites.remove(index),
            None => SiteConfig::generic(),
        };

        Self {
            fetcher,
            sites,
            default,
            unmatched,
        }
    }

    pub fn select(&self, url: &str, site: &str) -> Option<&SiteConfig> {
        if let Some(found) = self.sites.iter().find(|s| s.matches_url(url)) {
            return Some(found);
        }
        if let Some(found) = self.sites.iter().find(|s| s.is_named(site)) {
            return Some(found);
        }

        let requested_default =
            self.default.is_named(site) || site.trim().eq_ignore_ascii_case("default");
        if requested_default || self.unmatched == UnmatchedPolicy::Generic {
            Some(&self.default)
        } else {
            None
        }
    }

    /// Never fails: fetch and parse problems end up in [`Extraction::Empty`].
    #[instrument(skip(self))]
    pub async fn extract(&self, url: &str, site: &str) -> Extraction {
        let Some(config) = self.select(url, site) else {
            info!("no extraction strategy for site '{}'", site);
            return Extraction::Unsupported;
        };
        debug!("using {} strategy", config.name);

        let chapter_url = match Url::parse(url.trim()) {
            Ok(parsed) => parsed,
            Err(source) => {
                let error = ExtractError::InvalidUrl {
                    url: url.to_owned(),
                    source,
                };
                warn!("{}", error);
                return Extraction::failed(error);
            }
        };

        let body = match self.fetcher.fetch(&chapter_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("chapter fetch failed: {}", e);
                return Extraction::failed(e);
            }
        };

        let page = Page {
            url: &chapter_url,
            body: &body,
        };
        match config.strategy.extract(&page) {
            Ok(urls) => {
                info!("{} page images found", urls.len());
                Extraction::from_urls(urls)
            }
            Err(e) => {
                warn!("chapter parse failed: {}", e);
                Extraction::failed(e)
            }
        }
    }

    /// Plain sequence view of [`extract`](Self::extract): empty on any failure.
    pub async fn extract_images(&self, url: &str, site: &str) -> Vec<String> {
        self.extract(url, site).await.into_images()
    }
}
