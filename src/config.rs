use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, info};

use crate::extractor::{Container, Generic, Json, Strategy};

static CONFIG_FILE: &str = "config";

pub static GENERIC_SITE: &str = "generic";

/// Application settings from `config.toml`. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub proxy: ProxyConfig,
    pub library: LibraryConfig,
    /// What to do with a chapter no site entry claims.
    pub unmatched: UnmatchedPolicy,
    /// Directory of per-site `*.toml` files.
    pub sites_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            library: LibraryConfig::default(),
            unmatched: UnmatchedPolicy::default(),
            sites_dir: PathBuf::from("config"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(
                config::File::with_name(CONFIG_FILE)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("failed to deserialize {}.toml: {}", CONFIG_FILE, e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("failed to deserialize config: {}", e))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Fetch chapters directly when false.
    pub enabled: bool,
    /// Proxy prefixes, tried in order. The percent-encoded chapter URL is
    /// appended verbatim.
    pub bases: Vec<String>,
    pub timeout_secs: u64,
    /// Extra attempts per proxy on transient failures.
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bases: vec!["https://corsproxy.io/?".to_owned()],
            timeout_secs: 30,
            retries: 2,
            backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub path: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("manga_library.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Run the generic heuristic on any site.
    #[default]
    Generic,
    /// Report the site as unsupported without fetching.
    Unsupported,
}

/// One entry of the strategy dispatch table.
#[derive(Deserialize)]
pub struct SiteConfig {
    pub name: String,
    /// Case-insensitive substrings of a chapter URL that select this site.
    #[serde(default)]
    pub markers: Vec<String>,
    pub strategy: Box<dyn Strategy>,
}

impl SiteConfig {
    pub fn new(name: &str, markers: &[&str], strategy: Box<dyn Strategy>) -> Self {
        Self {
            name: name.to_owned(),
            markers: markers.iter().map(|m| m.to_string()).collect(),
            strategy,
        }
    }

    pub fn load(config_path: &Path) -> Result<Self> {
        let file_content = std::fs::read_to_string(config_path)?;

        Self::from_toml(&file_content)
            .map_err(|e| anyhow::anyhow!("{}: {}", config_path.display(), e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("failed to deserialize site config: {}", e))
    }

    pub fn generic() -> Self {
        Self::new(GENERIC_SITE, &[], Box::new(Generic::default()))
    }

    pub fn matches_url(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.markers
            .iter()
            .map(|m| m.trim().to_lowercase())
            .any(|m| !m.is_empty() && url.contains(&m))
    }

    pub fn is_named(&self, label: &str) -> bool {
        self.name.eq_ignore_ascii_case(label.trim())
    }
}

/// Sites known without any configuration on disk.
pub fn builtin_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig::new(
            "manganato",
            &["manganato", "mangakakalot"],
            Box::new(Container::default()),
        ),
        SiteConfig::new("comick", &["comick"], Box::new(Json::default())),
        SiteConfig::generic(),
    ]
}

/// Loads every `*.toml` in `dir`, ordered by file name so that marker
/// precedence is stable. Falls back to [`builtin_sites`] when the
/// directory does not exist.
pub fn load_sites(dir: &Path) -> Result<Vec<SiteConfig>> {
    if !dir.is_dir() {
        info!("site directory {} not found, using built-in sites", dir.display());
        return Ok(builtin_sites());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sites = Vec::with_capacity(paths.len());
    for path in paths {
        let site = SiteConfig::load(&path)?;
        debug!("loaded site {} from {}", site.name, path.display());
        sites.push(site);
    }
    Ok(sites)
}
