use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer};

pub static DEFAULT_KEYWORDS: &[&str] = &["ad", "banner", "thumb", "logo"];

/// Case-insensitive substring test that rejects non-content images
/// (ads, banners, thumbnails, logos) by their URL.
#[derive(Debug, Clone)]
pub struct Blocklist {
    pattern: Option<Regex>,
}

impl Blocklist {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn is_blocked(&self, url: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(url))
    }
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS).expect("default blocklist keywords are valid")
    }
}

impl<'de> Deserialize<'de> for Blocklist {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let keywords: Vec<String> = Vec::deserialize(deserializer)?;

        Blocklist::new(&keywords)
            .map_err(|e| serde::de::Error::custom(format!("Invalid blocklist: {}", e)))
    }
}
