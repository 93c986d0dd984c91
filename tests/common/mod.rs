// tests/common/mod.rs
//
// Scripted fetcher shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use manga_reader::{ExtractError, Fetch};
use reqwest::StatusCode;
use url::Url;

/// Answers from a fixed table of chapter URL -> body; anything else is a 502.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_owned(), body.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetch for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, ExtractError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ExtractError::Status {
                url: url.to_string(),
                status: StatusCode::BAD_GATEWAY,
            })
    }
}

impl Fetch for &FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, ExtractError> {
        (**self).fetch(url).await
    }
}

pub fn tmp_file(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("manga_reader_it_{}_{}.json", name, std::process::id()));
    let _ = std::fs::remove_file(&p);
    p
}

pub const GENERIC_PAGE: &str = r#"
<html><head><title>Chapter 3</title></head><body>
  <img src="https://cdn.test/site-logo.png" width="300" height="300">
  <img src="https://cdn.test/ch3/01.jpg" width="760" height="1100">
  <img src="https://cdn.test/ch3/02.jpg" width="760" height="1100">
  <img src="https://cdn.test/ch3/03.jpg" width="120" height="1100">
  <img src="https://cdn.test/ch3/04.jpg" width="760" height="1100">
</body></html>"#;
