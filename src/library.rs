use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// A tracked series. `(title, site)` is unique within a [`Library`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub title: String,
    pub site: String,
    pub last_chapter: String,
    pub chapter_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("This manga already exists in your library.")]
    Duplicate { title: String, site: String },

    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("no manga at position {}", .0 + 1)]
    NoSuchEntry(usize),

    #[error("cannot access library file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("library file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted list of tracked series.
///
/// Mutations only change memory; [`save`](Library::save) rewrites the whole
/// file.
#[derive(Debug, Clone)]
pub struct Library {
    path: PathBuf,
    entries: Vec<LibraryEntry>,
}

impl Library {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Reads the whole library; a missing file is an empty library.
    /// Repeated `(title, site)` pairs keep their first entry.
    #[instrument(skip_all)]
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let path = path.into();
        let entries: Vec<LibraryEntry> = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no library at {}, starting empty", path.display());
                Vec::new()
            }
            Err(source) => return Err(LibraryError::Io { path, source }),
        };

        let mut library = Self::new(path);
        for entry in entries {
            if library.contains(&entry.title, &entry.site) {
                warn!("dropping duplicate entry {} ({})", entry.title, entry.site);
                continue;
            }
            library.entries.push(entry);
        }

        debug!("loaded {} entries", library.len());
        Ok(library)
    }

    #[instrument(skip_all)]
    pub async fn save(&self) -> Result<(), LibraryError> {
        let io_error = |source| LibraryError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let json = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&self.path, json).await.map_err(io_error)?;

        debug!("library saved to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&LibraryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, title: &str, site: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.title == title && e.site == site)
    }

    /// Adds a series starting at `chapter_url`. Inputs are trimmed.
    pub fn add(
        &mut self,
        title: &str,
        site: &str,
        chapter_url: &str,
    ) -> Result<&LibraryEntry, LibraryError> {
        let (title, site, chapter_url) = (title.trim(), site.trim(), chapter_url.trim());

        if self.contains(title, site) {
            return Err(LibraryError::Duplicate {
                title: title.to_owned(),
                site: site.to_owned(),
            });
        }
        for (value, field) in [(title, "title"), (site, "site"), (chapter_url, "chapter url")] {
            if value.is_empty() {
                return Err(LibraryError::MissingField(field));
            }
        }

        self.entries.push(LibraryEntry {
            title: title.to_owned(),
            site: site.to_owned(),
            last_chapter: chapter_url.to_owned(),
            chapter_url: chapter_url.to_owned(),
            updated_at: Some(Utc::now()),
        });
        info!("added {} ({})", title, site);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn remove(&mut self, index: usize) -> Result<LibraryEntry, LibraryError> {
        if index >= self.entries.len() {
            return Err(LibraryError::NoSuchEntry(index));
        }
        let entry = self.entries.remove(index);
        info!("removed {} ({})", entry.title, entry.site);
        Ok(entry)
    }

    /// Records `chapter_url` as both the last read and the current chapter.
    pub fn update_last_chapter(
        &mut self,
        index: usize,
        chapter_url: &str,
    ) -> Result<&LibraryEntry, LibraryError> {
        let chapter_url = chapter_url.trim();
        if chapter_url.is_empty() {
            return Err(LibraryError::MissingField("chapter url"));
        }

        let entry = self
            .entries
            .get_mut(index)
            .ok_or(LibraryError::NoSuchEntry(index))?;
        entry.last_chapter = chapter_url.to_owned();
        entry.chapter_url = chapter_url.to_owned();
        entry.updated_at = Some(Utc::now());
        Ok(entry)
    }
}
