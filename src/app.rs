use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::crawler::{ChapterImageExtractor, Fetch, ProxyFetcher};
use crate::extractor::Extraction;
use crate::library::{Library, LibraryError};
use crate::utils::step_chapter;

pub static EMPTY_LIBRARY: &str = "No manga in your library yet. Add one with 'add'.";
pub static NO_IMAGES: &str = "No images found or site not supported yet.";
pub static UNSUPPORTED: &str = "This site is not supported yet.";
pub static LOAD_FAILED: &str = "Failed to load images. (Possible CORS/network error)";
pub static READ_FAILED: &str = "Failed to read the chapter page.";

/// A user intent. Indices are 0-based positions in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add {
        title: String,
        site: String,
        chapter_url: String,
    },
    Remove(usize),
    UpdateChapter {
        index: usize,
        chapter_url: String,
    },
    OpenReader(usize),
    NextChapter,
    PrevChapter,
    BackToLibrary,
}

impl Action {
    /// Whether handling this action fetches a chapter.
    pub fn fetches(&self) -> bool {
        matches!(self, Self::OpenReader(_) | Self::NextChapter | Self::PrevChapter)
    }
}

/// The series currently open in the reader.
#[derive(Debug)]
pub struct Reading {
    pub index: usize,
    pub chapter_url: String,
    pub extraction: Extraction,
}

#[derive(Debug)]
pub struct AppState {
    pub library: Library,
    pub reading: Option<Reading>,
    /// Last user-facing error, cleared by the next successful action.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Library(LibraryView),
    Reader(ReaderView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryView {
    pub items: Vec<LibraryItem>,
    /// Shown instead of the list when it is empty.
    pub placeholder: Option<&'static str>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    /// 1-based, as shown to the user.
    pub position: usize,
    pub title: String,
    pub site: String,
    pub last_chapter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderView {
    pub title: String,
    pub site: String,
    pub chapter_url: String,
    pub images: Vec<String>,
    pub message: Option<&'static str>,
    pub error: Option<String>,
}

/// Owns the application state and applies [`Action`]s to it.
pub struct Controller<F = ProxyFetcher> {
    state: AppState,
    extractor: ChapterImageExtractor<F>,
}

impl<F: Fetch> Controller<F> {
    pub fn new(library: Library, extractor: ChapterImageExtractor<F>) -> Self {
        Self {
            state: AppState {
                library,
                reading: None,
                error: None,
            },
            extractor,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies `action`. Rejected input becomes the screen's error line;
    /// only a failure to persist the library is returned.
    #[instrument(skip(self))]
    pub async fn dispatch(&mut self, action: Action) -> Result<()> {
        self.state.error = None;

        match action {
            Action::Add {
                title,
                site,
                chapter_url,
            } => {
                let added = self.state.library.add(&title, &site, &chapter_url).map(|_| ());
                if self.reject(added).is_some() {
                    self.state.library.save().await?;
                }
            }
            Action::Remove(index) => {
                let removed = self.state.library.remove(index);
                if self.reject(removed).is_some() {
                    self.state.reading = None;
                    self.state.library.save().await?;
                }
            }
            Action::UpdateChapter { index, chapter_url } => {
                let updated = self
                    .state
                    .library
                    .update_last_chapter(index, &chapter_url)
                    .map(|_| ());
                if self.reject(updated).is_some() {
                    self.state.library.save().await?;
                }
            }
            Action::OpenReader(index) => {
                let Some(entry) = self.state.library.get(index) else {
                    self.state.error = Some(LibraryError::NoSuchEntry(index).to_string());
                    return Ok(());
                };
                let chapter_url = entry.chapter_url.clone();
                self.read(index, chapter_url).await;
            }
            Action::NextChapter => self.step(1).await?,
            Action::PrevChapter => self.step(-1).await?,
            Action::BackToLibrary => self.state.reading = None,
        }
        Ok(())
    }

    pub fn render(&self) -> Screen {
        let library = &self.state.library;

        if let Some(reading) = &self.state.reading {
            if let Some(entry) = library.get(reading.index) {
                let (message, error) = match &reading.extraction {
                    Extraction::Extracted(_) => (None, None),
                    Extraction::Unsupported => (Some(UNSUPPORTED), None),
                    Extraction::Empty { failure: None } => (Some(NO_IMAGES), None),
                    Extraction::Empty { failure: Some(e) } if e.is_network() => {
                        (Some(NO_IMAGES), Some(LOAD_FAILED.to_owned()))
                    }
                    Extraction::Empty { failure: Some(_) } => {
                        (Some(NO_IMAGES), Some(READ_FAILED.to_owned()))
                    }
                };

                return Screen::Reader(ReaderView {
                    title: entry.title.clone(),
                    site: entry.site.clone(),
                    chapter_url: reading.chapter_url.clone(),
                    images: reading.extraction.images().to_vec(),
                    message,
                    error: self.state.error.clone().or(error),
                });
            }
        }

        let items: Vec<LibraryItem> = library
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| LibraryItem {
                position: i + 1,
                title: entry.title.clone(),
                site: entry.site.clone(),
                last_chapter: entry.last_chapter.clone(),
            })
            .collect();

        Screen::Library(LibraryView {
            placeholder: items.is_empty().then_some(EMPTY_LIBRARY),
            items,
            error: self.state.error.clone(),
        })
    }

    fn reject<T>(&mut self, result: Result<T, LibraryError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{}", e);
                self.state.error = Some(e.to_string());
                None
            }
        }
    }

    async fn read(&mut self, index: usize, chapter_url: String) {
        let Some(entry) = self.state.library.get(index) else {
            return;
        };
        info!("opening {} at {}", entry.title, chapter_url);

        let extraction = self.extractor.extract(&chapter_url, &entry.site).await;
        self.state.reading = Some(Reading {
            index,
            chapter_url,
            extraction,
        });
    }

    /// Moves the reader `delta` chapters and records the new chapter.
    async fn step(&mut self, delta: i64) -> Result<()> {
        let Some(reading) = &self.state.reading else {
            self.state.error = Some("Open a manga first.".to_owned());
            return Ok(());
        };
        let index = reading.index;

        let Some(chapter_url) = step_chapter(&reading.chapter_url, delta) else {
            let which = if delta > 0 { "next" } else { "previous" };
            self.state.error = Some(format!("No {} chapter found in this URL.", which));
            return Ok(());
        };

        let updated = self
            .state
            .library
            .update_last_chapter(index, &chapter_url)
            .map(|_| ());
        if self.reject(updated).is_some() {
            // The reader follows the in-memory entry even if the write fails.
            let saved = self.state.library.save().await;
            self.read(index, chapter_url).await;
            saved?;
        }
        Ok(())
    }
}
