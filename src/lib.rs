pub mod app;
pub mod config;
pub mod crawler;
pub mod errors;
pub mod extractor;
pub mod library;
pub mod logger;
pub mod utils;

pub use app::{Action, Controller, Screen};
pub use config::{Config, SiteConfig};
pub use crawler::{ChapterImageExtractor, Fetch, ProxyFetcher};
pub use errors::ExtractError;
pub use extractor::Extraction;
pub use library::{Library, LibraryEntry, LibraryError};
pub use utils::get_user_input;
