use reqwest::StatusCode;

/// Why a chapter could not be turned into page images.
///
/// None of these ever reach the caller of
/// [`ChapterImageExtractor::extract`](crate::ChapterImageExtractor::extract)
/// as an `Err`; they are carried inside [`Extraction::Empty`](crate::Extraction::Empty).
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid chapter url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("no route to {url}")]
    Unreachable { url: String },

    #[error("{url} returned unexpected content type '{content_type}'")]
    UnexpectedContent { url: String, content_type: String },

    #[error("malformed {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractError {
    /// The page could not be loaded at all, as opposed to loaded but unreadable.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::Network { .. }
                | Self::Status { .. }
                | Self::Unreachable { .. }
        )
    }

    /// Worth another attempt against the same proxy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}
