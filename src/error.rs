#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<wreq::Error> for AppError {
    fn from(err: wreq::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure to retrieve one page from the target site.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The page does not exist. On the movie library this marks the end of pagination.
    #[error("page not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: wreq::Error,
    },
}

/// A detail page is missing something a release cannot be recorded without.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("missing element: {0}")]
    MissingElement(&'static str),
    #[error("unparseable size {0:?}")]
    Size(String),
    #[error("invalid info hash {0:?}")]
    InfoHash(String),
}
