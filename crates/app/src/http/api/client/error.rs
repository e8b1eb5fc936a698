#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid API base url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API rejected request ({0}): {1}")]
    Status(reqwest::StatusCode, String),
}
