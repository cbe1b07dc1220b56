pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reply line did not start with a numeric status token
    #[error("Malformed status line: {0:?}")]
    MalformedStatusLine(String),
}
