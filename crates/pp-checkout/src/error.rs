use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("the list request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("the list request failed with status code: {0}")]
    ResponseError(reqwest::StatusCode),
    #[error("the list response body could not be read: {0}")]
    ResponseBodyError(#[source] reqwest::Error),
}
