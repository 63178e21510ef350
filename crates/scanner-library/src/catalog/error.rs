use thiserror::Error;

/// Any HTTP status ≥ 400 carries the response body; network and parse
/// failures surface through [`reqwest::Error`]. Callers receive this
/// verbatim, never unwrapped.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
