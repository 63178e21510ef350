mod client;
mod dto;
mod error;

pub use client::CatalogClient;
pub use dto::{FileSelector, HasLyricsResponse, IllustrationKind, Page, PageMetadata, SaveMetadataResponse, SaveMode, User};
pub use error::CatalogError;
