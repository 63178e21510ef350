pub mod checksum;
pub mod error;
pub mod job;
pub mod library;
pub mod lyrics;
pub mod metadata;
pub mod settings;
pub mod task;

pub use error::{ConfigError, ValidationError};
pub use job::{IllustrationJob, ThumbnailJob};
pub use library::{FileEntry, Library};
pub use lyrics::{PlainLyrics, SyncedLine, SyncedLyrics};
pub use metadata::{IllustrationLocation, Metadata, MetadataBuilder, TrackType};
pub use settings::{CompilationSettings, MetadataOrder, MetadataSettings, MetadataSource, UserSettings};
pub use task::{TaskInfo, TaskType};
