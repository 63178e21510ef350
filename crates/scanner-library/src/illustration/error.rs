use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("ffmpeg not found on PATH")]
    BinaryNotFound,

    #[error("failed to run ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },

    #[error("illustration has no source to read from")]
    NoSource,

    #[error("failed to read illustration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("no frame with exactly one detected face was found")]
    NoFaceFrame,
}
