use thiserror::Error;

/// Errors that can prevent the daemon from starting.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("environment variable {0} was set but empty")]
    EmptyEnv(&'static str),

    #[error("could not read settings file at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings.json failed validation:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),

    #[error("invalid regex in trackRegex: {0}")]
    Regex(#[from] regex::Error),
}

/// One failed invariant on a [`crate::Metadata`] value, surfaced to the
/// caller as part of an aggregated list rather than aborting the file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingRequired(&'static str),

    #[error("discogs id must be digits-only, got '{0}'")]
    NonNumericDiscogsId(String),

    #[error("non-compilation track is missing both 'artist' and 'albumArtist'")]
    MissingArtist,
}
