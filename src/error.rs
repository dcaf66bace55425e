use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read subtitle file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("FFmpeg error creating clip {index}: {message}")]
    Transcode { index: usize, message: String },

    #[error("FFmpeg error merging clips: {0}")]
    Merge(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Job cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ClipError>;
