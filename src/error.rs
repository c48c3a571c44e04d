// Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The environment cannot hand out a 2D drawing context.
    #[error("Canvas error: 2D drawing context unavailable")]
    CanvasUnavailable,

    #[error("Window init error: {0}")]
    WindowInit(String),

    #[error("Window update error: {0}")]
    WindowUpdate(String),

    #[error("Config read error: {0}")]
    ConfigRead(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
