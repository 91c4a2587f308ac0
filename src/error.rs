use std::path::PathBuf;

use thiserror::Error;

/// Library error type for slideshow engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The media folder is missing or unreadable; enumeration yields nothing.
    #[error("media folder unreadable: {0}")]
    Enumeration(String),

    /// A single asset failed to decode. It is skipped without removal.
    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// An asset existed at enumeration time but has since vanished; its entry
    /// is permanently removed.
    #[error("media file vanished: {0}")]
    Missing(PathBuf),

    /// Every entry has been removed; the engine is in the terminal no-media
    /// state until an explicit reload.
    #[error("no media remaining")]
    Exhausted,

    /// The video backend failed to prepare a source. Treated like a decode
    /// failure for that entry.
    #[error("video backend unavailable")]
    Backend(#[source] anyhow::Error),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
