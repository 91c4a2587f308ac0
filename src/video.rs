//! Video playback seam. The engine drives a narrow trait; end-of-stream
//! notifications arrive on a channel wired up by the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// End-of-stream notification delivered to the engine loop.
#[derive(Debug)]
pub struct VideoEnded;

/// Narrow seam over whatever actually plays the video.
pub trait VideoBackend {
    /// Prepare `path` for playback. Failure is treated like a decode failure
    /// for that entry.
    fn set_source(&mut self, path: &Path) -> Result<()>;
    fn play(&mut self);
    /// Suspend without discarding the current position.
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_muted(&mut self, muted: bool);
}

/// Placeholder backend standing in for an embedded player: logs playback and
/// reports end-of-stream after a fixed runtime.
pub struct LoggingVideoBackend {
    end_tx: Sender<VideoEnded>,
    runtime: Duration,
    muted: bool,
    source: Option<PathBuf>,
    pending: Option<JoinHandle<()>>,
}

impl LoggingVideoBackend {
    pub fn new(end_tx: Sender<VideoEnded>, runtime: Duration) -> Self {
        Self {
            end_tx,
            runtime,
            muted: false,
            source: None,
            pending: None,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl VideoBackend for LoggingVideoBackend {
    fn set_source(&mut self, path: &Path) -> Result<()> {
        self.cancel_pending();
        self.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "video source set");
        Ok(())
    }

    fn play(&mut self) {
        let Some(source) = self.source.clone() else {
            return;
        };
        info!(path = %source.display(), muted = self.muted, "video playing");
        self.cancel_pending();
        let tx = self.end_tx.clone();
        let runtime = self.runtime;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(runtime).await;
            let _ = tx.send(VideoEnded).await;
        }));
    }

    fn pause(&mut self) {
        debug!("video paused");
        self.cancel_pending();
    }

    fn stop(&mut self) {
        debug!("video stopped");
        self.source = None;
        self.cancel_pending();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

impl Drop for LoggingVideoBackend {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
