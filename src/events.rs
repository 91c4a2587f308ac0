//! Event types exchanged between the engine, the input surface, and the
//! presenter layer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::MediaKind;
use crate::decode::DecodedImage;
use crate::surface::SurfaceId;

/// Logical input actions delivered by the (excluded) UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    ToggleOverlay,
    Previous,
    Next,
    TogglePlayPause,
    Back,
}

/// Persistent user-visible status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Playing,
    Paused,
    NoMedia,
    FolderInaccessible,
}

/// Overlay contents: where the show is and how fast it is moving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayInfo {
    /// 1-based position within the display order.
    pub position: usize,
    pub total: usize,
    pub kind: Option<MediaKind>,
    pub delay: Duration,
    pub playing: bool,
    pub showing_video: bool,
}

/// Directives the engine emits for the render layer.
#[derive(Debug, Clone)]
pub enum DisplayCommand {
    /// Show `image` on `surface` immediately (first display, no fade).
    ShowImage {
        surface: SurfaceId,
        image: Arc<DecodedImage>,
    },
    /// Fade `surface` from 0 to 1 opacity over `fade` while the other image
    /// surface fades out.
    CrossfadeImage {
        surface: SurfaceId,
        image: Arc<DecodedImage>,
        fade: Duration,
    },
    /// Fade both image surfaces out over half of `fade` while the video
    /// surface fades in.
    ShowVideo { path: PathBuf, fade: Duration },
    /// Drop the video surface and reveal the image pair.
    HideVideo,
    /// Overlay visibility or contents changed.
    Overlay { visible: bool, info: OverlayInfo },
    Status(EngineStatus),
}
