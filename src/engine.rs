//! Playback state machine: owns the catalog, the display order, the
//! auto-advance timer, and the crossfade bookkeeping.
//!
//! The engine is a plain struct with synchronous operations; [`run`] drives
//! it on a single task so the timer, the fade deadline, manual input, and
//! the video end-of-stream signal never execute concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, UnboundedSender};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{MediaCatalog, MediaEntry, MediaKind};
use crate::config::{Configuration, DisplayOrderMode};
use crate::decode::{DecodeBackend, DecodedImage};
use crate::error::Error;
use crate::events::{DisplayCommand, EngineStatus, InputAction, OverlayInfo};
use crate::sequence::DisplayOrder;
use crate::surface::SurfacePair;
use crate::video::{VideoBackend, VideoEnded};

/// Engine state as visible to the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    ShowingImage,
    ShowingVideo,
    Transitioning,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Outcome of a handled input action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeTarget {
    Image,
    Video,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    deadline: Instant,
    target: FadeTarget,
}

pub struct Engine<D, V> {
    catalog: MediaCatalog,
    order: DisplayOrder,
    options: Configuration,
    decoder: D,
    video: V,
    surfaces: SurfacePair,
    commands: UnboundedSender<DisplayCommand>,
    playing: bool,
    showing: Option<MediaKind>,
    transition: Option<Transition>,
    timer: Option<Instant>,
    last_input: Option<Instant>,
    overlay_visible: bool,
    exhausted: bool,
    torn_down: bool,
}

impl<D: DecodeBackend, V: VideoBackend> Engine<D, V> {
    pub fn new(
        catalog: MediaCatalog,
        options: Configuration,
        decoder: D,
        video: V,
        commands: UnboundedSender<DisplayCommand>,
    ) -> Self {
        let order = DisplayOrder::new(catalog.len(), catalog.mode());
        Self::with_order(catalog, options, decoder, video, commands, order)
    }

    /// Deterministic shuffle for tests and reproducible runs.
    pub fn with_seed(
        catalog: MediaCatalog,
        options: Configuration,
        decoder: D,
        video: V,
        commands: UnboundedSender<DisplayCommand>,
        seed: u64,
    ) -> Self {
        let order = DisplayOrder::with_seed(catalog.len(), catalog.mode(), seed);
        Self::with_order(catalog, options, decoder, video, commands, order)
    }

    fn with_order(
        catalog: MediaCatalog,
        options: Configuration,
        decoder: D,
        video: V,
        commands: UnboundedSender<DisplayCommand>,
        order: DisplayOrder,
    ) -> Self {
        Self {
            catalog,
            order,
            options,
            decoder,
            video,
            surfaces: SurfacePair::new(),
            commands,
            playing: false,
            showing: None,
            transition: None,
            timer: None,
            last_input: None,
            overlay_visible: false,
            exhausted: false,
            torn_down: false,
        }
    }

    /// Begin playback: show the entry under the cursor and start the clock.
    pub fn start(&mut self) {
        self.video.set_muted(self.options.mute_videos);
        self.playing = true;
        if self.catalog.is_empty() {
            self.enter_no_media();
            return;
        }
        self.status(EngineStatus::Playing);
        if let Some(index) = self.order.current() {
            self.display_index(index);
        }
    }

    /// Route a debounced input action. `Shutdown` is returned for
    /// [`InputAction::Back`].
    pub fn handle_input(&mut self, action: InputAction) -> InputOutcome {
        match action {
            InputAction::ToggleOverlay => {
                self.overlay_visible = !self.overlay_visible;
                let info = self.overlay_info();
                self.send(DisplayCommand::Overlay {
                    visible: self.overlay_visible,
                    info,
                });
            }
            InputAction::Previous => {
                if self.accept_input() && self.transition.is_none() {
                    self.advance(Direction::Backward);
                }
            }
            InputAction::Next => {
                if self.accept_input() && self.transition.is_none() {
                    self.advance(Direction::Forward);
                }
            }
            InputAction::TogglePlayPause => {
                if self.accept_input() {
                    if self.playing {
                        self.pause();
                    } else {
                        self.resume();
                    }
                }
            }
            InputAction::Back => return InputOutcome::Shutdown,
        }
        InputOutcome::Continue
    }

    /// The auto-advance deadline fired.
    pub fn on_timer(&mut self) {
        self.timer = None;
        if !self.playing || self.transition.is_some() {
            return;
        }
        if let Some(index) = self.order.next() {
            self.display_index(index);
        }
    }

    /// The current crossfade ran its course. Exactly one follow-up happens
    /// here: flip the pair (image fades) and rearm the timer when playing.
    pub fn on_fade_complete(&mut self) {
        let Some(transition) = self.transition.take() else {
            return;
        };
        if transition.target == FadeTarget::Image {
            self.surfaces.swap();
            self.arm_timer();
        }
    }

    /// Video end-of-stream: advance forward exactly as the image timer would.
    pub fn on_video_ended(&mut self) {
        if !self.playing || self.transition.is_some() {
            return;
        }
        if self.showing != Some(MediaKind::Video) {
            debug!("stale video-end notification ignored");
            return;
        }
        self.timer = None;
        if let Some(index) = self.order.next() {
            self.display_index(index);
        }
    }

    /// Suspend auto-advance; a playing video keeps its position.
    pub fn pause(&mut self) {
        self.playing = false;
        self.timer = None;
        if self.showing == Some(MediaKind::Video) {
            self.video.pause();
        }
        self.status(EngineStatus::Paused);
        self.overlay_changed();
    }

    /// Resume playback: rearm the timer or continue the video. A no-op in
    /// the terminal no-media state, which only a reload exits.
    pub fn resume(&mut self) {
        if self.exhausted {
            return;
        }
        self.playing = true;
        if self.showing == Some(MediaKind::Video) {
            self.video.play();
        } else {
            self.arm_timer();
        }
        self.status(EngineStatus::Playing);
        self.overlay_changed();
    }

    /// Rebuild the catalog and display order from `folder`; the only exit
    /// from the terminal no-media state.
    pub fn reload(&mut self, folder: &Path, include_subfolders: bool, mode: DisplayOrderMode) {
        if !folder.is_dir() {
            warn!(error = %Error::Enumeration(folder.display().to_string()), "reload failed");
            self.playing = false;
            self.timer = None;
            self.status(EngineStatus::FolderInaccessible);
            return;
        }
        self.catalog = MediaCatalog::load(folder, include_subfolders, mode);
        self.order = DisplayOrder::new(self.catalog.len(), mode);
        self.exhausted = false;
        // Restart the visual pipeline from scratch.
        if self.showing == Some(MediaKind::Video) {
            self.send(DisplayCommand::HideVideo);
        }
        self.video.stop();
        self.showing = None;
        self.transition = None;
        self.timer = None;
        self.surfaces.release_all();
        self.start();
    }

    /// Idempotent shutdown: cancel deadlines, stop the video, release both
    /// buffers.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.playing = false;
        self.timer = None;
        self.transition = None;
        self.video.stop();
        self.surfaces.release_all();
        debug!("engine torn down");
    }

    pub fn state(&self) -> PlaybackState {
        if self.exhausted || self.catalog.is_empty() {
            return PlaybackState::Idle;
        }
        match self.showing {
            None => PlaybackState::Idle,
            Some(_) if !self.playing => PlaybackState::Paused,
            Some(_) if self.transition.is_some() => PlaybackState::Transitioning,
            Some(MediaKind::Image) => PlaybackState::ShowingImage,
            Some(MediaKind::Video) => PlaybackState::ShowingVideo,
        }
    }

    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer
    }

    pub fn fade_deadline(&self) -> Option<Instant> {
        self.transition.map(|t| t.deadline)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn buffers_held(&self) -> usize {
        self.surfaces.held()
    }

    pub fn catalog(&self) -> &MediaCatalog {
        &self.catalog
    }

    pub fn order_len(&self) -> usize {
        self.order.len()
    }

    pub fn current_entry(&self) -> Option<&MediaEntry> {
        self.order.current().and_then(|index| self.catalog.get(index))
    }

    /// Manual navigation: cancel the pending timer and step the sequencer.
    fn advance(&mut self, direction: Direction) {
        if self.order.is_empty() {
            return;
        }
        self.timer = None;
        let index = match direction {
            Direction::Forward => self.order.next(),
            Direction::Backward => self.order.previous(),
        };
        if let Some(index) = index {
            self.display_index(index);
        }
    }

    /// Resolve `index` to something on screen, skipping undecodable entries
    /// and removing vanished ones. At most one full cycle of failures is
    /// attempted before giving up until the next timer tick.
    fn display_index(&mut self, index: usize) {
        let mut index = index;
        let mut failures = 0usize;
        loop {
            if self.torn_down {
                return;
            }
            let Some(entry) = self.catalog.get(index) else {
                return;
            };
            let path = entry.path.clone();
            let kind = entry.kind;

            if !path.exists() {
                warn!(error = %Error::Missing(path.clone()), "removing vanished entry");
                self.remove_missing(index);
                if self.exhausted {
                    return;
                }
                let Some(retry) = self.order.current() else {
                    return;
                };
                index = retry;
                continue;
            }

            match kind {
                MediaKind::Video => match self.video.set_source(&path) {
                    Ok(()) => {
                        self.begin_video(path);
                        return;
                    }
                    Err(source) => {
                        warn!(
                            path = %path.display(),
                            error = %Error::Backend(source),
                            "video backend failed to prepare; skipping entry"
                        );
                    }
                },
                MediaKind::Image => match self.decoder.decode(&path) {
                    Ok(image) => {
                        self.begin_image(image);
                        return;
                    }
                    Err(err) => {
                        warn!(error = %err, "skipping undecodable entry");
                    }
                },
            }

            failures += 1;
            if failures >= self.order.len() {
                warn!(
                    attempts = failures,
                    "every remaining entry failed; retrying on the next tick"
                );
                self.arm_timer();
                return;
            }
            let Some(next) = self.order.next() else {
                return;
            };
            index = next;
        }
    }

    fn begin_image(&mut self, image: DecodedImage) {
        let buffer = Arc::new(image);
        if self.showing == Some(MediaKind::Video) {
            self.video.stop();
            self.send(DisplayCommand::HideVideo);
        }
        if self.showing.is_none() {
            // First display goes straight to the active surface, no fade.
            let surface = self.surfaces.active();
            let replaced = self.surfaces.attach(surface, Arc::clone(&buffer));
            self.release(replaced);
            self.showing = Some(MediaKind::Image);
            self.send(DisplayCommand::ShowImage {
                surface,
                image: buffer,
            });
            self.arm_timer();
        } else {
            let surface = self.surfaces.inactive();
            let replaced = self.surfaces.attach(surface, Arc::clone(&buffer));
            self.release(replaced);
            self.showing = Some(MediaKind::Image);
            self.transition = Some(Transition {
                deadline: Instant::now() + self.options.fade,
                target: FadeTarget::Image,
            });
            self.send(DisplayCommand::CrossfadeImage {
                surface,
                image: buffer,
                fade: self.options.fade,
            });
        }
        self.overlay_changed();
    }

    fn begin_video(&mut self, path: PathBuf) {
        self.showing = Some(MediaKind::Video);
        self.timer = None;
        self.transition = Some(Transition {
            deadline: Instant::now() + self.options.fade,
            target: FadeTarget::Video,
        });
        self.video.set_muted(self.options.mute_videos);
        self.send(DisplayCommand::ShowVideo {
            path,
            fade: self.options.fade,
        });
        if self.playing {
            self.video.play();
        }
        self.overlay_changed();
    }

    fn remove_missing(&mut self, index: usize) {
        let entry = self.catalog.remove(index);
        self.order.remove_catalog_index(index);
        info!(
            path = %entry.path.display(),
            remaining = self.catalog.len(),
            "removed vanished entry"
        );
        if self.order.is_empty() {
            self.enter_no_media();
        } else {
            self.overlay_changed();
        }
    }

    /// Terminal state once the catalog empties; only a reload exits it.
    fn enter_no_media(&mut self) {
        self.exhausted = true;
        self.playing = false;
        self.timer = None;
        self.transition = None;
        warn!(error = %Error::Exhausted, "entering no-media state");
        self.status(EngineStatus::NoMedia);
        self.overlay_changed();
    }

    /// Arm the single auto-advance deadline; any previous deadline is
    /// dropped. Never arms while paused or while a video is on screen.
    fn arm_timer(&mut self) {
        if self.playing
            && !self.torn_down
            && !self.order.is_empty()
            && self.showing != Some(MediaKind::Video)
        {
            self.timer = Some(Instant::now() + self.options.delay());
        }
    }

    /// Rate-limit manual input to one accepted action per debounce window.
    fn accept_input(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_input {
            if now.duration_since(last) < self.options.input_debounce {
                return false;
            }
        }
        self.last_input = Some(now);
        true
    }

    fn overlay_info(&self) -> OverlayInfo {
        OverlayInfo {
            position: if self.order.is_empty() {
                0
            } else {
                self.order.position() + 1
            },
            total: self.catalog.len(),
            kind: self.current_entry().map(|entry| entry.kind),
            delay: self.options.delay(),
            playing: self.playing,
            showing_video: self.showing == Some(MediaKind::Video),
        }
    }

    fn overlay_changed(&mut self) {
        if self.overlay_visible {
            let info = self.overlay_info();
            self.send(DisplayCommand::Overlay {
                visible: true,
                info,
            });
        }
    }

    fn status(&mut self, status: EngineStatus) {
        self.send(DisplayCommand::Status(status));
    }

    fn release(&mut self, replaced: Option<Arc<DecodedImage>>) {
        if let Some(old) = replaced {
            debug!(width = old.width, height = old.height, "released replaced buffer");
        }
    }

    fn send(&mut self, command: DisplayCommand) {
        if self.commands.send(command).is_err() {
            debug!("presenter channel closed; dropping display command");
        }
    }
}

/// Drive `engine` on a single task: the timer, the fade deadline, manual
/// input, and the video end-of-stream signal are all serialized here.
pub async fn run<D: DecodeBackend, V: VideoBackend>(
    mut engine: Engine<D, V>,
    mut input_rx: Receiver<InputAction>,
    mut video_end_rx: Receiver<VideoEnded>,
    cancel: CancellationToken,
) -> Result<()> {
    engine.start();
    loop {
        let timer = engine.timer_deadline();
        let fade = engine.fade_deadline();
        select! {
            _ = cancel.cancelled() => break,
            _ = maybe_deadline(fade) => engine.on_fade_complete(),
            _ = maybe_deadline(timer) => engine.on_timer(),
            maybe_action = input_rx.recv() => match maybe_action {
                Some(action) => {
                    if engine.handle_input(action) == InputOutcome::Shutdown {
                        info!("back requested; leaving slideshow");
                        break;
                    }
                }
                None => break,
            },
            Some(VideoEnded) = video_end_rx.recv() => engine.on_video_ended(),
        }
    }
    engine.teardown();
    Ok(())
}

async fn maybe_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
