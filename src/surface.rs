//! Double-buffered render surfaces for crossfading between stills.

use std::sync::Arc;

use crate::decode::DecodedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceId {
    A,
    B,
}

impl SurfaceId {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Two logical render surfaces with an active flag.
///
/// Each surface holds at most one decoded buffer; attaching a replacement
/// hands the previous buffer back so it is released on the spot rather than
/// kept around.
#[derive(Debug)]
pub struct SurfacePair {
    active: SurfaceId,
    slots: [Option<Arc<DecodedImage>>; 2],
}

impl SurfacePair {
    pub fn new() -> Self {
        Self {
            active: SurfaceId::A,
            slots: [None, None],
        }
    }

    pub fn active(&self) -> SurfaceId {
        self.active
    }

    pub fn inactive(&self) -> SurfaceId {
        self.active.other()
    }

    /// Attach `buffer` to `surface`, returning the buffer it replaced.
    pub fn attach(
        &mut self,
        surface: SurfaceId,
        buffer: Arc<DecodedImage>,
    ) -> Option<Arc<DecodedImage>> {
        self.slots[surface.slot()].replace(buffer)
    }

    /// Flip which surface is on screen.
    pub fn swap(&mut self) {
        self.active = self.active.other();
    }

    /// Drop both buffers (teardown).
    pub fn release_all(&mut self) {
        self.slots = [None, None];
    }

    /// Number of buffers currently attached. Never exceeds two.
    pub fn held(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl Default for SurfacePair {
    fn default() -> Self {
        Self::new()
    }
}
