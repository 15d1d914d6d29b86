//! Per-frame coalescing of high-frequency input.
//!
//! Pointer moves arrive far faster than the display refreshes. A
//! `FrameGate` holds only the newest sample; the host applies it once per
//! animation frame. Submitting while a sample is already waiting replaces
//! it without requesting another frame.

#[derive(Debug, Clone)]
pub struct FrameGate<T> {
    pending: Option<T>,
    coalesced: u64,
}

impl<T> Default for FrameGate<T> {
    fn default() -> Self {
        Self {
            pending: None,
            coalesced: 0,
        }
    }
}

impl<T> FrameGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `sample` as the newest input.
    ///
    /// Returns `true` when the caller should request an animation frame,
    /// i.e. when no frame was already outstanding.
    pub fn submit(&mut self, sample: T) -> bool {
        let was_idle = self.pending.is_none();
        if !was_idle {
            self.coalesced += 1;
        }
        self.pending = Some(sample);
        was_idle
    }

    /// Take the sample for this frame. Leaves the gate idle.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Drop any waiting sample.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::trace!("frame gate: dropped pending sample");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Samples that were superseded before their frame ran.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
