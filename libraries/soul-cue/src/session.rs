//! Playback session
//!
//! One `play()` worth of state: the host handle and at most one running
//! fade. Owned exclusively by the controller, which keeps zero or one of
//! these alive at any time.

use crate::fader::{FadeCompletion, FadeDirection, FadeRamp};
use crate::host::AudioHandle;
use crate::timer::{Scheduler, TimerId};
use crate::volume::clamp_volume;

/// Sequence number identifying a session
pub(crate) type SessionId = u64;

/// Fade currently driving a session's volume
pub(crate) struct ActiveFade {
    pub timer: TimerId,
    pub direction: FadeDirection,
    pub ramp: FadeRamp,
    pub completion: FadeCompletion,
}

pub(crate) struct PlaybackSession {
    id: SessionId,
    handle: Box<dyn AudioHandle>,
    fade: Option<ActiveFade>,
    active: bool,
}

impl PlaybackSession {
    pub fn new(id: SessionId, handle: Box<dyn AudioHandle>) -> Self {
        Self {
            id,
            handle,
            fade: None,
            active: true,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle_mut(&mut self) -> &mut dyn AudioHandle {
        self.handle.as_mut()
    }

    /// Level currently on the handle
    pub fn volume(&self) -> f64 {
        self.handle.volume()
    }

    pub fn set_volume(&mut self, level: f64) {
        self.handle.set_volume(clamp_volume(level));
    }

    pub fn fade_direction(&self) -> Option<FadeDirection> {
        self.fade.as_ref().map(|f| f.direction)
    }

    pub fn fade_mut(&mut self) -> Option<&mut ActiveFade> {
        self.fade.as_mut()
    }

    /// Install a fade. The previous one must already be cancelled.
    pub fn install_fade(&mut self, fade: ActiveFade) {
        debug_assert!(self.fade.is_none(), "fade installed over a live fade");
        self.fade = Some(fade);
    }

    /// Cancel the fade timer and hand back the fade, if any
    pub fn cancel_fade(&mut self, scheduler: &dyn Scheduler) -> Option<ActiveFade> {
        let fade = self.fade.take()?;
        scheduler.cancel(fade.timer);
        Some(fade)
    }

    /// Cancel timers, pause and release the handle
    ///
    /// Returns false if the session was already torn down.
    pub fn teardown(&mut self, scheduler: &dyn Scheduler) -> bool {
        if !self.active {
            return false;
        }

        self.cancel_fade(scheduler);
        self.handle.pause();
        self.handle.release();
        self.active = false;
        true
    }
}
