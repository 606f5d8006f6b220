//! Host audio primitive traits
//!
//! Abstracts the platform's playable audio element (HTML audio, a rodio sink,
//! a native player) so the controller stays platform-agnostic.

use crate::error::Result;

/// Notification pushed by a handle to its listener
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// Playback position advanced (seconds from the start of the clip)
    TimeUpdate {
        /// Current position in seconds
        position: f64,
    },

    /// Host acknowledged `play()`
    Started,

    /// Host refused `play()` (autoplay policy, device busy, ...)
    PlayRejected {
        /// Host supplied reason
        message: String,
    },

    /// Clip reached its natural end
    Ended,

    /// Resource failed while loading or playing
    Error {
        /// Host supplied reason
        message: String,
    },
}

/// Listener receiving a handle's notifications
pub type AudioListener = Box<dyn FnMut(AudioEvent)>;

/// Loads playable handles from a source locator
pub trait AudioBackend {
    /// Load the resource behind `source`
    ///
    /// # Returns
    /// * `Ok(handle)` - Handle ready to be positioned and played
    /// * `Err(_)` - Resource could not be loaded (`CueError::ResourceLoad`)
    fn load(&mut self, source: &str) -> Result<Box<dyn AudioHandle>>;
}

/// One playable instance of an audio resource
///
/// Notifications must be delivered from the host's own event loop. A
/// listener invoked from inside one of these methods is tolerated (the event
/// is queued until the controller call returns) but never required.
pub trait AudioHandle {
    /// Seek to `position` seconds
    fn set_position(&mut self, position: f64);

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Set linear volume (already clamped to 0.0-1.0)
    fn set_volume(&mut self, volume: f64);

    /// Current linear volume
    fn volume(&self) -> f64;

    /// Let the host loop the clip internally
    fn set_looping(&mut self, looping: bool);

    /// Request playback start
    ///
    /// The outcome arrives later as [`AudioEvent::Started`] or
    /// [`AudioEvent::PlayRejected`].
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Install the notification listener, replacing any previous one
    fn set_listener(&mut self, listener: AudioListener);

    /// Drop the listener and free host resources
    ///
    /// Called once after `pause()` when a session is torn down.
    fn release(&mut self) {}
}
