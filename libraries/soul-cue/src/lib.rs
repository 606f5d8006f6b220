//! Soul Player - Sound Cues
//!
//! Timed playback of a single audio clip for UI components that want audio
//! feedback without managing timers or playback state themselves.
//!
//! This crate provides:
//! - Crop windows (play `start_from..stop_at` of a clip)
//! - Linear fade-in / fade-out at the window edges (50 steps)
//! - Random replay at intervals between `min_interval_ms` and `max_interval_ms`
//! - Live volume adjustment while playing
//! - At most one live session per controller, with the previous session
//!   torn down before the next starts
//!
//! # Architecture
//!
//! `soul-cue` is platform-agnostic. The host supplies two collaborators:
//! - [`AudioBackend`] / [`AudioHandle`]: load, position, volume, play, pause,
//!   plus time-update / ended / error notifications
//! - [`Scheduler`]: single-shot and repeating timers
//!
//! Everything is single-threaded and callback driven; nothing blocks.
//!
//! # Example
//!
//! ```rust
//! use soul_cue::{
//!     AudioBackend, AudioHandle, AudioListener, CueConfig, CueController, ManualScheduler,
//!     Result,
//! };
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! // Platform audio element
//! #[derive(Default)]
//! struct Element {
//!     position: f64,
//!     volume: f64,
//! }
//!
//! impl AudioHandle for Element {
//!     fn set_position(&mut self, position: f64) { self.position = position; }
//!     fn position(&self) -> f64 { self.position }
//!     fn set_volume(&mut self, volume: f64) { self.volume = volume; }
//!     fn volume(&self) -> f64 { self.volume }
//!     fn set_looping(&mut self, _looping: bool) {}
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn set_listener(&mut self, _listener: AudioListener) {}
//! }
//!
//! struct Backend;
//!
//! impl AudioBackend for Backend {
//!     fn load(&mut self, _source: &str) -> Result<Box<dyn AudioHandle>> {
//!         Ok(Box::new(Element::default()))
//!     }
//! }
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let config = CueConfig {
//!     transition_start: 0.5,
//!     ..CueConfig::new("sounds/notify.ogg")
//! };
//!
//! let cue = CueController::new(config, Backend, scheduler.clone())?;
//! cue.play();
//! assert!(cue.is_playing());
//!
//! // Fade-in runs on the scheduler
//! scheduler.advance(Duration::from_millis(500));
//! assert_eq!(cue.live_volume(), Some(1.0));
//!
//! assert_eq!(cue.adjust_volume(1.5), 1.0);
//! cue.stop();
//! assert!(!cue.is_playing());
//! # Ok::<(), soul_cue::CueError>(())
//! ```

mod controller;
mod error;
pub mod events;
pub mod fader;
mod host;
mod random;
mod session;
pub mod timer;
pub mod types;
mod volume;
pub mod window;

// Public exports
pub use controller::CueController;
pub use error::{CueError, Result};
pub use events::CueEvent;
pub use fader::{FadeDirection, FADE_STEPS};
pub use host::{AudioBackend, AudioEvent, AudioHandle, AudioListener};
pub use timer::{ManualScheduler, Scheduler, TimerId};
#[cfg(feature = "tokio")]
pub use timer::TokioScheduler;
pub use types::{CueConfig, CueState, EndReason};
pub use volume::{clamp_volume, Volume};
