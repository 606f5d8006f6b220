//! Cue controller - core orchestration
//!
//! Ties the session, fader, crop window and random schedule together behind
//! a cloneable handle. Everything runs on one thread: host notifications and
//! timer callbacks each run to completion, and the only mutual exclusion is
//! "tear the old session down before building the next one".

use crate::{
    error::{CueError, Result},
    events::CueEvent,
    fader::{FadeCompletion, FadeDirection, FadeRamp, FadeStep},
    host::{AudioBackend, AudioEvent, AudioHandle},
    random::RandomSchedule,
    session::{ActiveFade, PlaybackSession, SessionId},
    timer::Scheduler,
    types::{CueConfig, CueState, EndReason},
    volume::Volume,
    window::{CropWindow, WindowAction},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Shared allocation behind every controller clone
struct Core {
    state: RefCell<ControllerState>,

    /// Host notifications waiting for the state to become free
    mailbox: RefCell<VecDeque<(SessionId, AudioEvent)>>,
}

impl Core {
    /// Run `f` against the state, then process any queued notifications
    fn update<R>(&self, f: impl FnOnce(&mut ControllerState) -> R) -> R {
        let result = f(&mut self.state.borrow_mut());
        self.pump();
        result
    }

    fn deliver(&self, session: SessionId, event: AudioEvent) {
        self.mailbox.borrow_mut().push_back((session, event));
        self.pump();
    }

    /// Drain the mailbox unless the state is already borrowed
    ///
    /// A notification raised from inside a controller call stays queued;
    /// that call pumps again on its way out.
    fn pump(&self) {
        loop {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return;
            };
            let next = self.mailbox.borrow_mut().pop_front();
            let Some((session, event)) = next else {
                return;
            };
            state.on_audio_event(session, event);
        }
    }
}

struct ControllerState {
    this: Weak<Core>,
    config: CueConfig,
    window: CropWindow,
    backend: Box<dyn AudioBackend>,
    scheduler: Rc<dyn Scheduler>,

    // Target volume (adjust_volume writes, session start and fade-in read)
    volume: Volume,

    session: Option<PlaybackSession>,
    preloaded: Option<Box<dyn AudioHandle>>,
    random: RandomSchedule,
    sessions_started: u64,
    disposed: bool,

    pending_events: Vec<CueEvent>,
}

impl ControllerState {
    fn new(
        this: Weak<Core>,
        config: CueConfig,
        backend: Box<dyn AudioBackend>,
        scheduler: Rc<dyn Scheduler>,
        rng: StdRng,
    ) -> Self {
        Self {
            this,
            window: CropWindow::from_config(&config),
            volume: Volume::new(config.volume),
            random: RandomSchedule::new(rng, config.min_interval_ms, config.max_interval_ms),
            config,
            backend,
            scheduler,
            session: None,
            preloaded: None,
            sessions_started: 0,
            disposed: false,
            pending_events: Vec::new(),
        }
    }

    /// Construction-time effects: preload, autoplay, random schedule
    fn initialize(&mut self) {
        if self.config.preload {
            match self.backend.load(&self.config.source) {
                Ok(handle) => {
                    debug!(source = %self.config.source, "Preloaded cue");
                    self.preloaded = Some(handle);
                }
                Err(err) => {
                    warn!(source = %self.config.source, error = %err, "Cue preload failed");
                    self.emit_error(err.to_string());
                }
            }
        }

        if self.config.autoplay {
            self.play();
        }

        if self.config.play_randomly {
            self.start_random();
        }
    }

    // ===== Session lifecycle =====

    fn play(&mut self) {
        if self.disposed {
            trace!("play() on disposed cue controller ignored");
            return;
        }

        self.end_session(EndReason::Superseded);

        let handle = match self.preloaded.take() {
            Some(handle) => handle,
            None => match self.backend.load(&self.config.source) {
                Ok(handle) => handle,
                Err(err) => {
                    warn!(source = %self.config.source, error = %err, "Failed to load cue");
                    self.emit_error(err.to_string());
                    return;
                }
            },
        };

        self.sessions_started += 1;
        let id = self.sessions_started;
        let fade_in = self.config.fade_in();
        let target = self.volume.level();

        let mut session = PlaybackSession::new(id, handle);
        let handle = session.handle_mut();
        handle.set_looping(self.config.looping);
        handle.set_position(self.config.start_from);
        handle.set_volume(if fade_in.is_zero() { target } else { 0.0 });

        let this = self.this.clone();
        handle.set_listener(Box::new(move |event| {
            if let Some(core) = this.upgrade() {
                core.deliver(id, event);
            }
        }));
        handle.play();

        self.session = Some(session);
        debug!(session = id, source = %self.config.source, "Cue session started");
        self.pending_events.push(CueEvent::SessionStarted { session: id });

        if !fade_in.is_zero() {
            self.start_fade(target, fade_in, FadeDirection::In, FadeCompletion::Continue);
        }
    }

    /// Single teardown path for every way a session can end
    fn end_session(&mut self, reason: EndReason) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };

        session.teardown(self.scheduler.as_ref());
        debug!(session = session.id(), ?reason, "Cue session ended");
        self.pending_events.push(CueEvent::SessionEnded {
            session: session.id(),
            reason,
        });
        true
    }

    fn live_session(&mut self, id: SessionId) -> Option<&mut PlaybackSession> {
        self.session
            .as_mut()
            .filter(|s| s.id() == id && s.is_active())
    }

    // ===== Fades =====

    fn start_fade(
        &mut self,
        target: f64,
        duration: Duration,
        direction: FadeDirection,
        completion: FadeCompletion,
    ) {
        let Some(session) = self.session.as_mut().filter(|s| s.is_active()) else {
            return;
        };

        // Latest request wins; the replaced fade's completion is dropped
        session.cancel_fade(self.scheduler.as_ref());

        let Some(ramp) = FadeRamp::new(session.volume(), target, duration) else {
            session.set_volume(target);
            self.pending_events
                .push(CueEvent::FadeCompleted { direction });
            self.complete_fade(completion);
            return;
        };

        let id = session.id();
        let this = self.this.clone();
        let timer = self.scheduler.schedule_repeating(
            ramp.interval(),
            Box::new(move || {
                if let Some(core) = this.upgrade() {
                    core.update(|state| state.on_fade_tick(id));
                }
            }),
        );

        session.install_fade(ActiveFade {
            timer,
            direction,
            ramp,
            completion,
        });

        trace!(session = id, ?direction, ?duration, "Fade started");
        self.pending_events.push(CueEvent::FadeStarted {
            direction,
            duration_ms: duration.as_millis() as u64,
        });
    }

    fn on_fade_tick(&mut self, id: SessionId) {
        if self.disposed {
            return;
        }

        let scheduler = self.scheduler.clone();
        let Some(session) = self.live_session(id) else {
            trace!(session = id, "Stale fade tick ignored");
            return;
        };

        let current = session.volume();
        let Some(fade) = session.fade_mut() else {
            return;
        };

        match fade.ramp.tick(current) {
            FadeStep::Step(level) => session.set_volume(level),
            FadeStep::Finished(level) => {
                session.set_volume(level);
                if let Some(fade) = session.cancel_fade(scheduler.as_ref()) {
                    self.pending_events.push(CueEvent::FadeCompleted {
                        direction: fade.direction,
                    });
                    self.complete_fade(fade.completion);
                }
            }
        }
    }

    fn complete_fade(&mut self, completion: FadeCompletion) {
        match completion {
            FadeCompletion::Continue => {}
            FadeCompletion::EndSession => {
                self.end_session(EndReason::FadedOut);
            }
        }
    }

    fn fade_out(&mut self, duration: Duration) -> Result<()> {
        if self.disposed || !self.session.as_ref().is_some_and(|s| s.is_active()) {
            return Err(CueError::NoActiveSession);
        }

        self.start_fade(0.0, duration, FadeDirection::Out, FadeCompletion::EndSession);
        Ok(())
    }

    // ===== Host notifications =====

    fn on_audio_event(&mut self, id: SessionId, event: AudioEvent) {
        if self.disposed {
            return;
        }

        if self.live_session(id).is_none() {
            trace!(session = id, ?event, "Event for stale cue session ignored");
            return;
        }

        match event {
            AudioEvent::TimeUpdate { position } => self.on_time_update(position),
            AudioEvent::Started => debug!(session = id, "Cue playback acknowledged"),
            AudioEvent::PlayRejected { message } => {
                let err = CueError::PlaybackRejected(message);
                warn!(session = id, error = %err, "Cue playback rejected");
                self.emit_error(err.to_string());
                self.end_session(EndReason::Failed);
            }
            AudioEvent::Error { message } => {
                let err = CueError::ResourceLoad(message);
                warn!(session = id, error = %err, "Cue playback failed");
                self.emit_error(err.to_string());
                self.end_session(EndReason::Failed);
            }
            AudioEvent::Ended => {
                if self.config.looping {
                    trace!(session = id, "Looping cue reported end");
                } else {
                    self.end_session(EndReason::Finished);
                }
            }
        }
    }

    fn on_time_update(&mut self, position: f64) {
        let fade_out_running = self
            .session
            .as_ref()
            .is_some_and(|s| s.fade_direction() == Some(FadeDirection::Out));

        match self.window.evaluate(position, fade_out_running) {
            WindowAction::Continue => {}
            WindowAction::BeginFadeOut(duration) => {
                debug!(position, "Cue entered fade-out window");
                self.start_fade(0.0, duration, FadeDirection::Out, FadeCompletion::EndSession);
            }
            WindowAction::Stop => {
                debug!(position, "Cue reached end of crop window");
                self.end_session(EndReason::WindowEnd);
            }
        }
    }

    // ===== Random schedule =====

    fn start_random(&mut self) {
        if self.disposed {
            return;
        }

        self.random.cancel(self.scheduler.as_ref());
        self.schedule_random();
    }

    fn stop_random(&mut self) {
        self.random.cancel(self.scheduler.as_ref());
    }

    fn schedule_random(&mut self) {
        let delay = self.random.next_delay();
        let generation = self.random.next_generation();
        let this = self.this.clone();

        let timer = self.scheduler.schedule_once(
            delay,
            Box::new(move || {
                if let Some(core) = this.upgrade() {
                    core.update(|state| state.on_random_fire(generation));
                }
            }),
        );
        self.random.arm(timer, generation);

        let delay_ms = delay.as_millis() as u64;
        trace!(delay_ms, "Random cue play scheduled");
        self.pending_events
            .push(CueEvent::RandomPlayScheduled { delay_ms });
    }

    fn on_random_fire(&mut self, generation: u64) {
        if self.disposed || !self.random.fire(generation) {
            trace!(generation, "Stale random cue timer ignored");
            return;
        }

        self.play();
        self.schedule_random();
    }

    // ===== Volume =====

    fn adjust_volume(&mut self, level: f64) -> f64 {
        let level = self.volume.set_level(level);

        // A running fade keeps stepping from this value on its next tick
        if let Some(session) = self.session.as_mut().filter(|s| s.is_active()) {
            session.set_volume(level);
        }

        self.pending_events
            .push(CueEvent::VolumeChanged { volume: level });
        level
    }

    // ===== Disposal =====

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        self.disposed = true;
        self.random.cancel(self.scheduler.as_ref());
        self.end_session(EndReason::Disposed);

        if let Some(mut handle) = self.preloaded.take() {
            handle.release();
        }
        debug!(source = %self.config.source, "Cue controller disposed");
    }

    fn emit_error(&mut self, message: String) {
        self.pending_events.push(CueEvent::Error { message });
    }
}

impl Drop for ControllerState {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Timed playback controller for a single audio clip
///
/// Cheap to clone; every clone drives the same controller, and the handle
/// stays valid across state changes so UI code can hold on to it. The
/// controller is disposed when [`CueController::dispose`] is called or the
/// last clone is dropped.
///
/// Playback failures (load errors, hosts refusing to play) never surface as
/// errors from [`CueController::play`]; they are logged, reported as
/// [`CueEvent::Error`] and end the session.
#[derive(Clone)]
pub struct CueController {
    core: Rc<Core>,
}

impl CueController {
    /// Create a controller, validating `config` first
    ///
    /// Runs the construction-time effects (`preload`, `autoplay`,
    /// `play_randomly`) before returning.
    pub fn new(
        config: CueConfig,
        backend: impl AudioBackend + 'static,
        scheduler: Rc<dyn Scheduler>,
    ) -> Result<Self> {
        Self::with_rng(config, backend, scheduler, StdRng::from_entropy())
    }

    /// Create a controller with a caller-supplied random source
    pub fn with_rng(
        config: CueConfig,
        backend: impl AudioBackend + 'static,
        scheduler: Rc<dyn Scheduler>,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        let backend: Box<dyn AudioBackend> = Box::new(backend);
        let core = Rc::new_cyclic(|this| Core {
            state: RefCell::new(ControllerState::new(
                this.clone(),
                config,
                backend,
                scheduler,
                rng,
            )),
            mailbox: RefCell::new(VecDeque::new()),
        });

        core.update(ControllerState::initialize);
        Ok(Self { core })
    }

    // ===== Playback Control =====

    /// Start a new session, replacing the current one
    pub fn play(&self) {
        self.core.update(ControllerState::play);
    }

    /// Tear down the current session. No-op without one.
    pub fn stop(&self) {
        self.core.update(|state| {
            state.end_session(EndReason::Stopped);
        });
    }

    /// Fade the current session to silence, then tear it down
    pub fn fade_out(&self, duration: Duration) -> Result<()> {
        self.core.update(|state| state.fade_out(duration))
    }

    /// (Re)start random replays
    pub fn start_random(&self) {
        self.core.update(ControllerState::start_random);
    }

    /// Cancel the pending random replay. A playing session keeps playing.
    pub fn stop_random(&self) {
        self.core.update(ControllerState::stop_random);
    }

    // ===== Volume =====

    /// Set the target volume, returning the clamped value
    ///
    /// Also written to the live session. During a fade the next fade step
    /// continues from this value (last write wins).
    pub fn adjust_volume(&self, level: f64) -> f64 {
        self.core.update(|state| state.adjust_volume(level))
    }

    // ===== State Queries =====

    /// A session is live
    pub fn is_playing(&self) -> bool {
        self.core.state.borrow().session.is_some()
    }

    /// Target volume (0.0-1.0)
    pub fn current_volume(&self) -> f64 {
        self.core.state.borrow().volume.level()
    }

    /// Snapshot of the observable state
    pub fn state(&self) -> CueState {
        let state = self.core.state.borrow();
        CueState {
            is_playing: state.session.is_some(),
            current_volume: state.volume.level(),
        }
    }

    /// Level currently on the live handle, which differs from
    /// [`current_volume`](Self::current_volume) mid-fade
    pub fn live_volume(&self) -> Option<f64> {
        self.core
            .state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.volume())
    }

    /// Direction of the running fade, if any
    pub fn fade_direction(&self) -> Option<FadeDirection> {
        self.core
            .state
            .borrow()
            .session
            .as_ref()
            .and_then(|s| s.fade_direction())
    }

    /// Check if a fade is running
    pub fn is_fading(&self) -> bool {
        self.fade_direction().is_some()
    }

    /// Check if a random replay is pending
    pub fn is_random_active(&self) -> bool {
        self.core.state.borrow().random.is_active()
    }

    /// Number of sessions started so far
    pub fn sessions_started(&self) -> u64 {
        self.core.state.borrow().sessions_started
    }

    /// Configuration this controller was built with
    pub fn config(&self) -> CueConfig {
        self.core.state.borrow().config.clone()
    }

    /// Check whether two handles drive the same controller
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    // ===== Events =====

    /// Take all events recorded since the last drain
    pub fn drain_events(&self) -> Vec<CueEvent> {
        std::mem::take(&mut self.core.state.borrow_mut().pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.core.state.borrow().pending_events.is_empty()
    }

    // ===== Disposal =====

    /// Cancel every timer and tear down the session
    ///
    /// Later calls on any clone are ignored, and callbacks that were already
    /// in flight do nothing.
    pub fn dispose(&self) {
        self.core.state.borrow_mut().dispose();
        self.core.mailbox.borrow_mut().clear();
    }

    /// Check if the controller was disposed
    pub fn is_disposed(&self) -> bool {
        self.core.state.borrow().disposed
    }
}

impl std::fmt::Debug for CueController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("CueController")
            .field("source", &self.core.state.borrow().config.source)
            .field("is_playing", &state.is_playing)
            .field("current_volume", &state.current_volume)
            .finish()
    }
}
