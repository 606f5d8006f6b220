//! Recording fake host shared by the integration tests

#![allow(dead_code)]

use soul_cue::{AudioBackend, AudioEvent, AudioHandle, AudioListener, CueError, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// Observable state of one fake audio element
#[derive(Default)]
pub struct Element {
    pub position: f64,
    pub volume: f64,
    pub looping: bool,
    pub playing: bool,
    pub released: bool,
    pub play_calls: u32,
    pub pause_calls: u32,
    pub volume_writes: u32,
    pub listener: Option<AudioListener>,
    /// Event raised synchronously from inside `play()`
    pub reject_on_play: Option<String>,
}

impl Element {
    pub fn is_live(&self) -> bool {
        self.playing && !self.released
    }
}

struct FakeHandle(Rc<RefCell<Element>>);

impl AudioHandle for FakeHandle {
    fn set_position(&mut self, position: f64) {
        self.0.borrow_mut().position = position;
    }

    fn position(&self) -> f64 {
        self.0.borrow().position
    }

    fn set_volume(&mut self, volume: f64) {
        let mut element = self.0.borrow_mut();
        element.volume = volume;
        element.volume_writes += 1;
    }

    fn volume(&self) -> f64 {
        self.0.borrow().volume
    }

    fn set_looping(&mut self, looping: bool) {
        self.0.borrow_mut().looping = looping;
    }

    fn play(&mut self) {
        let rejection = {
            let mut element = self.0.borrow_mut();
            element.playing = true;
            element.play_calls += 1;
            element.reject_on_play.take()
        };

        // Misbehaving host: notifies from inside play()
        if let Some(message) = rejection {
            let listener = self.0.borrow_mut().listener.take();
            if let Some(mut listener) = listener {
                listener(AudioEvent::PlayRejected { message });
                let mut element = self.0.borrow_mut();
                if !element.released && element.listener.is_none() {
                    element.listener = Some(listener);
                }
            }
        }
    }

    fn pause(&mut self) {
        let mut element = self.0.borrow_mut();
        element.playing = false;
        element.pause_calls += 1;
    }

    fn set_listener(&mut self, listener: AudioListener) {
        self.0.borrow_mut().listener = Some(listener);
    }

    fn release(&mut self) {
        let mut element = self.0.borrow_mut();
        element.released = true;
        element.listener = None;
    }
}

#[derive(Default)]
struct HostLog {
    elements: Vec<Rc<RefCell<Element>>>,
    loads: u32,
    fail_loads: bool,
    reject_next_play: Option<String>,
}

/// Fake platform: hands out recording elements and lets tests push events
#[derive(Clone, Default)]
pub struct FakeHost {
    log: Rc<RefCell<HostLog>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(&self) -> FakeBackend {
        FakeBackend {
            log: self.log.clone(),
        }
    }

    pub fn loads(&self) -> u32 {
        self.log.borrow().loads
    }

    pub fn fail_loads(&self, fail: bool) {
        self.log.borrow_mut().fail_loads = fail;
    }

    /// Make the next loaded element reject `play()` synchronously
    pub fn reject_next_play(&self, message: &str) {
        self.log.borrow_mut().reject_next_play = Some(message.to_string());
    }

    pub fn element(&self, index: usize) -> Rc<RefCell<Element>> {
        self.log.borrow().elements[index].clone()
    }

    pub fn latest(&self) -> Rc<RefCell<Element>> {
        self.log
            .borrow()
            .elements
            .last()
            .cloned()
            .expect("no element loaded")
    }

    pub fn element_count(&self) -> usize {
        self.log.borrow().elements.len()
    }

    /// Elements currently playing and not released
    pub fn live_elements(&self) -> usize {
        self.log
            .borrow()
            .elements
            .iter()
            .filter(|e| e.borrow().is_live())
            .count()
    }

    /// Push a notification through an element's listener
    pub fn emit(&self, element: &Rc<RefCell<Element>>, event: AudioEvent) {
        let listener = element.borrow_mut().listener.take();
        let Some(mut listener) = listener else {
            return;
        };

        listener(event);

        let mut el = element.borrow_mut();
        if !el.released && el.listener.is_none() {
            el.listener = Some(listener);
        }
    }

    /// Move the latest element to `position` and report it
    pub fn time_update(&self, position: f64) {
        let element = self.latest();
        element.borrow_mut().position = position;
        self.emit(&element, AudioEvent::TimeUpdate { position });
    }
}

pub struct FakeBackend {
    log: Rc<RefCell<HostLog>>,
}

impl AudioBackend for FakeBackend {
    fn load(&mut self, source: &str) -> Result<Box<dyn AudioHandle>> {
        let mut log = self.log.borrow_mut();
        log.loads += 1;

        if log.fail_loads {
            return Err(CueError::ResourceLoad(format!("cannot decode {source}")));
        }

        let element = Rc::new(RefCell::new(Element {
            reject_on_play: log.reject_next_play.take(),
            ..Element::default()
        }));
        log.elements.push(element.clone());
        Ok(Box::new(FakeHandle(element)))
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
