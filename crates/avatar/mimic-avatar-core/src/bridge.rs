//! Handing a viseme driver to a streaming pipeline.
//!
//! The pipeline holds a `SharedVisemeDriver` (or any `SpeechSink`) and pushes
//! text and audio durations from its own callbacks; the frame loop keeps
//! another clone and calls `update`. A `BridgeRegistry` is an owned slot for
//! "the currently addressable driver": registering replaces the previous one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::viseme::{VisemeDriver, VisemeState};

/// Receiver for streamed speech data.
pub trait SpeechSink: Send + Sync {
    fn push_text(&self, text: &str);
    fn push_audio_duration(&self, seconds: f32);
}

/// Cloneable, thread-safe handle to one `VisemeDriver`.
#[derive(Clone, Debug, Default)]
pub struct SharedVisemeDriver {
    inner: Arc<Mutex<VisemeDriver>>,
}

impl SharedVisemeDriver {
    pub fn new(driver: VisemeDriver) -> Self {
        Self {
            inner: Arc::new(Mutex::new(driver)),
        }
    }

    /// Lock the driver. A poisoned lock is recovered; driver state is plain data.
    pub fn lock(&self) -> MutexGuard<'_, VisemeDriver> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update(&self, delta: f32) -> VisemeState {
        self.lock().update(delta)
    }

    pub fn state(&self) -> VisemeState {
        self.lock().state()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Whether both handles point at the same driver.
    pub fn same_driver(&self, other: &SharedVisemeDriver) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl SpeechSink for SharedVisemeDriver {
    fn push_text(&self, text: &str) {
        self.lock().push_text(text);
    }

    fn push_audio_duration(&self, seconds: f32) {
        self.lock().push_audio_duration(seconds);
    }
}

/// Single-slot registry for the active driver.
#[derive(Clone, Debug, Default)]
pub struct BridgeRegistry {
    slot: Option<SharedVisemeDriver>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `driver` the addressable one, returning the handle it replaced.
    pub fn register(&mut self, driver: SharedVisemeDriver) -> Option<SharedVisemeDriver> {
        if self.slot.is_some() {
            log::debug!("bridge registry: replacing registered viseme driver");
        }
        self.slot.replace(driver)
    }

    pub fn current(&self) -> Option<SharedVisemeDriver> {
        self.slot.clone()
    }

    pub fn clear(&mut self) -> Option<SharedVisemeDriver> {
        self.slot.take()
    }

    pub fn is_registered(&self) -> bool {
        self.slot.is_some()
    }
}
