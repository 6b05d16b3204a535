use std::ops::{Deref, DerefMut};

use log::debug;

use crate::prelude::DecoderEngine;

/// Engine scoped to a single scan phase. The engine is stopped exactly once,
/// either explicitly through [`EngineSession::stop`] or when the session drops.
pub struct EngineSession<E: DecoderEngine> {
    engine: E,
    stopped: bool,
}

impl<E: DecoderEngine> EngineSession<E> {
    pub fn start(mut engine: E, scan_mode: bool) -> Self {
        debug!("starting engine (scan_mode={})", scan_mode);
        engine.restart(scan_mode);
        Self {
            engine,
            stopped: false,
        }
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.engine.stop();
        }
    }
}

impl<E: DecoderEngine> Deref for EngineSession<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: DecoderEngine> DerefMut for EngineSession<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: DecoderEngine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        self.halt();
    }
}
