//! Lock-guarded handle shared between the tick loop and command handlers.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::emulator::VehicleEmulator;
use crate::telemetry::Telemetry;

/// Cloneable handle; every access holds the emulator lock for its duration,
/// so commands never interleave with a running tick.
#[derive(Debug, Clone)]
pub struct SharedEmulator {
    inner: Arc<Mutex<VehicleEmulator>>,
}

impl SharedEmulator {
    #[must_use]
    pub fn new(emulator: VehicleEmulator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(emulator)),
        }
    }

    /// Run `f` with exclusive access.
    ///
    /// A panic in an earlier holder leaves state that was consistent at its
    /// last completed operation, so a poisoned lock is recovered.
    pub fn with<T>(&self, f: impl FnOnce(&mut VehicleEmulator) -> T) -> T {
        let mut guard = self.lock();
        f(&mut guard)
    }

    #[must_use]
    pub fn snapshot(&self) -> Telemetry {
        self.lock().snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, VehicleEmulator> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
