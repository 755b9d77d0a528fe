//! Process-wide recorder with explicit lifecycle
//!
//! One recorder instance per process, created lazily from the environment
//! on first use. Tests (or embedders) can inject an instance with
//! `init_global` and discard the cached one with `reset_global` instead of
//! reaching into internal state.

use crate::recorder::Recorder;
use atelier_core::AtelierResult;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

static GLOBAL: Lazy<RwLock<Option<Arc<Recorder>>>> = Lazy::new(|| RwLock::new(None));

/// Get the process-wide recorder, constructing it from the environment on
/// first use. Missing credentials surface as a configuration error; no
/// network call is attempted.
pub fn global() -> AtelierResult<Arc<Recorder>> {
    if let Ok(guard) = GLOBAL.read() {
        if let Some(recorder) = guard.as_ref() {
            return Ok(Arc::clone(recorder));
        }
    }

    let mut guard = GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    // Another thread may have initialized while we waited for the lock.
    if let Some(recorder) = guard.as_ref() {
        return Ok(Arc::clone(recorder));
    }
    let recorder = Arc::new(Recorder::from_env()?);
    *guard = Some(Arc::clone(&recorder));
    Ok(recorder)
}

/// Install an explicit recorder as the process-wide instance.
pub fn init_global(recorder: Recorder) -> Arc<Recorder> {
    let recorder = Arc::new(recorder);
    let mut guard = GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(Arc::clone(&recorder));
    recorder
}

/// Discard the cached recorder so the next `global()` re-initializes.
pub fn reset_global() {
    let mut guard = GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = None;
}
