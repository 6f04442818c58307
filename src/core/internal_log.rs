//! Self-diagnostic channel
//!
//! Problems inside the logging pipeline (configuration mistakes, failing
//! appenders, API misuse) are reported here instead of through the logger
//! hierarchy, so that reporting can never recurse into the failing component.
//! Output goes to stderr.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Enable or disable `[LOGGER DEBUG]` output. Disabled by default.
pub fn set_internal_debugging(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_internal_debugging() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Silence every internal message, including errors.
pub fn set_quiet_mode(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet_mode() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

pub fn debug(message: impl Display) {
    if is_internal_debugging() && !is_quiet_mode() {
        eprintln!("[LOGGER DEBUG] {}", message);
    }
}

pub fn warn(message: impl Display) {
    if !is_quiet_mode() {
        eprintln!("[LOGGER WARNING] {}", message);
    }
}

pub fn error(message: impl Display) {
    if !is_quiet_mode() {
        eprintln!("[LOGGER ERROR] {}", message);
    }
}

/// Extract a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
