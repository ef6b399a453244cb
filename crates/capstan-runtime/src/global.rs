//! Process-wide default connection manager.
//!
//! One slot, last writer wins. Migrations get their connection through
//! `MigrationContext`; the slot exists for the model layer.

use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::manager::ConnectionManager;

static GLOBAL: Lazy<RwLock<Option<Arc<ConnectionManager>>>> = Lazy::new(|| RwLock::new(None));

/// Install `manager` as the default, replacing any previous one.
pub fn set_global(manager: Arc<ConnectionManager>) {
    let mut slot = GLOBAL.write().unwrap_or_else(|e| e.into_inner());
    if slot.is_some() {
        debug!("Replacing global connection manager");
    }
    *slot = Some(manager);
}

/// The current default manager, if any.
pub fn global() -> Option<Arc<ConnectionManager>> {
    GLOBAL.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Remove the default manager.
pub fn clear_global() -> Option<Arc<ConnectionManager>> {
    GLOBAL.write().unwrap_or_else(|e| e.into_inner()).take()
}

/// Serializes tests that touch the global slot.
#[cfg(test)]
static TEST_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

/// Lock for synchronous tests. Must not be called from inside a runtime.
#[cfg(test)]
pub(crate) fn test_guard() -> tokio::sync::MutexGuard<'static, ()> {
    TEST_LOCK.blocking_lock()
}

/// Lock for async tests; safe to hold across `.await`.
#[cfg(test)]
pub(crate) async fn test_guard_async() -> tokio::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().await
}
