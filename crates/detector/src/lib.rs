//! Resize detection for host document elements via scroll sentinels.
//!
//! The host environment offers no direct way to observe an element's
//! border-box size, but it does report scroll-position corrections. This
//! crate injects a pair of invisible overflow-scrollable sentinels under
//! the observed element and pins both at their maximum scroll offsets:
//! - the expand sentinel holds a child one pixel larger than its own box,
//!   so growth of the element collapses its overflow and forces a
//!   correction;
//! - the contract sentinel holds a double-size child, so shrinkage of the
//!   element shrinks its extent and forces a correction.
//!
//! Corrections surface as capture-phase scroll events on the observed
//! element. Each event synchronously re-pins the sentinels and defers a
//! size check to the next frame, coalescing event bursts into one check;
//! the check confirms the change by direct measurement before invoking the
//! user callback.

pub mod detector;
pub mod registry;
pub mod sentinel;
pub mod template;

pub use detector::{DetectorContext, ResizeCallback, ResizeDetector};
pub use registry::DetectorRegistry;
pub use sentinel::SentinelPair;
pub use template::{CONTRACT_TRIGGER_CLASS, EXPAND_TRIGGER_CLASS, TRIGGER_CONTAINER_CLASS};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering from poisoning. A poisoned lock here only
/// means a user callback panicked; the guarded state is still valid.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
