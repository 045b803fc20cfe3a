//! Host-environment abstraction for scroll-sentinel resize detection.
//!
//! This crate defines the capabilities a detector needs from the document
//! host it runs inside:
//! - stable node handles and integer pixel geometry
//! - a computed-style reader
//! - DOM measurement, mutation, and capture-phase scroll subscription
//! - a cancellable "run before next repaint" scheduler
//!
//! [`MemoryDom`] implements the whole surface in memory, including reflow
//! and scroll-position correction, so detector behavior can be exercised
//! without a rendering engine.

pub mod dom;
pub mod frame;
pub mod memory;
pub mod style;

pub use dom::{DomHost, ListenerId, ScrollEvent, ScrollListener};
pub use frame::{FrameQueue, FrameScheduler, FrameTask, FrameToken};
pub use memory::MemoryDom;
pub use style::{ComputedPosition, StyleReader};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A 64-bit stable key for host DOM nodes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeKey(pub u64);

/// Whole CSS pixels. Host box measurements and scroll offsets are
/// integer-valued, so size comparisons stay exact.
pub type Pixels = i32;

/// Border-box measurement of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxSize {
    pub width: Pixels,
    pub height: Pixels,
}

impl BoxSize {
    pub const fn new(width: Pixels, height: Pixels) -> Self {
        Self { width, height }
    }
}

/// Scroll position of a scrollable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOffset {
    pub left: Pixels,
    pub top: Pixels,
}

impl ScrollOffset {
    pub const fn new(left: Pixels, top: Pixels) -> Self {
        Self { left, top }
    }
}

/// Lock a mutex, recovering from poisoning. A poisoned lock here only means
/// a user callback panicked mid-dispatch; the guarded state is still valid.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
