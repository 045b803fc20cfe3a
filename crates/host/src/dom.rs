//! DOM capability surface the detector is written against.
//!
//! The trait is object-safe and every method takes `&self`; implementations
//! keep their state behind interior mutability so handles can be cloned and
//! captured by event closures.

use crate::style::{ComputedPosition, StyleReader};
use crate::{BoxSize, NodeKey, Pixels, ScrollOffset};

/// A scroll event reported by the host after a scroll-position change,
/// carrying the corrected position.
#[derive(Debug, Clone, Copy)]
pub struct ScrollEvent {
    /// The node whose scroll position changed.
    pub target: NodeKey,
    /// Corrected horizontal scroll position.
    pub left: Pixels,
    /// Corrected vertical scroll position.
    pub top: Pixels,
}

/// Handle for an installed scroll listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Callback invoked for each delivered scroll event.
pub type ScrollListener = Box<dyn FnMut(&ScrollEvent) + Send>;

/// Operations a host document must support for resize detection: box
/// measurement, inline style writes, child management, marker-class
/// queries, and scroll subscription.
pub trait DomHost: StyleReader {
    /// Border-box size of `node`.
    fn offset_size(&self, node: NodeKey) -> BoxSize;

    /// Total scrollable content extent of `node` (the scrollWidth and
    /// scrollHeight of the host environment).
    fn scroll_extent(&self, node: NodeKey) -> BoxSize;

    /// Current scroll position of `node`.
    fn scroll_offset(&self, node: NodeKey) -> ScrollOffset;

    /// Set the scroll position of `node`. The host clamps the value into
    /// `[0, extent - client]` per axis and reports a scroll event iff the
    /// stored position changes.
    fn set_scroll_offset(&self, node: NodeKey, offset: ScrollOffset);

    /// Set an inline pixel size on `node`.
    fn set_px_size(&self, node: NodeKey, size: BoxSize);

    /// Set an inline size on `node` as a percentage of the parent's client
    /// box, per axis.
    fn set_percent_size(&self, node: NodeKey, width: u16, height: u16);

    /// Set the inline `position` property of `node`.
    fn set_position(&self, node: NodeKey, position: ComputedPosition);

    /// Create a new detached element.
    fn create_element(&self) -> NodeKey;

    /// Append `child` under `parent`, detaching it from any previous
    /// parent. Appending a node to its current parent is a no-op.
    fn append_child(&self, parent: NodeKey, child: NodeKey);

    /// Detach `child` from `parent`. A no-op when `child` is not currently
    /// a child of `parent`.
    fn remove_child(&self, parent: NodeKey, child: NodeKey);

    /// First child of `node`, if any.
    fn first_child(&self, node: NodeKey) -> Option<NodeKey>;

    /// Last child of `node`, if any.
    fn last_child(&self, node: NodeKey) -> Option<NodeKey>;

    /// Add a class token to `node`.
    fn add_class(&self, node: NodeKey, class: &str);

    /// Depth-first search under `root` (excluding `root` itself) for the
    /// first descendant carrying `class`.
    fn query_class(&self, root: NodeKey, class: &str) -> Option<NodeKey>;

    /// Install a scroll listener on `node`. Scroll events do not bubble:
    /// with `capture` the listener observes events targeting any descendant
    /// of `node`; without it, only events targeting `node` itself.
    fn bind_scroll(&self, node: NodeKey, listener: ScrollListener, capture: bool) -> ListenerId;

    /// Remove a previously installed listener. Unknown or already-removed
    /// ids are a no-op.
    fn unbind_scroll(&self, node: NodeKey, id: ListenerId);
}
