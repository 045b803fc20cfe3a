//! In-memory host document with reflow and scroll-position correction.
//!
//! `MemoryDom` models exactly the layout behavior the sentinel mechanism
//! rides on: sizes resolve parent-before-child (pixels or percentages of
//! the parent's client box), a node's scrollable extent is driven by its
//! largest child, and any reflow clamps stale scroll offsets back into
//! range, reporting each correction as a scroll event. Listeners run with
//! no internal lock held, so they may freely mutate the document; the
//! corrections that causes join the same delivery queue.

use crate::dom::{DomHost, ListenerId, ScrollEvent, ScrollListener};
use crate::style::{ComputedPosition, StyleReader};
use crate::{BoxSize, NodeKey, Pixels, ScrollOffset, lock};
use log::warn;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Inline size style of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SizeStyle {
    /// No inline size; resolves to an empty box.
    #[default]
    Auto,
    /// Fixed pixel size.
    Px(BoxSize),
    /// Percentage of the parent's client box, per axis.
    Percent(u16, u16),
}

#[derive(Default)]
struct NodeState {
    size_style: SizeStyle,
    position: Option<ComputedPosition>,
    classes: HashSet<String>,
    parent: Option<NodeKey>,
    children: SmallVec<[NodeKey; 4]>,
    scroll: ScrollOffset,
    /// Border-box size from the last reflow.
    resolved: BoxSize,
}

struct ListenerEntry {
    id: ListenerId,
    node: NodeKey,
    capture: bool,
    callback: Arc<Mutex<ScrollListener>>,
}

#[derive(Default)]
struct DomState {
    next_node: u64,
    next_listener: u64,
    nodes: HashMap<NodeKey, NodeState>,
    listeners: Vec<ListenerEntry>,
    queued: VecDeque<ScrollEvent>,
    /// Set while a listener is being invoked; nested mutations enqueue
    /// their corrections and leave delivery to the outermost drain loop.
    dispatching: bool,
}

/// Clone-able handle over a shared in-memory document.
#[derive(Clone, Default)]
pub struct MemoryDom {
    inner: Arc<Mutex<DomState>>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children of `node`, in document order.
    pub fn children(&self, node: NodeKey) -> Vec<NodeKey> {
        lock(&self.inner)
            .nodes
            .get(&node)
            .map(|entry| entry.children.to_vec())
            .unwrap_or_default()
    }

    /// Whether `node` carries the class token `class`.
    pub fn has_class(&self, node: NodeKey, class: &str) -> bool {
        lock(&self.inner)
            .nodes
            .get(&node)
            .is_some_and(|entry| entry.classes.contains(class))
    }

    /// Deliver queued scroll events until the queue is dry. Listener
    /// callbacks run with the state lock released; corrections they cause
    /// are appended to the same queue and delivered by this loop.
    fn drain_events(&self) {
        loop {
            let event = {
                let mut state = lock(&self.inner);
                if state.dispatching {
                    // An outer drain loop is already running; it will pick
                    // up whatever we enqueued.
                    return;
                }
                let Some(event) = state.queued.pop_front() else {
                    return;
                };
                state.dispatching = true;
                event
            };
            for listener in self.listeners_for(&event) {
                let mut callback = lock(&listener);
                (*callback)(&event);
            }
            lock(&self.inner).dispatching = false;
        }
    }

    /// Listeners observing `event`: capture listeners along the ancestor
    /// chain (outermost first), then every listener on the target itself.
    /// Scroll does not bubble, so non-capture ancestors never match.
    fn listeners_for(&self, event: &ScrollEvent) -> Vec<Arc<Mutex<ScrollListener>>> {
        let state = lock(&self.inner);
        let mut chain = Vec::new();
        let mut cursor = state.nodes.get(&event.target).and_then(|entry| entry.parent);
        while let Some(node) = cursor {
            chain.push(node);
            cursor = state.nodes.get(&node).and_then(|entry| entry.parent);
        }
        chain.reverse();

        let mut matched = Vec::new();
        for ancestor in chain {
            for entry in &state.listeners {
                if entry.node == ancestor && entry.capture {
                    matched.push(Arc::clone(&entry.callback));
                }
            }
        }
        for entry in &state.listeners {
            if entry.node == event.target {
                matched.push(Arc::clone(&entry.callback));
            }
        }
        matched
    }
}

/// Re-resolve every node size (parent before child), then clamp every
/// scroll offset into `[0, extent - client]`, queueing a scroll event for
/// each stored offset the clamp changes.
fn reflow(state: &mut DomState) {
    let mut roots: Vec<NodeKey> = state
        .nodes
        .iter()
        .filter(|(_, node)| node.parent.is_none())
        .map(|(key, _)| *key)
        .collect();
    roots.sort_by_key(|key| key.0);
    for root in roots {
        resolve_subtree(state, root, BoxSize::default());
    }

    // Stable correction order across runs.
    let mut keys: Vec<NodeKey> = state.nodes.keys().copied().collect();
    keys.sort_by_key(|key| key.0);
    for key in keys {
        let max = max_scroll_of(state, key);
        let Some(entry) = state.nodes.get_mut(&key) else {
            continue;
        };
        let clamped = ScrollOffset::new(
            entry.scroll.left.clamp(0, max.width),
            entry.scroll.top.clamp(0, max.height),
        );
        if clamped != entry.scroll {
            entry.scroll = clamped;
            state.queued.push_back(ScrollEvent {
                target: key,
                left: clamped.left,
                top: clamped.top,
            });
        }
    }
}

fn resolve_subtree(state: &mut DomState, node: NodeKey, parent_client: BoxSize) {
    let Some(entry) = state.nodes.get(&node) else {
        return;
    };
    let resolved = match entry.size_style {
        SizeStyle::Auto => BoxSize::default(),
        SizeStyle::Px(size) => size,
        SizeStyle::Percent(width, height) => BoxSize::new(
            parent_client.width * Pixels::from(width) / 100,
            parent_client.height * Pixels::from(height) / 100,
        ),
    };
    let children = entry.children.clone();
    if let Some(entry) = state.nodes.get_mut(&node) {
        entry.resolved = resolved;
    }
    for child in children {
        resolve_subtree(state, child, resolved);
    }
}

/// Scrollable content extent of `node`: per axis, the larger of its own
/// client box and its largest child.
fn extent_of(state: &DomState, node: NodeKey) -> BoxSize {
    let Some(entry) = state.nodes.get(&node) else {
        return BoxSize::default();
    };
    let mut extent = entry.resolved;
    for child in &entry.children {
        if let Some(child_entry) = state.nodes.get(child) {
            extent.width = extent.width.max(child_entry.resolved.width);
            extent.height = extent.height.max(child_entry.resolved.height);
        }
    }
    extent
}

/// Maximum valid scroll offsets of `node`.
fn max_scroll_of(state: &DomState, node: NodeKey) -> BoxSize {
    let extent = extent_of(state, node);
    let client = state
        .nodes
        .get(&node)
        .map(|entry| entry.resolved)
        .unwrap_or_default();
    BoxSize::new(
        (extent.width - client.width).max(0),
        (extent.height - client.height).max(0),
    )
}

impl StyleReader for MemoryDom {
    fn computed_position(&self, node: NodeKey) -> ComputedPosition {
        lock(&self.inner)
            .nodes
            .get(&node)
            .and_then(|entry| entry.position)
            .unwrap_or_default()
    }
}

impl DomHost for MemoryDom {
    fn offset_size(&self, node: NodeKey) -> BoxSize {
        lock(&self.inner)
            .nodes
            .get(&node)
            .map(|entry| entry.resolved)
            .unwrap_or_default()
    }

    fn scroll_extent(&self, node: NodeKey) -> BoxSize {
        extent_of(&lock(&self.inner), node)
    }

    fn scroll_offset(&self, node: NodeKey) -> ScrollOffset {
        lock(&self.inner)
            .nodes
            .get(&node)
            .map(|entry| entry.scroll)
            .unwrap_or_default()
    }

    fn set_scroll_offset(&self, node: NodeKey, offset: ScrollOffset) {
        {
            let mut state = lock(&self.inner);
            if !state.nodes.contains_key(&node) {
                warn!("set_scroll_offset on unknown node {node:?}");
                return;
            }
            let max = max_scroll_of(&state, node);
            let clamped = ScrollOffset::new(
                offset.left.clamp(0, max.width),
                offset.top.clamp(0, max.height),
            );
            let Some(entry) = state.nodes.get_mut(&node) else {
                return;
            };
            if entry.scroll == clamped {
                return;
            }
            entry.scroll = clamped;
            state.queued.push_back(ScrollEvent {
                target: node,
                left: clamped.left,
                top: clamped.top,
            });
        }
        self.drain_events();
    }

    fn set_px_size(&self, node: NodeKey, size: BoxSize) {
        {
            let mut state = lock(&self.inner);
            let Some(entry) = state.nodes.get_mut(&node) else {
                warn!("set_px_size on unknown node {node:?}");
                return;
            };
            if entry.size_style == SizeStyle::Px(size) {
                return;
            }
            entry.size_style = SizeStyle::Px(size);
            reflow(&mut state);
        }
        self.drain_events();
    }

    fn set_percent_size(&self, node: NodeKey, width: u16, height: u16) {
        {
            let mut state = lock(&self.inner);
            let Some(entry) = state.nodes.get_mut(&node) else {
                warn!("set_percent_size on unknown node {node:?}");
                return;
            };
            if entry.size_style == SizeStyle::Percent(width, height) {
                return;
            }
            entry.size_style = SizeStyle::Percent(width, height);
            reflow(&mut state);
        }
        self.drain_events();
    }

    fn set_position(&self, node: NodeKey, position: ComputedPosition) {
        let mut state = lock(&self.inner);
        let Some(entry) = state.nodes.get_mut(&node) else {
            warn!("set_position on unknown node {node:?}");
            return;
        };
        entry.position = Some(position);
    }

    fn create_element(&self) -> NodeKey {
        let mut state = lock(&self.inner);
        let key = NodeKey(state.next_node);
        state.next_node += 1;
        state.nodes.insert(key, NodeState::default());
        key
    }

    fn append_child(&self, parent: NodeKey, child: NodeKey) {
        {
            let mut state = lock(&self.inner);
            if !state.nodes.contains_key(&parent) || !state.nodes.contains_key(&child) {
                warn!("append_child with unknown node ({parent:?} <- {child:?})");
                return;
            }
            let previous = state.nodes.get(&child).and_then(|entry| entry.parent);
            if previous == Some(parent) {
                return;
            }
            if let Some(old_parent) = previous
                && let Some(entry) = state.nodes.get_mut(&old_parent)
            {
                entry.children.retain(|key| *key != child);
            }
            if let Some(entry) = state.nodes.get_mut(&child) {
                entry.parent = Some(parent);
            }
            if let Some(entry) = state.nodes.get_mut(&parent) {
                entry.children.push(child);
            }
            reflow(&mut state);
        }
        self.drain_events();
    }

    fn remove_child(&self, parent: NodeKey, child: NodeKey) {
        {
            let mut state = lock(&self.inner);
            let attached = state.nodes.get(&child).and_then(|entry| entry.parent) == Some(parent);
            if !attached {
                return;
            }
            if let Some(entry) = state.nodes.get_mut(&parent) {
                entry.children.retain(|key| *key != child);
            }
            if let Some(entry) = state.nodes.get_mut(&child) {
                entry.parent = None;
            }
            reflow(&mut state);
        }
        self.drain_events();
    }

    fn first_child(&self, node: NodeKey) -> Option<NodeKey> {
        lock(&self.inner)
            .nodes
            .get(&node)
            .and_then(|entry| entry.children.first().copied())
    }

    fn last_child(&self, node: NodeKey) -> Option<NodeKey> {
        lock(&self.inner)
            .nodes
            .get(&node)
            .and_then(|entry| entry.children.last().copied())
    }

    fn add_class(&self, node: NodeKey, class: &str) {
        let mut state = lock(&self.inner);
        let Some(entry) = state.nodes.get_mut(&node) else {
            warn!("add_class on unknown node {node:?}");
            return;
        };
        entry.classes.insert(class.to_owned());
    }

    fn query_class(&self, root: NodeKey, class: &str) -> Option<NodeKey> {
        let state = lock(&self.inner);
        query_descendants(&state, root, class)
    }

    fn bind_scroll(&self, node: NodeKey, listener: ScrollListener, capture: bool) -> ListenerId {
        let mut state = lock(&self.inner);
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push(ListenerEntry {
            id,
            node,
            capture,
            callback: Arc::new(Mutex::new(listener)),
        });
        id
    }

    fn unbind_scroll(&self, node: NodeKey, id: ListenerId) {
        lock(&self.inner)
            .listeners
            .retain(|entry| !(entry.node == node && entry.id == id));
    }
}

/// Preorder search of `root`'s descendants for the first `class` carrier.
fn query_descendants(state: &DomState, root: NodeKey, class: &str) -> Option<NodeKey> {
    let entry = state.nodes.get(&root)?;
    for child in &entry.children {
        if state
            .nodes
            .get(child)
            .is_some_and(|child_entry| child_entry.classes.contains(class))
        {
            return Some(*child);
        }
        if let Some(found) = query_descendants(state, *child, class) {
            return Some(found);
        }
    }
    None
}
