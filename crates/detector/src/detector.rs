//! The resize detector: scroll handling, deferred confirmation, lifecycle.

use anyhow::Result;
use log::{debug, info, trace};
use resize_host::{
    BoxSize, ComputedPosition, DomHost, FrameScheduler, FrameToken, ListenerId, NodeKey,
    ScrollEvent,
};
use std::sync::{Arc, Mutex, Weak};

use crate::lock;
use crate::registry::DetectorRegistry;
use crate::sentinel::SentinelPair;

/// Callback invoked on each confirmed resize with the observed element and
/// the scroll event that triggered the check.
pub type ResizeCallback = Box<dyn FnMut(NodeKey, &ScrollEvent) + Send>;

/// Collaborators a detector needs from its host environment. Cloning
/// shares the underlying host, scheduler, and registry.
#[derive(Clone)]
pub struct DetectorContext {
    dom: Arc<dyn DomHost + Send + Sync>,
    frames: Arc<dyn FrameScheduler + Send + Sync>,
    registry: DetectorRegistry,
}

impl DetectorContext {
    pub fn new(
        dom: Arc<dyn DomHost + Send + Sync>,
        frames: Arc<dyn FrameScheduler + Send + Sync>,
    ) -> Self {
        Self {
            dom,
            frames,
            registry: DetectorRegistry::new(),
        }
    }

    pub fn dom(&self) -> &Arc<dyn DomHost + Send + Sync> {
        &self.dom
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }
}

/// Mutable detector state shared with the scroll listener and scheduled
/// confirmation tasks.
pub(crate) struct DetectorShared {
    pub(crate) pair: SentinelPair,
    /// Last confirmed size; unset until the first confirmation, so the
    /// first check after any scroll always reports a change.
    prev: Option<BoxSize>,
    /// The single outstanding confirmation, if one is scheduled.
    pending: Option<FrameToken>,
    listener: Option<ListenerId>,
}

impl DetectorShared {
    pub(crate) fn new(pair: SentinelPair) -> Self {
        Self {
            pair,
            prev: None,
            pending: None,
            listener: None,
        }
    }
}

/// Watches one element's border-box size through a sentinel pair injected
/// under it.
///
/// Construction wires a capture-phase scroll listener to the element;
/// every scroll correction re-pins the sentinels synchronously and defers
/// a measurement check to the next frame, bursts coalescing into a single
/// check. [`unbind`](Self::unbind) detaches only the listener;
/// [`dispose`](Self::dispose) is the full teardown.
pub struct ResizeDetector {
    ctx: DetectorContext,
    parent: NodeKey,
    shared: Arc<Mutex<DetectorShared>>,
    callback: Arc<Mutex<ResizeCallback>>,
}

impl ResizeDetector {
    /// Attach a detector to `parent` and start watching. Passing a no-op
    /// closure makes the detector measurement-only (its last confirmed
    /// size stays observable through [`last_size`](Self::last_size)).
    ///
    /// # Errors
    /// Returns an error when an existing sentinel container under `parent`
    /// does not match the fragment contract.
    pub fn create<F>(ctx: &DetectorContext, parent: NodeKey, callback: F) -> Result<Self>
    where
        F: FnMut(NodeKey, &ScrollEvent) + Send + 'static,
    {
        let dom = Arc::clone(&ctx.dom);

        // Sentinels overlay the observed element with absolute positioning,
        // so the element itself must be positioned.
        if dom.computed_position(parent) == ComputedPosition::Static {
            dom.set_position(parent, ComputedPosition::Relative);
        }

        let pair = SentinelPair::ensure(dom.as_ref(), &ctx.registry, parent)?;
        pair.reset(dom.as_ref());

        let shared = Arc::new(Mutex::new(DetectorShared::new(pair)));
        let callback: Arc<Mutex<ResizeCallback>> = Arc::new(Mutex::new(Box::new(callback)));

        let listener_id = {
            let weak_shared = Arc::downgrade(&shared);
            let weak_callback = Arc::downgrade(&callback);
            let listener_dom = Arc::clone(&ctx.dom);
            let listener_frames = Arc::clone(&ctx.frames);
            dom.bind_scroll(
                parent,
                Box::new(move |event| {
                    on_scroll(
                        &weak_shared,
                        &weak_callback,
                        &listener_dom,
                        &listener_frames,
                        parent,
                        event,
                    );
                }),
                true,
            )
        };
        lock(&shared).listener = Some(listener_id);

        ctx.registry.register(parent, &shared);
        info!("resize detector attached to {parent:?}");
        Ok(Self {
            ctx: ctx.clone(),
            parent,
            shared,
            callback,
        })
    }

    /// The element this detector watches.
    pub fn parent(&self) -> NodeKey {
        self.parent
    }

    /// The sentinel pair serving this detector.
    pub fn sentinels(&self) -> SentinelPair {
        lock(&self.shared).pair
    }

    /// Last confirmed border-box size, if any change has been confirmed.
    pub fn last_size(&self) -> Option<BoxSize> {
        lock(&self.shared).prev
    }

    /// Remove the capture-phase scroll subscription. Idempotent.
    ///
    /// Leaves the sentinels in place and an already-scheduled confirmation
    /// untouched; that check may still deliver at most one more callback.
    pub fn unbind(&self) -> &Self {
        let id = lock(&self.shared).listener.take();
        if let Some(id) = id {
            self.ctx.dom.unbind_scroll(self.parent, id);
            trace!("resize detector unbound from {:?}", self.parent);
        }
        self
    }

    /// Full teardown: detach the listener, cancel any pending
    /// confirmation, remove the sentinel container from the element, and
    /// clear recorded state. Idempotent.
    pub fn dispose(&self) {
        self.unbind();
        let (pending, container) = {
            let mut state = lock(&self.shared);
            state.prev = None;
            (state.pending.take(), state.pair.container)
        };
        if let Some(token) = pending {
            self.ctx.frames.cancel(token);
        }
        self.ctx.dom.remove_child(self.parent, container);
        self.ctx.registry.unregister(self.parent);
        debug!("resize detector disposed for {:?}", self.parent);
    }
}

/// Scroll handling: re-pin the sentinels before returning to the host,
/// then replace any pending confirmation with a fresh one so a burst of
/// corrections collapses into a single next-frame check.
fn on_scroll(
    shared: &Weak<Mutex<DetectorShared>>,
    callback: &Weak<Mutex<ResizeCallback>>,
    dom: &Arc<dyn DomHost + Send + Sync>,
    frames: &Arc<dyn FrameScheduler + Send + Sync>,
    parent: NodeKey,
    event: &ScrollEvent,
) {
    let Some(strong) = shared.upgrade() else {
        return;
    };
    trace!("scroll correction from {:?}", event.target);
    let mut state = lock(&strong);
    state.pair.reset(dom.as_ref());
    if let Some(token) = state.pending.take() {
        frames.cancel(token);
    }
    let task_shared = Weak::clone(shared);
    let task_callback = Weak::clone(callback);
    let task_dom = Arc::clone(dom);
    let event = *event;
    state.pending = Some(frames.schedule(Box::new(move || {
        confirm(&task_shared, &task_callback, &task_dom, parent, &event);
    })));
}

/// Next-frame confirmation: measure, compare against the last confirmed
/// size, and invoke the callback only on a real change. The callback runs
/// with no detector lock held, so it may unbind or dispose re-entrantly.
fn confirm(
    shared: &Weak<Mutex<DetectorShared>>,
    callback: &Weak<Mutex<ResizeCallback>>,
    dom: &Arc<dyn DomHost + Send + Sync>,
    parent: NodeKey,
    event: &ScrollEvent,
) {
    let Some(strong) = shared.upgrade() else {
        return;
    };
    let current = dom.offset_size(parent);
    let changed = {
        let mut state = lock(&strong);
        state.pending = None;
        if state.prev == Some(current) {
            false
        } else {
            state.prev = Some(current);
            true
        }
    };
    if !changed {
        trace!("size check for {parent:?}: unchanged at {current:?}");
        return;
    }
    debug!(
        "confirmed resize of {parent:?} to {}x{}",
        current.width, current.height
    );
    let Some(strong_callback) = callback.upgrade() else {
        return;
    };
    let mut user_callback = lock(&strong_callback);
    (*user_callback)(parent, event);
}
