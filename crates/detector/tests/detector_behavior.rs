//! End-to-end detector behavior over the in-memory host.
//!
//! Each test drives the full loop: a box mutation reflows the sentinels,
//! the host corrects their scroll positions, the corrections hit the
//! capture-phase listener, and the deferred check runs when the frame
//! queue is pumped.

use resize_detector::{DetectorContext, ResizeDetector};
use resize_host::{
    BoxSize, ComputedPosition, DomHost, FrameQueue, MemoryDom, NodeKey, ScrollEvent, ScrollOffset,
    StyleReader,
};
use std::sync::{Arc, Mutex};

struct Env {
    dom: MemoryDom,
    frames: FrameQueue,
    ctx: DetectorContext,
}

fn env() -> Env {
    let _ = env_logger::builder().is_test(true).try_init();
    let dom = MemoryDom::new();
    let frames = FrameQueue::new();
    let ctx = DetectorContext::new(Arc::new(dom.clone()), Arc::new(frames.clone()));
    Env { dom, frames, ctx }
}

fn observed(dom: &MemoryDom, width: i32, height: i32) -> NodeKey {
    let parent = dom.create_element();
    dom.set_px_size(parent, BoxSize::new(width, height));
    parent
}

type Hits = Arc<Mutex<Vec<NodeKey>>>;

fn recording() -> (Hits, impl FnMut(NodeKey, &ScrollEvent) + Send + 'static) {
    let hits: Hits = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&hits);
    let callback = move |node: NodeKey, _event: &ScrollEvent| {
        sink.lock().expect("hits lock").push(node);
    };
    (hits, callback)
}

fn hit_count(hits: &Hits) -> usize {
    hits.lock().expect("hits lock").len()
}

#[test]
fn test_single_resize_confirms_exactly_once() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    assert_eq!(hit_count(&hits), 0, "confirmation waits for the frame");

    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1);
    assert_eq!(detector.last_size(), Some(BoxSize::new(300, 100)));

    // An idle frame delivers nothing further.
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1);
}

#[test]
fn test_first_check_fires_even_without_numeric_change() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    // Disturb a sentinel without changing the observed box. The very first
    // check has no previous size to compare against, so it must confirm.
    let expand = detector.sentinels().expand;
    env.dom.set_scroll_offset(expand, ScrollOffset::default());
    env.frames.run_frame();

    assert_eq!(hit_count(&hits), 1);
    assert_eq!(detector.last_size(), Some(BoxSize::new(200, 100)));
}

#[test]
fn test_unchanged_size_is_a_no_op() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1);

    // A scroll correction with no size change behind it confirms nothing
    // and leaves the recorded size untouched.
    let expand = detector.sentinels().expand;
    env.dom.set_scroll_offset(expand, ScrollOffset::default());
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1);
    assert_eq!(detector.last_size(), Some(BoxSize::new(300, 100)));
}

#[test]
fn test_burst_within_one_frame_coalesces() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    env.dom.set_px_size(parent, BoxSize::new(250, 100));
    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    env.frames.run_frame();

    assert_eq!(hit_count(&hits), 1, "burst coalesces into one check");
    assert_eq!(detector.last_size(), Some(BoxSize::new(300, 100)));
}

#[test]
fn test_shrink_is_detected_via_contract_sentinel() {
    let env = env();
    let parent = observed(&env.dom, 300, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    env.dom.set_px_size(parent, BoxSize::new(220, 80));
    env.frames.run_frame();

    assert_eq!(hit_count(&hits), 1);
    assert_eq!(detector.last_size(), Some(BoxSize::new(220, 80)));
}

#[test]
fn test_sentinels_pinned_after_scroll_handling() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (_hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    // Resize and inspect sentinel offsets before any frame runs: scroll
    // handling alone must leave both sentinels at their maximums.
    env.dom.set_px_size(parent, BoxSize::new(300, 150));

    let pair = detector.sentinels();
    for sentinel in [pair.expand, pair.contract] {
        let extent = env.dom.scroll_extent(sentinel);
        let client = env.dom.offset_size(sentinel);
        let expected = ScrollOffset::new(extent.width - client.width, extent.height - client.height);
        assert_eq!(env.dom.scroll_offset(sentinel), expected);
    }
}

#[test]
fn test_unbind_stops_future_delivery() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1);

    detector.unbind();
    env.dom.set_px_size(parent, BoxSize::new(400, 100));
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1, "no delivery after unbind");
    assert_eq!(detector.last_size(), Some(BoxSize::new(300, 100)));
}

#[test]
fn test_unbind_leaves_already_scheduled_check_live() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    // The resize schedules a check; unbind detaches only the listener.
    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    detector.unbind();
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1, "pending check still delivers once");

    env.dom.set_px_size(parent, BoxSize::new(400, 100));
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1);
}

#[test]
fn test_unbind_before_any_scroll_never_fires() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    detector.unbind();
    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 0);
}

#[test]
fn test_unbind_twice_is_a_no_op() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (_hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    detector.unbind().unbind();
}

#[test]
fn test_second_detector_reuses_sentinel_pair() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (first_hits, first_callback) = recording();
    let (second_hits, second_callback) = recording();

    let first = ResizeDetector::create(&env.ctx, parent, first_callback).expect("first");
    let second = ResizeDetector::create(&env.ctx, parent, second_callback).expect("second");

    assert_eq!(first.sentinels(), second.sentinels());
    assert_eq!(env.dom.children(parent).len(), 1, "no duplicate container");

    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    env.frames.run_frame();
    assert_eq!(hit_count(&first_hits), 1);
    assert_eq!(hit_count(&second_hits), 1);
}

#[test]
fn test_orphaned_container_is_adopted() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (_first_hits, first_callback) = recording();
    let first = ResizeDetector::create(&env.ctx, parent, first_callback).expect("first");
    drop(first);

    // The registry entry died with the detector, but the container is
    // still in the document and gets adopted instead of duplicated.
    let (hits, callback) = recording();
    let second = ResizeDetector::create(&env.ctx, parent, callback).expect("second");
    assert_eq!(env.dom.children(parent).len(), 1);

    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1);
    assert_eq!(second.last_size(), Some(BoxSize::new(300, 100)));
}

#[test]
fn test_static_parent_is_forced_relative() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    assert_eq!(env.dom.computed_position(parent), ComputedPosition::Static);

    let (_hits, callback) = recording();
    let _detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");
    assert_eq!(env.dom.computed_position(parent), ComputedPosition::Relative);
}

#[test]
fn test_positioned_parent_keeps_its_position() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    env.dom.set_position(parent, ComputedPosition::Absolute);

    let (_hits, callback) = recording();
    let _detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");
    assert_eq!(env.dom.computed_position(parent), ComputedPosition::Absolute);
}

#[test]
fn test_dispose_cancels_pending_and_removes_sentinels() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");

    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    detector.dispose();
    env.frames.run_frame();

    assert_eq!(hit_count(&hits), 0, "pending check was cancelled");
    assert!(env.dom.children(parent).is_empty(), "sentinels removed");
    assert_eq!(detector.last_size(), None);
    assert!(env.ctx.registry().is_empty());

    // Disposing again changes nothing.
    detector.dispose();
}

#[test]
fn test_detector_after_dispose_rebuilds_fragment() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let (_hits, callback) = recording();
    let detector = ResizeDetector::create(&env.ctx, parent, callback).expect("create");
    detector.dispose();

    let (hits, callback) = recording();
    let _second = ResizeDetector::create(&env.ctx, parent, callback).expect("second");
    assert_eq!(env.dom.children(parent).len(), 1);

    env.dom.set_px_size(parent, BoxSize::new(240, 100));
    env.frames.run_frame();
    assert_eq!(hit_count(&hits), 1);
}

#[test]
fn test_callback_receives_observed_element_and_event() {
    let env = env();
    let parent = observed(&env.dom, 200, 100);
    let seen: Arc<Mutex<Vec<(NodeKey, NodeKey)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let detector = ResizeDetector::create(&env.ctx, parent, move |node, event| {
        sink.lock().expect("seen lock").push((node, event.target));
    })
    .expect("create");

    env.dom.set_px_size(parent, BoxSize::new(300, 100));
    env.frames.run_frame();

    let recorded = seen.lock().expect("seen lock").clone();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, parent);
    let pair = detector.sentinels();
    assert!(recorded[0].1 == pair.expand || recorded[0].1 == pair.contract);
}
