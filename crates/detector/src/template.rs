//! Sentinel fragment construction, the markup-template collaborator.
//!
//! The fragment contract: a container carrying the reuse marker class,
//! holding exactly the expand sentinel first and the contract sentinel
//! last; the expand sentinel holds a single sizing child. All three
//! sentinel boxes cover the observed element in full (the overlay
//! positioning and overflow behavior of the host stylesheet are part of
//! this collaborator, not of the detector).

use resize_host::{DomHost, NodeKey};

/// Marker class on the sentinel container, used for reuse detection.
pub const TRIGGER_CONTAINER_CLASS: &str = "resize-triggers";
/// Marker class on the expand sentinel.
pub const EXPAND_TRIGGER_CLASS: &str = "expand-trigger";
/// Marker class on the contract sentinel.
pub const CONTRACT_TRIGGER_CLASS: &str = "contract-trigger";

/// Build a fresh sentinel fragment and return its container, detached.
/// The caller appends the container to the observed element.
pub fn instantiate(dom: &dyn DomHost) -> NodeKey {
    let container = dom.create_element();
    dom.add_class(container, TRIGGER_CONTAINER_CLASS);
    dom.set_percent_size(container, 100, 100);

    let expand = dom.create_element();
    dom.add_class(expand, EXPAND_TRIGGER_CLASS);
    dom.set_percent_size(expand, 100, 100);
    // Pixel-sized by the first reset.
    let sizing = dom.create_element();
    dom.append_child(expand, sizing);

    let contract = dom.create_element();
    dom.add_class(contract, CONTRACT_TRIGGER_CLASS);
    dom.set_percent_size(contract, 100, 100);
    // Double-size child: the contract sentinel's scrollable extent tracks
    // twice its client box, so any shrink of the observed element shrinks
    // the extent and forces a scroll correction.
    let oversize = dom.create_element();
    dom.set_percent_size(oversize, 200, 200);
    dom.append_child(contract, oversize);

    dom.append_child(container, expand);
    dom.append_child(container, contract);
    container
}
