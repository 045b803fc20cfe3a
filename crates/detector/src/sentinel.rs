//! Sentinel pair management: adoption, injection, and reset.

use anyhow::{Result, bail};
use log::trace;
use resize_host::{BoxSize, DomHost, NodeKey, ScrollOffset};

use crate::registry::DetectorRegistry;
use crate::template;

/// The two scroll sentinels living under an observed element, plus the
/// nested sizing child that keeps the expand sentinel overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelPair {
    /// Fragment root carrying the reuse marker class.
    pub container: NodeKey,
    /// Detects growth of the observed element.
    pub expand: NodeKey,
    /// Detects shrinkage of the observed element.
    pub contract: NodeKey,
    /// Oversized child inside the expand sentinel.
    pub sizing: NodeKey,
}

impl SentinelPair {
    /// Identify the pair inside an existing container fragment: expand
    /// sentinel is the container's first child, contract the last, sizing
    /// child the expand sentinel's first child.
    pub fn adopt(dom: &dyn DomHost, container: NodeKey) -> Result<Self> {
        let Some(expand) = dom.first_child(container) else {
            bail!("sentinel container has no children");
        };
        let Some(contract) = dom.last_child(container) else {
            bail!("sentinel container has no children");
        };
        if expand == contract {
            bail!("sentinel container is missing its contract sentinel");
        }
        let Some(sizing) = dom.first_child(expand) else {
            bail!("expand sentinel has no sizing child");
        };
        Ok(Self {
            container,
            expand,
            contract,
            sizing,
        })
    }

    /// Locate or build the pair for `parent`, never duplicating it: a live
    /// registry entry wins, then an existing container found by marker
    /// class, then a fresh fragment appended to `parent`.
    pub fn ensure(
        dom: &dyn DomHost,
        registry: &DetectorRegistry,
        parent: NodeKey,
    ) -> Result<Self> {
        if let Some(pair) = registry.lookup_pair(parent) {
            trace!("reusing registered sentinel pair for {parent:?}");
            return Ok(pair);
        }
        if let Some(container) = dom.query_class(parent, template::TRIGGER_CONTAINER_CLASS) {
            trace!("adopting sentinel container found under {parent:?}");
            return Self::adopt(dom, container);
        }
        let container = template::instantiate(dom);
        dom.append_child(parent, container);
        Self::adopt(dom, container)
    }

    /// Pin both sentinels at their maximum scroll offsets and refresh the
    /// sizing child. Must run synchronously inside scroll handling so an
    /// immediately following resize still produces a correction. The host
    /// clamps the written offsets to the true maximums.
    pub fn reset(&self, dom: &dyn DomHost) {
        let contract_extent = dom.scroll_extent(self.contract);
        dom.set_scroll_offset(
            self.contract,
            ScrollOffset::new(contract_extent.width, contract_extent.height),
        );

        let expand_box = dom.offset_size(self.expand);
        dom.set_px_size(
            self.sizing,
            BoxSize::new(expand_box.width + 1, expand_box.height + 1),
        );

        let expand_extent = dom.scroll_extent(self.expand);
        dom.set_scroll_offset(
            self.expand,
            ScrollOffset::new(expand_extent.width, expand_extent.height),
        );
        trace!(
            "sentinels reset: expand extent {expand_extent:?}, contract extent {contract_extent:?}"
        );
    }
}
