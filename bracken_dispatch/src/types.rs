// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the touchable tree: node identifiers, per-node policy,
//! and hook closures.

use alloc::boxed::Box;
use kurbo::Rect;

use bracken_lock::LockConfig;
use bracken_touch::{PhaseFlags, Touch};

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Per-node touch policy.
///
/// Declared as data rather than behavior: node "kinds" are a configuration
/// plus installed [`NodeHooks`], not a type hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    /// Which phases this node handles at its own level. A node with no
    /// phases never accepts samples itself but still forwards to children.
    pub phases: PhaseFlags,
    /// Require that non-Begin samples belong to a session whose recorded
    /// begin node is exactly this node.
    pub begin_affinity: bool,
    /// Promote a child to topmost when it consumes a sample.
    pub promote_on_touch: bool,
    /// Lock policy, if this node arbitrates exclusive claims. `None` means
    /// this node never creates claims.
    pub lock: Option<LockConfig>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            phases: PhaseFlags::BEGIN,
            begin_affinity: false,
            promote_on_touch: false,
            lock: None,
        }
    }
}

/// Per-node veto predicate, consulted after the tree-wide hook.
pub type CanTouchFn = Box<dyn Fn(NodeId, &Touch) -> bool>;

/// Consumption callback: invoked when a node handles a sample at its own
/// level; its return value is the consumption outcome.
pub type TouchedFn = Box<dyn FnMut(NodeId, &Touch) -> bool>;

/// Invoked on a parent after one of its children was promoted to topmost.
pub type PromotedFn = Box<dyn FnMut(NodeId)>;

/// Optional behavior attached to a node.
///
/// Every hook is independent; a node with none behaves as pure policy data:
/// no veto, consumed-by-default, silent promotion.
#[derive(Default)]
pub struct NodeHooks {
    /// Per-node veto predicate; `false` rejects the sample at this node.
    pub can_touch: Option<CanTouchFn>,
    /// Consumption callback. Absent means a handled sample is consumed.
    pub on_touch: Option<TouchedFn>,
    /// Post-promotion hook, called with the promoted child.
    pub on_promote: Option<PromotedFn>,
}

impl core::fmt::Debug for NodeHooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeHooks")
            .field("can_touch", &self.can_touch.is_some())
            .field("on_touch", &self.on_touch.is_some())
            .field("on_promote", &self.on_promote.is_some())
            .finish()
    }
}

/// Insert payload for a node: geometry, enabled state, and policy.
///
/// Bounds are expressed in the parent's local frame; containment tests and
/// coordinate rebasing during dispatch both run against them. Hooks are
/// attached after insertion via the tree's hook setters.
#[derive(Clone, Debug)]
pub struct TouchableNode {
    /// Bounds in the parent's local frame.
    pub bounds: Rect,
    /// Disabled nodes are skipped entirely during dispatch.
    pub enabled: bool,
    /// Touch policy.
    pub config: NodeConfig,
}

impl Default for TouchableNode {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            enabled: true,
            config: NodeConfig::default(),
        }
    }
}
