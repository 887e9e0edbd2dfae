// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree structure: node storage, hierarchy edits, z-order.

use alloc::vec::Vec;

use kurbo::Rect;
use smallvec::SmallVec;

use bracken_lock::LockSlots;
use bracken_touch::Touch;

use crate::types::{CanTouchFn, NodeConfig, NodeHooks, NodeId, PromotedFn, TouchableNode, TouchedFn};

pub(crate) struct Node {
    pub(crate) generation: u32,
    pub(crate) parent: Option<NodeId>,
    /// Z-order sequence: topmost is last.
    pub(crate) children: SmallVec<[NodeId; 8]>,
    pub(crate) bounds: Rect,
    pub(crate) enabled: bool,
    pub(crate) config: NodeConfig,
    pub(crate) hooks: NodeHooks,
    pub(crate) locks: LockSlots<NodeId>,
}

impl Node {
    fn new(generation: u32, local: TouchableNode) -> Self {
        Self {
            generation,
            parent: None,
            children: SmallVec::new(),
            bounds: local.bounds,
            enabled: local.enabled,
            config: local.config,
            hooks: NodeHooks::default(),
            locks: LockSlots::new(),
        }
    }
}

/// Tree of touchable nodes.
///
/// Nodes live in a generational arena: a [`NodeId`] of a removed node goes
/// stale and read accessors answer it with `None`. Children form the z-order
/// within their parent, topmost last; dispatch tries them topmost first.
///
/// All mutation, including every lock-slot and z-order write performed
/// during [`Tree::dispatch`](crate::Tree::dispatch), goes through `&mut
/// self`. Callers that deliver samples for different users concurrently must
/// serialize through their own lock around the tree; within one dispatch
/// call nothing else can mutate child lists or lock slots.
///
/// ## Example
///
/// ```rust
/// use bracken_dispatch::{TouchableNode, Tree};
/// use bracken_touch::{Sessions, Touch, TouchPhase};
/// use kurbo::{Point, Rect};
///
/// let mut tree = Tree::new();
/// let root = tree.insert(
///     None,
///     TouchableNode {
///         bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
///         ..TouchableNode::default()
///     },
/// );
/// let button = tree.insert(
///     Some(root),
///     TouchableNode {
///         bounds: Rect::new(10.0, 10.0, 50.0, 30.0),
///         ..TouchableNode::default()
///     },
/// );
///
/// let mut sessions = Sessions::new(1);
/// let session = sessions.begin(0);
/// let mut touch = Touch::new(Point::new(20.0, 20.0), TouchPhase::Begin, session);
/// assert!(tree.dispatch(root, &mut touch, &mut sessions, 0));
/// assert_eq!(sessions.begin_node(session), Some(button));
/// ```
#[derive(Default)]
pub struct Tree {
    /// slots
    pub(crate) nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    pub(crate) can_touch_hook: Option<CanTouchFn>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("can_touch_hook", &self.can_touch_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            can_touch_hook: None,
        }
    }

    /// Insert a new node as the topmost child of `parent` (or as a root if
    /// `None`).
    pub fn insert(&mut self, parent: Option<NodeId>, local: TouchableNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove a node and its subtree. The ids become stale immediately.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        let children: SmallVec<[NodeId; 8]> = self.node(id).children.clone();
        for child in children {
            self.remove(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Reparent `id` under `new_parent` (topmost), or detach it into a root.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        match self.nodes.get(id.idx()) {
            Some(Some(n)) => n.generation == id.1,
            _ => false,
        }
    }

    /// Bounds of a live node, in its parent's local frame.
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.bounds)
    }

    /// Update a node's bounds. Stale ids are ignored.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(n) = self.node_opt_mut(id) {
            n.bounds = bounds;
        }
    }

    /// Whether a live node is enabled.
    pub fn enabled(&self, id: NodeId) -> Option<bool> {
        self.node_opt(id).map(|n| n.enabled)
    }

    /// Enable or disable a node. Disabled nodes are skipped entirely during
    /// dispatch, children included.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.enabled = enabled;
        }
    }

    /// Touch policy of a live node.
    pub fn config(&self, id: NodeId) -> Option<&NodeConfig> {
        self.node_opt(id).map(|n| &n.config)
    }

    /// Replace a node's touch policy.
    pub fn set_config(&mut self, id: NodeId, config: NodeConfig) {
        if let Some(n) = self.node_opt_mut(id) {
            n.config = config;
        }
    }

    /// Lock slots of a live node, for inspection.
    pub fn lock_slots(&self, id: NodeId) -> Option<&LockSlots<NodeId>> {
        self.node_opt(id).map(|n| &n.locks)
    }

    /// Install or clear a node's veto predicate.
    pub fn set_can_touch(&mut self, id: NodeId, hook: Option<CanTouchFn>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.hooks.can_touch = hook;
        }
    }

    /// Install or clear a node's consumption callback.
    pub fn set_on_touch(&mut self, id: NodeId, hook: Option<TouchedFn>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.hooks.on_touch = hook;
        }
    }

    /// Install or clear a node's post-promotion hook.
    pub fn set_on_promote(&mut self, id: NodeId, hook: Option<PromotedFn>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.hooks.on_promote = hook;
        }
    }

    /// Install or clear the tree-wide veto predicate, consulted before any
    /// per-node predicate.
    pub fn set_can_touch_hook(&mut self, hook: Option<CanTouchFn>) {
        self.can_touch_hook = hook;
    }

    /// Children of a live node in z-order, topmost last.
    pub fn children_of(&self, id: NodeId) -> Option<&[NodeId]> {
        self.node_opt(id).map(|n| n.children.as_slice())
    }

    /// Parent of a live node (`None` for roots and stale ids).
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Structural root of the tree `id` belongs to.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        let mut cur = id;
        while let Some(p) = self.node(cur).parent {
            cur = p;
        }
        Some(cur)
    }

    /// Move `id` to the end of its parent's child sequence (topmost).
    ///
    /// Returns true if the order changed; false for roots, stale ids, and
    /// nodes already topmost.
    pub fn bring_to_front(&mut self, id: NodeId) -> bool {
        match self.parent_of(id) {
            Some(parent) => self.promote(parent, id),
            None => false,
        }
    }

    pub(crate) fn promote(&mut self, parent: NodeId, child: NodeId) -> bool {
        let node = self.node_mut(parent);
        if node.children.last() == Some(&child) {
            return false;
        }
        match node.children.iter().position(|&c| c == child) {
            Some(pos) => {
                node.children.remove(pos);
                node.children.push(child);
                true
            }
            None => false,
        }
    }

    /// Path from `root` (exclusive) down to `target` (inclusive), or `None`
    /// when `root` is not an ancestor-or-self of `target`. Empty when they
    /// coincide.
    pub(crate) fn path_below(&self, root: NodeId, target: NodeId) -> Option<SmallVec<[NodeId; 8]>> {
        let mut path: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut cur = target;
        while cur != root {
            path.push(cur);
            cur = self.node(cur).parent?;
        }
        path.reverse();
        Some(path)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        let children = &mut self.node_mut(parent).children;
        if let Some(pos) = children.iter().position(|&c| c == id) {
            children.remove(pos);
        }
        self.node_mut(id).parent = None;
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .filter(|n| n.generation == id.1)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())
            .and_then(|slot| slot.as_mut())
            .filter(|n| n.generation == id.1)
    }

    /// Access a live node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a live node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    /// Tree-wide veto followed by the node's own predicate.
    pub(crate) fn can_touch(&self, id: NodeId, touch: &Touch) -> bool {
        if let Some(hook) = &self.can_touch_hook
            && !hook(id, touch)
        {
            return false;
        }
        let node = self.node(id);
        node.hooks.can_touch.as_ref().is_none_or(|f| f(id, touch))
    }
}
