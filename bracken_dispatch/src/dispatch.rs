// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing touch samples through the tree.

use bracken_lock::{Lock, LockCheck, LockLevel};
use bracken_touch::{Sessions, Touch, TouchPhase};
use smallvec::SmallVec;

use crate::tree::Tree;
use crate::types::NodeId;

impl Tree {
    /// Route one sample into the tree rooted at `root`.
    ///
    /// `touch.position` must be in `root`'s local frame. Returns whether the
    /// sample was consumed; a sample blocked by a lock counts as consumed,
    /// and its session has been disabled in `sessions` by the time this
    /// returns.
    ///
    /// Begin samples walk the tree: at each node the lock check runs first,
    /// then the veto hooks, then children topmost first, and the node itself
    /// only handles the sample when no child consumed it. Later phases of a
    /// session that recorded a begin node skip the walk and route straight to
    /// that node, wherever the position has wandered; the walk is the
    /// fallback when the begin node has been removed, disabled, or is not
    /// under `root`.
    ///
    /// `now` is a millisecond timestamp; it orders lock creation against
    /// expiry and nothing else.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale or disabled. The input source owns the
    /// lifetime of root nodes it delivers into and is expected to not
    /// dispatch into one it has removed.
    pub fn dispatch(
        &mut self,
        root: NodeId,
        touch: &mut Touch,
        sessions: &mut Sessions<NodeId>,
        now: u64,
    ) -> bool {
        assert!(self.is_alive(root), "dispatch on a stale node id");
        assert!(
            self.enabled(root) == Some(true),
            "dispatch on a disabled node"
        );

        if touch.phase != TouchPhase::Begin
            && let Some(target) = sessions.begin_node(touch.session)
            && self.is_alive(target)
            && self.enabled(target) == Some(true)
            && let Some(path) = self.path_below(root, target)
        {
            for &id in &path {
                let origin = self.node(id).bounds.origin();
                touch.enter_frame(origin);
            }
            return self.dispatch_direct(target, root, &path, touch, sessions, now);
        }
        self.dispatch_node(root, root, touch, sessions, now)
    }

    /// The walk: lock check, veto, children topmost first, then this node.
    ///
    /// `root` is the entry node of the enclosing [`Tree::dispatch`] call; it
    /// is where root-level lock configurations install their claims.
    fn dispatch_node(
        &mut self,
        id: NodeId,
        root: NodeId,
        touch: &mut Touch,
        sessions: &mut Sessions<NodeId>,
        now: u64,
    ) -> bool {
        if self.check_lock(id, touch, sessions, now).is_locked() {
            // The lock swallows the sample.
            return true;
        }
        if !self.can_touch(id, touch) {
            return false;
        }

        let mut used = self.dispatch_children(id, root, touch, sessions, now);
        if !used && self.can_touch_this(id, touch, sessions) {
            used = self.touch_this(id, root, touch, sessions, now);
        }

        if touch.phase == TouchPhase::End {
            self.node_mut(id).locks.seal(touch.session.user);
        }
        used
    }

    /// Offer the sample to `id`'s children, topmost first, stopping at the
    /// first consumer.
    ///
    /// The position is rebased into each candidate's frame before recursing
    /// and restored when the candidate declines. A consuming child of a node
    /// with promote-on-touch is raised to topmost.
    fn dispatch_children(
        &mut self,
        id: NodeId,
        root: NodeId,
        touch: &mut Touch,
        sessions: &mut Sessions<NodeId>,
        now: u64,
    ) -> bool {
        let children: SmallVec<[NodeId; 8]> = self.node(id).children.clone();
        for &child in children.iter().rev() {
            let node = self.node(child);
            if !node.enabled || !node.bounds.contains(touch.position) {
                continue;
            }
            let origin = node.bounds.origin();
            touch.enter_frame(origin);
            if self.dispatch_node(child, root, touch, sessions, now) {
                if self.node(id).config.promote_on_touch
                    && self.promote(id, child)
                    && let Some(hook) = &mut self.node_mut(id).hooks.on_promote
                {
                    hook(child);
                }
                return true;
            }
            touch.leave_frame(origin);
        }
        false
    }

    /// Run the lock check for `id` and apply the disable it reports.
    ///
    /// A node with a lock configuration checks the slot that configuration
    /// selects; a node without one checks any slot a descendant's root-level
    /// claim may occupy.
    fn check_lock(
        &mut self,
        id: NodeId,
        touch: &Touch,
        sessions: &mut Sessions<NodeId>,
        now: u64,
    ) -> LockCheck {
        let node = self.node_mut(id);
        let check = match node.config.lock {
            Some(config) => node.locks.check(&config, touch, now),
            None => node.locks.check_any(touch, now),
        };
        if check.disables_session() {
            sessions.disable(touch.session);
        }
        check
    }

    /// Whether `id` handles this sample at its own level: the phase must be
    /// declared, and under begin affinity a non-Begin sample must belong to a
    /// session that began exactly here.
    fn can_touch_this(&self, id: NodeId, touch: &Touch, sessions: &Sessions<NodeId>) -> bool {
        let config = &self.node(id).config;
        if !config.phases.contains(touch.phase.flag()) {
            return false;
        }
        touch.phase == TouchPhase::Begin
            || !config.begin_affinity
            || sessions.begin_node(touch.session) == Some(id)
    }

    /// Handle the sample at `id` itself: record the begin node, install a
    /// fresh claim if configured, and let the consumption callback decide the
    /// outcome.
    ///
    /// The claim is reinstalled on every accepted phase, so an End refreshes
    /// it just before [`LockSlots::seal`](bracken_lock::LockSlots::seal)
    /// marks it released and the grace period runs from the End, not from
    /// the Begin.
    fn touch_this(
        &mut self,
        id: NodeId,
        root: NodeId,
        touch: &Touch,
        sessions: &mut Sessions<NodeId>,
        now: u64,
    ) -> bool {
        if touch.phase == TouchPhase::Begin {
            sessions.set_begin_node(touch.session, id);
        }
        if let Some(config) = self.node(id).config.lock {
            let lock = Lock::new(id, *touch, now, config.delay);
            let target = match config.level {
                LockLevel::Own => id,
                LockLevel::Root => root,
            };
            self.node_mut(target).locks.install(&config, lock);
        }
        match &mut self.node_mut(id).hooks.on_touch {
            Some(hook) => hook(id, touch),
            None => true,
        }
    }

    /// The direct route for later phases of a session with a live begin node.
    ///
    /// `path` runs from below `root` down to `target`; the position has
    /// already been rebased into `target`'s frame. Lock check and vetoes
    /// still apply at the target, and an End seals the slots of every node
    /// on the path plus `root`, mirroring what the walk would have touched.
    fn dispatch_direct(
        &mut self,
        target: NodeId,
        root: NodeId,
        path: &[NodeId],
        touch: &mut Touch,
        sessions: &mut Sessions<NodeId>,
        now: u64,
    ) -> bool {
        if self.check_lock(target, touch, sessions, now).is_locked() {
            return true;
        }
        if !self.can_touch(target, touch) {
            return false;
        }

        let mut used = false;
        if self.can_touch_this(target, touch, sessions) {
            used = self.touch_this(target, root, touch, sessions, now);
        }

        if touch.phase == TouchPhase::End {
            let user = touch.session.user;
            self.node_mut(root).locks.seal(user);
            for &id in path {
                self.node_mut(id).locks.seal(user);
            }
        }
        used
    }
}
