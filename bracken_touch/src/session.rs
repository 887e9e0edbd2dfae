// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-user gesture sessions.

use alloc::vec::Vec;

/// Identifier of one continuous gesture.
///
/// The user index is stable across a user's gestures; the serial is unique
/// per gesture. Lock slots that arbitrate per user key on `user` alone, so a
/// new gesture by the same user contends with state the previous one left
/// behind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId {
    /// Stable user index, `0..max_users`.
    pub user: usize,
    /// Gesture serial, unique across all sessions of a [`Sessions`] table.
    pub serial: u64,
}

/// State of one user's current gesture.
///
/// Created by the input source at Begin and replaced wholesale when the next
/// gesture starts. The router only ever reads it, records the begin node, or
/// disables it.
#[derive(Clone, Debug)]
pub struct Session<K> {
    /// Identifier of this gesture.
    pub id: SessionId,
    /// False once the router has rejected this session at a lock; the input
    /// source must then stop delivering its samples.
    pub enabled: bool,
    /// The node that accepted this session's Begin sample, if any. Non-Begin
    /// samples route directly to it even when the position has left its
    /// bounds.
    pub begin_node: Option<K>,
}

/// Session table: one slot per user index, owned by the input source.
///
/// The generic `K` is the node key recorded as a session's begin node
/// (typically a tree's node id).
#[derive(Clone, Debug)]
pub struct Sessions<K> {
    slots: Vec<Option<Session<K>>>,
    next_serial: u64,
}

impl<K: Copy> Sessions<K> {
    /// Create a table with `max_users` user slots.
    pub fn new(max_users: usize) -> Self {
        Self {
            slots: (0..max_users).map(|_| None).collect(),
            next_serial: 0,
        }
    }

    /// Number of user slots.
    pub fn max_users(&self) -> usize {
        self.slots.len()
    }

    /// Start a new gesture for `user`, replacing any previous session state.
    ///
    /// The new session is enabled and has no begin node.
    ///
    /// # Panics
    ///
    /// Panics if `user` is not below [`Sessions::max_users`].
    pub fn begin(&mut self, user: usize) -> SessionId {
        assert!(
            user < self.slots.len(),
            "user index {user} out of range for session table"
        );
        self.next_serial += 1;
        let id = SessionId {
            user,
            serial: self.next_serial,
        };
        self.slots[user] = Some(Session {
            id,
            enabled: true,
            begin_node: None,
        });
        id
    }

    /// End `user`'s current gesture, clearing its slot.
    pub fn end(&mut self, user: usize) {
        if let Some(slot) = self.slots.get_mut(user) {
            *slot = None;
        }
    }

    /// The current session for `user`, if one is active.
    pub fn get(&self, user: usize) -> Option<&Session<K>> {
        self.slots.get(user).and_then(|s| s.as_ref())
    }

    /// Whether `id` is the current session for its user and still enabled.
    ///
    /// A stale id (an older gesture's serial) reports `false`.
    pub fn is_enabled(&self, id: SessionId) -> bool {
        self.current(id).is_some_and(|s| s.enabled)
    }

    /// The begin node recorded for `id`, if `id` is current and one was
    /// recorded.
    pub fn begin_node(&self, id: SessionId) -> Option<K> {
        self.current(id).and_then(|s| s.begin_node)
    }

    /// Disable `id`'s session. Monotonic: nothing in the router re-enables a
    /// session; only [`Sessions::begin`] produces an enabled one. Stale ids
    /// are ignored.
    pub fn disable(&mut self, id: SessionId) {
        if let Some(s) = self.current_mut(id) {
            s.enabled = false;
        }
    }

    /// Record `node` as the begin node for `id`.
    ///
    /// Overwrites any earlier recording: when a Begin sample falls through a
    /// declining node to a lower one, the node that finally handles it is the
    /// one that sticks. Stale ids are ignored.
    pub fn set_begin_node(&mut self, id: SessionId, node: K) {
        if let Some(s) = self.current_mut(id) {
            s.begin_node = Some(node);
        }
    }

    fn current(&self, id: SessionId) -> Option<&Session<K>> {
        self.get(id.user).filter(|s| s.id == id)
    }

    fn current_mut(&mut self, id: SessionId) -> Option<&mut Session<K>> {
        self.slots
            .get_mut(id.user)
            .and_then(|s| s.as_mut())
            .filter(|s| s.id == id)
    }
}
