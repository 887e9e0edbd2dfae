// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node lock configuration.

/// Where a node's lock attaches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LockLevel {
    /// The lock attaches to the accepting node itself.
    Own,
    /// The lock attaches to the structural root of the tree the node belongs
    /// to, claiming the whole tree for the gesture.
    Root,
}

/// How lock slots are shared across users.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LockKind {
    /// One slot shared by every session.
    Common,
    /// One slot per user index. Gestures by different users do not contend;
    /// successive gestures by the same user do.
    Personal,
}

/// Static lock policy declared on a node.
///
/// Locking is strictly opt-in: a node whose configuration carries no
/// `LockConfig` never creates or checks locks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LockConfig {
    /// Where the lock attaches.
    pub level: LockLevel,
    /// Shared or per-user slots.
    pub kind: LockKind,
    /// Grace delay in milliseconds. The lock stays effective this long after
    /// creation; an unsealed lock also self-expires after it.
    pub delay: u64,
}

impl LockConfig {
    /// Default grace delay in milliseconds.
    pub const DEFAULT_DELAY: u64 = 300;

    /// Create a configuration with the default delay.
    pub const fn new(level: LockLevel, kind: LockKind) -> Self {
        Self {
            level,
            kind,
            delay: Self::DEFAULT_DELAY,
        }
    }

    /// Override the grace delay.
    pub const fn with_delay(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }
}
