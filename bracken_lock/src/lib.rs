// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bracken Lock: time-bounded exclusive claims on touchable nodes.
//!
//! ## Overview
//!
//! When a node accepts the Begin phase of a gesture it may install a
//! [`Lock`]: an exclusive, time-bounded claim that keeps other sessions (and
//! new gestures) from interacting with the node until the owning gesture ends
//! and a grace period elapses. This crate models the claim itself, the
//! per-node storage for claims ([`LockSlots`]), and the check that dispatch
//! runs before routing a sample into a node.
//!
//! ## Slot state machine
//!
//! Each slot moves through three states:
//!
//! - **Unlocked**: the slot is empty; every sample passes.
//! - **Held**: a gesture is in progress. Samples from the owning session pass
//!   (gesture continuity); Begin samples and samples from any other session
//!   are blocked.
//! - **Released**: the owning gesture's End has been observed
//!   ([`LockSlots::seal`]); the grace period is running and every sample is
//!   blocked.
//!
//! A slot leaves the Released (or Held) state lazily: the next check that
//! finds the grace period elapsed clears the slot and reports unlocked. There
//! is no timer; expiry is a data comparison against the caller-supplied
//! millisecond timestamp. This also self-heals a lock whose End sample was
//! lost.
//!
//! ## Explicit outcomes
//!
//! A blocked check returns [`LockCheck::Locked`] with a [`BlockReason`]. The
//! contract is that every blocked sample also disables its session
//! ([`LockCheck::disables_session`]) — but the disable is the caller's move,
//! visible at the call site, never a hidden side effect of the check.
//!
//! ## Configuration
//!
//! [`LockConfig`] declares, per node, where a claim attaches
//! ([`LockLevel::Own`] vs. [`LockLevel::Root`]), whether one slot is shared
//! across all users or each user index gets its own
//! ([`LockKind::Common`] vs. [`LockKind::Personal`]), and the grace delay.
//! Nodes without a configuration never create claims of their own, but a
//! structural root can still hold claims that descendants with
//! [`LockLevel::Root`] configurations installed into it; those are checked
//! with [`LockSlots::check_any`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod slots;

pub use config::{LockConfig, LockKind, LockLevel};
pub use slots::{BlockReason, Lock, LockCheck, LockSlots};
