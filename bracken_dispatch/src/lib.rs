// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bracken Dispatch: a touchable node tree with multi-user routing and lock
//! arbitration.
//!
//! ## Overview
//!
//! A [`Tree`] holds nodes in a generational arena. Each node carries bounds
//! in its parent's local frame, an enabled flag, a [`NodeConfig`] declaring
//! its touch policy, and optional hook closures attached after insertion.
//! Children form the z-order within their parent, topmost last.
//!
//! [`Tree::dispatch`] routes one [`Touch`](bracken_touch::Touch) sample into
//! the tree. A Begin sample walks top-down: every visited node runs its lock
//! check, then its veto hooks, then offers the sample to children topmost
//! first, and handles it at its own level only when no child consumed it.
//! The position is rebased into each node's local frame along the way. Later
//! phases of a session that recorded a begin node skip the walk and route
//! straight to that node, so a drag keeps its target even after leaving its
//! bounds.
//!
//! Node behavior is configuration plus closures, not a type hierarchy:
//! a slider is a node whose config declares Moving handling and an own-level
//! lock, with an `on_touch` closure that updates the value.
//!
//! Lock semantics live in [`bracken_lock`]; sessions and samples in
//! [`bracken_touch`]. This crate wires them to the tree: it applies the
//! session disable a blocked check reports, installs claims at the accepting
//! node or at the dispatch root per [`LockConfig`](bracken_lock::LockConfig),
//! and seals claims when an End sample completes.
//!
//! The tree is not thread-safe by itself; callers that dispatch from several
//! threads serialize through their own lock, and `&mut Tree` makes any other
//! discipline a compile error.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod dispatch;
mod tree;
mod types;

pub use tree::Tree;
pub use types::{CanTouchFn, NodeConfig, NodeHooks, NodeId, PromotedFn, TouchableNode, TouchedFn};
