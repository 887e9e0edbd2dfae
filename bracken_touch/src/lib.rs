// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bracken Touch: touch samples and per-user gesture sessions.
//!
//! ## Overview
//!
//! This crate defines the input-side vocabulary of the Bracken router:
//!
//! - [`Touch`]: one immutable-per-delivery input sample — a position, a
//!   lifecycle [`TouchPhase`], and the [`SessionId`] of the gesture it belongs
//!   to. Only the position mutates, and only while the sample is rebased
//!   across coordinate frames during dispatch
//!   ([`Touch::enter_frame`] / [`Touch::leave_frame`]).
//! - [`Session`] / [`Sessions`]: per-user gesture state owned by the input
//!   source. A session spans one continuous gesture from Begin through End;
//!   the router reads it (begin-node affinity) and may disable it (lock
//!   contention), but never creates or re-enables one.
//! - [`PhaseFlags`]: a flag set over [`TouchPhase`] used by per-node policies
//!   to declare which phases a node handles.
//!
//! ## Sessions and users
//!
//! A [`SessionId`] pairs a stable user index with a gesture serial. Two
//! gestures by the same user share the user index but never the serial, so
//! state keyed on the full id cannot leak between gestures, while state that
//! deliberately keys on the user index alone (personal lock slots) contends
//! across them.
//!
//! Disabling is monotonic within a session: once the router disables a
//! session, the input source must stop delivering samples for it until it
//! starts a new session with [`Sessions::begin`].
//!
//! ## Timestamps
//!
//! This crate carries no clock. Time-sensitive consumers take millisecond
//! timestamps as plain `u64` parameters alongside the sample.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod session;
mod touch;

pub use session::{Session, SessionId, Sessions};
pub use touch::{PhaseFlags, Touch, TouchPhase};
