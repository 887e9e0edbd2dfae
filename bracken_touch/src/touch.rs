// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Touch samples and lifecycle phases.

use kurbo::Point;

use crate::session::SessionId;

/// Lifecycle phase of a touch sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// Initial contact.
    Begin,
    /// Continued contact with a position change.
    Moving,
    /// Release.
    End,
}

bitflags::bitflags! {
    /// Flag set over [`TouchPhase`], used by node policies to declare which
    /// phases are handled at a node's own level.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PhaseFlags: u8 {
        /// Handle [`TouchPhase::Begin`] samples.
        const BEGIN  = 0b0000_0001;
        /// Handle [`TouchPhase::Moving`] samples.
        const MOVING = 0b0000_0010;
        /// Handle [`TouchPhase::End`] samples.
        const END    = 0b0000_0100;
    }
}

impl TouchPhase {
    /// The [`PhaseFlags`] bit corresponding to this phase.
    pub const fn flag(self) -> PhaseFlags {
        match self {
            Self::Begin => PhaseFlags::BEGIN,
            Self::Moving => PhaseFlags::MOVING,
            Self::End => PhaseFlags::END,
        }
    }
}

/// A single input sample: one physical touch update.
///
/// Produced once per update by the input source and consumed during one
/// dispatch call. The position is expressed in the coordinate frame of the
/// node currently being considered; dispatch rebases it with
/// [`Touch::enter_frame`] and [`Touch::leave_frame`] as the traversal crosses
/// frame boundaries. Phase and session never change after construction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Touch {
    /// Position in the current node's local frame.
    pub position: Point,
    /// Lifecycle phase of this sample.
    pub phase: TouchPhase,
    /// The gesture this sample belongs to.
    pub session: SessionId,
}

impl Touch {
    /// Create a sample at `position` for `phase` within `session`.
    pub const fn new(position: Point, phase: TouchPhase, session: SessionId) -> Self {
        Self {
            position,
            phase,
            session,
        }
    }

    /// Rebase the position into a child frame whose origin is `origin` in the
    /// current frame.
    pub fn enter_frame(&mut self, origin: Point) {
        self.position -= origin.to_vec2();
    }

    /// Undo [`Touch::enter_frame`]: rebase the position back into the parent
    /// frame of a child whose origin is `origin` in that parent frame.
    pub fn leave_frame(&mut self, origin: Point) {
        self.position += origin.to_vec2();
    }
}
