// Copyright 2025 the Bracken Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lock records, per-node slot storage, and the lock check.

use alloc::vec::Vec;

use bracken_touch::{Touch, TouchPhase};

use crate::config::{LockConfig, LockKind};

/// A time-bounded exclusive claim on a node.
///
/// Installed when a node accepts a Begin sample, and replaced wholesale on
/// the next accepted Begin. Only [`Lock::released`] mutates after creation.
///
/// The generic `K` is the node key of the node that installed the claim,
/// which for a root-level configuration is not the node the claim decorates.
#[derive(Clone, Debug)]
pub struct Lock<K> {
    /// The node whose acceptance installed this claim.
    pub holder: K,
    /// The sample that created the claim. Its session decides which later
    /// samples pass as gesture continuity.
    pub touch: Touch,
    /// Creation timestamp, milliseconds.
    pub created: u64,
    /// Grace delay in milliseconds, copied from the installing configuration.
    pub delay: u64,
    /// True once the owning gesture's End has been observed; from then on the
    /// grace period blocks every sample until expiry.
    pub released: bool,
}

impl<K> Lock<K> {
    /// Create a claim held by `holder` for the gesture of `touch`.
    pub const fn new(holder: K, touch: Touch, created: u64, delay: u64) -> Self {
        Self {
            holder,
            touch,
            created,
            delay,
            released: false,
        }
    }

    /// Whether the grace period has elapsed at `now`.
    pub const fn expired(&self, now: u64) -> bool {
        now.saturating_sub(self.created) > self.delay
    }
}

/// Why a lock check blocked a sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockReason {
    /// The owning gesture has ended; the grace period blocks everything.
    Released,
    /// Begin samples never pass a held slot, not even from the owning
    /// session.
    BeginWhileHeld,
    /// The sample belongs to a different session than the one holding the
    /// slot.
    ForeignSession,
}

/// Outcome of a lock check.
///
/// The disable that accompanies a blocked sample is deliberately an
/// out-value: [`LockSlots::check`] reports it and the dispatcher applies it,
/// so call sites and tests can observe exactly when and why a session was
/// shut off.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LockCheck {
    /// The sample may proceed.
    Unlocked,
    /// The sample is blocked and its session must be disabled.
    Locked(BlockReason),
}

impl LockCheck {
    /// Whether the sample was blocked.
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked(_))
    }

    /// Whether the caller must disable the sample's session. True for every
    /// blocked sample.
    pub const fn disables_session(self) -> bool {
        self.is_locked()
    }

    /// The block reason, if blocked.
    pub const fn reason(self) -> Option<BlockReason> {
        match self {
            Self::Unlocked => None,
            Self::Locked(reason) => Some(reason),
        }
    }
}

/// Per-node lock storage: one common slot plus per-user personal slots.
///
/// The personal vector grows lazily to the highest user index that installs
/// a claim, bounded in practice by the session table's user count. A slot is
/// exclusively owned by its node; the one sanctioned cross-node write is a
/// descendant installing a root-level claim into its structural root's
/// slots, which dispatch performs through the same exclusive tree borrow as
/// every other slot access.
#[derive(Clone, Debug, Default)]
pub struct LockSlots<K> {
    common: Option<Lock<K>>,
    personal: Vec<Option<Lock<K>>>,
}

impl<K> LockSlots<K> {
    /// Create empty storage.
    pub const fn new() -> Self {
        Self {
            common: None,
            personal: Vec::new(),
        }
    }

    /// The common slot, if occupied.
    pub fn common(&self) -> Option<&Lock<K>> {
        self.common.as_ref()
    }

    /// The personal slot for `user`, if occupied.
    pub fn personal(&self, user: usize) -> Option<&Lock<K>> {
        self.personal.get(user).and_then(|s| s.as_ref())
    }

    /// Check `touch` against the slot selected by `config`.
    ///
    /// An occupied slot whose grace period has elapsed at `now` is cleared
    /// and reported unlocked; re-checking is idempotent. An occupied,
    /// unexpired slot blocks when it is released, when the sample's phase is
    /// Begin, or when the sample's session differs from the holder's.
    /// Otherwise the owning gesture continues unhindered.
    pub fn check(&mut self, config: &LockConfig, touch: &Touch, now: u64) -> LockCheck {
        let slot = match config.kind {
            LockKind::Common => &mut self.common,
            LockKind::Personal => match self.personal.get_mut(touch.session.user) {
                Some(slot) => slot,
                None => return LockCheck::Unlocked,
            },
        };
        Self::check_slot(slot, touch, now)
    }

    /// Check `touch` against every slot a claim could occupy, without a
    /// configuration to select one.
    ///
    /// This is the check a node performs when it carries no lock
    /// configuration of its own but may hold claims that descendants with
    /// root-level configurations installed into it. The common slot is
    /// consulted first, then the personal slot for the sample's user; the
    /// first blocked slot wins. Expired slots are cleared along the way, as
    /// in [`LockSlots::check`]. With every slot empty this always reports
    /// unlocked.
    pub fn check_any(&mut self, touch: &Touch, now: u64) -> LockCheck {
        for slot in [&mut self.common]
            .into_iter()
            .chain(self.personal.get_mut(touch.session.user))
        {
            let check = Self::check_slot(slot, touch, now);
            if check.is_locked() {
                return check;
            }
        }
        LockCheck::Unlocked
    }

    /// Check one slot: clear it when expired, otherwise apply the blocking
    /// rules against the sample.
    fn check_slot(slot: &mut Option<Lock<K>>, touch: &Touch, now: u64) -> LockCheck {
        let Some(lock) = slot else {
            return LockCheck::Unlocked;
        };
        if lock.expired(now) {
            *slot = None;
            return LockCheck::Unlocked;
        }
        if lock.released {
            LockCheck::Locked(BlockReason::Released)
        } else if touch.phase == TouchPhase::Begin {
            LockCheck::Locked(BlockReason::BeginWhileHeld)
        } else if touch.session != lock.touch.session {
            LockCheck::Locked(BlockReason::ForeignSession)
        } else {
            LockCheck::Unlocked
        }
    }

    /// Install `lock` into the slot selected by `config`, replacing any
    /// previous claim wholesale.
    ///
    /// The slot and the check must agree: a personal configuration installs
    /// into the personal slot of the lock's own user.
    pub fn install(&mut self, config: &LockConfig, lock: Lock<K>) {
        match config.kind {
            LockKind::Common => self.common = Some(lock),
            LockKind::Personal => {
                let user = lock.touch.session.user;
                if self.personal.len() <= user {
                    self.personal.resize_with(user + 1, || None);
                }
                self.personal[user] = Some(lock);
            }
        }
    }

    /// Mark occupied slots as released: the common slot and the personal slot
    /// for `user`.
    ///
    /// Called after the full dispatch of an End sample reaches back to the
    /// node owning these slots. Session identity is not checked; a foreign
    /// End would have been blocked earlier by [`LockSlots::check`] wherever a
    /// lock configuration guards the node.
    pub fn seal(&mut self, user: usize) {
        if let Some(lock) = &mut self.common {
            lock.released = true;
        }
        if let Some(Some(lock)) = self.personal.get_mut(user) {
            lock.released = true;
        }
    }

    /// Clear every slot.
    pub fn clear(&mut self) {
        self.common = None;
        self.personal.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockLevel;
    use bracken_touch::SessionId;
    use kurbo::Point;

    fn touch(user: usize, serial: u64, phase: TouchPhase) -> Touch {
        Touch::new(Point::ZERO, phase, SessionId { user, serial })
    }

    fn held_common(slots: &mut LockSlots<u32>, config: &LockConfig, user: usize, now: u64) {
        let begin = touch(user, 1, TouchPhase::Begin);
        slots.install(config, Lock::new(9, begin, now, config.delay));
    }

    #[test]
    fn empty_slots_never_lock() {
        let config = LockConfig::new(LockLevel::Own, LockKind::Common);
        let mut slots: LockSlots<u32> = LockSlots::new();
        assert_eq!(
            slots.check(&config, &touch(0, 1, TouchPhase::Begin), 0),
            LockCheck::Unlocked
        );
        let personal = LockConfig::new(LockLevel::Own, LockKind::Personal);
        assert_eq!(
            slots.check(&personal, &touch(5, 1, TouchPhase::Moving), 0),
            LockCheck::Unlocked
        );
    }

    #[test]
    fn owning_session_continues_but_begin_blocks() {
        let config = LockConfig::new(LockLevel::Own, LockKind::Common);
        let mut slots: LockSlots<u32> = LockSlots::new();
        held_common(&mut slots, &config, 0, 1000);

        assert_eq!(
            slots.check(&config, &touch(0, 1, TouchPhase::Moving), 1010),
            LockCheck::Unlocked
        );
        assert_eq!(
            slots.check(&config, &touch(0, 1, TouchPhase::End), 1020),
            LockCheck::Unlocked
        );
        assert_eq!(
            slots.check(&config, &touch(0, 1, TouchPhase::Begin), 1030),
            LockCheck::Locked(BlockReason::BeginWhileHeld)
        );
    }

    #[test]
    fn foreign_session_blocks_any_phase() {
        let config = LockConfig::new(LockLevel::Own, LockKind::Common);
        let mut slots: LockSlots<u32> = LockSlots::new();
        held_common(&mut slots, &config, 0, 1000);

        // Different user.
        let check = slots.check(&config, &touch(1, 2, TouchPhase::Moving), 1010);
        assert_eq!(check, LockCheck::Locked(BlockReason::ForeignSession));
        assert!(check.disables_session());

        // Same user, new gesture serial.
        assert_eq!(
            slots.check(&config, &touch(0, 2, TouchPhase::Moving), 1010),
            LockCheck::Locked(BlockReason::ForeignSession)
        );
    }

    #[test]
    fn released_blocks_everything() {
        let config = LockConfig::new(LockLevel::Own, LockKind::Common);
        let mut slots: LockSlots<u32> = LockSlots::new();
        held_common(&mut slots, &config, 0, 1000);
        slots.seal(0);

        assert_eq!(
            slots.check(&config, &touch(0, 1, TouchPhase::Moving), 1010),
            LockCheck::Locked(BlockReason::Released)
        );
        assert_eq!(
            slots.check(&config, &touch(0, 1, TouchPhase::End), 1010),
            LockCheck::Locked(BlockReason::Released)
        );
    }

    #[test]
    fn expiry_clears_slot_and_recheck_is_idempotent() {
        let config = LockConfig::new(LockLevel::Own, LockKind::Common).with_delay(300);
        let mut slots: LockSlots<u32> = LockSlots::new();
        held_common(&mut slots, &config, 0, 1000);
        slots.seal(0);

        // Exactly at the delay the lock is still effective.
        assert!(
            slots
                .check(&config, &touch(0, 1, TouchPhase::Moving), 1300)
                .is_locked()
        );
        // Strictly past it the slot self-clears.
        assert_eq!(
            slots.check(&config, &touch(0, 1, TouchPhase::Moving), 1301),
            LockCheck::Unlocked
        );
        assert!(slots.common().is_none());
        assert_eq!(
            slots.check(&config, &touch(0, 1, TouchPhase::Moving), 1302),
            LockCheck::Unlocked
        );
    }

    #[test]
    fn personal_slots_do_not_contend_across_users() {
        let config = LockConfig::new(LockLevel::Own, LockKind::Personal);
        let mut slots: LockSlots<u32> = LockSlots::new();
        let begin = touch(2, 1, TouchPhase::Begin);
        slots.install(&config, Lock::new(9, begin, 1000, config.delay));

        assert!(slots.personal(2).is_some());
        assert!(slots.common().is_none());

        // A different user's Begin passes: it checks its own empty slot.
        assert_eq!(
            slots.check(&config, &touch(0, 2, TouchPhase::Begin), 1010),
            LockCheck::Unlocked
        );
        // A new gesture by the same user contends with the held slot.
        assert_eq!(
            slots.check(&config, &touch(2, 3, TouchPhase::Begin), 1010),
            LockCheck::Locked(BlockReason::BeginWhileHeld)
        );
    }

    #[test]
    fn personal_expiry_clears_only_that_user() {
        let config = LockConfig::new(LockLevel::Own, LockKind::Personal).with_delay(100);
        let mut slots: LockSlots<u32> = LockSlots::new();
        slots.install(
            &config,
            Lock::new(9, touch(0, 1, TouchPhase::Begin), 1000, config.delay),
        );
        slots.install(
            &config,
            Lock::new(9, touch(1, 2, TouchPhase::Begin), 1500, config.delay),
        );

        assert_eq!(
            slots.check(&config, &touch(0, 3, TouchPhase::Begin), 1200),
            LockCheck::Unlocked
        );
        assert!(slots.personal(0).is_none());
        assert!(slots.personal(1).is_some());
    }

    #[test]
    fn seal_flips_common_and_users_personal_slot() {
        let common = LockConfig::new(LockLevel::Own, LockKind::Common);
        let personal = LockConfig::new(LockLevel::Own, LockKind::Personal);
        let mut slots: LockSlots<u32> = LockSlots::new();
        slots.install(&common, Lock::new(9, touch(0, 1, TouchPhase::Begin), 0, 300));
        slots.install(
            &personal,
            Lock::new(9, touch(0, 1, TouchPhase::Begin), 0, 300),
        );
        slots.install(
            &personal,
            Lock::new(9, touch(1, 2, TouchPhase::Begin), 0, 300),
        );

        slots.seal(0);
        assert!(slots.common().is_some_and(|l| l.released));
        assert!(slots.personal(0).is_some_and(|l| l.released));
        assert!(slots.personal(1).is_some_and(|l| !l.released));
    }

    #[test]
    fn check_any_sees_descendant_installed_claims() {
        // A root without its own configuration holds claims installed by
        // descendants with root-level configurations.
        let mut slots: LockSlots<u32> = LockSlots::new();
        assert_eq!(
            slots.check_any(&touch(0, 1, TouchPhase::Begin), 0),
            LockCheck::Unlocked
        );

        let common = LockConfig::new(LockLevel::Root, LockKind::Common);
        slots.install(&common, Lock::new(7, touch(0, 1, TouchPhase::Begin), 1000, 300));

        assert_eq!(
            slots.check_any(&touch(1, 2, TouchPhase::Begin), 1010),
            LockCheck::Locked(BlockReason::BeginWhileHeld)
        );
        assert_eq!(
            slots.check_any(&touch(0, 1, TouchPhase::Moving), 1010),
            LockCheck::Unlocked
        );
        // Expiry self-heals here too.
        assert_eq!(
            slots.check_any(&touch(1, 2, TouchPhase::Begin), 1301),
            LockCheck::Unlocked
        );
        assert!(slots.common().is_none());
    }

    #[test]
    fn check_any_consults_personal_slot_for_the_samples_user() {
        let personal = LockConfig::new(LockLevel::Root, LockKind::Personal);
        let mut slots: LockSlots<u32> = LockSlots::new();
        slots.install(
            &personal,
            Lock::new(7, touch(1, 1, TouchPhase::Begin), 1000, 300),
        );

        // Another user's sample only sees its own empty personal slot.
        assert_eq!(
            slots.check_any(&touch(0, 2, TouchPhase::Begin), 1010),
            LockCheck::Unlocked
        );
        // The holding user's next gesture contends.
        assert_eq!(
            slots.check_any(&touch(1, 3, TouchPhase::Begin), 1010),
            LockCheck::Locked(BlockReason::BeginWhileHeld)
        );
    }

    #[test]
    fn install_replaces_wholesale() {
        let config = LockConfig::new(LockLevel::Own, LockKind::Common);
        let mut slots: LockSlots<u32> = LockSlots::new();
        held_common(&mut slots, &config, 0, 1000);
        slots.seal(0);

        let fresh = touch(1, 2, TouchPhase::Begin);
        slots.install(&config, Lock::new(4, fresh, 2000, config.delay));
        let lock = slots.common().expect("slot should be occupied");
        assert_eq!(lock.holder, 4);
        assert_eq!(lock.created, 2000);
        assert!(!lock.released);

        slots.clear();
        assert!(slots.common().is_none());
    }
}
