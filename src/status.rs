use std::sync::atomic::{AtomicU32, Ordering};

/// Literal bit layout of the packed mailbox status word (spec §3). These
/// values are load-bearing: `Open` must coincide with the zero-initialized
/// storage of the containing mailbox, and `Closed` must be exactly `1` so
/// that `status == Closed` is a single comparison with no suspend/scheduled
/// bits to mask off separately.
pub const OPEN: u32 = 0;
pub const CLOSED: u32 = 1;
pub const SCHEDULED: u32 = 2;
pub const SUSPEND_UNIT: u32 = 4;

/// The packed status word described in spec §3/§4.1, realized as a single
/// `AtomicU32` updated only through CAS retry loops. No other field of the
/// mailbox is allowed to gate on a copy of this value taken without a
/// matching atomic read — every transition re-reads before each retry.
#[derive(Debug, Default)]
pub struct Status {
  word: AtomicU32,
}

impl Status {
  pub fn new() -> Self {
    Self {
      word: AtomicU32::new(OPEN),
    }
  }

  pub fn load(&self) -> u32 {
    self.word.load(Ordering::Acquire)
  }

  /// Volatile store used by the `Closed`-observing fast paths of `suspend`,
  /// `resume`, and `become_closed`: no CAS is needed because the value
  /// written is already `Closed`, but the write must still happen to
  /// publish whatever the draining thread did before calling it (spec
  /// §4.1: "setAsIdle on an already-closed mailbox must still publish a
  /// write ordering the drain performed before it").
  fn republish_closed(&self) {
    self.word.store(CLOSED, Ordering::Release);
  }

  /// `shouldProcessMessage = (status & ~Scheduled) == 0`: Open and not
  /// suspended, not closed.
  pub fn should_process_message(&self) -> bool {
    (self.load() & !SCHEDULED) == 0
  }

  /// `isSuspended = (status & ~Scheduled & ~Closed) != 0`: any suspend-count
  /// bits set.
  pub fn is_suspended(&self) -> bool {
    (self.load() & !SCHEDULED & !CLOSED) != 0
  }

  pub fn is_scheduled(&self) -> bool {
    (self.load() & SCHEDULED) != 0
  }

  pub fn is_closed(&self) -> bool {
    self.load() == CLOSED
  }

  pub fn suspend_count(&self) -> u32 {
    (self.load() & !SCHEDULED & !CLOSED) / SUSPEND_UNIT
  }

  /// Returns `true` iff this call caused the Open -> Suspended transition
  /// (i.e. the previous suspend count was zero). No-op on `Closed`.
  pub fn suspend(&self) -> bool {
    loop {
      let current = self.load();
      if current == CLOSED {
        self.republish_closed();
        return false;
      }
      let next = current + SUSPEND_UNIT;
      if self
        .word
        .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
      {
        return current < SUSPEND_UNIT;
      }
    }
  }

  /// Returns `true` iff the resulting suspend count is zero. No-op on
  /// `Closed` (returns `false`).
  pub fn resume(&self) -> bool {
    loop {
      let current = self.load();
      if current == CLOSED {
        self.republish_closed();
        return false;
      }
      if current < SUSPEND_UNIT {
        // Nothing to resume; report whether we're already un-suspended.
        return true;
      }
      let next = current - SUSPEND_UNIT;
      if self
        .word
        .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
      {
        return next < SUSPEND_UNIT;
      }
    }
  }

  /// CAS to the exact value `Closed`. Returns `true` iff this call caused
  /// the transition; an already-closed mailbox returns `false` (but still
  /// performs the republishing store, per above).
  pub fn become_closed(&self) -> bool {
    loop {
      let current = self.word.load(Ordering::Acquire);
      if current == CLOSED {
        self.republish_closed();
        return false;
      }
      if self
        .word
        .compare_exchange_weak(current, CLOSED, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
      {
        return true;
      }
    }
  }

  /// Only succeeds from pure Open (`status == 0`) or pure Suspended
  /// (`status & ShouldScheduleMask == 0`, i.e. not already scheduled and
  /// not closed). Refuses `Closed` and an already-`Scheduled` mailbox.
  pub fn set_as_scheduled(&self) -> bool {
    loop {
      let current = self.load();
      if (current & (SCHEDULED | CLOSED)) != OPEN {
        return false;
      }
      let next = current | SCHEDULED;
      if self
        .word
        .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
      {
        return true;
      }
    }
  }

  /// Clears the Scheduled bit regardless of primary state. Always
  /// eventually succeeds.
  pub fn set_as_idle(&self) -> bool {
    loop {
      let current = self.load();
      let next = current & !SCHEDULED;
      if current == next {
        return true;
      }
      if self
        .word
        .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
      {
        return true;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn suspend_resume_count_scenario() {
    let status = Status::new();
    assert_eq!(status.load(), 0);

    assert!(status.suspend());
    assert!(!status.suspend());
    assert!(!status.suspend());
    assert_eq!(status.load(), 3 * SUSPEND_UNIT);
    assert!(status.is_suspended());

    assert!(!status.resume());
    assert!(!status.resume());
    assert_eq!(status.load(), SUSPEND_UNIT);

    assert!(status.resume());
    assert_eq!(status.load(), 0);
  }

  #[test]
  fn schedule_transition_scenario() {
    let status = Status::new();
    assert!(status.set_as_scheduled());
    assert_eq!(status.load(), SCHEDULED);
    assert!(!status.set_as_scheduled());
    assert_eq!(status.load(), SCHEDULED);
    assert!(status.set_as_idle());
    assert_eq!(status.load(), 0);
  }

  #[test]
  fn close_wins_scenario() {
    let status = Status::new();
    assert!(status.suspend());
    assert!(status.suspend());
    assert_eq!(status.load(), 2 * SUSPEND_UNIT);

    assert!(status.become_closed());
    assert_eq!(status.load(), CLOSED);

    assert!(!status.suspend());
    assert!(!status.resume());
    assert!(!status.set_as_scheduled());
    assert_eq!(status.load(), CLOSED);
  }

  #[test]
  fn become_closed_is_idempotent() {
    let status = Status::new();
    assert!(status.become_closed());
    assert!(!status.become_closed());
    assert_eq!(status.load(), CLOSED);
  }
}
