use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;

use crate::config::MailboxFactorySettings;
use crate::envelope::Envelope;
use crate::error::MailboxError;
use crate::queue::{
  BoundedDequeQueue, BoundedFifoQueue, BoundedPriorityQueue, PriorityQueue, PushTimeout, SingleConsumerUnboundedQueue,
  UnboundedDequeQueue, UnboundedFifoQueue, UserQueue,
};

type Comparator = Arc<dyn Fn(&Envelope, &Envelope) -> CmpOrdering + Send + Sync>;

/// The user-queue variant an actor (or its deployment descriptor) asks the
/// factory for (spec §4.3, §4.6).
pub enum MailboxKind {
  UnboundedFifo,
  BoundedFifo,
  UnboundedDeque,
  BoundedDeque,
  Priority(Comparator),
  BoundedPriority(Comparator),
  SingleConsumerUnbounded,
}

impl MailboxKind {
  fn name(&self) -> &'static str {
    match self {
      MailboxKind::UnboundedFifo => "unbounded-fifo",
      MailboxKind::BoundedFifo => "bounded-fifo",
      MailboxKind::UnboundedDeque => "unbounded-deque",
      MailboxKind::BoundedDeque => "bounded-deque",
      MailboxKind::Priority(_) => "priority",
      MailboxKind::BoundedPriority(_) => "bounded-priority",
      MailboxKind::SingleConsumerUnbounded => "single-consumer-unbounded",
    }
  }

  fn is_deque_capable(&self) -> bool {
    matches!(self, MailboxKind::UnboundedDeque | MailboxKind::BoundedDeque)
  }
}

/// A marker an actor type attaches to declare it needs more than a plain
/// `UserQueue` (spec §4.6: "a mailbox requirement... that the deployment
/// machinery maps to a factory"). Checked against the queue the factory is
/// about to produce *before* construction succeeds, not after the first
/// message is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxRequirement {
  Any,
  DequeCapable,
}

/// Produces a [`UserQueue`] per actor from a [`MailboxKind`] descriptor plus
/// the capacity/timeout settings loaded at construction (spec §4.6, C5).
pub struct MailboxFactory {
  settings: MailboxFactorySettings,
}

impl MailboxFactory {
  pub fn new(settings: MailboxFactorySettings) -> Self {
    Self { settings }
  }

  /// Convenience constructor reading `mailbox-capacity` /
  /// `mailbox-push-timeout-time` from a `config::Config` source (spec §4.6
  /// "[ADDED] `MailboxFactory::from_settings`").
  pub fn from_settings(config: &config::Config) -> anyhow::Result<Self> {
    Ok(Self::new(MailboxFactorySettings::from_config(config)?))
  }

  fn bounded_capacity(&self) -> Result<usize, MailboxError> {
    self.settings.capacity.ok_or(MailboxError::InvalidCapacity(-1))
  }

  fn push_timeout(&self) -> PushTimeout {
    PushTimeout::from_duration(self.settings.push_timeout)
  }

  /// Builds the queue for `kind`, validating bounded variants need a
  /// capacity (spec §4.6: "capacity validated >= 0" already happened at
  /// settings-construction time; here we validate it is *present* for a
  /// bounded request).
  pub fn build_queue(&self, kind: MailboxKind) -> anyhow::Result<Box<dyn UserQueue>> {
    let push_timeout = self.push_timeout();
    let queue: Box<dyn UserQueue> = match kind {
      MailboxKind::UnboundedFifo => Box::new(UnboundedFifoQueue::new()),
      MailboxKind::UnboundedDeque => Box::new(UnboundedDequeQueue::new()),
      MailboxKind::SingleConsumerUnbounded => Box::new(SingleConsumerUnboundedQueue::new()),
      MailboxKind::BoundedFifo => Box::new(BoundedFifoQueue::new(self.bounded_capacity()?, push_timeout)),
      MailboxKind::BoundedDeque => Box::new(BoundedDequeQueue::new(self.bounded_capacity()?, push_timeout)),
      MailboxKind::Priority(comparator) => Box::new(PriorityQueue::new(comparator)),
      MailboxKind::BoundedPriority(comparator) => {
        Box::new(BoundedPriorityQueue::new(self.bounded_capacity()?, push_timeout, comparator))
      }
    };
    Ok(queue)
  }

  /// Builds the queue for `kind`, first failing actor creation if `kind`
  /// does not satisfy `requirement` (spec §4.6: "actor creation must fail
  /// before any message is delivered").
  pub fn build_queue_for_requirement(
    &self,
    kind: MailboxKind,
    requirement: MailboxRequirement,
  ) -> anyhow::Result<Box<dyn UserQueue>> {
    if requirement == MailboxRequirement::DequeCapable && !kind.is_deque_capable() {
      return Err(
        MailboxError::UnsatisfiedRequirement {
          required: "deque-capable",
          produced: kind.name(),
        }
        .into(),
      );
    }
    self.build_queue(kind)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  fn factory(capacity: Option<usize>, push_timeout_ms: u64) -> MailboxFactory {
    MailboxFactory::new(MailboxFactorySettings {
      capacity,
      push_timeout: Duration::from_millis(push_timeout_ms),
    })
  }

  #[test]
  fn builds_unbounded_fifo_without_capacity() {
    let factory = factory(None, 0);
    assert!(factory.build_queue(MailboxKind::UnboundedFifo).is_ok());
  }

  #[test]
  fn bounded_variant_without_capacity_fails() {
    let factory = factory(None, 10);
    assert!(factory.build_queue(MailboxKind::BoundedFifo).is_err());
  }

  #[test]
  fn bounded_variant_with_capacity_succeeds() {
    let factory = factory(Some(4), 10);
    assert!(factory.build_queue(MailboxKind::BoundedFifo).is_ok());
  }

  #[test]
  fn deque_requirement_rejects_fifo_kind() {
    let factory = factory(None, 0);
    let err = factory
      .build_queue_for_requirement(MailboxKind::UnboundedFifo, MailboxRequirement::DequeCapable)
      .unwrap_err();
    assert!(err.to_string().contains("deque-capable"));
  }

  #[test]
  fn deque_requirement_accepts_deque_kind() {
    let factory = factory(None, 0);
    assert!(factory
      .build_queue_for_requirement(MailboxKind::UnboundedDeque, MailboxRequirement::DequeCapable)
      .is_ok());
  }

  #[test]
  fn builds_single_consumer_unbounded_without_capacity() {
    let factory = factory(None, 0);
    assert!(factory.build_queue(MailboxKind::SingleConsumerUnbounded).is_ok());
  }

  #[test]
  fn builds_bounded_priority_with_capacity() {
    let factory = factory(Some(4), 10);
    let comparator: Comparator = Arc::new(|a: &Envelope, b: &Envelope| {
      a.payload()
        .downcast_ref::<u32>()
        .unwrap()
        .cmp(b.payload().downcast_ref::<u32>().unwrap())
    });
    assert!(factory.build_queue(MailboxKind::BoundedPriority(comparator)).is_ok());
  }
}
