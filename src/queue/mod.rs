mod bounded_deque;
mod bounded_fifo;
mod bounded_priority;
mod mpsc_unbounded;
mod priority;
mod unbounded_deque;
mod unbounded_fifo;

pub use bounded_deque::BoundedDequeQueue;
pub use bounded_fifo::BoundedFifoQueue;
pub use bounded_priority::BoundedPriorityQueue;
pub use mpsc_unbounded::SingleConsumerUnboundedQueue;
pub use priority::PriorityQueue;
pub use unbounded_deque::UnboundedDequeQueue;
pub use unbounded_fifo::UnboundedFifoQueue;

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::time::Duration;

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;

/// Hint-quality message count (spec §4.3: `numberOfMessages` may be
/// conservative). Variants whose backing collection has no O(1) exact
/// count report `Unknown` rather than paying for an O(n) walk on every
/// scheduling decision (spec §9, Open Question).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageQueueSize {
  Limited(usize),
  Limitless,
  Unknown,
}

impl MessageQueueSize {
  pub fn is_empty_hint(&self) -> bool {
    matches!(self, MessageQueueSize::Limited(0))
  }
}

/// A comparator-driven ordering key for priority queues. Wraps an injected
/// `Arc<dyn Fn>` comparator (spec §4.3 "consumer dequeues by total order
/// supplied by a comparator") so `BinaryHeap`, which requires `Ord`, can
/// still be driven by runtime-supplied ordering instead of a fixed `Ord`
/// impl on `Envelope`.
#[derive(Clone)]
pub struct PriorityEnvelope {
  pub envelope: Envelope,
  comparator: Arc<dyn Fn(&Envelope, &Envelope) -> CmpOrdering + Send + Sync>,
}

impl PriorityEnvelope {
  pub fn new(envelope: Envelope, comparator: Arc<dyn Fn(&Envelope, &Envelope) -> CmpOrdering + Send + Sync>) -> Self {
    Self { envelope, comparator }
  }
}

impl PartialEq for PriorityEnvelope {
  fn eq(&self, other: &Self) -> bool {
    (self.comparator)(&self.envelope, &other.envelope) == CmpOrdering::Equal
  }
}
impl Eq for PriorityEnvelope {}

impl PartialOrd for PriorityEnvelope {
  fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
    Some(self.cmp(other))
  }
}

impl Ord for PriorityEnvelope {
  fn cmp(&self, other: &Self) -> CmpOrdering {
    (self.comparator)(&self.envelope, &other.envelope)
  }
}

/// Every published queue flavor implements this contract (spec §4.3).
/// `enqueue` is safe to call from any producer thread; `dequeue` is called
/// only by the mailbox's single run-loop owner, so implementations may
/// assume a single consumer even when the backing structure is MPMC.
pub trait UserQueue: Send + Sync {
  /// Diverts to dead letters addressed to `receiver` on bounded overflow
  /// per the push-timeout policy (spec §4.3 "Bounded policy"); never
  /// returns an error for that case, only for a genuinely unexpected
  /// backing failure.
  fn enqueue(&self, receiver: &ActorRef, envelope: Envelope, dead_letters: &dyn DeadLetterSink) -> anyhow::Result<()>;

  fn dequeue(&self) -> Option<Envelope>;

  fn has_messages(&self) -> bool;

  fn number_of_messages(&self) -> MessageQueueSize;

  /// Drains every residual envelope to `dead_letters`, addressed to
  /// `owner` (spec §4.5).
  fn clean_up(&self, owner: &ActorRef, dead_letters: &dyn DeadLetterSink) {
    while let Some(envelope) = self.dequeue() {
      dead_letters.dead_letter(owner.clone(), envelope);
    }
  }
}

/// Capability query for deque-specific operations (spec §9: "Deque-specific
/// operations are an extension capability advertised via a capability
/// query" rather than a subtype every queue must implement).
pub trait DequeCapable: UserQueue {
  /// LIFO injection used by stash/unstash patterns above the core; bypasses
  /// FIFO ordering for the caller (spec §5).
  fn enqueue_first(
    &self,
    receiver: &ActorRef,
    envelope: Envelope,
    dead_letters: &dyn DeadLetterSink,
  ) -> anyhow::Result<()>;
}

/// The mailbox's view of "somewhere to send a message that cannot be
/// delivered" (spec GLOSSARY: dead letters). Kept as a trait so queue
/// implementations don't need to know about the full `Mailbox`/dispatcher
/// machinery, only that they can report a diversion.
pub trait DeadLetterSink: Send + Sync {
  fn dead_letter(&self, receiver: ActorRef, envelope: Envelope);
}

/// Push-timeout policy for bounded variants (spec §4.3 "Bounded policy"):
/// a timeout of zero means block without limit; a positive timeout means
/// bounded `offer` with a divert-to-dead-letters on expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushTimeout {
  UnboundedBlocking,
  Bounded(Duration),
}

impl PushTimeout {
  pub fn from_duration(d: Duration) -> Self {
    if d.is_zero() {
      PushTimeout::UnboundedBlocking
    } else {
      PushTimeout::Bounded(d)
    }
  }
}
