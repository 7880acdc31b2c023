use crossbeam::queue::SegQueue;

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;

use super::{DeadLetterSink, MessageQueueSize, UserQueue};

/// Single-consumer-optimized unbounded queue (spec §4.3): a lock-free MPSC
/// list, advertised as faster than the general MPMC FIFO because it
/// assumes exactly one dequeuing thread. Like the source this crate is
/// grounded on, that assumption is a caller contract, not something the
/// type system enforces here — pairing this with a dispatcher that allows
/// concurrent `run`s on the same mailbox is a caller bug, not a panic this
/// queue detects (spec §4.3: "it must not be paired with dispatchers that
/// allow concurrent actor runs").
///
/// The corpus has no bespoke MPSC ring in its dependency stack, so this
/// reuses crossbeam's lock-free `SegQueue` (already MPMC-safe, a strict
/// superset of the MPSC guarantee this variant advertises) restricted by
/// convention to a single consumer.
#[derive(Default)]
pub struct SingleConsumerUnboundedQueue {
  inner: SegQueue<Envelope>,
}

impl SingleConsumerUnboundedQueue {
  pub fn new() -> Self {
    Self { inner: SegQueue::new() }
  }
}

impl UserQueue for SingleConsumerUnboundedQueue {
  fn enqueue(&self, _receiver: &ActorRef, envelope: Envelope, _dead_letters: &dyn DeadLetterSink) -> anyhow::Result<()> {
    self.inner.push(envelope);
    Ok(())
  }

  fn dequeue(&self) -> Option<Envelope> {
    self.inner.pop()
  }

  fn has_messages(&self) -> bool {
    !self.inner.is_empty()
  }

  fn number_of_messages(&self) -> MessageQueueSize {
    MessageQueueSize::Limited(self.inner.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct NoopSink;
  impl DeadLetterSink for NoopSink {
    fn dead_letter(&self, _receiver: ActorRef, _envelope: Envelope) {}
  }

  #[test]
  fn fifo_order_preserved_under_single_consumer_discipline() {
    let q = SingleConsumerUnboundedQueue::new();
    let sink = NoopSink;
    q.enqueue(&ActorRef::NoSender, Envelope::new(1u32), &sink).unwrap();
    q.enqueue(&ActorRef::NoSender, Envelope::new(2u32), &sink).unwrap();

    assert!(q.has_messages());
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 1);
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 2);
    assert!(q.dequeue().is_none());
    assert!(!q.has_messages());
  }

  #[test]
  fn clean_up_drains_to_dead_letters() {
    let q = SingleConsumerUnboundedQueue::new();
    let sink = NoopSink;
    for i in 0..3u32 {
      q.enqueue(&ActorRef::NoSender, Envelope::new(i), &sink).unwrap();
    }

    let collected = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    struct Collecting(std::sync::Arc<std::sync::Mutex<Vec<ActorRef>>>);
    impl DeadLetterSink for Collecting {
      fn dead_letter(&self, receiver: ActorRef, _envelope: Envelope) {
        self.0.lock().unwrap().push(receiver);
      }
    }
    q.clean_up(&ActorRef::local("owner"), &Collecting(collected.clone()));
    assert_eq!(collected.lock().unwrap().len(), 3);
    assert!(!q.has_messages());
  }
}
