use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;

use super::{DeadLetterSink, MessageQueueSize, PriorityEnvelope, UserQueue};

type Comparator = Arc<dyn Fn(&Envelope, &Envelope) -> CmpOrdering + Send + Sync>;

/// Priority FIFO: the consumer dequeues by total order supplied by a
/// comparator (spec §4.3). Tie-break order among equal-priority envelopes
/// is unspecified (spec §8) — `BinaryHeap` does not preserve insertion
/// order among equal keys, and callers must not depend on it.
pub struct PriorityQueue {
  heap: Mutex<BinaryHeap<PriorityEnvelope>>,
  comparator: Comparator,
}

impl PriorityQueue {
  pub fn new(comparator: Comparator) -> Self {
    Self {
      heap: Mutex::new(BinaryHeap::new()),
      comparator,
    }
  }
}

impl UserQueue for PriorityQueue {
  fn enqueue(&self, _receiver: &ActorRef, envelope: Envelope, _dead_letters: &dyn DeadLetterSink) -> anyhow::Result<()> {
    self
      .heap
      .lock()
      .unwrap()
      .push(PriorityEnvelope::new(envelope, self.comparator.clone()));
    Ok(())
  }

  fn dequeue(&self) -> Option<Envelope> {
    self.heap.lock().unwrap().pop().map(|p| p.envelope)
  }

  fn has_messages(&self) -> bool {
    !self.heap.lock().unwrap().is_empty()
  }

  fn number_of_messages(&self) -> MessageQueueSize {
    // Exposed as a hint only (spec §4.3); `BinaryHeap::len` happens to be
    // O(1), but priority ordering elsewhere in the design is allowed to be
    // approximate, so we report it as such here too rather than implying a
    // stronger guarantee than the contract makes (spec §9, Open Question).
    MessageQueueSize::Unknown
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct NoopSink;
  impl DeadLetterSink for NoopSink {
    fn dead_letter(&self, _receiver: ActorRef, _envelope: Envelope) {}
  }

  fn by_u32_value(a: &Envelope, b: &Envelope) -> CmpOrdering {
    let a = a.payload().downcast_ref::<u32>().unwrap();
    let b = b.payload().downcast_ref::<u32>().unwrap();
    // Max-heap naturally pops the largest; reverse so the smallest value
    // (highest priority) comes out first.
    b.cmp(a)
  }

  #[test]
  fn dequeues_by_comparator_order() {
    let q = PriorityQueue::new(Arc::new(by_u32_value));
    let sink = NoopSink;
    q.enqueue(&ActorRef::NoSender, Envelope::new(5u32), &sink).unwrap();
    q.enqueue(&ActorRef::NoSender, Envelope::new(1u32), &sink).unwrap();
    q.enqueue(&ActorRef::NoSender, Envelope::new(3u32), &sink).unwrap();

    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 1);
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 3);
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 5);
  }
}
