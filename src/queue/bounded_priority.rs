use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;

use super::{DeadLetterSink, MessageQueueSize, PriorityEnvelope, PushTimeout, UserQueue};

type Comparator = Arc<dyn Fn(&Envelope, &Envelope) -> CmpOrdering + Send + Sync>;

/// Bounded-by-capacity priority queue: "an unsafe priority collection in a
/// blocking bounded shell" (spec §4.3) — a plain `BinaryHeap` behind a
/// capacity-gated, `Condvar`-blocking front, matching the `BoundedDequeQueue`
/// shell but keyed by comparator order instead of insertion order.
pub struct BoundedPriorityQueue {
  heap: Mutex<BinaryHeap<PriorityEnvelope>>,
  not_full: Condvar,
  capacity: usize,
  push_timeout: PushTimeout,
  comparator: Comparator,
}

impl BoundedPriorityQueue {
  pub fn new(capacity: usize, push_timeout: PushTimeout, comparator: Comparator) -> Self {
    Self {
      heap: Mutex::new(BinaryHeap::new()),
      not_full: Condvar::new(),
      capacity,
      push_timeout,
      comparator,
    }
  }
}

impl UserQueue for BoundedPriorityQueue {
  fn enqueue(&self, receiver: &ActorRef, envelope: Envelope, dead_letters: &dyn DeadLetterSink) -> anyhow::Result<()> {
    let mut guard = self.heap.lock().unwrap();
    match self.push_timeout {
      PushTimeout::UnboundedBlocking => {
        while guard.len() >= self.capacity {
          guard = self.not_full.wait(guard).unwrap();
        }
      }
      PushTimeout::Bounded(timeout) => {
        let mut remaining = timeout;
        while guard.len() >= self.capacity {
          let start = std::time::Instant::now();
          let (g, result) = self.not_full.wait_timeout(guard, remaining).unwrap();
          guard = g;
          if result.timed_out() {
            dead_letters.dead_letter(receiver.clone(), envelope);
            return Ok(());
          }
          remaining = remaining.saturating_sub(start.elapsed());
          if remaining == Duration::ZERO && guard.len() >= self.capacity {
            dead_letters.dead_letter(receiver.clone(), envelope);
            return Ok(());
          }
        }
      }
    }
    guard.push(PriorityEnvelope::new(envelope, self.comparator.clone()));
    Ok(())
  }

  fn dequeue(&self) -> Option<Envelope> {
    let mut guard = self.heap.lock().unwrap();
    let popped = guard.pop().map(|p| p.envelope);
    if popped.is_some() {
      self.not_full.notify_one();
    }
    popped
  }

  fn has_messages(&self) -> bool {
    !self.heap.lock().unwrap().is_empty()
  }

  fn number_of_messages(&self) -> MessageQueueSize {
    MessageQueueSize::Limited(self.heap.lock().unwrap().len())
  }
}
