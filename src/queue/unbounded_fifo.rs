use crossbeam::queue::SegQueue;

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;

use super::{DeadLetterSink, MessageQueueSize, UserQueue};

/// Unbounded FIFO: non-blocking enqueue, non-blocking poll (spec §4.3 table,
/// "FIFO x Unbounded"). Backed by crossbeam's lock-free MPMC `SegQueue`,
/// consumed here under the mailbox's single-consumer discipline.
#[derive(Default)]
pub struct UnboundedFifoQueue {
  inner: SegQueue<Envelope>,
}

impl UnboundedFifoQueue {
  pub fn new() -> Self {
    Self { inner: SegQueue::new() }
  }
}

impl UserQueue for UnboundedFifoQueue {
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
  use std::sync::Arc;

  struct NoopSink;
  impl DeadLetterSink for NoopSink {
    fn dead_letter(&self, _receiver: ActorRef, _envelope: Envelope) {}
  }

  #[test]
  fn fifo_order_preserved() {
    let q = UnboundedFifoQueue::new();
    let sink = NoopSink;
    q.enqueue(&ActorRef::NoSender, Envelope::new(1u32), &sink).unwrap();
    q.enqueue(&ActorRef::NoSender, Envelope::new(2u32), &sink).unwrap();
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 1);
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 2);
    assert!(q.dequeue().is_none());
  }

  #[test]
  fn clean_up_drains_to_dead_letters() {
    let q = UnboundedFifoQueue::new();
    let sink = NoopSink;
    for i in 0..3u32 {
      q.enqueue(&ActorRef::NoSender, Envelope::new(i), &sink).unwrap();
    }
    let collected = Arc::new(std::sync::Mutex::new(Vec::new()));
    struct Collecting(Arc<std::sync::Mutex<Vec<ActorRef>>>);
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
