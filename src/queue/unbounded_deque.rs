use std::collections::VecDeque;
use std::sync::Mutex;

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;

use super::{DeadLetterSink, DequeCapable, MessageQueueSize, UserQueue};

/// Unbounded deque: non-blocking `enqueue`/`enqueueFirst`/`poll` (spec §4.3
/// table). Grounded in the teacher's `support::collections::Deque` trait
/// shape, realized here as a plain `Mutex<VecDeque>` — there is no
/// lock-free deque in the corpus's dependency stack, and the mailbox's
/// single-consumer discipline means contention is producer-vs-producer
/// only, same as the bounded variant below.
#[derive(Default)]
pub struct UnboundedDequeQueue {
  inner: Mutex<VecDeque<Envelope>>,
}

impl UnboundedDequeQueue {
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(VecDeque::new()),
    }
  }
}

impl UserQueue for UnboundedDequeQueue {
  fn enqueue(&self, _receiver: &ActorRef, envelope: Envelope, _dead_letters: &dyn DeadLetterSink) -> anyhow::Result<()> {
    self.inner.lock().unwrap().push_back(envelope);
    Ok(())
  }

  fn dequeue(&self) -> Option<Envelope> {
    self.inner.lock().unwrap().pop_front()
  }

  fn has_messages(&self) -> bool {
    !self.inner.lock().unwrap().is_empty()
  }

  fn number_of_messages(&self) -> MessageQueueSize {
    MessageQueueSize::Limited(self.inner.lock().unwrap().len())
  }
}

impl DequeCapable for UnboundedDequeQueue {
  fn enqueue_first(
    &self,
    _receiver: &ActorRef,
    envelope: Envelope,
    _dead_letters: &dyn DeadLetterSink,
  ) -> anyhow::Result<()> {
    self.inner.lock().unwrap().push_front(envelope);
    Ok(())
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
  fn enqueue_first_bypasses_fifo() {
    let q = UnboundedDequeQueue::new();
    let sink = NoopSink;
    q.enqueue(&ActorRef::NoSender, Envelope::new(1u32), &sink).unwrap();
    q.enqueue_first(&ActorRef::NoSender, Envelope::new(2u32), &sink).unwrap();
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 2);
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 1);
  }
}
