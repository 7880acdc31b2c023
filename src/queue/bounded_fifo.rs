use crossbeam::channel::{bounded, Receiver, SendTimeoutError, Sender, TryRecvError};

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;

use super::{DeadLetterSink, MessageQueueSize, PushTimeout, UserQueue};

/// Bounded FIFO: `offer(msg, timeout)` with dead-letter diversion on
/// timeout; non-blocking dequeue (spec §4.3 table, "FIFO x Bounded").
pub struct BoundedFifoQueue {
  tx: Sender<Envelope>,
  rx: Receiver<Envelope>,
  push_timeout: PushTimeout,
}

impl BoundedFifoQueue {
  pub fn new(capacity: usize, push_timeout: PushTimeout) -> Self {
    let (tx, rx) = bounded(capacity);
    Self { tx, rx, push_timeout }
  }
}

impl UserQueue for BoundedFifoQueue {
  fn enqueue(&self, receiver: &ActorRef, envelope: Envelope, dead_letters: &dyn DeadLetterSink) -> anyhow::Result<()> {
    match self.push_timeout {
      PushTimeout::UnboundedBlocking => {
        // A push-timeout of zero means "put with unbounded blocking"
        // (spec §4.3): the producer waits as long as it takes.
        self
          .tx
          .send(envelope)
          .map_err(|e| anyhow::anyhow!("bounded fifo queue disconnected: {e}"))
      }
      PushTimeout::Bounded(timeout) => match self.tx.send_timeout(envelope, timeout) {
        Ok(()) => Ok(()),
        Err(SendTimeoutError::Timeout(envelope)) => {
          dead_letters.dead_letter(receiver.clone(), envelope);
          Ok(())
        }
        Err(SendTimeoutError::Disconnected(_)) => Err(anyhow::anyhow!("bounded fifo queue disconnected")),
      },
    }
  }

  fn dequeue(&self) -> Option<Envelope> {
    match self.rx.try_recv() {
      Ok(envelope) => Some(envelope),
      Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
    }
  }

  fn has_messages(&self) -> bool {
    !self.rx.is_empty()
  }

  fn number_of_messages(&self) -> MessageQueueSize {
    MessageQueueSize::Limited(self.rx.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};
  use std::thread;
  use std::time::Duration;

  #[derive(Default, Clone)]
    struct Collecting(Arc<Mutex<Vec<ActorRef>>>);
  impl DeadLetterSink for Collecting {
    fn dead_letter(&self, receiver: ActorRef, _envelope: Envelope) {
      self.0.lock().unwrap().push(receiver);
    }
  }

  #[test]
  fn bounded_dead_letter_on_timeout() {
    // Scenario (spec §8 #5): capacity 1, push-timeout 10ms. Producer A
    // enqueues; producer B enqueues while full; B's envelope is diverted,
    // addressed to B's receiver.
    let q = BoundedFifoQueue::new(1, PushTimeout::Bounded(Duration::from_millis(10)));
    let sink = Collecting::default();
    let a = ActorRef::local("a");
    let b = ActorRef::local("b");

    q.enqueue(&a, Envelope::new(1u32), &sink).unwrap();
    q.enqueue(&b, Envelope::new(2u32), &sink).unwrap();

    let diverted = sink.0.lock().unwrap();
    assert_eq!(diverted.as_slice(), &[b]);
  }

  #[test]
  fn zero_timeout_blocks_until_space() {
    let q = Arc::new(BoundedFifoQueue::new(1, PushTimeout::UnboundedBlocking));
    let sink = Collecting::default();
    q.enqueue(&ActorRef::NoSender, Envelope::new(1u32), &sink).unwrap();

    let q2 = q.clone();
    let sink2 = sink.clone();
    let handle = thread::spawn(move || {
      q2.enqueue(&ActorRef::NoSender, Envelope::new(2u32), &sink2).unwrap();
    });

    thread::sleep(Duration::from_millis(20));
    assert!(sink.0.lock().unwrap().is_empty());
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 1);
    handle.join().unwrap();
    assert!(sink.0.lock().unwrap().is_empty());
    assert_eq!(q.dequeue().unwrap().downcast::<u32>().unwrap(), 2);
  }
}
