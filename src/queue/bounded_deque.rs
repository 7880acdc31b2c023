use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;

use super::{DeadLetterSink, DequeCapable, MessageQueueSize, PushTimeout, UserQueue};

/// Bounded deque: `offer`/`offerFirst` with timeout, diverting to dead
/// letters on expiry; non-blocking dequeue (spec §4.3 table). A
/// `Condvar`-gated `Mutex<VecDeque>`, since none of the corpus's lock-free
/// queues expose front-insertion.
pub struct BoundedDequeQueue {
  state: Mutex<VecDeque<Envelope>>,
  not_full: Condvar,
  capacity: usize,
  push_timeout: PushTimeout,
}

impl BoundedDequeQueue {
  pub fn new(capacity: usize, push_timeout: PushTimeout) -> Self {
    Self {
      state: Mutex::new(VecDeque::with_capacity(capacity)),
      not_full: Condvar::new(),
      capacity,
      push_timeout,
    }
  }

  fn offer(&self, envelope: Envelope, front: bool) -> Result<(), Envelope> {
    let mut guard = self.state.lock().unwrap();
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
          let (g, timeout_result) = self.not_full.wait_timeout(guard, remaining).unwrap();
          guard = g;
          if timeout_result.timed_out() {
            return Err(envelope);
          }
          remaining = remaining.saturating_sub(start.elapsed());
          if remaining == Duration::ZERO && guard.len() >= self.capacity {
            return Err(envelope);
          }
        }
      }
    }
    if front {
      guard.push_front(envelope);
    } else {
      guard.push_back(envelope);
    }
    Ok(())
  }
}

impl UserQueue for BoundedDequeQueue {
  fn enqueue(&self, receiver: &ActorRef, envelope: Envelope, dead_letters: &dyn DeadLetterSink) -> anyhow::Result<()> {
    if let Err(envelope) = self.offer(envelope, false) {
      dead_letters.dead_letter(receiver.clone(), envelope);
    }
    Ok(())
  }

  fn dequeue(&self) -> Option<Envelope> {
    let mut guard = self.state.lock().unwrap();
    let envelope = guard.pop_front();
    if envelope.is_some() {
      self.not_full.notify_one();
    }
    envelope
  }

  fn has_messages(&self) -> bool {
    !self.state.lock().unwrap().is_empty()
  }

  fn number_of_messages(&self) -> MessageQueueSize {
    MessageQueueSize::Limited(self.state.lock().unwrap().len())
  }
}

impl DequeCapable for BoundedDequeQueue {
  fn enqueue_first(
    &self,
    receiver: &ActorRef,
    envelope: Envelope,
    dead_letters: &dyn DeadLetterSink,
  ) -> anyhow::Result<()> {
    if let Err(envelope) = self.offer(envelope, true) {
      dead_letters.dead_letter(receiver.clone(), envelope);
    }
    Ok(())
  }
}
