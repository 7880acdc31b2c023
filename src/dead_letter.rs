use std::sync::Mutex;

use crate::actor_ref::ActorRef;
use crate::envelope::Envelope;
use crate::queue::DeadLetterSink;
use crate::system_message::SystemMessage;

/// A message that could not be delivered: a closed target, a bounded-queue
/// overflow, or a post-cleanup enqueue (spec GLOSSARY).
#[derive(Debug)]
pub enum DeadLetter {
  User { receiver: ActorRef, envelope: Envelope },
  System { receiver: ActorRef, message: SystemMessage },
}

/// Accepts diverted system messages the same way [`DeadLetterSink`] accepts
/// diverted envelopes.
pub trait SystemDeadLetterSink: Send + Sync {
  fn system_dead_letter(&self, receiver: ActorRef, message: SystemMessage);
}

/// The dead-letter mailbox (spec §3, §4.5): "another mailbox instance used
/// as a sink". Grounded in the teacher's `DeadLetterMailbox`
/// (`core/dispatch/mailbox/dead_letter_mailbox.rs`), which never actually
/// drains its own system queue (`has_system_messages` is hard-wired
/// `false`, `system_drain` hard-wired empty) and instead immediately
/// forwards every diverted message onward. This type does the same: it has
/// no run loop and nothing ever dequeues from it, so there is no recursion
/// risk even if the source mailbox *is* this dead-letter mailbox (spec §3:
/// "enqueuing to it must never recurse back into the source mailbox") —
/// forwarding here is a one-way append, never a call back into a `Mailbox`.
#[derive(Default)]
pub struct DeadLetterMailbox {
  entries: Mutex<Vec<DeadLetter>>,
}

impl DeadLetterMailbox {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Snapshot of everything diverted so far, for tests and observability.
  pub fn drain_entries(&self) -> Vec<DeadLetter> {
    std::mem::take(&mut *self.entries.lock().unwrap())
  }
}

impl DeadLetterSink for DeadLetterMailbox {
  fn dead_letter(&self, receiver: ActorRef, envelope: Envelope) {
    log::debug!("dead letter (user): receiver={receiver}");
    self.entries.lock().unwrap().push(DeadLetter::User { receiver, envelope });
  }
}

impl SystemDeadLetterSink for DeadLetterMailbox {
  fn system_dead_letter(&self, receiver: ActorRef, message: SystemMessage) {
    log::debug!("dead letter (system): receiver={receiver}, message={message:?}");
    self
      .entries
      .lock()
      .unwrap()
      .push(DeadLetter::System { receiver, message });
  }
}
