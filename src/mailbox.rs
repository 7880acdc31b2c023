use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;

use crate::actor_cell::{ActorCell, NullActorCell};
use crate::actor_ref::ActorRef;
use crate::dead_letter::{DeadLetterMailbox, SystemDeadLetterSink};
use crate::dispatcher::MailboxDispatcher;
use crate::envelope::Envelope;
use crate::error::MailboxError;
use crate::queue::{DeadLetterSink, MessageQueueSize, UserQueue};
use crate::status::Status;
use crate::system_message::{DrainedChain, SystemMessage, SystemMessageList, SystemMessageNode};

/// The mailbox core (spec §4.4). Owns the status word, the system-message
/// list, and the user queue; exposes the producer-facing and
/// dispatcher-facing surfaces described in spec §6.
///
/// `actor` is published exactly once via [`OnceCell`] (spec §5, "Publication
/// safety") — the execution object owns its mailbox, and the mailbox only
/// ever observes it through this one-way, write-once reference (spec §9,
/// "Cyclic reference").
pub struct Mailbox {
  actor: OnceCell<Arc<dyn ActorCell>>,
  status: Status,
  system_messages: SystemMessageList,
  user_queue: Box<dyn UserQueue>,
  dead_letters: Arc<DeadLetterMailbox>,
  dispatcher: Arc<dyn MailboxDispatcher>,
  self_ref: ActorRef,
  /// Cooperative stand-in for a thread interrupt flag (spec §5). Safe Rust
  /// has no portable way to observe another thread's OS-level interrupt, so
  /// cancellation here is a flag the embedding runtime sets on this
  /// mailbox's behalf and `run` polls at the same points the spec polls a
  /// real interrupt flag.
  interrupted: AtomicBool,
}

impl Mailbox {
  pub fn new(
    self_ref: ActorRef,
    user_queue: Box<dyn UserQueue>,
    dead_letters: Arc<DeadLetterMailbox>,
    dispatcher: Arc<dyn MailboxDispatcher>,
  ) -> Arc<Self> {
    Arc::new(Self {
      actor: OnceCell::new(),
      status: Status::new(),
      system_messages: SystemMessageList::new(),
      user_queue,
      dead_letters,
      dispatcher,
      self_ref,
      interrupted: AtomicBool::new(false),
    })
  }

  pub fn self_ref(&self) -> &ActorRef {
    &self.self_ref
  }

  /// Publishes the execution object. Must be called exactly once before any
  /// `run` (spec §6). A second call panics rather than silently replacing
  /// the previous publication.
  pub fn set_actor(&self, cell: Arc<dyn ActorCell>) {
    if self.actor.set(cell).is_err() {
      panic!("Mailbox::set_actor called more than once");
    }
  }

  fn actor(&self) -> Arc<dyn ActorCell> {
    match self.actor.get() {
      Some(cell) => cell.clone(),
      None => Arc::new(NullActorCell),
    }
  }

  /// Sets the cooperative cancellation flag (spec §5's thread-interrupt
  /// substitution). Exposed for the embedding runtime and for tests that
  /// exercise the interrupted-failure path.
  pub fn interrupt(&self) {
    self.interrupted.store(true, Ordering::SeqCst);
  }

  fn take_interrupt(&self) -> bool {
    self.interrupted.swap(false, Ordering::SeqCst)
  }

  pub fn has_messages(&self) -> bool {
    self.user_queue.has_messages()
  }

  pub fn has_system_messages(&self) -> bool {
    self.system_messages.has_system_messages()
  }

  pub fn number_of_messages(&self) -> MessageQueueSize {
    self.user_queue.number_of_messages()
  }

  pub fn is_closed(&self) -> bool {
    self.status.is_closed()
  }

  pub fn is_suspended(&self) -> bool {
    self.status.is_suspended()
  }

  pub fn suspend(&self) -> bool {
    self.status.suspend()
  }

  pub fn resume(&self) -> bool {
    self.status.resume()
  }

  pub fn become_closed(&self) -> bool {
    self.status.become_closed()
  }

  /// `canBeScheduledForExecution` (spec §4.4): a cheap hint the dispatcher
  /// may use before enqueueing this mailbox onto its work queue.
  pub fn can_be_scheduled_for_execution(&self, has_user_hint: bool, has_system_hint: bool) -> bool {
    if self.status.is_closed() {
      return false;
    }
    if self.status.is_suspended() {
      has_system_hint || self.has_system_messages()
    } else {
      has_user_hint || has_system_hint || self.has_system_messages() || self.has_messages()
    }
  }

  fn schedule_if_needed(self: &Arc<Self>, has_user_hint: bool, has_system_hint: bool) {
    if self.can_be_scheduled_for_execution(has_user_hint, has_system_hint) && self.status.set_as_scheduled() {
      self.dispatcher.register_for_execution(self.clone(), has_user_hint, has_system_hint);
    }
  }

  /// Producer-facing user enqueue (spec §6). A mailbox observed already
  /// closed diverts straight to dead letters, the same treatment the closed
  /// system queue gives system messages — a closed mailbox is a dead
  /// mailbox, not a leak waiting for the next `cleanUp`.
  pub fn enqueue(self: &Arc<Self>, receiver: &ActorRef, envelope: Envelope) -> anyhow::Result<()> {
    if self.status.is_closed() {
      log::debug!("enqueue on closed mailbox, diverting to dead letters: receiver={receiver}");
      self.dead_letters.dead_letter(receiver.clone(), envelope);
      return Ok(());
    }
    self.user_queue.enqueue(receiver, envelope, self.dead_letters.as_ref())?;
    self.schedule_if_needed(true, false);
    Ok(())
  }

  /// Producer-facing system enqueue (spec §4.2, §6). Diversion on a closed
  /// system queue is handled by [`SystemMessageList::enqueue`] itself; this
  /// only needs to forward the handed-back node.
  pub fn system_enqueue(self: &Arc<Self>, receiver: &ActorRef, message: SystemMessage) {
    let node = SystemMessageNode::new(message);
    match self.system_messages.enqueue(node) {
      Ok(()) => self.schedule_if_needed(false, true),
      Err(node) => {
        let SystemMessageNode { message, .. } = *node;
        log::debug!("systemEnqueue on closed system queue, diverting: receiver={receiver}");
        self.dead_letters.system_dead_letter(receiver.clone(), message);
      }
    }
  }

  /// The executor entry (spec §4.4). Single-threaded with respect to
  /// itself — the dispatcher is contractually forbidden from calling this
  /// while the Scheduled bit is clear (spec §5).
  pub fn run(self: &Arc<Self>) -> anyhow::Result<()> {
    let result = self.run_body();
    // Unconditional finally (spec §4.4 steps 4-5): clear Scheduled and ask
    // the dispatcher to re-evaluate, regardless of how the body above
    // finished. The `(false, false)` hints are preserved exactly per the
    // Open Question resolution in DESIGN.md.
    self.status.set_as_idle();
    self.dispatcher.register_for_execution(self.clone(), false, false);
    result
  }

  fn run_body(&self) -> anyhow::Result<()> {
    if self.status.is_closed() {
      return Ok(());
    }
    self.process_system_messages()?;
    self.process_user_messages()?;
    Ok(())
  }

  /// System message processing (spec §4.4.1). Drains repeatedly until a
  /// drain comes back empty (so messages enqueued mid-processing are not
  /// starved behind user messages), stopping early if the mailbox becomes
  /// Closed and forwarding whatever remains in the current batch to dead
  /// letters. An interrupt observed here is deferred: recorded, but only
  /// thrown once this entire phase — including forwarding — has finished.
  fn process_system_messages(&self) -> anyhow::Result<()> {
    let mut interrupted = false;
    'outer: loop {
      let mut drained = self.system_messages.drain();
      if drained.is_empty() {
        break;
      }
      while let Some(node) = drained.pop_front() {
        self.actor().system_invoke(&node.message);
        if self.take_interrupt() {
          interrupted = true;
        }
        if self.status.is_closed() {
          self.forward_remaining_system_messages(drained);
          break 'outer;
        }
      }
      if self.status.is_closed() {
        break;
      }
    }
    if interrupted {
      return Err(MailboxError::Interrupted.into());
    }
    Ok(())
  }

  /// Only reachable because the mailbox became Closed mid-drain (spec
  /// §4.4.1): whatever is left in `drained` could never have been consumed
  /// by `actor.systemInvoke`, so it is forwarded as a dead letter instead.
  fn forward_remaining_system_messages(&self, drained: DrainedChain) {
    for node in drained {
      let SystemMessageNode { message, .. } = *node;
      log::warn!("mailbox closed mid-drain, forwarding residual system message to dead letters");
      self.dead_letters.system_dead_letter(self.self_ref.clone(), message);
    }
  }

  /// User message processing (spec §4.4.2). `left` starts at
  /// `max(throughput, 1)`; an interrupt observed right after `invoke` is
  /// thrown immediately, not deferred, leaving `run`'s finally to perform
  /// cleanup.
  fn process_user_messages(&self) -> anyhow::Result<()> {
    let throughput = self.dispatcher.throughput().max(1);
    let deadline = self.dispatcher.throughput_deadline().map(|d| Instant::now() + d);
    let mut left = throughput;

    while self.status.should_process_message() && left > 0 {
      if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
          break;
        }
      }
      let envelope = match self.user_queue.dequeue() {
        Some(envelope) => envelope,
        None => break,
      };
      self.actor().invoke(&envelope);
      if self.take_interrupt() {
        return Err(MailboxError::Interrupted.into());
      }
      // System traffic has priority over user traffic at message
      // granularity (spec §4.4.2).
      self.process_system_messages()?;
      left -= 1;
    }
    Ok(())
  }

  /// Called on actor unregistration (spec §4.5). A mailbox with no actor
  /// published yet — the only situation the dead-letter sink's own
  /// lifecycle would otherwise hit — is a no-op, matching the spec's
  /// carve-out for "the dead-letter mailbox itself".
  pub fn cleanup(&self) {
    if self.actor.get().is_none() {
      return;
    }
    let drained = self.system_messages.close();
    for node in drained {
      let SystemMessageNode { message, .. } = *node;
      self.dead_letters.system_dead_letter(self.self_ref.clone(), message);
    }
    self.user_queue.clean_up(&self.self_ref, self.dead_letters.as_ref());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::queue::UnboundedFifoQueue;
  use crate::dead_letter::DeadLetter;
  use std::sync::Mutex;
  use std::time::Duration;

  struct NoopDispatcher {
    dead_letters: Arc<DeadLetterMailbox>,
  }

  impl MailboxDispatcher for NoopDispatcher {
    fn throughput(&self) -> usize {
      10
    }

    fn throughput_deadline(&self) -> Option<Duration> {
      None
    }

    fn register_for_execution(&self, _mailbox: Arc<Mailbox>, _has_user_hint: bool, _has_system_hint: bool) {}

    fn dead_letters(&self) -> Arc<DeadLetterMailbox> {
      self.dead_letters.clone()
    }
  }

  fn test_mailbox(self_ref: ActorRef) -> (Arc<Mailbox>, Arc<DeadLetterMailbox>) {
    let dead_letters = Arc::new(DeadLetterMailbox::new());
    let dispatcher: Arc<dyn MailboxDispatcher> = Arc::new(NoopDispatcher {
      dead_letters: dead_letters.clone(),
    });
    let queue: Box<dyn UserQueue> = Box::new(UnboundedFifoQueue::new());
    let mailbox = Mailbox::new(self_ref, queue, dead_letters.clone(), dispatcher);
    (mailbox, dead_letters)
  }

  #[test]
  fn can_be_scheduled_matches_state_table() {
    let (mailbox, _dead_letters) = test_mailbox(ActorRef::NoSender);
    // Open, nothing pending, no hints: not schedulable.
    assert!(!mailbox.can_be_scheduled_for_execution(false, false));
    // Open with a user hint: schedulable.
    assert!(mailbox.can_be_scheduled_for_execution(true, false));

    mailbox.suspend();
    // Suspended: user hint alone does not schedule.
    assert!(!mailbox.can_be_scheduled_for_execution(true, false));
    assert!(mailbox.can_be_scheduled_for_execution(false, true));
    mailbox.resume();

    mailbox.become_closed();
    assert!(!mailbox.can_be_scheduled_for_execution(true, true));
  }

  #[test]
  fn enqueue_on_closed_mailbox_diverts_immediately() {
    let (mailbox, dead_letters) = test_mailbox(ActorRef::local("owner"));
    mailbox.become_closed();
    mailbox.enqueue(&ActorRef::local("sender"), Envelope::new(1u32)).unwrap();
    assert_eq!(dead_letters.len(), 1);
    assert!(!mailbox.has_messages());
  }

  #[test]
  fn suspended_mailbox_defers_user_but_not_system_messages() {
    struct RecordingCell {
      log: Mutex<Vec<&'static str>>,
    }
    impl ActorCell for RecordingCell {
      fn invoke(&self, _envelope: &Envelope) {
        self.log.lock().unwrap().push("user");
      }
      fn system_invoke(&self, _message: &SystemMessage) {
        self.log.lock().unwrap().push("system");
      }
    }

    let (mailbox, _dead_letters) = test_mailbox(ActorRef::NoSender);
    let cell = Arc::new(RecordingCell { log: Mutex::new(Vec::new()) });
    mailbox.set_actor(cell.clone() as Arc<dyn ActorCell>);

    mailbox.suspend();
    mailbox.enqueue(&ActorRef::NoSender, Envelope::new(1u32)).unwrap();
    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::Watch { watchee: ActorRef::NoSender });

    mailbox.run().unwrap();

    assert_eq!(cell.log.lock().unwrap().as_slice(), &["system"]);
    assert!(mailbox.has_messages());
  }

  #[test]
  fn system_priority_during_run_scenario() {
    // Scenario (spec §8 #4): throughput 10, 5 user messages enqueued, and
    // 2 system messages land while `run` is mid-processing. At most one
    // user invocation happens before both system messages, and none
    // in-between them.
    struct InjectingCell {
      mailbox: Mutex<Option<std::sync::Weak<Mailbox>>>,
      log: Mutex<Vec<&'static str>>,
      injected: AtomicBool,
    }
    impl ActorCell for InjectingCell {
      fn invoke(&self, _envelope: &Envelope) {
        self.log.lock().unwrap().push("user");
        if !self.injected.swap(true, Ordering::SeqCst) {
          if let Some(mailbox) = self.mailbox.lock().unwrap().as_ref().and_then(|w| w.upgrade()) {
            mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::Suspend);
            mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::Resume);
          }
        }
      }
      fn system_invoke(&self, message: &SystemMessage) {
        let label = match message {
          SystemMessage::Suspend => "sys-suspend",
          SystemMessage::Resume => "sys-resume",
          _ => "sys-other",
        };
        self.log.lock().unwrap().push(label);
      }
    }

    let (mailbox, _dead_letters) = test_mailbox(ActorRef::local("a"));
    let cell = Arc::new(InjectingCell {
      mailbox: Mutex::new(None),
      log: Mutex::new(Vec::new()),
      injected: AtomicBool::new(false),
    });
    *cell.mailbox.lock().unwrap() = Some(Arc::downgrade(&mailbox));
    mailbox.set_actor(cell.clone() as Arc<dyn ActorCell>);

    for i in 0..5u32 {
      mailbox.enqueue(&ActorRef::NoSender, Envelope::new(i)).unwrap();
    }

    mailbox.run().unwrap();

    let log = cell.log.lock().unwrap();
    assert_eq!(log.len(), 7);
    let sys_index = log.iter().position(|e| *e == "sys-suspend").unwrap();
    let users_before = log[..sys_index].iter().filter(|e| **e == "user").count();
    assert!(users_before <= 1);
    assert_eq!(log[sys_index + 1], "sys-resume");
    let users_after = log[sys_index + 2..].iter().filter(|e| **e == "user").count();
    assert_eq!(users_before + users_after, 5);
  }

  #[test]
  fn cleanup_drains_both_queues_scenario() {
    // Scenario (spec §8 #6): 3 user + 2 system messages, then `cleanUp`.
    let (mailbox, dead_letters) = test_mailbox(ActorRef::local("owner"));
    mailbox.set_actor(Arc::new(NullActorCell) as Arc<dyn ActorCell>);

    for i in 0..3u32 {
      mailbox.enqueue(&ActorRef::NoSender, Envelope::new(i)).unwrap();
    }
    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::Suspend);
    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::Resume);

    mailbox.cleanup();

    let entries = dead_letters.drain_entries();
    let user_count = entries.iter().filter(|e| matches!(e, DeadLetter::User { .. })).count();
    let system_count = entries.iter().filter(|e| matches!(e, DeadLetter::System { .. })).count();
    assert_eq!(user_count, 3);
    assert_eq!(system_count, 2);

    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::Terminate);
    let entries_after = dead_letters.drain_entries();
    assert_eq!(entries_after.len(), 1);
    assert!(matches!(entries_after[0], DeadLetter::System { .. }));
  }

  #[test]
  fn cleanup_on_mailbox_without_actor_is_noop() {
    let (mailbox, dead_letters) = test_mailbox(ActorRef::local("owner"));
    mailbox.enqueue(&ActorRef::NoSender, Envelope::new(1u32)).unwrap();
    mailbox.system_enqueue(&ActorRef::NoSender, SystemMessage::Suspend);

    mailbox.cleanup();

    assert!(dead_letters.is_empty());
    assert!(mailbox.has_messages());
    assert!(mailbox.has_system_messages());
  }

  #[test]
  fn run_ends_with_idle_status_and_reregisters() {
    let (mailbox, _dead_letters) = test_mailbox(ActorRef::NoSender);
    mailbox.set_actor(Arc::new(NullActorCell) as Arc<dyn ActorCell>);
    mailbox.status.set_as_scheduled();
    mailbox.run().unwrap();
    assert!(!mailbox.status.is_scheduled());
  }
}
