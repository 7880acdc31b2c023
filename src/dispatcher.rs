use std::sync::Arc;
use std::time::Duration;

use crate::dead_letter::DeadLetterMailbox;
use crate::mailbox::Mailbox;

/// The thin slice of the dispatcher/thread-pool contract the mailbox core
/// consumes (spec §4, §6). The dispatcher itself — thread pool, work queue,
/// fairness policy — is out of scope (spec §1); this crate only needs to be
/// able to ask "what's my throughput budget" and "please reconsider
/// scheduling me".
pub trait MailboxDispatcher: Send + Sync {
  /// Upper bound on consecutive user messages processed per `run`; the
  /// mailbox clamps this to a minimum of 1 itself (spec §4.4.2).
  fn throughput(&self) -> usize;

  /// `None` means no wall-clock cap on a single `run`'s user-message phase.
  fn throughput_deadline(&self) -> Option<Duration>;

  /// Called at the end of every `run`, and by any producer whose enqueue
  /// transitioned the mailbox from not-scheduled to scheduled. The spec
  /// preserves the `run`-end call's `(false, false)` hints exactly (§9,
  /// Open Question) — only producer-side calls pass real hints.
  fn register_for_execution(&self, mailbox: Arc<Mailbox>, has_user_hint: bool, has_system_hint: bool);

  /// Sink reachable via the actor-system handle (spec §6). Spec §3 describes
  /// this as "another mailbox instance used as a sink"; here it is the
  /// dedicated [`DeadLetterMailbox`] rather than a full `Mailbox` with its
  /// own run loop, since nothing ever calls `run` on a dead-letter sink and
  /// giving it one would only invite the self-recursion the spec warns
  /// against.
  fn dead_letters(&self) -> Arc<DeadLetterMailbox>;
}
