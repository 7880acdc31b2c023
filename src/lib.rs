//! Lock-free mailbox core for an actor runtime: status word, system-message
//! list, pluggable user queues, and the run loop that drains both under a
//! single scheduled-bit lock (see `Mailbox`).

pub mod actor_cell;
pub mod actor_ref;
pub mod config;
pub mod dead_letter;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod mailbox;
pub mod queue;
pub mod status;
pub mod system_message;

pub use actor_cell::{ActorCell, NullActorCell};
pub use actor_ref::{ActorPath, ActorRef};
pub use dead_letter::{DeadLetter, DeadLetterMailbox, SystemDeadLetterSink};
pub use dispatcher::MailboxDispatcher;
pub use envelope::Envelope;
pub use error::MailboxError;
pub use factory::{MailboxFactory, MailboxKind, MailboxRequirement};
pub use mailbox::Mailbox;
pub use queue::{DeadLetterSink, DequeCapable, MessageQueueSize, PushTimeout, UserQueue};
pub use system_message::SystemMessage;

/// Initializes `env_logger` exactly once before any test body runs, the same
/// init-order guarantee `kernel/mailbox_test.rs`'s own `setup()` gives the
/// teacher's tests — except driven by `ctor` instead of a per-test call, so
/// every `#[test]` in this crate gets it for free without repeating a
/// `setup()` call at the top of each one.
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
  let _ = env_logger::builder().is_test(true).try_init();
}
