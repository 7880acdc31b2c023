use thiserror::Error;

/// Errors the mailbox subsystem raises on its own behalf.
///
/// Everything else (bounded-enqueue timeout, enqueue-to-closed-system-queue,
/// dead-letter forwarding failure) is not an error: it is a successful
/// diversion to dead letters and is reported, if at all, through logging.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailboxError {
  #[error("mailbox capacity must be >= 0, got {0}")]
  InvalidCapacity(i64),

  #[error("mailbox push-timeout is required for bounded queues")]
  MissingPushTimeout,

  #[error("mailbox requirement not satisfied: actor requires {required:?}, factory produced {produced:?}")]
  UnsatisfiedRequirement {
    required: &'static str,
    produced: &'static str,
  },

  #[error("mailbox run loop was interrupted")]
  Interrupted,
}

pub type Result<T> = anyhow::Result<T>;
