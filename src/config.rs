use std::time::Duration;

use crate::error::MailboxError;

/// Programmatic equivalent of the `mailbox-capacity` / `mailbox-push-timeout-time`
/// configuration keys (spec §6), used directly by callers (tests, or any
/// embedding runtime without a `config::Config` source) and shared by
/// [`Self::from_config`] so both entry points validate the same way (spec
/// §4.6: "Factories reject invalid values at construction").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxFactorySettings {
  pub capacity: Option<usize>,
  pub push_timeout: Duration,
}

impl MailboxFactorySettings {
  /// `capacity` of `None` means "no bounded variant will be requested from
  /// this factory"; `Some(negative)` is rejected eagerly per spec §4.6/§7.
  pub fn new(capacity: Option<i64>, push_timeout: Duration) -> Result<Self, MailboxError> {
    let capacity = match capacity {
      None => None,
      Some(value) if value < 0 => return Err(MailboxError::InvalidCapacity(value)),
      Some(value) => Some(value as usize),
    };
    Ok(Self { capacity, push_timeout })
  }

  /// Reads `mailbox-capacity` (optional, integer >= 0) and
  /// `mailbox-push-timeout-time` (required, milliseconds) from a
  /// `config::Config` key-value source, the teacher's own configuration
  /// dependency (spec §6 "Configuration keys"). Missing or malformed
  /// `mailbox-push-timeout-time` fails eagerly rather than defaulting
  /// silently — the spec treats "null timeout" as a factory
  /// misconfiguration (§7), not a zero-timeout default.
  pub fn from_config(config: &config::Config) -> Result<Self, MailboxError> {
    let capacity = match config.get::<i64>("mailbox-capacity") {
      Ok(value) => Some(value),
      Err(config::ConfigError::NotFound(_)) => None,
      Err(_) => return Err(MailboxError::InvalidCapacity(-1)),
    };
    let timeout_ms = config
      .get::<u64>("mailbox-push-timeout-time")
      .map_err(|_| MailboxError::MissingPushTimeout)?;
    Self::new(capacity, Duration::from_millis(timeout_ms))
  }
}
