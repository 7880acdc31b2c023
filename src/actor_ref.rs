use std::fmt;
use std::sync::Arc;

/// Minimal address stand-in for the actor reference model, which is out of
/// scope for this crate (see spec §1). Mailboxes only need enough of an
/// `ActorRef` to label an envelope's receiver for dead-letter reporting;
/// they never resolve, route through, or otherwise interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActorRef {
  NoSender,
  Local(ActorPath),
}

impl ActorRef {
  pub fn local(path: impl Into<Arc<str>>) -> Self {
    ActorRef::Local(ActorPath(path.into()))
  }

  pub fn path(&self) -> Option<&str> {
    match self {
      ActorRef::NoSender => None,
      ActorRef::Local(p) => Some(&p.0),
    }
  }
}

impl fmt::Display for ActorRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ActorRef::NoSender => write!(f, "NoSender"),
      ActorRef::Local(p) => write!(f, "{}", p.0),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorPath(Arc<str>);

impl ActorPath {
  pub fn new(value: impl Into<Arc<str>>) -> Self {
    Self(value.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ActorPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}
