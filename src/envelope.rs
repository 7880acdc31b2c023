use std::any::Any;
use std::fmt;

use crate::actor_ref::ActorRef;

/// An opaque message value plus an optional sender reference.
///
/// The mailbox never inspects or mutates the payload (spec §3); it is
/// carried as a type-erased box so the mailbox core, queues, and dispatcher
/// contract stay free of an actor message-type parameter, the same erasure
/// the teacher crate performs at its `AnyMessage` boundary.
pub struct Envelope {
  payload: Box<dyn Any + Send>,
  sender: Option<ActorRef>,
}

impl Envelope {
  pub fn new<T: Any + Send>(payload: T) -> Self {
    Self {
      payload: Box::new(payload),
      sender: None,
    }
  }

  pub fn new_with_sender<T: Any + Send>(payload: T, sender: ActorRef) -> Self {
    Self {
      payload: Box::new(payload),
      sender: Some(sender),
    }
  }

  pub fn sender(&self) -> Option<&ActorRef> {
    self.sender.as_ref()
  }

  pub fn payload(&self) -> &(dyn Any + Send) {
    self.payload.as_ref()
  }

  pub fn downcast<T: Any + Send>(self) -> Result<T, Self> {
    match self.payload.downcast::<T>() {
      Ok(value) => Ok(*value),
      Err(payload) => Err(Self {
        payload,
        sender: self.sender,
      }),
    }
  }
}

impl fmt::Debug for Envelope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Envelope")
      .field("sender", &self.sender)
      .finish_non_exhaustive()
  }
}
