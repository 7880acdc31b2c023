use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::actor_ref::ActorRef;

/// Control commands delivered over the mailbox's high-priority channel
/// (spec §3). `NoMessage` is the distinguished sentinel marking the closed
/// state of the system queue — it is never linked into a live chain, it
/// only ever appears as the static node the head pointer is redirected to.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemMessage {
  Create,
  Suspend,
  Resume,
  Terminate,
  Watch { watchee: ActorRef },
  Unwatch { watchee: ActorRef },
  Failed { child: ActorRef, reason: String },
  NoMessage,
}

impl SystemMessage {
  pub fn is_no_message(&self) -> bool {
    matches!(self, SystemMessage::NoMessage)
  }

  pub fn is_terminate(&self) -> bool {
    matches!(self, SystemMessage::Terminate)
  }
}

/// An intrusive node in the system-message chain (spec §9: "an
/// intrusive-link abstraction ... rather than boxing each node in a
/// container"). The `Box` allocated for a node *is* the container; there is
/// no separate wrapper. Invariant: `next` is null ("unlinked") before the
/// node is enqueued and after it is consumed (spec §3).
pub struct SystemMessageNode {
  pub message: SystemMessage,
  next: AtomicPtr<SystemMessageNode>,
}

impl SystemMessageNode {
  pub fn new(message: SystemMessage) -> Box<Self> {
    Box::new(Self {
      message,
      next: AtomicPtr::new(ptr::null_mut()),
    })
  }

  pub fn is_unlinked(&self) -> bool {
    self.next.load(Ordering::Relaxed).is_null()
  }
}

impl fmt::Debug for SystemMessageNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SystemMessageNode")
      .field("message", &self.message)
      .field("unlinked", &self.is_unlinked())
      .finish()
  }
}

/// The static sentinel marking "system queue closed": its address, not its
/// contents, is the signal. It is never reachable through `Box::from_raw` —
/// every walk of a drained chain must stop at (never dereference past) this
/// pointer.
static CLOSED_SENTINEL: SystemMessageNode = SystemMessageNode {
  message: SystemMessage::NoMessage,
  next: AtomicPtr::new(ptr::null_mut()),
};

fn sentinel_ptr() -> *mut SystemMessageNode {
  &CLOSED_SENTINEL as *const SystemMessageNode as *mut SystemMessageNode
}

fn is_sentinel(ptr: *mut SystemMessageNode) -> bool {
  ptr == sentinel_ptr()
}

/// Lock-free LIFO of system-message nodes, draining to an earliest-first
/// (FIFO) owned chain (spec §4.2). `enqueue` CAS-retries the head; `drain`
/// is a single atomic swap, after which the caller holds sole ownership of
/// the popped chain (no further atomics are needed to walk or reverse it).
#[derive(Debug)]
pub struct SystemMessageList {
  head: AtomicPtr<SystemMessageNode>,
}

impl Default for SystemMessageList {
  fn default() -> Self {
    Self::new()
  }
}

impl SystemMessageList {
  pub fn new() -> Self {
    Self {
      head: AtomicPtr::new(ptr::null_mut()),
    }
  }

  /// `true` once the queue has been closed via [`Self::close`] — subsequent
  /// enqueues must divert to dead letters rather than link here.
  pub fn is_closed(&self) -> bool {
    is_sentinel(self.head.load(Ordering::Acquire))
  }

  pub fn has_system_messages(&self) -> bool {
    let head = self.head.load(Ordering::Acquire);
    !head.is_null() && !is_sentinel(head)
  }

  /// Links `node` onto the head of the stack. `node` must be unlinked
  /// (spec §4.2 precondition). If the queue is observed closed, `node` is
  /// handed back to the caller so it can be redirected to dead letters —
  /// `enqueue` never silently drops a message.
  pub fn enqueue(&self, node: Box<SystemMessageNode>) -> Result<(), Box<SystemMessageNode>> {
    debug_assert!(node.is_unlinked());
    let raw = Box::into_raw(node);
    loop {
      let head = self.head.load(Ordering::Acquire);
      if is_sentinel(head) {
        // SAFETY: `raw` was produced by `Box::into_raw` above and has not
        // been published to any other thread yet, so reclaiming it here is
        // sound.
        let node = unsafe { Box::from_raw(raw) };
        return Err(node);
      }
      unsafe { (*raw).next.store(head, Ordering::Relaxed) };
      if self
        .head
        .compare_exchange_weak(head, raw, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
      {
        return Ok(());
      }
    }
  }

  /// Atomically swaps the head for `null`, handing the caller sole
  /// ownership of the popped LIFO chain, reversed into causal
  /// (earliest-enqueued-first) order.
  pub fn drain(&self) -> DrainedChain {
    let old_head = self.head.swap(ptr::null_mut(), Ordering::AcqRel);
    DrainedChain::from_lifo(old_head)
  }

  /// Atomically swaps the head for the closed sentinel. Like [`Self::drain`],
  /// returns the earliest-first chain of whatever was queued at that
  /// instant; every enqueue observed afterwards diverts to dead letters.
  pub fn close(&self) -> DrainedChain {
    let old_head = self.head.swap(sentinel_ptr(), Ordering::AcqRel);
    DrainedChain::from_lifo(old_head)
  }
}

unsafe impl Send for SystemMessageList {}
unsafe impl Sync for SystemMessageList {}

impl Drop for SystemMessageList {
  fn drop(&mut self) {
    let head = *self.head.get_mut();
    if !head.is_null() && !is_sentinel(head) {
      drop(DrainedChain::from_lifo(head));
    }
  }
}

/// An owned, earliest-first chain of system-message nodes produced by a
/// drain. Reclaims each node (`Box::from_raw`) as it is walked.
#[derive(Debug, Default)]
pub struct DrainedChain {
  nodes: std::collections::VecDeque<Box<SystemMessageNode>>,
}

impl DrainedChain {
  /// `raw` is the (possibly null, never the sentinel) head of a LIFO chain
  /// this thread now has sole ownership of; walks and reverses it into
  /// earliest-first owned nodes.
  fn from_lifo(raw: *mut SystemMessageNode) -> Self {
    let mut lifo = Vec::new();
    let mut current = raw;
    while !current.is_null() {
      debug_assert!(!is_sentinel(current));
      // SAFETY: this chain was either (a) never published (drain owns it
      // exclusively after the swap) or (b) the list's own Drop, which by
      // construction has no other live reference.
      let mut node = unsafe { Box::from_raw(current) };
      current = node.next.load(Ordering::Relaxed);
      node.next.store(ptr::null_mut(), Ordering::Relaxed);
      lifo.push(node);
    }
    // `lifo` is latest-enqueued-first; reverse to earliest-first delivery
    // order (spec §4.2, §8 invariant 5).
    let nodes = lifo.into_iter().rev().collect();
    Self { nodes }
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  /// Removes and returns the next node in delivery order, already unlinked.
  pub fn pop_front(&mut self) -> Option<Box<SystemMessageNode>> {
    self.nodes.pop_front()
  }
}

impl IntoIterator for DrainedChain {
  type Item = Box<SystemMessageNode>;
  type IntoIter = std::collections::vec_deque::IntoIter<Box<SystemMessageNode>>;

  fn into_iter(self) -> Self::IntoIter {
    self.nodes.into_iter()
  }
}
