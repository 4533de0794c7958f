//! Unbuffered channels: the rendezvous points of the crate.
//!
//! A [`Chan<T>`] holds no values. It only remembers the operations of units that are
//! currently blocked on it, oldest first. Every exchange is a direct hand-off: the unit
//! arriving second finds the oldest opposite operation at the head of the queue, takes or
//! gives the value, and wakes its owner.
//!
//! Because an arriving operation always matches instead of queueing when an opposite one
//! is waiting, the queue never mixes directions. The channel's signed `balance` (pending
//! sends minus pending receives) therefore tells both how many operations are queued and
//! which way they point.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use tracing::trace;

use crate::{
    op::{Candidate, Completion, Direction, Op, Outcome},
    queue::{Key, Queue},
    select,
    unit::{Retract, UnitId, UnitRef},
};

/// Process-wide identity of a channel, shared by all its clones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel#{}", self.0)
    }
}

/// Counters kept by every channel since its creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Operations that had to wait in the queue.
    pub enqueued: u64,
    /// Completed rendezvous.
    pub matched: u64,
}

/// Handle to an unbuffered channel carrying values of type `T`.
///
/// Handles are cheap to clone and compare equal when they refer to the same channel.
pub struct Chan<T> {
    state: Rc<RefCell<State<T>>>,
}

struct State<T> {
    id: ChannelId,
    queue: Queue<Node<T>>,
    balance: i64,
    preference: Direction,
    stats: ChannelStats,
}

/// A blocked unit's operation, as seen by the channel.
pub(crate) struct Node<T> {
    pub(crate) direction: Direction,
    pub(crate) owner: UnitRef,
    /// Position of the operation in its owner's select.
    pub(crate) index: usize,
    pub(crate) slot: Rc<Cell<Option<T>>>,
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self {
            direction: self.direction,
            owner: self.owner.clone(),
            index: self.index,
            slot: self.slot.clone(),
        }
    }
}

/// Retraction handle the owning unit keeps for each of its queued operations.
struct Queued<T> {
    channel: Chan<T>,
    key: Key,
}

impl<T> Retract for Queued<T> {
    fn retract(self: Box<Self>) {
        self.channel.dequeue(self.key);
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

impl<T> Clone for Chan<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> PartialEq for Chan<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<T> Eq for Chan<T> {}

impl<T> fmt::Debug for Chan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Chan")
            .field("id", &state.id)
            .field("balance", &state.balance)
            .field("preference", &state.preference)
            .finish()
    }
}

impl<T> Default for Chan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Chan<T> {
    /// An empty channel: nothing queued, balance zero, preference [`Direction::Receive`].
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                id: ChannelId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
                queue: Queue::new(),
                balance: 0,
                preference: Direction::Receive,
                stats: ChannelStats::default(),
            })),
        }
    }

    /// Identity of the channel, used in errors and log events.
    pub fn id(&self) -> ChannelId {
        self.state.borrow().id
    }

    /// Pending sends minus pending receives.
    pub fn balance(&self) -> i64 {
        self.state.borrow().balance
    }

    /// Direction bias flipped on every rendezvous. Matching does not consult it.
    pub fn preference(&self) -> Direction {
        self.state.borrow().preference
    }

    /// Number of operations waiting on the channel.
    pub fn len(&self) -> usize {
        self.state.borrow().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().queue.is_empty()
    }

    /// Owners of the waiting operations, oldest first.
    pub fn waiting(&self) -> Vec<UnitId> {
        let state = self.state.borrow();
        state.queue.iter().map(|node| node.owner.id()).collect()
    }

    /// Counters of enqueued operations and completed rendezvous so far.
    pub fn stats(&self) -> ChannelStats {
        self.state.borrow().stats
    }

    /// Whether an operation in `direction` would find a counterpart right away.
    pub(crate) fn ready(&self, direction: Direction) -> bool {
        self.state.borrow().balance * direction.sign() < 0
    }

    pub(crate) fn enqueue(&self, node: Node<T>) -> Key {
        let mut state = self.state.borrow_mut();
        state.balance += node.direction.sign();
        state.stats.enqueued += 1;
        trace!(channel = %state.id, unit = %node.owner.id(), direction = ?node.direction, "enqueue");
        state.queue.push_back(node)
    }

    /// Takes the operation under `key` out of the queue, wherever it sits. Does nothing if
    /// it is no longer queued.
    pub(crate) fn dequeue(&self, key: Key) -> Option<Node<T>> {
        let mut state = self.state.borrow_mut();
        let node = state.queue.remove(key)?;
        state.balance -= node.direction.sign();
        Some(node)
    }

    /// The oldest waiting operation.
    pub(crate) fn head(&self) -> Option<Node<T>> {
        self.state.borrow().queue.front().cloned()
    }

    /// Records a rendezvous with a queued operation going in `direction`.
    pub(crate) fn matched(&self, direction: Direction) {
        let mut state = self.state.borrow_mut();
        state.preference = Direction::from_sign(-direction.sign() * state.preference.sign());
        state.stats.matched += 1;
    }
}

impl<T: 'static> Chan<T> {
    /// A candidate operation sending `value`. Nothing happens until it is passed to
    /// [`select`](crate::select).
    pub fn make_send(&self, value: T) -> Op<Outcome<T>> {
        self.make_send_with(value, |channel| Outcome::Sent { channel })
    }

    /// Like [`make_send`](Self::make_send), with `completion` producing the result the
    /// select returns when this operation fires.
    pub fn make_send_with<R: 'static>(
        &self,
        value: T,
        completion: impl FnOnce(Chan<T>) -> R + 'static,
    ) -> Op<R> {
        Op::new(Candidate::new(
            self.clone(),
            Some(value),
            Completion::Send(Box::new(completion)),
        ))
    }

    /// A candidate operation receiving a value.
    pub fn make_receive(&self) -> Op<Outcome<T>> {
        self.make_receive_with(|channel, value| Outcome::Received { channel, value })
    }

    /// Like [`make_receive`](Self::make_receive), with `completion` producing the result
    /// the select returns when this operation fires.
    pub fn make_receive_with<R: 'static>(
        &self,
        completion: impl FnOnce(Chan<T>, T) -> R + 'static,
    ) -> Op<R> {
        Op::new(Candidate::new(
            self.clone(),
            None,
            Completion::Receive(Box::new(completion)),
        ))
    }

    /// Sends `value`, waiting until a receiver takes it.
    ///
    /// # Panics
    ///
    /// If not called from inside an execution unit.
    pub async fn send(&self, value: T) {
        select([self.make_send_with(value, |_| ())]).await
    }

    /// Waits for a sender and returns its value.
    ///
    /// # Panics
    ///
    /// If not called from inside an execution unit.
    pub async fn receive(&self) -> T {
        select([self.make_receive_with(|_, value| value)]).await
    }

    pub(crate) fn retraction(&self, key: Key) -> Box<dyn Retract> {
        Box::new(Queued {
            channel: self.clone(),
            key,
        })
    }
}
