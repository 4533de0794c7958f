//! Candidate operations offered to [`select`](crate::select).
//!
//! An [`Op<R>`] is one send or receive on one channel, built with
//! [`Chan::make_send`] / [`Chan::make_receive`] (or their `_with` variants). Its type
//! parameter is what the select returns when this operation is the one that fires, so
//! operations on channels of different payload types can be offered together as long as
//! their completions agree:
//!
//! ```
//! use alt::{select, Chan};
//!
//! enum Event {
//!     Number(i64),
//!     Word(String),
//!     Delivered,
//! }
//!
//! async fn step(numbers: &Chan<i64>, words: &Chan<String>, out: &Chan<i64>) -> Event {
//!     select([
//!         numbers.make_receive_with(|_, n| Event::Number(n)),
//!         words.make_receive_with(|_, w| Event::Word(w)),
//!         out.make_send_with(7, |_| Event::Delivered),
//!     ])
//!     .await
//! }
//! ```

use std::{cell::Cell, fmt, rc::Rc};

use tracing::trace;

use crate::{
    channel::{Chan, ChannelId, Node},
    unit::{self, Unit, UnitId},
};

/// Which end of a channel an operation acts on. Its sign is the one recorded in the
/// channel's balance while operations of that direction wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Send,
    Receive,
}

impl Direction {
    /// `+1` for a send, `-1` for a receive, as counted in a channel's balance.
    pub fn sign(self) -> i64 {
        match self {
            Direction::Send => 1,
            Direction::Receive => -1,
        }
    }

    pub(crate) fn from_sign(sign: i64) -> Self {
        if sign > 0 {
            Direction::Send
        } else {
            Direction::Receive
        }
    }
}

/// What an operation built without a completion returns from a select.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Sent { channel: Chan<T> },
    Received { channel: Chan<T>, value: T },
}

impl<T> Outcome<T> {
    pub fn channel(&self) -> &Chan<T> {
        match self {
            Outcome::Sent { channel } | Outcome::Received { channel, .. } => channel,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Outcome::Sent { .. } => Direction::Send,
            Outcome::Received { .. } => Direction::Receive,
        }
    }

    /// The received value, `None` for a send.
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Sent { .. } => None,
            Outcome::Received { value, .. } => Some(value),
        }
    }
}

/// A candidate send or receive, producing `R` if it is the one a select commits to.
#[must_use = "operations do nothing unless passed to select"]
pub struct Op<R> {
    pub(crate) alt: Box<dyn Alternative<R>>,
}

impl<R> fmt::Debug for Op<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Op")
            .field("channel", &self.alt.channel_id())
            .field("direction", &self.alt.direction())
            .field("owner", &self.alt.owner())
            .finish()
    }
}

impl<R> Op<R> {
    pub(crate) fn new(alt: impl Alternative<R> + 'static) -> Self {
        Self { alt: Box::new(alt) }
    }

    pub fn direction(&self) -> Direction {
        self.alt.direction()
    }

    pub fn channel_id(&self) -> ChannelId {
        self.alt.channel_id()
    }

    /// The unit that built the operation, `None` if it was built outside of any unit.
    pub fn owner(&self) -> Option<UnitId> {
        self.alt.owner()
    }

    /// Whether a counterpart is already waiting on the channel.
    pub fn ready(&self) -> bool {
        self.alt.ready()
    }
}

impl<R: 'static> Op<R> {
    /// Applies `f` to the result after the operation's own completion.
    pub fn map<S: 'static>(self, f: impl FnOnce(R) -> S + 'static) -> Op<S> {
        Op::new(Map {
            inner: self.alt,
            f: Box::new(f),
        })
    }
}

/// The type-erased face of a candidate, as driven by the select algorithm.
pub(crate) trait Alternative<R> {
    fn channel_id(&self) -> ChannelId;
    fn owner(&self) -> Option<UnitId>;
    fn direction(&self) -> Direction;
    fn ready(&self) -> bool;
    /// Completes the rendezvous with the oldest opposite operation queued on the channel.
    fn commit(&mut self, unit: &Unit);
    /// Queues the operation on its channel as the `index`-th candidate of `unit`.
    fn enqueue(&mut self, unit: &Unit, index: usize);
    fn result(self: Box<Self>) -> R;
}

pub(crate) enum Completion<T, R> {
    Send(Box<dyn FnOnce(Chan<T>) -> R>),
    Receive(Box<dyn FnOnce(Chan<T>, T) -> R>),
}

pub(crate) struct Candidate<T, R> {
    channel: Chan<T>,
    owner: Option<UnitId>,
    slot: Rc<Cell<Option<T>>>,
    completion: Completion<T, R>,
}

impl<T, R> Candidate<T, R> {
    pub(crate) fn new(channel: Chan<T>, value: Option<T>, completion: Completion<T, R>) -> Self {
        Self {
            channel,
            owner: unit::current().map(|unit| unit.id()),
            slot: Rc::new(Cell::new(value)),
            completion,
        }
    }
}

impl<T: 'static, R> Alternative<R> for Candidate<T, R> {
    fn channel_id(&self) -> ChannelId {
        self.channel.id()
    }

    fn owner(&self) -> Option<UnitId> {
        self.owner
    }

    fn direction(&self) -> Direction {
        match self.completion {
            Completion::Send(_) => Direction::Send,
            Completion::Receive(_) => Direction::Receive,
        }
    }

    fn ready(&self) -> bool {
        self.channel.ready(self.direction())
    }

    fn commit(&mut self, unit: &Unit) {
        let direction = self.direction();
        let head = self
            .channel
            .head()
            .expect("commit on a channel with nobody waiting");
        assert_ne!(
            head.direction, direction,
            "commit against an operation going the same way"
        );
        assert_ne!(
            head.owner.id(),
            unit.id(),
            "{} matched its own pending operation",
            unit.id()
        );
        trace!(
            channel = %self.channel.id(),
            unit = %unit.id(),
            peer = %head.owner.id(),
            ?direction,
            "rendezvous"
        );

        let Node {
            direction: matched,
            owner,
            index,
            slot,
        } = head;
        match direction {
            Direction::Send => slot.set(self.slot.take()),
            Direction::Receive => self.slot.set(slot.take()),
        }

        let owner = owner
            .upgrade()
            .expect("queued operation outlived its unit");
        owner.retract_all();

        self.channel.matched(matched);
        owner.wake(index);
    }

    fn enqueue(&mut self, unit: &Unit, index: usize) {
        let key = self.channel.enqueue(Node {
            direction: self.direction(),
            owner: unit.downgrade(),
            index,
            slot: self.slot.clone(),
        });
        unit.register(self.channel.retraction(key));
    }

    fn result(self: Box<Self>) -> R {
        let Candidate {
            channel,
            slot,
            completion,
            ..
        } = *self;
        match completion {
            Completion::Send(f) => f(channel),
            Completion::Receive(f) => {
                let value = slot.take().expect("receive fired without a value");
                f(channel, value)
            }
        }
    }
}

struct Map<R, S> {
    inner: Box<dyn Alternative<R>>,
    f: Box<dyn FnOnce(R) -> S>,
}

impl<R, S> Alternative<S> for Map<R, S> {
    fn channel_id(&self) -> ChannelId {
        self.inner.channel_id()
    }

    fn owner(&self) -> Option<UnitId> {
        self.inner.owner()
    }

    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn ready(&self) -> bool {
        self.inner.ready()
    }

    fn commit(&mut self, unit: &Unit) {
        self.inner.commit(unit)
    }

    fn enqueue(&mut self, unit: &Unit, index: usize) {
        self.inner.enqueue(unit, index)
    }

    fn result(self: Box<Self>) -> S {
        (self.f)(self.inner.result())
    }
}
