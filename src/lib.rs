//! Unbuffered channels with multi-way select, in the style of Communicating Sequential
//! Processes, for futures running on a single-threaded executor.
//!
//! - **Rendezvous** -- A [`Chan`] stores no values. A send completes only when a receiver
//!   takes the value, and vice versa. Whoever arrives first waits.
//! - **Alternation** -- [`select`] offers several sends and receives, possibly on different
//!   channels, and commits to exactly one of them. All the others are withdrawn together.
//!
//! # Units
//!
//! The futures taking part in rendezvous are called _execution units_. A future becomes one
//! by being wrapped with [`unit::scope`], which is what the helpers in [`runtimes`] do when
//! spawning. Waiting on a channel suspends only the unit that waits; everything else on the
//! executor keeps running.
//!
//! ```
//! use alt::{runtimes::local_spawn::Spawn, Chan};
//! use futures::executor::LocalPool;
//!
//! let mut pool = LocalPool::new();
//! let spawner = pool.spawner();
//!
//! let chan = Chan::new();
//! let rx = chan.clone();
//! let received = spawner.spawn_unit_with_handle(async move { rx.receive().await });
//! spawner.spawn_unit(async move { chan.send(42).await });
//!
//! assert_eq!(pool.run_until(received), 42);
//! ```
//!
//! Channels, units and operations are built on `Rc`, so none of them are `Send`. Use a
//! [`LocalPool`](futures::executor::LocalPool), or tokio's `LocalSet` together with
//! [`runtimes::tokio::spawn`](runtimes).
//!
//! # Rendezvous
//!
//! A channel keeps the operations of the units waiting on it in arrival order. When an
//! operation arrives and the opposite kind is waiting, it pairs with the _oldest_ waiting
//! one: the value changes hands right away, and the waiting unit is woken. Otherwise the
//! arriving operation joins the queue. So at any time a channel holds either only senders
//! or only receivers, and [`Chan::balance`] (waiting sends minus waiting receives) tells
//! which, and how many.
//!
//! [`Chan::send`] and [`Chan::receive`] are the single-operation case. Both are
//! `.await`-ed, since both may have to wait for a partner.
//!
//! # Select
//!
//! For more than one candidate, build [operations](Op) with [`Chan::make_send`] and
//! [`Chan::make_receive`], and pass them to [`select`]:
//!
//! ```
//! use alt::{runtimes::local_spawn::Spawn, select, Chan, Outcome};
//! use futures::executor::LocalPool;
//!
//! let mut pool = LocalPool::new();
//! let spawner = pool.spawner();
//!
//! let (a, b) = (Chan::<&str>::new(), Chan::<&str>::new());
//! let (a2, b2) = (a.clone(), b.clone());
//! let first = spawner.spawn_unit_with_handle(async move {
//!     match select([a2.make_receive(), b2.make_receive()]).await {
//!         Outcome::Received { channel, value } => (channel == b2, value),
//!         Outcome::Sent { .. } => unreachable!(),
//!     }
//! });
//! pool.run_until_stalled();
//! assert_eq!((a.balance(), b.balance()), (-1, -1));
//!
//! spawner.spawn_unit(async move { b.send("from b").await });
//! assert_eq!(pool.run_until(first), (true, "from b"));
//! assert_eq!(a.balance(), 0);
//! ```
//!
//! Select proceeds in two steps:
//!
//! 1. If some candidates already have a partner waiting, one of them is picked uniformly at
//!    random and completed on the spot. The unit does not suspend, and nothing is queued.
//! 2. Otherwise every candidate is queued on its channel and the unit suspends. The first
//!    peer to pair with any of them completes that one, withdraws all the others from their
//!    channels, and wakes the unit.
//!
//! Each operation can carry a completion (see [`Chan::make_send_with`],
//! [`Chan::make_receive_with`] and [`Op::map`]) deciding what [`select`] returns when it
//! fires. Without one, the result is an [`Outcome`].
//!
//! The random pick uses a small deterministic generator owned by each unit. Units get
//! distinct seeds from a per-thread sequence, or a fixed one with [`Unit::with_seed`], so
//! runs are reproducible.
//!
//! # What is not here
//!
//! There is no buffering, and a waiting select cannot time out or be cancelled. A timeout
//! can be layered on top by adding a receive from a channel that a timer unit sends into.

pub mod channel;
mod error;
pub mod op;
mod queue;
pub mod runtimes;
mod select;
pub mod tie_break;
pub mod unit;

pub use channel::{Chan, ChannelId, ChannelStats};
pub use error::Error;
pub use op::{Direction, Op, Outcome};
pub use select::{select, try_select};
pub use unit::{Unit, UnitId};
