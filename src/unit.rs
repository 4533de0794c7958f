//! Execution units: the futures that take part in rendezvous.
//!
//! A unit is any future wrapped with [`scope`] (or [`scope_as`]). While the wrapped future
//! is being polled, [`current`] returns its [`Unit`], which is how operations learn their
//! owner and how [`select`](crate::select) finds the unit to suspend.
//!
//! Each unit carries the bookkeeping a select needs while it is blocked: the operations
//! it has queued on channels (so a matching peer can retract all of them at once) and its
//! wake slot, a fresh oneshot created every time the unit blocks, through which the peer
//! delivers the operation that fired.
//!
//! Units are confined to one thread. Run them on a single-threaded executor, for example
//! with the helpers in [`runtimes`](crate::runtimes).

use std::{
    cell::{Cell, RefCell},
    fmt, mem,
    pin::Pin,
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll},
};

use futures::{channel::oneshot, Future};
use tracing::trace;

use crate::tie_break::TieBreak;

/// Process-wide identity of an execution unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Handle to an execution unit. Cloning gives another handle to the same unit.
#[derive(Clone)]
pub struct Unit {
    inner: Rc<Inner>,
}

struct Inner {
    id: UnitId,
    pending: RefCell<Vec<Box<dyn Retract>>>,
    wake_slot: RefCell<Option<oneshot::Sender<usize>>>,
    tie_break: Cell<TieBreak>,
    waits: Cell<u64>,
}

/// Non-owning reference from a queued operation back to its unit.
#[derive(Clone)]
pub(crate) struct UnitRef {
    id: UnitId,
    inner: Weak<Inner>,
}

/// A queued operation that can take itself back out of its channel.
pub(crate) trait Retract {
    fn retract(self: Box<Self>);
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static CURRENT: RefCell<Option<Unit>> = const { RefCell::new(None) };
}

impl Default for Unit {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("id", &self.inner.id)
            .field("pending", &self.pending())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Unit {}

impl Unit {
    /// A new unit. Its tie-break generator is seeded from a per-thread sequence, so
    /// every unit created on a thread starts from a different state.
    pub fn new() -> Self {
        Self::with_tie_break(TieBreak::fresh())
    }

    /// A unit whose tie-break generator starts from `seed`, regardless of how many units
    /// were created before it.
    pub fn with_seed(seed: u32) -> Self {
        Self::with_tie_break(TieBreak::new(seed))
    }

    fn with_tie_break(tie_break: TieBreak) -> Self {
        Self {
            inner: Rc::new(Inner {
                id: UnitId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
                pending: RefCell::new(Vec::new()),
                wake_slot: RefCell::new(None),
                tie_break: Cell::new(tie_break),
                waits: Cell::new(0),
            }),
        }
    }

    /// The identity recorded as owner of the operations this unit builds.
    pub fn id(&self) -> UnitId {
        self.inner.id
    }

    /// Whether the unit is suspended in a select, waiting for a peer.
    pub fn is_blocked(&self) -> bool {
        self.inner.wake_slot.borrow().is_some()
    }

    /// Number of operations the unit currently has queued across all channels.
    pub fn pending(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// How many times the unit has suspended in a select.
    pub fn waits(&self) -> u64 {
        self.inner.waits.get()
    }

    pub(crate) fn downgrade(&self) -> UnitRef {
        UnitRef {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Draws from the unit's tie-break generator.
    pub(crate) fn tie_break(&self, n: usize) -> usize {
        let mut tie_break = self.inner.tie_break.get();
        let choice = tie_break.below(n);
        self.inner.tie_break.set(tie_break);
        choice
    }

    pub(crate) fn register(&self, pending: Box<dyn Retract>) {
        self.inner.pending.borrow_mut().push(pending);
    }

    /// Takes every queued operation of this unit out of its channel.
    pub(crate) fn retract_all(&self) {
        let pending = mem::take(&mut *self.inner.pending.borrow_mut());
        if !pending.is_empty() {
            trace!(unit = %self.inner.id, count = pending.len(), "retracting");
        }
        for op in pending {
            op.retract();
        }
    }

    /// Creates the wake slot for one suspension and returns the side to wait on.
    pub(crate) fn arm(&self) -> oneshot::Receiver<usize> {
        let (tx, rx) = oneshot::channel();
        let previous = self.inner.wake_slot.borrow_mut().replace(tx);
        assert!(previous.is_none(), "{} is already waiting", self.inner.id);
        self.inner.waits.set(self.inner.waits.get() + 1);
        rx
    }

    pub(crate) fn disarm(&self) {
        self.inner.wake_slot.borrow_mut().take();
    }

    /// Resumes the unit, handing it the position of the operation that fired.
    pub(crate) fn wake(&self, index: usize) {
        let tx = self
            .inner
            .wake_slot
            .borrow_mut()
            .take()
            .expect("woke a unit that is not waiting");
        trace!(unit = %self.inner.id, index, "waking");
        tx.send(index).ok().expect("waiting unit went away");
    }
}

impl UnitRef {
    pub(crate) fn id(&self) -> UnitId {
        self.id
    }

    pub(crate) fn upgrade(&self) -> Option<Unit> {
        self.inner.upgrade().map(|inner| Unit { inner })
    }
}

/// The unit whose future is being polled right now, if any.
pub fn current() -> Option<Unit> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Runs `f` as a new execution unit.
pub fn scope<F>(f: F) -> Scoped<F::Output>
where
    F: Future + 'static,
{
    scope_as(Unit::new(), f)
}

/// Runs `f` as the execution unit `unit`. Useful to keep a handle for inspection, or to
/// pick the tie-break seed.
pub fn scope_as<F>(unit: Unit, f: F) -> Scoped<F::Output>
where
    F: Future + 'static,
{
    Scoped {
        unit,
        fut: Box::pin(f),
    }
}

/// Future returned by [`scope`] and [`scope_as`].
#[must_use = "futures do nothing unless polled"]
pub struct Scoped<T> {
    unit: Unit,
    fut: Pin<Box<dyn Future<Output = T>>>,
}

impl<T> Scoped<T> {
    pub fn unit(&self) -> &Unit {
        &self.unit
    }
}

impl<T> Future for Scoped<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        let _enter = Enter::new(this.unit.clone());
        this.fut.as_mut().poll(cx)
    }
}

/// Makes a unit current for the duration of one poll, restoring the outer one after.
struct Enter {
    outer: Option<Unit>,
}

impl Enter {
    fn new(unit: Unit) -> Self {
        let outer = CURRENT.with(|current| current.borrow_mut().replace(unit));
        Self { outer }
    }
}

impl Drop for Enter {
    fn drop(&mut self) {
        let outer = self.outer.take();
        CURRENT.with(|current| *current.borrow_mut() = outer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn no_unit_outside_scope() {
        assert!(current().is_none());
    }

    #[test]
    fn scope_sets_and_restores_current() {
        let unit = Unit::new();
        let id = unit.id();
        let seen = block_on(scope_as(unit, async { current().map(|u| u.id()) }));
        assert_eq!(seen, Some(id));
        assert!(current().is_none());
    }

    #[test]
    fn nested_scopes() {
        let outer = Unit::new();
        let outer_id = outer.id();
        let (inner_id, restored) = block_on(scope_as(outer, async {
            let inner = scope(async { current().map(|u| u.id()) }).await;
            (inner, current().map(|u| u.id()))
        }));
        assert_ne!(inner_id, Some(outer_id));
        assert_eq!(restored, Some(outer_id));
    }

    #[test]
    fn ids_are_distinct() {
        assert_ne!(Unit::new().id(), Unit::new().id());
    }

    #[test]
    fn arm_and_wake() {
        let unit = Unit::new();
        let rx = unit.arm();
        assert!(unit.is_blocked());
        assert_eq!(unit.waits(), 1);
        unit.wake(3);
        assert!(!unit.is_blocked());
        assert_eq!(block_on(rx), Ok(3));
    }

    #[test]
    #[should_panic(expected = "not waiting")]
    fn waking_an_idle_unit_panics() {
        Unit::new().wake(0);
    }

    #[test]
    fn fresh_units_draw_differently() {
        let (a, b) = (Unit::new(), Unit::new());
        let first: Vec<_> = (0..8).map(|_| a.tie_break(1 << 15)).collect();
        let second: Vec<_> = (0..8).map(|_| b.tie_break(1 << 15)).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn seeded_units_agree() {
        let a = Unit::with_seed(9);
        let b = Unit::with_seed(9);
        for n in 1..20 {
            assert_eq!(a.tie_break(n), b.tie_break(n));
        }
    }
}
