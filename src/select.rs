use std::collections::HashMap;

use tracing::trace;

use crate::{
    op::{Direction, Op},
    unit::{self, Unit},
    Error,
};

/// Commits to exactly one of `ops` and returns its result.
///
/// If some operations already have a counterpart waiting, one of them is chosen uniformly
/// at random and completed immediately, without suspending. Otherwise all of them are
/// queued on their channels and the calling unit waits until a peer completes one; the
/// rest are withdrawn from their channels before the unit resumes.
///
/// # Panics
///
/// On any of the misuses listed in [`Error`]. Use [`try_select`] to get them as values.
pub async fn select<R>(ops: impl IntoIterator<Item = Op<R>>) -> R {
    match try_select(ops).await {
        Ok(result) => result,
        Err(err) => panic!("{err}"),
    }
}

/// Like [`select`], but reports misuse as an [`Error`] instead of panicking.
pub async fn try_select<R>(ops: impl IntoIterator<Item = Op<R>>) -> Result<R, Error> {
    let unit = unit::current().ok_or(Error::NoCurrentUnit)?;
    let mut ops: Vec<Op<R>> = ops.into_iter().collect();
    if ops.is_empty() {
        return Err(Error::Empty);
    }
    for op in &ops {
        match op.owner() {
            Some(owner) if owner != unit.id() => {
                return Err(Error::ForeignOperation {
                    owner,
                    current: unit.id(),
                })
            }
            _ => {}
        }
    }

    // Reservoir sampling: the k-th ready candidate replaces the choice with chance 1/k.
    let mut choice = None;
    let mut ready = 0;
    for (i, op) in ops.iter().enumerate() {
        if op.ready() {
            ready += 1;
            if unit.tie_break(ready) == 0 {
                choice = Some(i);
            }
        }
    }

    if let Some(i) = choice {
        let mut op = ops.swap_remove(i);
        op.alt.commit(&unit);
        return Ok(op.alt.result());
    }

    check_directions(&ops)?;

    let wake = unit.arm();
    let _registration = Registration { unit: &unit };
    for (i, op) in ops.iter_mut().enumerate() {
        op.alt.enqueue(&unit, i);
    }
    trace!(unit = %unit.id(), candidates = ops.len(), "blocking");

    // The sender lives in the unit until a peer wakes it, and the unit outlives this future.
    let index = wake.await.expect("wake slot dropped while waiting");
    Ok(ops.swap_remove(index).alt.result())
}

/// A channel's queue holds one direction at a time, so a unit cannot wait on both ends of
/// the same channel.
fn check_directions<R>(ops: &[Op<R>]) -> Result<(), Error> {
    let mut seen = HashMap::new();
    for op in ops {
        let channel = op.channel_id();
        let direction: Direction = *seen.entry(channel).or_insert(op.direction());
        if direction != op.direction() {
            return Err(Error::OpposingOperations { channel });
        }
    }
    Ok(())
}

/// Withdraws whatever is still queued if the select is dropped while waiting.
struct Registration<'a> {
    unit: &'a Unit,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.unit.retract_all();
        self.unit.disarm();
    }
}
