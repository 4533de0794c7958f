use thiserror::Error;

use crate::{ChannelId, UnitId};

/// Misuse of [`try_select`](crate::try_select).
///
/// None of these can be caused by the data being exchanged; they all point at a bug in
/// the caller. [`select`](crate::select), [`Chan::send`](crate::Chan::send) and
/// [`Chan::receive`](crate::Chan::receive) panic with the same message instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("select called outside of an execution unit")]
    NoCurrentUnit,
    #[error("operation created by {owner} offered to select on {current}")]
    ForeignOperation { owner: UnitId, current: UnitId },
    #[error("select over no operations would never wake")]
    Empty,
    #[error("select would wait to both send and receive on {channel}")]
    OpposingOperations { channel: ChannelId },
}
