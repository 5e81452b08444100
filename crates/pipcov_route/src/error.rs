//! Errors that end a coverage run.

use pipcov_common::{Coord, InternalError};
use pipcov_store::StoreError;

use crate::ids::CutId;

/// A failure that must stop the run.
///
/// Recoverable search outcomes never take this form; they are
/// [`AttemptFailure`](crate::min_config::AttemptFailure) values handled
/// inside the Cut-attempt loop.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    /// Resource bookkeeping contradicted itself.
    #[error("{source} (while building {cut:?} at {origin})")]
    Internal {
        /// Origin of the configuration.
        origin: Coord,
        /// The Cut being built, if any.
        cut: Option<CutId>,
        /// The violated invariant.
        source: InternalError,
    },

    /// Two Cuts of one configuration share an edge or a driven node.
    #[error("collision at {origin}: {cut} reuses {from} -> {to} ({reason})")]
    Collision {
        /// Origin of the configuration.
        origin: Coord,
        /// The Cut that tried to commit.
        cut: CutId,
        /// Driving node of the offending edge.
        from: String,
        /// Driven node of the offending edge.
        to: String,
        /// What exactly was reused.
        reason: &'static str,
    },

    /// Persisting or loading a configuration failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FatalError {
    /// Wraps an internal error with its location.
    pub fn internal(origin: Coord, cut: Option<CutId>, source: InternalError) -> Self {
        FatalError::Internal { origin, cut, source }
    }
}
