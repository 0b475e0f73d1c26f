//! Pool error types.

use std::error::Error;
use std::fmt;

use crate::id::{GenTag, SlotIndex};

/// Errors returned by pool operations.
///
/// Every variant is recoverable. Operations validate before mutating, so a
/// returned error means the pool is exactly as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// Allocation requested but every slot is in use.
    Exhausted {
        /// Fixed capacity of the pool.
        capacity: usize,
    },
    /// The handle's tag does not match the slot's live tag.
    ///
    /// Covers access through a stale handle, double free, and handles
    /// presented to a pool other than the one that issued them.
    UseAfterFree {
        /// Slot index encoded in the handle.
        index: SlotIndex,
        /// Tag encoded in the handle.
        handle_tag: GenTag,
        /// Tag currently stamped in the slot, `None` if the slot is free
        /// or the handle belongs to another pool.
        live_tag: Option<GenTag>,
    },
    /// Allocation without an explicit constructor on a pool that has no
    /// default constructor.
    NoFactory,
    /// The generation tag source can produce no further tags.
    TagsExhausted,
    /// Pool configuration failed validation.
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
    /// A shared pool's lock was poisoned by a panic in another thread.
    Poisoned,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { capacity } => {
                write!(f, "pool exhausted: all {capacity} slots are in use")
            }
            Self::UseAfterFree {
                index,
                handle_tag,
                live_tag: Some(live),
            } => write!(
                f,
                "use after free: slot {index} handle tag {handle_tag}, live tag {live}"
            ),
            Self::UseAfterFree {
                index,
                handle_tag,
                live_tag: None,
            } => write!(
                f,
                "use after free: slot {index} handle tag {handle_tag}, slot not live"
            ),
            Self::NoFactory => write!(f, "no constructor given and pool has no default"),
            Self::TagsExhausted => write!(f, "generation tag space exhausted"),
            Self::InvalidConfig { reason } => write!(f, "invalid pool config: {reason}"),
            Self::Poisoned => write!(f, "shared pool lock poisoned"),
        }
    }
}

impl Error for PoolError {}

/// Outcome of a failed [`Pool::scope`](crate::Pool::scope) call.
///
/// The slot is released on every path; when both the body and the release
/// fail, both errors are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeError<E> {
    /// The slot could not be allocated; the body never ran.
    Alloc(PoolError),
    /// The body returned an error; the slot was released cleanly.
    Body(E),
    /// The body succeeded but releasing the slot failed.
    Release(PoolError),
    /// The body failed and releasing the slot failed too.
    BodyAndRelease {
        /// Error returned by the body.
        body: E,
        /// Error returned by the release.
        release: PoolError,
    },
}

impl<E: fmt::Display> fmt::Display for ScopeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "scope allocation failed: {e}"),
            Self::Body(e) => write!(f, "scope body failed: {e}"),
            Self::Release(e) => write!(f, "scope release failed: {e}"),
            Self::BodyAndRelease { body, release } => {
                write!(f, "scope body failed: {body}; release also failed: {release}")
            }
        }
    }
}

impl<E: Error + 'static> Error for ScopeError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Alloc(e) | Self::Release(e) => Some(e),
            Self::Body(e) | Self::BodyAndRelease { body: e, .. } => Some(e),
        }
    }
}
