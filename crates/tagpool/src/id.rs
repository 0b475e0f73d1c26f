//! Strongly-typed identifiers: slot indices, generation tags, pool ids.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Position of a slot within a pool's storage.
///
/// Pools are capped at `u32::MAX` slots so a handle stays two words wide.
pub type SlotIndex = u32;

/// Generation tag stamped into a slot when it is allocated.
///
/// A handle is valid only while its embedded tag equals the tag currently
/// stamped in its slot. Tags are never zero, so `Option<GenTag>` (the "no
/// live tag" state of a free slot) has the same size as `GenTag`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenTag(NonZeroU64);

impl GenTag {
    /// Wrap a raw tag value. Returns `None` for zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw tag value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for GenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counter for unique [`PoolId`] allocation.
static POOL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a [`Pool`](crate::Pool).
///
/// Allocated from a monotonic atomic counter via [`PoolId::next`]. Two
/// distinct pools always have different ids, so a handle minted by one pool
/// is rejected by every other pool even when index and tag happen to match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u64);

impl PoolId {
    /// Allocate a fresh, unique pool id. Thread-safe.
    pub fn next() -> Self {
        Self(POOL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_tag() {
        assert!(GenTag::new(0).is_none());
        assert_eq!(GenTag::new(7).map(GenTag::get), Some(7));
    }

    #[test]
    fn absent_tag_costs_no_space() {
        assert_eq!(
            std::mem::size_of::<Option<GenTag>>(),
            std::mem::size_of::<GenTag>()
        );
    }

    #[test]
    fn pool_ids_are_unique() {
        let a = PoolId::next();
        let b = PoolId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }
}
