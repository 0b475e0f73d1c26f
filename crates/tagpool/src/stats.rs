//! Allocation counters for a single pool.
//!
//! [`PoolStats`] is a plain snapshot returned by value, suitable for
//! telemetry or assertions in tests.

/// Counters describing a pool's current occupancy and lifetime activity.
///
/// Cumulative counters only ever increase; `live` tracks current occupancy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Fixed number of slots.
    pub capacity: usize,
    /// Slots currently allocated.
    pub live: usize,
    /// Cumulative successful allocations.
    pub allocations: u64,
    /// Cumulative successful frees (including removals and `clear`).
    pub frees: u64,
    /// Cumulative operations rejected because the handle was stale.
    pub stale_rejections: u64,
    /// Cumulative allocations rejected because the pool was full.
    pub exhausted_rejections: u64,
}

impl PoolStats {
    /// Slots currently free.
    pub fn free(&self) -> usize {
        self.capacity - self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let s = PoolStats::default();
        assert_eq!(s.capacity, 0);
        assert_eq!(s.live, 0);
        assert_eq!(s.allocations, 0);
        assert_eq!(s.frees, 0);
        assert_eq!(s.stale_rejections, 0);
        assert_eq!(s.exhausted_rejections, 0);
    }

    #[test]
    fn free_is_capacity_minus_live() {
        let s = PoolStats {
            capacity: 10,
            live: 3,
            ..PoolStats::default()
        };
        assert_eq!(s.free(), 7);
    }
}
