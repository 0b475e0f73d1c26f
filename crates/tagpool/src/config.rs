//! Pool configuration parameters.

use crate::error::PoolError;
use crate::id::SlotIndex;

/// How a pool produces generation tags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagStrategy {
    /// Monotonic per-pool counter starting at 1.
    ///
    /// Tags never repeat; the counter runs out after `u64::MAX` allocations,
    /// after which allocation fails with [`PoolError::TagsExhausted`].
    #[default]
    Sequential,
    /// Pseudo-random tags from a ChaCha8 stream seeded with `seed`.
    ///
    /// Identical seeds give identical tag sequences. Tags are distinct with
    /// overwhelming probability but not guaranteed to be.
    Seeded {
        /// Stream seed.
        seed: u64,
    },
}

/// Configuration for a [`Pool`](crate::Pool).
///
/// Validated at construction; immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of slots. Fixed for the lifetime of the pool.
    ///
    /// Must be at least 1 and at most `u32::MAX`.
    pub capacity: usize,

    /// Generation tag source. Default: [`TagStrategy::Sequential`].
    pub tag_strategy: TagStrategy,
}

impl PoolConfig {
    /// Default capacity used by [`PoolConfig::default`].
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Largest capacity a pool accepts.
    pub const MAX_CAPACITY: usize = SlotIndex::MAX as usize;

    /// Create a config with the given capacity and sequential tags.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tag_strategy: TagStrategy::Sequential,
        }
    }

    /// Use the given tag strategy.
    pub fn tag_strategy(mut self, strategy: TagStrategy) -> Self {
        self.tag_strategy = strategy;
        self
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidConfig {
                reason: "capacity must be at least 1".into(),
            });
        }
        if self.capacity > Self::MAX_CAPACITY {
            return Err(PoolError::InvalidConfig {
                reason: format!(
                    "capacity {} exceeds maximum {}",
                    self.capacity,
                    Self::MAX_CAPACITY
                ),
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_sequential() {
        let config = PoolConfig::default();
        assert_eq!(config.capacity, PoolConfig::DEFAULT_CAPACITY);
        assert_eq!(config.tag_strategy, TagStrategy::Sequential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = PoolConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfig { .. }));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_capacity_rejected() {
        let err = PoolConfig::new(PoolConfig::MAX_CAPACITY + 1)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn builder_sets_strategy() {
        let config = PoolConfig::new(8).tag_strategy(TagStrategy::Seeded { seed: 42 });
        assert_eq!(config.tag_strategy, TagStrategy::Seeded { seed: 42 });
    }
}
