//! Generation tag sources.
//!
//! Both sources are deterministic. The sequential source is a plain counter;
//! the seeded source draws from a ChaCha8 stream, so identical seeds produce
//! identical tag sequences.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::TagStrategy;
use crate::error::PoolError;
use crate::id::GenTag;

/// Per-pool generator of fresh generation tags.
#[derive(Clone, Debug)]
pub(crate) enum TagSource {
    /// Next tag to hand out; zero once the counter has run out.
    Sequential { next: u64 },
    Seeded(Box<ChaCha8Rng>),
}

impl TagSource {
    pub(crate) fn new(strategy: TagStrategy) -> Self {
        match strategy {
            TagStrategy::Sequential => Self::Sequential { next: 1 },
            TagStrategy::Seeded { seed } => Self::Seeded(Box::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Sequential source whose next tag is `next`.
    #[cfg(test)]
    pub(crate) fn sequential_from(next: u64) -> Self {
        Self::Sequential { next }
    }

    /// Produce the next tag.
    ///
    /// Leaves the source untouched on failure.
    pub(crate) fn next_tag(&mut self) -> Result<GenTag, PoolError> {
        match self {
            Self::Sequential { next } => {
                let tag = GenTag::new(*next).ok_or(PoolError::TagsExhausted)?;
                // u64::MAX wraps to 0, which marks the counter as spent.
                *next = next.wrapping_add(1);
                Ok(tag)
            }
            Self::Seeded(rng) => loop {
                if let Some(tag) = GenTag::new(rng.next_u64()) {
                    return Ok(tag);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_counts_from_one() {
        let mut source = TagSource::new(TagStrategy::Sequential);
        let tags: Vec<u64> = (0..3).map(|_| source.next_tag().unwrap().get()).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn sequential_exhaustion_is_sticky() {
        let mut source = TagSource::sequential_from(u64::MAX);
        assert_eq!(source.next_tag().unwrap().get(), u64::MAX);
        assert_eq!(source.next_tag(), Err(PoolError::TagsExhausted));
        assert_eq!(source.next_tag(), Err(PoolError::TagsExhausted));
    }

    #[test]
    fn seeded_is_deterministic() {
        let mut a = TagSource::new(TagStrategy::Seeded { seed: 7 });
        let mut b = TagSource::new(TagStrategy::Seeded { seed: 7 });
        for _ in 0..32 {
            assert_eq!(a.next_tag().unwrap(), b.next_tag().unwrap());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = TagSource::new(TagStrategy::Seeded { seed: 1 });
        let mut b = TagSource::new(TagStrategy::Seeded { seed: 2 });
        let xs: Vec<_> = (0..8).map(|_| a.next_tag().unwrap()).collect();
        let ys: Vec<_> = (0..8).map(|_| b.next_tag().unwrap()).collect();
        assert_ne!(xs, ys);
    }
}
