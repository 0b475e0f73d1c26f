//! Benchmark workloads for the tagpool object pool.
//!
//! Provides deterministic operation streams for benchmarks and examples:
//!
//! - [`churn_workload`]: seeded mix of allocations and frees that keeps a
//!   pool hovering around a target occupancy
//! - [`run_churn`]: replay a workload against a pool

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tagpool::{Handle, Pool};

/// One step of a churn workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Allocate a slot holding the given value.
    Alloc(u64),
    /// Free the live handle at this position (modulo the live count).
    Free(usize),
    /// Read the live handle at this position (modulo the live count).
    Read(usize),
}

/// Build a seeded churn workload of `len` operations.
///
/// Allocation probability falls as the simulated occupancy approaches
/// `target_live`, so replaying against a pool of capacity `>= target_live`
/// never exhausts it. Identical arguments give identical workloads.
pub fn churn_workload(seed: u64, len: usize, target_live: usize) -> Vec<ChurnOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut live = 0usize;
    let mut ops = Vec::with_capacity(len);
    for _ in 0..len {
        let roll = rng.next_u32() as usize % (target_live.max(1) * 2);
        let op = if live == 0 || (live < target_live && roll >= live) {
            live += 1;
            ChurnOp::Alloc(rng.next_u64())
        } else if roll % 2 == 0 {
            live -= 1;
            ChurnOp::Free(rng.next_u32() as usize)
        } else {
            ChurnOp::Read(rng.next_u32() as usize)
        };
        ops.push(op);
    }
    ops
}

/// Replay `ops` against `pool`, returning the sum of all values read.
///
/// Handles still live at the end are freed, so the pool is left empty.
pub fn run_churn(pool: &mut Pool<u64>, ops: &[ChurnOp]) -> u64 {
    let mut live: Vec<Handle<u64>> = Vec::with_capacity(pool.capacity());
    let mut sum = 0u64;
    for op in ops {
        match *op {
            ChurnOp::Alloc(value) => {
                if let Ok(h) = pool.insert(value) {
                    live.push(h);
                }
            }
            ChurnOp::Free(pick) if !live.is_empty() => {
                let h = live.swap_remove(pick % live.len());
                let _ = pool.free(h);
            }
            ChurnOp::Read(pick) if !live.is_empty() => {
                if let Ok(v) = pool.get(live[pick % live.len()]) {
                    sum = sum.wrapping_add(*v);
                }
            }
            _ => {}
        }
    }
    for h in live {
        let _ = pool.free(h);
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_is_deterministic() {
        assert_eq!(churn_workload(5, 200, 16), churn_workload(5, 200, 16));
        assert_ne!(churn_workload(5, 200, 16), churn_workload(6, 200, 16));
    }

    #[test]
    fn workload_never_exceeds_target() {
        let mut live = 0usize;
        for op in churn_workload(11, 5_000, 32) {
            match op {
                ChurnOp::Alloc(_) => live += 1,
                ChurnOp::Free(_) => live -= 1,
                ChurnOp::Read(_) => {}
            }
            assert!(live <= 32);
        }
    }

    #[test]
    fn replay_leaves_pool_empty() {
        let mut pool = Pool::new(32, None).unwrap();
        let ops = churn_workload(1, 2_000, 32);
        run_churn(&mut pool, &ops);
        assert!(pool.is_empty());
        let stats = pool.stats();
        assert_eq!(stats.exhausted_rejections, 0);
        assert_eq!(stats.stale_rejections, 0);
        assert_eq!(stats.allocations, stats.frees);
    }
}
