//! Test utilities and reference models for tagpool development.
//!
//! Provides a drop-counting payload ([`Tracked`] with [`DropCounter`]) and a
//! [`PoolModel`] that mirrors a [`Pool`] with plain collections, so property
//! tests can drive random operation sequences against both and compare.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use tagpool::{Handle, Pool, PoolError};

/// Shared counter incremented every time a [`Tracked`] value is dropped.
#[derive(Clone, Debug, Default)]
pub struct DropCounter {
    drops: Arc<AtomicUsize>,
}

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a value reporting its drop to this counter.
    pub fn track(&self, id: u64) -> Tracked {
        Tracked {
            id,
            drops: Arc::clone(&self.drops),
        }
    }

    /// Number of tracked values dropped so far.
    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

/// Payload that records its own drop.
#[derive(Debug)]
pub struct Tracked {
    pub id: u64,
    drops: Arc<AtomicUsize>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// One step of a randomized pool workload.
///
/// `pick` values select among the handles the model currently knows about,
/// modulo their count, so any `usize` is a valid pick.
#[derive(Clone, Debug)]
pub enum ModelOp {
    /// Insert a value.
    Alloc(i64),
    /// Free a live handle.
    Free(usize),
    /// Read a live handle.
    Get(usize),
    /// Overwrite a live handle's value.
    Set(usize, i64),
    /// Free a handle that is already stale.
    FreeStale(usize),
    /// Read through a handle that is already stale.
    GetStale(usize),
}

/// Reference model of a `Pool<i64>`.
///
/// Tracks live handles with their expected values (in allocation order) and
/// every handle that has been freed.
#[derive(Debug)]
pub struct PoolModel {
    capacity: usize,
    live: IndexMap<Handle<i64>, i64>,
    retired: Vec<Handle<i64>>,
}

impl PoolModel {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            live: IndexMap::new(),
            retired: Vec::new(),
        }
    }

    /// Number of handles the model expects to be live.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of handles the model has seen freed.
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Apply `op` to both `pool` and the model, panicking on any divergence.
    pub fn apply(&mut self, pool: &mut Pool<i64>, op: &ModelOp) {
        match *op {
            ModelOp::Alloc(value) => match pool.insert(value) {
                Ok(handle) => {
                    assert!(self.live.len() < self.capacity, "allocated past capacity");
                    assert!(
                        self.live.insert(handle, value).is_none(),
                        "live handle {handle} issued twice"
                    );
                }
                Err(e) => {
                    assert_eq!(self.live.len(), self.capacity, "spurious failure: {e}");
                    assert_eq!(
                        e,
                        PoolError::Exhausted {
                            capacity: self.capacity
                        }
                    );
                }
            },
            ModelOp::Free(pick) => {
                if self.live.is_empty() {
                    return;
                }
                let (handle, _) = self
                    .live
                    .swap_remove_index(pick % self.live.len())
                    .expect("pick is reduced modulo the live count");
                assert_eq!(pool.free(handle), Ok(()));
                self.retired.push(handle);
            }
            ModelOp::Get(pick) => {
                if let Some((&handle, value)) = self.pick_live(pick) {
                    assert_eq!(pool.get(handle), Ok(value));
                }
            }
            ModelOp::Set(pick, value) => {
                if self.live.is_empty() {
                    return;
                }
                let index = pick % self.live.len();
                let (&handle, expected) = self
                    .live
                    .get_index_mut(index)
                    .expect("pick is reduced modulo the live count");
                *pool.get_mut(handle).unwrap_or_else(|e| panic!("{e}")) = value;
                *expected = value;
            }
            ModelOp::FreeStale(pick) => {
                if let Some(handle) = self.pick_retired(pick) {
                    assert!(matches!(
                        pool.free(handle),
                        Err(PoolError::UseAfterFree { .. })
                    ));
                }
            }
            ModelOp::GetStale(pick) => {
                if let Some(handle) = self.pick_retired(pick) {
                    assert!(matches!(
                        pool.get(handle),
                        Err(PoolError::UseAfterFree { .. })
                    ));
                }
            }
        }
    }

    /// Check every index is either live or free, and that every handle the
    /// model knows about resolves (or fails) as expected.
    pub fn check(&self, pool: &Pool<i64>) {
        assert_eq!(pool.capacity(), self.capacity);
        assert_eq!(pool.len(), self.live.len());
        assert_eq!(pool.len() + pool.free_count(), pool.capacity());

        let mut seen = vec![false; pool.capacity()];
        for (handle, value) in pool.iter() {
            let slot = handle.index() as usize;
            assert!(!seen[slot], "slot {slot} listed twice");
            seen[slot] = true;
            assert_eq!(self.live.get(&handle), Some(value));
        }
        assert_eq!(seen.iter().filter(|&&s| s).count(), self.live.len());

        for handle in &self.retired {
            assert!(!pool.contains(*handle), "retired {handle} still live");
        }
    }

    fn pick_live(&self, pick: usize) -> Option<(&Handle<i64>, &i64)> {
        if self.live.is_empty() {
            return None;
        }
        self.live.get_index(pick % self.live.len())
    }

    fn pick_retired(&self, pick: usize) -> Option<Handle<i64>> {
        if self.retired.is_empty() {
            return None;
        }
        Some(self.retired[pick % self.retired.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_counter_counts() {
        let counter = DropCounter::new();
        let a = counter.track(1);
        let b = counter.track(2);
        assert_eq!(a.id, 1);
        drop(a);
        assert_eq!(counter.drops(), 1);
        drop(b);
        assert_eq!(counter.drops(), 2);
    }

    #[test]
    fn model_follows_simple_sequence() {
        let mut pool = Pool::new(2, None).unwrap();
        let mut model = PoolModel::new(2);
        for op in [
            ModelOp::Alloc(1),
            ModelOp::Alloc(2),
            ModelOp::Alloc(3),
            ModelOp::Free(0),
            ModelOp::GetStale(0),
            ModelOp::Alloc(4),
            ModelOp::Set(1, 40),
            ModelOp::Get(1),
            ModelOp::FreeStale(0),
        ] {
            model.apply(&mut pool, &op);
            model.check(&pool);
        }
        assert_eq!(model.live_count(), 2);
        assert_eq!(model.retired_count(), 1);
    }
}
