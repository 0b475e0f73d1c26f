//! Fixed-capacity slot pool with generation-checked handles.
//!
//! [`Pool`] owns a fixed array of slots, a parallel array of generation tags,
//! and a stack of free slot indices. Allocation pops an index, stamps a fresh
//! tag and hands back a [`Handle`] embedding that tag. Every access and free
//! compares the handle's tag with the slot's live tag, so a handle whose slot
//! has been freed (and possibly reused) is rejected instead of aliasing the
//! new occupant.
//!
//! # Layout
//!
//! ```text
//! Pool<T>
//! ├── slots:     [Option<T>; capacity]       value iff allocated
//! ├── tags:      [Option<GenTag>; capacity]  Some(tag) iff allocated
//! ├── free_list: Vec<SlotIndex>              stack, last freed reused first
//! └── tag_source                             sequential or seeded
//! ```

use std::cell::Cell;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::handle::Handle;
use crate::id::{GenTag, PoolId, SlotIndex};
use crate::stats::PoolStats;
use crate::tags::TagSource;

/// Zero-argument factory producing pooled values.
pub type Constructor<T> = Box<dyn FnMut() -> T + Send>;

/// Fixed-capacity object pool handing out generation-checked handles.
///
/// All operations are O(1) except [`clear`](Pool::clear) and
/// [`iter`](Pool::iter). No operation grows the pool. Failed operations
/// leave the slots, tags and free list untouched.
///
/// The pool is single-owner: mutation takes `&mut self`, and views returned
/// by [`get`](Pool::get) / [`get_mut`](Pool::get_mut) borrow the pool, so
/// the borrow checker rules out holding a view across a `free`. Wrap it in a
/// [`SharedPool`](crate::SharedPool) to share it between threads.
pub struct Pool<T> {
    id: PoolId,
    slots: Box<[Option<T>]>,
    tags: Box<[Option<GenTag>]>,
    free_list: Vec<SlotIndex>,
    default_constructor: Option<Constructor<T>>,
    tag_source: TagSource,
    allocations: u64,
    frees: u64,
    exhausted_rejections: u64,
    // Bumped from `&self` lookups too.
    stale_rejections: Cell<u64>,
}

impl<T> Pool<T> {
    /// Create a pool with `capacity` slots and sequential tags.
    ///
    /// `default_constructor` is used by [`allocate`](Pool::allocate); pass
    /// `None` to require an explicit constructor on every allocation.
    pub fn new(
        capacity: usize,
        default_constructor: Option<Constructor<T>>,
    ) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::new(capacity), default_constructor)
    }

    /// Create a pool whose default constructor is `constructor`.
    pub fn with_constructor<F>(capacity: usize, constructor: F) -> Result<Self, PoolError>
    where
        F: FnMut() -> T + Send + 'static,
    {
        Self::new(capacity, Some(Box::new(constructor)))
    }

    /// Create a pool from a validated [`PoolConfig`].
    pub fn with_config(
        config: PoolConfig,
        default_constructor: Option<Constructor<T>>,
    ) -> Result<Self, PoolError> {
        config.validate()?;
        let capacity = config.capacity;
        // Reversed so the first allocation lands in slot 0.
        let free_list = (0..capacity as SlotIndex).rev().collect();
        Ok(Self {
            id: PoolId::next(),
            slots: (0..capacity).map(|_| None).collect(),
            tags: vec![None; capacity].into_boxed_slice(),
            free_list,
            default_constructor,
            tag_source: TagSource::new(config.tag_strategy),
            allocations: 0,
            frees: 0,
            exhausted_rejections: 0,
            stale_rejections: Cell::new(0),
        })
    }

    /// Replace (or remove) the default constructor.
    pub fn set_default_constructor(&mut self, constructor: Option<Constructor<T>>) {
        self.default_constructor = constructor;
    }

    /// Whether a default constructor is installed.
    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor.is_some()
    }

    /// Allocate a slot and fill it using the default constructor.
    ///
    /// Fails with [`PoolError::Exhausted`] when no slot is free and with
    /// [`PoolError::NoFactory`] when the pool has no default constructor.
    pub fn allocate(&mut self) -> Result<Handle<T>, PoolError> {
        let index = self.next_free()?;
        let constructor = self
            .default_constructor
            .as_mut()
            .ok_or(PoolError::NoFactory)?;
        let tag = self.tag_source.next_tag()?;
        let value = constructor();
        Ok(self.occupy(index, tag, value))
    }

    /// Allocate a slot and fill it using `constructor`.
    ///
    /// The constructor only runs once a slot and a tag are secured. If it
    /// panics, no slot is consumed.
    pub fn allocate_with<F>(&mut self, constructor: F) -> Result<Handle<T>, PoolError>
    where
        F: FnOnce() -> T,
    {
        let index = self.next_free()?;
        let tag = self.tag_source.next_tag()?;
        let value = constructor();
        Ok(self.occupy(index, tag, value))
    }

    /// Allocate a slot holding `value`.
    ///
    /// On failure `value` is dropped.
    pub fn insert(&mut self, value: T) -> Result<Handle<T>, PoolError> {
        self.allocate_with(|| value)
    }

    /// Free the slot behind `handle`, dropping its value.
    ///
    /// Every copy of `handle` is stale afterwards. Freeing a stale handle
    /// (double free included) fails with [`PoolError::UseAfterFree`] and
    /// changes nothing.
    pub fn free(&mut self, handle: Handle<T>) -> Result<(), PoolError> {
        self.remove(handle).map(drop)
    }

    /// Free the slot behind `handle` and return its value.
    pub fn remove(&mut self, handle: Handle<T>) -> Result<T, PoolError> {
        let index = self.check(handle)?;
        let value = self.slots[index].take().ok_or_else(|| unoccupied(handle))?;
        self.tags[index] = None;
        self.free_list.push(handle.index());
        self.frees += 1;
        Ok(value)
    }

    /// Borrow the value behind `handle`.
    pub fn get(&self, handle: Handle<T>) -> Result<&T, PoolError> {
        let index = self.check(handle)?;
        self.slots[index].as_ref().ok_or_else(|| unoccupied(handle))
    }

    /// Mutably borrow the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, PoolError> {
        let index = self.check(handle)?;
        self.slots[index].as_mut().ok_or_else(|| unoccupied(handle))
    }

    /// Whether `handle` currently refers to a live slot of this pool.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.live_tag(handle) == Some(handle.tag())
    }

    /// Free every live slot. All outstanding handles become stale.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            if self.tags[index].take().is_none() {
                continue;
            }
            let value = self.slots[index].take();
            self.free_list.push(index as SlotIndex);
            self.frees += 1;
            drop(value);
        }
    }

    /// Iterate over live slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        let id = self.id;
        self.tags
            .iter()
            .zip(self.slots.iter())
            .enumerate()
            .filter_map(move |(index, (tag, value))| {
                let tag = (*tag)?;
                let value = value.as_ref()?;
                Some((Handle::new(id, index as SlotIndex, tag), value))
            })
    }

    /// Process-unique id of this pool.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Fixed number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Whether no slot is allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every slot is allocated.
    pub fn is_full(&self) -> bool {
        self.free_list.is_empty()
    }

    /// Number of free slots.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Snapshot of occupancy and lifetime counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            live: self.len(),
            allocations: self.allocations,
            frees: self.frees,
            stale_rejections: self.stale_rejections.get(),
            exhausted_rejections: self.exhausted_rejections,
        }
    }

    /// Index that the next allocation will use.
    fn next_free(&mut self) -> Result<SlotIndex, PoolError> {
        match self.free_list.last() {
            Some(&index) => Ok(index),
            None => {
                self.exhausted_rejections += 1;
                Err(PoolError::Exhausted {
                    capacity: self.capacity(),
                })
            }
        }
    }

    /// Commit an allocation whose index came from `next_free`.
    fn occupy(&mut self, index: SlotIndex, tag: GenTag, value: T) -> Handle<T> {
        let popped = self.free_list.pop();
        debug_assert_eq!(popped, Some(index));
        let slot = index as usize;
        self.slots[slot] = Some(value);
        self.tags[slot] = Some(tag);
        self.allocations += 1;
        Handle::new(self.id, index, tag)
    }

    /// Tag stamped in the handle's slot, `None` for free slots, out-of-range
    /// indices and handles from other pools.
    fn live_tag(&self, handle: Handle<T>) -> Option<GenTag> {
        if handle.pool_id() != self.id {
            return None;
        }
        self.tags.get(handle.index() as usize).copied().flatten()
    }

    /// Validate `handle` and return its slot position.
    fn check(&self, handle: Handle<T>) -> Result<usize, PoolError> {
        let live_tag = self.live_tag(handle);
        if live_tag == Some(handle.tag()) {
            return Ok(handle.index() as usize);
        }
        self.stale_rejections.set(self.stale_rejections.get() + 1);
        Err(PoolError::UseAfterFree {
            index: handle.index(),
            handle_tag: handle.tag(),
            live_tag,
        })
    }

    #[cfg(test)]
    pub(crate) fn set_tag_source(&mut self, source: TagSource) {
        self.tag_source = source;
    }

    /// Free-list contents, for invariant checks in tests.
    #[cfg(test)]
    pub(crate) fn free_indices(&self) -> &[SlotIndex] {
        &self.free_list
    }
}

impl<T: Default + 'static> Pool<T> {
    /// Create a pool whose default constructor is `T::default`.
    pub fn with_default(capacity: usize) -> Result<Self, PoolError> {
        Self::with_constructor(capacity, T::default)
    }
}

/// Error for a tagged slot with no value; unreachable while tags and slots
/// agree.
fn unoccupied<T>(handle: Handle<T>) -> PoolError {
    PoolError::UseAfterFree {
        index: handle.index(),
        handle_tag: handle.tag(),
        live_tag: None,
    }
}

/// Panics if `handle` is stale. Use [`Pool::get`] to handle that case.
impl<T> Index<Handle<T>> for Pool<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

/// Panics if `handle` is stale. Use [`Pool::get_mut`] to handle that case.
impl<T> IndexMut<Handle<T>> for Pool<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.get_mut(handle) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("has_default_constructor", &self.has_default_constructor())
            .finish()
    }
}
