//! Generation-checked slot handles.
//!
//! A [`Handle`] names a slot in a specific pool together with the generation
//! tag the slot carried when the handle was issued. It owns nothing: the pool
//! owns every value, and a handle is only a capability to ask for it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::id::{GenTag, PoolId, SlotIndex};

/// Capability granting validated access to one slot of a [`Pool`](crate::Pool).
///
/// Handles are `Copy` and compare by value. Every copy goes stale at the same
/// moment: when the slot is freed through any of them, the pool clears the
/// slot's tag and all copies stop matching, although their bits are unchanged.
///
/// Fields are private and the constructor is crate-internal, so the only way
/// to obtain a handle is allocation from a pool.
pub struct Handle<T> {
    pool: PoolId,
    index: SlotIndex,
    tag: GenTag,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(pool: PoolId, index: SlotIndex, tag: GenTag) -> Self {
        Self {
            pool,
            index,
            tag,
            _marker: PhantomData,
        }
    }

    /// Id of the pool that issued this handle.
    pub fn pool_id(&self) -> PoolId {
        self.pool
    }

    /// Slot index this handle points at.
    pub fn index(&self) -> SlotIndex {
        self.index
    }

    /// Generation tag the slot must still carry for this handle to be valid.
    pub fn tag(&self) -> GenTag {
        self.tag
    }
}

// Manual impls: the derives would bound `T`, but a handle is plain data
// whatever it points at.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pool == other.pool && self.index == other.index && self.tag == other.tag
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.pool, self.index, self.tag).cmp(&(other.pool, other.index, other.tag))
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pool.hash(state);
        self.index.hash(state);
        self.tag.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("pool", &self.pool)
            .field("index", &self.index)
            .field("tag", &self.tag)
            .finish()
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle(pool={}, index={}, tag={})",
            self.pool, self.index, self.tag
        )
    }
}
