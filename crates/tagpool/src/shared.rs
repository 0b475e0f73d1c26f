//! Mutex-guarded pool for sharing between threads.
//!
//! [`Pool`] assumes a single owner. [`SharedPool`] puts it behind an
//! `Arc<Mutex<_>>` so every operation (allocate, free, access) runs as one
//! atomic unit. Access goes through closures executed under the lock, so no
//! view of a pooled value can outlive the critical section in which it was
//! validated.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::PoolError;
use crate::handle::Handle;
use crate::pool::Pool;
use crate::stats::PoolStats;

/// Cloneable, thread-safe wrapper around a [`Pool`].
///
/// Clones share the same pool. A panic while the lock is held (for example
/// inside a `with` closure) poisons it; later calls then fail with
/// [`PoolError::Poisoned`].
pub struct SharedPool<T> {
    inner: Arc<Mutex<Pool<T>>>,
}

impl<T> SharedPool<T> {
    /// Share `pool`.
    pub fn new(pool: Pool<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Pool<T>>, PoolError> {
        self.inner.lock().map_err(|_| PoolError::Poisoned)
    }

    /// See [`Pool::allocate`].
    pub fn allocate(&self) -> Result<Handle<T>, PoolError> {
        self.lock()?.allocate()
    }

    /// See [`Pool::allocate_with`]. The constructor runs under the lock.
    pub fn allocate_with<F>(&self, constructor: F) -> Result<Handle<T>, PoolError>
    where
        F: FnOnce() -> T,
    {
        self.lock()?.allocate_with(constructor)
    }

    /// See [`Pool::insert`].
    pub fn insert(&self, value: T) -> Result<Handle<T>, PoolError> {
        self.lock()?.insert(value)
    }

    /// See [`Pool::free`].
    pub fn free(&self, handle: Handle<T>) -> Result<(), PoolError> {
        self.lock()?.free(handle)
    }

    /// See [`Pool::remove`].
    pub fn remove(&self, handle: Handle<T>) -> Result<T, PoolError> {
        self.lock()?.remove(handle)
    }

    /// Run `f` on the value behind `handle` while holding the lock.
    pub fn with<R, F>(&self, handle: Handle<T>, f: F) -> Result<R, PoolError>
    where
        F: FnOnce(&T) -> R,
    {
        let pool = self.lock()?;
        pool.get(handle).map(f)
    }

    /// Run `f` on the value behind `handle` mutably while holding the lock.
    pub fn with_mut<R, F>(&self, handle: Handle<T>, f: F) -> Result<R, PoolError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut pool = self.lock()?;
        pool.get_mut(handle).map(f)
    }

    /// See [`Pool::contains`]. A poisoned lock reports `false`.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.lock().map(|pool| pool.contains(handle)).unwrap_or(false)
    }

    /// See [`Pool::len`].
    pub fn len(&self) -> Result<usize, PoolError> {
        Ok(self.lock()?.len())
    }

    /// See [`Pool::is_empty`].
    pub fn is_empty(&self) -> Result<bool, PoolError> {
        Ok(self.lock()?.is_empty())
    }

    /// See [`Pool::stats`].
    pub fn stats(&self) -> Result<PoolStats, PoolError> {
        Ok(self.lock()?.stats())
    }

    /// Recover the pool if this is the last clone.
    ///
    /// Returns `self` back when other clones are still alive. A poisoned
    /// pool is recovered as-is: with no other owner left, nothing can be
    /// mid-operation on it.
    pub fn try_unwrap(self) -> Result<Pool<T>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<T> Clone for SharedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> From<Pool<T>> for SharedPool<T> {
    fn from(pool: Pool<T>) -> Self {
        Self::new(pool)
    }
}

impl<T> fmt::Debug for SharedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Ok(pool) => f.debug_tuple("SharedPool").field(&*pool).finish(),
            Err(_) => f.write_str("SharedPool(<locked>)"),
        }
    }
}
