//! Scope-bound handles that free their slot on every exit path.
//!
//! [`ScopedHandle`] allocates on construction and frees on drop, so a slot
//! is released on normal exit, early return, `?` propagation and unwinding
//! alike. [`Pool::scope`] is the closure form: it runs a body against a
//! fresh slot and reports body and release failures together.

use crate::error::{PoolError, ScopeError};
use crate::handle::Handle;
use crate::pool::Pool;

type ReleaseErrorHandler<'p> = Box<dyn FnOnce(PoolError) + 'p>;

/// Guard owning one slot of a [`Pool`] for the duration of a scope.
///
/// Holds the pool mutably for its whole lifetime. The slot is freed exactly
/// once: by [`release`](ScopedHandle::release), or on drop if `release` was
/// never called.
///
/// A failed release on drop (possible only after misuse, e.g. freeing the
/// handle manually through [`pool_mut`](ScopedHandle::pool_mut)) is passed
/// to the handler registered with
/// [`on_release_error`](ScopedHandle::on_release_error). Without a handler
/// it is reported on stderr.
#[must_use = "dropping a ScopedHandle immediately frees its slot"]
pub struct ScopedHandle<'p, T> {
    pool: &'p mut Pool<T>,
    handle: Handle<T>,
    armed: bool,
    on_release_error: Option<ReleaseErrorHandler<'p>>,
}

impl<'p, T> ScopedHandle<'p, T> {
    /// Allocate a slot using the pool's default constructor.
    pub fn new(pool: &'p mut Pool<T>) -> Result<Self, PoolError> {
        let handle = pool.allocate()?;
        Ok(Self::wrap(pool, handle))
    }

    /// Allocate a slot using `constructor`.
    pub fn new_with<F>(pool: &'p mut Pool<T>, constructor: F) -> Result<Self, PoolError>
    where
        F: FnOnce() -> T,
    {
        let handle = pool.allocate_with(constructor)?;
        Ok(Self::wrap(pool, handle))
    }

    /// Allocate a slot holding `value`.
    pub fn insert(pool: &'p mut Pool<T>, value: T) -> Result<Self, PoolError> {
        let handle = pool.insert(value)?;
        Ok(Self::wrap(pool, handle))
    }

    fn wrap(pool: &'p mut Pool<T>, handle: Handle<T>) -> Self {
        Self {
            pool,
            handle,
            armed: true,
            on_release_error: None,
        }
    }

    /// Route a failed release on drop to `handler` instead of stderr.
    pub fn on_release_error<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(PoolError) + 'p,
    {
        self.on_release_error = Some(Box::new(handler));
        self
    }

    /// The wrapped handle.
    ///
    /// Copies taken from here go stale when the guard releases the slot.
    pub fn handle(&self) -> Handle<T> {
        self.handle
    }

    /// Borrow the pooled value.
    pub fn get(&self) -> Result<&T, PoolError> {
        self.pool.get(self.handle)
    }

    /// Mutably borrow the pooled value.
    pub fn get_mut(&mut self) -> Result<&mut T, PoolError> {
        self.pool.get_mut(self.handle)
    }

    /// The underlying pool.
    pub fn pool(&self) -> &Pool<T> {
        self.pool
    }

    /// The underlying pool, for other allocations during the scope.
    pub fn pool_mut(&mut self) -> &mut Pool<T> {
        self.pool
    }

    /// Free the slot now and return the outcome.
    ///
    /// Disarms the drop path, so the slot is never freed twice.
    pub fn release(mut self) -> Result<(), PoolError> {
        self.armed = false;
        self.pool.free(self.handle)
    }
}

impl<T> Drop for ScopedHandle<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        if let Err(e) = self.pool.free(self.handle) {
            match self.on_release_error.take() {
                Some(handler) => handler(e),
                None => eprintln!("tagpool: scoped handle {} release failed: {e}", self.handle),
            }
        }
    }
}

impl<T> Pool<T> {
    /// Run `body` against a slot allocated with the default constructor.
    ///
    /// See [`scope_with`](Pool::scope_with).
    pub fn scope<R, E, F>(&mut self, body: F) -> Result<R, ScopeError<E>>
    where
        F: FnOnce(&mut ScopedHandle<'_, T>) -> Result<R, E>,
    {
        let scoped = ScopedHandle::new(self).map_err(ScopeError::Alloc)?;
        run_scope(scoped, body)
    }

    /// Run `body` against a slot allocated with `constructor`.
    ///
    /// The slot is released after the body returns, whether it succeeded or
    /// not, and also if it panics. Release failures are never discarded:
    /// they come back as [`ScopeError::Release`] or, when the body failed
    /// too, [`ScopeError::BodyAndRelease`].
    pub fn scope_with<C, R, E, F>(&mut self, constructor: C, body: F) -> Result<R, ScopeError<E>>
    where
        C: FnOnce() -> T,
        F: FnOnce(&mut ScopedHandle<'_, T>) -> Result<R, E>,
    {
        let scoped = ScopedHandle::new_with(self, constructor).map_err(ScopeError::Alloc)?;
        run_scope(scoped, body)
    }
}

fn run_scope<T, R, E, F>(mut scoped: ScopedHandle<'_, T>, body: F) -> Result<R, ScopeError<E>>
where
    F: FnOnce(&mut ScopedHandle<'_, T>) -> Result<R, E>,
{
    let outcome = body(&mut scoped);
    match (outcome, scoped.release()) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(body), Ok(())) => Err(ScopeError::Body(body)),
        (Ok(_), Err(release)) => Err(ScopeError::Release(release)),
        (Err(body), Err(release)) => Err(ScopeError::BodyAndRelease { body, release }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn int_pool(capacity: usize) -> Pool<i32> {
        Pool::new(capacity, None).unwrap()
    }

    #[test]
    fn drop_frees_slot() {
        let mut pool = int_pool(2);
        let handle;
        {
            let scoped = ScopedHandle::insert(&mut pool, 5).unwrap();
            handle = scoped.handle();
            assert_eq!(scoped.get(), Ok(&5));
            assert_eq!(scoped.pool().free_count(), 1);
        }
        assert_eq!(pool.free_count(), 2);
        assert!(!pool.contains(handle));
        assert_eq!(pool.stats().frees, 1);
    }

    #[test]
    fn failed_allocation_builds_nothing() {
        let mut pool = int_pool(1);
        assert!(matches!(
            ScopedHandle::new(&mut pool),
            Err(PoolError::NoFactory)
        ));
        let _held = pool.insert(1).unwrap();
        assert!(matches!(
            ScopedHandle::new_with(&mut pool, || 2),
            Err(PoolError::Exhausted { capacity: 1 })
        ));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn get_mut_writes_through() {
        let mut pool = int_pool(1);
        let mut scoped = ScopedHandle::new_with(&mut pool, || 1).unwrap();
        *scoped.get_mut().unwrap() += 41;
        assert_eq!(scoped.get(), Ok(&42));
    }

    #[test]
    fn explicit_release_frees_once() {
        let mut pool = int_pool(1);
        let scoped = ScopedHandle::insert(&mut pool, 1).unwrap();
        assert_eq!(scoped.release(), Ok(()));
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.stats().frees, 1);
        assert_eq!(pool.stats().stale_rejections, 0);
    }

    #[test]
    fn manual_double_free_reaches_handler() {
        let mut pool = int_pool(2);
        let reported = RefCell::new(None);
        {
            let mut scoped = ScopedHandle::insert(&mut pool, 1)
                .unwrap()
                .on_release_error(|e| *reported.borrow_mut() = Some(e));
            let h = scoped.handle();
            scoped.pool_mut().free(h).unwrap();
            assert!(scoped.get().is_err());
        }
        assert!(matches!(
            reported.into_inner(),
            Some(PoolError::UseAfterFree { .. })
        ));
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn manual_double_free_surfaces_from_release() {
        let mut pool = int_pool(1);
        let mut scoped = ScopedHandle::insert(&mut pool, 1).unwrap();
        let h = scoped.handle();
        scoped.pool_mut().free(h).unwrap();
        assert!(matches!(
            scoped.release(),
            Err(PoolError::UseAfterFree { .. })
        ));
    }

    #[test]
    fn nested_scopes_over_separate_pools() {
        let mut floats: Pool<f64> = Pool::new(4, None).unwrap();
        let mut strings: Pool<String> = Pool::new(4, None).unwrap();
        {
            let f = ScopedHandle::new_with(&mut floats, || 1.0).unwrap();
            let s = ScopedHandle::new_with(&mut strings, || "blabla".to_string()).unwrap();
            assert_eq!(f.get(), Ok(&1.0));
            assert_eq!(s.get().map(String::as_str), Ok("blabla"));
        }
        assert!(floats.is_empty());
        assert!(strings.is_empty());
    }

    #[test]
    fn panic_inside_scope_still_frees() {
        let mut pool = int_pool(2);
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _scoped = ScopedHandle::insert(&mut pool, 1).unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn scope_returns_body_value() {
        let mut pool = int_pool(1);
        let out: Result<i32, ScopeError<PoolError>> =
            pool.scope_with(|| 20, |s| Ok(*s.get()? + 1));
        assert_eq!(out, Ok(21));
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn scope_releases_on_body_error() {
        let mut pool = int_pool(1);
        let out: Result<(), ScopeError<&str>> = pool.scope_with(|| 1, |_| Err("bad input"));
        assert_eq!(out, Err(ScopeError::Body("bad input")));
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn scope_reports_alloc_failure() {
        let mut pool = int_pool(1);
        let mut ran = false;
        let out: Result<(), ScopeError<PoolError>> = pool.scope(|_| {
            ran = true;
            Ok(())
        });
        assert_eq!(out, Err(ScopeError::Alloc(PoolError::NoFactory)));
        assert!(!ran);
    }

    #[test]
    fn scope_reports_release_failure() {
        let mut pool = int_pool(1);
        let out: Result<(), ScopeError<PoolError>> = pool.scope_with(
            || 1,
            |s| {
                let h = s.handle();
                s.pool_mut().free(h)?;
                Ok(())
            },
        );
        assert!(matches!(
            out,
            Err(ScopeError::Release(PoolError::UseAfterFree { .. }))
        ));
    }

    #[test]
    fn scope_keeps_both_errors() {
        let mut pool = int_pool(1);
        let out: Result<(), ScopeError<&str>> = pool.scope_with(
            || 1,
            |s| {
                let h = s.handle();
                let _ = s.pool_mut().remove(h);
                Err("body failed")
            },
        );
        match out {
            Err(ScopeError::BodyAndRelease { body, release }) => {
                assert_eq!(body, "body failed");
                assert!(matches!(release, PoolError::UseAfterFree { .. }));
            }
            other => panic!("expected BodyAndRelease, got {other:?}"),
        }
        assert_eq!(pool.free_count(), 1);
    }
}
