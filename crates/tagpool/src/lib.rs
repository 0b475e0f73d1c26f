//! Fixed-capacity object pool with generation-checked handles.
//!
//! A [`Pool`] stores up to `capacity` values of one type and hands out
//! [`Handle`]s instead of references. Each handle carries the generation tag
//! its slot had when it was issued; every access and free checks that tag
//! against the slot's live tag. Freeing a slot clears its tag, so every copy
//! of the handle is rejected afterwards with [`PoolError::UseAfterFree`],
//! even once the slot has been reused.
//!
//! # Architecture
//!
//! ```text
//! Pool<T>
//! ├── slots: [Option<T>]           fixed, allocated once
//! ├── tags:  [Option<GenTag>]      Some(tag) iff slot allocated
//! ├── free_list: Vec<SlotIndex>    O(1) allocate / free
//! └── TagSource                    sequential counter or seeded ChaCha8
//!
//! Handle<T>        (PoolId, SlotIndex, GenTag), Copy, non-owning
//! ScopedHandle<T>  frees its slot on drop, exactly once
//! SharedPool<T>    Arc<Mutex<Pool<T>>> for cross-thread use
//! ```
//!
//! # Example
//!
//! ```rust
//! use tagpool::{Pool, PoolError};
//!
//! let mut pool: Pool<i32> = Pool::new(2, None).unwrap();
//! let h1 = pool.insert(1).unwrap();
//! let h2 = pool.insert(2).unwrap();
//! pool.free(h1).unwrap();
//!
//! let h3 = pool.insert(3).unwrap();
//! assert_eq!(h3.index(), h1.index());
//! assert!(matches!(pool.get(h1), Err(PoolError::UseAfterFree { .. })));
//! assert_eq!(pool.get(h3), Ok(&3));
//! assert_eq!(pool.get(h2), Ok(&2));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handle;
pub mod id;
pub mod pool;
pub mod scoped;
pub mod shared;
pub mod stats;
mod tags;

// Public re-exports for the primary API surface.
pub use config::{PoolConfig, TagStrategy};
pub use error::{PoolError, ScopeError};
pub use handle::Handle;
pub use id::{GenTag, PoolId, SlotIndex};
pub use pool::{Constructor, Pool};
pub use scoped::ScopedHandle;
pub use shared::SharedPool;
pub use stats::PoolStats;
