//! Tagpool quickstart: pools, handles, and scoped release.
//!
//! Demonstrates:
//!   1. An integer pool with a default constructor
//!   2. Stale-handle rejection after a slot is reused
//!   3. Float and string pools used through nested scoped handles
//!   4. Closure-form scopes with combined error reporting
//!
//! Run with:
//!   cargo run --example quickstart

use tagpool::{Pool, PoolError, ScopeError, ScopedHandle};

// ─── Pool sizes ─────────────────────────────────────────────────

const INT_CAPACITY: usize = 4;
const FLOAT_CAPACITY: usize = 2;
const STRING_CAPACITY: usize = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── 1. Default constructor ──────────────────────────────────
    let mut ints = Pool::with_constructor(INT_CAPACITY, || 42i32)?;
    let h = ints.allocate()?;
    println!("int value: {}", ints.get(h)?);
    ints.free(h)?;

    // ── 2. Stale handles ────────────────────────────────────────
    let reused = ints.insert(7)?;
    assert_eq!(reused.index(), h.index());
    match ints.get(h) {
        Err(e @ PoolError::UseAfterFree { .. }) => println!("stale handle rejected: {e}"),
        other => println!("unexpected: {other:?}"),
    }
    println!("reused slot {} holds {}", reused.index(), ints[reused]);

    // ── 3. Nested scoped handles ────────────────────────────────
    let mut floats: Pool<f64> = Pool::with_default(FLOAT_CAPACITY)?;
    let mut strings: Pool<String> = Pool::new(STRING_CAPACITY, None)?;
    {
        let mut f = ScopedHandle::new(&mut floats)?;
        *f.get_mut()? = 3.25;
        {
            let s = ScopedHandle::insert(&mut strings, "pooled".to_string())?;
            println!("float value: {}, string value: {}", f.get()?, s.get()?);
        }
        println!("strings free after inner scope: {}", strings.free_count());
    }
    println!("floats free after outer scope: {}", floats.free_count());

    // ── 4. Closure-form scopes ──────────────────────────────────
    let len = strings.scope_with(
        || "scoped".to_string(),
        |s| s.get().map(String::len),
    )?;
    println!("scoped string length: {len}");

    let failed: Result<(), ScopeError<&str>> = strings.scope_with(String::new, |_| Err("body failed"));
    if let Err(e) = failed {
        println!("scope reported: {e}");
    }

    println!("int pool stats: {:?}", ints.stats());
    Ok(())
}
