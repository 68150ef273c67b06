//! Process-wide inflater pool

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::pool::InflaterPool;

use std::sync::OnceLock;
use tracing::debug;

static SHARED_POOL: OnceLock<InflaterPool> = OnceLock::new();

/// Get the process-wide pool, creating it with default settings on first use.
///
/// Prefer building an [`InflaterPool`] and passing it where it is needed;
/// this accessor is for code that has no natural owner for one.
///
/// # Examples
///
/// ```
/// use esox_inflaterpool::{shared_pool, Variant};
///
/// let engine = shared_pool().rent(Variant::NoHeader);
/// shared_pool().return_engine(engine).unwrap();
/// ```
pub fn shared_pool() -> &'static InflaterPool {
    SHARED_POOL.get_or_init(|| InflaterPool::new(PoolConfiguration::default()))
}

/// Install the process-wide pool with an explicit configuration.
///
/// Fails with `AlreadyInitialized` once the shared pool exists, whether it
/// was created here or by an earlier `shared_pool()` call.
pub fn init_shared_pool(config: PoolConfiguration) -> PoolResult<&'static InflaterPool> {
    let mut installed = false;
    let pool = SHARED_POOL.get_or_init(|| {
        installed = true;
        InflaterPool::new(config)
    });

    if !installed {
        return Err(PoolError::AlreadyInitialized);
    }

    debug!(capacity = ?pool.capacity(), "shared inflater pool installed");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Variant;

    // Only test in this binary that touches the static
    #[test]
    fn test_shared_pool_initialization() {
        let installed = init_shared_pool(PoolConfiguration::new().with_pool_size_per_variant(3)).unwrap();
        let pool = shared_pool();

        assert!(std::ptr::eq(installed, pool));
        assert_eq!(pool.capacity(), Some(3));

        let again = init_shared_pool(PoolConfiguration::default());
        assert_eq!(again.unwrap_err(), PoolError::AlreadyInitialized);

        let engine = pool.rent(Variant::Header);
        assert!(pool.return_engine(engine).is_ok());
    }
}
