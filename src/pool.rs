//! Variant-keyed engine pool

use crate::config::PoolConfiguration;
use crate::engine::{Recyclable, Variant};
use crate::errors::{PoolError, PoolResult};
use crate::inflater::Inflater;
use crate::metrics::PoolMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::MetricsExporter;
use crate::metrics::MetricsTracker;

use crossbeam::queue::SegQueue;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// Pool of reusable [`Inflater`]s
pub type InflaterPool = EnginePool<Inflater>;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of the pool that issued an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(u64);

impl PoolId {
    fn next() -> Self {
        PoolId(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An engine handed out by [`EnginePool::rent`].
///
/// Carries the id of the issuing pool, or nothing for a freestanding engine
/// built while pooling was disabled. Only handles carrying the right id are
/// accepted back by [`EnginePool::return_engine`].
pub struct PooledEngine<E> {
    engine: E,
    origin: Option<PoolId>,
}

impl<E> PooledEngine<E> {
    fn pooled(engine: E, origin: PoolId) -> Self {
        Self {
            engine,
            origin: Some(origin),
        }
    }

    /// Wrap an engine that does not belong to any pool
    pub fn standalone(engine: E) -> Self {
        Self { engine, origin: None }
    }

    /// Whether this engine was issued by a pool with pooling enabled
    pub fn is_pooled(&self) -> bool {
        self.origin.is_some()
    }

    pub fn origin(&self) -> Option<PoolId> {
        self.origin
    }

    /// Take the engine out; it can no longer be returned
    pub fn into_inner(self) -> E {
        self.engine
    }
}

impl<E> Deref for PooledEngine<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

impl<E> DerefMut for PooledEngine<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.engine
    }
}

impl<E: fmt::Debug> fmt::Debug for PooledEngine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledEngine")
            .field("engine", &self.engine)
            .field("origin", &self.origin)
            .finish()
    }
}

struct Shared<E> {
    id: PoolId,
    capacity: Option<usize>,
    header: SegQueue<E>,
    no_header: SegQueue<E>,
    metrics: MetricsTracker,
}

impl<E> Shared<E> {
    fn queue(&self, variant: Variant) -> &SegQueue<E> {
        match variant {
            Variant::Header => &self.header,
            Variant::NoHeader => &self.no_header,
        }
    }
}

/// Thread-safe pool keeping one idle queue per [`Variant`].
///
/// Cloning is cheap and yields another handle to the same queues, so a pool
/// can be built once and handed to every subsystem that decodes streams.
///
/// The per-variant capacity is a soft bound: `return_engine` checks the queue
/// length and then pushes without holding a lock, so concurrent returns can
/// leave a queue briefly above capacity by at most the number of racing
/// returners. Single-threaded use never exceeds it.
///
/// # Examples
///
/// ```
/// use esox_inflaterpool::{InflaterPool, PoolConfiguration, Variant};
///
/// let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(2));
///
/// let engine = pool.rent(Variant::NoHeader);
/// assert!(engine.is_pooled());
/// pool.return_engine(engine).unwrap();
///
/// assert_eq!(pool.idle_count(Variant::NoHeader), 1);
/// assert_eq!(pool.idle_count(Variant::Header), 0);
/// ```
pub struct EnginePool<E> {
    shared: Arc<Shared<E>>,
}

impl<E> Clone for EnginePool<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: Recyclable> EnginePool<E> {
    /// Create a new pool; queues start empty unless a warm-up size is set
    pub fn new(config: PoolConfiguration) -> Self {
        let pool = Self {
            shared: Arc::new(Shared {
                id: PoolId::next(),
                capacity: config.capacity(),
                header: SegQueue::new(),
                no_header: SegQueue::new(),
                metrics: MetricsTracker::new(),
            }),
        };

        debug!(
            pool = pool.shared.id.0,
            capacity = ?pool.shared.capacity,
            "engine pool created"
        );

        if let Some(count) = config.warmup_size {
            for variant in Variant::ALL {
                pool.warmup(variant, count);
            }
        }

        pool
    }

    pub fn id(&self) -> PoolId {
        self.shared.id
    }

    /// Idle capacity per variant, `None` when pooling is disabled
    pub fn capacity(&self) -> Option<usize> {
        self.shared.capacity
    }

    pub fn is_pooling_enabled(&self) -> bool {
        self.shared.capacity.is_some()
    }

    /// Number of idle engines waiting in the queue for `variant`
    pub fn idle_count(&self, variant: Variant) -> usize {
        self.shared.queue(variant).len()
    }

    /// Get an engine for `variant`, reusing an idle one when available.
    ///
    /// Never blocks and never fails. A reused engine is reset before it is
    /// handed out.
    pub fn rent(&self, variant: Variant) -> PooledEngine<E> {
        let shared = &self.shared;

        if shared.capacity.is_none() {
            shared.metrics.freestanding_created.fetch_add(1, Ordering::Relaxed);
            return PooledEngine::standalone(E::create(variant));
        }

        match shared.queue(variant).pop() {
            Some(mut engine) => {
                engine.reset();
                shared.metrics.engines_reused.fetch_add(1, Ordering::Relaxed);
                trace!(%variant, "reusing idle engine");
                PooledEngine::pooled(engine, shared.id)
            }
            None => {
                shared.metrics.engines_created.fetch_add(1, Ordering::Relaxed);
                trace!(%variant, "queue empty, creating engine");
                PooledEngine::pooled(E::create(variant), shared.id)
            }
        }
    }

    /// `rent` keyed by a "raw stream" flag
    pub fn rent_no_header(&self, no_header: bool) -> PooledEngine<E> {
        self.rent(Variant::from_no_header(no_header))
    }

    /// Rent an engine that goes back to the pool when dropped
    pub fn lease(&self, variant: Variant) -> EngineLease<E> {
        EngineLease {
            engine: Some(self.rent(variant)),
            pool: self.clone(),
        }
    }

    /// Give an engine back to the pool.
    ///
    /// With pooling disabled this only drops the engine. Otherwise the handle
    /// must have been issued by this pool, or `InvalidArgument` is returned
    /// and no queue is touched. An engine arriving at a full queue is dropped.
    pub fn return_engine(&self, handle: PooledEngine<E>) -> PoolResult<()> {
        let shared = &self.shared;

        let Some(capacity) = shared.capacity else {
            return Ok(());
        };

        if handle.origin != Some(shared.id) {
            shared.metrics.returns_rejected.fetch_add(1, Ordering::Relaxed);
            warn!(
                pool = shared.id.0,
                origin = ?handle.origin,
                "rejected engine not issued by this pool"
            );
            return Err(PoolError::InvalidArgument(match handle.origin {
                Some(other) => format!("engine was issued by pool {}, not pool {}", other.0, shared.id.0),
                None => "engine was not issued by a pool".to_string(),
            }));
        }

        let mut engine = handle.into_inner();
        let variant = engine.variant();
        let queue = shared.queue(variant);

        // Length check and push are not atomic together
        if queue.len() < capacity {
            engine.reset();
            queue.push(engine);
            shared.metrics.engines_returned.fetch_add(1, Ordering::Relaxed);
            trace!(%variant, "engine returned to queue");
        } else {
            shared.metrics.engines_discarded.fetch_add(1, Ordering::Relaxed);
            trace!(%variant, capacity, "queue full, discarding engine");
        }

        Ok(())
    }

    /// Pre-create idle engines for `variant`, up to the capacity.
    ///
    /// Returns how many engines were added.
    pub fn warmup(&self, variant: Variant, count: usize) -> usize {
        let Some(capacity) = self.shared.capacity else {
            return 0;
        };

        let added = warm_queue(&self.shared, variant, count, capacity);
        debug!(%variant, added, "warmed engine queue");
        added
    }

    /// Warm up on the blocking thread pool
    pub async fn warmup_async(&self, variant: Variant, count: usize) -> PoolResult<usize> {
        let Some(capacity) = self.shared.capacity else {
            return Ok(0);
        };

        let shared = Arc::clone(&self.shared);
        let added = tokio::task::spawn_blocking(move || warm_queue(&shared, variant, count, capacity))
            .await
            .map_err(|_| PoolError::Cancelled)?;

        debug!(%variant, added, "warmed engine queue");
        Ok(added)
    }

    /// Drop every idle engine, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        for variant in Variant::ALL {
            while self.shared.queue(variant).pop().is_some() {
                dropped += 1;
            }
        }
        self.shared.metrics.engines_cleared.fetch_add(dropped, Ordering::Relaxed);
        debug!(dropped, "cleared idle engines");
        dropped
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.shared.metrics.get_metrics(
            self.shared.header.len(),
            self.shared.no_header.len(),
            self.shared.capacity.unwrap_or(0),
        )
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> PoolResult<String> {
        MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }
}

fn warm_queue<E: Recyclable>(shared: &Shared<E>, variant: Variant, count: usize, capacity: usize) -> usize {
    let queue = shared.queue(variant);
    let mut added = 0;

    while added < count && queue.len() < capacity {
        queue.push(E::create(variant));
        added += 1;
    }

    shared.metrics.engines_warmed.fetch_add(added, Ordering::Relaxed);
    added
}

impl<E> fmt::Debug for EnginePool<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnginePool")
            .field("id", &self.shared.id)
            .field("capacity", &self.shared.capacity)
            .field("idle_header", &self.shared.header.len())
            .field("idle_no_header", &self.shared.no_header.len())
            .finish()
    }
}

/// A rented engine that is returned to its pool when dropped
///
/// # Examples
///
/// ```
/// use esox_inflaterpool::{InflaterPool, PoolConfiguration, Variant};
///
/// let pool = InflaterPool::new(PoolConfiguration::default());
/// {
///     let engine = pool.lease(Variant::Header);
///     assert_eq!(engine.total_in(), 0);
///     // Engine goes back to the pool when `engine` goes out of scope
/// }
/// assert_eq!(pool.idle_count(Variant::Header), 1);
/// ```
pub struct EngineLease<E: Recyclable> {
    engine: Option<PooledEngine<E>>,
    pool: EnginePool<E>,
}

impl<E: Recyclable> EngineLease<E> {
    /// Stop automatic return and hand back the plain handle
    pub fn detach(mut self) -> PooledEngine<E> {
        self.engine.take().expect("Engine already taken")
    }
}

impl<E: Recyclable> Deref for EngineLease<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        self.engine.as_ref().expect("Engine already taken")
    }
}

impl<E: Recyclable> DerefMut for EngineLease<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine.as_mut().expect("Engine already taken")
    }
}

impl<E: Recyclable> Drop for EngineLease<E> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            if let Err(err) = self.pool.return_engine(engine) {
                warn!(error = %err, "leased engine could not be returned");
            }
        }
    }
}
