//! # EsoxSolutions.InflaterPool
//!
//! Thread-safe pool of reusable deflate/zlib decompression engines for
//! services that decode many short-lived streams.
//!
//! ## Features
//!
//! - One lock-free idle queue per stream variant (zlib framed or raw deflate)
//! - Lazy engine creation with a soft per-variant capacity
//! - Engines are reset on rent and on return
//! - Typed handles: only engines issued by a pool can be returned to it
//! - RAII leases that return engines on drop
//! - Pool warm-up, sync or on the tokio blocking pool
//! - Metrics with Prometheus export
//! - Optional process-wide shared pool
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_inflaterpool::{InflaterPool, PoolConfiguration, Variant};
//! use flate2::{Compression, write::DeflateEncoder};
//! use std::io::Write;
//!
//! let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
//! encoder.write_all(b"pooled inflate").unwrap();
//! let compressed = encoder.finish().unwrap();
//!
//! let pool = InflaterPool::new(PoolConfiguration::default());
//!
//! let mut engine = pool.rent(Variant::NoHeader);
//! let plain = engine.inflate_to_vec(&compressed).unwrap();
//! assert_eq!(plain, b"pooled inflate");
//! pool.return_engine(engine).unwrap();
//! ```

mod pool;
mod config;
mod engine;
mod inflater;
mod metrics;
mod shared;
mod errors;

pub use pool::{EngineLease, EnginePool, InflaterPool, PoolId, PooledEngine};
pub use config::{PoolConfiguration, DEFAULT_POOL_SIZE_PER_VARIANT};
pub use engine::{Recyclable, Variant};
pub use inflater::Inflater;
pub use metrics::PoolMetrics;
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use shared::{init_shared_pool, shared_pool};
pub use errors::{InflateError, InflateResult, PoolError, PoolResult};
