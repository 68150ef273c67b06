// EsoxSolutions.InflaterPool
// Thread-safe pool of reusable deflate/zlib decompression engines

// This is just a binary wrapper - the actual library is in lib.rs
// Run examples with: cargo run --example basic

use esox_inflaterpool::{InflaterPool, PoolConfiguration, Variant};
use flate2::{Compression, write::ZlibEncoder};
use std::io::Write;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("EsoxSolutions.InflaterPool v{}", env!("CARGO_PKG_VERSION"));

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"the quick brown fox jumps over the lazy dog")?;
    let compressed = encoder.finish()?;

    let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(2));

    for round in 1..=3 {
        let mut engine = pool.rent(Variant::Header);
        let plain = engine.inflate_to_vec(&compressed)?;
        info!(round, "decoded {:?}", String::from_utf8_lossy(&plain));
        pool.return_engine(engine)?;
    }

    info!("Metrics: {:?}", pool.get_metrics());
    Ok(())
}
