//! Basic usage examples for InflaterPool

use esox_inflaterpool::{InflaterPool, PoolConfiguration, PooledEngine, Inflater, Variant};
use flate2::{Compression, write::DeflateEncoder, write::ZlibEncoder};
use std::io::Write;

fn main() {
    println!("=== EsoxSolutions.InflaterPool - Basic Examples ===\n");

    // Example 1: Rent and return
    rent_and_return();

    // Example 2: Leases return themselves
    leases();

    // Example 3: Pooling disabled
    disabled_pool();

    // Example 4: Metrics
    metrics();
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn rent_and_return() {
    println!("1. Rent and Return:");
    let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(4));

    let mut engine = pool.rent(Variant::Header);
    let plain = engine.inflate_to_vec(&zlib(b"framed payload")).unwrap();
    println!("   Decoded: {}", String::from_utf8_lossy(&plain));
    pool.return_engine(engine).unwrap();

    println!("   Idle header engines: {}\n", pool.idle_count(Variant::Header));
}

fn leases() {
    println!("2. Leases:");
    let pool = InflaterPool::new(PoolConfiguration::default());

    {
        let mut engine = pool.lease(Variant::NoHeader);
        let plain = engine.inflate_to_vec(&deflate(b"raw payload")).unwrap();
        println!("   Decoded: {}", String::from_utf8_lossy(&plain));
        // Engine returned when dropped
    }

    println!("   Idle raw engines: {}\n", pool.idle_count(Variant::NoHeader));
}

fn disabled_pool() {
    println!("3. Disabled Pool:");
    let pool = InflaterPool::new(PoolConfiguration::disabled());

    let engine = pool.rent(Variant::Header);
    println!("   Pooled handle: {}", engine.is_pooled());
    pool.return_engine(engine).unwrap();
    println!("   Idle after return: {}", pool.idle_count(Variant::Header));

    let enabled = InflaterPool::new(PoolConfiguration::default());
    let foreign = PooledEngine::standalone(Inflater::new(Variant::Header));
    match enabled.return_engine(foreign) {
        Ok(()) => println!("   Foreign engine accepted"),
        Err(err) => println!("   Foreign engine rejected: {}\n", err),
    }
}

fn metrics() {
    println!("4. Metrics:");
    let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(1));

    let first = pool.rent(Variant::Header);
    let second = pool.rent(Variant::Header);
    pool.return_engine(first).unwrap();
    pool.return_engine(second).unwrap();
    let _reused = pool.rent(Variant::Header);

    for (key, value) in pool.export_metrics() {
        println!("     {}: {}", key, value);
    }
}
