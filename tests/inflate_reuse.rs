use esox_inflaterpool::{
    Inflater, InflateError, InflaterPool, PoolConfiguration, PoolError, PooledEngine, Variant,
};
use flate2::Compression;
use flate2::write::{DeflateEncoder, ZlibEncoder};
use std::io::Write;
use std::thread;

fn compress(variant: Variant, data: &[u8]) -> Vec<u8> {
    match variant {
        Variant::Header => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        Variant::NoHeader => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
    }
}

fn payload(seed: usize, len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + seed) % 97) as u8).collect()
}

fn assert_fresh(engine: &Inflater, variant: Variant) {
    let fresh = Inflater::new(variant);
    assert_eq!(engine.variant(), fresh.variant());
    assert_eq!(engine.total_in(), fresh.total_in());
    assert_eq!(engine.total_out(), fresh.total_out());
    assert_eq!(engine.is_finished(), fresh.is_finished());
}

#[test]
fn test_reused_engine_matches_fresh_engine() {
    for variant in Variant::ALL {
        let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(1));

        let mut engine = pool.rent(variant);
        engine.inflate_to_vec(&compress(variant, &payload(1, 5000))).unwrap();
        assert!(engine.is_finished());
        pool.return_engine(engine).unwrap();

        let mut engine = pool.rent(variant);
        assert_eq!(pool.get_metrics().engines_reused, 1);
        assert_fresh(&engine, variant);

        let data = payload(2, 7000);
        assert_eq!(engine.inflate_to_vec(&compress(variant, &data)).unwrap(), data);
    }
}

#[test]
fn test_abandoned_mid_stream_engine_is_reset() {
    let pool = InflaterPool::new(PoolConfiguration::default());
    let compressed = compress(Variant::Header, &payload(3, 40_000));

    let mut engine = pool.rent(Variant::Header);
    let mut scratch = Vec::new();
    engine.inflate_into(&compressed[..64], &mut scratch).unwrap();
    assert!(!engine.is_finished());
    pool.return_engine(engine).unwrap();

    let mut engine = pool.rent(Variant::Header);
    assert_fresh(&engine, Variant::Header);
    assert_eq!(engine.inflate_to_vec(&compressed).unwrap(), payload(3, 40_000));
}

#[test]
fn test_engine_after_corrupt_stream_is_usable() {
    let pool = InflaterPool::new(PoolConfiguration::default());

    let mut engine = pool.rent(Variant::NoHeader);
    let result = engine.inflate_to_vec(&[0xFF; 16]);
    assert!(matches!(result, Err(InflateError::Corrupt(_))));
    pool.return_engine(engine).unwrap();

    let mut engine = pool.rent(Variant::NoHeader);
    let data = payload(4, 1000);
    assert_eq!(engine.inflate_to_vec(&compress(Variant::NoHeader, &data)).unwrap(), data);
}

#[test]
fn test_foreign_inflater_is_rejected() {
    let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(2));
    let foreign = PooledEngine::standalone(Inflater::new(Variant::Header));

    let err = pool.return_engine(foreign).unwrap_err();

    assert!(matches!(err, PoolError::InvalidArgument(_)));
    assert!(err.to_string().starts_with("Invalid argument"));
    assert_eq!(pool.idle_count(Variant::Header), 0);
    assert_eq!(pool.idle_count(Variant::NoHeader), 0);
}

#[test]
fn test_parallel_decoding() {
    let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(2));
    let streams: Vec<(Variant, Vec<u8>, Vec<u8>)> = (0..16)
        .map(|i| {
            let variant = Variant::ALL[i % 2];
            let data = payload(i, 2000 + i * 300);
            (variant, compress(variant, &data), data)
        })
        .collect();

    thread::scope(|scope| {
        for worker in 0..4 {
            let pool = pool.clone();
            let streams = &streams;
            scope.spawn(move || {
                for round in 0..50 {
                    let (variant, compressed, expected) = &streams[(worker + round) % streams.len()];
                    let mut engine = pool.lease(*variant);
                    assert_eq!(&engine.inflate_to_vec(compressed).unwrap(), expected);
                }
            });
        }
    });

    let metrics = pool.get_metrics();
    assert!(metrics.idle_header <= 2 + 4);
    assert!(metrics.engines_reused > 0);
    assert_eq!(metrics.outstanding(), 0);
}

#[tokio::test]
async fn test_async_warmup_then_decode() {
    let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(3));

    assert_eq!(pool.warmup_async(Variant::Header, 5).await.unwrap(), 3);

    let data = payload(9, 3000);
    let mut engine = pool.rent(Variant::Header);
    assert_eq!(engine.inflate_to_vec(&compress(Variant::Header, &data)).unwrap(), data);
    assert_eq!(pool.idle_count(Variant::Header), 2);
    let metrics = pool.get_metrics();
    assert_eq!(metrics.engines_created, 0);
    assert_eq!(metrics.engines_warmed, 3);
    assert_eq!(metrics.live_engines(), metrics.idle_header + metrics.outstanding());
}
