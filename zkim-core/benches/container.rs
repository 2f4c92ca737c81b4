use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use zkim_core::engine::{self, EncryptParams};
use zkim_core::model::{Metadata, BUCKET_SIZES, DEFAULT_CHUNK_SIZE};
use zkim_core::signature;
use zkim_core::wire;

fn make_params<'a>(
    metadata: Metadata,
    platform: &'a signature::SigningKeyPair,
    user: &'a signature::SigningKeyPair,
    content: &'a signature::SigningKeyPair,
) -> EncryptParams<'a> {
    EncryptParams {
        user_id: b"bench-user".to_vec(),
        platform_key_id: b"bench-platform".to_vec(),
        platform_key_material: b"platform-key-material",
        user_key_material: b"user-key-material",
        metadata,
        searchable_text: "quarterly plan benchmark payload".into(),
        created_at: 0,
        chunk_size: DEFAULT_CHUNK_SIZE,
        codec: None,
        compression_level: 0,
        buckets: BUCKET_SIZES,
        platform_signing_key: platform,
        user_signing_key: user,
        content_signing_key: content,
    }
}

fn bench_encrypt(c: &mut Criterion) {
    let platform = signature::generate_keypair();
    let user = signature::generate_keypair();
    let content = signature::generate_keypair();

    let mut group = c.benchmark_group("encrypt_container");
    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let plaintext = vec![0x5au8; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &plaintext, |b, pt| {
            b.iter(|| {
                let params = make_params(
                    Metadata::new("bench.bin", "application/octet-stream", 0),
                    &platform,
                    &user,
                    &content,
                );
                engine::encrypt_container(black_box(pt), params).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let platform = signature::generate_keypair();
    let user = signature::generate_keypair();
    let content = signature::generate_keypair();

    let plaintext = vec![0xa5u8; 256 * 1024];
    let params = make_params(
        Metadata::new("bench.bin", "application/octet-stream", 0),
        &platform,
        &user,
        &content,
    );
    let out = engine::encrypt_container(&plaintext, params).unwrap();
    let bytes = wire::encode(&out.container).unwrap();

    c.bench_function("wire_decode_256kib", |b| {
        b.iter(|| wire::decode(black_box(&bytes)).unwrap())
    });

    let decoded = wire::decode(&bytes).unwrap();
    c.bench_function("decrypt_container_256kib", |b| {
        b.iter(|| engine::decrypt_container(black_box(&decoded), b"user-key-material", None).unwrap())
    });
}

criterion_group!(benches, bench_encrypt, bench_roundtrip);
criterion_main!(benches);
