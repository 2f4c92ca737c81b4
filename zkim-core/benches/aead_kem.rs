use criterion::{black_box, criterion_group, criterion_main, Criterion};

use zkim_core::aead;
use zkim_core::kem::{HybridX25519MlKem768Provider, KemProvider};

fn bench_aead(c: &mut Criterion) {
    let key = [7u8; 32];
    let nonce = [9u8; 24];
    let plaintext = vec![0x42u8; 64 * 1024];
    let aad = b"bench-aad";

    c.bench_function("aead_seal_64kib", |b| {
        b.iter(|| aead::aead_seal(black_box(&key), black_box(&nonce), black_box(&plaintext), black_box(aad)).unwrap())
    });

    let sealed = aead::aead_seal(&key, &nonce, &plaintext, aad).unwrap();
    c.bench_function("aead_open_64kib", |b| {
        b.iter(|| aead::aead_open(black_box(&key), black_box(&nonce), black_box(&sealed), black_box(aad)).unwrap())
    });
}

fn bench_kem(c: &mut Criterion) {
    c.bench_function("hybrid_kem_keygen", |b| {
        b.iter(HybridX25519MlKem768Provider::keygen)
    });

    let (pk, sk) = HybridX25519MlKem768Provider::keygen();
    c.bench_function("hybrid_kem_encapsulate", |b| {
        b.iter(|| HybridX25519MlKem768Provider::encapsulate(black_box(&pk)).unwrap())
    });

    let (_ss, ct) = HybridX25519MlKem768Provider::encapsulate(&pk).unwrap();
    c.bench_function("hybrid_kem_decapsulate", |b| {
        b.iter(|| HybridX25519MlKem768Provider::decapsulate(black_box(&sk), black_box(&ct)).unwrap())
    });
}

criterion_group!(benches, bench_aead, bench_kem);
criterion_main!(benches);
