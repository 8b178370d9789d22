use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use genusdb_auth::{ClaimSet, Role, TokenCodec, TokenKey, UserRecord};
use genusdb_core::Genus;

fn sample_claims() -> ClaimSet {
    let user = UserRecord::new(
        42,
        "Benchmark User",
        Role::Writer,
        Genus::new("hymenobacter").expect("valid genus"),
    );
    ClaimSet::issue(&user, 1_700_000_000, "https://bench.example")
}

fn codecs() -> Vec<(&'static str, TokenCodec)> {
    vec![
        (
            "HS256",
            TokenCodec::new(
                TokenKey::hmac(b"benchmark-secret-benchmark-secret-0".to_vec()).expect("secret"),
            ),
        ),
        (
            "EdDSA",
            TokenCodec::new(TokenKey::ed25519_from_seed(&[1u8; 32]).expect("seed")),
        ),
    ]
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_encode");
    let claims = sample_claims();

    for (alg, codec) in codecs() {
        group.bench_with_input(BenchmarkId::from_parameter(alg), &codec, |b, codec| {
            b.iter(|| codec.encode(black_box(&claims)).expect("encode"));
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_decode");
    let claims = sample_claims();

    for (alg, codec) in codecs() {
        let token = codec.encode(&claims).expect("encode");
        group.bench_with_input(BenchmarkId::from_parameter(alg), &codec, |b, codec| {
            b.iter(|| codec.decode(black_box(&token)).expect("decode"));
        });
    }

    group.finish();
}

fn bench_reject_forged(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_reject_forged");
    let claims = sample_claims();

    for (alg, codec) in codecs() {
        let token = codec.encode(&claims).expect("encode");
        let (signed, _) = token.rsplit_once('.').expect("three segments");
        let forged = format!("{signed}.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        group.bench_with_input(BenchmarkId::from_parameter(alg), &codec, |b, codec| {
            b.iter(|| codec.decode(black_box(&forged)).is_err());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_reject_forged);
criterion_main!(benches);
