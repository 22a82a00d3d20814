//! key_share negotiation benchmarks
//!
//! This benchmark suite measures:
//! - ClientHello key_share production per named group
//! - One full ClientHello / ServerHello key_share round
//! - ClientHello key_share decoding

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hsneg_core::key_share::ChKeyShareSpec;
use hsneg_core::ssl_extension::{consume_extensions, produce_extensions};
use hsneg_core::{
    ClientHandshakeContext, Config, ExtensionType, HandshakeType, NamedGroup, ProtocolVersion,
    ServerHandshakeContext, SslContext,
};
use hsneg_crypto::CryptoProvider;
use hsneg_crypto_rustcrypto::RustCryptoProvider;

const GROUPS: [NamedGroup; 4] = [
    NamedGroup::X25519,
    NamedGroup::SECP256R1,
    NamedGroup::SECP384R1,
    NamedGroup::FFDHE2048,
];

fn ssl_context(group: NamedGroup) -> Arc<SslContext> {
    let config = Config::builder()
        .with_protocol_versions(&[ProtocolVersion::Tls13])
        .with_named_groups(&[group])
        .build()
        .unwrap();
    Arc::new(SslContext::new(config, Arc::new(RustCryptoProvider::new())))
}

/// Benchmark ClientHello extension production (key generation dominates)
fn benchmark_client_hello(c: &mut Criterion) {
    let mut group = c.benchmark_group("client_hello_key_share");

    for named_group in GROUPS {
        let ssl = ssl_context(named_group);
        group.bench_with_input(
            BenchmarkId::new("produce", named_group.name()),
            &ssl,
            |b, ssl| {
                b.iter(|| {
                    let mut client = ClientHandshakeContext::new(Arc::clone(ssl));
                    black_box(produce_extensions(&mut client, HandshakeType::ClientHello).unwrap())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark a ClientHello / ServerHello key_share round
fn benchmark_full_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_share_round");

    for named_group in GROUPS {
        let ssl = ssl_context(named_group);
        group.bench_with_input(
            BenchmarkId::new("round", named_group.name()),
            &ssl,
            |b, ssl| {
                b.iter(|| {
                    let mut client = ClientHandshakeContext::new(Arc::clone(ssl));
                    let mut server = ServerHandshakeContext::new(Arc::clone(ssl));
                    server.negotiated_protocol = Some(ProtocolVersion::Tls13);

                    let ch = produce_extensions(&mut client, HandshakeType::ClientHello).unwrap();
                    consume_extensions(&mut server, HandshakeType::ClientHello, &ch).unwrap();
                    let sh = produce_extensions(&mut server, HandshakeType::ServerHello).unwrap();
                    consume_extensions(&mut client, HandshakeType::ServerHello, &sh).unwrap();

                    let ke = client.handshake_key_exchange.unwrap();
                    black_box(ke.create_key_derivation(&client).unwrap())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark decoding of a received key_share list
fn benchmark_decode(c: &mut Criterion) {
    let ssl = ssl_context(NamedGroup::SECP384R1);
    let mut client = ClientHandshakeContext::new(ssl);
    let extensions = produce_extensions(&mut client, HandshakeType::ClientHello).unwrap();
    let data = extensions.get(ExtensionType::KeyShare).unwrap().data.clone();

    c.bench_function("decode_client_key_share", |b| {
        b.iter(|| black_box(ChKeyShareSpec::decode(black_box(&data)).unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_client_hello,
    benchmark_full_round,
    benchmark_decode
);
criterion_main!(benches);
