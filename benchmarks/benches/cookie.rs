//! HelloRetryRequest cookie benchmarks
//!
//! This benchmark suite measures:
//! - Cookie creation for SHA-256 and SHA-384 suites
//! - Cookie validation including HelloRetryRequest reproduction

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hsneg_core::messages::ClientHelloMessage;
use hsneg_core::{CipherSuite, Config, ProtocolVersion, ServerHandshakeContext, SslContext};
use hsneg_crypto::CryptoProvider;
use hsneg_crypto_rustcrypto::RustCryptoProvider;

const SUITES: [CipherSuite; 2] = [CipherSuite::Aes128GcmSha256, CipherSuite::Aes256GcmSha384];

fn ssl_context() -> Arc<SslContext> {
    let config = Config::builder().build().unwrap();
    Arc::new(SslContext::new(config, Arc::new(RustCryptoProvider::new())))
}

fn first_flight(
    ssl: &Arc<SslContext>,
    suite: CipherSuite,
    client_hello: &ClientHelloMessage,
) -> ServerHandshakeContext {
    let mut server = ServerHandshakeContext::new(Arc::clone(ssl));
    server.negotiated_protocol = Some(ProtocolVersion::Tls13);
    server.negotiated_cipher_suite = Some(suite);
    server
        .transcript
        .update(&client_hello.to_handshake_message().unwrap());
    server
}

fn benchmark_cookie(c: &mut Criterion) {
    let ssl = ssl_context();
    let manager = ssl
        .cookie_managers()
        .value_of(ProtocolVersion::Tls13)
        .unwrap()
        .unwrap();
    let mut group = c.benchmark_group("hello_retry_cookie");

    for suite in SUITES {
        let client_hello =
            ClientHelloMessage::new([7; 32], &[suite]).with_session_id(vec![9; 32]);

        group.bench_with_input(
            BenchmarkId::new("create", suite.name()),
            &client_hello,
            |b, ch| {
                b.iter(|| {
                    let mut server = first_flight(&ssl, suite, ch);
                    black_box(manager.create_cookie(&mut server, ch).unwrap())
                });
            },
        );

        let mut server = first_flight(&ssl, suite, &client_hello);
        let cookie = manager.create_cookie(&mut server, &client_hello).unwrap();
        group.bench_with_input(
            BenchmarkId::new("validate", suite.name()),
            &client_hello,
            |b, ch| {
                b.iter(|| {
                    let mut retry = ServerHandshakeContext::new(Arc::clone(&ssl));
                    retry.negotiated_protocol = Some(ProtocolVersion::Tls13);
                    assert!(manager.is_cookie_valid(&mut retry, ch, black_box(&cookie)));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_cookie);
criterion_main!(benches);
