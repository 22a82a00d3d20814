//! Integration tests for the HelloRetryRequest round trip.
//!
//! This tests the full flow:
//! 1. Client offers a key share for a group the server does not enable
//! 2. Server answers with a HelloRetryRequest carrying a cookie
//! 3. Client retries with the selected group and echoes the cookie
//! 4. Server validates the cookie, with and without its first-flight
//!    state, and rebuilds the transcript the client holds

use std::sync::Arc;

use hsneg_core::alert::Alert;
use hsneg_core::messages::{hello_retry_request, ClientHelloMessage, HelloRetryRequest};
use hsneg_core::ssl_extension::{consume_extensions, produce_extensions};
use hsneg_core::{
    AlertDescription, CipherSuite, ClientHandshakeContext, Config, ExtensionType, HandshakeType,
    NamedGroup, ProtocolVersion, ServerHandshakeContext, SslContext,
};
use hsneg_crypto::CryptoProvider;
use hsneg_crypto_rustcrypto::RustCryptoProvider;

const SUITE: CipherSuite = CipherSuite::Aes256GcmSha384;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn ssl_context(groups: &[NamedGroup]) -> Arc<SslContext> {
    let config = Config::builder()
        .with_protocol_versions(&[ProtocolVersion::Tls13])
        .with_named_groups(groups)
        .build()
        .unwrap();
    Arc::new(SslContext::new(
        config,
        Arc::new(<RustCryptoProvider as CryptoProvider>::new()),
    ))
}

/// Build a ClientHello from the client's current extension state.
fn client_hello(client: &mut ClientHandshakeContext) -> (ClientHelloMessage, Vec<u8>) {
    let extensions = produce_extensions(client, HandshakeType::ClientHello).unwrap();
    let hello = ClientHelloMessage::new([0x5a; 32], &[SUITE])
        .with_session_id(vec![0xab; 32])
        .with_extensions(extensions);
    let wire = hello.to_handshake_message().unwrap();
    client.transcript.update(&wire);
    (hello, wire)
}

/// Hand a ClientHello to a server the way the connection layer does.
fn receive_client_hello(
    server: &mut ServerHandshakeContext,
    wire: &[u8],
) -> hsneg_core::Result<()> {
    let hello = ClientHelloMessage::decode(&wire[4..])?;
    server.negotiated_protocol = Some(ProtocolVersion::Tls13);
    server.transcript.update(wire);
    server.client_hello = Some(hello.clone());
    consume_extensions(server, HandshakeType::ClientHello, &hello.extensions)
}

fn receive_hello_retry_request(client: &mut ClientHandshakeContext, wire: &[u8]) {
    let hrr = HelloRetryRequest::decode(&wire[4..]).unwrap();
    client.negotiated_protocol = Some(ProtocolVersion::Tls13);
    client.negotiated_cipher_suite = Some(hrr.cipher_suite);
    client.transcript.determine(hrr.cipher_suite.hash_algorithm());
    let provider = Arc::clone(client.ssl_context());
    client
        .transcript
        .collapse_to_message_hash(provider.provider())
        .unwrap();
    client.transcript.update(wire);
    consume_extensions(client, HandshakeType::HelloRetryRequest, &hrr.extensions).unwrap();
}

struct RetryFlight {
    client: ClientHandshakeContext,
    first_server: ServerHandshakeContext,
    hello_retry_request: Vec<u8>,
    retried_hello: Vec<u8>,
}

/// Run the exchange up to the retried ClientHello.
fn retry_flight(client_ssl: &Arc<SslContext>, server_ssl: &Arc<SslContext>) -> RetryFlight {
    let mut client = ClientHandshakeContext::new(Arc::clone(client_ssl));
    let (_, ch1) = client_hello(&mut client);

    let mut first_server = ServerHandshakeContext::new(Arc::clone(server_ssl));
    receive_client_hello(&mut first_server, &ch1).unwrap();
    assert!(first_server
        .handshake_producers
        .contains(&HandshakeType::HelloRetryRequest));
    first_server.negotiated_cipher_suite = Some(SUITE);
    let hello_retry_request = hello_retry_request::produce(&mut first_server).unwrap();

    receive_hello_retry_request(&mut client, &hello_retry_request);
    let (_, retried_hello) = client_hello(&mut client);

    RetryFlight {
        client,
        first_server,
        hello_retry_request,
        retried_hello,
    }
}

#[test]
fn test_stateless_retry_flow() {
    init_tracing();
    let client_ssl = ssl_context(&[NamedGroup::X25519, NamedGroup::SECP256R1]);
    let server_ssl = ssl_context(&[NamedGroup::SECP384R1, NamedGroup::SECP256R1]);
    let mut flight = retry_flight(&client_ssl, &server_ssl);

    assert_eq!(flight.client.server_selected_group, Some(NamedGroup::SECP256R1));
    let hrr = HelloRetryRequest::decode(&flight.hello_retry_request[4..]).unwrap();
    let order: Vec<ExtensionType> = hrr.extensions.iter().map(|e| e.extension_type).collect();
    assert_eq!(
        order,
        vec![ExtensionType::SupportedVersions, ExtensionType::KeyShare, ExtensionType::Cookie]
    );
    // The first server forgets everything once the request is out.
    assert_eq!(flight.first_server.transcript.message_count(), 0);
    assert!(flight.first_server.handshake_extensions.is_empty());

    // A server that never saw the first ClientHello picks up the retry.
    let mut server = ServerHandshakeContext::new(Arc::clone(&server_ssl));
    receive_client_hello(&mut server, &flight.retried_hello).unwrap();
    assert_eq!(server.negotiated_cipher_suite, Some(SUITE));
    assert_eq!(server.handshake_credentials.len(), 1);
    assert_eq!(server.handshake_credentials[0].group(), NamedGroup::SECP256R1);

    let provider = server_ssl.provider();
    assert_eq!(
        server.transcript.digest(provider).unwrap(),
        flight.client.transcript.digest(provider).unwrap()
    );

    let retried = server.client_hello.clone().unwrap();
    let reproduced = hello_retry_request::reproduce(&mut server, &retried).unwrap();
    assert_eq!(reproduced, flight.hello_retry_request);

    let server_hello = produce_extensions(&mut server, HandshakeType::ServerHello).unwrap();
    consume_extensions(&mut flight.client, HandshakeType::ServerHello, &server_hello).unwrap();

    let client_ke = flight.client.handshake_key_exchange.unwrap();
    let server_ke = server.handshake_key_exchange.unwrap();
    assert_eq!(
        client_ke.create_key_derivation(&flight.client).unwrap().shared_secret().as_bytes(),
        server_ke.create_key_derivation(&server).unwrap().shared_secret().as_bytes()
    );
}

#[test]
fn test_first_server_continues_after_retry() {
    init_tracing();
    let client_ssl = ssl_context(&[NamedGroup::X25519, NamedGroup::SECP384R1]);
    let server_ssl = ssl_context(&[NamedGroup::SECP384R1]);
    let RetryFlight {
        client,
        mut first_server,
        retried_hello,
        ..
    } = retry_flight(&client_ssl, &server_ssl);

    receive_client_hello(&mut first_server, &retried_hello).unwrap();
    let provider = server_ssl.provider();
    assert_eq!(
        first_server.transcript.digest(provider).unwrap(),
        client.transcript.digest(provider).unwrap()
    );
    assert_eq!(first_server.handshake_credentials[0].group(), NamedGroup::SECP384R1);
}

#[test]
fn test_cookie_from_other_server_rejected() {
    init_tracing();
    let client_ssl = ssl_context(&[NamedGroup::X25519, NamedGroup::SECP256R1]);
    let server_ssl = ssl_context(&[NamedGroup::SECP256R1]);
    let flight = retry_flight(&client_ssl, &server_ssl);

    // Same configuration, different cookie secret.
    let other_ssl = ssl_context(&[NamedGroup::SECP256R1]);
    let mut server = ServerHandshakeContext::new(other_ssl);
    let err = receive_client_hello(&mut server, &flight.retried_hello).unwrap_err();
    assert_eq!(err.alert(), AlertDescription::IllegalParameter);
    assert_eq!(Alert::from(&err).encode(), [2, 47]);
}

#[test]
fn test_cookie_bound_to_client_hello_header() {
    init_tracing();
    let client_ssl = ssl_context(&[NamedGroup::X25519, NamedGroup::SECP256R1]);
    let server_ssl = ssl_context(&[NamedGroup::SECP256R1]);
    let flight = retry_flight(&client_ssl, &server_ssl);

    let retried = ClientHelloMessage::decode(&flight.retried_hello[4..]).unwrap();
    let forged = retried.with_session_id(vec![0xcd; 32]);
    let wire = forged.to_handshake_message().unwrap();

    let mut server = ServerHandshakeContext::new(server_ssl);
    let err = receive_client_hello(&mut server, &wire).unwrap_err();
    assert_eq!(err.alert(), AlertDescription::IllegalParameter);
    assert_eq!(server.transcript.message_count(), 1);
}
