//! HelloRetryRequest message (RFC 8446 Section 4.1.4).
//!
//! HelloRetryRequest has the ServerHello structure with a fixed random:
//!
//! ```text
//! CF 21 AD 74 E5 9A 61 11 BE 1D 8C 02 1E 65 B8 91
//! C2 A2 11 16 7A BB 8C 5E 07 9E 09 E2 C8 A8 33 9C
//! ```
//!
//! A stateless server never keeps the request it sent. When the retried
//! ClientHello arrives with a valid cookie, [`reproduce`] rebuilds the
//! exact bytes from that ClientHello so the transcript can be restored.

use bytes::{BufMut, BytesMut};

use crate::cipher::CipherSuite;
use crate::codec;
use crate::context::ServerHandshakeContext;
use crate::error::{Error, Result};
use crate::extensions::{Extension, Extensions};
use crate::messages::{get_hello_prefix, put_hello_prefix, ClientHelloMessage};
use crate::protocol::{ExtensionType, HandshakeType, ProtocolVersion};
use crate::ssl_extension::{produce_extensions, reproduce_extensions};

/// Special random value that identifies a HelloRetryRequest.
pub const HELLO_RETRY_REQUEST_RANDOM: [u8; 32] = [
    0xCF, 0x21, 0xAD, 0x74, 0xE5, 0x9A, 0x61, 0x11, 0xBE, 0x1D, 0x8C, 0x02, 0x1E, 0x65, 0xB8, 0x91,
    0xC2, 0xA2, 0x11, 0x16, 0x7A, 0xBB, 0x8C, 0x5E, 0x07, 0x9E, 0x09, 0xE2, 0xC8, 0xA8, 0x33, 0x9C,
];

/// A retry request as sent: a ServerHello with [`HELLO_RETRY_REQUEST_RANDOM`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloRetryRequest {
    /// Always TLS 1.2 on the wire
    pub legacy_version: ProtocolVersion,

    /// [`HELLO_RETRY_REQUEST_RANDOM`]
    pub random: [u8; 32],

    /// Echoed from the ClientHello
    pub legacy_session_id: Vec<u8>,

    /// Suite the retried ClientHello must keep
    pub cipher_suite: CipherSuite,

    /// supported_versions, then the negotiated retry extensions
    pub extensions: Extensions,
}

impl HelloRetryRequest {
    /// Retry request echoing `legacy_session_id`.
    pub fn new(cipher_suite: CipherSuite, legacy_session_id: Vec<u8>, extensions: Extensions) -> Self {
        Self {
            legacy_version: ProtocolVersion::Tls12,
            random: HELLO_RETRY_REQUEST_RANDOM,
            legacy_session_id,
            cipher_suite,
            extensions,
        }
    }

    /// Whether a ServerHello random marks a retry request.
    pub fn is_hello_retry_request(random: &[u8; 32]) -> bool {
        random == &HELLO_RETRY_REQUEST_RANDOM
    }

    /// Message body without the handshake header.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        put_hello_prefix(&mut buf, self.legacy_version, &self.random, &self.legacy_session_id)?;
        buf.put_u16(self.cipher_suite.to_u16());
        buf.put_u8(0); // null compression
        self.extensions.encode_into(&mut buf);
        Ok(buf.to_vec())
    }

    /// Body framed as a server_hello handshake message.
    pub fn to_handshake_message(&self) -> Result<Vec<u8>> {
        let body = self.encode()?;
        Ok(codec::handshake_message(HandshakeType::HelloRetryRequest.to_u8(), &body))
    }

    /// Parse a body; a ServerHello random is rejected.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let (legacy_version, random, legacy_session_id) = get_hello_prefix(&mut data)?;
        if !Self::is_hello_retry_request(&random) {
            return Err(Error::DecodeError("server_hello random in a retry request".into()));
        }

        let suite_id = codec::get_uint16(&mut data)?;
        let cipher_suite = CipherSuite::from_u16(suite_id)
            .ok_or_else(|| Error::DecodeError(format!("unknown cipher suite {:#06x}", suite_id)))?;
        let compression = codec::get_uint8(&mut data)?;
        if compression != 0 {
            return Err(Error::DecodeError(format!("compression method {}", compression)));
        }

        Ok(Self {
            legacy_version,
            random,
            legacy_session_id,
            cipher_suite,
            extensions: Extensions::decode(data)?,
        })
    }
}

fn supported_versions(protocol: ProtocolVersion) -> Extension {
    Extension::new(
        ExtensionType::SupportedVersions,
        protocol.to_u16().to_be_bytes().to_vec(),
    )
}

fn negotiated(ctx: &ServerHandshakeContext) -> Result<(CipherSuite, ProtocolVersion)> {
    let suite = ctx
        .negotiated_cipher_suite
        .ok_or_else(|| Error::InternalError("HelloRetryRequest without cipher suite".into()))?;
    let protocol = ctx
        .negotiated_protocol
        .ok_or_else(|| Error::InternalError("HelloRetryRequest without protocol version".into()))?;
    Ok((suite, protocol))
}

fn with_extensions(protocol: ProtocolVersion, extensions: Extensions) -> Extensions {
    let mut all = Extensions::new();
    all.add(supported_versions(protocol));
    for ext in extensions.iter() {
        all.add(ext.clone());
    }
    all
}

/// Produce the HelloRetryRequest for the ClientHello in `ctx`.
///
/// Returns the handshake message. Afterwards the server holds no state
/// about the exchange: the transcript and the extension specs are
/// dropped, and the cookie restores both from the retried ClientHello.
pub fn produce(ctx: &mut ServerHandshakeContext) -> Result<Vec<u8>> {
    let client_hello = ctx
        .client_hello
        .clone()
        .ok_or_else(|| Error::InternalError("HelloRetryRequest without ClientHello".into()))?;
    let (suite, protocol) = negotiated(ctx)?;
    if ctx.transcript.algorithm().is_none() {
        ctx.transcript.determine(suite.hash_algorithm());
    }

    let extensions = produce_extensions(ctx, HandshakeType::HelloRetryRequest)?;
    let hrr = HelloRetryRequest::new(
        suite,
        client_hello.legacy_session_id,
        with_extensions(protocol, extensions),
    );
    let message = hrr.to_handshake_message()?;

    ctx.transcript.reset();
    ctx.handshake_extensions.clear();
    ctx.handshake_producers.remove(&HandshakeType::HelloRetryRequest);
    Ok(message)
}

/// Rebuild the HelloRetryRequest that `client_hello` answers.
///
/// Uses only what the retried ClientHello carries; the output is byte
/// identical to what [`produce`] sent.
pub fn reproduce(
    ctx: &mut ServerHandshakeContext,
    client_hello: &ClientHelloMessage,
) -> Result<Vec<u8>> {
    let (suite, protocol) = negotiated(ctx)?;
    let extensions = reproduce_extensions(ctx, HandshakeType::HelloRetryRequest)?;
    HelloRetryRequest::new(
        suite,
        client_hello.legacy_session_id.clone(),
        with_extensions(protocol, extensions),
    )
    .to_handshake_message()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_retry_request_encode_decode() {
        let mut exts = Extensions::new();
        exts.add(supported_versions(ProtocolVersion::Tls13));
        exts.add(Extension::new(ExtensionType::KeyShare, vec![0x00, 0x17]));
        let hrr = HelloRetryRequest::new(CipherSuite::Aes256GcmSha384, vec![7; 32], exts);

        let decoded = HelloRetryRequest::decode(&hrr.encode().unwrap()).unwrap();
        assert_eq!(decoded, hrr);
        assert!(HelloRetryRequest::is_hello_retry_request(&decoded.random));
    }

    #[test]
    fn test_handshake_header_uses_server_hello_type() {
        let hrr = HelloRetryRequest::new(CipherSuite::Aes128GcmSha256, Vec::new(), Extensions::new());
        let message = hrr.to_handshake_message().unwrap();
        let body = hrr.encode().unwrap();
        assert_eq!(message[0], 2);
        assert_eq!(&message[4..], &body[..]);
        assert_eq!(body.len(), 2 + 32 + 1 + 2 + 1 + 2);
    }

    #[test]
    fn test_decode_rejects_server_hello_random() {
        let mut body = HelloRetryRequest::new(CipherSuite::Aes128GcmSha256, Vec::new(), Extensions::new())
            .encode()
            .unwrap();
        body[2] ^= 0xff;
        assert!(matches!(HelloRetryRequest::decode(&body), Err(Error::DecodeError(_))));
    }
}
