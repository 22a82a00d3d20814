//! ClientHello as seen by negotiation (RFC 8446 Section 4.1.2).

use bytes::{BufMut, BytesMut};

use crate::cipher::CipherSuite;
use crate::codec;
use crate::error::{Error, Result};
use crate::extensions::Extensions;
use crate::messages::{get_hello_prefix, put_hello_prefix};
use crate::protocol::{HandshakeType, ProtocolVersion};

/// A parsed or locally built ClientHello.
///
/// ```text
/// legacy_version | random | legacy_session_id<0..32>
///     | cipher_suites<2..2^16-2> | legacy_compression_methods<1..2^8-1>
///     | extensions
/// ```
///
/// Everything before `extensions` is the header. It stays identical
/// between a ClientHello and its retry, which is what the cookie binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHelloMessage {
    /// 0x0303 for every TLS 1.3 client
    pub legacy_version: ProtocolVersion,

    /// client_random
    pub random: [u8; 32],

    /// Up to 32 bytes, echoed by the server
    pub legacy_session_id: Vec<u8>,

    /// Offered cipher suite ids, unknown ones included
    pub cipher_suites: Vec<u16>,

    /// `[0]` from any modern client
    pub legacy_compression_methods: Vec<u8>,

    /// Hello extensions in wire order
    pub extensions: Extensions,
}

impl ClientHelloMessage {
    /// ClientHello offering `cipher_suites`, with an empty session id and
    /// no extensions.
    pub fn new(random: [u8; 32], cipher_suites: &[CipherSuite]) -> Self {
        Self {
            legacy_version: ProtocolVersion::Tls12,
            random,
            legacy_session_id: Vec::new(),
            cipher_suites: cipher_suites.iter().map(|suite| suite.to_u16()).collect(),
            legacy_compression_methods: vec![0],
            extensions: Extensions::new(),
        }
    }

    /// Builder: middlebox compatibility session id.
    pub fn with_session_id(mut self, legacy_session_id: Vec<u8>) -> Self {
        self.legacy_session_id = legacy_session_id;
        self
    }

    /// Builder: extension block.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Offered cipher suites this crate knows, in client order.
    pub fn known_cipher_suites(&self) -> impl Iterator<Item = CipherSuite> + '_ {
        self.cipher_suites.iter().filter_map(|&id| CipherSuite::from_u16(id))
    }

    fn put_header(&self, buf: &mut BytesMut) -> Result<()> {
        let suites_len = self.cipher_suites.len() * 2;
        if !(2..=0xFFFE).contains(&suites_len) {
            return Err(Error::InternalError(format!("{} offered cipher suites", self.cipher_suites.len())));
        }
        if !(1..=0xFF).contains(&self.legacy_compression_methods.len()) {
            return Err(Error::InternalError("compression method list out of range".into()));
        }

        put_hello_prefix(buf, self.legacy_version, &self.random, &self.legacy_session_id)?;
        codec::put_uint16(buf, suites_len as u16);
        self.cipher_suites.iter().for_each(|&id| buf.put_u16(id));
        codec::put_opaque8(buf, &self.legacy_compression_methods);
        Ok(())
    }

    /// Encoding of all fields before the extensions.
    pub fn header_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.put_header(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Message body without the handshake header.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.put_header(&mut buf)?;
        self.extensions.encode_into(&mut buf);
        Ok(buf.to_vec())
    }

    /// Framed message, as hashed into the transcript.
    pub fn to_handshake_message(&self) -> Result<Vec<u8>> {
        let body = self.encode()?;
        Ok(codec::handshake_message(HandshakeType::ClientHello.to_u8(), &body))
    }

    /// Parse a body. Unknown cipher suite ids are kept.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let (legacy_version, random, legacy_session_id) = get_hello_prefix(&mut data)?;

        let suites = codec::get_opaque16(&mut data)?;
        if suites.is_empty() || suites.len() % 2 != 0 {
            return Err(Error::DecodeError(format!("cipher_suites of {} bytes", suites.len())));
        }
        let cipher_suites = suites
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        let legacy_compression_methods = codec::get_opaque8(&mut data)?;
        if legacy_compression_methods.is_empty() {
            return Err(Error::DecodeError("empty legacy_compression_methods".into()));
        }

        Ok(Self {
            legacy_version,
            random,
            legacy_session_id,
            cipher_suites,
            legacy_compression_methods,
            extensions: Extensions::decode(data)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::Extension;
    use crate::protocol::ExtensionType;

    #[test]
    fn test_client_hello_encode_decode() {
        let random = [0x42u8; 32];
        let hello = ClientHelloMessage::new(random, &[
            CipherSuite::Aes128GcmSha256,
            CipherSuite::ChaCha20Poly1305Sha256,
        ])
        .with_session_id(vec![0x01, 0x02, 0x03]);

        let encoded = hello.encode().unwrap();
        let decoded = ClientHelloMessage::decode(&encoded).unwrap();

        assert_eq!(decoded, hello);
        assert_eq!(decoded.known_cipher_suites().count(), 2);
    }

    #[test]
    fn test_header_excludes_extensions() {
        let hello = ClientHelloMessage::new([7u8; 32], &[CipherSuite::Aes256GcmSha384]);
        let mut exts = Extensions::new();
        exts.add(Extension::new(ExtensionType::Cookie, vec![0x00, 0x01, 0xaa]));
        let retry = hello.clone().with_extensions(exts);

        assert_eq!(hello.header_bytes().unwrap(), retry.header_bytes().unwrap());
        assert_ne!(hello.encode().unwrap(), retry.encode().unwrap());
        // version + random + sid + suites + compression
        assert_eq!(hello.header_bytes().unwrap().len(), 2 + 32 + 1 + 4 + 2);
    }

    #[test]
    fn test_unknown_suites_preserved() {
        let mut hello = ClientHelloMessage::new([0u8; 32], &[CipherSuite::Aes128GcmSha256]);
        hello.cipher_suites.insert(0, 0x0a0a);
        let decoded = ClientHelloMessage::decode(&hello.encode().unwrap()).unwrap();
        assert_eq!(decoded.cipher_suites, vec![0x0a0a, 0x1301]);
        assert_eq!(decoded.known_cipher_suites().collect::<Vec<_>>(), vec![
            CipherSuite::Aes128GcmSha256
        ]);
    }

    #[test]
    fn test_client_hello_invalid() {
        assert!(ClientHelloMessage::decode(&[1, 2, 3]).is_err());

        let mut data = vec![0x03, 0x03];
        data.extend_from_slice(&[0u8; 32]);
        data.push(33);
        data.extend_from_slice(&[0u8; 33]);
        assert!(ClientHelloMessage::decode(&data).is_err());
    }
}
