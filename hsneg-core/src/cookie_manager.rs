//! Stateless HelloRetryRequest cookies.
//!
//! A server that answers a ClientHello with a HelloRetryRequest does not
//! need to remember anything about the client. Everything required to
//! resume is packed into the `cookie` extension, which the client echoes
//! in its retried ClientHello:
//!
//! ```text
//! struct {
//!     uint16 cipher_suite;
//!     uint8  version;                    /* top byte of the secret version */
//!     opaque header_mac[Hash.length];
//!     opaque client_hello_hash[Hash.length];
//! } Cookie;
//! ```
//!
//! `header_mac` is `Hash(header || client_hello_hash || secret)`, where
//! `header` is the ClientHello up to its extensions. The header does not
//! change between a ClientHello and its retry, so the retry is checked
//! against the cookie without knowing the first ClientHello.
//!
//! # Secret rotation
//!
//! The 64-byte secret is replaced every 2^24 cookies. The secret it
//! replaces stays valid as `previous`, so a cookie issued just before a
//! rotation is still accepted. Cookies older than two rotations are not.
//!
//! # Thread safety
//!
//! One manager serves every connection of an [`SslContext`]. The secrets
//! sit behind a [`Mutex`] that is only held to snapshot or rotate them,
//! never while hashing.
//!
//! [`SslContext`]: crate::context::SslContext

use std::sync::{Arc, Mutex};

use hsneg_crypto::{CryptoProvider, HashAlgorithm};
use subtle::ConstantTimeEq;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::cipher::CipherSuite;
use crate::context::{HandshakeContext, ServerHandshakeContext};
use crate::error::{Error, Result};
use crate::messages::{hello_retry_request, ClientHelloMessage};
use crate::protocol::ProtocolVersion;
use crate::transcript::message_hash_record;

/// Cookie secret size in bytes.
pub const COOKIE_SECRET_SIZE: usize = 64;

/// Low bits of the version counter; the secret rotates when they wrap.
const ROTATION_MASK: u32 = 0x00FF_FFFF;

/// Shortest cookie worth looking at.
const MIN_COOKIE_LENGTH: usize = 33;

type Secret = Zeroizing<[u8; COOKIE_SECRET_SIZE]>;

/// Secret state (protected by Mutex).
struct CookieSecrets {
    /// Incremented for every cookie created
    version: u32,
    /// Secret for the current epoch
    current: Secret,
    /// Secret of the epoch before
    previous: Secret,
    /// Version byte of cookies made with `current`
    current_epoch: u8,
}

/// Cookie manager for TLS 1.3 HelloRetryRequest.
pub struct T13HelloCookieManager {
    provider: Arc<dyn CryptoProvider>,
    secrets: Mutex<CookieSecrets>,
}

impl std::fmt::Debug for T13HelloCookieManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("T13HelloCookieManager").finish_non_exhaustive()
    }
}

fn fresh_secret(provider: &dyn CryptoProvider) -> Result<Secret> {
    let mut secret = Zeroizing::new([0u8; COOKIE_SECRET_SIZE]);
    provider.random().fill(&mut secret[..])?;
    Ok(secret)
}

fn epoch_of(version: u32) -> u8 {
    (version >> 24) as u8
}

impl T13HelloCookieManager {
    /// Create a manager with a fresh secret and a random version counter.
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Result<Self> {
        let version = provider.random().next_u32()?;
        let current = fresh_secret(provider.as_ref())?;
        let previous = Zeroizing::new(*current);

        Ok(Self {
            provider,
            secrets: Mutex::new(CookieSecrets {
                version,
                current,
                previous,
                current_epoch: epoch_of(version),
            }),
        })
    }

    /// `Hash(header || client_hello_hash || secret)`
    ///
    /// The ClientHello hash is under the MAC as well as the header, so a
    /// cookie with an altered hash region fails validation instead of
    /// seeding the rebuilt transcript.
    fn header_mac(
        &self,
        algorithm: HashAlgorithm,
        client_hello: &ClientHelloMessage,
        client_hello_hash: &[u8],
        secret: &[u8],
    ) -> Result<Vec<u8>> {
        let mut hasher = self.provider.hash(algorithm)?;
        hasher.update(&client_hello.header_bytes()?);
        hasher.update(client_hello_hash);
        hasher.update(secret);
        Ok(hasher.finalize())
    }

    /// Create the cookie for the HelloRetryRequest answering
    /// `client_hello`.
    ///
    /// The transcript of `ctx` must hold exactly that ClientHello, and a
    /// cipher suite must have been negotiated.
    pub fn create_cookie(
        &self,
        ctx: &mut HandshakeContext,
        client_hello: &ClientHelloMessage,
    ) -> Result<Vec<u8>> {
        let suite = ctx
            .negotiated_cipher_suite
            .ok_or_else(|| Error::InternalError("cookie without negotiated cipher suite".into()))?;

        let (version, secret) = {
            let mut guard = self
                .secrets
                .lock()
                .map_err(|_| Error::InternalError("cookie secret lock poisoned".into()))?;
            let secrets = &mut *guard;
            if secrets.version & ROTATION_MASK == 0 {
                let fresh = fresh_secret(self.provider.as_ref())?;
                secrets.previous = std::mem::replace(&mut secrets.current, fresh);
                secrets.current_epoch = epoch_of(secrets.version);
                debug!("Rotated HelloRetryRequest cookie secret");
            }
            let snapshot = (secrets.version, Zeroizing::new(*secrets.current));
            secrets.version = secrets.version.wrapping_add(1);
            snapshot
        };

        let algorithm = suite.hash_algorithm();
        if ctx.transcript.algorithm().is_none() {
            ctx.transcript.determine(algorithm);
        }
        let client_hello_hash = ctx.transcript.digest(ctx.provider())?;
        let header_mac = self.header_mac(algorithm, client_hello, &client_hello_hash, &secret[..])?;

        let mut cookie = Vec::with_capacity(3 + header_mac.len() + client_hello_hash.len());
        cookie.extend_from_slice(&suite.to_u16().to_be_bytes());
        cookie.push(epoch_of(version));
        cookie.extend_from_slice(&header_mac);
        cookie.extend_from_slice(&client_hello_hash);
        trace!("Created {}-byte cookie for {}", cookie.len(), suite.name());
        Ok(cookie)
    }

    /// Check a cookie echoed in the retried `client_hello`.
    ///
    /// On success the transcript of `ctx` is rebuilt as
    /// `message_hash || HelloRetryRequest || <recorded messages>`, and
    /// the cipher suite named by the cookie becomes the negotiated one.
    /// Every failure is a plain `false`.
    pub fn is_cookie_valid(
        &self,
        ctx: &mut ServerHandshakeContext,
        client_hello: &ClientHelloMessage,
        cookie: &[u8],
    ) -> bool {
        if cookie.len() < MIN_COOKIE_LENGTH {
            return false;
        }

        let Some(suite) = CipherSuite::from_u16(u16::from_be_bytes([cookie[0], cookie[1]])) else {
            return false;
        };
        if ctx.negotiated_cipher_suite.map_or(false, |negotiated| negotiated != suite) {
            return false;
        }
        let algorithm = suite.hash_algorithm();
        let hash_len = algorithm.output_size();
        if hash_len == 0 || cookie.len() != 3 + 2 * hash_len {
            return false;
        }
        let (prev_header_mac, prev_client_hello_hash) = cookie[3..].split_at(hash_len);

        let secret = {
            let Ok(secrets) = self.secrets.lock() else {
                return false;
            };
            if cookie[2] == secrets.current_epoch {
                Zeroizing::new(*secrets.current)
            } else {
                Zeroizing::new(*secrets.previous)
            }
        };

        let Ok(header_mac) =
            self.header_mac(algorithm, client_hello, prev_client_hello_hash, &secret[..])
        else {
            return false;
        };
        if !bool::from(header_mac.as_slice().ct_eq(prev_header_mac)) {
            return false;
        }

        ctx.negotiated_cipher_suite = Some(suite);
        if ctx.transcript.algorithm().is_none() {
            ctx.transcript.determine(algorithm);
        }
        match hello_retry_request::reproduce(ctx, client_hello) {
            Ok(hrr) => {
                ctx.transcript.push(&hrr);
                ctx.transcript.push(&message_hash_record(prev_client_hello_hash));
                true
            },
            Err(e) => {
                debug!("Cannot reproduce HelloRetryRequest: {}", e);
                false
            },
        }
    }

    #[cfg(test)]
    fn set_version(&self, version: u32) {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.version = version;
        }
    }
}

/// Per-context factory of cookie managers.
///
/// Managers are created on first use. Only TLS 1.3 uses cookies; older
/// protocols get none.
pub struct HelloCookieManagerBuilder {
    provider: Arc<dyn CryptoProvider>,
    t13: Mutex<Option<Arc<T13HelloCookieManager>>>,
}

impl std::fmt::Debug for HelloCookieManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelloCookieManagerBuilder").finish_non_exhaustive()
    }
}

impl HelloCookieManagerBuilder {
    /// Create a builder; no manager exists until [`value_of`](Self::value_of).
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            provider,
            t13: Mutex::new(None),
        }
    }

    /// The cookie manager for `protocol`, created on first request.
    pub fn value_of(&self, protocol: ProtocolVersion) -> Result<Option<Arc<T13HelloCookieManager>>> {
        if !protocol.uses_tls13_rules() {
            return Ok(None);
        }

        let mut t13 = self
            .t13
            .lock()
            .map_err(|_| Error::InternalError("cookie manager lock poisoned".into()))?;
        if let Some(manager) = t13.as_ref() {
            return Ok(Some(Arc::clone(manager)));
        }
        let manager = Arc::new(T13HelloCookieManager::new(Arc::clone(&self.provider))?);
        *t13 = Some(Arc::clone(&manager));
        Ok(Some(manager))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SslContext;
    use crate::Config;
    use hsneg_crypto_rustcrypto::RustCryptoProvider;
    use std::thread;

    fn ssl_context() -> Arc<SslContext> {
        let config = Config::builder().build().unwrap();
        Arc::new(SslContext::new(config, Arc::new(RustCryptoProvider::new())))
    }

    fn manager(ssl: &SslContext) -> Arc<T13HelloCookieManager> {
        ssl.cookie_managers()
            .value_of(ProtocolVersion::Tls13)
            .unwrap()
            .unwrap()
    }

    fn client_hello(suite: CipherSuite) -> ClientHelloMessage {
        ClientHelloMessage::new([0x42; 32], &[suite]).with_session_id(vec![0x11; 32])
    }

    /// Server context that has just received `client_hello`.
    fn first_flight(
        ssl: &Arc<SslContext>,
        suite: CipherSuite,
        client_hello: &ClientHelloMessage,
    ) -> ServerHandshakeContext {
        let mut server = ServerHandshakeContext::new(Arc::clone(ssl));
        server.negotiated_protocol = Some(ProtocolVersion::Tls13);
        server.negotiated_cipher_suite = Some(suite);
        server.transcript.determine(suite.hash_algorithm());
        server.transcript.update(&client_hello.to_handshake_message().unwrap());
        server
    }

    /// Fresh server context for the retried ClientHello.
    fn second_flight(ssl: &Arc<SslContext>) -> ServerHandshakeContext {
        let mut server = ServerHandshakeContext::new(Arc::clone(ssl));
        server.negotiated_protocol = Some(ProtocolVersion::Tls13);
        server
    }

    #[test]
    fn test_builder_per_protocol() {
        let ssl = ssl_context();
        let builder = ssl.cookie_managers();

        assert!(builder.value_of(ProtocolVersion::Tls12).unwrap().is_none());
        let first = builder.value_of(ProtocolVersion::Tls13).unwrap().unwrap();
        let second = builder.value_of(ProtocolVersion::Tls13).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cookie_round_trip() {
        let ssl = ssl_context();
        let manager = manager(&ssl);

        for suite in [
            CipherSuite::Aes128GcmSha256,
            CipherSuite::Aes256GcmSha384,
            CipherSuite::ChaCha20Poly1305Sha256,
        ] {
            let ch = client_hello(suite);
            let mut server = first_flight(&ssl, suite, &ch);
            let cookie = manager.create_cookie(&mut server, &ch).unwrap();

            let hash_len = suite.hash_algorithm().output_size();
            assert_eq!(cookie.len(), 3 + 2 * hash_len);
            assert_eq!(&cookie[..2], &suite.to_u16().to_be_bytes());
            assert_eq!(&cookie[3 + hash_len..], &server.transcript.digest(ssl.provider()).unwrap()[..]);

            let mut retry = second_flight(&ssl);
            assert!(manager.is_cookie_valid(&mut retry, &ch, &cookie));
            assert_eq!(retry.negotiated_cipher_suite, Some(suite));
            assert_eq!(retry.transcript.message_count(), 2);
        }
    }

    #[test]
    fn test_transcript_rebuilt_from_cookie() {
        let ssl = ssl_context();
        let manager = manager(&ssl);
        let suite = CipherSuite::Aes256GcmSha384;
        let ch = client_hello(suite);

        let mut server = first_flight(&ssl, suite, &ch);
        let ch1_hash = server.transcript.digest(ssl.provider()).unwrap();
        let cookie = manager.create_cookie(&mut server, &ch).unwrap();
        assert_eq!(&cookie[3 + ch1_hash.len()..], &ch1_hash[..]);

        let mut retry = second_flight(&ssl);
        let ch2 = ch.to_handshake_message().unwrap();
        retry.transcript.update(&ch2);
        assert!(manager.is_cookie_valid(&mut retry, &ch, &cookie));

        let hrr = hello_retry_request::reproduce(&mut retry, &ch).unwrap();
        let mut expected = message_hash_record(&ch1_hash);
        expected.extend_from_slice(&hrr);
        expected.extend_from_slice(&ch2);
        assert_eq!(
            retry.transcript.digest(ssl.provider()).unwrap(),
            ssl.provider().digest(HashAlgorithm::Sha384, &expected).unwrap()
        );
    }

    #[test]
    fn test_cookie_tamper_sensitivity() {
        let ssl = ssl_context();
        let manager = manager(&ssl);
        let suite = CipherSuite::Aes128GcmSha256;
        let ch = client_hello(suite);
        let mut server = first_flight(&ssl, suite, &ch);
        let cookie = manager.create_cookie(&mut server, &ch).unwrap();

        for i in 3..cookie.len() {
            let mut tampered = cookie.clone();
            tampered[i] ^= 0x01;
            let mut retry = second_flight(&ssl);
            assert!(!manager.is_cookie_valid(&mut retry, &ch, &tampered), "byte {}", i);
            assert_eq!(retry.transcript.message_count(), 0);
        }

        let mut retry = second_flight(&ssl);
        let other = ClientHelloMessage::new([0x43; 32], &[suite]).with_session_id(vec![0x11; 32]);
        assert!(!manager.is_cookie_valid(&mut retry, &other, &cookie));
    }

    #[test]
    fn test_cookie_structure_rejections() {
        let ssl = ssl_context();
        let manager = manager(&ssl);
        let suite = CipherSuite::Aes128GcmSha256;
        let ch = client_hello(suite);
        let mut server = first_flight(&ssl, suite, &ch);
        let cookie = manager.create_cookie(&mut server, &ch).unwrap();

        let mut retry = second_flight(&ssl);
        assert!(!manager.is_cookie_valid(&mut retry, &ch, &[]));
        assert!(!manager.is_cookie_valid(&mut retry, &ch, &cookie[..32]));
        assert!(!manager.is_cookie_valid(&mut retry, &ch, &cookie[..cookie.len() - 1]));

        let mut unknown_suite = cookie.clone();
        unknown_suite[0] = 0xEE;
        assert!(!manager.is_cookie_valid(&mut retry, &ch, &unknown_suite));

        // SHA-256 cookie relabelled as a SHA-384 suite has the wrong length
        let mut relabelled = cookie.clone();
        relabelled[1] = 0x02;
        assert!(!manager.is_cookie_valid(&mut retry, &ch, &relabelled));

        retry.negotiated_cipher_suite = Some(CipherSuite::ChaCha20Poly1305Sha256);
        assert!(!manager.is_cookie_valid(&mut retry, &ch, &cookie));
        assert_eq!(retry.transcript.message_count(), 0);
    }

    #[test]
    fn test_secret_rotation() {
        let ssl = ssl_context();
        let manager = manager(&ssl);
        let suite = CipherSuite::Aes128GcmSha256;
        let ch = client_hello(suite);
        let make_cookie = || {
            let mut server = first_flight(&ssl, suite, &ch);
            manager.create_cookie(&mut server, &ch).unwrap()
        };
        let valid = |cookie: &[u8]| {
            let mut retry = second_flight(&ssl);
            manager.is_cookie_valid(&mut retry, &ch, cookie)
        };

        manager.set_version(0x0100_0000);
        let first_epoch = make_cookie();
        assert_eq!(first_epoch[2], 0x01);

        manager.set_version(0x01FF_FFFF);
        let before_rotation = make_cookie();
        let after_rotation = make_cookie();
        assert_eq!(before_rotation[2], 0x01);
        assert_eq!(after_rotation[2], 0x02);
        assert!(valid(&first_epoch));
        assert!(valid(&before_rotation));
        assert!(valid(&after_rotation));

        manager.set_version(0x0300_0000);
        let latest = make_cookie();
        assert!(valid(&latest));
        assert!(valid(&after_rotation));
        assert!(!valid(&before_rotation));
    }

    #[test]
    fn test_version_counter_wraps() {
        let ssl = ssl_context();
        let manager = manager(&ssl);
        let suite = CipherSuite::Aes128GcmSha256;
        let ch = client_hello(suite);

        manager.set_version(u32::MAX);
        let mut server = first_flight(&ssl, suite, &ch);
        let last = manager.create_cookie(&mut server, &ch).unwrap();
        let mut server = first_flight(&ssl, suite, &ch);
        let wrapped = manager.create_cookie(&mut server, &ch).unwrap();
        assert_eq!(last[2], 0xFF);
        assert_eq!(wrapped[2], 0x00);

        let mut retry = second_flight(&ssl);
        assert!(manager.is_cookie_valid(&mut retry, &ch, &wrapped));
    }

    #[test]
    fn test_thread_safety() {
        let ssl = ssl_context();
        let manager = manager(&ssl);
        manager.set_version(0x04FF_FFF0);

        let handles: Vec<_> = (0..10u8)
            .map(|i| {
                let ssl = Arc::clone(&ssl);
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    let suite = CipherSuite::Aes128GcmSha256;
                    let ch = ClientHelloMessage::new([i; 32], &[suite]);
                    for _ in 0..5 {
                        let mut server = first_flight(&ssl, suite, &ch);
                        let cookie = manager.create_cookie(&mut server, &ch).unwrap();
                        let mut retry = second_flight(&ssl);
                        assert!(manager.is_cookie_valid(&mut retry, &ch, &cookie));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
