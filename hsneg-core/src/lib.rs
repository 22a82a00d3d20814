//! # hsneg-core
//!
//! TLS handshake extension negotiation.
//!
//! This crate negotiates the handshake extensions that decide how a TLS
//! connection agrees on its keys:
//! - `key_share` in ClientHello, ServerHello and HelloRetryRequest
//! - `signature_algorithms_cert` in ClientHello and CertificateRequest
//! - `supported_groups` and `cookie` as their companions
//! - stateless HelloRetryRequest cookies with secret rotation
//! - the key exchange strategy table for TLS 1.2 and TLS 1.3
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   ssl_extension (dispatch tables)       │
//! └──────┬──────────────┬───────────────┬───┘
//!        │              │               │
//! ┌──────▼─────┐ ┌──────▼──────┐ ┌──────▼────────┐
//! │ key_share  │ │ cert_sign_  │ │ cookie +      │
//! │ supported_ │ │ algs        │ │ cookie_manager│
//! │ groups     │ │             │ │               │
//! └──────┬─────┘ └──────┬──────┘ └──────┬────────┘
//!        │              │               │
//! ┌──────▼──────────────▼───────────────▼───┐
//! │ key_exchange, named_group,              │
//! │ signature_scheme, transcript, codec     │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │      hsneg-crypto (trait interface)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! All per-connection state lives in a [`HandshakeContext`]; the only
//! state shared between connections is the cookie secret held by the
//! [`SslContext`].

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export crypto interface
pub use hsneg_crypto;

pub mod alert;
pub mod cert_sign_algs;
pub mod cipher;
pub mod codec;
pub mod constraints;
pub mod context;
pub mod cookie;
pub mod cookie_manager;
pub mod error;
pub mod extensions;
pub mod key_exchange;
pub mod key_share;
pub mod messages;
pub mod named_group;
pub mod protocol;
pub mod signature_scheme;
pub mod ssl_extension;
pub mod supported_groups;
pub mod transcript;

// Re-exports
pub use cipher::CipherSuite;
pub use constraints::AlgorithmConstraints;
pub use context::{
    ClientHandshakeContext, HandshakeContext, Role, ServerHandshakeContext, SslContext,
};
pub use error::{AlertDescription, Error, Result};
pub use key_exchange::{CertificateKeyType, X509Credential};
pub use named_group::{NamedGroup, NamedGroupType};
pub use protocol::{ExtensionType, HandshakeType, ProtocolVersion};
pub use signature_scheme::SignatureScheme;
pub use ssl_extension::SslExtension;

/// Client authentication policy of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientAuthType {
    /// Never request a client certificate
    #[default]
    None,
    /// Request a certificate, continue without one
    Requested,
    /// Require a certificate
    Required,
}

/// Negotiation configuration.
///
/// # Example
///
/// ```rust
/// use hsneg_core::{Config, NamedGroup, ProtocolVersion};
///
/// let config = Config::builder()
///     .with_protocol_versions(&[ProtocolVersion::Tls13])
///     .with_named_groups(&[NamedGroup::X25519, NamedGroup::SECP256R1])
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Active protocol versions
    pub protocol_versions: Vec<ProtocolVersion>,

    /// Named groups in local preference order
    pub named_groups: Vec<NamedGroup>,

    /// Signature schemes in local preference order
    pub signature_schemes: Vec<SignatureScheme>,

    /// Extensions switched off locally
    pub disabled_extensions: Vec<SslExtension>,

    /// Client authentication policy (server side)
    pub client_auth: ClientAuthType,

    /// Algorithm and key size policy
    pub constraints: AlgorithmConstraints,

    /// Local certificate used by TLS 1.2 authentication
    pub local_certificate: Option<X509Credential>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol_versions: vec![ProtocolVersion::Tls13],
            named_groups: NamedGroup::DEFAULT_PREFERENCE.to_vec(),
            signature_schemes: SignatureScheme::DEFAULT_PREFERENCE.to_vec(),
            disabled_extensions: Vec::new(),
            client_auth: ClientAuthType::None,
            constraints: AlgorithmConstraints::new(),
            local_certificate: None,
        }
    }
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Whether `extension` is enabled.
    pub fn is_available(&self, extension: SslExtension) -> bool {
        !self.disabled_extensions.contains(&extension)
    }
}

/// Configuration builder.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set active protocol versions.
    pub fn with_protocol_versions(mut self, versions: &[ProtocolVersion]) -> Self {
        self.config.protocol_versions = versions.to_vec();
        self
    }

    /// Set named groups, most preferred first.
    pub fn with_named_groups(mut self, groups: &[NamedGroup]) -> Self {
        self.config.named_groups = groups.to_vec();
        self
    }

    /// Set signature schemes, most preferred first.
    pub fn with_signature_schemes(mut self, schemes: &[SignatureScheme]) -> Self {
        self.config.signature_schemes = schemes.to_vec();
        self
    }

    /// Disable an extension.
    pub fn with_disabled_extension(mut self, extension: SslExtension) -> Self {
        self.config.disabled_extensions.push(extension);
        self
    }

    /// Set the client authentication policy.
    pub fn with_client_auth(mut self, client_auth: ClientAuthType) -> Self {
        self.config.client_auth = client_auth;
        self
    }

    /// Set the algorithm constraints.
    pub fn with_constraints(mut self, constraints: AlgorithmConstraints) -> Self {
        self.config.constraints = constraints;
        self
    }

    /// Set the local certificate description.
    pub fn with_local_certificate(mut self, credential: X509Credential) -> Self {
        self.config.local_certificate = Some(credential);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config> {
        if self.config.protocol_versions.is_empty() {
            return Err(Error::InvalidConfig("No protocol versions specified".into()));
        }

        for (i, group) in self.config.named_groups.iter().enumerate() {
            if self.config.named_groups[..i].contains(group) {
                return Err(Error::InvalidConfig(format!(
                    "Duplicate named group: {}",
                    group
                )));
            }
        }

        Ok(self.config)
    }
}
