//! Handshake contexts.
//!
//! [`SslContext`] is shared by every connection created from one
//! configuration. [`HandshakeContext`] is the mutable state of a single
//! handshake attempt; the role specific wrappers add what only one side
//! needs, so dispatch tables can hand each function the exact context
//! type it works on.

use std::collections::{BTreeSet, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use hsneg_crypto::CryptoProvider;

use crate::cipher::CipherSuite;
use crate::cookie_manager::HelloCookieManagerBuilder;
use crate::key_exchange::{KeyAgreementCredentials, Possession, SslKeyExchange, X509Possession};
use crate::messages::ClientHelloMessage;
use crate::named_group::NamedGroup;
use crate::protocol::{HandshakeType, ProtocolVersion};
use crate::signature_scheme::SignatureScheme;
use crate::ssl_extension::{ExtensionSpec, SslExtension};
use crate::transcript::TranscriptHash;
use crate::Config;

/// State shared by all connections of one configuration.
pub struct SslContext {
    config: Arc<Config>,
    provider: Arc<dyn CryptoProvider>,
    cookie_managers: HelloCookieManagerBuilder,
}

impl std::fmt::Debug for SslContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SslContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SslContext {
    /// Create a context from a configuration and a crypto provider.
    pub fn new(config: Config, provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            config: Arc::new(config),
            cookie_managers: HelloCookieManagerBuilder::new(Arc::clone(&provider)),
            provider,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The crypto provider.
    pub fn provider(&self) -> &dyn CryptoProvider {
        self.provider.as_ref()
    }

    /// Lazily created HelloRetryRequest cookie managers.
    pub fn cookie_managers(&self) -> &HelloCookieManagerBuilder {
        &self.cookie_managers
    }
}

/// Which side of the handshake a context drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Client
    Client,
    /// Server
    Server,
}

/// Session data negotiated during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeSession {
    /// Signature schemes the peer accepts in certificates
    pub peer_supported_signature_algorithms: Vec<SignatureScheme>,
}

/// Per-handshake negotiation state.
///
/// Created at connection start, mutated by every extension producer and
/// consumer, and dropped when the handshake completes or aborts.
pub struct HandshakeContext {
    ssl_context: Arc<SslContext>,
    role: Role,

    /// Protocol versions enabled for this connection
    pub active_protocols: Vec<ProtocolVersion>,
    /// Negotiated protocol version
    pub negotiated_protocol: Option<ProtocolVersion>,
    /// Negotiated cipher suite
    pub negotiated_cipher_suite: Option<CipherSuite>,

    /// Parsed or produced extension specs
    pub handshake_extensions: HashMap<SslExtension, ExtensionSpec>,
    /// Locally held key material
    pub handshake_possessions: Vec<Possession>,
    /// Peer key material
    pub handshake_credentials: Vec<KeyAgreementCredentials>,
    /// Key exchange chosen for this handshake
    pub handshake_key_exchange: Option<SslKeyExchange>,
    /// Handshake messages this side still has to produce
    pub handshake_producers: BTreeSet<HandshakeType>,

    /// Groups the client offered in supported_groups
    pub client_requested_named_groups: Vec<NamedGroup>,
    /// Group chosen by a HelloRetryRequest
    pub server_selected_group: Option<NamedGroup>,

    /// Cached local signature schemes
    pub local_supported_sign_algs: Option<Vec<SignatureScheme>>,
    /// Peer's certificate signature schemes, intersected with local support
    pub peer_requested_cert_sign_schemes: Vec<SignatureScheme>,
    /// Session being negotiated
    pub handshake_session: HandshakeSession,

    /// Certificate possession the server authenticates with
    pub interim_authn: Option<X509Possession>,
    /// Whether an earlier session is being resumed
    pub is_resumption: bool,
    /// Running transcript
    pub transcript: TranscriptHash,
}

impl std::fmt::Debug for HandshakeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeContext")
            .field("role", &self.role)
            .field("negotiated_protocol", &self.negotiated_protocol)
            .field("negotiated_cipher_suite", &self.negotiated_cipher_suite)
            .field("handshake_producers", &self.handshake_producers)
            .field("client_requested_named_groups", &self.client_requested_named_groups)
            .field("server_selected_group", &self.server_selected_group)
            .finish_non_exhaustive()
    }
}

impl HandshakeContext {
    /// Start a handshake for `role`.
    pub fn new(ssl_context: Arc<SslContext>, role: Role) -> Self {
        let active_protocols = ssl_context.config().protocol_versions.clone();
        Self {
            ssl_context,
            role,
            active_protocols,
            negotiated_protocol: None,
            negotiated_cipher_suite: None,
            handshake_extensions: HashMap::new(),
            handshake_possessions: Vec::new(),
            handshake_credentials: Vec::new(),
            handshake_key_exchange: None,
            handshake_producers: BTreeSet::new(),
            client_requested_named_groups: Vec::new(),
            server_selected_group: None,
            local_supported_sign_algs: None,
            peer_requested_cert_sign_schemes: Vec::new(),
            handshake_session: HandshakeSession::default(),
            interim_authn: None,
            is_resumption: false,
            transcript: TranscriptHash::new(),
        }
    }

    /// The shared context this handshake belongs to.
    pub fn ssl_context(&self) -> &Arc<SslContext> {
        &self.ssl_context
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        self.ssl_context.config()
    }

    /// The crypto provider.
    pub fn provider(&self) -> &dyn CryptoProvider {
        self.ssl_context.provider()
    }

    /// Role of this side.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this is the client side.
    pub fn is_client(&self) -> bool {
        self.role == Role::Client
    }

    /// Whether the negotiated protocol follows TLS 1.3 rules.
    pub fn uses_tls13_rules(&self) -> bool {
        self.negotiated_protocol
            .map_or(false, ProtocolVersion::uses_tls13_rules)
    }

    /// Parsed extension value stored for `extension`, if any.
    pub fn spec(&self, extension: SslExtension) -> Option<&ExtensionSpec> {
        self.handshake_extensions.get(&extension)
    }
}

/// Client side handshake context.
#[derive(Debug)]
pub struct ClientHandshakeContext {
    base: HandshakeContext,
}

impl ClientHandshakeContext {
    /// Start a client handshake.
    pub fn new(ssl_context: Arc<SslContext>) -> Self {
        Self {
            base: HandshakeContext::new(ssl_context, Role::Client),
        }
    }
}

impl Deref for ClientHandshakeContext {
    type Target = HandshakeContext;

    fn deref(&self) -> &HandshakeContext {
        &self.base
    }
}

impl DerefMut for ClientHandshakeContext {
    fn deref_mut(&mut self) -> &mut HandshakeContext {
        &mut self.base
    }
}

/// Server side handshake context.
#[derive(Debug)]
pub struct ServerHandshakeContext {
    base: HandshakeContext,

    /// The ClientHello being processed
    pub client_hello: Option<ClientHelloMessage>,
}

impl ServerHandshakeContext {
    /// Start a server handshake.
    pub fn new(ssl_context: Arc<SslContext>) -> Self {
        Self {
            base: HandshakeContext::new(ssl_context, Role::Server),
            client_hello: None,
        }
    }
}

impl Deref for ServerHandshakeContext {
    type Target = HandshakeContext;

    fn deref(&self) -> &HandshakeContext {
        &self.base
    }
}

impl DerefMut for ServerHandshakeContext {
    fn deref_mut(&mut self) -> &mut HandshakeContext {
        &mut self.base
    }
}
