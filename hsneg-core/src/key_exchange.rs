//! Key exchange strategy table.
//!
//! A strategy composes an optional certificate [`Authentication`] with a
//! [`KeyAgreement`]. TLS 1.2 strategies are looked up by the
//! [`KeyExchangeMethod`] a cipher suite fixes plus the protocol version;
//! TLS 1.3 strategies are looked up by named group and never wire any
//! legacy handshake messages.
//!
//! ```text
//! (KeyExchangeMethod, ProtocolVersion) --> { Authentication?, T12KeyAgreement }
//! NamedGroup                           --> { -,               T13(group)      }
//! ```

use hsneg_crypto::{PrivateKey, PublicKey, SharedSecret};
use tracing::{debug, warn};

use crate::context::HandshakeContext;
use crate::error::{AlertDescription, Error, Result};
use crate::named_group::{is_activatable, NamedGroup, NamedGroupType};
use crate::protocol::{HandshakeType, ProtocolVersion};

/// Key exchange methods a TLS 1.2 cipher suite can fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeMethod {
    /// RSA key transport
    Rsa,
    /// RSA key transport with an ephemeral 512-bit key
    RsaExport,
    /// Ephemeral DH, DSA certificate
    DheDss,
    /// Export-grade ephemeral DH, DSA certificate
    DheDssExport,
    /// Ephemeral DH, RSA certificate
    DheRsa,
    /// Export-grade ephemeral DH, RSA certificate
    DheRsaExport,
    /// Anonymous ephemeral DH
    DhAnon,
    /// Export-grade anonymous ephemeral DH
    DhAnonExport,
    /// Static ECDH, ECDSA-signed certificate
    EcdhEcdsa,
    /// Static ECDH, RSA-signed certificate
    EcdhRsa,
    /// Ephemeral ECDH, ECDSA certificate
    EcdheEcdsa,
    /// Ephemeral ECDH, RSA certificate
    EcdheRsa,
    /// Anonymous ephemeral ECDH
    EcdhAnon,
}

impl KeyExchangeMethod {
    /// Method name as used in cipher suite names.
    pub const fn name(self) -> &'static str {
        match self {
            KeyExchangeMethod::Rsa => "RSA",
            KeyExchangeMethod::RsaExport => "RSA_EXPORT",
            KeyExchangeMethod::DheDss => "DHE_DSS",
            KeyExchangeMethod::DheDssExport => "DHE_DSS_EXPORT",
            KeyExchangeMethod::DheRsa => "DHE_RSA",
            KeyExchangeMethod::DheRsaExport => "DHE_RSA_EXPORT",
            KeyExchangeMethod::DhAnon => "DH_anon",
            KeyExchangeMethod::DhAnonExport => "DH_anon_EXPORT",
            KeyExchangeMethod::EcdhEcdsa => "ECDH_ECDSA",
            KeyExchangeMethod::EcdhRsa => "ECDH_RSA",
            KeyExchangeMethod::EcdheEcdsa => "ECDHE_ECDSA",
            KeyExchangeMethod::EcdheRsa => "ECDHE_RSA",
            KeyExchangeMethod::EcdhAnon => "ECDH_anon",
        }
    }
}

/// Public key algorithm of a local certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateKeyType {
    /// rsaEncryption
    Rsa,
    /// id-RSASSA-PSS
    RsaPss,
    /// DSA
    Dsa,
    /// id-ecPublicKey
    Ec,
}

/// Description of the local certificate a side can authenticate with.
///
/// Only the key type and size take part in negotiation; the certificate
/// chain itself is handled outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X509Credential {
    /// Key algorithm
    pub key_type: CertificateKeyType,
    /// Key size in bits
    pub key_bits: u32,
}

impl X509Credential {
    /// Create a credential description.
    pub fn new(key_type: CertificateKeyType, key_bits: u32) -> Self {
        Self { key_type, key_bits }
    }
}

/// Possession of the local certificate's private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X509Possession {
    credential: X509Credential,
}

impl X509Possession {
    /// Key algorithm of the possessed key.
    pub fn key_type(&self) -> CertificateKeyType {
        self.credential.key_type
    }

    /// Size of the possessed key in bits.
    pub fn key_bits(&self) -> u32 {
        self.credential.key_bits
    }
}

/// An ephemeral key pair for one named group.
#[derive(Debug)]
pub struct KeyAgreementPossession {
    group: NamedGroup,
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyAgreementPossession {
    /// Generate a fresh key pair for `group`.
    pub fn generate(ctx: &HandshakeContext, group: NamedGroup) -> Result<Self> {
        let kex = ctx.provider().key_exchange(group.algorithm())?;
        let (private_key, public_key) = kex.generate_keypair()?;
        Ok(Self {
            group,
            private_key,
            public_key,
        })
    }

    /// The group the key pair belongs to.
    pub fn group(&self) -> NamedGroup {
        self.group
    }

    /// The public key in key_share encoding.
    pub fn encode(&self) -> &[u8] {
        self.public_key.as_bytes()
    }
}

/// Locally held key material created during a handshake attempt.
#[derive(Debug)]
pub enum Possession {
    /// Ephemeral (EC)DHE key pair
    KeyAgreement(KeyAgreementPossession),
    /// Local certificate key
    X509(X509Possession),
}

impl Possession {
    /// The key agreement possession, if this is one.
    pub fn as_key_agreement(&self) -> Option<&KeyAgreementPossession> {
        match self {
            Possession::KeyAgreement(pos) => Some(pos),
            Possession::X509(_) => None,
        }
    }
}

/// A peer public key decoded from a key share, validated for its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAgreementCredentials {
    group: NamedGroup,
    public_key: Vec<u8>,
}

impl KeyAgreementCredentials {
    /// Decode `key_exchange` as a public key of `group`.
    ///
    /// Fails when the provider rejects the encoding.
    pub fn value_of(
        ctx: &HandshakeContext,
        group: NamedGroup,
        key_exchange: &[u8],
    ) -> Result<Self> {
        let kex = ctx.provider().key_exchange(group.algorithm())?;
        kex.check_public_key(key_exchange)?;
        Ok(Self {
            group,
            public_key: key_exchange.to_vec(),
        })
    }

    /// The group of the peer key.
    pub fn group(&self) -> NamedGroup {
        self.group
    }

    /// Encoded peer public key.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

/// Certificate based authentication strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authentication {
    /// RSA certificate
    Rsa,
    /// RSA or RSASSA-PSS certificate
    RsaOrPss,
    /// DSA certificate
    Dsa,
    /// EC certificate
    Ec,
}

impl Authentication {
    fn key_types(self) -> &'static [CertificateKeyType] {
        match self {
            Authentication::Rsa => &[CertificateKeyType::Rsa],
            Authentication::RsaOrPss => &[CertificateKeyType::Rsa, CertificateKeyType::RsaPss],
            Authentication::Dsa => &[CertificateKeyType::Dsa],
            Authentication::Ec => &[CertificateKeyType::Ec],
        }
    }

    /// Possession of the local certificate key, if its type fits.
    pub fn create_possession(self, ctx: &HandshakeContext) -> Option<X509Possession> {
        let credential = ctx.config().local_certificate?;
        if self.key_types().contains(&credential.key_type) {
            Some(X509Possession { credential })
        } else {
            debug!(
                "No {:?} certificate available, local key type is {:?}",
                self, credential.key_type
            );
            None
        }
    }

    /// Legacy messages this authentication takes part in.
    pub fn related_handshakers(self, ctx: &HandshakeContext) -> Vec<HandshakeType> {
        if ctx.uses_tls13_rules() {
            Vec::new()
        } else {
            vec![HandshakeType::Certificate, HandshakeType::CertificateRequest]
        }
    }
}

/// TLS 1.2 key agreement strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum T12KeyAgreement {
    /// RSA key transport
    Rsa,
    /// RSA key transport with an ephemeral export key
    RsaExport,
    /// Ephemeral finite field DH
    Dhe,
    /// Export-grade ephemeral finite field DH
    DheExport,
    /// Static ECDH
    Ecdh,
    /// Ephemeral ECDH
    Ecdhe,
}

impl T12KeyAgreement {
    /// Whether the strategy generates ephemeral key material.
    pub const fn has_possession_generator(self) -> bool {
        !matches!(self, T12KeyAgreement::Rsa | T12KeyAgreement::Ecdh)
    }

    fn create_possession(self, ctx: &HandshakeContext) -> Option<Possession> {
        let group = match self {
            T12KeyAgreement::Dhe => preferred_group(ctx, NamedGroupType::Ffdhe)?,
            T12KeyAgreement::Ecdhe => preferred_group(ctx, NamedGroupType::Ecdhe)?,
            // Export keys are at most 512 bits and no named group is that small.
            T12KeyAgreement::RsaExport | T12KeyAgreement::DheExport => {
                debug!("No export-grade key agreement parameters for {:?}", self);
                return None;
            },
            T12KeyAgreement::Rsa | T12KeyAgreement::Ecdh => return None,
        };
        generate_possession(ctx, group)
    }

    fn handshake_producers(self, ctx: &HandshakeContext) -> Vec<HandshakeType> {
        if ctx.uses_tls13_rules() {
            return Vec::new();
        }
        if ctx.is_client() {
            vec![HandshakeType::ClientKeyExchange]
        } else if self.has_possession_generator() {
            vec![HandshakeType::ServerKeyExchange]
        } else {
            Vec::new()
        }
    }

    fn handshake_consumers(self, ctx: &HandshakeContext) -> Vec<HandshakeType> {
        if ctx.uses_tls13_rules() {
            return Vec::new();
        }
        if ctx.is_client() {
            if self.has_possession_generator() {
                vec![HandshakeType::ServerKeyExchange]
            } else {
                Vec::new()
            }
        } else {
            vec![HandshakeType::ClientKeyExchange]
        }
    }
}

/// Key agreement half of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAgreement {
    /// TLS 1.2 and earlier
    T12(T12KeyAgreement),
    /// TLS 1.3 (EC)DHE over one named group
    T13(NamedGroup),
}

/// Shared secret produced by a completed key agreement.
#[derive(Debug)]
pub struct KeyDerivation {
    group: NamedGroup,
    secret: SharedSecret,
}

impl KeyDerivation {
    /// Group the secret was agreed over.
    pub fn group(&self) -> NamedGroup {
        self.group
    }

    /// The (EC)DHE shared secret.
    pub fn shared_secret(&self) -> &SharedSecret {
        &self.secret
    }
}

/// A composed key exchange strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SslKeyExchange {
    authentication: Option<Authentication>,
    key_agreement: KeyAgreement,
}

impl SslKeyExchange {
    const fn t12(authentication: Option<Authentication>, ka: T12KeyAgreement) -> Self {
        Self {
            authentication,
            key_agreement: KeyAgreement::T12(ka),
        }
    }

    /// Strategy for a TLS 1.2 key exchange method.
    ///
    /// Returns `None` for protocols using TLS 1.3 rules, which negotiate
    /// key exchange per named group instead.
    pub fn value_of(method: KeyExchangeMethod, version: ProtocolVersion) -> Option<Self> {
        if version.uses_tls13_rules() {
            return None;
        }
        let rsa_sign = if version.uses_tls12_rules() {
            Authentication::RsaOrPss
        } else {
            Authentication::Rsa
        };
        let ke = match method {
            KeyExchangeMethod::Rsa => Self::t12(Some(Authentication::Rsa), T12KeyAgreement::Rsa),
            KeyExchangeMethod::RsaExport => {
                Self::t12(Some(Authentication::Rsa), T12KeyAgreement::RsaExport)
            },
            KeyExchangeMethod::DheDss => Self::t12(Some(Authentication::Dsa), T12KeyAgreement::Dhe),
            KeyExchangeMethod::DheDssExport => {
                Self::t12(Some(Authentication::Dsa), T12KeyAgreement::DheExport)
            },
            KeyExchangeMethod::DheRsa => Self::t12(Some(rsa_sign), T12KeyAgreement::Dhe),
            KeyExchangeMethod::DheRsaExport => {
                Self::t12(Some(Authentication::Rsa), T12KeyAgreement::DheExport)
            },
            KeyExchangeMethod::DhAnon => Self::t12(None, T12KeyAgreement::Dhe),
            KeyExchangeMethod::DhAnonExport => Self::t12(None, T12KeyAgreement::DheExport),
            // The static ECDH key lives in the EC certificate either way.
            KeyExchangeMethod::EcdhEcdsa | KeyExchangeMethod::EcdhRsa => {
                Self::t12(Some(Authentication::Ec), T12KeyAgreement::Ecdh)
            },
            KeyExchangeMethod::EcdheEcdsa => {
                Self::t12(Some(Authentication::Ec), T12KeyAgreement::Ecdhe)
            },
            KeyExchangeMethod::EcdheRsa => Self::t12(Some(rsa_sign), T12KeyAgreement::Ecdhe),
            KeyExchangeMethod::EcdhAnon => Self::t12(None, T12KeyAgreement::Ecdhe),
        };
        Some(ke)
    }

    /// TLS 1.3 strategy for `group`, if the group is locally enabled and
    /// implemented by the provider.
    pub fn value_of_group(ctx: &HandshakeContext, group: NamedGroup) -> Option<Self> {
        if ctx.config().named_groups.contains(&group)
            && ctx.provider().supports_key_exchange(group.algorithm())
        {
            Some(Self {
                authentication: None,
                key_agreement: KeyAgreement::T13(group),
            })
        } else {
            None
        }
    }

    /// The authentication half, absent for anonymous and TLS 1.3 exchanges.
    pub fn authentication(&self) -> Option<Authentication> {
        self.authentication
    }

    /// The key agreement half.
    pub fn key_agreement(&self) -> KeyAgreement {
        self.key_agreement
    }

    /// Create the local possessions this exchange needs.
    ///
    /// Returns an empty list when a required possession cannot be
    /// created. On the server the certificate possession is remembered
    /// as the interim authentication.
    pub fn create_possessions(&self, ctx: &mut HandshakeContext) -> Vec<Possession> {
        let mut auth_possession = None;
        if let Some(authentication) = self.authentication {
            match authentication.create_possession(ctx) {
                Some(pos) => auth_possession = Some(pos),
                None => return Vec::new(),
            }
            if !ctx.is_client() {
                ctx.interim_authn = auth_possession;
            }
        }

        let ka_possession = match self.key_agreement {
            KeyAgreement::T13(group) => generate_possession(ctx, group),
            KeyAgreement::T12(T12KeyAgreement::RsaExport) => {
                // An RSA key of up to 512 bits serves directly.
                match auth_possession {
                    Some(auth) if auth.key_bits() > 512 => {
                        match T12KeyAgreement::RsaExport.create_possession(ctx) {
                            Some(ka) => return vec![Possession::X509(auth), ka],
                            None => return Vec::new(),
                        }
                    },
                    Some(auth) => return vec![Possession::X509(auth)],
                    None => return Vec::new(),
                }
            },
            KeyAgreement::T12(ka) => ka.create_possession(ctx),
        };

        match (auth_possession, ka_possession) {
            (Some(auth), Some(ka)) => vec![Possession::X509(auth), ka],
            (None, Some(ka)) => vec![ka],
            (auth, None) => match self.key_agreement {
                KeyAgreement::T12(T12KeyAgreement::Rsa | T12KeyAgreement::Ecdh) => {
                    auth.map(Possession::X509).into_iter().collect()
                },
                _ => Vec::new(),
            },
        }
    }

    /// Derive the shared secret from the possession and peer credential
    /// agreed for this exchange.
    pub fn create_key_derivation(&self, ctx: &HandshakeContext) -> Result<KeyDerivation> {
        let group_type = match self.key_agreement {
            KeyAgreement::T13(group) => Some(group.group_type()),
            KeyAgreement::T12(T12KeyAgreement::Dhe) => Some(NamedGroupType::Ffdhe),
            KeyAgreement::T12(T12KeyAgreement::Ecdhe) => Some(NamedGroupType::Ecdhe),
            KeyAgreement::T12(_) => None,
        };
        let group_type = group_type.ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!(
                "key derivation for {:?} key agreement",
                self.key_agreement
            ))
        })?;

        for pos in ctx.handshake_possessions.iter().filter_map(Possession::as_key_agreement) {
            if pos.group.group_type() != group_type {
                continue;
            }
            if let KeyAgreement::T13(group) = self.key_agreement {
                if pos.group != group {
                    continue;
                }
            }
            let Some(cred) = ctx
                .handshake_credentials
                .iter()
                .find(|cred| cred.group == pos.group)
            else {
                continue;
            };
            let kex = ctx.provider().key_exchange(pos.group.algorithm())?;
            let secret = kex.exchange(&pos.private_key, &cred.public_key)?;
            return Ok(KeyDerivation {
                group: pos.group,
                secret,
            });
        }

        Err(Error::fatal(
            AlertDescription::HandshakeFailure,
            "No sufficient key agreement parameters negotiated",
        ))
    }

    /// Legacy handshake messages related to this exchange.
    pub fn related_handshakers(&self, ctx: &HandshakeContext) -> Vec<HandshakeType> {
        let mut handshakers = self
            .authentication
            .map(|auth| auth.related_handshakers(ctx))
            .unwrap_or_default();
        if let KeyAgreement::T12(ka) = self.key_agreement {
            if !ctx.uses_tls13_rules() && ka.has_possession_generator() {
                handshakers.push(HandshakeType::ServerKeyExchange);
            }
        }
        handshakers
    }

    /// Legacy messages this side must produce for the exchange.
    pub fn handshake_producers(&self, ctx: &HandshakeContext) -> Vec<HandshakeType> {
        match self.key_agreement {
            KeyAgreement::T12(ka) => ka.handshake_producers(ctx),
            KeyAgreement::T13(_) => Vec::new(),
        }
    }

    /// Legacy messages this side must consume for the exchange.
    pub fn handshake_consumers(&self, ctx: &HandshakeContext) -> Vec<HandshakeType> {
        match self.key_agreement {
            KeyAgreement::T12(ka) => ka.handshake_consumers(ctx),
            KeyAgreement::T13(_) => Vec::new(),
        }
    }
}

fn generate_possession(ctx: &HandshakeContext, group: NamedGroup) -> Option<Possession> {
    match KeyAgreementPossession::generate(ctx, group) {
        Ok(pos) => Some(Possession::KeyAgreement(pos)),
        Err(e) => {
            warn!("Cannot generate key pair for {}: {}", group, e);
            None
        },
    }
}

/// Group for a TLS 1.2 ephemeral exchange: the group the server already
/// chose, else the first activatable group the client requested, else
/// the first activatable local group.
fn preferred_group(ctx: &HandshakeContext, group_type: NamedGroupType) -> Option<NamedGroup> {
    if let Some(group) = ctx.server_selected_group {
        if group.group_type() == group_type {
            return Some(group);
        }
    }
    let config = ctx.config();
    let activatable = |group: &NamedGroup| {
        group.group_type() == group_type
            && is_activatable(
                &config.named_groups,
                ctx.provider(),
                &config.constraints,
                *group,
            )
    };
    ctx.client_requested_named_groups
        .iter()
        .copied()
        .find(|g| activatable(g))
        .or_else(|| config.named_groups.iter().copied().find(|g| activatable(g)))
}
