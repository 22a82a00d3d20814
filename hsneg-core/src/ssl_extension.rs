//! Extension dispatch.
//!
//! Every negotiated extension is identified per message by an
//! [`SslExtension`]. Each role has a static table that binds those ids to
//! the functions handling them on that side:
//!
//! | hook        | runs when                                         |
//! |-------------|---------------------------------------------------|
//! | producer    | building the outgoing message                     |
//! | on_load     | the extension is present in an incoming message   |
//! | on_absence  | the extension is missing from an incoming message |
//! | on_trade    | after every on_load of the message has run        |
//! | reproducer  | rebuilding a HelloRetryRequest statelessly        |
//!
//! Table order is processing order; `supported_groups` comes before
//! `key_share` because the key share producers read the requested groups.

use std::fmt;

use tracing::debug;

use crate::cert_sign_algs::{self, SignatureSchemesSpec};
use crate::context::{ClientHandshakeContext, HandshakeContext, ServerHandshakeContext};
use crate::cookie::{self, CookieSpec};
use crate::error::Result;
use crate::extensions::{Extension, Extensions};
use crate::key_share::{self, ChKeyShareSpec, HrrKeyShareSpec, ShKeyShareSpec};
use crate::protocol::{ExtensionType, HandshakeType};
use crate::supported_groups::{self, SupportedGroupsSpec};

/// An extension as it appears in one particular handshake message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SslExtension {
    /// supported_groups in ClientHello
    ChSupportedGroups,
    /// key_share in ClientHello
    ChKeyShare,
    /// key_share in ServerHello
    ShKeyShare,
    /// key_share in HelloRetryRequest
    HrrKeyShare,
    /// signature_algorithms_cert in ClientHello
    ChSignatureAlgorithmsCert,
    /// signature_algorithms_cert in CertificateRequest
    CrSignatureAlgorithmsCert,
    /// cookie in ClientHello
    ChCookie,
    /// cookie in HelloRetryRequest
    HrrCookie,
}

impl SslExtension {
    /// Wire extension type.
    pub const fn extension_type(self) -> ExtensionType {
        match self {
            SslExtension::ChSupportedGroups => ExtensionType::SupportedGroups,
            SslExtension::ChKeyShare | SslExtension::ShKeyShare | SslExtension::HrrKeyShare => {
                ExtensionType::KeyShare
            },
            SslExtension::ChSignatureAlgorithmsCert | SslExtension::CrSignatureAlgorithmsCert => {
                ExtensionType::SignatureAlgorithmsCert
            },
            SslExtension::ChCookie | SslExtension::HrrCookie => ExtensionType::Cookie,
        }
    }

    /// The handshake message carrying the extension.
    pub const fn handshake_type(self) -> HandshakeType {
        match self {
            SslExtension::ChSupportedGroups
            | SslExtension::ChKeyShare
            | SslExtension::ChSignatureAlgorithmsCert
            | SslExtension::ChCookie => HandshakeType::ClientHello,
            SslExtension::ShKeyShare => HandshakeType::ServerHello,
            SslExtension::HrrKeyShare | SslExtension::HrrCookie => {
                HandshakeType::HelloRetryRequest
            },
            SslExtension::CrSignatureAlgorithmsCert => HandshakeType::CertificateRequest,
        }
    }

    /// Extension name.
    pub const fn name(self) -> &'static str {
        self.extension_type().name()
    }
}

impl fmt::Display for SslExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.name(), self.handshake_type().name())
    }
}

/// A parsed or produced extension, stored in the handshake context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionSpec {
    /// supported_groups
    SupportedGroups(SupportedGroupsSpec),
    /// ClientHello key_share
    ChKeyShare(ChKeyShareSpec),
    /// ServerHello key_share
    ShKeyShare(ShKeyShareSpec),
    /// HelloRetryRequest key_share
    HrrKeyShare(HrrKeyShareSpec),
    /// signature_algorithms_cert
    SignatureSchemes(SignatureSchemesSpec),
    /// cookie
    Cookie(CookieSpec),
}

impl fmt::Display for ExtensionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionSpec::SupportedGroups(spec) => spec.fmt(f),
            ExtensionSpec::ChKeyShare(spec) => spec.fmt(f),
            ExtensionSpec::ShKeyShare(spec) => spec.fmt(f),
            ExtensionSpec::HrrKeyShare(spec) => spec.fmt(f),
            ExtensionSpec::SignatureSchemes(spec) => spec.fmt(f),
            ExtensionSpec::Cookie(spec) => spec.fmt(f),
        }
    }
}

/// Decode `data` as `extension` for debug output.
///
/// Undecodable data renders as the decode error.
pub fn stringize(extension: SslExtension, data: &[u8]) -> String {
    let spec = match extension {
        SslExtension::ChSupportedGroups => {
            SupportedGroupsSpec::decode(data).map(ExtensionSpec::SupportedGroups)
        },
        SslExtension::ChKeyShare => ChKeyShareSpec::decode(data).map(ExtensionSpec::ChKeyShare),
        SslExtension::ShKeyShare => ShKeyShareSpec::decode(data).map(ExtensionSpec::ShKeyShare),
        SslExtension::HrrKeyShare => {
            HrrKeyShareSpec::decode(data).map(ExtensionSpec::HrrKeyShare)
        },
        SslExtension::ChSignatureAlgorithmsCert | SslExtension::CrSignatureAlgorithmsCert => {
            SignatureSchemesSpec::decode(data).map(ExtensionSpec::SignatureSchemes)
        },
        SslExtension::ChCookie | SslExtension::HrrCookie => {
            CookieSpec::decode(data).map(ExtensionSpec::Cookie)
        },
    };
    match spec {
        Ok(spec) => spec.to_string(),
        Err(e) => e.to_string(),
    }
}

/// Produces extension data; `None` omits the extension.
pub type Producer<C> = fn(&mut C) -> Result<Option<Vec<u8>>>;
/// Consumes the data of a present extension.
pub type OnLoadConsumer<C> = fn(&mut C, &[u8]) -> Result<()>;
/// Reacts to a missing extension.
pub type AbsenceHandler<C> = fn(&mut C) -> Result<()>;
/// Applies a parsed extension once the whole message is loaded.
pub type OnTradeConsumer<C> = fn(&mut C) -> Result<()>;

/// One row of a dispatch table.
pub struct ExtensionEntry<C> {
    /// The extension handled
    pub extension: SslExtension,
    /// Outgoing data
    pub producer: Option<Producer<C>>,
    /// Incoming data
    pub on_load: Option<OnLoadConsumer<C>>,
    /// Missing extension
    pub on_absence: Option<AbsenceHandler<C>>,
    /// Post-parse update
    pub on_trade: Option<OnTradeConsumer<C>>,
    /// Stateless HelloRetryRequest reconstruction
    pub reproducer: Option<Producer<C>>,
}

impl<C> fmt::Debug for ExtensionEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionEntry")
            .field("extension", &self.extension)
            .field("producer", &self.producer.is_some())
            .field("on_load", &self.on_load.is_some())
            .field("on_absence", &self.on_absence.is_some())
            .field("on_trade", &self.on_trade.is_some())
            .field("reproducer", &self.reproducer.is_some())
            .finish()
    }
}

impl<C> ExtensionEntry<C> {
    const fn new(extension: SslExtension) -> Self {
        Self {
            extension,
            producer: None,
            on_load: None,
            on_absence: None,
            on_trade: None,
            reproducer: None,
        }
    }
}

/// Handshake contexts that own a dispatch table.
pub trait ExtensionTable: std::ops::DerefMut<Target = HandshakeContext> + Sized + 'static {
    /// Rows in processing order.
    const EXTENSIONS: &'static [ExtensionEntry<Self>];
}

const CLIENT_EXTENSIONS: &[ExtensionEntry<ClientHandshakeContext>] = &[
    ExtensionEntry {
        producer: Some(supported_groups::ch_produce),
        ..ExtensionEntry::new(SslExtension::ChSupportedGroups)
    },
    ExtensionEntry {
        producer: Some(key_share::ch_produce),
        ..ExtensionEntry::new(SslExtension::ChKeyShare)
    },
    ExtensionEntry {
        on_load: Some(key_share::sh_consume),
        on_absence: Some(key_share::sh_absent),
        ..ExtensionEntry::new(SslExtension::ShKeyShare)
    },
    ExtensionEntry {
        on_load: Some(key_share::hrr_consume),
        ..ExtensionEntry::new(SslExtension::HrrKeyShare)
    },
    ExtensionEntry {
        producer: Some(cert_sign_algs::ch_produce),
        ..ExtensionEntry::new(SslExtension::ChSignatureAlgorithmsCert)
    },
    ExtensionEntry {
        on_load: Some(cert_sign_algs::cr_consume),
        on_trade: Some(cert_sign_algs::cr_update),
        ..ExtensionEntry::new(SslExtension::CrSignatureAlgorithmsCert)
    },
    ExtensionEntry {
        producer: Some(cookie::ch_produce),
        ..ExtensionEntry::new(SslExtension::ChCookie)
    },
    ExtensionEntry {
        on_load: Some(cookie::hrr_consume),
        ..ExtensionEntry::new(SslExtension::HrrCookie)
    },
];

const SERVER_EXTENSIONS: &[ExtensionEntry<ServerHandshakeContext>] = &[
    ExtensionEntry {
        on_load: Some(supported_groups::ch_consume),
        ..ExtensionEntry::new(SslExtension::ChSupportedGroups)
    },
    ExtensionEntry {
        on_load: Some(key_share::ch_consume),
        ..ExtensionEntry::new(SslExtension::ChKeyShare)
    },
    ExtensionEntry {
        producer: Some(key_share::sh_produce),
        ..ExtensionEntry::new(SslExtension::ShKeyShare)
    },
    ExtensionEntry {
        producer: Some(key_share::hrr_produce),
        reproducer: Some(key_share::hrr_reproduce),
        ..ExtensionEntry::new(SslExtension::HrrKeyShare)
    },
    ExtensionEntry {
        on_load: Some(cert_sign_algs::ch_consume),
        on_trade: Some(cert_sign_algs::ch_update),
        ..ExtensionEntry::new(SslExtension::ChSignatureAlgorithmsCert)
    },
    ExtensionEntry {
        producer: Some(cert_sign_algs::cr_produce),
        ..ExtensionEntry::new(SslExtension::CrSignatureAlgorithmsCert)
    },
    ExtensionEntry {
        on_load: Some(cookie::ch_consume),
        on_trade: Some(cookie::ch_update),
        ..ExtensionEntry::new(SslExtension::ChCookie)
    },
    ExtensionEntry {
        producer: Some(cookie::hrr_produce),
        reproducer: Some(cookie::hrr_reproduce),
        ..ExtensionEntry::new(SslExtension::HrrCookie)
    },
];

impl ExtensionTable for ClientHandshakeContext {
    const EXTENSIONS: &'static [ExtensionEntry<Self>] = CLIENT_EXTENSIONS;
}

impl ExtensionTable for ServerHandshakeContext {
    const EXTENSIONS: &'static [ExtensionEntry<Self>] = SERVER_EXTENSIONS;
}

fn entries_for<C: ExtensionTable>(
    message: HandshakeType,
) -> impl Iterator<Item = &'static ExtensionEntry<C>> {
    C::EXTENSIONS
        .iter()
        .filter(move |entry| entry.extension.handshake_type() == message)
}

/// Run the producers for `message` and collect their extensions.
pub fn produce_extensions<C: ExtensionTable>(
    ctx: &mut C,
    message: HandshakeType,
) -> Result<Extensions> {
    let mut extensions = Extensions::new();
    for entry in entries_for::<C>(message) {
        let Some(produce) = entry.producer else {
            continue;
        };
        if let Some(data) = produce(ctx)? {
            debug!("Produced {}: {}", entry.extension, stringize(entry.extension, &data));
            extensions.add(Extension::new(entry.extension.extension_type(), data));
        }
    }
    Ok(extensions)
}

/// Rebuild the extensions of a HelloRetryRequest from the retried
/// ClientHello.
pub fn reproduce_extensions<C: ExtensionTable>(
    ctx: &mut C,
    message: HandshakeType,
) -> Result<Extensions> {
    let mut extensions = Extensions::new();
    for entry in entries_for::<C>(message) {
        let Some(reproduce) = entry.reproducer else {
            continue;
        };
        if let Some(data) = reproduce(ctx)? {
            extensions.add(Extension::new(entry.extension.extension_type(), data));
        }
    }
    Ok(extensions)
}

/// Consume the extensions of an incoming `message`.
///
/// All on-load consumers and absence handlers run first, in table
/// order; the post-parse updates follow once the message is fully
/// loaded. The first error aborts.
pub fn consume_extensions<C: ExtensionTable>(
    ctx: &mut C,
    message: HandshakeType,
    extensions: &Extensions,
) -> Result<()> {
    for entry in entries_for::<C>(message) {
        match extensions.get(entry.extension.extension_type()) {
            Some(ext) => {
                if let Some(consume) = entry.on_load {
                    debug!(
                        "Consuming {}: {}",
                        entry.extension,
                        stringize(entry.extension, &ext.data)
                    );
                    consume(ctx, &ext.data)?;
                }
            },
            None => {
                if let Some(absent) = entry.on_absence {
                    absent(ctx)?;
                }
            },
        }
    }

    for entry in entries_for::<C>(message) {
        if let Some(update) = entry.on_trade {
            update(ctx)?;
        }
    }
    Ok(())
}
