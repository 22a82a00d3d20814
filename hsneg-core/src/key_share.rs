//! key_share extension (RFC 8446 Section 4.2.8).
//!
//! ```text
//! struct {
//!     NamedGroup group;
//!     opaque key_exchange<1..2^16-1>;
//! } KeyShareEntry;
//!
//! ClientHello:        KeyShareEntry client_shares<0..2^16-1>;
//! ServerHello:        KeyShareEntry server_share;
//! HelloRetryRequest:  NamedGroup selected_group;
//! ```
//!
//! The client offers a single share for its most preferred group. The
//! server skips every ClientHello entry it cannot use and asks for a
//! HelloRetryRequest when none is left; ServerHello and HelloRetryRequest
//! problems abort the handshake.

use std::fmt;

use bytes::{BufMut, BytesMut};
use tracing::{debug, warn};

use crate::codec;
use crate::context::{ClientHandshakeContext, HandshakeContext, ServerHandshakeContext};
use crate::error::{AlertDescription, Error, Result};
use crate::key_exchange::{KeyAgreementCredentials, Possession, SslKeyExchange};
use crate::named_group::NamedGroup;
use crate::protocol::HandshakeType;
use crate::ssl_extension::{ExtensionSpec, SslExtension};
use crate::supported_groups::is_activatable;

/// One offered or selected key share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    /// Named group id, possibly unknown
    pub named_group_id: u16,
    /// Encoded public key
    pub key_exchange: Vec<u8>,
}

impl KeyShareEntry {
    /// Create an entry.
    pub fn new(named_group_id: u16, key_exchange: Vec<u8>) -> Self {
        Self {
            named_group_id,
            key_exchange,
        }
    }

    fn encoded_len(&self) -> usize {
        4 + self.key_exchange.len()
    }

    fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u16(self.named_group_id);
        codec::put_opaque16(buf, &self.key_exchange);
    }

    /// Read one entry from `buf`. An empty key_exchange is malformed.
    pub fn decode(buf: &mut &[u8]) -> Result<Self> {
        let named_group_id = codec::get_uint16(buf)?;
        let key_exchange = codec::get_opaque16(buf)?;
        if key_exchange.is_empty() {
            return Err(Error::DecodeError(
                "Invalid key_share extension: empty key_exchange".into(),
            ));
        }
        Ok(Self::new(named_group_id, key_exchange))
    }

    /// Encode the entry on its own.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.to_vec()
    }
}

impl fmt::Display for KeyShareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"named group\": {}, \"key_exchange\": {} bytes}}",
            NamedGroup::name_of(self.named_group_id),
            self.key_exchange.len()
        )
    }
}

/// key_share in ClientHello.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChKeyShareSpec {
    /// Offered shares in client order
    pub client_shares: Vec<KeyShareEntry>,
}

impl ChKeyShareSpec {
    /// Decode the extension data.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        codec::get_list_length16(&mut data, "key_share")?;

        let mut client_shares = Vec::new();
        while !data.is_empty() {
            client_shares.push(KeyShareEntry::decode(&mut data)?);
        }
        Ok(Self { client_shares })
    }

    /// Encode the extension data.
    pub fn encode(&self) -> Vec<u8> {
        let list_len: usize = self.client_shares.iter().map(KeyShareEntry::encoded_len).sum();
        let mut buf = BytesMut::with_capacity(2 + list_len);
        buf.put_u16(list_len as u16);
        for entry in &self.client_shares {
            entry.encode_into(&mut buf);
        }
        buf.to_vec()
    }
}

impl fmt::Display for ChKeyShareSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"client_shares\": [")?;
        for (i, entry) in self.client_shares.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            entry.fmt(f)?;
        }
        f.write_str("]")
    }
}

/// key_share in ServerHello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShKeyShareSpec {
    /// The server's share
    pub server_share: KeyShareEntry,
}

impl ShKeyShareSpec {
    /// Decode the extension data.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        // group id, key length, at least one key byte
        if data.len() < 5 {
            return Err(Error::DecodeError(format!(
                "Invalid key_share extension: insufficient data (length={})",
                data.len()
            )));
        }
        let server_share = KeyShareEntry::decode(&mut data)?;
        if !data.is_empty() {
            return Err(Error::DecodeError(
                "Invalid key_share extension: unknown extra data".into(),
            ));
        }
        Ok(Self { server_share })
    }

    /// Encode the extension data.
    pub fn encode(&self) -> Vec<u8> {
        self.server_share.encode()
    }
}

impl fmt::Display for ShKeyShareSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"server_share\": {}", self.server_share)
    }
}

/// key_share in HelloRetryRequest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HrrKeyShareSpec {
    /// The group the client must use on retry
    pub selected_group: u16,
}

impl HrrKeyShareSpec {
    /// Decode the extension data.
    pub fn decode(data: &[u8]) -> Result<Self> {
        match data {
            [hi, lo] => Ok(Self {
                selected_group: u16::from_be_bytes([*hi, *lo]),
            }),
            _ => Err(Error::DecodeError(format!(
                "Invalid key_share extension: improper data (length={})",
                data.len()
            ))),
        }
    }

    /// Encode the extension data.
    pub fn encode(&self) -> Vec<u8> {
        self.selected_group.to_be_bytes().to_vec()
    }
}

impl fmt::Display for HrrKeyShareSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"selected group\": {}", NamedGroup::name_of(self.selected_group))
    }
}

/// Why a ClientHello key share entry was passed over.
///
/// Rejections are logged and dropped; they never abort a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareRejection {
    /// The group id is not in the registry
    UnknownGroup(u16),
    /// The group is known but not usable locally
    InactiveGroup(NamedGroup),
    /// The key does not decode as a public key of its group
    UndecodableKey {
        /// Group of the entry
        group: NamedGroup,
        /// Decoder diagnostic
        reason: String,
    },
    /// The key fails the key size policy
    NonCompliantKey(NamedGroup),
}

impl fmt::Display for ShareRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareRejection::UnknownGroup(id) => {
                write!(f, "{}", NamedGroup::name_of(*id))
            },
            ShareRejection::InactiveGroup(group) => write!(f, "{} is not activatable", group),
            ShareRejection::UndecodableKey { group, reason } => {
                write!(f, "cannot decode {} key: {}", group, reason)
            },
            ShareRejection::NonCompliantKey(group) => {
                write!(f, "{} key does not comply with algorithm constraints", group)
            },
        }
    }
}

/// Turn one offered entry into a peer credential, or say why not.
pub fn check_client_share(
    ctx: &HandshakeContext,
    entry: &KeyShareEntry,
) -> core::result::Result<KeyAgreementCredentials, ShareRejection> {
    let group = NamedGroup::from_id(entry.named_group_id)
        .ok_or(ShareRejection::UnknownGroup(entry.named_group_id))?;
    if !is_activatable(ctx, group) {
        return Err(ShareRejection::InactiveGroup(group));
    }
    let credentials = KeyAgreementCredentials::value_of(ctx, group, &entry.key_exchange)
        .map_err(|e| ShareRejection::UndecodableKey {
            group,
            reason: e.to_string(),
        })?;
    if !ctx.config().constraints.permits_key_agreement(group) {
        return Err(ShareRejection::NonCompliantKey(group));
    }
    Ok(credentials)
}

fn stored_ch_key_share(ctx: &HandshakeContext) -> Option<&ChKeyShareSpec> {
    match ctx.spec(SslExtension::ChKeyShare) {
        Some(ExtensionSpec::ChKeyShare(spec)) => Some(spec),
        _ => None,
    }
}

/// ClientHello producer: one share, for the group the server selected on
/// retry or else the first usable requested group.
pub fn ch_produce(ctx: &mut ClientHandshakeContext) -> Result<Option<Vec<u8>>> {
    if !ctx.config().is_available(SslExtension::ChKeyShare) {
        debug!("Ignore unavailable key_share extension");
        return Ok(None);
    }

    let named_groups = match ctx.server_selected_group {
        Some(group) => {
            // Retry: the first attempt's key pairs are never reused.
            ctx.handshake_possessions.clear();
            vec![group]
        },
        None => ctx.client_requested_named_groups.clone(),
    };
    if named_groups.is_empty() {
        warn!("Ignore key_share extension, no supported groups");
        return Ok(None);
    }

    let mut client_shares = Vec::new();
    for group in named_groups {
        let Some(ke) = SslKeyExchange::value_of_group(ctx, group) else {
            warn!("No key exchange for named group {}", group);
            continue;
        };

        let possessions = ke.create_possessions(ctx);
        for pos in &possessions {
            if let Some(ka) = pos.as_key_agreement() {
                client_shares.push(KeyShareEntry::new(group.id(), ka.encode().to_vec()));
            }
        }
        ctx.handshake_possessions.extend(possessions);

        if !client_shares.is_empty() {
            break;
        }
    }

    let spec = ChKeyShareSpec { client_shares };
    let data = spec.encode();
    ctx.handshake_extensions
        .insert(SslExtension::ChKeyShare, ExtensionSpec::ChKeyShare(spec));
    Ok(Some(data))
}

/// ClientHello consumer: collect the usable peer shares.
///
/// No usable share schedules a HelloRetryRequest.
pub fn ch_consume(ctx: &mut ServerHandshakeContext, data: &[u8]) -> Result<()> {
    if stored_ch_key_share(ctx).is_some() {
        debug!("The key_share extension has been loaded");
        return Ok(());
    }
    if !ctx.config().is_available(SslExtension::ChKeyShare) {
        debug!("Ignore unavailable key_share extension");
        return Ok(());
    }

    let spec = ChKeyShareSpec::decode(data)?;
    let mut credentials = Vec::new();
    for entry in &spec.client_shares {
        match check_client_share(ctx, entry) {
            Ok(cred) => credentials.push(cred),
            Err(rejection) => debug!("Ignore key_share entry: {}", rejection),
        }
    }

    if credentials.is_empty() {
        debug!("No available client key share entries");
        ctx.handshake_producers.insert(HandshakeType::HelloRetryRequest);
    } else {
        ctx.handshake_credentials.extend(credentials);
    }

    ctx.handshake_extensions
        .insert(SslExtension::ChKeyShare, ExtensionSpec::ChKeyShare(spec));
    Ok(())
}

/// ServerHello producer: answer the first offered share we can use.
pub fn sh_produce(ctx: &mut ServerHandshakeContext) -> Result<Option<Vec<u8>>> {
    if stored_ch_key_share(ctx).is_none() {
        warn!("Ignore, no client key_share extension");
        return Ok(None);
    }
    if !ctx.config().is_available(SslExtension::ShKeyShare) {
        warn!("Ignore, no available server key_share extension");
        return Ok(None);
    }
    if ctx.handshake_credentials.is_empty() {
        warn!("No available client key share entries");
        return Ok(None);
    }

    let credentials = ctx.handshake_credentials.clone();
    for cred in &credentials {
        let group = cred.group();
        let Some(ke) = SslKeyExchange::value_of_group(ctx, group) else {
            continue;
        };

        let possession = ke
            .create_possessions(ctx)
            .into_iter()
            .find_map(|pos| match pos {
                Possession::KeyAgreement(ka) if ka.group() == group => Some(ka),
                _ => None,
            });
        let Some(possession) = possession else {
            continue;
        };

        let spec = ShKeyShareSpec {
            server_share: KeyShareEntry::new(group.id(), possession.encode().to_vec()),
        };
        ctx.handshake_key_exchange = Some(ke);
        ctx.handshake_possessions.push(Possession::KeyAgreement(possession));
        let producers = ke.handshake_producers(ctx);
        ctx.handshake_producers.extend(producers);

        let data = spec.encode();
        ctx.handshake_extensions
            .insert(SslExtension::ShKeyShare, ExtensionSpec::ShKeyShare(spec));
        return Ok(Some(data));
    }

    warn!("No available server key_share entry");
    Ok(None)
}

/// ServerHello consumer: the server's share must be usable.
pub fn sh_consume(ctx: &mut ClientHandshakeContext, data: &[u8]) -> Result<()> {
    if ctx.client_requested_named_groups.is_empty() {
        return Err(Error::fatal(
            AlertDescription::UnexpectedMessage,
            "Unexpected key_share extension in ServerHello",
        ));
    }
    if !ctx.config().is_available(SslExtension::ShKeyShare) {
        return Err(Error::fatal(
            AlertDescription::UnexpectedMessage,
            "Unsupported key_share extension in ServerHello",
        ));
    }

    let spec = ShKeyShareSpec::decode(data)?;
    let id = spec.server_share.named_group_id;
    let base: &HandshakeContext = ctx;
    let group = NamedGroup::from_id(id)
        .filter(|&group| is_activatable(base, group))
        .ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!(
                "Unsupported named group: {}",
                NamedGroup::name_of(id)
            ))
        })?;
    let ke = SslKeyExchange::value_of_group(ctx, group).ok_or_else(|| {
        Error::UnsupportedAlgorithm(format!("No key exchange for named group {}", group))
    })?;

    let credentials =
        KeyAgreementCredentials::value_of(ctx, group, &spec.server_share.key_exchange)
            .map_err(|e| {
                Error::fatal(
                    AlertDescription::UnexpectedMessage,
                    format!("Cannot decode named group: {}: {}", group, e),
                )
            })?;
    if !ctx.config().constraints.permits_key_agreement(group) {
        return Err(Error::ConstraintViolation(format!(
            "key share entry of {} does not comply with algorithm constraints",
            group
        )));
    }

    ctx.handshake_key_exchange = Some(ke);
    ctx.handshake_credentials.push(credentials);
    ctx.handshake_extensions
        .insert(SslExtension::ShKeyShare, ExtensionSpec::ShKeyShare(spec));
    Ok(())
}

/// ServerHello without key_share: drop the offered key pairs.
pub fn sh_absent(ctx: &mut ClientHandshakeContext) -> Result<()> {
    debug!("No key_share extension in ServerHello, cleanup the key shares if necessary");
    ctx.handshake_possessions.clear();
    Ok(())
}

fn check_hrr_available(ctx: &HandshakeContext) -> Result<()> {
    if !ctx.config().is_available(SslExtension::HrrKeyShare) {
        return Err(Error::fatal(
            AlertDescription::UnexpectedMessage,
            "Unsupported key_share extension in HelloRetryRequest",
        ));
    }
    if ctx.client_requested_named_groups.is_empty() {
        return Err(Error::fatal(
            AlertDescription::UnexpectedMessage,
            "Unexpected key_share extension in HelloRetryRequest",
        ));
    }
    Ok(())
}

/// HelloRetryRequest producer: select the first activatable requested
/// group.
pub fn hrr_produce(ctx: &mut ServerHandshakeContext) -> Result<Option<Vec<u8>>> {
    check_hrr_available(ctx)?;

    let base: &HandshakeContext = ctx;
    let selected = base
        .client_requested_named_groups
        .iter()
        .copied()
        .find(|&group| is_activatable(base, group))
        .ok_or_else(|| Error::UnsupportedAlgorithm("No common named group".into()))?;
    debug!("Selected named group for HelloRetryRequest: {}", selected);

    ctx.server_selected_group = Some(selected);
    let spec = HrrKeyShareSpec {
        selected_group: selected.id(),
    };
    let data = spec.encode();
    ctx.handshake_extensions
        .insert(SslExtension::HrrKeyShare, ExtensionSpec::HrrKeyShare(spec));
    Ok(Some(data))
}

/// HelloRetryRequest reproducer: the group of the single share in the
/// retried ClientHello.
pub fn hrr_reproduce(ctx: &mut ServerHandshakeContext) -> Result<Option<Vec<u8>>> {
    if !ctx.config().is_available(SslExtension::HrrKeyShare) {
        return Err(Error::fatal(
            AlertDescription::UnexpectedMessage,
            "Unsupported key_share extension in HelloRetryRequest",
        ));
    }

    match stored_ch_key_share(ctx).map(|spec| spec.client_shares.as_slice()) {
        Some([entry]) => Ok(Some(
            HrrKeyShareSpec {
                selected_group: entry.named_group_id,
            }
            .encode(),
        )),
        _ => Ok(None),
    }
}

/// HelloRetryRequest consumer: remember the group to retry with.
pub fn hrr_consume(ctx: &mut ClientHandshakeContext, data: &[u8]) -> Result<()> {
    check_hrr_available(ctx)?;

    let spec = HrrKeyShareSpec::decode(data)?;
    let group = NamedGroup::from_id(spec.selected_group).ok_or_else(|| {
        Error::UnsupportedAlgorithm(format!(
            "Unsupported HelloRetryRequest selected group: {}",
            NamedGroup::name_of(spec.selected_group)
        ))
    })?;
    if !ctx.client_requested_named_groups.contains(&group) {
        return Err(Error::fatal(
            AlertDescription::IllegalParameter,
            format!("Unexpected HelloRetryRequest selected group: {}", group),
        ));
    }

    ctx.server_selected_group = Some(group);
    ctx.handshake_extensions
        .insert(SslExtension::HrrKeyShare, ExtensionSpec::HrrKeyShare(spec));
    Ok(())
}
