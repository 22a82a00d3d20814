//! supported_groups extension (RFC 8446 Section 4.2.7).
//!
//! Carries the client's requested groups, which the key_share producers
//! on both sides select from.

use std::fmt;

use bytes::{BufMut, BytesMut};
use tracing::{debug, warn};

use crate::codec;
use crate::context::{ClientHandshakeContext, HandshakeContext, ServerHandshakeContext};
use crate::error::{Error, Result};
use crate::named_group::{self, NamedGroup};
use crate::ssl_extension::{ExtensionSpec, SslExtension};

/// supported_groups in ClientHello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedGroupsSpec {
    /// Requested group ids in client order, unknown ones included
    pub named_groups_ids: Vec<u16>,
}

impl SupportedGroupsSpec {
    /// Decode the extension data.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let list_len = codec::get_list_length16(&mut data, "supported_groups")?;
        if list_len == 0 || list_len % 2 != 0 {
            return Err(Error::DecodeError(format!(
                "Invalid supported_groups extension: incorrect list length (length={})",
                list_len
            )));
        }
        let named_groups_ids = data
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        Ok(Self { named_groups_ids })
    }

    /// Encode the extension data.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(2 + self.named_groups_ids.len() * 2);
        buf.put_u16((self.named_groups_ids.len() * 2) as u16);
        for &id in &self.named_groups_ids {
            buf.put_u16(id);
        }
        buf.to_vec()
    }
}

impl fmt::Display for SupportedGroupsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .named_groups_ids
            .iter()
            .map(|&id| NamedGroup::name_of(id))
            .collect();
        write!(f, "\"named groups\": [{}]", names.join(", "))
    }
}

/// Whether `group` can be used for a new key exchange on this handshake.
pub fn is_activatable(ctx: &HandshakeContext, group: NamedGroup) -> bool {
    let config = ctx.config();
    named_group::is_activatable(&config.named_groups, ctx.provider(), &config.constraints, group)
}

/// ClientHello producer: request every activatable local group.
pub fn ch_produce(ctx: &mut ClientHandshakeContext) -> Result<Option<Vec<u8>>> {
    if !ctx.config().is_available(SslExtension::ChSupportedGroups) {
        debug!("Ignore unavailable supported_groups extension");
        return Ok(None);
    }

    let base: &HandshakeContext = ctx;
    let requested: Vec<NamedGroup> = base
        .config()
        .named_groups
        .iter()
        .copied()
        .filter(|&group| is_activatable(base, group))
        .collect();
    if requested.is_empty() {
        warn!("No available named group for supported_groups extension");
        return Ok(None);
    }

    let spec = SupportedGroupsSpec {
        named_groups_ids: requested.iter().map(|g| g.id()).collect(),
    };
    let data = spec.encode();
    ctx.client_requested_named_groups = requested;
    ctx.handshake_extensions
        .insert(SslExtension::ChSupportedGroups, ExtensionSpec::SupportedGroups(spec));
    Ok(Some(data))
}

/// ClientHello consumer: record the known requested groups.
pub fn ch_consume(ctx: &mut ServerHandshakeContext, data: &[u8]) -> Result<()> {
    if !ctx.config().is_available(SslExtension::ChSupportedGroups) {
        debug!("Ignore unavailable supported_groups extension");
        return Ok(());
    }

    let spec = SupportedGroupsSpec::decode(data)?;
    ctx.client_requested_named_groups = spec
        .named_groups_ids
        .iter()
        .filter_map(|&id| NamedGroup::from_id(id))
        .collect();
    ctx.handshake_extensions
        .insert(SslExtension::ChSupportedGroups, ExtensionSpec::SupportedGroups(spec));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::AlgorithmConstraints;
    use crate::context::SslContext;
    use crate::Config;
    use hsneg_crypto::CryptoProvider;
    use hsneg_crypto_rustcrypto::RustCryptoProvider;
    use std::sync::Arc;

    fn ssl_context(groups: &[NamedGroup], constraints: AlgorithmConstraints) -> Arc<SslContext> {
        let config = Config::builder()
            .with_named_groups(groups)
            .with_constraints(constraints)
            .build()
            .unwrap();
        Arc::new(SslContext::new(config, Arc::new(RustCryptoProvider::new())))
    }

    #[test]
    fn test_decode_validation() {
        let spec = SupportedGroupsSpec::decode(&[0x00, 0x04, 0x00, 0x1d, 0x0a, 0x0a]).unwrap();
        assert_eq!(spec.named_groups_ids, vec![0x001d, 0x0a0a]);

        assert!(SupportedGroupsSpec::decode(&[0x00, 0x00]).is_err());
        assert!(SupportedGroupsSpec::decode(&[0x00, 0x03, 0x00, 0x1d, 0x00]).is_err());
        assert!(SupportedGroupsSpec::decode(&[0x00, 0x04, 0x00, 0x1d]).is_err());
    }

    #[test]
    fn test_client_requests_activatable_groups() {
        let ssl = ssl_context(
            &[NamedGroup::X25519, NamedGroup::X448, NamedGroup::FFDHE2048, NamedGroup::SECP256R1],
            AlgorithmConstraints::new().with_disabled_algorithm("ffdhe2048"),
        );
        let mut client = ClientHandshakeContext::new(ssl);

        let data = ch_produce(&mut client).unwrap().unwrap();
        assert_eq!(data, vec![0x00, 0x04, 0x00, 0x1d, 0x00, 0x17]);
        assert_eq!(
            client.client_requested_named_groups,
            vec![NamedGroup::X25519, NamedGroup::SECP256R1]
        );
    }

    #[test]
    fn test_client_without_groups() {
        let ssl = ssl_context(&[NamedGroup::X448], AlgorithmConstraints::new());
        let mut client = ClientHandshakeContext::new(ssl);
        assert_eq!(ch_produce(&mut client).unwrap(), None);
        assert!(client.client_requested_named_groups.is_empty());
    }

    #[test]
    fn test_server_keeps_known_groups_in_client_order() {
        let ssl = ssl_context(&[NamedGroup::SECP256R1], AlgorithmConstraints::new());
        let mut server = ServerHandshakeContext::new(ssl);

        ch_consume(&mut server, &[0x00, 0x06, 0x0a, 0x0a, 0x00, 0x18, 0x00, 0x1d]).unwrap();
        assert_eq!(
            server.client_requested_named_groups,
            vec![NamedGroup::SECP384R1, NamedGroup::X25519]
        );
        assert!(server.spec(SslExtension::ChSupportedGroups).is_some());
    }
}
