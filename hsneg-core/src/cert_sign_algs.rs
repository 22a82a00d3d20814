//! signature_algorithms_cert extension (RFC 8446 Section 4.2.3).
//!
//! Lists the schemes a peer accepts in certificate signatures. The
//! ClientHello copy also tells the server which certificate handshake
//! messages it still has to produce.

use std::fmt;

use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::codec;
use crate::context::{ClientHandshakeContext, HandshakeContext, ServerHandshakeContext};
use crate::error::{AlertDescription, Error, Result};
use crate::protocol::{HandshakeType, ProtocolVersion};
use crate::signature_scheme::{
    get_supported_algorithms, get_supported_algorithms_from_peer, scheme_name_of,
    SignatureScheme,
};
use crate::ssl_extension::{ExtensionSpec, SslExtension};
use crate::ClientAuthType;

/// signature_algorithms_cert in ClientHello or CertificateRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSchemesSpec {
    /// Scheme ids in sender order, unknown ones included
    pub signature_schemes: Vec<u16>,
}

impl SignatureSchemesSpec {
    /// Spec listing `schemes`.
    pub fn new(schemes: &[SignatureScheme]) -> Self {
        Self {
            signature_schemes: schemes.iter().map(|s| s.to_u16()).collect(),
        }
    }

    /// Decode the extension data.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let list_len = codec::get_list_length16(&mut data, "signature_algorithms_cert")?;
        if list_len == 0 || list_len % 2 != 0 {
            return Err(Error::DecodeError(format!(
                "Invalid signature_algorithms_cert: incorrect list length (length={})",
                list_len
            )));
        }
        let signature_schemes = data
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        Ok(Self { signature_schemes })
    }

    /// Encode the extension data.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(2 + self.signature_schemes.len() * 2);
        buf.put_u16((self.signature_schemes.len() * 2) as u16);
        for &id in &self.signature_schemes {
            buf.put_u16(id);
        }
        buf.to_vec()
    }
}

impl fmt::Display for SignatureSchemesSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .signature_schemes
            .iter()
            .map(|&id| scheme_name_of(id))
            .collect();
        write!(f, "\"signature schemes\": [{}]", names.join(", "))
    }
}

fn local_supported_sign_algs(
    ctx: &mut HandshakeContext,
    protocols: &[ProtocolVersion],
) -> Vec<SignatureScheme> {
    if let Some(cached) = &ctx.local_supported_sign_algs {
        return cached.clone();
    }
    let config = ctx.config();
    let schemes =
        get_supported_algorithms(&config.signature_schemes, &config.constraints, protocols);
    ctx.local_supported_sign_algs = Some(schemes.clone());
    schemes
}

fn stored_spec(ctx: &HandshakeContext, extension: SslExtension) -> Option<SignatureSchemesSpec> {
    match ctx.handshake_extensions.get(&extension) {
        Some(ExtensionSpec::SignatureSchemes(spec)) => Some(spec.clone()),
        _ => None,
    }
}

/// ClientHello producer: every local scheme usable under the active
/// protocols.
pub fn ch_produce(ctx: &mut ClientHandshakeContext) -> Result<Option<Vec<u8>>> {
    if !ctx.config().is_available(SslExtension::ChSignatureAlgorithmsCert) {
        debug!("Ignore unavailable signature_algorithms_cert extension");
        return Ok(None);
    }

    let protocols = ctx.active_protocols.clone();
    let schemes = local_supported_sign_algs(ctx, &protocols);
    let spec = SignatureSchemesSpec::new(&schemes);
    let data = spec.encode();
    ctx.handshake_extensions.insert(
        SslExtension::ChSignatureAlgorithmsCert,
        ExtensionSpec::SignatureSchemes(spec),
    );
    Ok(Some(data))
}

/// ClientHello consumer: store the offered ids as sent.
pub fn ch_consume(ctx: &mut ServerHandshakeContext, data: &[u8]) -> Result<()> {
    if !ctx.config().is_available(SslExtension::ChSignatureAlgorithmsCert) {
        debug!("Ignore unavailable signature_algorithms_cert extension");
        return Ok(());
    }

    let spec = SignatureSchemesSpec::decode(data)?;
    ctx.handshake_extensions.insert(
        SslExtension::ChSignatureAlgorithmsCert,
        ExtensionSpec::SignatureSchemes(spec),
    );
    Ok(())
}

/// ClientHello update: intersect with local support and schedule the
/// certificate messages of a full TLS 1.3 handshake.
pub fn ch_update(ctx: &mut ServerHandshakeContext) -> Result<()> {
    let Some(spec) = stored_spec(ctx, SslExtension::ChSignatureAlgorithmsCert) else {
        return Ok(());
    };
    let protocol = ctx.negotiated_protocol.ok_or_else(|| {
        Error::InternalError("signature_algorithms_cert update before version negotiation".into())
    })?;

    let protocols = ctx.active_protocols.clone();
    let local = local_supported_sign_algs(ctx, &protocols);
    let schemes = get_supported_algorithms_from_peer(
        &local,
        &ctx.config().constraints,
        protocol,
        &spec.signature_schemes,
    );
    ctx.peer_requested_cert_sign_schemes = schemes.clone();
    ctx.handshake_session.peer_supported_signature_algorithms = schemes;

    if !ctx.is_resumption && protocol.uses_tls13_rules() {
        if ctx.config().client_auth != ClientAuthType::None {
            ctx.handshake_producers.insert(HandshakeType::CertificateRequest);
        }
        ctx.handshake_producers.insert(HandshakeType::Certificate);
        ctx.handshake_producers.insert(HandshakeType::CertificateVerify);
    }
    Ok(())
}

/// CertificateRequest producer: the local schemes usable under the
/// negotiated protocol.
pub fn cr_produce(ctx: &mut ServerHandshakeContext) -> Result<Option<Vec<u8>>> {
    if !ctx.config().is_available(SslExtension::CrSignatureAlgorithmsCert) {
        debug!("Ignore unavailable signature_algorithms_cert extension");
        return Ok(None);
    }
    let protocol = ctx.negotiated_protocol.ok_or_else(|| {
        Error::InternalError("CertificateRequest before version negotiation".into())
    })?;

    let config = ctx.config();
    let schemes =
        get_supported_algorithms(&config.signature_schemes, &config.constraints, &[protocol]);
    let spec = SignatureSchemesSpec::new(&schemes);
    let data = spec.encode();
    ctx.local_supported_sign_algs = Some(schemes);
    ctx.handshake_extensions.insert(
        SslExtension::CrSignatureAlgorithmsCert,
        ExtensionSpec::SignatureSchemes(spec),
    );
    Ok(Some(data))
}

/// CertificateRequest consumer.
pub fn cr_consume(ctx: &mut ClientHandshakeContext, data: &[u8]) -> Result<()> {
    if !ctx.config().is_available(SslExtension::CrSignatureAlgorithmsCert) {
        debug!("Ignore unavailable signature_algorithms_cert extension");
        return Ok(());
    }

    let spec = SignatureSchemesSpec::decode(data)?;
    ctx.handshake_extensions.insert(
        SslExtension::CrSignatureAlgorithmsCert,
        ExtensionSpec::SignatureSchemes(spec),
    );
    Ok(())
}

/// CertificateRequest update: record what the server accepts for the
/// client certificate.
pub fn cr_update(ctx: &mut ClientHandshakeContext) -> Result<()> {
    let Some(spec) = stored_spec(ctx, SslExtension::CrSignatureAlgorithmsCert) else {
        return Ok(());
    };
    let protocol = ctx.negotiated_protocol.ok_or_else(|| {
        Error::fatal(
            AlertDescription::UnexpectedMessage,
            "CertificateRequest before version negotiation",
        )
    })?;

    let protocols = ctx.active_protocols.clone();
    let local = local_supported_sign_algs(ctx, &protocols);
    let schemes = get_supported_algorithms_from_peer(
        &local,
        &ctx.config().constraints,
        protocol,
        &spec.signature_schemes,
    );
    ctx.peer_requested_cert_sign_schemes = schemes.clone();
    ctx.handshake_session.peer_supported_signature_algorithms = schemes;
    Ok(())
}
