//! cookie extension (RFC 8446 Section 4.2.2).
//!
//! ```text
//! struct {
//!     opaque cookie<1..2^16-1>;
//! } Cookie;
//! ```
//!
//! The server puts a cookie in its HelloRetryRequest and the client
//! echoes it unchanged. The blob itself is built and checked by
//! [`T13HelloCookieManager`](crate::cookie_manager::T13HelloCookieManager).

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use tracing::debug;

use crate::codec;
use crate::context::{ClientHandshakeContext, HandshakeContext, ServerHandshakeContext};
use crate::cookie_manager::T13HelloCookieManager;
use crate::error::{AlertDescription, Error, Result};
use crate::ssl_extension::{ExtensionSpec, SslExtension};

/// cookie in ClientHello or HelloRetryRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSpec {
    /// Opaque cookie bytes
    pub cookie: Vec<u8>,
}

impl CookieSpec {
    /// Decode the extension data.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        // opaque cookie<1..2^16-1>
        if data.len() < 3 {
            return Err(Error::DecodeError(
                "Invalid cookie extension: insufficient data".into(),
            ));
        }
        let cookie = codec::get_opaque16(&mut data)?;
        codec::expect_end(data, "cookie")?;
        Ok(Self { cookie })
    }

    /// Encode the extension data.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(2 + self.cookie.len());
        codec::put_opaque16(&mut buf, &self.cookie);
        buf.to_vec()
    }
}

impl fmt::Display for CookieSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"cookie\": {} bytes", self.cookie.len())
    }
}

fn stored_cookie(ctx: &HandshakeContext, extension: SslExtension) -> Option<CookieSpec> {
    match ctx.spec(extension) {
        Some(ExtensionSpec::Cookie(spec)) => Some(spec.clone()),
        _ => None,
    }
}

fn cookie_manager(ctx: &HandshakeContext) -> Result<Option<Arc<T13HelloCookieManager>>> {
    let protocol = ctx
        .negotiated_protocol
        .ok_or_else(|| Error::InternalError("cookie before version negotiation".into()))?;
    ctx.ssl_context().cookie_managers().value_of(protocol)
}

/// ClientHello producer: echo the HelloRetryRequest cookie.
pub fn ch_produce(ctx: &mut ClientHandshakeContext) -> Result<Option<Vec<u8>>> {
    if !ctx.config().is_available(SslExtension::ChCookie) {
        debug!("Ignore unavailable cookie extension");
        return Ok(None);
    }

    let Some(spec) = stored_cookie(ctx, SslExtension::HrrCookie) else {
        return Ok(None);
    };
    let data = spec.encode();
    ctx.handshake_extensions
        .insert(SslExtension::ChCookie, ExtensionSpec::Cookie(spec));
    Ok(Some(data))
}

/// ClientHello consumer: keep the cookie for the post-parse check.
pub fn ch_consume(ctx: &mut ServerHandshakeContext, data: &[u8]) -> Result<()> {
    if !ctx.config().is_available(SslExtension::ChCookie) {
        debug!("Ignore unavailable cookie extension");
        return Ok(());
    }

    let spec = CookieSpec::decode(data)?;
    ctx.handshake_extensions
        .insert(SslExtension::ChCookie, ExtensionSpec::Cookie(spec));
    Ok(())
}

/// ClientHello update: the cookie must be one this server issued for the
/// same ClientHello.
pub fn ch_update(ctx: &mut ServerHandshakeContext) -> Result<()> {
    let Some(spec) = stored_cookie(ctx, SslExtension::ChCookie) else {
        return Ok(());
    };
    let client_hello = ctx
        .client_hello
        .clone()
        .ok_or_else(|| Error::InternalError("cookie without ClientHello".into()))?;

    let valid = match cookie_manager(ctx)? {
        Some(manager) => manager.is_cookie_valid(ctx, &client_hello, &spec.cookie),
        None => false,
    };
    if !valid {
        return Err(Error::fatal(
            AlertDescription::IllegalParameter,
            "unrecognized cookie",
        ));
    }
    debug!("Accepted HelloRetryRequest cookie");
    Ok(())
}

/// HelloRetryRequest producer: a fresh cookie for the ClientHello.
pub fn hrr_produce(ctx: &mut ServerHandshakeContext) -> Result<Option<Vec<u8>>> {
    if !ctx.config().is_available(SslExtension::HrrCookie) {
        debug!("Ignore unavailable cookie extension");
        return Ok(None);
    }

    let client_hello = ctx
        .client_hello
        .clone()
        .ok_or_else(|| Error::InternalError("cookie without ClientHello".into()))?;
    let Some(manager) = cookie_manager(ctx)? else {
        return Ok(None);
    };

    let spec = CookieSpec {
        cookie: manager.create_cookie(ctx, &client_hello)?,
    };
    let data = spec.encode();
    ctx.handshake_extensions
        .insert(SslExtension::HrrCookie, ExtensionSpec::Cookie(spec));
    Ok(Some(data))
}

/// HelloRetryRequest consumer: remember the cookie for the retry.
pub fn hrr_consume(ctx: &mut ClientHandshakeContext, data: &[u8]) -> Result<()> {
    if !ctx.config().is_available(SslExtension::HrrCookie) {
        debug!("Ignore unavailable cookie extension");
        return Ok(());
    }

    let spec = CookieSpec::decode(data)?;
    ctx.handshake_extensions
        .insert(SslExtension::HrrCookie, ExtensionSpec::Cookie(spec));
    Ok(())
}

/// HelloRetryRequest reproducer: the cookie echoed in the retried
/// ClientHello.
pub fn hrr_reproduce(ctx: &mut ServerHandshakeContext) -> Result<Option<Vec<u8>>> {
    if !ctx.config().is_available(SslExtension::HrrCookie) {
        return Ok(None);
    }
    Ok(stored_cookie(ctx, SslExtension::ChCookie).map(|spec| spec.encode()))
}
