//! Hello messages.
//!
//! Only the parts negotiation needs are modelled: the ClientHello with
//! its header bytes for cookie binding, and the HelloRetryRequest that
//! the stateless server rebuilds for its transcript.

use bytes::{BufMut, BytesMut};

use crate::codec;
use crate::error::{Error, Result};
use crate::protocol::ProtocolVersion;

pub mod client_hello;
pub mod hello_retry_request;

pub use client_hello::ClientHelloMessage;
pub use hello_retry_request::{HelloRetryRequest, HELLO_RETRY_REQUEST_RANDOM};

const MAX_SESSION_ID_LEN: usize = 32;

/// legacy_version, random and legacy_session_id, common to every hello.
fn put_hello_prefix(
    buf: &mut BytesMut,
    version: ProtocolVersion,
    random: &[u8; 32],
    session_id: &[u8],
) -> Result<()> {
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(Error::InternalError(format!(
            "legacy_session_id of {} bytes",
            session_id.len()
        )));
    }
    buf.put_u16(version.to_u16());
    buf.put_slice(random);
    codec::put_opaque8(buf, session_id);
    Ok(())
}

fn get_hello_prefix(data: &mut &[u8]) -> Result<(ProtocolVersion, [u8; 32], Vec<u8>)> {
    let raw = codec::get_uint16(data)?;
    let version = ProtocolVersion::from_u16(raw)
        .ok_or_else(|| Error::DecodeError(format!("legacy_version {:#06x}", raw)))?;

    let mut random = [0u8; 32];
    random.copy_from_slice(&codec::get_bytes(data, 32)?);

    let session_id = codec::get_opaque8(data)?;
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(Error::DecodeError(format!(
            "legacy_session_id of {} bytes",
            session_id.len()
        )));
    }
    Ok((version, random, session_id))
}
