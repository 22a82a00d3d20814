//! Big-endian wire codec helpers.
//!
//! Readers take `&mut &[u8]` and advance it with [`bytes::Buf`]; every read
//! checks the remaining length first so truncated input becomes
//! [`Error::DecodeError`] instead of a panic. Writers append to a
//! [`BytesMut`].

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

fn need(buf: &[u8], len: usize, what: &str) -> Result<()> {
    if buf.remaining() < len {
        return Err(Error::DecodeError(format!(
            "{}: need {} bytes, {} remaining",
            what,
            len,
            buf.remaining()
        )));
    }
    Ok(())
}

/// Reads one byte.
pub fn get_uint8(buf: &mut &[u8]) -> Result<u8> {
    need(buf, 1, "uint8")?;
    Ok(buf.get_u8())
}

/// Reads a big-endian `u16`.
pub fn get_uint16(buf: &mut &[u8]) -> Result<u16> {
    need(buf, 2, "uint16")?;
    Ok(buf.get_u16())
}

/// Reads exactly `len` raw bytes.
pub fn get_bytes(buf: &mut &[u8], len: usize) -> Result<Vec<u8>> {
    need(buf, len, "opaque")?;
    let out = buf[..len].to_vec();
    buf.advance(len);
    Ok(out)
}

/// Reads an `opaque<0..2^8-1>` vector.
pub fn get_opaque8(buf: &mut &[u8]) -> Result<Vec<u8>> {
    let len = get_uint8(buf)? as usize;
    get_bytes(buf, len)
}

/// Reads an `opaque<0..2^16-1>` vector.
pub fn get_opaque16(buf: &mut &[u8]) -> Result<Vec<u8>> {
    let len = get_uint16(buf)? as usize;
    get_bytes(buf, len)
}

/// Reads the `uint16` length of a list that must be the last field of its
/// structure, failing unless it covers exactly the remaining bytes.
pub fn get_list_length16(buf: &mut &[u8], what: &str) -> Result<usize> {
    let len = get_uint16(buf)? as usize;
    if len != buf.remaining() {
        return Err(Error::DecodeError(format!(
            "{}: declared length {} does not match remaining {}",
            what,
            len,
            buf.remaining()
        )));
    }
    Ok(len)
}

/// Fails unless the buffer has been fully consumed.
pub fn expect_end(buf: &[u8], what: &str) -> Result<()> {
    if buf.has_remaining() {
        return Err(Error::DecodeError(format!(
            "{}: {} trailing bytes",
            what,
            buf.remaining()
        )));
    }
    Ok(())
}

/// Writes a big-endian `u16`.
pub fn put_uint16(buf: &mut BytesMut, value: u16) {
    buf.put_u16(value);
}

/// Writes a big-endian 24-bit length.
pub fn put_uint24(buf: &mut BytesMut, value: usize) {
    buf.put_u8((value >> 16) as u8);
    buf.put_u16(value as u16);
}

/// Writes an `opaque<0..2^8-1>` vector.
pub fn put_opaque8(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u8(data.len() as u8);
    buf.put_slice(data);
}

/// Writes an `opaque<0..2^16-1>` vector.
pub fn put_opaque16(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u16(data.len() as u16);
    buf.put_slice(data);
}

/// Wraps a handshake body in its 4-byte handshake header.
pub fn handshake_message(msg_type: u8, body: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(4 + body.len());
    buf.put_u8(msg_type);
    put_uint24(&mut buf, body.len());
    buf.put_slice(body);
    buf.to_vec()
}
