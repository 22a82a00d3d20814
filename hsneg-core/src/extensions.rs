//! Extension blocks of hello messages.

use bytes::{BufMut, BytesMut};

use crate::codec;
use crate::error::{Error, Result};
use crate::protocol::ExtensionType;

/// TLS extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Extension type
    pub extension_type: ExtensionType,

    /// Extension data
    pub data: Vec<u8>,
}

impl Extension {
    /// Create a new extension.
    pub fn new(extension_type: ExtensionType, data: Vec<u8>) -> Self {
        Self {
            extension_type,
            data,
        }
    }

    fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u16(self.extension_type.to_u16());
        codec::put_opaque16(buf, &self.data);
    }
}

/// Extension list, kept in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    extensions: Vec<Extension>,
}

impl Extensions {
    /// Create a new empty extension list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension.
    pub fn add(&mut self, extension: Extension) {
        self.extensions.push(extension);
    }

    /// Get an extension by type.
    pub fn get(&self, ext_type: ExtensionType) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.extension_type == ext_type)
    }

    /// Check if an extension is present.
    pub fn has(&self, ext_type: ExtensionType) -> bool {
        self.get(ext_type).is_some()
    }

    /// Iterate in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }

    /// Number of extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// True when there are no extensions.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Encode all extensions with the `uint16` block length.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        let mut body = BytesMut::new();
        for ext in &self.extensions {
            ext.encode_into(&mut body);
        }
        codec::put_opaque16(buf, &body);
    }

    /// Decode an extension block, which must fill `data` exactly.
    ///
    /// Extensions this crate does not handle are dropped; duplicates are a
    /// decode error (RFC 8446 4.2).
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        codec::get_list_length16(&mut data, "extensions")?;

        let mut extensions = Vec::new();
        let mut seen = Vec::new();
        while !data.is_empty() {
            let raw_type = codec::get_uint16(&mut data)?;
            let body = codec::get_opaque16(&mut data)?;
            if seen.contains(&raw_type) {
                return Err(Error::DecodeError(format!(
                    "duplicate extension {}",
                    raw_type
                )));
            }
            seen.push(raw_type);

            match ExtensionType::from_u16(raw_type) {
                Some(extension_type) => extensions.push(Extension::new(extension_type, body)),
                None => tracing::debug!("Ignoring unhandled extension type {}", raw_type),
            }
        }

        Ok(Self { extensions })
    }
}
