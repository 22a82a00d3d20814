//! Wire identifiers: protocol versions, handshake types, extension types.

/// A TLS or DTLS version, valued by its wire codepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// TLS 1.0
    Tls10 = 0x0301,
    /// TLS 1.1
    Tls11 = 0x0302,
    /// TLS 1.2
    Tls12 = 0x0303,
    /// TLS 1.3
    Tls13 = 0x0304,
    /// DTLS 1.0
    Dtls10 = 0xFEFF,
    /// DTLS 1.2
    Dtls12 = 0xFEFD,
    /// DTLS 1.3
    Dtls13 = 0xFEFC,
}

impl ProtocolVersion {
    /// Every version, TLS first.
    pub const ALL: [ProtocolVersion; 7] = [
        Self::Tls10,
        Self::Tls11,
        Self::Tls12,
        Self::Tls13,
        Self::Dtls10,
        Self::Dtls12,
        Self::Dtls13,
    ];

    /// Version for a wire codepoint.
    pub const fn from_u16(value: u16) -> Option<Self> {
        let mut i = 0;
        while i < Self::ALL.len() {
            if Self::ALL[i] as u16 == value {
                return Some(Self::ALL[i]);
            }
            i += 1;
        }
        None
    }

    /// Wire codepoint.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tls10 => "TLSv1",
            Self::Tls11 => "TLSv1.1",
            Self::Tls12 => "TLSv1.2",
            Self::Tls13 => "TLSv1.3",
            Self::Dtls10 => "DTLSv1.0",
            Self::Dtls12 => "DTLSv1.2",
            Self::Dtls13 => "DTLSv1.3",
        }
    }

    /// TLS 1.3 or DTLS 1.3.
    pub const fn uses_tls13_rules(self) -> bool {
        matches!(self, Self::Tls13 | Self::Dtls13)
    }

    /// TLS 1.2 or DTLS 1.2.
    ///
    /// Selects the RSA-or-PSS authentication variants in the legacy key
    /// exchange table.
    pub const fn uses_tls12_rules(self) -> bool {
        matches!(self, Self::Tls12 | Self::Dtls12)
    }
}

/// Messages negotiation produces, consumes or schedules.
///
/// HelloRetryRequest travels as a ServerHello but carries its own
/// extension set, so it is a separate entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandshakeType {
    /// client_hello
    ClientHello,
    /// server_hello
    ServerHello,
    /// server_hello with the retry random
    HelloRetryRequest,
    /// certificate
    Certificate,
    /// server_key_exchange, TLS 1.2 and earlier
    ServerKeyExchange,
    /// certificate_request
    CertificateRequest,
    /// certificate_verify
    CertificateVerify,
    /// client_key_exchange, TLS 1.2 and earlier
    ClientKeyExchange,
    /// Synthetic transcript record replacing the first ClientHello
    MessageHash,
}

impl HandshakeType {
    /// msg_type byte.
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::ClientHello => 1,
            Self::ServerHello | Self::HelloRetryRequest => 2,
            Self::Certificate => 11,
            Self::ServerKeyExchange => 12,
            Self::CertificateRequest => 13,
            Self::CertificateVerify => 15,
            Self::ClientKeyExchange => 16,
            Self::MessageHash => 254,
        }
    }

    /// Name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ClientHello => "client_hello",
            Self::ServerHello => "server_hello",
            Self::HelloRetryRequest => "hello_retry_request",
            Self::Certificate => "certificate",
            Self::ServerKeyExchange => "server_key_exchange",
            Self::CertificateRequest => "certificate_request",
            Self::CertificateVerify => "certificate_verify",
            Self::ClientKeyExchange => "client_key_exchange",
            Self::MessageHash => "message_hash",
        }
    }
}

/// Extension codepoints this crate reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ExtensionType {
    /// supported_groups
    SupportedGroups = 10,
    /// signature_algorithms
    SignatureAlgorithms = 13,
    /// supported_versions
    SupportedVersions = 43,
    /// cookie
    Cookie = 44,
    /// signature_algorithms_cert
    SignatureAlgorithmsCert = 50,
    /// key_share
    KeyShare = 51,
}

impl ExtensionType {
    const KNOWN: [ExtensionType; 6] = [
        Self::SupportedGroups,
        Self::SignatureAlgorithms,
        Self::SupportedVersions,
        Self::Cookie,
        Self::SignatureAlgorithmsCert,
        Self::KeyShare,
    ];

    /// Known extension for a codepoint; unknown codepoints yield `None`.
    pub const fn from_u16(value: u16) -> Option<Self> {
        let mut i = 0;
        while i < Self::KNOWN.len() {
            if Self::KNOWN[i] as u16 == value {
                return Some(Self::KNOWN[i]);
            }
            i += 1;
        }
        None
    }

    /// Wire codepoint.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// IANA name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SupportedGroups => "supported_groups",
            Self::SignatureAlgorithms => "signature_algorithms",
            Self::SupportedVersions => "supported_versions",
            Self::Cookie => "cookie",
            Self::SignatureAlgorithmsCert => "signature_algorithms_cert",
            Self::KeyShare => "key_share",
        }
    }
}
