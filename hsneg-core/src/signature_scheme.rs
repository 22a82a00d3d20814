//! Signature scheme registry.

use std::fmt;

use crate::constraints::AlgorithmConstraints;
use crate::protocol::ProtocolVersion;

/// Signature schemes (RFC 8446 4.2.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SignatureScheme {
    // ECDSA algorithms
    /// ecdsa_secp256r1_sha256
    EcdsaSecp256r1Sha256 = 0x0403,
    /// ecdsa_secp384r1_sha384
    EcdsaSecp384r1Sha384 = 0x0503,
    /// ecdsa_secp521r1_sha512
    EcdsaSecp521r1Sha512 = 0x0603,

    // EdDSA algorithms
    /// ed25519
    Ed25519 = 0x0807,
    /// ed448
    Ed448 = 0x0808,

    // RSASSA-PSS algorithms with public key OID rsaEncryption
    /// rsa_pss_rsae_sha256
    RsaPssRsaeSha256 = 0x0804,
    /// rsa_pss_rsae_sha384
    RsaPssRsaeSha384 = 0x0805,
    /// rsa_pss_rsae_sha512
    RsaPssRsaeSha512 = 0x0806,

    // RSASSA-PSS algorithms with public key OID RSASSA-PSS
    /// rsa_pss_pss_sha256
    RsaPssPssSha256 = 0x0809,
    /// rsa_pss_pss_sha384
    RsaPssPssSha384 = 0x080A,
    /// rsa_pss_pss_sha512
    RsaPssPssSha512 = 0x080B,

    // RSASSA-PKCS1-v1_5 algorithms
    /// rsa_pkcs1_sha256
    RsaPkcs1Sha256 = 0x0401,
    /// rsa_pkcs1_sha384
    RsaPkcs1Sha384 = 0x0501,
    /// rsa_pkcs1_sha512
    RsaPkcs1Sha512 = 0x0601,

    // Legacy algorithms
    /// dsa_sha256 (TLS 1.2 only)
    DsaSha256 = 0x0402,
    /// ecdsa_sha1
    EcdsaSha1 = 0x0203,
    /// rsa_pkcs1_sha1
    RsaPkcs1Sha1 = 0x0201,
    /// dsa_sha1 (TLS 1.2 only)
    DsaSha1 = 0x0202,
}

impl SignatureScheme {
    /// Default preference order.
    pub const DEFAULT_PREFERENCE: [SignatureScheme; 18] = [
        SignatureScheme::EcdsaSecp256r1Sha256,
        SignatureScheme::EcdsaSecp384r1Sha384,
        SignatureScheme::EcdsaSecp521r1Sha512,
        SignatureScheme::Ed25519,
        SignatureScheme::Ed448,
        SignatureScheme::RsaPssRsaeSha256,
        SignatureScheme::RsaPssRsaeSha384,
        SignatureScheme::RsaPssRsaeSha512,
        SignatureScheme::RsaPssPssSha256,
        SignatureScheme::RsaPssPssSha384,
        SignatureScheme::RsaPssPssSha512,
        SignatureScheme::RsaPkcs1Sha256,
        SignatureScheme::RsaPkcs1Sha384,
        SignatureScheme::RsaPkcs1Sha512,
        SignatureScheme::DsaSha256,
        SignatureScheme::EcdsaSha1,
        SignatureScheme::RsaPkcs1Sha1,
        SignatureScheme::DsaSha1,
    ];

    /// Create from wire format (u16).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0403 => Some(SignatureScheme::EcdsaSecp256r1Sha256),
            0x0503 => Some(SignatureScheme::EcdsaSecp384r1Sha384),
            0x0603 => Some(SignatureScheme::EcdsaSecp521r1Sha512),
            0x0807 => Some(SignatureScheme::Ed25519),
            0x0808 => Some(SignatureScheme::Ed448),
            0x0804 => Some(SignatureScheme::RsaPssRsaeSha256),
            0x0805 => Some(SignatureScheme::RsaPssRsaeSha384),
            0x0806 => Some(SignatureScheme::RsaPssRsaeSha512),
            0x0809 => Some(SignatureScheme::RsaPssPssSha256),
            0x080A => Some(SignatureScheme::RsaPssPssSha384),
            0x080B => Some(SignatureScheme::RsaPssPssSha512),
            0x0401 => Some(SignatureScheme::RsaPkcs1Sha256),
            0x0501 => Some(SignatureScheme::RsaPkcs1Sha384),
            0x0601 => Some(SignatureScheme::RsaPkcs1Sha512),
            0x0402 => Some(SignatureScheme::DsaSha256),
            0x0203 => Some(SignatureScheme::EcdsaSha1),
            0x0201 => Some(SignatureScheme::RsaPkcs1Sha1),
            0x0202 => Some(SignatureScheme::DsaSha1),
            _ => None,
        }
    }

    /// Convert to wire format (u16).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Standard name.
    pub const fn name(self) -> &'static str {
        match self {
            SignatureScheme::EcdsaSecp256r1Sha256 => "ecdsa_secp256r1_sha256",
            SignatureScheme::EcdsaSecp384r1Sha384 => "ecdsa_secp384r1_sha384",
            SignatureScheme::EcdsaSecp521r1Sha512 => "ecdsa_secp521r1_sha512",
            SignatureScheme::Ed25519 => "ed25519",
            SignatureScheme::Ed448 => "ed448",
            SignatureScheme::RsaPssRsaeSha256 => "rsa_pss_rsae_sha256",
            SignatureScheme::RsaPssRsaeSha384 => "rsa_pss_rsae_sha384",
            SignatureScheme::RsaPssRsaeSha512 => "rsa_pss_rsae_sha512",
            SignatureScheme::RsaPssPssSha256 => "rsa_pss_pss_sha256",
            SignatureScheme::RsaPssPssSha384 => "rsa_pss_pss_sha384",
            SignatureScheme::RsaPssPssSha512 => "rsa_pss_pss_sha512",
            SignatureScheme::RsaPkcs1Sha256 => "rsa_pkcs1_sha256",
            SignatureScheme::RsaPkcs1Sha384 => "rsa_pkcs1_sha384",
            SignatureScheme::RsaPkcs1Sha512 => "rsa_pkcs1_sha512",
            SignatureScheme::DsaSha256 => "dsa_sha256",
            SignatureScheme::EcdsaSha1 => "ecdsa_sha1",
            SignatureScheme::RsaPkcs1Sha1 => "rsa_pkcs1_sha1",
            SignatureScheme::DsaSha1 => "dsa_sha1",
        }
    }

    /// Hash component, `None` for the EdDSA schemes which hash internally.
    pub const fn hash_name(self) -> Option<&'static str> {
        match self {
            SignatureScheme::Ed25519 | SignatureScheme::Ed448 => None,
            SignatureScheme::EcdsaSha1 | SignatureScheme::RsaPkcs1Sha1 | SignatureScheme::DsaSha1 => {
                Some("SHA1")
            },
            SignatureScheme::EcdsaSecp256r1Sha256
            | SignatureScheme::RsaPssRsaeSha256
            | SignatureScheme::RsaPssPssSha256
            | SignatureScheme::RsaPkcs1Sha256
            | SignatureScheme::DsaSha256 => Some("SHA256"),
            SignatureScheme::EcdsaSecp384r1Sha384
            | SignatureScheme::RsaPssRsaeSha384
            | SignatureScheme::RsaPssPssSha384
            | SignatureScheme::RsaPkcs1Sha384 => Some("SHA384"),
            SignatureScheme::EcdsaSecp521r1Sha512
            | SignatureScheme::RsaPssRsaeSha512
            | SignatureScheme::RsaPssPssSha512
            | SignatureScheme::RsaPkcs1Sha512 => Some("SHA512"),
        }
    }

    /// Signature key algorithm component.
    pub const fn signature_name(self) -> &'static str {
        match self {
            SignatureScheme::EcdsaSecp256r1Sha256
            | SignatureScheme::EcdsaSecp384r1Sha384
            | SignatureScheme::EcdsaSecp521r1Sha512
            | SignatureScheme::EcdsaSha1 => "EC",
            SignatureScheme::Ed25519 => "Ed25519",
            SignatureScheme::Ed448 => "Ed448",
            SignatureScheme::RsaPssRsaeSha256
            | SignatureScheme::RsaPssRsaeSha384
            | SignatureScheme::RsaPssRsaeSha512
            | SignatureScheme::RsaPkcs1Sha256
            | SignatureScheme::RsaPkcs1Sha384
            | SignatureScheme::RsaPkcs1Sha512
            | SignatureScheme::RsaPkcs1Sha1 => "RSA",
            SignatureScheme::RsaPssPssSha256
            | SignatureScheme::RsaPssPssSha384
            | SignatureScheme::RsaPssPssSha512 => "RSASSA-PSS",
            SignatureScheme::DsaSha256 | SignatureScheme::DsaSha1 => "DSA",
        }
    }

    /// Whether the scheme may sign certificates under `version`.
    ///
    /// Certificate signatures are more permissive than handshake
    /// signatures: TLS 1.3 still accepts PKCS#1 and SHA-1 signed
    /// certificates, but DSA is gone.
    pub const fn is_supported_protocol(self, version: ProtocolVersion) -> bool {
        match self {
            SignatureScheme::DsaSha256 | SignatureScheme::DsaSha1 => !version.uses_tls13_rules(),
            SignatureScheme::Ed25519
            | SignatureScheme::Ed448
            | SignatureScheme::RsaPssRsaeSha256
            | SignatureScheme::RsaPssRsaeSha384
            | SignatureScheme::RsaPssRsaeSha512
            | SignatureScheme::RsaPssPssSha256
            | SignatureScheme::RsaPssPssSha384
            | SignatureScheme::RsaPssPssSha512 => {
                version.uses_tls13_rules() || version.uses_tls12_rules()
            },
            _ => true,
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render a wire id for diagnostics, known or not.
pub fn scheme_name_of(id: u16) -> String {
    match SignatureScheme::from_u16(id) {
        Some(scheme) => scheme.name().to_string(),
        None => format!("unknown signature scheme (0x{:04x})", id),
    }
}

/// Local schemes permitted by `constraints` for any of `protocols`, in
/// local preference order.
pub fn get_supported_algorithms(
    local: &[SignatureScheme],
    constraints: &AlgorithmConstraints,
    protocols: &[ProtocolVersion],
) -> Vec<SignatureScheme> {
    local
        .iter()
        .copied()
        .filter(|&scheme| {
            constraints.permits_scheme(scheme)
                && protocols.iter().any(|&v| scheme.is_supported_protocol(v))
        })
        .collect()
}

/// The peer's offered ids that are known, locally enabled, permitted and
/// usable under `protocol`, in the peer's order.
pub fn get_supported_algorithms_from_peer(
    local: &[SignatureScheme],
    constraints: &AlgorithmConstraints,
    protocol: ProtocolVersion,
    peer_offered: &[u16],
) -> Vec<SignatureScheme> {
    peer_offered
        .iter()
        .filter_map(|&id| SignatureScheme::from_u16(id))
        .filter(|&scheme| {
            local.contains(&scheme)
                && constraints.permits_scheme(scheme)
                && scheme.is_supported_protocol(protocol)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_conversion() {
        for scheme in SignatureScheme::DEFAULT_PREFERENCE {
            assert_eq!(SignatureScheme::from_u16(scheme.to_u16()), Some(scheme));
        }
        assert_eq!(SignatureScheme::from_u16(0xfefe), None);
        assert_eq!(scheme_name_of(0x0807), "ed25519");
    }

    #[test]
    fn test_local_list_keeps_local_order() {
        let local = [
            SignatureScheme::RsaPkcs1Sha256,
            SignatureScheme::DsaSha256,
            SignatureScheme::Ed25519,
        ];
        let tls13 = get_supported_algorithms(
            &local,
            &AlgorithmConstraints::new(),
            &[ProtocolVersion::Tls13],
        );
        assert_eq!(tls13, vec![SignatureScheme::RsaPkcs1Sha256, SignatureScheme::Ed25519]);

        let both = get_supported_algorithms(
            &local,
            &AlgorithmConstraints::new(),
            &[ProtocolVersion::Tls13, ProtocolVersion::Tls12],
        );
        assert_eq!(both, local.to_vec());
    }

    #[test]
    fn test_peer_intersection_keeps_peer_order() {
        let s1 = SignatureScheme::EcdsaSecp256r1Sha256;
        let s2 = SignatureScheme::RsaPssRsaeSha256;
        let s3 = SignatureScheme::Ed25519;
        let s9 = 0x0e01; // not in the registry

        let result = get_supported_algorithms_from_peer(
            &[s1, s2, s3],
            &AlgorithmConstraints::new(),
            ProtocolVersion::Tls13,
            &[s3.to_u16(), s1.to_u16(), s9],
        );
        assert_eq!(result, vec![s3, s1]);
    }

    #[test]
    fn test_peer_intersection_applies_constraints() {
        let constraints = AlgorithmConstraints::new().with_disabled_algorithm("SHA1");
        let result = get_supported_algorithms_from_peer(
            &SignatureScheme::DEFAULT_PREFERENCE,
            &constraints,
            ProtocolVersion::Tls12,
            &[0x0201, 0x0401, 0x0203],
        );
        assert_eq!(result, vec![SignatureScheme::RsaPkcs1Sha256]);
    }
}
