//! Named group registry.
//!
//! A [`NamedGroup`] is a thin, copyable handle over the provider-level
//! [`KeyExchangeAlgorithm`]; the registry proper is the fixed set of
//! associated constants plus the per-configuration preference list.

use std::fmt;

use hsneg_crypto::{CryptoProvider, KeyExchangeAlgorithm, KeyExchangeFamily};

use crate::constraints::AlgorithmConstraints;

/// The Diffie-Hellman family of a named group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedGroupType {
    /// Elliptic curve groups
    Ecdhe,
    /// Finite field groups (RFC 7919)
    Ffdhe,
}

/// A TLS named group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedGroup(KeyExchangeAlgorithm);

impl NamedGroup {
    /// secp256r1 (23)
    pub const SECP256R1: NamedGroup = NamedGroup(KeyExchangeAlgorithm::Secp256r1);
    /// secp384r1 (24)
    pub const SECP384R1: NamedGroup = NamedGroup(KeyExchangeAlgorithm::Secp384r1);
    /// secp521r1 (25)
    pub const SECP521R1: NamedGroup = NamedGroup(KeyExchangeAlgorithm::Secp521r1);
    /// x25519 (29)
    pub const X25519: NamedGroup = NamedGroup(KeyExchangeAlgorithm::X25519);
    /// x448 (30)
    pub const X448: NamedGroup = NamedGroup(KeyExchangeAlgorithm::X448);
    /// ffdhe2048 (256)
    pub const FFDHE2048: NamedGroup = NamedGroup(KeyExchangeAlgorithm::Ffdhe2048);
    /// ffdhe3072 (257)
    pub const FFDHE3072: NamedGroup = NamedGroup(KeyExchangeAlgorithm::Ffdhe3072);
    /// ffdhe4096 (258)
    pub const FFDHE4096: NamedGroup = NamedGroup(KeyExchangeAlgorithm::Ffdhe4096);
    /// ffdhe6144 (259)
    pub const FFDHE6144: NamedGroup = NamedGroup(KeyExchangeAlgorithm::Ffdhe6144);
    /// ffdhe8192 (260)
    pub const FFDHE8192: NamedGroup = NamedGroup(KeyExchangeAlgorithm::Ffdhe8192);

    /// Default preference order.
    pub const DEFAULT_PREFERENCE: [NamedGroup; 10] = [
        NamedGroup::X25519,
        NamedGroup::SECP256R1,
        NamedGroup::SECP384R1,
        NamedGroup::SECP521R1,
        NamedGroup::X448,
        NamedGroup::FFDHE2048,
        NamedGroup::FFDHE3072,
        NamedGroup::FFDHE4096,
        NamedGroup::FFDHE6144,
        NamedGroup::FFDHE8192,
    ];

    /// Look up a group by its wire id.
    pub const fn from_id(id: u16) -> Option<Self> {
        match KeyExchangeAlgorithm::from_u16(id) {
            Some(alg) => Some(NamedGroup(alg)),
            None => None,
        }
    }

    /// Look up a group by its standard name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        KeyExchangeAlgorithm::ALL
            .iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(name))
            .map(|&alg| NamedGroup(alg))
    }

    /// Wire id.
    pub const fn id(self) -> u16 {
        self.0.iana_codepoint()
    }

    /// Standard name.
    pub const fn name(self) -> &'static str {
        self.0.name()
    }

    /// Group family.
    pub const fn group_type(self) -> NamedGroupType {
        match self.0.family() {
            KeyExchangeFamily::Ecdhe => NamedGroupType::Ecdhe,
            KeyExchangeFamily::Ffdhe => NamedGroupType::Ffdhe,
        }
    }

    /// The provider algorithm implementing this group.
    pub const fn algorithm(self) -> KeyExchangeAlgorithm {
        self.0
    }

    /// Strength of the group in bits.
    pub const fn key_bits(self) -> u32 {
        self.0.key_bits()
    }

    /// Render a wire id for diagnostics, known or not.
    pub fn name_of(id: u16) -> String {
        match NamedGroup::from_id(id) {
            Some(group) => group.name().to_string(),
            None => format!("unknown named group (0x{:04x})", id),
        }
    }
}

impl fmt::Display for NamedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `group` may be used for a new key exchange: it is locally
/// enabled, the provider implements it and the constraints permit it.
pub fn is_activatable(
    enabled: &[NamedGroup],
    provider: &dyn CryptoProvider,
    constraints: &AlgorithmConstraints,
    group: NamedGroup,
) -> bool {
    enabled.contains(&group)
        && provider.supports_key_exchange(group.algorithm())
        && constraints.permits_group(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsneg_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_lookup_by_id_and_name() {
        assert_eq!(NamedGroup::from_id(0x001d), Some(NamedGroup::X25519));
        assert_eq!(NamedGroup::from_id(0x0100), Some(NamedGroup::FFDHE2048));
        assert_eq!(NamedGroup::from_id(0x0a0a), None);
        assert_eq!(NamedGroup::from_name("SECP384R1"), Some(NamedGroup::SECP384R1));
        assert_eq!(NamedGroup::from_name("brainpool"), None);
    }

    #[test]
    fn test_group_types() {
        assert_eq!(NamedGroup::X25519.group_type(), NamedGroupType::Ecdhe);
        assert_eq!(NamedGroup::FFDHE4096.group_type(), NamedGroupType::Ffdhe);
    }

    #[test]
    fn test_name_of_unknown() {
        assert_eq!(NamedGroup::name_of(0x0017), "secp256r1");
        assert_eq!(NamedGroup::name_of(0x1234), "unknown named group (0x1234)");
    }

    #[test]
    fn test_activatable() {
        let provider = RustCryptoProvider::new();
        let enabled = [NamedGroup::X25519, NamedGroup::X448, NamedGroup::FFDHE2048];
        let constraints = AlgorithmConstraints::new().with_disabled_algorithm("ffdhe2048");

        assert!(is_activatable(&enabled, &provider, &constraints, NamedGroup::X25519));
        // not implemented by the provider
        assert!(!is_activatable(&enabled, &provider, &constraints, NamedGroup::X448));
        // disabled by policy
        assert!(!is_activatable(&enabled, &provider, &constraints, NamedGroup::FFDHE2048));
        // not enabled locally
        assert!(!is_activatable(&enabled, &provider, &constraints, NamedGroup::SECP256R1));
    }
}
