//! Algorithm constraints: the externally supplied security policy.

use crate::named_group::{NamedGroup, NamedGroupType};
use crate::signature_scheme::SignatureScheme;

/// Policy deciding which groups, keys and signature schemes may be used.
///
/// Algorithm names are matched ignoring ASCII case against group names
/// (`ffdhe2048`), scheme names (`rsa_pkcs1_sha1`) and the hash or
/// signature component of a scheme (`SHA1`, `RSA`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlgorithmConstraints {
    disabled_algorithms: Vec<String>,
    min_ec_key_bits: u32,
    min_dh_key_bits: u32,
}

impl AlgorithmConstraints {
    /// A policy that permits everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable an algorithm by name.
    pub fn with_disabled_algorithm(mut self, name: &str) -> Self {
        self.disabled_algorithms.push(name.to_ascii_lowercase());
        self
    }

    /// Minimum elliptic curve key size for key agreement.
    pub fn with_min_ec_key_bits(mut self, bits: u32) -> Self {
        self.min_ec_key_bits = bits;
        self
    }

    /// Minimum finite field key size for key agreement.
    pub fn with_min_dh_key_bits(mut self, bits: u32) -> Self {
        self.min_dh_key_bits = bits;
        self
    }

    fn is_disabled(&self, name: &str) -> bool {
        self.disabled_algorithms
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
    }

    /// Whether the group may be negotiated at all.
    pub fn permits_group(&self, group: NamedGroup) -> bool {
        !self.is_disabled(group.name())
    }

    /// Whether a peer key on `group` meets the key size policy.
    ///
    /// Only the group is consulted. Its nominal size stands for the key
    /// size, as every key on a named group has the group's size. The key
    /// bytes are validated earlier, by `check_public_key` when
    /// `KeyAgreementCredentials::value_of` decodes the share.
    pub fn permits_key_agreement(&self, group: NamedGroup) -> bool {
        if !self.permits_group(group) {
            return false;
        }
        let minimum = match group.group_type() {
            NamedGroupType::Ecdhe => self.min_ec_key_bits,
            NamedGroupType::Ffdhe => self.min_dh_key_bits,
        };
        group.key_bits() >= minimum
    }

    /// Whether a signature scheme may be used.
    pub fn permits_scheme(&self, scheme: SignatureScheme) -> bool {
        !self.is_disabled(scheme.name())
            && !scheme
                .hash_name()
                .map_or(false, |hash| self.is_disabled(hash))
            && !self.is_disabled(scheme.signature_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_permits_everything() {
        let constraints = AlgorithmConstraints::new();
        assert!(constraints.permits_group(NamedGroup::FFDHE2048));
        assert!(constraints.permits_key_agreement(NamedGroup::X25519));
        assert!(constraints.permits_scheme(SignatureScheme::RsaPkcs1Sha1));
    }

    #[test]
    fn test_key_size_policy_is_separate_from_group_policy() {
        let constraints = AlgorithmConstraints::new().with_min_dh_key_bits(3072);
        assert!(constraints.permits_group(NamedGroup::FFDHE2048));
        assert!(!constraints.permits_key_agreement(NamedGroup::FFDHE2048));
        assert!(constraints.permits_key_agreement(NamedGroup::FFDHE3072));
        assert!(constraints.permits_key_agreement(NamedGroup::SECP256R1));
    }

    #[test]
    fn test_scheme_component_disabling() {
        let constraints = AlgorithmConstraints::new().with_disabled_algorithm("SHA1");
        assert!(!constraints.permits_scheme(SignatureScheme::EcdsaSha1));
        assert!(!constraints.permits_scheme(SignatureScheme::RsaPkcs1Sha1));
        assert!(constraints.permits_scheme(SignatureScheme::EcdsaSecp256r1Sha256));

        let no_rsa = AlgorithmConstraints::new().with_disabled_algorithm("rsa");
        assert!(!no_rsa.permits_scheme(SignatureScheme::RsaPkcs1Sha256));
        assert!(no_rsa.permits_scheme(SignatureScheme::Ed25519));
    }
}
