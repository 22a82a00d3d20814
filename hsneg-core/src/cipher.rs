//! Cipher suites known to negotiation.
//!
//! Negotiation needs three facts per suite: its codepoint, its transcript
//! hash and, for TLS 1.2, the key exchange method the suite fixes. TLS 1.3
//! suites leave the key exchange to key_share.

use hsneg_crypto::HashAlgorithm;

use crate::key_exchange::KeyExchangeMethod;

macro_rules! cipher_suites {
    ($(
        $(#[$doc:meta])*
        $variant:ident = $id:literal, $name:literal, $hash:ident, $method:expr;
    )*) => {
        /// Cipher suite for TLS 1.2 and TLS 1.3.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum CipherSuite {
            $($(#[$doc])* $variant = $id,)*
        }

        impl CipherSuite {
            /// Suite for a wire codepoint.
            pub const fn from_u16(value: u16) -> Option<Self> {
                match value {
                    $($id => Some(CipherSuite::$variant),)*
                    _ => None,
                }
            }

            /// Transcript and PRF hash.
            pub const fn hash_algorithm(self) -> HashAlgorithm {
                match self {
                    $(CipherSuite::$variant => HashAlgorithm::$hash,)*
                }
            }

            /// The key exchange method a TLS 1.2 suite fixes; `None` for TLS 1.3.
            pub const fn key_exchange_method(self) -> Option<KeyExchangeMethod> {
                match self {
                    $(CipherSuite::$variant => $method,)*
                }
            }

            /// IANA name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(CipherSuite::$variant => $name,)*
                }
            }
        }
    };
}

use KeyExchangeMethod as M;

cipher_suites! {
    /// Mandatory TLS 1.3 suite
    Aes128GcmSha256 = 0x1301, "TLS_AES_128_GCM_SHA256", Sha256, None;
    /// TLS 1.3 AES-256-GCM
    Aes256GcmSha384 = 0x1302, "TLS_AES_256_GCM_SHA384", Sha384, None;
    /// TLS 1.3 ChaCha20-Poly1305
    ChaCha20Poly1305Sha256 = 0x1303, "TLS_CHACHA20_POLY1305_SHA256", Sha256, None;
    /// TLS 1.3 AES-128-CCM
    Aes128CcmSha256 = 0x1304, "TLS_AES_128_CCM_SHA256", Sha256, None;
    /// TLS 1.3 AES-128-CCM with 8 byte tag
    Aes128Ccm8Sha256 = 0x1305, "TLS_AES_128_CCM_8_SHA256", Sha256, None;

    /// Static RSA
    Tls12RsaWithAes128GcmSha256 = 0x009C, "TLS_RSA_WITH_AES_128_GCM_SHA256", Sha256, Some(M::Rsa);
    /// Static RSA
    Tls12RsaWithAes256GcmSha384 = 0x009D, "TLS_RSA_WITH_AES_256_GCM_SHA384", Sha384, Some(M::Rsa);
    /// Ephemeral DH, RSA signed
    Tls12DheRsaWithAes128GcmSha256 = 0x009E, "TLS_DHE_RSA_WITH_AES_128_GCM_SHA256", Sha256, Some(M::DheRsa);
    /// Ephemeral DH, RSA signed
    Tls12DheRsaWithAes256GcmSha384 = 0x009F, "TLS_DHE_RSA_WITH_AES_256_GCM_SHA384", Sha384, Some(M::DheRsa);
    /// Ephemeral DH, DSA signed
    Tls12DheDssWithAes128GcmSha256 = 0x00A2, "TLS_DHE_DSS_WITH_AES_128_GCM_SHA256", Sha256, Some(M::DheDss);
    /// Anonymous DH
    Tls12DhAnonWithAes128GcmSha256 = 0x00A6, "TLS_DH_anon_WITH_AES_128_GCM_SHA256", Sha256, Some(M::DhAnon);
    /// Ephemeral ECDH, ECDSA signed
    Tls12EcdheEcdsaWithAes128GcmSha256 = 0xC02B, "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256", Sha256, Some(M::EcdheEcdsa);
    /// Ephemeral ECDH, ECDSA signed
    Tls12EcdheEcdsaWithAes256GcmSha384 = 0xC02C, "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384", Sha384, Some(M::EcdheEcdsa);
    /// Static ECDH, ECDSA certificate
    Tls12EcdhEcdsaWithAes128GcmSha256 = 0xC02D, "TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256", Sha256, Some(M::EcdhEcdsa);
    /// Ephemeral ECDH, RSA signed
    Tls12EcdheRsaWithAes128GcmSha256 = 0xC02F, "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256", Sha256, Some(M::EcdheRsa);
    /// Ephemeral ECDH, RSA signed
    Tls12EcdheRsaWithAes256GcmSha384 = 0xC030, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384", Sha384, Some(M::EcdheRsa);
    /// Static ECDH, RSA certificate
    Tls12EcdhRsaWithAes128GcmSha256 = 0xC031, "TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256", Sha256, Some(M::EcdhRsa);
    /// Ephemeral ECDH, RSA signed
    Tls12EcdheRsaWithChacha20Poly1305Sha256 = 0xCCA8, "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256", Sha256, Some(M::EcdheRsa);
    /// Ephemeral ECDH, ECDSA signed
    Tls12EcdheEcdsaWithChacha20Poly1305Sha256 = 0xCCA9, "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256", Sha256, Some(M::EcdheEcdsa);
}

impl CipherSuite {
    /// Wire codepoint.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// True for the 0x13xx suites.
    pub const fn is_tls13(self) -> bool {
        (self as u16) >> 8 == 0x13
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codepoints() {
        assert_eq!(CipherSuite::from_u16(0x1301), Some(CipherSuite::Aes128GcmSha256));
        assert_eq!(CipherSuite::Tls12EcdhRsaWithAes128GcmSha256.to_u16(), 0xC031);
        assert_eq!(CipherSuite::from_u16(0x0000), None);
    }

    #[test]
    fn test_tls13_suites_leave_key_exchange_open() {
        for id in 0x1301..=0x1305u16 {
            let suite = CipherSuite::from_u16(id).unwrap();
            assert!(suite.is_tls13(), "{}", suite.name());
            assert_eq!(suite.key_exchange_method(), None);
        }
        assert!(!CipherSuite::Tls12EcdheRsaWithAes128GcmSha256.is_tls13());
    }

    #[test]
    fn test_hash_and_method() {
        assert_eq!(CipherSuite::Aes256GcmSha384.hash_algorithm(), HashAlgorithm::Sha384);
        assert_eq!(CipherSuite::ChaCha20Poly1305Sha256.hash_algorithm(), HashAlgorithm::Sha256);
        assert_eq!(
            CipherSuite::Tls12DheRsaWithAes256GcmSha384.key_exchange_method(),
            Some(KeyExchangeMethod::DheRsa)
        );
        assert_eq!(CipherSuite::Tls12DhAnonWithAes128GcmSha256.name(), "TLS_DH_anon_WITH_AES_128_GCM_SHA256");
    }
}
