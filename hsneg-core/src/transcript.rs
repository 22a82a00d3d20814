//! Transcript hash accumulator.
//!
//! Messages are buffered and digested on demand because the hash
//! algorithm is only known once a cipher suite has been negotiated.
//! Per RFC 8446 Section 4.4.1 the transcript after a HelloRetryRequest
//! starts with a synthetic `message_hash` record standing in for the
//! first ClientHello.

use std::collections::VecDeque;

use hsneg_crypto::{CryptoProvider, HashAlgorithm};

use crate::codec;
use crate::error::{Error, Result};
use crate::protocol::HandshakeType;

/// Transcript hash manager.
///
/// # Example
/// ```rust,ignore
/// let mut transcript = TranscriptHash::new();
/// transcript.update(&client_hello);
/// transcript.determine(HashAlgorithm::Sha256);
/// let hash = transcript.digest(&provider)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranscriptHash {
    /// Hash algorithm, once negotiated
    algorithm: Option<HashAlgorithm>,
    /// All messages in transcript order
    messages: VecDeque<Vec<u8>>,
}

impl TranscriptHash {
    /// Create an empty transcript with no algorithm chosen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the hash algorithm.
    pub fn determine(&mut self, algorithm: HashAlgorithm) {
        self.algorithm = Some(algorithm);
    }

    /// The hash algorithm, if negotiated.
    pub fn algorithm(&self) -> Option<HashAlgorithm> {
        self.algorithm
    }

    /// Append an encoded handshake message (including its 4-byte header).
    pub fn update(&mut self, message: &[u8]) {
        self.messages.push_back(message.to_vec());
    }

    /// Place synthetic bytes ahead of everything recorded so far.
    ///
    /// Pushing `a` then `b` yields `b || a || <earlier messages>`.
    pub fn push(&mut self, bytes: &[u8]) {
        self.messages.push_front(bytes.to_vec());
    }

    /// Digest of all messages recorded so far.
    pub fn digest(&self, provider: &dyn CryptoProvider) -> Result<Vec<u8>> {
        let algorithm = self
            .algorithm
            .ok_or_else(|| Error::InternalError("transcript hash algorithm not negotiated".into()))?;
        let mut hasher = provider.hash(algorithm)?;
        for msg in &self.messages {
            hasher.update(msg);
        }
        Ok(hasher.finalize())
    }

    /// Replace the recorded messages with a single `message_hash` record
    /// of their digest, as done for ClientHello1 after a HelloRetryRequest.
    pub fn collapse_to_message_hash(&mut self, provider: &dyn CryptoProvider) -> Result<()> {
        let hash = self.digest(provider)?;
        self.messages.clear();
        self.messages.push_back(message_hash_record(&hash));
        Ok(())
    }

    /// Number of recorded entries.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Reset the transcript to empty.
    pub fn reset(&mut self) {
        self.messages.clear();
    }
}

/// `message_hash` handshake record wrapping `hash`.
pub fn message_hash_record(hash: &[u8]) -> Vec<u8> {
    codec::handshake_message(HandshakeType::MessageHash.to_u8(), hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsneg_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_digest_requires_algorithm() {
        let provider = RustCryptoProvider::new();
        let mut transcript = TranscriptHash::new();
        transcript.update(b"hello");
        assert!(transcript.digest(&provider).is_err());

        transcript.determine(HashAlgorithm::Sha256);
        let hash = transcript.digest(&provider).unwrap();
        assert_eq!(hash, provider.digest(HashAlgorithm::Sha256, b"hello").unwrap());
    }

    #[test]
    fn test_push_prepends_in_stack_order() {
        let provider = RustCryptoProvider::new();
        let mut transcript = TranscriptHash::new();
        transcript.determine(HashAlgorithm::Sha256);
        transcript.update(b"ch2");
        transcript.push(b"hrr");
        transcript.push(b"mh");

        let expected = provider.digest(HashAlgorithm::Sha256, b"mhhrrch2").unwrap();
        assert_eq!(transcript.digest(&provider).unwrap(), expected);
        assert_eq!(transcript.message_count(), 3);
    }

    #[test]
    fn test_collapse_to_message_hash() {
        let provider = RustCryptoProvider::new();
        let mut transcript = TranscriptHash::new();
        transcript.determine(HashAlgorithm::Sha384);
        transcript.update(b"client hello 1");

        let ch1_hash = transcript.digest(&provider).unwrap();
        transcript.collapse_to_message_hash(&provider).unwrap();

        let record = message_hash_record(&ch1_hash);
        assert_eq!(&record[..4], &[254, 0, 0, 48]);
        assert_eq!(
            transcript.digest(&provider).unwrap(),
            provider.digest(HashAlgorithm::Sha384, &record).unwrap()
        );
    }
}
