//! Entropy for ephemeral keys, hello randoms and cookie secrets.

use crate::Result;

/// Source of unpredictable bytes.
///
/// Shared between connections, so implementations take `&self`.
pub trait Random: Send + Sync {
    /// Overwrite all of `dest`.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;

    /// `len` fresh bytes.
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.fill(&mut out)?;
        Ok(out)
    }

    /// A fresh big-endian `u32`, used to seed cookie secret versions.
    fn next_u32(&self) -> Result<u32> {
        let mut word = [0u8; 4];
        self.fill(&mut word)?;
        Ok(u32::from_be_bytes(word))
    }
}
