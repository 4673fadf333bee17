//! Shared cryptographically secure random source.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::stream::IV_SIZE;

/// A CSPRNG shared by everything that needs IVs or key material not
/// supplied by the vault.
///
/// Construct one at the composition root and share it through an `Arc`.
/// Access is serialized, so concurrent callers never observe correlated
/// output.
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// Creates a source seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fills `dest` with random bytes.
    pub fn fill(&self, dest: &mut [u8]) {
        self.rng.lock().fill_bytes(dest);
    }

    /// Returns `len` random bytes.
    #[must_use]
    pub fn bytes(&self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        self.fill(&mut out);
        out
    }

    /// Returns a fresh IV.
    #[must_use]
    pub fn iv(&self) -> [u8; IV_SIZE] {
        let mut iv = [0u8; IV_SIZE];
        self.fill(&mut iv);
        iv
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomSource").finish_non_exhaustive()
    }
}
