//! Cache key derivation (spec.md §4.6): `SHA-384(executor_identity ||
//! binary_cache_key)`.

use sha2::{Digest, Sha384};
use std::fmt;

/// Hex-displayable SHA-384 digest identifying one cached artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey([u8; 48]);

impl CacheKey {
    /// Reconstructs a key from raw bytes, e.g. when parsing a cache
    /// directory name back into the key that produced it.
    pub(crate) fn from_raw(bytes: [u8; 48]) -> Self {
        CacheKey(bytes)
    }

    pub fn derive(executor_identity: &str, binary_cache_key: &[u8]) -> Self {
        let mut hasher = Sha384::new();
        hasher.update(executor_identity.as_bytes());
        hasher.update(binary_cache_key);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 48];
        bytes.copy_from_slice(&digest);
        CacheKey(bytes)
    }

    pub fn to_hex(self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_derive_the_same_key() {
        let a = CacheKey::derive("CC", b"int main(){}");
        let b = CacheKey::derive("CC", b"int main(){}");
        assert_eq!(a, b);
    }

    #[test]
    fn different_executors_derive_different_keys() {
        let a = CacheKey::derive("CC", b"int main(){}");
        let b = CacheKey::derive("CPP", b"int main(){}");
        assert_ne!(a, b);
    }
}
