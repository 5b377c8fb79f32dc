//! License key string generation.

use keyforge_core::{Error, Result};
use rand::Rng;

/// 32 symbols with the look-alikes 0/O and 1/I removed.
pub const KEY_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const GROUPS: usize = 4;
const GROUP_LEN: usize = 4;
const MAX_PREFIX_LEN: usize = 12;

/// Produces `PREFIX-XXXX-XXXX-XXXX-XXXX` key strings.
///
/// Generation alone does not guarantee uniqueness; the store's unique
/// constraint does, and [`crate::LicenseIssuer`] retries on collision.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    prefix: String,
}

impl KeyGenerator {
    /// Create a generator. Prefixes are 1-12 uppercase ASCII letters or digits.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        let well_formed = !prefix.is_empty()
            && prefix.len() <= MAX_PREFIX_LEN
            && prefix
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if !well_formed {
            return Err(Error::InvalidInput(format!("Invalid key prefix: {:?}", prefix)));
        }
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a key using the thread-local RNG.
    pub fn generate(&self) -> String {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Generate a key from the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut key = String::with_capacity(self.prefix.len() + GROUPS * (GROUP_LEN + 1));
        key.push_str(&self.prefix);
        for _ in 0..GROUPS {
            key.push('-');
            for _ in 0..GROUP_LEN {
                let idx = rng.gen_range(0..KEY_ALPHABET.len());
                key.push(char::from(KEY_ALPHABET[idx]));
            }
        }
        key
    }

    /// Whether `key` has the shape this generator produces.
    pub fn matches_format(&self, key: &str) -> bool {
        let Some(rest) = key
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
        else {
            return false;
        };
        let groups: Vec<&str> = rest.split('-').collect();
        groups.len() == GROUPS
            && groups.iter().all(|group| {
                group.len() == GROUP_LEN && group.bytes().all(|b| KEY_ALPHABET.contains(&b))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_has_no_ambiguous_symbols() {
        let symbols: HashSet<u8> = KEY_ALPHABET.iter().copied().collect();
        assert_eq!(symbols.len(), 32);
        for ambiguous in [b'0', b'O', b'1', b'I'] {
            assert!(!symbols.contains(&ambiguous));
        }
    }

    #[test]
    fn test_generated_keys_match_format() {
        let generator = KeyGenerator::new("PRO").unwrap();
        for _ in 0..500 {
            let key = generator.generate();
            assert_eq!(key.len(), "PRO".len() + 20);
            assert!(generator.matches_format(&key), "bad key {}", key);
        }
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let generator = KeyGenerator::new("LIC").unwrap();
        let a = generator.generate_with(&mut StdRng::seed_from_u64(7));
        let b = generator.generate_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_prefixes() {
        assert!(KeyGenerator::new("").is_err());
        assert!(KeyGenerator::new("lic").is_err());
        assert!(KeyGenerator::new("LIC-X").is_err());
        assert!(KeyGenerator::new("ABCDEFGHIJKLM").is_err());
        assert!(KeyGenerator::new("V2").is_ok());
    }

    #[test]
    fn test_matches_format_rejects_lookalikes() {
        let generator = KeyGenerator::new("LIC").unwrap();
        assert!(generator.matches_format("LIC-ABCD-EFGH-JKLM-NPQR"));
        assert!(!generator.matches_format("LIC-ABCD-EFGH-JKLM-NPQ0"));
        assert!(!generator.matches_format("LIC-ABCD-EFGH-JKLM"));
        assert!(!generator.matches_format("PRO-ABCD-EFGH-JKLM-NPQR"));
    }
}
