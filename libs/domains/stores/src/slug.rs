//! Store slug generation.

use uuid::Uuid;

pub const SLUG_LENGTH: usize = 6;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random 6 character lowercase alphanumeric slug.
///
/// Uniqueness is not checked here; the unique index on `stores.slug` decides
/// and the caller retries on a collision.
pub fn generate_slug() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(SLUG_LENGTH)
        .map(|b| ALPHABET[(*b as usize) % ALPHABET.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slug_shape() {
        for _ in 0..100 {
            let slug = generate_slug();
            assert_eq!(slug.len(), SLUG_LENGTH);
            assert!(slug.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_slugs_vary() {
        let slugs: HashSet<String> = (0..50).map(|_| generate_slug()).collect();
        assert!(slugs.len() > 45);
    }
}
