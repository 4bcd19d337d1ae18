//! Record identifiers.

use ulid::Ulid;

/// Issues identifiers for new rows and uploaded files.
///
/// Identifiers are lowercase ULIDs: 26 characters, URL-safe, and ordered by
/// creation time, which makes them usable as a tie-breaker when two rows
/// share a timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    /// Create a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// A fresh identifier.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_lowercase_and_unique() {
        let id_gen = IdGenerator::new();
        let ids: Vec<String> = (0..50).map(|_| id_gen.generate()).collect();

        for id in &ids {
            assert_eq!(id.len(), 26);
            assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_later_ids_sort_after_earlier_ones() {
        let id_gen = IdGenerator::new();
        let first = id_gen.generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = id_gen.generate();

        assert!(first < second);
    }
}
