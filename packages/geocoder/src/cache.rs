//! Explicit key/value store for geocoding results.
//!
//! One cache belongs to one session. Entries live until the cache is
//! dropped or cleared; there is no eviction.

use std::collections::BTreeMap;

use berlin_map_places_models::Coordinate;

/// Cached geocoding results keyed by the exact query string.
///
/// A `None` value records a query that had no match.
#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    entries: BTreeMap<String, Option<Coordinate>>,
    hits: u64,
    misses: u64,
}

impl GeocodeCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Looks up `query`, counting the hit or miss.
    ///
    /// Returns `Some(result)` when the query has been resolved before
    /// (where `result` may itself be `None` for a known miss) and `None`
    /// when the query has never been seen.
    pub fn lookup(&mut self, query: &str) -> Option<Option<Coordinate>> {
        let found = self.entries.get(query).copied();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Returns the cached result for `query` without touching the
    /// counters.
    #[must_use]
    pub fn peek(&self, query: &str) -> Option<Option<Coordinate>> {
        self.entries.get(query).copied()
    }

    /// Stores the result for `query`, replacing any previous entry.
    pub fn insert(&mut self, query: &str, result: Option<Coordinate>) {
        self.entries.insert(query.to_string(), result);
    }

    /// Number of cached queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that were not in the cache.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Removes all entries and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_miss_is_distinct_from_unknown() {
        let mut cache = GeocodeCache::new();
        cache.insert("Atlantis", None);

        assert_eq!(cache.lookup("Atlantis"), Some(None));
        assert_eq!(cache.lookup("Pankow"), None);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn keys_are_exact_strings() {
        let mut cache = GeocodeCache::new();
        cache.insert("Mitte", Some(Coordinate::new(52.52, 13.40)));

        assert!(cache.peek("mitte").is_none());
        assert!(cache.peek("Mitte ").is_none());
        assert_eq!(cache.peek("Mitte"), Some(Some(Coordinate::new(52.52, 13.40))));
    }

    #[test]
    fn clear_resets_everything() {
        let mut cache = GeocodeCache::new();
        cache.insert("Mitte", None);
        cache.lookup("Mitte");
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
    }
}
