//! Per-session record of devices already seen.

use std::collections::HashSet;

use super::PresenceRecord;

/// A device reported by discovery for the first time in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFound {
    /// Transfer endpoint (`host:port`), unique within a session
    pub address: String,
    /// Device display name
    pub name: String,
}

impl From<&PresenceRecord> for DeviceFound {
    fn from(record: &PresenceRecord) -> Self {
        Self {
            address: record.address().to_string(),
            name: record.name().to_string(),
        }
    }
}

/// Devices seen during one discovery session, keyed by address.
///
/// The first record seen for an address is canonical: later records for the
/// same address are never inserted, even if the name changed. Iteration
/// follows first-seen order.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    records: Vec<PresenceRecord>,
    addresses: HashSet<String>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record if its address has not been seen yet.
    ///
    /// Returns `true` when the record was new.
    pub fn insert(&mut self, record: PresenceRecord) -> bool {
        if self.contains(record.address()) {
            return false;
        }
        self.addresses.insert(record.address().to_string());
        self.records.push(record);
        true
    }

    /// Whether a device with this address has been seen.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    /// Number of distinct devices seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no device has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over devices in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &PresenceRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, address: &str) -> PresenceRecord {
        PresenceRecord::new(name, address).expect("valid record")
    }

    #[test]
    fn test_first_sighting_wins() {
        let mut registry = DeviceRegistry::new();

        assert!(registry.insert(record("laptop", "10.0.0.2:4000")));
        assert!(!registry.insert(record("renamed", "10.0.0.2:4000")));

        assert_eq!(registry.len(), 1);
        let names: Vec<_> = registry.iter().map(PresenceRecord::name).collect();
        assert_eq!(names, ["laptop"]);
        assert!(registry.contains("10.0.0.2:4000"));
    }

    #[test]
    fn test_same_name_different_address_is_distinct() {
        let mut registry = DeviceRegistry::new();

        assert!(registry.insert(record("box", "10.0.0.2:4000")));
        assert!(registry.insert(record("box", "10.0.0.2:4001")));

        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_iteration_follows_first_seen_order() {
        let mut registry = DeviceRegistry::new();
        registry.insert(record("c", "10.0.0.3:1"));
        registry.insert(record("a", "10.0.0.1:1"));
        registry.insert(record("c-again", "10.0.0.3:1"));
        registry.insert(record("b", "10.0.0.2:1"));

        let names: Vec<_> = registry.iter().map(PresenceRecord::name).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = DeviceRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains("10.0.0.1:1"));
        assert_eq!(registry.iter().count(), 0);
    }
}
