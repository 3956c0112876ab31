//! Presence records and their wire encoding.
//!
//! A presence record is what a receiver broadcasts to be found: a display
//! name and the `host:port` of its transfer listener. On the wire it is a
//! JSON object:
//!
//! ```json
//! {"name":"marcus-laptop","address":"192.168.1.20:41213"}
//! ```
//!
//! Unknown fields are ignored so newer peers can add to the record without
//! breaking older listeners.

use std::net::Ipv6Addr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest presence payload a listener will read from one datagram.
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// A device announcing itself on the local network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireRecord")]
pub struct PresenceRecord {
    /// Human-readable device label (not required to be unique)
    name: String,
    /// `host:port` of the device's transfer endpoint
    address: String,
}

/// Unvalidated shape of a record as it arrives off the wire.
#[derive(Deserialize)]
struct WireRecord {
    name: String,
    address: String,
}

impl TryFrom<WireRecord> for PresenceRecord {
    type Error = Error;

    fn try_from(wire: WireRecord) -> Result<Self> {
        Self::new(wire.name, wire.address)
    }
}

impl PresenceRecord {
    /// Create a presence record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if `address` is not a `host:port` pair.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        validate_address(&address)?;
        Ok(Self {
            name: name.into(),
            address,
        })
    }

    /// The device's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The device's transfer endpoint.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Encode this record for a single datagram.
    ///
    /// # Errors
    ///
    /// Only fails if the serializer itself fails, which plain strings never trigger.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::MalformedRecord(e.to_string()))
    }

    /// Decode a record from a datagram payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRecord`] if the payload is not a JSON object
    /// carrying both fields, or if the address is not a valid `host:port`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::MalformedRecord(e.to_string()))
    }
}

/// Check that `address` is a `host:port` pair with a non-zero port.
///
/// Bracketed IPv6 literals (`[fe80::1]:4000`) are accepted; bare IPv6 without
/// brackets is not, since the port would be ambiguous.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] describing the offending string.
pub fn validate_address(address: &str) -> Result<()> {
    let invalid = || Error::InvalidAddress(address.to_string());

    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if port == 0 {
        return Err(invalid());
    }

    if let Some(inner) = host.strip_prefix('[') {
        let inner = inner.strip_suffix(']').ok_or_else(invalid)?;
        return inner
            .parse::<Ipv6Addr>()
            .map(|_| ())
            .map_err(|_| invalid());
    }

    if host.is_empty()
        || host.contains(':')
        || host.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(invalid());
    }

    Ok(())
}
