//! Parcel domain model.
//!
//! # Responsibility
//! - Define the parcel record and its closed set of lifecycle statuses.
//! - Map statuses to and from their persisted text form.
//!
//! # Invariants
//! - `number` is `0` until the store assigns one; it never changes afterwards.
//! - `client` and `created_at` are set once at creation.
//! - `address` may only change while `status == ParcelStatus::Registered`.
//!   The service layer enforces this, the store does not.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned parcel identifier (SQLite row id).
pub type ParcelNumber = i64;

/// Owning client identifier.
pub type ClientId = i64;

/// Parcel lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted for shipping, address still editable.
    Registered,
    /// Handed over to the carrier.
    Sent,
    /// Received by the addressee.
    Delivered,
}

impl ParcelStatus {
    /// Returns the persisted text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Parses the persisted text form. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(Self::Registered),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Returns the following status in forward order, `None` after delivery.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracked shipment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Assigned by the store on insert; `0` for unsaved parcels.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    /// Free-form delivery address.
    pub address: String,
    /// RFC 3339 UTC timestamp, second precision (`2024-01-01T00:00:00Z`).
    pub created_at: String,
}

impl Parcel {
    /// Creates an unsaved `registered` parcel stamped with the current time.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self {
            number: 0,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: now_rfc3339(),
        }
    }

    /// Returns whether the parcel is still `registered`, i.e. its address may
    /// change and it may be deleted.
    pub fn is_registered(&self) -> bool {
        self.status == ParcelStatus::Registered
    }
}

impl Display for Parcel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parcel #{} to `{}` for client {}, registered {}, status {}",
            self.number, self.address, self.client, self.created_at, self.status
        )
    }
}

/// Current UTC time in the fixed `created_at` format.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::{now_rfc3339, Parcel, ParcelStatus};

    #[test]
    fn status_text_mapping_is_stable() {
        for status in [
            ParcelStatus::Registered,
            ParcelStatus::Sent,
            ParcelStatus::Delivered,
        ] {
            assert_eq!(ParcelStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ParcelStatus::parse("Registered"), None);
        assert_eq!(ParcelStatus::parse("lost"), None);
    }

    #[test]
    fn status_advances_forward_and_stops_at_delivered() {
        assert_eq!(ParcelStatus::Registered.next(), Some(ParcelStatus::Sent));
        assert_eq!(ParcelStatus::Sent.next(), Some(ParcelStatus::Delivered));
        assert_eq!(ParcelStatus::Delivered.next(), None);
    }

    #[test]
    fn new_parcel_is_unsaved_and_registered() {
        let parcel = Parcel::new(1000, "test");
        assert_eq!(parcel.number, 0);
        assert_eq!(parcel.client, 1000);
        assert_eq!(parcel.status, ParcelStatus::Registered);
        assert_eq!(parcel.address, "test");
        assert!(parcel.is_registered());
    }

    #[test]
    fn only_registered_parcels_report_registered() {
        let mut parcel = Parcel::new(1, "addr");
        for (status, expected) in [
            (ParcelStatus::Registered, true),
            (ParcelStatus::Sent, false),
            (ParcelStatus::Delivered, false),
        ] {
            parcel.status = status;
            assert_eq!(parcel.is_registered(), expected, "{status}");
        }
    }

    #[test]
    fn parcel_json_roundtrip_keeps_every_field() {
        let parcel = Parcel {
            number: 12,
            client: 1000,
            status: ParcelStatus::Sent,
            address: "test".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_string(&parcel).unwrap();
        assert!(json.contains("\"status\":\"sent\""));
        let decoded: Parcel = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, parcel);
    }

    #[test]
    fn created_at_uses_utc_seconds_format() {
        let stamp = now_rfc3339();
        assert_eq!(stamp.len(), "2024-01-01T00:00:00Z".len());
        assert!(stamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn status_serializes_as_lowercase_text() {
        let json = serde_json::to_string(&ParcelStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
    }
}
