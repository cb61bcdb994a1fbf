//! Domain model for tracked parcels.
//!
//! # Responsibility
//! - Define the canonical parcel record shared by store and service layers.
//!
//! # Invariants
//! - A stored parcel is identified by its store-assigned `ParcelNumber`.
//! - Deletion is permanent; there are no tombstones.

pub mod parcel;
