//! Repository layer for parcel persistence.
//!
//! # Responsibility
//! - Define the data access contract used by the service layer.
//! - Keep SQL inside the persistence boundary.
//!
//! # Invariants
//! - Every operation runs exactly one parameterized statement.
//! - Only `get` reports a missing row as an error; writes report affected rows.

pub mod parcel_repo;
