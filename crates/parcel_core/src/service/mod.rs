//! Use-case services over the parcel repository.
//!
//! # Responsibility
//! - Enforce status rules the store leaves to its callers.
//! - Keep CLI and other front ends decoupled from SQL.

pub mod parcel_service;
