//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel with `diesel-async`.
//! - **firebase**: Firebase ID token verification against Google's JWKS.
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business rules.

pub mod firebase;
pub mod persistence;
