//! Domain types and invariants for project and role management.
//!
//! Everything in this crate is pure: no database or network access. The
//! persistence layer (`roster-db`) and the sync engine (`roster-sync`) call
//! into these rules before committing changes.

pub mod error;
pub mod project;
pub mod remote;
pub mod roles;
pub mod settings;
pub mod types;
pub mod users;
