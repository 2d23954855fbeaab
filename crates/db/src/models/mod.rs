//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - An update DTO (all `Option` fields) for patches where records are mutable

pub mod project;
pub mod remote;
pub mod role;
pub mod timeline;
pub mod user;
