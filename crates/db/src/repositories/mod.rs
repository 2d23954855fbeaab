//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod group_repo;
pub mod project_repo;
pub mod remote_project_repo;
pub mod remote_site_repo;
pub mod role_assignment_repo;
pub mod role_repo;
pub mod timeline_event_repo;
pub mod user_repo;

pub use group_repo::GroupRepo;
pub use project_repo::ProjectRepo;
pub use remote_project_repo::RemoteProjectRepo;
pub use remote_site_repo::RemoteSiteRepo;
pub use role_assignment_repo::RoleAssignmentRepo;
pub use role_repo::RoleRepo;
pub use timeline_event_repo::TimelineEventRepo;
pub use user_repo::UserRepo;
