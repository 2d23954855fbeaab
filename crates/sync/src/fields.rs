//! Field-level diffing of local records against incoming sync entries.
//!
//! Each entity has a fixed table of mutable fields; only those are
//! compared, and only changed values end up in the update DTO.

use roster_db::models::project::{Project, UpdateProject};
use roster_db::models::user::{UpdateUser, User};

use crate::document::{ProjectEntry, UserEntry};

/// Mutable user fields, in comparison order.
pub const USER_FIELDS: [&str; 4] = ["name", "first_name", "last_name", "email"];

/// Mutable project fields, in comparison order. `parent` is diffed
/// separately since it needs a lookup.
pub const PROJECT_FIELDS: [&str; 3] = ["title", "description", "readme"];

/// Names of the fields found to differ.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    changed: Vec<&'static str>,
}

impl ChangeSet {
    /// Compare one text field. Returns the incoming value if it differs.
    ///
    /// `incoming == None` means the field was not sent and is left alone.
    pub fn text(&mut self, name: &'static str, current: &str, incoming: Option<&str>) -> Option<String> {
        match incoming {
            Some(value) if value != current => {
                self.changed.push(name);
                Some(value.to_string())
            }
            _ => None,
        }
    }

    pub fn push(&mut self, name: &'static str) {
        self.changed.push(name);
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn names(&self) -> &[&'static str] {
        &self.changed
    }

    /// Comma-separated field names, for log lines and event text.
    pub fn joined(&self) -> String {
        self.changed.join(", ")
    }
}

/// Diff a user against its incoming entry.
pub fn diff_user(user: &User, entry: &UserEntry) -> (ChangeSet, UpdateUser) {
    let mut changes = ChangeSet::default();
    let [name, first_name, last_name, email] = USER_FIELDS;
    let update = UpdateUser {
        name: changes.text(name, &user.name, Some(&entry.name)),
        first_name: changes.text(first_name, &user.first_name, Some(&entry.first_name)),
        last_name: changes.text(last_name, &user.last_name, Some(&entry.last_name)),
        email: changes.text(email, &user.email, Some(&entry.email)),
    };
    (changes, update)
}

/// Diff the scalar fields of a project against its incoming entry.
///
/// A missing local description compares equal to an empty string.
pub fn diff_project(project: &Project, entry: &ProjectEntry) -> (ChangeSet, UpdateProject) {
    let mut changes = ChangeSet::default();
    let [title, description, readme] = PROJECT_FIELDS;
    let update = UpdateProject {
        title: changes.text(title, &project.title, Some(&entry.title)),
        description: changes.text(
            description,
            project.description.as_deref().unwrap_or_default(),
            entry.description.as_deref(),
        ),
        readme: changes.text(readme, &project.readme, entry.readme.as_deref()),
        parent_id: None,
    };
    (changes, update)
}
