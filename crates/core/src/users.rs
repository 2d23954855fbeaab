//! Helpers for federated (`user@DOMAIN`) and local usernames.

/// Separator between the account name and the federation domain.
pub const DOMAIN_SEPARATOR: char = '@';

/// Returns `true` if the username belongs to a federated identity.
pub fn is_federated(username: &str) -> bool {
    username.contains(DOMAIN_SEPARATOR)
}

/// The federation domain of a username, if any.
pub fn user_domain(username: &str) -> Option<&str> {
    username
        .rsplit_once(DOMAIN_SEPARATOR)
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}

/// Upper-case the domain part of a federated username.
///
/// Local usernames are returned unchanged.
pub fn normalize_federated_username(username: &str) -> String {
    match username.rsplit_once(DOMAIN_SEPARATOR) {
        Some((account, domain)) => format!("{account}{DOMAIN_SEPARATOR}{}", domain.to_uppercase()),
        None => username.to_string(),
    }
}

/// Group a user belongs to by virtue of their domain (lower-cased).
pub fn domain_group(username: &str) -> Option<String> {
    user_domain(username).map(str::to_lowercase)
}

/// Name shown for a user: `name`, else `first last`, else the username.
pub fn display_name(name: &str, first_name: &str, last_name: &str, username: &str) -> String {
    if !name.is_empty() {
        name.to_string()
    } else if !first_name.is_empty() && !last_name.is_empty() {
        format!("{first_name} {last_name}")
    } else {
        username.to_string()
    }
}
