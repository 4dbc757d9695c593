use crate::model::role::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    /// Index into the directory, resolved lazily.
    pub manager_id: Option<u64>,
}

/// A user that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub manager_id: Option<u64>,
}

/// Emails are unique regardless of case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check; deliverability is not our concern.
pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[test]
    fn rejects_obvious_non_addresses() {
        assert!(looks_like_email("ana@example.com"));
        assert!(!looks_like_email("ana.example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ana@localhost"));
        assert!(!looks_like_email("ana@example."));
    }
}
