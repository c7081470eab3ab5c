use serde::{Deserialize, Serialize};

/// Caller identity threaded explicitly through every core operation.
/// Administrators bypass ownership checks everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub subject: String,
    pub email: Option<String>,
    pub admin: bool,
}

impl Principal {
    pub fn admin(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            admin: true,
        }
    }

    pub fn user(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            admin: false,
        }
    }

    /// Whether this principal may see or mutate a resource owned by `owner`.
    pub fn may_access(&self, owner: Option<&str>) -> bool {
        self.admin || owner == Some(self.subject.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_bypasses_ownership() {
        let p = Principal::admin("ops");
        assert!(p.may_access(Some("someone-else")));
        assert!(p.may_access(None));
    }

    #[test]
    fn user_only_accesses_own_resources() {
        let p = Principal::user("alice");
        assert!(p.may_access(Some("alice")));
        assert!(!p.may_access(Some("bob")));
        assert!(!p.may_access(None));
    }
}
