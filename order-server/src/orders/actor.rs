//! Acting identity and ownership policy

use serde::{Deserialize, Serialize};

/// Who is performing a call
///
/// `Owner` callers only see and mutate orders they created. `Privileged`
/// callers bypass the ownership filter; the id is still what audit and
/// `last_update_by` record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    Owner(String),
    Privileged(String),
}

impl Actor {
    pub fn id(&self) -> &str {
        match self {
            Actor::Owner(id) | Actor::Privileged(id) => id,
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, Actor::Privileged(_))
    }

    /// The single ownership policy: `Some(user)` means every order read and
    /// write is additionally constrained to `created_by = user`
    pub fn owner_scope(&self) -> Option<&str> {
        match self {
            Actor::Owner(id) => Some(id),
            Actor::Privileged(_) => None,
        }
    }
}

/// Per-call context: tenant + actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub project_id: i64,
    pub actor: Actor,
}

impl RequestContext {
    pub fn new(project_id: i64, actor: Actor) -> Self {
        Self { project_id, actor }
    }

    pub fn owner(project_id: i64, user_id: impl Into<String>) -> Self {
        Self::new(project_id, Actor::Owner(user_id.into()))
    }

    pub fn privileged(project_id: i64, user_id: impl Into<String>) -> Self {
        Self::new(project_id, Actor::Privileged(user_id.into()))
    }

    pub fn actor_id(&self) -> &str {
        self.actor.id()
    }

    pub fn owner_scope(&self) -> Option<&str> {
        self.actor.owner_scope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_scope() {
        let owner = RequestContext::owner(1, "u1");
        assert_eq!(owner.owner_scope(), Some("u1"));
        assert_eq!(owner.actor_id(), "u1");

        let admin = RequestContext::privileged(1, "admin");
        assert_eq!(admin.owner_scope(), None);
        assert_eq!(admin.actor_id(), "admin");
        assert!(admin.actor.is_privileged());
    }

    #[test]
    fn test_actor_serde_shape() {
        let json = serde_json::to_string(&Actor::Owner("u1".into())).unwrap();
        assert_eq!(json, r#"{"kind":"owner","user_id":"u1"}"#);
    }
}
