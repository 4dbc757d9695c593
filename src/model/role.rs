use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Collaborator,
}

/// Which vacation requests a caller is allowed to see.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Visibility {
    Everyone,
    /// Requests of users whose manager is the given id.
    TeamOf(u64),
    OwnedBy(u64),
}

impl Role {
    pub fn visibility(self, caller_id: u64) -> Visibility {
        match self {
            Role::Admin => Visibility::Everyone,
            Role::Manager => Visibility::TeamOf(caller_id),
            Role::Collaborator => Visibility::OwnedBy(caller_id),
        }
    }

    /// Approve and reject share this rule.
    pub fn can_review(self, caller_id: u64, owner_manager_id: Option<u64>) -> bool {
        match self {
            Role::Admin => true,
            Role::Manager => owner_manager_id == Some(caller_id),
            Role::Collaborator => false,
        }
    }

    /// Only collaborators are held to their own requests.
    pub fn can_delete(self, caller_id: u64, owner_id: u64) -> bool {
        match self {
            Role::Admin | Role::Manager => true,
            Role::Collaborator => owner_id == caller_id,
        }
    }

    /// Reading a user record: admins read anyone, managers their reports,
    /// everyone reads themselves.
    pub fn can_view_user(self, caller_id: u64, target_id: u64, target_manager_id: Option<u64>) -> bool {
        if caller_id == target_id {
            return true;
        }
        match self {
            Role::Admin => true,
            Role::Manager => target_manager_id == Some(caller_id),
            Role::Collaborator => false,
        }
    }

    /// Creating, deleting, and changing role or manager of accounts.
    pub fn can_administer_users(self) -> bool {
        self == Role::Admin
    }
}
