//! Projects and their memberships.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProjectId, UserId};

/// Validation errors for project inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    /// Project name was blank.
    EmptyName,
    /// Invite code was blank.
    EmptyInviteCode,
}

impl fmt::Display for ProjectValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "project name must not be empty"),
            Self::EmptyInviteCode => write!(f, "invite code must not be empty"),
        }
    }
}

impl std::error::Error for ProjectValidationError {}

/// Project row. `deleted_at` marks a soft-deleted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Row id, also used as the invite code.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Sidebar position, ascending.
    pub sort_order: i32,
    /// Soft-delete time.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Whether the project carries a soft-delete marker.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Validated values for a project insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    name: String,
    sort_order: i32,
}

impl NewProject {
    /// Validate a project name; `sort_order` places it after existing ones.
    pub fn new(name: &str, sort_order: i32) -> Result<Self, ProjectValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ProjectValidationError::EmptyName);
        }
        Ok(Self {
            name: trimmed.to_owned(),
            sort_order,
        })
    }

    /// Trimmed project name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Sidebar position for the new project.
    #[must_use]
    pub const fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

/// Project reference typed in by a user joining a project.
///
/// The code is passed through to the membership insert as-is; the remote
/// store decides whether it names a real project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteCode(String);

impl InviteCode {
    /// Accept any non-blank code.
    pub fn new(raw: &str) -> Result<Self, ProjectValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectValidationError::EmptyInviteCode);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Code as typed, trimmed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ProjectId> for InviteCode {
    fn from(value: ProjectId) -> Self {
        Self(value.to_string())
    }
}

/// Member role. The serialised values are the labels stored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRole {
    /// May remove other members.
    #[serde(rename = "管理者")]
    Admin,
    /// Default role for invited members.
    #[serde(rename = "一般")]
    General,
}

impl MemberRole {
    /// Short English label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::General => "member",
        }
    }
}

/// Membership row joined with the member's profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Project joined.
    pub project_id: ProjectId,
    /// Member's user id.
    pub user_id: UserId,
    /// Role within the project.
    pub role: MemberRole,
    /// Joined from `profiles`.
    pub nickname: Option<String>,
    /// Joined from `profiles`.
    pub status_message: Option<String>,
}

/// Membership insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    /// Project to join.
    pub project: InviteCode,
    /// Joining user.
    pub user_id: UserId,
    /// Role granted on joining.
    pub role: MemberRole,
}

/// Nickname of `user_id` among `members`, if loaded.
#[must_use]
pub fn member_nickname<'a>(members: &'a [Member], user_id: &UserId) -> Option<&'a str> {
    members
        .iter()
        .find(|member| &member.user_id == user_id)
        .and_then(|member| member.nickname.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", ProjectValidationError::EmptyName)]
    #[case("  ", ProjectValidationError::EmptyName)]
    fn blank_project_names_fail(#[case] raw: &str, #[case] expected: ProjectValidationError) {
        assert_eq!(NewProject::new(raw, 0).expect_err("blank"), expected);
    }

    #[test]
    fn invite_codes_are_not_checked_for_shape() {
        let code = InviteCode::new(" not-a-uuid ").expect("any non-blank code is accepted");
        assert_eq!(code.as_str(), "not-a-uuid");
    }

    #[rstest]
    #[case(MemberRole::Admin, "\"管理者\"")]
    #[case(MemberRole::General, "\"一般\"")]
    fn roles_use_stored_labels(#[case] role: MemberRole, #[case] wire: &str) {
        assert_eq!(serde_json::to_string(&role).expect("serialise"), wire);
        let back: MemberRole = serde_json::from_str(wire).expect("deserialise");
        assert_eq!(back, role);
    }

    #[test]
    fn member_nickname_resolves_known_users() {
        let project_id = ProjectId::random();
        let known = UserId::random();
        let members = vec![Member {
            project_id,
            user_id: known,
            role: MemberRole::General,
            nickname: Some("Aoi".to_owned()),
            status_message: None,
        }];
        assert_eq!(member_nickname(&members, &known), Some("Aoi"));
        assert_eq!(member_nickname(&members, &UserId::random()), None);
    }
}
