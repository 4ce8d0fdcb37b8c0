//! Wire DTOs for the auth and data APIs.
//!
//! Responses decode into these transport types first and are mapped into
//! domain records in one pass. Request bodies borrow from domain values.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    AuthUser, Member, MemberRole, NewMembership, NewProject, NewTask, Nickname, Profile,
    ProfileUpdate, Project, ProjectId, Session, Subtask, Task, TaskId, TaskPatch, UserId,
};

// ---- auth ------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct PasswordBody<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshBody<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct VerifyBody<'a> {
    #[serde(rename = "type")]
    pub(super) kind: &'static str,
    pub(super) email: &'a str,
    pub(super) token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: UserId,
    #[serde(default)]
    pub(super) email: Option<String>,
}

impl From<UserDto> for AuthUser {
    fn from(value: UserDto) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserDto,
}

/// Access-token lifetime assumed when the service reports none.
const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

impl SessionDto {
    /// Absolute expiry wins; otherwise `now + expires_in`. Lifetimes that do
    /// not fit a timestamp fall back to the default lifetime.
    pub(super) fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.and_then(|secs| expiry_after(now, secs)))
            .unwrap_or_else(|| default_expiry(now));
        Session::new(
            self.user.into(),
            self.access_token,
            self.refresh_token,
            expires_at,
        )
    }
}

fn expiry_after(now: DateTime<Utc>, seconds: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(seconds).and_then(|lifetime| now.checked_add_signed(lifetime))
}

fn default_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    expiry_after(now, DEFAULT_EXPIRES_IN_SECONDS).unwrap_or(now)
}

/// Sign-up answers with a session when confirmation is disabled, and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponseDto {
    Session(SessionDto),
    User(UserDto),
}

/// Error body shared by the auth and data APIs. Each service fills a
/// different subset of fields.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBodyDto {
    pub(super) fn into_message(self) -> Option<String> {
        [self.error_description, self.msg, self.message, self.error]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
    }
}

// ---- profiles --------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProfileRow {
    id: UserId,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            nickname: row.nickname.and_then(|raw| Nickname::new(raw).ok()),
            status_message: row.status_message,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileBody<'a> {
    id: UserId,
    nickname: &'a str,
    status_message: Option<&'a str>,
}

impl<'a> From<&'a ProfileUpdate> for ProfileBody<'a> {
    fn from(value: &'a ProfileUpdate) -> Self {
        Self {
            id: value.id,
            nickname: value.nickname.as_str(),
            status_message: value.status_message.as_deref(),
        }
    }
}

// ---- projects --------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProjectRow {
    id: ProjectId,
    name: String,
    #[serde(default)]
    sort_order: Option<i32>,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            sort_order: row.sort_order.unwrap_or_default(),
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProjectBody<'a> {
    name: &'a str,
    sort_order: i32,
}

impl<'a> From<&'a NewProject> for ProjectBody<'a> {
    fn from(value: &'a NewProject) -> Self {
        Self {
            name: value.name(),
            sort_order: value.sort_order(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SoftDeleteBody {
    pub(super) deleted_at: DateTime<Utc>,
}

// ---- memberships -----------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct MembershipIdRow {
    pub(super) project_id: ProjectId,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProfileEmbed {
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MemberRow {
    project_id: ProjectId,
    user_id: UserId,
    role: MemberRole,
    #[serde(default)]
    profiles: Option<ProfileEmbed>,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        let profile = row.profiles.unwrap_or_default();
        Self {
            project_id: row.project_id,
            user_id: row.user_id,
            role: row.role,
            nickname: profile.nickname,
            status_message: profile.status_message,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct MembershipBody<'a> {
    /// Sent as typed; the store rejects codes that are not project ids.
    project_id: &'a str,
    user_id: UserId,
    role: MemberRole,
}

impl<'a> From<&'a NewMembership> for MembershipBody<'a> {
    fn from(value: &'a NewMembership) -> Self {
        Self {
            project_id: value.project.as_str(),
            user_id: value.user_id,
            role: value.role,
        }
    }
}

// ---- todos -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NameEmbed {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TaskRow {
    id: TaskId,
    project_id: ProjectId,
    #[serde(default)]
    text: Option<String>,
    /// Legacy rows stored the title here.
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    assigned_to: Option<UserId>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    link_url: Option<String>,
    #[serde(default)]
    sort_order: Option<i32>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    subtasks: Option<Vec<Subtask>>,
    #[serde(default)]
    profiles: Option<ProfileEmbed>,
    #[serde(default)]
    projects: Option<NameEmbed>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            title: row.text.or(row.title).unwrap_or_default(),
            assigned_to: row.assigned_to,
            assignee_nickname: row.profiles.and_then(|embed| embed.nickname),
            project_name: row.projects.and_then(|embed| embed.name),
            due_date: row.due_date,
            link_url: row.link_url,
            sort_order: row.sort_order.unwrap_or_default(),
            completed: row.completed.unwrap_or_default(),
            deleted_at: row.deleted_at,
            updated_at: row.updated_at,
            subtasks: row.subtasks.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TaskBody<'a> {
    project_id: ProjectId,
    text: &'a str,
    assigned_to: UserId,
    due_date: Option<NaiveDate>,
    link_url: Option<&'a str>,
    sort_order: i32,
    completed: bool,
    subtasks: [Subtask; 0],
}

impl<'a> From<&'a NewTask> for TaskBody<'a> {
    fn from(value: &'a NewTask) -> Self {
        Self {
            project_id: value.project_id,
            text: value.title.as_str(),
            assigned_to: value.assigned_to,
            due_date: value.due_date,
            link_url: value.link_url.as_deref(),
            sort_order: value.sort_order,
            completed: false,
            subtasks: [],
        }
    }
}

/// JSON object holding only the columns the patch touches.
pub(super) fn task_patch_body(patch: &TaskPatch) -> Result<Map<String, Value>, serde_json::Error> {
    let mut body = Map::new();
    if let Some(title) = &patch.title {
        body.insert("text".to_owned(), Value::from(title.as_str()));
    }
    if let Some(assignee) = &patch.assigned_to {
        body.insert("assigned_to".to_owned(), serde_json::to_value(assignee)?);
    }
    if let Some(due) = &patch.due_date {
        body.insert("due_date".to_owned(), serde_json::to_value(due)?);
    }
    if let Some(link) = &patch.link_url {
        body.insert("link_url".to_owned(), serde_json::to_value(link)?);
    }
    if let Some(completed) = patch.completed {
        body.insert("completed".to_owned(), Value::Bool(completed));
    }
    if let Some(subtasks) = &patch.subtasks {
        body.insert("subtasks".to_owned(), serde_json::to_value(subtasks)?);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
    const PROJECT: &str = "9b2b8a1e-3c55-4d6e-8f00-112233445566";
    const TASK: &str = "0d6f1c2e-1111-4222-8333-444455556666";

    #[test]
    fn task_row_prefers_text_and_falls_back_to_title() {
        let row: TaskRow = serde_json::from_value(json!({
            "id": TASK,
            "project_id": PROJECT,
            "title": "legacy title",
            "completed": false,
            "subtasks": null,
            "profiles": { "nickname": "Aoi" },
        }))
        .expect("decode");
        let task = Task::from(row);
        assert_eq!(task.title, "legacy title");
        assert_eq!(task.assignee_nickname.as_deref(), Some("Aoi"));
        assert!(task.subtasks.is_empty());

        let row: TaskRow = serde_json::from_value(json!({
            "id": TASK,
            "project_id": PROJECT,
            "text": "current",
            "title": "legacy",
            "projects": { "name": "Launch" },
        }))
        .expect("decode");
        let task = Task::from(row);
        assert_eq!(task.title, "current");
        assert_eq!(task.project_name.as_deref(), Some("Launch"));
    }

    #[test]
    fn new_task_body_writes_text_column_only() {
        let new_task = NewTask {
            project_id: ProjectId::new(PROJECT).expect("id"),
            title: crate::domain::TaskTitle::new("Write brief").expect("title"),
            assigned_to: UserId::new(USER).expect("id"),
            due_date: None,
            link_url: None,
            sort_order: 2,
        };
        let body = serde_json::to_value(TaskBody::from(&new_task)).expect("encode");
        assert_eq!(
            body,
            json!({
                "project_id": PROJECT,
                "text": "Write brief",
                "assigned_to": USER,
                "due_date": null,
                "link_url": null,
                "sort_order": 2,
                "completed": false,
                "subtasks": [],
            })
        );
    }

    #[test]
    fn patch_body_contains_only_touched_columns() {
        let patch = TaskPatch {
            link_url: Some(None),
            completed: Some(true),
            ..TaskPatch::default()
        };
        let body = task_patch_body(&patch).expect("encode");
        assert_eq!(
            Value::Object(body),
            json!({ "link_url": null, "completed": true })
        );
    }

    #[test]
    fn member_row_joins_profile_fields() {
        let row: MemberRow = serde_json::from_value(json!({
            "project_id": PROJECT,
            "user_id": USER,
            "role": "管理者",
            "profiles": { "nickname": "Aoi", "status_message": null },
        }))
        .expect("decode");
        let member = Member::from(row);
        assert_eq!(member.role, MemberRole::Admin);
        assert_eq!(member.nickname.as_deref(), Some("Aoi"));
    }

    #[test]
    fn sign_up_response_distinguishes_session_from_user() {
        let pending: SignUpResponseDto =
            serde_json::from_value(json!({ "id": USER, "email": "u@example.com" }))
                .expect("decode");
        assert!(matches!(pending, SignUpResponseDto::User(_)));

        let confirmed: SignUpResponseDto = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": { "id": USER },
        }))
        .expect("decode");
        assert!(matches!(confirmed, SignUpResponseDto::Session(_)));
    }

    #[test]
    fn session_expiry_falls_back_to_lifetime() {
        let dto: SessionDto = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 60,
            "user": { "id": USER },
        }))
        .expect("decode");
        let now = Utc::now();
        let session = dto.into_session(now);
        assert_eq!(session.expires_at(), now + TimeDelta::seconds(60));
    }

    #[rstest::rstest]
    #[case::beyond_time_delta(i64::MAX)]
    #[case::below_time_delta(i64::MIN)]
    #[case::past_max_datetime(9_000_000_000_000)]
    fn out_of_range_lifetime_uses_default(#[case] expires_in: i64) {
        let dto: SessionDto = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": expires_in,
            "user": { "id": USER },
        }))
        .expect("decode");
        let now = Utc::now();
        let session = dto.into_session(now);
        assert_eq!(
            session.expires_at(),
            now + TimeDelta::seconds(DEFAULT_EXPIRES_IN_SECONDS)
        );
    }

    #[test]
    fn error_body_picks_first_populated_field() {
        let body: ErrorBodyDto = serde_json::from_value(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials",
        }))
        .expect("decode");
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));

        let body: ErrorBodyDto =
            serde_json::from_value(json!({ "code": "22P02", "message": "invalid input syntax" }))
                .expect("decode");
        assert_eq!(body.into_message().as_deref(), Some("invalid input syntax"));
    }
}
