//! Table ports implemented over the data API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;

use super::client::{SupabaseClient, single_row};
use super::dto::{
    MemberRow, MembershipBody, MembershipIdRow, ProfileBody, ProfileRow, ProjectBody, ProjectRow,
    SoftDeleteBody, TaskBody, TaskRow, task_patch_body,
};
use super::query::{Direction, RestQuery};
use crate::domain::ports::{
    MembershipRepository, ProfileRepository, ProjectRepository, RemoteStoreError, TaskRepository,
};
use crate::domain::{
    Member, NewMembership, NewProject, NewTask, Profile, ProfileUpdate, Project, ProjectId, Task,
    TaskId, TaskPatch, UserId,
};

const PROFILES: &str = "profiles";
const PROJECTS: &str = "projects";
const MEMBERS: &str = "project_members";
const TODOS: &str = "todos";

/// Task columns plus the assignee's nickname.
const TASK_COLUMNS: &str = "*,profiles:assigned_to(nickname)";
/// Task columns plus assignee nickname and owning project name.
const MY_TASK_COLUMNS: &str = "*,profiles:assigned_to(nickname),projects!inner(name)";
const MEMBER_COLUMNS: &str = "*,profiles(nickname,status_message)";

const RETURN_ROWS: &str = "return=representation";
const RETURN_NOTHING: &str = "return=minimal";
const UPSERT: &str = "resolution=merge-duplicates,return=minimal";

fn tasks_from(rows: Vec<TaskRow>) -> Vec<Task> {
    rows.into_iter().map(Task::from).collect()
}

#[async_trait]
impl ProfileRepository for SupabaseClient {
    async fn find(&self, id: &UserId) -> Result<Option<Profile>, RemoteStoreError> {
        let query = RestQuery::table(PROFILES).select("*").eq("id", id).limit(1);
        let rows: Vec<ProfileRow> = self.select(&query).await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    async fn upsert(&self, update: &ProfileUpdate) -> Result<(), RemoteStoreError> {
        let request = self
            .rest_request(Method::POST, &RestQuery::table(PROFILES), Some(UPSERT))
            .await?
            .json(&ProfileBody::from(update));
        self.send_rest(request).await.map(drop)
    }

    async fn list(&self, limit: usize) -> Result<Vec<Profile>, RemoteStoreError> {
        let query = RestQuery::table(PROFILES).select("*").limit(limit);
        let rows: Vec<ProfileRow> = self.select(&query).await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }
}

#[async_trait]
impl ProjectRepository for SupabaseClient {
    async fn list_active(&self, ids: &[ProjectId]) -> Result<Vec<Project>, RemoteStoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = RestQuery::table(PROJECTS)
            .select("*")
            .in_list("id", ids)
            .is_null("deleted_at")
            .order("sort_order", Direction::Asc);
        let rows: Vec<ProjectRow> = self.select(&query).await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn create(&self, project: &NewProject) -> Result<Project, RemoteStoreError> {
        let query = RestQuery::table(PROJECTS).select("*");
        let request = self
            .rest_request(Method::POST, &query, Some(RETURN_ROWS))
            .await?
            .json(&ProjectBody::from(project));
        let body = self.send_rest(request).await?;
        single_row::<ProjectRow>(&body, "created project").map(Project::from)
    }

    async fn soft_delete(&self, id: &ProjectId, at: DateTime<Utc>) -> Result<(), RemoteStoreError> {
        let query = RestQuery::table(PROJECTS).eq("id", id);
        let request = self
            .rest_request(Method::PATCH, &query, Some(RETURN_NOTHING))
            .await?
            .json(&SoftDeleteBody { deleted_at: at });
        self.send_rest(request).await.map(drop)
    }
}

#[async_trait]
impl MembershipRepository for SupabaseClient {
    async fn project_ids_for_user(&self, user: &UserId) -> Result<Vec<ProjectId>, RemoteStoreError> {
        let query = RestQuery::table(MEMBERS)
            .select("project_id")
            .eq("user_id", user);
        let rows: Vec<MembershipIdRow> = self.select(&query).await?;
        Ok(rows.into_iter().map(|row| row.project_id).collect())
    }

    async fn add(&self, membership: &NewMembership) -> Result<(), RemoteStoreError> {
        let request = self
            .rest_request(Method::POST, &RestQuery::table(MEMBERS), Some(RETURN_NOTHING))
            .await?
            .json(&MembershipBody::from(membership));
        self.send_rest(request).await.map(drop)
    }

    async fn list_for_project(&self, project: &ProjectId) -> Result<Vec<Member>, RemoteStoreError> {
        let query = RestQuery::table(MEMBERS)
            .select(MEMBER_COLUMNS)
            .eq("project_id", project);
        let rows: Vec<MemberRow> = self.select(&query).await?;
        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn remove(&self, project: &ProjectId, user: &UserId) -> Result<(), RemoteStoreError> {
        let query = RestQuery::table(MEMBERS)
            .eq("project_id", project)
            .eq("user_id", user);
        let request = self
            .rest_request(Method::DELETE, &query, Some(RETURN_NOTHING))
            .await?;
        self.send_rest(request).await.map(drop)
    }
}

#[async_trait]
impl TaskRepository for SupabaseClient {
    async fn list_open_in_project(&self, project: &ProjectId) -> Result<Vec<Task>, RemoteStoreError> {
        let query = RestQuery::table(TODOS)
            .select(TASK_COLUMNS)
            .eq("project_id", project)
            .eq("completed", false)
            .is_null("deleted_at")
            .order("sort_order", Direction::Asc);
        self.select(&query).await.map(tasks_from)
    }

    async fn list_recently_completed(
        &self,
        project: &ProjectId,
        limit: usize,
    ) -> Result<Vec<Task>, RemoteStoreError> {
        let query = RestQuery::table(TODOS)
            .select(TASK_COLUMNS)
            .eq("project_id", project)
            .eq("completed", true)
            .is_null("deleted_at")
            .order("updated_at", Direction::Desc)
            .limit(limit);
        self.select(&query).await.map(tasks_from)
    }

    async fn list_open_assigned_to(&self, user: &UserId) -> Result<Vec<Task>, RemoteStoreError> {
        let query = RestQuery::table(TODOS)
            .select(MY_TASK_COLUMNS)
            .eq("assigned_to", user)
            .eq("completed", false)
            .is_null("deleted_at")
            .order("due_date", Direction::Asc);
        self.select(&query).await.map(tasks_from)
    }

    async fn insert(&self, task: &NewTask) -> Result<Task, RemoteStoreError> {
        let query = RestQuery::table(TODOS).select(TASK_COLUMNS);
        let request = self
            .rest_request(Method::POST, &query, Some(RETURN_ROWS))
            .await?
            .json(&TaskBody::from(task));
        let body = self.send_rest(request).await?;
        single_row::<TaskRow>(&body, "created task").map(Task::from)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteStoreError> {
        let changes =
            task_patch_body(patch).map_err(|err| RemoteStoreError::rejected(err.to_string()))?;
        let query = RestQuery::table(TODOS).select(TASK_COLUMNS).eq("id", id);
        let request = self
            .rest_request(Method::PATCH, &query, Some(RETURN_ROWS))
            .await?
            .json(&changes);
        let body = self.send_rest(request).await?;
        single_row::<TaskRow>(&body, "updated task").map(Task::from)
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RemoteStoreError> {
        let query = RestQuery::table(TODOS).eq("id", id);
        let request = self
            .rest_request(Method::DELETE, &query, Some(RETURN_NOTHING))
            .await?;
        self.send_rest(request).await.map(drop)
    }

    async fn count_completed_assigned_to(&self, user: &UserId) -> Result<u64, RemoteStoreError> {
        let query = RestQuery::table(TODOS)
            .select("id")
            .eq("assigned_to", user)
            .eq("completed", true)
            .is_null("deleted_at");
        self.count(&query).await
    }
}
