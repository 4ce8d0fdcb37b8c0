//! Table ports over in-memory rows.

use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{InMemoryBackend, Membership};
use crate::domain::ports::{
    MembershipRepository, ProfileRepository, ProjectRepository, RemoteStoreError, TaskRepository,
};
use crate::domain::{
    Member, NewMembership, NewProject, NewTask, Profile, ProfileUpdate, Project, ProjectId, Task,
    TaskId, TaskPatch, UserId,
};

#[async_trait]
impl ProfileRepository for InMemoryBackend {
    async fn find(&self, id: &UserId) -> Result<Option<Profile>, RemoteStoreError> {
        Ok(self
            .lock()
            .profiles
            .iter()
            .find(|profile| &profile.id == id)
            .cloned())
    }

    async fn upsert(&self, update: &ProfileUpdate) -> Result<(), RemoteStoreError> {
        self.seed_profile(Profile {
            id: update.id,
            nickname: Some(update.nickname.clone()),
            status_message: update.status_message.clone(),
        });
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Profile>, RemoteStoreError> {
        Ok(self.lock().profiles.iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryBackend {
    async fn list_active(&self, ids: &[ProjectId]) -> Result<Vec<Project>, RemoteStoreError> {
        let mut found: Vec<Project> = self
            .lock()
            .projects
            .iter()
            .filter(|project| ids.contains(&project.id) && !project.is_deleted())
            .cloned()
            .collect();
        found.sort_by_key(|project| project.sort_order);
        Ok(found)
    }

    async fn create(&self, project: &NewProject) -> Result<Project, RemoteStoreError> {
        let created = Project {
            id: ProjectId::random(),
            name: project.name().to_owned(),
            sort_order: project.sort_order(),
            deleted_at: None,
        };
        self.lock().projects.push(created.clone());
        Ok(created)
    }

    async fn soft_delete(&self, id: &ProjectId, at: DateTime<Utc>) -> Result<(), RemoteStoreError> {
        let mut state = self.lock();
        let project = state
            .projects
            .iter_mut()
            .find(|project| &project.id == id)
            .ok_or_else(|| RemoteStoreError::not_found(format!("project {id}")))?;
        project.deleted_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for InMemoryBackend {
    async fn project_ids_for_user(&self, user: &UserId) -> Result<Vec<ProjectId>, RemoteStoreError> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .filter(|row| &row.user_id == user)
            .map(|row| row.project_id)
            .collect())
    }

    async fn add(&self, membership: &NewMembership) -> Result<(), RemoteStoreError> {
        let code = membership.project.as_str();
        let project_id = ProjectId::new(code).map_err(|_| {
            RemoteStoreError::rejected(format!("invalid input syntax for type uuid: \"{code}\""))
        })?;
        let mut state = self.lock();
        if !state.projects.iter().any(|project| project.id == project_id) {
            return Err(RemoteStoreError::rejected(
                "insert or update on table \"project_members\" violates foreign key constraint",
            ));
        }
        if state
            .memberships
            .iter()
            .any(|row| row.project_id == project_id && row.user_id == membership.user_id)
        {
            return Err(RemoteStoreError::rejected(
                "duplicate key value violates unique constraint \"project_members_pkey\"",
            ));
        }
        state.memberships.push(Membership {
            project_id,
            user_id: membership.user_id,
            role: membership.role,
        });
        Ok(())
    }

    async fn list_for_project(&self, project: &ProjectId) -> Result<Vec<Member>, RemoteStoreError> {
        let state = self.lock();
        Ok(state
            .memberships
            .iter()
            .filter(|row| &row.project_id == project)
            .map(|row| {
                let profile = state.profiles.iter().find(|found| found.id == row.user_id);
                Member {
                    project_id: row.project_id,
                    user_id: row.user_id,
                    role: row.role,
                    nickname: profile
                        .and_then(|found| found.nickname.as_ref())
                        .map(|nickname| nickname.as_str().to_owned()),
                    status_message: profile.and_then(|found| found.status_message.clone()),
                }
            })
            .collect())
    }

    async fn remove(&self, project: &ProjectId, user: &UserId) -> Result<(), RemoteStoreError> {
        self.lock()
            .memberships
            .retain(|row| !(&row.project_id == project && &row.user_id == user));
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for InMemoryBackend {
    async fn list_open_in_project(&self, project: &ProjectId) -> Result<Vec<Task>, RemoteStoreError> {
        let state = self.lock();
        let mut open: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| &task.project_id == project && task.is_open())
            .map(|task| state.joined(task))
            .collect();
        open.sort_by_key(|task| task.sort_order);
        Ok(open)
    }

    async fn list_recently_completed(
        &self,
        project: &ProjectId,
        limit: usize,
    ) -> Result<Vec<Task>, RemoteStoreError> {
        let state = self.lock();
        let mut done: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| {
                &task.project_id == project && task.completed && task.deleted_at.is_none()
            })
            .map(|task| state.joined(task))
            .collect();
        done.sort_by_key(|task| Reverse(task.updated_at));
        done.truncate(limit);
        Ok(done)
    }

    async fn list_open_assigned_to(&self, user: &UserId) -> Result<Vec<Task>, RemoteStoreError> {
        let state = self.lock();
        let mut mine: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| task.assigned_to.as_ref() == Some(user) && task.is_open())
            .filter_map(|task| {
                // Inner join: rows whose project is gone are dropped.
                let project = state
                    .projects
                    .iter()
                    .find(|project| project.id == task.project_id)?;
                Some(Task {
                    project_name: Some(project.name.clone()),
                    ..state.joined(task)
                })
            })
            .collect();
        // Ascending with nulls last.
        mine.sort_by_key(|task| (task.due_date.is_none(), task.due_date));
        Ok(mine)
    }

    async fn insert(&self, task: &NewTask) -> Result<Task, RemoteStoreError> {
        let mut state = self.lock();
        let updated_at = state.tick();
        let created = Task {
            id: TaskId::random(),
            project_id: task.project_id,
            title: task.title.as_str().to_owned(),
            assigned_to: Some(task.assigned_to),
            assignee_nickname: None,
            project_name: None,
            due_date: task.due_date,
            link_url: task.link_url.clone(),
            sort_order: task.sort_order,
            completed: false,
            deleted_at: None,
            updated_at: Some(updated_at),
            subtasks: Vec::new(),
        };
        state.tasks.push(created.clone());
        Ok(state.joined(&created))
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteStoreError> {
        let mut state = self.lock();
        let updated_at = state.tick();
        let row = state
            .tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| RemoteStoreError::not_found(format!("task {id}")))?;
        patch.apply_to(row);
        row.updated_at = Some(updated_at);
        let stored = row.clone();
        state.task_updates.push((*id, patch.clone()));
        Ok(state.joined(&stored))
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RemoteStoreError> {
        let mut state = self.lock();
        if state.fail_next_task_delete {
            state.fail_next_task_delete = false;
            return Err(RemoteStoreError::transport("connection reset"));
        }
        state.tasks.retain(|task| &task.id != id);
        Ok(())
    }

    async fn count_completed_assigned_to(&self, user: &UserId) -> Result<u64, RemoteStoreError> {
        let state = self.lock();
        if state.failing_counts.contains(user) {
            return Err(RemoteStoreError::transport("count timed out"));
        }
        let count = state
            .tasks
            .iter()
            .filter(|task| {
                task.assigned_to.as_ref() == Some(user)
                    && task.completed
                    && task.deleted_at.is_none()
            })
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}
