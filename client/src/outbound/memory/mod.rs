//! In-memory backend for tests.
//!
//! [`InMemoryBackend`] implements the auth gateway and every table port
//! over a single mutex-guarded state, applying the same filters, joins and
//! ordering as the hosted tables. Tests seed rows directly and inspect the
//! recorded writes afterwards.

mod auth;
mod tables;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{
    AuthEvent, MemberRole, NewTask, Profile, Project, ProjectId, Session, Task, TaskId, TaskPatch,
    UserId,
};

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    password: String,
    confirmed: bool,
    pending_code: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Membership {
    project_id: ProjectId,
    user_id: UserId,
    role: MemberRole,
}

#[derive(Debug)]
struct State {
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    profiles: Vec<Profile>,
    projects: Vec<Project>,
    memberships: Vec<Membership>,
    tasks: Vec<Task>,
    task_updates: Vec<(TaskId, TaskPatch)>,
    clock: DateTime<Utc>,
    issued_tokens: u64,
    require_confirmation: bool,
    fail_next_task_delete: bool,
    failing_counts: HashSet<UserId>,
}

impl State {
    /// Advance the store clock; every write gets a distinct timestamp.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += Duration::seconds(1);
        self.clock
    }

    fn nickname_of(&self, user: Option<&UserId>) -> Option<String> {
        let id = user?;
        self.profiles
            .iter()
            .find(|profile| &profile.id == id)
            .and_then(|profile| profile.nickname.as_ref())
            .map(|nickname| nickname.as_str().to_owned())
    }

    /// Task row with the assignee nickname embedded.
    fn joined(&self, task: &Task) -> Task {
        Task {
            assignee_nickname: self.nickname_of(task.assigned_to.as_ref()),
            ..task.clone()
        }
    }
}

/// Backend double holding every table and the auth session in memory.
#[derive(Debug)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Empty backend that confirms sign-ups immediately.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(State {
                accounts: HashMap::new(),
                session: None,
                profiles: Vec::new(),
                projects: Vec::new(),
                memberships: Vec::new(),
                tasks: Vec::new(),
                task_updates: Vec::new(),
                clock: Utc::now(),
                issued_tokens: 0,
                require_confirmation: false,
                fail_next_task_delete: false,
                failing_counts: HashSet::new(),
            }),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: AuthEvent) {
        if self.events.send(event).is_err() {
            debug!("auth event dropped: no listeners");
        }
    }

    /// Make sign-up email a confirmation code instead of signing in.
    pub fn require_confirmation(&self, required: bool) {
        self.lock().require_confirmation = required;
    }

    /// Create a confirmed account and return its user id.
    #[must_use]
    pub fn register_user(&self, email: &str, password: &str) -> UserId {
        let id = UserId::random();
        self.lock().accounts.insert(
            email.to_owned(),
            Account {
                id,
                password: password.to_owned(),
                confirmed: true,
                pending_code: None,
            },
        );
        id
    }

    /// Code emailed for a pending sign-up.
    #[must_use]
    pub fn confirmation_code(&self, email: &str) -> Option<String> {
        self.lock()
            .accounts
            .get(email)
            .and_then(|account| account.pending_code.clone())
    }

    /// Insert or replace a profile row.
    pub fn seed_profile(&self, profile: Profile) {
        let mut state = self.lock();
        state.profiles.retain(|existing| existing.id != profile.id);
        state.profiles.push(profile);
    }

    /// Insert a project row and return its id.
    #[must_use]
    pub fn seed_project(&self, name: &str, sort_order: i32) -> ProjectId {
        let id = ProjectId::random();
        self.lock().projects.push(Project {
            id,
            name: name.to_owned(),
            sort_order,
            deleted_at: None,
        });
        id
    }

    /// Insert a membership row.
    pub fn seed_membership(&self, project_id: ProjectId, user_id: UserId, role: MemberRole) {
        self.lock().memberships.push(Membership {
            project_id,
            user_id,
            role,
        });
    }

    /// Insert a task row, optionally already completed.
    #[expect(
        clippy::must_use_candidate,
        reason = "fixtures often seed rows without needing the id"
    )]
    pub fn seed_task(&self, task: &NewTask, completed: bool) -> TaskId {
        let mut state = self.lock();
        let updated_at = state.tick();
        let id = TaskId::random();
        state.tasks.push(Task {
            id,
            project_id: task.project_id,
            title: task.title.as_str().to_owned(),
            assigned_to: Some(task.assigned_to),
            assignee_nickname: None,
            project_name: None,
            due_date: task.due_date,
            link_url: task.link_url.clone(),
            sort_order: task.sort_order,
            completed,
            deleted_at: None,
            updated_at: Some(updated_at),
            subtasks: Vec::new(),
        });
        id
    }

    /// Snapshot of the `todos` table.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    /// Snapshot of the `projects` table, soft-deleted rows included.
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        self.lock().projects.clone()
    }

    /// Role of `user` in `project`, if a member.
    #[must_use]
    pub fn role_of(&self, project: &ProjectId, user: &UserId) -> Option<MemberRole> {
        self.lock()
            .memberships
            .iter()
            .find(|row| &row.project_id == project && &row.user_id == user)
            .map(|row| row.role)
    }

    /// Every task patch received, in order.
    #[must_use]
    pub fn task_updates(&self) -> Vec<(TaskId, TaskPatch)> {
        self.lock().task_updates.clone()
    }

    /// Make the next task delete fail with a transport error.
    pub fn fail_next_task_delete(&self) {
        self.lock().fail_next_task_delete = true;
    }

    /// Make completion counts for `user` fail.
    pub fn fail_counts_for(&self, user: UserId) {
        self.lock().failing_counts.insert(user);
    }

    /// Age the current access token so the next use refreshes it.
    pub fn expire_session(&self) {
        let mut state = self.lock();
        let past = state.clock - Duration::hours(1);
        if let Some(current) = state.session.take() {
            state.session = Some(Session::new(
                current.user().clone(),
                current.access_token(),
                current.refresh_token(),
                past,
            ));
        }
    }
}
