//! Screen state machine mirrored by the shell.
//!
//! One [`Screen`] value replaces the loose flags a UI would otherwise keep,
//! so states such as "my tasks with a project selected" cannot be expressed.

use crate::domain::{
    AuthMode, AuthUser, Member, MemberRole, Profile, Project, RankingEntry, SubtaskDrafts, Task,
    TaskDraft, TaskId, member_nickname,
};

/// Top-level screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Session not resolved yet.
    Loading,
    /// No session; the auth form is shown.
    SignedOut(AuthScreen),
    /// Signed in but the profile has no nickname.
    ProfileSetup(ProfileSetup),
    /// Main app.
    Main(Box<Workspace>),
}

impl Screen {
    /// Fresh auth screen in login mode.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::SignedOut(AuthScreen::default())
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::ProfileSetup(setup) => Some(&setup.user),
            Self::Main(workspace) => Some(&workspace.user),
            Self::Loading | Self::SignedOut(_) => None,
        }
    }
}

/// Auth form state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthScreen {
    /// Whether the form signs in or signs up.
    pub mode: AuthMode,
    /// Informational message, e.g. after a confirmation email was sent.
    pub notice: Option<String>,
}

/// Profile setup form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSetup {
    /// Signed-in user the profile belongs to.
    pub user: AuthUser,
    /// Profile row without a nickname, when one exists.
    pub existing: Option<Profile>,
}

/// Project detail tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectTab {
    /// Open tasks and the new-task form.
    #[default]
    Tasks,
    /// Recently completed tasks.
    Log,
    /// Member list with roles.
    Members,
    /// Invite code and project deletion.
    Settings,
}

/// Loaded project detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectView {
    /// Project row.
    pub project: Project,
    /// Selected tab.
    pub tab: ProjectTab,
    /// Incomplete tasks by `sort_order`.
    pub open_tasks: Vec<Task>,
    /// Newest completed tasks first.
    pub completed_log: Vec<Task>,
    /// Members with their joined profiles.
    pub members: Vec<Member>,
}

impl ProjectView {
    /// Whether `user` holds the admin role here.
    #[must_use]
    pub fn is_admin(&self, user: &AuthUser) -> bool {
        self.members
            .iter()
            .any(|member| member.user_id == user.id && member.role == MemberRole::Admin)
    }
}

/// Open tasks assigned to the current user across projects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MyTasksView {
    /// Soonest due first.
    pub tasks: Vec<Task>,
}

/// Main-area content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Nothing selected.
    Welcome,
    /// One project's detail.
    Project(ProjectView),
    /// Tasks assigned to the current user.
    MyTasks(MyTasksView),
    /// Leaderboard, highest completed count first.
    Ranking(Vec<RankingEntry>),
    /// Profile editor.
    Profile,
}

/// Everything held while the main app is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Signed-in user.
    pub user: AuthUser,
    /// The user's completed profile.
    pub profile: Profile,
    /// Projects the user belongs to, by `sort_order`.
    pub projects: Vec<Project>,
    /// Main-area content.
    pub view: View,
    /// Whether the project sidebar is expanded.
    pub sidebar_open: bool,
    /// New-task form input.
    pub task_draft: TaskDraft,
    /// Subtask form input per parent task.
    pub subtask_drafts: SubtaskDrafts,
}

impl Workspace {
    /// Workspace showing the welcome view.
    #[must_use]
    pub fn new(user: AuthUser, profile: Profile, projects: Vec<Project>) -> Self {
        Self {
            user,
            profile,
            projects,
            view: View::Welcome,
            sidebar_open: false,
            task_draft: TaskDraft::default(),
            subtask_drafts: SubtaskDrafts::default(),
        }
    }

    /// Replace the view, closing the sidebar and dropping per-view drafts.
    pub fn switch_view(&mut self, view: View) {
        self.view = view;
        self.sidebar_open = false;
        self.task_draft = TaskDraft::default();
        self.subtask_drafts = SubtaskDrafts::default();
    }

    /// The open project detail, if one is shown.
    #[must_use]
    pub const fn project_view(&self) -> Option<&ProjectView> {
        match &self.view {
            View::Project(view) => Some(view),
            _ => None,
        }
    }

    /// Tasks that can be acted on in the current view.
    #[must_use]
    pub fn visible_tasks(&self) -> &[Task] {
        match &self.view {
            View::Project(view) => &view.open_tasks,
            View::MyTasks(view) => &view.tasks,
            View::Welcome | View::Ranking(_) | View::Profile => &[],
        }
    }

    /// Visible task with `id`.
    #[must_use]
    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.visible_tasks().iter().find(|task| &task.id == id)
    }

    /// Drop a task from every local list.
    pub fn remove_task(&mut self, id: &TaskId) {
        match &mut self.view {
            View::Project(view) => {
                view.open_tasks.retain(|task| &task.id != id);
                view.completed_log.retain(|task| &task.id != id);
            }
            View::MyTasks(view) => view.tasks.retain(|task| &task.id != id),
            View::Welcome | View::Ranking(_) | View::Profile => {}
        }
        self.subtask_drafts.clear(id);
    }

    /// Replace the local copy of a task with the row the store returned.
    ///
    /// Returns `false` when the row no longer belongs to the current view
    /// (completed, deleted, moved or reassigned away) or is not on screen;
    /// the caller then reloads the view.
    pub fn apply_stored_task(&mut self, stored: Task) -> bool {
        let user = self.user.id;
        match &mut self.view {
            View::Project(view) => {
                if !stored.is_open() || stored.project_id != view.project.id {
                    return false;
                }
                let members = &view.members;
                replace_by_id(&mut view.open_tasks, stored, |task| {
                    if task.assignee_nickname.is_none() {
                        task.assignee_nickname = task
                            .assigned_to
                            .as_ref()
                            .and_then(|assignee| member_nickname(members, assignee))
                            .map(str::to_owned);
                    }
                })
            }
            View::MyTasks(view) => {
                if !stored.is_open() || stored.assigned_to != Some(user) {
                    return false;
                }
                replace_by_id(&mut view.tasks, stored, |_| {})
            }
            View::Welcome | View::Ranking(_) | View::Profile => true,
        }
    }
}

fn replace_by_id(list: &mut [Task], mut stored: Task, fill: impl FnOnce(&mut Task)) -> bool {
    let Some(slot) = list.iter_mut().find(|task| task.id == stored.id) else {
        return false;
    };
    stored.inherit_joins(slot);
    fill(&mut stored);
    *slot = stored;
    true
}
