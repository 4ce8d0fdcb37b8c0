//! Tasks, their embedded subtasks and the form drafts that create them.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ProjectId, TaskId, UserId};

/// Validation errors for task inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Task title was blank.
    EmptyTitle,
    /// Subtask position (1-based) does not exist on the task.
    SubtaskOutOfRange {
        /// Requested 1-based position.
        position: usize,
        /// Number of subtasks on the task.
        len: usize,
    },
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::SubtaskOutOfRange { position, len } => {
                write!(f, "subtask {position} does not exist (task has {len})")
            }
        }
    }
}

impl std::error::Error for TaskValidationError {}

/// Checklist item embedded in a task. Identified only by its position.
///
/// The serialised form is the JSON object stored in the `subtasks` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Checklist text.
    pub text: String,
    /// Whether the item is ticked.
    #[serde(default)]
    pub completed: bool,
    /// Assignee, if any.
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    /// Due day.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Related link.
    #[serde(default)]
    pub link_url: Option<String>,
}

/// A task as mirrored from the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Row id.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Title, stored in the `text` column.
    pub title: String,
    /// Assignee, if any.
    pub assigned_to: Option<UserId>,
    /// Joined from the assignee's profile.
    pub assignee_nickname: Option<String>,
    /// Joined from the owning project; only requested for my-tasks.
    pub project_name: Option<String>,
    /// Due day.
    pub due_date: Option<NaiveDate>,
    /// Related link.
    pub link_url: Option<String>,
    /// Position in the open list, ascending.
    pub sort_order: i32,
    /// Completed tasks move to the project log.
    pub completed: bool,
    /// Soft-delete time.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Last write, used to order the log.
    pub updated_at: Option<DateTime<Utc>>,
    /// Checklist in display order.
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Whether the task belongs in an open-task list.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.completed && self.deleted_at.is_none()
    }

    /// Number of completed subtasks.
    #[must_use]
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|sub| sub.completed).count()
    }

    /// Copy joined columns the stored row came back without.
    ///
    /// Update responses do not carry embeds, so the nickname and project
    /// name already on screen are kept unless the assignee changed.
    pub fn inherit_joins(&mut self, previous: &Self) {
        if self.project_name.is_none() {
            self.project_name.clone_from(&previous.project_name);
        }
        if self.assignee_nickname.is_none() && self.assigned_to == previous.assigned_to {
            self.assignee_nickname.clone_from(&previous.assignee_nickname);
        }
    }
}

/// Non-empty, trimmed task title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Trim `raw`; blank titles are rejected.
    pub fn new(raw: &str) -> Result<Self, TaskValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The trimmed title.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values for a task insert. New tasks start with an empty subtask list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Owning project.
    pub project_id: ProjectId,
    /// Validated title.
    pub title: TaskTitle,
    /// Assignee; the creator when none was picked.
    pub assigned_to: UserId,
    /// Due day.
    pub due_date: Option<NaiveDate>,
    /// Related link.
    pub link_url: Option<String>,
    /// Placed after the current open tasks.
    pub sort_order: i32,
}

/// Partial update of a task row.
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable
/// column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<TaskTitle>,
    /// New assignee, or cleared.
    pub assigned_to: Option<Option<UserId>>,
    /// New due day, or cleared.
    pub due_date: Option<Option<NaiveDate>>,
    /// New link, or cleared.
    pub link_url: Option<Option<String>>,
    /// Completion flag.
    pub completed: Option<bool>,
    /// Whole replacement checklist.
    pub subtasks: Option<Vec<Subtask>>,
}

impl TaskPatch {
    /// Mark the task completed.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            completed: Some(true),
            ..Self::default()
        }
    }

    /// Replace the whole subtask list.
    #[must_use]
    pub fn subtasks(list: Vec<Subtask>) -> Self {
        Self {
            subtasks: Some(list),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.assigned_to.is_none()
            && self.due_date.is_none()
            && self.link_url.is_none()
            && self.completed.is_none()
            && self.subtasks.is_none()
    }

    /// Apply the patch to a local copy, as the remote store would.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.as_str().to_owned();
        }
        if let Some(assignee) = self.assigned_to {
            if task.assigned_to != assignee {
                task.assignee_nickname = None;
            }
            task.assigned_to = assignee;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(link) = &self.link_url {
            task.link_url.clone_from(link);
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(subtasks) = &self.subtasks {
            task.subtasks.clone_from(subtasks);
        }
    }
}

/// New-task form state held while a project is open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    /// Title as typed.
    pub title: String,
    /// Due day, if set.
    pub due_date: Option<NaiveDate>,
    /// Link, if set.
    pub link_url: Option<String>,
    /// Selected assignee; `None` means the current user.
    pub assignee: Option<UserId>,
}

impl TaskDraft {
    /// Reset after a successful create. The assignee selection survives.
    pub fn clear_after_create(&mut self) {
        self.title.clear();
        self.due_date = None;
        self.link_url = None;
    }
}

/// Pending subtask input for one task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubtaskDraft {
    /// Text as typed.
    pub text: String,
    /// Selected assignee; `None` means the current user.
    pub assignee: Option<UserId>,
    /// Due day, if set.
    pub due_date: Option<NaiveDate>,
    /// Link, if set.
    pub link_url: Option<String>,
}

impl SubtaskDraft {
    /// Turn the draft into a subtask, or `None` when the text is blank.
    #[must_use]
    pub fn to_subtask(&self, default_assignee: UserId) -> Option<Subtask> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Subtask {
            text: text.to_owned(),
            completed: false,
            assigned_to: Some(self.assignee.unwrap_or(default_assignee)),
            due_date: self.due_date,
            link_url: self.link_url.clone().filter(|link| !link.trim().is_empty()),
        })
    }
}

/// Subtask drafts keyed by parent task, so each task keeps its own input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubtaskDrafts(HashMap<TaskId, SubtaskDraft>);

impl SubtaskDrafts {
    /// Draft for `task`, if one was started.
    #[must_use]
    pub fn get(&self, task: &TaskId) -> Option<&SubtaskDraft> {
        self.0.get(task)
    }

    /// Replace the draft for `task`.
    pub fn set(&mut self, task: TaskId, draft: SubtaskDraft) {
        self.0.insert(task, draft);
    }

    /// Forget the draft for `task`.
    pub fn clear(&mut self, task: &TaskId) {
        self.0.remove(task);
    }
}
