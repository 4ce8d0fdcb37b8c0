//! Task create, update and delete.

use tracing::{info, warn};

use super::{TeamBoard, View, invalid, next_sort_order, store_error};
use crate::domain::{
    BoardResult, Error, NewTask, Task, TaskDraft, TaskId, TaskPatch, TaskTitle, member_nickname,
};

impl TeamBoard {
    /// Replace the new-task form contents.
    pub fn set_task_draft(&mut self, draft: TaskDraft) -> BoardResult<()> {
        let workspace = self.main_mut()?;
        workspace.task_draft = TaskDraft {
            link_url: draft.link_url.filter(|link| !link.trim().is_empty()),
            ..draft
        };
        Ok(())
    }

    /// Create a task from the draft in the open project.
    ///
    /// The assignee defaults to the current user. On success the task is
    /// appended to the open list and the draft is cleared except for the
    /// assignee selection.
    pub async fn add_task(&mut self) -> BoardResult<Task> {
        let workspace = self.main()?;
        let view = workspace
            .project_view()
            .ok_or_else(|| Error::invalid_request("open a project first"))?;
        let draft = &workspace.task_draft;
        let new_task = NewTask {
            project_id: view.project.id,
            title: TaskTitle::new(&draft.title).map_err(invalid)?,
            assigned_to: draft.assignee.unwrap_or(workspace.user.id),
            due_date: draft.due_date,
            link_url: draft.link_url.clone(),
            sort_order: next_sort_order(view.open_tasks.len()),
        };
        let mut created = self.ports.tasks.insert(&new_task).await.map_err(store_error)?;
        info!(task = %created.id, project = %created.project_id, "task created");

        let open = self.main_mut()?;
        if let View::Project(view) = &mut open.view {
            if created.assignee_nickname.is_none() {
                created.assignee_nickname = created
                    .assigned_to
                    .as_ref()
                    .and_then(|assignee| member_nickname(&view.members, assignee))
                    .map(str::to_owned);
            }
            view.open_tasks.push(created.clone());
        }
        open.task_draft.clear_after_create();
        Ok(created)
    }

    /// Apply a partial update and reconcile the view with the stored row.
    ///
    /// The returned row replaces the local copy. When it no longer belongs
    /// to the view (for example because it was completed) the whole view is
    /// reloaded instead.
    pub async fn update_task(&mut self, id: &TaskId, patch: &TaskPatch) -> BoardResult<()> {
        if self.main()?.find_task(id).is_none() {
            return Err(Error::not_found("that task is not on screen"));
        }
        if patch.is_empty() {
            return Ok(());
        }
        let stored = self.ports.tasks.update(id, patch).await.map_err(store_error)?;
        if self.main_mut()?.apply_stored_task(stored) {
            return Ok(());
        }
        info!(task = %id, "task left the current view; reloading");
        self.reload_current_view().await
    }

    /// Mark a task completed. The view reloads so the task moves to the log.
    pub async fn complete_task(&mut self, id: &TaskId) -> BoardResult<()> {
        self.update_task(id, &TaskPatch::complete()).await
    }

    /// Delete a task after confirmation.
    ///
    /// The task leaves the local lists even when the remote delete fails;
    /// that failure is still returned. Returns `false` when the user
    /// declined.
    pub async fn delete_task(&mut self, id: &TaskId) -> BoardResult<bool> {
        let title = self
            .main()?
            .find_task(id)
            .map(|task| task.title.clone())
            .ok_or_else(|| Error::not_found("that task is not on screen"))?;
        if !self.ports.confirm.confirm(&format!("Delete \"{title}\"?")) {
            return Ok(false);
        }
        let removed = self.ports.tasks.delete(id).await.map_err(store_error);
        match &removed {
            Ok(()) => info!(task = %id, "task deleted"),
            Err(err) => warn!(task = %id, error = %err, "remote delete failed; removed locally"),
        }
        self.main_mut()?.remove_task(id);
        removed.map(|()| true)
    }
}
