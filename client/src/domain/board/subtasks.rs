//! Subtask edits. Every change rewrites the task's whole subtask list.

use super::TeamBoard;
use crate::domain::{
    BoardResult, Error, Subtask, SubtaskDraft, TaskId, TaskPatch, TaskValidationError,
};

impl TeamBoard {
    /// Store the pending subtask input for one task.
    pub fn set_subtask_draft(&mut self, task: TaskId, draft: SubtaskDraft) -> BoardResult<()> {
        self.main_mut()?.subtask_drafts.set(task, draft);
        Ok(())
    }

    /// Append the task's draft as a new subtask.
    ///
    /// A missing or blank draft is a no-op and returns `false` without
    /// touching the store. After a successful write only this task's draft
    /// is cleared.
    pub async fn add_subtask(&mut self, task: &TaskId) -> BoardResult<bool> {
        let workspace = self.main()?;
        let Some(subtask) = workspace
            .subtask_drafts
            .get(task)
            .and_then(|draft| draft.to_subtask(workspace.user.id))
        else {
            return Ok(false);
        };
        let mut list = self.current_subtasks(task)?;
        list.push(subtask);
        self.update_task(task, &TaskPatch::subtasks(list)).await?;
        self.main_mut()?.subtask_drafts.clear(task);
        Ok(true)
    }

    /// Flip completion of the subtask at `index` (0-based).
    pub async fn toggle_subtask(&mut self, task: &TaskId, index: usize) -> BoardResult<()> {
        let mut list = self.current_subtasks(task)?;
        let len = list.len();
        let Some(subtask) = list.get_mut(index) else {
            return Err(Error::invalid_request(
                TaskValidationError::SubtaskOutOfRange {
                    position: index.saturating_add(1),
                    len,
                }
                .to_string(),
            ));
        };
        subtask.completed = !subtask.completed;
        self.update_task(task, &TaskPatch::subtasks(list)).await
    }

    fn current_subtasks(&self, task: &TaskId) -> BoardResult<Vec<Subtask>> {
        self.main()?
            .find_task(task)
            .map(|found| found.subtasks.clone())
            .ok_or_else(|| Error::not_found("that task is not on screen"))
    }
}
