//! Interactive line shell driving a [`TeamBoard`].
//!
//! Each line is tokenised, parsed into a [`command::Command`] and dispatched
//! to one board operation. Auth events published since the previous line
//! are applied first, and the screen is rendered after every command.

mod command;
mod error;
mod render;
mod tokenize;

use std::io::{self, BufRead, Write};

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

pub use self::error::ShellError;
use self::command::{Command, ItemFields, help_text};
use crate::domain::board::{TeamBoard, Workspace};
use crate::domain::ports::ConfirmPrompt;
use crate::domain::{
    AuthEvent, Error, SubtaskDraft, TaskDraft, TaskId, TaskPatch, TaskTitle, UserId,
};

/// Whether the shell should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop the loop.
    Quit,
}

/// Read-eval-render loop over any line source and sink.
pub struct Shell<R, W> {
    board: TeamBoard,
    events: broadcast::Receiver<AuthEvent>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Wrap a board; auth events are collected from this point on.
    pub fn new(board: TeamBoard, input: R, output: W) -> Self {
        let events = board.subscribe();
        Self {
            board,
            events,
            input,
            output,
        }
    }

    /// The board being driven.
    #[must_use]
    pub const fn board(&self) -> &TeamBoard {
        &self.board
    }

    /// Resolve the stored session, then process lines until `quit` or end
    /// of input.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Io`] when the terminal cannot be read or
    /// written. Command failures are printed and do not end the loop.
    pub async fn run(&mut self) -> Result<(), ShellError> {
        let started = self.board.start().await;
        self.report(started.map(|()| Flow::Continue).map_err(ShellError::from))?;
        self.render()?;
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let outcome = self.execute(&line).await;
            if self.report(outcome)? == Flow::Quit {
                break;
            }
            self.render()?;
        }
        Ok(())
    }

    /// Apply pending auth events, then run one line.
    ///
    /// # Errors
    ///
    /// Returns the tokeniser, parser or board failure for this line.
    pub async fn execute(&mut self, line: &str) -> Result<Flow, ShellError> {
        self.drain_events().await?;
        let words = tokenize::tokenize(line)?;
        if words.is_empty() {
            return Ok(Flow::Continue);
        }
        let parsed = command::parse(&words)?;
        self.dispatch(parsed).await
    }

    /// Render the current screen to the output.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Io`] when writing fails.
    pub fn render(&mut self) -> Result<(), ShellError> {
        render::render(self.board.screen(), &mut self.output)?;
        Ok(())
    }

    /// Print a command failure; only I/O failures propagate.
    fn report(&mut self, outcome: Result<Flow, ShellError>) -> Result<Flow, ShellError> {
        match outcome {
            Ok(flow) => Ok(flow),
            Err(err @ ShellError::Io { .. }) => Err(err),
            Err(err) => {
                writeln!(self.output, "error: {err}")?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn drain_events(&mut self) -> Result<(), ShellError> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.board.handle_auth_event(event).await?,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth events lagged; re-resolving session");
                    self.board.start().await?;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<Flow, ShellError> {
        let Some(unhandled) = self.session_command(command).await? else {
            return Ok(Flow::Continue);
        };
        let Some(remaining) = self.project_command(unhandled).await? else {
            return Ok(Flow::Continue);
        };
        self.task_command(remaining).await
    }

    /// Auth, profile and screen commands. Returns other commands untouched.
    async fn session_command(&mut self, command: Command) -> Result<Option<Command>, ShellError> {
        match command {
            Command::Login { email, password } => self.board.sign_in(&email, &password).await?,
            Command::Signup { email, password } => self.board.sign_up(&email, &password).await?,
            Command::Confirm { email, code } => self.board.confirm_sign_up(&email, &code).await?,
            Command::Mode { mode } => self.board.set_auth_mode(mode.into())?,
            Command::Logout => self.board.sign_out().await,
            Command::Setup { nickname, status } => {
                self.board.save_profile(&nickname, &status.join(" ")).await?;
            }
            Command::Profile => self.board.open_profile()?,
            Command::Show => {}
            Command::Help => write!(self.output, "{}", help_text())?,
            other => return Ok(Some(other)),
        }
        Ok(None)
    }

    /// Project list, navigation and membership commands.
    async fn project_command(&mut self, command: Command) -> Result<Option<Command>, ShellError> {
        match command {
            Command::Projects => self.board.reload_projects().await?,
            Command::NewProject { name } => {
                let project = self.board.create_project(&name.join(" ")).await?;
                writeln!(self.output, "created {} (invite code {})", project.name, project.id)?;
            }
            Command::Join { code } => self.board.join_project(&code).await?,
            Command::Open { project } => {
                let id = pick(&self.workspace()?.projects, project, "project")?.id;
                self.board.open_project(&id).await?;
            }
            Command::My => self.board.open_my_tasks().await?,
            Command::Ranking => self.board.open_ranking().await?,
            Command::Tab { tab } => self.board.select_tab(tab.into())?,
            Command::Sidebar => self.board.toggle_sidebar()?,
            Command::Kick { member } => {
                let user = self.member_ref(Some(member))?.ok_or(ShellError::WrongScreen {
                    message: "open a project first",
                })?;
                let removed = self.board.remove_member(&user).await?;
                self.declined(removed)?;
            }
            Command::DeleteProject => {
                let deleted = self.board.delete_project().await?;
                self.declined(deleted)?;
            }
            other => return Ok(Some(other)),
        }
        Ok(None)
    }

    /// Task and subtask commands, plus `quit`.
    async fn task_command(&mut self, command: Command) -> Result<Flow, ShellError> {
        match command {
            Command::Add { title, extra } => {
                let assignee = self.member_ref(extra.assignee)?;
                self.board.set_task_draft(TaskDraft {
                    title: title.join(" "),
                    due_date: extra.due,
                    link_url: extra.link,
                    assignee,
                })?;
                self.board.add_task().await?;
            }
            Command::Rename { task, title } => {
                let renamed = TaskTitle::new(&title.join(" "))
                    .map_err(|err| Error::invalid_request(err.to_string()))?;
                let patch = TaskPatch {
                    title: Some(renamed),
                    ..TaskPatch::default()
                };
                self.patch_task(task, &patch).await?;
            }
            Command::Assign { task, member } => {
                let patch = TaskPatch {
                    assigned_to: Some(self.member_ref(Some(member))?),
                    ..TaskPatch::default()
                };
                self.patch_task(task, &patch).await?;
            }
            Command::Due { task, date } => {
                let patch = TaskPatch {
                    due_date: Some(date),
                    ..TaskPatch::default()
                };
                self.patch_task(task, &patch).await?;
            }
            Command::Link { task, url } => {
                let patch = TaskPatch {
                    link_url: Some(url.filter(|link| !link.trim().is_empty())),
                    ..TaskPatch::default()
                };
                self.patch_task(task, &patch).await?;
            }
            Command::Done { task } => {
                let id = self.task_ref(task)?;
                self.board.complete_task(&id).await?;
            }
            Command::Rm { task } => {
                let id = self.task_ref(task)?;
                let deleted = self.board.delete_task(&id).await?;
                self.declined(deleted)?;
            }
            Command::Quit => return Ok(Flow::Quit),
            other => self.subtask_command(other).await?,
        }
        Ok(Flow::Continue)
    }

    async fn subtask_command(&mut self, command: Command) -> Result<(), ShellError> {
        match command {
            Command::SubDraft { task, text, extra } => {
                let id = self.task_ref(task)?;
                let draft = self.subtask_draft(text.join(" "), extra)?;
                self.board.set_subtask_draft(id, draft)?;
            }
            Command::SubAdd { task } => {
                let id = self.task_ref(task)?;
                if !self.board.add_subtask(&id).await? {
                    writeln!(self.output, "nothing to add: sub-draft {task} <text> first")?;
                }
            }
            Command::SubToggle { task, subtask } => {
                let id = self.task_ref(task)?;
                let index = subtask.checked_sub(1).ok_or(ShellError::NoSuchItem {
                    what: "subtask",
                    position: subtask,
                    len: 0,
                })?;
                self.board.toggle_subtask(&id, index).await?;
            }
            other => warn!(command = ?other, "command reached no handler"),
        }
        Ok(())
    }

    /// Note a declined confirmation.
    fn declined(&mut self, went_ahead: bool) -> Result<(), ShellError> {
        if !went_ahead {
            writeln!(self.output, "kept")?;
        }
        Ok(())
    }

    fn workspace(&self) -> Result<&Workspace, ShellError> {
        self.board.workspace().ok_or(ShellError::WrongScreen {
            message: "sign in and finish your profile first",
        })
    }

    fn task_ref(&self, position: usize) -> Result<TaskId, ShellError> {
        pick(self.workspace()?.visible_tasks(), position, "task").map(|task| task.id)
    }

    /// Resolve an optional Members-tab position to a user id.
    fn member_ref(&self, position: Option<usize>) -> Result<Option<UserId>, ShellError> {
        let Some(wanted) = position else {
            return Ok(None);
        };
        let view = self
            .workspace()?
            .project_view()
            .ok_or(ShellError::WrongScreen {
                message: "open a project first",
            })?;
        pick(&view.members, wanted, "member").map(|member| Some(member.user_id))
    }

    fn subtask_draft(&self, text: String, extra: ItemFields) -> Result<SubtaskDraft, ShellError> {
        Ok(SubtaskDraft {
            text,
            assignee: self.member_ref(extra.assignee)?,
            due_date: extra.due,
            link_url: extra.link,
        })
    }

    async fn patch_task(&mut self, position: usize, patch: &TaskPatch) -> Result<(), ShellError> {
        let id = self.task_ref(position)?;
        self.board.update_task(&id, patch).await?;
        Ok(())
    }
}

/// Item at a 1-based position.
fn pick<'a, T>(items: &'a [T], position: usize, what: &'static str) -> Result<&'a T, ShellError> {
    position
        .checked_sub(1)
        .and_then(|index| items.get(index))
        .ok_or(ShellError::NoSuchItem {
            what,
            position,
            len: items.len(),
        })
}

/// Confirmation read from the terminal. Anything but `y`/`yes` declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl ConfirmPrompt for StdinConfirm {
    fn confirm(&self, question: &str) -> bool {
        let mut stderr = io::stderr().lock();
        if write!(stderr, "{question} [y/N] ")
            .and_then(|()| stderr.flush())
            .is_err()
        {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                warn!(error = %err, "could not read confirmation; declining");
                false
            }
        }
    }
}
