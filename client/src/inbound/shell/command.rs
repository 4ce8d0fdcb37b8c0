//! Shell command grammar.
//!
//! Task, member, project and subtask arguments are 1-based positions in the
//! list currently on screen.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use super::ShellError;
use crate::domain::AuthMode;
use crate::domain::board::ProjectTab;

/// One parsed shell line.
#[derive(Debug, Parser)]
#[command(
    name = "team-sync",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
pub(super) struct ShellLine {
    #[command(subcommand)]
    pub(super) command: Command,
}

/// Commands accepted at the prompt.
#[derive(Debug, Subcommand, PartialEq, Eq)]
pub(super) enum Command {
    /// Sign in with email and password.
    Login { email: String, password: String },
    /// Create an account.
    Signup { email: String, password: String },
    /// Confirm a sign-up with the emailed code.
    Confirm { email: String, code: String },
    /// Switch the auth form between sign-in and sign-up.
    Mode { mode: ModeArg },
    /// Sign out.
    Logout,
    /// Save nickname and optional status message.
    Setup {
        nickname: String,
        #[arg(trailing_var_arg = true)]
        status: Vec<String>,
    },
    /// Show your profile.
    Profile,
    /// Reload the project list.
    Projects,
    /// Create a project; you become its admin.
    NewProject {
        #[arg(required = true, trailing_var_arg = true)]
        name: Vec<String>,
    },
    /// Join a project with its invite code.
    Join { code: String },
    /// Open a project from the list.
    Open { project: usize },
    /// Show open tasks assigned to you.
    My,
    /// Show the completion ranking.
    Ranking,
    /// Switch the project tab.
    Tab { tab: TabArg },
    /// Open or close the project list.
    Sidebar,
    /// Add a task to the open project.
    Add {
        #[arg(required = true)]
        title: Vec<String>,
        #[command(flatten)]
        extra: ItemFields,
    },
    /// Rename a task.
    Rename {
        task: usize,
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Assign a task to a project member.
    Assign { task: usize, member: usize },
    /// Set or clear a task's due date (YYYY-MM-DD).
    Due { task: usize, date: Option<NaiveDate> },
    /// Set or clear a task's link.
    Link { task: usize, url: Option<String> },
    /// Mark a task completed.
    Done { task: usize },
    /// Delete a task.
    Rm { task: usize },
    /// Fill the subtask form of a task.
    SubDraft {
        task: usize,
        #[arg(required = true)]
        text: Vec<String>,
        #[command(flatten)]
        extra: ItemFields,
    },
    /// Add the drafted subtask.
    SubAdd { task: usize },
    /// Toggle a subtask's completion.
    SubToggle { task: usize, subtask: usize },
    /// Remove a member from the open project (admins only).
    Kick { member: usize },
    /// Delete the open project.
    DeleteProject,
    /// Render the current screen again.
    Show,
    /// List commands.
    Help,
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

/// Optional fields shared by tasks and subtasks.
#[derive(Debug, Default, Clone, PartialEq, Eq, clap::Args)]
pub(super) struct ItemFields {
    /// Due date, YYYY-MM-DD.
    #[arg(long)]
    pub(super) due: Option<NaiveDate>,
    /// Reference URL.
    #[arg(long)]
    pub(super) link: Option<String>,
    /// Member position in the Members tab.
    #[arg(long)]
    pub(super) assignee: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum ModeArg {
    Login,
    Signup,
}

impl From<ModeArg> for AuthMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Login => Self::Login,
            ModeArg::Signup => Self::SignUp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum TabArg {
    Tasks,
    Log,
    Members,
    Settings,
}

impl From<TabArg> for ProjectTab {
    fn from(value: TabArg) -> Self {
        match value {
            TabArg::Tasks => Self::Tasks,
            TabArg::Log => Self::Log,
            TabArg::Members => Self::Members,
            TabArg::Settings => Self::Settings,
        }
    }
}

/// Parse tokenised words. `--help` output comes back as a usage error.
pub(super) fn parse(words: &[String]) -> Result<Command, ShellError> {
    ShellLine::try_parse_from(words)
        .map(|line| line.command)
        .map_err(|err| {
            let rendered = err.render().to_string();
            let message = rendered.strip_prefix("error: ").unwrap_or(&rendered);
            ShellError::Usage {
                message: message.trim_end().to_owned(),
            }
        })
}

/// Full command list.
pub(super) fn help_text() -> String {
    use clap::CommandFactory;
    ShellLine::command().render_help().to_string()
}
