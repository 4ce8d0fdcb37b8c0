//! The task board: every use-case the shell can drive.
//!
//! [`TeamBoard`] owns the current [`Screen`] and a bundle of ports. Each
//! operation validates its input, calls the ports, and only then mutates
//! the screen, so a failed call leaves the previous state in place unless
//! the operation documents otherwise.

mod projects;
mod screen;
mod session;
mod subtasks;
mod tasks;
mod views;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

pub use self::screen::{
    AuthScreen, MyTasksView, ProfileSetup, ProjectTab, ProjectView, Screen, View, Workspace,
};
use crate::domain::ports::{
    AuthGateway, AuthGatewayError, ConfirmPrompt, MembershipRepository, ProfileRepository,
    ProjectRepository, RemoteStoreError, TaskRepository,
};
use crate::domain::{AuthEvent, BoardResult, Error};

/// Ports the board depends on.
///
/// Cloning is cheap; each field is reference counted.
#[derive(Clone)]
pub struct BoardPorts {
    /// Auth service and its session events.
    pub auth: Arc<dyn AuthGateway>,
    /// `profiles` table.
    pub profiles: Arc<dyn ProfileRepository>,
    /// `projects` table.
    pub projects: Arc<dyn ProjectRepository>,
    /// `project_members` table.
    pub members: Arc<dyn MembershipRepository>,
    /// `todos` table.
    pub tasks: Arc<dyn TaskRepository>,
    /// Asked before destructive actions.
    pub confirm: Arc<dyn ConfirmPrompt>,
}

impl BoardPorts {
    /// Wire every data port to one backend adapter.
    pub fn from_backend<B>(backend: &Arc<B>, confirm: Arc<dyn ConfirmPrompt>) -> Self
    where
        B: AuthGateway
            + ProfileRepository
            + ProjectRepository
            + MembershipRepository
            + TaskRepository
            + 'static,
    {
        let auth: Arc<dyn AuthGateway> = Arc::<B>::clone(backend);
        let profiles: Arc<dyn ProfileRepository> = Arc::<B>::clone(backend);
        let projects: Arc<dyn ProjectRepository> = Arc::<B>::clone(backend);
        let members: Arc<dyn MembershipRepository> = Arc::<B>::clone(backend);
        let tasks: Arc<dyn TaskRepository> = Arc::<B>::clone(backend);
        Self {
            auth,
            profiles,
            projects,
            members,
            tasks,
            confirm,
        }
    }
}

impl fmt::Debug for BoardPorts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardPorts").finish_non_exhaustive()
    }
}

/// Client-side task board.
#[derive(Debug)]
pub struct TeamBoard {
    ports: BoardPorts,
    screen: Screen,
}

impl TeamBoard {
    /// Board in the [`Screen::Loading`] state. Call [`Self::start`] next.
    #[must_use]
    pub const fn new(ports: BoardPorts) -> Self {
        Self {
            ports,
            screen: Screen::Loading,
        }
    }

    /// Current screen.
    #[must_use]
    pub const fn screen(&self) -> &Screen {
        &self.screen
    }

    /// The main-app workspace, when signed in with a complete profile.
    #[must_use]
    pub fn workspace(&self) -> Option<&Workspace> {
        match &self.screen {
            Screen::Main(workspace) => Some(workspace),
            _ => None,
        }
    }

    /// Receive auth-state changes published by the gateway.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.ports.auth.subscribe()
    }

    fn main(&self) -> BoardResult<&Workspace> {
        self.workspace()
            .ok_or_else(|| Error::unauthorized("sign in and finish your profile first"))
    }

    fn main_mut(&mut self) -> BoardResult<&mut Workspace> {
        match &mut self.screen {
            Screen::Main(workspace) => Ok(workspace),
            _ => Err(Error::unauthorized("sign in and finish your profile first")),
        }
    }
}

/// Map a validation failure to a user-facing error.
fn invalid(err: impl fmt::Display) -> Error {
    Error::invalid_request(err.to_string())
}

fn store_error(err: RemoteStoreError) -> Error {
    debug!(error = %err, "remote store call failed");
    let message = err.to_string();
    match err {
        RemoteStoreError::Transport { .. } => Error::service_unavailable(message),
        RemoteStoreError::Unauthorized { .. } => Error::unauthorized(message),
        RemoteStoreError::Rejected { .. } => Error::invalid_request(message),
        RemoteStoreError::NotFound { .. } => Error::not_found(message),
        RemoteStoreError::Decode { .. } => Error::internal(message),
    }
}

fn auth_error(err: AuthGatewayError) -> Error {
    debug!(error = %err, "auth call failed");
    let message = err.to_string();
    match err {
        AuthGatewayError::InvalidCredentials { .. } => Error::unauthorized(message),
        AuthGatewayError::Rejected { .. } => Error::invalid_request(message),
        AuthGatewayError::Transport { .. } => Error::service_unavailable(message),
        AuthGatewayError::Decode { .. } => Error::internal(message),
    }
}

/// Convert a list length to a `sort_order` value.
fn next_sort_order(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}
