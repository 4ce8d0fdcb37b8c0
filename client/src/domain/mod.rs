//! Domain primitives, ports and the task board.
//!
//! Purpose: Model the records mirrored from the hosted backend as typed
//! values, validate user input before it reaches a port, and drive the
//! screen state machine in [`board`].
//!
//! Public surface:
//! - Error / ErrorCode: user-facing failure with a stable category.
//! - UserId / ProjectId / TaskId: UUID-backed record keys.
//! - Credentials / Session / AuthEvent: auth-service values.
//! - Profile / Project / Member / Task / Subtask: mirrored rows.
//! - TeamBoard (in [`board`]): the use-cases the shell drives.

pub mod auth;
pub mod board;
pub mod error;
pub mod ids;
pub mod ports;
pub mod profile;
pub mod project;
pub mod ranking;
pub mod task;

pub use self::auth::{
    AuthEvent, AuthMode, AuthUser, Credentials, CredentialsValidationError, Session, SignUpOutcome,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{IdValidationError, ProjectId, TaskId, UserId};
pub use self::profile::{Nickname, Profile, ProfileUpdate, ProfileValidationError};
pub use self::project::{
    InviteCode, Member, MemberRole, NewMembership, NewProject, Project, ProjectValidationError,
    member_nickname,
};
pub use self::ranking::{RankingEntry, rank};
pub use self::task::{
    NewTask, Subtask, SubtaskDraft, SubtaskDrafts, Task, TaskDraft, TaskPatch, TaskTitle,
    TaskValidationError,
};

/// Completed tasks shown in a project's log tab.
pub const COMPLETED_LOG_LIMIT: usize = 20;

/// Profiles considered for the leaderboard.
pub const RANKING_PROFILE_LIMIT: usize = 20;

/// Result alias for board operations.
pub type BoardResult<T> = Result<T, Error>;
