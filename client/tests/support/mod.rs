//! Shared fixtures for board integration tests.

use std::sync::Arc;

use team_sync::domain::ports::AssumeYes;
use team_sync::domain::{Nickname, Profile, UserId};
use team_sync::outbound::memory::InMemoryBackend;
use team_sync::{BoardPorts, TeamBoard};

pub const PASSWORD: &str = "correct horse";

/// Board wired to `backend` with confirmations always accepted.
pub fn board_for(backend: &Arc<InMemoryBackend>) -> TeamBoard {
    TeamBoard::new(BoardPorts::from_backend(backend, Arc::new(AssumeYes)))
}

/// Register `email` with a finished profile named `nickname`.
pub fn member(backend: &InMemoryBackend, email: &str, nickname: &str) -> UserId {
    let id = backend.register_user(email, PASSWORD);
    backend.seed_profile(Profile {
        id,
        nickname: Some(Nickname::new(nickname).expect("nickname")),
        status_message: None,
    });
    id
}

/// Board signed in as `email` and sitting on the main screen.
pub async fn signed_in(backend: &Arc<InMemoryBackend>, email: &str) -> TeamBoard {
    let mut board = board_for(backend);
    board.start().await.expect("start");
    board.sign_in(email, PASSWORD).await.expect("sign in");
    assert!(board.workspace().is_some(), "profile is complete");
    board
}
