//! Board use-case tests against mocked ports.

use std::collections::HashMap;
use std::sync::Arc;

use mockall::Sequence;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockAuthGateway, MockConfirmPrompt, MockMembershipRepository, MockProfileRepository,
    MockProjectRepository, MockTaskRepository,
};
use crate::domain::{
    AuthUser, ErrorCode, Member, MemberRole, NewTask, Nickname, Profile, Project, ProjectId,
    RankingEntry, Session, SubtaskDraft, Task, TaskDraft, TaskId, UserId,
};

#[derive(Default)]
struct Mocks {
    auth: MockAuthGateway,
    profiles: MockProfileRepository,
    projects: MockProjectRepository,
    members: MockMembershipRepository,
    tasks: MockTaskRepository,
    confirm: MockConfirmPrompt,
}

impl Mocks {
    fn into_board(self, screen: Screen) -> TeamBoard {
        let mut board = TeamBoard::new(BoardPorts {
            auth: Arc::new(self.auth),
            profiles: Arc::new(self.profiles),
            projects: Arc::new(self.projects),
            members: Arc::new(self.members),
            tasks: Arc::new(self.tasks),
            confirm: Arc::new(self.confirm),
        });
        board.screen = screen;
        board
    }
}

#[fixture]
fn user() -> AuthUser {
    AuthUser {
        id: UserId::random(),
        email: Some("u@example.com".to_owned()),
    }
}

#[fixture]
fn project() -> Project {
    Project {
        id: ProjectId::random(),
        name: "Launch".to_owned(),
        sort_order: 0,
        deleted_at: None,
    }
}

fn profile(id: UserId, nickname: &str) -> Profile {
    Profile {
        id,
        nickname: Nickname::new(nickname).ok(),
        status_message: None,
    }
}

fn member(project: &Project, user: UserId, role: MemberRole) -> Member {
    Member {
        project_id: project.id,
        user_id: user,
        role,
        nickname: Some("Aoi".to_owned()),
        status_message: None,
    }
}

fn open_task(project: &Project, assignee: UserId, title: &str) -> Task {
    Task {
        id: TaskId::random(),
        project_id: project.id,
        title: title.to_owned(),
        assigned_to: Some(assignee),
        assignee_nickname: None,
        project_name: None,
        due_date: None,
        link_url: None,
        sort_order: 0,
        completed: false,
        deleted_at: None,
        updated_at: None,
        subtasks: Vec::new(),
    }
}

fn stored_from(new_task: &NewTask) -> Task {
    Task {
        id: TaskId::random(),
        project_id: new_task.project_id,
        title: new_task.title.as_str().to_owned(),
        assigned_to: Some(new_task.assigned_to),
        assignee_nickname: None,
        project_name: None,
        due_date: new_task.due_date,
        link_url: new_task.link_url.clone(),
        sort_order: new_task.sort_order,
        completed: false,
        deleted_at: None,
        updated_at: None,
        subtasks: Vec::new(),
    }
}

/// Main screen with `project` open on the Tasks tab.
fn project_screen(user: &AuthUser, project: &Project, role: MemberRole, tasks: Vec<Task>) -> Screen {
    let mut workspace = Workspace::new(
        user.clone(),
        profile(user.id, "Aoi"),
        vec![project.clone()],
    );
    workspace.view = View::Project(ProjectView {
        project: project.clone(),
        tab: ProjectTab::Tasks,
        open_tasks: tasks,
        completed_log: Vec::new(),
        members: vec![member(project, user.id, role)],
    });
    Screen::Main(Box::new(workspace))
}

fn shown_tasks(board: &TeamBoard) -> Vec<Task> {
    board
        .workspace()
        .map(|ws| ws.visible_tasks().to_vec())
        .unwrap_or_default()
}

#[tokio::test]
async fn invalid_credentials_keep_auth_screen() {
    let mut mocks = Mocks::default();
    mocks.auth.expect_sign_in().times(1).return_once(|_| {
        Err(crate::domain::ports::AuthGatewayError::invalid_credentials(
            "Invalid login credentials",
        ))
    });
    let mut board = mocks.into_board(Screen::signed_out());

    let err = board
        .sign_in("u@example.com", "wrong")
        .await
        .expect_err("sign-in must fail");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "Invalid login credentials");
    assert_eq!(board.screen(), &Screen::signed_out());
}

#[rstest]
#[case("", "pw")]
#[case("u@example.com", "")]
#[tokio::test]
async fn blank_credentials_never_reach_gateway(#[case] email: &str, #[case] password: &str) {
    let mut board = Mocks::default().into_board(Screen::signed_out());
    let err = board.sign_in(email, password).await.expect_err("validation");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn sign_up_with_confirmation_shows_notice() {
    let mut mocks = Mocks::default();
    mocks
        .auth
        .expect_sign_up()
        .times(1)
        .return_once(|_| Ok(crate::domain::SignUpOutcome::ConfirmationSent));
    let mut board = mocks.into_board(Screen::signed_out());

    board.sign_up("new@example.com", "secret").await.expect("sign-up");

    let Screen::SignedOut(auth) = board.screen() else {
        panic!("expected auth screen, got {:?}", board.screen());
    };
    assert!(auth.notice.is_some());
}

#[rstest]
#[tokio::test]
async fn saving_profile_enters_main_once(user: AuthUser, project: Project) {
    let mut mocks = Mocks::default();
    let user_id = user.id;
    mocks.profiles.expect_upsert().times(1).return_once(|_| Ok(()));
    mocks
        .profiles
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(profile(user_id, "Aoi"))));
    let project_id = project.id;
    mocks
        .members
        .expect_project_ids_for_user()
        .times(1)
        .return_once(move |_| Ok(vec![project_id]));
    let listed = project.clone();
    mocks
        .projects
        .expect_list_active()
        .times(1)
        .return_once(move |_| Ok(vec![listed]));
    let mut board = mocks.into_board(Screen::ProfileSetup(ProfileSetup {
        user: user.clone(),
        existing: None,
    }));

    board.save_profile(" Aoi ", "").await.expect("profile saved");

    let workspace = board.workspace().expect("main screen");
    assert_eq!(workspace.profile.display_name("?"), "Aoi");
    assert_eq!(workspace.projects, vec![project]);
    assert_eq!(workspace.view, View::Welcome);
}

#[rstest]
#[tokio::test]
async fn blank_nickname_aborts_before_upsert(user: AuthUser) {
    let mut board = Mocks::default().into_board(Screen::ProfileSetup(ProfileSetup {
        user,
        existing: None,
    }));
    let err = board.save_profile("   ", "hi").await.expect_err("validation");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(matches!(board.screen(), Screen::ProfileSetup(_)));
}

#[rstest]
#[tokio::test]
async fn incomplete_profile_routes_to_setup(user: AuthUser) {
    let mut mocks = Mocks::default();
    let session = Session::new(user.clone(), "a", "r", chrono::Utc::now());
    mocks
        .auth
        .expect_current_session()
        .times(1)
        .return_once(move || Ok(Some(session)));
    let user_id = user.id;
    mocks.profiles.expect_find().times(1).return_once(move |_| {
        Ok(Some(Profile {
            id: user_id,
            nickname: None,
            status_message: Some("trigger row".to_owned()),
        }))
    });
    let mut board = mocks.into_board(Screen::Loading);

    board.start().await.expect("start");

    let Screen::ProfileSetup(setup) = board.screen() else {
        panic!("expected setup, got {:?}", board.screen());
    };
    assert_eq!(setup.user, user);
    assert!(setup.existing.is_some());
}

#[rstest]
#[tokio::test]
async fn project_without_open_tasks_renders_empty_list(user: AuthUser, project: Project) {
    let mut mocks = Mocks::default();
    mocks
        .tasks
        .expect_list_open_in_project()
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    mocks
        .tasks
        .expect_list_recently_completed()
        .withf(|_, limit| *limit == crate::domain::COMPLETED_LOG_LIMIT)
        .times(1)
        .return_once(|_, _| Ok(Vec::new()));
    mocks
        .members
        .expect_list_for_project()
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    let workspace = Workspace::new(user.clone(), profile(user.id, "Aoi"), vec![project.clone()]);
    let mut board = mocks.into_board(Screen::Main(Box::new(workspace)));

    board.open_project(&project.id).await.expect("open");

    let view = board
        .workspace()
        .and_then(Workspace::project_view)
        .expect("project view");
    assert!(view.open_tasks.is_empty());
    assert_eq!(view.tab, ProjectTab::Tasks);
}

#[rstest]
#[tokio::test]
async fn completing_task_reloads_project(user: AuthUser, project: Project) {
    let task = open_task(&project, user.id, "Write brief");
    let mut done = task.clone();
    done.completed = true;

    let mut mocks = Mocks::default();
    let stored = done.clone();
    mocks
        .tasks
        .expect_update()
        .withf(|_, patch| patch.completed == Some(true))
        .times(1)
        .return_once(move |_, _| Ok(stored));
    mocks
        .tasks
        .expect_list_open_in_project()
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    let logged = done.clone();
    mocks
        .tasks
        .expect_list_recently_completed()
        .times(1)
        .return_once(move |_, _| Ok(vec![logged]));
    let admin = member(&project, user.id, MemberRole::Admin);
    mocks
        .members
        .expect_list_for_project()
        .times(1)
        .return_once(move |_| Ok(vec![admin]));
    let mut board =
        mocks.into_board(project_screen(&user, &project, MemberRole::Admin, vec![task.clone()]));

    board.complete_task(&task.id).await.expect("complete");

    let view = board
        .workspace()
        .and_then(Workspace::project_view)
        .expect("project view");
    assert!(view.open_tasks.is_empty());
    assert_eq!(view.completed_log, vec![done]);
}

#[rstest]
#[tokio::test]
async fn rename_replaces_local_copy_without_reload(user: AuthUser, project: Project) {
    let task = open_task(&project, user.id, "Write brief");
    let mut renamed = task.clone();
    renamed.title = "Write the brief".to_owned();

    let mut mocks = Mocks::default();
    mocks
        .tasks
        .expect_update()
        .times(1)
        .return_once(move |_, _| Ok(renamed));
    let mut board =
        mocks.into_board(project_screen(&user, &project, MemberRole::Admin, vec![task.clone()]));

    let patch = crate::domain::TaskPatch {
        title: crate::domain::TaskTitle::new("Write the brief").ok(),
        ..crate::domain::TaskPatch::default()
    };
    board.update_task(&task.id, &patch).await.expect("update");

    let shown = shown_tasks(&board);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown.first().map(|t| t.title.as_str()), Some("Write the brief"));
    assert_eq!(
        shown.first().and_then(|t| t.assignee_nickname.as_deref()),
        Some("Aoi")
    );
}

#[rstest]
#[tokio::test]
async fn add_task_defaults_assignee_and_keeps_it_in_draft(user: AuthUser, project: Project) {
    let mut mocks = Mocks::default();
    let me = user.id;
    mocks
        .tasks
        .expect_insert()
        .withf(move |new_task| new_task.assigned_to == me && new_task.sort_order == 0)
        .times(1)
        .returning(|new_task| Ok(stored_from(new_task)));
    let mut board = mocks.into_board(project_screen(&user, &project, MemberRole::Admin, Vec::new()));
    board
        .set_task_draft(TaskDraft {
            title: "Write brief".to_owned(),
            link_url: Some("  ".to_owned()),
            ..TaskDraft::default()
        })
        .expect("draft");

    let created = board.add_task().await.expect("created");

    assert_eq!(created.assigned_to, Some(user.id));
    assert!(created.link_url.is_none());
    assert_eq!(created.assignee_nickname.as_deref(), Some("Aoi"));
    assert_eq!(shown_tasks(&board), vec![created]);
    let draft = &board.workspace().expect("main").task_draft;
    assert!(draft.title.is_empty());
}

#[rstest]
#[tokio::test]
async fn add_task_requires_title(user: AuthUser, project: Project) {
    let mut board =
        Mocks::default().into_board(project_screen(&user, &project, MemberRole::Admin, Vec::new()));
    let err = board.add_task().await.expect_err("blank title");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn blank_subtask_draft_is_a_no_op(user: AuthUser, project: Project) {
    let task = open_task(&project, user.id, "Write brief");
    let mut board =
        Mocks::default().into_board(project_screen(&user, &project, MemberRole::Admin, vec![task.clone()]));
    board
        .set_subtask_draft(
            task.id,
            SubtaskDraft {
                text: "   ".to_owned(),
                ..SubtaskDraft::default()
            },
        )
        .expect("draft");

    let added = board.add_subtask(&task.id).await.expect("no-op");

    assert!(!added);
    assert_eq!(shown_tasks(&board), vec![task]);
}

#[rstest]
#[tokio::test]
async fn subtask_drafts_are_cleared_per_task(user: AuthUser, project: Project) {
    let first = open_task(&project, user.id, "First");
    let second = open_task(&project, user.id, "Second");
    let mut mocks = Mocks::default();
    mocks
        .tasks
        .expect_update()
        .withf(|_, patch| patch.subtasks.as_ref().is_some_and(|list| list.len() == 1))
        .times(1)
        .returning({
            let stored_row = first.clone();
            move |_, patch| {
                let mut stored = stored_row.clone();
                patch.apply_to(&mut stored);
                Ok(stored)
            }
        });
    let mut board = mocks.into_board(project_screen(
        &user,
        &project,
        MemberRole::Admin,
        vec![first.clone(), second.clone()],
    ));
    for (id, text) in [(first.id, "Draft outline"), (second.id, "Later")] {
        board
            .set_subtask_draft(
                id,
                SubtaskDraft {
                    text: text.to_owned(),
                    ..SubtaskDraft::default()
                },
            )
            .expect("draft");
    }

    assert!(board.add_subtask(&first.id).await.expect("added"));

    let workspace = board.workspace().expect("main");
    assert!(workspace.subtask_drafts.get(&first.id).is_none());
    assert!(workspace.subtask_drafts.get(&second.id).is_some());
    let subtasks = &workspace.find_task(&first.id).expect("task").subtasks;
    assert_eq!(subtasks.len(), 1);
    assert_eq!(subtasks.first().and_then(|s| s.assigned_to), Some(user.id));
}

#[rstest]
#[tokio::test]
async fn toggle_out_of_range_subtask_fails(user: AuthUser, project: Project) {
    let task = open_task(&project, user.id, "Write brief");
    let mut board =
        Mocks::default().into_board(project_screen(&user, &project, MemberRole::Admin, vec![task.clone()]));
    let err = board.toggle_subtask(&task.id, 0).await.expect_err("no subtasks");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(err.message().contains("subtask 1"));
}

#[rstest]
#[tokio::test]
async fn ranking_orders_by_completed_count(user: AuthUser) {
    let people = [("P1", 3_u64), ("P2", 7), ("P3", 0)];
    let profiles: Vec<Profile> = people
        .iter()
        .map(|(name, _)| profile(UserId::random(), name))
        .collect();
    let counts: HashMap<UserId, u64> = profiles
        .iter()
        .zip(people.iter())
        .map(|(p, (_, count))| (p.id, *count))
        .collect();

    let mut mocks = Mocks::default();
    let listed = profiles.clone();
    mocks
        .profiles
        .expect_list()
        .withf(|limit| *limit == crate::domain::RANKING_PROFILE_LIMIT)
        .times(1)
        .return_once(move |_| Ok(listed));
    mocks
        .tasks
        .expect_count_completed_assigned_to()
        .times(3)
        .returning(move |id| Ok(counts.get(id).copied().unwrap_or_default()));
    let workspace = Workspace::new(user.clone(), profile(user.id, "Aoi"), Vec::new());
    let mut board = mocks.into_board(Screen::Main(Box::new(workspace)));

    board.open_ranking().await.expect("ranking");

    let View::Ranking(entries) = &board.workspace().expect("main").view else {
        panic!("expected ranking view");
    };
    let names: Vec<&str> = entries
        .iter()
        .map(|entry: &RankingEntry| entry.profile.display_name("?"))
        .collect();
    assert_eq!(names, ["P2", "P1", "P3"]);
}

#[rstest]
#[tokio::test]
async fn failed_count_ranks_as_zero(user: AuthUser) {
    let listed = vec![profile(UserId::random(), "Solo")];
    let mut mocks = Mocks::default();
    mocks.profiles.expect_list().return_once(move |_| Ok(listed));
    mocks
        .tasks
        .expect_count_completed_assigned_to()
        .return_once(|_| Err(crate::domain::ports::RemoteStoreError::transport("timeout")));
    let workspace = Workspace::new(user.clone(), profile(user.id, "Aoi"), Vec::new());
    let mut board = mocks.into_board(Screen::Main(Box::new(workspace)));

    board.open_ranking().await.expect("ranking tolerates count failures");

    let View::Ranking(entries) = &board.workspace().expect("main").view else {
        panic!("expected ranking view");
    };
    assert_eq!(entries.first().map(|e| e.completed_count), Some(0));
}

#[rstest]
#[tokio::test]
async fn delete_task_removes_locally_when_remote_fails(user: AuthUser, project: Project) {
    let task = open_task(&project, user.id, "Write brief");
    let mut mocks = Mocks::default();
    mocks.confirm.expect_confirm().times(1).return_const(true);
    mocks
        .tasks
        .expect_delete()
        .times(1)
        .return_once(|_| Err(crate::domain::ports::RemoteStoreError::transport("offline")));
    let mut board =
        mocks.into_board(project_screen(&user, &project, MemberRole::Admin, vec![task.clone()]));

    let err = board.delete_task(&task.id).await.expect_err("remote failure is reported");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert!(shown_tasks(&board).is_empty());
}

#[rstest]
#[tokio::test]
async fn declined_delete_keeps_task(user: AuthUser, project: Project) {
    let task = open_task(&project, user.id, "Write brief");
    let mut mocks = Mocks::default();
    mocks.confirm.expect_confirm().times(1).return_const(false);
    let mut board =
        mocks.into_board(project_screen(&user, &project, MemberRole::Admin, vec![task.clone()]));

    assert!(!board.delete_task(&task.id).await.expect("declined"));
    assert_eq!(shown_tasks(&board), vec![task]);
}

#[rstest]
#[tokio::test]
async fn only_admins_remove_members(user: AuthUser, project: Project) {
    let other = UserId::random();
    let mut screen = project_screen(&user, &project, MemberRole::General, Vec::new());
    if let Screen::Main(ws) = &mut screen {
        if let View::Project(view) = &mut ws.view {
            view.members.push(member(&project, other, MemberRole::Admin));
        }
    }
    let mut board = Mocks::default().into_board(screen);

    let err = board.remove_member(&other).await.expect_err("not admin");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn admins_cannot_remove_themselves(user: AuthUser, project: Project) {
    let mut board =
        Mocks::default().into_board(project_screen(&user, &project, MemberRole::Admin, Vec::new()));
    let err = board.remove_member(&user.id).await.expect_err("self");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn join_reloads_projects_even_when_insert_fails(user: AuthUser) {
    let mut mocks = Mocks::default();
    let mut sequence = Sequence::new();
    mocks
        .members
        .expect_add()
        .withf(|m| m.role == MemberRole::General && m.project.as_str() == "bogus-code")
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_| {
            Err(crate::domain::ports::RemoteStoreError::rejected(
                "invalid input syntax for type uuid",
            ))
        });
    mocks
        .members
        .expect_project_ids_for_user()
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_| Ok(Vec::new()));
    let workspace = Workspace::new(user.clone(), profile(user.id, "Aoi"), Vec::new());
    let mut board = mocks.into_board(Screen::Main(Box::new(workspace)));

    let err = board.join_project(" bogus-code ").await.expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn signed_out_event_discards_workspace(user: AuthUser, project: Project) {
    let mut board =
        Mocks::default().into_board(project_screen(&user, &project, MemberRole::Admin, Vec::new()));
    board
        .handle_auth_event(crate::domain::AuthEvent::SignedOut)
        .await
        .expect("event");
    assert_eq!(board.screen(), &Screen::signed_out());
}

#[rstest]
#[tokio::test]
async fn refresh_for_current_user_is_ignored(user: AuthUser, project: Project) {
    let session = Session::new(user.clone(), "a", "r", chrono::Utc::now());
    let screen = project_screen(&user, &project, MemberRole::Admin, Vec::new());
    let mut board = Mocks::default().into_board(screen.clone());
    board
        .handle_auth_event(crate::domain::AuthEvent::TokenRefreshed(session))
        .await
        .expect("event");
    assert_eq!(board.screen(), &screen);
}

#[rstest]
#[tokio::test]
async fn switching_modes_closes_sidebar(user: AuthUser, project: Project) {
    let mut mocks = Mocks::default();
    mocks
        .tasks
        .expect_list_open_assigned_to()
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    let mut board = mocks.into_board(project_screen(&user, &project, MemberRole::Admin, Vec::new()));
    board.toggle_sidebar().expect("toggle");

    board.open_my_tasks().await.expect("my tasks");

    let workspace = board.workspace().expect("main");
    assert!(!workspace.sidebar_open);
    assert!(matches!(workspace.view, View::MyTasks(_)));
}

#[test]
fn from_backend_shares_one_adapter_across_ports() {
    let backend = Arc::new(crate::outbound::memory::InMemoryBackend::new());
    let ports = BoardPorts::from_backend(&backend, Arc::new(crate::domain::ports::AssumeYes));

    assert_eq!(Arc::strong_count(&backend), 6);
    drop(ports);
    assert_eq!(Arc::strong_count(&backend), 1);
}
