//! Plain-text rendering of the board screen.

use std::io::{self, Write};

use crate::domain::board::{ProjectTab, ProjectView, Screen, View, Workspace};
use crate::domain::{AuthMode, RankingEntry, Task};

pub(super) fn render(screen: &Screen, out: &mut impl Write) -> io::Result<()> {
    match screen {
        Screen::Loading => writeln!(out, "Loading..."),
        Screen::SignedOut(auth) => {
            match auth.mode {
                AuthMode::Login => writeln!(out, "[sign in]  login <email> <password>   (mode signup to register)")?,
                AuthMode::SignUp => writeln!(out, "[sign up]  signup <email> <password>   (mode login to sign in)")?,
            }
            if let Some(notice) = &auth.notice {
                writeln!(out, "{notice}")?;
                writeln!(out, "confirm <email> <code> once the email arrives")?;
            }
            Ok(())
        }
        Screen::ProfileSetup(setup) => {
            let who = setup.user.email.as_deref().unwrap_or("there");
            writeln!(out, "Welcome, {who}. Pick a nickname to get started:")?;
            writeln!(out, "  setup <nickname> [status message]")
        }
        Screen::Main(workspace) => render_workspace(workspace, out),
    }
}

fn render_workspace(workspace: &Workspace, out: &mut impl Write) -> io::Result<()> {
    let name = workspace.profile.display_name("(no nickname)");
    match workspace.profile.status_message.as_deref() {
        Some(status) => writeln!(out, "== {name} | {status} ==")?,
        None => writeln!(out, "== {name} ==")?,
    }
    if workspace.sidebar_open || matches!(workspace.view, View::Welcome) {
        render_projects(workspace, out)?;
    }
    match &workspace.view {
        View::Welcome => writeln!(out, "open <n> to pick a project, my for your tasks, ranking for the leaderboard"),
        View::Project(view) => render_project(view, out),
        View::MyTasks(view) => {
            writeln!(out, "-- my tasks --")?;
            if view.tasks.is_empty() {
                return writeln!(out, "  nothing assigned to you");
            }
            for (position, task) in (1..).zip(&view.tasks) {
                let project = task.project_name.as_deref().unwrap_or("?");
                writeln!(out, "{position:>3}. [{project}] {}", task_line(task))?;
            }
            Ok(())
        }
        View::Ranking(entries) => render_ranking(entries, out),
        View::Profile => {
            writeln!(out, "-- profile --")?;
            writeln!(out, "  nickname: {name}")?;
            writeln!(
                out,
                "  status:   {}",
                workspace.profile.status_message.as_deref().unwrap_or("-")
            )?;
            writeln!(out, "  setup <nickname> [status] to change")
        }
    }
}

fn render_projects(workspace: &Workspace, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "-- projects --")?;
    if workspace.projects.is_empty() {
        return writeln!(out, "  none yet: new-project <name> or join <code>");
    }
    let open = workspace.project_view().map(|view| view.project.id);
    for (position, project) in (1..).zip(&workspace.projects) {
        let marker = if open == Some(project.id) { '*' } else { ' ' };
        writeln!(out, "{marker}{position:>2}. {}", project.name)?;
    }
    Ok(())
}

fn render_project(view: &ProjectView, out: &mut impl Write) -> io::Result<()> {
    let tabs = [
        (ProjectTab::Tasks, "tasks"),
        (ProjectTab::Log, "log"),
        (ProjectTab::Members, "members"),
        (ProjectTab::Settings, "settings"),
    ]
    .map(|(tab, label)| {
        if tab == view.tab {
            format!("[{label}]")
        } else {
            label.to_owned()
        }
    })
    .join(" ");
    writeln!(out, "## {}   {tabs}", view.project.name)?;
    match view.tab {
        ProjectTab::Tasks => {
            if view.open_tasks.is_empty() {
                return writeln!(out, "  no open tasks");
            }
            for (position, task) in (1..).zip(&view.open_tasks) {
                writeln!(out, "{position:>3}. {}", task_line(task))?;
                for (sub_position, subtask) in (1..).zip(&task.subtasks) {
                    let mark = if subtask.completed { 'x' } else { ' ' };
                    let due = subtask
                        .due_date
                        .map(|date| format!(" due {date}"))
                        .unwrap_or_default();
                    writeln!(out, "       {sub_position}. [{mark}] {}{due}", subtask.text)?;
                }
            }
            Ok(())
        }
        ProjectTab::Log => {
            if view.completed_log.is_empty() {
                return writeln!(out, "  nothing completed yet");
            }
            for task in &view.completed_log {
                let when = task
                    .updated_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                writeln!(out, "  [x] {} ({when})", task.title)?;
            }
            Ok(())
        }
        ProjectTab::Members => {
            for (position, member) in (1..).zip(&view.members) {
                let name = member.nickname.as_deref().unwrap_or("(no nickname)");
                let status = member
                    .status_message
                    .as_deref()
                    .map(|text| format!(" | {text}"))
                    .unwrap_or_default();
                writeln!(out, "{position:>3}. {name} [{}]{status}", member.role.label())?;
            }
            Ok(())
        }
        ProjectTab::Settings => {
            writeln!(out, "  invite code: {}", view.project.id)?;
            writeln!(out, "  delete-project removes it for everyone")
        }
    }
}

fn render_ranking(entries: &[RankingEntry], out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "-- ranking --")?;
    for (position, entry) in (1..).zip(entries) {
        writeln!(
            out,
            "{position:>3}. {:<20} {}",
            entry.profile.display_name("(no nickname)"),
            entry.completed_count
        )?;
    }
    Ok(())
}

fn task_line(task: &Task) -> String {
    let mut line = task.title.clone();
    if let Some(name) = &task.assignee_nickname {
        line.push_str(&format!(" @{name}"));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {due}"));
    }
    if let Some(link) = &task.link_url {
        line.push_str(&format!(" <{link}>"));
    }
    if !task.subtasks.is_empty() {
        line.push_str(&format!(
            " ({}/{})",
            task.completed_subtasks(),
            task.subtasks.len()
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthUser, Nickname, Profile, Project, ProjectId, Subtask, TaskId, UserId};

    fn rendered(screen: &Screen) -> String {
        let mut out = Vec::new();
        render(screen, &mut out).expect("render");
        String::from_utf8(out).expect("utf8")
    }

    fn workspace(view: View) -> Workspace {
        let user = AuthUser {
            id: UserId::random(),
            email: Some("u@example.com".to_owned()),
        };
        let profile = Profile {
            id: user.id,
            nickname: Some(Nickname::new("Aoi").expect("nickname")),
            status_message: None,
        };
        let mut workspace = Workspace::new(user, profile, Vec::new());
        workspace.view = view;
        workspace
    }

    #[test]
    fn task_list_shows_subtask_progress() {
        let project = Project {
            id: ProjectId::random(),
            name: "Launch".to_owned(),
            sort_order: 0,
            deleted_at: None,
        };
        let task = Task {
            id: TaskId::random(),
            project_id: project.id,
            title: "Write brief".to_owned(),
            assigned_to: None,
            assignee_nickname: Some("Aoi".to_owned()),
            project_name: None,
            due_date: None,
            link_url: None,
            sort_order: 0,
            completed: false,
            deleted_at: None,
            updated_at: None,
            subtasks: vec![Subtask {
                text: "Draft outline".to_owned(),
                completed: true,
                assigned_to: None,
                due_date: None,
                link_url: None,
            }],
        };
        let view = ProjectView {
            project,
            tab: ProjectTab::Tasks,
            open_tasks: vec![task],
            completed_log: Vec::new(),
            members: Vec::new(),
        };
        let text = rendered(&Screen::Main(Box::new(workspace(View::Project(view)))));
        assert!(text.contains("## Launch   [tasks] log members settings"));
        assert!(text.contains("  1. Write brief @Aoi (1/1)"));
        assert!(text.contains("1. [x] Draft outline"));
    }

    #[test]
    fn welcome_lists_projects_hint_when_empty() {
        let text = rendered(&Screen::Main(Box::new(workspace(View::Welcome))));
        assert!(text.starts_with("== Aoi =="));
        assert!(text.contains("none yet: new-project <name> or join <code>"));
    }

    #[test]
    fn signed_out_notice_prompts_for_code() {
        let mut screen = Screen::signed_out();
        if let Screen::SignedOut(auth) = &mut screen {
            auth.notice = Some("Check your email".to_owned());
        }
        let text = rendered(&screen);
        assert!(text.contains("confirm <email> <code>"));
    }
}
