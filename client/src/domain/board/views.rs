//! Loading the project detail, my-tasks and ranking views.

use futures_util::future::join_all;
use tracing::warn;

use super::{MyTasksView, ProjectTab, ProjectView, TeamBoard, View, store_error};
use crate::domain::{
    BoardResult, COMPLETED_LOG_LIMIT, Error, Project, ProjectId, RANKING_PROFILE_LIMIT,
    RankingEntry, rank,
};

impl TeamBoard {
    /// Open a project from the sidebar list on its Tasks tab.
    pub async fn open_project(&mut self, id: &ProjectId) -> BoardResult<()> {
        let project = self
            .main()?
            .projects
            .iter()
            .find(|project| &project.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("that project is not in your list"))?;
        let view = self.load_project_view(project, ProjectTab::Tasks).await?;
        self.main_mut()?.switch_view(View::Project(view));
        Ok(())
    }

    /// Show open tasks assigned to the current user across all projects.
    pub async fn open_my_tasks(&mut self) -> BoardResult<()> {
        let view = self.load_my_tasks().await?;
        self.main_mut()?.switch_view(View::MyTasks(view));
        Ok(())
    }

    /// Show the completion leaderboard.
    pub async fn open_ranking(&mut self) -> BoardResult<()> {
        let entries = self.load_ranking().await?;
        self.main_mut()?.switch_view(View::Ranking(entries));
        Ok(())
    }

    /// Switch tabs inside the open project.
    pub fn select_tab(&mut self, tab: ProjectTab) -> BoardResult<()> {
        match &mut self.main_mut()?.view {
            View::Project(view) => {
                view.tab = tab;
                Ok(())
            }
            _ => Err(Error::invalid_request("open a project first")),
        }
    }

    /// Open or close the project sidebar.
    pub fn toggle_sidebar(&mut self) -> BoardResult<()> {
        let workspace = self.main_mut()?;
        workspace.sidebar_open = !workspace.sidebar_open;
        Ok(())
    }

    /// Fetch the current view again, keeping tab and drafts.
    pub async fn reload_current_view(&mut self) -> BoardResult<()> {
        let workspace = self.main()?;
        let fresh = match &workspace.view {
            View::Project(view) => View::Project(
                self.load_project_view(view.project.clone(), view.tab)
                    .await?,
            ),
            View::MyTasks(_) => View::MyTasks(self.load_my_tasks().await?),
            View::Ranking(_) => View::Ranking(self.load_ranking().await?),
            View::Welcome | View::Profile => return Ok(()),
        };
        self.main_mut()?.view = fresh;
        Ok(())
    }

    async fn load_project_view(&self, project: Project, tab: ProjectTab) -> BoardResult<ProjectView> {
        let (open_tasks, completed_log, members) = tokio::try_join!(
            self.ports.tasks.list_open_in_project(&project.id),
            self.ports
                .tasks
                .list_recently_completed(&project.id, COMPLETED_LOG_LIMIT),
            self.ports.members.list_for_project(&project.id),
        )
        .map_err(store_error)?;
        Ok(ProjectView {
            project,
            tab,
            open_tasks,
            completed_log,
            members,
        })
    }

    async fn load_my_tasks(&self) -> BoardResult<MyTasksView> {
        let user = self.main()?.user.id;
        let tasks = self
            .ports
            .tasks
            .list_open_assigned_to(&user)
            .await
            .map_err(store_error)?;
        Ok(MyTasksView { tasks })
    }

    /// Count completions per profile. A failed count ranks as zero.
    async fn load_ranking(&self) -> BoardResult<Vec<RankingEntry>> {
        self.main()?;
        let profiles = self
            .ports
            .profiles
            .list(RANKING_PROFILE_LIMIT)
            .await
            .map_err(store_error)?;
        let counts = join_all(
            profiles
                .iter()
                .map(|profile| self.ports.tasks.count_completed_assigned_to(&profile.id)),
        )
        .await;
        let entries = profiles
            .into_iter()
            .zip(counts)
            .map(|(profile, count)| {
                let completed_count = count.unwrap_or_else(|err| {
                    warn!(user = %profile.id, error = %err, "completion count failed; using zero");
                    0
                });
                RankingEntry {
                    profile,
                    completed_count,
                }
            })
            .collect();
        Ok(rank(entries))
    }
}
