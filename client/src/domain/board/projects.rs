//! Project list, invites and membership management.

use chrono::Utc;
use tracing::info;

use super::{TeamBoard, View, invalid, next_sort_order, store_error};
use crate::domain::{
    BoardResult, Error, InviteCode, MemberRole, NewMembership, NewProject, Project, UserId,
    member_nickname,
};

impl TeamBoard {
    /// Projects `user` is a member of, minus soft-deleted ones, by
    /// `sort_order`.
    pub(super) async fn fetch_projects(&self, user: &UserId) -> BoardResult<Vec<Project>> {
        let ids = self
            .ports
            .members
            .project_ids_for_user(user)
            .await
            .map_err(store_error)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut projects = self.ports.projects.list_active(&ids).await.map_err(store_error)?;
        projects.retain(|project| !project.is_deleted());
        projects.sort_by_key(|project| project.sort_order);
        Ok(projects)
    }

    /// Refresh the sidebar project list.
    pub async fn reload_projects(&mut self) -> BoardResult<()> {
        let user = self.main()?.user.id;
        let projects = self.fetch_projects(&user).await?;
        self.main_mut()?.projects = projects;
        Ok(())
    }

    /// Create a project owned by the current user, who becomes its admin.
    pub async fn create_project(&mut self, name: &str) -> BoardResult<Project> {
        let workspace = self.main()?;
        let user = workspace.user.id;
        let new_project =
            NewProject::new(name, next_sort_order(workspace.projects.len())).map_err(invalid)?;
        let project = self
            .ports
            .projects
            .create(&new_project)
            .await
            .map_err(store_error)?;
        let membership = NewMembership {
            project: InviteCode::from(project.id),
            user_id: user,
            role: MemberRole::Admin,
        };
        self.ports.members.add(&membership).await.map_err(store_error)?;
        info!(project = %project.id, "project created");
        self.reload_projects().await?;
        Ok(project)
    }

    /// Join a project by invite code.
    ///
    /// The code is not checked locally. The project list is reloaded either
    /// way and the insert error, if any, is returned afterwards.
    pub async fn join_project(&mut self, code: &str) -> BoardResult<()> {
        let user = self.main()?.user.id;
        let membership = NewMembership {
            project: InviteCode::new(code).map_err(invalid)?,
            user_id: user,
            role: MemberRole::General,
        };
        let added = self.ports.members.add(&membership).await.map_err(store_error);
        if added.is_ok() {
            info!(code = membership.project.as_str(), "joined project");
        }
        let reloaded = self.reload_projects().await;
        added.and(reloaded)
    }

    /// Soft-delete the open project after confirmation.
    ///
    /// Returns `false` when the user declined.
    pub async fn delete_project(&mut self) -> BoardResult<bool> {
        let project = self
            .main()?
            .project_view()
            .map(|view| view.project.clone())
            .ok_or_else(|| Error::invalid_request("open a project first"))?;
        let question = format!("Delete project \"{}\"?", project.name);
        if !self.ports.confirm.confirm(&question) {
            return Ok(false);
        }
        self.ports
            .projects
            .soft_delete(&project.id, Utc::now())
            .await
            .map_err(store_error)?;
        info!(project = %project.id, "project deleted");
        self.main_mut()?.switch_view(View::Welcome);
        self.reload_projects().await?;
        Ok(true)
    }

    /// Remove another member from the open project. Admins only.
    ///
    /// Returns `false` when the user declined.
    pub async fn remove_member(&mut self, member: &UserId) -> BoardResult<bool> {
        let workspace = self.main()?;
        let view = workspace
            .project_view()
            .ok_or_else(|| Error::invalid_request("open a project first"))?;
        if *member == workspace.user.id {
            return Err(Error::invalid_request("you cannot remove yourself"));
        }
        if !view.is_admin(&workspace.user) {
            return Err(Error::forbidden("only project admins can remove members"));
        }
        if !view.members.iter().any(|m| &m.user_id == member) {
            return Err(Error::not_found("that user is not a member of this project"));
        }
        let project_id = view.project.id;
        let question = format!(
            "Remove {} from \"{}\"?",
            member_nickname(&view.members, member).unwrap_or("this member"),
            view.project.name
        );
        if !self.ports.confirm.confirm(&question) {
            return Ok(false);
        }
        self.ports
            .members
            .remove(&project_id, member)
            .await
            .map_err(store_error)?;
        info!(project = %project_id, member = %member, "member removed");
        self.reload_current_view().await?;
        Ok(true)
    }
}
