//! Session and profile resolution.

use tracing::{info, warn};

use super::{ProfileSetup, Screen, TeamBoard, View, Workspace, auth_error, invalid, store_error};
use crate::domain::{
    AuthEvent, AuthMode, AuthUser, BoardResult, Credentials, Error, Profile, ProfileUpdate,
    SignUpOutcome,
};

const CONFIRMATION_NOTICE: &str = "Check your email for a confirmation code, then run `confirm`.";

impl TeamBoard {
    /// Resolve the stored session and route to auth, setup or the main app.
    pub async fn start(&mut self) -> BoardResult<()> {
        self.screen = Screen::Loading;
        let current = self.ports.auth.current_session().await.map_err(auth_error);
        let resolved = match current {
            Ok(Some(session)) => self.resolve_profile(session.user().clone()).await,
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };
        if self.screen == Screen::Loading {
            self.screen = Screen::signed_out();
        }
        resolved
    }

    /// Apply an auth-state change published by the gateway.
    ///
    /// Sign-ins and refreshes for the user already on screen are ignored;
    /// anything else re-runs profile resolution.
    pub async fn handle_auth_event(&mut self, event: AuthEvent) -> BoardResult<()> {
        match event {
            AuthEvent::SignedOut => {
                if !matches!(self.screen, Screen::SignedOut(_)) {
                    info!("session ended");
                    self.screen = Screen::signed_out();
                }
                Ok(())
            }
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                let user = session.user();
                if self.screen.user().is_some_and(|current| current.id == user.id) {
                    return Ok(());
                }
                self.resolve_profile(user.clone()).await
            }
        }
    }

    /// Switch the auth form between login and sign-up.
    pub fn set_auth_mode(&mut self, mode: AuthMode) -> BoardResult<()> {
        let Screen::SignedOut(auth) = &mut self.screen else {
            return Err(Error::invalid_request("already signed in"));
        };
        auth.mode = mode;
        auth.notice = None;
        Ok(())
    }

    /// Sign in with email and password. On failure the screen is unchanged.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> BoardResult<()> {
        let credentials = Credentials::try_from_parts(email, password).map_err(invalid)?;
        let session = self.ports.auth.sign_in(&credentials).await.map_err(auth_error)?;
        info!(user = %session.user().id, "signed in");
        self.resolve_profile(session.user().clone()).await
    }

    /// Register an account. Stays on the auth screen when email
    /// confirmation is required.
    pub async fn sign_up(&mut self, email: &str, password: &str) -> BoardResult<()> {
        let credentials = Credentials::try_from_parts(email, password).map_err(invalid)?;
        let outcome = self.ports.auth.sign_up(&credentials).await.map_err(auth_error)?;
        match outcome {
            SignUpOutcome::ConfirmationSent => {
                info!("sign-up awaiting email confirmation");
                if let Screen::SignedOut(auth) = &mut self.screen {
                    auth.notice = Some(CONFIRMATION_NOTICE.to_owned());
                }
                Ok(())
            }
            SignUpOutcome::SignedIn(session) => {
                info!(user = %session.user().id, "signed up");
                self.resolve_profile(session.user().clone()).await
            }
        }
    }

    /// Finish sign-up with the emailed one-time code.
    pub async fn confirm_sign_up(&mut self, email: &str, code: &str) -> BoardResult<()> {
        let address = email.trim();
        let token = code.trim();
        if address.is_empty() || token.is_empty() {
            return Err(Error::invalid_request("email and confirmation code are required"));
        }
        let session = self.ports.auth.verify_sign_up(address, token).await.map_err(auth_error)?;
        info!(user = %session.user().id, "sign-up confirmed");
        self.resolve_profile(session.user().clone()).await
    }

    /// End the session and discard all workspace state.
    pub async fn sign_out(&mut self) {
        if let Err(err) = self.ports.auth.sign_out().await {
            warn!(error = %err, "remote sign-out failed; local session dropped anyway");
        }
        info!("signed out");
        self.screen = Screen::signed_out();
    }

    /// Save nickname and status from the setup form or the profile editor.
    ///
    /// Validation runs before any remote call. On success the profile is
    /// resolved again, which also reloads the project list.
    pub async fn save_profile(&mut self, nickname: &str, status: &str) -> BoardResult<()> {
        let user = self
            .screen
            .user()
            .cloned()
            .ok_or_else(|| Error::unauthorized("sign in first"))?;
        let update = ProfileUpdate::from_form(user.id, nickname, status).map_err(invalid)?;
        self.ports.profiles.upsert(&update).await.map_err(store_error)?;
        info!(user = %user.id, "profile saved");
        self.resolve_profile(user).await?;
        if let Screen::Main(workspace) = &mut self.screen {
            if workspace.view == View::Profile {
                workspace.view = View::Welcome;
            }
        }
        Ok(())
    }

    /// Show the profile editor.
    pub fn open_profile(&mut self) -> BoardResult<()> {
        self.main_mut()?.switch_view(View::Profile);
        Ok(())
    }

    /// Fetch the user's profile and enter setup or the main app.
    async fn resolve_profile(&mut self, user: AuthUser) -> BoardResult<()> {
        let found = self.ports.profiles.find(&user.id).await.map_err(store_error)?;
        match found {
            Some(profile) if profile.is_complete() => self.enter_main(user, profile).await,
            existing => {
                info!(user = %user.id, "profile incomplete; showing setup");
                self.screen = Screen::ProfileSetup(ProfileSetup { user, existing });
                Ok(())
            }
        }
    }

    async fn enter_main(&mut self, user: AuthUser, profile: Profile) -> BoardResult<()> {
        let projects = self.fetch_projects(&user.id).await?;
        if let Screen::Main(workspace) = &mut self.screen {
            if workspace.user.id == user.id {
                workspace.user = user;
                workspace.profile = profile;
                workspace.projects = projects;
                return Ok(());
            }
        }
        info!(user = %user.id, projects = projects.len(), "entering main view");
        self.screen = Screen::Main(Box::new(Workspace::new(user, profile, projects)));
        Ok(())
    }
}
