//! Another user's profile

use app_core::profiles::{GetUserByIdQuery, ProfileService};
use app_core::AppError;
use app_state::{MutationClient, WatchedQuery};

use super::profile::ProfileView;
use super::{discarded, MountFlag, ScreenOutcome, ViewState, ERROR_TITLE};

/// Profile of the user behind a search result
pub struct UserProfileScreen {
    user_id: String,
    profiles: ProfileService,
    profile: WatchedQuery<GetUserByIdQuery>,
    state: ViewState<ProfileView>,
    mount: MountFlag,
}

impl UserProfileScreen {
    /// Create the screen for `user_id`
    pub fn new(mutations: &MutationClient, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            profiles: ProfileService::new(mutations.clone()),
            profile: WatchedQuery::new(
                mutations.query_client().clone(),
                GetUserByIdQuery::new(user_id.clone()),
            ),
            user_id,
            state: ViewState::Loading,
            mount: MountFlag::new(),
        }
    }

    /// User being shown
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Current content
    pub fn state(&self) -> &ViewState<ProfileView> {
        &self.state
    }

    /// Load the profile (cache first)
    pub async fn load(&mut self) -> ScreenOutcome {
        let result = self.profile.start().await;
        if !self.mount.is_mounted() {
            return discarded("user_profile", "load");
        }
        match result {
            Ok(data) => {
                self.state = ViewState::Ready(ProfileView::from(&data.user));
                ScreenOutcome::none()
            }
            Err(e) => {
                let e = AppError::from(e);
                self.state = ViewState::Failed(e.user_message());
                ScreenOutcome::failed(ERROR_TITLE, e)
            }
        }
    }

    /// Follow this user; the refreshed counts are shown when this returns
    pub async fn follow(&mut self) -> ScreenOutcome {
        let result = self.profiles.follow(&self.user_id).await;
        if !self.mount.is_mounted() {
            return discarded("user_profile", "follow");
        }
        match result {
            Ok(follow) => {
                tracing::debug!(user_id = %self.user_id, status = ?follow.status, "followed");
                match self.profile.sync() {
                    Ok(Some(data)) => self.state = ViewState::Ready(ProfileView::from(&data.user)),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(user_id = %self.user_id, error = %e, "profile cache unreadable"),
                }
                ScreenOutcome::none()
            }
            Err(e) => ScreenOutcome::failed("Follow failed", e),
        }
    }

    /// Mount flag of this screen
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mount
    }
}
