//! Own profile

use app_core::auth::AuthService;
use app_core::profiles::{GetProfileQuery, ProfileData};
use app_core::User;
use app_state::{MutationClient, WatchedQuery};

use super::{discarded, Alert, MountFlag, ScreenOutcome, ViewState, ERROR_TITLE};

/// Profile summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    /// User id
    pub id: String,
    /// Display name
    pub name: String,
    /// `@username`
    pub handle: String,
    /// Email address
    pub email: String,
    /// Number of followers
    pub follower_count: usize,
    /// Number of followed users
    pub following_count: usize,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            handle: user.handle(),
            email: user.email.clone(),
            follower_count: user.follower_count(),
            following_count: user.following_count(),
        }
    }
}

/// The signed-in user's profile
pub struct ProfileScreen {
    auth: AuthService,
    profile: WatchedQuery<GetProfileQuery>,
    state: ViewState<ProfileView>,
    mount: MountFlag,
}

impl ProfileScreen {
    /// Create the screen; call [`load`](Self::load) to fetch
    pub fn new(mutations: &MutationClient, auth: AuthService) -> Self {
        Self {
            auth,
            profile: WatchedQuery::new(mutations.query_client().clone(), GetProfileQuery),
            state: ViewState::Loading,
            mount: MountFlag::new(),
        }
    }

    /// Current content
    pub fn state(&self) -> &ViewState<ProfileView> {
        &self.state
    }

    /// Load the profile (cache first)
    pub async fn load(&mut self) -> ScreenOutcome {
        let result = self.profile.start().await;
        if !self.mount.is_mounted() {
            return discarded("profile", "load");
        }
        self.apply(result.map_err(Into::into))
    }

    /// Reload the profile from the network, e.g. after following someone
    pub async fn refresh(&mut self) -> ScreenOutcome {
        let result = self.profile.refetch().await;
        if !self.mount.is_mounted() {
            return discarded("profile", "refresh");
        }
        self.apply(result.map_err(Into::into))
    }

    /// Pick up profile changes written by other screens
    pub fn sync(&mut self) {
        match self.profile.sync() {
            Ok(Some(data)) => self.state = ViewState::Ready(ProfileView::from(&data.profile)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "profile cache unreadable"),
        }
    }

    /// Sign out; the host swaps to the login stack
    pub async fn logout(&mut self) -> ScreenOutcome {
        match self.auth.logout().await {
            Ok(()) => ScreenOutcome::none(),
            Err(e) => ScreenOutcome::failed("Logout failed", e),
        }
    }

    /// Profile editing is not available
    pub fn edit_profile(&self) -> ScreenOutcome {
        ScreenOutcome::alert(Alert::new(
            "Edit Profile",
            "Profile editing can be added here.",
        ))
    }

    /// Mount flag of this screen
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mount
    }

    fn apply(&mut self, result: app_core::Result<ProfileData>) -> ScreenOutcome {
        match result {
            Ok(data) => {
                self.state = ViewState::Ready(ProfileView::from(&data.profile));
                ScreenOutcome::none()
            }
            Err(e) => {
                self.state = ViewState::Failed(e.user_message());
                ScreenOutcome::failed(ERROR_TITLE, e)
            }
        }
    }
}
