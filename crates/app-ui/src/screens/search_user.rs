//! User search

use app_core::search::SearchUsersQuery;
use app_core::{AppError, UserSummary};
use app_state::{LazyQuery, MutationClient};

use super::{discarded, MountFlag, ScreenOutcome, ViewState, ERROR_TITLE};
use crate::navigation::Route;

/// Shown when a search matched nobody
pub const NO_RESULTS_MESSAGE: &str = "No results found";

/// Search by name or username
pub struct SearchUserScreen {
    search: LazyQuery<SearchUsersQuery>,
    /// Search input field
    pub input: String,
    results: ViewState<Vec<UserSummary>>,
    mount: MountFlag,
}

impl SearchUserScreen {
    /// Create the screen; nothing is fetched until [`search`](Self::search)
    pub fn new(mutations: &MutationClient) -> Self {
        Self {
            search: LazyQuery::new(mutations.query_client().clone()),
            input: String::new(),
            results: ViewState::Ready(Vec::new()),
            mount: MountFlag::new(),
        }
    }

    /// Results of the last search
    pub fn results(&self) -> &ViewState<Vec<UserSummary>> {
        &self.results
    }

    /// Message for an empty result, once a search has run
    pub fn empty_message(&self) -> Option<&'static str> {
        match &self.results {
            ViewState::Ready(users) if users.is_empty() && self.search.called() => Some(NO_RESULTS_MESSAGE),
            _ => None,
        }
    }

    /// Run the search; blank input is ignored
    pub async fn search(&mut self) -> ScreenOutcome {
        let Some(query) = SearchUsersQuery::new(&self.input) else {
            return ScreenOutcome::none();
        };

        self.results = ViewState::Loading;
        let result = self.search.trigger(query).await;
        if !self.mount.is_mounted() {
            return discarded("search_user", "search");
        }
        match result {
            Ok(data) => {
                self.results = ViewState::Ready(data.users);
                ScreenOutcome::none()
            }
            Err(e) => {
                let e = AppError::from(e);
                self.results = ViewState::Failed(e.user_message());
                ScreenOutcome::failed(ERROR_TITLE, e)
            }
        }
    }

    /// Open a user's profile
    pub fn select(&self, user_id: &str) -> ScreenOutcome {
        ScreenOutcome::push(Route::UserProfile {
            user_id: user_id.to_string(),
        })
    }

    /// Mount flag of this screen
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mount
    }
}
