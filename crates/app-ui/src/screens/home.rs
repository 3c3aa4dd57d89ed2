//! Home feed

use app_core::posts::GetPostsQuery;
use app_core::{Post, Timestamp};
use app_state::{MutationClient, WatchedQuery};

use super::{discarded, MountFlag, ScreenOutcome, ViewState, ERROR_TITLE};
use crate::navigation::Route;

/// Shown while a post's timestamp is missing
pub const DATE_PLACEHOLDER: &str = "Loading date...";

/// Format a timestamp for display, or the placeholder when absent
pub fn format_timestamp(timestamp: Option<Timestamp>) -> String {
    timestamp
        .and_then(|t| t.to_datetime())
        .map(|dt| dt.format("%d/%m/%Y, %H:%M:%S").to_string())
        .unwrap_or_else(|| DATE_PLACEHOLDER.to_string())
}

/// One post in a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    /// Post id
    pub id: String,
    /// Author username, empty if unknown
    pub author: String,
    /// Formatted creation date
    pub date: String,
    /// Image, if any
    pub image_url: Option<String>,
    /// Text
    pub content: String,
    /// Tags
    pub tags: Vec<String>,
    /// Number of likes
    pub like_count: usize,
    /// Number of comments
    pub comment_count: usize,
}

impl From<&Post> for PostCard {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            author: post
                .author
                .as_ref()
                .map(|a| a.username.clone())
                .unwrap_or_default(),
            date: format_timestamp(post.created_at),
            image_url: post.image_url().map(str::to_string),
            content: post.content.clone(),
            tags: post.tags.clone(),
            like_count: post.like_count(),
            comment_count: post.comment_count(),
        }
    }
}

/// Post feed
pub struct HomeScreen {
    feed: WatchedQuery<GetPostsQuery>,
    state: ViewState<Vec<PostCard>>,
    mount: MountFlag,
}

impl HomeScreen {
    /// Create the screen; call [`load`](Self::load) to fetch
    pub fn new(mutations: &MutationClient) -> Self {
        Self {
            feed: WatchedQuery::new(mutations.query_client().clone(), GetPostsQuery),
            state: ViewState::Loading,
            mount: MountFlag::new(),
        }
    }

    /// Current content
    pub fn state(&self) -> &ViewState<Vec<PostCard>> {
        &self.state
    }

    /// Load the feed (cache first)
    pub async fn load(&mut self) -> ScreenOutcome {
        let result = self.feed.start().await;
        if !self.mount.is_mounted() {
            return discarded("home", "load");
        }
        self.apply(result.map_err(Into::into))
    }

    /// Reload the feed from the network
    pub async fn refresh(&mut self) -> ScreenOutcome {
        let result = self.feed.refetch().await;
        if !self.mount.is_mounted() {
            return discarded("home", "refresh");
        }
        self.apply(result.map_err(Into::into))
    }

    /// Pick up feed changes written by other screens
    pub fn sync(&mut self) {
        match self.feed.sync() {
            Ok(Some(data)) => self.state = ViewState::Ready(cards(&data.posts)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "feed cache unreadable"),
        }
    }

    /// Open a post
    pub fn select(&self, post_id: &str) -> ScreenOutcome {
        ScreenOutcome::push(Route::PostDetail {
            post_id: post_id.to_string(),
        })
    }

    /// Mount flag of this screen
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mount
    }

    fn apply(&mut self, result: app_core::Result<app_core::posts::PostsData>) -> ScreenOutcome {
        match result {
            Ok(data) => {
                self.state = ViewState::Ready(cards(&data.posts));
                ScreenOutcome::none()
            }
            Err(e) => {
                self.state = ViewState::Failed(e.user_message());
                ScreenOutcome::failed(ERROR_TITLE, e)
            }
        }
    }
}

fn cards(posts: &[Post]) -> Vec<PostCard> {
    posts.iter().map(PostCard::from).collect()
}
