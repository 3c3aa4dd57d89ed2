//! Post detail: the post, its comments, liking and commenting

use app_core::posts::{GetPostByIdQuery, PostData, PostService};
use app_core::validation::has_content;
use app_core::{Comment, Post};
use app_state::{MutationClient, WatchedQuery};

use super::home::{format_timestamp, PostCard};
use super::{discarded, MountFlag, ScreenOutcome, ViewState, ERROR_TITLE};

/// One comment under a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    /// Commenter
    pub username: String,
    /// Text
    pub content: String,
    /// Formatted date
    pub date: String,
}

impl From<&Comment> for CommentRow {
    fn from(comment: &Comment) -> Self {
        Self {
            username: comment.username.clone(),
            content: comment.content.clone(),
            date: format_timestamp(comment.created_at),
        }
    }
}

/// Loaded post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDetailView {
    /// Post summary
    pub card: PostCard,
    /// Comments, oldest first
    pub comments: Vec<CommentRow>,
}

impl From<&Post> for PostDetailView {
    fn from(post: &Post) -> Self {
        Self {
            card: PostCard::from(post),
            comments: post.comments.iter().map(CommentRow::from).collect(),
        }
    }
}

/// Post detail
pub struct PostDetailScreen {
    post_id: String,
    posts: PostService,
    detail: WatchedQuery<GetPostByIdQuery>,
    state: ViewState<PostDetailView>,
    /// Comment input field
    pub comment_input: String,
    mount: MountFlag,
}

impl PostDetailScreen {
    /// Create the screen for `post_id`
    pub fn new(mutations: &MutationClient, post_id: impl Into<String>) -> Self {
        let post_id = post_id.into();
        Self {
            posts: PostService::new(mutations.clone()),
            detail: WatchedQuery::new(
                mutations.query_client().clone(),
                GetPostByIdQuery::new(post_id.clone()),
            ),
            post_id,
            state: ViewState::Loading,
            comment_input: String::new(),
            mount: MountFlag::new(),
        }
    }

    /// Post being shown
    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    /// Current content
    pub fn state(&self) -> &ViewState<PostDetailView> {
        &self.state
    }

    /// Load the post (cache first)
    pub async fn load(&mut self) -> ScreenOutcome {
        let result = self.detail.start().await;
        if !self.mount.is_mounted() {
            return discarded("post_detail", "load");
        }
        match result {
            Ok(data) => {
                self.show(&data);
                ScreenOutcome::none()
            }
            Err(e) => {
                let e = app_core::AppError::from(e);
                self.state = ViewState::Failed(e.user_message());
                ScreenOutcome::failed(ERROR_TITLE, e)
            }
        }
    }

    /// Like the post; the refreshed like count is shown when this returns
    pub async fn like(&mut self) -> ScreenOutcome {
        let result = self.posts.like(&self.post_id).await;
        if !self.mount.is_mounted() {
            return discarded("post_detail", "like");
        }
        match result {
            Ok(()) => {
                self.sync();
                ScreenOutcome::none()
            }
            Err(e) => ScreenOutcome::failed("Like failed", e),
        }
    }

    /// Submit the comment input
    ///
    /// Blank input is ignored. On success the input is cleared and the post
    /// is refetched so the new comment shows.
    pub async fn comment(&mut self) -> ScreenOutcome {
        if !has_content(&self.comment_input) {
            return ScreenOutcome::none();
        }

        let result = self.posts.comment(&self.post_id, &self.comment_input).await;
        if !self.mount.is_mounted() {
            return discarded("post_detail", "comment");
        }
        if let Err(e) = result {
            return ScreenOutcome::failed(ERROR_TITLE, e);
        }
        self.comment_input.clear();

        let refetched = self.detail.refetch().await;
        if !self.mount.is_mounted() {
            return discarded("post_detail", "comment refetch");
        }
        match refetched {
            Ok(data) => {
                self.show(&data);
                ScreenOutcome::none()
            }
            Err(e) => ScreenOutcome::failed(ERROR_TITLE, e.into()),
        }
    }

    /// Pick up changes to this post written elsewhere
    pub fn sync(&mut self) {
        match self.detail.sync() {
            Ok(Some(data)) => self.show(&data),
            Ok(None) => {}
            Err(e) => tracing::warn!(post_id = %self.post_id, error = %e, "post cache unreadable"),
        }
    }

    /// Mount flag of this screen
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mount
    }

    fn show(&mut self, data: &PostData) {
        self.state = ViewState::Ready(PostDetailView::from(&data.post));
    }
}
