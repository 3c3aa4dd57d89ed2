//! Post composer

use app_core::posts::{PostDraft, PostService};
use app_core::AppError;
use app_state::MutationClient;

use super::{discarded, Alert, MountFlag, ScreenOutcome, ERROR_TITLE};
use crate::navigation::NavigationRequest;

/// Composer for a new post
pub struct CreatePostScreen {
    posts: PostService,
    /// Post being written
    pub draft: PostDraft,
    /// Tag input field
    pub tag_input: String,
    submitting: bool,
    mount: MountFlag,
}

impl CreatePostScreen {
    /// Create an empty composer
    pub fn new(mutations: &MutationClient) -> Self {
        Self {
            posts: PostService::new(mutations.clone()),
            draft: PostDraft::new(),
            tag_input: String::new(),
            submitting: false,
            mount: MountFlag::new(),
        }
    }

    /// Whether a request is in flight
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Add the tag input as a tag
    ///
    /// The input is cleared only when the tag was added.
    pub fn add_tag(&mut self) -> bool {
        let added = self.draft.add_tag(&self.tag_input);
        if added {
            self.tag_input.clear();
        }
        added
    }

    /// Remove a tag
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.draft.remove_tag(tag)
    }

    /// Publish the draft and go back once the feed is refreshed
    pub async fn submit(&mut self) -> ScreenOutcome {
        self.submitting = true;
        let result = self.posts.create(&self.draft).await;
        if !self.mount.is_mounted() {
            return discarded("create_post", "submit");
        }
        self.submitting = false;

        match result {
            Ok(_) => {
                self.draft = PostDraft::new();
                self.tag_input.clear();
                ScreenOutcome::navigate(NavigationRequest::GoBack)
            }
            Err(AppError::Validation(e)) => ScreenOutcome::alert(Alert::new(ERROR_TITLE, e.message)),
            Err(e) => ScreenOutcome::failed(ERROR_TITLE, e),
        }
    }

    /// Mount flag of this screen
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::{self, post_json};
    use app_core::posts::CONTENT_REQUIRED_MESSAGE;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_tag_input() {
        let server = MockServer::start().await;
        let (mutations, _) = testing::clients(&server).await;
        let mut screen = CreatePostScreen::new(&mutations);

        screen.tag_input = " rust ".to_string();
        assert!(screen.add_tag());
        assert!(screen.tag_input.is_empty());

        screen.tag_input = "rust".to_string();
        assert!(!screen.add_tag());
        assert_eq!(screen.tag_input, "rust");

        assert!(screen.remove_tag("rust"));
        assert!(screen.draft.tags().is_empty());
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected() {
        let server = MockServer::start().await;
        let (mutations, _) = testing::clients(&server).await;
        let mut screen = CreatePostScreen::new(&mutations);
        screen.draft.content = "   ".to_string();

        let outcome = screen.submit().await;
        assert_eq!(outcome.alert, Some(Alert::new(ERROR_TITLE, CONTENT_REQUIRED_MESSAGE)));
        assert!(outcome.navigation.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_goes_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "operationName": "AddPost",
                "variables": { "input": { "content": "hello", "imgUrl": "", "tags": ["rust"] } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "addPost": { "__typename": "Post", "_id": "p9", "content": "hello", "tags": ["rust"], "imgUrl": "" } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "operationName": "GetPosts" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "getPosts": [post_json("p9", &[], &[])] } })))
            .expect(1)
            .mount(&server)
            .await;
        let (mutations, _) = testing::clients(&server).await;

        let mut screen = CreatePostScreen::new(&mutations);
        screen.draft.content = "hello".to_string();
        screen.tag_input = "rust".to_string();
        screen.add_tag();

        let outcome = screen.submit().await;
        assert_eq!(outcome.navigation, Some(NavigationRequest::GoBack));
        assert!(screen.draft.content.is_empty());
        assert!(!screen.is_submitting());
    }
}
