//! Registration screen

use app_core::auth::{AuthService, RegisterParams};
use app_core::AppError;

use super::{discarded, Alert, MountFlag, ScreenOutcome, ERROR_TITLE};
use crate::navigation::{NavigationRequest, Route};

/// Account creation form
pub struct RegisterScreen {
    auth: AuthService,
    /// Form fields
    pub form: RegisterParams,
    error: Option<String>,
    submitting: bool,
    mount: MountFlag,
}

impl RegisterScreen {
    /// Create an empty form
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            form: RegisterParams::default(),
            error: None,
            submitting: false,
            mount: MountFlag::new(),
        }
    }

    /// Inline message from the last failed submission
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a request is in flight
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Submit the form
    ///
    /// On success the user is greeted and this screen is replaced by Login.
    pub async fn submit(&mut self) -> ScreenOutcome {
        self.submitting = true;
        let result = self.auth.register(self.form.clone()).await;
        if !self.mount.is_mounted() {
            return discarded("register", "submit");
        }
        self.submitting = false;

        match result {
            Ok(user) => {
                self.error = None;
                tracing::info!(username = %user.username, "account created");
                let welcome = Alert::new("Register successful", format!("Welcome, {}!", self.form.name));
                self.form = RegisterParams::default();
                ScreenOutcome::alert(welcome).with_navigation(NavigationRequest::Replace(Route::Login))
            }
            Err(AppError::Validation(e)) => ScreenOutcome::alert(Alert::new(ERROR_TITLE, e.message)),
            Err(e) => {
                self.error = Some(e.user_message());
                ScreenOutcome::failed("Register failed", e)
            }
        }
    }

    /// Mount flag of this screen
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mount
    }
}
