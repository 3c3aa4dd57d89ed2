//! Login screen

use app_core::auth::{AuthService, LoginParams};
use app_core::AppError;

use super::{discarded, Alert, MountFlag, ScreenOutcome, ERROR_TITLE};
use crate::navigation::Route;

/// Sign-in form
///
/// A successful login only changes the session status. The host rebuilds
/// the navigation tree from it, so no navigation is requested here.
pub struct LoginScreen {
    auth: AuthService,
    /// Username field
    pub username: String,
    /// Password field
    pub password: String,
    submitting: bool,
    mount: MountFlag,
}

impl LoginScreen {
    /// Create an empty form
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            username: String::new(),
            password: String::new(),
            submitting: false,
            mount: MountFlag::new(),
        }
    }

    /// Whether a login request is in flight
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Submit the form
    pub async fn submit(&mut self) -> ScreenOutcome {
        let params = LoginParams::new(self.username.clone(), self.password.clone());

        self.submitting = true;
        let result = self.auth.login(&params).await;
        if !self.mount.is_mounted() {
            return discarded("login", "submit");
        }
        self.submitting = false;

        match result {
            Ok(()) => {
                self.password.clear();
                ScreenOutcome::none()
            }
            Err(AppError::Validation(e)) => ScreenOutcome::alert(Alert::new(ERROR_TITLE, e.message)),
            Err(e) => ScreenOutcome::failed("Login failed", e),
        }
    }

    /// Open the registration form
    pub fn sign_up(&self) -> ScreenOutcome {
        ScreenOutcome::push(Route::Register)
    }

    /// Mount flag of this screen
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mount
    }
}
