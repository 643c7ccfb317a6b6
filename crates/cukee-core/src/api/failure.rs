//! What the client does, besides returning `ApiError::Auth`, when a session
//! cannot be recovered.

use std::fmt;
use std::sync::Arc;

use tracing::info;

/// Host-provided view navigation (a page router, a terminal prompt, ...)
pub trait Navigator: Send + Sync {
    /// Path of the view the user is currently on
    fn current_path(&self) -> String;

    fn navigate(&self, path: &str);
}

#[derive(Clone, Default)]
pub enum AuthFailureAction {
    /// Embedded contexts: clear the credential and let the caller handle the error
    #[default]
    ReturnError,
    /// Full-page contexts: also send the user to the login view
    RedirectToLogin(Arc<dyn Navigator>),
}

impl fmt::Debug for AuthFailureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailureAction::ReturnError => write!(f, "ReturnError"),
            AuthFailureAction::RedirectToLogin(_) => write!(f, "RedirectToLogin"),
        }
    }
}

impl AuthFailureAction {
    /// Returns true if a redirect happened.
    pub(crate) fn apply(&self, login_view: &str) -> bool {
        match self {
            AuthFailureAction::ReturnError => false,
            AuthFailureAction::RedirectToLogin(navigator) => {
                // Already on the login view: redirecting again would loop
                if navigator.current_path().trim_end_matches('/') == login_view.trim_end_matches('/') {
                    return false;
                }
                info!(to = login_view, "Session expired, redirecting to login");
                navigator.navigate(login_view);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FakeNavigator {
        current: Mutex<String>,
        visits: Mutex<Vec<String>>,
    }

    impl FakeNavigator {
        fn at(path: &str) -> Arc<Self> {
            Arc::new(Self {
                current: Mutex::new(path.to_string()),
                visits: Mutex::new(Vec::new()),
            })
        }
    }

    impl Navigator for FakeNavigator {
        fn current_path(&self) -> String {
            self.current.lock().unwrap().clone()
        }

        fn navigate(&self, path: &str) {
            *self.current.lock().unwrap() = path.to_string();
            self.visits.lock().unwrap().push(path.to_string());
        }
    }

    #[test]
    fn test_return_error_never_redirects() {
        assert!(!AuthFailureAction::ReturnError.apply("/auth/login"));
    }

    #[test]
    fn test_redirects_once() {
        let nav = FakeNavigator::at("/exhibition");
        let action = AuthFailureAction::RedirectToLogin(nav.clone());

        assert!(action.apply("/auth/login"));
        // Now on the login view, a second failure must not redirect again
        assert!(!action.apply("/auth/login"));
        assert_eq!(*nav.visits.lock().unwrap(), vec!["/auth/login".to_string()]);
    }

    #[test]
    fn test_no_redirect_from_login_view() {
        let nav = FakeNavigator::at("/auth/login/");
        let action = AuthFailureAction::RedirectToLogin(nav.clone());
        assert!(!action.apply("/auth/login"));
        assert!(nav.visits.lock().unwrap().is_empty());
    }
}
