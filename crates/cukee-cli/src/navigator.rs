use std::sync::Mutex;

use cukee_core::config::DEFAULT_LOGIN_VIEW;
use cukee_core::Navigator;

/// Maps CLI commands onto view paths so the core client can "redirect".
///
/// Redirecting to the login view prints a hint instead of opening a page.
pub struct TerminalNavigator {
    current: Mutex<String>,
    login_command: &'static str,
}

impl TerminalNavigator {
    pub fn new(command: &str, login_command: &'static str) -> Self {
        Self {
            current: Mutex::new(Self::view_for(command)),
            login_command,
        }
    }

    fn view_for(command: &str) -> String {
        match command {
            // Signing in or out already deals with the session itself
            "login" | "logout" => DEFAULT_LOGIN_VIEW.to_string(),
            other => format!("/{}", other),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .map(|path| path.clone())
            .unwrap_or_default()
    }

    fn navigate(&self, path: &str) {
        if let Ok(mut current) = self.current.lock() {
            *current = path.to_string();
        }
        if path == DEFAULT_LOGIN_VIEW {
            eprintln!(
                "Your session has expired. Run `{}` to sign in again.",
                self.login_command
            );
        }
    }
}
