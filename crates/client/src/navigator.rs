use std::sync::{Mutex, PoisonError};

/// Moves the user to another route, e.g. the login screen after a forced
/// logout.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Navigator for headless use: the redirect is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        tracing::info!("redirecting to {route}");
    }
}

/// Keeps every redirect so the front end can act on it after a call settles.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        tracing::debug!("redirect recorded: {route}");
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}
