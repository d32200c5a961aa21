//! Decides what to do with a response, without touching the network.

use reqwest::StatusCode;

use crate::session::LOGIN_PATH;

/// Per-call replay counter. A call may be replayed at most
/// [`Attempt::MAX_REPLAYS`] times after a refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attempt(u8);

impl Attempt {
    pub const MAX_REPLAYS: u8 = 1;

    pub fn first() -> Self {
        Self(0)
    }

    pub fn replays(self) -> u8 {
        self.0
    }

    pub fn can_replay(self) -> bool {
        self.0 < Self::MAX_REPLAYS
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// 2xx: hand the body to the caller.
    Pass,
    /// Any other non-401 failure.
    Terminal,
    /// 401 from the login endpoint: bad credentials, not an expired session.
    LoginTerminal,
    /// 401 after the replay budget is spent.
    ForceLogout,
    /// First 401 on a protected path.
    RefreshAndRetry,
}

pub fn classify(status: StatusCode, path: &str, attempt: Attempt) -> Disposition {
    if status.is_success() {
        return Disposition::Pass;
    }
    if status != StatusCode::UNAUTHORIZED {
        return Disposition::Terminal;
    }
    if is_login_path(path) {
        return Disposition::LoginTerminal;
    }
    if attempt.can_replay() {
        Disposition::RefreshAndRetry
    } else {
        Disposition::ForceLogout
    }
}

/// True when `path` targets the login endpoint, ignoring any query string
/// and trailing slash.
pub fn is_login_path(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    let login = LOGIN_PATH.trim_start_matches('/');
    path == login || path.ends_with(LOGIN_PATH)
}
