//! Session store: owns the credential pair and the operations that mutate it.
//!
//! The authenticated client only reads the access token and asks the store
//! to refresh or log out, through [`SessionStore`].

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use api_types::{
    auth::{AuthTokens, LoginRequest, LogoutRequest, RefreshRequest},
    envelope::ApiResponse,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;

use crate::{
    client::endpoint,
    error::{ApiError, ClientError, Result},
    navigator::{LogNavigator, Navigator},
    storage::{CredentialStorage, MemoryStorage},
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";

const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Access/refresh token pair. Either both are held or neither is.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    tokens: Option<(String, String)>,
}

impl Credentials {
    pub fn empty() -> Self {
        Self { tokens: None }
    }

    pub fn pair(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            tokens: Some((access_token.into(), refresh_token.into())),
        }
    }

    /// Builds a pair from loosely typed parts; a missing or blank half
    /// yields no session at all.
    pub fn from_parts(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        match (access_token, refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Self::pair(access, refresh)
            }
            _ => Self::empty(),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|(access, _)| access.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|(_, refresh)| refresh.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("present", &self.tokens.is_some())
            .finish()
    }
}

impl From<AuthTokens> for Credentials {
    fn from(tokens: AuthTokens) -> Self {
        Credentials::from_parts(Some(tokens.access_token), Some(tokens.refresh_token))
    }
}

/// What the authenticated client needs from a session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn access_token(&self) -> Option<String>;

    /// Mints a new pair from the held refresh token. Never logs out on
    /// failure.
    async fn refresh(&self) -> Result<()>;

    /// Clears the session and redirects to the login route. Always
    /// succeeds locally.
    async fn logout(&self);
}

pub struct Session {
    http: reqwest::Client,
    api_base: Url,
    login_route: String,
    credentials: RwLock<Credentials>,
    storage: Arc<dyn CredentialStorage>,
    navigator: Arc<dyn Navigator>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Restores the pair from durable storage. Safe to call repeatedly.
    pub fn init(&self) -> Result<()> {
        let stored = self.storage.load()?;
        if !stored.is_empty() {
            tracing::debug!("restored session from storage");
        }
        *self.write() = stored;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().access_token().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token().map(str::to_string)
    }

    pub fn credentials(&self) -> Credentials {
        self.read().clone()
    }

    /// Exchanges email and password for a token pair.
    ///
    /// On rejection the held session is left as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let credentials = self
            .request_tokens(LOGIN_PATH, &payload)
            .await
            .map_err(|err| match err {
                ClientError::Api(err) => ClientError::Auth(err),
                other => other,
            })?;

        self.storage.save(&credentials)?;
        *self.write() = credentials;
        tracing::info!("logged in");
        Ok(())
    }

    pub async fn refresh(&self) -> Result<()> {
        let Some(refresh_token) = self.read().refresh_token().map(str::to_string) else {
            return Err(ClientError::NoRefreshToken);
        };

        let credentials = self
            .request_tokens(
                REFRESH_PATH,
                &RefreshRequest {
                    refresh_token: refresh_token.clone(),
                },
            )
            .await?;

        // The pair may have changed while the request was in flight. Only
        // the pair the refresh was issued for may be replaced.
        let mut held = self.write();
        if held.refresh_token() != Some(refresh_token.as_str()) {
            if held.is_empty() {
                tracing::info!("session ended during refresh, dropping new tokens");
                return Err(ClientError::SessionExpired);
            }
            tracing::debug!("session replaced during refresh, keeping current tokens");
            return Ok(());
        }
        if let Err(err) = self.storage.save(&credentials) {
            tracing::warn!("failed to persist refreshed session: {err}");
        }
        *held = credentials;
        tracing::info!("session refreshed");
        Ok(())
    }

    pub async fn logout(&self) {
        let held = self.credentials();
        if let Some(refresh_token) = held.refresh_token() {
            let payload = LogoutRequest {
                refresh_token: refresh_token.to_string(),
            };
            if let Err(err) = self.notify_logout(&payload, held.access_token()).await {
                tracing::warn!("server logout failed, clearing session anyway: {err}");
            }
        }

        {
            let mut held = self.write();
            *held = Credentials::empty();
            if let Err(err) = self.storage.clear() {
                tracing::warn!("failed to clear stored session: {err}");
            }
        }
        tracing::info!("session cleared");
        self.navigator.redirect(&self.login_route);
    }

    async fn notify_logout(
        &self,
        payload: &LogoutRequest,
        access_token: Option<&str>,
    ) -> Result<()> {
        let mut req = self
            .http
            .post(endpoint(&self.api_base, LOGOUT_PATH)?)
            .json(payload);
        if let Some(token) = access_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.bytes().await.unwrap_or_default();
        Err(ClientError::Api(ApiError::from_body(Some(status.as_u16()), &body)))
    }

    /// Posts to an auth endpoint and extracts the token pair from the
    /// envelope. Goes straight to the transport: a 401 here must never
    /// trigger another refresh.
    async fn request_tokens<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Credentials> {
        let resp = self
            .http
            .post(endpoint(&self.api_base, path)?)
            .json(payload)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Api(ApiError::from_body(
                Some(status.as_u16()),
                &body,
            )));
        }

        let envelope: ApiResponse<AuthTokens> = serde_json::from_slice(&body)?;
        let credentials = match envelope.into_result() {
            Ok(Some(tokens)) => Credentials::from(tokens),
            Ok(None) => Credentials::empty(),
            Err(Some(error)) => {
                return Err(ClientError::Api(ApiError::from_envelope(
                    Some(status.as_u16()),
                    error,
                )));
            }
            Err(None) => return Err(ClientError::Api(ApiError::generic(Some(status.as_u16())))),
        };

        if credentials.is_empty() {
            return Err(ClientError::Api(ApiError::with_message(
                Some(status.as_u16()),
                "Response carried no tokens",
            )));
        }
        Ok(credentials)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Credentials> {
        self.credentials.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Credentials> {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for Session {
    fn access_token(&self) -> Option<String> {
        Session::access_token(self)
    }

    async fn refresh(&self) -> Result<()> {
        Session::refresh(self).await
    }

    async fn logout(&self) {
        Session::logout(self).await
    }
}

#[derive(Default)]
pub struct SessionBuilder {
    api_base: String,
    http: Option<reqwest::Client>,
    login_route: Option<String>,
    storage: Option<Arc<dyn CredentialStorage>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl SessionBuilder {
    pub fn api_base(mut self, api_base: &str) -> SessionBuilder {
        self.api_base = api_base.to_string();
        self
    }

    pub fn http(mut self, http: reqwest::Client) -> SessionBuilder {
        self.http = Some(http);
        self
    }

    pub fn login_route(mut self, route: &str) -> SessionBuilder {
        self.login_route = Some(route.to_string());
        self
    }

    pub fn storage(mut self, storage: Arc<dyn CredentialStorage>) -> SessionBuilder {
        self.storage = Some(storage);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> SessionBuilder {
        self.navigator = Some(navigator);
        self
    }

    /// Builds the session. The pair starts empty until [`Session::init`].
    pub fn build(self) -> Result<Session> {
        let api_base = Url::parse(&self.api_base)
            .map_err(|err| ClientError::InvalidUrl(format!("{}: {err}", self.api_base)))?;

        Ok(Session {
            http: self.http.unwrap_or_default(),
            api_base,
            login_route: self
                .login_route
                .unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_string()),
            credentials: RwLock::new(Credentials::empty()),
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(MemoryStorage::default())),
            navigator: self.navigator.unwrap_or_else(|| Arc::new(LogNavigator)),
        })
    }
}
