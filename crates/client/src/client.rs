//! Authenticated HTTP client.
//!
//! Every request goes through [`Client::send_raw`]: the access token is
//! attached as a bearer credential, and a 401 on a protected path triggers a
//! single refresh followed by a single replay. Concurrent 401s share one
//! in-flight refresh. When refresh fails, or the replay is rejected again,
//! the session is logged out and the call fails with
//! [`ClientError::SessionExpired`].

use std::sync::Arc;

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use reqwest::{Method, Url};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::{
    classify::{Attempt, Disposition, classify},
    error::{ApiError, ClientError, Result},
    session::SessionStore,
};

type RefreshOutcome = std::result::Result<(), Arc<ClientError>>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Description of one outbound call. Replays reuse it unchanged.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Joins `path` onto the base URL, keeping any path prefix of the base
/// (e.g. `/api`).
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let raw = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|err| ClientError::InvalidUrl(format!("{raw}: {err}")))
}

#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    api_base: Url,
    session: Arc<dyn SessionStore>,
    pending: Mutex<Option<PendingRefresh>>,
}

impl Client {
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|err| ClientError::InvalidUrl(format!("{api_base}: {err}")))?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                api_base,
                session,
                pending: Mutex::new(None),
            }),
        })
    }

    /// Sends the request and deserializes a successful body.
    pub async fn send<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let body = self.send_raw(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Sends the request and discards a successful body.
    pub async fn send_unit(&self, request: &ApiRequest) -> Result<()> {
        self.send_raw(request).await.map(|_| ())
    }

    /// Sends the request and returns a successful body unchanged.
    pub async fn send_raw(&self, request: &ApiRequest) -> Result<Vec<u8>> {
        let mut attempt = Attempt::first();

        loop {
            let token = self.inner.session.access_token();
            let response = self.dispatch(request, token.as_deref(), attempt).await?;
            let status = response.status();

            match classify(status, &request.path, attempt) {
                Disposition::Pass => return Ok(response.bytes().await?.to_vec()),
                Disposition::Terminal | Disposition::LoginTerminal => {
                    let body = response.bytes().await.unwrap_or_default();
                    return Err(ClientError::Api(ApiError::from_body(
                        Some(status.as_u16()),
                        &body,
                    )));
                }
                Disposition::ForceLogout => {
                    tracing::warn!(
                        path = %request.path,
                        "request rejected after refresh, forcing logout"
                    );
                    self.inner.session.logout().await;
                    return Err(ClientError::SessionExpired);
                }
                Disposition::RefreshAndRetry => {
                    attempt = attempt.next();
                    if let Err(err) = self.refresh_shared(token.as_deref()).await {
                        tracing::warn!(
                            path = %request.path,
                            "refresh failed, forcing logout: {err}"
                        );
                        self.inner.session.logout().await;
                        return Err(ClientError::SessionExpired);
                    }
                }
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
        attempt: Attempt,
    ) -> Result<reqwest::Response> {
        let url = endpoint(&self.inner.api_base, &request.path)?;
        let mut builder = self.inner.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authenticated = token.is_some(),
            replay = attempt.replays(),
            "sending request"
        );
        Ok(builder.send().await?)
    }

    /// Runs the session refresh, or joins the one already in flight.
    ///
    /// `sent_with` is the token the rejected request carried. If the session
    /// already holds a different one, another call refreshed in the meantime
    /// and the caller can replay straight away.
    ///
    /// The refresh runs on its own task, so it completes even when every
    /// caller waiting on it is dropped.
    async fn refresh_shared(&self, sent_with: Option<&str>) -> RefreshOutcome {
        let pending = {
            let mut slot = self.inner.pending.lock().await;
            match slot.as_ref() {
                Some(pending) => {
                    tracing::debug!("joining in-flight refresh");
                    pending.clone()
                }
                None => {
                    let current = self.inner.session.access_token();
                    if current.is_some() && current.as_deref() != sent_with {
                        tracing::debug!("token already rotated, skipping refresh");
                        return Ok(());
                    }

                    let inner = Arc::clone(&self.inner);
                    let task = tokio::spawn(async move {
                        let outcome = inner.session.refresh().await.map_err(Arc::new);
                        // The slot holds this refresh: it was installed before
                        // the spawning call released the lock.
                        *inner.pending.lock().await = None;
                        outcome
                    });
                    let refresh = async move {
                        task.await
                            .unwrap_or_else(|err| Err(Arc::new(ClientError::from(err))))
                    }
                    .boxed()
                    .shared();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        pending.await
    }
}
