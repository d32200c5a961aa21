//! Local stand-in for the Ledgerly API, served by axum on an ephemeral port.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use client::{
    Client, Credentials, FileStorage, MemoryStorage, RecordingNavigator, Session,
};
use serde_json::{Value, json};

pub const PASSWORD: &str = "secret";

pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

pub struct MockState {
    /// Access token the protected routes currently accept.
    pub valid_access: Mutex<String>,
    /// Refresh token `/auth/refresh` currently accepts.
    pub valid_refresh: Mutex<String>,
    pub refresh_ok: AtomicBool,
    pub reject_all: AtomicBool,
    pub logout_fails: AtomicBool,
    pub refresh_delay: Mutex<Duration>,
    pub generation: AtomicUsize,
    pub refresh_hits: AtomicUsize,
    pub logout_hits: AtomicUsize,
    pub login_hits: AtomicUsize,
    pub protected_hits: AtomicUsize,
    pub seen_auth: Mutex<Vec<Option<String>>>,
    pub seen_bodies: Mutex<Vec<Value>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            valid_access: Mutex::new("access-1".to_string()),
            valid_refresh: Mutex::new("refresh-1".to_string()),
            refresh_ok: AtomicBool::new(true),
            reject_all: AtomicBool::new(false),
            logout_fails: AtomicBool::new(false),
            refresh_delay: Mutex::new(Duration::ZERO),
            generation: AtomicUsize::new(1),
            refresh_hits: AtomicUsize::new(0),
            logout_hits: AtomicUsize::new(0),
            login_hits: AtomicUsize::new(0),
            protected_hits: AtomicUsize::new(0),
            seen_auth: Mutex::new(Vec::new()),
            seen_bodies: Mutex::new(Vec::new()),
        }
    }
}

impl MockState {
    pub fn refreshes(&self) -> usize {
        self.refresh_hits.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logout_hits.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.login_hits.load(Ordering::SeqCst)
    }

    pub fn protected(&self) -> usize {
        self.protected_hits.load(Ordering::SeqCst)
    }

    pub fn seen_auth(&self) -> Vec<Option<String>> {
        self.seen_auth.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.seen_bodies.lock().unwrap().last().cloned()
    }

    /// Makes the server reject the token the client currently holds.
    pub fn expire_access(&self) {
        *self.valid_access.lock().unwrap() = "access-server-only".to_string();
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }
}

impl MockApi {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = router(state.clone());
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                eprintln!("mock api failed: {err}");
            }
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Session + client pair wired to this server, with in-memory storage
    /// seeded with `credentials`.
    pub fn connect(&self, credentials: Credentials) -> Harness {
        let storage = Arc::new(MemoryStorage::with_credentials(credentials));
        self.connect_with(storage)
    }

    pub fn connect_with(&self, storage: Arc<dyn client::CredentialStorage>) -> Harness {
        let navigator = Arc::new(RecordingNavigator::default());
        let http = reqwest::Client::new();
        let session = Arc::new(
            Session::builder()
                .api_base(&self.base_url())
                .http(http.clone())
                .storage(storage)
                .navigator(navigator.clone())
                .build()
                .unwrap(),
        );
        session.init().unwrap();
        let client = Client::new(http, &self.base_url(), session.clone()).unwrap();
        Harness {
            session,
            client,
            navigator,
        }
    }
}

pub struct Harness {
    pub session: Arc<Session>,
    pub client: Client,
    pub navigator: Arc<RecordingNavigator>,
}

pub fn state_file(name: &str) -> FileStorage {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_state");
    std::fs::create_dir_all(&root).unwrap();
    FileStorage::new(root.join(format!("{name}_{}.json", uuid::Uuid::new_v4())))
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/account", get(accounts).post(account_new))
        .route("/api/category", get(categories))
        .route("/api/category/1", get(category_raw))
        .route("/api/transaction", get(transactions))
        .route("/api/report/monthly", get(report))
        .route("/api/broken", get(broken))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .with_state(state)
}

fn envelope(data: Value) -> Response {
    Json(json!({ "success": true, "data": data, "error": null })).into_response()
}

fn failure(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "data": null,
            "error": { "code": code, "message": message, "details": null }
        })),
    )
        .into_response()
}

/// Records the Authorization header and checks it against the accepted
/// token. Returns the rejection to send, if any.
fn guard(state: &MockState, headers: &HeaderMap) -> Option<Response> {
    state.protected_hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.seen_auth.lock().unwrap().push(auth.clone());

    let expected = format!("Bearer {}", state.valid_access.lock().unwrap());
    if state.reject_all.load(Ordering::SeqCst) || auth.as_deref() != Some(expected.as_str()) {
        return Some(failure(
            StatusCode::UNAUTHORIZED,
            "Auth.Unauthorized",
            "Token expired",
        ));
    }
    None
}

async fn accounts(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Some(rejection) = guard(&state, &headers) {
        return rejection;
    }
    envelope(json!([
        { "id": "a1", "name": "Wallet", "balance": 150000.0, "type": 1 },
        { "id": "a2", "name": "BCA", "balance": 2500000.5, "type": 2 },
        { "id": "a3", "name": "Mystery", "balance": 0.0, "type": 7 }
    ]))
}

async fn account_new(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = guard(&state, &headers) {
        return rejection;
    }
    state.seen_bodies.lock().unwrap().push(body.clone());
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return failure(
            StatusCode::BAD_REQUEST,
            "Account.NameRequired",
            "Name is required",
        );
    }
    envelope(json!({
        "id": "a9",
        "name": body["name"],
        "balance": body["initialBalance"],
        "type": body["type"]
    }))
}

async fn categories(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Some(rejection) = guard(&state, &headers) {
        return rejection;
    }
    envelope(json!([
        { "id": "1", "name": "Groceries", "type": 2 },
        { "id": "2", "name": "Salary", "type": 1 }
    ]))
}

async fn category_raw(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Some(rejection) = guard(&state, &headers) {
        return rejection;
    }
    Json(json!({ "id": "1", "name": "Groceries" })).into_response()
}

async fn transactions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = guard(&state, &headers) {
        return rejection;
    }
    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let page_size: u32 = query
        .get("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    envelope(json!({
        "items": [
            {
                "id": "t1",
                "accountId": "a1",
                "accountName": "Wallet",
                "categoryId": "1",
                "categoryName": "Groceries",
                "amount": 12500.0,
                "type": 2,
                "typeName": "Expense",
                "transactionDate": "2025-03-04T10:00:00Z",
                "note": null
            }
        ],
        "page": page,
        "pageSize": page_size,
        "totalCount": 21,
        "totalPages": 3
    }))
}

async fn report(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = guard(&state, &headers) {
        return rejection;
    }
    if query.get("year").map(String::as_str) != Some("2025")
        || query.get("month").map(String::as_str) != Some("3")
    {
        return envelope(Value::Null);
    }
    envelope(json!({
        "income": 5000000.0,
        "expense": 1250000.0,
        "nett": 3750000.0,
        "expenseByCategory": [ { "category": "Groceries", "amount": 1250000.0 } ]
    }))
}

async fn broken(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Some(rejection) = guard(&state, &headers) {
        return rejection;
    }
    (StatusCode::BAD_GATEWAY, "<html>upstream down</html>").into_response()
}

fn mint(state: &MockState) -> Value {
    let generation = state.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let access = format!("access-{generation}");
    let refresh = format!("refresh-{generation}");
    *state.valid_access.lock().unwrap() = access.clone();
    *state.valid_refresh.lock().unwrap() = refresh.clone();
    json!({ "accessToken": access, "refreshToken": refresh })
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.login_hits.fetch_add(1, Ordering::SeqCst);
    if body["password"] != PASSWORD {
        return failure(
            StatusCode::UNAUTHORIZED,
            "Auth.InvalidCredentials",
            "Invalid email or password",
        );
    }
    envelope(mint(&state))
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);
    let delay = *state.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let expected = state.valid_refresh.lock().unwrap().clone();
    if !state.refresh_ok.load(Ordering::SeqCst) || body["refreshToken"] != expected.as_str() {
        return failure(
            StatusCode::UNAUTHORIZED,
            "Auth.RefreshRejected",
            "Refresh token revoked",
        );
    }
    envelope(mint(&state))
}

async fn logout(State(state): State<Arc<MockState>>) -> Response {
    state.logout_hits.fetch_add(1, Ordering::SeqCst);
    if state.logout_fails.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    envelope(Value::Null)
}
