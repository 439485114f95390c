//! Mock backend lifecycle management
//!
//! Each test gets an isolated axum server with its own users, bins and
//! telemetry channel. The REST routes mirror the waste management backend;
//! `GET /{channel}.json` streams server-sent events the way the realtime
//! database does.

use super::constants::*;
use super::fixtures::{issue_token, seed_bins, seed_users, StoredUser};
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use waste_console::api::{BinFields, BinRecord, UserRecord};
use waste_console::session::UserRole;

type HandlerResult = Result<Response, Response>;

/// In-memory state of the mock backend
pub struct BackendState {
    pub users: Mutex<Vec<StoredUser>>,
    pub bins: Mutex<Vec<BinRecord>>,
    revoked: Mutex<HashSet<String>>,
    telemetry: broadcast::Sender<String>,
    /// DELETE /bins/{id} calls received, successful or not
    pub bin_delete_calls: AtomicUsize,
    /// `auth` query parameter of the last telemetry stream request
    pub stream_auth: Mutex<Option<String>>,
}

impl BackendState {
    fn new() -> Self {
        let (telemetry, _) = broadcast::channel(64);
        Self {
            users: Mutex::new(seed_users()),
            bins: Mutex::new(seed_bins()),
            revoked: Mutex::new(HashSet::new()),
            telemetry,
            bin_delete_calls: AtomicUsize::new(0),
            stream_auth: Mutex::new(None),
        }
    }

    fn fresh_id(prefix: &str) -> String {
        format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
    }

    /// Claims of the bearer token, None when the request carries none.
    fn caller(&self, headers: &HeaderMap) -> Result<Option<Value>, Response> {
        let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        else {
            return Ok(None);
        };
        if self.revoked.lock().unwrap().contains(token) {
            return Err(error(StatusCode::UNAUTHORIZED, "Session expired"));
        }
        match decode::<Value>(
            token,
            &DecodingKey::from_secret(JWT_SECRET),
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(data) => Ok(Some(data.claims)),
            Err(_) => Err(error(StatusCode::UNAUTHORIZED, "Invalid token")),
        }
    }

    fn require_admin(&self, headers: &HeaderMap) -> Result<(), Response> {
        match self.caller(headers)? {
            Some(claims) if claims["role"] == "admin" => Ok(()),
            Some(_) => Err(error(StatusCode::FORBIDDEN, "Access denied")),
            None => Err(error(StatusCode::UNAUTHORIZED, "Token not found")),
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "errorMessage": message }))).into_response()
}

fn message(text: &str) -> Response {
    Json(json!({ "message": text })).into_response()
}

fn not_found(what: &str) -> Response {
    error(StatusCode::NOT_FOUND, &format!("{} not found", what))
}

// ============================================================================
// Users
// ============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserBody {
    first_name: String,
    last_name: String,
    email: String,
    #[serde(default)]
    password: Option<String>,
    batch: String,
    #[serde(default)]
    role: UserRole,
}

#[derive(Deserialize)]
struct PasswordBody {
    password: String,
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<LoginBody>) -> HandlerResult {
    let users = state.users.lock().unwrap();
    let Some(user) = users.iter().find(|u| u.record.email == body.email) else {
        return Err(error(StatusCode::BAD_REQUEST, "User not found"));
    };
    if user.password != body.password {
        return Err(error(StatusCode::BAD_REQUEST, "Incorrect Password"));
    }
    Ok(Json(json!({
        "token": issue_token(&user.record),
        "role": user.record.role.as_str(),
        "message": "Login Successfull",
    }))
    .into_response())
}

async fn list_users(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> HandlerResult {
    state.require_admin(&headers)?;
    let users: Vec<UserRecord> = state
        .users
        .lock()
        .unwrap()
        .iter()
        .map(|u| u.record.clone())
        .collect();
    Ok(Json(json!({ "data": users, "message": "Users fetched" })).into_response())
}

async fn get_user(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult {
    state.require_admin(&headers)?;
    let users = state.users.lock().unwrap();
    let user = users
        .iter()
        .find(|u| u.record.id == id)
        .ok_or_else(|| not_found("User"))?;
    Ok(Json(json!({ "data": user.record })).into_response())
}

async fn create_user(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<UserBody>,
) -> HandlerResult {
    state.require_admin(&headers)?;
    let mut users = state.users.lock().unwrap();
    if users.iter().any(|u| u.record.email == body.email) {
        return Err(error(StatusCode::BAD_REQUEST, "User already exists"));
    }
    users.push(StoredUser {
        record: UserRecord {
            id: BackendState::fresh_id("u"),
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            batch: body.batch,
            role: body.role,
        },
        password: body.password.unwrap_or_default(),
    });
    Ok(message("User Created Successfully"))
}

async fn update_user(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UserBody>,
) -> HandlerResult {
    state.require_admin(&headers)?;
    let mut users = state.users.lock().unwrap();
    let user = users
        .iter_mut()
        .find(|u| u.record.id == id)
        .ok_or_else(|| not_found("User"))?;
    user.record.first_name = body.first_name;
    user.record.last_name = body.last_name;
    user.record.email = body.email;
    user.record.batch = body.batch;
    user.record.role = body.role;
    Ok(message("User Edited Successfully"))
}

async fn delete_user(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult {
    state.require_admin(&headers)?;
    let mut users = state.users.lock().unwrap();
    let before = users.len();
    users.retain(|u| u.record.id != id);
    if users.len() == before {
        return Err(not_found("User"));
    }
    Ok(message("User Deleted Successfully"))
}

async fn change_password(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> HandlerResult {
    state.require_admin(&headers)?;
    // Only the password may be sent.
    if body.as_object().map(|o| o.len()) != Some(1) {
        return Err(error(StatusCode::BAD_REQUEST, "Unexpected fields"));
    }
    let body: PasswordBody = serde_json::from_value(body)
        .map_err(|_| error(StatusCode::BAD_REQUEST, "Password is required"))?;
    let mut users = state.users.lock().unwrap();
    let user = users
        .iter_mut()
        .find(|u| u.record.id == id)
        .ok_or_else(|| not_found("User"))?;
    user.password = body.password;
    Ok(message("Password Updated Successfully"))
}

// ============================================================================
// Bins
// ============================================================================

async fn list_bins(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> HandlerResult {
    state.caller(&headers)?;
    let bins = state.bins.lock().unwrap().clone();
    Ok(Json(json!({ "data": bins })).into_response())
}

async fn get_bin(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult {
    state.caller(&headers)?;
    let bins = state.bins.lock().unwrap();
    let bin = bins
        .iter()
        .find(|b| b.id == id)
        .ok_or_else(|| not_found("Bin"))?;
    Ok(Json(json!({ "data": bin })).into_response())
}

async fn create_bin(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<BinFields>,
) -> HandlerResult {
    state.caller(&headers)?;
    state.bins.lock().unwrap().push(BinRecord {
        id: BackendState::fresh_id("b"),
        bin_name: body.bin_name,
        bin_location: body.bin_location,
        bin_color: body.bin_color,
    });
    Ok(message("Bin Created Successfully"))
}

async fn update_bin(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<BinFields>,
) -> HandlerResult {
    state.caller(&headers)?;
    let mut bins = state.bins.lock().unwrap();
    let bin = bins
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| not_found("Bin"))?;
    bin.bin_name = body.bin_name;
    bin.bin_location = body.bin_location;
    bin.bin_color = body.bin_color;
    Ok(message("Bin Edited Successfully"))
}

async fn delete_bin(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult {
    state.bin_delete_calls.fetch_add(1, Ordering::SeqCst);
    state.caller(&headers)?;
    let mut bins = state.bins.lock().unwrap();
    let before = bins.len();
    bins.retain(|b| b.id != id);
    if bins.len() == before {
        return Err(not_found("Bin"));
    }
    Ok(message("Bin Deleted Successfully"))
}

// ============================================================================
// Telemetry
// ============================================================================

async fn stream_node(
    State(state): State<Arc<BackendState>>,
    Path(node): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if node.strip_suffix(".json") != Some(FEED_CHANNEL) {
        return not_found("Node");
    }
    *state.stream_auth.lock().unwrap() = query.get("auth").cloned();

    let rx = state.telemetry.subscribe();
    let events = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(chunk) => return Some((Ok::<_, Infallible>(chunk), rx)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(events))
        .unwrap()
}

fn make_app(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/users/login", post(login))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/change-password/{id}", put(change_password))
        .route("/bins", get(list_bins).post(create_bin))
        .route("/bins/{id}", get(get_bin).put(update_bin).delete(delete_bin))
        .route("/{node}", get(stream_node))
        .with_state(state)
}

/// Mock backend instance
///
/// When dropped, the server shuts down.
pub struct TestServer {
    /// Base URL for requests (e.g., "http://127.0.0.1:12345"), also used as
    /// the realtime database URL
    pub base_url: String,

    pub state: Arc<BackendState>,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a mock backend on a random port and waits until it answers.
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::new());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let app = make_app(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            state,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        loop {
            if start.elapsed() > Duration::from_millis(SERVER_READY_TIMEOUT_MS) {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }
            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await,
            }
        }
    }

    /// Makes every later request carrying `token` fail with 401.
    pub fn revoke(&self, token: &str) {
        self.state.revoked.lock().unwrap().insert(token.to_string());
    }

    pub fn user(&self, id: &str) -> Option<StoredUser> {
        self.state
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.record.id == id)
            .cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<StoredUser> {
        self.state
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.record.email == email)
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.state.users.lock().unwrap().len()
    }

    pub fn bins(&self) -> Vec<BinRecord> {
        self.state.bins.lock().unwrap().clone()
    }

    pub fn bin_delete_calls(&self) -> usize {
        self.state.bin_delete_calls.load(Ordering::SeqCst)
    }

    /// Number of telemetry streams currently connected.
    pub fn open_streams(&self) -> usize {
        self.state.telemetry.receiver_count()
    }

    pub async fn wait_for_stream(&self) {
        let start = std::time::Instant::now();
        while self.open_streams() == 0 {
            if start.elapsed() > Duration::from_millis(TELEMETRY_TIMEOUT_MS) {
                panic!("No telemetry stream connected within {}ms", TELEMETRY_TIMEOUT_MS);
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
    }

    /// Waits until every client stream is gone. Keep-alives are pushed
    /// meanwhile, so a closed connection is noticed on the next write.
    pub async fn wait_for_streams_closed(&self) {
        let start = std::time::Instant::now();
        while self.open_streams() > 0 {
            if start.elapsed() > Duration::from_millis(TELEMETRY_TIMEOUT_MS) {
                panic!(
                    "{} telemetry stream(s) still open after {}ms",
                    self.open_streams(),
                    TELEMETRY_TIMEOUT_MS
                );
            }
            self.push_event("keep-alive", "null");
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
    }

    pub fn stream_auth(&self) -> Option<String> {
        self.state.stream_auth.lock().unwrap().clone()
    }

    /// Sends one raw event to every connected stream.
    pub fn push_event(&self, event: &str, data: &str) {
        let _ = self
            .state
            .telemetry
            .send(format!("event: {}\ndata: {}\n\n", event, data));
    }

    pub fn push_put(&self, path: &str, data: Value) {
        self.push_event("put", &json!({ "path": path, "data": data }).to_string());
    }

    pub fn push_patch(&self, path: &str, data: Value) {
        self.push_event("patch", &json!({ "path": path, "data": data }).to_string());
    }

    /// Publishes a reading the way the sensor does, as the whole node.
    pub fn push_reading(&self, height: f64, percentage: f64) {
        self.push_put("/", json!({ "height": height, "percentage": percentage }));
    }
}
