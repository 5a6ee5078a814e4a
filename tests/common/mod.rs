//! Stub records backend shared by the integration tests. It fakes the
//! external collaborator: `/auth/*` issues numbered token pairs (A1/R1,
//! A2/R2, ...) and `/std/reads` accepts exactly the current access token,
//! answering 403 otherwise, the documented trigger for refresh-then-retry.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub struct Stub {
    /// Number of the most recently issued token pair.
    pub counter: Mutex<u32>,
    /// Access token `/std/reads` currently accepts.
    pub access_valid: Mutex<String>,
    /// Refresh token `/auth/refresh` currently accepts.
    pub refresh_valid: Mutex<String>,
    /// When false, `/auth/refresh` always answers 401.
    pub refresh_ok: Mutex<bool>,
    pub refresh_calls: Mutex<u32>,
    /// Authorization headers observed by `/std/reads`, in order.
    pub reads_auth_seen: Mutex<Vec<String>>,
    /// When set, `/std/reads` answers this status/message unconditionally.
    pub reads_forced_error: Mutex<Option<(u16, String)>>,
    /// Success payload for `/std/reads`.
    pub students: Mutex<Value>,
}

impl Stub {
    pub fn new() -> Arc<Stub> {
        Arc::new(Stub {
            counter: Mutex::new(0),
            access_valid: Mutex::new(String::new()),
            refresh_valid: Mutex::new(String::new()),
            refresh_ok: Mutex::new(true),
            refresh_calls: Mutex::new(0),
            reads_auth_seen: Mutex::new(Vec::new()),
            reads_forced_error: Mutex::new(None),
            students: Mutex::new(json!([])),
        })
    }

    /// Invalidate the outstanding access token so the next protected call
    /// gets a 403 until a refresh issues the next pair.
    pub fn expire_access(&self) {
        *self.access_valid.lock() = "<expired>".to_string();
    }
}

async fn login(State(st): State<Arc<Stub>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body.get("username").and_then(|v| v.as_str()).unwrap_or("");
    let password = body.get("password").and_then(|v| v.as_str()).unwrap_or("");
    if username != "alice" || password != "secret" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"})));
    }
    let mut counter = st.counter.lock();
    *counter = 1;
    let access = format!("A{}", *counter);
    let refresh = format!("R{}", *counter);
    *st.access_valid.lock() = access.clone();
    *st.refresh_valid.lock() = refresh.clone();
    (
        StatusCode::OK,
        Json(json!({
            "accessToken": access,
            "refreshToken": refresh,
            "user": {"username": "alice", "email": "a@x.com", "role": "2"}
        })),
    )
}

async fn register(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body.get("username").and_then(|v| v.as_str()).unwrap_or("");
    if username == "taken" {
        return (StatusCode::CONFLICT, Json(json!({"message": "username already taken"})));
    }
    (StatusCode::OK, Json(json!({"message": "Registration successful"})))
}

async fn refresh(State(st): State<Arc<Stub>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    *st.refresh_calls.lock() += 1;
    if !*st.refresh_ok.lock() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "refresh token expired"})));
    }
    let presented = body.get("refreshToken").and_then(|v| v.as_str()).unwrap_or("");
    if presented != st.refresh_valid.lock().as_str() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "invalid refresh token"})));
    }
    let mut counter = st.counter.lock();
    *counter += 1;
    let access = format!("A{}", *counter);
    let refresh = format!("R{}", *counter);
    *st.access_valid.lock() = access.clone();
    *st.refresh_valid.lock() = refresh.clone();
    (StatusCode::OK, Json(json!({"accessToken": access, "refreshToken": refresh})))
}

async fn reads(State(st): State<Arc<Stub>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if let Some((status, message)) = st.reads_forced_error.lock().clone() {
        return (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(json!({"message": message})),
        );
    }
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    st.reads_auth_seen.lock().push(auth.clone());
    let expected = format!("Bearer {}", st.access_valid.lock());
    if auth != expected {
        return (StatusCode::FORBIDDEN, Json(json!({"message": "token expired"})));
    }
    (StatusCode::OK, Json(st.students.lock().clone()))
}

/// Bind the stub to an ephemeral port. Caller aborts the handle to stop it.
pub async fn start_stub(state: Arc<Stub>) -> (JoinHandle<()>, String) {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/std/reads", get(reads))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("stub server task error: {e:?}");
        }
    });
    (handle, format!("http://{}", addr))
}

/// Abort guard so a failed assertion still stops the server task.
pub struct Guard(pub JoinHandle<()>);

impl Drop for Guard {
    fn drop(&mut self) {
        self.0.abort();
    }
}
