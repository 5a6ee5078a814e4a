//! End-to-end authentication flows against the stub backend: login, the
//! 403 -> refresh -> retry-once policy, and the auth endpoints' error
//! surfaces.

mod common;

use std::time::Duration;

use registra::api::ApiClient;
use registra::error::AppError;
use registra::session::{
    Credential, MemorySessionStore, Role, SessionManager, LOGOUT_MESSAGE, REFRESH_TOKEN_KEY,
};
use serde_json::json;

use common::{start_stub, Guard, Stub};

async fn logged_in_manager(base: &str) -> (ApiClient, SessionManager) {
    let api = ApiClient::new(base).unwrap();
    let mgr = SessionManager::new(api.clone(), Box::new(MemorySessionStore::new()));
    let reply = api.login("alice", "secret").await.expect("login");
    mgr.update_session(
        Credential { access_token: reply.access_token, refresh_token: reply.refresh_token },
        reply.user,
    );
    (api, mgr)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_then_403_triggers_one_refresh_and_one_retry() {
    let stub = Stub::new();
    *stub.students.lock() = json!([{
        "student": {"std_id": "67001", "std_Fname": "Somchai", "std_Lname": "Dee"},
        "studentDetails": {},
        "studentSchool": {"sch_province": "Songkhla"}
    }]);
    let (srv, base) = start_stub(stub.clone()).await;
    let _g = Guard(srv);

    let (api, mgr) = logged_in_manager(&base).await;
    assert!(mgr.is_authenticated());
    assert_eq!(mgr.identity().unwrap().role, Role::User);
    assert_eq!(mgr.access_token().as_deref(), Some("A1"));

    // Invalidate A1: the next protected call answers 403 until refreshed
    stub.expire_access();

    let rows = mgr
        .with_auth(move |token| {
            let api = api.clone();
            async move { api.list_students(&token).await }
        })
        .await
        .expect("retried call must succeed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].student.std_fname, "Somchai");

    // Exactly one refresh; retry carried the fresh bearer token
    assert_eq!(*stub.refresh_calls.lock(), 1);
    assert_eq!(
        stub.reads_auth_seen.lock().as_slice(),
        ["Bearer A1".to_string(), "Bearer A2".to_string()]
    );

    // Identity untouched, tokens rotated everywhere
    let identity = mgr.identity().unwrap();
    assert_eq!(identity.username, "alice");
    assert_eq!(identity.email, "a@x.com");
    assert_eq!(identity.role, Role::User);
    assert_eq!(mgr.access_token().as_deref(), Some("A2"));
    assert_eq!(mgr.persisted(REFRESH_TOKEN_KEY).as_deref(), Some("R2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_refresh_surfaces_the_original_error_and_logs_out() {
    let stub = Stub::new();
    let (srv, base) = start_stub(stub.clone()).await;
    let _g = Guard(srv);

    let (api, mgr) = logged_in_manager(&base).await;
    stub.expire_access();
    *stub.refresh_ok.lock() = false;

    let err = mgr
        .with_auth(move |token| {
            let api = api.clone();
            async move { api.list_students(&token).await }
        })
        .await
        .expect_err("call must fail when the refresh fails");

    // The 403 from the original request, not the refresh failure
    assert_eq!(err, AppError::AuthExpired { message: "token expired".into() });
    assert_eq!(*stub.refresh_calls.lock(), 1);
    assert_eq!(stub.reads_auth_seen.lock().len(), 1, "no retry without a successful refresh");
    assert!(!mgr.is_authenticated(), "refresh failure escalates to logout");
    assert_eq!(mgr.logout_message().as_deref(), Some(LOGOUT_MESSAGE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_auth_errors_pass_through_without_refresh() {
    let stub = Stub::new();
    *stub.reads_forced_error.lock() = Some((500, "boom".to_string()));
    let (srv, base) = start_stub(stub.clone()).await;
    let _g = Guard(srv);

    let (api, mgr) = logged_in_manager(&base).await;
    let err = mgr
        .with_auth(move |token| {
            let api = api.clone();
            async move { api.list_students(&token).await }
        })
        .await
        .expect_err("forced backend error");

    assert_eq!(err, AppError::Backend { status: 500, message: "boom".into() });
    assert_eq!(*stub.refresh_calls.lock(), 0, "only 403 triggers a refresh");
    assert!(mgr.is_authenticated(), "session survives ordinary backend errors");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn with_auth_requires_a_session() {
    let stub = Stub::new();
    let (srv, base) = start_stub(stub.clone()).await;
    let _g = Guard(srv);

    let api = ApiClient::new(&base).unwrap();
    let mgr = SessionManager::new(api.clone(), Box::new(MemorySessionStore::new()));
    let err = mgr
        .with_auth(move |token| {
            let api = api.clone();
            async move { api.list_students(&token).await }
        })
        .await
        .expect_err("no session");
    assert!(err.is_auth_expired());
    assert!(stub.reads_auth_seen.lock().is_empty(), "no request without a token");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_retries_share_the_refresh_outcome() {
    let stub = Stub::new();
    let (srv, base) = start_stub(stub.clone()).await;
    let _g = Guard(srv);

    let (api, mgr) = logged_in_manager(&base).await;
    stub.expire_access();

    let run = |api: ApiClient, mgr: SessionManager| async move {
        mgr.with_auth(move |token| {
            let api = api.clone();
            async move { api.list_students(&token).await }
        })
        .await
    };
    let (a, b) = tokio::join!(run(api.clone(), mgr.clone()), run(api, mgr.clone()));
    assert!(a.is_ok() && b.is_ok(), "both callers must recover");

    // At most one refresh may be in flight; a caller that waited adopts the
    // winner's outcome, so the total stays at one or two sequential calls.
    let calls = *stub.refresh_calls.lock();
    assert!((1..=2).contains(&calls), "refresh calls: {}", calls);
    assert!(mgr.is_authenticated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn periodic_refresh_task_runs_until_dropped() {
    let stub = Stub::new();
    let (srv, base) = start_stub(stub.clone()).await;
    let _g = Guard(srv);

    let (_api, mgr) = logged_in_manager(&base).await;
    let task = mgr.spawn_periodic_refresh(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(220)).await;
    let while_running = *stub.refresh_calls.lock();
    assert!(while_running >= 2, "expected proactive refreshes, saw {}", while_running);
    assert!(mgr.is_authenticated());

    drop(task);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(*stub.refresh_calls.lock(), while_running, "task must stop with its guard");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_rejects_bad_credentials() {
    let stub = Stub::new();
    let (srv, base) = start_stub(stub).await;
    let _g = Guard(srv);

    let api = ApiClient::new(&base).unwrap();
    let err = api.login("alice", "wrong").await.expect_err("bad password");
    assert_eq!(err, AppError::Backend { status: 401, message: "Invalid credentials".into() });
    assert_eq!(err.user_message("Login failed"), "Error: Invalid credentials");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn register_reports_backend_messages_verbatim() {
    let stub = Stub::new();
    let (srv, base) = start_stub(stub).await;
    let _g = Guard(srv);

    let api = ApiClient::new(&base).unwrap();
    let ack = api.register("bob", "b@x.com", "pw").await.expect("register");
    assert_eq!(ack.message, "Registration successful");

    let err = api.register("taken", "t@x.com", "pw").await.expect_err("conflict");
    assert_eq!(err, AppError::Backend { status: 409, message: "username already taken".into() });
}
