//! Session lifecycle: the single source of truth for "who is logged in".
//!
//! The manager owns the in-memory session, is the only writer of the
//! persisted record, and carries the refresh/logout transitions every other
//! part of the application depends on. State machine: Unauthenticated
//! -(login | hydration)-> Authenticated -(refresh)-> Authenticated
//! -(logout | failed refresh)-> Unauthenticated.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::identity::{Credential, Identity, Session};
use super::store::{self, SessionStore};
use crate::api::ApiClient;
use crate::error::{AppError, AppResult};

/// Confirmation shown after logout, kept from the original site.
pub const LOGOUT_MESSAGE: &str = "คุณออกจากระบบสำเร็จแล้ว.";

/// How long the logout confirmation stays readable.
pub const LOGOUT_MESSAGE_TTL: Duration = Duration::from_millis(3000);

struct State {
    session: Option<Session>,
    /// Bumped on every transition. In-flight refreshes snapshot it and
    /// discard their outcome if it moved, so a late response can never
    /// resurrect a session cleared by logout.
    epoch: u64,
    signed_in_at: Option<DateTime<Utc>>,
    logout_message: Option<String>,
    message_epoch: u64,
    message_task: Option<JoinHandle<()>>,
}

struct Inner {
    api: ApiClient,
    store: Box<dyn SessionStore>,
    state: RwLock<State>,
    /// Single-flight gate: at most one refresh request in flight.
    refresh_gate: tokio::sync::Mutex<()>,
}

/// Cheap-to-clone handle; all clones share one session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: Box<dyn SessionStore>) -> Self {
        SessionManager {
            inner: Arc::new(Inner {
                api,
                store,
                state: RwLock::new(State {
                    session: None,
                    epoch: 0,
                    signed_in_at: None,
                    logout_message: None,
                    message_epoch: 0,
                    message_task: None,
                }),
                refresh_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Hydrate from the persisted record. All three keys present and
    /// parseable => Authenticated; anything else leaves the session absent.
    /// No network call, never fails.
    pub fn initialize(&self) {
        match store::load_record(self.inner.store.as_ref()) {
            Some(session) => {
                info!(target: "registra::session", "session.hydrate user={}", session.identity.username);
                let mut st = self.inner.state.write();
                st.session = Some(session);
                st.signed_in_at = Some(Utc::now());
                st.epoch += 1;
            }
            None => {
                debug!(target: "registra::session", "session.hydrate no valid persisted record");
            }
        }
    }

    /// Replace the session and overwrite all three persisted keys as one
    /// observable step: both writes happen back-to-back under the state lock
    /// with no intervening suspension.
    pub fn update_session(&self, credential: Credential, identity: Identity) {
        let mut st = self.inner.state.write();
        commit_locked(&self.inner, &mut st, credential, identity);
    }

    /// Clear the session, delete the persisted record, and publish the
    /// logout confirmation for 3 seconds. Calling again before the window
    /// elapses restarts it for the same message; the pending clear task is
    /// cancelled, never stacked. Must run inside a Tokio runtime.
    pub fn logout(&self) {
        let mut st = self.inner.state.write();
        if let Some(user) = st.session.as_ref().map(|s| s.identity.username.clone()) {
            info!(target: "registra::session", "session.logout user={}", user);
        }
        st.session = None;
        st.signed_in_at = None;
        st.epoch += 1;
        store::clear_record(self.inner.store.as_ref());

        st.logout_message = Some(LOGOUT_MESSAGE.to_string());
        st.message_epoch += 1;
        let my_epoch = st.message_epoch;
        if let Some(task) = st.message_task.take() {
            task.abort();
        }
        let inner = Arc::clone(&self.inner);
        st.message_task = Some(tokio::spawn(async move {
            tokio::time::sleep(LOGOUT_MESSAGE_TTL).await;
            let mut st = inner.state.write();
            // A newer logout owns the message now; leave its window alone.
            if st.message_epoch == my_epoch {
                st.logout_message = None;
                st.message_task = None;
            }
        }));
    }

    /// Exchange the refresh token for fresh credentials. No-op when
    /// unauthenticated. On success the identity is kept byte-identical and
    /// only the tokens change; on any failure the session is force-logged-out
    /// and the error is swallowed. Returns true only if the session was
    /// actually refreshed.
    pub async fn refresh_access_token(&self) -> bool {
        let epoch_at_entry = {
            let st = self.inner.state.read();
            if st.session.is_none() {
                return false;
            }
            st.epoch
        };
        let _flight = self.inner.refresh_gate.lock().await;
        let (refresh_token, identity, epoch) = {
            let st = self.inner.state.read();
            match &st.session {
                Some(s) => (s.credential.refresh_token.clone(), s.identity.clone(), st.epoch),
                None => return false,
            }
        };
        if epoch != epoch_at_entry {
            // Another caller refreshed (or a login replaced the session) while
            // we waited on the gate; adopt that outcome instead of refreshing
            // again.
            debug!(target: "registra::session", "session.refresh satisfied by concurrent refresh");
            return true;
        }

        match self.inner.api.refresh(&refresh_token).await {
            Ok(tokens) => {
                let mut st = self.inner.state.write();
                if st.epoch != epoch || st.session.is_none() {
                    debug!(target: "registra::session", "session.refresh outcome discarded: state moved mid-flight");
                    return false;
                }
                info!(target: "registra::session", "session.refresh user={}", identity.username);
                let credential = Credential {
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token,
                };
                commit_locked(&self.inner, &mut st, credential, identity);
                true
            }
            Err(e) => {
                warn!(target: "registra::session", "session.refresh failed, forcing logout: {}", e);
                {
                    let st = self.inner.state.read();
                    if st.epoch != epoch {
                        return false;
                    }
                }
                self.logout();
                false
            }
        }
    }

    /// Run a protected request with the current access token. On a 403-class
    /// failure, refresh once and, only if the refresh succeeded, run the
    /// request exactly once more. The refresh failure itself is never
    /// surfaced; the caller sees the original error.
    pub async fn with_auth<T, F, Fut>(&self, op: F) -> AppResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let Some(token) = self.access_token() else {
            return Err(AppError::auth_expired("no active session"));
        };
        let err = match op(token).await {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        if !err.is_auth_expired() {
            return Err(err);
        }
        if !self.refresh_access_token().await {
            return Err(err);
        }
        let Some(token) = self.access_token() else {
            return Err(err);
        };
        op(token).await
    }

    /// Start the proactive background refresh loop (the original refreshed
    /// every 15 minutes). The task stops when the returned guard is dropped.
    pub fn spawn_periodic_refresh(&self, every: Duration) -> RefreshTask {
        let mgr = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval fires immediately; swallow that so the first refresh
            // happens one full period after login
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if mgr.is_authenticated() {
                    mgr.refresh_access_token().await;
                }
            }
        });
        RefreshTask { handle }
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().session.is_some()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.state.read().session.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.read().session.as_ref().map(|s| s.identity.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.state.read().session.as_ref().map(|s| s.credential.access_token.clone())
    }

    pub fn logout_message(&self) -> Option<String> {
        self.inner.state.read().logout_message.clone()
    }

    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().signed_in_at
    }

    /// Read a persisted key directly. Test/diagnostic accessor; consumers
    /// use the in-memory session.
    pub fn persisted(&self, key: &str) -> Option<String> {
        self.inner.store.get(key)
    }
}

fn commit_locked(inner: &Inner, st: &mut State, credential: Credential, identity: Identity) {
    let session = Session { credential, identity };
    // Storage mirrors memory before the lock is released, so no reader can
    // observe the two disagreeing.
    store::save_record(inner.store.as_ref(), &session);
    st.session = Some(session);
    st.epoch += 1;
    if st.signed_in_at.is_none() {
        st.signed_in_at = Some(Utc::now());
    }
}

/// Guard for the background refresh loop; aborts the task on drop.
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
