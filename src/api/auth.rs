//! `/auth/*` endpoints: login, register, refresh.

use tracing::debug;

use super::{expect_json, expect_ok, Ack, ApiClient, LoginReply, TokenPair};
use crate::error::AppResult;

impl ApiClient {
    /// `POST /auth/login`. The reply carries both tokens and the profile.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginReply> {
        let resp = self
            .post("/auth/login")?
            .json(&serde_json::json!({"username": username, "password": password}))
            .send()
            .await?;
        let reply: LoginReply = expect_json(resp).await?;
        debug!(target: "registra::api", "auth.login user={}", reply.user.username);
        Ok(reply)
    }

    /// `POST /auth/register`. Success body is a plain acknowledgement.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<Ack> {
        let resp = self
            .post("/auth/register")?
            .json(&serde_json::json!({"username": username, "email": email, "password": password}))
            .send()
            .await?;
        expect_ok(resp).await
    }

    /// `POST /auth/refresh`. Sends the refresh token in the body; any non-2xx
    /// reply means the session is no longer refreshable.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let resp = self
            .post("/auth/refresh")?
            .json(&serde_json::json!({"refreshToken": refresh_token}))
            .send()
            .await?;
        expect_json(resp).await
    }
}
