//! `/user/*` endpoints: account administration (admin-only on the backend).

use super::{bearer, expect_json, expect_ok, path_id, Ack, ApiClient, UserAccount};
use crate::error::AppResult;

impl ApiClient {
    /// `GET /user/users`.
    pub async fn list_users(&self, access_token: &str) -> AppResult<Vec<UserAccount>> {
        let resp = bearer(self.get("/user/users")?, access_token).send().await?;
        expect_json(resp).await
    }

    /// `PUT /user/users/:id`: full-row update; the reply is the stored row.
    pub async fn update_user(&self, access_token: &str, account: &UserAccount) -> AppResult<UserAccount> {
        let resp = bearer(self.put(&format!("/user/users/{}", path_id(&account.id)))?, access_token)
            .json(account)
            .send()
            .await?;
        expect_json(resp).await
    }

    /// `DELETE /user/users/:id`.
    pub async fn delete_user(&self, access_token: &str, user_id: &str) -> AppResult<Ack> {
        let resp = bearer(self.delete(&format!("/user/users/{}", path_id(user_id)))?, access_token)
            .send()
            .await?;
        expect_ok(resp).await
    }
}
