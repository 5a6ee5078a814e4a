//! `/std/*` endpoints: student record CRUD.
//! All of these are protected; callers normally go through
//! `SessionManager::with_auth` so a stale token is refreshed and retried.

use super::{bearer, expect_json, expect_ok, path_id, Ack, ApiClient, StudentBundle, StudentForm};
use crate::error::AppResult;

impl ApiClient {
    /// `GET /std/reads`: every stored record as a three-part bundle.
    pub async fn list_students(&self, access_token: &str) -> AppResult<Vec<StudentBundle>> {
        let resp = bearer(self.get("/std/reads")?, access_token).send().await?;
        expect_json(resp).await
    }

    /// `GET /std/read/:id`.
    pub async fn get_student(&self, access_token: &str, std_id: &str) -> AppResult<StudentBundle> {
        let resp = bearer(self.get(&format!("/std/read/{}", path_id(std_id)))?, access_token)
            .send()
            .await?;
        expect_json(resp).await
    }

    /// `POST /std/submit`: create a record from the flat intake form.
    /// Validate the form first; the backend echoes a `{message}` body.
    pub async fn submit_student(&self, access_token: &str, form: &StudentForm) -> AppResult<Ack> {
        let resp = bearer(self.post("/std/submit")?, access_token).json(form).send().await?;
        expect_ok(resp).await
    }

    /// `PUT /std/edit/:id`.
    pub async fn edit_student(&self, access_token: &str, std_id: &str, form: &StudentForm) -> AppResult<Ack> {
        let resp = bearer(self.put(&format!("/std/edit/{}", path_id(std_id)))?, access_token)
            .json(form)
            .send()
            .await?;
        expect_ok(resp).await
    }

    /// `DELETE /std/del/:id`.
    pub async fn delete_student(&self, access_token: &str, std_id: &str) -> AppResult<Ack> {
        let resp = bearer(self.delete(&format!("/std/del/{}", path_id(std_id)))?, access_token)
            .send()
            .await?;
        expect_ok(resp).await
    }
}
