//! HTTP client for the records backend.
//! Keep the public surface thin and split endpoint groups across sub-modules.

mod auth;
mod students;
mod types;
mod users;

pub use types::{Ack, LoginReply, StudentBundle, StudentCore, StudentDetails, StudentForm, StudentSchool, TokenPair, UserAccount};

use anyhow::{Context, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, Url};

use crate::error::{AppError, AppResult};

/// Client handle for one backend. Cheap to clone; the underlying connection
/// pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).context("invalid base URL")?;
        let http = reqwest::Client::builder().build()?;
        Ok(ApiClient { base, http })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        self.base
            .join(path)
            .map_err(|e| AppError::transport(format!("bad endpoint {}: {}", path, e)))
    }

    fn get(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http.get(self.url(path)?))
    }

    fn post(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http.post(self.url(path)?))
    }

    fn put(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http.put(self.url(path)?))
    }

    fn delete(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http.delete(self.url(path)?))
    }
}

pub(crate) fn bearer(req: RequestBuilder, access_token: &str) -> RequestBuilder {
    req.header(AUTHORIZATION, format!("Bearer {}", access_token))
}

/// Decode a success body, or map a non-2xx response to the error taxonomy.
/// Error bodies are `{message}`; a missing or unparseable body falls back to
/// the status line.
pub(crate) async fn expect_json<T: serde::de::DeserializeOwned>(resp: Response) -> AppResult<T> {
    let status = resp.status();
    if status.is_success() {
        let val = resp.json::<T>().await.map_err(|e| AppError::decode(e.to_string()))?;
        return Ok(val);
    }
    Err(error_from(status, resp).await)
}

/// Like expect_json but for endpoints whose success body is irrelevant.
pub(crate) async fn expect_ok(resp: Response) -> AppResult<Ack> {
    let status = resp.status();
    if status.is_success() {
        let ack = resp.json::<Ack>().await.unwrap_or(Ack { message: String::new() });
        return Ok(ack);
    }
    Err(error_from(status, resp).await)
}

async fn error_from(status: reqwest::StatusCode, resp: Response) -> AppError {
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|_| serde_json::json!({}));
    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));
    AppError::backend(status.as_u16(), message)
}

/// Percent-encode a record id for use as a path segment.
pub(crate) fn path_id(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}
