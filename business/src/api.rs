//! Directory API: endpoint URLs, wire types and envelope checks.
//!
//! The server speaks snake_case JSON. Every call goes through the shared [`HttpGateway`].

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::BusinessConfig;
use crate::error::ApiError;
use crate::http::{HttpGateway, Request, Response};

/// A user as listed by `GET /users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Position display name.
    pub position: String,
    #[serde(default)]
    pub position_id: Option<i64>,
    /// Avatar URL.
    pub photo: Url,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageLinks {
    #[serde(default)]
    pub next_url: Option<Url>,
    #[serde(default)]
    pub prev_url: Option<Url>,
}

/// Envelope of `GET /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub success: bool,
    pub page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub links: PageLinks,
    #[serde(default)]
    pub users: Vec<UserDto>,
}

/// A selectable position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of a successful `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedUser {
    pub success: bool,
    pub user_id: i64,
}

/// Error body, e.g. `{"success": false, "message": "...", "fails": {"email": ["..."]}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub fails: BTreeMap<String, Vec<String>>,
}

impl ApiMessage {
    /// Best-effort decode of an error body.
    pub fn from_response(response: &Response) -> Self {
        response.json().unwrap_or_default()
    }

    /// The server message, followed by per-field failures when present.
    pub fn describe(&self) -> Option<String> {
        let message = self.message.as_deref().filter(|m| !m.trim().is_empty())?;
        if self.fails.is_empty() {
            return Some(message.to_owned());
        }
        let fails = self
            .fails
            .iter()
            .map(|(field, reasons)| format!("{field}: {}", reasons.join(" ")))
            .collect::<Vec<_>>()
            .join("; ");
        Some(format!("{message} ({fails})"))
    }
}

fn default_true() -> bool {
    true
}

/// Typed access to the directory endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    gateway: Arc<dyn HttpGateway>,
    base: Url,
    page_size: u32,
}

impl ApiClient {
    pub fn new(gateway: Arc<dyn HttpGateway>, config: &BusinessConfig) -> Self {
        Self {
            gateway,
            base: config.api_base_url.clone(),
            page_size: config.page_size,
        }
    }

    /// `{base}/{name}`, tolerating a trailing slash on the base.
    pub fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }

    /// The only page URL built locally; later pages come from `links.next_url`.
    pub fn users_page_url(&self, page: u32) -> Url {
        let mut url = self.endpoint("users");
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("count", &self.page_size.to_string());
        url
    }

    /// GET one page of users. `url` is either page 1 or a cursor the server returned.
    pub async fn fetch_users_page(&self, url: &Url) -> Result<UsersResponse, ApiError> {
        info!("Fetching users page: {url}");
        let response = self.gateway.send(Request::get(url.as_str())).await?;
        let envelope: UsersResponse = expect_success(&response)?;
        if !envelope.success {
            return Err(ApiError::protocol("users page reported success=false"));
        }
        debug!(
            "Users page {}/{}: {} users",
            envelope.page,
            envelope.total_pages,
            envelope.users.len()
        );
        Ok(envelope)
    }

    /// GET `/positions`, failing when the envelope says `success: false`.
    pub async fn fetch_positions(&self) -> Result<Vec<Position>, ApiError> {
        let url = self.endpoint("positions");
        info!("Fetching positions: {url}");
        let response = self.gateway.send(Request::get(url.as_str())).await?;
        let body: PositionsResponse = expect_success(&response)?;
        if !body.success {
            return Err(ApiError::protocol("positions reported success=false"));
        }
        Ok(body.positions)
    }

    /// Request a fresh registration token.
    pub async fn fetch_token(&self) -> Result<String, ApiError> {
        let url = self.endpoint("token");
        info!("Requesting registration token");
        let response = self.gateway.send(Request::get(url.as_str())).await?;
        let body: TokenResponse = expect_success(&response)?;
        match body.token {
            Some(token) if body.success && !token.is_empty() => Ok(token),
            _ => Err(ApiError::Auth("token endpoint returned success=false".to_owned())),
        }
    }

    /// POST a multipart registration. The raw response is returned uninterpreted.
    pub async fn post_user(
        &self,
        token: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint("users");
        info!("Submitting registration ({} bytes)", body.len());
        let request = Request::post(url.as_str())
            .header("Token", token)
            .header("Content-Type", content_type)
            .body(body);
        Ok(self.gateway.send(request).await?)
    }

    /// GET arbitrary bytes, failing on a non-2xx status.
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, ApiError> {
        let response = self.gateway.send(Request::get(url.as_str())).await?;
        if !response.is_success() {
            return Err(ApiError::protocol(format!(
                "GET {url} returned {}",
                response.status
            )));
        }
        Ok(response.body)
    }
}

fn expect_success<T: serde::de::DeserializeOwned>(response: &Response) -> Result<T, ApiError> {
    if !response.is_success() {
        let detail = ApiMessage::from_response(response)
            .describe()
            .unwrap_or_else(|| format!("status {}", response.status));
        return Err(ApiError::protocol(detail));
    }
    response.json().map_err(ApiError::decode)
}
