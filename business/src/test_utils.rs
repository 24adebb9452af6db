//! Test helpers for the session engine.
//!
//! [`ScriptedGateway`] answers requests from a FIFO of canned responses and records every
//! request it sees, so unit tests can assert on URLs, headers and bodies without a server.
//! Integration tests under `tests/` use `wiremock` instead.

#![cfg(test)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::http::{HttpError, HttpGateway, HttpResult, Request, Response};

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<HttpResult<Response>>,
    requests: Vec<Request>,
}

/// In-memory gateway replaying queued replies in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: HttpResult<Response>) {
        self.script.lock().unwrap().replies.push_back(reply);
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        let mut response = Response::new(status, body.to_string().into_bytes());
        response
            .headers
            .insert("content-type".to_owned(), "application/json".to_owned());
        self.push(Ok(response));
    }

    pub fn push_bytes(&self, status: u16, body: Vec<u8>) {
        self.push(Ok(Response::new(status, body)));
    }

    pub fn push_error(&self, error: HttpError) {
        self.push(Err(error));
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl HttpGateway for ScriptedGateway {
    async fn send(&self, request: Request) -> HttpResult<Response> {
        let mut script = self.script.lock().unwrap();
        let url = request.url().to_owned();
        script.requests.push(request);
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new(format!("no scripted reply for {url}"))))
    }
}

/// A solid-colour PNG of the given size.
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// Envelope for `GET /users` with users `ids`, linking to `next` when given.
pub fn users_page_json(
    page: u32,
    total_pages: u32,
    ids: &[i64],
    next: Option<&str>,
) -> serde_json::Value {
    let users = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "name": format!("User {id}"),
                "email": format!("user{id}@example.com"),
                "phone": "+380501234567",
                "position": "Designer",
                "position_id": 4,
                "photo": format!("https://img.test/users/{id}.png"),
            })
        })
        .collect::<Vec<_>>();
    serde_json::json!({
        "success": true,
        "page": page,
        "total_pages": total_pages,
        "links": {"next_url": next, "prev_url": null},
        "users": users,
    })
}
