//! Shared helpers for the wiremock-backed integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use roster_business::{ApiClient, BusinessConfig, ReqwestGateway, Session};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestContext {
    pub server: MockServer,
    pub session: Session,
}

impl TestContext {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let session = Session::new(config_for(&server)).expect("reqwest client builds");
        Self { server, session }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }
}

pub fn config_for(server: &MockServer) -> BusinessConfig {
    BusinessConfig::from_base_url(&format!("{}/api/v1", server.uri())).expect("mock uri is valid")
}

pub fn api_for(server: &MockServer) -> ApiClient {
    let gateway = ReqwestGateway::new(None).expect("reqwest client builds");
    ApiClient::new(Arc::new(gateway), &config_for(server))
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("png encodes");
    bytes.into_inner()
}

/// A `GET /users` envelope whose avatars live on the mock server.
pub fn users_page(
    uri: &str,
    page: u32,
    total_pages: u32,
    ids: &[i64],
    next_page: Option<u32>,
) -> serde_json::Value {
    let users = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "name": format!("User {id}"),
                "email": format!("user{id}@example.com"),
                "phone": "+380501234567",
                "position": "Lawyer",
                "position_id": 1,
                "photo": format!("{uri}/images/users/{id}.png"),
            })
        })
        .collect::<Vec<_>>();
    let next_url = next_page.map(|n| format!("{uri}/api/v1/users?page={n}&count=6"));
    serde_json::json!({
        "success": true,
        "page": page,
        "total_pages": total_pages,
        "total_users": ids.len(),
        "count": 6,
        "links": {"next_url": next_url, "prev_url": null},
        "users": users,
    })
}

pub async fn mock_users_page(server: &MockServer, page: u32, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .and(query_param("page", page.to_string()))
        .and(query_param("count", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mock_avatars(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/images/users/\d+\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(8, 8)))
        .mount(server)
        .await;
}

pub async fn mock_positions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "positions": [
                {"id": 1, "name": "Lawyer"},
                {"id": 2, "name": "Content manager"},
                {"id": 3, "name": "Security"},
                {"id": 4, "name": "Designer"}
            ]
        })))
        .mount(server)
        .await;
}

pub async fn mock_token(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"success": true, "token": token})),
        )
        .expect(times)
        .mount(server)
        .await;
}

pub fn ids(session: &Session) -> Vec<i64> {
    session.users().iter().map(|u| u.id).collect()
}
