//! HTTP test client for sessiongate.
//!
//! [`TestClient`] sends simulated requests through an axum router and keeps a
//! cookie jar across them, so a session cookie set by one response is sent
//! with the next request. [`TestResponse`] exposes the result.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sessiongate_test::{seeded_app, test_settings, TestClient};
//!
//! async fn example() {
//!     let app = seeded_app(test_settings(), &[("user1", "password1")]).await;
//!     let mut client = TestClient::new(app);
//!
//!     let response = client.get("/csrf-token").await;
//!     assert_eq!(response.status_code(), 200);
//!     assert!(client.cookie("connect.sid").is_some());
//! }
//! ```

use std::collections::HashMap;

use axum::Router;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde::Serialize;
use tower::ServiceExt;

use sessiongate_core::GateError;

/// A test client for making simulated HTTP requests against an axum application.
///
/// Maintains cookies across requests. All methods are async.
pub struct TestClient {
    app: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    /// Creates a new test client wrapping the given router.
    pub fn new(app: Router) -> Self {
        Self {
            app,
            cookies: HashMap::new(),
        }
    }

    /// Sends a GET request to the given path.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.request(Method::GET, path, Vec::new(), None, &[]).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post_json<T: Serialize>(&mut self, path: &str, body: &T) -> TestResponse {
        self.post_json_with_headers(path, body, &[]).await
    }

    /// Sends a POST request with a JSON body and extra headers.
    pub async fn post_json_with_headers<T: Serialize>(
        &mut self,
        path: &str,
        body: &T,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body = serde_json::to_vec(body).expect("request body should serialize");
        self.request(Method::POST, path, body, Some("application/json"), headers)
            .await
    }

    /// Sends a POST request with a raw body and content type.
    pub async fn post_raw(
        &mut self,
        path: &str,
        body: impl Into<Vec<u8>>,
        content_type: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.request(Method::POST, path, body.into(), content_type, headers)
            .await
    }

    /// Sets a cookie that will be included in subsequent requests.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    /// Returns the current value of a cookie in the jar.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Clears all cookies from the client.
    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    /// Builds the Cookie header from the current cookie jar.
    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header("cookie", cookie);
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let req = builder
            .body(axum::body::Body::from(body))
            .expect("request builder should not fail");

        self.send(req).await
    }

    /// Sends the request through the router and builds a `TestResponse`.
    async fn send(&mut self, req: Request<axum::body::Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(req)
            .await
            .expect("router should not error");

        let status = response.status();
        let headers = response.headers().clone();

        // Keep only "name=value" from each Set-Cookie header
        let mut response_cookies = HashMap::new();
        for value in headers.get_all(http::header::SET_COOKIE) {
            let Ok(cookie_str) = value.to_str() else {
                continue;
            };
            let Some((name, val)) = cookie_str.split(';').next().and_then(|p| p.split_once('='))
            else {
                continue;
            };
            let name = name.trim().to_string();
            let val = val.trim().to_string();
            self.cookies.insert(name.clone(), val.clone());
            response_cookies.insert(name, val);
        }

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);

        TestResponse {
            status,
            headers,
            body: body_bytes.to_vec(),
            cookies: response_cookies,
        }
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// The response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body as raw bytes.
    pub body: Vec<u8>,
    /// Cookies set by the response.
    pub cookies: HashMap<String, String>,
}

impl TestResponse {
    /// Returns the response body as a UTF-8 string.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, GateError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| GateError::SerializationError(e.to_string()))
    }

    /// Returns the numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the value of a header by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `csrfToken` field of a JSON body, if present.
    pub fn csrf_token(&self) -> Option<String> {
        let body: serde_json::Value = self.json().ok()?;
        body.get("csrfToken")?.as_str().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::{get, post};
    use serde_json::json;

    use super::*;

    fn test_app() -> Router {
        Router::new()
            .route("/hello", get(|| async { "Hello, World!" }))
            .route(
                "/cookie",
                get(|headers: http::HeaderMap| async move {
                    headers
                        .get("cookie")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("no cookies")
                        .to_string()
                }),
            )
            .route(
                "/set-cookie",
                get(|| async {
                    (
                        [(http::header::SET_COOKIE, "sid=abc123; Path=/; HttpOnly")],
                        "cookie set",
                    )
                }),
            )
            .route(
                "/echo-header",
                post(|headers: http::HeaderMap| async move {
                    headers
                        .get("x-csrf-token")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("missing")
                        .to_string()
                }),
            )
            .route("/echo", post(|body: String| async move { body }))
            .route(
                "/token",
                get(|| async { axum::Json(json!({ "csrfToken": "t-1" })) }),
            )
    }

    #[tokio::test]
    async fn test_get_simple() {
        let mut client = TestClient::new(test_app());
        let response = client.get("/hello").await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), "Hello, World!");
    }

    #[tokio::test]
    async fn test_cookie_jar_persists() {
        let mut client = TestClient::new(test_app());
        let response = client.get("/set-cookie").await;
        assert_eq!(response.cookies.get("sid").map(String::as_str), Some("abc123"));
        assert_eq!(client.cookie("sid"), Some("abc123"));

        let response = client.get("/cookie").await;
        assert_eq!(response.text(), "sid=abc123");
    }

    #[tokio::test]
    async fn test_clear_cookies() {
        let mut client = TestClient::new(test_app());
        client.set_cookie("sid", "abc123");
        client.clear_cookies();
        let response = client.get("/cookie").await;
        assert_eq!(response.text(), "no cookies");
    }

    #[tokio::test]
    async fn test_post_json_with_headers() {
        let mut client = TestClient::new(test_app());
        let response = client
            .post_json_with_headers("/echo-header", &json!({}), &[("x-csrf-token", "abc")])
            .await;
        assert_eq!(response.text(), "abc");

        let response = client.post_json("/echo", &json!({ "a": 1 })).await;
        assert_eq!(response.text(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_csrf_token_helper() {
        let mut client = TestClient::new(test_app());
        let response = client.get("/token").await;
        assert_eq!(response.csrf_token().as_deref(), Some("t-1"));
        assert!(client.get("/hello").await.csrf_token().is_none());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let mut client = TestClient::new(test_app());
        let response = client.get("/missing").await;
        assert_eq!(response.status_code(), 404);
    }
}
