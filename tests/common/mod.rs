/// Shared fixtures for the HTTP integration tests
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use vidtube::{
    config::{AuthConfig, CorsConfig, LoggingConfig, ServerConfig, ServiceConfig, StorageConfig},
    context::AppContext,
    db,
    error::ApiResult,
    media::{MediaStore, UploadedMedia},
    server::build_router,
};

pub const BOUNDARY: &str = "vidtube-test-boundary";
pub const PASSWORD: &str = "correct horse battery staple";

/// Media store that hands out predictable URLs without touching disk
#[derive(Default)]
pub struct MemoryMediaStore {
    counter: AtomicUsize,
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, local_path: &Path) -> ApiResult<UploadedMedia> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(UploadedMedia {
            url: format!("http://media.test/{}/{}", n, name),
            duration: Some(12.0),
        })
    }

    async fn delete(&self, _url: &str) -> ApiResult<()> {
        Ok(())
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            public_url: "http://localhost".to_string(),
            upload_limit: 10 * 1024 * 1024,
        },
        storage: StorageConfig {
            data_directory: std::env::temp_dir(),
            database: PathBuf::from(":memory:"),
            media_directory: std::env::temp_dir(),
            temp_directory: std::env::temp_dir(),
        },
        authentication: AuthConfig {
            access_token_secret: "integration-access-secret-at-least-32".to_string(),
            access_token_expiry: Duration::from_secs(900),
            refresh_token_secret: "integration-refresh-secret-at-least-32".to_string(),
            refresh_token_expiry: Duration::from_secs(86_400),
            secure_cookies: false,
        },
        cors: CorsConfig {
            origin: "http://localhost:5173".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

pub async fn test_app() -> Router {
    let pool = db::create_memory_pool().await.unwrap();
    let ctx = AppContext::with_services(test_config(), pool, Arc::new(MemoryMediaStore::default()));
    build_router(ctx)
}

/// Send a request and decode the JSON envelope
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<String>, Value) {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, cookies, body)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode a multipart/form-data body by hand
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(method: &str, uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

/// Register through the HTTP boundary
pub async fn register(app: &Router, username: &str) -> Value {
    let email = format!("{}@example.com", username);
    let request = multipart_request(
        "POST",
        "/api/v1/users/register",
        None,
        &[
            Part::Text("username", username),
            Part::Text("email", &email),
            Part::Text("fullName", "Test User"),
            Part::Text("password", PASSWORD),
            Part::File("avatar", "avatar.png", b"not really a png"),
        ],
    );
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

/// Login and return (access token, refresh token, Set-Cookie headers)
pub async fn login(app: &Router, username: &str) -> (String, String, Vec<String>) {
    let request = json_request(
        "POST",
        "/api/v1/users/login",
        serde_json::json!({ "username": username, "password": PASSWORD }),
    );
    let (status, cookies, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    (
        body["data"]["accessToken"].as_str().unwrap().to_string(),
        body["data"]["refreshToken"].as_str().unwrap().to_string(),
        cookies,
    )
}

pub fn authed_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    let mut request = json_request(method, uri, body);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    request
}

/// Publish a video and return its id
pub async fn publish(app: &Router, token: &str, title: &str) -> String {
    let request = multipart_request(
        "POST",
        "/api/v1/videos",
        Some(token),
        &[
            Part::Text("title", title),
            Part::Text("description", "uploaded in a test"),
            Part::File("videoFile", "clip.mp4", b"video bytes"),
            Part::File("thumbnail", "thumb.png", b"thumb bytes"),
        ],
    );
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["video"]["id"].as_str().unwrap().to_string()
}
