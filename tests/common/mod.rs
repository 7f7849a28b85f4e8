#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pasetors::claims::Claims;
use pasetors::keys::SymmetricKey;
use pasetors::local;
use pasetors::version4::V4;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use roastr::app::auth::AuthService;
use roastr::app::store::Stores;
use roastr::domain::post::{NewPost, PostKind};
use roastr::infra::memory::{self, MemoryImages};
use roastr::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// Test-only key, never used outside this harness.
const TEST_PASETO_ACCESS_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
pub const TEST_UPLOAD_MAX_BYTES: usize = 4096;
const MULTIPART_BOUNDARY: &str = "roastr-test-boundary";

/// Smallest byte string `image::guess_format` recognises as PNG.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

// ---------------------------------------------------------------------------
// TestApp: a fresh in-memory backend per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub images: MemoryImages,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub access_token: String,
}

/// Build an isolated app so feed assertions never see other tests' posts.
pub async fn app() -> TestApp {
    TestApp::setup()
}

impl TestApp {
    fn setup() -> Self {
        let (stores, images) = memory::stores_with_images();
        let state = AppState {
            stores,
            upload_max_bytes: TEST_UPLOAD_MAX_BYTES,
            paseto_access_key: TEST_PASETO_ACCESS_KEY,
            access_ttl_minutes: 15,
        };
        let router = roastr::http::router(state.clone());

        TestApp {
            router,
            state,
            images,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.state.stores
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        body: Body,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = builder.body(body).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, None, Body::empty(), token)
            .await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.json_request(Method::POST, path, body, token).await
    }

    pub async fn put_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.json_request(Method::PUT, path, body, token).await
    }

    async fn json_request(
        &self,
        method: Method,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> TestResponse {
        let body = Body::from(serde_json::to_string(&body).unwrap());
        self.request(method, path, Some("application/json"), body, token)
            .await
    }

    /// POST a multipart form. `image` is sent as a file part when present.
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        image: Option<&[u8]>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    MULTIPART_BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some(image) = image {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n",
                    MULTIPART_BOUNDARY
                )
                .as_bytes(),
            );
            body.extend_from_slice(image);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        let content_type = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
        self.request(
            Method::POST,
            path,
            Some(&content_type),
            Body::from(body),
            token,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Token for a user id without creating a profile.
    pub fn token_for(&self, user_id: Uuid) -> String {
        AuthService::new(self.state.paseto_access_key, self.state.access_ttl_minutes)
            .issue_access_token(user_id)
            .expect("issue_access_token failed")
    }

    /// Correctly signed access token carrying an arbitrary subject.
    pub fn token_with_subject(&self, subject: &str) -> String {
        let mut claims = Claims::new_expires_in(&std::time::Duration::from_secs(300)).unwrap();
        claims.issuer("roastr").unwrap();
        claims.audience("roastr").unwrap();
        claims.subject(subject).unwrap();
        claims.add_additional("typ", "access").unwrap();

        let key = SymmetricKey::<V4>::from(&self.state.paseto_access_key).unwrap();
        local::encrypt(&key, &claims, None, None).unwrap()
    }

    /// Create a profile directly in the store and mint a token for it.
    pub async fn create_user(&self, name: &str) -> TestUser {
        let id = Uuid::new_v4();
        self.stores()
            .profiles
            .upsert_profile(id, name.to_string(), None)
            .await
            .expect("insert test profile failed");

        TestUser {
            id,
            access_token: self.token_for(id),
        }
    }

    /// Insert a post directly in the store. Returns the post id.
    pub async fn create_post_for_user(&self, owner_id: Uuid, kind: PostKind) -> Uuid {
        let post = self
            .stores()
            .posts
            .insert_post(NewPost {
                owner_id,
                image_url: format!("memory://{}/{}.png", owner_id, Uuid::new_v4()),
                caption: Some("test caption".to_string()),
                kind,
            })
            .await
            .expect("insert test post failed");
        post.id
    }

    /// Store a rating directly, bypassing HTTP.
    pub async fn rate(&self, post_id: Uuid, user_id: Uuid, score: i32) {
        self.stores()
            .ratings
            .put(post_id, user_id, score)
            .await
            .expect("insert test rating failed");
    }
}
