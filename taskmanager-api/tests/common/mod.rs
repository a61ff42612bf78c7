//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - Test database setup (migrated, admin seeded)
//! - Test user creation with a ready JWT
//! - Request helpers over the in-process router
//!
//! Tests need PostgreSQL. Set DATABASE_URL to run them; without it
//! [`TestContext::new`] returns `None` and each test returns early.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use taskmanager_api::app::{build_router, AppState};
use taskmanager_api::config::{
    ApiConfig, Config, DatabaseConfig, JwtConfig, SeedConfig, StorageConfig,
};
use taskmanager_shared::attachments::storage::LocalFileStorage;
use taskmanager_shared::auth::jwt::{create_token, Claims, DEFAULT_AUDIENCE, DEFAULT_ISSUER};
use taskmanager_shared::auth::password::hash_password;
use taskmanager_shared::db::migrations::{ensure_database_exists, run_migrations};
use taskmanager_shared::db::pool::{create_pool, DatabaseConfig as PoolConfig};
use taskmanager_shared::db::seed::ensure_admin_user;
use taskmanager_shared::models::user::{CreateUser, User, UserRole};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "Passw0rd!";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a context with a fresh `user`-role account
    pub async fn new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;

        ensure_database_exists(&url)
            .await
            .expect("Failed to create database");
        let db = create_pool(PoolConfig::from_url(&url).with_max_connections(5))
            .await
            .expect("Failed to create pool");
        run_migrations(&db).await.expect("Migrations failed");
        ensure_admin_user(&db, "Admin123!")
            .await
            .expect("Failed to seed admin");

        let storage_dir = std::env::temp_dir().join(format!("taskmanager-api-{}", Uuid::new_v4()));
        let config = test_config(url, storage_dir.to_string_lossy().into_owned());

        let storage = LocalFileStorage::new(&storage_dir)
            .await
            .expect("Failed to open storage");

        let user = create_user(&db, UserRole::User).await;
        let jwt_token = token_for(&config, &user);

        let state = AppState::new(db.clone(), config.clone(), Arc::new(storage));
        let app = build_router(state);

        Some(TestContext {
            db,
            app,
            config,
            user,
            jwt_token,
        })
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Bearer header for another user
    pub fn auth_header_for(&self, user: &User) -> String {
        format!("Bearer {}", token_for(&self.config, user))
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Authenticated JSON request; `body` of `None` sends no body
    pub async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let auth = self.auth_header();
        self.json_as(&auth, method, uri, body).await
    }

    pub async fn json_as(
        &self,
        auth: &str,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, auth);

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).unwrap()).await;
        read_json(response).await
    }
}

pub fn test_config(database_url: String, storage_path: String) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
            slow_request_threshold_ms: 5000,
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_days: 7,
        },
        storage: StorageConfig {
            base_path: storage_path,
        },
        seed: SeedConfig {
            admin_enabled: true,
            admin_password: "Admin123!".to_string(),
        },
    }
}

pub fn token_for(config: &Config, user: &User) -> String {
    let claims = Claims::for_user(user, &config.jwt_settings(), Utc::now());
    create_token(&claims, &config.jwt.secret).expect("Failed to sign token")
}

/// Short unique suffix so parallel tests do not collide on unique columns
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn create_user(db: &PgPool, role: UserRole) -> User {
    let username = unique("user");
    User::create(
        db,
        CreateUser {
            id: None,
            email: format!("{}@example.com", username),
            username,
            password_hash: hash_password(TEST_PASSWORD).expect("hash"),
            role,
        },
    )
    .await
    .expect("Failed to create user")
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    if body.is_empty() {
        return (status, Value::Null);
    }

    let value = serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "Expected JSON body, got {}: {}",
            status,
            String::from_utf8_lossy(&body)
        )
    });
    (status, value)
}

/// Hand-built `multipart/form-data` body
pub struct MultipartBody {
    pub boundary: String,
    parts: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("boundary{}", Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.parts.extend_from_slice(data);
        self.parts.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str, auth: &str) -> Request<Body> {
        self.parts
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, auth)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.parts))
            .unwrap()
    }
}
