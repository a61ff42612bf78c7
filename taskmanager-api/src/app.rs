/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskmanager_api::{app::AppState, config::Config};
/// use taskmanager_shared::attachments::storage::LocalFileStorage;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let storage = LocalFileStorage::new(&config.storage.base_path).await?;
/// let state = AppState::new(pool, config, Arc::new(storage));
/// let app = taskmanager_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        request_log::{log_requests, RequestLogConfig},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskmanager_shared::{
    attachments::{
        storage::FileStorage, store::PgAttachmentStore, task_lookup::PgTaskLookup,
        AttachmentService,
    },
    auth::{jwt::JwtSettings, middleware::authenticate_bearer},
    cache::TtlCache,
    clock::{DefaultClock, SharedClock},
    notifier::{LoggingTaskNotifier, SharedNotifier},
    services::{
        auth::AuthService,
        label::{LabelCache, LabelService},
        project::ProjectService,
        task::TaskService,
        user::UserService,
    },
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Services are built per request from the pooled handles below.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    pub jwt: Arc<JwtSettings>,

    pub clock: SharedClock,

    pub notifier: SharedNotifier,

    /// Process-wide label list cache
    pub label_cache: LabelCache,

    pub attachments: Arc<AttachmentService>,
}

impl AppState {
    /// Creates new application state
    ///
    /// Attachment metadata and the task lookup share `db`; file contents go
    /// to `storage`.
    pub fn new(db: PgPool, config: Config, storage: Arc<dyn FileStorage>) -> Self {
        let clock: SharedClock = Arc::new(DefaultClock);
        let attachments = AttachmentService::new(
            Arc::new(PgAttachmentStore::new(db.clone())),
            storage,
            Arc::new(PgTaskLookup::new(db.clone())),
            clock.clone(),
        );

        Self {
            jwt: Arc::new(config.jwt_settings()),
            config: Arc::new(config),
            clock,
            notifier: Arc::new(LoggingTaskNotifier),
            label_cache: TtlCache::new(),
            attachments: Arc::new(attachments),
            db,
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.db.clone(), (*self.jwt).clone(), self.clock.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.clone())
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.db.clone())
    }

    pub fn tasks(&self) -> TaskService {
        TaskService::new(self.db.clone(), self.notifier.clone(), self.clock.clone())
    }

    pub fn labels(&self) -> LabelService {
        LabelService::new(self.db.clone(), self.label_cache.clone())
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/v1/
///     ├── /auth/                       # register, login, refresh, revoke (public)
///     ├── /auth/me                     # everything below requires a JWT
///     ├── /users/
///     ├── /projects/
///     ├── /tasks/
///     ├── /labels/
///     └── /attachments/
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Request id and timing log
/// 4. Logging (tower-http TraceLayer)
/// 5. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{attachments, auth, health, labels, projects, tasks, users};

    let health_routes = Router::new().route("/health", get(health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/revoke", post(auth::revoke));

    let user_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/:id", get(users::get_user))
        .route("/by-username/:username", get(users::get_user_by_username));

    let project_routes = Router::new()
        .route(
            "/",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/my-projects", get(projects::my_projects))
        .route(
            "/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        );

    let task_routes = Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/my-tasks", get(tasks::my_tasks))
        .route("/project/:project_id", get(tasks::project_tasks))
        .route(
            "/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/:id/status", patch(tasks::update_task_status))
        .route("/:id/assign/:user_id", post(tasks::assign_task));

    let label_routes = Router::new()
        .route("/", get(labels::list_labels).post(labels::create_label))
        .route(
            "/:id",
            get(labels::get_label)
                .put(labels::update_label)
                .delete(labels::delete_label),
        );

    let attachment_routes = Router::new()
        .route(
            "/",
            post(attachments::upload_attachment)
                .layer(DefaultBodyLimit::max(attachments::UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/:id",
            get(attachments::get_attachment).delete(attachments::delete_attachment),
        )
        .route("/:id/download", get(attachments::download_attachment))
        .route("/task/:task_id", get(attachments::list_task_attachments));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/labels", label_routes)
        .nest("/attachments", attachment_routes)
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes)
        .merge(protected_routes);

    let request_log = RequestLogConfig::from_millis(state.config.api.slow_request_threshold_ms);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(from_fn_with_state(request_log, log_requests))
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive CORS for `*`, otherwise the configured origin list
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, then injects `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate_bearer(req.headers(), &state.jwt)?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use taskmanager_shared::{
        attachments::storage::LocalFileStorage,
        auth::jwt::{create_token, Claims},
        models::user::UserRole,
    };
    use tower::ServiceExt;

    /// State over a lazy pool; nothing here touches the database
    async fn offline_state() -> AppState {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        let dir = std::env::temp_dir().join(format!("taskmanager-app-{}", uuid::Uuid::new_v4()));
        let storage = LocalFileStorage::new(dir).await.unwrap();

        AppState::new(pool, config, Arc::new(storage))
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = build_router(offline_state().await);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/v1/tasks")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let app = build_router(offline_state().await);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/v1/labels")
                    .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = build_router(offline_state().await);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let state = offline_state().await;
        let claims = Claims::new(
            uuid::Uuid::new_v4(),
            "uploader",
            "uploader@example.com",
            UserRole::User,
            &state.jwt,
            chrono::Utc::now(),
        );
        let token = create_token(&claims, &state.config.jwt.secret).unwrap();
        let app = build_router(state);

        let boundary = "upload-boundary";
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"task_id\"\r\n\r\n{id}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"big.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n",
            b = boundary,
            id = uuid::Uuid::new_v4()
        )
        .into_bytes();
        body.extend(std::iter::repeat(b'a').take(crate::routes::attachments::UPLOAD_BODY_LIMIT + 1024));
        body.extend(format!("\r\n--{}--\r\n", boundary).into_bytes());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/v1/attachments")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "payload_too_large");
    }
}
