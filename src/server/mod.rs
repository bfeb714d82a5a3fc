//! REST façade over the document: generic collection CRUD, the auth
//! endpoints, request logging and CORS.

mod auth;
mod cors;
mod error;
mod middleware;
mod query;
mod routes;

pub use auth::issue_token;
pub use cors::{create_cors_layer, origin_allowed};
pub use error::{status_for, ApiError};
pub use query::{ListQuery, ListResult};
pub use routes::TOTAL_COUNT_HEADER;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{info, Level};

use crate::config::Config;
use crate::error::Result;
use crate::storage::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    /// Every request goes through this lock, so writes within the process are serialized.
    pub store: Arc<Mutex<Box<dyn DocumentStore>>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: impl DocumentStore + 'static, config: Config) -> Self {
        let store: Box<dyn DocumentStore> = Box::new(store);
        Self {
            store: Arc::new(Mutex::new(store)),
            config: Arc::new(config),
        }
    }

    /// Run `op` on the blocking pool while holding the store lock. Stores do
    /// synchronous file I/O, which must stay off the async workers.
    pub async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store).lock_owned().await;
        tokio::task::spawn_blocking(move || op(&**store)).await?
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = create_cors_layer(
        state.config.environment,
        state.config.allowed_origins.clone(),
    );

    Router::new()
        .route("/health", get(routes::health))
        .route("/db", get(routes::database))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route(
            "/{collection}",
            get(routes::list_records).post(routes::create_record),
        )
        .route(
            "/{collection}/{id}",
            get(routes::get_record)
                .put(routes::replace_record)
                .patch(routes::update_record)
                .delete(routes::delete_record),
        )
        .layer(from_fn(middleware::warn_missing_token))
        .layer(from_fn(middleware::log_request))
        .layer(
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Cancel the returned token on Ctrl-C.
pub fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("shutdown requested");
        trigger.cancel();
    });
    token
}

/// Serve `app` on `addr` until `shutdown` is cancelled.
pub async fn run_server(app: Router, addr: SocketAddr, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    info!("Conchitas backend listening on {}", local);
    info!("- Local:    http://localhost:{}", local.port());
    info!("- Database: http://localhost:{}/db", local.port());
    info!("- Auth:     POST /auth/login, POST /auth/register");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::storage::{Document, MemoryStore};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn document() -> Document {
        Document::from_value(json!({
            "users": [
                {"id": "user-001", "email": "maricultor1@conchas.com", "password": "password123",
                 "role": "maricultor", "status": "approved", "firstName": "Juan"},
                {"id": "user-002", "email": "nuevo@conchas.com", "password": "password123",
                 "role": "investor", "status": "pending"}
            ],
            "lots": [
                {"id": "lot-001", "status": "growing", "averageSize": 45, "origin": "Samanco"},
                {"id": "lot-002", "status": "ready", "averageSize": 82, "origin": "Casma"},
                {"id": "lot-003", "status": "growing", "averageSize": 60, "origin": "Supe"}
            ],
            "investments": [],
            "investmentInvitations": [
                {"id": "invitation-001", "maricultorId": "user-001", "maricultorName": "Juan Pérez",
                 "investorId": "user-002", "investorEmail": "nuevo@conchas.com",
                 "sectorId": "sector-001", "sectorName": "Sector Norte", "lotId": "lot-001",
                 "status": "pending", "invitedAmount": 30000, "invitedPercentage": 25,
                 "message": "Oportunidad", "invitationDate": "2025-09-20T10:00:00.000Z",
                 "expirationDate": "2025-10-05T23:59:59.999Z", "responseDate": null,
                 "responseMessage": null, "acceptedAmount": null, "acceptedPercentage": null,
                 "createdAt": "2025-09-20T10:00:00.000Z", "updatedAt": "2025-09-20T10:00:00.000Z"}
            ],
            "systemSettings": {"currency": "PEN"},
            "_migrations": [{"id": "0001_seed_origins"}]
        }))
        .unwrap()
    }

    fn app_with(environment: Environment) -> (Router, AppState) {
        let config = Config {
            environment,
            ..Config::default()
        };
        let state = AppState::new(MemoryStore::new(document()), config);
        (create_app(state.clone()), state)
    }

    fn app() -> (Router, AppState) {
        app_with(Environment::Development)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        app.oneshot(request.unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn stored(state: &AppState) -> Document {
        state.with_store(|store| store.load()).await.unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = send(app, Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_db_hides_internal_keys() {
        let (app, _) = app();
        let body = json_body(send(app, Method::GET, "/db", None).await).await;
        assert!(body.get("_migrations").is_none());
        assert_eq!(body["lots"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_with_filter_sets_total_count() {
        let (app, _) = app();
        let response = send(app, Method::GET, "/lots?status=growing&_limit=1", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[TOTAL_COUNT_HEADER], "2");
        let body = json_body(response).await;
        assert_eq!(body, json!([{"id": "lot-001", "status": "growing", "averageSize": 45, "origin": "Samanco"}]));
    }

    #[tokio::test]
    async fn test_singular_resource_served_as_is() {
        let (app, _) = app();
        let body = json_body(send(app, Method::GET, "/systemSettings", None).await).await;
        assert_eq!(body, json!({"currency": "PEN"}));
    }

    #[tokio::test]
    async fn test_unknown_and_internal_collections_are_404() {
        let (app, _) = app();
        let response = send(app.clone(), Method::GET, "/harvests", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(json_body(response).await["error"].is_string());

        let response = send(app, Method::GET, "/_migrations", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_record() {
        let (app, _) = app();
        let response = send(app.clone(), Method::GET, "/lots/lot-002", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["origin"], "Casma");

        let response = send(app, Method::GET, "/lots/lot-999", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_generates_id() {
        let (app, state) = app();
        let response = send(
            app,
            Method::POST,
            "/investments",
            Some(json!({"amount": 30000, "lotId": "lot-001"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let id = created["id"].as_str().unwrap();
        assert_eq!(id.len(), 36);

        let doc = stored(&state).await;
        assert_eq!(doc.collection("investments").unwrap().len(), 1);
        assert!(doc.find_record("investments", id).is_some());
    }

    #[tokio::test]
    async fn test_create_duplicate_id_conflicts() {
        let (app, _) = app();
        let response = send(app, Method::POST, "/lots", Some(json!({"id": "lot-001"}))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_bad_bodies_are_400() {
        let (app, _) = app();
        let response = send(app.clone(), Method::POST, "/lots", Some(json!([1, 2]))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/lots")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_put_replaces_and_keeps_id() {
        let (app, state) = app();
        let response = send(
            app,
            Method::PUT,
            "/lots/lot-002",
            Some(json!({"id": "other", "status": "harvested"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"id": "lot-002", "status": "harvested"})
        );

        let doc = stored(&state).await;
        let lot = doc.find_record("lots", "lot-002").unwrap();
        assert!(lot.get("origin").is_none());
    }

    #[tokio::test]
    async fn test_patch_merges() {
        let (app, state) = app();
        let response = send(
            app,
            Method::PATCH,
            "/lots/lot-001",
            Some(json!({"status": "ready", "id": "ignored"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let doc = stored(&state).await;
        let lot = doc.find_record("lots", "lot-001").unwrap();
        assert_eq!(lot["status"], "ready");
        assert_eq!(lot["origin"], "Samanco");
    }

    #[tokio::test]
    async fn test_lot_status_must_follow_lifecycle() {
        let (app, state) = app();
        let backwards = send(
            app.clone(),
            Method::PATCH,
            "/lots/lot-002",
            Some(json!({"status": "growing"})),
        )
        .await;
        assert_eq!(backwards.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(backwards).await["error"]
            .as_str()
            .unwrap()
            .contains("Invalid transition"));

        let unknown = send(
            app,
            Method::PUT,
            "/lots/lot-001",
            Some(json!({"status": "sunk"})),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let doc = stored(&state).await;
        assert_eq!(doc.find_record("lots", "lot-002").unwrap()["status"], "ready");
        assert_eq!(doc.find_record("lots", "lot-001").unwrap()["origin"], "Samanco");
    }

    #[tokio::test]
    async fn test_accepting_invitation_records_response() {
        let (app, state) = app();
        let response = send(
            app.clone(),
            Method::PATCH,
            "/investmentInvitations/invitation-001",
            Some(json!({"status": "accepted", "acceptedAmount": 20000})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["acceptedAmount"], 20000);
        assert_eq!(body["acceptedPercentage"], 25);
        assert!(body["responseDate"].is_string());

        let again = send(
            app,
            Method::PATCH,
            "/investmentInvitations/invitation-001",
            Some(json!({"status": "rejected"})),
        )
        .await;
        assert_eq!(again.status(), StatusCode::BAD_REQUEST);
        let doc = stored(&state).await;
        assert_eq!(
            doc.find_record("investmentInvitations", "invitation-001").unwrap()["status"],
            "accepted"
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let (app, state) = app();
        let response = send(app.clone(), Method::DELETE, "/lots/lot-003", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({}));
        assert_eq!(stored(&state).await.collection("lots").unwrap().len(), 2);

        let response = send(app, Method::DELETE, "/lots/lot-003", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_success_hides_password() {
        let (app, _) = app();
        let response = send(
            app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "maricultor1@conchas.com", "password": "password123"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["user"]["id"], "user-001");
        assert!(body["data"]["user"].get("password").is_none());
        assert!(body["data"]["token"].is_string());
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (app, _) = app();
        let missing = send(app.clone(), Method::POST, "/auth/login", Some(json!({"email": "x"}))).await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let wrong = send(
            app.clone(),
            Method::POST,
            "/auth/login",
            Some(json!({"email": "maricultor1@conchas.com", "password": "nope"})),
        )
        .await;
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let pending = send(
            app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "nuevo@conchas.com", "password": "password123"})),
        )
        .await;
        assert_eq!(pending.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register() {
        let (app, state) = app();
        let user = json!({
            "email": "ana@conchas.com",
            "password": "secreto",
            "firstName": "Ana",
            "lastName": "Quispe",
            "role": "investor"
        });

        let response = send(app.clone(), Method::POST, "/auth/register", Some(user.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["data"]["status"], "pending");
        assert!(body["data"]["id"].as_str().unwrap().starts_with("user-"));
        assert!(body["data"].get("password").is_none());
        assert_eq!(stored(&state).await.collection("users").unwrap().len(), 3);

        let again = send(app.clone(), Method::POST, "/auth/register", Some(user)).await;
        assert_eq!(again.status(), StatusCode::CONFLICT);

        let incomplete = send(
            app,
            Method::POST,
            "/auth/register",
            Some(json!({"email": "x@y.z", "password": "p"})),
        )
        .await;
        assert_eq!(incomplete.status(), StatusCode::BAD_REQUEST);
    }

    async fn preflight_origin(environment: Environment, origin: &str) -> Option<String> {
        let (app, _) = app_with(environment);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_cors_by_environment() {
        let any = "http://192.168.0.12:5173";
        assert_eq!(
            preflight_origin(Environment::Development, any).await.as_deref(),
            Some(any)
        );
        assert_eq!(preflight_origin(Environment::Production, any).await, None);
        assert_eq!(
            preflight_origin(Environment::Production, "http://localhost:3000")
                .await
                .as_deref(),
            Some("http://localhost:3000")
        );
    }

    #[tokio::test]
    async fn test_store_calls_run_off_the_async_thread() {
        let (_, state) = app();
        let caller = std::thread::current().id();
        let worker = state
            .with_store(|_| Ok(std::thread::current().id()))
            .await
            .unwrap();
        assert_ne!(caller, worker);

        let failed = state
            .with_store(|_| -> Result<()> { panic!("store task crashed") })
            .await;
        assert!(matches!(failed, Err(crate::error::ConchitasError::Task(_))));

        // The lock is released after a panicking task.
        assert_eq!(stored(&state).await.collection("lots").unwrap().len(), 3);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_request_logs_carry_trace_span() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(
                crate::logging::DEFAULT_FILTER,
            ))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (app, _) = app();
        let response = send(app, Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("request{"), "{}", logs);
        assert!(logs.contains("uri=/health"), "{}", logs);
    }

    #[tokio::test]
    async fn test_run_server_stops_on_cancel() {
        let (app, _) = app();
        let token = CancellationToken::new();
        token.cancel();
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        run_server(app, addr, token).await.unwrap();
    }
}
