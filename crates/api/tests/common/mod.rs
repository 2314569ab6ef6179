#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tskr_api::auth::jwt::{generate_access_token, JwtConfig};
use tskr_api::config::{AppEnv, LogFormat, RateLimitConfig, ServerConfig};
use tskr_api::middleware::rate_limit::RateLimiter;
use tskr_api::router::build_app_router;
use tskr_api::state::AppState;
use tskr_core::roles::HouseholdRole;
use tskr_core::types::DbId;
use tskr_db::MemoryStore;
use tskr_events::DashboardBus;

pub const DOER: DbId = 501;
pub const APPROVER: DbId = 502;
pub const OUTSIDER: DbId = 503;

/// Peer address every request appears to come from unless a test says otherwise.
pub const CLIENT_ADDR: &str = "192.0.2.10:50000";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        app_env: AppEnv::Development,
        log_format: LogFormat::Pretty,
        rate_limit: RateLimitConfig {
            max_requests: 1_000,
            window: Duration::from_secs(60),
            trusted_proxies: Vec::new(),
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// A router over an in-memory store, plus handles to poke at its state.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub bus: Arc<DashboardBus>,
    pub config: ServerConfig,
    /// Household with `DOER` and `APPROVER` as members and threshold 50.
    pub household_id: DbId,
}

impl TestApp {
    pub fn token(&self, user_id: DbId) -> String {
        generate_access_token(user_id, &self.config.jwt).unwrap()
    }

    pub fn households_path(&self, rest: &str) -> String {
        format!("/api/v1/households/{}{rest}", self.household_id)
    }

    pub async fn get(&self, uri: &str, user_id: DbId) -> Response<Body> {
        self.send(Method::GET, uri, Some(user_id), None).await
    }

    pub async fn post_json(&self, uri: &str, user_id: DbId, body: Value) -> Response<Body> {
        self.send(Method::POST, uri, Some(user_id), Some(body)).await
    }

    pub async fn patch_json(&self, uri: &str, user_id: DbId, body: Value) -> Response<Body> {
        self.send(Method::PATCH, uri, Some(user_id), Some(body)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<DbId>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header("authorization", format!("Bearer {}", self.token(user_id)));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    /// Send a prepared request. Connection info is filled in from
    /// [`CLIENT_ADDR`] when the request does not carry its own.
    pub async fn send_request(&self, mut request: Request<Body>) -> Response<Body> {
        if request.extensions().get::<ConnectInfo<SocketAddr>>().is_none() {
            let addr: SocketAddr = CLIENT_ADDR.parse().unwrap();
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Build the app with [`test_config`].
pub async fn build_test_app() -> TestApp {
    build_test_app_with(test_config()).await
}

/// Build the full application router with all middleware layers over a
/// fresh [`MemoryStore`], seeded with one household.
pub async fn build_test_app_with(config: ServerConfig) -> TestApp {
    let store = MemoryStore::new();
    let household = store.create_household("Test House", 50).await;
    store
        .add_member(household.id, DOER, HouseholdRole::Doer)
        .await;
    store
        .add_member(household.id, APPROVER, HouseholdRole::Approver)
        .await;

    let bus = Arc::new(DashboardBus::new());
    let state = AppState {
        store: Arc::new(store.clone()),
        config: Arc::new(config.clone()),
        dashboard_bus: Arc::clone(&bus),
        rate_limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        bus,
        config,
        household_id: household.id,
    }
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
