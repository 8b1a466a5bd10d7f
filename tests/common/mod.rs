use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use warehouse_api::{
    auth::{
        rbac::{seed_default_permissions, PermissionService, ROLE_MANAGER, ROLE_SUPERADMIN, ROLE_USER},
        AuthConfig, AuthService,
    },
    config::AppConfig,
    db::{self, DbConfig},
    entities::user,
    handlers::AppServices,
    AppState,
};

/// Test harness over a file-backed SQLite database in a temp directory.
/// Single connection keeps transactions serialized the way SQLite expects.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _tempdir: tempfile::TempDir,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let db_path = tempdir.path().join("warehouse_test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = db::establish_connection_with_config(&DbConfig {
            url,
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        })
        .await
        .expect("failed to open test database");

        db::run_migrations(&pool).await.expect("migrations");
        seed_default_permissions(&pool).await.expect("seed roles");

        let db = Arc::new(pool);
        let config = AppConfig {
            database_url: String::new(),
            jwt_secret: "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 86_400,
            token_sweep_interval_secs: 3600,
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: "warn".to_string(),
            log_json: false,
            auto_migrate: false,
        };
        let auth = Arc::new(AuthService::new(
            AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
                access_token_ttl_secs: config.access_token_ttl_secs as i64,
                refresh_token_ttl_secs: config.refresh_token_ttl_secs as i64,
            },
            db.clone(),
        ));

        let state = AppState {
            db: db.clone(),
            config,
            auth,
            permissions: PermissionService::new(db.clone()),
            services: AppServices::new(db),
        };
        let router = warehouse_api::app(state.clone());

        let app = Self {
            state,
            router,
            _tempdir: tempdir,
        };
        app.seed_user("Super Admin", "admin@example.com", ROLE_SUPERADMIN)
            .await;
        app.seed_user("Manager", "manager@example.com", ROLE_MANAGER)
            .await;
        app.seed_user("Regular User", "user@example.com", ROLE_USER)
            .await;
        app
    }

    pub async fn seed_user(&self, name: &str, email: &str, role: &str) -> user::Model {
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(AuthService::hash_password("password123!").unwrap()),
            role: Set(role.to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed user")
    }

    /// Access token for a seeded user, via the real login path.
    pub async fn token_for(&self, email: &str) -> String {
        let (tokens, _user) = self
            .state
            .auth
            .login(email, "password123!")
            .await
            .expect("login");
        tokens.access_token
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("admin@example.com").await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = if let Some(body) = body {
            builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body))
            .await
    }

    pub async fn post_empty(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), None).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates a product through the API and returns its id.
    pub async fn create_product(&self, token: &str, name: &str, price: &str, stock: i32) -> Uuid {
        let (status, body) = self
            .post(
                "/api/products",
                token,
                serde_json::json!({
                    "name": name,
                    "price": price,
                    "stock": stock,
                    "sku": format!("SKU-{name}"),
                    "category": "general",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product: {body}");
        Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
    }

    /// Creates a pending sales order with one line and returns its id.
    pub async fn create_order(&self, token: &str, product_id: Uuid, quantity: i32) -> Uuid {
        let (status, body) = self
            .post(
                "/api/orders",
                token,
                serde_json::json!({
                    "customer_name": "Acme Corp",
                    "items": [{ "product_id": product_id, "quantity": quantity }],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create order: {body}");
        Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
    }
}
