//! Warehouse API Library
//!
//! Order management backend: sales orders, purchase orders, delivery order
//! generation, warehouse tasks, and role-based access control.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::{middleware, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::auth::{rbac::PermissionService, AuthService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<AuthService>,
    pub permissions: PermissionService,
    pub services: handlers::AppServices,
}

/// Success envelope: `{"status": "success", "data": ...}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `"success"`; errors use [`errors::ErrorResponse`] instead.
    #[schema(example = "success")]
    pub status: &'static str,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Everything under `/api`. Login and refresh stay public; the rest sits
/// behind the bearer-token middleware.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(handlers::auth::protected_router())
        .merge(handlers::users::router())
        .merge(handlers::roles::router())
        .merge(handlers::products::router())
        .merge(handlers::customers::router())
        .merge(handlers::orders::router())
        .merge(handlers::purchase_orders::router())
        .merge(handlers::tasks::router())
        .merge(handlers::logs::router())
        .merge(handlers::dashboard::router())
        .layer(middleware::from_fn_with_state(state, auth::require_auth));

    Router::new()
        .merge(handlers::auth::public_router())
        .merge(protected)
}

/// Assembles the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes(state.clone()))
        .merge(openapi::swagger_router())
        .with_state(state)
}
