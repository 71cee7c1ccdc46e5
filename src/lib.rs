//! Storefront Order API
//!
//! Checkout with bank-transfer proof ingestion, order lifecycle management
//! with notification fan-out, and an admin query/reporting surface.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::orders::OrderService;

/// Multipart submissions carry up to a 5 MiB proof image plus the JSON
/// payload; cap request bodies a little above that.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub order_service: Arc<OrderService>,
}

/// Common response wrapper. The payload is flattened into the envelope, so a
/// successful checkout reads `{success, orderId, orderNumber, emailStatus}`.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_message(message: String) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message),
        }
    }
}

/// Versioned API routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/stats", get(handlers::orders::order_stats))
        .route(
            "/orders/by-email",
            get(handlers::orders::list_orders_by_email),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, ToSchema)]
    struct Payload {
        value: u32,
    }

    #[test]
    fn payload_is_flattened_into_the_envelope() {
        let response = ApiResponse::success(Payload { value: 7 });
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body, json!({"success": true, "value": 7}));
    }

    #[test]
    fn message_only_responses_omit_payload_fields() {
        let response = ApiResponse::<Payload>::success_message("done".into());
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body, json!({"success": true, "message": "done"}));
    }
}
