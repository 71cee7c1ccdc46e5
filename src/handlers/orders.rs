use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::orders::{
    CreateOrderRequest, CreateOrderResponse, CustomerOrdersPage, OrderResponse, OrderStats,
    OrderStatus, ProofUpload, DEFAULT_LIMIT, DEFAULT_PAGE,
};
use crate::{ApiResponse, AppState};

/// Multipart field carrying the JSON order payload.
const ORDER_FIELD: &str = "order";
/// Multipart field carrying the optional payment-proof image.
const PROOF_FIELD: &str = "paymentProof";

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomerOrdersQuery {
    pub email: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Create a new order from a multipart checkout submission: an `order` JSON
/// field plus an optional `paymentProof` image for bank transfers.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "orders",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 400, description = "Invalid submission"),
        (status = 502, description = "Payment proof upload failed")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<CreateOrderResponse>>), ServiceError> {
    let mut payload: Option<String> = None;
    let mut proof: Option<ProofUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ServiceError::ValidationError(format!("Invalid multipart submission: {}", e))
    })? {
        match field.name() {
            Some(ORDER_FIELD) => {
                let text = field.text().await.map_err(|e| {
                    ServiceError::ValidationError(format!("Unreadable order payload: {}", e))
                })?;
                payload = Some(text);
            }
            Some(PROOF_FIELD) => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    ServiceError::ValidationError(format!("Unreadable payment proof: {}", e))
                })?;
                proof = Some(ProofUpload {
                    bytes,
                    content_type,
                });
            }
            _ => {}
        }
    }

    let payload = payload.ok_or_else(|| {
        ServiceError::ValidationError(format!("Missing '{}' field", ORDER_FIELD))
    })?;
    let request: CreateOrderRequest = serde_json::from_str(&payload)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid order payload: {}", e)))?;

    let response = state.order_service.create_order(request, proof).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Get a single order with its line items.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.order_service.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// List all orders, newest first. Admin surface.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "orders",
    responses((status = 200, description = "All orders, newest first"))
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OrdersEnvelope>>, ServiceError> {
    let orders = state.order_service.list_orders().await?;
    Ok(Json(ApiResponse::success(OrdersEnvelope { data: orders })))
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct OrdersEnvelope {
    pub data: Vec<OrderResponse>,
}

/// List a customer's orders by email, paginated.
#[utoipa::path(
    get,
    path = "/api/v1/orders/by-email",
    tag = "orders",
    params(
        ("email" = String, Query, description = "Customer email (partial, case-insensitive)"),
        ("page" = Option<u64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<u64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Matching orders with pagination", body = CustomerOrdersPage),
        (status = 400, description = "Missing email parameter")
    )
)]
pub async fn list_orders_by_email(
    State(state): State<AppState>,
    Query(query): Query<CustomerOrdersQuery>,
) -> Result<Json<ApiResponse<CustomerOrdersPage>>, ServiceError> {
    let email = query.email.unwrap_or_default();
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let result = state
        .order_service
        .list_orders_by_email(&email, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Set a new status on an order. The customer is notified best-effort.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 400, description = "Invalid status value"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let status = OrderStatus::parse(&request.status)?;
    let order = state.order_service.update_order_status(id, status).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Permanently delete an order. Admin surface; irreversible.
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.order_service.delete_order(id).await?;
    Ok(Json(ApiResponse::success_message(
        "Order deleted successfully".to_string(),
    )))
}

/// Aggregate order statistics for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/orders/stats",
    tag = "orders",
    responses((status = 200, description = "Order statistics", body = OrderStats))
)]
pub async fn order_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OrderStats>>, ServiceError> {
    let stats = state.order_service.order_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}
