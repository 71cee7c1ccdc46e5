use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::ErrorResponse;
use crate::handlers::orders::UpdateOrderStatusRequest;
use crate::services::orders::{
    CreateOrderRequest, CreateOrderResponse, CustomerDetails, CustomerOrdersPage, EmailStatus,
    LineItemRequest, LineItemResponse, OrderResponse, OrderStats, OrderStatus, Pagination,
    PaymentMethod, ShippingAddress,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Order API",
        description = "Checkout, order lifecycle and admin reporting"
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::list_orders_by_email,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::order_stats,
    ),
    components(schemas(
        CreateOrderRequest,
        CreateOrderResponse,
        CustomerDetails,
        CustomerOrdersPage,
        EmailStatus,
        ErrorResponse,
        LineItemRequest,
        LineItemResponse,
        OrderResponse,
        OrderStats,
        OrderStatus,
        Pagination,
        PaymentMethod,
        ShippingAddress,
        UpdateOrderStatusRequest,
    )),
    tags((name = "orders", description = "Order checkout and lifecycle"))
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the generated document at
/// `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
