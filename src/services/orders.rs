use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, IntoActiveModel, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::order::{self, Entity as OrderEntity, Model as OrderModel};
use crate::entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::notifications::{
    self, Mailer, NotificationChannel, NotificationOutcome, NotificationTask,
};
use crate::services::storage::{ObjectStorage, ALLOWED_PROOF_CONTENT_TYPES, MAX_PROOF_BYTES};

/// Attempts at generating a unique order number before giving up. The random
/// suffix makes collisions practically negligible; the unique index makes
/// them impossible to persist.
const ORDER_NUMBER_MAX_ATTEMPTS: usize = 3;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Order lifecycle states. `Processing` is the only legal initial value.
/// Transitions between states are not restricted by a graph; any state may be
/// set by an operator (enforcing a transition table is a pending product
/// decision).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Parses a client-submitted status, rejecting anything outside the
    /// enumeration before any mutation happens.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        Self::from_str(&raw.to_ascii_lowercase())
            .map_err(|_| ServiceError::InvalidStatus(format!("Unknown order status: {raw}")))
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery
    #[default]
    Cod,
    /// Manually verified bank transfer
    Bank,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[validate(length(min = 1, message = "Street is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate]
    pub address: ShippingAddress,
}

fn default_quantity() -> i32 {
    1
}

/// A line item as submitted at checkout. Title and price are snapshots owned
/// by the order from this point on.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LineItemRequest {
    /// Identifier of the referenced product
    #[serde(rename = "_id")]
    #[validate(length(min = 1, message = "Product id is required"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate]
    pub customer: CustomerDetails,
    #[validate]
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
}

/// Binary payment-proof attachment extracted from the multipart submission.
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Per-channel delivery flags reported back to the caller after checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct EmailStatus {
    pub customer: bool,
    pub admin: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub email_status: EmailStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub product_id: String,
    pub title: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub size: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer: CustomerDetails,
    pub items: Vec<LineItemResponse>,
    pub payment_method: PaymentMethod,
    pub payment_proof: Option<String>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_orders: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerOrdersPage {
    pub data: Vec<OrderResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: u64,
    pub orders_by_status: HashMap<String, u64>,
    pub total_revenue: Decimal,
    pub orders_by_payment: HashMap<String, u64>,
}

#[derive(FromQueryResult)]
struct GroupCountRow {
    key: String,
    count: i64,
}

#[derive(FromQueryResult)]
struct RevenueRow {
    total: Option<Decimal>,
}

/// Orchestrates the order lifecycle: checkout validation, payment-proof
/// ingestion, persistence, notification fan-out, status transitions and the
/// admin query surface.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    storage: Arc<dyn ObjectStorage>,
    mailer: Arc<dyn Mailer>,
    event_sender: Option<Arc<EventSender>>,
    admin_email: String,
    proof_folder: String,
    notification_timeout: Duration,
    number_source: Arc<dyn Fn() -> String + Send + Sync>,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        storage: Arc<dyn ObjectStorage>,
        mailer: Arc<dyn Mailer>,
        event_sender: Option<Arc<EventSender>>,
        admin_email: String,
        proof_folder: String,
        notification_timeout: Duration,
    ) -> Self {
        Self {
            db_pool,
            storage,
            mailer,
            event_sender,
            admin_email,
            proof_folder,
            notification_timeout,
            number_source: Arc::new(generate_order_number),
        }
    }

    /// Overrides where order numbers come from. Production keeps the default
    /// generator; tests use this to force collisions against the unique index.
    pub fn with_number_source(mut self, source: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.number_source = source;
        self
    }

    /// Runs the checkout pipeline: validate, optionally ingest the payment
    /// proof, persist atomically with a fresh order number, then fan out the
    /// customer and admin notifications. The order is durable before any
    /// notification is attempted, and notification failures never roll it
    /// back.
    #[instrument(skip(self, request, proof), fields(customer_email = %request.customer.email))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        proof: Option<ProofUpload>,
    ) -> Result<CreateOrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }

        // The client-supplied total is the charged amount; a mismatch against
        // the line sum is logged for operators rather than rejected (trust
        // model still under discussion).
        let computed_total = line_total(&request.items);
        if computed_total != request.total_amount {
            warn!(
                submitted = %request.total_amount,
                computed = %computed_total,
                "Submitted total does not match line item sum"
            );
        }

        let payment_proof = match (request.payment_method, proof) {
            (PaymentMethod::Bank, Some(upload)) => {
                validate_proof(&upload)?;
                let url = self
                    .storage
                    .upload(upload.bytes, &upload.content_type, &self.proof_folder)
                    .await?;
                Some(url)
            }
            (PaymentMethod::Cod, Some(_)) => {
                // Attachments only mean something for bank transfers.
                info!("Ignoring attachment on cash-on-delivery order");
                None
            }
            _ => None,
        };

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let item_models: Vec<OrderItemModel> = request
            .items
            .iter()
            .map(|item| OrderItemModel {
                id: Uuid::new_v4(),
                order_id,
                product_id: item.product_id.clone(),
                title: item.title.clone(),
                unit_price: item.price,
                image_urls: serde_json::json!(item.images),
                size: item.size.clone(),
                quantity: item.quantity,
                created_at: now,
            })
            .collect();

        // The order number is generated at the moment of persistence. The
        // unique index is the arbiter; on a collision the whole transaction
        // is retried with a fresh suffix.
        let mut attempts = 0;
        let order_model = loop {
            attempts += 1;
            let order_number = (self.number_source)();

            let txn = db.begin().await.map_err(|e| {
                error!(error = %e, "Failed to start transaction for order creation");
                ServiceError::DatabaseError(e)
            })?;

            let order_active = order::ActiveModel {
                id: Set(order_id),
                order_number: Set(order_number.clone()),
                customer_first_name: Set(request.customer.first_name.clone()),
                customer_last_name: Set(request.customer.last_name.clone()),
                customer_email: Set(normalize_email(&request.customer.email)),
                customer_phone: Set(request.customer.phone.clone()),
                shipping_street: Set(request.customer.address.street.clone()),
                shipping_city: Set(request.customer.address.city.clone()),
                shipping_state: Set(request.customer.address.state.clone()),
                shipping_postal_code: Set(request.customer.address.postal_code.clone()),
                payment_method: Set(request.payment_method.to_string()),
                payment_proof: Set(payment_proof.clone()),
                status: Set(OrderStatus::Processing.to_string()),
                total_amount: Set(request.total_amount),
                created_at: Set(now),
                updated_at: Set(Some(now)),
                version: Set(1),
            };

            match order_active.insert(&txn).await {
                Ok(inserted) => {
                    OrderItemEntity::insert_many(
                        item_models.iter().map(item_active).collect::<Vec<_>>(),
                    )
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        error!(error = %e, order_id = %order_id, "Failed to insert order items");
                        ServiceError::DatabaseError(e)
                    })?;

                    txn.commit().await.map_err(|e| {
                        error!(error = %e, order_id = %order_id, "Failed to commit order creation");
                        ServiceError::DatabaseError(e)
                    })?;

                    break inserted;
                }
                Err(e) if is_unique_violation(&e) && attempts < ORDER_NUMBER_MAX_ATTEMPTS => {
                    warn!(
                        order_number = %order_number,
                        attempt = attempts,
                        "Order number collision; regenerating"
                    );
                    let _ = txn.rollback().await;
                }
                Err(e) if is_unique_violation(&e) => {
                    error!(order_id = %order_id, "Order number generation exhausted retries");
                    return Err(ServiceError::Conflict(
                        "Could not allocate a unique order number".to_string(),
                    ));
                }
                Err(e) => {
                    error!(error = %e, order_id = %order_id, "Failed to create order");
                    return Err(ServiceError::DatabaseError(e));
                }
            }
        };

        info!(
            order_id = %order_id,
            order_number = %order_model.order_number,
            "Order created"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order created event");
            }
        }

        // Customer and admin delivery are uncorrelated failure domains; both
        // run concurrently and neither outcome gates the response.
        let (customer_subject, customer_html) =
            notifications::customer_confirmation(&order_model, &item_models);
        let (admin_subject, admin_html) = notifications::admin_alert(&order_model, &item_models);

        let outcomes = notifications::dispatch_all(
            &self.mailer,
            vec![
                NotificationTask {
                    channel: NotificationChannel::Customer,
                    to: order_model.customer_email.clone(),
                    subject: customer_subject,
                    html: customer_html,
                },
                NotificationTask {
                    channel: NotificationChannel::Admin,
                    to: self.admin_email.clone(),
                    subject: admin_subject,
                    html: admin_html,
                },
            ],
            self.notification_timeout,
        )
        .await;

        Ok(CreateOrderResponse {
            order_id,
            order_number: order_model.order_number,
            email_status: email_status_from(&outcomes),
        })
    }

    /// Retrieves a single order with its line items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(model_to_response(order, items))
    }

    /// Lists every order, newest first. Admin surface.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let orders = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let items = orders
            .load_many(OrderItemEntity, db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(orders
            .into_iter()
            .zip(items)
            .map(|(order, items)| model_to_response(order, items))
            .collect())
    }

    /// Lists a customer's orders by case-insensitive partial email match,
    /// newest first, paginated.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn list_orders_by_email(
        &self,
        email: &str,
        page: u64,
        limit: u64,
    ) -> Result<CustomerOrdersPage, ServiceError> {
        if email.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "email query parameter is required".to_string(),
            ));
        }

        let page = page.max(1);
        let limit = limit.max(1);
        let db = &*self.db_pool;

        // Emails are stored lowercased, so lowercasing the needle makes the
        // substring match case-insensitive. LIKE metacharacters in the needle
        // are escaped so they match literally rather than as wildcards.
        let needle = email.trim().to_lowercase();
        let pattern = format!("%{}%", escape_like(&needle));

        let paginator = OrderEntity::find()
            .filter(order::Column::CustomerEmail.like(LikeExpr::new(pattern).escape('\\')))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, limit);

        let total_orders = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let total_pages = total_orders.div_ceil(limit);

        let orders = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let items = orders
            .load_many(OrderItemEntity, db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(CustomerOrdersPage {
            data: orders
                .into_iter()
                .zip(items)
                .map(|(order, items)| model_to_response(order, items))
                .collect(),
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_orders,
                limit,
            },
        })
    }

    /// Sets a new status on an existing order. The transition is complete
    /// once persisted; the follow-up customer notification is best-effort and
    /// its failure only shows up in the logs.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status.clone();
        let version = order.version;

        let mut active = order.into_active_model();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %new_status,
            "Order status updated"
        );

        if let Some(event_sender) = &self.event_sender {
            let event = Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status: new_status.to_string(),
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, order_id = %order_id, "Failed to send status changed event");
            }
        }

        let (subject, html) = notifications::status_update(&updated, &new_status.to_string());
        notifications::dispatch_all(
            &self.mailer,
            vec![NotificationTask {
                channel: NotificationChannel::Customer,
                to: updated.customer_email.clone(),
                subject,
                html,
            }],
            self.notification_timeout,
        )
        .await;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(model_to_response(updated, items))
    }

    /// Permanently removes an order. Terminal and unrecoverable; line items
    /// cascade with the record.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = OrderEntity::delete_by_id(order_id)
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                order_id
            )));
        }

        info!(order_id = %order_id, "Order deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderDeleted(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order deleted event");
            }
        }

        Ok(())
    }

    /// Aggregate statistics for the admin dashboard. Revenue deliberately
    /// excludes cancelled orders so they never inflate reported numbers.
    #[instrument(skip(self))]
    pub async fn order_stats(&self) -> Result<OrderStats, ServiceError> {
        let db = &*self.db_pool;

        let total_orders = OrderEntity::find()
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let by_status = OrderEntity::find()
            .select_only()
            .column_as(order::Column::Status, "key")
            .column_as(order::Column::Id.count(), "count")
            .group_by(order::Column::Status)
            .into_model::<GroupCountRow>()
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let by_payment = OrderEntity::find()
            .select_only()
            .column_as(order::Column::PaymentMethod, "key")
            .column_as(order::Column::Id.count(), "count")
            .group_by(order::Column::PaymentMethod)
            .into_model::<GroupCountRow>()
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let revenue = OrderEntity::find()
            .select_only()
            .column_as(order::Column::TotalAmount.sum(), "total")
            .filter(order::Column::Status.ne(OrderStatus::Cancelled.to_string()))
            .into_model::<RevenueRow>()
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(OrderStats {
            total_orders,
            orders_by_status: by_status
                .into_iter()
                .map(|row| (row.key, row.count as u64))
                .collect(),
            total_revenue: revenue.and_then(|r| r.total).unwrap_or(Decimal::ZERO),
            orders_by_payment: by_payment
                .into_iter()
                .map(|row| (row.key, row.count as u64))
                .collect(),
        })
    }
}

/// Builds a human-readable order number: creation epoch millis plus a 4-digit
/// random suffix.
pub fn generate_order_number() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Escapes LIKE metacharacters so user input matches literally.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub(crate) fn line_total(items: &[LineItemRequest]) -> Decimal {
    items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum()
}

fn validate_proof(upload: &ProofUpload) -> Result<(), ServiceError> {
    let content_type = upload.content_type.to_ascii_lowercase();
    if !ALLOWED_PROOF_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ServiceError::ValidationError(format!(
            "Payment proof must be a JPEG, PNG or GIF image, got {}",
            upload.content_type
        )));
    }
    if upload.bytes.len() > MAX_PROOF_BYTES {
        return Err(ServiceError::ValidationError(format!(
            "Payment proof exceeds the {} MiB limit",
            MAX_PROOF_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

fn email_status_from(outcomes: &[NotificationOutcome]) -> EmailStatus {
    let succeeded = |channel| {
        outcomes
            .iter()
            .find(|o| o.channel == channel)
            .map(|o| o.success)
            .unwrap_or(false)
    };
    EmailStatus {
        customer: succeeded(NotificationChannel::Customer),
        admin: succeeded(NotificationChannel::Admin),
    }
}

fn item_active(model: &OrderItemModel) -> order_item::ActiveModel {
    order_item::ActiveModel {
        id: Set(model.id),
        order_id: Set(model.order_id),
        product_id: Set(model.product_id.clone()),
        title: Set(model.title.clone()),
        unit_price: Set(model.unit_price),
        image_urls: Set(model.image_urls.clone()),
        size: Set(model.size.clone()),
        quantity: Set(model.quantity),
        created_at: Set(model.created_at),
    }
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn model_to_response(order: OrderModel, items: Vec<OrderItemModel>) -> OrderResponse {
    let status = OrderStatus::from_str(&order.status).unwrap_or(OrderStatus::Processing);
    let payment_method = PaymentMethod::from_str(&order.payment_method).unwrap_or_default();

    OrderResponse {
        id: order.id,
        order_number: order.order_number,
        customer: CustomerDetails {
            first_name: order.customer_first_name,
            last_name: order.customer_last_name,
            email: order.customer_email,
            phone: order.customer_phone,
            address: ShippingAddress {
                street: order.shipping_street,
                city: order.shipping_city,
                state: order.shipping_state,
                postal_code: order.shipping_postal_code,
            },
        },
        items: items
            .into_iter()
            .map(|item| LineItemResponse {
                product_id: item.product_id,
                title: item.title,
                price: item.unit_price,
                images: serde_json::from_value(item.image_urls).unwrap_or_default(),
                size: item.size,
                quantity: item.quantity,
            })
            .collect(),
        payment_method,
        payment_proof: order.payment_proof,
        status,
        total_amount: order.total_amount,
        created_at: order.created_at,
        updated_at: order.updated_at,
        version: order.version,
    }
}
