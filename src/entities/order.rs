use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order record. Customer details are embedded as a value object: they are
/// a snapshot taken at checkout, not a reference into a customer table, so
/// later profile edits never rewrite order history. Line items live in
/// `order_item` and carry their own price/title snapshots.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable identifier, unique across all orders. Assigned exactly
    /// once at creation and never regenerated afterwards.
    #[sea_orm(unique)]
    pub order_number: String,

    pub customer_first_name: String,
    pub customer_last_name: String,
    /// Stored lowercased so email lookups stay case-insensitive.
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_street: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postal_code: String,

    /// "cod" | "bank"
    pub payment_method: String,
    /// URL of the uploaded bank-transfer proof; only ever set for bank orders.
    pub payment_proof: Option<String>,
    /// "processing" | "confirmed" | "shipped" | "delivered" | "cancelled"
    pub status: String,
    pub total_amount: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency counter, bumped on every update.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
