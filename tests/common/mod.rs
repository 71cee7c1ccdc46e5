//! Shared test harness: in-memory SQLite store plus recording mock
//! collaborators for mail and object storage.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use storefront_api::errors::ServiceError;
use storefront_api::services::notifications::Mailer;
use storefront_api::services::orders::{
    CreateOrderRequest, CustomerDetails, LineItemRequest, OrderService, PaymentMethod,
    ProofUpload, ShippingAddress,
};
use storefront_api::services::storage::ObjectStorage;

pub const ADMIN_EMAIL: &str = "admin@shop.test";
pub const PROOF_URL: &str = "https://storage.test/payment-proofs/proof.png";

#[derive(Default)]
pub struct MockMailer {
    pub sends: Mutex<Vec<(String, String)>>,
    pub fail_addresses: Mutex<Vec<String>>,
}

impl MockMailer {
    pub fn fail_for(&self, address: &str) {
        self.fail_addresses.lock().unwrap().push(address.to_string());
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn sends_to(&self, address: &str) -> usize {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == address)
            .count()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), ServiceError> {
        self.sends
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        if self.fail_addresses.lock().unwrap().iter().any(|a| a == to) {
            return Err(ServiceError::ExternalServiceError(format!(
                "mailbox {} unavailable",
                to
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockStorage {
    pub uploads: AtomicUsize,
    pub fail: std::sync::atomic::AtomicBool,
}

impl MockStorage {
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn upload(
        &self,
        _bytes: Bytes,
        _content_type: &str,
        _folder: &str,
    ) -> Result<String, ServiceError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::ExternalServiceError(
                "storage unavailable".to_string(),
            ));
        }
        Ok(PROOF_URL.to_string())
    }
}

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub orders: OrderService,
    pub mailer: Arc<MockMailer>,
    pub storage: Arc<MockStorage>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = storefront_api::db::establish_connection("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        storefront_api::db::run_migrations(&db)
            .await
            .expect("migrations");
        let db = Arc::new(db);

        let mailer = Arc::new(MockMailer::default());
        let storage = Arc::new(MockStorage::default());

        let orders = OrderService::new(
            db.clone(),
            storage.clone(),
            mailer.clone(),
            None,
            ADMIN_EMAIL.to_string(),
            "payment-proofs".to_string(),
            Duration::from_secs(2),
        );

        Self {
            db,
            orders,
            mailer,
            storage,
        }
    }

    /// A second service over the same store whose order numbers come from a
    /// fixed script instead of the random generator.
    pub fn orders_with_number_source(
        &self,
        source: Arc<dyn Fn() -> String + Send + Sync>,
    ) -> OrderService {
        OrderService::new(
            self.db.clone(),
            self.storage.clone(),
            self.mailer.clone(),
            None,
            ADMIN_EMAIL.to_string(),
            "payment-proofs".to_string(),
            Duration::from_secs(2),
        )
        .with_number_source(source)
    }
}

/// Yields the given order numbers in sequence, repeating the last one once
/// the script runs out.
pub fn scripted_numbers(numbers: &[&str]) -> Arc<dyn Fn() -> String + Send + Sync> {
    let numbers: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
    let calls = AtomicUsize::new(0);
    Arc::new(move || {
        let i = calls.fetch_add(1, Ordering::SeqCst).min(numbers.len() - 1);
        numbers[i].clone()
    })
}

pub fn customer(email: &str) -> CustomerDetails {
    CustomerDetails {
        first_name: "Jo".to_string(),
        last_name: "Doe".to_string(),
        email: email.to_string(),
        phone: "555-0100".to_string(),
        address: ShippingAddress {
            street: "1 Main St".to_string(),
            city: "Metropolis".to_string(),
            state: "NY".to_string(),
            postal_code: "10001".to_string(),
        },
    }
}

pub fn shirt_item(quantity: i32) -> LineItemRequest {
    LineItemRequest {
        product_id: "p1".to_string(),
        title: "Shirt".to_string(),
        price: Decimal::from(1000),
        images: vec!["https://cdn.shop.test/shirt.png".to_string()],
        size: Some("L".to_string()),
        quantity,
    }
}

pub fn cod_request(email: &str, total: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        customer: customer(email),
        items: vec![shirt_item(2)],
        payment_method: PaymentMethod::Cod,
        total_amount: Decimal::from(total),
    }
}

pub fn bank_request(email: &str, total: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        payment_method: PaymentMethod::Bank,
        ..cod_request(email, total)
    }
}

pub fn png_proof() -> ProofUpload {
    ProofUpload {
        bytes: Bytes::from_static(&[0x89, b'P', b'N', b'G']),
        content_type: "image/png".to_string(),
    }
}
