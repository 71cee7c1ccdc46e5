//! End-to-end checkout and lifecycle tests against an in-memory store with
//! mock mail and storage collaborators.

mod common;

use common::{
    bank_request, cod_request, png_proof, scripted_numbers, TestApp, ADMIN_EMAIL, PROOF_URL,
};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};

use storefront_api::entities::order::Entity as OrderEntity;
use storefront_api::errors::ServiceError;
use storefront_api::services::orders::{OrderStatus, PaymentMethod};

#[tokio::test]
async fn cod_checkout_persists_a_processing_order() {
    let app = TestApp::new().await;

    let response = app
        .orders
        .create_order(cod_request("jo@example.com", 2000), None)
        .await
        .expect("checkout should succeed");

    assert!(response.order_number.starts_with("ORD-"));
    let parts: Vec<&str> = response.order_number.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[2].len(), 4);

    let order = app.orders.get_order(response.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_method, PaymentMethod::Cod);
    assert_eq!(order.payment_proof, None);
    assert_eq!(order.total_amount, Decimal::from(2000));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].product_id, "p1");
    assert_eq!(order.version, 1);

    // Both notification channels were attempted and succeeded.
    assert_eq!(app.mailer.sends_to("jo@example.com"), 1);
    assert_eq!(app.mailer.sends_to(ADMIN_EMAIL), 1);
    assert!(response.email_status.customer);
    assert!(response.email_status.admin);
}

#[tokio::test]
async fn customer_email_is_stored_lowercased() {
    let app = TestApp::new().await;

    let response = app
        .orders
        .create_order(cod_request("Jo.Doe@Example.COM", 2000), None)
        .await
        .unwrap();

    let order = app.orders.get_order(response.order_id).await.unwrap();
    assert_eq!(order.customer.email, "jo.doe@example.com");
}

#[tokio::test]
async fn order_numbers_are_unique_across_orders() {
    let app = TestApp::new().await;

    let mut numbers = std::collections::HashSet::new();
    for _ in 0..5 {
        let response = app
            .orders
            .create_order(cod_request("jo@example.com", 2000), None)
            .await
            .unwrap();
        assert!(numbers.insert(response.order_number));
    }
}

#[tokio::test]
async fn order_number_collision_retries_with_a_fresh_number() {
    let app = TestApp::new().await;
    let orders = app.orders_with_number_source(scripted_numbers(&[
        "ORD-1-1111",
        "ORD-1-1111",
        "ORD-2-2222",
    ]));

    let first = orders
        .create_order(cod_request("first@example.com", 100), None)
        .await
        .unwrap();
    assert_eq!(first.order_number, "ORD-1-1111");

    // The second checkout draws the taken number, hits the unique index and
    // retries with the next one.
    let second = orders
        .create_order(cod_request("second@example.com", 200), None)
        .await
        .unwrap();
    assert_eq!(second.order_number, "ORD-2-2222");

    let stored = OrderEntity::find().count(&*app.db).await.unwrap();
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn exhausted_order_number_retries_surface_a_conflict() {
    let app = TestApp::new().await;
    let orders = app.orders_with_number_source(scripted_numbers(&["ORD-1-1111"]));

    orders
        .create_order(cod_request("first@example.com", 100), None)
        .await
        .unwrap();

    let err = orders
        .create_order(cod_request("second@example.com", 200), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Only the first order made it in; the failed checkout left no row.
    let stored = OrderEntity::find().count(&*app.db).await.unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn bank_order_without_attachment_has_no_proof() {
    let app = TestApp::new().await;

    let response = app
        .orders
        .create_order(bank_request("jo@example.com", 2000), None)
        .await
        .unwrap();

    let order = app.orders.get_order(response.order_id).await.unwrap();
    assert_eq!(order.payment_method, PaymentMethod::Bank);
    assert_eq!(order.payment_proof, None);
    assert_eq!(app.storage.upload_count(), 0);
}

#[tokio::test]
async fn bank_order_with_attachment_records_the_uploaded_url() {
    let app = TestApp::new().await;

    let response = app
        .orders
        .create_order(bank_request("jo@example.com", 2000), Some(png_proof()))
        .await
        .unwrap();

    let order = app.orders.get_order(response.order_id).await.unwrap();
    assert_eq!(order.payment_proof.as_deref(), Some(PROOF_URL));
    assert_eq!(app.storage.upload_count(), 1);
}

#[tokio::test]
async fn cod_order_ignores_any_attachment() {
    let app = TestApp::new().await;

    let response = app
        .orders
        .create_order(cod_request("jo@example.com", 2000), Some(png_proof()))
        .await
        .unwrap();

    let order = app.orders.get_order(response.order_id).await.unwrap();
    assert_eq!(order.payment_proof, None);
    assert_eq!(app.storage.upload_count(), 0);
}

#[tokio::test]
async fn failed_proof_upload_aborts_the_checkout() {
    let app = TestApp::new().await;
    app.storage.fail_next();

    let result = app
        .orders
        .create_order(bank_request("jo@example.com", 2000), Some(png_proof()))
        .await;

    assert!(matches!(result, Err(ServiceError::ExternalServiceError(_))));
    // Nothing persisted, no notification attempted.
    let count = OrderEntity::find().count(&*app.db).await.unwrap();
    assert_eq!(count, 0);
    assert_eq!(app.mailer.send_count(), 0);
}

#[tokio::test]
async fn empty_items_fail_before_any_side_effect() {
    let app = TestApp::new().await;

    let mut request = cod_request("jo@example.com", 0);
    request.items.clear();

    let result = app.orders.create_order(request, Some(png_proof())).await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    let count = OrderEntity::find().count(&*app.db).await.unwrap();
    assert_eq!(count, 0);
    assert_eq!(app.storage.upload_count(), 0);
    assert_eq!(app.mailer.send_count(), 0);
}

#[tokio::test]
async fn incomplete_customer_fails_before_any_side_effect() {
    let app = TestApp::new().await;

    let mut request = cod_request("jo@example.com", 2000);
    request.customer.phone = String::new();

    let result = app.orders.create_order(request, None).await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    assert_eq!(app.mailer.send_count(), 0);
}

#[tokio::test]
async fn oversized_or_non_image_proof_is_rejected() {
    let app = TestApp::new().await;

    let mut proof = png_proof();
    proof.content_type = "application/pdf".to_string();

    let result = app
        .orders
        .create_order(bank_request("jo@example.com", 2000), Some(proof))
        .await;

    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    assert_eq!(app.storage.upload_count(), 0);
}

#[tokio::test]
async fn admin_mail_failure_does_not_roll_back_the_order() {
    let app = TestApp::new().await;
    app.mailer.fail_for(ADMIN_EMAIL);

    let response = app
        .orders
        .create_order(cod_request("jo@example.com", 2000), None)
        .await
        .expect("order should persist despite the admin mail failure");

    assert!(response.email_status.customer);
    assert!(!response.email_status.admin);

    // The order is durable regardless of the notification outcome.
    let order = app.orders.get_order(response.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
}

#[tokio::test]
async fn status_transition_persists_and_notifies_the_customer() {
    let app = TestApp::new().await;

    let created = app
        .orders
        .create_order(cod_request("jo@example.com", 2000), None)
        .await
        .unwrap();
    let sends_before = app.mailer.sends_to("jo@example.com");

    let updated = app
        .orders
        .update_order_status(created.order_id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Cancelled);
    assert_eq!(updated.version, 2);

    let stored = app.orders.get_order(created.order_id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);

    // Exactly one status notification attempt was made.
    assert_eq!(app.mailer.sends_to("jo@example.com"), sends_before + 1);
}

#[tokio::test]
async fn status_transition_survives_a_failing_notification() {
    let app = TestApp::new().await;

    let created = app
        .orders
        .create_order(cod_request("jo@example.com", 2000), None)
        .await
        .unwrap();
    app.mailer.fail_for("jo@example.com");

    let updated = app
        .orders
        .update_order_status(created.order_id, OrderStatus::Shipped)
        .await
        .expect("transition is successful once persisted");

    assert_eq!(updated.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn invalid_status_values_are_rejected_without_mutation() {
    let app = TestApp::new().await;

    let created = app
        .orders
        .create_order(cod_request("jo@example.com", 2000), None)
        .await
        .unwrap();

    // The handler path parses the raw status before touching the store.
    assert!(matches!(
        OrderStatus::parse("refunded"),
        Err(ServiceError::InvalidStatus(_))
    ));

    let stored = app.orders.get_order(created.order_id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Processing);
}

#[tokio::test]
async fn updating_a_missing_order_reports_not_found() {
    let app = TestApp::new().await;

    let result = app
        .orders
        .update_order_status(uuid::Uuid::new_v4(), OrderStatus::Confirmed)
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn deleted_orders_are_gone_for_good() {
    let app = TestApp::new().await;

    let created = app
        .orders
        .create_order(cod_request("jo@example.com", 2000), None)
        .await
        .unwrap();

    app.orders.delete_order(created.order_id).await.unwrap();

    let result = app.orders.get_order(created.order_id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let result = app.orders.delete_order(created.order_id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
