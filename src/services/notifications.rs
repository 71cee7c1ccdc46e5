use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::entities::{order, order_item};
use crate::errors::ServiceError;

/// Outbound mail delivery. Implementations accept a recipient, subject and
/// rendered HTML body and report success or failure.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), ServiceError>;
}

/// Which recipient a notification targets. Channels fail independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Customer,
    Admin,
}

/// One independent notification to dispatch.
pub struct NotificationTask {
    pub channel: NotificationChannel,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outcome of a single dispatched notification.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub channel: NotificationChannel,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Dispatches every task concurrently and waits for all outcomes. No single
/// failure aborts the others or the operation that triggered the fan-out;
/// each task is capped by `timeout` and a timed-out send counts as a plain
/// delivery failure.
pub async fn dispatch_all(
    mailer: &Arc<dyn Mailer>,
    tasks: Vec<NotificationTask>,
    timeout: Duration,
) -> Vec<NotificationOutcome> {
    let sends = tasks.into_iter().map(|task| {
        let mailer = Arc::clone(mailer);
        async move {
            let result =
                tokio::time::timeout(timeout, mailer.send(&task.to, &task.subject, &task.html))
                    .await;

            match result {
                Ok(Ok(())) => {
                    info!(channel = ?task.channel, to = %task.to, "Notification delivered");
                    NotificationOutcome {
                        channel: task.channel,
                        success: true,
                        error: None,
                    }
                }
                Ok(Err(e)) => {
                    warn!(channel = ?task.channel, to = %task.to, error = %e, "Notification failed");
                    NotificationOutcome {
                        channel: task.channel,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
                Err(_) => {
                    warn!(
                        channel = ?task.channel,
                        to = %task.to,
                        timeout_secs = timeout.as_secs(),
                        "Notification timed out"
                    );
                    NotificationOutcome {
                        channel: task.channel,
                        success: false,
                        error: Some(format!("timed out after {}s", timeout.as_secs())),
                    }
                }
            }
        }
    });

    join_all(sends).await
}

/// HTTP transactional-mail client.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    #[instrument(skip(self, html), fields(to = %to, subject = %subject))]
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), ServiceError> {
        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "html": html,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Mail request failed");
                ServiceError::ExternalServiceError(format!("Mail send failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Mail provider rejected message");
            return Err(ServiceError::ExternalServiceError(format!(
                "Mail send failed with status {}",
                status
            )));
        }

        Ok(())
    }
}

fn item_rows(items: &[order_item::Model]) -> String {
    items
        .iter()
        .map(|item| {
            let size = item
                .size
                .as_deref()
                .map(|s| format!(" (size {})", s))
                .unwrap_or_default();
            format!(
                "<tr><td>{}{}</td><td>{}</td><td>{}</td></tr>",
                item.title, size, item.quantity, item.unit_price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Confirmation mail sent to the customer after checkout, with itemized
/// contents and the charged total.
pub fn customer_confirmation(
    order: &order::Model,
    items: &[order_item::Model],
) -> (String, String) {
    let subject = format!("Order confirmation - {}", order.order_number);
    let html = format!(
        "<h2>Thank you for your order, {}!</h2>\
         <p>Your order <strong>{}</strong> has been received and is being processed.</p>\
         <table><tr><th>Item</th><th>Qty</th><th>Unit price</th></tr>{}</table>\
         <p>Total: <strong>{}</strong></p>\
         <p>Payment method: {}</p>",
        order.customer_first_name,
        order.order_number,
        item_rows(items),
        order.total_amount,
        order.payment_method,
    );
    (subject, html)
}

/// New-order alert sent to the administrative mailbox, including the payment
/// proof URL when one was uploaded.
pub fn admin_alert(order: &order::Model, items: &[order_item::Model]) -> (String, String) {
    let subject = format!("New order received - {}", order.order_number);
    let proof_line = match &order.payment_proof {
        Some(url) => format!("<p>Payment proof: <a href=\"{url}\">{url}</a></p>"),
        None => String::new(),
    };
    let html = format!(
        "<h2>New order {}</h2>\
         <p>Customer: {} {} &lt;{}&gt;, phone {}</p>\
         <p>Ship to: {}, {}, {} {}</p>\
         <table><tr><th>Item</th><th>Qty</th><th>Unit price</th></tr>{}</table>\
         <p>Total: <strong>{}</strong> ({})</p>{}",
        order.order_number,
        order.customer_first_name,
        order.customer_last_name,
        order.customer_email,
        order.customer_phone,
        order.shipping_street,
        order.shipping_city,
        order.shipping_state,
        order.shipping_postal_code,
        item_rows(items),
        order.total_amount,
        order.payment_method,
        proof_line,
    );
    (subject, html)
}

/// Status-change mail sent to the customer, with a per-status message.
pub fn status_update(order: &order::Model, new_status: &str) -> (String, String) {
    let message = match new_status {
        "processing" => "Your order is being processed.",
        "confirmed" => "Your order has been confirmed and will be prepared for shipping.",
        "shipped" => "Your order is on its way!",
        "delivered" => "Your order has been delivered. Enjoy!",
        "cancelled" => "Your order has been cancelled. Contact us if this is unexpected.",
        _ => "Your order status has been updated.",
    };
    let subject = format!("Order {} update: {}", order.order_number, new_status);
    let html = format!(
        "<h2>Hi {},</h2><p>{}</p><p>Order number: <strong>{}</strong></p>",
        order.customer_first_name, message, order.order_number,
    );
    (subject, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyMailer {
        calls: AtomicUsize,
        fail_to: String,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, to: &str, _subject: &str, _html: &str) -> Result<(), ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if to == self.fail_to {
                Err(ServiceError::ExternalServiceError("mailbox down".into()))
            } else {
                Ok(())
            }
        }
    }

    struct HangingMailer;

    #[async_trait]
    impl Mailer for HangingMailer {
        async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<(), ServiceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn task(channel: NotificationChannel, to: &str) -> NotificationTask {
        NotificationTask {
            channel,
            to: to.to_string(),
            subject: "subject".into(),
            html: "<p>body</p>".into(),
        }
    }

    #[tokio::test]
    async fn one_failing_channel_does_not_abort_the_other() {
        let mailer: Arc<dyn Mailer> = Arc::new(FlakyMailer {
            calls: AtomicUsize::new(0),
            fail_to: "admin@shop.test".into(),
        });

        let outcomes = dispatch_all(
            &mailer,
            vec![
                task(NotificationChannel::Customer, "jo@example.com"),
                task(NotificationChannel::Admin, "admin@shop.test"),
            ],
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        let customer = outcomes
            .iter()
            .find(|o| o.channel == NotificationChannel::Customer)
            .unwrap();
        let admin = outcomes
            .iter()
            .find(|o| o.channel == NotificationChannel::Admin)
            .unwrap();
        assert!(customer.success);
        assert!(!admin.success);
        assert!(admin.error.as_deref().unwrap().contains("mailbox down"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_is_cut_off_by_the_timeout() {
        let mailer: Arc<dyn Mailer> = Arc::new(HangingMailer);

        let outcomes = dispatch_all(
            &mailer,
            vec![task(NotificationChannel::Customer, "jo@example.com")],
            Duration::from_secs(2),
        )
        .await;

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert!(outcomes[0].error.as_deref().unwrap().contains("timed out"));
    }
}
