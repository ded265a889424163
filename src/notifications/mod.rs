/*!
 * Receipt notification
 *
 * Best-effort email dispatch for committed orders. Everything here runs
 * strictly after the checkout transaction commits and never propagates
 * failure to the caller: a lost email is a log line, not a failed order.
 */

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::entities::{self, CustomerModel, OrderModel};

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Mail API rejected the message: {0}")]
    Rejected(String),
}

/// Outbound email contract.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError>;
}

/// Mailer that only logs, used in development and when no mail endpoint
/// is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), MailerError> {
        info!(%to, %subject, "Mail (log-only): message not dispatched");
        Ok(())
    }
}

/// Mailer backed by an HTTP mail API.
pub struct HttpApiMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpApiMailer {
    pub fn new(endpoint: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpApiMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError> {
        let mut req = self.client.post(&self.endpoint).json(&serde_json::json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "html": html_body,
        }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MailerError::Rejected(format!("{status}: {body}")));
        }
        Ok(())
    }
}

/// Renders and dispatches order receipts.
#[derive(Clone)]
pub struct ReceiptNotifier {
    db: Arc<DatabaseConnection>,
    mailer: Arc<dyn Mailer>,
    admin_email: String,
}

impl ReceiptNotifier {
    pub fn new(db: Arc<DatabaseConnection>, mailer: Arc<dyn Mailer>, admin_email: String) -> Self {
        Self {
            db,
            mailer,
            admin_email,
        }
    }

    /// Sends a confirmation to the purchaser and a copy to the admin for
    /// each committed order. All failures are logged and swallowed.
    #[instrument(skip(self, customer, orders), fields(customer_id = %customer.id, order_count = orders.len()))]
    pub async fn notify_orders(&self, customer: &CustomerModel, orders: &[OrderModel]) {
        for order in orders {
            let body = match self.render_receipt(customer, order).await {
                Ok(body) => body,
                Err(e) => {
                    error!(order_id = %order.id, "Failed to render receipt: {}", e);
                    continue;
                }
            };

            let subject = format!("Order confirmation {}", order.order_number);
            if let Err(e) = self.mailer.send(&customer.email, &subject, &body).await {
                warn!(order_id = %order.id, "Customer receipt dispatch failed: {}", e);
            }

            let admin_subject = format!("New order {}", order.order_number);
            if let Err(e) = self
                .mailer
                .send(&self.admin_email, &admin_subject, &body)
                .await
            {
                warn!(order_id = %order.id, "Admin notification dispatch failed: {}", e);
            }
        }
    }

    /// Product names are resolved with a fetch after the order committed;
    /// order items only carry the product id.
    async fn render_receipt(
        &self,
        customer: &CustomerModel,
        order: &OrderModel,
    ) -> Result<String, sea_orm::DbErr> {
        let items = order
            .find_related(entities::order_item::Entity)
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let names: HashMap<Uuid, String> = entities::product::Entity::find()
            .filter(entities::product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let mut rows = String::new();
        for item in &items {
            let name = names
                .get(&item.product_id)
                .map(String::as_str)
                .unwrap_or("(unavailable product)");
            rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                name, item.quantity, item.line_total
            ));
        }

        Ok(format!(
            "<h1>Thanks for your order, {}!</h1>\
             <p>Order {} has been placed.</p>\
             <table><tr><th>Item</th><th>Qty</th><th>Total</th></tr>{}</table>\
             <p>Order total: {} {}</p>",
            customer.name, order.order_number, rows, order.total_amount, order.currency
        ))
    }
}
