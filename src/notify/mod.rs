//! Domain-event fan-out: emails to shoppers and NATS messages for other services.
//!
//! Delivery never blocks or fails the request that raised the event. Failures are logged.

pub mod mailer;
pub mod templates;

use std::sync::Arc;
use thiserror::Error;

pub use mailer::{Delivery, Mailer};
pub use templates::EmailContent;

use crate::config::MailConfig;
use crate::domain::events::{DomainEvent, OrderEvent, ProductEvent};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("could not encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("NATS publish failed: {0}")]
    Publish(String),
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<Mailer>,
    mail: Arc<MailConfig>,
    nats: Option<async_nats::Client>,
}

impl Notifier {
    pub fn new(mailer: Mailer, mail: MailConfig, nats: Option<async_nats::Client>) -> Self {
        Self { mailer: Arc::new(mailer), mail: Arc::new(mail), nats }
    }

    /// Logging-only notifier with no NATS connection.
    pub fn mock(mail: MailConfig) -> Self {
        Self::new(Mailer::mock(&mail), mail, None)
    }

    /// Delivers `event` in the background.
    pub fn notify(&self, event: impl Into<DomainEvent>) {
        let event = event.into();
        let notifier = self.clone();
        tokio::spawn(async move { notifier.deliver(event).await });
    }

    pub async fn deliver(&self, event: DomainEvent) {
        if let Err(e) = self.publish(&event).await {
            tracing::warn!(subject = event.subject(), error = %e, "event publish failed");
        }
        if let DomainEvent::Product(ProductEvent::LowStock { title, stock, .. }) = &event {
            tracing::warn!(%title, stock, "product stock is low");
        }
        if let Some((to, email)) = self.email_for(&event) {
            if let Err(e) = self.mailer.send(&to, &email).await {
                tracing::error!(%to, subject = %email.subject, error = %e, "email delivery failed");
            }
        }
    }

    async fn publish(&self, event: &DomainEvent) -> Result<(), NotifyError> {
        let Some(client) = &self.nats else { return Ok(()) };
        let payload = serde_json::to_vec(event)?;
        client
            .publish(event.subject().to_string(), payload.into())
            .await
            .map_err(|e| NotifyError::Publish(e.to_string()))
    }

    /// Recipient and message for events that notify the shopper.
    pub fn email_for(&self, event: &DomainEvent) -> Option<(String, EmailContent)> {
        match event {
            DomainEvent::Order(OrderEvent::Placed { order }) => {
                Some((order.shipping_info.email.clone(), templates::order_confirmation(order, &self.mail)))
            }
            DomainEvent::Order(OrderEvent::StatusChanged { order, .. }) => {
                Some((order.shipping_info.email.clone(), templates::status_update(order, &self.mail)))
            }
            _ => None,
        }
    }
}
