// src/services/push.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::pwa::{DeliveryReport, DeliveryStatus, Notification, PushOutcome, PushSubscription, SkipReason},
};

#[async_trait]
pub trait PushSubscriptionStore: Send + Sync {
    async fn subscriptions_for(&self, user_id: Uuid) -> Result<Vec<PushSubscription>, AppError>;

    /// Deleting an already deleted subscription is not an error.
    async fn remove(&self, subscription_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The push service no longer knows the endpoint (404/410).
    #[error("subscription is gone ({status})")]
    Gone { status: u16 },

    #[error("{0}")]
    Failed(String),
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn deliver(&self, subscription: &PushSubscription, payload: &[u8]) -> Result<(), PushError>;
}

#[derive(Clone)]
pub struct PushService {
    store: Arc<dyn PushSubscriptionStore>,
    /// `None` when no VAPID keys are configured.
    gateway: Option<Arc<dyn PushGateway>>,
    timeout: Duration,
}

impl PushService {
    pub fn new(
        store: Arc<dyn PushSubscriptionStore>,
        gateway: Option<Arc<dyn PushGateway>>,
        timeout: Duration,
    ) -> Self {
        Self { store, gateway, timeout }
    }

    /// Sends `notification` to every subscription of `user_id`.
    ///
    /// Per-subscription failures end up in the report; only a failure to read
    /// the subscriptions fails the whole call.
    pub async fn send_push(&self, user_id: Uuid, notification: &Notification) -> Result<PushOutcome, AppError> {
        let Some(gateway) = self.gateway.as_ref() else {
            tracing::warn!(user_id = %user_id, "push skipped: VAPID keys not configured");
            return Ok(PushOutcome::Skipped { reason: SkipReason::VapidNotConfigured });
        };

        let subscriptions = self.store.subscriptions_for(user_id).await?;
        if subscriptions.is_empty() {
            tracing::info!(user_id = %user_id, "push skipped: no subscriptions");
            return Ok(PushOutcome::Skipped { reason: SkipReason::NoSubscriptions });
        }

        let payload = serde_json::to_vec(notification).map_err(anyhow::Error::from)?;

        let mut results = Vec::with_capacity(subscriptions.len());
        for subscription in &subscriptions {
            results.push(self.deliver_one(gateway.as_ref(), subscription, &payload).await);
        }

        let delivered = results.iter().filter(|r| r.status == DeliveryStatus::Success).count();
        tracing::info!(user_id = %user_id, delivered, total = results.len(), "push batch finished");

        Ok(PushOutcome::Sent { results })
    }

    async fn deliver_one(
        &self,
        gateway: &dyn PushGateway,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> DeliveryReport {
        let outcome = tokio::time::timeout(self.timeout, gateway.deliver(subscription, payload)).await;

        let (status, message, removed) = match outcome {
            Ok(Ok(())) => (DeliveryStatus::Success, None, false),
            Ok(Err(PushError::Gone { status })) => {
                let removed = match self.store.remove(subscription.id).await {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::error!(subscription_id = %subscription.id, "failed to prune subscription: {:?}", e);
                        false
                    }
                };
                (DeliveryStatus::Error, Some(format!("Subscription expired ({status})")), removed)
            }
            Ok(Err(PushError::Failed(reason))) => {
                tracing::warn!(subscription_id = %subscription.id, "push delivery failed: {}", reason);
                (DeliveryStatus::Error, Some(reason), false)
            }
            Err(_) => {
                tracing::warn!(subscription_id = %subscription.id, "push delivery timed out");
                (
                    DeliveryStatus::Error,
                    Some(format!("Timed out after {}s", self.timeout.as_secs())),
                    false,
                )
            }
        };

        DeliveryReport { subscription_id: subscription.id, status, message, removed }
    }
}
