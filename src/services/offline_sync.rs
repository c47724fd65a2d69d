// src/services/offline_sync.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::pwa::{ActionReport, ActionType, DeliveryStatus, OfflineAction, SyncReport},
};

#[async_trait]
pub trait OfflineActionStore: Send + Sync {
    /// Unsynced actions of `user_id`, oldest first.
    async fn pending_for(&self, user_id: Uuid) -> Result<Vec<OfflineAction>, AppError>;

    /// Flags the action as synced unless that already happened; returns whether this call did it.
    async fn mark_synced(&self, action_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError>;
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ActionRejected(pub String);

/// Applies one queued action to its target resource.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn apply(&self, action: &OfflineAction) -> Result<(), ActionRejected>;
}

/// Checks the structural preconditions of an action and accepts it.
pub struct AcknowledgeHandler;

#[async_trait]
impl ActionHandler for AcknowledgeHandler {
    async fn apply(&self, action: &OfflineAction) -> Result<(), ActionRejected> {
        match action.action_type {
            ActionType::Update | ActionType::Delete
                if action.resource_id.as_deref().is_none_or(str::is_empty) =>
            {
                Err(ActionRejected(format!(
                    "A resource id is required to {} a {}",
                    action.action_type.as_str(),
                    action.resource_type
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct OfflineSyncService {
    store: Arc<dyn OfflineActionStore>,
    handler: Arc<dyn ActionHandler>,
    timeout: Duration,
}

impl OfflineSyncService {
    pub fn new(store: Arc<dyn OfflineActionStore>, handler: Arc<dyn ActionHandler>, timeout: Duration) -> Self {
        Self { store, handler, timeout }
    }

    /// Replays every pending action of `user_id`. Failed actions stay pending
    /// and are reported; they never stop the rest of the batch.
    pub async fn sync_pending(&self, user_id: Uuid) -> Result<SyncReport, AppError> {
        let pending = self.store.pending_for(user_id).await?;

        let mut results = Vec::with_capacity(pending.len());
        let mut synced_count = 0;

        for action in &pending {
            let report = self.sync_one(action).await;
            if report.status == DeliveryStatus::Success && report.message.is_none() {
                synced_count += 1;
            }
            results.push(report);
        }

        tracing::info!(user_id = %user_id, processed = pending.len(), synced = synced_count, "offline actions synced");

        Ok(SyncReport {
            status: "success",
            processed_count: pending.len(),
            synced_count,
            results,
        })
    }

    async fn sync_one(&self, action: &OfflineAction) -> ActionReport {
        let report = |status, message: Option<String>| ActionReport { action_id: action.id, status, message };

        match tokio::time::timeout(self.timeout, self.handler.apply(action)).await {
            Ok(Ok(())) => {}
            Ok(Err(rejected)) => return report(DeliveryStatus::Error, Some(rejected.0)),
            Err(_) => {
                return report(
                    DeliveryStatus::Error,
                    Some(format!("Timed out after {}s", self.timeout.as_secs())),
                );
            }
        }

        match self.store.mark_synced(action.id, Utc::now()).await {
            Ok(true) => report(DeliveryStatus::Success, None),
            // Another sync request marked it between our read and our write
            Ok(false) => report(DeliveryStatus::Success, Some("Already synced".to_string())),
            Err(e) => {
                tracing::error!(action_id = %action.id, "failed to mark action synced: {:?}", e);
                report(DeliveryStatus::Error, Some("Could not record the sync".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<OfflineAction>>,
    }

    impl MemoryStore {
        fn push(&self, user_id: Uuid, action_type: ActionType, resource_id: Option<&str>, age_minutes: i64) -> Uuid {
            let action = OfflineAction {
                id: Uuid::new_v4(),
                user_id,
                action_type,
                resource_type: "booking".into(),
                resource_id: resource_id.map(str::to_string),
                data: json!({ "note": "queued offline" }),
                created_at: Utc::now() - ChronoDuration::minutes(age_minutes),
                synced: false,
                synced_at: None,
            };
            let id = action.id;
            self.rows.lock().unwrap().push(action);
            id
        }

        fn pending_count(&self) -> usize {
            self.rows.lock().unwrap().iter().filter(|a| !a.synced).count()
        }
    }

    #[async_trait]
    impl OfflineActionStore for MemoryStore {
        async fn pending_for(&self, user_id: Uuid) -> Result<Vec<OfflineAction>, AppError> {
            let mut rows: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.user_id == user_id && !a.synced)
                .cloned()
                .collect();
            rows.sort_by_key(|a| a.created_at);
            Ok(rows)
        }

        async fn mark_synced(&self, action_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|a| a.id == action_id && !a.synced) {
                Some(action) => {
                    action.synced = true;
                    action.synced_at = Some(at);
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl ActionHandler for SlowHandler {
        async fn apply(&self, _action: &OfflineAction) -> Result<(), ActionRejected> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn service(store: Arc<MemoryStore>) -> OfflineSyncService {
        OfflineSyncService::new(store, Arc::new(AcknowledgeHandler), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn syncs_oldest_first_and_is_idempotent() {
        let user = Uuid::new_v4();
        let store = Arc::new(MemoryStore::default());
        let newer = store.push(user, ActionType::Create, None, 1);
        let older = store.push(user, ActionType::Update, Some("42"), 30);

        let first = service(store.clone()).sync_pending(user).await.unwrap();
        assert_eq!(first.processed_count, 2);
        assert_eq!(first.synced_count, 2);
        assert_eq!(first.results[0].action_id, older);
        assert_eq!(first.results[1].action_id, newer);

        let second = service(store.clone()).sync_pending(user).await.unwrap();
        assert_eq!(second.processed_count, 0);
        assert_eq!(second.synced_count, 0);
        assert!(second.results.is_empty());
    }

    #[tokio::test]
    async fn a_rejected_action_stays_pending_without_blocking_others() {
        let user = Uuid::new_v4();
        let store = Arc::new(MemoryStore::default());
        let broken = store.push(user, ActionType::Delete, None, 10);
        store.push(user, ActionType::Create, None, 5);

        let report = service(store.clone()).sync_pending(user).await.unwrap();
        assert_eq!(report.processed_count, 2);
        assert_eq!(report.synced_count, 1);
        assert_eq!(report.results[0].action_id, broken);
        assert_eq!(report.results[0].status, DeliveryStatus::Error);
        assert_eq!(store.pending_count(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["results"][1]["status"], "success");
    }

    #[tokio::test]
    async fn other_users_actions_are_untouched() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let store = Arc::new(MemoryStore::default());
        store.push(alice, ActionType::Create, None, 1);
        store.push(bob, ActionType::Create, None, 1);

        let report = service(store.clone()).sync_pending(alice).await.unwrap();
        assert_eq!(report.synced_count, 1);
        assert_eq!(store.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_slow_handler_times_out_per_action() {
        let user = Uuid::new_v4();
        let store = Arc::new(MemoryStore::default());
        store.push(user, ActionType::Create, None, 1);
        let sync = OfflineSyncService::new(store.clone(), Arc::new(SlowHandler), Duration::from_secs(5));

        let report = sync.sync_pending(user).await.unwrap();
        assert_eq!(report.synced_count, 0);
        assert_eq!(report.results[0].message.as_deref(), Some("Timed out after 5s"));
        assert_eq!(store.pending_count(), 1);
    }
}
