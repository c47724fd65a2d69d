// Repository SQL against a real database: OTP lifecycle, offline-action
// queue and push-subscription pruning.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use dodo_backend::{
    db::{OfflineActionRepository, OtpRepository, PushRepository},
    models::pwa::{DeliveryStatus, Notification, PushOutcome, PushSubscription, PushSubscriptionPayload},
    services::{
        offline_sync::{AcknowledgeHandler, OfflineActionStore, OfflineSyncService},
        otp::OtpStore,
        push::{PushError, PushGateway, PushService, PushSubscriptionStore},
    },
};

const MOBILE: &str = "9876543210";

async fn insert_user(pool: &PgPool, mobile: &str) -> Uuid {
    sqlx::query_scalar("INSERT INTO users (mobile) VALUES ($1) RETURNING id")
        .bind(mobile)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---
// OTP
// ---

#[sqlx::test(migrations = "./migrations")]
async fn new_code_replaces_the_previous_one(pool: PgPool) {
    let repo = OtpRepository::new(pool.clone());
    let now = Utc::now();
    let expires = now + ChronoDuration::minutes(10);

    let first = repo.replace(MOBILE, "111111", now, expires).await.unwrap();
    let second = repo.replace(MOBILE, "222222", now, expires).await.unwrap();
    assert_ne!(first.id, second.id);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM otps WHERE mobile = $1")
        .bind(MOBILE)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    assert!(!repo.consume(MOBILE, "111111", now).await.unwrap());
    assert!(repo.consume(MOBILE, "222222", now).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn code_is_single_use_and_expires(pool: PgPool) {
    let repo = OtpRepository::new(pool);
    let issued = Utc::now();
    repo.replace(MOBILE, "482913", issued, issued + ChronoDuration::minutes(10))
        .await
        .unwrap();

    let late = issued + ChronoDuration::minutes(10) + ChronoDuration::seconds(1);
    assert!(!repo.consume(MOBILE, "482913", late).await.unwrap());

    let on_time = issued + ChronoDuration::minutes(5);
    assert!(!repo.consume("9123456789", "482913", on_time).await.unwrap());
    assert!(repo.consume(MOBILE, "482913", on_time).await.unwrap());
    assert!(!repo.consume(MOBILE, "482913", on_time).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_verification_has_one_winner(pool: PgPool) {
    let repo = OtpRepository::new(pool);
    let now = Utc::now();
    repo.replace(MOBILE, "555555", now, now + ChronoDuration::minutes(10))
        .await
        .unwrap();

    let (a, b) = tokio::join!(repo.consume(MOBILE, "555555", now), repo.consume(MOBILE, "555555", now));
    assert_eq!([a.unwrap(), b.unwrap()].iter().filter(|won| **won).count(), 1);
}

// ---
// Offline actions
// ---

async fn insert_action(pool: &PgPool, user_id: Uuid, resource_id: Option<&str>, minutes_ago: i64, synced: bool) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO offline_actions (user_id, action_type, resource_type, resource_id, data, created_at, synced)
        VALUES ($1, 'update', 'booking', $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(resource_id)
    .bind(json!({ "status": "confirmed" }))
    .bind(Utc::now() - ChronoDuration::minutes(minutes_ago))
    .bind(synced)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn pending_actions_come_oldest_first_and_mark_once(pool: PgPool) {
    let user_id = insert_user(&pool, MOBILE).await;
    let other_user = insert_user(&pool, "9123456789").await;

    let newer = insert_action(&pool, user_id, Some("b-2"), 1, false).await;
    let older = insert_action(&pool, user_id, Some("b-1"), 5, false).await;
    insert_action(&pool, user_id, Some("b-0"), 9, true).await;
    insert_action(&pool, other_user, Some("b-9"), 3, false).await;

    let repo = OfflineActionRepository::new(pool);
    let pending: Vec<Uuid> = repo.pending_for(user_id).await.unwrap().iter().map(|a| a.id).collect();
    assert_eq!(pending, vec![older, newer]);

    assert!(repo.mark_synced(older, Utc::now()).await.unwrap());
    assert!(!repo.mark_synced(older, Utc::now()).await.unwrap());

    let pending: Vec<Uuid> = repo.pending_for(user_id).await.unwrap().iter().map(|a| a.id).collect();
    assert_eq!(pending, vec![newer]);
}

#[sqlx::test(migrations = "./migrations")]
async fn rejected_actions_stay_pending_after_sync(pool: PgPool) {
    let user_id = insert_user(&pool, MOBILE).await;
    let accepted = insert_action(&pool, user_id, Some("b-1"), 5, false).await;
    let rejected = insert_action(&pool, user_id, None, 1, false).await;

    let repo = OfflineActionRepository::new(pool);
    let sync = OfflineSyncService::new(Arc::new(repo.clone()), Arc::new(AcknowledgeHandler), Duration::from_secs(1));

    let report = sync.sync_pending(user_id).await.unwrap();
    assert_eq!(report.processed_count, 2);
    assert_eq!(report.synced_count, 1);
    assert_eq!(report.results[0].action_id, accepted);
    assert_eq!(report.results[1].status, DeliveryStatus::Error);

    let pending: Vec<Uuid> = repo.pending_for(user_id).await.unwrap().iter().map(|a| a.id).collect();
    assert_eq!(pending, vec![rejected]);

    let again = sync.sync_pending(user_id).await.unwrap();
    assert_eq!(again.processed_count, 1);
    assert_eq!(again.synced_count, 0);
}

// ---
// Push subscriptions
// ---

/// Answers by endpoint: ".../gone" is 410, ".../missing" is 404, anything else is delivered.
struct EndpointGateway;

#[async_trait]
impl PushGateway for EndpointGateway {
    async fn deliver(&self, subscription: &PushSubscription, _payload: &[u8]) -> Result<(), PushError> {
        if subscription.endpoint.ends_with("/gone") {
            Err(PushError::Gone { status: 410 })
        } else if subscription.endpoint.ends_with("/missing") {
            Err(PushError::Gone { status: 404 })
        } else {
            Ok(())
        }
    }
}

fn subscription(endpoint: &str) -> PushSubscriptionPayload {
    serde_json::from_value(json!({ "endpoint": endpoint, "p256dh": "BNcRdreALRFX", "auth": "tBHItJI5svbpez7KI4CCXg" }))
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn gone_subscriptions_are_pruned(pool: PgPool) {
    let user_id = insert_user(&pool, MOBILE).await;
    let repo = PushRepository::new(pool);

    repo.upsert(user_id, &subscription("https://push.example.com/alive")).await.unwrap();
    repo.upsert(user_id, &subscription("https://push.example.com/gone")).await.unwrap();
    repo.upsert(user_id, &subscription("https://push.example.com/missing")).await.unwrap();

    let gateway: Arc<dyn PushGateway> = Arc::new(EndpointGateway);
    let push = PushService::new(Arc::new(repo.clone()), Some(gateway), Duration::from_secs(1));
    let notification: Notification =
        serde_json::from_value(json!({ "title": "Booking confirmed", "body": "See you at 10:00" })).unwrap();

    let PushOutcome::Sent { results } = push.send_push(user_id, &notification).await.unwrap() else {
        panic!("expected a delivery report");
    };
    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| r.removed).count(), 2);
    assert_eq!(results.iter().filter(|r| r.status == DeliveryStatus::Success).count(), 1);

    let left: Vec<String> = repo.list_for_user(user_id).await.unwrap().into_iter().map(|s| s.endpoint).collect();
    assert_eq!(left, vec!["https://push.example.com/alive".to_string()]);
}

#[sqlx::test(migrations = "./migrations")]
async fn removing_a_subscription_twice_is_harmless(pool: PgPool) {
    let user_id = insert_user(&pool, MOBILE).await;
    let repo = PushRepository::new(pool);
    let created = repo.upsert(user_id, &subscription("https://push.example.com/alive")).await.unwrap();

    assert!(repo.remove(created.id).await.unwrap());
    assert!(!repo.remove(created.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn resubscribing_refreshes_keys_in_place(pool: PgPool) {
    let user_id = insert_user(&pool, MOBILE).await;
    let repo = PushRepository::new(pool);

    let first = repo.upsert(user_id, &subscription("https://push.example.com/alive")).await.unwrap();
    let refreshed: PushSubscriptionPayload = serde_json::from_value(
        json!({ "endpoint": "https://push.example.com/alive", "p256dh": "BNewKey", "auth": "newsecret" }),
    )
    .unwrap();
    let second = repo.upsert(user_id, &refreshed).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.p256dh, "BNewKey");
    assert_eq!(repo.subscriptions_for(user_id).await.unwrap().len(), 1);
}
