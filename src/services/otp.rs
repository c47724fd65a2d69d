// src/services/otp.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::{common::error::AppError, models::auth::OneTimePasscode, services::sms::SmsGateway};

/// Codes expire this long after they are issued.
pub const OTP_TTL_MINUTES: i64 = 10;

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Stores a fresh code for `mobile`, discarding any code issued before it.
    async fn replace(
        &self,
        mobile: &str,
        code: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<OneTimePasscode, AppError>;

    /// Marks the matching active code as verified in a single step.
    /// Returns false when no active code matched.
    async fn consume(&self, mobile: &str, code: &str, now: DateTime<Utc>) -> Result<bool, AppError>;
}

pub fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    sms: Arc<dyn SmsGateway>,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>, sms: Arc<dyn SmsGateway>) -> Self {
        Self { store, sms }
    }

    pub async fn request_otp(&self, mobile: &str) -> Result<String, AppError> {
        self.request_otp_at(mobile, Utc::now()).await
    }

    pub async fn request_otp_at(&self, mobile: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let code = generate_code();
        let expires_at = now + Duration::minutes(OTP_TTL_MINUTES);

        // 1. Persist first so a delivered code is always verifiable
        self.store.replace(mobile, &code, now, expires_at).await?;

        // 2. Hand over to the SMS provider
        self.sms
            .send_otp(mobile, &code)
            .await
            .map_err(|e| AppError::SmsDelivery(e.to_string()))?;

        tracing::info!(mobile = %mobile, "OTP issued");
        Ok(code)
    }

    pub async fn verify_otp(&self, mobile: &str, code: &str) -> Result<bool, AppError> {
        self.verify_otp_at(mobile, code, Utc::now()).await
    }

    pub async fn verify_otp_at(&self, mobile: &str, code: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let verified = self.store.consume(mobile, code, now).await?;
        if !verified {
            tracing::debug!(mobile = %mobile, "OTP rejected");
        }
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sms::SmsError;
    use std::{collections::HashMap, sync::Mutex};
    use uuid::Uuid;

    #[derive(Default)]
    struct MemoryOtpStore {
        rows: Mutex<HashMap<String, OneTimePasscode>>,
    }

    #[async_trait]
    impl OtpStore for MemoryOtpStore {
        async fn replace(
            &self,
            mobile: &str,
            code: &str,
            created_at: DateTime<Utc>,
            expires_at: DateTime<Utc>,
        ) -> Result<OneTimePasscode, AppError> {
            let otp = OneTimePasscode {
                id: Uuid::new_v4(),
                mobile: mobile.to_string(),
                code: code.to_string(),
                is_verified: false,
                created_at,
                expires_at,
            };
            self.rows.lock().unwrap().insert(mobile.to_string(), otp.clone());
            Ok(otp)
        }

        async fn consume(&self, mobile: &str, code: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(mobile) {
                Some(otp) if otp.code == code && otp.is_active(now) => {
                    otp.is_verified = true;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSms {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl SmsGateway for RecordingSms {
        async fn send_otp(&self, mobile: &str, code: &str) -> Result<(), SmsError> {
            if self.fail {
                return Err(SmsError::Rejected { status: 401, body: "bad authkey".into() });
            }
            self.sent.lock().unwrap().push((mobile.to_string(), code.to_string()));
            Ok(())
        }
    }

    fn service() -> (OtpService, Arc<MemoryOtpStore>, Arc<RecordingSms>) {
        let store = Arc::new(MemoryOtpStore::default());
        let sms = Arc::new(RecordingSms::default());
        (OtpService::new(store.clone(), sms.clone()), store, sms)
    }

    fn other_code(code: &str) -> String {
        let n: u32 = code.parse().unwrap();
        format!("{:06}", (n + 1) % 1_000_000)
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn request_persists_and_sends_the_same_code() {
        let (otp, store, sms) = service();
        let code = otp.request_otp("9876543210").await.unwrap();

        assert_eq!(store.rows.lock().unwrap()["9876543210"].code, code);
        assert_eq!(sms.sent.lock().unwrap().as_slice(), &[("9876543210".to_string(), code)]);
    }

    #[tokio::test]
    async fn new_request_invalidates_the_previous_code() {
        let (otp, _, _) = service();
        let now = Utc::now();

        let first = otp.request_otp_at("9876543210", now).await.unwrap();
        let mut second = otp.request_otp_at("9876543210", now).await.unwrap();
        while second == first {
            second = otp.request_otp_at("9876543210", now).await.unwrap();
        }

        assert!(!otp.verify_otp_at("9876543210", &first, now).await.unwrap());
        assert!(otp.verify_otp_at("9876543210", &second, now).await.unwrap());
    }

    #[tokio::test]
    async fn code_verifies_exactly_once() {
        let (otp, _, _) = service();
        let now = Utc::now();
        let code = otp.request_otp_at("9876543210", now).await.unwrap();

        assert!(otp.verify_otp_at("9876543210", &code, now).await.unwrap());
        assert!(!otp.verify_otp_at("9876543210", &code, now).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_verifications_have_one_winner() {
        let (otp, _, _) = service();
        let now = Utc::now();
        let code = otp.request_otp_at("9876543210", now).await.unwrap();

        let (a, b) = tokio::join!(
            otp.verify_otp_at("9876543210", &code, now),
            otp.verify_otp_at("9876543210", &code, now)
        );
        assert_eq!([a.unwrap(), b.unwrap()].iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn code_expires_after_ten_minutes() {
        let (otp, _, _) = service();
        let issued = Utc::now();
        let code = otp.request_otp_at("9876543210", issued).await.unwrap();

        let late = issued + Duration::minutes(10) + Duration::seconds(1);
        assert!(!otp.verify_otp_at("9876543210", &code, late).await.unwrap());

        let on_time = issued + Duration::minutes(9) + Duration::seconds(59);
        assert!(otp.verify_otp_at("9876543210", &code, on_time).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_code_or_unknown_mobile_is_rejected() {
        let (otp, _, _) = service();
        let now = Utc::now();
        let code = otp.request_otp_at("9876543210", now).await.unwrap();

        assert!(!otp.verify_otp_at("9876543210", &other_code(&code), now).await.unwrap());
        assert!(!otp.verify_otp_at("9123456789", &code, now).await.unwrap());
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_as_sms_delivery_error() {
        let store = Arc::new(MemoryOtpStore::default());
        let sms = Arc::new(RecordingSms { fail: true, ..Default::default() });
        let otp = OtpService::new(store, sms);

        let err = otp.request_otp("9876543210").await.unwrap_err();
        assert!(matches!(err, AppError::SmsDelivery(_)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
