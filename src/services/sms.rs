// src/services/sms.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::Msg91Settings;

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS provider is not configured")]
    NotConfigured,

    #[error("SMS provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("MSG91 API error ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send_otp(&self, mobile: &str, code: &str) -> Result<(), SmsError>;
}

/// Returns the number in the `<country code><10 digits>` form MSG91 expects.
/// Numbers without a country code are assumed to be Indian.
pub fn msg91_number(mobile: &str) -> String {
    let digits = mobile.strip_prefix('+').unwrap_or(mobile);
    if digits.len() > 10 {
        digits.to_string()
    } else {
        format!("91{digits}")
    }
}

#[derive(Serialize)]
struct Msg91Request<'a> {
    template_id: &'a str,
    mobile: String,
    authkey: &'a str,
    otp: &'a str,
    sender: &'a str,
}

pub struct Msg91Gateway {
    client: Client,
    endpoint: String,
    auth_key: String,
    template_id: String,
    sender_id: String,
}

impl Msg91Gateway {
    pub fn new(settings: &Msg91Settings, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/v5/otp", settings.base_url.trim_end_matches('/')),
            auth_key: settings.auth_key.clone(),
            template_id: settings.template_id.clone(),
            sender_id: settings.sender_id.clone(),
        })
    }
}

#[async_trait]
impl SmsGateway for Msg91Gateway {
    async fn send_otp(&self, mobile: &str, code: &str) -> Result<(), SmsError> {
        let body = Msg91Request {
            template_id: &self.template_id,
            mobile: msg91_number(mobile),
            authkey: &self.auth_key,
            otp: code,
            sender: &self.sender_id,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Rejected { status, body });
        }
        Ok(())
    }
}

/// Used when no MSG91 credentials are configured: every send fails.
pub struct UnconfiguredSmsGateway;

#[async_trait]
impl SmsGateway for UnconfiguredSmsGateway {
    async fn send_otp(&self, _mobile: &str, _code: &str) -> Result<(), SmsError> {
        Err(SmsError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(base_url: String) -> Msg91Gateway {
        let settings = Msg91Settings {
            base_url,
            auth_key: "test-authkey".into(),
            template_id: "tmpl-1".into(),
            sender_id: "DODOSV".into(),
        };
        Msg91Gateway::new(&settings, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn numbers_get_a_country_code() {
        assert_eq!(msg91_number("9876543210"), "919876543210");
        assert_eq!(msg91_number("+919876543210"), "919876543210");
        assert_eq!(msg91_number("+4479460012345"), "4479460012345");
    }

    #[tokio::test]
    async fn posts_the_otp_request_to_msg91() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v5/otp"))
            .and(body_json(json!({
                "template_id": "tmpl-1",
                "mobile": "919876543210",
                "authkey": "test-authkey",
                "otp": "123456",
                "sender": "DODOSV"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "type": "success" })))
            .expect(1)
            .mount(&server)
            .await;

        gateway(server.uri()).send_otp("+919876543210", "123456").await.unwrap();
    }

    #[tokio::test]
    async fn non_200_responses_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v5/otp"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid authkey"))
            .mount(&server)
            .await;

        let err = gateway(server.uri()).send_otp("9876543210", "123456").await.unwrap_err();
        match err {
            SmsError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid authkey");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unconfigured_gateway_always_fails() {
        assert!(matches!(
            UnconfiguredSmsGateway.send_otp("9876543210", "123456").await,
            Err(SmsError::NotConfigured)
        ));
    }
}
