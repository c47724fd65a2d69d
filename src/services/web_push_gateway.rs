// src/services/web_push_gateway.rs

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use p256::{
    elliptic_curve::sec1::ToEncodedPoint,
    pkcs8::{EncodePrivateKey, LineEnding},
    SecretKey,
};
use web_push::{
    ContentEncoding, IsahcWebPushClient, PartialVapidSignatureBuilder, SubscriptionInfo,
    VapidSignatureBuilder, WebPushClient, WebPushError, WebPushMessageBuilder,
};

use crate::{
    config::VapidSettings,
    models::pwa::PushSubscription,
    services::push::{PushError, PushGateway},
};

/// Delivers encrypted, VAPID-signed payloads through the browser push services.
pub struct WebPushGateway {
    client: IsahcWebPushClient,
    signer: PartialVapidSignatureBuilder,
    subject: String,
}

impl WebPushGateway {
    /// Fails at startup when the private key cannot be parsed.
    pub fn new(settings: &VapidSettings) -> anyhow::Result<Self> {
        let signer = VapidSignatureBuilder::from_pem_no_sub(settings.private_key_pem.as_bytes())?;
        Ok(Self {
            client: IsahcWebPushClient::new()?,
            signer,
            subject: format!("mailto:{}", settings.admin_email),
        })
    }

    fn classify(error: WebPushError) -> PushError {
        match error {
            WebPushError::EndpointNotFound { .. } => PushError::Gone { status: 404 },
            WebPushError::EndpointNotValid { .. } => PushError::Gone { status: 410 },
            other => PushError::Failed(other.to_string()),
        }
    }
}

#[async_trait]
impl PushGateway for WebPushGateway {
    async fn deliver(&self, subscription: &PushSubscription, payload: &[u8]) -> Result<(), PushError> {
        let info = SubscriptionInfo::new(&subscription.endpoint, &subscription.p256dh, &subscription.auth);

        let mut signature = self.signer.clone().add_sub_info(&info);
        signature.add_claim("sub", self.subject.as_str());
        let signature = signature.build().map_err(Self::classify)?;

        let mut message = WebPushMessageBuilder::new(&info);
        message.set_payload(ContentEncoding::Aes128Gcm, payload);
        message.set_vapid_signature(signature);
        let message = message.build().map_err(Self::classify)?;

        self.client.send(message).await.map_err(Self::classify)
    }
}

/// A fresh VAPID key pair, in the formats `Settings` reads them.
pub struct VapidKeys {
    /// PKCS#8 PEM, for `VAPID_PRIVATE_KEY`.
    pub private_key_pem: String,
    /// Uncompressed P-256 point, base64url without padding, for `VAPID_PUBLIC_KEY`.
    pub public_key: String,
}

pub fn generate_vapid_keys() -> anyhow::Result<VapidKeys> {
    // Almost every 32-byte string is a valid scalar; retry on the rare miss
    let secret = loop {
        let bytes: [u8; 32] = rand::random();
        if let Ok(secret) = SecretKey::from_slice(&bytes) {
            break secret;
        }
    };

    let pem = secret
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| anyhow::anyhow!("failed to encode the VAPID private key: {e}"))?;
    let public_point = secret.public_key().to_encoded_point(false);

    Ok(VapidKeys {
        private_key_pem: pem.as_str().to_owned(),
        public_key: URL_SAFE_NO_PAD.encode(public_point.as_bytes()),
    })
}
