// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        CatalogRepository, OfflineActionRepository, OtpRepository, PushRepository, RbacRepository,
        SeoRepository, UserRepository,
    },
    models::pwa::ManifestIcon,
    services::{
        auth::{AuthService, TokenIssuer},
        offline_sync::{AcknowledgeHandler, OfflineSyncService},
        otp::OtpService,
        push::{PushGateway, PushService},
        rbac_service::RbacService,
        sms::{Msg91Gateway, SmsGateway, UnconfiguredSmsGateway},
        user_service::UserService,
        web_push_gateway::WebPushGateway,
    },
};

pub struct Msg91Settings {
    pub base_url: String,
    pub auth_key: String,
    pub template_id: String,
    pub sender_id: String,
}

pub struct VapidSettings {
    /// PEM-encoded P-256 private key.
    pub private_key_pem: String,
    pub admin_email: String,
}

pub struct PwaSettings {
    pub app_name: String,
    pub description: String,
    pub start_url: String,
    pub display: String,
    pub background_color: String,
    pub theme_color: String,
    pub orientation: String,
    pub scope: String,
    pub dir: String,
    pub lang: String,
    pub icons: Vec<ManifestIcon>,
}

pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,

    pub jwt_secret: String,
    pub access_token_ttl: chrono::Duration,
    pub refresh_token_ttl: chrono::Duration,

    pub msg91: Option<Msg91Settings>,
    pub sms_timeout: Duration,

    pub vapid: Option<VapidSettings>,
    pub vapid_public_key: String,
    pub push_timeout: Duration,

    pub sync_timeout: Duration,

    pub site_url: String,
    pub pwa: PwaSettings,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn or_default(name: &str, default: &str) -> String {
    optional(name).unwrap_or_else(|| default.to_string())
}

fn parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw.parse().with_context(|| format!("{name} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let msg91 = match optional("MSG91_AUTH_KEY") {
            Some(auth_key) => Some(Msg91Settings {
                base_url: or_default("MSG91_BASE_URL", "https://api.msg91.com"),
                auth_key,
                template_id: required("MSG91_TEMPLATE_ID")?,
                sender_id: or_default("MSG91_SENDER_ID", "DODOSV"),
            }),
            None => None,
        };

        let vapid = optional("VAPID_PRIVATE_KEY").map(|private_key_pem| VapidSettings {
            // .env files usually carry the PEM on one line with literal "\n"
            private_key_pem: private_key_pem.replace("\\n", "\n"),
            admin_email: or_default("VAPID_ADMIN_EMAIL", "admin@dodoservices.com"),
        });

        let icons = match optional("PWA_APP_ICONS") {
            Some(raw) => serde_json::from_str(&raw).context("PWA_APP_ICONS must be a JSON array")?,
            None => default_icons(),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:3000"),

            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: chrono::Duration::minutes(parsed_or("ACCESS_TOKEN_TTL_MINUTES", 60)?),
            refresh_token_ttl: chrono::Duration::days(parsed_or("REFRESH_TOKEN_TTL_DAYS", 7)?),

            msg91,
            sms_timeout: Duration::from_secs(parsed_or("SMS_TIMEOUT_SECS", 10)?),

            vapid,
            vapid_public_key: or_default("VAPID_PUBLIC_KEY", ""),
            push_timeout: Duration::from_secs(parsed_or("PUSH_TIMEOUT_SECS", 10)?),

            sync_timeout: Duration::from_secs(parsed_or("SYNC_ACTION_TIMEOUT_SECS", 10)?),

            site_url: or_default("SITE_URL", "https://dodoservices.com")
                .trim_end_matches('/')
                .to_string(),
            pwa: PwaSettings {
                app_name: or_default("PWA_APP_NAME", "Dodo Services"),
                description: or_default("PWA_APP_DESCRIPTION", "Home services at your doorstep"),
                start_url: or_default("PWA_APP_START_URL", "/"),
                display: or_default("PWA_APP_DISPLAY", "standalone"),
                background_color: or_default("PWA_APP_BACKGROUND_COLOR", "#ffffff"),
                theme_color: or_default("PWA_APP_THEME_COLOR", "#4f46e5"),
                orientation: or_default("PWA_APP_ORIENTATION", "portrait"),
                scope: or_default("PWA_APP_SCOPE", "/"),
                dir: or_default("PWA_APP_DIR", "ltr"),
                lang: or_default("PWA_APP_LANG", "en-US"),
                icons,
            },
        })
    }
}

fn default_icons() -> Vec<ManifestIcon> {
    [("192x192", "/static/images/icons/icon-192x192.png"), ("512x512", "/static/images/icons/icon-512x512.png")]
        .into_iter()
        .map(|(sizes, src)| ManifestIcon {
            src: src.to_string(),
            sizes: sizes.to_string(),
            mime_type: "image/png".to_string(),
        })
        .collect()
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,

    pub auth_service: AuthService,
    pub otp_service: OtpService,
    pub user_service: UserService,
    pub rbac_service: RbacService,
    pub push_service: PushService,
    pub offline_sync: OfflineSyncService,

    pub user_repo: UserRepository,
    pub catalog_repo: CatalogRepository,
    pub push_repo: PushRepository,
    pub offline_repo: OfflineActionRepository,
    pub seo_repo: SeoRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        let db_pool = PgPoolOptions::new()
            .max_connections(settings.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("Database connection established");

        Self::build(settings, db_pool)
    }

    /// Wires the dependency graph on top of an existing pool.
    pub fn build(settings: Settings, db_pool: PgPool) -> anyhow::Result<Self> {
        let user_repo = UserRepository::new(db_pool.clone());
        let push_repo = PushRepository::new(db_pool.clone());
        let offline_repo = OfflineActionRepository::new(db_pool.clone());

        let tokens = TokenIssuer::new(
            &settings.jwt_secret,
            settings.access_token_ttl,
            settings.refresh_token_ttl,
        );
        let auth_service = AuthService::new(user_repo.clone(), tokens);

        let sms: Arc<dyn SmsGateway> = match &settings.msg91 {
            Some(msg91) => Arc::new(Msg91Gateway::new(msg91, settings.sms_timeout)?),
            None => {
                tracing::warn!("MSG91_AUTH_KEY not set: OTP delivery is disabled");
                Arc::new(UnconfiguredSmsGateway)
            }
        };
        let otp_service = OtpService::new(Arc::new(OtpRepository::new(db_pool.clone())), sms);

        let push_gateway: Option<Arc<dyn PushGateway>> = match &settings.vapid {
            Some(vapid) => Some(Arc::new(WebPushGateway::new(vapid)?)),
            None => {
                tracing::warn!("VAPID_PRIVATE_KEY not set: push notifications are disabled");
                None
            }
        };
        let push_service = PushService::new(Arc::new(push_repo.clone()), push_gateway, settings.push_timeout);

        let offline_sync = OfflineSyncService::new(
            Arc::new(offline_repo.clone()),
            Arc::new(AcknowledgeHandler),
            settings.sync_timeout,
        );

        Ok(Self {
            user_service: UserService::new(user_repo.clone(), db_pool.clone()),
            rbac_service: RbacService::new(RbacRepository::new(db_pool.clone()), user_repo.clone(), db_pool.clone()),
            catalog_repo: CatalogRepository::new(db_pool.clone()),
            seo_repo: SeoRepository::new(db_pool.clone()),
            auth_service,
            otp_service,
            push_service,
            offline_sync,
            user_repo,
            push_repo,
            offline_repo,
            settings: Arc::new(settings),
            db_pool,
        })
    }
}
