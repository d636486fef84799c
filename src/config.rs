// src/config.rs

use anyhow::Context;
use std::{env, sync::Arc};

use crate::connectors::{
    CrmConnector, IdmConnector, NotifyConnector, PermitConnector, WaterConnector,
};
use crate::services::session_store::{InMemorySessionStore, SharedSessionStore};
use crate::services::{
    AuthService, LicenceService, RegistrationService, SharingService, StatusService,
};

// Static settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub cookie_name: String,
    pub cookie_secret: String,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
    pub holding_page_enabled: bool,
    pub holding_page_redirect: String,
    pub idm_url: String,
    pub crm_url: String,
    pub permit_url: String,
    pub notify_url: String,
    pub water_url: String,
    /// Static bearer token shared by every backend connector.
    pub service_token: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: env::var("PORT").unwrap_or_else(|_| "8000".into()).parse()?,
            cookie_name: env::var("COOKIE_NAME").unwrap_or_else(|_| "session".into()),
            cookie_secret: env::var("COOKIE_SECRET").context("COOKIE_SECRET must be set")?,
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| "2".into())
                .parse()?,
            secure_cookies: env::var("SECURE_COOKIES").map(|v| v == "true").unwrap_or(false),
            holding_page_enabled: env::var("HOLDING_PAGE_ENABLED")
                .map(|v| v == "true")
                .unwrap_or(false),
            holding_page_redirect: env::var("HOLDING_PAGE_REDIRECT").unwrap_or_default(),
            idm_url: env::var("IDM_URL").context("IDM_URL must be set")?,
            crm_url: env::var("CRM_URL").context("CRM_URL must be set")?,
            permit_url: env::var("PERMIT_URL").context("PERMIT_URL must be set")?,
            notify_url: env::var("NOTIFY_URL").context("NOTIFY_URL must be set")?,
            water_url: env::var("WATER_URL").context("WATER_URL must be set")?,
            service_token: env::var("SERVICE_TOKEN").context("SERVICE_TOKEN must be set")?,
        })
    }
}

// The shared state available to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SharedSessionStore,
    pub auth_service: AuthService,
    pub licence_service: LicenceService,
    pub sharing_service: SharingService,
    pub registration_service: RegistrationService,
    pub status_service: StatusService,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Config::from_env()?;
        Ok(Self::from_config(config))
    }

    /// Build the connector/service graph from a config. Tests use this
    /// directly with mock-server URLs.
    pub fn from_config(config: Config) -> Self {
        let token = config.service_token.clone();
        let idm = IdmConnector::new(config.idm_url.clone(), token.clone());
        let crm = CrmConnector::new(config.crm_url.clone(), token.clone());
        let permit = PermitConnector::new(config.permit_url.clone(), token.clone());
        let notify = NotifyConnector::new(config.notify_url.clone(), token.clone());
        let water = WaterConnector::new(config.water_url.clone(), token);

        let sessions: SharedSessionStore = Arc::new(InMemorySessionStore::new(
            chrono::Duration::hours(config.session_ttl_hours),
        ));

        let auth_service = AuthService::new(
            idm.clone(),
            crm.clone(),
            sessions.clone(),
            config.cookie_secret.clone(),
            config.session_ttl_hours,
        );
        let licence_service = LicenceService::new(crm.clone(), permit.clone());
        let sharing_service = SharingService::new(idm.clone(), crm.clone(), notify.clone());
        let registration_service = RegistrationService::new(idm.clone(), notify);
        let status_service = StatusService::new(idm, crm, permit, water);

        Self {
            config,
            sessions,
            auth_service,
            licence_service,
            sharing_service,
            registration_service,
            status_service,
        }
    }
}
