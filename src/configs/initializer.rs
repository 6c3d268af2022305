// bluemoon-rbac/src/configs/initializer.rs
use log::{info, debug, warn};
use anyhow::{anyhow, Result};
use actix_web::web;
use actix_session::{SessionMiddleware, storage::CookieSessionStore, config::PersistentSession};
use actix_web::cookie::{Key, SameSite};
use env_logger::Env;
use std::{env, time::Duration};
use crate::api::client::ApiClient;
use crate::registry::{page_count, register_default_pages};
use crate::utils::guard::GuardDestinations;

#[derive(Debug, Clone)]
pub struct BluemoonConfig {
    pub session_secret: String,
    pub environment: String,
    pub log_level: String,
    pub session_timeout: Duration,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub login_path: String,
    pub home_path: String,
    pub bind_address: String,
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_secs(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl BluemoonConfig {
    pub fn from_env() -> Result<Self> {
        let environment = env_or("ENVIRONMENT", "development");
        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment != "production" => {
                warn!("⚠️  SESSION_SECRET not set, using generated key - NOT suitable for production!");
                String::new()
            }
            Err(_) => return Err(anyhow!("SESSION_SECRET is required in production")),
        };

        Ok(Self {
            session_secret,
            environment,
            log_level: env_or("RUST_LOG", "info"),
            session_timeout: env_secs("SESSION_TIMEOUT", 86400),
            api_base_url: env_or("BLUEMOON_API_BASE", "http://localhost:7070/api"),
            api_timeout: env_secs("BLUEMOON_API_TIMEOUT", 30),
            login_path: env_or("BLUEMOON_LOGIN_PATH", "/login"),
            home_path: env_or("BLUEMOON_HOME_PATH", "/"),
            bind_address: env_or("BLUEMOON_BIND", "127.0.0.1:8080"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn destinations(&self) -> GuardDestinations {
        GuardDestinations {
            login: self.login_path.clone(),
            home: self.home_path.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.session_secret.is_empty() && self.session_secret.len() < 64 {
            return Err(anyhow!("SESSION_SECRET must be at least 64 characters long"));
        }
        if self.login_path == self.home_path {
            return Err(anyhow!("login and home paths must differ"));
        }
        Ok(())
    }
}

impl Default for BluemoonConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            session_timeout: Duration::from_secs(86400),
            api_base_url: "http://localhost:7070/api".to_string(),
            api_timeout: Duration::from_secs(30),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

pub fn load_session_key(config: &BluemoonConfig) -> Result<Key> {
    if config.session_secret.is_empty() {
        if config.is_production() {
            return Err(anyhow!("SESSION_SECRET environment variable is required in production"));
        }
        warn!("⚠️  Using generated session key - NOT suitable for production!");
        Ok(Key::generate())
    } else {
        config.validate()?;
        Ok(Key::from(config.session_secret.as_bytes()))
    }
}

/// Cookie session middleware for one worker. Every worker must share `key`.
pub fn create_session_middleware(config: &BluemoonConfig, key: Key) -> SessionMiddleware<CookieSessionStore> {
    let session_ttl = actix_web::cookie::time::Duration::seconds(config.session_timeout.as_secs() as i64);

    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("bluemoon_session".to_string())
        .cookie_secure(config.is_production())
        .cookie_http_only(true)
        .cookie_same_site(if config.is_production() {
            SameSite::Strict
        } else {
            SameSite::Lax
        })
        .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
        .build()
}

pub fn get_bluemoon_session_middleware(config: &BluemoonConfig) -> Result<SessionMiddleware<CookieSessionStore>> {
    Ok(create_session_middleware(config, load_session_key(config)?))
}

pub fn setup_bluemoon_logging(config: &BluemoonConfig) {
    let initialised = env_logger::Builder::from_env(Env::default().default_filter_or(&config.log_level))
        .format_timestamp_millis()
        .try_init()
        .is_ok();

    if initialised {
        info!("✅ BlueMoon logging initialized");
        info!("🔧 BlueMoon environment: {}", config.environment);
        debug!("🔍 BlueMoon debug logging active");
    }
}

pub fn get_bluemoon_api_client(config: &BluemoonConfig) -> Result<ApiClient> {
    ApiClient::with_reqwest(config.api_base_url.clone(), config.api_timeout)
        .map_err(|e| anyhow!("failed to build API client: {}", e))
}

/// Shared app data; pair with `router::register_all_bluemoon_routes`.
pub fn configure_bluemoon_services(
    cfg: &mut web::ServiceConfig,
    config: BluemoonConfig,
    client: ApiClient,
) {
    cfg.app_data(web::Data::new(config));
    cfg.app_data(web::Data::new(client));
}

/// Fill the page registry with the built-in pages unless the host app
/// already registered its own.
pub fn bluemoon_initialize(config: &BluemoonConfig) -> Result<()> {
    config.validate()?;
    if page_count() == 0 {
        register_default_pages();
    }
    info!("BlueMoon initialized with {} pages (API: {})", page_count(), config.api_base_url);
    Ok(())
}
