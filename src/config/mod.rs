use aws_config::{BehaviorVersion, Region};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

use crate::flags::DEFAULT_ROOT;
use crate::middleware::IDENTITY_HEADER;
use crate::router::RouterOptions;
use crate::store::{MemoryStore, ParameterStore, SsmConfig, SsmStore};
use crate::users::DEFAULT_USERS_KEY;

/// ARN region for the memory backend when none is configured
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Memory,
    Ssm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub root_prefix: String,
    pub users_key: String,
    pub page_size: u32,
    pub with_decryption: bool,
    /// Region override; `None` leaves it to the SDK's provider chain
    pub region: Option<String>,
    /// Endpoint override (e.g. LocalStack)
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub identity_header: String,
    /// Seeded as an active admin when the user collection is empty at startup
    pub bootstrap_admin: Option<String>,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Store overrides
        if let Some(v) = lookup("FLAGS_STORE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.store.backend = StoreBackend::Memory,
                "ssm" => self.store.backend = StoreBackend::Ssm,
                _ => {}
            }
        }
        if let Some(v) = lookup("FLAGS_ROOT_PREFIX") {
            self.store.root_prefix = v;
        }
        if let Some(v) = lookup("FLAGS_USERS_KEY") {
            self.store.users_key = v;
        }
        if let Some(v) = lookup("FLAGS_PAGE_SIZE") {
            self.store.page_size = v.parse().unwrap_or(self.store.page_size);
        }
        if let Some(v) = lookup("FLAGS_WITH_DECRYPTION") {
            self.store.with_decryption = v.parse().unwrap_or(self.store.with_decryption);
        }
        // Credentials are never read here: the SDK's default chain resolves
        // env keys, profiles, SSO, web identity and instance roles itself
        if let Some(v) = lookup("AWS_REGION").or_else(|| lookup("AWS_DEFAULT_REGION")) {
            self.store.region = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("AWS_ENDPOINT_URL") {
            self.store.endpoint = Some(v).filter(|s| !s.is_empty());
        }

        // API overrides
        if let Some(v) = lookup("FLAGS_API_PORT").or_else(|| lookup("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_IDENTITY_HEADER") {
            if !v.trim().is_empty() {
                self.security.identity_header = v.trim().to_string();
            }
        }
        if let Some(v) = lookup("SECURITY_BOOTSTRAP_ADMIN") {
            self.security.bootstrap_admin = Some(v.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreConfig {
                backend: StoreBackend::Memory,
                ..StoreConfig::default()
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                identity_header: IDENTITY_HEADER.to_string(),
                bootstrap_admin: Some("admin@localhost".to_string()),
                enable_cors: true,
                cors_origins: vec![],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            store: StoreConfig::default(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                identity_header: IDENTITY_HEADER.to_string(),
                bootstrap_admin: None,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            store: StoreConfig::default(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                identity_header: IDENTITY_HEADER.to_string(),
                bootstrap_admin: None,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            root: self.store.root_prefix.clone(),
            users_key: self.store.users_key.clone(),
            identity_header: self.security.identity_header.clone(),
            with_decryption: self.store.with_decryption,
        }
    }

    /// Store adapter for the configured backend. The ssm backend loads the
    /// shared AWS config, so credentials come from the default provider chain.
    pub async fn build_store(&self) -> Arc<dyn ParameterStore> {
        match self.store.backend {
            StoreBackend::Memory => Arc::new(
                MemoryStore::new()
                    .with_page_size(self.store.page_size as usize)
                    .with_region(self.store.region.as_deref().unwrap_or(DEFAULT_REGION)),
            ),
            StoreBackend::Ssm => {
                let mut loader = aws_config::defaults(BehaviorVersion::latest());
                if let Some(region) = &self.store.region {
                    loader = loader.region(Region::new(region.clone()));
                }
                let sdk_config = loader.load().await;

                Arc::new(SsmStore::new(
                    &sdk_config,
                    SsmConfig {
                        region: self.store.region.clone(),
                        endpoint: self.store.endpoint.clone(),
                        page_size: self.store.page_size,
                    },
                ))
            }
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Ssm,
            root_prefix: DEFAULT_ROOT.to_string(),
            users_key: DEFAULT_USERS_KEY.to_string(),
            page_size: 10,
            with_decryption: true,
            region: None,
            endpoint: None,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macros for common checks
#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
