use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. When absent the server runs on the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

/// What to do with an account that authenticates with an empty permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyPermissionPolicy {
    /// Treat the account as an unmigrated admin: grant and persist every permission.
    GrantAll,
    /// Leave the set empty until an administrator grants permissions explicitly.
    KeepEmpty,
}

impl LegacyPermissionPolicy {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grant_all" | "grant-all" | "fail_open" => Some(Self::GrantAll),
            "keep_empty" | "keep-empty" | "fail_closed" => Some(Self::KeepEmpty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub session_expiry_hours: u64,
    pub session_cookie_name: String,
    pub secure_cookie: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub legacy_permission_policy: LegacyPermissionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout_secs: u64,
    pub enable_web_search: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE") {
            self.security.session_cookie_name = v;
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIE") {
            self.security.secure_cookie = v.parse().unwrap_or(self.security.secure_cookie);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_LEGACY_PERMISSIONS") {
            self.security.legacy_permission_policy =
                LegacyPermissionPolicy::parse(&v).unwrap_or(self.security.legacy_permission_policy);
        }

        // AI provider overrides
        if let Ok(v) = env::var("AI_BASE_URL") {
            self.ai.base_url = v;
        }
        if let Ok(v) = env::var("OPENAI_API_KEY") {
            if !v.trim().is_empty() {
                self.ai.api_key = Some(v);
            }
        }
        if let Ok(v) = env::var("AI_MODEL") {
            self.ai.model = v;
        }
        if let Ok(v) = env::var("AI_REQUEST_TIMEOUT_SECS") {
            self.ai.request_timeout_secs = v.parse().unwrap_or(self.ai.request_timeout_secs);
        }
        if let Ok(v) = env::var("AI_WEB_SEARCH") {
            self.ai.enable_web_search = v.parse().unwrap_or(self.ai.enable_web_search);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "development-only-secret".to_string(),
                session_expiry_hours: 24 * 30, // 30 days
                session_cookie_name: "session_token".to_string(),
                secure_cookie: false,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                legacy_permission_policy: LegacyPermissionPolicy::GrantAll,
            },
            ai: AiConfig::default_openai(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_expiry_hours: 24 * 7,
                session_cookie_name: "session_token".to_string(),
                secure_cookie: true,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                legacy_permission_policy: LegacyPermissionPolicy::GrantAll,
            },
            ai: AiConfig::default_openai(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_expiry_hours: 24,
                session_cookie_name: "session_token".to_string(),
                secure_cookie: true,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                legacy_permission_policy: LegacyPermissionPolicy::KeepEmpty,
            },
            ai: AiConfig::default_openai(),
        }
    }
}

impl AiConfig {
    fn default_openai() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            request_timeout_secs: 300,
            enable_web_search: false,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
