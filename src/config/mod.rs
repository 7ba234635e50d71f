use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub notifications: NotificationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket receiving direct client uploads
    pub bucket: String,
    /// Base for public read URLs; `None` means `https://{bucket}.s3.amazonaws.com`
    pub public_base_url: Option<String>,
    /// Endpoint the local object store signs URLs against
    pub local_endpoint: String,
    pub upload_url_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub enqueue_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub topic_arn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub token_verification: TokenVerification,
    pub jwt_secret: String,
}

/// Strategy used to turn a bearer credential into claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenVerification {
    /// Decode the payload segment without checking the signature
    Unverified,
    /// Require a valid HS256 signature made with `jwt_secret`
    Hs256,
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
        // Server overrides
        if let Some(port) = env::var("HELPDESK_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Storage overrides
        if let Ok(v) = env::var("UPLOAD_BUCKET") {
            self.storage.bucket = v;
        }
        if let Ok(v) = env::var("UPLOAD_PUBLIC_BASE_URL") {
            self.storage.public_base_url = Some(v.trim_end_matches('/').to_string());
        }
        if let Ok(v) = env::var("UPLOAD_LOCAL_ENDPOINT") {
            self.storage.local_endpoint = v;
        }
        if let Ok(v) = env::var("UPLOAD_URL_TTL_SECS") {
            self.storage.upload_url_ttl_secs = v.parse().unwrap_or(self.storage.upload_url_ttl_secs);
        }

        // Queue overrides
        if let Ok(v) = env::var("QUEUE_ENQUEUE_TIMEOUT_MS") {
            self.queue.enqueue_timeout_ms = v.parse().unwrap_or(self.queue.enqueue_timeout_ms);
        }

        // Notification overrides
        if let Ok(v) = env::var("SNS_TOPIC_ARN") {
            self.notifications.topic_arn = Some(v);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_TOKEN_VERIFICATION") {
            self.security.token_verification = match v.to_ascii_lowercase().as_str() {
                "hs256" => TokenVerification::Hs256,
                "unverified" | "none" => TokenVerification::Unverified,
                _ => self.security.token_verification,
            };
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            storage: StorageConfig {
                bucket: "helpdesk-uploads-dev".to_string(),
                public_base_url: None,
                local_endpoint: "http://localhost:9000".to_string(),
                upload_url_ttl_secs: 300,
            },
            queue: QueueConfig {
                enqueue_timeout_ms: 2000,
            },
            notifications: NotificationConfig { topic_arn: None },
            security: SecurityConfig {
                token_verification: TokenVerification::Unverified,
                jwt_secret: String::new(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8080,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            storage: StorageConfig {
                bucket: "helpdesk-uploads-staging".to_string(),
                public_base_url: None,
                local_endpoint: "http://localhost:9000".to_string(),
                upload_url_ttl_secs: 300,
            },
            queue: QueueConfig {
                enqueue_timeout_ms: 1000,
            },
            notifications: NotificationConfig { topic_arn: None },
            security: SecurityConfig {
                token_verification: TokenVerification::Unverified,
                jwt_secret: String::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            storage: StorageConfig {
                bucket: "helpdesk-uploads".to_string(),
                public_base_url: None,
                local_endpoint: "http://localhost:9000".to_string(),
                upload_url_ttl_secs: 300,
            },
            queue: QueueConfig {
                enqueue_timeout_ms: 500,
            },
            notifications: NotificationConfig { topic_arn: None },
            security: SecurityConfig {
                // Unverified stays the default until the identity provider's keys are wired in
                token_verification: TokenVerification::Unverified,
                jwt_secret: String::new(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
