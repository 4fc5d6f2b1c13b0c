//! Server configuration management

use crate::error::{ApiError, Result};
use serde::Serialize;
use wayfare_backend::mail::{DEFAULT_MAIL_API_URL, MailConfig};
use wayfare_backend::storage::s3_storage::S3Settings;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// SQLite connection string for the document store
    pub database_url: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    pub auth: AuthConfig,

    /// Present when all three media credentials are set
    pub media: Option<MediaConfig>,

    pub mail: MailConfig,

    pub payments: PaymentConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// No secret was configured, so `jwt_secret` is random for this process
    pub secret_generated: bool,
    pub token_ttl_seconds: i64,
    pub bootstrap_email: Option<String>,
    pub bootstrap_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub s3: S3Settings,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentConfig {
    pub publishable_key: Option<String>,
}

impl PaymentConfig {
    pub fn enabled(&self) -> bool {
        self.publishable_key.is_some()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let media = match (
            var("MEDIA_ENDPOINT_URL"),
            var("MEDIA_ACCESS_KEY_ID"),
            var("MEDIA_SECRET_ACCESS_KEY"),
        ) {
            (Some(endpoint_url), Some(access_key_id), Some(secret_access_key)) => {
                let bucket = var("MEDIA_BUCKET").unwrap_or_else(|| "wayfare-media".to_string());
                let public_base_url = var("MEDIA_PUBLIC_BASE_URL").unwrap_or_else(|| {
                    format!("{}/{}", endpoint_url.trim_end_matches('/'), bucket)
                });
                Some(MediaConfig {
                    s3: S3Settings {
                        endpoint_url,
                        access_key_id,
                        secret_access_key,
                        bucket,
                    },
                    public_base_url,
                })
            }
            _ => None,
        };

        let jwt_secret = var("AUTH_JWT_SECRET");

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid PORT value".to_string()))?,
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:./data/wayfare.db".to_string()),
            cors_origins: var("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            auth: AuthConfig {
                secret_generated: jwt_secret.is_none(),
                jwt_secret: jwt_secret.unwrap_or_else(random_secret),
                token_ttl_seconds: var("AUTH_TOKEN_TTL_SECONDS")
                    .unwrap_or_else(|| "43200".to_string())
                    .parse()
                    .ok()
                    .filter(|ttl: &i64| *ttl > 0)
                    .ok_or_else(|| {
                        ApiError::Config("Invalid AUTH_TOKEN_TTL_SECONDS value".to_string())
                    })?,
                bootstrap_email: var("BOOTSTRAP_SUPERADMIN_EMAIL"),
                bootstrap_password: var("BOOTSTRAP_SUPERADMIN_PASSWORD"),
            },
            media,
            mail: MailConfig {
                api_key: var("MAIL_API_KEY"),
                api_url: var("MAIL_API_URL").unwrap_or_else(|| DEFAULT_MAIL_API_URL.to_string()),
                from: var("MAIL_FROM"),
                admin_recipient: var("ADMIN_NOTIFICATION_EMAIL"),
            },
            payments: PaymentConfig {
                publishable_key: var("PAYMENT_PUBLISHABLE_KEY"),
            },
        })
    }

}

/// Signing secret used when none is configured; tokens stop verifying on restart
fn random_secret() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite:./data/wayfare.db".to_string(),
            cors_origins: vec!["*".to_string()],
            auth: AuthConfig {
                jwt_secret: random_secret(),
                secret_generated: true,
                token_ttl_seconds: 43200,
                bootstrap_email: None,
                bootstrap_password: None,
            },
            media: None,
            mail: MailConfig::default(),
            payments: PaymentConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert!(config.media.is_none());
        assert!(!config.mail.enabled());
        assert!(!config.payments.enabled());
    }

    #[test]
    fn test_media_needs_all_three_credentials() {
        let partial = config(&[
            ("MEDIA_ENDPOINT_URL", "http://localhost:9000"),
            ("MEDIA_ACCESS_KEY_ID", "key"),
        ])
        .unwrap();
        assert!(partial.media.is_none());

        let full = config(&[
            ("MEDIA_ENDPOINT_URL", "http://localhost:9000/"),
            ("MEDIA_ACCESS_KEY_ID", "key"),
            ("MEDIA_SECRET_ACCESS_KEY", "secret"),
        ])
        .unwrap();
        let media = full.media.unwrap();
        assert_eq!(media.s3.bucket, "wayfare-media");
        assert_eq!(media.public_base_url, "http://localhost:9000/wayfare-media");
    }

    #[test]
    fn test_feature_keys() {
        let config = config(&[
            ("MAIL_API_KEY", "re_123"),
            ("PAYMENT_PUBLISHABLE_KEY", "pk_test_123"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ])
        .unwrap();
        assert!(config.mail.enabled());
        assert!(config.payments.enabled());
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(matches!(config(&[("PORT", "http")]), Err(ApiError::Config(_))));
        assert!(config(&[("AUTH_TOKEN_TTL_SECONDS", "-5")]).is_err());
    }

    #[test]
    fn test_random_secret_when_unset() {
        let config = config(&[]).unwrap();
        assert!(config.auth.secret_generated);
        assert_eq!(config.auth.jwt_secret.len(), 64);

        let copy = config.clone();
        assert_eq!(copy.auth.jwt_secret, config.auth.jwt_secret);
        assert_ne!(config.auth.jwt_secret, self::config(&[]).unwrap().auth.jwt_secret);
    }

    #[test]
    fn test_configured_secret_is_kept() {
        let config = config(&[("AUTH_JWT_SECRET", "s3cret")]).unwrap();
        assert!(!config.auth.secret_generated);
        assert_eq!(config.auth.jwt_secret, "s3cret");
    }
}
