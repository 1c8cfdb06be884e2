use std::env;
use std::path::PathBuf;
use std::time::Duration;

use paywall::{
    parse_network, BlurSettings, Currency, DEFAULT_BLUR_SIGMA, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_JPEG_QUALITY,
};

const DEFAULT_PORT: u16 = 4024;
const DEFAULT_ASSETS_DIR: &str = "./assets";
const DEFAULT_DB_PATH: &str = "./paywall.db";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;
const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Root of the two asset tiers
    pub assets_dir: PathBuf,
    /// SQLite database path
    pub db_path: String,
    /// Base for URLs in listings and upload replies (None = derive from request)
    pub public_base_url: Option<String>,
    /// Network minted invoices must be issued for
    pub network: Currency,
    pub http_timeout: Duration,
    pub blur: BlurSettings,
    pub max_upload_bytes: usize,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute
    pub rate_limit_rpm: u32,
    /// Bearer token required for /metrics endpoint (None = public)
    pub metrics_token: Option<String>,
    /// Key for signing L402 tokens
    pub l402_secret: Vec<u8>,
    /// Local development mode: ephemeral secret, lenient callbacks, wildcard CORS
    pub insecure_dev: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("assets_dir", &self.assets_dir)
            .field("db_path", &self.db_path)
            .field("public_base_url", &self.public_base_url)
            .field("network", &self.network)
            .field("http_timeout", &self.http_timeout)
            .field("blur", &self.blur)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("l402_secret", &"[REDACTED]")
            .field("insecure_dev", &self.insecure_dev)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let insecure_dev = get("PAYWALL_INSECURE_DEV")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let port = parse_or(&get, "PORT", DEFAULT_PORT)?;
        let assets_dir = PathBuf::from(
            get("ASSETS_DIR").unwrap_or_else(|| DEFAULT_ASSETS_DIR.to_string()),
        );
        let db_path = get("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let public_base_url = get("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string());

        let network = match get("LIGHTNING_NETWORK") {
            Some(name) => parse_network(&name).ok_or(ConfigError::Invalid {
                var: "LIGHTNING_NETWORK",
                value: name,
            })?,
            None => Currency::Bitcoin,
        };

        let http_timeout = Duration::from_secs(parse_or(
            &get,
            "PAYWALL_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let sigma: f32 = parse_or(&get, "BLUR_SIGMA", DEFAULT_BLUR_SIGMA)?;
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(ConfigError::Invalid {
                var: "BLUR_SIGMA",
                value: sigma.to_string(),
            });
        }
        let jpeg_quality: u8 = parse_or(&get, "JPEG_QUALITY", DEFAULT_JPEG_QUALITY)?;
        if !(1..=100).contains(&jpeg_quality) {
            return Err(ConfigError::Invalid {
                var: "JPEG_QUALITY",
                value: jpeg_quality.to_string(),
            });
        }

        let max_upload_bytes = parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        let allowed_origins: Vec<String> = get("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let rate_limit_rpm = parse_or(&get, "RATE_LIMIT_RPM", DEFAULT_RATE_LIMIT_RPM)?;
        let metrics_token = get("METRICS_TOKEN");

        let l402_secret = match get("L402_SECRET") {
            Some(secret) => {
                if secret.len() < MIN_SECRET_LEN {
                    tracing::warn!(
                        "L402_SECRET is short ({} bytes, recommended {}); \
                         use `openssl rand -hex 32` to generate one",
                        secret.len(),
                        MIN_SECRET_LEN
                    );
                }
                secret.into_bytes()
            }
            None if insecure_dev => {
                tracing::warn!(
                    "PAYWALL_INSECURE_DEV=true: using an ephemeral L402 secret, \
                     tokens will not survive a restart. DO NOT use this in production!"
                );
                ephemeral_secret()
            }
            None => {
                tracing::error!(
                    "L402_SECRET is required. Set it to a secure random value \
                     (e.g. `openssl rand -hex 32`). For local development only, \
                     set PAYWALL_INSECURE_DEV=true."
                );
                return Err(ConfigError::MissingRequired("L402_SECRET"));
            }
        };

        if allowed_origins.iter().any(|o| o == "*") && !insecure_dev {
            tracing::error!(
                "Wildcard CORS origin '*' is not allowed in production. \
                 Specify explicit origins in ALLOWED_ORIGINS."
            );
            return Err(ConfigError::Invalid {
                var: "ALLOWED_ORIGINS",
                value: "*".to_string(),
            });
        }

        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set, /metrics endpoint is publicly accessible");
        }

        Ok(Self {
            port,
            assets_dir,
            db_path,
            public_base_url,
            network,
            http_timeout,
            blur: BlurSettings {
                sigma,
                jpeg_quality,
            },
            max_upload_bytes,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
            l402_secret,
            insecure_dev,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// 32 random bytes from two v4 UUIDs.
fn ephemeral_secret() -> Vec<u8> {
    let mut secret = Vec::with_capacity(32);
    secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    secret
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_vars(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("L402_SECRET", "0123456789abcdef0123456789abcdef")]).unwrap();
        assert_eq!(cfg.port, 4024);
        assert_eq!(cfg.assets_dir, PathBuf::from("./assets"));
        assert_eq!(cfg.db_path, "./paywall.db");
        assert_eq!(cfg.network, Currency::Bitcoin);
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.blur, BlurSettings::default());
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.rate_limit_rpm, 60);
        assert!(cfg.public_base_url.is_none());
        assert!(!cfg.insecure_dev);
    }

    #[test]
    fn test_secret_required_outside_dev() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::MissingRequired("L402_SECRET"))
        ));
    }

    #[test]
    fn test_dev_mode_generates_secret() {
        let a = config(&[("PAYWALL_INSECURE_DEV", "true")]).unwrap();
        let b = config(&[("PAYWALL_INSECURE_DEV", "1")]).unwrap();
        assert_eq!(a.l402_secret.len(), 32);
        assert_ne!(a.l402_secret, b.l402_secret);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let secret = ("L402_SECRET", "0123456789abcdef0123456789abcdef");
        assert!(config(&[secret, ("PORT", "http")]).is_err());
        assert!(config(&[secret, ("LIGHTNING_NETWORK", "dogecoin")]).is_err());
        assert!(config(&[secret, ("JPEG_QUALITY", "0")]).is_err());
        assert!(config(&[secret, ("BLUR_SIGMA", "-3")]).is_err());
        assert!(config(&[secret, ("ALLOWED_ORIGINS", "*")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("L402_SECRET", "0123456789abcdef0123456789abcdef"),
            ("PORT", "8080"),
            ("LIGHTNING_NETWORK", "regtest"),
            ("PUBLIC_BASE_URL", "https://pics.example.com/"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.network, Currency::Regtest);
        assert_eq!(cfg.public_base_url.as_deref(), Some("https://pics.example.com"));
        assert_eq!(
            cfg.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let cfg = config(&[
            ("L402_SECRET", "super-secret-super-secret-super-secret"),
            ("METRICS_TOKEN", "metrics-token"),
        ])
        .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(!dbg.contains("metrics-token"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
