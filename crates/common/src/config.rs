use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Service account mailbox used as the `From` address and SMTP login
    pub service_account_email: String,

    /// Service account credential (app password)
    pub service_account_password: String,

    /// Directory for rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,

    /// Addresses the HTTP listeners bind to (default: 0.0.0.0:5000 and 0.0.0.0:5001)
    pub listen_addrs: Vec<SocketAddr>,

    /// SMTP submission host (implicit TLS)
    pub smtp_host: String,

    /// SMTP submission port (default: 465)
    pub smtp_port: u16,

    /// Per-connection SMTP timeout in seconds (default: 30)
    pub smtp_timeout_secs: u64,

    /// Upper bound on concurrently running delivery tasks (default: 32)
    pub max_concurrent_deliveries: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addrs = lookup("HERALD_LISTEN_ADDRS")
            .unwrap_or_else(|| "0.0.0.0:5000,0.0.0.0:5001".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<SocketAddr>().map_err(|_| {
                    anyhow::anyhow!("HERALD_LISTEN_ADDRS entry '{}' is not a socket address", s)
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if listen_addrs.is_empty() {
            anyhow::bail!("HERALD_LISTEN_ADDRS must name at least one address");
        }

        let max_concurrent_deliveries: usize = lookup("HERALD_MAX_CONCURRENT_DELIVERIES")
            .unwrap_or_else(|| "32".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("HERALD_MAX_CONCURRENT_DELIVERIES must be a valid usize"))?;

        if max_concurrent_deliveries == 0 {
            anyhow::bail!("HERALD_MAX_CONCURRENT_DELIVERIES must be greater than zero");
        }

        Ok(Self {
            service_account_email: lookup("HERALD_SERVICE_ACCOUNT_EMAIL").ok_or_else(|| {
                anyhow::anyhow!("HERALD_SERVICE_ACCOUNT_EMAIL environment variable is required")
            })?,
            service_account_password: lookup("HERALD_SERVICE_ACCOUNT_PASSWORD").ok_or_else(
                || anyhow::anyhow!("HERALD_SERVICE_ACCOUNT_PASSWORD environment variable is required"),
            )?,
            log_dir: lookup("HERALD_LOG_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            listen_addrs,
            smtp_host: lookup("HERALD_SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: lookup("HERALD_SMTP_PORT")
                .unwrap_or_else(|| "465".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HERALD_SMTP_PORT must be a valid u16"))?,
            smtp_timeout_secs: lookup("HERALD_SMTP_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HERALD_SMTP_TIMEOUT_SECS must be a valid u64"))?,
            max_concurrent_deliveries,
        })
    }
}
