//! Environment-driven configuration for assembling a cart.
//!
//! | Variable            | Meaning                                   | Default      |
//! |---------------------|-------------------------------------------|--------------|
//! | `CART_STORAGE_KEY`  | key of the local snapshot                 | `cart`       |
//! | `CART_API_URL`      | cart API base URL (enables remote carts)  | unset        |
//! | `CART_STORAGE_DIR`  | directory for the file backend            | unset        |
//! | `CART_REFRESH_SECS` | periodic refresh interval, `0` disables   | `0`          |

use crate::error::{Error, Result};
use crate::key::DEFAULT_STORAGE_KEY;
use crate::remote::RemoteConfig;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_STORAGE_KEY: &str = "CART_STORAGE_KEY";
pub const ENV_API_URL: &str = "CART_API_URL";
pub const ENV_STORAGE_DIR: &str = "CART_STORAGE_DIR";
pub const ENV_REFRESH_SECS: &str = "CART_REFRESH_SECS";

/// Settings for a cart session.
#[derive(Clone, Debug, PartialEq)]
pub struct CartConfig {
    /// Key the local snapshot is stored under.
    pub storage_key: String,
    /// Cart API base URL. `Some` selects the backend-backed variant.
    pub api_url: Option<String>,
    /// Where the file backend keeps its snapshots. `None` keeps them in memory.
    pub storage_dir: Option<PathBuf>,
    /// How often to re-read persistence. `None` disables periodic refresh.
    pub refresh_interval: Option<Duration>,
}

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            api_url: None,
            storage_dir: None,
            refresh_interval: None,
        }
    }
}

impl CartConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` when a variable is set but unusable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CartConfig::default();

        if let Some(key) = non_blank(lookup(ENV_STORAGE_KEY)) {
            config.storage_key = key;
        }

        if let Some(url) = non_blank(lookup(ENV_API_URL)) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::ConfigError(format!(
                    "{} must be an http(s) URL, got {:?}",
                    ENV_API_URL, url
                )));
            }
            config.api_url = Some(url);
        }

        config.storage_dir = non_blank(lookup(ENV_STORAGE_DIR)).map(PathBuf::from);

        if let Some(raw) = non_blank(lookup(ENV_REFRESH_SECS)) {
            let secs = raw.parse::<u64>().map_err(|_| {
                Error::ConfigError(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    ENV_REFRESH_SECS, raw
                ))
            })?;
            config.refresh_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        debug!("Cart config loaded: {:?}", config);
        Ok(config)
    }

    /// Remote settings, when an API URL is configured.
    pub fn remote(&self) -> Option<RemoteConfig> {
        self.api_url.as_deref().map(RemoteConfig::new)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
