// Configuration management
use crate::error::{DingTalkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "https://oapi.dingtalk.com";

/// Server-side token validity (7200s) minus a safety margin
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 7200 - 1000;

pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub corpid: String,
    #[serde(default)]
    pub corpsecret: String,
    pub appid: Option<String>,
    pub appsecret: Option<String>,
    /// Seconds a fetched access token stays cached
    #[serde(default = "default_token_lifetime")]
    pub access_token_lifetime: u64,
    /// Ceiling, in seconds, for a cached jsapi ticket
    #[serde(default = "default_token_lifetime")]
    pub jsapi_ticket_lifetime: u64,
    /// Alternate origin requests are sent to; the original host goes in `Host`
    pub proxy: Option<String>,
    /// Partition fetches run in parallel by `list_all`
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub request: RequestDefaults,
}

/// Transport options merged into every request
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequestDefaults {
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl RequestDefaults {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_token_lifetime() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Config {
    /// Config for a corp pair with every other option defaulted
    pub fn new(corpid: impl Into<String>, corpsecret: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            corpid: corpid.into(),
            corpsecret: corpsecret.into(),
            appid: None,
            appsecret: None,
            access_token_lifetime: default_token_lifetime(),
            jsapi_ticket_lifetime: default_token_lifetime(),
            proxy: None,
            concurrency: default_concurrency(),
            request: RequestDefaults::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Get the config directory path
    ///
    /// Priority:
    /// 1. XDG_CONFIG_HOME/dingtalk (if env var is set)
    /// 2. ~/.config/dingtalk (if ~/.config exists)
    /// 3. ~/.dingtalk (fallback on Unix)
    /// 4. Platform default on Windows
    pub fn config_dir() -> Result<PathBuf> {
        // XDG_CONFIG_HOME wins when set explicitly
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("dingtalk"));
        }

        // On Unix-like systems, follow whatever layout the user already has
        #[cfg(unix)]
        {
            if let Some(home_dir) = dirs::home_dir() {
                let xdg_config = home_dir.join(".config");

                // ~/.config exists, so the user has adopted XDG
                if xdg_config.exists() {
                    return Ok(xdg_config.join("dingtalk"));
                }

                // Otherwise a dot directory, without creating ~/.config
                return Ok(home_dir.join(".dingtalk"));
            }
        }

        // Platform default on Windows
        #[cfg(not(unix))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                return Ok(config_dir.join("dingtalk"));
            }
        }

        Err(DingTalkError::Config(
            "Could not determine config directory".to_string(),
        ))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| DingTalkError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Load configuration from the default location or `path`, then environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file_path()?,
        };

        let mut config = if config_path.exists() {
            tracing::debug!("Loading config from: {}", config_path.display());
            let contents = fs::read_to_string(&config_path).map_err(|e| {
                DingTalkError::Config(format!("Failed to read config file: {}", e))
            })?;
            Self::from_toml_str(&contents)?
        } else {
            tracing::debug!(
                "Config file not found at {}, using environment only",
                config_path.display()
            );
            Self::new("", "")
        };

        // Environment variables override the file
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `DINGTALK_*` variables resolved by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DINGTALK_HOST") {
            tracing::debug!("Using DINGTALK_HOST from environment: {}", host);
            self.host = host;
        }
        if let Some(corpid) = lookup("DINGTALK_CORPID") {
            tracing::debug!("Using DINGTALK_CORPID from environment: {}", corpid);
            self.corpid = corpid;
        }
        if let Some(corpsecret) = lookup("DINGTALK_CORPSECRET") {
            self.corpsecret = corpsecret;
        }
        if let Some(appid) = lookup("DINGTALK_APPID") {
            self.appid = Some(appid);
        }
        if let Some(appsecret) = lookup("DINGTALK_APPSECRET") {
            self.appsecret = Some(appsecret);
        }
        if let Some(proxy) = lookup("DINGTALK_PROXY") {
            tracing::debug!("Using DINGTALK_PROXY from environment: {}", proxy);
            self.proxy = Some(proxy);
        }
    }

    /// Check required fields and URL syntax
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DingTalkError::Config("host required".to_string()));
        }
        if self.corpid.is_empty() {
            return Err(DingTalkError::Config(
                "corpid required. Set it in config file or DINGTALK_CORPID environment variable"
                    .to_string(),
            ));
        }
        if self.corpsecret.is_empty() {
            return Err(DingTalkError::Config(
                "corpsecret required. Set it in config file or DINGTALK_CORPSECRET environment variable"
                    .to_string(),
            ));
        }

        url::Url::parse(&self.host)
            .map_err(|e| DingTalkError::Config(format!("Invalid host '{}': {}", self.host, e)))?;
        if let Some(proxy) = &self.proxy {
            url::Url::parse(proxy)
                .map_err(|e| DingTalkError::Config(format!("Invalid proxy '{}': {}", proxy, e)))?;
        }

        Ok(())
    }

    /// The `(appid, appsecret)` pair, if both halves are set
    pub fn app_pair(&self) -> Result<(&str, &str)> {
        match (self.appid.as_deref(), self.appsecret.as_deref()) {
            (Some(appid), Some(appsecret)) if !appid.is_empty() && !appsecret.is_empty() => {
                Ok((appid, appsecret))
            }
            _ => Err(DingTalkError::Config(
                "appid and appsecret required for app-scoped tokens".to_string(),
            )),
        }
    }

    /// Host without a trailing slash
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    pub fn access_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_lifetime as i64)
    }

    pub fn jsapi_ticket_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.jsapi_ticket_lifetime as i64)
    }
}
