use std::{fs, io, path::Path, time::Duration};

use serde::Deserialize;
use shared::{
    domain::Address,
    error::{ChainError, ParseHexError},
};
use thiserror::Error;
use url::Url;

use crate::{contract::ReceiptOptions, poll::AutoRefreshOptions};

pub const DEFAULT_CONFIG_FILE: &str = "stopwatch.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub account: Option<String>,
    pub refresh_interval_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_ms: u64,
    pub receipt_max_errors: u32,
    pub request_timeout_ms: u64,
    pub auto_refresh: bool,
    pub coalesce_refresh: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            contract_address: None,
            account: None,
            refresh_interval_ms: 2000,
            receipt_poll_interval_ms: 1000,
            receipt_timeout_ms: 180_000,
            receipt_max_errors: 5,
            request_timeout_ms: 10_000,
            auto_refresh: true,
            coalesce_refresh: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    rpc_url: Option<String>,
    contract_address: Option<String>,
    account: Option<String>,
    refresh_interval_ms: Option<u64>,
    receipt_poll_interval_ms: Option<u64>,
    receipt_timeout_ms: Option<u64>,
    receipt_max_errors: Option<u32>,
    request_timeout_ms: Option<u64>,
    auto_refresh: Option<bool>,
    coalesce_refresh: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no contract address configured; set contract_address or STOPWATCH_CONTRACT_ADDRESS")]
    MissingContractAddress,
    #[error("invalid contract address: {0}")]
    InvalidContractAddress(#[source] ParseHexError),
    #[error("invalid account address: {0}")]
    InvalidAccount(#[source] ParseHexError),
    #[error("invalid rpc url '{url}': {source}")]
    InvalidRpcUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("cannot read config file '{path}': {source}")]
    ReadFile { path: String, source: io::Error },
    #[error("failed to build rpc client: {0}")]
    HttpClient(#[source] ChainError),
    #[error("invalid config file '{path}': {source}")]
    InvalidFile {
        path: String,
        source: toml::de::Error,
    },
}

/// Defaults, then the config file, then the environment.
///
/// An explicit `path` must exist; the implicit `stopwatch.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();
    let (path, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    match fs::read_to_string(path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .map_err(|source| ConfigError::InvalidFile {
                path: path.display().to_string(),
                source,
            })?,
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::ReadFile {
                path: path.display().to_string(),
                source,
            })
        }
    }
    settings.apply_env_with(|key| std::env::var(key).ok());
    Ok(settings)
}

impl Settings {
    pub fn apply_file(&mut self, raw: &str) -> Result<(), toml::de::Error> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file.rpc_url {
            self.rpc_url = v;
        }
        if let Some(v) = file.contract_address {
            self.contract_address = Some(v);
        }
        if let Some(v) = file.account {
            self.account = Some(v);
        }
        if let Some(v) = file.refresh_interval_ms {
            self.refresh_interval_ms = v;
        }
        if let Some(v) = file.receipt_poll_interval_ms {
            self.receipt_poll_interval_ms = v;
        }
        if let Some(v) = file.receipt_timeout_ms {
            self.receipt_timeout_ms = v;
        }
        if let Some(v) = file.receipt_max_errors {
            self.receipt_max_errors = v;
        }
        if let Some(v) = file.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = file.auto_refresh {
            self.auto_refresh = v;
        }
        if let Some(v) = file.coalesce_refresh {
            self.coalesce_refresh = v;
        }
        Ok(())
    }

    /// Applies environment overrides; `APP__*` keys win over `STOPWATCH_*`.
    /// Unparseable numbers and booleans are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in ["STOPWATCH_RPC_URL", "APP__RPC_URL"] {
            if let Some(v) = lookup(key) {
                self.rpc_url = v;
            }
        }
        for key in ["STOPWATCH_CONTRACT_ADDRESS", "APP__CONTRACT_ADDRESS"] {
            if let Some(v) = lookup(key) {
                self.contract_address = Some(v);
            }
        }
        for key in ["STOPWATCH_ACCOUNT", "APP__ACCOUNT"] {
            if let Some(v) = lookup(key) {
                self.account = Some(v);
            }
        }
        if let Some(v) = lookup("APP__REFRESH_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.refresh_interval_ms = v;
        }
        if let Some(v) = lookup("APP__RECEIPT_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.receipt_poll_interval_ms = v;
        }
        if let Some(v) = lookup("APP__RECEIPT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.receipt_timeout_ms = v;
        }
        if let Some(v) = lookup("APP__RECEIPT_MAX_ERRORS").and_then(|v| v.parse().ok()) {
            self.receipt_max_errors = v;
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.request_timeout_ms = v;
        }
        if let Some(v) = lookup("APP__AUTO_REFRESH").and_then(|v| parse_bool(&v)) {
            self.auto_refresh = v;
        }
        if let Some(v) = lookup("APP__COALESCE_REFRESH").and_then(|v| parse_bool(&v)) {
            self.coalesce_refresh = v;
        }
    }

    pub fn rpc_endpoint(&self) -> Result<Url, ConfigError> {
        Url::parse(self.rpc_url.trim()).map_err(|source| ConfigError::InvalidRpcUrl {
            url: self.rpc_url.clone(),
            source,
        })
    }

    pub fn contract(&self) -> Result<Address, ConfigError> {
        self.contract_address
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .ok_or(ConfigError::MissingContractAddress)?
            .parse()
            .map_err(ConfigError::InvalidContractAddress)
    }

    pub fn account_override(&self) -> Result<Option<Address>, ConfigError> {
        self.account
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.parse().map_err(ConfigError::InvalidAccount))
            .transpose()
    }

    pub fn refresh_options(&self) -> AutoRefreshOptions {
        AutoRefreshOptions {
            period: Duration::from_millis(self.refresh_interval_ms.max(1)),
            coalesce: self.coalesce_refresh,
        }
    }

    pub fn receipt_options(&self) -> ReceiptOptions {
        ReceiptOptions {
            poll_interval: Duration::from_millis(self.receipt_poll_interval_ms.max(1)),
            timeout: Duration::from_millis(self.receipt_timeout_ms.max(1)),
            max_errors: self.receipt_max_errors.max(1),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
