//! Client configuration.
//!
//! A [`ClientConfig`] is assembled once (in code, from environment variables,
//! or from a TOML document) and handed to the client, which keeps it behind
//! an `Arc` for its whole life. Nothing mutates it afterwards.
//!
//! # Example
//!
//! ```
//! use imgur_rest_core::config::{ClientConfig, ConfigFlag};
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder()
//!     .client_id("0123456789abcde")
//!     .request_timeout(Duration::from_secs(10))
//!     .disable(ConfigFlag::RetryOnTimeout)
//!     .build()
//!     .unwrap();
//!
//! assert!(!config.flags().contains(ConfigFlag::RetryOnTimeout));
//! ```

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.imgur.com/3/";

/// Default global request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on concurrent transport calls
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default `User-Agent` header
pub const DEFAULT_USER_AGENT: &str = concat!("imgur-rest/", env!("CARGO_PKG_VERSION"));

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an unusable value
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidEnvVar {
        /// Variable name
        name: String,
        /// Raw value
        value: String,
        /// What is wrong with it
        reason: String,
    },

    /// Failed to parse a configuration document
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Named boolean switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFlag {
    /// Retry a request once after a transient failure (enabled by default)
    RetryOnTimeout,
}

impl ConfigFlag {
    /// Every flag.
    pub const ALL: [Self; 1] = [Self::RetryOnTimeout];

    /// Whether the flag is on when nothing says otherwise.
    #[must_use]
    pub const fn is_default(self) -> bool {
        match self {
            Self::RetryOnTimeout => true,
        }
    }

    /// Kebab-case name used in logs and documents.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RetryOnTimeout => "retry-on-timeout",
        }
    }

    const fn bit(self) -> u32 {
        match self {
            Self::RetryOnTimeout => 1,
        }
    }
}

impl fmt::Display for ConfigFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Set of enabled [`ConfigFlag`]s
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigFlags(u32);

impl ConfigFlags {
    /// No flag enabled.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Whether `flag` is enabled.
    #[must_use]
    pub const fn contains(self, flag: ConfigFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Copy with `flag` enabled.
    #[must_use]
    pub const fn with(self, flag: ConfigFlag) -> Self {
        Self(self.0 | flag.bit())
    }

    /// Copy with `flag` disabled.
    #[must_use]
    pub const fn without(self, flag: ConfigFlag) -> Self {
        Self(self.0 & !flag.bit())
    }

    /// Copy with `flag` set to `enabled`.
    #[must_use]
    pub const fn set(self, flag: ConfigFlag, enabled: bool) -> Self {
        if enabled { self.with(flag) } else { self.without(flag) }
    }
}

impl Default for ConfigFlags {
    fn default() -> Self {
        ConfigFlag::ALL
            .into_iter()
            .filter(|flag| flag.is_default())
            .fold(Self::empty(), Self::with)
    }
}

impl fmt::Debug for ConfigFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(ConfigFlag::ALL.iter().filter(|flag| self.contains(**flag)))
            .finish()
    }
}

/// Everything the client needs to know at construction time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    flags: ConfigFlags,
    request_timeout: Duration,
    base_url: String,
    client_id: Option<String>,
    max_concurrency: usize,
    user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            flags: ConfigFlags::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Enabled flags.
    #[must_use]
    pub const fn flags(&self) -> ConfigFlags {
        self.flags
    }

    /// Global request timeout, used to derive each request's deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// API root, always ending with `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Application client id sent as `Authorization: Client-ID …`.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Bound on concurrent transport calls.
    #[must_use]
    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Load from `IMGUR_*` environment variables, falling back to defaults.
    ///
    /// | variable | meaning |
    /// |---|---|
    /// | `IMGUR_CLIENT_ID` | client id |
    /// | `IMGUR_BASE_URL` | API root |
    /// | `IMGUR_REQUEST_TIMEOUT_SECS` | request timeout in seconds |
    /// | `IMGUR_MAX_CONCURRENCY` | concurrent transport calls |
    /// | `IMGUR_RETRY_ON_TIMEOUT` | `true`/`false` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or invalid values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or invalid values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(id) = lookup("IMGUR_CLIENT_ID") {
            builder = builder.client_id(id);
        }
        if let Some(url) = lookup("IMGUR_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(raw) = lookup("IMGUR_REQUEST_TIMEOUT_SECS") {
            let secs = parse_env::<u64>("IMGUR_REQUEST_TIMEOUT_SECS", &raw)?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(raw) = lookup("IMGUR_MAX_CONCURRENCY") {
            builder = builder.max_concurrency(parse_env("IMGUR_MAX_CONCURRENCY", &raw)?);
        }
        if let Some(raw) = lookup("IMGUR_RETRY_ON_TIMEOUT") {
            let enabled = parse_env_bool("IMGUR_RETRY_ON_TIMEOUT", &raw)?;
            builder = builder.flag(ConfigFlag::RetryOnTimeout, enabled);
        }

        builder.build()
    }

    /// Load from a TOML document. Absent keys keep their defaults.
    ///
    /// ```toml
    /// client_id = "0123456789abcde"
    /// request_timeout_secs = 15
    /// max_concurrency = 4
    ///
    /// [flags]
    /// retry_on_timeout = false
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and
    /// [`ConfigError::Validation`] for invalid values.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let file: FileConfig =
            toml::from_str(document).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut builder = Self::builder();
        if let Some(url) = file.base_url {
            builder = builder.base_url(url);
        }
        if let Some(id) = file.client_id {
            builder = builder.client_id(id);
        }
        if let Some(secs) = file.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(n) = file.max_concurrency {
            builder = builder.max_concurrency(n);
        }
        if let Some(agent) = file.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(enabled) = file.flags.retry_on_timeout {
            builder = builder.flag(ConfigFlag::RetryOnTimeout, enabled);
        }
        builder.build()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https:// (got {})",
                self.base_url
            )));
        }
        if self.client_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "client_id may not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Enable a flag.
    #[must_use]
    pub const fn enable(mut self, flag: ConfigFlag) -> Self {
        self.config.flags = self.config.flags.with(flag);
        self
    }

    /// Disable a flag.
    #[must_use]
    pub const fn disable(mut self, flag: ConfigFlag) -> Self {
        self.config.flags = self.config.flags.without(flag);
        self
    }

    /// Set a flag.
    #[must_use]
    pub const fn flag(mut self, flag: ConfigFlag, enabled: bool) -> Self {
        self.config.flags = self.config.flags.set(flag, enabled);
        self
    }

    /// Replace the whole flag set.
    #[must_use]
    pub const fn flags(mut self, flags: ConfigFlags) -> Self {
        self.config.flags = flags;
        self
    }

    /// Set the global request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the API root. A trailing `/` is added when missing.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.config.base_url = url;
        self
    }

    /// Set the application client id.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = Some(id.into());
        self
    }

    /// Set the bound on concurrent transport calls.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrency = n;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a zero timeout, zero
    /// concurrency, a non-http base url or a blank client id.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    client_id: Option<String>,
    request_timeout_secs: Option<u64>,
    max_concurrency: Option<usize>,
    user_agent: Option<String>,
    flags: FileFlags,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileFlags {
    retry_on_timeout: Option<bool>,
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
        name: name.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
