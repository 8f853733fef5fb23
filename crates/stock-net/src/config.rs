//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Configuration for a [`Session`](crate::Session).
///
/// Timeouts are in milliseconds; `0` disables the corresponding timeout.
///
/// # Example
///
/// ```
/// use stock_net::SessionConfig;
///
/// let config = SessionConfig::from_toml_str(r#"
/// worker_count = 2
/// connect_timeout_ms = 1500
/// "#).unwrap();
///
/// assert_eq!(config.worker_count, 2);
/// assert_eq!(config.request_timeout_ms, 30_000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of worker threads executing requests. Must be at least 1.
    pub worker_count: usize,
    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// How often an in-flight transfer checks its abort flag, in milliseconds.
    pub abort_poll_interval_ms: u64,
    /// Name prefix for worker threads. Threads are named `{prefix}-{index}`.
    pub thread_name: String,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            connect_timeout_ms: 3_000,
            request_timeout_ms: 30_000,
            abort_poll_interval_ms: 100,
            thread_name: "stock-url-session".to_string(),
            user_agent: Some(format!("stock/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl SessionConfig {
    /// Create a builder starting from the default configuration.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, SessionError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the session cannot run with.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.worker_count == 0 {
            return Err(SessionError::InvalidWorkerCount);
        }
        Ok(())
    }

    /// The connect timeout, or `None` if disabled.
    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    /// The total request timeout, or `None` if disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        millis(self.request_timeout_ms)
    }

    /// The abort polling interval. Never zero.
    pub fn abort_poll_interval(&self) -> Duration {
        Duration::from_millis(self.abort_poll_interval_ms.max(1))
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Milliseconds in `duration`, rounded up so that a non-zero duration never
/// becomes `0` (which disables the timeout).
fn whole_millis(duration: Duration) -> u64 {
    let ms = duration.as_millis().min(u128::from(u64::MAX)) as u64;
    if ms == 0 && !duration.is_zero() { 1 } else { ms }
}

/// Builder for [`SessionConfig`].
#[derive(Clone, Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    /// Set the connect timeout. Sub-millisecond values round up to 1 ms;
    /// `Duration::ZERO` disables the timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = whole_millis(timeout);
        self
    }

    /// Set the total request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = whole_millis(timeout);
        self
    }

    /// Disable both timeouts.
    pub fn no_timeouts(mut self) -> Self {
        self.config.connect_timeout_ms = 0;
        self.config.request_timeout_ms = 0;
        self
    }

    /// Set how often in-flight transfers check for cancellation.
    pub fn abort_poll_interval(mut self, interval: Duration) -> Self {
        self.config.abort_poll_interval_ms = whole_millis(interval);
        self
    }

    /// Set the worker thread name prefix.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<SessionConfig, SessionError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
