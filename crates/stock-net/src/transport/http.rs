//! HTTP transport backed by reqwest.

use std::time::Duration;

use stock_core::CancellationToken;
use stock_core::logging::targets;
use tokio::runtime::Runtime;
use tokio::time::MissedTickBehavior;

use super::Transport;
use crate::config::SessionConfig;
use crate::error::{NetworkError, Result};

/// Builder for creating an [`HttpTransport`] with custom configuration.
#[derive(Clone, Debug)]
pub struct HttpTransportBuilder {
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
    poll_interval: Duration,
    user_agent: Option<String>,
    runtime_threads: usize,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransportBuilder {
    /// Create a new builder with the session defaults.
    pub fn new() -> Self {
        let defaults = SessionConfig::default();
        Self {
            connect_timeout: defaults.connect_timeout(),
            timeout: defaults.request_timeout(),
            poll_interval: defaults.abort_poll_interval(),
            user_agent: defaults.user_agent,
            runtime_threads: 2,
        }
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable both timeouts.
    pub fn no_timeouts(mut self) -> Self {
        self.connect_timeout = None;
        self.timeout = None;
        self
    }

    /// Set how often an in-flight transfer checks its abort token.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the number of threads driving network I/O.
    pub fn runtime_threads(mut self, threads: usize) -> Self {
        self.runtime_threads = threads.max(1);
        self
    }

    /// Build the transport, starting its I/O runtime.
    pub fn build(self) -> Result<HttpTransport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.runtime_threads)
            .thread_name("stock-http-io")
            .enable_all()
            .build()
            .map_err(|e| NetworkError::Runtime(e.to_string()))?;

        let mut builder = reqwest::Client::builder().gzip(true);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(ref ua) = self.user_agent {
            builder = builder.user_agent(ua);
        }

        let client = {
            let _guard = runtime.enter();
            builder.build()?
        };

        Ok(HttpTransport {
            client,
            runtime,
            poll_interval: self.poll_interval,
        })
    }
}

/// A [`Transport`] performing real HTTP GETs.
///
/// Owns its own I/O runtime, so each session's network activity is isolated
/// and torn down with it. Session workers block on transfers; the runtime
/// threads drive the sockets.
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Runtime,
    poll_interval: Duration,
}

impl HttpTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Result<Self> {
        HttpTransportBuilder::new().build()
    }

    /// Create a builder for configuring a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Create a transport honoring the timeouts and user agent of a session config.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let mut builder = HttpTransportBuilder::new()
            .no_timeouts()
            .poll_interval(config.abort_poll_interval());
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        builder.user_agent = config.user_agent.clone();
        builder.build()
    }

    /// The abort polling interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn fetch_async(
        &self,
        url: url::Url,
        body: &mut Vec<u8>,
        abort: &CancellationToken,
    ) -> Result<u16> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let send = self.client.get(url).send();
        tokio::pin!(send);

        let mut response = loop {
            tokio::select! {
                result = &mut send => break result?,
                _ = ticker.tick() => {
                    if abort.is_cancelled() {
                        return Err(NetworkError::Cancelled);
                    }
                }
            }
        };

        let status = response.status().as_u16();
        tracing::trace!(target: targets::TRANSPORT, status, "response headers received");

        loop {
            tokio::select! {
                chunk = response.chunk() => match chunk? {
                    Some(bytes) => body.extend_from_slice(&bytes),
                    None => break,
                },
                _ = ticker.tick() => {
                    if abort.is_cancelled() {
                        return Err(NetworkError::Cancelled);
                    }
                }
            }
        }

        Ok(status)
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str, body: &mut Vec<u8>, abort: &CancellationToken) -> Result<u16> {
        let url = url::Url::parse(url)?;
        if abort.is_cancelled() {
            return Err(NetworkError::Cancelled);
        }
        self.runtime.block_on(self.fetch_async(url, body, abort))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
