//! Transports perform the actual network transfer for a session.
//!
//! A session never talks to the network itself. Each worker hands the URL of
//! the request it claimed to a [`Transport`], which performs one blocking GET,
//! appends the body to the supplied buffer, and returns the HTTP status.
//!
//! # Cancellation
//!
//! The `abort` token passed to [`Transport::fetch`] is raised when the request
//! is canceled or the session shuts down. Implementations must check it at a
//! bounded interval while the transfer is in progress and return
//! [`NetworkError::Cancelled`](crate::NetworkError::Cancelled) promptly once it is set.
//!
//! # Testing
//!
//! [`from_fn`] turns a closure into a transport, which makes canned responses
//! trivial:
//!
//! ```
//! use stock_net::{Session, SessionConfig, transport};
//!
//! let transport = transport::from_fn(|_url, body, _abort| {
//!     body.extend_from_slice(b"ok");
//!     Ok(200)
//! });
//!
//! let config = SessionConfig::builder().worker_count(1).build().unwrap();
//! let session = Session::with_transport(config, transport).unwrap();
//! let (tx, rx) = std::sync::mpsc::channel();
//! session.submit("https://example.com", move |response| {
//!     tx.send(response).unwrap();
//! });
//! assert_eq!(rx.recv().unwrap().data, b"ok");
//! ```

mod http;

use stock_core::CancellationToken;

use crate::error::Result;

pub use http::{HttpTransport, HttpTransportBuilder};

/// Performs a single blocking HTTP GET on behalf of a session worker.
pub trait Transport: Send + Sync + 'static {
    /// Fetch `url`, appending received bytes to `body` as they arrive.
    ///
    /// Returns the HTTP status of a completed transfer, whatever its class;
    /// the caller decides what counts as success. Returns
    /// [`NetworkError::Cancelled`](crate::NetworkError::Cancelled) if `abort`
    /// was raised before the transfer finished, and any other error for
    /// connection failures and timeouts.
    fn fetch(&self, url: &str, body: &mut Vec<u8>, abort: &CancellationToken) -> Result<u16>;
}

/// A [`Transport`] backed by a closure. Created by [`from_fn`].
pub struct FnTransport<F> {
    fetch: F,
}

/// Create a transport that calls `fetch` for every request.
pub fn from_fn<F>(fetch: F) -> FnTransport<F>
where
    F: Fn(&str, &mut Vec<u8>, &CancellationToken) -> Result<u16> + Send + Sync + 'static,
{
    FnTransport { fetch }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&str, &mut Vec<u8>, &CancellationToken) -> Result<u16> + Send + Sync + 'static,
{
    fn fetch(&self, url: &str, body: &mut Vec<u8>, abort: &CancellationToken) -> Result<u16> {
        (self.fetch)(url, body, abort)
    }
}

impl<F> std::fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}
