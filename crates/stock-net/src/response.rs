//! The outcome of a session request.

/// The result of a request, delivered exactly once to its completion callback.
///
/// Exactly one of three outcomes applies:
///
/// - success: `successful == true`, `canceled == false`, `data` holds the body
/// - failure: both flags `false` (connection error, timeout, non-2xx status)
/// - cancellation: `canceled == true`, `successful == false`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    /// Body bytes received from the server.
    pub data: Vec<u8>,
    /// Whether the transfer finished with a 2xx status.
    pub successful: bool,
    /// Whether the request was canceled before it could complete.
    pub canceled: bool,
    /// The HTTP status, if the server answered.
    pub status: Option<u16>,
}

impl Response {
    /// A response for a request that was canceled.
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            ..Default::default()
        }
    }

    /// Get the body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Whether the request failed without being canceled.
    pub fn is_failure(&self) -> bool {
        !self.successful && !self.canceled
    }
}
