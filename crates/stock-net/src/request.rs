//! Request records and handles.

use std::fmt;

use crate::response::Response;

/// Callback invoked exactly once with the outcome of a request.
///
/// Callbacks run on an arbitrary session worker thread (or on the thread
/// calling [`Session::cancel`](crate::Session::cancel) or dropping the session,
/// for requests that never left the pending queue). They should return quickly.
pub type CompletionCallback = Box<dyn FnOnce(Response) + Send + 'static>;

/// Identifies a submitted request for cancellation.
///
/// Handles are issued in increasing order by a session and never reused
/// within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestHandle(u64);

impl RequestHandle {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw handle value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request that has been submitted but not yet completed.
///
/// Owned by the pending queue until a worker claims it, then by that worker.
pub(crate) struct Request {
    pub(crate) handle: RequestHandle,
    pub(crate) url: String,
    pub(crate) on_complete: CompletionCallback,
}

impl Request {
    /// Consume the request, delivering `response` to its callback.
    pub(crate) fn complete(self, response: Response) {
        (self.on_complete)(response);
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("handle", &self.handle)
            .field("url", &self.url)
            .finish()
    }
}
