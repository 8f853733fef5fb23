//! The loop run by every session worker thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use http::StatusCode;
use stock_core::CancellationToken;
use stock_core::logging::{span_names, targets};

use super::Shared;
use crate::error::NetworkError;
use crate::request::Request;
use crate::response::Response;
use crate::transport::Transport;

/// Claim requests until the session stops, executing each one and delivering
/// its callback on this thread.
pub(super) fn worker_loop(shared: Arc<Shared>) {
    tracing::debug!(target: targets::SESSION, "worker started");

    while let Some((request, abort)) = next_request(&shared) {
        let mut response = execute(shared.transport.as_ref(), &request, &abort);

        if shared.queues.lock().finish_active(request.handle) {
            response.canceled = true;
            response.successful = false;
        }

        tracing::trace!(
            target: targets::SESSION,
            handle = %request.handle,
            successful = response.successful,
            canceled = response.canceled,
            "request complete"
        );
        deliver(request, response);
    }

    tracing::debug!(target: targets::SESSION, "worker stopped");
}

/// Block until a pending request can be claimed. Returns `None` once the
/// session has stopped.
fn next_request(shared: &Shared) -> Option<(Request, CancellationToken)> {
    let mut queues = shared.queues.lock();
    loop {
        if !queues.is_running() {
            return None;
        }
        if let Some(claimed) = queues.claim_next() {
            tracing::trace!(target: targets::SESSION, handle = %claimed.0.handle, "request dispatched");
            return Some(claimed);
        }
        shared.request_available.wait(&mut queues);
    }
}

/// Run one transfer without holding the session lock.
fn execute(transport: &dyn Transport, request: &Request, abort: &CancellationToken) -> Response {
    let mut response = Response::default();
    if abort.is_cancelled() {
        response.canceled = true;
        return response;
    }

    let _span = tracing::debug_span!(
        target: targets::SESSION,
        span_names::TRANSFER,
        handle = %request.handle,
        url = %request.url
    )
    .entered();

    let fetched = panic::catch_unwind(AssertUnwindSafe(|| {
        transport.fetch(&request.url, &mut response.data, abort)
    }));
    let Ok(result) = fetched else {
        tracing::error!(target: targets::SESSION, "transport panicked");
        response.data.clear();
        return response;
    };

    match result {
        Ok(status) => {
            response.status = Some(status);
            if is_success(status) {
                response.successful = true;
            } else {
                tracing::warn!(
                    target: targets::SESSION,
                    error = %NetworkError::HttpStatus { status },
                    "request failed"
                );
            }
        }
        Err(NetworkError::Cancelled) => {
            tracing::debug!(target: targets::SESSION, "transfer aborted");
            response.canceled = true;
        }
        Err(err) => {
            tracing::error!(target: targets::SESSION, error = %err, "request failed");
        }
    }

    response
}

fn is_success(status: u16) -> bool {
    StatusCode::from_u16(status).is_ok_and(|status| status.is_success())
}

/// Invoke a request's callback, containing any panic it raises.
pub(super) fn deliver(request: Request, response: Response) {
    let handle = request.handle;
    if panic::catch_unwind(AssertUnwindSafe(move || request.complete(response))).is_err() {
        tracing::error!(target: targets::SESSION, %handle, "completion callback panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestHandle;
    use crate::transport;

    fn request(url: &str) -> Request {
        Request {
            handle: RequestHandle::new(1),
            url: url.to_string(),
            on_complete: Box::new(|_| {}),
        }
    }

    fn fixed(status: u16, body: &'static [u8]) -> impl Transport {
        transport::from_fn(move |_, out, _| {
            out.extend_from_slice(body);
            Ok(status)
        })
    }

    #[test]
    fn test_success_classification() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(304));
        assert!(!is_success(404));
        assert!(!is_success(500));
        assert!(!is_success(42));
    }

    #[test]
    fn test_execute_success() {
        let response = execute(&fixed(200, b"ok"), &request("a"), &CancellationToken::new());
        assert!(response.successful);
        assert!(!response.canceled);
        assert_eq!(response.data, b"ok");
        assert_eq!(response.status, Some(200));
    }

    #[test]
    fn test_execute_non_2xx_is_failure() {
        let response = execute(&fixed(404, b"missing"), &request("a"), &CancellationToken::new());
        assert!(!response.successful);
        assert!(!response.canceled);
        assert_eq!(response.status, Some(404));
        assert_eq!(response.data, b"missing");
    }

    #[test]
    fn test_execute_transport_error() {
        let transport =
            transport::from_fn(|_, _, _| Err(NetworkError::Connection("refused".into())));
        let response = execute(&transport, &request("a"), &CancellationToken::new());
        assert!(response.is_failure());
        assert_eq!(response.status, None);
    }

    #[test]
    fn test_execute_abort() {
        let transport = transport::from_fn(|_, out, _| {
            out.extend_from_slice(b"par");
            Err(NetworkError::Cancelled)
        });
        let response = execute(&transport, &request("a"), &CancellationToken::new());
        assert!(response.canceled);
        assert!(!response.successful);
    }

    #[test]
    fn test_execute_contains_transport_panic() {
        let transport = transport::from_fn(|_, out, _| {
            out.extend_from_slice(b"partial");
            panic!("transport failure")
        });
        let response = execute(&transport, &request("a"), &CancellationToken::new());
        assert!(response.is_failure());
        assert!(response.data.is_empty());
        assert_eq!(response.status, None);
    }

    #[test]
    fn test_execute_skips_when_already_cancelled() {
        let transport =
            transport::from_fn(|_, _, _| panic!("transport must not run for a canceled request"));
        let abort = CancellationToken::new();
        abort.cancel();

        let response = execute(&transport, &request("a"), &abort);
        assert!(response.canceled);
    }

    #[test]
    fn test_deliver_contains_panic() {
        let request = Request {
            handle: RequestHandle::new(7),
            url: "a".to_string(),
            on_complete: Box::new(|_| panic!("callback failure")),
        };
        deliver(request, Response::default());
    }
}
