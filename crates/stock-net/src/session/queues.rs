//! Pending queue and active registry, guarded together by the session lock.

use std::collections::{HashMap, VecDeque};

use stock_core::CancellationToken;

use crate::request::{Request, RequestHandle};

/// All mutable session state that lives behind the session lock.
///
/// A handle is in at most one of `pending` and `active` at any time. Requests
/// in `pending` are owned here; once claimed, the worker owns the request and
/// `active` keeps only the abort token shared with that worker.
#[derive(Debug)]
pub(crate) struct RequestQueues {
    pending: VecDeque<Request>,
    active: HashMap<RequestHandle, CancellationToken>,
    running: bool,
    next_handle: u64,
}

impl RequestQueues {
    pub(crate) fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            active: HashMap::new(),
            running: true,
            next_handle: 1,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Issue the next handle. Handles are never reused.
    pub(crate) fn issue_handle(&mut self) -> RequestHandle {
        let handle = RequestHandle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }

    pub(crate) fn push_pending(&mut self, request: Request) {
        self.pending.push_back(request);
    }

    /// Remove a request that no worker has claimed yet.
    pub(crate) fn take_pending(&mut self, handle: RequestHandle) -> Option<Request> {
        let index = self.pending.iter().position(|r| r.handle == handle)?;
        self.pending.remove(index)
    }

    /// Pop the oldest pending request and register it as active.
    ///
    /// Returns the request together with the abort token now shared between
    /// the claiming worker and the registry.
    pub(crate) fn claim_next(&mut self) -> Option<(Request, CancellationToken)> {
        let request = self.pending.pop_front()?;
        let abort = CancellationToken::new();
        self.active.insert(request.handle, abort.clone());
        Some((request, abort))
    }

    /// Raise the abort flag of an active request. Returns `false` if the
    /// handle is not active.
    pub(crate) fn cancel_active(&mut self, handle: RequestHandle) -> bool {
        match self.active.get(&handle) {
            Some(abort) => {
                abort.cancel();
                true
            }
            None => false,
        }
    }

    /// Deregister an active request, returning whether it was canceled.
    ///
    /// After this returns, `cancel` no longer sees the handle, so the flag
    /// read here is final.
    pub(crate) fn finish_active(&mut self, handle: RequestHandle) -> bool {
        self.active
            .remove(&handle)
            .is_some_and(|abort| abort.is_cancelled())
    }

    /// Stop dispatching: clear the running flag, flag every active request,
    /// and hand back the pending requests for cancellation.
    pub(crate) fn shutdown(&mut self) -> Vec<Request> {
        self.running = false;
        for abort in self.active.values() {
            abort.cancel();
        }
        self.pending.drain(..).collect()
    }
}
