//! Seam between an adapter and the ad network it wraps.

use adunify_kernel::error::BackendError;
use adunify_kernel::event::EventHub;
use adunify_kernel::request::{AdRequest, AdResponse, ShowCallback};
use tracing::debug;
use uuid::Uuid;

/// Network-specific behavior behind an [`AdAdapter`](super::AdAdapter).
///
/// The adapter owns lifecycle, kind checks and event fan-out; a backend only
/// talks to its network. `show` may complete synchronously or keep the
/// [`ShowCompletion`] and finish later from another thread.
pub trait AdBackend: Send {
    fn on_initialize(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn is_ready(&self) -> bool;

    fn is_showing(&self) -> bool;

    /// Start showing an ad for `request`.
    fn show(&mut self, request: &AdRequest, completion: ShowCompletion);

    fn hide(&mut self);

    fn on_deinitialize(&mut self) {}
}

impl<B: AdBackend + ?Sized> AdBackend for Box<B> {
    fn on_initialize(&mut self) -> Result<(), BackendError> {
        (**self).on_initialize()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn is_showing(&self) -> bool {
        (**self).is_showing()
    }

    fn show(&mut self, request: &AdRequest, completion: ShowCompletion) {
        (**self).show(request, completion)
    }

    fn hide(&mut self) {
        (**self).hide()
    }

    fn on_deinitialize(&mut self) {
        (**self).on_deinitialize()
    }
}

/// Single-use completion handle for one show request.
///
/// Consuming it delivers the response to the caller's callback first, then
/// to the adapter's "ad shown" listeners. Dropping it without completing
/// delivers nothing.
pub struct ShowCompletion {
    response: AdResponse,
    callback: ShowCallback,
    shown: EventHub<AdResponse>,
}

impl ShowCompletion {
    pub(crate) fn new(
        request: &AdRequest,
        adapter_id: &str,
        callback: ShowCallback,
        shown: EventHub<AdResponse>,
    ) -> Self {
        Self {
            response: AdResponse::from_request(request, false).with_adapter(adapter_id),
            callback,
            shown,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.response.request_id
    }

    /// Report the outcome of the show.
    pub fn complete(self, success: bool) {
        let Self {
            mut response,
            callback,
            shown,
        } = self;
        response.success = success;
        debug!(
            request = %response.request_id,
            adapter = response.adapter_id.as_deref().unwrap_or_default(),
            success,
            "ad show completed"
        );
        callback(response.clone());
        shown.emit(&response);
    }
}

impl std::fmt::Debug for ShowCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowCompletion")
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}
