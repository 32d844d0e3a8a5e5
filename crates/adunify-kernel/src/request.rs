//! Requests, responses and the completion callback type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::AdKind;

/// Completion callback for a show request.
///
/// Invoked exactly once when the backend reports a result, or immediately
/// with `success = false` when nothing could serve the request. A backend
/// that never completes never invokes it.
pub type ShowCallback = Box<dyn FnOnce(AdResponse) + Send>;

/// A request to show an ad of a given kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdRequest {
    /// Correlates the request with its [`AdResponse`]
    pub id: Uuid,
    pub kind: AdKind,
    /// Application-defined placement name, forwarded to the backend
    pub placement: Option<String>,
}

impl AdRequest {
    pub fn new(kind: AdKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            placement: None,
        }
    }

    pub fn with_placement(mut self, placement: impl Into<String>) -> Self {
        self.placement = Some(placement.into());
        self
    }
}

/// Outcome of a show request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdResponse {
    pub request_id: Uuid,
    pub kind: AdKind,
    pub placement: Option<String>,
    pub success: bool,
    /// Provider that served the request, once the event passed through one
    pub provider_id: Option<String>,
    /// Adapter that served the request, if any was reached
    pub adapter_id: Option<String>,
}

impl AdResponse {
    /// Failed response for a request nothing could serve.
    pub fn unavailable(request: &AdRequest) -> Self {
        Self::from_request(request, false)
    }

    pub fn from_request(request: &AdRequest, success: bool) -> Self {
        Self {
            request_id: request.id,
            kind: request.kind,
            placement: request.placement.clone(),
            success,
            provider_id: None,
            adapter_id: None,
        }
    }

    pub fn with_adapter(mut self, adapter_id: impl Into<String>) -> Self {
        self.adapter_id = Some(adapter_id.into());
        self
    }

    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }
}

/// Reference to an ad a provider can serve, as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdHandle {
    pub provider_id: String,
    pub adapter_id: String,
    /// Kind the adapter declares, which may be more general than the request
    pub serviced_kind: AdKind,
    pub ready: bool,
}
