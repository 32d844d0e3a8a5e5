use std::sync::Arc;

use adunify_kernel::config::AdapterConfig;
use adunify_kernel::error::{MediationError, MediationResult};
use adunify_kernel::event::EventHub;
use adunify_kernel::kind::{AdKind, KindGraph};
use adunify_kernel::lifecycle::{Lifecycle, LifecycleGuard};
use adunify_kernel::request::{AdRequest, AdResponse, ShowCallback};
use tracing::{debug, info};

use super::backend::{AdBackend, ShowCompletion};
use super::registry::Registered;
use crate::selection::Weighted;

/// Object-safe surface a provider needs from an adapter.
pub trait MediatedAdapter: Registered + Weighted + Send {
    fn id(&self) -> &str;

    /// Initialized and the backend has an ad loaded.
    fn is_ad_ready(&self) -> bool;

    fn is_ad_showing(&self) -> bool;

    /// Show an ad for `request`.
    ///
    /// When the adapter is not initialized the callback fires immediately
    /// with a failed response. A request the adapter's kind cannot serve is
    /// an error and the callback is dropped unused.
    fn show_ad(&mut self, request: &AdRequest, callback: ShowCallback) -> MediationResult<()>;

    fn hide_ad(&mut self);

    /// Fired after every completed show, following the request's callback.
    fn on_ad_shown(&self) -> &EventHub<AdResponse>;
}

/// Adapter for one ad network and one kind.
pub struct AdAdapter<B> {
    graph: Arc<KindGraph>,
    kind: AdKind,
    config: AdapterConfig,
    backend: B,
    lifecycle: LifecycleGuard,
    shown: EventHub<AdResponse>,
}

impl<B: AdBackend> AdAdapter<B> {
    pub fn new(
        graph: Arc<KindGraph>,
        kind: AdKind,
        config: AdapterConfig,
        backend: B,
    ) -> MediationResult<Self> {
        config.validate()?;
        graph.ensure_contains(kind)?;
        Ok(Self {
            graph,
            kind,
            config,
            backend,
            lifecycle: LifecycleGuard::new(),
            shown: EventHub::new(),
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: AdBackend> Lifecycle for AdAdapter<B> {
    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    fn initialize(&mut self) -> MediationResult<()> {
        let backend = &mut self.backend;
        if self.lifecycle.initialize_with(|| backend.on_initialize())? {
            info!(adapter = %self.config.id, kind = self.graph.name(self.kind), "adapter initialized");
        }
        Ok(())
    }

    fn deinitialize(&mut self) {
        let backend = &mut self.backend;
        if self.lifecycle.deinitialize_with(|| backend.on_deinitialize()) {
            info!(adapter = %self.config.id, "adapter deinitialized");
        }
    }
}

impl<B: AdBackend> Registered for AdAdapter<B> {
    fn serviced_kind(&self) -> AdKind {
        self.kind
    }
}

impl<B> Weighted for AdAdapter<B> {
    fn weight(&self) -> u32 {
        self.config.weight
    }
}

impl<B: AdBackend> MediatedAdapter for AdAdapter<B> {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn is_ad_ready(&self) -> bool {
        self.lifecycle.is_initialized() && self.backend.is_ready()
    }

    fn is_ad_showing(&self) -> bool {
        self.lifecycle.is_initialized() && self.backend.is_showing()
    }

    fn show_ad(&mut self, request: &AdRequest, callback: ShowCallback) -> MediationResult<()> {
        if !self.graph.is_assignable(self.kind, request.kind) {
            return Err(MediationError::KindMismatch {
                requested: self.graph.name(request.kind).to_string(),
                serviced: self.graph.name(self.kind).to_string(),
            });
        }

        let completion = ShowCompletion::new(request, &self.config.id, callback, self.shown.clone());
        if self.lifecycle.is_initialized() {
            debug!(adapter = %self.config.id, request = %request.id, "showing ad");
            self.backend.show(request, completion);
        } else {
            debug!(adapter = %self.config.id, request = %request.id, "adapter not initialized");
            completion.complete(false);
        }
        Ok(())
    }

    fn hide_ad(&mut self) {
        if self.lifecycle.is_initialized() {
            self.backend.hide();
        }
    }

    fn on_ad_shown(&self) -> &EventHub<AdResponse> {
        &self.shown
    }
}

impl<B> std::fmt::Debug for AdAdapter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdAdapter")
            .field("id", &self.config.id)
            .field("kind", &self.graph.name(self.kind))
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}
