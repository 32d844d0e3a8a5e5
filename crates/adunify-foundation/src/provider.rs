//! Ad provider: one mediation source owning a set of adapters.
//!
//! A provider initializes its adapters together, forwards their "ad shown"
//! events with its own id attached, and routes each show request to one
//! adapter, either the most specific registration for the requested kind or
//! a weighted draw among every compatible ready adapter.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use adunify_kernel::config::{AdapterSelection, ProviderConfig};
use adunify_kernel::error::{BackendError, MediationError, MediationResult};
use adunify_kernel::event::{EventHub, ListenerId};
use adunify_kernel::kind::{AdKind, KindGraph};
use adunify_kernel::lifecycle::{Lifecycle, LifecycleGuard};
use adunify_kernel::request::{AdRequest, AdResponse, ShowCallback};
use tracing::{debug, info, warn};

use crate::adapter::{AdapterRegistry, MediatedAdapter, Registered};
use crate::selection::{CandidatePool, MediationSelector, Weighted};

type AdapterSet = AdapterRegistry<Box<dyn MediatedAdapter>>;

/// Network-level setup and teardown of a provider.
///
/// `on_initialize` runs after the adapters came up; `on_deinitialize` runs
/// after they were torn down.
pub trait ProviderHooks: Send {
    fn on_initialize(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn on_deinitialize(&mut self) {}
}

struct NoHooks;

impl ProviderHooks for NoHooks {}

/// Builder for [`AdProvider`].
pub struct AdProviderBuilder {
    graph: Arc<KindGraph>,
    config: ProviderConfig,
    adapters: Vec<Box<dyn MediatedAdapter>>,
    hooks: Option<Box<dyn ProviderHooks>>,
    selector: Option<MediationSelector>,
}

impl AdProviderBuilder {
    /// Register an adapter. Registration order breaks resolution ties.
    pub fn adapter(mut self, adapter: impl MediatedAdapter + 'static) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    pub fn adapters(mut self, adapters: impl IntoIterator<Item = Box<dyn MediatedAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    pub fn hooks(mut self, hooks: impl ProviderHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Selector for [`AdapterSelection::Weighted`]; defaults to an
    /// entropy-seeded one.
    pub fn selector(mut self, selector: MediationSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn build(self) -> MediationResult<AdProvider> {
        self.config.validate()?;

        let mut ids = HashSet::new();
        for adapter in &self.adapters {
            if !ids.insert(adapter.id()) {
                return Err(MediationError::InvalidConfig(format!(
                    "provider '{}' registers adapter '{}' twice",
                    self.config.id,
                    adapter.id()
                )));
            }
        }

        let count = self.adapters.len();
        let adapters = AdapterRegistry::initialized_only(self.graph, self.adapters)?;
        debug!(provider = %self.config.id, adapters = count, "provider built");

        Ok(AdProvider {
            config: self.config,
            adapters,
            hooks: self.hooks.unwrap_or_else(|| Box::new(NoHooks)),
            selector: self.selector.unwrap_or_default(),
            lifecycle: LifecycleGuard::new(),
            shown: EventHub::new(),
            subscriptions: vec![None; count],
        })
    }
}

/// One mediation source.
pub struct AdProvider {
    config: ProviderConfig,
    adapters: AdapterSet,
    hooks: Box<dyn ProviderHooks>,
    selector: MediationSelector,
    lifecycle: LifecycleGuard,
    shown: EventHub<AdResponse>,
    /// Forwarding subscription on each adapter's hub, by adapter index
    subscriptions: Vec<Option<ListenerId>>,
}

impl AdProvider {
    pub fn builder(graph: Arc<KindGraph>, config: ProviderConfig) -> AdProviderBuilder {
        AdProviderBuilder {
            graph,
            config,
            adapters: Vec::new(),
            hooks: None,
            selector: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Adapter that would serve `kind` in resolve mode.
    ///
    /// `None` while the provider is not initialized.
    pub fn find_adapter(&self, kind: AdKind) -> Option<&dyn MediatedAdapter> {
        if !self.lifecycle.is_initialized() {
            return None;
        }
        self.adapters.resolve(kind).map(|adapter| &**adapter)
    }

    pub fn is_ad_ready(&self, kind: AdKind) -> bool {
        if !self.lifecycle.is_initialized() {
            return false;
        }
        match self.config.adapter_selection {
            AdapterSelection::Resolve => self.find_adapter(kind).is_some_and(|a| a.is_ad_ready()),
            AdapterSelection::Weighted => self
                .adapters
                .compatible(kind)
                .any(|(_, a)| a.weight() > 0 && a.is_ad_ready()),
        }
    }

    /// Whether the adapter serving `kind` is on screen.
    ///
    /// A generic adapter busy with another kind does not count.
    pub fn is_ad_showing(&self, kind: AdKind) -> bool {
        if !self.lifecycle.is_initialized() {
            return false;
        }
        match self.config.adapter_selection {
            AdapterSelection::Resolve => self.find_adapter(kind).is_some_and(|a| a.is_ad_showing()),
            AdapterSelection::Weighted => self
                .kind_targets(kind)
                .into_iter()
                .any(|index| self.adapters.get(index).is_some_and(|a| a.is_ad_showing())),
        }
    }

    pub fn is_any_ad_showing(&self) -> bool {
        self.lifecycle.is_initialized() && self.adapters.iter().any(|a| a.is_ad_showing())
    }

    /// Route `request` to one of this provider's adapters.
    ///
    /// Returns `Ok(true)` when an adapter accepted the request; its backend
    /// reports the outcome through `callback`. Returns `Ok(false)` after
    /// invoking `callback` with a failed response when nothing here is
    /// ready for the kind.
    pub fn show_ad<F>(&mut self, request: &AdRequest, callback: F) -> MediationResult<bool>
    where
        F: FnOnce(AdResponse) + Send + 'static,
    {
        let provider_id = self.config.id.clone();
        let callback: ShowCallback = Box::new(move |response: AdResponse| {
            callback(response.with_provider(provider_id))
        });

        let chosen = if self.lifecycle.is_initialized() {
            self.choose_adapter(request.kind)
        } else {
            None
        };
        let Some(index) = chosen else {
            debug!(provider = %self.config.id, request = %request.id, "no ready adapter");
            callback(AdResponse::unavailable(request));
            return Ok(false);
        };

        match self.adapters.get_mut(index) {
            Some(adapter) => {
                adapter.show_ad(request, callback)?;
                Ok(true)
            }
            None => {
                callback(AdResponse::unavailable(request));
                Ok(false)
            }
        }
    }

    /// Hide the ad `kind` is served by, leaving other kinds on screen.
    pub fn hide_ad(&mut self, kind: AdKind) {
        if !self.lifecycle.is_initialized() {
            return;
        }
        match self.config.adapter_selection {
            AdapterSelection::Resolve => {
                if let Some(adapter) = self.adapters.resolve_mut(kind) {
                    if adapter.is_ad_showing() {
                        adapter.hide_ad();
                    }
                }
            }
            AdapterSelection::Weighted => {
                for index in self.kind_targets(kind) {
                    if let Some(adapter) = self.adapters.get_mut(index) {
                        if adapter.is_ad_showing() {
                            adapter.hide_ad();
                        }
                    }
                }
            }
        }
    }

    /// Adapter completions, re-emitted with this provider's id filled in.
    pub fn on_ad_shown(&self) -> &EventHub<AdResponse> {
        &self.shown
    }

    /// Weighted-mode adapters registered for `kind` itself or for the kind
    /// it resolves to.
    fn kind_targets(&self, kind: AdKind) -> Vec<usize> {
        let resolved = self
            .adapters
            .resolve(kind)
            .map(|adapter| adapter.serviced_kind());
        self.adapters
            .iter()
            .enumerate()
            .filter(|(_, adapter)| {
                let serviced = adapter.serviced_kind();
                serviced == kind || Some(serviced) == resolved
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn choose_adapter(&mut self, kind: AdKind) -> Option<usize> {
        match self.config.adapter_selection {
            AdapterSelection::Resolve => self
                .adapters
                .resolve_index(kind)
                .filter(|&index| self.adapters.get(index).is_some_and(|a| a.is_ad_ready())),
            AdapterSelection::Weighted => {
                let pool = CandidatePool::collect(self.adapters.compatible(kind), |a| a.is_ad_ready());
                self.selector.select_index(&pool)
            }
        }
    }
}

/// Detach forwarding and tear every adapter down.
fn teardown_adapters(adapters: &mut AdapterSet, subscriptions: &mut [Option<ListenerId>]) {
    for (index, adapter) in adapters.iter_mut().enumerate() {
        if let Some(id) = subscriptions.get_mut(index).and_then(Option::take) {
            adapter.on_ad_shown().unsubscribe(id);
        }
        adapter.deinitialize();
    }
}

impl Lifecycle for AdProvider {
    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    fn initialize(&mut self) -> MediationResult<()> {
        let Self {
            config,
            adapters,
            hooks,
            lifecycle,
            shown,
            subscriptions,
            ..
        } = self;

        let brought_up = lifecycle.initialize_with(|| -> MediationResult<()> {
            for (index, adapter) in adapters.iter_mut().enumerate() {
                if let Err(err) = adapter.initialize() {
                    warn!(provider = %config.id, adapter = adapter.id(), error = %err, "adapter failed to initialize");
                    continue;
                }
                if subscriptions[index].is_none() {
                    let forward = shown.clone();
                    let provider_id = config.id.clone();
                    let id = adapter.on_ad_shown().subscribe(move |response: &AdResponse| {
                        forward.emit(&response.clone().with_provider(provider_id.as_str()));
                    });
                    subscriptions[index] = Some(id);
                }
            }

            if let Err(err) = hooks.on_initialize() {
                teardown_adapters(adapters, subscriptions);
                return Err(err.into());
            }
            Ok(())
        })?;

        if brought_up {
            let live = self.adapters.iter().filter(|a| a.is_initialized()).count();
            info!(provider = %self.config.id, adapters = live, "provider initialized");
        }
        Ok(())
    }

    /// Tear down adapters, then the provider's own hooks, then drop the
    /// adapters for good.
    fn deinitialize(&mut self) {
        let Self {
            adapters,
            hooks,
            lifecycle,
            subscriptions,
            ..
        } = self;

        let torn_down = lifecycle.deinitialize_with(|| {
            teardown_adapters(adapters, subscriptions);
            hooks.on_deinitialize();
            adapters.clear();
            subscriptions.clear();
        });

        if torn_down {
            info!(provider = %self.config.id, "provider deinitialized");
        }
    }
}

impl Weighted for AdProvider {
    fn weight(&self) -> u32 {
        self.config.weight
    }
}

impl fmt::Debug for AdProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdProvider")
            .field("id", &self.config.id)
            .field("weight", &self.config.weight)
            .field("state", &self.lifecycle.state())
            .field("adapters", &self.adapters)
            .finish_non_exhaustive()
    }
}
