//! Ad service: the application-facing aggregate over every provider.
//!
//! The service owns the providers' lifecycle, the global [`AdStatus`]
//! switch, and the provider-tier weighted draw that decides which provider
//! gets each show request.

use std::collections::HashSet;
use std::fmt;

use adunify_kernel::config::{AdStatus, ServiceConfig};
use adunify_kernel::error::{MediationError, MediationResult};
use adunify_kernel::event::{EventHub, ListenerId};
use adunify_kernel::kind::AdKind;
use adunify_kernel::lifecycle::{Lifecycle, LifecycleGuard};
use adunify_kernel::request::{AdHandle, AdRequest, AdResponse};
use tracing::{debug, info, warn};

use crate::adapter::Registered;
use crate::provider::AdProvider;
use crate::selection::{CandidatePool, MediationSelector, Weighted};

/// Application-facing mediation service.
///
/// Dropping the service disposes it.
pub struct AdService {
    providers: Vec<AdProvider>,
    selector: MediationSelector,
    lifecycle: LifecycleGuard,
    status: AdStatus,
    status_changed: EventHub<AdStatus>,
    shown: EventHub<AdResponse>,
    /// Forwarding subscription on each provider's hub, by provider index
    subscriptions: Vec<Option<ListenerId>>,
}

impl AdService {
    /// Build a service over `providers`, which must have distinct ids.
    pub fn new(
        providers: impl IntoIterator<Item = AdProvider>,
        selector: MediationSelector,
    ) -> MediationResult<Self> {
        let providers: Vec<AdProvider> = providers.into_iter().collect();

        let mut ids = HashSet::new();
        for provider in &providers {
            if !ids.insert(provider.id()) {
                return Err(MediationError::InvalidConfig(format!(
                    "provider '{}' added twice",
                    provider.id()
                )));
            }
        }

        let subscriptions = vec![None; providers.len()];
        Ok(Self {
            providers,
            selector,
            lifecycle: LifecycleGuard::new(),
            status: AdStatus::default(),
            status_changed: EventHub::new(),
            shown: EventHub::new(),
            subscriptions,
        })
    }

    /// Build a service using the seed and initial status from `config`.
    ///
    /// Provider weights and selection modes come from the providers
    /// themselves; `config.providers` is meant for building them.
    pub fn from_config(
        config: &ServiceConfig,
        providers: impl IntoIterator<Item = AdProvider>,
    ) -> MediationResult<Self> {
        config.validate()?;
        let selector = match config.seed {
            Some(seed) => MediationSelector::seeded(seed),
            None => MediationSelector::from_entropy(),
        };
        let mut service = Self::new(providers, selector)?;
        service.status = config.status;
        Ok(service)
    }

    pub fn providers(&self) -> &[AdProvider] {
        &self.providers
    }

    pub fn provider(&self, id: &str) -> Option<&AdProvider> {
        self.providers.iter().find(|p| p.id() == id)
    }

    pub fn status(&self) -> AdStatus {
        self.status
    }

    /// Switch ads on or off. Listeners hear about actual changes only.
    pub fn set_status(&mut self, status: AdStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        info!(%status, "ad status changed");
        self.status_changed.emit(&status);
    }

    pub fn on_status_changed(&self) -> &EventHub<AdStatus> {
        &self.status_changed
    }

    /// Completed shows from every provider.
    pub fn on_ad_shown(&self) -> &EventHub<AdResponse> {
        &self.shown
    }

    /// Dispose the service: tear every provider down.
    pub fn dispose(&mut self) {
        self.deinitialize();
    }

    /// A show request for `kind` could be served right now.
    pub fn is_ad_ready(&self, kind: AdKind) -> bool {
        self.lifecycle.is_initialized()
            && self.status == AdStatus::Enabled
            && self.providers.iter().any(|p| p.weight() > 0 && p.is_ad_ready(kind))
    }

    pub fn is_ad_showing(&self, kind: AdKind) -> bool {
        self.lifecycle.is_initialized() && self.providers.iter().any(|p| p.is_ad_showing(kind))
    }

    pub fn is_any_ad_showing(&self) -> bool {
        self.lifecycle.is_initialized() && self.providers.iter().any(|p| p.is_any_ad_showing())
    }

    pub fn hide_ad(&mut self, kind: AdKind) {
        if !self.lifecycle.is_initialized() {
            return;
        }
        for provider in &mut self.providers {
            provider.hide_ad(kind);
        }
    }

    /// Up to `limit` adapters, one per provider, that would serve `kind`.
    pub fn collect_ads(&self, kind: AdKind, limit: usize) -> Vec<AdHandle> {
        if !self.lifecycle.is_initialized() {
            return Vec::new();
        }
        self.providers
            .iter()
            .filter_map(|provider| {
                provider.find_adapter(kind).map(|adapter| AdHandle {
                    provider_id: provider.id().to_string(),
                    adapter_id: adapter.id().to_string(),
                    serviced_kind: adapter.serviced_kind(),
                    ready: adapter.is_ad_ready(),
                })
            })
            .take(limit)
            .collect()
    }

    /// Show an ad for `request` through a weighted pick among ready providers.
    ///
    /// Returns `Ok(false)` and invokes `callback` with a failed response when
    /// the service is not initialized, ads are disabled, or no provider is
    /// ready. `Ok(true)` means a provider took the request and `callback`
    /// will fire once its backend completes.
    pub fn try_show_ad<F>(&mut self, request: AdRequest, callback: F) -> MediationResult<bool>
    where
        F: FnOnce(AdResponse) + Send + 'static,
    {
        if !self.lifecycle.is_initialized() || self.status == AdStatus::Disabled {
            debug!(request = %request.id, status = %self.status, "service cannot show ads");
            callback(AdResponse::unavailable(&request));
            return Ok(false);
        }

        let chosen = {
            let pool = CandidatePool::collect(self.providers.iter().enumerate(), |p| {
                p.is_initialized() && p.is_ad_ready(request.kind)
            });
            self.selector.select_index(&pool)
        };

        match chosen.and_then(|index| self.providers.get_mut(index)) {
            Some(provider) => {
                debug!(request = %request.id, provider = provider.id(), "provider selected");
                provider.show_ad(&request, callback)
            }
            None => {
                warn!(request = %request.id, kind = %request.kind, "no provider ready");
                callback(AdResponse::unavailable(&request));
                Ok(false)
            }
        }
    }
}

impl Lifecycle for AdService {
    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    fn initialize(&mut self) -> MediationResult<()> {
        let Self {
            providers,
            lifecycle,
            shown,
            subscriptions,
            ..
        } = self;

        let brought_up = lifecycle.initialize_with(|| -> MediationResult<()> {
            for (index, provider) in providers.iter_mut().enumerate() {
                if let Err(err) = provider.initialize() {
                    warn!(provider = provider.id(), error = %err, "provider failed to initialize");
                    continue;
                }
                if subscriptions[index].is_none() {
                    let forward = shown.clone();
                    let id = provider
                        .on_ad_shown()
                        .subscribe(move |response: &AdResponse| forward.emit(response));
                    subscriptions[index] = Some(id);
                }
            }
            Ok(())
        })?;

        if brought_up {
            let live = self.providers.iter().filter(|p| p.is_initialized()).count();
            info!(providers = live, status = %self.status, "ad service initialized");
        }
        Ok(())
    }

    fn deinitialize(&mut self) {
        let Self {
            providers,
            lifecycle,
            subscriptions,
            ..
        } = self;

        let torn_down = lifecycle.deinitialize_with(|| {
            for (index, provider) in providers.iter_mut().enumerate() {
                if let Some(id) = subscriptions.get_mut(index).and_then(Option::take) {
                    provider.on_ad_shown().unsubscribe(id);
                }
                provider.deinitialize();
            }
        });

        if torn_down {
            info!("ad service disposed");
        }
    }
}

impl Drop for AdService {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for AdService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdService")
            .field("state", &self.lifecycle.state())
            .field("status", &self.status)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
