use std::sync::Arc;

use adunify_foundation::adapter::AdAdapter;
use adunify_foundation::provider::AdProvider;
use adunify_foundation::selection::MediationSelector;
use adunify_foundation::service::AdService;
use adunify_kernel::config::{
    AdStatus, AdapterConfig, AdapterSelection, ProviderConfig, ServiceConfig, load_service_config,
};
use adunify_kernel::kind::{AdKind, KindGraph, standard};
use adunify_kernel::lifecycle::Lifecycle;
use adunify_kernel::request::AdRequest;
use adunify_testing::{MockAdBackend, MockHooks, ResponseLog, assert_show_count, init_tracing};

fn standard_graph() -> Arc<KindGraph> {
    Arc::new(KindGraph::standard())
}

fn adapter(graph: &Arc<KindGraph>, id: &str, kind: AdKind, backend: &MockAdBackend) -> AdAdapter<MockAdBackend> {
    AdAdapter::new(Arc::clone(graph), kind, AdapterConfig::new(id), backend.clone()).unwrap()
}

/// Provider with one interstitial and one rewarded adapter.
fn full_provider(graph: &Arc<KindGraph>, config: ProviderConfig) -> (AdProvider, MockAdBackend, MockAdBackend) {
    let interstitial = MockAdBackend::ready();
    let rewarded = MockAdBackend::ready();
    let id = config.id.clone();
    let provider = AdProvider::builder(Arc::clone(graph), config)
        .adapter(adapter(graph, &format!("{id}-interstitial"), standard::INTERSTITIAL, &interstitial))
        .adapter(adapter(graph, &format!("{id}-rewarded"), standard::REWARDED, &rewarded))
        .build()
        .unwrap();
    (provider, interstitial, rewarded)
}

#[test]
fn test_provider_draw_follows_weights() {
    init_tracing();
    let graph = standard_graph();
    let (a, _, _) = full_provider(&graph, ProviderConfig::new("net-a").with_weight(70));
    let (b, _, _) = full_provider(&graph, ProviderConfig::new("net-b").with_weight(30));
    let mut service = AdService::new([a, b], MediationSelector::seeded(2024)).unwrap();
    service.initialize().unwrap();

    let log = ResponseLog::new();
    let draws = 10_000;
    for _ in 0..draws {
        assert!(service.try_show_ad(AdRequest::new(standard::REWARDED), log.callback()).unwrap());
    }

    assert_eq!(log.len(), draws);
    let share = log.count_for("net-a") as f64 / draws as f64;
    assert!((share - 0.7).abs() < 0.03, "net-a share was {share}");
    assert_eq!(log.count_for("net-a") + log.count_for("net-b"), draws);
}

#[test]
fn test_kinds_route_to_their_own_adapters() {
    init_tracing();
    let graph = standard_graph();
    let (provider, interstitial, rewarded) = full_provider(&graph, ProviderConfig::new("net").with_weight(1));
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();
    service.initialize().unwrap();

    let log = ResponseLog::new();
    service.try_show_ad(AdRequest::new(standard::INTERSTITIAL), log.callback()).unwrap();
    service.try_show_ad(AdRequest::new(standard::INTERSTITIAL), log.callback()).unwrap();
    service.try_show_ad(AdRequest::new(standard::REWARDED), log.callback()).unwrap();

    assert_show_count!(interstitial, 2);
    assert_show_count!(rewarded, 1);
    let adapters: Vec<String> = log
        .responses()
        .into_iter()
        .filter_map(|r| r.adapter_id)
        .collect();
    assert_eq!(adapters, vec!["net-interstitial", "net-interstitial", "net-rewarded"]);

    // Nothing here serves banners.
    assert!(!service.is_ad_ready(standard::BANNER));
    assert!(!service.try_show_ad(AdRequest::new(standard::BANNER), log.callback()).unwrap());
    assert!(!log.responses().last().unwrap().success);
}

#[test]
fn test_most_specific_adapter_wins_in_custom_graph() {
    let mut builder = KindGraph::standard_builder();
    let video = builder.capability("video", &[standard::INTERSTITIAL]).unwrap();
    let network_video = builder.concrete("network_video", None, &[video]).unwrap();
    let skippable = builder.concrete("skippable_video", Some(network_video), &[]).unwrap();
    let graph = Arc::new(builder.build());

    let generic = MockAdBackend::ready();
    let interstitial = MockAdBackend::ready();
    let concrete = MockAdBackend::ready();
    let mut provider = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("net").with_weight(1))
        .adapter(adapter(&graph, "generic", standard::AD, &generic))
        .adapter(adapter(&graph, "interstitial", standard::INTERSTITIAL, &interstitial))
        .adapter(adapter(&graph, "concrete", network_video, &concrete))
        .build()
        .unwrap();
    provider.initialize().unwrap();

    assert_eq!(provider.find_adapter(skippable).map(|a| a.id()), Some("concrete"));
    assert_eq!(provider.find_adapter(video).map(|a| a.id()), Some("interstitial"));
    assert_eq!(provider.find_adapter(standard::APP_OPEN).map(|a| a.id()), Some("generic"));

    provider.show_ad(&AdRequest::new(skippable), |_| {}).unwrap();
    assert_show_count!(concrete, 1);
    assert_show_count!(interstitial, 0);
}

#[test]
fn test_unready_provider_is_never_chosen() {
    let graph = standard_graph();
    let (a, a_inter, _) = full_provider(&graph, ProviderConfig::new("net-a").with_weight(90));
    let (b, b_inter, _) = full_provider(&graph, ProviderConfig::new("net-b").with_weight(10));
    a_inter.set_ready(false);
    let mut service = AdService::new([a, b], MediationSelector::seeded(8)).unwrap();
    service.initialize().unwrap();

    let log = ResponseLog::new();
    for _ in 0..50 {
        service.try_show_ad(AdRequest::new(standard::INTERSTITIAL), log.callback()).unwrap();
    }

    assert_eq!(log.count_for("net-b"), 50);
    assert_show_count!(a_inter, 0);
    assert_show_count!(b_inter, 50);

    b_inter.set_ready(false);
    assert!(!service.is_ad_ready(standard::INTERSTITIAL));
    assert!(!service.try_show_ad(AdRequest::new(standard::INTERSTITIAL), log.callback()).unwrap());
}

#[test]
fn test_zero_weight_providers_are_unavailable() {
    let graph = standard_graph();
    let (a, _, rewarded) = full_provider(&graph, ProviderConfig::new("net-a"));
    let mut service = AdService::new([a], MediationSelector::seeded(8)).unwrap();
    service.initialize().unwrap();

    let log = ResponseLog::new();
    let shown = service.try_show_ad(AdRequest::new(standard::REWARDED), log.callback()).unwrap();

    assert!(!shown);
    assert!(!service.is_ad_ready(standard::REWARDED));
    assert_show_count!(rewarded, 0);
    assert!(!log.responses()[0].success);
}

#[test]
fn test_lifecycle_is_idempotent_end_to_end() {
    let graph = standard_graph();
    let backend = MockAdBackend::ready();
    let hooks = MockHooks::new();
    let provider = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("net").with_weight(1))
        .adapter(adapter(&graph, "r", standard::REWARDED, &backend))
        .hooks(hooks.clone())
        .build()
        .unwrap();
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();

    service.initialize().unwrap();
    service.initialize().unwrap();
    assert_eq!(backend.init_calls(), 1);
    assert_eq!(hooks.initialized(), 1);
    assert!(service.is_ad_ready(standard::REWARDED));

    service.dispose();
    service.dispose();
    assert_eq!(backend.deinit_calls(), 1);
    assert_eq!(hooks.deinitialized(), 1);
    assert!(!service.is_initialized());
    assert!(!service.is_ad_ready(standard::REWARDED));
}

#[test]
fn test_events_detach_on_dispose() {
    let graph = standard_graph();
    let backend = MockAdBackend::ready().deferred();
    let provider = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("net").with_weight(1))
        .adapter(adapter(&graph, "r", standard::REWARDED, &backend))
        .build()
        .unwrap();
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();
    service.initialize().unwrap();

    let events = ResponseLog::new();
    service.on_ad_shown().subscribe(events.listener());
    let callbacks = ResponseLog::new();

    service.try_show_ad(AdRequest::new(standard::REWARDED), callbacks.callback()).unwrap();
    assert!(service.is_ad_showing(standard::REWARDED));
    assert!(service.is_any_ad_showing());
    assert_eq!(backend.complete_pending(true), 1);
    assert_eq!(events.len(), 1);
    assert_eq!(events.responses()[0].provider_id.as_deref(), Some("net"));

    service.try_show_ad(AdRequest::new(standard::REWARDED), callbacks.callback()).unwrap();
    service.dispose();
    assert_eq!(backend.complete_pending(true), 1);

    // The caller still hears back; the torn-down chain does not.
    assert_eq!(callbacks.len(), 2);
    assert_eq!(events.len(), 1);
}

#[test]
fn test_hide_reaches_showing_adapters() {
    let graph = standard_graph();
    let backend = MockAdBackend::ready().deferred();
    let provider = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("net").with_weight(1))
        .adapter(adapter(&graph, "i", standard::INTERSTITIAL, &backend))
        .build()
        .unwrap();
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();
    service.initialize().unwrap();

    service.try_show_ad(AdRequest::new(standard::INTERSTITIAL), |_| {}).unwrap();
    service.hide_ad(standard::REWARDED);
    assert_eq!(backend.hide_calls(), 0);

    service.hide_ad(standard::INTERSTITIAL);
    assert_eq!(backend.hide_calls(), 1);
    assert!(!service.is_any_ad_showing());
}

/// Provider with a deferred generic adapter and an interstitial adapter.
fn generic_and_interstitial(
    graph: &Arc<KindGraph>,
    selection: AdapterSelection,
) -> (AdProvider, MockAdBackend, MockAdBackend) {
    let generic = MockAdBackend::ready().deferred();
    let interstitial = MockAdBackend::ready();
    let config = ProviderConfig::new("net").with_weight(1).with_adapter_selection(selection);
    let mut provider = AdProvider::builder(Arc::clone(graph), config)
        .adapter(
            AdAdapter::new(Arc::clone(graph), standard::AD, AdapterConfig::new("generic").with_weight(1), generic.clone())
                .unwrap(),
        )
        .adapter(
            AdAdapter::new(
                Arc::clone(graph),
                standard::INTERSTITIAL,
                AdapterConfig::new("inter").with_weight(1),
                interstitial.clone(),
            )
            .unwrap(),
        )
        .selector(MediationSelector::seeded(5))
        .build()
        .unwrap();
    provider.initialize().unwrap();
    (provider, generic, interstitial)
}

#[test]
fn test_hide_spares_generic_adapter_busy_with_other_kind() {
    let graph = standard_graph();
    for selection in [AdapterSelection::Resolve, AdapterSelection::Weighted] {
        let (mut provider, generic, interstitial) = generic_and_interstitial(&graph, selection);

        assert!(provider.show_ad(&AdRequest::new(standard::REWARDED), |_| {}).unwrap());
        assert_eq!(generic.pending(), 1, "{selection:?}");
        assert!(provider.is_ad_showing(standard::REWARDED), "{selection:?}");
        assert!(!provider.is_ad_showing(standard::INTERSTITIAL), "{selection:?}");

        provider.hide_ad(standard::INTERSTITIAL);
        assert_eq!(generic.hide_calls(), 0, "{selection:?}");
        assert_eq!(interstitial.hide_calls(), 0, "{selection:?}");
        assert!(provider.is_any_ad_showing(), "{selection:?}");

        provider.hide_ad(standard::REWARDED);
        assert_eq!(generic.hide_calls(), 1, "{selection:?}");
        assert!(!provider.is_any_ad_showing(), "{selection:?}");
    }
}

#[test]
fn test_backend_failure_reaches_callback_and_event() {
    let graph = standard_graph();
    let backend = MockAdBackend::ready().failing_shows();
    let provider = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("net").with_weight(1))
        .adapter(adapter(&graph, "r", standard::REWARDED, &backend))
        .build()
        .unwrap();
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();
    service.initialize().unwrap();
    let events = ResponseLog::new();
    service.on_ad_shown().subscribe(events.listener());
    let callbacks = ResponseLog::new();

    let request = AdRequest::new(standard::REWARDED);
    let request_id = request.id;
    assert!(service.try_show_ad(request, callbacks.callback()).unwrap());

    assert_show_count!(backend, 1);
    for log in [&callbacks, &events] {
        let responses = log.responses();
        assert_eq!(responses.len(), 1);
        assert!(!responses[0].success);
        assert_eq!(responses[0].request_id, request_id);
        assert_eq!(responses[0].provider_id.as_deref(), Some("net"));
        assert_eq!(responses[0].adapter_id.as_deref(), Some("r"));
    }
}

#[test]
fn test_deferred_show_can_complete_with_failure() {
    let graph = standard_graph();
    let backend = MockAdBackend::ready().deferred();
    let provider = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("net").with_weight(1))
        .adapter(adapter(&graph, "i", standard::INTERSTITIAL, &backend))
        .build()
        .unwrap();
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();
    service.initialize().unwrap();
    let events = ResponseLog::new();
    service.on_ad_shown().subscribe(events.listener());
    let callbacks = ResponseLog::new();

    assert!(service.try_show_ad(AdRequest::new(standard::INTERSTITIAL), callbacks.callback()).unwrap());
    assert_eq!(backend.pending(), 1);
    assert!(callbacks.is_empty());

    assert_eq!(backend.complete_pending(false), 1);
    assert_eq!(backend.pending(), 0);
    assert!(!service.is_any_ad_showing());
    for log in [&callbacks, &events] {
        let responses = log.responses();
        assert_eq!(responses.len(), 1);
        assert!(!responses[0].success);
        assert_eq!(responses[0].provider_id.as_deref(), Some("net"));
        assert_eq!(responses[0].adapter_id.as_deref(), Some("i"));
    }
}

#[test]
fn test_disabled_status_suppresses_ads() {
    let graph = standard_graph();
    let (provider, _, rewarded) = full_provider(&graph, ProviderConfig::new("net").with_weight(1));
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();
    service.initialize().unwrap();

    let changes = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    service.on_status_changed().subscribe(move |status: &AdStatus| sink.lock().push(*status));

    service.set_status(AdStatus::Disabled);
    let log = ResponseLog::new();
    assert!(!service.try_show_ad(AdRequest::new(standard::REWARDED), log.callback()).unwrap());
    assert_show_count!(rewarded, 0);
    assert!(!service.is_ad_ready(standard::REWARDED));

    service.set_status(AdStatus::Enabled);
    assert!(service.try_show_ad(AdRequest::new(standard::REWARDED), log.callback()).unwrap());
    assert_eq!(*changes.lock(), vec![AdStatus::Disabled, AdStatus::Enabled]);
}

#[test]
fn test_failed_adapter_does_not_block_provider() {
    let graph = standard_graph();
    let broken = MockAdBackend::ready().failing_init();
    let healthy = MockAdBackend::ready();
    let provider = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("net").with_weight(1))
        .adapter(adapter(&graph, "broken", standard::REWARDED, &broken))
        .adapter(adapter(&graph, "healthy", standard::INTERSTITIAL, &healthy))
        .build()
        .unwrap();
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();

    service.initialize().unwrap();

    assert!(service.is_ad_ready(standard::INTERSTITIAL));
    assert!(!service.is_ad_ready(standard::REWARDED));
    assert_eq!(broken.init_calls(), 0);
}

#[test]
fn test_failed_provider_hook_keeps_service_up() {
    let graph = standard_graph();
    let refused = MockAdBackend::ready();
    let accepted = MockAdBackend::ready();
    let bad = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("bad").with_weight(50))
        .adapter(adapter(&graph, "r", standard::REWARDED, &refused))
        .hooks(MockHooks::failing())
        .build()
        .unwrap();
    let good = AdProvider::builder(Arc::clone(&graph), ProviderConfig::new("good").with_weight(50))
        .adapter(adapter(&graph, "r", standard::REWARDED, &accepted))
        .build()
        .unwrap();
    let mut service = AdService::new([bad, good], MediationSelector::seeded(4)).unwrap();

    service.initialize().unwrap();

    assert!(service.is_initialized());
    assert!(!service.provider("bad").unwrap().is_initialized());
    assert_eq!(refused.deinit_calls(), 1);

    let log = ResponseLog::new();
    for _ in 0..10 {
        service.try_show_ad(AdRequest::new(standard::REWARDED), log.callback()).unwrap();
    }
    assert_eq!(log.count_for("good"), 10);
}

#[test]
fn test_weighted_adapter_selection_inside_provider() {
    let graph = standard_graph();
    let heavy = MockAdBackend::ready();
    let light = MockAdBackend::ready();
    let config = ProviderConfig::new("net")
        .with_weight(1)
        .with_adapter_selection(AdapterSelection::Weighted);
    let mut provider = AdProvider::builder(Arc::clone(&graph), config)
        .adapter(
            AdAdapter::new(Arc::clone(&graph), standard::REWARDED, AdapterConfig::new("heavy").with_weight(3), heavy.clone())
                .unwrap(),
        )
        .adapter(
            AdAdapter::new(Arc::clone(&graph), standard::AD, AdapterConfig::new("light").with_weight(1), light.clone())
                .unwrap(),
        )
        .selector(MediationSelector::seeded(99))
        .build()
        .unwrap();
    provider.initialize().unwrap();

    for _ in 0..4_000 {
        provider.show_ad(&AdRequest::new(standard::REWARDED), |_| {}).unwrap();
    }

    let share = heavy.show_calls() as f64 / 4_000.0;
    assert!((share - 0.75).abs() < 0.03, "heavy share was {share}");
    assert_eq!(heavy.show_calls() + light.show_calls(), 4_000);
}

#[test]
fn test_dropping_service_disposes_providers() {
    let graph = standard_graph();
    let (provider, interstitial, rewarded) = full_provider(&graph, ProviderConfig::new("net").with_weight(1));
    let mut service = AdService::new([provider], MediationSelector::seeded(1)).unwrap();
    service.initialize().unwrap();

    drop(service);

    assert_eq!(interstitial.deinit_calls(), 1);
    assert_eq!(rewarded.deinit_calls(), 1);
}

#[test]
fn test_service_from_config_file() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("mediation.toml");
    std::fs::write(
        &path,
        r#"
seed = 77

[[providers]]
id = "net-a"
weight = 70

[[providers]]
id = "net-b"
weight = 30
"#,
    )
    .unwrap();

    let config: ServiceConfig = load_service_config(path.to_str().unwrap()).unwrap();
    let graph = standard_graph();
    let providers: Vec<AdProvider> = config
        .providers
        .iter()
        .map(|provider_config| full_provider(&graph, provider_config.clone()).0)
        .collect();
    let mut service = AdService::from_config(&config, providers).unwrap();
    service.initialize().unwrap();

    assert_eq!(service.status(), AdStatus::Enabled);
    assert_eq!(service.collect_ads(standard::REWARDED, 5).len(), 2);

    let log = ResponseLog::new();
    for _ in 0..2_000 {
        service.try_show_ad(AdRequest::new(standard::INTERSTITIAL), log.callback()).unwrap();
    }
    let share = log.count_for("net-a") as f64 / 2_000.0;
    assert!((share - 0.7).abs() < 0.05, "net-a share was {share}");
}
