// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end sync against mocked Caddy, OPNsense Unbound and AdGuard Home.
//!
//! The Unbound and AdGuard mocks keep state between requests, so a second run
//! sees what the first one wrote.
//!
//! Run with: cargo test --test sync_integration

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use unbound_sync::api::adguard::{AdguardClient, Rewrite};
use unbound_sync::api::caddy::CaddyClient;
use unbound_sync::api::unbound::{HostOverride, UnboundClient};
use unbound_sync::config::{AdguardSettings, UnboundSettings};
use unbound_sync::reconcilers::{
    unified_sync, AdguardTarget, DnsTarget, SyncOptions, UnboundTarget, UnifiedSyncResult,
};
use unbound_sync::source::caddy::CaddySource;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const MARKER: &str = "Entry created by unboundCLI caddy-sync-all";
const LEGACY: &str = "Route via Caddy";

// ============================================================================
// Stateful OPNsense Unbound
// ============================================================================

#[derive(Clone, Default)]
struct UnboundState {
    overrides: Arc<Mutex<Vec<HostOverride>>>,
    next_id: Arc<Mutex<u32>>,
}

impl UnboundState {
    fn seed(&self, host: &str, domain: &str, server: &str, description: &str) {
        let mut entry = HostOverride::new(host, domain, server, description);
        entry.uuid = format!("seed-{host}");
        self.overrides.lock().unwrap().push(entry);
    }

    fn fqdns(&self) -> Vec<(String, String, String)> {
        let mut all: Vec<_> = self
            .overrides
            .lock()
            .unwrap()
            .iter()
            .map(|o| (o.fqdn(), o.server.clone(), o.description.clone()))
            .collect();
        all.sort();
        all
    }
}

fn host_from_body(request: &Request) -> HostOverride {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    serde_json::from_value(body["host"].clone()).unwrap()
}

fn uuid_from_path(request: &Request) -> String {
    request.url.path().rsplit('/').next().unwrap().to_string()
}

struct SearchOverrides(UnboundState);

impl Respond for SearchOverrides {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let rows = self.0.overrides.lock().unwrap().clone();
        ResponseTemplate::new(200).set_body_json(json!({ "rows": rows }))
    }
}

struct AddOverride(UnboundState);

impl Respond for AddOverride {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut entry = host_from_body(request);
        let mut next = self.0.next_id.lock().unwrap();
        *next += 1;
        entry.uuid = format!("new-{next}");
        let uuid = entry.uuid.clone();
        self.0.overrides.lock().unwrap().push(entry);
        ResponseTemplate::new(200).set_body_json(json!({ "result": "saved", "uuid": uuid }))
    }
}

struct SetOverride(UnboundState);

impl Respond for SetOverride {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let uuid = uuid_from_path(request);
        let update = host_from_body(request);
        let mut overrides = self.0.overrides.lock().unwrap();
        match overrides.iter_mut().find(|o| o.uuid == uuid) {
            Some(existing) => {
                *existing = HostOverride { uuid, ..update };
                ResponseTemplate::new(200).set_body_json(json!({ "result": "saved" }))
            }
            None => ResponseTemplate::new(200).set_body_json(json!({ "result": "failed" })),
        }
    }
}

struct DelOverride(UnboundState);

impl Respond for DelOverride {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let uuid = uuid_from_path(request);
        self.0.overrides.lock().unwrap().retain(|o| o.uuid != uuid);
        ResponseTemplate::new(200).set_body_json(json!({ "result": "deleted" }))
    }
}

async fn mount_unbound(server: &MockServer, state: &UnboundState, reconfigures: u64) {
    Mock::given(method("GET"))
        .and(path("/api/unbound/settings/searchHostOverride"))
        .respond_with(SearchOverrides(state.clone()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/unbound/settings/addHostOverride"))
        .respond_with(AddOverride(state.clone()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/unbound/settings/setHostOverride/.+$"))
        .respond_with(SetOverride(state.clone()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/unbound/settings/delHostOverride/.+$"))
        .respond_with(DelOverride(state.clone()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/unbound/service/reconfigure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(reconfigures)
        .mount(server)
        .await;
}

// ============================================================================
// Stateful AdGuard Home
// ============================================================================

#[derive(Clone, Default)]
struct AdguardState {
    rewrites: Arc<Mutex<Vec<Rewrite>>>,
}

impl AdguardState {
    fn seed(&self, domain: &str, answer: &str) {
        self.rewrites.lock().unwrap().push(Rewrite::new(domain, answer));
    }

    fn sorted(&self) -> Vec<(String, String)> {
        let mut all: Vec<_> = self
            .rewrites
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.domain.clone(), r.answer.clone()))
            .collect();
        all.sort();
        all
    }
}

struct RewriteList(AdguardState);

impl Respond for RewriteList {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let rewrites = self.0.rewrites.lock().unwrap().clone();
        ResponseTemplate::new(200).set_body_json(rewrites)
    }
}

struct RewriteAdd(AdguardState);

impl Respond for RewriteAdd {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let rewrite: Rewrite = serde_json::from_slice(&request.body).unwrap();
        self.0.rewrites.lock().unwrap().push(rewrite);
        ResponseTemplate::new(200)
    }
}

struct RewriteUpdate(AdguardState);

impl Respond for RewriteUpdate {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let target: Rewrite = serde_json::from_value(body["target"].clone()).unwrap();
        let update: Rewrite = serde_json::from_value(body["update"].clone()).unwrap();
        let mut rewrites = self.0.rewrites.lock().unwrap();
        if let Some(existing) = rewrites.iter_mut().find(|r| **r == target) {
            *existing = update;
        }
        ResponseTemplate::new(200)
    }
}

struct RewriteDelete(AdguardState);

impl Respond for RewriteDelete {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let rewrite: Rewrite = serde_json::from_slice(&request.body).unwrap();
        self.0.rewrites.lock().unwrap().retain(|r| *r != rewrite);
        ResponseTemplate::new(200)
    }
}

async fn mount_adguard(server: &MockServer, state: &AdguardState) {
    Mock::given(method("GET"))
        .and(path("/control/rewrite/list"))
        .respond_with(RewriteList(state.clone()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/control/rewrite/add"))
        .respond_with(RewriteAdd(state.clone()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/control/rewrite/update"))
        .respond_with(RewriteUpdate(state.clone()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/control/rewrite/delete"))
        .respond_with(RewriteDelete(state.clone()))
        .mount(server)
        .await;
}

// ============================================================================
// Caddy
// ============================================================================

async fn mount_caddy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apps": { "http": { "servers": {
                "srv0": { "routes": [
                    { "match": [{ "host": ["svc.example.com", "grafana.example.com"] }] },
                    { "match": [{ "host": ["*.example.com"] }] },
                    { "handle": [{ "handler": "subroute", "routes": [
                        { "match": [{ "host": ["git.example.com:443"] }] }
                    ] }] }
                ] }
            } } }
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Harness
// ============================================================================

struct Lab {
    caddy: MockServer,
    unbound: MockServer,
    adguard: MockServer,
    unbound_state: UnboundState,
    adguard_state: AdguardState,
}

impl Lab {
    async fn start() -> Self {
        let lab = Self {
            caddy: MockServer::start().await,
            unbound: MockServer::start().await,
            adguard: MockServer::start().await,
            unbound_state: UnboundState::default(),
            adguard_state: AdguardState::default(),
        };
        mount_caddy(&lab.caddy).await;
        mount_adguard(&lab.adguard, &lab.adguard_state).await;
        lab
    }

    fn proxy(&self) -> String {
        self.caddy.address().ip().to_string()
    }

    fn source(&self) -> CaddySource {
        let address = self.caddy.address();
        CaddySource::new(CaddyClient::new(&address.ip().to_string(), address.port()).unwrap())
    }

    fn targets(&self) -> Vec<Box<dyn DnsTarget>> {
        let unbound = UnboundClient::new(&UnboundSettings {
            api_key: "key".into(),
            api_secret: "secret".into(),
            base_url: self.unbound.uri(),
            insecure: false,
        })
        .unwrap();
        let adguard = AdguardClient::new(&AdguardSettings {
            enabled: true,
            base_url: self.adguard.uri(),
            username: "admin".into(),
            password: "secret".into(),
            insecure: false,
        })
        .unwrap();
        vec![
            Box::new(UnboundTarget::new(unbound)),
            Box::new(AdguardTarget::new(adguard, self.proxy())),
        ]
    }

    async fn sync(&self, options: &SyncOptions) -> UnifiedSyncResult {
        unified_sync(&self.source(), &self.targets(), options)
            .await
            .unwrap()
    }
}

fn options() -> SyncOptions {
    SyncOptions {
        legacy_markers: vec![LEGACY.to_string()],
        ..SyncOptions::new(MARKER)
    }
}

fn plan_sizes(result: &UnifiedSyncResult) -> Vec<(String, usize, usize, usize, usize)> {
    result
        .targets
        .iter()
        .map(|t| {
            let r = t.outcome.as_ref().unwrap();
            (
                t.name.clone(),
                r.plan.to_add.len(),
                r.plan.to_update.len(),
                r.plan.to_update_marker.len(),
                r.plan.to_remove.len(),
            )
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_unified_sync_converges_and_is_idempotent() {
    let lab = Lab::start().await;
    let proxy = lab.proxy();
    // Exactly one reconfigure: after the first run. The second run has nothing to activate.
    mount_unbound(&lab.unbound, &lab.unbound_state, 1).await;

    lab.unbound_state.seed("nas", "example.com", "10.0.0.9", "manual");
    lab.unbound_state.seed("svc", "example.com", &proxy, LEGACY);
    lab.unbound_state.seed("old", "example.com", &proxy, LEGACY);
    lab.adguard_state.seed("svc.example.com", &proxy);
    lab.adguard_state.seed("tv.example.com", "10.0.0.4");
    lab.adguard_state.seed("git.example.com", "10.0.0.7");

    let first = lab.sync(&options()).await;
    assert!(first.error.is_none());
    assert_eq!(first.mapping.len(), 3);
    assert_eq!(
        plan_sizes(&first),
        vec![
            ("Unbound".to_string(), 2, 0, 1, 1),
            // git.example.com answers elsewhere: a foreign rewrite, left alone
            ("AdGuard Home".to_string(), 1, 0, 0, 0),
        ]
    );
    for target in &first.targets {
        let applied = target.outcome.as_ref().unwrap().applied.as_ref().unwrap();
        assert_eq!(applied.failures().count(), 0, "{} had failures", target.name);
    }

    assert_eq!(
        lab.unbound_state.fqdns(),
        vec![
            ("git.example.com".to_string(), proxy.clone(), MARKER.to_string()),
            ("grafana.example.com".to_string(), proxy.clone(), MARKER.to_string()),
            ("nas.example.com".to_string(), "10.0.0.9".to_string(), "manual".to_string()),
            ("svc.example.com".to_string(), proxy.clone(), MARKER.to_string()),
        ]
    );
    assert_eq!(
        lab.adguard_state.sorted(),
        vec![
            ("git.example.com".to_string(), "10.0.0.7".to_string()),
            ("grafana.example.com".to_string(), proxy.clone()),
            ("svc.example.com".to_string(), proxy.clone()),
            ("tv.example.com".to_string(), "10.0.0.4".to_string()),
        ]
    );

    let second = lab.sync(&options()).await;
    assert!(second.error.is_none());
    assert_eq!(
        plan_sizes(&second),
        vec![
            ("Unbound".to_string(), 0, 0, 0, 0),
            ("AdGuard Home".to_string(), 0, 0, 0, 0),
        ]
    );
    for target in &second.targets {
        assert!(!target.outcome.as_ref().unwrap().changes_applied());
    }
}

#[tokio::test]
async fn test_dry_run_leaves_systems_untouched() {
    let lab = Lab::start().await;
    let proxy = lab.proxy();
    mount_unbound(&lab.unbound, &lab.unbound_state, 0).await;
    lab.unbound_state.seed("old", "example.com", &proxy, LEGACY);

    let options = SyncOptions {
        dry_run: true,
        ..options()
    };
    let result = lab.sync(&options).await;

    assert_eq!(
        plan_sizes(&result),
        vec![
            ("Unbound".to_string(), 3, 0, 0, 1),
            ("AdGuard Home".to_string(), 3, 0, 0, 0),
        ]
    );
    assert!(result.targets.iter().all(|t| t.outcome.as_ref().unwrap().is_dry_run()));
    assert_eq!(lab.unbound_state.fqdns().len(), 1);
    assert!(lab.adguard_state.sorted().is_empty());
}

#[tokio::test]
async fn test_unreachable_target_does_not_block_the_other() {
    let lab = Lab::start().await;
    // No Unbound mocks mounted: every resolver call answers 404
    let result = lab.sync(&options()).await;

    assert!(result.error.is_none());
    assert_eq!(result.failures().count(), 1);
    assert_eq!(result.failures().next().unwrap().0, "Unbound");
    assert_eq!(lab.adguard_state.sorted().len(), 3);
}
