#![allow(clippy::unwrap_used)]
// End-to-end sync cycles against in-process fakes.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ipnetwork::Ipv4Network;
use pretty_assertions::assert_eq;
use secrecy::SecretString;

use wrtfleet_core::ports::{
    AlertNotifier, LocalNetwork, RemoteShell, ReverseDns, RouterRegistry, VendorLookup,
};
use wrtfleet_core::{
    ArpEntry, ConnectionType, Controller, CoreError, Credentials, MacAddress, Manufacturer,
    Router, RouterId, RouterState, RouterStore, Services, ShellTarget, SyncConfig,
};

// ── Fakes ───────────────────────────────────────────────────────────

/// Canned diagnostic output per host; unknown hosts refuse connections.
#[derive(Default)]
struct FakeShell {
    outputs: Mutex<HashMap<String, String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeShell {
    fn set(&self, host: &str, output: String) {
        self.outputs.lock().unwrap().insert(host.to_owned(), output);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteShell for FakeShell {
    async fn run(
        &self,
        target: &ShellTarget,
        _command: &str,
        _ready_timeout: Duration,
    ) -> Result<String, wrtfleet_ssh::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let output = self.outputs.lock().unwrap().get(&target.host).cloned();
        output.ok_or_else(|| wrtfleet_ssh::Error::Connection {
            target: target.to_string(),
            reason: "Connection refused".into(),
        })
    }
}

#[derive(Default)]
struct FakeDns(HashMap<IpAddr, String>);

#[async_trait]
impl ReverseDns for FakeDns {
    async fn resolve(&self, ip: IpAddr) -> Option<String> {
        self.0.get(&ip).cloned()
    }
}

struct FakeVendors;

impl VendorLookup for FakeVendors {
    fn lookup(&self, mac: &MacAddress) -> Manufacturer {
        if mac.oui() == "11:22:33" {
            Manufacturer::Known("TP-Link".into())
        } else {
            Manufacturer::Generic
        }
    }
}

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<String>>);

impl RecordingNotifier {
    fn sent(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl AlertNotifier for RecordingNotifier {
    fn notify(&self, message: String) {
        self.0.lock().unwrap().push(message);
    }
}

#[derive(Default)]
struct FakeLan(Vec<ArpEntry>);

#[async_trait]
impl LocalNetwork for FakeLan {
    async fn neighbors(&self) -> Vec<ArpEntry> {
        self.0.clone()
    }

    async fn sweep(&self, _subnet: Ipv4Network) {}
}

// ── Harness ─────────────────────────────────────────────────────────

struct Fleet {
    store: Arc<RouterStore>,
    shell: Arc<FakeShell>,
    alerts: Arc<RecordingNotifier>,
    controller: Controller,
}

fn router(id: &str, address: &str, gateway: bool) -> Router {
    Router::new(
        id,
        address,
        "root",
        Credentials::Password(SecretString::from("pw".to_owned())),
    )
    .with_name(id.to_uppercase())
    .gateway(gateway)
}

fn fleet_with(shell: FakeShell, dns: FakeDns, lan: FakeLan) -> Fleet {
    let store = Arc::new(RouterStore::new());
    let shell = Arc::new(shell);
    let alerts = Arc::new(RecordingNotifier::default());
    let services = Services {
        registry: Arc::clone(&store) as Arc<dyn RouterRegistry>,
        names: Arc::clone(&store) as _,
        shell: Arc::clone(&shell) as _,
        dns: Arc::new(dns),
        vendors: Arc::new(FakeVendors),
        notifier: Arc::clone(&alerts) as _,
        local: Arc::new(lan),
    };
    let config = SyncConfig {
        sweep: false,
        ..SyncConfig::default()
    };
    Fleet {
        controller: Controller::new(config, services),
        store,
        shell,
        alerts,
    }
}

fn fleet() -> Fleet {
    fleet_with(FakeShell::default(), FakeDns::default(), FakeLan::default())
}

/// Diagnostic output with the given lease, ARP and assoclist lines.
fn diagnostics(leases: &[&str], arp: &[&str], assoc: &[&str]) -> String {
    format!(
        "---UPTIME---\n3600.5 7000.1\n\
         ---LOAD---\n0.10 0.20 0.30 1/80 1234\n\
         ---MEM---\nMemTotal: 1000 kB\nMemFree: 100 kB\nBuffers: 50 kB\nCached: 80 kB\n\
         ---LEASES---\n{}\n\
         ---ARP---\nIP address HW type Flags HW address Mask Device\n{}\n\
         ---WIFI---\n{}\n\
         ---WIFI_INFO_DETAIL---\nwlan0 ESSID: \"home\"\n Mode: Mesh Point\n",
        leases.join("\n"),
        arp.join("\n"),
        assoc.join("\n"),
    )
}

fn status_of(store: &RouterStore, id: &str) -> wrtfleet_core::RouterStatus {
    store.router(&RouterId::from(id)).unwrap().status.clone()
}

// ── Cross-router identity ───────────────────────────────────────────

#[tokio::test]
async fn test_peer_client_named_from_gateway_lease() {
    let f = fleet();
    f.store.add_router(router("a", "192.168.1.1", true)).unwrap();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.1",
        diagnostics(&["1700000000 aa:bb:cc:dd:ee:ff 192.168.1.50 phone *"], &[], &[]),
    );
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:FF  -52 dBm / -95 dBm (SNR 43)"]),
    );

    let report = f.controller.sync_all().await.unwrap();
    assert_eq!(report.online.len(), 2);
    assert!(report.offline.is_empty());

    let b = status_of(&f.store, "b");
    assert_eq!(b.state, RouterState::Online);
    assert_eq!(b.client_count, 1);
    let phone = &b.clients[0];
    assert_eq!(phone.mac, MacAddress::new("aa:bb:cc:dd:ee:ff"));
    assert_eq!(phone.name, "phone");
    assert_eq!(phone.ip, Some("192.168.1.50".parse().unwrap()));
    assert_eq!(phone.signal_dbm, Some(-52));
    assert_eq!(phone.connection, ConnectionType::Wireless);
    assert_eq!(b.radio.essid.as_deref(), Some("home"));
}

#[tokio::test]
async fn test_unnamed_client_falls_back_to_vendor() {
    let f = fleet();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["11:22:33:44:55:66  -70 dBm / -95 dBm"]),
    );

    f.controller.sync_all().await.unwrap();

    let client = &status_of(&f.store, "b").clients[0];
    assert_eq!(client.name, "TP-Link Device");
    assert_eq!(client.manufacturer, "TP-Link");
    assert_eq!(client.ip, None);
}

#[tokio::test]
async fn test_reverse_dns_and_persistent_names() {
    let dns = FakeDns(HashMap::from([(
        "192.168.1.77".parse().unwrap(),
        "laptop".to_owned(),
    )]));
    let f = fleet_with(FakeShell::default(), dns, FakeLan::default());
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.2",
        diagnostics(
            &[],
            &[
                "192.168.1.77 0x1 0x2 de:ad:be:ef:00:01 * br-lan",
                "192.168.1.78 0x1 0x2 de:ad:be:ef:00:02 * br-lan",
            ],
            &[
                "DE:AD:BE:EF:00:01  -60 dBm / -95 dBm",
                "DE:AD:BE:EF:00:02  -61 dBm / -95 dBm",
            ],
        ),
    );
    f.store
        .rename_client(&MacAddress::new("de:ad:be:ef:00:02"), "Kitchen tablet");

    f.controller.sync_all().await.unwrap();

    let clients = status_of(&f.store, "b").clients;
    assert_eq!(clients[0].name, "laptop");
    assert_eq!(clients[1].name, "Kitchen tablet");
    assert_eq!(clients[1].ip, Some("192.168.1.78".parse().unwrap()));
}

#[tokio::test]
async fn test_local_neighbors_supply_addresses() {
    let lan = FakeLan(vec![ArpEntry {
        mac: MacAddress::new("aa:bb:cc:dd:ee:01"),
        ip: "192.168.1.90".parse().unwrap(),
    }]);
    let f = fleet_with(FakeShell::default(), FakeDns::default(), lan);
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:01  -40 dBm"]),
    );

    let report = f.controller.sync_all().await.unwrap();
    assert_eq!(report.identities, 1);

    let client = &status_of(&f.store, "b").clients[0];
    assert_eq!(client.ip, Some("192.168.1.90".parse().unwrap()));
    assert_eq!(client.name, "Unknown Device");
}

// ── Failure isolation ───────────────────────────────────────────────

#[tokio::test]
async fn test_unreachable_router_goes_offline_alone() {
    let f = fleet();
    f.store.add_router(router("a", "192.168.1.1", true)).unwrap();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.1",
        diagnostics(&["1700000000 aa:bb:cc:dd:ee:ff 192.168.1.50 phone *"], &[], &[]),
    );

    let report = f.controller.sync_all().await.unwrap();
    assert_eq!(report.online, vec![RouterId::from("a")]);
    assert_eq!(report.offline.len(), 1);
    assert_eq!(report.offline[0].router, RouterId::from("b"));

    let a = status_of(&f.store, "a");
    assert_eq!(a.state, RouterState::Online);
    assert_eq!(a.clients.len(), 1);

    let b = status_of(&f.store, "b");
    assert_eq!(b.state, RouterState::Offline);
    assert!(b.last_failure.is_some());
    assert!(b.last_error.unwrap().contains("Connection refused"));
}

#[tokio::test]
async fn test_offline_router_keeps_previous_clients() {
    let f = fleet();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:01  -40 dBm"]),
    );
    f.controller.sync_all().await.unwrap();

    f.shell.outputs.lock().unwrap().clear();
    f.controller.sync_all().await.unwrap();

    let b = status_of(&f.store, "b");
    assert_eq!(b.state, RouterState::Offline);
    assert_eq!(b.client_count, 1);
    assert!(b.last_seen.is_some());
}

// ── New-client alerts ───────────────────────────────────────────────

#[tokio::test]
async fn test_new_client_alerts_once_after_first_cycle() {
    let f = fleet();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:01  -40 dBm"]),
    );

    let first = f.controller.sync_all().await.unwrap();
    assert_eq!(first.new_clients, 0);

    f.shell.set(
        "192.168.1.2",
        diagnostics(
            &[],
            &[],
            &["AA:BB:CC:DD:EE:01  -40 dBm", "11:22:33:44:55:66  -55 dBm"],
        ),
    );
    let second = f.controller.sync_all().await.unwrap();
    assert_eq!(second.new_clients, 1);

    let third = f.controller.sync_all().await.unwrap();
    assert_eq!(third.new_clients, 0);

    let sent = f.alerts.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("*B*"));
    assert!(sent[0].contains("TP-Link Device"));
    assert!(sent[0].contains("11:22:33:44:55:66"));
}

#[tokio::test]
async fn test_no_alerts_on_recovery_cycle() {
    let f = fleet();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    let output = diagnostics(&[], &[], &["AA:BB:CC:DD:EE:01  -40 dBm"]);
    f.shell.set("192.168.1.2", output);
    f.controller.sync_all().await.unwrap();

    f.shell.outputs.lock().unwrap().clear();
    f.controller.sync_all().await.unwrap();

    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:02  -40 dBm"]),
    );
    let report = f.controller.sync_all().await.unwrap();
    assert_eq!(report.new_clients, 0);
    assert!(f.alerts.sent().is_empty());
}

#[tokio::test]
async fn test_status_check_keeps_fleet_names_and_pending_alerts() {
    let f = fleet();
    f.store.add_router(router("a", "192.168.1.1", true)).unwrap();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    let lease = "1700000000 aa:bb:cc:dd:ee:ff 192.168.1.50 phone *";
    f.shell.set("192.168.1.1", diagnostics(&[lease], &[], &[]));
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:FF  -52 dBm"]),
    );
    f.controller.sync_all().await.unwrap();

    f.shell.set(
        "192.168.1.2",
        diagnostics(
            &[],
            &[],
            &["AA:BB:CC:DD:EE:FF  -52 dBm", "11:22:33:44:55:66  -55 dBm"],
        ),
    );
    let state = f.controller.check_status(&RouterId::from("b")).await.unwrap();
    assert_eq!(state, RouterState::Online);

    let b = status_of(&f.store, "b");
    assert_eq!(b.clients.len(), 1);
    assert_eq!(b.clients[0].name, "phone");

    let report = f.controller.sync_all().await.unwrap();
    assert_eq!(report.new_clients, 1);
    assert_eq!(f.alerts.sent().len(), 1);
    assert_eq!(status_of(&f.store, "b").clients[0].name, "phone");
}

#[tokio::test]
async fn test_status_check_after_outage_does_not_alert() {
    let f = fleet();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:01  -40 dBm"]),
    );
    f.controller.sync_all().await.unwrap();

    f.shell.outputs.lock().unwrap().clear();
    f.controller.sync_all().await.unwrap();

    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:02  -40 dBm"]),
    );
    f.controller.check_status(&RouterId::from("b")).await.unwrap();
    let report = f.controller.sync_all().await.unwrap();
    assert_eq!(report.new_clients, 0);
    assert!(f.alerts.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_status_check_waits_for_running_sync() {
    let shell = FakeShell {
        delay: Some(Duration::from_secs(2)),
        ..FakeShell::default()
    };
    let f = fleet_with(shell, FakeDns::default(), FakeLan::default());
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:01  -40 dBm"]),
    );

    let id = RouterId::from("b");
    let (sync, check) = tokio::join!(f.controller.sync_all(), async {
        tokio::task::yield_now().await;
        f.controller.check_status(&id).await
    });
    assert!(sync.is_ok());
    assert_eq!(check.unwrap(), RouterState::Online);
    assert_eq!(f.shell.calls(), 2);
    assert_eq!(status_of(&f.store, "b").client_count, 1);
}

// ── Concurrency and lifecycle ───────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_overlapping_sync_is_rejected() {
    let shell = FakeShell {
        delay: Some(Duration::from_secs(2)),
        ..FakeShell::default()
    };
    let f = fleet_with(shell, FakeDns::default(), FakeLan::default());
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set("192.168.1.2", diagnostics(&[], &[], &[]));

    let (first, second) = tokio::join!(f.controller.sync_all(), f.controller.sync_all());
    assert!(first.is_ok());
    assert!(matches!(second, Err(CoreError::SyncInProgress)));

    // The lock is released once the cycle ends.
    assert!(f.controller.sync_all().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_register_router_checks_then_syncs() {
    let f = fleet();
    f.shell.set(
        "192.168.1.2",
        diagnostics(&[], &[], &["AA:BB:CC:DD:EE:01  -40 dBm"]),
    );

    let state = f
        .controller
        .register_router(router("b", "192.168.1.2", false))
        .await
        .unwrap();
    assert_eq!(state, RouterState::Online);
    assert_eq!(f.shell.calls(), 1);
    let checked = status_of(&f.store, "b");
    assert_eq!(checked.radio.essid.as_deref(), Some("home"));
    assert_eq!(checked.client_count, 0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(f.shell.calls(), 2);
    // The first full sync fills the list without alerting.
    assert_eq!(status_of(&f.store, "b").client_count, 1);
    assert!(f.alerts.sent().is_empty());

    let dup = f
        .controller
        .register_router(router("b", "192.168.1.2", false))
        .await;
    assert!(matches!(dup, Err(CoreError::RouterExists { .. })));

    f.controller.shutdown().await;
}

#[tokio::test]
async fn test_register_unreachable_router_reports_offline() {
    let f = fleet();
    let state = f
        .controller
        .register_router(router("b", "192.168.1.9", false))
        .await
        .unwrap();
    assert_eq!(state, RouterState::Offline);
    assert_eq!(status_of(&f.store, "b").state, RouterState::Offline);
    f.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_periodic_sync_runs_until_shutdown() {
    let f = fleet();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set("192.168.1.2", diagnostics(&[], &[], &[]));

    f.controller.start().await;
    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(f.shell.calls(), 2);

    f.controller.shutdown().await;
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(f.shell.calls(), 2);
}

// ── Single-router operations ────────────────────────────────────────

#[tokio::test]
async fn test_fetch_stats_and_unknown_router() {
    let f = fleet();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set("192.168.1.2", diagnostics(&[], &[], &[]));

    let snapshot = f.controller.fetch_stats(&RouterId::from("b")).await.unwrap();
    assert!((snapshot.uptime_secs - 3600.5).abs() < f64::EPSILON);
    assert_eq!(snapshot.memory.percent, 77);
    // Stats never touch stored status.
    assert_eq!(status_of(&f.store, "b").state, RouterState::Unknown);

    let missing = f.controller.fetch_stats(&RouterId::from("zz")).await;
    assert!(matches!(missing, Err(CoreError::RouterNotFound { .. })));
}

#[tokio::test]
async fn test_run_on_all_isolates_failures() {
    let f = fleet();
    f.store.add_router(router("a", "192.168.1.1", true)).unwrap();
    f.store.add_router(router("b", "192.168.1.2", false)).unwrap();
    f.shell.set("192.168.1.1", "ok".into());

    let outcomes = f.controller.run_on_all("uptime").await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].output.as_deref(), Some("ok"));
    assert!(!outcomes[1].is_success());
    assert!(outcomes[1].error.as_deref().unwrap().contains("refused"));
}

#[tokio::test]
async fn test_reboot_reaches_router() {
    let f = fleet();
    f.store.add_router(router("a", "192.168.1.1", true)).unwrap();
    f.shell.set("192.168.1.1", String::new());
    f.controller.reboot(&RouterId::from("a")).await.unwrap();
    assert_eq!(f.shell.calls(), 1);
}
