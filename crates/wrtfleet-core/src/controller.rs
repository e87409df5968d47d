// ── Sync orchestrator ──
//
// Drives collection, identity resolution and enrichment across the whole
// fleet: periodically, on demand, and right after a router is registered.
// Per-router failures are recorded on that router and never abort a cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use ipnetwork::Ipv4Network;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wrtfleet_ssh::{SshShell, TransportConfig};

use crate::adapters::{LogNotifier, OuiTable, SystemDns, SystemNetwork};
use crate::collector;
use crate::config::SyncConfig;
use crate::enrich::{Enricher, new_client_alert, new_clients};
use crate::error::CoreError;
use crate::fleet::{self, CommandOutcome};
use crate::model::{Client, Router, RouterId, RouterState, Snapshot, StatusUpdate};
use crate::ports::{
    AlertNotifier, LocalNetwork, NameRegistry, RemoteShell, ReverseDns, RouterRegistry,
    VendorLookup,
};
use crate::resolver::{self, Contribution};
use crate::store::RouterStore;

// ── Services ─────────────────────────────────────────────────────

/// The collaborators a [`Controller`] works through.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<dyn RouterRegistry>,
    pub names: Arc<dyn NameRegistry>,
    pub shell: Arc<dyn RemoteShell>,
    pub dns: Arc<dyn ReverseDns>,
    pub vendors: Arc<dyn VendorLookup>,
    pub notifier: Arc<dyn AlertNotifier>,
    pub local: Arc<dyn LocalNetwork>,
}

impl Services {
    /// Production wiring around a [`RouterStore`]: SSH, system resolver,
    /// built-in OUI table, host neighbor table, and log-only alerts.
    pub fn system(store: Arc<RouterStore>, config: &SyncConfig) -> Self {
        let transport = TransportConfig::default().with_connect_timeout(config.ready_timeout);
        Self {
            registry: Arc::clone(&store) as Arc<dyn RouterRegistry>,
            names: store,
            shell: Arc::new(SshShell::new(transport)),
            dns: Arc::new(SystemDns::new(config.dns_timeout)),
            vendors: Arc::new(OuiTable),
            notifier: Arc::new(LogNotifier),
            local: Arc::new(SystemNetwork),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn AlertNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    fn enricher(&self) -> Enricher<'_> {
        Enricher {
            names: self.names.as_ref(),
            dns: self.dns.as_ref(),
            vendors: self.vendors.as_ref(),
        }
    }
}

// ── Reports ──────────────────────────────────────────────────────

/// A router that could not be polled this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterFailure {
    pub router: RouterId,
    pub error: String,
}

/// Outcome of one [`Controller::sync_all`] cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub online: Vec<RouterId>,
    pub offline: Vec<RouterFailure>,
    /// Distinct MACs in this cycle's identity map.
    pub identities: usize,
    /// Alerts raised for newly joined clients.
    pub new_clients: usize,
}

// ── Controller ───────────────────────────────────────────────────

/// The fleet sync orchestrator.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Call [`start()`](Self::start)
/// to run `sync_all` on the configured interval, [`shutdown()`](Self::shutdown)
/// to stop background work.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: SyncConfig,
    services: Services,
    /// Held by `sync_all` and `check_status`; status writers never overlap.
    sync_lock: Mutex<()>,
    sweeping: AtomicBool,
    cancel: CancellationToken,
    /// The periodic sync task, once started.
    periodic: Mutex<Option<JoinHandle<()>>>,
    /// One-shot work such as post-registration syncs.
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    pub fn new(config: SyncConfig, services: Services) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                config,
                services,
                sync_lock: Mutex::new(()),
                sweeping: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                periodic: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    // ── Full sync ────────────────────────────────────────────────

    /// Poll every router, resolve identities across the fleet, and write
    /// each router's status and client list.
    ///
    /// Returns [`CoreError::SyncInProgress`] if another cycle is running.
    pub async fn sync_all(&self) -> Result<SyncReport, CoreError> {
        let Ok(_cycle) = self.inner.sync_lock.try_lock() else {
            return Err(CoreError::SyncInProgress);
        };
        let services = &self.inner.services;
        let routers = services.registry.list_routers().await?;
        debug!(routers = routers.len(), "sync cycle starting");

        self.spawn_sweep(&routers);

        let (local, polls) = tokio::join!(
            services.local.neighbors(),
            join_all(routers.iter().map(|router| self.collect(router)))
        );

        let mut report = SyncReport::default();
        let mut reachable: Vec<(&Router, Snapshot)> = Vec::new();
        for (router, poll) in routers.iter().zip(polls) {
            match poll {
                Ok(snapshot) => reachable.push((router, snapshot)),
                Err(e) => {
                    if e.is_connectivity() {
                        warn!(router = %router.id, error = %e, "router unreachable");
                    } else {
                        warn!(router = %router.id, error = %e, "diagnostics failed");
                    }
                    self.write_status(router, StatusUpdate::offline(Utc::now(), e.to_string()))
                        .await;
                    report.offline.push(RouterFailure {
                        router: router.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let contributions: Vec<Contribution<'_>> = reachable
            .iter()
            .map(|(router, snapshot)| Contribution {
                router: &router.id,
                is_gateway: router.is_gateway,
                snapshot,
            })
            .collect();
        let identities = resolver::resolve(&local, &contributions);
        report.identities = identities.len();

        let enricher = services.enricher();
        let client_lists = join_all(
            reachable
                .iter()
                .map(|(_, snapshot)| enricher.clients(snapshot, &identities)),
        )
        .await;

        for ((router, snapshot), clients) in reachable.iter().zip(client_lists) {
            report.new_clients += self.alert_new_clients(router, &clients);
            let update = StatusUpdate::online(Utc::now())
                .with_radio(&snapshot.radio)
                .with_clients(clients);
            self.write_status(router, update).await;
            report.online.push(router.id.clone());
        }

        info!(
            online = report.online.len(),
            offline = report.offline.len(),
            identities = report.identities,
            new_clients = report.new_clients,
            "sync cycle complete"
        );
        Ok(report)
    }

    // ── Single-router operations ─────────────────────────────────

    /// Poll one router and record its reachability and radio identity.
    ///
    /// The stored client list is left alone; only a full sync rebuilds it.
    /// Waits for a running cycle to finish so each router has one writer.
    pub async fn check_status(&self, id: &RouterId) -> Result<RouterState, CoreError> {
        let services = &self.inner.services;
        let router = services.registry.get_router(id).await?;
        let _guard = self.inner.sync_lock.lock().await;

        match self.collect(&router).await {
            Ok(snapshot) => {
                let update = StatusUpdate::online(Utc::now()).with_radio(&snapshot.radio);
                services.registry.update_status(id, update).await?;
                Ok(RouterState::Online)
            }
            Err(e) => {
                warn!(router = %id, error = %e, "status check failed");
                services
                    .registry
                    .update_status(id, StatusUpdate::offline(Utc::now(), e.to_string()))
                    .await?;
                Ok(RouterState::Offline)
            }
        }
    }

    /// Fresh diagnostics for one router. Does not touch its stored status.
    pub async fn fetch_stats(&self, id: &RouterId) -> Result<Snapshot, CoreError> {
        let router = self.inner.services.registry.get_router(id).await?;
        Ok(self.collect(&router).await?)
    }

    /// Reboot one router. A session dropped mid-command counts as success.
    pub async fn reboot(&self, id: &RouterId) -> Result<(), CoreError> {
        let services = &self.inner.services;
        let router = services.registry.get_router(id).await?;
        let result = services
            .shell
            .run(&router.shell_target(), "reboot", self.inner.config.ready_timeout)
            .await;
        match result {
            Ok(_) | Err(wrtfleet_ssh::Error::NoExitStatus) => {
                info!(router = %id, "reboot issued");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run `command` on every router with bounded concurrency.
    pub async fn run_on_all(&self, command: &str) -> Result<Vec<CommandOutcome>, CoreError> {
        self.run_on_all_with_limit(command, self.inner.config.command_concurrency)
            .await
    }

    pub async fn run_on_all_with_limit(
        &self,
        command: &str,
        limit: usize,
    ) -> Result<Vec<CommandOutcome>, CoreError> {
        let services = &self.inner.services;
        let routers = services.registry.list_routers().await?;
        Ok(fleet::run_on_many(
            services.shell.as_ref(),
            &routers,
            command,
            limit,
            self.inner.config.ready_timeout,
        )
        .await)
    }

    /// Add a router, check it right away, and schedule a full sync so its
    /// clients pick up fleet-wide identities.
    pub async fn register_router(&self, router: Router) -> Result<RouterState, CoreError> {
        let id = router.id.clone();
        self.inner.services.registry.add_router(router).await?;
        let state = self.check_status(&id).await?;
        info!(router = %id, %state, "router registered");

        let ctrl = self.clone();
        let delay = self.inner.config.register_sync_delay;
        let cancel = self.inner.cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => match ctrl.sync_all().await {
                    Ok(_) => {}
                    Err(CoreError::SyncInProgress) => debug!("post-registration sync skipped: cycle running"),
                    Err(e) => warn!(error = %e, "post-registration sync failed"),
                },
            }
        });
        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);

        Ok(state)
    }

    // ── Background lifecycle ─────────────────────────────────────

    /// Spawn the periodic sync task. A zero interval spawns nothing.
    pub async fn start(&self) {
        let interval = self.inner.config.interval;
        if interval.is_zero() {
            debug!("periodic sync disabled");
            return;
        }
        let mut periodic = self.inner.periodic.lock().await;
        if periodic.is_some() {
            return;
        }
        let ctrl = self.clone();
        let cancel = self.inner.cancel.clone();
        *periodic = Some(tokio::spawn(sync_task(ctrl, interval, cancel)));
    }

    /// Wait for pending one-shot work, such as the sync scheduled by
    /// [`register_router`](Self::register_router), without cancelling it.
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.inner.task_handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Cancel background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let periodic = self.inner.periodic.lock().await.take();
        if let Some(handle) = periodic {
            let _ = handle.await;
        }
        self.settle().await;
        debug!("controller stopped");
    }

    // ── Internals ────────────────────────────────────────────────

    async fn collect(&self, router: &Router) -> Result<Snapshot, wrtfleet_ssh::Error> {
        collector::collect(
            self.inner.services.shell.as_ref(),
            router,
            self.inner.config.ready_timeout,
        )
        .await
    }

    async fn write_status(&self, router: &Router, update: StatusUpdate) {
        if let Err(e) = self
            .inner
            .services
            .registry
            .update_status(&router.id, update)
            .await
        {
            warn!(router = %router.id, error = %e, "failed to store router status");
        }
    }

    fn alert_new_clients(&self, router: &Router, clients: &[Client]) -> usize {
        let fresh = new_clients(&router.status, clients);
        for client in &fresh {
            info!(router = %router.id, mac = %client.mac, name = %client.name, "new client");
            self.inner
                .services
                .notifier
                .notify(new_client_alert(client, &router.name));
        }
        fresh.len()
    }

    /// Kick off a background ping sweep unless one is still running.
    fn spawn_sweep(&self, routers: &[Router]) {
        if !self.inner.config.sweep {
            return;
        }
        let Some(subnet) = self.inner.config.sweep_subnet.or_else(|| gateway_subnet(routers)) else {
            return;
        };
        if self.inner.sweeping.swap(true, Ordering::AcqRel) {
            return;
        }
        let ctrl = self.clone();
        tokio::spawn(async move {
            ctrl.inner.services.local.sweep(subnet).await;
            ctrl.inner.sweeping.store(false, Ordering::Release);
        });
    }
}

/// The /24 around the first gateway with an IPv4 address.
fn gateway_subnet(routers: &[Router]) -> Option<Ipv4Network> {
    routers
        .iter()
        .filter(|r| r.is_gateway)
        .find_map(|r| r.address.parse().ok())
        .and_then(|ip| Ipv4Network::new(ip, 24).ok())
        .and_then(|net| Ipv4Network::new(net.network(), 24).ok())
}

async fn sync_task(controller: Controller, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => match controller.sync_all().await {
                Ok(_) => {}
                Err(CoreError::SyncInProgress) => debug!("periodic sync skipped: cycle running"),
                Err(e) => warn!(error = %e, "periodic sync failed"),
            },
        }
    }
}
