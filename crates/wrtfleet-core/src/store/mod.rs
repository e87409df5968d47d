// ── Router store ──
//
// In-memory registry of managed routers and user-assigned client names.
// Implements the `RouterRegistry` and `NameRegistry` ports and exposes
// a `watch` snapshot for anything that wants to follow status changes.

mod collection;
mod persist;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{MacAddress, Router, RouterId, StatusUpdate};
use crate::ports::{NameRegistry, RouterRegistry};

use collection::EntityCollection;
pub use persist::{FleetState, StateFile};

/// Routers keyed by id, plus the persistent client-name registry.
pub struct RouterStore {
    routers: EntityCollection<Router>,
    names: DashMap<MacAddress, String>,
}

impl Default for RouterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterStore {
    pub fn new() -> Self {
        Self {
            routers: EntityCollection::new(),
            names: DashMap::new(),
        }
    }

    // ── Routers ──────────────────────────────────────────────────────

    /// Register a new router. Fails if the id is already taken.
    pub fn add_router(&self, router: Router) -> Result<(), CoreError> {
        let (id, address) = (router.id.clone(), router.address.clone());
        if !self.routers.insert_new(id.to_string(), router) {
            return Err(CoreError::RouterExists {
                identifier: id.to_string(),
            });
        }
        debug!(router = %id, %address, "router added");
        Ok(())
    }

    pub fn remove_router(&self, id: &RouterId) -> Option<Arc<Router>> {
        self.routers.remove(id.as_str())
    }

    pub fn router(&self, id: &RouterId) -> Option<Arc<Router>> {
        self.routers.get_by_key(id.as_str())
    }

    /// All routers, ordered by id.
    pub fn routers(&self) -> Arc<Vec<Arc<Router>>> {
        self.routers.snapshot()
    }

    pub fn router_count(&self) -> usize {
        self.routers.len()
    }

    /// Follow router list and status changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Router>>>> {
        self.routers.subscribe()
    }

    // ── Client names ─────────────────────────────────────────────────

    /// Assign a persistent name to a client. An empty name clears it.
    pub fn rename_client(&self, mac: &MacAddress, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.names.remove(mac);
        } else {
            self.names.insert(mac.clone(), name.to_owned());
        }
    }

    pub fn client_name(&self, mac: &MacAddress) -> Option<String> {
        self.names.get(mac).map(|n| n.value().clone())
    }

    /// All assigned names, ordered by MAC.
    pub fn client_names(&self) -> BTreeMap<MacAddress, String> {
        self.names
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    // ── State file round-trip ────────────────────────────────────────

    /// Snapshot statuses and names for persisting.
    pub fn export_state(&self) -> FleetState {
        FleetState {
            routers: self
                .routers()
                .iter()
                .map(|r| (r.id.clone(), r.status.clone()))
                .collect(),
            names: self.client_names(),
            ..FleetState::default()
        }
    }

    /// Restore statuses for routers already in the store, and all names.
    /// Saved statuses for routers no longer configured are dropped.
    pub fn restore_state(&self, state: FleetState) {
        for (id, status) in state.routers {
            self.routers.modify(id.as_str(), |router| router.status = status);
        }
        for (mac, name) in state.names {
            self.names.insert(mac, name);
        }
    }
}

#[async_trait]
impl RouterRegistry for RouterStore {
    async fn list_routers(&self) -> Result<Vec<Router>, CoreError> {
        Ok(self.routers().iter().map(|r| Router::clone(r)).collect())
    }

    async fn get_router(&self, id: &RouterId) -> Result<Router, CoreError> {
        self.router(id)
            .map(|r| Router::clone(&r))
            .ok_or_else(|| CoreError::RouterNotFound {
                identifier: id.to_string(),
            })
    }

    async fn add_router(&self, router: Router) -> Result<(), CoreError> {
        Self::add_router(self, router)
    }

    async fn update_status(&self, id: &RouterId, update: StatusUpdate) -> Result<(), CoreError> {
        if self
            .routers
            .modify(id.as_str(), |router| update.apply(&mut router.status))
        {
            Ok(())
        } else {
            Err(CoreError::RouterNotFound {
                identifier: id.to_string(),
            })
        }
    }
}

#[async_trait]
impl NameRegistry for RouterStore {
    async fn lookup_name(&self, mac: &MacAddress) -> Option<String> {
        self.client_name(mac)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::RouterState;
    use chrono::Utc;
    use secrecy::SecretString;
    use wrtfleet_ssh::Credentials;

    fn router(id: &str) -> Router {
        Router::new(
            id,
            "192.168.1.2",
            "root",
            Credentials::Password(SecretString::from("pw".to_owned())),
        )
    }

    #[test]
    fn duplicate_router_is_rejected() {
        let store = RouterStore::new();
        store.add_router(router("ap1")).unwrap();
        assert!(matches!(
            store.add_router(router("ap1")),
            Err(CoreError::RouterExists { .. })
        ));
        assert_eq!(store.router_count(), 1);

        assert!(store.remove_router(&RouterId::from("ap1")).is_some());
        store.add_router(router("ap1")).unwrap();
    }

    #[tokio::test]
    async fn update_status_is_partial() {
        let store = RouterStore::new();
        store.add_router(router("ap1")).unwrap();
        let id = RouterId::from("ap1");

        store
            .update_status(&id, StatusUpdate::online(Utc::now()).with_clients(Vec::new()))
            .await
            .unwrap();
        store
            .update_status(&id, StatusUpdate::offline(Utc::now(), "timeout"))
            .await
            .unwrap();

        let r = store.get_router(&id).await.unwrap();
        assert_eq!(r.status.state, RouterState::Offline);
        assert!(r.status.last_seen.is_some());
        assert_eq!(r.status.last_error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn unknown_router_is_not_found() {
        let store = RouterStore::new();
        let id = RouterId::from("ghost");
        assert!(matches!(
            store.get_router(&id).await,
            Err(CoreError::RouterNotFound { .. })
        ));
        assert!(store.update_status(&id, StatusUpdate::default()).await.is_err());
    }

    #[tokio::test]
    async fn rename_and_clear_client() {
        let store = RouterStore::new();
        let mac = MacAddress::new("AA:BB:CC:DD:EE:01");

        store.rename_client(&mac, "  Kitchen speaker ");
        assert_eq!(store.lookup_name(&mac).await.as_deref(), Some("Kitchen speaker"));

        store.rename_client(&mac, "");
        assert_eq!(store.lookup_name(&mac).await, None);
    }

    #[test]
    fn routers_are_listed_in_id_order() {
        let store = RouterStore::new();
        for id in ["gw", "attic", "garage"] {
            store.add_router(router(id)).unwrap();
        }
        let ids: Vec<String> = store.routers().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["attic", "garage", "gw"]);
    }

    #[test]
    fn restore_skips_unknown_routers() {
        let store = RouterStore::new();
        store.add_router(router("ap1")).unwrap();

        let mut state = FleetState::default();
        let mut status = crate::model::RouterStatus::default();
        status.state = RouterState::Online;
        state.routers.insert(RouterId::from("ap1"), status.clone());
        state.routers.insert(RouterId::from("removed"), status);
        state
            .names
            .insert(MacAddress::new("aa:bb:cc:dd:ee:01"), "tv".into());

        store.restore_state(state);

        assert!(store.router(&RouterId::from("ap1")).unwrap().status.state.is_online());
        assert!(store.router(&RouterId::from("removed")).is_none());
        assert_eq!(store.client_names().len(), 1);
    }
}
