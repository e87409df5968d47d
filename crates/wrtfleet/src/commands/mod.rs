//! Command dispatch: loads the fleet context, then routes to handlers.

pub mod clients;
pub mod daemon;
pub mod exec;
pub mod routers;
pub mod stats;
pub mod status;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use wrtfleet_core::adapters::TelegramNotifier;
use wrtfleet_core::{Controller, RouterId, RouterStore, Services, StateFile};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Everything a fleet command needs: configured routers with their
/// persisted status, and a controller wired to production adapters.
pub struct Context {
    pub config_path: PathBuf,
    pub store: Arc<RouterStore>,
    pub state: StateFile,
    pub controller: Controller,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config_path = global
            .config
            .clone()
            .unwrap_or_else(wrtfleet_config::config_path);
        let cfg = wrtfleet_config::load_config_from(&config_path)?;
        let sync = cfg.sync.to_sync_config()?;

        let store = Arc::new(RouterStore::new());
        for router in cfg.routers()? {
            store.add_router(router)?;
        }

        let state = StateFile::new(
            global
                .state
                .clone()
                .unwrap_or_else(|| cfg.sync.state_path()),
        );
        store.restore_state(state.load()?);

        let mut services = Services::system(Arc::clone(&store), &sync);
        if let Some((token, chat_id)) = wrtfleet_config::resolve_telegram(&cfg.alerts) {
            let notifier =
                TelegramNotifier::new(token, chat_id).map_err(|e| CliError::Validation {
                    field: "alerts".into(),
                    reason: e.to_string(),
                })?;
            services = services.with_notifier(Arc::new(notifier));
        }

        Ok(Self {
            config_path,
            store,
            state,
            controller: Controller::new(sync, services),
        })
    }

    /// Fail with a pointer to the config file when no routers are set up.
    pub fn require_routers(&self) -> Result<(), CliError> {
        if self.store.router_count() == 0 {
            return Err(CliError::NoRouters {
                path: self.config_path.display().to_string(),
            });
        }
        Ok(())
    }

    /// Resolve a router id given on the command line.
    pub fn router_id(&self, identifier: &str) -> Result<RouterId, CliError> {
        let id = RouterId::from(identifier);
        if self.store.router(&id).is_some() {
            Ok(id)
        } else {
            Err(CliError::router_not_found(identifier))
        }
    }

    /// Persist router status and client names.
    pub fn save(&self) -> Result<(), CliError> {
        self.state.save(&self.store.export_state())?;
        Ok(())
    }
}

/// Dispatch a fleet command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sync => sync::handle(ctx, global).await,
        Command::Status(args) => status::handle(ctx, args, global).await,
        Command::Stats(args) => stats::handle(ctx, args, global).await,
        Command::Clients(args) => clients::list(ctx, args, global),
        Command::Rename(args) => clients::rename(ctx, args, global),
        Command::Exec(args) => exec::run(ctx, args, global).await,
        Command::Reboot(args) => exec::reboot(ctx, args, global).await,
        Command::Daemon => daemon::handle(ctx).await,
        Command::Routers => {
            routers::list(ctx, global);
            Ok(())
        }
        Command::Add(args) => routers::add(ctx, args, global).await,
        Command::Remove(args) => routers::remove(ctx, args, global),
        Command::Completions(_) => Err(CliError::Internal(
            "completions are generated before dispatch".into(),
        )),
    }
}
