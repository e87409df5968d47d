//! `wrtfleet daemon`: sync on the configured interval until Ctrl-C.

use tracing::{info, warn};

use crate::error::CliError;

use super::Context;

pub async fn handle(ctx: &Context) -> Result<(), CliError> {
    ctx.require_routers()?;

    match ctx.controller.sync_all().await {
        Ok(report) => info!(
            online = report.online.len(),
            offline = report.offline.len(),
            "initial sync complete"
        ),
        Err(e) => warn!(error = %e, "initial sync failed"),
    }
    ctx.save()?;

    let mut changes = ctx.store.subscribe();
    changes.mark_unchanged();
    ctx.controller.start().await;
    info!(
        interval_secs = ctx.controller.config().interval.as_secs(),
        "daemon running, Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Err(e) = ctx.save() {
                    warn!(error = %e, "failed to persist state");
                }
            }
        }
    }

    info!("shutting down");
    ctx.controller.shutdown().await;
    ctx.save()
}
