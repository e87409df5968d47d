//! `wrtfleet sync`

use std::fmt::Write as _;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Context;

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.require_routers()?;
    let report = ctx.controller.sync_all().await?;
    ctx.save()?;

    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            let mut text = format!(
                "{} online, {} offline, {} identities, {} new clients",
                r.online.len(),
                r.offline.len(),
                r.identities,
                r.new_clients
            );
            for failure in &r.offline {
                let _ = write!(text, "\n  {}: {}", failure.router, failure.error);
            }
            text
        },
        |r| {
            r.online
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
