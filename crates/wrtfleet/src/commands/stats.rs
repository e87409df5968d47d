//! `wrtfleet stats <router>`

use wrtfleet_core::Snapshot;

use crate::cli::{GlobalOpts, StatsArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

fn detail(s: &Snapshot) -> String {
    let mut lines = vec![
        format!("Uptime:       {}", output::format_uptime(s.uptime_secs)),
        format!(
            "Load:         {:.2} {:.2} {:.2}",
            s.load.one, s.load.five, s.load.fifteen
        ),
        format!(
            "Memory:       {}% used ({} / {} kB)",
            s.memory.percent, s.memory.used_kb, s.memory.total_kb
        ),
        format!(
            "LAN traffic:  rx {} B, tx {} B",
            s.network.rx_bytes, s.network.tx_bytes
        ),
        format!("Leases:       {}", s.leases.len()),
        format!("Neighbors:    {}", s.arp.len()),
        format!("Static hosts: {}", s.static_hosts.len()),
        format!("Wireless:     {}", s.associations.len()),
    ];
    if let Some(essid) = &s.radio.essid {
        lines.push(format!("ESSID:        {essid}"));
    }
    if let Some(mode) = &s.radio.mode {
        lines.push(format!("Mode:         {mode}"));
    }
    lines.join("\n")
}

pub async fn handle(ctx: &Context, args: StatsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = ctx.router_id(&args.router)?;
    let snapshot = ctx.controller.fetch_stats(&id).await?;
    let out = output::render_single(&global.output, &snapshot, detail, |s| {
        format!("{}\t{}", s.memory.percent, s.load.one)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
