//! `wrtfleet status [router] [--check]`

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;
use wrtfleet_core::{Router, RouterStatus};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

/// Serializable view of a router: connection settings minus secrets.
#[derive(Serialize)]
struct RouterView<'a> {
    id: &'a str,
    name: &'a str,
    address: &'a str,
    port: u16,
    gateway: bool,
    #[serde(flatten)]
    status: &'a RouterStatus,
}

impl<'a> From<&'a Arc<Router>> for RouterView<'a> {
    fn from(r: &'a Arc<Router>) -> Self {
        Self {
            id: r.id.as_str(),
            name: &r.name,
            address: &r.address,
            port: r.port,
            gateway: r.is_gateway,
            status: &r.status,
        }
    }
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
    #[tabled(rename = "Clients")]
    clients: usize,
    #[tabled(rename = "ESSID")]
    essid: String,
    #[tabled(rename = "Error")]
    error: String,
}

fn when(ts: Option<DateTime<Utc>>) -> String {
    output::or_dash(ts.map(|t| t.format("%Y-%m-%d %H:%M:%S")))
}

fn detail(view: &RouterView<'_>, color: bool) -> String {
    let s = view.status;
    let mut lines = vec![
        format!("ID:          {}", view.id),
        format!("Name:        {}", view.name),
        format!("Address:     {}:{}", view.address, view.port),
        format!("Gateway:     {}", view.gateway),
        format!("State:       {}", output::state_label(s.state, color)),
        format!("Last seen:   {}", when(s.last_seen)),
        format!("Last failure: {}", when(s.last_failure)),
        format!("Clients:     {}", s.client_count),
    ];
    if let Some(essid) = &s.radio.essid {
        lines.push(format!("ESSID:       {essid}"));
    }
    if let Some(mesh) = &s.radio.mesh_id {
        lines.push(format!("Mesh ID:     {mesh}"));
    }
    if let Some(mode) = &s.radio.mode {
        lines.push(format!("Mode:        {mode}"));
    }
    if let Some(err) = &s.last_error {
        lines.push(format!("Error:       {err}"));
    }
    lines.join("\n")
}

pub async fn handle(ctx: &Context, args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    if let Some(router) = args.router {
        let id = ctx.router_id(&router)?;
        if args.check {
            ctx.controller.check_status(&id).await?;
            ctx.save()?;
        }

        let current = ctx
            .store
            .router(&id)
            .ok_or_else(|| CliError::router_not_found(&router))?;
        let view = RouterView::from(&current);
        let out = output::render_single(
            &global.output,
            &view,
            |v| detail(v, color),
            |v| v.status.state.to_string(),
        );
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let routers = ctx.store.routers();
    let views: Vec<RouterView<'_>> = routers.iter().map(RouterView::from).collect();
    let out = output::render_list(
        &global.output,
        &views,
        |v| StatusRow {
            id: v.id.to_owned(),
            name: v.name.to_owned(),
            state: output::state_label(v.status.state, color),
            last_seen: when(v.status.last_seen),
            clients: v.status.client_count,
            essid: output::or_dash(v.status.radio.essid.as_deref()),
            error: v.status.last_error.clone().unwrap_or_default(),
        },
        |v| format!("{}\t{}", v.id, v.status.state),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
