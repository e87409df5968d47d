//! `wrtfleet clients` and `wrtfleet rename`

use serde::Serialize;
use tabled::Tabled;
use wrtfleet_core::{Client, MacAddress};

use crate::cli::{ClientsArgs, GlobalOpts, RenameArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Serialize)]
struct ClientView {
    router: String,
    #[serde(flatten)]
    client: Client,
}

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "Router")]
    router: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Type")]
    connection: String,
    #[tabled(rename = "Signal")]
    signal: String,
}

impl From<&ClientView> for ClientRow {
    fn from(v: &ClientView) -> Self {
        let c = &v.client;
        Self {
            router: v.router.clone(),
            name: c.name.clone(),
            ip: output::or_dash(c.ip),
            mac: c.mac.to_string(),
            vendor: c.manufacturer.clone(),
            connection: c.connection.to_string(),
            signal: output::or_dash(c.signal_dbm.map(|dbm| format!("{dbm} dBm"))),
        }
    }
}

/// Clients from the last successful sync of each router.
pub fn list(ctx: &Context, args: ClientsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let only = args
        .router
        .as_deref()
        .map(|r| ctx.router_id(r))
        .transpose()?;

    let views: Vec<ClientView> = ctx
        .store
        .routers()
        .iter()
        .filter(|r| only.as_ref().is_none_or(|id| &r.id == id))
        .flat_map(|r| {
            r.status.clients.iter().map(move |c| ClientView {
                router: r.id.to_string(),
                client: c.clone(),
            })
        })
        .collect();

    let out = output::render_list(&global.output, &views, |v| ClientRow::from(v), |v| {
        v.client.mac.to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn rename(ctx: &Context, args: RenameArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mac = MacAddress::parse(&args.mac).ok_or_else(|| CliError::Validation {
        field: "mac".into(),
        reason: format!("'{}' is not a MAC address", args.mac),
    })?;
    ctx.store.rename_client(&mac, &args.name);
    ctx.save()?;

    if !global.quiet {
        match ctx.store.client_name(&mac) {
            Some(name) => eprintln!("{mac} is now \"{name}\""),
            None => eprintln!("Cleared name for {mac}"),
        }
    }
    Ok(())
}
