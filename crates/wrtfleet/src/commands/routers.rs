//! `wrtfleet routers`, `wrtfleet add`, `wrtfleet remove`

use serde::Serialize;
use tabled::Tabled;
use wrtfleet_config::{RouterEntry, load_config_file, save_config};
use wrtfleet_core::RouterId;

use crate::cli::{AddArgs, GlobalOpts, RemoveArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Serialize)]
struct RouterListing {
    id: String,
    name: String,
    address: String,
    port: u16,
    username: String,
    auth: &'static str,
    gateway: bool,
}

#[derive(Tabled)]
struct RouterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Auth")]
    auth: &'static str,
    #[tabled(rename = "Gateway")]
    gateway: &'static str,
}

pub fn list(ctx: &Context, global: &GlobalOpts) {
    let entries: Vec<RouterListing> = ctx
        .store
        .routers()
        .iter()
        .map(|r| RouterListing {
            id: r.id.to_string(),
            name: r.name.clone(),
            address: r.address.clone(),
            port: r.port,
            username: r.username.clone(),
            auth: r.credentials.kind(),
            gateway: r.is_gateway,
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &entries,
        |e| RouterRow {
            id: e.id.clone(),
            name: e.name.clone(),
            address: format!("{}:{}", e.address, e.port),
            username: e.username.clone(),
            auth: e.auth,
            gateway: if e.gateway { "yes" } else { "" },
        },
        |e| e.id.clone(),
    );
    output::print_output(&out, global.quiet);
}

/// Register a router: written to the config file once it is in the fleet.
pub async fn add(ctx: &Context, args: AddArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut file = load_config_file(&ctx.config_path)?;
    let id = RouterId::from(args.id.as_str());
    if file.routers.contains_key(&args.id) || ctx.store.router(&id).is_some() {
        return Err(CliError::Conflict {
            resource_type: "router".into(),
            identifier: args.id,
        });
    }

    let mut entry = RouterEntry::new(args.address);
    entry.name = args.name;
    entry.port = args.port;
    entry.username = args.username;
    entry.gateway = args.gateway;
    if let Some(var) = args.password_env {
        entry = entry.with_password_env(var);
    }
    if let Some(path) = args.key_path {
        entry = entry.with_key_path(path);
    }
    let router = entry.to_router(&args.id)?;

    let state = ctx.controller.register_router(router).await?;
    file.routers.insert(args.id, entry);
    save_config(&file, &ctx.config_path)?;

    if args.no_sync {
        ctx.controller.shutdown().await;
    } else {
        ctx.controller.settle().await;
    }
    ctx.save()?;

    if !global.quiet {
        eprintln!("Added router {id} ({state})");
    }
    Ok(())
}

pub fn remove(ctx: &Context, args: RemoveArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = ctx.router_id(&args.id)?;
    if !args.yes {
        return Err(CliError::ConfirmationRequired {
            action: format!("remove {id}"),
        });
    }

    let mut file = load_config_file(&ctx.config_path)?;
    if file.routers.remove(id.as_str()).is_none() {
        return Err(CliError::Validation {
            field: "router".into(),
            reason: format!(
                "'{id}' is set through the environment, not {}",
                ctx.config_path.display()
            ),
        });
    }
    save_config(&file, &ctx.config_path)?;
    ctx.store.remove_router(&id);
    ctx.save()?;

    if !global.quiet {
        eprintln!("Removed router {id}");
    }
    Ok(())
}
