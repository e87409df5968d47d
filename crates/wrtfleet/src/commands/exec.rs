//! `wrtfleet exec` and `wrtfleet reboot`

use tabled::Tabled;
use wrtfleet_core::CommandOutcome;

use crate::cli::{ExecArgs, GlobalOpts, RebootArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Router")]
    router: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&CommandOutcome> for OutcomeRow {
    fn from(o: &CommandOutcome) -> Self {
        let result = match (&o.output, &o.error) {
            (_, Some(err)) => format!("error: {err}"),
            (Some(out), None) => out.clone(),
            (None, None) => String::new(),
        };
        Self {
            router: o.router.to_string(),
            address: o.address.clone(),
            result,
        }
    }
}

pub async fn run(ctx: &Context, args: ExecArgs, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.require_routers()?;
    let limit = args
        .limit
        .unwrap_or(ctx.controller.config().command_concurrency);
    if limit == 0 {
        return Err(CliError::Validation {
            field: "limit".into(),
            reason: "must be at least 1".into(),
        });
    }

    let outcomes = ctx
        .controller
        .run_on_all_with_limit(&args.command, limit)
        .await?;

    let out = output::render_list(&global.output, &outcomes, |o| OutcomeRow::from(o), |o| {
        format!("{}\t{}", o.router, o.output.as_deref().unwrap_or_default())
    });
    output::print_output(&out, global.quiet);

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        return Err(CliError::CommandFailed {
            message: format!("{failed} of {} routers failed", outcomes.len()),
        });
    }
    Ok(())
}

pub async fn reboot(ctx: &Context, args: RebootArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = ctx.router_id(&args.router)?;
    if !args.yes {
        return Err(CliError::ConfirmationRequired {
            action: format!("reboot {id}"),
        });
    }
    ctx.controller.reboot(&id).await?;
    if !global.quiet {
        eprintln!("Reboot issued to {id}");
    }
    Ok(())
}
