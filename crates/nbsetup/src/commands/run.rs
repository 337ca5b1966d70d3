//! `nbsetup run`: load the input, connect, synchronize the selected stages.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use nbsetup_core::document::load_dir;
use nbsetup_core::{CoreError, Plan, Stage, SyncEngine};

use crate::cli::{GlobalOpts, RunArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, TerminalReport};

/// Stages picked by the flags, in flag order. Empty means all.
pub fn selected_stages(args: &RunArgs) -> Vec<Stage> {
    [
        (args.organisation, Stage::Organisation),
        (args.devices, Stage::Devices),
        (args.ipam, Stage::Ipam),
        (args.circuits, Stage::Circuits),
        (args.virtualisation, Stage::Virtualisation),
        (args.contacts, Stage::Contacts),
    ]
    .into_iter()
    .filter_map(|(selected, stage)| selected.then_some(stage))
    .collect()
}

/// Check the plan and the document before any remote call.
fn preflight(plan: &Plan, doc: &nbsetup_core::InputDocument) -> Result<(), CliError> {
    plan.validate()?;
    let missing = doc.missing_sections(&plan.stages());
    if missing.is_empty() {
        return Ok(());
    }
    let message = missing
        .iter()
        .map(|(stage, sections)| format!("stage '{stage}' needs {}", sections.join(", ")))
        .collect::<Vec<_>>()
        .join("; ");
    Err(CliError::Plan { message })
}

fn spinner(message: String, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner());
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub async fn handle(args: &RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let doc = load_dir(&args.input_dir)?;
    let plan = Plan::new(selected_stages(args));
    preflight(&plan, &doc)?;

    let provision = config::build_provision_config(global, args.template_dir.as_deref())?;
    let client = provision.connect()?;

    let pb = spinner(format!("Connecting to {}", provision.url), global.quiet);
    let status = client.status().await;
    pb.finish_and_clear();
    match status.map_err(CoreError::from)? {
        Some(version) => info!(url = %provision.url, %version, "connected to NetBox"),
        None => debug!(url = %provision.url, "connected to NetBox (version unknown)"),
    }

    let color = output::should_color(global.color);
    let mut engine = SyncEngine::new(client, TerminalReport::new(color, global.quiet));
    let summary = engine.run(&plan, &doc, &provision.template_dir).await?;

    output::print_output(&output::render_summary(summary, color), global.quiet);

    if args.strict && summary.failures > 0 {
        return Err(CliError::RunHadFailures {
            failures: summary.failures,
        });
    }
    Ok(())
}
