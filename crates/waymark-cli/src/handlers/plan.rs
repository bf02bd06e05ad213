//! Plan command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::PlanArgs;
use console::style;
use std::fmt::Write as _;
use waymark::{EnvironmentId, PlanEntry, ScenarioManifest};

/// Execute the plan command
pub fn execute_plan(config: &CliConfig, args: &PlanArgs) -> CliResult<()> {
    // Configuration must resolve before any scenario is gated
    let run = config.resolve()?;
    let manifest = ScenarioManifest::load(&args.manifest)?;
    let plan = manifest.plan(run.environment());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", render_plan(run.environment(), &plan));
    }
    Ok(())
}

/// Human-readable gate decisions
#[must_use]
pub fn render_plan(environment: &EnvironmentId, plan: &[PlanEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan for {}:", style(environment).bold());
    for entry in plan {
        if entry.registered {
            let _ = writeln!(out, "  {} {}", style("run ").green(), entry.name);
        } else {
            let _ = writeln!(out, "  {} {}", style("skip").yellow(), entry.name);
        }
    }
    let registered = plan.iter().filter(|e| e.registered).count();
    let _ = writeln!(
        out,
        "{registered} registered, {} skipped",
        plan.len() - registered
    );
    out
}
