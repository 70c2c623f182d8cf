//! Farmhand CLI - deployment runner for Django applications on Lightsail
//!
//! Usage: farmhand <COMMAND>
//!
//! Commands:
//!   run     Execute the deployment plan
//!   plan    Show the resolved step sequence without executing
//!   doctor  Check the deployment environment
//!   init    Write a sample farmhand.toml

use std::path::PathBuf;

use is_terminal::IsTerminal;

use anyhow::Result;
use clap::{Parser, Subcommand};

use farmhand::config;
use farmhand::doctor::{run_doctor, CheckStatus};
use farmhand::plan::Plan;
use farmhand::runner::{RunEvent, RunOptions, Runner};
use farmhand::ShellExecutor;

/// Farmhand - deployment runner for Django applications on Lightsail
#[derive(Parser, Debug)]
#[command(name = "farmhand")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute the deployment plan
    Run {
        /// Path to a plan file (defaults to ./farmhand.toml, then the built-in plan)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the sequence without invoking anything
        #[arg(long)]
        dry_run: bool,

        /// Continue past failing steps instead of aborting
        #[arg(long)]
        keep_going: bool,
    },

    /// Show the resolved step sequence without executing
    Plan {
        /// Path to a plan file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check the deployment environment (exits non-zero on missing required vars)
    Doctor {
        /// Path to a plan file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a sample farmhand.toml
    Init {
        /// Destination file
        #[arg(short, long, default_value = "farmhand.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            dry_run,
            keep_going,
        } => cmd_run(config, dry_run, keep_going, cli.json, cli.verbose),
        Commands::Plan { config } => cmd_plan(config, cli.json),
        Commands::Doctor { config } => cmd_doctor(config, cli.json),
        Commands::Init { path, force } => cmd_init(&path, force, cli.json),
    }
}

/// Resolve the plan, printing any unknown-key warnings as we go.
fn resolve_plan(explicit: Option<PathBuf>, json: bool) -> Result<Plan> {
    let (plan, warnings, source) = config::load_or_default(explicit.as_deref())?;

    for warning in &warnings {
        if json {
            let line = serde_json::json!({
                "event": "warning",
                "message": warning.to_string(),
            });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            eprintln!("{} {}", icon_err("⚠", "warning:"), warning);
        }
    }

    if !json {
        match source {
            Some(path) => println!("Plan: {}", path.display()),
            None => println!("Plan: built-in"),
        }
    }

    Ok(plan)
}

fn cmd_run(
    config: Option<PathBuf>,
    dry_run: bool,
    keep_going: bool,
    json: bool,
    verbose: u8,
) -> Result<()> {
    if !json {
        println!("{} Farmhand Deploy", icon("🚜", ">"));
    }

    let plan = resolve_plan(config, json)?;

    if !json {
        println!("Target: {}", plan.app_root.display());
        if keep_going {
            println!("Mode: keep going past failures");
        }
        if dry_run {
            println!("Mode: dry run");
        }
        println!();
    }

    if dry_run {
        return cmd_plan_inner(&plan, json);
    }

    let total = plan.steps.len();
    let mut runner = Runner::new(plan.clone(), RunOptions { keep_going });
    let mut executor = ShellExecutor;

    let report = runner.run(&mut executor, |event| {
        render_event(&event, total, json, verbose);
    })?;

    if json {
        let line = serde_json::json!({
            "event": "run",
            "status": if report.is_success() { "succeeded" } else { "failed" },
            "started_at": report.started_at.to_rfc3339(),
            "passed": report.passed(),
            "failed": report.failed(),
            "skipped": report.skipped(),
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!();
        println!(
            "Summary: {} passed, {} failed, {} skipped",
            report.passed(),
            report.failed(),
            report.skipped()
        );

        if report.is_success() {
            println!();
            println!("{} Deployment complete!", icon("🎉", "OK:"));
            if !plan.endpoints.is_empty() {
                println!("Verify the application at:");
                for endpoint in &plan.endpoints {
                    println!("  - {endpoint}");
                }
            }
        } else if let Some(err) = report.failure() {
            println!();
            println!("{} Deployment FAILED: {}", icon("🔴", "FAILED:"), err);
        }
    }

    let code = report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn render_event(event: &RunEvent<'_>, total: usize, json: bool, verbose: u8) {
    match event {
        RunEvent::Started { total } => {
            if json {
                let line = serde_json::json!({ "event": "started", "total": total });
                println!("{line}");
            }
        }
        RunEvent::StepStarted { index, step } => {
            if json {
                let line = serde_json::json!({
                    "event": "step_started",
                    "index": index,
                    "name": step.name,
                });
                println!("{line}");
            } else {
                println!("[{}/{}] {}...", index + 1, total, step.name);
                if verbose > 0 {
                    let prefix = if step.sudo { "sudo " } else { "" };
                    println!("      $ {}{}", prefix, step.command);
                }
            }
        }
        RunEvent::StepPassed {
            index,
            step,
            duration,
        } => {
            if json {
                let line = serde_json::json!({
                    "event": "step_passed",
                    "index": index,
                    "name": step.name,
                    "duration_ms": duration.as_millis() as u64,
                });
                println!("{line}");
            } else {
                println!("      {} {} ({:.1}s)", icon("✓", "ok"), step.name, duration.as_secs_f64());
            }
        }
        RunEvent::StepFailed {
            index,
            step,
            status,
            output,
            continuing,
        } => {
            if json {
                let line = serde_json::json!({
                    "event": "step_failed",
                    "index": index,
                    "name": step.name,
                    "exit_status": status,
                    "continuing": continuing,
                    "output": output,
                });
                println!("{line}");
            } else {
                let code = status
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                println!("      {} {} (exit {})", icon("✗", "fail"), step.name, code);
                for line in output.lines() {
                    println!("      | {line}");
                }
                if *continuing {
                    println!("      {} continuing past failure", icon("⚠", "warning:"));
                }
            }
        }
    }
}

fn cmd_plan(config: Option<PathBuf>, json: bool) -> Result<()> {
    if !json {
        println!("{} Farmhand Plan", icon("📋", ">"));
    }
    let plan = resolve_plan(config, json)?;
    if !json {
        println!("Target: {}", plan.app_root.display());
        println!();
    }
    cmd_plan_inner(&plan, json)
}

fn cmd_plan_inner(plan: &Plan, json: bool) -> Result<()> {
    if json {
        for (index, step) in plan.steps.iter().enumerate() {
            let line = serde_json::json!({
                "event": "step",
                "index": index,
                "name": step.name,
                "command": step.command,
                "sudo": step.sudo,
                "continue_on_failure": step.continue_on_failure,
            });
            println!("{}", serde_json::to_string(&line)?);
        }
        return Ok(());
    }

    for (index, step) in plan.steps.iter().enumerate() {
        let mut flags = String::new();
        if step.sudo {
            flags.push_str(" [sudo]");
        }
        if step.continue_on_failure {
            flags.push_str(" [continue-on-failure]");
        }
        println!("{}. {}{}", index + 1, step.name, flags);
        let prefix = if step.sudo { "sudo " } else { "" };
        println!("   $ {}{}", prefix, step.command);
    }

    if !plan.endpoints.is_empty() {
        println!();
        println!("Endpoints after deployment:");
        for endpoint in &plan.endpoints {
            println!("  - {endpoint}");
        }
    }

    Ok(())
}

fn cmd_doctor(config: Option<PathBuf>, json: bool) -> Result<()> {
    if !json {
        println!("{} Farmhand Doctor", icon("🩺", ">"));
    }

    let plan = resolve_plan(config, json)?;
    let report = run_doctor(&plan);

    if json {
        let line = serde_json::json!({
            "event": "doctor",
            "passes": report.passes(),
            "warnings": report.warnings(),
            "errors": report.errors(),
            "success": report.is_success(),
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!();
        for check in &report.checks {
            let mark = match check.status {
                CheckStatus::Pass => icon("✓", "ok"),
                CheckStatus::Warning => icon("⚠", "warn"),
                CheckStatus::Error => icon("✗", "fail"),
            };
            println!("  {} {} - {}", mark, check.variable, check.message);
        }

        println!();
        println!(
            "Summary: {} passed, {} warnings, {} errors",
            report.passes(),
            report.warnings(),
            report.errors()
        );

        if !report.is_success() {
            println!();
            println!(
                "{} Required variables are missing; the application will not start.",
                icon("🔴", "FAILED:")
            );
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_init(path: &PathBuf, force: bool, json: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists - pass --force to overwrite",
            path.display()
        );
    }

    std::fs::write(path, config::SAMPLE_PLAN)?;

    if json {
        let line = serde_json::json!({
            "event": "init",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("{} Wrote {}", icon("✓", "ok"), path.display());
        println!("Edit the step list, then run: farmhand run");
    }

    Ok(())
}

/// Emoji for interactive terminals, plain markers otherwise.
fn icon(emoji: &'static str, plain: &'static str) -> &'static str {
    if std::io::stdout().is_terminal() {
        emoji
    } else {
        plain
    }
}

/// Same as [`icon`] for lines written to stderr.
fn icon_err(emoji: &'static str, plain: &'static str) -> &'static str {
    if std::io::stderr().is_terminal() {
        emoji
    } else {
        plain
    }
}
