//! Causeway CLI - inspect resolved cause chains from recorded host models.
//!
//! A model file is a JSON document of runs (with trigger records and,
//! for pipeline runs, a flow-node graph) plus optional pre-seeded parent
//! links. See `causeway_core::model::HostModel`.
//!
//! ## Commands
//!
//! - `resolve`: print the cause tree for one run, as text or JSON
//! - `event`: assemble a populated run-event envelope for one run

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use causeway_core::{
    init_tracing, Cause, CauseResolver, FolderJobIdPolicy, HostModel, RunRegistry,
};
use causeway_domain::{RunEvent, RunEventType};

#[derive(Parser)]
#[command(name = "causeway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve why CI runs started", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the cause chain for one run in a recorded model
    Resolve {
        /// Path to the model file (JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Job name of the run to resolve
        #[arg(short, long)]
        job: String,

        /// Build number of the run to resolve
        #[arg(short, long)]
        build: u64,

        /// Print the cause tree as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Assemble a populated run-event envelope for one run
    Event {
        /// Path to the model file (JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Job name of the run the event describes
        #[arg(short, long)]
        job: String,

        /// Build number of the run the event describes
        #[arg(short, long)]
        build: u64,

        /// Lifecycle point of the event
        #[arg(long, value_enum, default_value_t = EventTypeArg::Finished)]
        event_type: EventTypeArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EventTypeArg {
    Started,
    Finished,
}

impl From<EventTypeArg> for RunEventType {
    fn from(arg: EventTypeArg) -> Self {
        match arg {
            EventTypeArg::Started => RunEventType::Started,
            EventTypeArg::Finished => RunEventType::Finished,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Resolve {
            model,
            job,
            build,
            json,
        } => {
            let causes = resolve_causes(&model, &job, build)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&causes)?);
            } else if causes.is_empty() {
                println!("{job}#{build}: no causes recorded");
            } else {
                println!("{job}#{build}");
                print_tree(&causes, 1);
            }
        }
        Commands::Event {
            model,
            job,
            build,
            event_type,
        } => {
            let causes = resolve_causes(&model, &job, build)?;
            let event =
                RunEvent::new(event_type.into(), job, build.to_string()).with_causes(causes);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    Ok(())
}

fn resolve_causes(model_path: &PathBuf, job: &str, build: u64) -> Result<Vec<Cause>> {
    let raw = std::fs::read_to_string(model_path)
        .with_context(|| format!("failed to read model file {}", model_path.display()))?;
    let model = HostModel::from_json(&raw).context("failed to parse model file")?;
    let (host, links) = model.into_host();

    let run = host
        .lookup(job, build)
        .with_context(|| format!("run {job}#{build} not found in model"))?;

    let resolver = CauseResolver::new(host.clone(), links, Arc::new(FolderJobIdPolicy));
    resolver
        .resolve_run(Some(run.as_ref()))
        .context("cause resolution failed")
}

fn print_tree(causes: &[Cause], depth: usize) {
    for cause in causes {
        println!("{}- {}", "  ".repeat(depth), describe(cause));
        print_tree(&cause.causes, depth + 1);
    }
}

fn describe(cause: &Cause) -> String {
    let mut parts = vec![cause.kind.to_string()];
    if let Some(user) = &cause.user {
        parts.push(format!("user={user}"));
    }
    if let Some(project) = &cause.project {
        parts.push(format!("project={project}"));
    }
    if let Some(build_id) = &cause.build_id {
        parts.push(format!("build={build_id}"));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_upstream_cause() {
        let text = describe(&Cause::upstream("team/app", "42"));
        assert_eq!(text, "UPSTREAM project=team/app build=42");
    }

    #[test]
    fn test_describe_user_cause() {
        let text = describe(&Cause::user(Some("alice".to_string())));
        assert_eq!(text, "USER user=alice");
    }

    #[test]
    fn test_event_type_arg_maps_to_domain() {
        assert_eq!(RunEventType::from(EventTypeArg::Started), RunEventType::Started);
        assert_eq!(
            RunEventType::from(EventTypeArg::Finished),
            RunEventType::Finished
        );
    }
}
