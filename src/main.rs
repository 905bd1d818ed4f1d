use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;

use approval_rules::approval::config::Settings;
use approval_rules::approval::flow::{ApprovalFlow, FlowLoader};
use approval_rules::approval::server;
use approval_rules::approval::store::FlowStore;
use approval_rules::engine::registry::{FieldType, OperatorSet};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a flow definition and report every configuration error
    Validate {
        /// Path to the flow definition (YAML or JSON)
        #[arg(short, long)]
        flow: Option<PathBuf>,
    },
    /// Route an event through a flow and print the approval plan
    Evaluate {
        /// Path to the flow definition (YAML or JSON)
        #[arg(short, long)]
        flow: Option<PathBuf>,

        /// Path to the event record (YAML or JSON object)
        #[arg(short, long)]
        event: PathBuf,

        /// Include per-condition outcomes for every step
        #[arg(long)]
        explain: bool,
    },
    /// Print the operator table with labels
    Operators {
        /// Use the table from this flow instead of the standard one
        #[arg(short, long)]
        flow: Option<PathBuf>,
    },
    /// Serve the HTTP API
    Serve {
        /// Flow to activate at startup
        #[arg(short, long)]
        flow: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    // tracing-subscriber also forwards `log` records, so only one backend is installed
    match &args.command {
        Commands::Serve { .. } => tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init(),
        _ => env_logger::init(),
    }

    let settings = Settings::from_env()?;

    match args.command {
        Commands::Validate { flow } => {
            let path = flow_path(settings.with_overrides(flow, None))?;
            let definition = FlowLoader::new().load_flow(&path)?;
            let errors = ApprovalFlow::check(&definition);
            if errors.is_empty() {
                println!(
                    "ok: flow v{} ({} steps, {} fields)",
                    definition.version,
                    definition.steps.len(),
                    definition.field_definitions.len()
                );
            } else {
                for err in &errors {
                    eprintln!("error: {}", err);
                }
                bail!(
                    "{} has {} configuration error(s)",
                    path.display(),
                    errors.len()
                );
            }
        }
        Commands::Evaluate {
            flow,
            event,
            explain,
        } => {
            let path = flow_path(settings.with_overrides(flow, None))?;
            let loader = FlowLoader::new();
            let flow = loader
                .load_compiled(&path)
                .with_context(|| format!("Invalid flow {}", path.display()))?;
            let record = loader
                .load_event(&event)
                .with_context(|| format!("Failed to load event {}", event.display()))?;

            let plan = flow.route(&record, explain);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Operators { flow } => {
            let operators = match settings.with_overrides(flow, None).flow_file {
                Some(path) => {
                    let flow = FlowLoader::new().load_compiled(&path)?;
                    flow.registry().operator_set().clone()
                }
                None => OperatorSet::standard(),
            };
            for ty in FieldType::ALL {
                let Some(ops) = operators.get(ty) else {
                    continue;
                };
                println!("{}:", ty);
                for op in ops {
                    println!("  {:<20} {}", op.token(), op.label());
                }
            }
        }
        Commands::Serve { flow, port } => {
            let settings = settings.with_overrides(flow, port);
            let store = match &settings.flow_file {
                Some(path) => {
                    log::info!("Loading flow from {}", path.display());
                    FlowStore::new(FlowLoader::new().load_compiled(path)?)
                }
                None => {
                    log::warn!("No flow file configured; starting with an empty flow");
                    FlowStore::empty()?
                }
            };
            server::serve(store, settings.port).await?;
        }
    }

    Ok(())
}

fn flow_path(settings: Settings) -> anyhow::Result<PathBuf> {
    settings
        .flow_file
        .context("No flow file: pass --flow or set APPROVAL_FLOW_FILE")
}
