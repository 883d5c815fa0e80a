//! AS4 CLI - Command-line interface for the AS4 engine

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use as4_core::{spawn_configured_cleanup, As4Config, As4Context};
use as4_model::{Binding, Mep, MessageKind, PMode};
use as4_profile::ProfileRegistry;

#[derive(Parser)]
#[command(name = "as4")]
#[command(about = "AS4 - PMode-governed ebMS3 message exchange engine")]
struct Cli {
    /// Configuration file path (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the engine context with periodic duplicate cleanup
    Start,
    /// Validate a PMode file against the active profile
    Check {
        /// PMode file path (JSON)
        pmode: PathBuf,
    },
    /// Tell whether a message kind is legal for a MEP/binding pair
    Classify {
        #[arg(long)]
        mep: Mep,
        #[arg(long)]
        binding: Binding,
        #[arg(long)]
        kind: MessageKind,
        /// Classify for the second leg
        #[arg(long)]
        leg2: bool,
    },
    /// Show engine status
    Status,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<As4Config> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(As4Config::default()),
    }
}

fn build_context(path: Option<&Path>) -> anyhow::Result<As4Context> {
    let config = load_config(path)?;
    Ok(As4Context::new(config, Arc::new(ProfileRegistry::with_builtin()))?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Some(Commands::Start) => {
            let ctx = Arc::new(build_context(config_path)?);
            let cleanup = spawn_configured_cleanup(Arc::clone(&ctx))?;
            info!(own_id = ctx.own_id(), "AS4 engine running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            cleanup.abort();
            info!("AS4 engine stopped");
        }
        Some(Commands::Check { pmode }) => {
            let ctx = build_context(config_path)?;
            let raw = std::fs::read_to_string(&pmode)
                .with_context(|| format!("reading PMode {}", pmode.display()))?;
            let pmode: PMode = serde_json::from_str(&raw)?;

            let update = ctx.pmodes().create_or_update(pmode)?;
            for finding in update.errors.iter() {
                println!("{finding}");
            }
            match update.id {
                Some(id) if update.stored => println!("PMode {id}: OK"),
                _ => anyhow::bail!("PMode rejected by profile '{}'", ctx.profile().id()),
            }
        }
        Some(Commands::Classify { mep, binding, kind, leg2 }) => {
            let config = load_config(config_path)?;
            let table = config.mep_table.table();
            let legal = table.is_valid_message_type(mep, binding, kind, !leg2)?;
            let leg = if leg2 { 2 } else { 1 };
            println!(
                "{kind} on leg {leg} of {mep}/{binding} (table v{}): {}",
                table.version(),
                if legal { "legal" } else { "illegal" }
            );
        }
        Some(Commands::Status) => {
            let ctx = build_context(config_path)?;
            println!("Own id:     {}", ctx.own_id());
            println!("Profile:    {}", ctx.profile().id());
            println!("MEP table:  v{}", ctx.table().version());
            println!("PModes:     {}", ctx.pmodes().len());
            println!("MPCs:       {}", ctx.mpcs().len());
            println!("Duplicates: {}", ctx.duplicates().size());
        }
        None => {
            println!("AS4 v{} - Use --help for commands", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
