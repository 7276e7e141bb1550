use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "quillgate")]
#[command(version, about = "Phase-gated control plane for research manuscript pipelines")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show pipeline status: every phase gate re-validated against disk
    Status,
    /// Validate a single phase gate
    Validate {
        /// Phase number (e.g. 5, 6.5, 11)
        phase: String,
    },
    /// Validate the base project structure
    Structure,
    /// Show the crash-recovery summary from the checkpoint
    Recover,
    /// Run writing-quality hooks against a section or manuscript file
    Hooks {
        /// File to check
        file: PathBuf,

        /// Run a single hook instead of the full batch
        #[arg(long)]
        hook: Option<String>,

        /// Sibling file for cross-section checks (e.g. Methods for Results)
        #[arg(long)]
        sibling: Option<PathBuf>,
    },
    /// Inspect and resolve constraint-evolution proposals
    Evolution {
        #[command(subcommand)]
        command: EvolutionCommands,
    },
}

#[derive(Subcommand, Clone)]
pub enum EvolutionCommands {
    /// List evolution items and their status
    List {
        /// Only show pending items
        #[arg(long)]
        pending: bool,
    },
    /// Verify cross-project evidence that the rule set is evolving
    Verify {
        /// Root directory containing project workspaces
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Mark a pending item as applied
    Apply { id: String },
    /// Mark a pending item as dismissed
    Dismiss { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Status => cmd::cmd_status(&project_dir)?,
        Commands::Validate { phase } => cmd::cmd_validate(&project_dir, phase)?,
        Commands::Structure => cmd::cmd_structure(&project_dir)?,
        Commands::Recover => cmd::cmd_recover(&project_dir)?,
        Commands::Hooks {
            file,
            hook,
            sibling,
        } => cmd::cmd_hooks(&project_dir, file, hook.as_deref(), sibling.as_deref())?,
        Commands::Evolution { command } => cmd::cmd_evolution(&project_dir, command.clone())?,
    }
    Ok(())
}
