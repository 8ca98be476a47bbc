//! `ward`: a tamper-evident patient record ledger.
//!
//! Records live in a self-balancing tree. Every change is written to an
//! append-only log together with the fingerprint of the resulting tree, so
//! the history can be replayed and verified, and rolled back.
//!
//! # Usage
//!
//! ```text
//! ward add 1 Ann --disease flu          # add a record
//! ward update 1 --cured true            # change fields of a record
//! ward remove 1                         # delete a record
//! ward list                             # all records by id
//! ward history                          # log entries, oldest first
//! ward audit                            # replay and verify the whole log
//! ward audit --steps 3                  # step through the first 3 entries
//! ward rollback 2                       # undo the last 2 entries
//! ward purge --yes                      # delete all history
//! ward -c ward.toml -d ./data list      # explicit config and data dir
//! ```

mod commands;
mod config;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use tracing::debug;
use ward_ledger::{Ledger, LedgerStores};
use ward_log::SystemClock;
use ward_types::{PatientData, PatientId, PatientPatch};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "ward", version, about = "Tamper-evident patient record ledger")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "WARD_CONFIG")]
    config: Option<PathBuf>,

    /// Override the data directory.
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory (nothing is persisted).
    #[arg(short, long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new patient record.
    Add {
        #[arg(allow_negative_numbers = true)]
        id: PatientId,
        name: String,
        /// Mark the patient as cured.
        #[arg(long)]
        cured: bool,
        /// A diagnosed disease. Repeat for several.
        #[arg(long = "disease", value_parser = NonEmptyStringValueParser::new())]
        diseases: Vec<String>,
    },

    /// Change fields of an existing record.
    Update {
        #[arg(allow_negative_numbers = true)]
        id: PatientId,
        #[arg(long)]
        name: Option<String>,
        /// `true` or `false`.
        #[arg(long)]
        cured: Option<bool>,
        /// Replace the disease list. Repeat for several.
        #[arg(long = "disease", value_parser = NonEmptyStringValueParser::new())]
        diseases: Vec<String>,
        /// Replace the disease list with an empty one.
        #[arg(long, conflicts_with = "diseases")]
        clear_diseases: bool,
    },

    /// Delete a record.
    Remove {
        #[arg(allow_negative_numbers = true)]
        id: PatientId,
    },

    /// Print one record.
    Show {
        #[arg(allow_negative_numbers = true)]
        id: PatientId,
    },

    /// Print all records in id order.
    List,

    /// Print the mutation log, oldest first.
    History,

    /// Replay the log from the empty tree and verify every entry.
    Audit {
        /// Only step through the first N entries.
        #[arg(long)]
        steps: Option<usize>,
    },

    /// Undo the last K entries.
    Rollback { steps: usize },

    /// Delete the whole log and the snapshot.
    Purge {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Validate the tree invariants and print the fingerprint.
    Check,
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    if let Some(dir) = cli.data_dir {
        config.ledger.data_dir = dir;
    }
    if cli.memory {
        config.ledger.backend = "memory".to_string();
    }

    let mut ledger = open_ledger(&config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Add {
            id,
            name,
            cured,
            diseases,
        } => commands::cmd_add(
            &mut ledger,
            PatientData::new(id, name, cured, diseases),
            &mut out,
        ),
        Commands::Update {
            id,
            name,
            cured,
            diseases,
            clear_diseases,
        } => {
            let patch = PatientPatch {
                name,
                cured,
                diseases: (clear_diseases || !diseases.is_empty()).then_some(diseases),
            };
            commands::cmd_update(&mut ledger, id, patch, &mut out)
        }
        Commands::Remove { id } => commands::cmd_remove(&mut ledger, id, &mut out),
        Commands::Show { id } => commands::cmd_show(&ledger, id, &mut out),
        Commands::List => commands::cmd_list(&ledger, &mut out),
        Commands::History => commands::cmd_history(&ledger, &mut out),
        Commands::Audit { steps } => commands::cmd_audit(&ledger, steps, &mut out),
        Commands::Rollback { steps } => commands::cmd_rollback(&mut ledger, steps, &mut out),
        Commands::Purge { yes } => commands::cmd_purge(&mut ledger, yes, &mut out),
        Commands::Check => commands::cmd_check(&ledger, &mut out),
    }?;

    out.flush()?;
    Ok(())
}

/// Logs go to stderr so command output on stdout stays clean.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_ledger(config: &CliConfig) -> Result<Ledger> {
    let stores = if config.is_memory() {
        LedgerStores::in_memory()
    } else {
        let dir = &config.ledger.data_dir;
        debug!(data_dir = %dir.display(), "using on-disk ledger");
        LedgerStores::on_disk(dir)
            .with_context(|| format!("cannot open data directory {}", dir.display()))?
    };
    Ledger::open(stores, config.ledger_config(), Box::new(SystemClock))
        .context("failed to open ledger")
}
