//! rota — admin CLI for the rotation scheduling engine.
//!
//! Every command opens the ledger named by `rota.toml` and drives the
//! engine directly; there is no daemon. Schedules advance lazily when
//! read, so `rota schedule` is both the view and the trigger.
//!
//! # Usage
//!
//! ```text
//! rota config init
//! rota unit add --name cardiology --days 14 --workload high
//! rota person add --name "A. Lovelace" --batch a --start 2024-01-01
//! rota schedule 1
//! rota extend 1 --total 5 --reason leave --note "family leave"
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "rota",
    about = "Rota — rotation scheduling engine",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path of the rota.toml config file.
    #[arg(short, long, default_value = "rota.toml", global = true)]
    config: PathBuf,

    /// Pin today's date (YYYY-MM-DD) instead of using the clock.
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the rota.toml config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage the unit catalog
    Unit {
        #[command(subcommand)]
        action: UnitAction,
    },
    /// Manage people
    Person {
        #[command(subcommand)]
        action: PersonAction,
    },
    /// Show a person's schedule, advancing it first if a placement is due
    Schedule {
        /// Person id
        person: u64,
    },
    /// Splice a manual placement into a person's schedule
    Place {
        /// Person id
        person: u64,
        /// Unit id
        unit: u32,
        /// First day of the placement (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day, inclusive (default: start + unit duration - 1)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Grant or adjust a person's extension days
    Extend {
        /// Person id
        person: u64,
        /// New cumulative total of extension days
        #[arg(long)]
        total: u32,
        /// Reason: sign_out, presentation, internal_query, leave, other
        #[arg(long)]
        reason: String,
        #[arg(long, default_value = "")]
        note: String,
        /// Pin the adjustment to this unit's latest placement
        #[arg(long)]
        unit: Option<u32>,
    },
    /// List a person's extension audit records
    Audit {
        /// Person id
        person: u64,
    },
    /// Head-count per lifecycle status
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default rota.toml
    Init {
        /// Ledger file the config will point at
        #[arg(long, default_value = "rota.redb")]
        data_path: PathBuf,
    },
}

#[derive(Subcommand)]
enum UnitAction {
    /// Append a unit to the rotation order
    Add {
        #[arg(long)]
        name: String,
        /// Placement length in days
        #[arg(long)]
        days: u32,
        /// Workload tier: low, medium, high
        #[arg(long, default_value = "medium")]
        workload: String,
    },
    /// List the catalog in rotation order
    List,
    /// Change a unit's duration or workload tier
    Set {
        /// Unit id
        id: u32,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        workload: Option<String>,
    },
    /// Remove a unit; placement history referencing it is kept
    Rm {
        /// Unit id
        id: u32,
    },
}

#[derive(Subcommand)]
enum PersonAction {
    /// Register a person and schedule their first placement
    Add {
        #[arg(long)]
        name: String,
        /// Intake batch: a or b
        #[arg(long)]
        batch: String,
        /// First day available for placement (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Register without scheduling the first placement
        #[arg(long)]
        no_first_rotation: bool,
    },
    /// List people, optionally filtered by status
    List {
        /// Filter: active, extended, completed
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one person's record
    Show {
        /// Person id
        id: u64,
    },
    /// Remove a person together with their placements and audit trail
    Rm {
        /// Person id
        id: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rota=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Init { data_path } => commands::config_init(&cli.config, &data_path),
        },
        Commands::Unit { action } => {
            let engine = commands::open_engine(&cli.config, cli.today)?;
            match action {
                UnitAction::Add {
                    name,
                    days,
                    workload,
                } => commands::unit::add(&engine, &name, days, &workload),
                UnitAction::List => commands::unit::list(&engine),
                UnitAction::Set { id, days, workload } => {
                    commands::unit::set(&engine, id, days, workload.as_deref())
                }
                UnitAction::Rm { id } => commands::unit::rm(&engine, id),
            }
        }
        Commands::Person { action } => {
            let engine = commands::open_engine(&cli.config, cli.today)?;
            match action {
                PersonAction::Add {
                    name,
                    batch,
                    start,
                    no_first_rotation,
                } => commands::person::add(&engine, &name, &batch, start, !no_first_rotation).await,
                PersonAction::List { status } => {
                    commands::person::list(&engine, status.as_deref())
                }
                PersonAction::Show { id } => commands::person::show(&engine, id),
                PersonAction::Rm { id } => commands::person::rm(&engine, id).await,
            }
        }
        Commands::Schedule { person } => {
            let engine = commands::open_engine(&cli.config, cli.today)?;
            commands::schedule::show(&engine, person).await
        }
        Commands::Place {
            person,
            unit,
            start,
            end,
        } => {
            let engine = commands::open_engine(&cli.config, cli.today)?;
            commands::schedule::place(&engine, person, unit, start, end).await
        }
        Commands::Extend {
            person,
            total,
            reason,
            note,
            unit,
        } => {
            let engine = commands::open_engine(&cli.config, cli.today)?;
            commands::extend::extend(&engine, person, total, &reason, &note, unit).await
        }
        Commands::Audit { person } => {
            let engine = commands::open_engine(&cli.config, cli.today)?;
            commands::extend::audit(&engine, person)
        }
        Commands::Status => {
            let engine = commands::open_engine(&cli.config, cli.today)?;
            commands::person::status_summary(&engine)
        }
    }
}
