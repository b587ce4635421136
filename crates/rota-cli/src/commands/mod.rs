pub mod extend;
pub mod person;
pub mod schedule;
pub mod unit;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rota_engine::{Engine, FixedClock, RotaConfig};
use rota_ledger::{Batch, ExtensionReason, LedgerStore, PersonStatus, WorkloadTier};
use tracing::debug;

/// Open the ledger named by the config file and build an engine over it.
///
/// `--today` pins the clock to a fixed date, useful for previewing how
/// a schedule will advance without waiting for the calendar.
pub fn open_engine(config_path: &Path, today: Option<NaiveDate>) -> Result<Engine> {
    let config = RotaConfig::from_file(config_path).with_context(|| {
        format!(
            "load {} (run `rota config init` to create one)",
            config_path.display()
        )
    })?;
    debug!("loaded config from {}", config_path.display());
    let store = LedgerStore::open(&config.data_path)
        .with_context(|| format!("open ledger {}", config.data_path.display()))?;
    match today {
        Some(date) => Ok(Engine::with_clock(
            store,
            config.engine,
            Arc::new(FixedClock(date)),
        )),
        None => Ok(Engine::new(store, config.engine)?),
    }
}

/// Write a default rota.toml pointing at `data_path`.
pub fn config_init(config_path: &Path, data_path: &Path) -> Result<()> {
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }
    let config = RotaConfig::scaffold(data_path);
    std::fs::write(config_path, config.to_toml_string()?)
        .with_context(|| format!("write {}", config_path.display()))?;
    println!("✓ Generated {}", config_path.display());
    Ok(())
}

pub fn parse_batch(s: &str) -> Result<Batch> {
    match s {
        "a" | "A" => Ok(Batch::A),
        "b" | "B" => Ok(Batch::B),
        _ => bail!("unknown batch: {s}. Expected a or b."),
    }
}

pub fn parse_workload(s: &str) -> Result<WorkloadTier> {
    match s {
        "low" => Ok(WorkloadTier::Low),
        "medium" => Ok(WorkloadTier::Medium),
        "high" => Ok(WorkloadTier::High),
        _ => bail!("unknown workload tier: {s}. Expected low, medium, or high."),
    }
}

pub fn parse_status(s: &str) -> Result<PersonStatus> {
    match s {
        "active" => Ok(PersonStatus::Active),
        "extended" => Ok(PersonStatus::Extended),
        "completed" => Ok(PersonStatus::Completed),
        _ => bail!("unknown status: {s}. Expected active, extended, or completed."),
    }
}

pub fn parse_reason(s: &str) -> Result<ExtensionReason> {
    match s {
        "sign_out" => Ok(ExtensionReason::SignOut),
        "presentation" => Ok(ExtensionReason::Presentation),
        "internal_query" => Ok(ExtensionReason::InternalQuery),
        "leave" => Ok(ExtensionReason::Leave),
        "other" => Ok(ExtensionReason::Other),
        _ => bail!(
            "unknown reason: {s}. Expected sign_out, presentation, internal_query, leave, or other."
        ),
    }
}
