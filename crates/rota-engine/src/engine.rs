//! Engine — the rotation scheduler's operational surface.
//!
//! Wires the ledger, clock, and per-person locks behind the operations
//! callers use: schedule reads (which advance lazily), extensions,
//! person creation, status reconciliation, and catalog administration.
//! Every read-decide-write sequence runs under the person's lock; the
//! guarded ledger commits catch whatever races remain across processes.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use rota_ledger::{
    Batch, ExtensionReason, ExtensionRecord, LedgerError, LedgerStore, Person, PersonId,
    PersonStatus, Placement, Unit, UnitId, WorkloadTier,
};

use crate::advance::{self, AdvancePlan, SkipReason};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::extension::{self, ExtensionOutcome};
use crate::locks::PersonLocks;
use crate::reconcile;

/// Rotation scheduling engine over a [`LedgerStore`].
pub struct Engine {
    store: LedgerStore,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    locks: PersonLocks,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build an engine using the wall clock in the configured reference
    /// offset.
    pub fn new(store: LedgerStore, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let clock = SystemClock::from_offset_hours(config.utc_offset_hours).ok_or_else(|| {
            EngineError::Config(format!(
                "invalid utc offset: {}",
                config.utc_offset_hours
            ))
        })?;
        Ok(Self::with_clock(store, config, Arc::new(clock)))
    }

    /// Build an engine with an explicit clock (tests, dry runs).
    pub fn with_clock(store: LedgerStore, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
            locks: PersonLocks::default(),
        }
    }

    // ── People ─────────────────────────────────────────────────────

    /// Register a person. With `generate_first` their first placement is
    /// created immediately; otherwise the first schedule read creates it.
    pub async fn create_person(
        &self,
        name: &str,
        batch: Batch,
        start_date: NaiveDate,
        generate_first: bool,
    ) -> EngineResult<Person> {
        let person = self.store.insert_person(name, batch, start_date)?;
        info!(person_id = person.id, name, ?batch, %start_date, "person created");
        if generate_first {
            self.ensure_advanced(person.id).await?;
            return self.require_person(person.id);
        }
        Ok(person)
    }

    /// Fetch a person by id.
    pub fn get_person(&self, person_id: PersonId) -> EngineResult<Person> {
        self.require_person(person_id)
    }

    /// All people in id order.
    pub fn list_persons(&self) -> EngineResult<Vec<Person>> {
        Ok(self.store.list_persons()?)
    }

    /// People currently carrying the given status.
    pub fn list_persons_by_status(&self, status: PersonStatus) -> EngineResult<Vec<Person>> {
        Ok(self.store.list_persons_by_status(status)?)
    }

    /// Head-count per lifecycle status.
    pub fn status_counts(&self) -> EngineResult<Vec<(PersonStatus, usize)>> {
        let statuses = [
            PersonStatus::Active,
            PersonStatus::Extended,
            PersonStatus::Completed,
        ];
        let mut counts = Vec::with_capacity(statuses.len());
        for status in statuses {
            counts.push((status, self.store.count_persons_by_status(status)?));
        }
        Ok(counts)
    }

    /// Remove a person together with their placements and audit trail.
    pub async fn remove_person(&self, person_id: PersonId) -> EngineResult<bool> {
        let _guard = self.locks.acquire(person_id).await;
        Ok(self.store.delete_person(person_id)?)
    }

    // ── Schedule ───────────────────────────────────────────────────

    /// A person's placements in start order, advancing the schedule
    /// first so the result always shows what is current or next.
    pub async fn get_schedule(&self, person_id: PersonId) -> EngineResult<Vec<Placement>> {
        self.ensure_advanced(person_id).await?;
        Ok(self.store.placements_for_person(person_id)?)
    }

    /// Splice a manual placement into a schedule. `end` defaults to the
    /// unit's configured duration.
    pub async fn place_manual(
        &self,
        person_id: PersonId,
        unit_id: UnitId,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> EngineResult<Placement> {
        let _guard = self.locks.acquire(person_id).await;
        self.require_person(person_id)?;
        let unit = self
            .store
            .get_unit(unit_id)?
            .ok_or(EngineError::UnitNotFound(unit_id))?;
        let end = match end {
            Some(end) if end < start => {
                return Err(EngineError::Validation(format!(
                    "end {end} precedes start {start}"
                )));
            }
            Some(end) => end,
            None => advance::placement_end(start, &unit)?,
        };
        let placement = self
            .store
            .insert_manual_placement(person_id, unit_id, start, end)?;
        info!(
            person_id,
            unit_id,
            placement_id = placement.id,
            start = %placement.start,
            end = %placement.end,
            "manual placement spliced"
        );
        self.reconcile_locked(person_id, self.clock.today())?;
        Ok(placement)
    }

    /// Recompute and store one person's status.
    pub async fn reconcile_status(&self, person_id: PersonId) -> EngineResult<PersonStatus> {
        let _guard = self.locks.acquire(person_id).await;
        self.reconcile_locked(person_id, self.clock.today())
    }

    // ── Extensions ─────────────────────────────────────────────────

    /// Apply an extension or adjustment. `total_days` is the person's
    /// new cumulative total; the placement shift is the difference from
    /// the previous total.
    pub async fn extend_person(
        &self,
        person_id: PersonId,
        total_days: u32,
        reason: ExtensionReason,
        note: &str,
        target_unit: Option<UnitId>,
    ) -> EngineResult<ExtensionOutcome> {
        let _guard = self.locks.acquire(person_id).await;
        let today = self.clock.today();

        let mut person = self.require_person(person_id)?;
        if let Some(unit_id) = target_unit {
            if self.store.get_unit(unit_id)?.is_none() {
                return Err(EngineError::UnitNotFound(unit_id));
            }
        }
        let catalog = self.store.list_units()?;
        let placements = self.store.placements_for_person(person_id)?;

        let delta = i64::from(total_days) - i64::from(person.extension_days);
        // A zero delta changes no dates; resolving a target would only
        // flip its manual flag for nothing.
        let target = if delta == 0 {
            None
        } else {
            extension::resolve_target(&placements, target_unit, today, self.config.grace_window_days)
        };
        let adjusted = match target {
            Some(placement) => Some(extension::shift_end(placement, delta)?),
            None => None,
        };

        person.extension_days = total_days;
        let mut projected = placements.clone();
        if let Some(updated) = &adjusted {
            if let Some(slot) = projected.iter_mut().find(|p| p.id == updated.id) {
                *slot = updated.clone();
            }
        }
        person.status = reconcile::derive_status(&person, &projected, &catalog, today);
        self.store.commit_extension(&person, adjusted.as_ref())?;

        match &adjusted {
            Some(placement) => info!(
                person_id,
                placement_id = placement.id,
                delta,
                total_days,
                end = %placement.end,
                "placement adjusted"
            ),
            None => info!(
                person_id,
                delta, total_days, "extension recorded, schedule unchanged"
            ),
        }

        // The audit trail must never fail the applied extension.
        if let Err(e) =
            self.store
                .append_extension_record(person_id, delta, reason, note, Utc::now())
        {
            warn!(person_id, error = %e, "audit record write failed");
        }

        Ok(ExtensionOutcome {
            status: person.status,
            adjusted,
            delta_days: delta,
        })
    }

    /// A person's extension audit trail in append order.
    pub fn extension_history(&self, person_id: PersonId) -> EngineResult<Vec<ExtensionRecord>> {
        self.require_person(person_id)?;
        Ok(self.store.extensions_for_person(person_id)?)
    }

    // ── Catalog ────────────────────────────────────────────────────

    /// Append a unit to the rotation order.
    pub fn add_unit(
        &self,
        name: &str,
        duration_days: u32,
        workload: WorkloadTier,
    ) -> EngineResult<Unit> {
        if duration_days == 0 {
            return Err(EngineError::Validation(
                "unit duration must be at least one day".to_string(),
            ));
        }
        Ok(self.store.insert_unit(name, duration_days, workload)?)
    }

    /// The unit catalog in rotation order.
    pub fn list_units(&self) -> EngineResult<Vec<Unit>> {
        Ok(self.store.list_units()?)
    }

    /// Change a unit's duration or workload tier. Existing placements
    /// keep their dates; only future selections see the change.
    pub fn update_unit(
        &self,
        unit_id: UnitId,
        duration_days: Option<u32>,
        workload: Option<WorkloadTier>,
    ) -> EngineResult<Unit> {
        let mut unit = self
            .store
            .get_unit(unit_id)?
            .ok_or(EngineError::UnitNotFound(unit_id))?;
        if let Some(days) = duration_days {
            if days == 0 {
                return Err(EngineError::Validation(
                    "unit duration must be at least one day".to_string(),
                ));
            }
            unit.duration_days = days;
        }
        if let Some(tier) = workload {
            unit.workload = tier;
        }
        self.store.update_unit(&unit)?;
        Ok(unit)
    }

    /// Remove a unit from the catalog. History referencing it is kept.
    pub fn remove_unit(&self, unit_id: UnitId) -> EngineResult<bool> {
        Ok(self.store.delete_unit(unit_id)?)
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Advance one person's schedule by at most one placement, retrying
    /// when a guarded commit loses its race, then reconcile status.
    async fn ensure_advanced(&self, person_id: PersonId) -> EngineResult<()> {
        let _guard = self.locks.acquire(person_id).await;
        let today = self.clock.today();
        let mut attempts = 0u32;
        loop {
            let person = self.require_person(person_id)?;
            let catalog = self.store.list_units()?;
            let placements = self.store.placements_for_person(person_id)?;
            let offset = self.store.round_robin_offset()?;

            let commit = match advance::plan_advance(&person, &placements, &catalog, offset, today)?
            {
                AdvancePlan::Skip(SkipReason::EmptyCatalog) => {
                    warn!(person_id, "no units configured, schedule left as is");
                    break;
                }
                AdvancePlan::Skip(reason) => {
                    debug!(person_id, ?reason, "no advance needed");
                    break;
                }
                AdvancePlan::CreateFirst {
                    unit,
                    start,
                    end,
                    offset,
                } => self
                    .store
                    .commit_first_placement(person_id, unit.id, start, end, offset),
                AdvancePlan::CreateNext { unit, start, end } => {
                    self.store.commit_auto_placement(person_id, unit.id, start, end)
                }
            };

            match commit {
                Ok(placement) => {
                    info!(
                        person_id,
                        unit_id = placement.unit_id,
                        placement_id = placement.id,
                        start = %placement.start,
                        end = %placement.end,
                        "placement scheduled"
                    );
                    break;
                }
                Err(LedgerError::Conflict(reason)) => {
                    attempts += 1;
                    if attempts >= self.config.commit_retries {
                        return Err(EngineError::Contention(attempts));
                    }
                    debug!(person_id, attempts, %reason, "commit conflicted, re-planning");
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.reconcile_locked(person_id, today)?;
        Ok(())
    }

    /// Reconcile status with the person lock already held. Writes back
    /// only on drift.
    fn reconcile_locked(&self, person_id: PersonId, today: NaiveDate) -> EngineResult<PersonStatus> {
        let mut person = self.require_person(person_id)?;
        let catalog = self.store.list_units()?;
        let placements = self.store.placements_for_person(person_id)?;
        let status = reconcile::derive_status(&person, &placements, &catalog, today);
        if status != person.status {
            debug!(person_id, from = ?person.status, to = ?status, "status reconciled");
            person.status = status;
            self.store.update_person(&person)?;
        }
        Ok(status)
    }

    fn require_person(&self, person_id: PersonId) -> EngineResult<Person> {
        self.store
            .get_person(person_id)?
            .ok_or(EngineError::PersonNotFound(person_id))
    }
}
