//! LedgerStore — redb-backed persistence for the rotation scheduler.
//!
//! Provides typed CRUD operations over people, units, placements, and
//! extension audit records, plus the guarded commits the scheduling
//! engine relies on: the round-robin counter bump (compare-and-set) and
//! the duplicate-advance check, both re-validated inside the write
//! transaction that inserts the placement. All values are
//! JSON-serialized into redb's `&[u8]` value columns. The store supports
//! both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `LedgerError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| LedgerError::$variant(e.to_string())
    };
}

/// Allocate the next id from a meta sequence. Sequences start at 1.
macro_rules! alloc_id {
    ($meta:expr, $key:expr) => {{
        let next = $meta
            .get($key)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value())
            .unwrap_or(1);
        $meta.insert($key, next + 1).map_err(map_err!(Write))?;
        next
    }};
}

/// Thread-safe rotation ledger backed by redb.
#[derive(Clone)]
pub struct LedgerStore {
    db: Arc<Database>,
}

impl LedgerStore {
    /// Open (or create) a persistent ledger at the given path.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "ledger opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory ledger (for testing).
    pub fn open_in_memory() -> LedgerResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory ledger opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> LedgerResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PERSONS).map_err(map_err!(Table))?;
        txn.open_table(UNITS).map_err(map_err!(Table))?;
        txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;
        txn.open_table(EXTENSIONS).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── People ─────────────────────────────────────────────────────

    /// Insert a new person. The ledger allocates the id; status starts
    /// `Active` with zero extension days.
    pub fn insert_person(
        &self,
        name: &str,
        batch: Batch,
        start_date: NaiveDate,
    ) -> LedgerResult<Person> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let person;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let mut table = txn.open_table(PERSONS).map_err(map_err!(Table))?;
            let id = alloc_id!(meta, META_NEXT_PERSON);
            person = Person {
                id,
                name: name.to_string(),
                batch,
                start_date,
                status: PersonStatus::Active,
                extension_days: 0,
            };
            let value = serde_json::to_vec(&person).map_err(map_err!(Serialize))?;
            table
                .insert(person.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(person_id = person.id, name, "person inserted");
        Ok(person)
    }

    /// Get a person by id.
    pub fn get_person(&self, person_id: PersonId) -> LedgerResult<Option<Person>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PERSONS).map_err(map_err!(Table))?;
        match table.get(person_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let person: Person =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(person))
            }
            None => Ok(None),
        }
    }

    /// List all people in id order.
    pub fn list_persons(&self) -> LedgerResult<Vec<Person>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PERSONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let person: Person =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(person);
        }
        Ok(results)
    }

    /// List people whose stored status matches `status`, in id order.
    pub fn list_persons_by_status(&self, status: PersonStatus) -> LedgerResult<Vec<Person>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PERSONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let person: Person =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if person.status == status {
                results.push(person);
            }
        }
        Ok(results)
    }

    /// Count people whose stored status matches `status`.
    pub fn count_persons_by_status(&self, status: PersonStatus) -> LedgerResult<usize> {
        Ok(self.list_persons_by_status(status)?.len())
    }

    /// Write back an updated person. Errors if the person does not exist.
    pub fn update_person(&self, person: &Person) -> LedgerResult<()> {
        let value = serde_json::to_vec(person).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PERSONS).map_err(map_err!(Table))?;
            if table.get(person.id).map_err(map_err!(Read))?.is_none() {
                return Err(LedgerError::NotFound(format!("person {}", person.id)));
            }
            table
                .insert(person.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Delete a person together with their placements and audit records.
    /// Returns true if the person existed.
    pub fn delete_person(&self, person_id: PersonId) -> LedgerResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut persons = txn.open_table(PERSONS).map_err(map_err!(Table))?;
            existed = persons.remove(person_id).map_err(map_err!(Write))?.is_some();

            let mut placements = txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;
            let keys: Vec<(u64, u64)> = placements
                .range((person_id, 0)..=(person_id, u64::MAX))
                .map_err(map_err!(Read))?
                .filter_map(|entry| entry.ok().map(|(key, _)| key.value()))
                .collect();
            for key in keys {
                placements.remove(key).map_err(map_err!(Write))?;
            }

            let mut extensions = txn.open_table(EXTENSIONS).map_err(map_err!(Table))?;
            let keys: Vec<(u64, u64)> = extensions
                .range((person_id, 0)..=(person_id, u64::MAX))
                .map_err(map_err!(Read))?
                .filter_map(|entry| entry.ok().map(|(key, _)| key.value()))
                .collect();
            for key in keys {
                extensions.remove(key).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(person_id, existed, "person deleted");
        Ok(existed)
    }

    // ── Units ──────────────────────────────────────────────────────

    /// Insert a new unit at the end of the rotation order.
    pub fn insert_unit(
        &self,
        name: &str,
        duration_days: u32,
        workload: WorkloadTier,
    ) -> LedgerResult<Unit> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let unit;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let mut table = txn.open_table(UNITS).map_err(map_err!(Table))?;
            let id = alloc_id!(meta, META_NEXT_UNIT) as u32;
            unit = Unit {
                id,
                name: name.to_string(),
                duration_days,
                workload,
            };
            let value = serde_json::to_vec(&unit).map_err(map_err!(Serialize))?;
            table
                .insert(unit.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(unit_id = unit.id, name, "unit inserted");
        Ok(unit)
    }

    /// Get a unit by id.
    pub fn get_unit(&self, unit_id: UnitId) -> LedgerResult<Option<Unit>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(UNITS).map_err(map_err!(Table))?;
        match table.get(unit_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let unit: Unit =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(unit))
            }
            None => Ok(None),
        }
    }

    /// List the unit catalog in rotation order (ascending id).
    pub fn list_units(&self) -> LedgerResult<Vec<Unit>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(UNITS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let unit: Unit =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(unit);
        }
        Ok(results)
    }

    /// Write back an updated unit. Errors if the unit does not exist.
    pub fn update_unit(&self, unit: &Unit) -> LedgerResult<()> {
        let value = serde_json::to_vec(unit).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(UNITS).map_err(map_err!(Table))?;
            if table.get(unit.id).map_err(map_err!(Read))?.is_none() {
                return Err(LedgerError::NotFound(format!("unit {}", unit.id)));
            }
            table
                .insert(unit.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Delete a unit from the catalog. Returns true if it existed.
    /// Existing placements that reference the unit are kept as history.
    pub fn delete_unit(&self, unit_id: UnitId) -> LedgerResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(UNITS).map_err(map_err!(Table))?;
            existed = table.remove(unit_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(unit_id, existed, "unit deleted");
        Ok(existed)
    }

    // ── Placements ─────────────────────────────────────────────────

    /// Commit a person's very first automatic placement.
    ///
    /// The round-robin counter is compare-and-set inside the same write
    /// transaction: if it no longer equals `expected_offset`, or the
    /// person gained placements since the caller's read, nothing is
    /// written and `Conflict` is returned so the caller can re-plan.
    pub fn commit_first_placement(
        &self,
        person_id: PersonId,
        unit_id: UnitId,
        start: NaiveDate,
        end: NaiveDate,
        expected_offset: u64,
    ) -> LedgerResult<Placement> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let placement;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let mut table = txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;

            let current = meta
                .get(META_ROUND_ROBIN)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value())
                .unwrap_or(0);
            if current != expected_offset {
                return Err(LedgerError::Conflict(format!(
                    "round-robin offset moved: expected {expected_offset}, found {current}"
                )));
            }
            let has_history = table
                .range((person_id, 0)..=(person_id, u64::MAX))
                .map_err(map_err!(Read))?
                .next()
                .is_some();
            if has_history {
                return Err(LedgerError::Conflict(format!(
                    "person {person_id} already has placements"
                )));
            }

            let id = alloc_id!(meta, META_NEXT_PLACEMENT);
            placement = Placement {
                id,
                person_id,
                unit_id,
                start,
                end,
                manual: false,
            };
            let value = serde_json::to_vec(&placement).map_err(map_err!(Serialize))?;
            table
                .insert((person_id, id), value.as_slice())
                .map_err(map_err!(Write))?;
            meta.insert(META_ROUND_ROBIN, expected_offset + 1)
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            person_id,
            unit_id,
            placement_id = placement.id,
            offset = expected_offset + 1,
            "first placement committed"
        );
        Ok(placement)
    }

    /// Commit a follow-up automatic placement.
    ///
    /// Re-checks inside the write transaction that no other automatic
    /// placement for the person starts on or after `start`; if one does,
    /// a concurrent advance already won and `Conflict` is returned.
    pub fn commit_auto_placement(
        &self,
        person_id: PersonId,
        unit_id: UnitId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Placement> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let placement;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let mut table = txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;

            for entry in table
                .range((person_id, 0)..=(person_id, u64::MAX))
                .map_err(map_err!(Read))?
            {
                let (_, value) = entry.map_err(map_err!(Read))?;
                let existing: Placement =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                if !existing.manual && existing.start >= start {
                    return Err(LedgerError::Conflict(format!(
                        "auto placement {} for person {person_id} already starts on or after {start}",
                        existing.id
                    )));
                }
            }

            let id = alloc_id!(meta, META_NEXT_PLACEMENT);
            placement = Placement {
                id,
                person_id,
                unit_id,
                start,
                end,
                manual: false,
            };
            let value = serde_json::to_vec(&placement).map_err(map_err!(Serialize))?;
            table
                .insert((person_id, id), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            person_id,
            unit_id,
            placement_id = placement.id,
            "auto placement committed"
        );
        Ok(placement)
    }

    /// Insert an operator-spliced placement. No advance guard applies;
    /// the row is flagged manual from the start.
    pub fn insert_manual_placement(
        &self,
        person_id: PersonId,
        unit_id: UnitId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Placement> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let placement;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let mut table = txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;
            let id = alloc_id!(meta, META_NEXT_PLACEMENT);
            placement = Placement {
                id,
                person_id,
                unit_id,
                start,
                end,
                manual: true,
            };
            let value = serde_json::to_vec(&placement).map_err(map_err!(Serialize))?;
            table
                .insert((person_id, id), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            person_id,
            unit_id,
            placement_id = placement.id,
            "manual placement inserted"
        );
        Ok(placement)
    }

    /// List a person's placements ordered by start date (ties by end,
    /// then id).
    pub fn placements_for_person(&self, person_id: PersonId) -> LedgerResult<Vec<Placement>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range((person_id, 0)..=(person_id, u64::MAX))
            .map_err(map_err!(Read))?
        {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let placement: Placement =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(placement);
        }
        results.sort_by_key(|p| (p.start, p.end, p.id));
        Ok(results)
    }

    /// Move a placement's end date and set its manual flag. Returns the
    /// updated placement, or `NotFound` if it does not exist.
    pub fn update_placement_end(
        &self,
        person_id: PersonId,
        placement_id: PlacementId,
        end: NaiveDate,
        manual: bool,
    ) -> LedgerResult<Placement> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let placement;
        {
            let mut table = txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;
            let mut existing: Placement = match table
                .get((person_id, placement_id))
                .map_err(map_err!(Read))?
            {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => {
                    return Err(LedgerError::NotFound(format!(
                        "placement {placement_id} for person {person_id}"
                    )));
                }
            };
            existing.end = end;
            existing.manual = manual;
            let value = serde_json::to_vec(&existing).map_err(map_err!(Serialize))?;
            table
                .insert((person_id, placement_id), value.as_slice())
                .map_err(map_err!(Write))?;
            placement = existing;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(placement)
    }

    // ── Extensions ─────────────────────────────────────────────────

    /// Apply an extension outcome in one transaction: the person row is
    /// rewritten and, when a placement was adjusted, that row too.
    /// Neither write lands unless both do.
    pub fn commit_extension(
        &self,
        person: &Person,
        adjusted: Option<&Placement>,
    ) -> LedgerResult<()> {
        let person_value = serde_json::to_vec(person).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut persons = txn.open_table(PERSONS).map_err(map_err!(Table))?;
            if persons.get(person.id).map_err(map_err!(Read))?.is_none() {
                return Err(LedgerError::NotFound(format!("person {}", person.id)));
            }
            persons
                .insert(person.id, person_value.as_slice())
                .map_err(map_err!(Write))?;

            if let Some(placement) = adjusted {
                let mut placements = txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;
                let key = (placement.person_id, placement.id);
                if placements.get(key).map_err(map_err!(Read))?.is_none() {
                    return Err(LedgerError::NotFound(format!(
                        "placement {} for person {}",
                        placement.id, placement.person_id
                    )));
                }
                let value = serde_json::to_vec(placement).map_err(map_err!(Serialize))?;
                placements
                    .insert(key, value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            person_id = person.id,
            adjusted = adjusted.is_some(),
            "extension committed"
        );
        Ok(())
    }

    /// Append one audit record for an extension or adjustment request.
    pub fn append_extension_record(
        &self,
        person_id: PersonId,
        delta_days: i64,
        reason: ExtensionReason,
        note: &str,
        recorded_at: DateTime<Utc>,
    ) -> LedgerResult<ExtensionRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let mut table = txn.open_table(EXTENSIONS).map_err(map_err!(Table))?;
            let id = alloc_id!(meta, META_NEXT_EXTENSION);
            record = ExtensionRecord {
                id,
                person_id,
                delta_days,
                reason,
                note: note.to_string(),
                recorded_at,
            };
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert((person_id, id), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(record)
    }

    /// List a person's audit records in append order.
    pub fn extensions_for_person(
        &self,
        person_id: PersonId,
    ) -> LedgerResult<Vec<ExtensionRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(EXTENSIONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range((person_id, 0)..=(person_id, u64::MAX))
            .map_err(map_err!(Read))?
        {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: ExtensionRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    // ── Round-robin counter ────────────────────────────────────────

    /// Current value of the global round-robin fairness counter.
    pub fn round_robin_offset(&self) -> LedgerResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(META).map_err(map_err!(Table))?;
        Ok(table
            .get(META_ROUND_ROBIN)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }
}
