//! Auto-advance planning.
//!
//! Advancement is lazy: a schedule read plans at most one new placement
//! and nothing advances on a timer. `plan_advance` is a pure function
//! from a snapshot of (person, placements, catalog, counter, today) to
//! a single decision; the engine applies the decision through the
//! ledger's guarded commits and re-plans when a commit loses a race.
//! Planning the same snapshot twice yields the same decision, and a
//! snapshot that already has a current or upcoming placement plans
//! nothing, which is what makes repeated reads idempotent.

use chrono::{Days, NaiveDate};

use rota_ledger::{Person, Placement, Unit};

use crate::error::{EngineError, EngineResult};
use crate::selector::{self, Selection};

/// One planned advance step.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvancePlan {
    /// Insert the person's first placement. The round-robin counter must
    /// still equal `offset` at commit time; the commit bumps it.
    CreateFirst {
        unit: Unit,
        start: NaiveDate,
        end: NaiveDate,
        offset: u64,
    },
    /// Insert the next placement of the person's cycle.
    CreateNext {
        unit: Unit,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Nothing to do.
    Skip(SkipReason),
}

/// Why an advance pass decided not to create a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A placement still contains today or starts after it.
    CurrentOrUpcoming,
    /// Cycle finished with no extension days left to absorb.
    CycleComplete,
    /// No units configured.
    EmptyCatalog,
}

/// Decide the next advance step for one person.
pub fn plan_advance(
    person: &Person,
    placements: &[Placement],
    catalog: &[Unit],
    counter_offset: u64,
    today: NaiveDate,
) -> EngineResult<AdvancePlan> {
    if catalog.is_empty() {
        return Ok(AdvancePlan::Skip(SkipReason::EmptyCatalog));
    }
    if placements.iter().any(|p| p.current_or_upcoming(today)) {
        return Ok(AdvancePlan::Skip(SkipReason::CurrentOrUpcoming));
    }

    // Most recent placement by end date, manual or automatic. Absent
    // means no history at all: first placement via the counter offset.
    let Some(last) = placements.iter().max_by_key(|p| (p.end, p.id)) else {
        let Some(unit) = selector::initial_unit(catalog, counter_offset) else {
            return Ok(AdvancePlan::Skip(SkipReason::EmptyCatalog));
        };
        let start = if person.start_date < today {
            next_day(today)?
        } else {
            person.start_date
        };
        let end = placement_end(start, &unit)?;
        return Ok(AdvancePlan::CreateFirst {
            unit,
            start,
            end,
            offset: counter_offset,
        });
    };

    let view = selector::cycle_view(catalog, placements);
    if view.complete && person.extension_days == 0 {
        return Ok(AdvancePlan::Skip(SkipReason::CycleComplete));
    }

    let mut start = next_day(last.end)?;
    if start < today {
        start = next_day(today)?;
    }
    match selector::next_unit(catalog, &view.covered, Some(last.unit_id)) {
        Selection::Unit(unit) => {
            let end = placement_end(start, &unit)?;
            Ok(AdvancePlan::CreateNext { unit, start, end })
        }
        Selection::CycleComplete => Ok(AdvancePlan::Skip(SkipReason::CycleComplete)),
        Selection::EmptyCatalog => Ok(AdvancePlan::Skip(SkipReason::EmptyCatalog)),
    }
}

/// The day after `date`, with calendar overflow surfaced as an error.
fn next_day(date: NaiveDate) -> EngineResult<NaiveDate> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| EngineError::Validation(format!("date overflow after {date}")))
}

/// Inclusive end of a placement starting at `start` in `unit`.
pub(crate) fn placement_end(start: NaiveDate, unit: &Unit) -> EngineResult<NaiveDate> {
    if unit.duration_days == 0 {
        return Err(EngineError::Validation(format!(
            "unit {} has zero duration",
            unit.id
        )));
    }
    start
        .checked_add_days(Days::new(u64::from(unit.duration_days - 1)))
        .ok_or_else(|| EngineError::Validation(format!("date overflow after {start}")))
}
