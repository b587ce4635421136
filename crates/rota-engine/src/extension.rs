//! Extension and adjustment processing.
//!
//! A request carries the person's new cumulative total of granted days;
//! the delta actually applied to a placement is the difference from the
//! previous total, so repeating a request is harmless and a lower total
//! shortens. Target resolution is an explicit strategy order, each a
//! pure query, tried in sequence with early return.

use chrono::{Duration, NaiveDate};

use rota_ledger::{PersonStatus, Placement, UnitId};

use crate::error::{EngineError, EngineResult};

/// Result of an extension request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionOutcome {
    /// Status after reconciliation.
    pub status: PersonStatus,
    /// The adjusted placement, absent when only the person record
    /// changed (partial success).
    pub adjusted: Option<Placement>,
    /// Signed day delta this call applied.
    pub delta_days: i64,
}

/// Pick the placement an adjustment applies to.
///
/// Order: the explicitly named unit's most recent placement, then the
/// placement containing `today`, then the most recently ended placement
/// still inside the grace window. `None` means the extension lands on
/// the person record only.
pub fn resolve_target<'a>(
    placements: &'a [Placement],
    target_unit: Option<UnitId>,
    today: NaiveDate,
    grace_days: u32,
) -> Option<&'a Placement> {
    if let Some(unit_id) = target_unit {
        if let Some(placement) = latest_for_unit(placements, unit_id) {
            return Some(placement);
        }
    }
    if let Some(placement) = covering(placements, today) {
        return Some(placement);
    }
    recently_ended(placements, today, grace_days)
}

/// Shift a placement's end by `delta_days` and flag it manual so
/// auto-advance never recomputes through it.
pub fn shift_end(placement: &Placement, delta_days: i64) -> EngineResult<Placement> {
    let end = placement
        .end
        .checked_add_signed(Duration::days(delta_days))
        .ok_or_else(|| {
            EngineError::Validation(format!(
                "date overflow adjusting placement {}",
                placement.id
            ))
        })?;
    if end < placement.start {
        return Err(EngineError::Validation(format!(
            "shortening by {} days would end placement {} before its {} start",
            delta_days.abs(),
            placement.id,
            placement.start
        )));
    }
    Ok(Placement {
        end,
        manual: true,
        ..placement.clone()
    })
}

fn latest_for_unit(placements: &[Placement], unit_id: UnitId) -> Option<&Placement> {
    placements
        .iter()
        .filter(|p| p.unit_id == unit_id)
        .max_by_key(|p| (p.end, p.id))
}

fn covering(placements: &[Placement], today: NaiveDate) -> Option<&Placement> {
    placements
        .iter()
        .filter(|p| p.contains(today))
        .max_by_key(|p| (p.end, p.id))
}

fn recently_ended(placements: &[Placement], today: NaiveDate, grace_days: u32) -> Option<&Placement> {
    placements
        .iter()
        .filter(|p| p.end < today && (today - p.end).num_days() <= i64::from(grace_days))
        .max_by_key(|p| (p.end, p.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn placement(id: u64, unit_id: UnitId, start: &str, end: &str) -> Placement {
        Placement {
            id,
            person_id: 1,
            unit_id,
            start: d(start),
            end: d(end),
            manual: false,
        }
    }

    // ── resolve_target ─────────────────────────────────────────────

    #[test]
    fn explicit_unit_beats_current() {
        let placements = vec![
            placement(1, 1, "2024-01-01", "2024-01-05"),
            placement(2, 2, "2024-01-06", "2024-01-12"),
        ];
        // Today sits inside placement 2, but unit 1 was named.
        let target = resolve_target(&placements, Some(1), d("2024-01-08"), 7);
        assert_eq!(target.map(|p| p.id), Some(1));
    }

    #[test]
    fn explicit_unit_picks_most_recent_of_that_unit() {
        let placements = vec![
            placement(1, 1, "2024-01-01", "2024-01-02"),
            placement(2, 2, "2024-01-03", "2024-01-04"),
            placement(3, 1, "2024-02-01", "2024-02-02"),
        ];
        let target = resolve_target(&placements, Some(1), d("2024-03-01"), 7);
        assert_eq!(target.map(|p| p.id), Some(3));
    }

    #[test]
    fn current_placement_when_no_unit_named() {
        let placements = vec![
            placement(1, 1, "2024-01-01", "2024-01-05"),
            placement(2, 2, "2024-01-06", "2024-01-12"),
        ];
        let target = resolve_target(&placements, None, d("2024-01-08"), 7);
        assert_eq!(target.map(|p| p.id), Some(2));
    }

    #[test]
    fn grace_window_catches_recently_ended() {
        let placements = vec![
            placement(1, 1, "2024-01-01", "2024-01-02"),
            placement(2, 2, "2024-01-03", "2024-01-08"),
        ];
        // Nothing contains the 12th; placement 2 ended 4 days ago.
        let target = resolve_target(&placements, None, d("2024-01-12"), 7);
        assert_eq!(target.map(|p| p.id), Some(2));
    }

    #[test]
    fn outside_grace_window_resolves_nothing() {
        let placements = vec![placement(1, 1, "2024-01-01", "2024-01-02")];
        let target = resolve_target(&placements, None, d("2024-01-20"), 7);
        assert!(target.is_none());
    }

    #[test]
    fn grace_window_is_configurable() {
        let placements = vec![placement(1, 1, "2024-01-01", "2024-01-02")];
        assert!(resolve_target(&placements, None, d("2024-01-10"), 7).is_some());
        assert!(resolve_target(&placements, None, d("2024-01-10"), 2).is_none());
    }

    #[test]
    fn unknown_unit_falls_through_to_current() {
        let placements = vec![placement(1, 1, "2024-01-01", "2024-01-05")];
        // Unit 9 has no placements; the current one still resolves.
        let target = resolve_target(&placements, Some(9), d("2024-01-03"), 7);
        assert_eq!(target.map(|p| p.id), Some(1));
    }

    #[test]
    fn empty_history_resolves_nothing() {
        assert!(resolve_target(&[], None, d("2024-01-01"), 7).is_none());
        assert!(resolve_target(&[], Some(1), d("2024-01-01"), 7).is_none());
    }

    // ── shift_end ──────────────────────────────────────────────────

    #[test]
    fn positive_delta_lengthens_and_marks_manual() {
        let original = placement(1, 1, "2024-01-01", "2024-01-05");
        let shifted = shift_end(&original, 3).unwrap();
        assert_eq!(shifted.end, d("2024-01-08"));
        assert!(shifted.manual);
        assert_eq!(shifted.start, original.start);
    }

    #[test]
    fn negative_delta_shortens() {
        let original = placement(1, 1, "2024-01-01", "2024-01-05");
        let shifted = shift_end(&original, -2).unwrap();
        assert_eq!(shifted.end, d("2024-01-03"));
        assert!(shifted.manual);
    }

    #[test]
    fn shortening_past_the_start_is_rejected() {
        let original = placement(1, 1, "2024-01-01", "2024-01-05");
        let result = shift_end(&original, -10);
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn shortening_to_a_single_day_is_allowed() {
        let original = placement(1, 1, "2024-01-01", "2024-01-05");
        let shifted = shift_end(&original, -4).unwrap();
        assert_eq!(shifted.end, d("2024-01-01"));
    }
}
