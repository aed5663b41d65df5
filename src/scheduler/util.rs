use super::{SchedError, SlotWindow};
use crate::model::{Assignment, AssignmentId};
use chrono::{NaiveTime, Timelike};

/// Test d'intersection sur des intervalles semi-ouverts [start, end).
pub(super) fn overlaps(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

pub(super) fn find_assignment_index(
    assignments: &[Assignment],
    id: &AssignmentId,
) -> Option<usize> {
    assignments.iter().position(|a| &a.id == id)
}

pub(super) fn check_slots(
    window: &SlotWindow,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<(), SchedError> {
    if start < window.earliest {
        return Err(SchedError::OutsideSlots("starts before the first slot"));
    }
    if end > window.latest {
        return Err(SchedError::OutsideSlots("ends after the last slot"));
    }
    if window.slot_minutes == 0 {
        return Ok(());
    }
    let slot_secs = i64::from(window.slot_minutes) * 60;
    let base = i64::from(window.earliest.num_seconds_from_midnight());
    let aligned = |t: NaiveTime| (i64::from(t.num_seconds_from_midnight()) - base) % slot_secs == 0;
    if !aligned(start) || !aligned(end) {
        return Err(SchedError::OutsideSlots("times must fall on slot boundaries"));
    }
    Ok(())
}
