use crate::directory::LeaveLookup;
use crate::model::{ClinicianId, LeavePeriod};
use chrono::NaiveDate;

/// Congés actifs du soignant couvrant au moins une des dates candidates.
pub fn find_overlapping_leave<L: LeaveLookup + ?Sized>(
    lookup: &L,
    clinician: &ClinicianId,
    dates: &[NaiveDate],
) -> Vec<LeavePeriod> {
    let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
        return Vec::new();
    };
    lookup
        .leave_between(clinician, *first, *last)
        .into_iter()
        .filter(|leave| leave.active)
        .filter(|leave| dates.iter().any(|d| leave.covers(*d)))
        .collect()
}
