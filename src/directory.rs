//! Collaborateurs externes consultés par le planificateur : annuaire des
//! soignants et des salles, registre des congés (lecture seule).

use crate::model::{Clinician, ClinicianId, LeavePeriod, Location, LocationId, Schedule};
use chrono::NaiveDate;

pub trait Directory {
    fn clinician(&self, id: &ClinicianId) -> Option<&Clinician>;
    fn location(&self, id: &LocationId) -> Option<&Location>;
}

pub trait LeaveLookup {
    /// Congés du soignant recouvrant au moins un jour de [from, to].
    fn leave_between(&self, clinician: &ClinicianId, from: NaiveDate, to: NaiveDate)
        -> Vec<LeavePeriod>;
}

impl Directory for Schedule {
    fn clinician(&self, id: &ClinicianId) -> Option<&Clinician> {
        self.find_clinician_by_id(id)
    }

    fn location(&self, id: &LocationId) -> Option<&Location> {
        self.find_location_by_id(id)
    }
}

impl LeaveLookup for Schedule {
    fn leave_between(
        &self,
        clinician: &ClinicianId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<LeavePeriod> {
        self.leaves
            .iter()
            .filter(|l| &l.clinician_id == clinician)
            .filter(|l| l.start_date <= to && from <= l.end_date)
            .cloned()
            .collect()
    }
}
