use super::{util, AssignmentRequest, RepeatEnd, RepeatRule, SchedError, SchedulerConfig};
use crate::directory::Directory;
use crate::model::{RepeatUnit, Schedule};
use crate::recurrence;
use chrono::{Months, NaiveDate};

/// Règle de récurrence dont la fin a été résolue en date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Recurrence {
    pub interval: u32,
    pub unit: RepeatUnit,
    pub end: NaiveDate,
}

impl Recurrence {
    pub fn dates_from(&self, anchor: NaiveDate) -> Vec<NaiveDate> {
        recurrence::generate_occurrence_dates(anchor, self.end, self.interval, self.unit).collect()
    }
}

/// Contrôles communs à toute demande : annuaires, plage horaire, récurrence, horizon.
pub(super) fn validate_request(
    schedule: &Schedule,
    config: &SchedulerConfig,
    today: NaiveDate,
    request: &AssignmentRequest,
) -> Result<Option<Recurrence>, SchedError> {
    if schedule.clinician(&request.clinician_id).is_none() {
        return Err(SchedError::UnknownClinician(request.clinician_id.to_string()));
    }
    match schedule.location(&request.location_id) {
        Some(location) if location.active => {}
        _ => return Err(SchedError::UnknownLocation(request.location_id.to_string())),
    }

    if request.start_time >= request.end_time {
        return Err(SchedError::InvalidTimeRange);
    }
    if let Some(window) = &config.slots {
        util::check_slots(window, request.start_time, request.end_time)?;
    }

    let recurrence = request
        .repeat
        .map(|rule| resolve(request.date, rule))
        .transpose()?;

    if let Some(horizon) = horizon(config, today) {
        let last = recurrence.map_or(request.date, |r| r.end);
        if last > horizon {
            return Err(SchedError::BeyondHorizon {
                date: last,
                horizon,
            });
        }
    }

    Ok(recurrence)
}

fn resolve(anchor: NaiveDate, rule: RepeatRule) -> Result<Recurrence, SchedError> {
    if rule.interval == 0 {
        return Err(SchedError::InvalidRepeat("interval must be positive"));
    }
    let end = match rule.end {
        RepeatEnd::Until(date) => date,
        RepeatEnd::Occurrences(0) => {
            return Err(SchedError::InvalidRepeat("occurrence count must be positive"))
        }
        RepeatEnd::Occurrences(count) => {
            recurrence::end_date_for_occurrences(anchor, count, rule.interval, rule.unit)
                .ok_or(SchedError::InvalidRepeat("occurrence count out of calendar range"))?
        }
    };
    if end < anchor {
        return Err(SchedError::InvalidRepeat(
            "repeat end date is before the first occurrence",
        ));
    }
    Ok(Recurrence {
        interval: rule.interval,
        unit: rule.unit,
        end,
    })
}

fn horizon(config: &SchedulerConfig, today: NaiveDate) -> Option<NaiveDate> {
    let months = config.max_future_months?;
    today.checked_add_months(Months::new(months))
}
