use super::{util, Conflict, SchedError, SchedulerConfig};
use crate::directory::Directory;
use crate::model::{Assignment, AssignmentId, ClinicianId, LocationId, Schedule, SeriesId};
use chrono::{NaiveDate, NaiveTime};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Créneau candidat à confronter aux réservations existantes d'une salle.
#[derive(Debug, Clone)]
pub struct OverlapQuery<'a> {
    pub location_id: &'a LocationId,
    pub dates: &'a [NaiveDate],
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Occurrence en cours d'édition, ignorée.
    pub exclude: Option<&'a AssignmentId>,
}

type SeriesKey = (SeriesId, NaiveTime, NaiveTime, LocationId, ClinicianId);

/// Réservations de la salle qui chevauchent le créneau candidat.
///
/// Les occurrences isolées donnent un conflit chacune ; les occurrences de série
/// sont regroupées par (série, horaires, salle, soignant) et rapportées une seule
/// fois, à leur date la plus précoce. Chaque catégorie est plafonnée à `limit`.
pub fn find_overlaps(
    assignments: &[Assignment],
    query: &OverlapQuery<'_>,
    limit: usize,
) -> Vec<Conflict> {
    let dates: BTreeSet<NaiveDate> = query.dates.iter().copied().collect();

    let (standalone, linked): (Vec<&Assignment>, Vec<&Assignment>) = assignments
        .iter()
        .filter(|a| &a.location_id == query.location_id)
        .filter(|a| query.exclude != Some(&a.id))
        .filter(|a| dates.contains(&a.date))
        .filter(|a| util::overlaps(a.start_time, a.end_time, query.start_time, query.end_time))
        .partition(|a| a.is_standalone());

    let mut singles = standalone;
    singles.sort_by(|a, b| (a.date, a.start_time, &a.id).cmp(&(b.date, b.start_time, &b.id)));
    let mut out: Vec<Conflict> = singles
        .into_iter()
        .take(limit)
        .map(|a| to_conflict(a, None))
        .collect();

    let mut earliest: BTreeMap<SeriesKey, &Assignment> = BTreeMap::new();
    for a in linked {
        let Some(series_id) = a.series_id.clone() else {
            continue;
        };
        let key = (
            series_id,
            a.start_time,
            a.end_time,
            a.location_id.clone(),
            a.clinician_id.clone(),
        );
        earliest
            .entry(key)
            .and_modify(|kept| {
                if (a.date, &a.id) < (kept.date, &kept.id) {
                    *kept = a;
                }
            })
            .or_insert(a);
    }

    let mut groups: Vec<(SeriesKey, &Assignment)> = earliest.into_iter().collect();
    groups.sort_by(|(_, a), (_, b)| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
    out.extend(
        groups
            .into_iter()
            .take(limit)
            .map(|((series_id, ..), a)| to_conflict(a, Some(series_id))),
    );

    out.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
    out
}

/// Conflits enrichis du nom des soignants concernés.
pub(super) fn named_overlaps(
    schedule: &Schedule,
    config: &SchedulerConfig,
    query: &OverlapQuery<'_>,
) -> Vec<Conflict> {
    let mut found = find_overlaps(&schedule.assignments, query, config.conflict_limit);
    for conflict in &mut found {
        conflict.clinician_name = schedule
            .clinician(&conflict.clinician_id)
            .map(|c| c.display_name.clone());
    }
    found
}

/// Échoue avec `Overlap` si le créneau chevauche une réservation de la salle.
pub(super) fn ensure_free(
    schedule: &Schedule,
    config: &SchedulerConfig,
    query: &OverlapQuery<'_>,
) -> Result<(), SchedError> {
    let found = named_overlaps(schedule, config, query);
    if found.is_empty() {
        return Ok(());
    }
    debug!(
        location = %query.location_id,
        dates = query.dates.len(),
        conflicts = found.len(),
        "overlap detected"
    );
    Err(SchedError::Overlap(found))
}

fn to_conflict(a: &Assignment, series_id: Option<SeriesId>) -> Conflict {
    Conflict {
        assignment_id: a.id.clone(),
        date: a.date,
        start_time: a.start_time,
        end_time: a.end_time,
        location_id: a.location_id.clone(),
        clinician_id: a.clinician_id.clone(),
        clinician_name: None,
        is_repeating: series_id.is_some(),
        series_id,
    }
}
