use super::create::{create_in, insert_occurrences, insert_standalone, query_for};
use super::delete::{drop_if_empty, remove_where, settle_series};
use super::validate::{self, Recurrence};
use super::{
    conflicts, transaction, util, AssignmentRequest, OverlapQuery, SchedError, SchedulerConfig,
    Scheduler, Scope, Updated,
};
use crate::model::{ActorId, Assignment, AssignmentId, Schedule, Series, SeriesId};
use crate::recurrence;
use chrono::NaiveDate;
use std::cmp::Ordering;
use tracing::{debug, info};

pub(super) fn update(
    scheduler: &mut Scheduler,
    id: &AssignmentId,
    request: &AssignmentRequest,
    scope: Scope,
    actor: &ActorId,
) -> Result<Updated, SchedError> {
    let today = scheduler.today();
    let Scheduler { schedule, config } = scheduler;

    let Some(pos) = util::find_assignment_index(&schedule.assignments, id) else {
        return Err(SchedError::UnknownAssignment(id.to_string()));
    };
    let current = schedule.assignments[pos].clone();
    // une occurrence détachée ne garde pas de règle de récurrence
    let detached;
    let request = match (&current.series_id, scope) {
        (Some(_), Scope::ThisOccurrence) if request.repeat.is_some() => {
            detached = AssignmentRequest {
                repeat: None,
                ..request.clone()
            };
            &detached
        }
        _ => request,
    };
    let recurrence = validate::validate_request(schedule, config, today, request)?;

    match (current.series_id.clone(), scope) {
        (None, _) => match recurrence {
            None => transaction::atomically(schedule, |staged| {
                update_in_place(staged, config, &current, request, actor)?;
                Ok(Updated::InPlace(current.id.clone()))
            }),
            Some(recurrence) => transaction::atomically(schedule, |staged| {
                remove_where(staged, |a| a.id == current.id);
                let created = create_in(staged, config, request, Some(recurrence), actor)?;
                debug!(assignment = %current.id, "standalone assignment promoted to series");
                Ok(Updated::Promoted(created))
            }),
        },
        (Some(series_id), Scope::ThisOccurrence) => transaction::atomically(schedule, |staged| {
            detach(staged, config, &current, &series_id, request, actor)
        }),
        (Some(series_id), Scope::ThisAndFuture) => {
            let series = schedule
                .find_series(&series_id)
                .cloned()
                .ok_or_else(|| SchedError::UnknownSeries(series_id.to_string()))?;
            transaction::atomically(schedule, |staged| {
                update_future(staged, config, &current, &series, request, recurrence, actor)
            })
        }
    }
}

fn apply(row: &mut Assignment, request: &AssignmentRequest, actor: &ActorId) {
    row.clinician_id = request.clinician_id.clone();
    row.location_id = request.location_id.clone();
    row.date = request.date;
    row.start_time = request.start_time;
    row.end_time = request.end_time;
    row.updated_by = actor.clone();
}

fn differs(row: &Assignment, request: &AssignmentRequest) -> bool {
    row.clinician_id != request.clinician_id
        || row.location_id != request.location_id
        || row.date != request.date
        || row.start_time != request.start_time
        || row.end_time != request.end_time
}

/// Vérifie le nouveau créneau en ignorant la ligne elle-même, puis la réécrit.
fn update_in_place(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    current: &Assignment,
    request: &AssignmentRequest,
    actor: &ActorId,
) -> Result<(), SchedError> {
    let dates = [request.date];
    conflicts::ensure_free(schedule, config, &query_for(request, &dates, Some(&current.id)))?;
    let pos = util::find_assignment_index(&schedule.assignments, &current.id)
        .ok_or_else(|| SchedError::UnknownAssignment(current.id.to_string()))?;
    apply(&mut schedule.assignments[pos], request, actor);
    Ok(())
}

/// "Cette occurrence uniquement" : la ligne quitte la série et devient isolée.
fn detach(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    current: &Assignment,
    series_id: &SeriesId,
    request: &AssignmentRequest,
    actor: &ActorId,
) -> Result<Updated, SchedError> {
    remove_where(schedule, |a| a.id == current.id);
    let dates = [request.date];
    conflicts::ensure_free(schedule, config, &query_for(request, &dates, None))?;
    let id = insert_standalone(schedule, request, actor);
    drop_if_empty(schedule, series_id);
    info!(previous = %current.id, assignment = %id, series = %series_id, "occurrence detached");
    Ok(Updated::Detached(id))
}

/// "Cette occurrence et les suivantes".
fn update_future(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    current: &Assignment,
    series: &Series,
    request: &AssignmentRequest,
    recurrence: Option<Recurrence>,
    actor: &ActorId,
) -> Result<Updated, SchedError> {
    let Some(recurrence) = recurrence else {
        return demote(schedule, config, current, series, request, actor);
    };

    let rescheduled = differs(current, request)
        || recurrence.interval != series.repeat_interval
        || recurrence.unit != series.repeat_unit;
    if rescheduled {
        return reschedule(schedule, config, current, series, request, recurrence, actor);
    }

    match recurrence.end.cmp(&series.repeat_end_date) {
        Ordering::Less => {
            let removed =
                remove_where(schedule, |a| a.belongs_to(&series.id) && a.date > recurrence.end);
            set_end_date(schedule, &series.id, recurrence.end, actor)?;
            info!(series = %series.id, removed = removed.len(), "series shortened");
            Ok(Updated::Shortened {
                series_id: series.id.clone(),
                removed,
            })
        }
        Ordering::Greater => extend(schedule, config, series, recurrence, actor),
        Ordering::Equal => Ok(Updated::Unchanged(current.id.clone())),
    }
}

/// La série s'arrête à l'occurrence éditée.
///
/// Si l'occurrence change de valeurs, elle quitte la série (qui garde alors ses
/// occurrences antérieures) pour rester cohérente avec la règle.
fn demote(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    current: &Assignment,
    series: &Series,
    request: &AssignmentRequest,
    actor: &ActorId,
) -> Result<Updated, SchedError> {
    let mut removed =
        remove_where(schedule, |a| a.belongs_to(&series.id) && a.date > current.date);
    let detached = if differs(current, request) {
        removed.extend(remove_where(schedule, |a| a.id == current.id));
        let dates = [request.date];
        conflicts::ensure_free(schedule, config, &query_for(request, &dates, None))?;
        let id = insert_standalone(schedule, request, actor);
        settle_series(schedule, &series.id, actor);
        Some(id)
    } else {
        set_end_date(schedule, &series.id, current.date, actor)?;
        None
    };
    info!(
        series = %series.id,
        removed = removed.len(),
        detached = detached.is_some(),
        "series demoted to non-repeating"
    );
    Ok(Updated::Demoted {
        series_id: series.id.clone(),
        removed,
        detached,
    })
}

/// Supprime l'occurrence éditée et les suivantes, puis recrée une série neuve.
fn reschedule(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    current: &Assignment,
    series: &Series,
    request: &AssignmentRequest,
    recurrence: Recurrence,
    actor: &ActorId,
) -> Result<Updated, SchedError> {
    let removed = remove_where(schedule, |a| a.belongs_to(&series.id) && a.date >= current.date);
    let series_removed = settle_series(schedule, &series.id, actor).is_some();
    let created = create_in(schedule, config, request, Some(recurrence), actor)?;
    info!(
        series = %series.id,
        removed = removed.len(),
        series_removed,
        "series rescheduled"
    );
    Ok(Updated::Rescheduled {
        series_id: series.id.clone(),
        series_removed,
        removed,
        created,
    })
}

/// Prolonge la série à partir de sa dernière occurrence existante.
fn extend(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    series: &Series,
    recurrence: Recurrence,
    actor: &ActorId,
) -> Result<Updated, SchedError> {
    let last = schedule
        .series_members(&series.id)
        .last()
        .map(|a| a.date)
        .ok_or_else(|| SchedError::UnknownSeries(series.id.to_string()))?;

    let next = recurrence::next_occurrence_after(last, series.repeat_interval, series.repeat_unit);
    let added = match next {
        Some(next) if next <= recurrence.end => {
            let dates = recurrence.dates_from(next);
            let query = OverlapQuery {
                location_id: &series.location_id,
                dates: &dates,
                start_time: series.start_time,
                end_time: series.end_time,
                exclude: None,
            };
            conflicts::ensure_free(schedule, config, &query)?;
            insert_occurrences(schedule, series, &dates, actor)
        }
        _ => Vec::new(),
    };
    set_end_date(schedule, &series.id, recurrence.end, actor)?;
    info!(series = %series.id, added = added.len(), "series extended");
    Ok(Updated::Extended {
        series_id: series.id.clone(),
        added,
    })
}

fn set_end_date(
    schedule: &mut Schedule,
    series_id: &SeriesId,
    end: NaiveDate,
    actor: &ActorId,
) -> Result<(), SchedError> {
    let series = schedule
        .find_series_mut(series_id)
        .ok_or_else(|| SchedError::UnknownSeries(series_id.to_string()))?;
    series.repeat_end_date = end;
    series.updated_by = actor.clone();
    Ok(())
}
