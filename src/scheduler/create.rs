use super::validate::{self, Recurrence};
use super::{
    conflicts, leave, transaction, AssignmentRequest, Created, OverlapQuery, SchedError,
    SchedulerConfig, Scheduler,
};
use crate::model::{ActorId, Assignment, AssignmentId, Schedule, Series, SeriesId};
use chrono::NaiveDate;
use tracing::{info, warn};

pub(super) fn create(
    scheduler: &mut Scheduler,
    request: &AssignmentRequest,
    actor: &ActorId,
) -> Result<Created, SchedError> {
    let today = scheduler.today();
    let Scheduler { schedule, config } = scheduler;
    let recurrence = validate::validate_request(schedule, config, today, request)?;
    transaction::atomically(schedule, |staged| {
        create_in(staged, config, request, recurrence, actor)
    })
}

/// Étapes de création, rejouables à l'intérieur d'une transaction plus large.
pub(super) fn create_in(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    request: &AssignmentRequest,
    recurrence: Option<Recurrence>,
    actor: &ActorId,
) -> Result<Created, SchedError> {
    let Some(recurrence) = recurrence else {
        let dates = [request.date];
        let on_leave = leave::find_overlapping_leave(&*schedule, &request.clinician_id, &dates);
        if !on_leave.is_empty() {
            return Err(SchedError::OnLeave(on_leave));
        }
        conflicts::ensure_free(schedule, config, &query_for(request, &dates, None))?;
        let id = insert_standalone(schedule, request, actor);
        info!(assignment = %id, date = %request.date, "standalone assignment created");
        return Ok(Created::Standalone(id));
    };

    let dates = recurrence.dates_from(request.date);
    conflicts::ensure_free(schedule, config, &query_for(request, &dates, None))?;

    let leave_warnings = leave::find_overlapping_leave(&*schedule, &request.clinician_id, &dates);
    if !leave_warnings.is_empty() {
        warn!(
            clinician = %request.clinician_id,
            periods = leave_warnings.len(),
            "series overlaps clinician leave"
        );
    }

    let series = Series {
        id: SeriesId::random(),
        clinician_id: request.clinician_id.clone(),
        location_id: request.location_id.clone(),
        start_time: request.start_time,
        end_time: request.end_time,
        anchor_date: request.date,
        repeat_interval: recurrence.interval,
        repeat_unit: recurrence.unit,
        repeat_end_date: recurrence.end,
        created_by: actor.clone(),
        updated_by: actor.clone(),
    };
    let assignments = insert_occurrences(schedule, &series, &dates, actor);
    let series_id = series.id.clone();
    schedule.series.push(series);
    info!(
        series = %series_id,
        occurrences = assignments.len(),
        "repeating assignment created"
    );

    Ok(Created::Series {
        series_id,
        assignments,
        leave_warnings,
    })
}

pub(super) fn query_for<'a>(
    request: &'a AssignmentRequest,
    dates: &'a [NaiveDate],
    exclude: Option<&'a AssignmentId>,
) -> OverlapQuery<'a> {
    OverlapQuery {
        location_id: &request.location_id,
        dates,
        start_time: request.start_time,
        end_time: request.end_time,
        exclude,
    }
}

pub(super) fn insert_standalone(
    schedule: &mut Schedule,
    request: &AssignmentRequest,
    actor: &ActorId,
) -> AssignmentId {
    let assignment = Assignment {
        id: AssignmentId::random(),
        clinician_id: request.clinician_id.clone(),
        location_id: request.location_id.clone(),
        date: request.date,
        start_time: request.start_time,
        end_time: request.end_time,
        series_id: None,
        created_by: actor.clone(),
        updated_by: actor.clone(),
    };
    let id = assignment.id.clone();
    schedule.assignments.push(assignment);
    id
}

/// Une occurrence par date, rattachée à `series`.
pub(super) fn insert_occurrences(
    schedule: &mut Schedule,
    series: &Series,
    dates: &[NaiveDate],
    actor: &ActorId,
) -> Vec<AssignmentId> {
    dates
        .iter()
        .map(|date| {
            let assignment = Assignment {
                id: AssignmentId::random(),
                clinician_id: series.clinician_id.clone(),
                location_id: series.location_id.clone(),
                date: *date,
                start_time: series.start_time,
                end_time: series.end_time,
                series_id: Some(series.id.clone()),
                created_by: actor.clone(),
                updated_by: actor.clone(),
            };
            let id = assignment.id.clone();
            schedule.assignments.push(assignment);
            id
        })
        .collect()
}
