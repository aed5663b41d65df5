use super::{transaction, util, Deleted, SchedError, Scheduler, Scope};
use crate::model::{ActorId, Assignment, AssignmentId, Schedule, SeriesId};
use tracing::info;

pub(super) fn delete(
    scheduler: &mut Scheduler,
    id: &AssignmentId,
    scope: Scope,
    actor: &ActorId,
) -> Result<Deleted, SchedError> {
    let Some(pos) = util::find_assignment_index(&scheduler.schedule.assignments, id) else {
        return Err(SchedError::UnknownAssignment(id.to_string()));
    };
    let target = scheduler.schedule.assignments[pos].clone();

    transaction::atomically(&mut scheduler.schedule, |schedule| {
        let deleted = match (&target.series_id, scope) {
            (Some(series_id), Scope::ThisAndFuture) => {
                let removed =
                    remove_where(schedule, |a| a.belongs_to(series_id) && a.date >= target.date);
                let series_removed = settle_series(schedule, series_id, actor);
                Deleted {
                    removed,
                    series_removed,
                }
            }
            (series_id, _) => {
                let removed = remove_where(schedule, |a| a.id == target.id);
                let series_removed = series_id
                    .as_ref()
                    .and_then(|sid| drop_if_empty(schedule, sid));
                Deleted {
                    removed,
                    series_removed,
                }
            }
        };
        info!(
            assignment = %target.id,
            removed = deleted.removed.len(),
            series_removed = deleted.series_removed.is_some(),
            "location assignment deleted"
        );
        Ok(deleted)
    })
}

pub(super) fn remove_where<F>(schedule: &mut Schedule, pred: F) -> Vec<AssignmentId>
where
    F: Fn(&Assignment) -> bool,
{
    let mut removed = Vec::new();
    schedule.assignments.retain(|a| {
        if pred(a) {
            removed.push(a.id.clone());
            false
        } else {
            true
        }
    });
    removed
}

/// Supprime la série si elle ne possède plus aucune occurrence.
pub(super) fn drop_if_empty(schedule: &mut Schedule, series_id: &SeriesId) -> Option<SeriesId> {
    if schedule.assignments.iter().any(|a| a.belongs_to(series_id)) {
        return None;
    }
    let before = schedule.series.len();
    schedule.series.retain(|s| &s.id != series_id);
    (schedule.series.len() < before).then(|| series_id.clone())
}

/// Après une troncature : supprime la série vide, sinon ramène `repeat_end_date`
/// sur la dernière occurrence restante (sans revérifier la règle de pas).
pub(super) fn settle_series(
    schedule: &mut Schedule,
    series_id: &SeriesId,
    actor: &ActorId,
) -> Option<SeriesId> {
    if let Some(gone) = drop_if_empty(schedule, series_id) {
        return Some(gone);
    }
    let last = schedule
        .assignments
        .iter()
        .filter(|a| a.belongs_to(series_id))
        .map(|a| a.date)
        .max()?;
    if let Some(series) = schedule.find_series_mut(series_id) {
        series.repeat_end_date = last;
        series.updated_by = actor.clone();
    }
    None
}
