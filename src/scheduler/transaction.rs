use super::SchedError;
use crate::model::Schedule;
use tracing::debug;

/// Exécute `steps` sur une copie du planning et ne la substitue qu'en cas de succès.
///
/// Les étapes voient leurs propres suppressions/insertions ; une erreur abandonne la
/// copie, rien n'est observable sur `schedule`.
pub(super) fn atomically<T, F>(schedule: &mut Schedule, steps: F) -> Result<T, SchedError>
where
    F: FnOnce(&mut Schedule) -> Result<T, SchedError>,
{
    let mut staged = schedule.clone();
    match steps(&mut staged) {
        Ok(out) => {
            *schedule = staged;
            Ok(out)
        }
        Err(err) => {
            debug!(error = %err, "transaction rolled back");
            Err(err)
        }
    }
}
