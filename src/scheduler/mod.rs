mod conflicts;
mod create;
mod delete;
mod leave;
mod mutate;
mod transaction;
mod types;
mod util;
mod validate;

pub use conflicts::{find_overlaps, OverlapQuery};
pub use leave::find_overlapping_leave;
pub use types::{
    AssignmentRequest, Conflict, Created, Deleted, ErrorKind, ListQuery, Page, RepeatEnd,
    RepeatRule, SchedError, SchedulerConfig, Scope, SlotWindow, Updated,
};

use crate::model::{
    ActorId, Assignment, AssignmentId, Clinician, LeavePeriod, Location, LocationId, Schedule,
};
use chrono::{NaiveDate, NaiveTime, Utc};

/// Scheduler : encapsule un Schedule et la configuration qui le contraint
#[derive(Debug, Default)]
pub struct Scheduler {
    schedule: Schedule,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            schedule: Schedule::default(),
            config,
        }
    }

    pub fn from_schedule(schedule: Schedule, config: SchedulerConfig) -> Self {
        Self { schedule, config }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn add_clinicians(&mut self, clinicians: Vec<Clinician>) {
        self.schedule.clinicians.extend(clinicians);
    }

    pub fn add_locations(&mut self, locations: Vec<Location>) {
        self.schedule.locations.extend(locations);
    }

    pub fn add_leaves(&mut self, leaves: Vec<LeavePeriod>) {
        self.schedule.leaves.extend(leaves);
    }

    /// Date de référence pour l'horizon de planification.
    pub fn today(&self) -> NaiveDate {
        self.config.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Crée une réservation isolée ou une série selon `request.repeat`.
    pub fn create(
        &mut self,
        request: &AssignmentRequest,
        actor: &ActorId,
    ) -> Result<Created, SchedError> {
        create::create(self, request, actor)
    }

    /// Modifie une occurrence ; `scope` n'a d'effet que sur une occurrence de série.
    pub fn update(
        &mut self,
        id: &AssignmentId,
        request: &AssignmentRequest,
        scope: Scope,
        actor: &ActorId,
    ) -> Result<Updated, SchedError> {
        mutate::update(self, id, request, scope, actor)
    }

    pub fn delete(
        &mut self,
        id: &AssignmentId,
        scope: Scope,
        actor: &ActorId,
    ) -> Result<Deleted, SchedError> {
        delete::delete(self, id, scope, actor)
    }

    /// Conflits qu'un créneau provoquerait, sans rien modifier.
    pub fn check_overlaps(
        &self,
        location_id: &LocationId,
        dates: &[NaiveDate],
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude: Option<&AssignmentId>,
    ) -> Vec<Conflict> {
        let query = OverlapQuery {
            location_id,
            dates,
            start_time,
            end_time,
            exclude,
        };
        conflicts::named_overlaps(&self.schedule, &self.config, &query)
    }

    /// Occurrences triées par date puis heure de début, paginées.
    pub fn list(&self, query: &ListQuery) -> Page<Assignment> {
        let mut rows: Vec<&Assignment> = self
            .schedule
            .assignments
            .iter()
            .filter(|a| query.after.map_or(true, |d| a.date >= d))
            .filter(|a| query.before.map_or(true, |d| a.date <= d))
            .filter(|a| query.location_id.as_ref().map_or(true, |l| &a.location_id == l))
            .filter(|a| query.facility.as_ref().map_or(true, |f| self.in_facility(a, f)))
            .filter(|a| !query.exclude_on_leave || !self.on_leave(a))
            .collect();
        rows.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));

        let count = rows.len();
        let data = if query.all {
            rows.into_iter().cloned().collect()
        } else {
            rows.into_iter()
                .skip(query.page.saturating_mul(query.rows_per_page))
                .take(query.rows_per_page)
                .cloned()
                .collect()
        };
        Page { count, data }
    }

    fn in_facility(&self, assignment: &Assignment, facility: &str) -> bool {
        self.schedule
            .find_location_by_id(&assignment.location_id)
            .and_then(|l| l.facility.as_deref())
            == Some(facility)
    }

    fn on_leave(&self, assignment: &Assignment) -> bool {
        !find_overlapping_leave(&self.schedule, &assignment.clinician_id, &[assignment.date])
            .is_empty()
    }
}
