#![forbid(unsafe_code)]
//! Affectation : planification de l'occupation des salles par les soignants.
//!
//! - Réservations ponctuelles et séries récurrentes (jour/semaine/mois).
//! - Détection des chevauchements par salle, occurrences isolées et séries confondues.
//! - Modification/suppression d'une occurrence ou de « celle-ci et les suivantes »,
//!   toujours dans une transaction atomique.
//! - Dates et heures naïves, dans un fuseau unique.

pub mod directory;
pub mod io;
pub mod model;
pub mod recurrence;
pub mod scheduler;
pub mod storage;

pub use directory::{Directory, LeaveLookup};
pub use model::{
    ActorId, Assignment, AssignmentId, Clinician, ClinicianId, LeavePeriod, Location, LocationId,
    RepeatUnit, Schedule, Series, SeriesId,
};
pub use recurrence::{
    end_date_for_occurrences, generate_occurrence_dates, next_occurrence_after, OccurrenceDates,
};
pub use scheduler::{
    find_overlapping_leave, find_overlaps, AssignmentRequest, Conflict, Created, Deleted,
    ErrorKind, ListQuery, OverlapQuery, Page, RepeatEnd, RepeatRule, SchedError, Scheduler,
    SchedulerConfig, Scope, SlotWindow, Updated,
};
pub use storage::{JsonStorage, Storage};
