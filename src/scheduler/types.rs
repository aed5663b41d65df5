use crate::model::{
    AssignmentId, ClinicianId, LeavePeriod, LocationId, RepeatUnit, SeriesId,
};
use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration explicite du planificateur
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Horizon de planification en mois (aucune limite si `None`).
    pub max_future_months: Option<u32>,
    /// Nombre maximal de conflits rapportés par catégorie.
    pub conflict_limit: usize,
    /// Plage horaire réservable, découpée en créneaux.
    pub slots: Option<SlotWindow>,
    /// Date de référence ; la date UTC courante par défaut.
    pub today: Option<NaiveDate>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_future_months: Some(24),
            conflict_limit: 10,
            slots: None,
            today: None,
        }
    }
}

impl SchedulerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data =
            std::fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_slice(&data).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub earliest: NaiveTime,
    pub latest: NaiveTime,
    pub slot_minutes: u32,
}

/// Fin d'une récurrence : date explicite ou nombre d'occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatEnd {
    Until(NaiveDate),
    Occurrences(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatRule {
    pub interval: u32,
    pub unit: RepeatUnit,
    pub end: RepeatEnd,
}

/// Demande de réservation (création ou nouvelles valeurs d'une mise à jour).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub clinician_id: ClinicianId,
    pub location_id: LocationId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub repeat: Option<RepeatRule>,
}

/// Portée d'une modification sur une occurrence de série.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    ThisOccurrence,
    ThisAndFuture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created {
    Standalone(AssignmentId),
    Series {
        series_id: SeriesId,
        assignments: Vec<AssignmentId>,
        /// Congés chevauchant la série : informatif, non bloquant.
        leave_warnings: Vec<LeavePeriod>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Updated {
    InPlace(AssignmentId),
    Detached(AssignmentId),
    Promoted(Created),
    Demoted {
        series_id: SeriesId,
        removed: Vec<AssignmentId>,
        /// Occurrence éditée devenue isolée, quand ses valeurs ont changé.
        detached: Option<AssignmentId>,
    },
    Rescheduled {
        series_id: SeriesId,
        /// L'ancienne série ne possédait plus aucune occurrence et a été supprimée.
        series_removed: bool,
        removed: Vec<AssignmentId>,
        created: Created,
    },
    Shortened {
        series_id: SeriesId,
        removed: Vec<AssignmentId>,
    },
    Extended {
        series_id: SeriesId,
        added: Vec<AssignmentId>,
    },
    Unchanged(AssignmentId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub removed: Vec<AssignmentId>,
    /// Série supprimée faute d'occurrence restante.
    pub series_removed: Option<SeriesId>,
}

/// Réservation existante en conflit avec une demande.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub assignment_id: AssignmentId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location_id: LocationId,
    pub clinician_id: ClinicianId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinician_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
    pub is_repeating: bool,
}

/// Filtre de listing (bornes de dates incluses).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
    pub location_id: Option<LocationId>,
    pub facility: Option<String>,
    pub exclude_on_leave: bool,
    pub page: usize,
    pub rows_per_page: usize,
    pub all: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            after: None,
            before: None,
            location_id: None,
            facility: None,
            exclude_on_leave: true,
            page: 0,
            rows_per_page: 50,
            all: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub count: usize,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    LeaveConflict,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid time range: start time must be before end time")]
    InvalidTimeRange,
    #[error("invalid repeat rule: {0}")]
    InvalidRepeat(&'static str),
    #[error("date {date} is beyond the scheduling horizon ({horizon})")]
    BeyondHorizon { date: NaiveDate, horizon: NaiveDate },
    #[error("outside assignment slots: {0}")]
    OutsideSlots(&'static str),
    #[error("unknown clinician: {0}")]
    UnknownClinician(String),
    #[error("unknown location: {0}")]
    UnknownLocation(String),
    #[error("unknown assignment: {0}")]
    UnknownAssignment(String),
    #[error("unknown series: {0}")]
    UnknownSeries(String),
    #[error("location assignment overlaps with {} existing assignment(s)", .0.len())]
    Overlap(Vec<Conflict>),
    #[error("clinician is on leave for {} period(s) on the requested date", .0.len())]
    OnLeave(Vec<LeavePeriod>),
}

impl SchedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTimeRange
            | Self::InvalidRepeat(_)
            | Self::BeyondHorizon { .. }
            | Self::OutsideSlots(_) => ErrorKind::Validation,
            Self::UnknownClinician(_)
            | Self::UnknownLocation(_)
            | Self::UnknownAssignment(_)
            | Self::UnknownSeries(_) => ErrorKind::NotFound,
            Self::Overlap(_) => ErrorKind::Conflict,
            Self::OnLeave(_) => ErrorKind::LeaveConflict,
        }
    }

    /// Conflits portés par l'erreur, vide sinon.
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            Self::Overlap(c) => c,
            _ => &[],
        }
    }
}
