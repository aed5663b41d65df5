use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Clinician
    ClinicianId
);
string_id!(
    /// Identifiant fort pour Location
    LocationId
);
string_id!(
    /// Identifiant fort pour Assignment
    AssignmentId
);
string_id!(
    /// Identifiant fort pour Series
    SeriesId
);
string_id!(
    /// Auteur d'une modification (createdBy / updatedBy)
    ActorId
);

/// Soignant pouvant occuper une salle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clinician {
    pub id: ClinicianId,
    pub handle: String,
    pub display_name: String,
}

impl Clinician {
    pub fn new<H: Into<String>, D: Into<String>>(handle: H, display_name: D) -> Self {
        Self {
            id: ClinicianId::random(),
            handle: handle.into(),
            display_name: display_name.into(),
        }
    }
}

/// Salle réservable. Une salle inactive n'accepte plus de réservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Établissement auquel la salle est rattachée.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
}

impl Location {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            id: LocationId::random(),
            name: name.into(),
            active: true,
            facility: None,
        }
    }

    pub fn in_facility<F: Into<String>>(mut self, facility: F) -> Self {
        self.facility = Some(facility.into());
        self
    }
}

fn default_true() -> bool {
    true
}

/// Période de congés (bornes incluses), gérée hors de cette lib.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePeriod {
    pub clinician_id: ClinicianId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl LeavePeriod {
    pub fn new(
        clinician_id: ClinicianId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, String> {
        if end_date < start_date {
            return Err("leave end date must not be before start date".to_string());
        }
        Ok(Self {
            clinician_id,
            start_date,
            end_date,
            active: true,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Pas de récurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Day,
    Week,
    Month,
}

impl std::str::FromStr for RepeatUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" | "daily" | "d" => Ok(Self::Day),
            "week" | "weekly" | "w" => Ok(Self::Week),
            "month" | "monthly" | "m" => Ok(Self::Month),
            other => Err(format!("unknown repeat unit: {other}")),
        }
    }
}

/// Réservation concrète d'une salle par un soignant, un jour donné.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub clinician_id: ClinicianId,
    pub location_id: LocationId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub series_id: Option<SeriesId>,
    pub created_by: ActorId,
    pub updated_by: ActorId,
}

impl Assignment {
    pub fn is_standalone(&self) -> bool {
        self.series_id.is_none()
    }

    pub fn belongs_to(&self, series: &SeriesId) -> bool {
        self.series_id.as_ref() == Some(series)
    }
}

/// Règle de récurrence à l'origine d'une suite d'Assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    pub clinician_id: ClinicianId,
    pub location_id: LocationId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub anchor_date: NaiveDate,
    pub repeat_interval: u32,
    pub repeat_unit: RepeatUnit,
    pub repeat_end_date: NaiveDate,
    pub created_by: ActorId,
    pub updated_by: ActorId,
}

/// Planning complet : annuaires, congés, séries et occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Schedule {
    #[serde(default)]
    pub clinicians: Vec<Clinician>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub leaves: Vec<LeavePeriod>,
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Schedule {
    pub fn find_clinician_by_handle<'a>(&'a self, handle: &str) -> Option<&'a Clinician> {
        self.clinicians.iter().find(|c| c.handle == handle)
    }
    pub fn find_clinician_by_id<'a>(&'a self, id: &ClinicianId) -> Option<&'a Clinician> {
        self.clinicians.iter().find(|c| &c.id == id)
    }
    pub fn find_location_by_name<'a>(&'a self, name: &str) -> Option<&'a Location> {
        self.locations.iter().find(|l| l.name == name)
    }
    pub fn find_location_by_id<'a>(&'a self, id: &LocationId) -> Option<&'a Location> {
        self.locations.iter().find(|l| &l.id == id)
    }
    pub fn find_assignment(&self, id: &AssignmentId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| &a.id == id)
    }
    pub fn find_series(&self, id: &SeriesId) -> Option<&Series> {
        self.series.iter().find(|s| &s.id == id)
    }
    pub fn find_series_mut(&mut self, id: &SeriesId) -> Option<&mut Series> {
        self.series.iter_mut().find(|s| &s.id == id)
    }

    /// Occurrences d'une série, triées par date.
    pub fn series_members(&self, id: &SeriesId) -> Vec<&Assignment> {
        let mut members: Vec<&Assignment> =
            self.assignments.iter().filter(|a| a.belongs_to(id)).collect();
        members.sort_by_key(|a| a.date);
        members
    }
}
