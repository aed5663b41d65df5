use crate::model::{Clinician, LeavePeriod, Location, Schedule};
use crate::scheduler::Conflict;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Import de soignants depuis CSV: header `handle,display_name`
pub fn import_clinicians_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Clinician>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let handle = rec.get(0).context("missing handle")?.trim();
        let display = rec.get(1).context("missing display_name")?.trim();
        if handle.is_empty() || display.is_empty() {
            bail!("invalid clinician row (empty)");
        }
        out.push(Clinician::new(handle, display));
    }
    Ok(out)
}

/// Import de salles: header `name[,active[,facility]]`
pub fn import_locations_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Location>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid location row (empty)");
        }
        let mut location = Location::new(name);
        if let Some(flag) = rec.get(1).map(str::trim).filter(|f| !f.is_empty()) {
            location.active = parse_bool(flag)
                .with_context(|| format!("invalid active value for location {name}"))?;
        }
        if let Some(facility) = rec.get(2).map(str::trim).filter(|f| !f.is_empty()) {
            location.facility = Some(facility.to_owned());
        }
        out.push(location);
    }
    Ok(out)
}

/// Import de congés: header `handle,start_date,end_date[,active]` (dates incluses).
///
/// Les handles sont résolus dans l'annuaire du planning.
pub fn import_leave_csv<P: AsRef<Path>>(
    path: P,
    schedule: &Schedule,
) -> anyhow::Result<Vec<LeavePeriod>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let handle = rec.get(0).context("missing handle")?.trim();
        let clinician = schedule
            .find_clinician_by_handle(handle)
            .with_context(|| format!("unknown clinician handle: {handle}"))?;
        let start = parse_date(rec.get(1).context("missing start_date")?)?;
        let end = parse_date(rec.get(2).context("missing end_date")?)?;
        let mut leave =
            LeavePeriod::new(clinician.id.clone(), start, end).map_err(anyhow::Error::msg)?;
        if let Some(flag) = rec.get(3).map(str::trim).filter(|f| !f.is_empty()) {
            leave.active = parse_bool(flag)
                .with_context(|| format!("invalid active value for handle {handle}"))?;
        }
        out.push(leave);
    }
    Ok(out)
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid date: {raw}"))
}

/// Export CSV des occurrences: header `id,date,start_time,end_time,location,clinician,series_id`
pub fn export_assignments_csv<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "id",
        "date",
        "start_time",
        "end_time",
        "location",
        "clinician",
        "series_id",
    ])?;
    let mut rows: Vec<_> = schedule.assignments.iter().collect();
    rows.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
    for a in rows {
        let location = schedule
            .find_location_by_id(&a.location_id)
            .map_or(a.location_id.as_str(), |l| l.name.as_str());
        let clinician = schedule
            .find_clinician_by_id(&a.clinician_id)
            .map_or(a.clinician_id.as_str(), |c| c.handle.as_str());
        let date = a.date.format(DATE_FORMAT).to_string();
        let start = a.start_time.format(TIME_FORMAT).to_string();
        let end = a.end_time.format(TIME_FORMAT).to_string();
        w.write_record([
            a.id.as_str(),
            date.as_str(),
            start.as_str(),
            end.as_str(),
            location,
            clinician,
            a.series_id.as_ref().map_or("", |s| s.as_str()),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV d'un rapport de conflits.
pub fn export_conflicts_csv<P: AsRef<Path>>(path: P, conflicts: &[Conflict]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "date",
        "start_time",
        "end_time",
        "location_id",
        "clinician_id",
        "series_id",
        "is_repeating",
    ])?;
    for c in conflicts {
        let date = c.date.format(DATE_FORMAT).to_string();
        let start = c.start_time.format(TIME_FORMAT).to_string();
        let end = c.end_time.format(TIME_FORMAT).to_string();
        w.write_record([
            date.as_str(),
            start.as_str(),
            end.as_str(),
            c.location_id.as_str(),
            c.clinician_id.as_str(),
            c.series_id.as_ref().map_or("", |s| s.as_str()),
            if c.is_repeating { "true" } else { "false" },
        ])?;
    }
    w.flush()?;
    Ok(())
}
