#![forbid(unsafe_code)]
use affectation::{
    io,
    model::{ActorId, AssignmentId, Clinician, Location, RepeatUnit, Schedule},
    scheduler::{
        AssignmentRequest, Created, ListQuery, RepeatEnd, RepeatRule, SchedError, Scheduler,
        SchedulerConfig, Scope, Updated,
    },
    storage::{JsonStorage, Storage},
};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de réservation des salles par les soignants
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du planning
    #[arg(long, global = true, default_value = "schedule.json")]
    schedule: String,

    /// Configuration JSON (horizon, créneaux, plafond de conflits)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Horizon de planification en mois (remplace la configuration)
    #[arg(long, global = true)]
    max_future_months: Option<u32>,

    /// Auteur enregistré dans createdBy/updatedBy
    #[arg(long, global = true, default_value = "cli")]
    actor: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args, Debug, Default)]
struct RepeatArgs {
    /// Intervalle de répétition (1 par défaut)
    #[arg(long)]
    every: Option<u32>,
    /// day | week | month
    #[arg(long)]
    unit: Option<RepeatUnit>,
    /// Dernière date possible (AAAA-MM-JJ)
    #[arg(long, conflicts_with = "occurrences")]
    until: Option<NaiveDate>,
    /// Nombre d'occurrences
    #[arg(long)]
    occurrences: Option<u32>,
}

impl RepeatArgs {
    fn is_empty(&self) -> bool {
        self.every.is_none()
            && self.unit.is_none()
            && self.until.is_none()
            && self.occurrences.is_none()
    }

    /// Complète la règle existante avec les options fournies.
    fn merge(&self, base: Option<RepeatRule>) -> Result<Option<RepeatRule>> {
        if self.is_empty() {
            return Ok(base);
        }
        let unit = self
            .unit
            .or(base.map(|b| b.unit))
            .context("--unit is required for a repeating assignment")?;
        let end = match (self.until, self.occurrences) {
            (Some(date), _) => RepeatEnd::Until(date),
            (None, Some(count)) => RepeatEnd::Occurrences(count),
            (None, None) => base
                .map(|b| b.end)
                .context("--until or --occurrences is required for a repeating assignment")?,
        };
        Ok(Some(RepeatRule {
            interval: self.every.or(base.map(|b| b.interval)).unwrap_or(1),
            unit,
            end,
        }))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ajouter un soignant à l'annuaire
    AddClinician {
        #[arg(long)]
        handle: String,
        #[arg(long)]
        name: String,
    },

    /// Ajouter une salle
    AddLocation {
        #[arg(long)]
        name: String,
        #[arg(long)]
        facility: Option<String>,
    },

    /// Importer des soignants depuis un CSV
    ImportClinicians {
        #[arg(long)]
        csv: String,
    },

    /// Importer des salles depuis un CSV
    ImportLocations {
        #[arg(long)]
        csv: String,
    },

    /// Importer des congés depuis un CSV
    ImportLeave {
        #[arg(long)]
        csv: String,
    },

    /// Réserver une salle (ponctuel ou récurrent)
    Create {
        /// handle du soignant
        #[arg(long)]
        clinician: String,
        /// nom de la salle
        #[arg(long)]
        location: String,
        #[arg(long)]
        date: NaiveDate,
        /// HH:MM
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// HH:MM
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        #[command(flatten)]
        repeat: RepeatArgs,
    },

    /// Modifier une occurrence (ou celle-ci et les suivantes avec --future)
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        clinician: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        #[command(flatten)]
        repeat: RepeatArgs,
        /// La série s'arrête à cette occurrence
        #[arg(long)]
        no_repeat: bool,
        #[arg(long)]
        future: bool,
    },

    /// Supprimer une occurrence (ou celle-ci et les suivantes avec --future)
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long)]
        future: bool,
    },

    /// Lister et optionnellement exporter
    List {
        #[arg(long)]
        after: Option<NaiveDate>,
        #[arg(long)]
        before: Option<NaiveDate>,
        #[arg(long)]
        location: Option<String>,
        /// Établissement des salles listées
        #[arg(long)]
        facility: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 50)]
        rows_per_page: usize,
        #[arg(long)]
        all: bool,
        /// Inclure les occurrences tombant pendant un congé
        #[arg(long)]
        include_on_leave: bool,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vérifier les chevauchements d'un créneau sans rien réserver
    Check {
        #[arg(long)]
        location: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        #[command(flatten)]
        repeat: RepeatArgs,
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },
}

fn parse_time(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(raw, "%H:%M").or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
}

fn clinician_id(schedule: &Schedule, handle: &str) -> Result<affectation::ClinicianId> {
    schedule
        .find_clinician_by_handle(handle)
        .map(|c| c.id.clone())
        .ok_or_else(|| anyhow!("unknown clinician: {handle}"))
}

fn location_id(schedule: &Schedule, name: &str) -> Result<affectation::LocationId> {
    schedule
        .find_location_by_name(name)
        .map(|l| l.id.clone())
        .ok_or_else(|| anyhow!("unknown location: {name}"))
}

/// Les chevauchements sortent en JSON sur stderr avec le code 2.
fn fail(err: SchedError) -> Result<i32> {
    if let SchedError::Overlap(conflicts) = &err {
        let payload = serde_json::json!({
            "error": {
                "message": err.to_string(),
                "type": "overlap_assignment_error",
                "overlapAssignments": conflicts,
            }
        });
        eprintln!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(2);
    }
    Err(err.into())
}

fn describe_created(created: &Created) -> String {
    match created {
        Created::Standalone(id) => format!("created assignment {id}"),
        Created::Series {
            series_id,
            assignments,
            leave_warnings,
        } => {
            let mut line = format!(
                "created series {series_id} with {} occurrence(s)",
                assignments.len()
            );
            if !leave_warnings.is_empty() {
                line.push_str(&format!(
                    " (warning: {} leave period(s) overlap)",
                    leave_warnings.len()
                ));
            }
            line
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::from_json_file(path)?,
        None => SchedulerConfig::default(),
    };
    if let Some(months) = cli.max_future_months {
        config.max_future_months = Some(months);
    }

    let storage = JsonStorage::open(&cli.schedule)?;
    let mut scheduler = Scheduler::from_schedule(storage.load_or_default()?, config);
    let actor = ActorId::new(&cli.actor);

    let code = match cli.cmd {
        Commands::AddClinician { handle, name } => {
            if scheduler.schedule().find_clinician_by_handle(&handle).is_some() {
                bail!("clinician {handle} already exists");
            }
            scheduler.add_clinicians(vec![Clinician::new(handle, name)]);
            storage.save(scheduler.schedule())?;
            0
        }
        Commands::AddLocation { name, facility } => {
            if scheduler.schedule().find_location_by_name(&name).is_some() {
                bail!("location {name} already exists");
            }
            let location = match facility {
                Some(facility) => Location::new(name).in_facility(facility),
                None => Location::new(name),
            };
            scheduler.add_locations(vec![location]);
            storage.save(scheduler.schedule())?;
            0
        }
        Commands::ImportClinicians { csv } => {
            let clinicians = io::import_clinicians_csv(csv)?;
            scheduler.add_clinicians(clinicians);
            storage.save(scheduler.schedule())?;
            0
        }
        Commands::ImportLocations { csv } => {
            let locations = io::import_locations_csv(csv)?;
            scheduler.add_locations(locations);
            storage.save(scheduler.schedule())?;
            0
        }
        Commands::ImportLeave { csv } => {
            let leaves = io::import_leave_csv(csv, scheduler.schedule())?;
            scheduler.add_leaves(leaves);
            storage.save(scheduler.schedule())?;
            0
        }
        Commands::Create {
            clinician,
            location,
            date,
            start,
            end,
            repeat,
        } => {
            let request = AssignmentRequest {
                clinician_id: clinician_id(scheduler.schedule(), &clinician)?,
                location_id: location_id(scheduler.schedule(), &location)?,
                date,
                start_time: start,
                end_time: end,
                repeat: repeat.merge(None)?,
            };
            match scheduler.create(&request, &actor) {
                Ok(created) => {
                    storage.save(scheduler.schedule())?;
                    println!("{}", describe_created(&created));
                    0
                }
                Err(err) => fail(err)?,
            }
        }
        Commands::Update {
            id,
            clinician,
            location,
            date,
            start,
            end,
            repeat,
            no_repeat,
            future,
        } => {
            let id = AssignmentId::new(id);
            let schedule = scheduler.schedule();
            let current = schedule
                .find_assignment(&id)
                .ok_or_else(|| anyhow!("unknown assignment: {id}"))?;
            // la règle de la série ne sert de base qu'avec --future
            let base_rule = current
                .series_id
                .as_ref()
                .filter(|_| future)
                .and_then(|sid| schedule.find_series(sid))
                .map(|s| RepeatRule {
                    interval: s.repeat_interval,
                    unit: s.repeat_unit,
                    end: RepeatEnd::Until(s.repeat_end_date),
                });
            let request = AssignmentRequest {
                clinician_id: match clinician {
                    Some(handle) => clinician_id(schedule, &handle)?,
                    None => current.clinician_id.clone(),
                },
                location_id: match location {
                    Some(name) => location_id(schedule, &name)?,
                    None => current.location_id.clone(),
                },
                date: date.unwrap_or(current.date),
                start_time: start.unwrap_or(current.start_time),
                end_time: end.unwrap_or(current.end_time),
                repeat: if no_repeat { None } else { repeat.merge(base_rule)? },
            };
            let scope = if future {
                Scope::ThisAndFuture
            } else {
                Scope::ThisOccurrence
            };
            match scheduler.update(&id, &request, scope, &actor) {
                Ok(updated) => {
                    storage.save(scheduler.schedule())?;
                    match updated {
                        Updated::Detached(new_id) => println!("detached as {new_id}"),
                        Updated::Promoted(created) | Updated::Rescheduled { created, .. } => {
                            println!("{}", describe_created(&created))
                        }
                        other => println!("{other:?}"),
                    }
                    0
                }
                Err(err) => fail(err)?,
            }
        }
        Commands::Delete { id, future } => {
            let scope = if future {
                Scope::ThisAndFuture
            } else {
                Scope::ThisOccurrence
            };
            let deleted = scheduler.delete(&AssignmentId::new(id), scope, &actor)?;
            storage.save(scheduler.schedule())?;
            println!("deleted {} occurrence(s)", deleted.removed.len());
            0
        }
        Commands::List {
            after,
            before,
            location,
            facility,
            page,
            rows_per_page,
            all,
            include_on_leave,
            out_csv,
        } => {
            if let Some(path) = out_csv {
                io::export_assignments_csv(path, scheduler.schedule())?;
            }
            let query = ListQuery {
                after,
                before,
                location_id: location
                    .map(|name| location_id(scheduler.schedule(), &name))
                    .transpose()?,
                facility,
                exclude_on_leave: !include_on_leave,
                page,
                rows_per_page,
                all,
            };
            let listed = scheduler.list(&query);
            let schedule = scheduler.schedule();
            for a in &listed.data {
                let clinician = schedule
                    .find_clinician_by_id(&a.clinician_id)
                    .map_or("-", |c| c.handle.as_str());
                let location = schedule
                    .find_location_by_id(&a.location_id)
                    .map_or("-", |l| l.name.as_str());
                println!(
                    "{} | {} {} → {} | {} | {} | {}",
                    a.id,
                    a.date,
                    a.start_time.format("%H:%M"),
                    a.end_time.format("%H:%M"),
                    location,
                    clinician,
                    a.series_id.as_ref().map_or("-", |s| s.as_str())
                );
            }
            eprintln!("{} of {} assignment(s)", listed.data.len(), listed.count);
            0
        }
        Commands::Check {
            location,
            date,
            start,
            end,
            repeat,
            report,
        } => {
            let loc = location_id(scheduler.schedule(), &location)?;
            let dates: Vec<NaiveDate> = match repeat.merge(None)? {
                Some(rule) => {
                    let until = match rule.end {
                        RepeatEnd::Until(until) => until,
                        RepeatEnd::Occurrences(count) => affectation::end_date_for_occurrences(
                            date,
                            count,
                            rule.interval,
                            rule.unit,
                        )
                        .context("invalid occurrence count")?,
                    };
                    affectation::generate_occurrence_dates(date, until, rule.interval, rule.unit)
                        .collect()
                }
                None => vec![date],
            };
            let conflicts = scheduler.check_overlaps(&loc, &dates, start, end, None);
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                if let Some(path) = report {
                    io::export_conflicts_csv(path, &conflicts)?;
                }
                // Code 2 = chevauchement
                2
            }
        }
    };

    std::process::exit(code);
}
