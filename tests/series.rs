#![forbid(unsafe_code)]
use affectation::{
    ActorId, AssignmentId, AssignmentRequest, Clinician, Created, ErrorKind, LeavePeriod,
    ListQuery, Location, RepeatEnd, RepeatRule, RepeatUnit, SchedError, Scheduler,
    SchedulerConfig, Scope, SeriesId, SlotWindow, Updated,
};
use chrono::{NaiveDate, NaiveTime};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

struct Fixture {
    scheduler: Scheduler,
    alice: Clinician,
    bob: Clinician,
    room: Location,
    actor: ActorId,
}

fn fixture() -> Fixture {
    let config = SchedulerConfig {
        today: Some(d(2024, 1, 1)),
        ..SchedulerConfig::default()
    };
    let mut scheduler = Scheduler::with_config(config);
    let alice = Clinician::new("alice", "Dr Alice");
    let bob = Clinician::new("bob", "Dr Bob");
    let room = Location::new("Consultation 1");
    scheduler.add_clinicians(vec![alice.clone(), bob.clone()]);
    scheduler.add_locations(vec![room.clone()]);
    Fixture {
        scheduler,
        alice,
        bob,
        room,
        actor: ActorId::new("admin"),
    }
}

impl Fixture {
    fn single(
        &self,
        who: &Clinician,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> AssignmentRequest {
        AssignmentRequest {
            clinician_id: who.id.clone(),
            location_id: self.room.id.clone(),
            date,
            start_time: start,
            end_time: end,
            repeat: None,
        }
    }

    fn weekly(&self, who: &Clinician, date: NaiveDate, until: NaiveDate) -> AssignmentRequest {
        AssignmentRequest {
            repeat: Some(RepeatRule {
                interval: 1,
                unit: RepeatUnit::Week,
                end: RepeatEnd::Until(until),
            }),
            ..self.single(who, date, t(9, 0), t(10, 0))
        }
    }

    /// Série hebdomadaire du 1er au 22 janvier 2024, 09:00–10:00.
    fn january_series(&mut self) -> (SeriesId, Vec<AssignmentId>) {
        let request = self.weekly(&self.alice, d(2024, 1, 1), d(2024, 1, 22));
        match self.scheduler.create(&request, &self.actor).unwrap() {
            Created::Series {
                series_id,
                assignments,
                ..
            } => (series_id, assignments),
            _ => panic!("expected a series"),
        }
    }

    fn dates_of(&self, series: &SeriesId) -> Vec<NaiveDate> {
        self.scheduler
            .schedule()
            .series_members(series)
            .iter()
            .map(|a| a.date)
            .collect()
    }

    fn repeat_end(&self, series: &SeriesId) -> NaiveDate {
        self.scheduler
            .schedule()
            .find_series(series)
            .unwrap()
            .repeat_end_date
    }
}

#[test]
fn standalone_double_booking_is_rejected() {
    let mut f = fixture();
    let request = f.single(&f.alice, d(2024, 1, 1), t(9, 0), t(10, 0));
    let Created::Standalone(first) = f.scheduler.create(&request, &f.actor).unwrap() else {
        panic!("expected a standalone assignment");
    };

    let again = f.single(&f.bob, d(2024, 1, 1), t(9, 0), t(10, 0));
    let err = f.scheduler.create(&again, &f.actor).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.conflicts().len(), 1);
    assert_eq!(err.conflicts()[0].assignment_id, first);
    assert_eq!(err.conflicts()[0].clinician_name.as_deref(), Some("Dr Alice"));
    assert_eq!(f.scheduler.schedule().assignments.len(), 1);
}

#[test]
fn adjacent_bookings_are_accepted() {
    let mut f = fixture();
    let first = f.single(&f.alice, d(2024, 1, 1), t(9, 0), t(10, 0));
    let second = f.single(&f.bob, d(2024, 1, 1), t(10, 0), t(11, 0));
    f.scheduler.create(&first, &f.actor).unwrap();
    f.scheduler.create(&second, &f.actor).unwrap();
    assert_eq!(f.scheduler.schedule().assignments.len(), 2);
}

#[test]
fn weekly_series_creates_one_row_per_week() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    assert_eq!(ids.len(), 4);
    assert_eq!(
        f.dates_of(&series),
        vec![d(2024, 1, 1), d(2024, 1, 8), d(2024, 1, 15), d(2024, 1, 22)]
    );
    assert!(f
        .scheduler
        .schedule()
        .assignments
        .iter()
        .all(|a| a.series_id.as_ref() == Some(&series)));
}

#[test]
fn series_overlapping_a_single_booking_is_rejected_atomically() {
    let mut f = fixture();
    let blocker = f.single(&f.bob, d(2024, 1, 15), t(9, 30), t(10, 30));
    f.scheduler.create(&blocker, &f.actor).unwrap();

    let request = f.weekly(&f.alice, d(2024, 1, 1), d(2024, 1, 22));
    let err = f.scheduler.create(&request, &f.actor).unwrap_err();
    assert!(matches!(err, SchedError::Overlap(_)));
    assert_eq!(err.conflicts()[0].date, d(2024, 1, 15));
    assert!(f.scheduler.schedule().series.is_empty());
    assert_eq!(f.scheduler.schedule().assignments.len(), 1);
}

#[test]
fn editing_one_occurrence_detaches_it() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let target = ids[1].clone();

    let request = f.single(&f.alice, d(2024, 1, 8), t(11, 0), t(12, 0));
    let updated = f
        .scheduler
        .update(&target, &request, Scope::ThisOccurrence, &f.actor)
        .unwrap();
    let Updated::Detached(new_id) = updated else {
        panic!("expected a detached occurrence");
    };

    let schedule = f.scheduler.schedule();
    assert!(schedule.find_assignment(&target).is_none());
    let detached = schedule.find_assignment(&new_id).unwrap();
    assert!(detached.is_standalone());
    assert_eq!((detached.start_time, detached.end_time), (t(11, 0), t(12, 0)));
    assert_eq!(
        f.dates_of(&series),
        vec![d(2024, 1, 1), d(2024, 1, 15), d(2024, 1, 22)]
    );
    assert!(schedule
        .series_members(&series)
        .iter()
        .all(|a| a.start_time == t(9, 0)));
}

#[test]
fn editing_one_occurrence_onto_its_own_slot_is_allowed() {
    let mut f = fixture();
    let (_, ids) = f.january_series();
    let request = f.single(&f.alice, d(2024, 1, 8), t(9, 30), t(10, 0));
    let updated = f
        .scheduler
        .update(&ids[1], &request, Scope::ThisOccurrence, &f.actor);
    assert!(matches!(updated, Ok(Updated::Detached(_))));
}

#[test]
fn moving_one_occurrence_past_the_series_end_ignores_the_rule() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    // la règle de la série accompagne la demande mais ne s'applique pas
    let request = f.weekly(&f.alice, d(2024, 1, 25), d(2024, 1, 22));

    let updated = f
        .scheduler
        .update(&ids[1], &request, Scope::ThisOccurrence, &f.actor)
        .unwrap();
    let Updated::Detached(moved) = updated else {
        panic!("expected a detached occurrence");
    };
    let row = f.scheduler.schedule().find_assignment(&moved).unwrap();
    assert_eq!(row.date, d(2024, 1, 25));
    assert!(row.is_standalone());
    assert_eq!(f.dates_of(&series).len(), 3);
    assert_eq!(f.scheduler.schedule().series.len(), 1);
}

#[test]
fn conflicting_occurrence_edit_restores_the_original() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let blocker = f.single(&f.bob, d(2024, 1, 9), t(9, 0), t(10, 0));
    f.scheduler.create(&blocker, &f.actor).unwrap();

    let request = f.single(&f.alice, d(2024, 1, 9), t(9, 0), t(10, 0));
    let err = f
        .scheduler
        .update(&ids[1], &request, Scope::ThisOccurrence, &f.actor)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let original = f.scheduler.schedule().find_assignment(&ids[1]).unwrap();
    assert_eq!(original.date, d(2024, 1, 8));
    assert_eq!(original.series_id.as_ref(), Some(&series));
}

#[test]
fn deleting_this_and_future_truncates_the_series() {
    let mut f = fixture();
    let (series, ids) = f.january_series();

    let deleted = f
        .scheduler
        .delete(&ids[2], Scope::ThisAndFuture, &f.actor)
        .unwrap();
    assert_eq!(deleted.removed.len(), 2);
    assert_eq!(deleted.series_removed, None);
    assert_eq!(f.dates_of(&series), vec![d(2024, 1, 1), d(2024, 1, 8)]);
    assert_eq!(f.repeat_end(&series), d(2024, 1, 8));
}

#[test]
fn deleting_from_the_first_occurrence_removes_the_series() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let deleted = f
        .scheduler
        .delete(&ids[0], Scope::ThisAndFuture, &f.actor)
        .unwrap();
    assert_eq!(deleted.series_removed, Some(series.clone()));
    assert!(f.scheduler.schedule().find_series(&series).is_none());
    assert!(f.scheduler.schedule().assignments.is_empty());
}

#[test]
fn deleting_a_single_occurrence_keeps_the_rule() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    f.scheduler
        .delete(&ids[3], Scope::ThisOccurrence, &f.actor)
        .unwrap();
    assert_eq!(
        f.dates_of(&series),
        vec![d(2024, 1, 1), d(2024, 1, 8), d(2024, 1, 15)]
    );
    assert_eq!(f.repeat_end(&series), d(2024, 1, 22));
}

#[test]
fn shrinking_the_end_date_drops_later_occurrences() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let request = f.weekly(&f.alice, d(2024, 1, 1), d(2024, 1, 10));

    let updated = f
        .scheduler
        .update(&ids[0], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap();
    assert!(matches!(updated, Updated::Shortened { ref removed, .. } if removed.len() == 2));
    assert_eq!(f.dates_of(&series), vec![d(2024, 1, 1), d(2024, 1, 8)]);
    assert_eq!(f.repeat_end(&series), d(2024, 1, 10));
    assert!(f.scheduler.schedule().find_assignment(&ids[0]).is_some());
    assert!(f.scheduler.schedule().find_assignment(&ids[1]).is_some());
}

#[test]
fn extending_the_end_date_appends_occurrences() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let request = f.weekly(&f.alice, d(2024, 1, 8), d(2024, 2, 5));

    let updated = f
        .scheduler
        .update(&ids[1], &request, Scope::ThisAndFuture, &f.actor);
    // l'occurrence éditée reste le 8 : seule la date de fin change
    assert!(matches!(updated, Ok(Updated::Extended { ref added, .. }) if added.len() == 2));
    assert_eq!(
        f.dates_of(&series),
        vec![
            d(2024, 1, 1),
            d(2024, 1, 8),
            d(2024, 1, 15),
            d(2024, 1, 22),
            d(2024, 1, 29),
            d(2024, 2, 5)
        ]
    );
    assert_eq!(f.repeat_end(&series), d(2024, 2, 5));
}

#[test]
fn extension_short_of_the_next_occurrence_only_moves_the_end() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let request = f.weekly(&f.alice, d(2024, 1, 1), d(2024, 1, 25));

    let updated = f
        .scheduler
        .update(&ids[0], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap();
    assert!(matches!(updated, Updated::Extended { ref added, .. } if added.is_empty()));
    assert_eq!(f.dates_of(&series).len(), 4);
    assert_eq!(f.repeat_end(&series), d(2024, 1, 25));
}

#[test]
fn conflicting_extension_inserts_nothing() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let blocker = f.single(&f.bob, d(2024, 2, 5), t(9, 0), t(9, 30));
    f.scheduler.create(&blocker, &f.actor).unwrap();

    let request = f.weekly(&f.alice, d(2024, 1, 1), d(2024, 2, 12));
    let err = f
        .scheduler
        .update(&ids[0], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(f.dates_of(&series).len(), 4);
    assert_eq!(f.repeat_end(&series), d(2024, 1, 22));
}

#[test]
fn rescheduling_future_occurrences_creates_a_new_series() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let mut request = f.weekly(&f.alice, d(2024, 1, 16), d(2024, 2, 27));
    request.start_time = t(11, 0);
    request.end_time = t(12, 0);
    request.repeat = Some(RepeatRule {
        interval: 2,
        unit: RepeatUnit::Week,
        end: RepeatEnd::Until(d(2024, 2, 27)),
    });

    let updated = f
        .scheduler
        .update(&ids[2], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap();
    let Updated::Rescheduled {
        series_removed,
        removed,
        created: Created::Series { series_id: fresh, .. },
        ..
    } = updated
    else {
        panic!("expected a rescheduled series");
    };
    assert!(!series_removed);
    assert_eq!(removed.len(), 2);
    assert_eq!(f.dates_of(&series), vec![d(2024, 1, 1), d(2024, 1, 8)]);
    assert_eq!(f.repeat_end(&series), d(2024, 1, 8));
    assert_eq!(
        f.dates_of(&fresh),
        vec![d(2024, 1, 16), d(2024, 1, 30), d(2024, 2, 13), d(2024, 2, 27)]
    );
    assert!(f
        .scheduler
        .schedule()
        .series_members(&fresh)
        .iter()
        .all(|a| a.start_time == t(11, 0)));
}

#[test]
fn conflicting_reschedule_rolls_back_the_deletions() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let blocker = f.single(&f.bob, d(2024, 1, 23), t(11, 0), t(12, 0));
    f.scheduler.create(&blocker, &f.actor).unwrap();

    let mut request = f.weekly(&f.alice, d(2024, 1, 16), d(2024, 1, 30));
    request.start_time = t(11, 0);
    request.end_time = t(12, 0);
    let err = f
        .scheduler
        .update(&ids[2], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(f.dates_of(&series).len(), 4);
    assert_eq!(f.repeat_end(&series), d(2024, 1, 22));
    assert_eq!(f.scheduler.schedule().series.len(), 1);
}

#[test]
fn rescheduling_from_the_anchor_replaces_the_series() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let mut request = f.weekly(&f.alice, d(2024, 1, 1), d(2024, 1, 22));
    request.start_time = t(9, 0);
    request.end_time = t(9, 45);

    let updated = f
        .scheduler
        .update(&ids[0], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap();
    assert!(matches!(
        updated,
        Updated::Rescheduled {
            series_removed: true,
            ..
        }
    ));
    assert!(f.scheduler.schedule().find_series(&series).is_none());
    assert_eq!(f.scheduler.schedule().series.len(), 1);
    assert_eq!(f.scheduler.schedule().assignments.len(), 4);
}

#[test]
fn demoting_a_series_keeps_the_edited_occurrence() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let request = f.single(&f.alice, d(2024, 1, 8), t(9, 0), t(10, 0));

    let updated = f
        .scheduler
        .update(&ids[1], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap();
    assert!(matches!(updated, Updated::Demoted { ref removed, .. } if removed.len() == 2));
    assert_eq!(f.dates_of(&series), vec![d(2024, 1, 1), d(2024, 1, 8)]);
    assert_eq!(f.repeat_end(&series), d(2024, 1, 8));
}

#[test]
fn demoting_with_a_new_date_detaches_the_occurrence() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let request = f.single(&f.alice, d(2024, 1, 10), t(9, 0), t(10, 0));

    let updated = f
        .scheduler
        .update(&ids[1], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap();
    let Updated::Demoted {
        removed,
        detached: Some(moved),
        ..
    } = updated
    else {
        panic!("expected a demotion with a detached occurrence");
    };
    assert_eq!(removed.len(), 3);
    assert_eq!(f.dates_of(&series), vec![d(2024, 1, 1)]);
    assert_eq!(f.repeat_end(&series), d(2024, 1, 1));

    let row = f.scheduler.schedule().find_assignment(&moved).unwrap();
    assert!(row.is_standalone());
    assert_eq!(row.date, d(2024, 1, 10));

    // toutes les occurrences restantes tiennent dans [ancrage, fin]
    let rule = f.scheduler.schedule().find_series(&series).unwrap();
    assert!(f
        .scheduler
        .schedule()
        .series_members(&series)
        .iter()
        .all(|a| rule.anchor_date <= a.date && a.date <= rule.repeat_end_date));
}

#[test]
fn demoting_the_anchor_with_new_times_drops_the_series() {
    let mut f = fixture();
    let (series, ids) = f.january_series();
    let request = f.single(&f.alice, d(2024, 1, 1), t(14, 0), t(15, 0));

    let updated = f
        .scheduler
        .update(&ids[0], &request, Scope::ThisAndFuture, &f.actor)
        .unwrap();
    assert!(matches!(updated, Updated::Demoted { detached: Some(_), .. }));
    assert!(f.scheduler.schedule().find_series(&series).is_none());
    let rows = &f.scheduler.schedule().assignments;
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].start_time, rows[0].series_id.as_ref()), (t(14, 0), None));
}

#[test]
fn standalone_update_ignores_itself_but_not_others() {
    let mut f = fixture();
    let first = f.single(&f.alice, d(2024, 1, 1), t(9, 0), t(10, 0));
    let Created::Standalone(id) = f.scheduler.create(&first, &f.actor).unwrap() else {
        panic!("expected a standalone assignment");
    };
    let other = f.single(&f.bob, d(2024, 1, 1), t(11, 0), t(12, 0));
    f.scheduler.create(&other, &f.actor).unwrap();

    let widen = f.single(&f.alice, d(2024, 1, 1), t(9, 0), t(10, 30));
    assert_eq!(
        f.scheduler
            .update(&id, &widen, Scope::ThisOccurrence, &f.actor)
            .unwrap(),
        Updated::InPlace(id.clone())
    );

    let clash = f.single(&f.alice, d(2024, 1, 1), t(10, 0), t(11, 30));
    let err = f
        .scheduler
        .update(&id, &clash, Scope::ThisOccurrence, &f.actor)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let row = f.scheduler.schedule().find_assignment(&id).unwrap();
    assert_eq!(row.end_time, t(10, 30));
}

#[test]
fn standalone_promoted_to_series() {
    let mut f = fixture();
    let first = f.single(&f.alice, d(2024, 1, 1), t(9, 0), t(10, 0));
    let Created::Standalone(id) = f.scheduler.create(&first, &f.actor).unwrap() else {
        panic!("expected a standalone assignment");
    };
    let request = f.weekly(&f.alice, d(2024, 1, 1), d(2024, 1, 15));
    let updated = f
        .scheduler
        .update(&id, &request, Scope::ThisOccurrence, &f.actor)
        .unwrap();
    assert!(matches!(updated, Updated::Promoted(Created::Series { ref assignments, .. }) if assignments.len() == 3));
    assert!(f.scheduler.schedule().find_assignment(&id).is_none());
}

#[test]
fn standalone_creation_is_blocked_by_leave() {
    let mut f = fixture();
    let leave = LeavePeriod::new(f.alice.id.clone(), d(2024, 1, 1), d(2024, 1, 2)).unwrap();
    f.scheduler.add_leaves(vec![leave]);

    let request = f.single(&f.alice, d(2024, 1, 2), t(10, 0), t(11, 0));
    let err = f.scheduler.create(&request, &f.actor).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LeaveConflict);

    let series = f.weekly(&f.alice, d(2024, 1, 1), d(2024, 1, 15));
    let created = f.scheduler.create(&series, &f.actor).unwrap();
    assert!(matches!(created, Created::Series { ref leave_warnings, .. } if leave_warnings.len() == 1));
}

#[test]
fn validation_errors_are_typed() {
    let mut f = fixture();

    let backwards = f.single(&f.alice, d(2024, 1, 1), t(10, 0), t(9, 0));
    let err = f.scheduler.create(&backwards, &f.actor).unwrap_err();
    assert!(matches!(err, SchedError::InvalidTimeRange));
    insta::assert_snapshot!(err.to_string(), @"invalid time range: start time must be before end time");

    let empty = f.single(&f.alice, d(2024, 1, 1), t(10, 0), t(10, 0));
    assert_eq!(
        f.scheduler.create(&empty, &f.actor).unwrap_err().kind(),
        ErrorKind::Validation
    );

    let ends_early = f.weekly(&f.alice, d(2024, 1, 8), d(2024, 1, 1));
    assert!(matches!(
        f.scheduler.create(&ends_early, &f.actor),
        Err(SchedError::InvalidRepeat(_))
    ));

    let mut zero = f.weekly(&f.alice, d(2024, 1, 1), d(2024, 2, 1));
    zero.repeat = Some(RepeatRule {
        interval: 0,
        unit: RepeatUnit::Day,
        end: RepeatEnd::Until(d(2024, 2, 1)),
    });
    assert!(matches!(
        f.scheduler.create(&zero, &f.actor),
        Err(SchedError::InvalidRepeat(_))
    ));

    assert!(f.scheduler.schedule().assignments.is_empty());
}

#[test]
fn unknown_entities_are_not_found() {
    let mut f = fixture();
    let mut request = f.single(&f.alice, d(2024, 1, 1), t(9, 0), t(10, 0));
    request.clinician_id = affectation::ClinicianId::new("nobody");
    assert_eq!(
        f.scheduler.create(&request, &f.actor).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let mut request = f.single(&f.alice, d(2024, 1, 1), t(9, 0), t(10, 0));
    request.location_id = affectation::LocationId::new("nowhere");
    assert!(matches!(
        f.scheduler.create(&request, &f.actor),
        Err(SchedError::UnknownLocation(_))
    ));

    f.scheduler.schedule_mut().locations[0].active = false;
    let request = f.single(&f.alice, d(2024, 1, 1), t(9, 0), t(10, 0));
    assert!(matches!(
        f.scheduler.create(&request, &f.actor),
        Err(SchedError::UnknownLocation(_))
    ));

    let missing = AssignmentId::new("missing");
    assert!(matches!(
        f.scheduler.delete(&missing, Scope::ThisOccurrence, &f.actor),
        Err(SchedError::UnknownAssignment(_))
    ));
}

#[test]
fn horizon_limits_dates_and_repeat_ends() {
    let mut f = fixture();
    let too_far = f.single(&f.alice, d(2026, 2, 1), t(9, 0), t(10, 0));
    assert!(matches!(
        f.scheduler.create(&too_far, &f.actor),
        Err(SchedError::BeyondHorizon { horizon, .. }) if horizon == d(2026, 1, 1)
    ));

    let long_series = f.weekly(&f.alice, d(2024, 1, 1), d(2026, 6, 1));
    assert_eq!(
        f.scheduler.create(&long_series, &f.actor).unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[test]
fn occurrence_count_ends_the_series() {
    let mut f = fixture();
    let mut request = f.weekly(&f.alice, d(2024, 1, 31), d(2024, 1, 31));
    request.repeat = Some(RepeatRule {
        interval: 1,
        unit: RepeatUnit::Month,
        end: RepeatEnd::Occurrences(3),
    });
    let Created::Series { series_id, .. } = f.scheduler.create(&request, &f.actor).unwrap() else {
        panic!("expected a series");
    };
    assert_eq!(
        f.dates_of(&series_id),
        vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31)]
    );
    assert_eq!(f.repeat_end(&series_id), d(2024, 3, 31));
}

#[test]
fn slot_window_rejects_misaligned_times() {
    let config = SchedulerConfig {
        today: Some(d(2024, 1, 1)),
        slots: Some(SlotWindow {
            earliest: t(9, 0),
            latest: t(17, 0),
            slot_minutes: 30,
        }),
        ..SchedulerConfig::default()
    };
    let mut f = fixture();
    let schedule = f.scheduler.schedule().clone();
    f.scheduler = Scheduler::from_schedule(schedule, config);
    assert_eq!(f.scheduler.config().conflict_limit, 10);

    let ok = f.single(&f.alice, d(2024, 1, 1), t(9, 30), t(11, 0));
    assert!(f.scheduler.create(&ok, &f.actor).is_ok());

    for (start, end) in [(t(8, 30), t(9, 30)), (t(16, 30), t(17, 30)), (t(12, 15), t(13, 0))] {
        let request = f.single(&f.alice, d(2024, 1, 2), start, end);
        assert!(matches!(
            f.scheduler.create(&request, &f.actor),
            Err(SchedError::OutsideSlots(_))
        ));
    }
}

#[test]
fn listing_filters_and_paginates() {
    let mut f = fixture();
    f.january_series();
    let single = f.single(&f.bob, d(2024, 1, 8), t(13, 0), t(14, 0));
    f.scheduler.create(&single, &f.actor).unwrap();
    let leave = LeavePeriod::new(f.alice.id.clone(), d(2024, 1, 15), d(2024, 1, 15)).unwrap();
    f.scheduler.add_leaves(vec![leave]);

    let page = f.scheduler.list(&ListQuery {
        after: Some(d(2024, 1, 5)),
        before: Some(d(2024, 1, 31)),
        ..ListQuery::default()
    });
    assert_eq!(page.count, 3);
    let listed: Vec<_> = page.data.iter().map(|a| (a.date, a.start_time)).collect();
    assert_eq!(
        listed,
        vec![
            (d(2024, 1, 8), t(9, 0)),
            (d(2024, 1, 8), t(13, 0)),
            (d(2024, 1, 22), t(9, 0))
        ]
    );

    let second_page = f.scheduler.list(&ListQuery {
        exclude_on_leave: false,
        page: 1,
        rows_per_page: 2,
        ..ListQuery::default()
    });
    assert_eq!(second_page.count, 5);
    assert_eq!(second_page.data.len(), 2);
    assert_eq!(second_page.data[0].date, d(2024, 1, 15));
}

#[test]
fn listing_filters_by_facility() {
    let mut f = fixture();
    let annex = Location::new("Annexe 2").in_facility("Annexe");
    f.scheduler.add_locations(vec![annex.clone()]);
    f.january_series();
    let mut request = f.single(&f.bob, d(2024, 1, 3), t(9, 0), t(10, 0));
    request.location_id = annex.id.clone();
    f.scheduler.create(&request, &f.actor).unwrap();

    let page = f.scheduler.list(&ListQuery {
        facility: Some("Annexe".to_string()),
        ..ListQuery::default()
    });
    assert_eq!(page.count, 1);
    assert_eq!(page.data[0].location_id, annex.id);

    let none = f.scheduler.list(&ListQuery {
        facility: Some("Siège".to_string()),
        ..ListQuery::default()
    });
    assert_eq!(none.count, 0);
}
