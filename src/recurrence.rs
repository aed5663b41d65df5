//! Génération des dates d'occurrence d'une règle de récurrence.
//!
//! Seuls les pas fixes jour/semaine/mois sont pris en charge. Le pas mensuel est
//! calculé depuis la date d'ancrage (le 31 janvier donne le 29 février puis le
//! 31 mars), jamais par incréments successifs.

use crate::model::RepeatUnit;
use chrono::{Days, Months, NaiveDate};

/// Suite finie et ordonnée des occurrences `anchor + k·interval·unit` ≤ `end`.
///
/// Le type est `Clone` : cloner l'itérateur avant consommation permet de
/// reparcourir la suite depuis le début.
#[derive(Debug, Clone)]
pub struct OccurrenceDates {
    anchor: NaiveDate,
    end: NaiveDate,
    interval: u32,
    unit: RepeatUnit,
    step: u32,
    done: bool,
}

impl Iterator for OccurrenceDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.done {
            return None;
        }
        if self.step == 0 {
            self.step = 1;
            // anchor > end : la suite se réduit à l'ancrage
            if self.anchor > self.end || self.interval == 0 {
                self.done = true;
            }
            return Some(self.anchor);
        }
        let candidate = self
            .step
            .checked_mul(self.interval)
            .and_then(|n| advance(self.anchor, n, self.unit));
        match candidate {
            Some(date) if date <= self.end => {
                self.step += 1;
                Some(date)
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for OccurrenceDates {}

/// Dates d'occurrence de `anchor` à `end` inclus.
pub fn generate_occurrence_dates(
    anchor: NaiveDate,
    end: NaiveDate,
    interval: u32,
    unit: RepeatUnit,
) -> OccurrenceDates {
    OccurrenceDates {
        anchor,
        end,
        interval,
        unit,
        step: 0,
        done: false,
    }
}

/// Occurrence suivant immédiatement `last`, pour prolonger une série sans la régénérer.
pub fn next_occurrence_after(last: NaiveDate, interval: u32, unit: RepeatUnit) -> Option<NaiveDate> {
    advance(last, interval, unit)
}

/// Date de la `count`-ième occurrence (la première étant `anchor`).
pub fn end_date_for_occurrences(
    anchor: NaiveDate,
    count: u32,
    interval: u32,
    unit: RepeatUnit,
) -> Option<NaiveDate> {
    let steps = count.checked_sub(1)?;
    advance(anchor, steps.checked_mul(interval)?, unit)
}

fn advance(date: NaiveDate, n: u32, unit: RepeatUnit) -> Option<NaiveDate> {
    match unit {
        RepeatUnit::Day => date.checked_add_days(Days::new(u64::from(n))),
        RepeatUnit::Week => date.checked_add_days(Days::new(u64::from(n) * 7)),
        RepeatUnit::Month => date.checked_add_months(Months::new(n)),
    }
}
