// Découpage du temps pour les rapports (jour / semaine / mois / année)
// et fenêtres de dates [start, end).

use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};
use crate::models::dto::ListPeriod;

/// Nombre maximal de points d'une série (10 ans au jour près)
pub const MAX_BUCKETS: usize = 3_660;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Bucket {
    /// Premier jour du bucket contenant `date` (semaines ISO: lundi)
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            Bucket::Day => date,
            Bucket::Week => date
                .checked_sub_days(Days::new(date.weekday().num_days_from_monday() as u64))
                .unwrap_or(date),
            Bucket::Month => date.with_day(1).unwrap_or(date),
            Bucket::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }

    /// Début du bucket suivant, None au-delà du calendrier représentable
    pub fn next_start(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Bucket::Day => start.succ_opt(),
            Bucket::Week => start.checked_add_days(Days::new(7)),
            Bucket::Month => start.checked_add_months(Months::new(1)),
            Bucket::Year => start.checked_add_months(Months::new(12)),
        }
    }

    pub fn label(self, start: NaiveDate) -> String {
        match self {
            Bucket::Day | Bucket::Week => start.format("%d/%m").to_string(),
            Bucket::Month => start.format("%b/%Y").to_string(),
            Bucket::Year => start.format("%Y").to_string(),
        }
    }

    /// Période calendaire courante (aujourd'hui, cette semaine, ce mois, cette année)
    pub fn current_window(self, today: NaiveDate) -> DateRange {
        let start = self.start_of(today);
        let end = self.next_start(start).map(midnight).unwrap_or(NaiveDateTime::MAX);
        DateRange::new(midnight(start), end)
    }

    /// Débuts de tous les buckets qui recoupent la fenêtre.
    /// None si la fenêtre en contient plus de `limit`.
    pub fn buckets(self, range: &DateRange, limit: usize) -> Option<Vec<NaiveDate>> {
        let mut starts = Vec::new();
        let mut cursor = Some(self.start_of(range.start.date()));
        while let Some(start) = cursor.filter(|c| midnight(*c) < range.end) {
            if starts.len() == limit {
                return None;
            }
            starts.push(start);
            cursor = self.next_start(start);
        }
        Some(starts)
    }
}

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Borne exclusive d'une date de fin inclusive: lendemain à minuit
pub fn end_bound(end: NaiveDate) -> Result<NaiveDateTime> {
    end.succ_opt()
        .map(midnight)
        .ok_or_else(|| AppError::validation("end", "End date is out of range"))
}

/// Fenêtre demi-ouverte [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        DateRange { start, end }
    }

    /// Dates inclusives saisies par l'utilisateur → [start 00:00, end+1 00:00)
    pub fn from_dates(start: NaiveDate, end_inclusive: NaiveDate) -> Result<Self> {
        Ok(DateRange::new(midnight(start), end_bound(end_inclusive)?))
    }

    /// `days` jours se terminant à `now`
    pub fn trailing_days(now: NaiveDateTime, days: i64) -> Self {
        DateRange::new(now - Duration::days(days), now)
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Fenêtre de même longueur juste avant celle-ci
    pub fn previous(&self) -> Self {
        DateRange::new(self.start - self.length(), self.start)
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at < self.end
    }
}

/// Borne basse des raccourcis de liste (today / week / month / year)
pub fn list_period_start(period: ListPeriod, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    match period {
        ListPeriod::Today => midnight(today),
        ListPeriod::Week => now - Duration::days(7),
        ListPeriod::Month => midnight(Bucket::Month.start_of(today)),
        ListPeriod::Year => midnight(Bucket::Year.start_of(today)),
    }
}
