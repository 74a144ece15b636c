// src/clock.rs

use std::sync::Mutex;

use chrono::{Days, NaiveDate, Utc};

/// Source of the calendar date every streak and challenge operation runs against.
///
/// All day boundaries are UTC.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn yesterday(&self) -> NaiveDate {
        let today = self.today();
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    }
}

/// Wall clock, UTC calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = date;
    }

    pub fn advance_days(&self, days: u64) {
        let mut today = self.today.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = today.checked_add_days(Days::new(days)) {
            *today = next;
        }
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}
