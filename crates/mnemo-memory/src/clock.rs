// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time source for daily-log selection and entry timestamps.

use chrono::{DateTime, Days, Local, NaiveDate, Utc};

/// Supplies the current instant.
///
/// Daily files are keyed by the UTC date; entry headings use local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Today's daily-file date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Yesterday's daily-file date.
    fn yesterday(&self) -> NaiveDate {
        let today = self.today();
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    }

    /// `HH:MM` in the local timezone, for daily entry headings.
    fn local_time_label(&self) -> String {
        self.now().with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Noon UTC on the given date.
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
