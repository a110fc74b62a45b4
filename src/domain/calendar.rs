//! Calendar months and event date handling.

use std::fmt;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

/// A month of the events calendar; the unit the backend lists events by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventMonth {
    year: i32,
    month: Month,
}

impl EventMonth {
    /// `month` is 1-based. Returns `None` outside 1..=12.
    pub fn new(month: u8, year: i32) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        Some(Self { year, month })
    }

    pub fn current() -> Self {
        Self::containing(OffsetDateTime::now_utc().date())
    }

    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month a month-grid view shows when its first cell is `grid_start`.
    /// A grid that starts on a day other than the 1st opens with trailing days
    /// of the previous month.
    pub fn from_grid_start(grid_start: Date) -> Self {
        let month = Self::containing(grid_start);
        if grid_start.day() == 1 {
            month
        } else {
            month.next()
        }
    }

    pub fn month(&self) -> u8 {
        u8::from(self.month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self {
                year: self.year + 1,
                month: Month::January,
            },
            month => Self {
                year: self.year,
                month: month.next(),
            },
        }
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self {
                year: self.year - 1,
                month: Month::December,
            },
            month => Self {
                year: self.year,
                month: month.previous(),
            },
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for EventMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month())
    }
}

/// Parse an event date as the backend sends or accepts it: RFC 3339, a
/// `YYYY-MM-DD HH:MM:SS` timestamp, or a bare `YYYY-MM-DD` date.
pub fn parse_event_date(value: &str) -> Option<PrimitiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(PrimitiveDateTime::new(parsed.date(), parsed.time()));
    }
    let timestamp = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(parsed) = PrimitiveDateTime::parse(value, timestamp) {
        return Some(parsed);
    }
    let date = format_description!("[year]-[month]-[day]");
    Date::parse(value, date).ok().map(Date::midnight)
}
