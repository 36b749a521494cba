// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use time::{Date, Duration, Month, OffsetDateTime};

pub const GRID_WEEKS: usize = 6;
pub const GRID_DAYS: usize = GRID_WEEKS * 7;

/// Six Monday-first weeks covering a view month, including spillover days
/// from the neighbouring months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    year: i32,
    month: Month,
    days: Vec<Date>,
}

impl MonthGrid {
    pub fn new(year: i32, month: Month) -> Result<Self> {
        let start = grid_start(year, month)?;
        let days = (0..GRID_DAYS as i64)
            .map(|offset| {
                start
                    .checked_add(Duration::days(offset))
                    .ok_or_else(|| anyhow!("calendar grid for {month} {year} is out of range"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { year, month, days })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn days(&self) -> &[Date] {
        &self.days
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[Date]> {
        self.days.chunks(7)
    }

    pub fn first(&self) -> Date {
        self.days[0]
    }

    pub fn last(&self) -> Date {
        self.days[GRID_DAYS - 1]
    }

    pub fn contains(&self, date: Date) -> bool {
        date >= self.first() && date <= self.last()
    }

    /// False for spillover cells.
    pub fn is_view_month(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// The Monday on or before the first of the month.
pub fn grid_start(year: i32, month: Month) -> Result<Date> {
    let first = Date::from_calendar_date(year, month, 1)
        .with_context(|| format!("invalid calendar month {month} {year}"))?;
    let offset = i64::from(first.weekday().number_days_from_monday());
    first
        .checked_sub(Duration::days(offset))
        .ok_or_else(|| anyhow!("calendar grid for {month} {year} is out of range"))
}

pub fn is_in_visible_grid(date: Date, year: i32, month: Month) -> bool {
    MonthGrid::new(year, month).is_ok_and(|grid| grid.contains(date))
}

/// Inclusive first/last day of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub first: Date,
    pub last: Date,
}

impl MonthRange {
    pub fn new(year: i32, month: Month) -> Result<Self> {
        let first = Date::from_calendar_date(year, month, 1)
            .with_context(|| format!("invalid report month {month} {year}"))?;
        let last_day = time::util::days_in_year_month(year, month);
        let last = Date::from_calendar_date(year, month, last_day)
            .with_context(|| format!("invalid report month {month} {year}"))?;
        Ok(Self { first, last })
    }

    pub fn contains(&self, date: Date) -> bool {
        date >= self.first && date <= self.last
    }
}

/// Today in the local timezone, or in UTC when the offset is unknown.
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Moves `date` by whole months, clamping the day to the target month length.
pub fn shift_months(date: Date, months: i32) -> Option<Date> {
    let zero_based = date.year() * 12 + i32::from(u8::from(date.month())) - 1 + months;
    let year = zero_based.div_euclid(12);
    let month = Month::try_from(u8::try_from(zero_based.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(time::util::days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).ok()
}

/// Selection and view month of the calendar screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub selected: Date,
    pub view_year: i32,
    pub view_month: Month,
}

impl CalendarCursor {
    pub fn at(date: Date) -> Self {
        Self {
            selected: date,
            view_year: date.year(),
            view_month: date.month(),
        }
    }

    pub fn grid(&self) -> Result<MonthGrid> {
        MonthGrid::new(self.view_year, self.view_month)
    }

    /// Day/week stepping. Steps that leave the visible grid are rejected and
    /// the view month never changes.
    pub fn step_days(&mut self, days: i64) -> bool {
        let Some(next) = self.selected.checked_add(Duration::days(days)) else {
            return false;
        };
        if !is_in_visible_grid(next, self.view_year, self.view_month) {
            return false;
        }
        self.selected = next;
        true
    }

    /// Month paging moves the selection and re-homes the view on it.
    pub fn page_months(&mut self, months: i32) -> bool {
        match shift_months(self.selected, months) {
            Some(next) => {
                *self = Self::at(next);
                true
            }
            None => false,
        }
    }

    pub fn jump_to(&mut self, date: Date) {
        *self = Self::at(date);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CalendarCursor, GRID_DAYS, MonthGrid, MonthRange, grid_start, local_today, shift_months,
    };
    use anyhow::Result;
    use time::{Date, Duration, Month, OffsetDateTime, Weekday};

    fn date(year: i32, month: Month, day: u8) -> Result<Date> {
        Ok(Date::from_calendar_date(year, month, day)?)
    }

    #[test]
    fn march_2024_grid_spans_feb_26_to_apr_7() -> Result<()> {
        let grid = MonthGrid::new(2024, Month::March)?;
        assert_eq!(grid.first(), date(2024, Month::February, 26)?);
        assert_eq!(grid.last(), date(2024, Month::April, 7)?);
        assert_eq!(grid.last().weekday(), Weekday::Sunday);
        Ok(())
    }

    #[test]
    fn every_grid_has_42_consecutive_days_starting_monday() -> Result<()> {
        for year in [1999, 2023, 2024, 2025, 2100] {
            for month_number in 1..=12u8 {
                let month = Month::try_from(month_number)?;
                let grid = MonthGrid::new(year, month)?;
                assert_eq!(grid.days().len(), GRID_DAYS);
                assert_eq!(grid.first().weekday(), Weekday::Monday);
                for pair in grid.days().windows(2) {
                    assert_eq!(pair[1] - pair[0], Duration::days(1));
                }
                assert!(grid.contains(date(year, month, 1)?));
            }
        }
        Ok(())
    }

    #[test]
    fn month_starting_monday_has_no_leading_spillover() -> Result<()> {
        assert_eq!(grid_start(2024, Month::January)?, date(2024, Month::January, 1)?);
        Ok(())
    }

    #[test]
    fn spillover_cells_are_not_view_month() -> Result<()> {
        let grid = MonthGrid::new(2024, Month::March)?;
        assert!(!grid.is_view_month(grid.first()));
        assert!(grid.is_view_month(date(2024, Month::March, 31)?));
        assert_eq!(grid.weeks().count(), 6);
        Ok(())
    }

    #[test]
    fn step_days_rejects_leaving_visible_grid() -> Result<()> {
        let mut cursor = CalendarCursor::at(date(2024, Month::March, 1)?);
        assert!(cursor.step_days(-4));
        assert_eq!(cursor.selected, date(2024, Month::February, 26)?);
        assert_eq!(cursor.view_month, Month::March);

        assert!(!cursor.step_days(-1));
        assert_eq!(cursor.selected, date(2024, Month::February, 26)?);

        assert!(!cursor.step_days(-7));
        Ok(())
    }

    #[test]
    fn week_step_into_trailing_spillover_keeps_view() -> Result<()> {
        let mut cursor = CalendarCursor::at(date(2024, Month::March, 31)?);
        assert!(cursor.step_days(7));
        assert_eq!(cursor.selected, date(2024, Month::April, 7)?);
        assert_eq!(cursor.view_month, Month::March);
        assert!(!cursor.step_days(1));
        Ok(())
    }

    #[test]
    fn page_months_rehomes_view_and_clamps_day() -> Result<()> {
        let mut cursor = CalendarCursor::at(date(2024, Month::January, 31)?);
        assert!(cursor.page_months(1));
        assert_eq!(cursor.selected, date(2024, Month::February, 29)?);
        assert_eq!(cursor.view_month, Month::February);

        assert!(cursor.page_months(-2));
        assert_eq!(cursor.selected, date(2023, Month::December, 29)?);
        assert_eq!(cursor.view_year, 2023);
        Ok(())
    }

    #[test]
    fn shift_months_crosses_year_boundaries() -> Result<()> {
        assert_eq!(
            shift_months(date(2024, Month::December, 15)?, 1),
            Some(date(2025, Month::January, 15)?)
        );
        assert_eq!(
            shift_months(date(2024, Month::January, 15)?, -13),
            Some(date(2022, Month::December, 15)?)
        );
        Ok(())
    }

    #[test]
    fn month_range_covers_leap_february() -> Result<()> {
        let range = MonthRange::new(2024, Month::February)?;
        assert_eq!(range.first, date(2024, Month::February, 1)?);
        assert_eq!(range.last, date(2024, Month::February, 29)?);
        assert!(range.contains(date(2024, Month::February, 15)?));
        assert!(!range.contains(date(2024, Month::March, 1)?));
        Ok(())
    }

    #[test]
    fn local_today_is_within_a_day_of_utc() {
        let utc = OffsetDateTime::now_utc().date();
        let local = local_today();
        assert!((local - utc).whole_days().abs() <= 1);
    }
}
