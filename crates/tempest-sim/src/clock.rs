//! Game clock and calendar derivation.
//!
//! This module provides world time management:
//! - Tick-driven advance with independent day/night rates
//! - Calendar derivation (hour, day, month, year, season)
//! - Boundary-crossing events (hour, day-time, day, month, year)
//! - Sun position for the visual effector

use serde::{Deserialize, Serialize};

use crate::events::EnvEvent;

/// Game-seconds added per configured period length (six game-hours).
const ADVANCE_SPAN_SECONDS: f32 = 21600.0;
/// Seconds in a game hour.
const SECONDS_PER_HOUR: f64 = 3600.0;
/// Seconds in a game day.
const SECONDS_PER_DAY: f64 = 86400.0;
/// Days in a game month.
const DAYS_PER_MONTH: u64 = 30;
/// Days in a game year (12 months of 30 days).
const DAYS_PER_YEAR: u64 = 360;

/// Default real seconds to traverse the day half (07:00-20:00).
const DEFAULT_DAY_LENGTH: f32 = 720.0;
/// Default real seconds to traverse the night half (20:00-07:00).
const DEFAULT_NIGHT_LENGTH: f32 = 240.0;
/// Default real seconds per clock tick.
const DEFAULT_TICK_FREQUENCY: f32 = 0.1;

/// Season of the year, derived from the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    /// Months 3, 4, 5.
    Spring,
    /// Months 6, 7, 8.
    Summer,
    /// Months 9, 10, 11.
    Autumn,
    /// Months 12, 1, 2.
    Winter,
}

impl Season {
    /// Get the season for a month (1-12).
    #[must_use]
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Autumn,
            _ => Self::Winter,
        }
    }

    /// Get the display name of this season.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
        }
    }
}

/// Bucket of the day, derived from the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayTime {
    /// 07:00 - 11:59.
    Morning,
    /// 12:00 - 16:59.
    Afternoon,
    /// 17:00 - 19:59.
    Evening,
    /// 20:00 - 06:59.
    Night,
}

impl DayTime {
    /// Get the day-time bucket for an hour (0-23).
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour % 24 {
            7..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=19 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Check if this bucket falls in the day half of the cycle.
    #[must_use]
    pub const fn is_day(self) -> bool {
        matches!(self, Self::Morning | Self::Afternoon | Self::Evening)
    }
}

/// Derived calendar fields for a point in game time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Hour of day (0-23).
    pub hour: u32,
    /// Day-time bucket.
    pub day_time: DayTime,
    /// Day of month (1-30).
    pub day: u32,
    /// Month of year (1-12).
    pub month: u32,
    /// Season derived from the month.
    pub season: Season,
    /// Year (1+).
    pub year: u32,
}

/// The authoritative game clock.
///
/// Elapsed time is a monotonically non-decreasing duration since the
/// world epoch, advanced each tick at a rate that depends on whether
/// the current hour falls in the day half (07:00-20:00) or the night
/// half. Calendar fields are derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    /// Elapsed game time in seconds since the world epoch.
    elapsed_seconds: f64,
    /// Real seconds per clock tick.
    tick_frequency: f32,
    /// Real seconds to traverse the day half of the cycle.
    day_length: f32,
    /// Real seconds to traverse the night half of the cycle.
    night_length: f32,
    /// Whether the clock is frozen.
    paused: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock {
    /// Create a clock at the world epoch with default pacing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elapsed_seconds: 0.0,
            tick_frequency: DEFAULT_TICK_FREQUENCY,
            day_length: DEFAULT_DAY_LENGTH,
            night_length: DEFAULT_NIGHT_LENGTH,
            paused: false,
        }
    }

    /// Create a clock with specific day/night pacing.
    ///
    /// # Arguments
    /// * `day_length` - real seconds for the 07:00-20:00 half
    /// * `night_length` - real seconds for the 20:00-07:00 half
    /// * `tick_frequency` - real seconds per tick
    #[must_use]
    pub fn with_pacing(day_length: f32, night_length: f32, tick_frequency: f32) -> Self {
        Self {
            elapsed_seconds: 0.0,
            tick_frequency: tick_frequency.max(0.01),
            day_length: day_length.max(2.0),
            night_length: night_length.max(2.0),
            paused: false,
        }
    }

    /// Get the elapsed game time in seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Get the elapsed game time in minutes.
    #[must_use]
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed_seconds / 60.0
    }

    /// Get the tick frequency in real seconds.
    #[must_use]
    pub fn tick_frequency(&self) -> f32 {
        self.tick_frequency
    }

    /// Set the tick frequency in real seconds (clamped to >= 0.01).
    pub fn set_tick_frequency(&mut self, frequency: f32) {
        self.tick_frequency = frequency.max(0.01);
    }

    /// Check if the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze the clock; `advance` becomes a no-op.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Unfreeze the clock.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Complete days elapsed since the epoch.
    fn days(&self) -> u64 {
        (self.elapsed_seconds / SECONDS_PER_DAY) as u64
    }

    /// Get the current hour of day (0-23).
    #[must_use]
    pub fn hour(&self) -> u32 {
        ((self.elapsed_seconds / SECONDS_PER_HOUR) as u64 % 24) as u32
    }

    /// Get the current minute (0-59).
    #[must_use]
    pub fn minute(&self) -> u32 {
        ((self.elapsed_seconds / 60.0) as u64 % 60) as u32
    }

    /// Get the current day of month (1-30).
    #[must_use]
    pub fn day_of_month(&self) -> u32 {
        let day = (self.days() % DAYS_PER_MONTH) as u32;
        if day == 0 {
            30
        } else {
            day
        }
    }

    /// Get the current month of year (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        let month = ((self.days() % DAYS_PER_YEAR) / DAYS_PER_MONTH) as u32;
        if month == 0 {
            12
        } else {
            month
        }
    }

    /// Get the current year (1+).
    #[must_use]
    pub fn year(&self) -> u32 {
        (self.days() / DAYS_PER_YEAR) as u32 + 1
    }

    /// Get the current season.
    #[must_use]
    pub fn season(&self) -> Season {
        Season::from_month(self.month())
    }

    /// Get the current day-time bucket.
    #[must_use]
    pub fn day_time(&self) -> DayTime {
        DayTime::from_hour(self.hour())
    }

    /// Get all derived calendar fields at once.
    #[must_use]
    pub fn calendar(&self) -> Calendar {
        let hour = self.hour();
        let month = self.month();
        Calendar {
            hour,
            day_time: DayTime::from_hour(hour),
            day: self.day_of_month(),
            month,
            season: Season::from_month(month),
            year: self.year(),
        }
    }

    /// Maps the time of day to the sun's yaw rotation in degrees
    /// (90 = midnight, 180 = 06:00, 270 = 12:00, 0/360 = 18:00).
    /// Negate for the moon's yaw.
    #[must_use]
    pub fn sun_yaw(&self) -> f32 {
        let seconds_today = self.elapsed_seconds % SECONDS_PER_DAY;
        90.0 + (seconds_today / SECONDS_PER_DAY) as f32 * 359.9
    }

    /// Get a formatted time string (HH:MM).
    #[must_use]
    pub fn formatted_time(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }

    /// Get a formatted calendar string.
    #[must_use]
    pub fn formatted_date(&self) -> String {
        format!(
            "Year {}, Month {}, Day {} ({})",
            self.year(),
            self.month(),
            self.day_of_month(),
            self.season().display_name()
        )
    }

    /// Advance the clock by one tick.
    ///
    /// Adds `21600 / (period / tick_frequency)` game-seconds, where
    /// `period` is the day length if the current hour falls in
    /// [7, 20) and the night length otherwise. Returns the boundary
    /// events crossed by this tick, in fixed order: hour, day-time,
    /// day, month (with seasons), year.
    pub fn advance(&mut self) -> Vec<EnvEvent> {
        if self.paused {
            return Vec::new();
        }

        let previous = self.calendar();
        let period = if (7..20).contains(&previous.hour) {
            self.day_length
        } else {
            self.night_length
        };
        self.elapsed_seconds += f64::from(ADVANCE_SPAN_SECONDS / (period / self.tick_frequency));

        self.boundary_events(previous)
    }

    /// Override the elapsed time (authority-only admin path).
    ///
    /// Returns the boundary events crossed by the jump.
    pub fn set_elapsed_seconds(&mut self, seconds: f64) -> Vec<EnvEvent> {
        let previous = self.calendar();
        self.elapsed_seconds = seconds.max(0.0);
        self.boundary_events(previous)
    }

    /// Add a signed offset to the elapsed time (authority-only).
    pub fn add_seconds(&mut self, delta: f64) -> Vec<EnvEvent> {
        self.set_elapsed_seconds(self.elapsed_seconds + delta)
    }

    /// Set the clock to an explicit calendar date and time.
    ///
    /// Inverse of the derivation rules: the epoch itself falls on the
    /// 30th of month 12, year 1.
    pub fn set_date_time(
        &mut self,
        year: u32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Vec<EnvEvent> {
        let year = year.max(1);
        let month = month.clamp(1, 12);
        let day = day.clamp(1, 30);
        let days = u64::from(year - 1) * DAYS_PER_YEAR
            + u64::from(month % 12) * DAYS_PER_MONTH
            + u64::from(day % 30);
        let seconds = days as f64 * SECONDS_PER_DAY
            + f64::from(hour.min(23)) * SECONDS_PER_HOUR
            + f64::from(minute.min(59)) * 60.0;
        self.set_elapsed_seconds(seconds)
    }

    /// Compare previous vs. current derived fields and collect change
    /// events in the fixed dispatch order.
    fn boundary_events(&self, previous: Calendar) -> Vec<EnvEvent> {
        let current = self.calendar();
        let mut events = Vec::new();

        if previous.hour != current.hour {
            events.push(EnvEvent::HourChanged {
                previous: previous.hour,
                new: current.hour,
            });
        }
        if previous.day_time != current.day_time {
            events.push(EnvEvent::DayTimeChanged {
                previous: previous.day_time,
                new: current.day_time,
            });
        }
        if previous.day != current.day {
            events.push(EnvEvent::DayChanged {
                previous: previous.day,
                new: current.day,
            });
        }
        if previous.month != current.month {
            events.push(EnvEvent::MonthChanged {
                previous: previous.month,
                new: current.month,
                previous_season: previous.season,
                new_season: current.season,
            });
        }
        if previous.year != current.year {
            events.push(EnvEvent::YearChanged {
                previous: previous.year,
                new: current.year,
            });
        }

        events
    }
}
