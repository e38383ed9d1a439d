//! Event bus for world-state change notification.
//!
//! Callers poll the bus (`drain`) rather than registering callbacks;
//! the dispatch order within a tick is the publish order, which the
//! clock and weather machine keep fixed: hour, day-time, day, month,
//! year, then weather-transition-started / weather-changed, then
//! target-reached.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use tempest_common::WeatherTag;

use crate::clock::{DayTime, Season};

/// Events raised by the clock and the weather state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnvEvent {
    /// The hour of day changed (0-23).
    HourChanged {
        /// Previous hour
        previous: u32,
        /// New hour
        new: u32,
    },
    /// The day-time bucket changed.
    DayTimeChanged {
        /// Previous bucket
        previous: DayTime,
        /// New bucket
        new: DayTime,
    },
    /// The day of month changed (1-30).
    DayChanged {
        /// Previous day
        previous: u32,
        /// New day
        new: u32,
    },
    /// The month changed (1-12), with the seasons on either side.
    MonthChanged {
        /// Previous month
        previous: u32,
        /// New month
        new: u32,
        /// Season of the previous month
        previous_season: Season,
        /// Season of the new month
        new_season: Season,
    },
    /// The year changed.
    YearChanged {
        /// Previous year
        previous: u32,
        /// New year
        new: u32,
    },
    /// A weather transition began.
    WeatherTransitionStarted {
        /// Weather transitioning away from (absent before the first
        /// selection)
        from: Option<WeatherTag>,
        /// Weather transitioning toward
        to: WeatherTag,
        /// Rolled duration of the transition in game-minutes
        duration_minutes: f32,
    },
    /// A weather transition committed.
    WeatherChanged {
        /// Previous committed weather (absent on the first commit)
        previous: Option<WeatherTag>,
        /// Newly committed weather
        new: WeatherTag,
    },
    /// The requested goal weather was committed. Fired exactly once
    /// per goal, after the corresponding `WeatherChanged`.
    TargetWeatherReached {
        /// The goal that was reached
        target: WeatherTag,
    },
}

/// Event bus for broadcasting world events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<EnvEvent>,
    /// Receiver for collecting events
    receiver: Receiver<EnvEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: EnvEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events in publish order.
    pub fn drain(&self) -> Vec<EnvEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<EnvEvent> {
        self.sender.clone()
    }
}
