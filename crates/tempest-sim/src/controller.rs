//! Environment controller: the single entry point that owns the
//! clock, the weather machine, the parameter board and the event bus.
//!
//! One controller exists per world instance. The authority runs the
//! full simulation and accepts admin commands; observers run the same
//! controller with [`Role::Observer`] and feed it snapshots, ticking
//! only the deterministic parts (clock derivation, interpolation).

use std::sync::Arc;

use tracing::{error, info};

use tempest_common::{SimError, SimResult, SnapshotError, WeatherTag};

use crate::catalog::WeatherCatalog;
use crate::clock::{Calendar, GameClock};
use crate::events::{EnvEvent, EventBus};
use crate::interpolate::ParameterBoard;
use crate::machine::WeatherStateMachine;
use crate::planner;
use crate::rng::SimRng;
use crate::snapshot::WorldSnapshot;

/// Whether this instance may mutate the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Runs selection and accepts admin commands.
    Authority,
    /// Mirrors replicated state; mutation entry points are rejected.
    Observer,
}

/// Tunable construction parameters for a controller.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// Real seconds for the 07:00-20:00 half of the day.
    pub day_length: f32,
    /// Real seconds for the 20:00-07:00 half of the day.
    pub night_length: f32,
    /// Real seconds per tick.
    pub tick_frequency: f32,
    /// Seed for the weather roll source.
    pub rng_seed: u64,
    /// Event bus capacity.
    pub event_capacity: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            day_length: 720.0,
            night_length: 240.0,
            tick_frequency: 0.1,
            rng_seed: 12345,
            event_capacity: 1024,
        }
    }
}

/// Owns and sequences every part of the environment simulation.
#[derive(Debug)]
pub struct EnvironmentController {
    catalog: Arc<WeatherCatalog>,
    clock: GameClock,
    machine: WeatherStateMachine,
    board: ParameterBoard,
    bus: EventBus,
    role: Role,
    weather_paused: bool,
}

impl EnvironmentController {
    /// Create a controller over a pre-resolved catalog.
    #[must_use]
    pub fn new(catalog: Arc<WeatherCatalog>, config: &EnvironmentConfig, role: Role) -> Self {
        info!(?role, types = catalog.len(), "environment controller created");
        Self {
            catalog,
            clock: GameClock::with_pacing(
                config.day_length,
                config.night_length,
                config.tick_frequency,
            ),
            machine: WeatherStateMachine::new(SimRng::new(config.rng_seed)),
            board: ParameterBoard::new(),
            bus: EventBus::new(config.event_capacity),
            role,
            weather_paused: false,
        }
    }

    /// This instance's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The shared weather catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<WeatherCatalog> {
        &self.catalog
    }

    /// Advance the clock one tick and publish boundary events.
    ///
    /// Scheduled at the fast (clock) frequency.
    pub fn tick_time(&mut self) {
        let events = self.clock.advance();
        self.publish_all(events);
    }

    /// Evaluate the weather machine against the current clock.
    ///
    /// Scheduled at the slower (weather) frequency; may run less often
    /// than `tick_time` without affecting correctness. Observers only
    /// interpolate and commit replicated transitions here.
    pub fn tick_weather(&mut self) {
        if self.weather_paused {
            return;
        }
        let events = self.machine.tick(
            &self.catalog,
            self.clock.elapsed_seconds(),
            self.clock.month(),
            &mut self.board,
            self.role == Role::Authority,
        );
        self.publish_all(events);
    }

    /// Advance both schedules at once, time first so the weather
    /// machine sees the post-tick clock. Convenience for callers that
    /// run a single schedule.
    pub fn tick(&mut self) {
        self.tick_time();
        self.tick_weather();
    }

    // Admin commands (authority-only)

    /// Jump the clock to an explicit calendar date and time.
    pub fn set_time(
        &mut self,
        year: u32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> SimResult<()> {
        self.check_authority("set_time")?;
        let events = self.clock.set_date_time(year, month, day, hour, minute);
        self.publish_all(events);
        Ok(())
    }

    /// Add a signed offset to the clock, in game-seconds.
    pub fn add_time(&mut self, delta_seconds: f64) -> SimResult<()> {
        self.check_authority("add_time")?;
        let events = self.clock.add_seconds(delta_seconds);
        self.publish_all(events);
        Ok(())
    }

    /// Change how much real time one tick represents.
    pub fn set_tick_frequency(&mut self, frequency: f32) -> SimResult<()> {
        self.check_authority("set_tick_frequency")?;
        self.clock.set_tick_frequency(frequency);
        Ok(())
    }

    /// Freeze the clock. Weather keeps interpolating against the
    /// frozen time, so an in-flight transition holds its progress.
    pub fn pause_time(&mut self) -> SimResult<()> {
        self.check_authority("pause_time")?;
        self.clock.pause();
        Ok(())
    }

    /// Unfreeze the clock.
    pub fn resume_time(&mut self) -> SimResult<()> {
        self.check_authority("resume_time")?;
        self.clock.resume();
        Ok(())
    }

    /// Steer the weather toward `goal`, one constraint-respecting hop
    /// per cycle.
    ///
    /// Fails fast when the goal is not in the catalog, or is not
    /// reachable from the current weather under the transition rules.
    pub fn set_goal_weather(&mut self, goal: WeatherTag) -> SimResult<()> {
        self.check_authority("set_goal_weather")?;
        if self.catalog.get(&goal).is_none() {
            return Err(SimError::Configuration(format!(
                "goal weather '{goal}' is not in the catalog"
            )));
        }
        if let Some(current) = self.machine.current() {
            if planner::next_hop(&self.catalog, current, &goal).is_none() {
                return Err(SimError::UnreachableGoal {
                    from: current.to_string(),
                    goal: goal.to_string(),
                });
            }
        }
        self.machine.set_goal(goal);
        Ok(())
    }

    /// Abandon the current goal, if any.
    pub fn clear_goal_weather(&mut self) -> SimResult<()> {
        self.check_authority("clear_goal_weather")?;
        self.machine.clear_goal();
        Ok(())
    }

    /// Set the weather immediately, bypassing constraints and blending.
    ///
    /// The commit (and its events) happens within this call.
    pub fn set_weather_instant(&mut self, tag: &WeatherTag) -> SimResult<()> {
        self.check_authority("set_weather_instant")?;
        if self.catalog.get(tag).is_none() {
            return Err(SimError::Configuration(format!(
                "weather '{tag}' is not in the catalog"
            )));
        }
        let events = self.machine.force_weather(
            &self.catalog,
            tag,
            self.clock.elapsed_seconds(),
            &mut self.board,
        );
        self.publish_all(events);
        Ok(())
    }

    /// Stop weather cycling and interpolation; time keeps flowing.
    pub fn pause_weather(&mut self) -> SimResult<()> {
        self.check_authority("pause_weather")?;
        self.weather_paused = true;
        Ok(())
    }

    /// Resume weather cycling and interpolation.
    pub fn resume_weather(&mut self) -> SimResult<()> {
        self.check_authority("resume_weather")?;
        self.weather_paused = false;
        Ok(())
    }

    // Snapshots

    /// Capture the full replicable state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.clock.elapsed_seconds(), &self.machine)
    }

    /// Replace the simulation state wholesale from a snapshot.
    ///
    /// Works on both roles (this is how observers sync). Every tag in
    /// the snapshot must exist in the catalog; on failure the current
    /// state is left untouched. Applying the same snapshot twice is
    /// idempotent.
    pub fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> SimResult<()> {
        for tag in [
            snapshot.current_weather.as_ref(),
            snapshot.goal_weather.as_ref(),
            snapshot.transition.as_ref().map(|t| &t.target),
        ]
        .into_iter()
        .flatten()
        {
            if self.catalog.get(tag).is_none() {
                return Err(SnapshotError::UnknownTag(tag.to_string()).into());
            }
        }

        // Restoring is not simulation progress; boundary events from
        // the time jump are discarded.
        let _ = self.clock.set_elapsed_seconds(snapshot.elapsed_seconds);
        self.machine.restore(
            snapshot.current_weather.clone(),
            snapshot.changed_at_seconds,
            snapshot.current_lifetime_minutes,
            snapshot.goal_weather.clone(),
            snapshot.transition.clone(),
            snapshot.rng.clone(),
        );
        Ok(())
    }

    // Read surface

    /// The game clock.
    #[must_use]
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Derived calendar fields at the current time.
    #[must_use]
    pub fn calendar(&self) -> Calendar {
        self.clock.calendar()
    }

    /// Committed weather, absent until the first commit.
    #[must_use]
    pub fn current_weather(&self) -> Option<&WeatherTag> {
        self.machine.current()
    }

    /// Active goal weather, if any.
    #[must_use]
    pub fn goal_weather(&self) -> Option<&WeatherTag> {
        self.machine.goal()
    }

    /// True while a weather transition is in flight.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.machine.is_transitioning()
    }

    /// True while weather cycling is paused.
    #[must_use]
    pub fn is_weather_paused(&self) -> bool {
        self.weather_paused
    }

    /// The live parameter board the visual effector reads.
    #[must_use]
    pub fn params(&self) -> &ParameterBoard {
        &self.board
    }

    /// Drain all pending events in dispatch order.
    pub fn drain_events(&self) -> Vec<EnvEvent> {
        self.bus.drain()
    }

    fn publish_all(&self, events: Vec<EnvEvent>) {
        for event in events {
            self.bus.publish(event);
        }
    }

    fn check_authority(&self, op: &'static str) -> SimResult<()> {
        if self.role == Role::Authority {
            Ok(())
        } else {
            error!(op, "mutation rejected on observer instance");
            Err(SimError::AuthorityViolation(op))
        }
    }
}
