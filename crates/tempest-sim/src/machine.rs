//! Weather state machine.
//!
//! The machine is either stable (a committed weather running out its
//! rolled lifetime) or transitioning (blending toward a target type).
//! Selection is goal-directed when a goal is set, otherwise a bounded
//! random draw filtered by the transition rules and the month window.
//! Only the authority selects; observers interpolate and commit the
//! replicated transition.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tempest_common::WeatherTag;

use crate::catalog::{RolledColor, RolledScalar, WeatherCatalog, WeatherType};
use crate::events::EnvEvent;
use crate::interpolate::{self, ParameterBoard};
use crate::planner;
use crate::rng::SimRng;

/// How many random draws a selection attempts before giving up for
/// the tick and extending the current weather instead.
const SELECTION_ATTEMPTS: usize = 8;

/// An in-flight weather transition.
///
/// All random rolls happen once, at construction; the values here are
/// fixed for the life of the transition and replicate as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Weather type being transitioned toward.
    pub target: WeatherTag,
    /// Rolled target scalar values.
    pub scalars: Vec<RolledScalar>,
    /// Board scalar values captured when the transition started,
    /// aligned index-for-index with `scalars`.
    pub from_scalars: Vec<RolledScalar>,
    /// Rolled target color values.
    pub colors: Vec<RolledColor>,
    /// Board color values captured when the transition started,
    /// aligned index-for-index with `colors`.
    pub from_colors: Vec<RolledColor>,
    /// Rolled duration in game-minutes. Governs both the blend length
    /// and the committed weather's lifetime.
    pub duration_minutes: f32,
    /// Rolled target fog density.
    pub fog_density: f32,
    /// Fog density when the transition started.
    pub from_fog_density: f32,
    /// Rolled target fog height falloff.
    pub fog_height_falloff: f32,
    /// Fog height falloff when the transition started.
    pub from_fog_height_falloff: f32,
    /// Game time the transition started, in game-seconds.
    pub started_at_seconds: f64,
    /// Instant transitions skip blending and commit on the next tick.
    pub instant: bool,
}

impl Transition {
    /// Roll a new transition toward `ty`, capturing the board's
    /// current values as the blend origin.
    ///
    /// Attributes the board has never seen start at their rolled
    /// target value, so a first-ever transition does not sweep
    /// through an arbitrary default.
    pub fn roll(
        ty: &WeatherType,
        board: &ParameterBoard,
        now_seconds: f64,
        instant: bool,
        rng: &mut SimRng,
    ) -> Self {
        let scalars: Vec<RolledScalar> =
            ty.scalar_attributes.iter().map(|a| a.roll(rng)).collect();
        let from_scalars = scalars
            .iter()
            .map(|rolled| RolledScalar {
                name: rolled.name.clone(),
                value: board.scalar(&rolled.name).unwrap_or(rolled.value),
            })
            .collect();

        let colors: Vec<RolledColor> = ty.color_attributes.iter().map(|a| a.roll(rng)).collect();
        let from_colors = colors
            .iter()
            .map(|rolled| RolledColor {
                name: rolled.name.clone(),
                value: board.color(&rolled.name).unwrap_or(rolled.value),
            })
            .collect();

        Self {
            target: ty.tag.clone(),
            scalars,
            from_scalars,
            colors,
            from_colors,
            duration_minutes: rng.next_range(ty.duration_minutes.0, ty.duration_minutes.1),
            fog_density: rng.next_range(ty.fog_density.0, ty.fog_density.1),
            from_fog_density: board.fog_density(),
            fog_height_falloff: rng.next_range(ty.fog_height_falloff.0, ty.fog_height_falloff.1),
            from_fog_height_falloff: board.fog_height_falloff(),
            started_at_seconds: now_seconds,
            instant,
        }
    }
}

/// Goal-directed weather cycling over a catalog.
#[derive(Debug, Clone)]
pub struct WeatherStateMachine {
    /// Committed weather, absent until the first commit.
    current: Option<WeatherTag>,
    /// Game time the current weather committed.
    changed_at_seconds: f64,
    /// Rolled lifetime of the current weather in game-minutes.
    current_lifetime_minutes: f32,
    /// Goal weather being steered toward, if any.
    goal: Option<WeatherTag>,
    /// True when a goal was set and no selection has acted on it yet.
    goal_pending: bool,
    /// In-flight transition, if any.
    transition: Option<Transition>,
    /// Weather roll source. Serialized with snapshots so replays and
    /// restores draw the same sequence.
    rng: SimRng,
}

impl Default for WeatherStateMachine {
    fn default() -> Self {
        Self::new(SimRng::default())
    }
}

impl WeatherStateMachine {
    /// Create a stable machine with no committed weather.
    #[must_use]
    pub fn new(rng: SimRng) -> Self {
        Self {
            current: None,
            changed_at_seconds: 0.0,
            current_lifetime_minutes: 0.0,
            goal: None,
            goal_pending: false,
            transition: None,
            rng,
        }
    }

    /// Committed weather, absent until the first commit.
    #[must_use]
    pub fn current(&self) -> Option<&WeatherTag> {
        self.current.as_ref()
    }

    /// Active goal, if any.
    #[must_use]
    pub fn goal(&self) -> Option<&WeatherTag> {
        self.goal.as_ref()
    }

    /// In-flight transition, if any.
    #[must_use]
    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// True while a transition is in flight.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Game time the current weather committed.
    #[must_use]
    pub fn changed_at_seconds(&self) -> f64 {
        self.changed_at_seconds
    }

    /// Rolled lifetime of the current weather in game-minutes.
    #[must_use]
    pub fn current_lifetime_minutes(&self) -> f32 {
        self.current_lifetime_minutes
    }

    /// Roll-source state, for snapshotting.
    #[must_use]
    pub fn rng(&self) -> &SimRng {
        &self.rng
    }

    /// Set the goal weather. Steering begins on the next tick; if a
    /// transition is already in flight it finishes first.
    pub fn set_goal(&mut self, goal: WeatherTag) {
        info!(%goal, "goal weather set");
        self.goal = Some(goal);
        self.goal_pending = true;
    }

    /// Clear the goal without reaching it.
    pub fn clear_goal(&mut self) {
        self.goal = None;
        self.goal_pending = false;
    }

    /// Advance the machine one tick.
    ///
    /// `now_seconds` is the clock's elapsed game time and `month` the
    /// current calendar month. Observers pass `authority = false` and
    /// only interpolate and commit; selection is authority-only.
    pub fn tick(
        &mut self,
        catalog: &WeatherCatalog,
        now_seconds: f64,
        month: u32,
        board: &mut ParameterBoard,
        authority: bool,
    ) -> Vec<EnvEvent> {
        if self.transition.is_some() {
            return self.advance_transition(now_seconds, board);
        }
        if authority && (self.is_expired(now_seconds) || self.goal_pending) {
            return self.cycle(catalog, now_seconds, month, board);
        }
        Vec::new()
    }

    /// Immediately start and commit an instant transition to `tag`.
    ///
    /// Used by the set-weather admin command. Any in-flight transition
    /// is abandoned; the board blends from wherever it currently is.
    pub fn force_weather(
        &mut self,
        catalog: &WeatherCatalog,
        tag: &WeatherTag,
        now_seconds: f64,
        board: &mut ParameterBoard,
    ) -> Vec<EnvEvent> {
        let Some(ty) = catalog.get(tag) else {
            warn!(%tag, "set-weather ignored, tag not in catalog");
            return Vec::new();
        };
        self.transition = None;
        let mut events = self.start_transition(ty, board, now_seconds, true);
        events.extend(self.advance_transition(now_seconds, board));
        events
    }

    /// Restore machine state from a snapshot. The caller has already
    /// validated every tag against the catalog.
    pub fn restore(
        &mut self,
        current: Option<WeatherTag>,
        changed_at_seconds: f64,
        current_lifetime_minutes: f32,
        goal: Option<WeatherTag>,
        transition: Option<Transition>,
        rng: SimRng,
    ) {
        self.current = current;
        self.changed_at_seconds = changed_at_seconds;
        self.current_lifetime_minutes = current_lifetime_minutes;
        self.goal = goal;
        // A restored goal resumes steering at the next natural
        // selection rather than cutting the current weather short.
        self.goal_pending = false;
        self.transition = transition;
        self.rng = rng;
    }

    fn is_expired(&self, now_seconds: f64) -> bool {
        match self.current {
            None => true,
            Some(_) => {
                let elapsed_minutes = (now_seconds - self.changed_at_seconds) / 60.0;
                elapsed_minutes >= f64::from(self.current_lifetime_minutes)
            }
        }
    }

    fn advance_transition(&mut self, now_seconds: f64, board: &mut ParameterBoard) -> Vec<EnvEvent> {
        let Some(transition) = self.transition.as_ref() else {
            return Vec::new();
        };

        // A clock rewound behind the start would otherwise report
        // negative elapsed time forever; treat it as complete.
        let rewound = now_seconds < transition.started_at_seconds;
        let t = if rewound {
            1.0
        } else {
            interpolate::progress(transition, now_seconds)
        };
        interpolate::apply(transition, t, board);

        if t >= 1.0 || transition.instant || rewound {
            self.commit(now_seconds)
        } else {
            Vec::new()
        }
    }

    fn commit(&mut self, now_seconds: f64) -> Vec<EnvEvent> {
        let Some(transition) = self.transition.take() else {
            return Vec::new();
        };

        let previous = self.current.take();
        self.current = Some(transition.target.clone());
        self.changed_at_seconds = now_seconds;
        self.current_lifetime_minutes = transition.duration_minutes;
        debug!(weather = %transition.target, lifetime_minutes = transition.duration_minutes, "weather committed");

        let mut events = vec![EnvEvent::WeatherChanged {
            previous,
            new: transition.target.clone(),
        }];
        if self.goal.as_ref() == Some(&transition.target) {
            self.goal = None;
            self.goal_pending = false;
            info!(target = %transition.target, "goal weather reached");
            events.push(EnvEvent::TargetWeatherReached {
                target: transition.target,
            });
        }
        events
    }

    fn cycle(
        &mut self,
        catalog: &WeatherCatalog,
        now_seconds: f64,
        month: u32,
        board: &mut ParameterBoard,
    ) -> Vec<EnvEvent> {
        let Some(next) = self.select(catalog, month) else {
            return Vec::new();
        };
        let Some(ty) = catalog.get(&next) else {
            return Vec::new();
        };
        self.goal_pending = false;
        self.start_transition(ty, board, now_seconds, false)
    }

    /// Pick the next weather tag, or `None` to stay put this tick.
    fn select(&mut self, catalog: &WeatherCatalog, month: u32) -> Option<WeatherTag> {
        if let Some(goal) = self.goal.clone() {
            return match self.current.clone() {
                // Before any weather exists there is nothing to
                // transition from; jump straight to the goal.
                None => Some(goal),
                Some(from) => {
                    if let Some(hop) = planner::next_hop(catalog, &from, &goal) {
                        return Some(hop);
                    }
                    warn!(%from, %goal, "goal weather unreachable, retrying next tick");
                    None
                }
            };
        }

        for _ in 0..SELECTION_ATTEMPTS {
            let candidate = catalog.at(self.rng.next_index(catalog.len()))?;
            if let Some(current) = &self.current {
                if !catalog.can_transition(current, &candidate.tag) {
                    continue;
                }
            }
            if !candidate.allows_month(month) {
                continue;
            }
            return Some(candidate.tag.clone());
        }

        debug!(month, "no eligible weather candidate, extending current weather");
        None
    }

    fn start_transition(
        &mut self,
        ty: &WeatherType,
        board: &ParameterBoard,
        now_seconds: f64,
        instant: bool,
    ) -> Vec<EnvEvent> {
        let transition = Transition::roll(ty, board, now_seconds, instant, &mut self.rng);
        debug!(
            from = ?self.current,
            to = %ty.tag,
            duration_minutes = transition.duration_minutes,
            instant,
            "weather transition started"
        );
        let events = vec![EnvEvent::WeatherTransitionStarted {
            from: self.current.clone(),
            to: ty.tag.clone(),
            duration_minutes: transition.duration_minutes,
        }];
        self.transition = Some(transition);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarAttribute;

    const MINUTE: f64 = 60.0;

    fn ty(tag: &'static str, prior: Option<&'static str>) -> WeatherType {
        WeatherType {
            tag: WeatherTag::new(tag),
            requires_prior: prior.map(WeatherTag::new),
            requires_subsequent: None,
            month_range: (1, 12),
            // Fixed duration keeps the timeline deterministic.
            duration_minutes: (10.0, 10.0),
            scalar_attributes: vec![ScalarAttribute {
                name: "CloudCover".to_string(),
                min: 0.5,
                max: 0.5,
            }],
            color_attributes: Vec::new(),
            fog_density: (0.02, 0.02),
            fog_height_falloff: (0.2, 0.2),
        }
    }

    fn chain_catalog() -> WeatherCatalog {
        WeatherCatalog::new(vec![
            ty("clear", None),
            ty("cloudy", None),
            ty("rain", Some("cloudy")),
        ])
        .expect("valid catalog")
    }

    fn tag(s: &'static str) -> WeatherTag {
        WeatherTag::new(s)
    }

    /// Drives the machine from stable(clear) to the goal, collecting
    /// every event along the way.
    #[test]
    fn test_goal_pathing_end_to_end() {
        let catalog = chain_catalog();
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        let events = machine.force_weather(&catalog, &tag("clear"), 0.0, &mut board);
        assert!(events
            .iter()
            .any(|e| matches!(e, EnvEvent::WeatherChanged { .. })));
        assert_eq!(machine.current(), Some(&tag("clear")));

        machine.set_goal(tag("rain"));

        // Goal set triggers selection without waiting for expiry; the
        // planner routes through cloudy because rain requires it.
        let events = machine.tick(&catalog, 1.0 * MINUTE, 6, &mut board, true);
        assert!(matches!(
            events.as_slice(),
            [EnvEvent::WeatherTransitionStarted { to, .. }] if *to == tag("cloudy")
        ));

        // 10 rolled minutes later the hop commits.
        let events = machine.tick(&catalog, 11.0 * MINUTE, 6, &mut board, true);
        assert!(matches!(
            events.as_slice(),
            [EnvEvent::WeatherChanged { new, .. }] if *new == tag("cloudy")
        ));
        assert_eq!(machine.goal(), Some(&tag("rain")));

        // Cloudy expires after its 10-minute lifetime, then rain is a
        // direct hop.
        let events = machine.tick(&catalog, 21.0 * MINUTE, 6, &mut board, true);
        assert!(matches!(
            events.as_slice(),
            [EnvEvent::WeatherTransitionStarted { to, .. }] if *to == tag("rain")
        ));

        let events = machine.tick(&catalog, 31.0 * MINUTE, 6, &mut board, true);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            EnvEvent::WeatherChanged { new, .. } if *new == tag("rain")
        ));
        assert!(matches!(
            &events[1],
            EnvEvent::TargetWeatherReached { target } if *target == tag("rain")
        ));
        assert_eq!(machine.goal(), None);

        // The goal fires exactly once; further ticks stay quiet until
        // rain expires.
        let events = machine.tick(&catalog, 32.0 * MINUTE, 6, &mut board, true);
        assert!(events.is_empty());
    }

    #[test]
    fn test_first_selection_jumps_to_goal() {
        let catalog = chain_catalog();
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        machine.set_goal(tag("cloudy"));
        let events = machine.tick(&catalog, 0.0, 6, &mut board, true);
        assert!(matches!(
            events.as_slice(),
            [EnvEvent::WeatherTransitionStarted { from: None, to, .. }] if *to == tag("cloudy")
        ));
    }

    #[test]
    fn test_unreachable_goal_extends_current() {
        // Nothing can transition into aurora.
        let catalog = WeatherCatalog::new(vec![
            ty("clear", None),
            ty("aurora", Some("nonexistent")),
        ])
        .expect("valid catalog");
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        machine.force_weather(&catalog, &tag("clear"), 0.0, &mut board);
        machine.set_goal(tag("aurora"));

        // Selection fails, no transition starts, and the machine does
        // not panic or recurse; it just retries each tick.
        for minute in 1..5 {
            let events = machine.tick(&catalog, f64::from(minute) * MINUTE, 6, &mut board, true);
            assert!(events.is_empty());
            assert!(!machine.is_transitioning());
        }
        assert_eq!(machine.goal(), Some(&tag("aurora")));
    }

    #[test]
    fn test_month_window_excludes_candidates() {
        // Only "snow" exists and it is a December-only type; in June
        // the machine has nothing to select.
        let mut snow = ty("snow", None);
        snow.month_range = (12, 12);
        let catalog = WeatherCatalog::new(vec![snow]).expect("valid catalog");
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        let events = machine.tick(&catalog, 0.0, 6, &mut board, true);
        assert!(events.is_empty());
        assert!(!machine.is_transitioning());

        // In December the window opens and snow is eligible.
        let events = machine.tick(&catalog, 0.0, 12, &mut board, true);
        assert!(matches!(
            events.as_slice(),
            [EnvEvent::WeatherTransitionStarted { to, .. }] if *to == tag("snow")
        ));
    }

    #[test]
    fn test_observer_never_selects() {
        let catalog = chain_catalog();
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        let events = machine.tick(&catalog, 0.0, 6, &mut board, false);
        assert!(events.is_empty());
        assert!(!machine.is_transitioning());
        assert_eq!(machine.current(), None);
    }

    #[test]
    fn test_observer_interpolates_and_commits() {
        let catalog = chain_catalog();
        let mut authority = WeatherStateMachine::default();
        let mut observer = WeatherStateMachine::default();
        let mut auth_board = ParameterBoard::new();
        let mut obs_board = ParameterBoard::new();

        authority.tick(&catalog, 0.0, 6, &mut auth_board, true);
        let replicated = authority.transition().expect("in flight").clone();
        let target = replicated.target.clone();

        // Replication hands the observer the rolled transition.
        observer.restore(None, 0.0, 0.0, None, Some(replicated), SimRng::default());

        let events = observer.tick(&catalog, 5.0 * MINUTE, 6, &mut obs_board, false);
        assert!(events.is_empty());
        // Every type in the fixture rolls CloudCover to 0.5, and a
        // fresh board blends from the rolled value.
        assert!((obs_board.scalar("CloudCover").expect("blending") - 0.5).abs() < 1e-6);

        let events = observer.tick(&catalog, 11.0 * MINUTE, 6, &mut obs_board, false);
        assert!(matches!(
            events.as_slice(),
            [EnvEvent::WeatherChanged { .. }]
        ));
        assert_eq!(observer.current(), Some(&target));
    }

    #[test]
    fn test_clock_rewind_commits_transition() {
        let catalog = chain_catalog();
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        machine.tick(&catalog, 100.0 * MINUTE, 6, &mut board, true);
        assert!(machine.is_transitioning());

        // Time moved backwards past the transition start.
        let events = machine.tick(&catalog, 50.0 * MINUTE, 6, &mut board, true);
        assert!(matches!(
            events.first(),
            Some(EnvEvent::WeatherChanged { .. })
        ));
        assert!(!machine.is_transitioning());
    }

    #[test]
    fn test_force_weather_unknown_tag_is_noop() {
        let catalog = chain_catalog();
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        let events = machine.force_weather(&catalog, &tag("volcanic"), 0.0, &mut board);
        assert!(events.is_empty());
        assert_eq!(machine.current(), None);
    }

    #[test]
    fn test_rolls_are_fixed_for_transition_lifetime() {
        let catalog = chain_catalog();
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        machine.tick(&catalog, 0.0, 6, &mut board, true);
        let first = machine.transition().expect("in flight").clone();
        machine.tick(&catalog, 2.0 * MINUTE, 6, &mut board, true);
        let later = machine.transition().expect("still in flight").clone();
        assert_eq!(first, later);
    }

    #[test]
    fn test_goal_waits_for_inflight_transition() {
        let catalog = chain_catalog();
        let mut machine = WeatherStateMachine::default();
        let mut board = ParameterBoard::new();

        machine.tick(&catalog, 0.0, 6, &mut board, true);
        let in_flight = machine.transition().expect("in flight").target.clone();

        machine.set_goal(tag("rain"));
        machine.tick(&catalog, 1.0 * MINUTE, 6, &mut board, true);

        // Still the original transition; steering starts after it
        // commits.
        assert_eq!(
            machine.transition().expect("unchanged").target,
            in_flight
        );
    }
}
