//! Per-tick blending of weather parameters.
//!
//! During a transition every declared attribute of the target type is
//! lerped from its cached "from" value to its rolled target value.
//! Attributes the target type does not declare are left untouched on
//! the board, so switching between types with different attribute
//! sets never pops.

use ahash::AHashMap;

use crate::catalog::ColorValue;
use crate::machine::Transition;

/// Linear interpolation helper.
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise color interpolation.
#[must_use]
pub fn lerp_color(a: ColorValue, b: ColorValue, t: f32) -> ColorValue {
    [
        lerp(a[0], b[0], t),
        lerp(a[1], b[1], t),
        lerp(a[2], b[2], t),
        lerp(a[3], b[3], t),
    ]
}

/// Interpolation progress of a transition at a point in game time.
///
/// Instant transitions report 1.0 immediately; otherwise elapsed
/// game-minutes over the rolled duration, clamped to [0, 1].
#[must_use]
pub fn progress(transition: &Transition, now_seconds: f64) -> f32 {
    if transition.instant || transition.duration_minutes <= 0.0 {
        return 1.0;
    }
    let elapsed_minutes = (now_seconds - transition.started_at_seconds) / 60.0;
    (elapsed_minutes / f64::from(transition.duration_minutes)).clamp(0.0, 1.0) as f32
}

/// Write the blended values for a transition at progress `t` onto the
/// parameter board.
pub fn apply(transition: &Transition, t: f32, board: &mut ParameterBoard) {
    for (from, to) in transition
        .from_scalars
        .iter()
        .zip(transition.scalars.iter())
    {
        board.set_scalar(&to.name, lerp(from.value, to.value, t));
    }

    for (from, to) in transition.from_colors.iter().zip(transition.colors.iter()) {
        board.set_color(&to.name, lerp_color(from.value, to.value, t));
    }

    board.set_fog_density(lerp(
        transition.from_fog_density,
        transition.fog_density,
        t,
    ));
    board.set_fog_height_falloff(lerp(
        transition.from_fog_height_falloff,
        transition.fog_height_falloff,
        t,
    ));
}

/// The live parameter space the visual effector reads from.
///
/// Values persist between transitions; a transition only moves the
/// parameters its target type declares.
#[derive(Debug, Clone)]
pub struct ParameterBoard {
    scalars: AHashMap<String, f32>,
    colors: AHashMap<String, ColorValue>,
    fog_density: f32,
    fog_height_falloff: f32,
}

impl Default for ParameterBoard {
    fn default() -> Self {
        Self {
            scalars: AHashMap::new(),
            colors: AHashMap::new(),
            fog_density: 0.02,
            fog_height_falloff: 0.2,
        }
    }
}

impl ParameterBoard {
    /// Create an empty board with default fog values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a scalar parameter, if ever written.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<f32> {
        self.scalars.get(name).copied()
    }

    /// Current value of a color parameter, if ever written.
    #[must_use]
    pub fn color(&self, name: &str) -> Option<ColorValue> {
        self.colors.get(name).copied()
    }

    /// Current fog density.
    #[must_use]
    pub fn fog_density(&self) -> f32 {
        self.fog_density
    }

    /// Current fog height falloff.
    #[must_use]
    pub fn fog_height_falloff(&self) -> f32 {
        self.fog_height_falloff
    }

    /// Set a scalar parameter.
    pub fn set_scalar(&mut self, name: &str, value: f32) {
        self.scalars.insert(name.to_string(), value);
    }

    /// Set a color parameter.
    pub fn set_color(&mut self, name: &str, value: ColorValue) {
        self.colors.insert(name.to_string(), value);
    }

    /// Set the fog density.
    pub fn set_fog_density(&mut self, value: f32) {
        self.fog_density = value;
    }

    /// Set the fog height falloff.
    pub fn set_fog_height_falloff(&mut self, value: f32) {
        self.fog_height_falloff = value;
    }

    /// Iterate over all scalar parameters.
    pub fn scalars(&self) -> impl Iterator<Item = (&str, f32)> {
        self.scalars.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterate over all color parameters.
    pub fn colors(&self) -> impl Iterator<Item = (&str, ColorValue)> {
        self.colors.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
