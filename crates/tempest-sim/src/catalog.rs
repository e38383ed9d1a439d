//! Weather type definitions and the transition constraint check.
//!
//! Weather types are authored offline (RON) and loaded once; the
//! catalog is read-only for the lifetime of the process and freely
//! shared between the authority and observers.

use serde::{Deserialize, Serialize};

use tempest_common::{SimError, SimResult, WeatherTag};

use crate::rng::SimRng;

/// An RGBA color value.
pub type ColorValue = [f32; 4];

/// A named scalar parameter range declared by a weather type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarAttribute {
    /// Name of the parameter in the effector's parameter space.
    pub name: String,
    /// Minimum value of the attribute.
    pub min: f32,
    /// Maximum value of the attribute.
    pub max: f32,
}

impl ScalarAttribute {
    /// Roll a concrete value uniformly from the range.
    #[must_use]
    pub fn roll(&self, rng: &mut SimRng) -> RolledScalar {
        RolledScalar {
            name: self.name.clone(),
            value: rng.next_range(self.min, self.max),
        }
    }
}

/// A named color parameter range declared by a weather type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorAttribute {
    /// Name of the parameter in the effector's parameter space.
    pub name: String,
    /// Minimum value per component.
    pub min: ColorValue,
    /// Maximum value per component.
    pub max: ColorValue,
}

impl ColorAttribute {
    /// Roll a concrete value uniformly from the range, per component.
    #[must_use]
    pub fn roll(&self, rng: &mut SimRng) -> RolledColor {
        let mut value = [0.0; 4];
        for (i, slot) in value.iter_mut().enumerate() {
            *slot = rng.next_range(self.min[i], self.max[i]);
        }
        RolledColor {
            name: self.name.clone(),
            value,
        }
    }
}

/// A concrete scalar value sampled at transition selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolledScalar {
    /// Parameter name.
    pub name: String,
    /// Sampled value, fixed for the lifetime of the transition.
    pub value: f32,
}

/// A concrete color value sampled at transition selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolledColor {
    /// Parameter name.
    pub name: String,
    /// Sampled value, fixed for the lifetime of the transition.
    pub value: ColorValue,
}

/// An immutable weather type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherType {
    /// Identifying tag of this weather type.
    pub tag: WeatherTag,

    /// Optional pre-weather: this type may only be entered directly
    /// from the named type.
    #[serde(default)]
    pub requires_prior: Option<WeatherTag>,

    /// Optional post-weather: this type may only transition out to
    /// the named type.
    #[serde(default)]
    pub requires_subsequent: Option<WeatherTag>,

    /// Inclusive month range (1-12) this weather can occur in.
    #[serde(default = "default_month_range")]
    pub month_range: (u32, u32),

    /// Duration range [min, max] in game-minutes.
    pub duration_minutes: (f32, f32),

    /// Scalar parameter ranges driven by this weather.
    #[serde(default)]
    pub scalar_attributes: Vec<ScalarAttribute>,

    /// Color parameter ranges driven by this weather.
    #[serde(default)]
    pub color_attributes: Vec<ColorAttribute>,

    /// Fog density range.
    #[serde(default = "default_fog_density")]
    pub fog_density: (f32, f32),

    /// Fog height falloff range.
    #[serde(default = "default_fog_falloff")]
    pub fog_height_falloff: (f32, f32),
}

fn default_month_range() -> (u32, u32) {
    (1, 12)
}

fn default_fog_density() -> (f32, f32) {
    (0.02, 0.02)
}

fn default_fog_falloff() -> (f32, f32) {
    (0.2, 0.2)
}

impl WeatherType {
    /// Check if this weather type can transition directly to `target`.
    ///
    /// The outgoing constraint on `self` wins; otherwise the incoming
    /// constraint on `target` applies; otherwise the edge is allowed.
    /// Intentionally asymmetric: "cloudy must be followed by rain"
    /// and "rain must be preceded by cloudy" are independent
    /// constraints that may both bind the same pair.
    #[must_use]
    pub fn can_transition_to(&self, target: &WeatherType) -> bool {
        if let Some(subsequent) = &self.requires_subsequent {
            return target.tag == *subsequent;
        }

        if let Some(prior) = &target.requires_prior {
            return self.tag == *prior;
        }

        true
    }

    /// Check if the month (1-12) falls within this type's window.
    #[must_use]
    pub fn allows_month(&self, month: u32) -> bool {
        month >= self.month_range.0 && month <= self.month_range.1
    }
}

/// Immutable registry of weather type definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCatalog {
    types: Vec<WeatherType>,
}

impl WeatherCatalog {
    /// Build a catalog, validating the authored data.
    ///
    /// Rejects empty catalogs, duplicate tags, and inverted ranges.
    pub fn new(types: Vec<WeatherType>) -> SimResult<Self> {
        if types.is_empty() {
            return Err(SimError::Configuration(
                "weather catalog is empty".to_string(),
            ));
        }

        for (i, ty) in types.iter().enumerate() {
            if types[..i].iter().any(|other| other.tag == ty.tag) {
                return Err(SimError::Configuration(format!(
                    "duplicate weather tag '{}'",
                    ty.tag
                )));
            }
            if ty.duration_minutes.0 > ty.duration_minutes.1 {
                return Err(SimError::Configuration(format!(
                    "weather '{}' has inverted duration range",
                    ty.tag
                )));
            }
            if ty.month_range.0 < 1 || ty.month_range.1 > 12 || ty.month_range.0 > ty.month_range.1
            {
                return Err(SimError::Configuration(format!(
                    "weather '{}' has invalid month range {:?}",
                    ty.tag, ty.month_range
                )));
            }
        }

        Ok(Self { types })
    }

    /// Load a catalog from authored RON data.
    pub fn from_ron(data: &str) -> SimResult<Self> {
        let types: Vec<WeatherType> = ron::from_str(data)
            .map_err(|e| SimError::Configuration(format!("catalog parse error: {e}")))?;
        Self::new(types)
    }

    /// Look up a weather type by tag.
    #[must_use]
    pub fn get(&self, tag: &WeatherTag) -> Option<&WeatherType> {
        self.types.iter().find(|ty| ty.tag == *tag)
    }

    /// Check if a direct transition between two tags is allowed.
    ///
    /// Unknown tags never transition.
    #[must_use]
    pub fn can_transition(&self, from: &WeatherTag, to: &WeatherTag) -> bool {
        match (self.get(from), self.get(to)) {
            (Some(from_ty), Some(to_ty)) => from_ty.can_transition_to(to_ty),
            _ => false,
        }
    }

    /// Iterate over all weather types.
    pub fn iter(&self) -> impl Iterator<Item = &WeatherType> {
        self.types.iter()
    }

    /// Number of weather types in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog is empty (never true after construction).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Weather type at an index, for random draws.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&WeatherType> {
        self.types.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(tag: &'static str) -> WeatherType {
        WeatherType {
            tag: WeatherTag::new(tag),
            requires_prior: None,
            requires_subsequent: None,
            month_range: (1, 12),
            duration_minutes: (25.0, 60.0),
            scalar_attributes: Vec::new(),
            color_attributes: Vec::new(),
            fog_density: (0.02, 0.02),
            fog_height_falloff: (0.2, 0.2),
        }
    }

    #[test]
    fn test_unconstrained_transition() {
        let clear = plain("weather.clear");
        let cloudy = plain("weather.cloudy");
        assert!(clear.can_transition_to(&cloudy));
        assert!(cloudy.can_transition_to(&clear));
    }

    #[test]
    fn test_prior_constraint() {
        let clear = plain("weather.clear");
        let cloudy = plain("weather.cloudy");
        let mut rain = plain("weather.rain");
        rain.requires_prior = Some(WeatherTag::new("weather.cloudy"));

        assert!(!clear.can_transition_to(&rain));
        assert!(cloudy.can_transition_to(&rain));
    }

    #[test]
    fn test_subsequent_constraint_wins() {
        let mut storm = plain("weather.storm");
        storm.requires_subsequent = Some(WeatherTag::new("weather.rain"));
        let rain = plain("weather.rain");
        let clear = plain("weather.clear");

        assert!(storm.can_transition_to(&rain));
        assert!(!storm.can_transition_to(&clear));
    }

    #[test]
    fn test_both_constraints_same_pair() {
        // "cloudy must be followed by rain" and "rain must be
        // preceded by cloudy" bind independently on the same pair.
        let mut cloudy = plain("weather.cloudy");
        cloudy.requires_subsequent = Some(WeatherTag::new("weather.rain"));
        let mut rain = plain("weather.rain");
        rain.requires_prior = Some(WeatherTag::new("weather.cloudy"));

        assert!(cloudy.can_transition_to(&rain));
        // The reverse edge carries no constraint of its own: rain has
        // no outgoing rule and cloudy no incoming rule.
        assert!(rain.can_transition_to(&cloudy));
    }

    #[test]
    fn test_reverse_edge_blocked_by_incoming_rule() {
        let mut cloudy = plain("weather.cloudy");
        cloudy.requires_prior = Some(WeatherTag::new("weather.clear"));
        cloudy.requires_subsequent = Some(WeatherTag::new("weather.rain"));
        let mut rain = plain("weather.rain");
        rain.requires_prior = Some(WeatherTag::new("weather.cloudy"));

        assert!(cloudy.can_transition_to(&rain));
        // Rain may only be entered from cloudy, but cloudy may only
        // be entered from clear, so the reverse edge is closed.
        assert!(!rain.can_transition_to(&cloudy));
    }

    #[test]
    fn test_month_window() {
        let mut snow = plain("weather.snow");
        snow.month_range = (1, 2);
        assert!(snow.allows_month(1));
        assert!(snow.allows_month(2));
        assert!(!snow.allows_month(6));
    }

    #[test]
    fn test_catalog_rejects_empty() {
        assert!(WeatherCatalog::new(Vec::new()).is_err());
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let result = WeatherCatalog::new(vec![plain("weather.clear"), plain("weather.clear")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_catalog_rejects_inverted_duration() {
        let mut bad = plain("weather.bad");
        bad.duration_minutes = (60.0, 25.0);
        assert!(WeatherCatalog::new(vec![bad]).is_err());
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog =
            WeatherCatalog::new(vec![plain("weather.clear"), plain("weather.cloudy")])
                .expect("valid catalog");
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get(&WeatherTag::new("weather.clear")).is_some());
        assert!(catalog.get(&WeatherTag::new("weather.storm")).is_none());
        assert!(catalog.can_transition(
            &WeatherTag::new("weather.clear"),
            &WeatherTag::new("weather.cloudy")
        ));
        assert!(!catalog.can_transition(
            &WeatherTag::new("weather.clear"),
            &WeatherTag::new("weather.missing")
        ));
    }

    #[test]
    fn test_attribute_roll_in_range() {
        let attr = ScalarAttribute {
            name: "CloudCover".to_string(),
            min: 0.2,
            max: 0.8,
        };
        let mut rng = SimRng::new(5);
        for _ in 0..50 {
            let rolled = attr.roll(&mut rng);
            assert!((0.2..0.8).contains(&rolled.value));
            assert_eq!(rolled.name, "CloudCover");
        }
    }

    #[test]
    fn test_color_roll_in_range() {
        let attr = ColorAttribute {
            name: "SkyTint".to_string(),
            min: [0.0, 0.0, 0.0, 1.0],
            max: [1.0, 0.5, 0.25, 1.0],
        };
        let mut rng = SimRng::new(9);
        let rolled = attr.roll(&mut rng);
        assert!(rolled.value[0] <= 1.0);
        assert!(rolled.value[1] <= 0.5);
        assert!(rolled.value[2] <= 0.25);
        assert!((rolled.value[3] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_from_ron() {
        let data = r#"[
            (
                tag: "weather.clear",
                duration_minutes: (25.0, 60.0),
                scalar_attributes: [
                    (name: "CloudCover", min: 0.0, max: 0.1),
                ],
            ),
            (
                tag: "weather.rain",
                requires_prior: Some("weather.cloudy"),
                month_range: (3, 10),
                duration_minutes: (15.0, 40.0),
            ),
            (
                tag: "weather.cloudy",
                duration_minutes: (20.0, 50.0),
            ),
        ]"#;

        let catalog = WeatherCatalog::from_ron(data).expect("valid RON catalog");
        assert_eq!(catalog.len(), 3);
        let rain = catalog
            .get(&WeatherTag::new("weather.rain"))
            .expect("rain present");
        assert_eq!(rain.month_range, (3, 10));
        assert_eq!(
            rain.requires_prior,
            Some(WeatherTag::new("weather.cloudy"))
        );
    }
}
