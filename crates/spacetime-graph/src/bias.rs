//! Energy bias: how mass-like sources distort causal linking.
//!
//! An [`EnergyBias`] wraps a pure function `(distance, source_energy) ->
//! multiplier`. The function is validated once, when the bias is built, by
//! probing a grid of distances and energies; the linker then calls it
//! without further checks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Energies probed during validation.
const PROBE_ENERGIES: [f64; 4] = [1e-3, 1.0, 10.0, 100.0];

/// Number of distance steps probed across `[0, radius]`.
const PROBE_STEPS: u32 = 8;

/// Signature of a bias function: `(distance_to_source, source_energy) -> multiplier`.
pub type BiasFn = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Built-in bias shapes selectable from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BiasShape {
    /// No bias: the multiplier is always 1.
    #[default]
    None,
    /// A fixed multiplier inside the influence radius.
    Constant {
        /// Multiplier applied inside the radius (at least 1).
        multiplier: f64,
    },
    /// `1 + gain * E * (1 - d / radius)`.
    Linear {
        /// Strength per unit of energy.
        gain: f64,
    },
    /// `1 + gain * E / (1 + d^2)`.
    InverseSquare {
        /// Strength per unit of energy.
        gain: f64,
    },
    /// `1 + gain * E * exp(-d / scale)`.
    Exponential {
        /// Strength per unit of energy.
        gain: f64,
        /// Decay length, strictly positive.
        scale: f64,
    },
}

/// Serializable description of an [`EnergyBias`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasSettings {
    /// Shape of the multiplier.
    #[serde(default)]
    pub shape: BiasShape,

    /// Events farther than this from every source are unbiased.
    #[serde(default = "default_influence_radius")]
    pub influence_radius: f64,

    /// Whether the multiplier also widens the light-cone allowance.
    #[serde(default = "default_stretch_cone")]
    pub stretch_cone: bool,
}

impl Default for BiasSettings {
    fn default() -> Self {
        Self {
            shape: BiasShape::None,
            influence_radius: default_influence_radius(),
            stretch_cone: default_stretch_cone(),
        }
    }
}

impl BiasSettings {
    /// Build and validate the bias.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] if the radius or shape
    /// parameters are invalid.
    pub fn build(&self) -> Result<EnergyBias, GraphError> {
        EnergyBias::from_shape(&self.shape, self.influence_radius, self.stretch_cone)
    }
}

const fn default_influence_radius() -> f64 {
    1.0
}

const fn default_stretch_cone() -> bool {
    true
}

/// A validated energy-bias function with its influence radius.
#[derive(Clone)]
pub struct EnergyBias {
    function: BiasFn,
    influence_radius: f64,
    stretch_cone: bool,
    label: String,
}

impl EnergyBias {
    /// The neutral bias: every multiplier is 1.
    pub fn neutral() -> Self {
        Self {
            function: Arc::new(|_, _| 1.0),
            influence_radius: 0.0,
            stretch_cone: false,
            label: "none".to_owned(),
        }
    }

    /// Build a bias from a built-in shape.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] for a negative or
    /// non-finite radius, a non-positive exponential scale, or a shape whose
    /// multiplier drops below 1 anywhere inside the radius.
    pub fn from_shape(
        shape: &BiasShape,
        influence_radius: f64,
        stretch_cone: bool,
    ) -> Result<Self, GraphError> {
        let function: BiasFn = match *shape {
            BiasShape::None => return Ok(Self::neutral()),
            BiasShape::Constant { multiplier } => Arc::new(move |_, _| multiplier),
            BiasShape::Linear { gain } => Arc::new(move |d, e| {
                let falloff = if influence_radius > 0.0 {
                    (1.0 - d / influence_radius).max(0.0)
                } else {
                    1.0
                };
                gain.mul_add(e * falloff, 1.0)
            }),
            BiasShape::InverseSquare { gain } => {
                Arc::new(move |d, e| gain.mul_add(e / d.mul_add(d, 1.0), 1.0))
            }
            BiasShape::Exponential { gain, scale } => {
                if !scale.is_finite() || scale <= 0.0 {
                    return Err(GraphError::invalid(format!(
                        "exponential bias scale must be finite and positive, got {scale}"
                    )));
                }
                Arc::new(move |d, e| gain.mul_add(e * (-d / scale).exp(), 1.0))
            }
        };
        Self::validated(function, influence_radius, stretch_cone, shape_label(shape))
    }

    /// Wrap a caller-supplied bias function.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] if the radius is invalid
    /// or the function returns a non-finite value or a value below 1 for any
    /// probed `(distance, energy)` pair.
    pub fn custom<F>(influence_radius: f64, stretch_cone: bool, function: F) -> Result<Self, GraphError>
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self::validated(Arc::new(function), influence_radius, stretch_cone, "custom".to_owned())
    }

    fn validated(
        function: BiasFn,
        influence_radius: f64,
        stretch_cone: bool,
        label: String,
    ) -> Result<Self, GraphError> {
        if !influence_radius.is_finite() || influence_radius < 0.0 {
            return Err(GraphError::invalid(format!(
                "influence radius must be finite and non-negative, got {influence_radius}"
            )));
        }
        for step in 0..=PROBE_STEPS {
            let distance = influence_radius * f64::from(step) / f64::from(PROBE_STEPS);
            for energy in PROBE_ENERGIES {
                let multiplier = function(distance, energy);
                if !multiplier.is_finite() || multiplier < 1.0 {
                    return Err(GraphError::invalid(format!(
                        "{label} bias returned {multiplier} at distance {distance}, \
                         energy {energy}; multipliers must be finite and at least 1"
                    )));
                }
            }
        }
        Ok(Self {
            function,
            influence_radius,
            stretch_cone,
            label,
        })
    }

    /// Multiplier for an event at `distance` from a source of `energy`.
    ///
    /// Outside the influence radius the multiplier is exactly 1.
    pub fn multiplier(&self, distance: f64, energy: f64) -> f64 {
        if distance > self.influence_radius || energy <= 0.0 {
            1.0
        } else {
            (self.function)(distance, energy)
        }
    }

    /// Radius beyond which sources have no effect.
    pub const fn influence_radius(&self) -> f64 {
        self.influence_radius
    }

    /// Whether the multiplier widens the light-cone allowance.
    pub const fn stretches_cone(&self) -> bool {
        self.stretch_cone
    }

    /// Short name of the bias shape, for logs.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for EnergyBias {
    fn default() -> Self {
        Self::neutral()
    }
}

impl core::fmt::Debug for EnergyBias {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EnergyBias")
            .field("label", &self.label)
            .field("influence_radius", &self.influence_radius)
            .field("stretch_cone", &self.stretch_cone)
            .finish_non_exhaustive()
    }
}

fn shape_label(shape: &BiasShape) -> String {
    match shape {
        BiasShape::None => "none",
        BiasShape::Constant { .. } => "constant",
        BiasShape::Linear { .. } => "linear",
        BiasShape::InverseSquare { .. } => "inverse_square",
        BiasShape::Exponential { .. } => "exponential",
    }
    .to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn neutral_is_one_everywhere() {
        let bias = EnergyBias::neutral();
        assert_eq!(bias.multiplier(0.0, 100.0), 1.0);
        assert_eq!(bias.multiplier(5.0, 1.0), 1.0);
    }

    #[test]
    fn outside_radius_is_unbiased() {
        let bias = EnergyBias::from_shape(&BiasShape::Constant { multiplier: 50.0 }, 2.0, true)
            .unwrap();
        assert_eq!(bias.multiplier(1.0, 1.0), 50.0);
        assert_eq!(bias.multiplier(2.0, 1.0), 50.0);
        assert_eq!(bias.multiplier(2.5, 1.0), 1.0);
    }

    #[test]
    fn linear_decays_to_one_at_radius() {
        let bias = EnergyBias::from_shape(&BiasShape::Linear { gain: 1.0 }, 4.0, false).unwrap();
        assert!((bias.multiplier(0.0, 2.0) - 3.0).abs() < 1e-12);
        assert!((bias.multiplier(2.0, 2.0) - 2.0).abs() < 1e-12);
        assert!((bias.multiplier(4.0, 2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_square_shape() {
        let bias =
            EnergyBias::from_shape(&BiasShape::InverseSquare { gain: 2.0 }, 10.0, true).unwrap();
        assert!((bias.multiplier(1.0, 5.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn constant_below_one_rejected() {
        let result = EnergyBias::from_shape(&BiasShape::Constant { multiplier: 0.5 }, 1.0, true);
        assert!(matches!(result, Err(GraphError::InvalidConfiguration { .. })));
    }

    #[test]
    fn bad_exponential_scale_rejected() {
        let shape = BiasShape::Exponential {
            gain: 1.0,
            scale: 0.0,
        };
        assert!(EnergyBias::from_shape(&shape, 1.0, true).is_err());
    }

    #[test]
    fn negative_radius_rejected() {
        assert!(EnergyBias::custom(-1.0, true, |_, _| 2.0).is_err());
    }

    #[test]
    fn custom_function_validated_once() {
        let nan = EnergyBias::custom(1.0, true, |d, _| if d > 0.5 { f64::NAN } else { 1.0 });
        assert!(nan.is_err());

        let ok = EnergyBias::custom(1.0, false, |d, e| 1.0 + e / (1.0 + d)).unwrap();
        assert_eq!(ok.label(), "custom");
        assert!(!ok.stretches_cone());
        assert!((ok.multiplier(0.0, 3.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: BiasSettings =
            serde_json::from_str(r#"{"shape":{"kind":"linear","gain":0.5}}"#).unwrap();
        assert_eq!(settings.shape, BiasShape::Linear { gain: 0.5 });
        assert_eq!(settings.influence_radius, 1.0);
        assert!(settings.stretch_cone);
        assert!(settings.build().is_ok());
    }
}
