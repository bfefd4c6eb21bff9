//! Calculator variants.
//!
//! A profile pins a preset together with the presentation and behaviour
//! switches of one calculator instance.

use super::preset::{CovariateSpec, Preset};

/// Decimal places used when formatting results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPrecision {
    /// Probability percentage
    pub probability: usize,
    /// Per-term contributions and their total
    pub contribution: usize,
    /// Raw logit readout
    pub logit: usize,
}

impl Default for DisplayPrecision {
    fn default() -> Self {
        Self {
            probability: 1,
            contribution: 2,
            logit: 3,
        }
    }
}

/// One calculator variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorProfile {
    /// Name used to select the profile (`NOMOGRAM_PROFILE`)
    pub name: &'static str,

    /// Coefficient preset
    pub preset: Preset,

    /// Key of the persisted entry
    pub storage_key: &'static str,

    /// Formatting of results
    pub precision: DisplayPrecision,

    /// Value used when the Gleason text does not parse
    pub gleason_fallback: f64,

    /// Intercept and coefficients can be edited in the form
    pub editable_coefficients: bool,

    /// Draw per-term nomogram bars
    pub bar_scaling: bool,

    /// Save on every change and restore at startup
    pub persistence: bool,
}

impl CalculatorProfile {
    /// Full nomogram: editable coefficients, bars, persistence.
    #[must_use]
    pub fn nomogram() -> Self {
        Self {
            name: "nomogram",
            preset: Preset::Primary,
            storage_key: "nomogram-data-v1",
            precision: DisplayPrecision::default(),
            gleason_fallback: 0.0,
            editable_coefficients: true,
            bar_scaling: true,
            persistence: true,
        }
    }

    /// Fixed-coefficient primary calculator.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            name: "quick",
            preset: Preset::Primary,
            storage_key: "nomogram-quick-v1",
            precision: DisplayPrecision {
                probability: 2,
                ..DisplayPrecision::default()
            },
            gleason_fallback: 1.0,
            editable_coefficients: false,
            bar_scaling: false,
            persistence: true,
        }
    }

    /// Primary calculator with a four-decimal readout and no persistence.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            name: "precise",
            preset: Preset::Primary,
            storage_key: "nomogram-precise-v1",
            precision: DisplayPrecision {
                probability: 4,
                ..DisplayPrecision::default()
            },
            gleason_fallback: 0.0,
            editable_coefficients: false,
            bar_scaling: false,
            persistence: false,
        }
    }

    /// Secondary preset (positive cores, biopsy Gleason).
    #[must_use]
    pub fn biopsy() -> Self {
        Self {
            name: "biopsy",
            preset: Preset::Secondary,
            storage_key: "nomogram-biopsy-v1",
            precision: DisplayPrecision {
                probability: 2,
                ..DisplayPrecision::default()
            },
            gleason_fallback: 0.0,
            editable_coefficients: false,
            bar_scaling: false,
            persistence: true,
        }
    }

    /// All built-in profiles.
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        vec![Self::nomogram(), Self::quick(), Self::precise(), Self::biopsy()]
    }

    /// Look up a built-in profile by name (case-insensitive).
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        Self::builtin().into_iter().find(|p| p.name == wanted)
    }

    /// Fallback for a covariate whose text does not parse.
    #[must_use]
    pub fn fallback_for(&self, spec: &CovariateSpec) -> f64 {
        if spec.key == "gleason" {
            self.gleason_fallback
        } else {
            0.0
        }
    }
}

impl Default for CalculatorProfile {
    fn default() -> Self {
        Self::nomogram()
    }
}
