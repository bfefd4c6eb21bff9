//! Session state: the current text of every form field.
//!
//! Field text is kept verbatim so persisted and exported documents carry
//! exactly what the user typed. Numbers are derived on demand.

use std::sync::OnceLock;

use regex::Regex;
use zeroize::Zeroize;

use super::preset::{CoefficientSet, Preset, INTERCEPT_KEY};
use super::profile::CalculatorProfile;

static NUMBER_PREFIX: OnceLock<Regex> = OnceLock::new();

fn number_prefix() -> &'static Regex {
    NUMBER_PREFIX.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("Valid regex")
    })
}

/// Parse the leading decimal number of `text`.
///
/// Trailing characters are ignored (`"12mm"` is 12). Returns `None` when
/// there is no numeric prefix or the value is not finite.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let matched = number_prefix().find(text)?.as_str().trim_start();
    matched.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// [`parse_number`] with a fallback for unusable text.
#[must_use]
pub fn parse_or(text: &str, fallback: f64) -> f64 {
    parse_number(text).unwrap_or(fallback)
}

/// Covariate values parsed from the form, in preset order.
#[derive(Debug, Clone, PartialEq)]
pub struct CovariateInput {
    entries: Vec<(&'static str, f64)>,
}

impl CovariateInput {
    /// Value of a covariate by record key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, v)| v)
    }

    /// Values in scoring order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|&(_, v)| v).collect()
    }
}

/// Current form field text for one calculator session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Covariate text, one per preset slot
    pub covariates: Vec<String>,

    /// Intercept text
    pub intercept: String,

    /// Coefficient text, one per preset slot
    pub coefficients: Vec<String>,
}

impl SessionState {
    /// Sample covariates with built-in coefficients.
    #[must_use]
    pub fn sample(preset: Preset) -> Self {
        let mut state = Self {
            covariates: preset
                .covariates()
                .iter()
                .map(|c| c.sample.to_string())
                .collect(),
            ..Self::default()
        };
        state.reset_coefficients(preset);
        state
    }

    /// Replace intercept and coefficient text with the built-in values.
    pub fn reset_coefficients(&mut self, preset: Preset) {
        let defaults = preset.defaults();
        self.intercept = defaults.intercept.to_string();
        self.coefficients = defaults
            .coefficients
            .iter()
            .map(ToString::to_string)
            .collect();
    }

    /// Overwrite every buffer with zeros and empty it.
    pub fn wipe(&mut self) {
        self.intercept.zeroize();
        for text in self.covariates.iter_mut().chain(self.coefficients.iter_mut()) {
            text.zeroize();
        }
    }

    /// Text of a field by record key.
    #[must_use]
    pub fn field(&self, preset: Preset, key: &str) -> Option<&str> {
        if key == INTERCEPT_KEY {
            return Some(&self.intercept);
        }
        preset.covariates().iter().enumerate().find_map(|(i, c)| {
            if c.key == key {
                self.covariates.get(i).map(String::as_str)
            } else if c.coefficient_key == key {
                self.coefficients.get(i).map(String::as_str)
            } else {
                None
            }
        })
    }

    /// Mutable text of a field by record key.
    pub fn field_mut(&mut self, preset: Preset, key: &str) -> Option<&mut String> {
        if key == INTERCEPT_KEY {
            return Some(&mut self.intercept);
        }
        let (index, is_coefficient) =
            preset.covariates().iter().enumerate().find_map(|(i, c)| {
                if c.key == key {
                    Some((i, false))
                } else if c.coefficient_key == key {
                    Some((i, true))
                } else {
                    None
                }
            })?;
        if is_coefficient {
            self.coefficients.get_mut(index)
        } else {
            self.covariates.get_mut(index)
        }
    }

    /// All record keys of a preset paired with their current text.
    ///
    /// Order: covariates, intercept, coefficients.
    #[must_use]
    pub fn fields(&self, preset: Preset) -> Vec<(&'static str, &str)> {
        let covariates = preset.covariates();
        let mut out = Vec::with_capacity(covariates.len() * 2 + 1);
        for (spec, text) in covariates.iter().zip(&self.covariates) {
            out.push((spec.key, text.as_str()));
        }
        out.push((INTERCEPT_KEY, self.intercept.as_str()));
        for (spec, text) in covariates.iter().zip(&self.coefficients) {
            out.push((spec.coefficient_key, text.as_str()));
        }
        out
    }

    /// Parse covariates with the profile's fallbacks.
    #[must_use]
    pub fn covariate_input(&self, profile: &CalculatorProfile) -> CovariateInput {
        let entries = profile
            .preset
            .covariates()
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let fallback = profile.fallback_for(spec);
                let value = self
                    .covariates
                    .get(i)
                    .map_or(fallback, |text| parse_or(text, fallback));
                (spec.key, value)
            })
            .collect();
        CovariateInput { entries }
    }

    /// Coefficients in effect for the profile.
    ///
    /// Non-editable profiles always use the preset defaults.
    #[must_use]
    pub fn coefficient_set(&self, profile: &CalculatorProfile) -> CoefficientSet {
        if !profile.editable_coefficients {
            return profile.preset.defaults();
        }
        let slots = profile.preset.covariates().len();
        CoefficientSet {
            intercept: parse_or(&self.intercept, 0.0),
            coefficients: (0..slots)
                .map(|i| self.coefficients.get(i).map_or(0.0, |t| parse_or(t, 0.0)))
                .collect(),
        }
    }
}
