//! Coefficient presets and covariate slot definitions.
//!
//! Coefficients come from published regression tables and are fixed here.

use serde::{Deserialize, Serialize};

/// One covariate slot of a preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovariateSpec {
    /// Record key of the covariate value (e.g. `gleason`)
    pub key: &'static str,

    /// Record key of its coefficient (e.g. `b_gleason`)
    pub coefficient_key: &'static str,

    /// Form label
    pub label: &'static str,

    /// Placeholder shown while the field is empty
    pub hint: &'static str,

    /// Text put in the field on reset / clear
    pub sample: &'static str,

    /// Built-in coefficient
    pub coefficient: f64,
}

/// Record key of the intercept field.
pub const INTERCEPT_KEY: &str = "intercept";

const PRIMARY_COVARIATES: [CovariateSpec; 3] = [
    CovariateSpec {
        key: "gleason",
        coefficient_key: "b_gleason",
        label: "Gleason",
        hint: "grade group / score",
        sample: "3",
        coefficient: 0.934,
    },
    CovariateSpec {
        key: "psa",
        coefficient_key: "b_psa",
        label: "PSA",
        hint: "ng/mL",
        sample: "10.00",
        coefficient: 0.099,
    },
    CovariateSpec {
        key: "diam",
        coefficient_key: "b_diam",
        label: "Diameter",
        hint: "lesion diameter (mm)",
        sample: "12.0",
        coefficient: 0.131,
    },
];

const SECONDARY_COVARIATES: [CovariateSpec; 2] = [
    CovariateSpec {
        key: "pct_positive",
        coefficient_key: "b_pct_positive",
        label: "% Positive Cores",
        hint: "percent (0-100)",
        sample: "50",
        coefficient: 0.029,
    },
    CovariateSpec {
        key: "biopsy_gleason",
        coefficient_key: "b_biopsy_gleason",
        label: "Biopsy Gleason",
        hint: "biopsy Gleason score",
        sample: "7",
        coefficient: 0.538,
    },
];

/// Known coefficient presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Gleason, PSA and lesion diameter
    Primary,
    /// Percentage of positive cores and biopsy Gleason
    Secondary,
}

impl Preset {
    /// Covariate slots in scoring order.
    #[must_use]
    pub fn covariates(&self) -> &'static [CovariateSpec] {
        match self {
            Self::Primary => &PRIMARY_COVARIATES,
            Self::Secondary => &SECONDARY_COVARIATES,
        }
    }

    /// Built-in intercept.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        match self {
            Self::Primary => -9.079,
            Self::Secondary => -4.346,
        }
    }

    /// Built-in coefficient set.
    #[must_use]
    pub fn defaults(&self) -> CoefficientSet {
        CoefficientSet {
            intercept: self.intercept(),
            coefficients: self.covariates().iter().map(|c| c.coefficient).collect(),
        }
    }

    /// Short description for headers.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Primary => "Gleason · PSA · Lesion Diameter",
            Self::Secondary => "% Positive Cores · Biopsy Gleason",
        }
    }
}

/// Intercept plus one coefficient per covariate slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSet {
    /// Model constant
    pub intercept: f64,

    /// Coefficients in the preset's covariate order
    pub coefficients: Vec<f64>,
}

impl CoefficientSet {
    /// Pair coefficients with covariate values for [`crate::domain::score`].
    ///
    /// Extra entries on either side are ignored.
    #[must_use]
    pub fn terms(&self, values: &[f64]) -> Vec<(f64, f64)> {
        self.coefficients
            .iter()
            .copied()
            .zip(values.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_defaults() {
        let set = Preset::Primary.defaults();
        assert_eq!(set.intercept, -9.079);
        assert_eq!(set.coefficients, vec![0.934, 0.099, 0.131]);
    }

    #[test]
    fn test_secondary_defaults() {
        let set = Preset::Secondary.defaults();
        assert_eq!(set.intercept, -4.346);
        assert_eq!(set.coefficients, vec![0.029, 0.538]);
    }

    #[test]
    fn test_record_keys_are_unique() {
        for preset in [Preset::Primary, Preset::Secondary] {
            let mut keys: Vec<&str> = preset
                .covariates()
                .iter()
                .flat_map(|c| [c.key, c.coefficient_key])
                .collect();
            keys.push(INTERCEPT_KEY);
            let total = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), total);
        }
    }

    #[test]
    fn test_terms_pairing() {
        let set = Preset::Primary.defaults();
        let terms = set.terms(&[3.0, 10.0, 12.0]);
        assert_eq!(terms, vec![(0.934, 3.0), (0.099, 10.0), (0.131, 12.0)]);
    }
}
