//! Render-neutral result of one evaluation.

use super::preset::CoefficientSet;
use super::profile::{CalculatorProfile, DisplayPrecision};
use super::scorer::{bar_width, contribution, score, to_display_percent, ScoreResult};
use super::session::CovariateInput;

/// One covariate's share of the logit.
#[derive(Debug, Clone, PartialEq)]
pub struct TermDisplay {
    /// Form label
    pub label: &'static str,

    /// `coefficient * value`
    pub contribution: f64,

    /// Bar width in `[0, 100]` when the profile draws bars
    pub bar_width: Option<f64>,
}

/// Everything the view needs to draw the result panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    /// Per-covariate contributions in preset order
    pub terms: Vec<TermDisplay>,

    /// Logit and probability
    pub result: ScoreResult,

    /// Bar width of the total logit when the profile draws bars
    pub total_bar_width: Option<f64>,

    /// Formatting of this calculator instance
    pub precision: DisplayPrecision,
}

impl DisplayState {
    /// Score the inputs and derive the display values.
    #[must_use]
    pub fn evaluate(
        profile: &CalculatorProfile,
        coefficients: &CoefficientSet,
        input: &CovariateInput,
    ) -> Self {
        let terms = coefficients.terms(&input.values());
        let result = score(coefficients.intercept, &terms);

        let scaled = |value: f64| profile.bar_scaling.then(|| bar_width(value, result.logit));

        let terms = profile
            .preset
            .covariates()
            .iter()
            .zip(&terms)
            .map(|(spec, &(coefficient, value))| {
                let share = contribution(coefficient, value);
                TermDisplay {
                    label: spec.label,
                    contribution: share,
                    bar_width: scaled(share),
                }
            })
            .collect();

        Self {
            terms,
            result,
            total_bar_width: scaled(result.logit),
            precision: profile.precision,
        }
    }

    /// Probability in `[0, 100]`.
    #[must_use]
    pub fn probability_percent(&self) -> f64 {
        to_display_percent(&self.result)
    }

    /// Probability readout, e.g. `2.4%`.
    #[must_use]
    pub fn probability_text(&self) -> String {
        format!(
            "{:.*}%",
            self.precision.probability,
            self.result.probability * 100.0
        )
    }

    /// Logit readout.
    #[must_use]
    pub fn logit_text(&self) -> String {
        format!("{:.*}", self.precision.logit, self.result.logit)
    }

    /// Logit in contribution precision, shown next to the total bar.
    #[must_use]
    pub fn total_text(&self) -> String {
        format!("{:.*}", self.precision.contribution, self.result.logit)
    }

    /// Contribution readout of one term.
    #[must_use]
    pub fn contribution_text(&self, term: &TermDisplay) -> String {
        format!("{:.*}", self.precision.contribution, term.contribution)
    }
}
