//! Domain layer: Core scoring types and logic.
//!
//! This module contains pure Rust types with no I/O. Presets, profiles and
//! session state are plain values; scoring is a pure function.

mod display;
mod preset;
mod profile;
mod record;
mod scorer;
mod session;

pub use display::{DisplayState, TermDisplay};
pub use preset::{CoefficientSet, CovariateSpec, Preset, INTERCEPT_KEY};
pub use profile::{CalculatorProfile, DisplayPrecision};
pub use record::{FieldText, NomogramRecord, RecordError};
pub use scorer::{bar_width, contribution, score, sigmoid, to_display_percent, ScoreResult};
pub use session::{parse_number, parse_or, CovariateInput, SessionState};
