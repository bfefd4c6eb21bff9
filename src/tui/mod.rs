//! TUI module: Terminal User Interface using Ratatui.
//!
//! A single calculator screen:
//! - Covariate (and, when editable, coefficient) input form
//! - Nomogram panel with contribution bars and the probability gauge
//! - Import prompt and status footer

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
