//! # Nomogram
//!
//! Interactive logistic-regression risk calculators ("nomograms") for the
//! terminal.
//!
//! This crate provides:
//! - A pure logistic scorer (linear predictor + sigmoid) with fixed presets
//! - Calculator profiles (display precision, parse fallbacks, features)
//! - Local persistence and JSON import/export of the last-entered values
//! - Terminal UI with nomogram bars
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (ScoreResult, CoefficientSet, SessionState, records)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (SQLite, files, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{score, CalculatorProfile, DisplayState, Preset, ScoreResult, SessionState};

/// Result type for Nomogram operations
pub type Result<T> = std::result::Result<T, NomogramError>;

/// Main error type for Nomogram
#[derive(Debug, thiserror::Error)]
pub enum NomogramError {
    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Invalid document: {0}")]
    Record(#[from] domain::RecordError),

    #[error("Unknown calculator profile: {0}")]
    UnknownProfile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
