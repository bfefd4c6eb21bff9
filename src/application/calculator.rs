//! Calculator service: Orchestrates one calculator session.
//!
//! This service coordinates:
//! - Session state (current field text)
//! - Scoring and display derivation
//! - Best-effort persistence of the last-entered values
//! - Import and export of documents

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::file;
use crate::domain::{CalculatorProfile, DisplayState, NomogramRecord, SessionState};
use crate::ports::Storage;

/// Service owning the state of one calculator session.
///
/// Persistence failures never interrupt the session: they are logged and
/// the calculator keeps working in memory.
pub struct CalculatorService<S>
where
    S: Storage,
{
    profile: CalculatorProfile,
    session: SessionState,
    storage: Arc<S>,
}

impl<S> CalculatorService<S>
where
    S: Storage,
{
    /// Create a new service with sample values and built-in coefficients.
    pub fn new(profile: CalculatorProfile, storage: Arc<S>) -> Self {
        let session = SessionState::sample(profile.preset);
        Self {
            profile,
            session,
            storage,
        }
    }

    /// Startup: restore saved values, otherwise force built-in coefficients.
    ///
    /// Returns whether a saved entry was applied.
    pub fn initialize(&mut self) -> bool {
        tracing::info!("Initializing calculator profile '{}'", self.profile.name);

        let restored = self.restore();
        if !restored {
            self.session.reset_coefficients(self.profile.preset);
        }
        restored
    }

    /// Current profile.
    #[must_use]
    pub fn profile(&self) -> &CalculatorProfile {
        &self.profile
    }

    /// Current field text.
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Score the current fields.
    #[must_use]
    pub fn evaluate(&self) -> DisplayState {
        DisplayState::evaluate(
            &self.profile,
            &self.session.coefficient_set(&self.profile),
            &self.session.covariate_input(&self.profile),
        )
    }

    /// Replace the text of one field and persist.
    ///
    /// Returns `false` (and changes nothing) for keys the preset does not have.
    pub fn set_field(&mut self, key: &str, text: &str) -> bool {
        match self.session.field_mut(self.profile.preset, key) {
            Some(field) => {
                text.clone_into(field);
                self.save();
                true
            }
            None => {
                tracing::debug!("Ignoring edit of unknown field {}", key);
                false
            }
        }
    }

    /// Restore built-in intercept and coefficients and persist.
    pub fn reset_coefficients(&mut self) {
        tracing::info!("Resetting coefficients to defaults");
        self.session.reset_coefficients(self.profile.preset);
        self.save();
    }

    /// Forget the saved entry and go back to sample values.
    ///
    /// The fresh state is deliberately not saved.
    pub fn clear_saved(&mut self) {
        if self.profile.persistence {
            if let Err(e) = self.storage.remove_item(self.profile.storage_key) {
                tracing::warn!("Failed to remove saved entry: {}", e);
            }
        }
        self.session.wipe();
        self.session = SessionState::sample(self.profile.preset);
        tracing::info!("Cleared saved data");
    }

    /// Persist the current fields (best-effort).
    pub fn save(&self) {
        if !self.profile.persistence {
            return;
        }

        let mut record = NomogramRecord::from_session(&self.session, self.profile.preset);
        record.saved_at = Some(chrono::Utc::now());

        let json = match record.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Could not serialize calculator state: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.set_item(self.profile.storage_key, &json) {
            tracing::warn!("Could not save calculator state: {}", e);
        } else {
            tracing::debug!("Saved calculator state");
        }
    }

    /// Apply the saved entry, if any. Failures are logged and reported as `false`.
    pub fn restore(&mut self) -> bool {
        if !self.profile.persistence {
            return false;
        }

        let raw = match self.storage.get_item(self.profile.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("Could not load saved calculator state: {}", e);
                return false;
            }
        };

        match NomogramRecord::parse(&raw) {
            Ok(record) => {
                let applied = record.apply_to(&mut self.session, self.profile.preset);
                tracing::info!("Restored {} saved fields", applied);
                true
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable saved entry: {}", e);
                false
            }
        }
    }

    /// Snapshot of the current fields stamped with `exportedAt`.
    #[must_use]
    pub fn export_record(&self) -> NomogramRecord {
        let mut record = NomogramRecord::from_session(&self.session, self.profile.preset);
        record.exported_at = Some(chrono::Utc::now());
        record
    }

    /// Write `nomogram-data.json` into `dir`.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn export_to(&self, dir: &Path) -> crate::Result<PathBuf> {
        file::write_export(dir, &self.export_record())
    }

    /// Merge a document into the session and persist.
    ///
    /// The document is parsed before anything is touched, so a malformed
    /// document leaves the session unchanged.
    ///
    /// # Errors
    /// Returns `NomogramError::Record` for malformed documents.
    pub fn import_document(&mut self, text: &str) -> crate::Result<usize> {
        let record = NomogramRecord::parse(text).inspect_err(|e| {
            tracing::error!("Rejected import: {}", e);
        })?;

        let applied = record.apply_to(&mut self.session, self.profile.preset);
        self.save();
        tracing::info!("Imported {} fields", applied);
        Ok(applied)
    }

    /// Read and import a document file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is malformed.
    pub fn import_file(&mut self, path: &Path) -> crate::Result<usize> {
        let text = file::read_document(path)?;
        self.import_document(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use crate::NomogramError;
    use crate::domain::Preset;
    use tempfile::tempdir;

    fn create_test_service(profile: CalculatorProfile) -> CalculatorService<SqliteStorage> {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        CalculatorService::new(profile, storage)
    }

    /// Storage whose every operation fails.
    struct UnavailableStorage;

    impl Storage for UnavailableStorage {
        type Error = std::io::Error;

        fn get_item(&self, _key: &str) -> Result<Option<String>, Self::Error> {
            Err(std::io::Error::other("storage unavailable"))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), Self::Error> {
            Err(std::io::Error::other("quota exceeded"))
        }

        fn remove_item(&self, _key: &str) -> Result<(), Self::Error> {
            Err(std::io::Error::other("storage unavailable"))
        }
    }

    #[test]
    fn test_initial_evaluation() {
        let mut service = create_test_service(CalculatorProfile::nomogram());
        assert!(!service.initialize());

        let display = service.evaluate();
        assert!((display.result.logit - -3.715).abs() < 1e-9);
        assert_eq!(display.probability_text(), "2.4%");
    }

    #[test]
    fn test_edit_persists_and_restores() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));

        let mut first = CalculatorService::new(CalculatorProfile::nomogram(), storage.clone());
        first.initialize();
        assert!(first.set_field("psa", "25"));
        assert!(first.set_field("b_diam", "0.2"));

        let raw = storage
            .get_item("nomogram-data-v1")
            .expect("Should read")
            .expect("Should be saved");
        assert!(raw.contains("\"savedAt\""));

        let mut second = CalculatorService::new(CalculatorProfile::nomogram(), storage);
        assert!(second.initialize());
        assert_eq!(second.session(), first.session());
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let mut service = create_test_service(CalculatorProfile::biopsy());
        let before = service.session().clone();
        assert!(!service.set_field("psa", "4"));
        assert_eq!(service.session(), &before);
    }

    #[test]
    fn test_reset_coefficients_keeps_covariates() {
        let mut service = create_test_service(CalculatorProfile::nomogram());
        service.set_field("gleason", "5");
        service.set_field("intercept", "-1");

        service.reset_coefficients();

        assert_eq!(service.session().intercept, "-9.079");
        assert_eq!(service.session().covariates[0], "5");
    }

    #[test]
    fn test_clear_saved_resets_and_forgets() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let mut service = CalculatorService::new(CalculatorProfile::nomogram(), storage.clone());
        service.set_field("psa", "40");
        service.set_field("b_psa", "1");

        service.clear_saved();

        assert_eq!(service.session(), &SessionState::sample(Preset::Primary));
        assert!(storage.get_item("nomogram-data-v1").expect("Should read").is_none());
    }

    #[test]
    fn test_import_partial_merge() {
        let mut service = create_test_service(CalculatorProfile::nomogram());

        let applied = service
            .import_document(r#"{"gleason": "4", "b_psa": 0.12}"#)
            .expect("Should import");

        assert_eq!(applied, 2);
        assert_eq!(service.session().covariates, vec!["4", "10.00", "12.0"]);
        assert_eq!(service.session().coefficients[1], "0.12");
        assert_eq!(service.session().intercept, "-9.079");
    }

    #[test]
    fn test_malformed_import_leaves_state_unchanged() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let mut service = CalculatorService::new(CalculatorProfile::nomogram(), storage.clone());
        service.set_field("psa", "7.7");
        let before = service.session().clone();
        let saved_before = storage.get_item("nomogram-data-v1").expect("Should read");

        let err = service
            .import_document(r#"{"gleason": "9", "psa": "#)
            .expect_err("Should reject");

        assert!(matches!(err, NomogramError::Record(_)));
        assert_eq!(service.session(), &before);
        assert_eq!(
            storage.get_item("nomogram-data-v1").expect("Should read"),
            saved_before
        );
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let dir = tempdir().expect("tempdir");

        let mut source = create_test_service(CalculatorProfile::nomogram());
        source.set_field("gleason", "2");
        source.set_field("diam", "31.5");
        source.set_field("b_gleason", "0.5");
        let path = source.export_to(dir.path()).expect("Should export");

        let mut target = create_test_service(CalculatorProfile::nomogram());
        target.import_file(&path).expect("Should import");

        assert_eq!(target.session(), source.session());
        assert_eq!(target.evaluate().result, source.evaluate().result);
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let mut service =
            CalculatorService::new(CalculatorProfile::nomogram(), Arc::new(UnavailableStorage));

        assert!(!service.initialize());
        assert!(service.set_field("psa", "12"));
        service.reset_coefficients();
        service.clear_saved();

        assert_eq!(service.session(), &SessionState::sample(Preset::Primary));
    }

    #[test]
    fn test_unreadable_saved_entry_is_ignored() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        storage
            .set_item("nomogram-data-v1", "not json")
            .expect("Should save");

        let mut service = CalculatorService::new(CalculatorProfile::nomogram(), storage);
        assert!(!service.initialize());
        assert_eq!(service.session(), &SessionState::sample(Preset::Primary));
    }

    #[test]
    fn test_profile_without_persistence_never_writes() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let mut service = CalculatorService::new(CalculatorProfile::precise(), storage.clone());
        service.set_field("psa", "3");

        assert!(storage
            .get_item(CalculatorProfile::precise().storage_key)
            .expect("Should read")
            .is_none());
    }
}
