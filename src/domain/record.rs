//! Persisted / exchanged JSON document.
//!
//! The same shape is used for the saved entry (`savedAt`), exported files
//! (`exportedAt`) and imports. Field values are the verbatim form text.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::preset::Preset;
use super::session::SessionState;

/// Errors raised while reading a document.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Malformed nomogram document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Text of one field as found in a document.
///
/// Strings are taken verbatim, numbers in shortest decimal form (`10.00`
/// reads as `10`), `null` as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "String")]
pub struct FieldText(pub String);

impl From<serde_json::Value> for FieldText {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self(s),
            serde_json::Value::Null => Self(String::new()),
            serde_json::Value::Number(n) => {
                Self(n.as_f64().map_or_else(|| n.to_string(), |v| v.to_string()))
            }
            other => Self(other.to_string()),
        }
    }
}

impl From<FieldText> for String {
    fn from(text: FieldText) -> Self {
        text.0
    }
}

/// Nomogram document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NomogramRecord {
    /// Field text keyed by record key (`gleason`, `b_psa`, ...)
    #[serde(flatten)]
    pub values: BTreeMap<String, FieldText>,

    /// Set on entries written to the key-value store
    #[serde(
        rename = "savedAt",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub saved_at: Option<DateTime<Utc>>,

    /// Set on exported files
    #[serde(
        rename = "exportedAt",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub exported_at: Option<DateTime<Utc>>,
}

impl NomogramRecord {
    /// Snapshot every field of the session.
    #[must_use]
    pub fn from_session(session: &SessionState, preset: Preset) -> Self {
        let values = session
            .fields(preset)
            .into_iter()
            .map(|(key, text)| (key.to_string(), FieldText(text.to_string())))
            .collect();
        Self {
            values,
            saved_at: None,
            exported_at: None,
        }
    }

    /// Parse a document.
    ///
    /// # Errors
    /// Returns `RecordError::Malformed` for invalid JSON or a non-object
    /// top-level value.
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Compact JSON (stored entries).
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Two-space indented JSON (exported files).
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Text of one field, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|t| t.0.as_str())
    }

    /// Copy present fields into the session; absent and unknown keys are
    /// left alone. Returns how many fields were applied.
    pub fn apply_to(&self, session: &mut SessionState, preset: Preset) -> usize {
        let mut applied = 0;
        for (key, text) in &self.values {
            if let Some(field) = session.field_mut(preset, key) {
                field.clone_from(&text.0);
                applied += 1;
            }
        }
        applied
    }
}

fn serialize_timestamp<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => serializer.serialize_none(),
    }
}

// Unreadable timestamps are dropped rather than failing the whole document.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_has_all_fields() {
        let session = SessionState::sample(Preset::Primary);
        let record = NomogramRecord::from_session(&session, Preset::Primary);
        assert_eq!(record.values.len(), 7);
        assert_eq!(record.get("psa"), Some("10.00"));
        assert_eq!(record.get("intercept"), Some("-9.079"));
    }

    #[test]
    fn test_saved_at_serialized_as_iso8601() {
        let mut record = NomogramRecord::default();
        record.saved_at = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .ok()
            .map(|d| d.with_timezone(&Utc));
        let json = record.to_json().expect("serialize");
        assert_eq!(json, r#"{"savedAt":"2024-03-01T12:30:00.000Z"}"#);
    }

    #[test]
    fn test_parse_accepts_numbers_and_null() {
        let record =
            NomogramRecord::parse(r#"{"gleason": 4, "psa": "7.5", "diam": null, "note": true}"#)
                .expect("parse");
        assert_eq!(record.get("gleason"), Some("4"));
        assert_eq!(record.get("psa"), Some("7.5"));
        assert_eq!(record.get("diam"), Some(""));
        assert_eq!(record.get("note"), Some("true"));
    }

    #[test]
    fn test_numbers_use_shortest_decimal_text() {
        let record =
            NomogramRecord::parse(r#"{"psa": 10.00, "diam": 12.5, "b_psa": 0.099}"#)
                .expect("parse");
        assert_eq!(record.get("psa"), Some("10"));
        assert_eq!(record.get("diam"), Some("12.5"));
        assert_eq!(record.get("b_psa"), Some("0.099"));
    }

    #[test]
    fn test_parse_rejects_malformed_and_non_objects() {
        assert!(NomogramRecord::parse("{ not json").is_err());
        assert!(NomogramRecord::parse("null").is_err());
        assert!(NomogramRecord::parse("[1, 2]").is_err());
        assert!(NomogramRecord::parse("").is_err());
    }

    #[test]
    fn test_bad_timestamp_is_dropped() {
        let record = NomogramRecord::parse(r#"{"savedAt": 12, "psa": "3"}"#).expect("parse");
        assert!(record.saved_at.is_none());
        assert_eq!(record.get("psa"), Some("3"));
        assert!(record.get("savedAt").is_none());
    }

    #[test]
    fn test_apply_is_partial_merge() {
        let mut session = SessionState::sample(Preset::Primary);
        let record = NomogramRecord::parse(r#"{"psa": "20", "unknown": "1"}"#).expect("parse");

        let applied = record.apply_to(&mut session, Preset::Primary);

        assert_eq!(applied, 1);
        assert_eq!(session.covariates, vec!["3", "20", "12.0"]);
        assert_eq!(session.intercept, "-9.079");
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = SessionState::sample(Preset::Primary);
        source.covariates = vec!["4".into(), "6.3".into(), "15".into()];
        source.coefficients[2] = "0.2".into();

        let mut record = NomogramRecord::from_session(&source, Preset::Primary);
        record.exported_at = Some(Utc::now());
        let json = record.to_json_pretty().expect("serialize");

        let mut target = SessionState::sample(Preset::Primary);
        NomogramRecord::parse(&json)
            .expect("parse")
            .apply_to(&mut target, Preset::Primary);

        assert_eq!(target, source);
    }
}
