//! Shared leaf types embedded in every record kind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Canonical discriminator for single-point input records.
pub const QCSCHEMA_INPUT: &str = "qcschema_input";
/// Canonical discriminator for single-point output records.
pub const QCSCHEMA_OUTPUT: &str = "qcschema_output";

/// What the computation is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Energy,
    Gradient,
    Hessian,
    Properties,
}

/// The quantum-chemistry method and basis requested of a computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
}

/// Who produced a record, with what, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine: Option<String>,
}

impl Provenance {
    /// This crate's own stamp, used when an input record carries none.
    pub fn stamp(routine: &str) -> Self {
        Self {
            creator: "qcrecords".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            routine: Some(routine.to_string()),
        }
    }
}

/// A complete description of why a program execution failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeError {
    pub error_type: String,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,
}

/// Normalizes a single-point discriminator to its canonical output spelling.
///
/// Input spellings (including the legacy underscored `qc_schema_input`) are
/// coerced to output, matching how a completed computation restamps the input
/// record it was built from. Anything else is rejected.
pub fn normalize_result_schema_name(raw: &str) -> Result<&'static str, ValidationError> {
    match raw.trim() {
        "qcschema_input" | "qc_schema_input" | "qcschema_output" | "qc_schema_output" => {
            Ok(QCSCHEMA_OUTPUT)
        }
        other => Err(ValidationError::structural(format!(
            "only {QCSCHEMA_OUTPUT} or {QCSCHEMA_INPUT} is allowed for schema_name, got `{other}`"
        ))),
    }
}

/// Normalizes a single-point input discriminator to its canonical spelling.
pub fn normalize_input_schema_name(raw: &str) -> Result<&'static str, ValidationError> {
    match raw.trim() {
        "qcschema_input" | "qc_schema_input" => Ok(QCSCHEMA_INPUT),
        other => Err(ValidationError::structural(format!(
            "only {QCSCHEMA_INPUT} is allowed for schema_name, got `{other}`"
        ))),
    }
}

/// Checks a provided discriminator against the single canonical name for a
/// record kind, tolerating absence.
pub fn expect_schema_name(
    raw: Option<&str>,
    expected: &'static str,
) -> Result<&'static str, ValidationError> {
    match raw {
        None => Ok(expected),
        Some(s) if s.trim() == expected => Ok(expected),
        Some(other) => Err(ValidationError::structural(format!(
            "schema_name must be {expected}, got `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_wire_spelling() {
        let d: Driver = serde_json::from_value(serde_json::json!("gradient")).unwrap();
        assert_eq!(d, Driver::Gradient);
        assert_eq!(serde_json::to_value(Driver::Energy).unwrap(), serde_json::json!("energy"));
    }

    #[test]
    fn input_name_coerces_to_output() {
        assert_eq!(normalize_result_schema_name("qcschema_input").unwrap(), QCSCHEMA_OUTPUT);
        assert_eq!(normalize_result_schema_name("qc_schema_input").unwrap(), QCSCHEMA_OUTPUT);
        assert_eq!(normalize_result_schema_name("qcschema_output").unwrap(), QCSCHEMA_OUTPUT);
        assert!(normalize_result_schema_name("qcschema_molecule").is_err());
    }

    #[test]
    fn expected_name_tolerates_absence() {
        assert_eq!(expect_schema_name(None, "qcschema_optimization_input").unwrap(),
            "qcschema_optimization_input");
        assert!(expect_schema_name(Some("qcschema_input"), "qcschema_optimization_input").is_err());
    }

    #[test]
    fn stamp_names_the_crate() {
        let p = Provenance::stamp("convert_v");
        assert_eq!(p.creator, "qcrecords");
        assert_eq!(p.routine.as_deref(), Some("convert_v"));
    }
}
