//! Legacy-generation geometry-optimization records.
//!
//! In this generation the optimizer's keywords, protocols, and extras sit
//! directly on the record and the leaf specification is a bare
//! [`QCInputSpecification`]; the version-2 wrapper specification does not
//! exist here.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::common::{ComputeError, Provenance};
use crate::model::molecule::Molecule;
use crate::model::protocols::OptimizationProtocols;
use crate::v1::atomic::{AtomicResult, QCInputSpecification};

/// The legacy optimizer specification: a procedure name with keywords.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationSpecification {
    pub schema_name: String,
    pub procedure: String,
    pub keywords: Map<String, Value>,
    pub protocols: OptimizationProtocols,
}

/// A legacy geometry-optimization directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_name: String,
    pub schema_version: u32,
    pub keywords: Map<String, Value>,
    pub extras: Map<String, Value>,
    pub protocols: OptimizationProtocols,
    pub input_specification: QCInputSpecification,
    pub initial_molecule: Molecule,
    pub provenance: Provenance,
}

/// A legacy geometry-optimization result.
///
/// Per-step properties do not exist in this generation; only the scalar
/// energy of each retained trajectory step is carried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_name: String,
    pub schema_version: u32,
    pub keywords: Map<String, Value>,
    pub extras: Map<String, Value>,
    pub protocols: OptimizationProtocols,
    pub input_specification: QCInputSpecification,
    pub initial_molecule: Molecule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_molecule: Option<Molecule>,
    pub trajectory: Vec<AtomicResult>,
    pub energies: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ComputeError>,
    pub provenance: Provenance,
}
