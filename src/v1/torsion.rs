//! Legacy-generation torsion-drive records.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::common::Provenance;
use crate::model::molecule::Molecule;
use crate::v1::atomic::QCInputSpecification;
use crate::v1::optimization::{OptimizationResult, OptimizationSpecification};
use crate::v2::torsion::TDKeywords;

/// A legacy torsion-drive directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorsionDriveInput {
    pub schema_name: String,
    pub schema_version: u32,
    pub keywords: TDKeywords,
    pub extras: Map<String, Value>,
    pub input_specification: QCInputSpecification,
    pub initial_molecule: Vec<Molecule>,
    pub optimization_spec: OptimizationSpecification,
    pub provenance: Provenance,
}

/// A legacy torsion-drive result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorsionDriveResult {
    pub schema_name: String,
    pub schema_version: u32,
    pub keywords: TDKeywords,
    pub extras: Map<String, Value>,
    pub input_specification: QCInputSpecification,
    pub initial_molecule: Vec<Molecule>,
    pub optimization_spec: OptimizationSpecification,
    pub final_energies: BTreeMap<String, f64>,
    pub final_molecules: BTreeMap<String, Molecule>,
    pub optimization_history: BTreeMap<String, Vec<OptimizationResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    pub success: bool,
    pub provenance: Provenance,
}
