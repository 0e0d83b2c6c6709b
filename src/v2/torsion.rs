//! Current-generation torsion-drive records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::model::common::{expect_schema_name, Driver, Provenance};
use crate::model::molecule::{Molecule, MoleculeData};
use crate::v2::atomic::{AtomicSpecification, AtomicSpecificationData};
use crate::v2::optimization::{
    OptimizationResult, OptimizationResultData, OptimizationSpecification,
    OptimizationSpecificationData,
};

/// Discriminator for torsion-drive input records.
pub const TORSION_DRIVE_INPUT_NAME: &str = "qcschema_torsion_drive_input";
/// Discriminator for torsion-drive result records.
pub const TORSION_DRIVE_OUTPUT_NAME: &str = "qcschema_torsion_drive_output";

/// Options steering a torsion-drive scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TDKeywords {
    /// Dihedrals selected for the scan, as particle-index quadruplets.
    pub dihedrals: Vec<(i64, i64, i64, i64)>,
    /// Grid spacing per dihedral, in degrees.
    pub grid_spacing: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dihedral_ranges: Option<Vec<(i64, i64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_decrease_thresh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_upper_limit: Option<f64>,
}

/// Raw wire form of a [`TorsionDriveInput`].
#[derive(Debug, Clone, Deserialize)]
pub struct TorsionDriveInputData {
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub keywords: TDKeywords,
    #[serde(default)]
    pub extras: Map<String, Value>,
    pub input_specification: AtomicSpecificationData,
    pub initial_molecule: Vec<MoleculeData>,
    pub optimization_spec: OptimizationSpecificationData,
    #[serde(default)]
    pub provenance: Option<Provenance>,
}

/// A validated torsion-drive directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorsionDriveInput {
    pub schema_name: String,
    pub schema_version: u32,
    pub keywords: TDKeywords,
    pub extras: Map<String, Value>,
    pub input_specification: AtomicSpecification,
    pub initial_molecule: Vec<Molecule>,
    pub optimization_spec: OptimizationSpecification,
    pub provenance: Provenance,
}

impl TorsionDriveInput {
    pub fn new(data: TorsionDriveInputData) -> Result<Self, ValidationError> {
        let schema_name = expect_schema_name(data.schema_name.as_deref(), TORSION_DRIVE_INPUT_NAME)?;

        let input_specification = AtomicSpecification::build(data.input_specification)?;
        if input_specification.driver != Driver::Gradient {
            return Err(ValidationError::structural(
                "a torsion drive's input specification requires the gradient driver",
            ));
        }

        if data.initial_molecule.is_empty() {
            return Err(ValidationError::structural(
                "a torsion drive requires at least one starting molecule",
            ));
        }

        Ok(Self {
            schema_name: schema_name.to_string(),
            schema_version: 2,
            keywords: data.keywords,
            extras: data.extras,
            input_specification,
            initial_molecule: data
                .initial_molecule
                .into_iter()
                .map(Molecule::build)
                .collect::<Result<Vec<_>, _>>()?,
            optimization_spec: OptimizationSpecification::build(data.optimization_spec)?,
            provenance: data
                .provenance
                .unwrap_or_else(|| Provenance::stamp("v2.torsion.input")),
        })
    }
}

fn default_true() -> bool {
    true
}

/// Raw wire form of a [`TorsionDriveResult`].
#[derive(Debug, Clone, Deserialize)]
pub struct TorsionDriveResultData {
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub keywords: TDKeywords,
    #[serde(default)]
    pub extras: Map<String, Value>,
    pub input_specification: AtomicSpecificationData,
    pub initial_molecule: Vec<MoleculeData>,
    pub optimization_spec: OptimizationSpecificationData,
    pub final_energies: BTreeMap<String, f64>,
    pub final_molecules: BTreeMap<String, MoleculeData>,
    pub optimization_history: BTreeMap<String, Vec<OptimizationResultData>>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default = "default_true")]
    pub success: bool,
    pub provenance: Provenance,
}

/// A validated torsion-drive result: the scan's per-angle energies and
/// molecules, plus every optimization run along the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorsionDriveResult {
    pub schema_name: String,
    pub schema_version: u32,
    pub keywords: TDKeywords,
    pub extras: Map<String, Value>,
    pub input_specification: AtomicSpecification,
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

impl TorsionDriveResult {
    pub fn new(data: TorsionDriveResultData) -> Result<Self, ValidationError> {
        let schema_name =
            expect_schema_name(data.schema_name.as_deref(), TORSION_DRIVE_OUTPUT_NAME)?;

        if !data.success {
            return Err(ValidationError::structural(
                "a torsion drive result requires success to be true",
            ));
        }

        let input_specification = AtomicSpecification::build(data.input_specification)?;
        if input_specification.driver != Driver::Gradient {
            return Err(ValidationError::structural(
                "a torsion drive's input specification requires the gradient driver",
            ));
        }

        let mut final_molecules = BTreeMap::new();
        for (angle, molecule) in data.final_molecules {
            final_molecules.insert(angle, Molecule::build(molecule)?);
        }

        let mut optimization_history = BTreeMap::new();
        for (angle, runs) in data.optimization_history {
            let runs = runs
                .into_iter()
                .map(OptimizationResult::new)
                .collect::<Result<Vec<_>, _>>()?;
            optimization_history.insert(angle, runs);
        }

        Ok(Self {
            schema_name: schema_name.to_string(),
            schema_version: 2,
            keywords: data.keywords,
            extras: data.extras,
            input_specification,
            initial_molecule: data
                .initial_molecule
                .into_iter()
                .map(Molecule::build)
                .collect::<Result<Vec<_>, _>>()?,
            optimization_spec: OptimizationSpecification::build(data.optimization_spec)?,
            final_energies: data.final_energies,
            final_molecules,
            optimization_history,
            stdout: data.stdout,
            stderr: data.stderr,
            success: data.success,
            provenance: data.provenance,
        })
    }
}
