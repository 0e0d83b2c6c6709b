//! Current-generation geometry-optimization records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ValidationError;
use crate::model::array::{validate_array, validate_scalar, ArrayLiteral, Dim, NumericArray};
use crate::model::common::{expect_schema_name, Provenance};
use crate::model::molecule::{Molecule, MoleculeData};
use crate::model::protocols::{OptimizationProtocols, OptimizationProtocolsData};
use crate::v2::atomic::{
    AtomicResult, AtomicResultData, AtomicResultProperties, AtomicResultPropertiesData,
    AtomicSpecification, AtomicSpecificationData,
};

/// Discriminator for the optimization specification wrapper.
pub const OPTIMIZATION_SPECIFICATION_NAME: &str = "qcschema_optimization_specification";
/// Discriminator for optimization input records.
pub const OPTIMIZATION_INPUT_NAME: &str = "qcschema_optimization_input";
/// Discriminator for optimization result records.
pub const OPTIMIZATION_OUTPUT_NAME: &str = "qcschema_optimization_output";

// ====  Specification  ==========================================================

/// Raw wire form of an [`OptimizationSpecification`].
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationSpecificationData {
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub keywords: Map<String, Value>,
    #[serde(default)]
    pub protocols: OptimizationProtocolsData,
    #[serde(default)]
    pub extras: Map<String, Value>,
    pub specification: AtomicSpecificationData,
}

/// How to run a geometry optimization: the optimizer program and keywords
/// wrapping the leaf specification for its per-step gradients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationSpecification {
    pub schema_name: String,
    pub program: String,
    pub keywords: Map<String, Value>,
    pub protocols: OptimizationProtocols,
    pub extras: Map<String, Value>,
    pub specification: AtomicSpecification,
}

impl OptimizationSpecification {
    pub fn build(data: OptimizationSpecificationData) -> Result<Self, ValidationError> {
        let schema_name =
            expect_schema_name(data.schema_name.as_deref(), OPTIMIZATION_SPECIFICATION_NAME)?;
        Ok(Self {
            schema_name: schema_name.to_string(),
            program: data.program.to_lowercase(),
            keywords: data.keywords,
            protocols: OptimizationProtocols::build(data.protocols)?,
            extras: data.extras,
            specification: AtomicSpecification::build(data.specification)?,
        })
    }
}

// ====  Input  ==================================================================

/// Raw wire form of an [`OptimizationInput`].
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationInputData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub specification: OptimizationSpecificationData,
    pub initial_molecule: MoleculeData,
    #[serde(default)]
    pub provenance: Option<Provenance>,
}

/// A validated geometry-optimization directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_name: String,
    pub schema_version: u32,
    pub specification: OptimizationSpecification,
    pub initial_molecule: Molecule,
    pub provenance: Provenance,
}

impl OptimizationInput {
    pub fn new(data: OptimizationInputData) -> Result<Self, ValidationError> {
        let schema_name = expect_schema_name(data.schema_name.as_deref(), OPTIMIZATION_INPUT_NAME)?;
        Ok(Self {
            id: data.id,
            schema_name: schema_name.to_string(),
            schema_version: 2,
            specification: OptimizationSpecification::build(data.specification)?,
            initial_molecule: Molecule::build(data.initial_molecule)?,
            provenance: data
                .provenance
                .unwrap_or_else(|| Provenance::stamp("v2.optimization.input")),
        })
    }
}

// ====  Properties  =============================================================

/// Raw wire form of [`OptimizationProperties`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizationPropertiesData {
    #[serde(default)]
    pub nuclear_repulsion_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub return_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub return_gradient: Option<ArrayLiteral>,
    #[serde(default)]
    pub optimization_iterations: Option<u32>,
}

/// Aggregate properties of a finished optimization: the final molecule's
/// energy and gradient, without replaying the trajectory.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OptimizationProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nuclear_repulsion_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_energy: Option<f64>,
    /// Shape `(natom, 3)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_gradient: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_iterations: Option<u32>,
}

impl OptimizationProperties {
    pub fn build(data: OptimizationPropertiesData) -> Result<Self, ValidationError> {
        Ok(Self {
            nuclear_repulsion_energy: data
                .nuclear_repulsion_energy
                .as_ref()
                .map(|l| validate_scalar::<f64>("nuclear_repulsion_energy", l))
                .transpose()?,
            return_energy: data
                .return_energy
                .as_ref()
                .map(|l| validate_scalar::<f64>("return_energy", l))
                .transpose()?,
            return_gradient: data
                .return_gradient
                .as_ref()
                .map(|l| {
                    validate_array::<f64>("return_gradient", l, &[Dim::Any, Dim::Fixed(3)])
                })
                .transpose()?,
            optimization_iterations: data.optimization_iterations,
        })
    }
}

// ====  Result  =================================================================

fn default_true() -> bool {
    true
}

/// Raw wire form of an [`OptimizationResult`].
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationResultData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub input_data: Option<OptimizationInputData>,
    #[serde(default)]
    pub final_molecule: Option<MoleculeData>,
    pub trajectory_results: Vec<AtomicResultData>,
    pub trajectory_properties: Vec<AtomicResultPropertiesData>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default = "default_true")]
    pub success: bool,
    pub provenance: Provenance,
    #[serde(default)]
    pub properties: Option<OptimizationPropertiesData>,
    #[serde(default)]
    pub extras: Map<String, Value>,
}

/// A validated geometry-optimization result.
///
/// The trajectory protocol chosen on the input's specification decides which
/// per-step results and properties survive; both companion sequences are
/// trimmed with the same retained indices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_name: String,
    pub schema_version: u32,
    pub input_data: OptimizationInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_molecule: Option<Molecule>,
    pub trajectory_results: Vec<AtomicResult>,
    pub trajectory_properties: Vec<AtomicResultProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    pub success: bool,
    pub provenance: Provenance,
    pub properties: OptimizationProperties,
    pub extras: Map<String, Value>,
}

impl OptimizationResult {
    pub fn new(data: OptimizationResultData) -> Result<Self, ValidationError> {
        let schema_name =
            expect_schema_name(data.schema_name.as_deref(), OPTIMIZATION_OUTPUT_NAME)?;

        // the trajectory protocol lives on the input's specification, so the
        // whole input must be bound before any trimming can run
        let input_data = match data.input_data {
            Some(input) => OptimizationInput::new(input)?,
            None => {
                return Err(ValidationError::cross_field(
                    "input data was not properly formed",
                ))
            }
        };

        if !data.success {
            return Err(ValidationError::structural(
                "an optimization result requires success to be true",
            ));
        }

        if data.trajectory_results.len() != data.trajectory_properties.len() {
            return Err(ValidationError::structural(format!(
                "trajectory_results ({}) and trajectory_properties ({}) must have the same length",
                data.trajectory_results.len(),
                data.trajectory_properties.len()
            )));
        }

        let trajectory_results = data
            .trajectory_results
            .into_iter()
            .map(AtomicResult::new)
            .collect::<Result<Vec<_>, _>>()?;
        let trajectory_properties = data
            .trajectory_properties
            .into_iter()
            .map(AtomicResultProperties::build)
            .collect::<Result<Vec<_>, _>>()?;

        let protocol = input_data.specification.protocols.trajectory;
        let retained = protocol.retained_indices(trajectory_results.len());
        trace!(
            protocol = protocol.as_str(),
            kept = retained.len(),
            of = trajectory_results.len(),
            "trimming optimization trajectory"
        );
        let (trajectory_results, trajectory_properties) =
            retain_companions(trajectory_results, trajectory_properties, &retained);

        Ok(Self {
            id: data.id,
            schema_name: schema_name.to_string(),
            schema_version: 2,
            input_data,
            final_molecule: data.final_molecule.map(Molecule::build).transpose()?,
            trajectory_results,
            trajectory_properties,
            stdout: data.stdout,
            stderr: data.stderr,
            success: data.success,
            provenance: data.provenance,
            properties: OptimizationProperties::build(data.properties.unwrap_or_default())?,
            extras: data.extras,
        })
    }
}

fn retain_companions<A, B>(
    results: Vec<A>,
    properties: Vec<B>,
    retained: &[usize],
) -> (Vec<A>, Vec<B>) {
    let mut results: Vec<Option<A>> = results.into_iter().map(Some).collect();
    let mut properties: Vec<Option<B>> = properties.into_iter().map(Some).collect();
    let kept_results = retained.iter().filter_map(|&i| results[i].take()).collect();
    let kept_properties = retained.iter().filter_map(|&i| properties[i].take()).collect();
    (kept_results, kept_properties)
}
