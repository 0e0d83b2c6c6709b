//! Current-generation single-point records.
//!
//! Construction is two-phase: a `*Data` struct binds every raw field off the
//! wire (phase 1, pure serde), then `new`/`build` runs cross-field
//! validation — protocol parsing, driver-dependent reshaping, wavefunction
//! trimming, and pointer resolution — against the fully-bound table
//! (phase 2). A validated record is immutable and all-or-nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ValidationError;
use crate::model::array::{validate_array, validate_scalar, ArrayLiteral, Dim, NumericArray};
use crate::model::basis::{BasisSet, BasisSetData};
use crate::model::common::{
    expect_schema_name, normalize_input_schema_name, normalize_result_schema_name, ComputeError,
    Driver, Model, Provenance, QCSCHEMA_INPUT, QCSCHEMA_OUTPUT,
};
use crate::model::molecule::{Molecule, MoleculeData};
use crate::model::protocols::{
    AtomicProtocols, AtomicProtocolsData, WavefunctionProtocol, WavefunctionRetention,
};

/// Discriminator for the leaf single-point specification.
pub const ATOMIC_SPECIFICATION_NAME: &str = "qcschema_atomic_specification";

// ====  Specification  ==========================================================

/// Raw wire form of an [`AtomicSpecification`].
#[derive(Debug, Clone, Deserialize)]
pub struct AtomicSpecificationData {
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub program: String,
    pub driver: Driver,
    pub model: Model,
    #[serde(default)]
    pub keywords: Map<String, Value>,
    #[serde(default)]
    pub protocols: AtomicProtocolsData,
    #[serde(default)]
    pub extras: Map<String, Value>,
}

/// How to run a single gradient/energy evaluation: program, driver, model,
/// keywords, and result protocols. Nested under optimization records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomicSpecification {
    pub schema_name: String,
    pub program: String,
    pub driver: Driver,
    pub model: Model,
    pub keywords: Map<String, Value>,
    pub protocols: AtomicProtocols,
    pub extras: Map<String, Value>,
}

impl AtomicSpecification {
    pub fn build(data: AtomicSpecificationData) -> Result<Self, ValidationError> {
        let schema_name =
            expect_schema_name(data.schema_name.as_deref(), ATOMIC_SPECIFICATION_NAME)?;
        Ok(Self {
            schema_name: schema_name.to_string(),
            program: data.program.to_lowercase(),
            driver: data.driver,
            model: data.model,
            keywords: data.keywords,
            protocols: AtomicProtocols::build(data.protocols)?,
            extras: data.extras,
        })
    }
}

// ====  Input  ==================================================================

/// Raw wire form of an [`AtomicInput`].
#[derive(Debug, Clone, Deserialize)]
pub struct AtomicInputData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub molecule: MoleculeData,
    pub driver: Driver,
    pub model: Model,
    #[serde(default)]
    pub keywords: Map<String, Value>,
    #[serde(default)]
    pub protocols: AtomicProtocolsData,
    #[serde(default)]
    pub extras: Map<String, Value>,
    #[serde(default)]
    pub provenance: Option<Provenance>,
}

/// A validated single-point computation directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomicInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_name: String,
    pub schema_version: u32,
    pub molecule: Molecule,
    pub driver: Driver,
    pub model: Model,
    pub keywords: Map<String, Value>,
    pub protocols: AtomicProtocols,
    pub extras: Map<String, Value>,
    pub provenance: Provenance,
}

impl AtomicInput {
    pub fn new(data: AtomicInputData) -> Result<Self, ValidationError> {
        let schema_name = match data.schema_name.as_deref() {
            Some(raw) => normalize_input_schema_name(raw)?,
            None => QCSCHEMA_INPUT,
        };
        Ok(Self {
            id: data.id,
            schema_name: schema_name.to_string(),
            // version is stamped, not trusted, so a relabeled record from a
            // different generation still lands on this one
            schema_version: 2,
            molecule: Molecule::build(data.molecule)?,
            driver: data.driver,
            model: data.model,
            keywords: data.keywords,
            protocols: AtomicProtocols::build(data.protocols)?,
            extras: data.extras,
            provenance: data
                .provenance
                .unwrap_or_else(|| Provenance::stamp("v2.atomic.input")),
        })
    }
}

// ====  Properties  =============================================================

/// Raw wire form of [`AtomicResultProperties`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AtomicResultPropertiesData {
    #[serde(default)]
    pub calcinfo_nbasis: Option<u32>,
    #[serde(default)]
    pub calcinfo_nmo: Option<u32>,
    #[serde(default)]
    pub calcinfo_nalpha: Option<u32>,
    #[serde(default)]
    pub calcinfo_nbeta: Option<u32>,
    #[serde(default)]
    pub calcinfo_natom: Option<u32>,
    #[serde(default)]
    pub nuclear_repulsion_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub return_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub return_gradient: Option<ArrayLiteral>,
    #[serde(default)]
    pub return_hessian: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_one_electron_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_two_electron_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_xc_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_dispersion_correction_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_dipole_moment: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_quadrupole_moment: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_total_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_total_gradient: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_total_hessian: Option<ArrayLiteral>,
    #[serde(default)]
    pub scf_iterations: Option<u32>,
    #[serde(default)]
    pub mp2_same_spin_correlation_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub mp2_opposite_spin_correlation_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub mp2_correlation_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub mp2_total_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub mp2_dipole_moment: Option<ArrayLiteral>,
    #[serde(default)]
    pub ccsd_correlation_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub ccsd_total_energy: Option<ArrayLiteral>,
    #[serde(default)]
    pub ccsd_dipole_moment: Option<ArrayLiteral>,
    #[serde(default)]
    pub ccsd_iterations: Option<u32>,
}

/// Named properties of a single-point computation.
///
/// Arrays are stored shaped but serialize flat; unset properties are skipped
/// entirely on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AtomicResultProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcinfo_nbasis: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcinfo_nmo: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcinfo_nalpha: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcinfo_nbeta: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcinfo_natom: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nuclear_repulsion_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_energy: Option<f64>,
    /// Shape `(natom, 3)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_gradient: Option<NumericArray<f64>>,
    /// Shape `(3·natom, 3·natom)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_hessian: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_one_electron_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_two_electron_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_xc_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_dispersion_correction_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_dipole_moment: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_quadrupole_moment: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_total_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_total_gradient: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_total_hessian: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mp2_same_spin_correlation_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mp2_opposite_spin_correlation_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mp2_correlation_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mp2_total_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mp2_dipole_moment: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccsd_correlation_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccsd_total_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccsd_dipole_moment: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccsd_iterations: Option<u32>,
}

fn scalar_opt(
    field: &'static str,
    literal: Option<ArrayLiteral>,
) -> Result<Option<f64>, ValidationError> {
    literal
        .as_ref()
        .map(|l| validate_scalar::<f64>(field, l))
        .transpose()
}

fn pole_opt(
    field: &'static str,
    literal: Option<ArrayLiteral>,
    order: usize,
) -> Result<Option<NumericArray<f64>>, ValidationError> {
    let pattern = vec![Dim::Fixed(3); order];
    literal
        .as_ref()
        .map(|l| validate_array::<f64>(field, l, &pattern))
        .transpose()
}

#[derive(Clone, Copy)]
enum DerivativeKind {
    Gradient,
    Hessian,
}

fn derivative_opt(
    field: &'static str,
    literal: Option<ArrayLiteral>,
    natom: Option<u32>,
    kind: DerivativeKind,
) -> Result<Option<NumericArray<f64>>, ValidationError> {
    let Some(literal) = literal else {
        return Ok(None);
    };
    let nat = natom.ok_or_else(|| {
        ValidationError::cross_field(format!(
            "`{field}` requires `calcinfo_natom` to also be set"
        ))
    })? as usize;
    let pattern = match kind {
        DerivativeKind::Gradient => vec![Dim::Fixed(nat), Dim::Fixed(3)],
        DerivativeKind::Hessian => vec![Dim::Fixed(3 * nat), Dim::Fixed(3 * nat)],
    };
    Ok(Some(validate_array::<f64>(field, &literal, &pattern)?))
}

impl AtomicResultProperties {
    pub fn build(data: AtomicResultPropertiesData) -> Result<Self, ValidationError> {
        let natom = data.calcinfo_natom;
        Ok(Self {
            calcinfo_nbasis: data.calcinfo_nbasis,
            calcinfo_nmo: data.calcinfo_nmo,
            calcinfo_nalpha: data.calcinfo_nalpha,
            calcinfo_nbeta: data.calcinfo_nbeta,
            calcinfo_natom: natom,
            nuclear_repulsion_energy: scalar_opt(
                "nuclear_repulsion_energy",
                data.nuclear_repulsion_energy,
            )?,
            return_energy: scalar_opt("return_energy", data.return_energy)?,
            return_gradient: derivative_opt(
                "return_gradient",
                data.return_gradient,
                natom,
                DerivativeKind::Gradient,
            )?,
            return_hessian: derivative_opt(
                "return_hessian",
                data.return_hessian,
                natom,
                DerivativeKind::Hessian,
            )?,
            scf_one_electron_energy: scalar_opt(
                "scf_one_electron_energy",
                data.scf_one_electron_energy,
            )?,
            scf_two_electron_energy: scalar_opt(
                "scf_two_electron_energy",
                data.scf_two_electron_energy,
            )?,
            scf_xc_energy: scalar_opt("scf_xc_energy", data.scf_xc_energy)?,
            scf_dispersion_correction_energy: scalar_opt(
                "scf_dispersion_correction_energy",
                data.scf_dispersion_correction_energy,
            )?,
            scf_dipole_moment: pole_opt("scf_dipole_moment", data.scf_dipole_moment, 1)?,
            scf_quadrupole_moment: pole_opt(
                "scf_quadrupole_moment",
                data.scf_quadrupole_moment,
                2,
            )?,
            scf_total_energy: scalar_opt("scf_total_energy", data.scf_total_energy)?,
            scf_total_gradient: derivative_opt(
                "scf_total_gradient",
                data.scf_total_gradient,
                natom,
                DerivativeKind::Gradient,
            )?,
            scf_total_hessian: derivative_opt(
                "scf_total_hessian",
                data.scf_total_hessian,
                natom,
                DerivativeKind::Hessian,
            )?,
            scf_iterations: data.scf_iterations,
            mp2_same_spin_correlation_energy: scalar_opt(
                "mp2_same_spin_correlation_energy",
                data.mp2_same_spin_correlation_energy,
            )?,
            mp2_opposite_spin_correlation_energy: scalar_opt(
                "mp2_opposite_spin_correlation_energy",
                data.mp2_opposite_spin_correlation_energy,
            )?,
            mp2_correlation_energy: scalar_opt(
                "mp2_correlation_energy",
                data.mp2_correlation_energy,
            )?,
            mp2_total_energy: scalar_opt("mp2_total_energy", data.mp2_total_energy)?,
            mp2_dipole_moment: pole_opt("mp2_dipole_moment", data.mp2_dipole_moment, 1)?,
            ccsd_correlation_energy: scalar_opt(
                "ccsd_correlation_energy",
                data.ccsd_correlation_energy,
            )?,
            ccsd_total_energy: scalar_opt("ccsd_total_energy", data.ccsd_total_energy)?,
            ccsd_dipole_moment: pole_opt("ccsd_dipole_moment", data.ccsd_dipole_moment, 1)?,
            ccsd_iterations: data.ccsd_iterations,
        })
    }
}

// ====  Wavefunction  ===========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuantityShape {
    /// Rank 1, any length.
    Vector,
    /// `(nbf, -1)`.
    OrbitalMatrix,
    /// `(nbf, nbf)`.
    Matrix,
}

/// Backing quantity names and the shape the schema documents for each.
const QUANTITIES: &[(&str, QuantityShape)] = &[
    ("h_core_a", QuantityShape::Matrix),
    ("h_core_b", QuantityShape::Matrix),
    ("h_effective_a", QuantityShape::Matrix),
    ("h_effective_b", QuantityShape::Matrix),
    ("scf_orbitals_a", QuantityShape::OrbitalMatrix),
    ("scf_orbitals_b", QuantityShape::OrbitalMatrix),
    ("scf_density_a", QuantityShape::Matrix),
    ("scf_density_b", QuantityShape::Matrix),
    ("scf_fock_a", QuantityShape::Matrix),
    ("scf_fock_b", QuantityShape::Matrix),
    ("scf_eigenvalues_a", QuantityShape::Vector),
    ("scf_eigenvalues_b", QuantityShape::Vector),
    ("scf_occupations_a", QuantityShape::Vector),
    ("scf_occupations_b", QuantityShape::Vector),
];

/// Pointer fields naming the backing quantity of the primary return.
const POINTER_FIELDS: &[&str] = &[
    "orbitals_a",
    "orbitals_b",
    "density_a",
    "density_b",
    "fock_a",
    "fock_b",
    "eigenvalues_a",
    "eigenvalues_b",
    "occupations_a",
    "occupations_b",
];

/// Raw wire form of [`WavefunctionProperties`].
///
/// Everything beyond the basis and the restriction flag binds into a plain
/// name → value table; quantities and pointers are picked out of it by name
/// once the whole payload is bound.
#[derive(Debug, Clone, Deserialize)]
pub struct WavefunctionData {
    pub basis: BasisSetData,
    #[serde(default)]
    pub restricted: Option<bool>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Wavefunction payload retained by a computation.
///
/// Matrix quantities are stored against the basis dimension `nbf`. Pointer
/// fields name the sibling quantity holding the primary return; a pointer is
/// never retained without its backing quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WavefunctionProperties {
    pub basis: BasisSet,
    pub restricted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_core_a: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_core_b: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_effective_a: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_effective_b: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_orbitals_a: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_orbitals_b: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_density_a: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_density_b: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_fock_a: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_fock_b: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_eigenvalues_a: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_eigenvalues_b: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_occupations_a: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scf_occupations_b: Option<NumericArray<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbitals_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbitals_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fock_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fock_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eigenvalues_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eigenvalues_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupations_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupations_b: Option<String>,
}

impl WavefunctionProperties {
    fn empty(basis: BasisSet, restricted: bool) -> Self {
        Self {
            basis,
            restricted,
            h_core_a: None,
            h_core_b: None,
            h_effective_a: None,
            h_effective_b: None,
            scf_orbitals_a: None,
            scf_orbitals_b: None,
            scf_density_a: None,
            scf_density_b: None,
            scf_fock_a: None,
            scf_fock_b: None,
            scf_eigenvalues_a: None,
            scf_eigenvalues_b: None,
            scf_occupations_a: None,
            scf_occupations_b: None,
            orbitals_a: None,
            orbitals_b: None,
            density_a: None,
            density_b: None,
            fock_a: None,
            fock_b: None,
            eigenvalues_a: None,
            eigenvalues_b: None,
            occupations_a: None,
            occupations_b: None,
        }
    }

    /// The backing quantity bound under `name`, if any.
    pub fn quantity(&self, name: &str) -> Option<&NumericArray<f64>> {
        match name {
            "h_core_a" => self.h_core_a.as_ref(),
            "h_core_b" => self.h_core_b.as_ref(),
            "h_effective_a" => self.h_effective_a.as_ref(),
            "h_effective_b" => self.h_effective_b.as_ref(),
            "scf_orbitals_a" => self.scf_orbitals_a.as_ref(),
            "scf_orbitals_b" => self.scf_orbitals_b.as_ref(),
            "scf_density_a" => self.scf_density_a.as_ref(),
            "scf_density_b" => self.scf_density_b.as_ref(),
            "scf_fock_a" => self.scf_fock_a.as_ref(),
            "scf_fock_b" => self.scf_fock_b.as_ref(),
            "scf_eigenvalues_a" => self.scf_eigenvalues_a.as_ref(),
            "scf_eigenvalues_b" => self.scf_eigenvalues_b.as_ref(),
            "scf_occupations_a" => self.scf_occupations_a.as_ref(),
            "scf_occupations_b" => self.scf_occupations_b.as_ref(),
            _ => None,
        }
    }

    /// The pointer bound under `name`, if any.
    pub fn pointer(&self, name: &str) -> Option<&str> {
        match name {
            "orbitals_a" => self.orbitals_a.as_deref(),
            "orbitals_b" => self.orbitals_b.as_deref(),
            "density_a" => self.density_a.as_deref(),
            "density_b" => self.density_b.as_deref(),
            "fock_a" => self.fock_a.as_deref(),
            "fock_b" => self.fock_b.as_deref(),
            "eigenvalues_a" => self.eigenvalues_a.as_deref(),
            "eigenvalues_b" => self.eigenvalues_b.as_deref(),
            "occupations_a" => self.occupations_a.as_deref(),
            "occupations_b" => self.occupations_b.as_deref(),
            _ => None,
        }
    }

    /// Resolves a pointer field to the array it names.
    pub fn resolve_pointer(&self, name: &str) -> Result<&NumericArray<f64>, ValidationError> {
        let target = self
            .pointer(name)
            .ok_or_else(|| ValidationError::reference(name, "<unset>"))?;
        self.quantity(target)
            .ok_or_else(|| ValidationError::reference(name, target))
    }

    fn set_quantity(&mut self, name: &str, value: NumericArray<f64>) {
        match name {
            "h_core_a" => self.h_core_a = Some(value),
            "h_core_b" => self.h_core_b = Some(value),
            "h_effective_a" => self.h_effective_a = Some(value),
            "h_effective_b" => self.h_effective_b = Some(value),
            "scf_orbitals_a" => self.scf_orbitals_a = Some(value),
            "scf_orbitals_b" => self.scf_orbitals_b = Some(value),
            "scf_density_a" => self.scf_density_a = Some(value),
            "scf_density_b" => self.scf_density_b = Some(value),
            "scf_fock_a" => self.scf_fock_a = Some(value),
            "scf_fock_b" => self.scf_fock_b = Some(value),
            "scf_eigenvalues_a" => self.scf_eigenvalues_a = Some(value),
            "scf_eigenvalues_b" => self.scf_eigenvalues_b = Some(value),
            "scf_occupations_a" => self.scf_occupations_a = Some(value),
            "scf_occupations_b" => self.scf_occupations_b = Some(value),
            _ => {}
        }
    }

    fn set_pointer(&mut self, name: &str, value: String) {
        match name {
            "orbitals_a" => self.orbitals_a = Some(value),
            "orbitals_b" => self.orbitals_b = Some(value),
            "density_a" => self.density_a = Some(value),
            "density_b" => self.density_b = Some(value),
            "fock_a" => self.fock_a = Some(value),
            "fock_b" => self.fock_b = Some(value),
            "eigenvalues_a" => self.eigenvalues_a = Some(value),
            "eigenvalues_b" => self.eigenvalues_b = Some(value),
            "occupations_a" => self.occupations_a = Some(value),
            "occupations_b" => self.occupations_b = Some(value),
            _ => {}
        }
    }
}

fn quantity_shape(name: &str) -> Option<QuantityShape> {
    QUANTITIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, shape)| *shape)
}

fn coerce_quantity(
    name: &str,
    literal: &ArrayLiteral,
    shape: QuantityShape,
    nbf: usize,
) -> Result<NumericArray<f64>, ValidationError> {
    let pattern = match shape {
        QuantityShape::Vector => vec![Dim::Any],
        QuantityShape::OrbitalMatrix => vec![Dim::Fixed(nbf), Dim::Any],
        QuantityShape::Matrix => vec![Dim::Fixed(nbf), Dim::Fixed(nbf)],
    };
    validate_array::<f64>(name, literal, &pattern)
}

/// A pointer's documented shape must agree with the resolved array's rank:
/// eigenvalue/occupation pointers name vectors, all others matrices.
fn check_pointer_rank(pointer: &str, array: &NumericArray<f64>) -> Result<(), ValidationError> {
    let wants_vector = pointer.starts_with("eigenvalues") || pointer.starts_with("occupations");
    let expected_rank = if wants_vector { 1 } else { 2 };
    if array.rank() != expected_rank {
        let shape = if wants_vector { "(-1,)" } else { "(nbf, -1)" };
        return Err(ValidationError::shape(pointer, shape));
    }
    Ok(())
}

/// Builds the retained wavefunction payload for a result record.
///
/// Runs strictly after the sibling `protocols` field is bound. Order within:
/// spin-restriction collapse (every `_b` entry drops when restricted), then
/// protocol trimming, then pointer resolution over the survivors.
pub(crate) fn build_wavefunction(
    data: WavefunctionData,
    protocol: WavefunctionProtocol,
) -> Result<Option<WavefunctionProperties>, ValidationError> {
    let basis = BasisSet::build(data.basis)?;
    let restricted = data.restricted.ok_or_else(|| {
        ValidationError::cross_field("wavefunction data was not properly formed: `restricted` is required")
    })?;
    let nbf = basis.nbf;

    // phase-1 table: bound raw fields, keyed by name
    let mut raw_quantities: BTreeMap<&'static str, ArrayLiteral> = BTreeMap::new();
    for (name, _) in QUANTITIES {
        if let Some(value) = data.fields.get(*name) {
            if value.is_null() {
                continue;
            }
            let literal: ArrayLiteral = serde_json::from_value(value.clone())
                .map_err(|_| ValidationError::type_coercion("float", value))?;
            raw_quantities.insert(*name, literal);
        }
    }
    let mut raw_pointers: BTreeMap<&'static str, String> = BTreeMap::new();
    for name in POINTER_FIELDS {
        if let Some(value) = data.fields.get(*name) {
            if value.is_null() {
                continue;
            }
            let target = value.as_str().ok_or_else(|| {
                ValidationError::structural(format!("`{name}` must name a sibling quantity"))
            })?;
            raw_pointers.insert(*name, target.to_string());
        }
    }

    if restricted {
        raw_quantities.retain(|name, _| !name.ends_with("_b"));
        raw_pointers.retain(|name, _| !name.ends_with("_b"));
    }

    let retention = protocol.retention();
    trace!(protocol = protocol.as_str(), restricted, "trimming wavefunction payload");

    match retention {
        WavefunctionRetention::Nothing => Ok(None),
        WavefunctionRetention::All => {
            let mut wfn = WavefunctionProperties::empty(basis, restricted);
            for (name, shape) in QUANTITIES {
                if let Some(literal) = raw_quantities.get(*name) {
                    let array = coerce_quantity(name, literal, *shape, nbf)?;
                    wfn.set_quantity(name, array);
                }
            }
            for name in POINTER_FIELDS {
                if let Some(target) = raw_pointers.get(*name) {
                    let array = wfn
                        .quantity(target)
                        .ok_or_else(|| ValidationError::reference(*name, target.clone()))?;
                    check_pointer_rank(name, array)?;
                    wfn.set_pointer(name, target.clone());
                }
            }
            Ok(Some(wfn))
        }
        WavefunctionRetention::Pointers(pointer_set) => {
            let mut wfn = WavefunctionProperties::empty(basis, restricted);
            for name in pointer_set {
                let Some(target) = raw_pointers.get(*name) else {
                    continue;
                };
                let shape = quantity_shape(target).ok_or_else(|| {
                    ValidationError::reference(*name, target.clone())
                })?;
                let literal = raw_quantities
                    .get(target.as_str())
                    .ok_or_else(|| ValidationError::reference(*name, target.clone()))?;
                let array = coerce_quantity(target, literal, shape, nbf)?;
                check_pointer_rank(name, &array)?;
                wfn.set_quantity(target, array);
                wfn.set_pointer(name, target.clone());
            }
            Ok(Some(wfn))
        }
    }
}

// ====  Result  =================================================================

/// Raw wire form of the primary return.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReturnResultData {
    Literal(ArrayLiteral),
    Map(Map<String, Value>),
}

/// The primary return specified by the driver: scalar for energy, array for
/// gradient or hessian, property map for properties drivers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReturnResult {
    Scalar(f64),
    Array(NumericArray<f64>),
    Map(Map<String, Value>),
}

fn validate_return_result(
    driver: Driver,
    data: ReturnResultData,
) -> Result<ReturnResult, ValidationError> {
    let literal = match data {
        ReturnResultData::Map(map) => return Ok(ReturnResult::Map(map)),
        ReturnResultData::Literal(literal) => literal,
    };
    match driver {
        Driver::Energy => {
            let array = validate_array::<f64>("return_result", &literal, &[Dim::Any])?;
            Ok(match array.scalar() {
                Some(value) => ReturnResult::Scalar(value),
                None => ReturnResult::Array(array),
            })
        }
        Driver::Gradient => Ok(ReturnResult::Array(validate_array::<f64>(
            "return_result",
            &literal,
            &[Dim::Any, Dim::Fixed(3)],
        )?)),
        Driver::Hessian => {
            let array = validate_array::<f64>("return_result", &literal, &[Dim::Any])?;
            let side = (array.len() as f64).sqrt().round() as usize;
            Ok(ReturnResult::Array(
                array.cast("return_result", &[Dim::Fixed(side), Dim::Fixed(side)])?,
            ))
        }
        Driver::Properties => Ok(ReturnResult::Array(validate_array::<f64>(
            "return_result",
            &literal,
            &[Dim::Any],
        )?)),
    }
}

/// Raw wire form of an [`AtomicResult`].
#[derive(Debug, Clone, Deserialize)]
pub struct AtomicResultData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub molecule: MoleculeData,
    pub driver: Driver,
    pub model: Model,
    #[serde(default)]
    pub keywords: Map<String, Value>,
    #[serde(default)]
    pub protocols: AtomicProtocolsData,
    #[serde(default)]
    pub extras: Map<String, Value>,
    #[serde(default)]
    pub properties: Option<AtomicResultPropertiesData>,
    #[serde(default)]
    pub wavefunction: Option<WavefunctionData>,
    pub return_result: ReturnResultData,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub native_files: BTreeMap<String, Value>,
    pub success: bool,
    #[serde(default)]
    pub error: Option<ComputeError>,
    pub provenance: Provenance,
}

/// A validated single-point computation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomicResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_name: String,
    pub schema_version: u32,
    pub molecule: Molecule,
    pub driver: Driver,
    pub model: Model,
    pub keywords: Map<String, Value>,
    pub protocols: AtomicProtocols,
    pub extras: Map<String, Value>,
    pub properties: AtomicResultProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wavefunction: Option<WavefunctionProperties>,
    pub return_result: ReturnResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    pub native_files: BTreeMap<String, Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ComputeError>,
    pub provenance: Provenance,
}

impl AtomicResult {
    /// Validates a raw result, applying every protocol the record selected.
    pub fn new(data: AtomicResultData) -> Result<Self, ValidationError> {
        let schema_name = match data.schema_name.as_deref() {
            Some(raw) => normalize_result_schema_name(raw)?,
            None => QCSCHEMA_OUTPUT,
        };
        // protocols bind first: wavefunction, stdout, and native-files
        // retention all consult them
        let protocols = AtomicProtocols::build(data.protocols)?;

        let molecule = Molecule::build(data.molecule)?;
        let properties = AtomicResultProperties::build(data.properties.unwrap_or_default())?;
        let return_result = validate_return_result(data.driver, data.return_result)?;

        let wavefunction = match data.wavefunction {
            Some(wfn) => build_wavefunction(wfn, protocols.wavefunction)?,
            None => None,
        };

        let stdout = if protocols.stdout { data.stdout } else { None };
        let native_files = protocols.native_files.apply(data.native_files);

        Ok(Self {
            id: data.id,
            schema_name: schema_name.to_string(),
            schema_version: 2,
            molecule,
            driver: data.driver,
            model: data.model,
            keywords: data.keywords,
            protocols,
            extras: data.extras,
            properties,
            wavefunction,
            return_result,
            stdout,
            stderr: data.stderr,
            native_files,
            success: data.success,
            error: data.error,
            provenance: data.provenance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_data_json() -> Value {
        json!({
            "molecule": {
                "symbols": ["O", "H", "H"],
                "geometry": [0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 0.0]
            },
            "driver": "energy",
            "model": {"method": "UFF"},
            "return_result": 5,
            "success": true,
            "properties": {},
            "provenance": {"creator": "qcel"},
            "stdout": "I ran."
        })
    }

    fn basis_json() -> Value {
        // one s + one p spherical shell on a single mapped center: nbf = 4
        json!({
            "name": "custom_basis",
            "center_data": {
                "c": {
                    "electron_shells": [
                        {
                            "harmonic_type": "spherical",
                            "angular_momentum": [0],
                            "exponents": [1.0, 0.5],
                            "coefficients": [[0.6, 0.4]]
                        },
                        {
                            "harmonic_type": "spherical",
                            "angular_momentum": [1],
                            "exponents": [0.8],
                            "coefficients": [[1.0]]
                        }
                    ]
                }
            },
            "atom_map": ["c"]
        })
    }

    const NBF: usize = 4;

    fn matrix(rows: usize, cols: usize) -> Value {
        let flat: Vec<f64> = (0..rows * cols).map(|i| i as f64).collect();
        json!(flat)
    }

    fn vector(len: usize) -> Value {
        let flat: Vec<f64> = (0..len).map(|i| i as f64 * 0.5).collect();
        json!(flat)
    }

    fn wavefunction_data_json() -> Value {
        let mut data = result_data_json();
        data["protocols"] = json!({"wavefunction": "all"});
        data["wavefunction"] = json!({
            "basis": basis_json(),
            "restricted": true,
            "scf_orbitals_a": matrix(NBF, NBF),
            "orbitals_a": "scf_orbitals_a"
        });
        data
    }

    fn build_result(value: Value) -> Result<AtomicResult, ValidationError> {
        let data: AtomicResultData = serde_json::from_value(value).unwrap();
        AtomicResult::new(data)
    }

    #[test]
    fn result_build() {
        let ret = build_result(result_data_json()).unwrap();
        assert!(ret.wavefunction.is_none());
        assert_eq!(ret.schema_name, "qcschema_output");
        assert_eq!(ret.schema_version, 2);
        assert_eq!(ret.return_result, ReturnResult::Scalar(5.0));
        assert_eq!(ret.stdout.as_deref(), Some("I ran."));
    }

    #[test]
    fn input_schema_name_normalizes() {
        let data: AtomicInputData = serde_json::from_value(json!({
            "schema_name": "qc_schema_input",
            "molecule": {"symbols": ["O"], "geometry": [0.0, 0.0, 0.0]},
            "driver": "energy",
            "model": {"method": "UFF"},
        }))
        .unwrap();
        let input = AtomicInput::new(data).unwrap();
        assert_eq!(input.schema_name, "qcschema_input");
        assert_eq!(input.schema_version, 2);
        assert_eq!(input.provenance.creator, "qcrecords");
    }

    #[test]
    fn wavefunction_build() {
        let ret = build_result(wavefunction_data_json()).unwrap();
        let wfn = ret.wavefunction.unwrap();
        assert_eq!(wfn.basis.nbf, NBF);
        assert!(wfn.restricted);
        assert_eq!(wfn.scf_orbitals_a.as_ref().unwrap().shape(), &[NBF, NBF]);
        assert_eq!(wfn.resolve_pointer("orbitals_a").unwrap().shape(), &[NBF, NBF]);
    }

    #[test]
    fn wavefunction_dropped_without_protocol() {
        let mut data = wavefunction_data_json();
        data.as_object_mut().unwrap().remove("protocols");
        let ret = build_result(data).unwrap();
        assert!(ret.wavefunction.is_none());
    }

    #[test]
    fn wavefunction_matrix_size_error() {
        let mut data = wavefunction_data_json();
        data["wavefunction"]["scf_orbitals_a"] = matrix(2, 2);
        let err = build_result(data).unwrap_err();
        assert!(err.to_string().contains("castable to shape"));
    }

    #[test]
    fn wavefunction_pointer_target_must_exist() {
        let mut data = wavefunction_data_json();
        data["wavefunction"].as_object_mut().unwrap().remove("scf_orbitals_a");
        let err = build_result(data).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn wavefunction_missing_restricted() {
        let mut data = wavefunction_data_json();
        data["wavefunction"].as_object_mut().unwrap().remove("restricted");
        let err = build_result(data).unwrap_err();
        assert!(matches!(err, ValidationError::CrossFieldDependency(_)));
    }

    fn run_wavefunction_protocol(
        protocol: Option<&str>,
        restricted: bool,
        provided: &[&str],
    ) -> AtomicResult {
        let mut data = result_data_json();
        match protocol {
            Some(p) => data["protocols"] = json!({"wavefunction": p}),
            None => {}
        }
        let mut wfn = json!({
            "basis": basis_json(),
            "restricted": restricted,
        });
        for name in provided {
            let backing = format!("scf_{name}");
            wfn[*name] = json!(backing.clone());
            if name.contains("eigen") || name.contains("occupations") {
                wfn[backing] = vector(NBF);
            } else {
                wfn[backing] = matrix(NBF, NBF);
            }
        }
        data["wavefunction"] = wfn;
        build_result(data).unwrap()
    }

    #[test]
    fn wavefunction_protocols_trim_to_expected_keys() {
        let cases: Vec<(Option<&str>, bool, Vec<&str>, Vec<&str>)> = vec![
            (Some("none"), true, vec!["orbitals_a", "orbitals_b"], vec![]),
            (None, true, vec!["orbitals_a", "orbitals_b"], vec![]),
            (
                Some("all"),
                false,
                vec!["orbitals_a", "orbitals_b"],
                vec!["orbitals_a", "orbitals_b"],
            ),
            (Some("all"), true, vec!["orbitals_a", "orbitals_b"], vec!["orbitals_a"]),
            (
                Some("orbitals_and_eigenvalues"),
                false,
                vec!["orbitals_a", "orbitals_b", "fock_a", "fock_b"],
                vec!["orbitals_a", "orbitals_b"],
            ),
            (
                Some("orbitals_and_eigenvalues"),
                true,
                vec!["orbitals_a", "orbitals_b", "eigenvalues_a", "fock_a", "fock_b"],
                vec!["orbitals_a", "eigenvalues_a"],
            ),
            (
                Some("return_results"),
                true,
                vec!["orbitals_a", "fock_a", "fock_b"],
                vec!["orbitals_a", "fock_a"],
            ),
            (
                Some("occupations_and_eigenvalues"),
                true,
                vec![
                    "orbitals_a",
                    "orbitals_b",
                    "occupations_a",
                    "occupations_b",
                    "eigenvalues_a",
                    "eigenvalues_b",
                ],
                vec!["occupations_a", "eigenvalues_a"],
            ),
            (
                Some("occupations_and_eigenvalues"),
                false,
                vec![
                    "orbitals_a",
                    "orbitals_b",
                    "occupations_a",
                    "occupations_b",
                    "eigenvalues_a",
                    "eigenvalues_b",
                ],
                vec!["occupations_a", "occupations_b", "eigenvalues_a", "eigenvalues_b"],
            ),
        ];

        for (protocol, restricted, provided, expected) in cases {
            let ret = run_wavefunction_protocol(protocol, restricted, &provided);
            if expected.is_empty() {
                assert!(ret.wavefunction.is_none(), "case {protocol:?}/{restricted}");
                continue;
            }
            let wfn = ret.wavefunction.expect("wavefunction retained");
            let keys: std::collections::BTreeSet<String> = serde_json::to_value(&wfn)
                .unwrap()
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect();
            let mut expected_keys: std::collections::BTreeSet<String> =
                ["basis", "restricted"].iter().map(|s| s.to_string()).collect();
            for name in &expected {
                expected_keys.insert(name.to_string());
                expected_keys.insert(format!("scf_{name}"));
            }
            assert_eq!(keys, expected_keys, "case {protocol:?}/{restricted}");
        }
    }

    #[test]
    fn native_files_protocols() {
        let files = json!({
            "input": "task scf energy",
            "DIPOL": "0.0 0.0 0.0",
            "gms.dat": "$DATA"
        });
        let cases: Vec<(Option<&str>, Vec<&str>, Vec<&str>)> = vec![
            (Some("none"), vec!["input", "gms.dat", "DIPOL"], vec![]),
            (None, vec!["input", "gms.dat", "DIPOL"], vec![]),
            (Some("input"), vec!["input", "gms.dat", "DIPOL"], vec!["input"]),
            (
                Some("all"),
                vec!["input", "gms.dat", "DIPOL"],
                vec!["DIPOL", "gms.dat", "input"],
            ),
            (Some("all"), vec!["DIPOL"], vec!["DIPOL"]),
            (Some("input"), vec!["gms.dat"], vec!["input"]),
        ];

        for (protocol, provided, expected) in cases {
            let mut data = result_data_json();
            if let Some(p) = protocol {
                data["protocols"] = json!({"native_files": p});
            }
            let mut native = Map::new();
            for name in &provided {
                native.insert(name.to_string(), files[*name].clone());
            }
            data["native_files"] = Value::Object(native);

            let ret = build_result(data).unwrap();
            let keys: Vec<&str> = ret.native_files.keys().map(String::as_str).collect();
            assert_eq!(keys, expected, "case {protocol:?}/{provided:?}");
        }
    }

    #[test]
    fn stdout_protocol() {
        let mut data = result_data_json();
        data["protocols"] = json!({"stdout": false});
        let ret = build_result(data).unwrap();
        assert!(ret.stdout.is_none());

        let ret = build_result(result_data_json()).unwrap();
        assert_eq!(ret.stdout.as_deref(), Some("I ran."));
    }

    #[test]
    fn return_result_by_driver() {
        let mut data = result_data_json();
        data["return_result"] = json!([5.0]);
        let ret = build_result(data).unwrap();
        assert_eq!(ret.return_result, ReturnResult::Scalar(5.0));

        let mut data = result_data_json();
        data["driver"] = json!("gradient");
        data["return_result"] = json!([0.0, 0.0, 0.1, 0.0, 0.0, -0.1]);
        let ret = build_result(data).unwrap();
        match ret.return_result {
            ReturnResult::Array(ref arr) => assert_eq!(arr.shape(), &[2, 3]),
            ref other => panic!("unexpected {other:?}"),
        }

        let mut data = result_data_json();
        data["driver"] = json!("hessian");
        data["return_result"] = json!((0..16).map(|i| i as f64).collect::<Vec<_>>());
        let ret = build_result(data).unwrap();
        match ret.return_result {
            ReturnResult::Array(ref arr) => assert_eq!(arr.shape(), &[4, 4]),
            ref other => panic!("unexpected {other:?}"),
        }

        let mut data = result_data_json();
        data["driver"] = json!("hessian");
        data["return_result"] = json!([1.0, 2.0, 3.0]);
        assert!(build_result(data).is_err());
    }

    #[test]
    fn properties_array_shapes() {
        let data: AtomicResultPropertiesData = serde_json::from_value(json!({
            "scf_one_electron_energy": "-5.0",
            "scf_dipole_moment": [1, 2, 3],
            "scf_quadrupole_moment": [1, 2, 3, 2, 4, 5, 3, 5, 6]
        }))
        .unwrap();
        let props = AtomicResultProperties::build(data).unwrap();

        assert_eq!(props.scf_one_electron_energy, Some(-5.0));
        assert_eq!(props.scf_dipole_moment.as_ref().unwrap().shape(), &[3]);
        assert_eq!(props.scf_quadrupole_moment.as_ref().unwrap().shape(), &[3, 3]);

        let json = serde_json::to_value(&props).unwrap();
        let keys: std::collections::BTreeSet<&str> =
            json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["scf_dipole_moment", "scf_one_electron_energy", "scf_quadrupole_moment"]
                .into_iter()
                .collect()
        );
        assert_eq!(json["scf_quadrupole_moment"], json!([1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0]));
    }

    #[test]
    fn properties_derivatives_need_natom() {
        let nat = 4usize;
        let lgrad: Vec<f64> = (0..nat * 3).map(|i| i as f64).collect();
        let lhess: Vec<f64> = (0..nat * nat * 9).map(|i| i as f64).collect();

        let data: AtomicResultPropertiesData = serde_json::from_value(json!({
            "calcinfo_natom": nat,
            "return_gradient": lgrad,
            "scf_total_hessian": lhess
        }))
        .unwrap();
        let props = AtomicResultProperties::build(data).unwrap();
        assert_eq!(props.calcinfo_natom, Some(4));
        assert_eq!(props.return_gradient.as_ref().unwrap().shape(), &[4, 3]);
        assert_eq!(props.scf_total_hessian.as_ref().unwrap().shape(), &[12, 12]);

        let data: AtomicResultPropertiesData =
            serde_json::from_value(json!({"return_gradient": [0.0, 0.0, 0.1]})).unwrap();
        let err = AtomicResultProperties::build(data).unwrap_err();
        assert!(matches!(err, ValidationError::CrossFieldDependency(_)));
    }

    #[test]
    fn specification_lowercases_program() {
        let data: AtomicSpecificationData = serde_json::from_value(json!({
            "program": "Psi4",
            "driver": "gradient",
            "model": {"method": "UFF"},
        }))
        .unwrap();
        let spec = AtomicSpecification::build(data).unwrap();
        assert_eq!(spec.program, "psi4");
    }
}
