//! Basis-set description and structural validation.
//!
//! A basis set is a mapping of uniquely-named centers to their electron
//! shells (and optional effective-core-potential blocks), plus an ordered
//! atom map assigning a center to every atom. Construction is all-or-nothing:
//! [`BasisSet::build`] validates every shell and ECP invariant and computes
//! the total basis-function count before anything is returned.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::array::{validate_array, ArrayLiteral, Dim};

/// Spherical vs. cartesian angular functions for a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmonicType {
    Spherical,
    Cartesian,
}

impl HarmonicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HarmonicType::Spherical => "spherical",
            HarmonicType::Cartesian => "cartesian",
        }
    }

    /// Number of basis functions a single angular-momentum component spans.
    pub fn component_functions(&self, angular_momentum: u32) -> usize {
        let l = angular_momentum as usize;
        match self {
            HarmonicType::Spherical => 2 * l + 1,
            HarmonicType::Cartesian => (l + 1) * (l + 2) / 2,
        }
    }
}

impl fmt::Display for HarmonicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HarmonicType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spherical" => Ok(HarmonicType::Spherical),
            "cartesian" => Ok(HarmonicType::Cartesian),
            other => Err(ValidationError::structural(format!(
                "harmonic_type must be `spherical` or `cartesian`, got `{other}`"
            ))),
        }
    }
}

/// Scalar-relativistic vs. spin-orbit effective core potential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcpType {
    Scalar,
    Spinorbit,
}

impl FromStr for EcpType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scalar" => Ok(EcpType::Scalar),
            "spinorbit" => Ok(EcpType::Spinorbit),
            other => Err(ValidationError::structural(format!(
                "ecp_type must be `scalar` or `spinorbit`, got `{other}`"
            ))),
        }
    }
}

/// Raw wire form of an [`ElectronShell`].
#[derive(Debug, Clone, Deserialize)]
pub struct ElectronShellData {
    pub harmonic_type: String,
    pub angular_momentum: Vec<u32>,
    pub exponents: ArrayLiteral,
    pub coefficients: Vec<ArrayLiteral>,
}

/// A validated set of primitives sharing one exponent list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectronShell {
    pub harmonic_type: HarmonicType,
    pub angular_momentum: Vec<u32>,
    pub exponents: Vec<f64>,
    pub coefficients: Vec<Vec<f64>>,
}

impl ElectronShell {
    /// Validates shell invariants: every coefficient row matches the exponent
    /// count, and a fused shell (multiple angular momenta over one exponent
    /// set) uses cartesian functions.
    pub fn build(data: ElectronShellData) -> Result<Self, ValidationError> {
        let harmonic_type: HarmonicType = data.harmonic_type.parse()?;

        if data.angular_momentum.is_empty() {
            return Err(ValidationError::structural(
                "an electron shell requires at least one angular momentum value",
            ));
        }

        if data.angular_momentum.len() > 1 && harmonic_type == HarmonicType::Spherical {
            return Err(ValidationError::structural(
                "a fused shell declaring multiple angular momenta cannot be spherical",
            ));
        }

        let exponents =
            validate_array::<f64>("exponents", &data.exponents, &[Dim::Any])?.into_vec();

        let mut coefficients = Vec::with_capacity(data.coefficients.len());
        for (row, literal) in data.coefficients.iter().enumerate() {
            let row_values =
                validate_array::<f64>("coefficients", literal, &[Dim::Any])?.into_vec();
            if row_values.len() != exponents.len() {
                return Err(ValidationError::structural(format!(
                    "the length of coefficients row {row} ({}) does not match the length of \
                     exponents ({})",
                    row_values.len(),
                    exponents.len()
                )));
            }
            coefficients.push(row_values);
        }

        Ok(Self {
            harmonic_type,
            angular_momentum: data.angular_momentum,
            exponents,
            coefficients,
        })
    }

    /// Whether the shell represents a contracted Gaussian: several general
    /// contractions over a single angular momentum.
    pub fn is_contracted(&self) -> bool {
        self.coefficients.len() != 1 && self.angular_momentum.len() == 1
    }

    /// Basis functions this shell contributes per atom it is placed on.
    pub fn nfunctions(&self) -> usize {
        self.angular_momentum
            .iter()
            .map(|&l| self.harmonic_type.component_functions(l))
            .sum()
    }
}

/// Raw wire form of an [`EcpPotential`].
#[derive(Debug, Clone, Deserialize)]
pub struct EcpPotentialData {
    pub ecp_type: String,
    pub angular_momentum: Vec<u32>,
    pub r_exponents: Vec<i64>,
    pub gaussian_exponents: ArrayLiteral,
    pub coefficients: Vec<ArrayLiteral>,
}

/// A validated effective-core-potential block on one center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EcpPotential {
    pub ecp_type: EcpType,
    pub angular_momentum: Vec<u32>,
    pub r_exponents: Vec<i64>,
    pub gaussian_exponents: Vec<f64>,
    pub coefficients: Vec<Vec<f64>>,
}

impl EcpPotential {
    /// Validates that the gaussian exponents match the radial exponents and
    /// every coefficient row in length.
    pub fn build(data: EcpPotentialData) -> Result<Self, ValidationError> {
        let ecp_type: EcpType = data.ecp_type.parse()?;

        let gaussian_exponents =
            validate_array::<f64>("gaussian_exponents", &data.gaussian_exponents, &[Dim::Any])?
                .into_vec();

        if gaussian_exponents.len() != data.r_exponents.len() {
            return Err(ValidationError::structural(format!(
                "the length of gaussian_exponents ({}) does not match the length of r_exponents \
                 ({})",
                gaussian_exponents.len(),
                data.r_exponents.len()
            )));
        }

        let mut coefficients = Vec::with_capacity(data.coefficients.len());
        for (row, literal) in data.coefficients.iter().enumerate() {
            let row_values =
                validate_array::<f64>("coefficients", literal, &[Dim::Any])?.into_vec();
            if row_values.len() != gaussian_exponents.len() {
                return Err(ValidationError::structural(format!(
                    "the length of coefficients row {row} ({}) does not match the length of \
                     gaussian_exponents ({})",
                    row_values.len(),
                    gaussian_exponents.len()
                )));
            }
            coefficients.push(row_values);
        }

        Ok(Self {
            ecp_type,
            angular_momentum: data.angular_momentum,
            r_exponents: data.r_exponents,
            gaussian_exponents,
            coefficients,
        })
    }
}

/// Raw wire form of a [`BasisCenter`].
#[derive(Debug, Clone, Deserialize)]
pub struct BasisCenterData {
    pub electron_shells: Vec<ElectronShellData>,
    #[serde(default)]
    pub ecp_electrons: Option<u32>,
    #[serde(default)]
    pub ecp_potentials: Option<Vec<EcpPotentialData>>,
}

/// Everything placed on one basis center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasisCenter {
    pub electron_shells: Vec<ElectronShell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecp_electrons: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecp_potentials: Option<Vec<EcpPotential>>,
}

impl BasisCenter {
    /// Validates every shell and ECP block on the center.
    pub fn build(data: BasisCenterData) -> Result<Self, ValidationError> {
        let electron_shells = data
            .electron_shells
            .into_iter()
            .map(ElectronShell::build)
            .collect::<Result<Vec<_>, _>>()?;

        let ecp_potentials = match data.ecp_potentials {
            Some(potentials) => Some(
                potentials
                    .into_iter()
                    .map(EcpPotential::build)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        Ok(Self {
            electron_shells,
            ecp_electrons: data.ecp_electrons,
            ecp_potentials,
        })
    }

    /// Basis functions this center contributes per atom mapped to it.
    pub fn nfunctions(&self) -> usize {
        self.electron_shells.iter().map(ElectronShell::nfunctions).sum()
    }
}

/// Raw wire form of a [`BasisSet`].
#[derive(Debug, Clone, Deserialize)]
pub struct BasisSetData {
    pub name: String,
    pub center_data: BTreeMap<String, BasisCenterData>,
    pub atom_map: Vec<String>,
}

/// A validated basis set over an ordered atom map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasisSet {
    pub schema_name: String,
    pub name: String,
    pub center_data: BTreeMap<String, BasisCenter>,
    pub atom_map: Vec<String>,
    /// Total basis functions implied by the atom map.
    pub nbf: usize,
}

impl BasisSet {
    /// Validates the whole set and computes `nbf`.
    ///
    /// Every atom-map label must resolve to a center; the first unresolved
    /// label aborts construction.
    pub fn build(data: BasisSetData) -> Result<Self, ValidationError> {
        for label in &data.atom_map {
            if !data.center_data.contains_key(label) {
                return Err(ValidationError::structural(format!(
                    "atom_map entry `{label}` does not resolve to an entry in center_data"
                )));
            }
        }

        let mut center_data = BTreeMap::new();
        for (label, center) in data.center_data {
            center_data.insert(label, BasisCenter::build(center)?);
        }

        let nbf = data
            .atom_map
            .iter()
            .map(|label| center_data[label].nfunctions())
            .sum();

        Ok(Self {
            schema_name: "qcschema_basis".to_string(),
            name: data.name,
            center_data,
            atom_map: data.atom_map,
            nbf,
        })
    }
}
