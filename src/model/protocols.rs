//! Declarative retention policies for optional heavy payload.
//!
//! A protocol is chosen once at record construction and decides which parts
//! of the optional payload (trajectory entries, wavefunction quantities,
//! program-native files) survive. Each family is a closed enum matched
//! exhaustively; unknown wire spellings are rejected at the string boundary
//! with a [`ValidationError::Policy`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Which gradient evaluations to keep in an optimization trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrajectoryProtocol {
    #[default]
    All,
    InitialAndFinal,
    Final,
    None,
}

impl TrajectoryProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrajectoryProtocol::All => "all",
            TrajectoryProtocol::InitialAndFinal => "initial_and_final",
            TrajectoryProtocol::Final => "final",
            TrajectoryProtocol::None => "none",
        }
    }

    /// Indices of the entries retained from a trajectory of `len` elements,
    /// in original order.
    pub fn retained_indices(&self, len: usize) -> Vec<usize> {
        match self {
            TrajectoryProtocol::All => (0..len).collect(),
            TrajectoryProtocol::InitialAndFinal => match len {
                0 => Vec::new(),
                1 => vec![0],
                _ => vec![0, len - 1],
            },
            TrajectoryProtocol::Final => {
                if len == 0 {
                    Vec::new()
                } else {
                    vec![len - 1]
                }
            }
            TrajectoryProtocol::None => Vec::new(),
        }
    }
}

impl FromStr for TrajectoryProtocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TrajectoryProtocol::All),
            "initial_and_final" => Ok(TrajectoryProtocol::InitialAndFinal),
            "final" => Ok(TrajectoryProtocol::Final),
            "none" => Ok(TrajectoryProtocol::None),
            _ => Err(ValidationError::policy("trajectory", s)),
        }
    }
}

/// Wavefunction payload to keep from a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavefunctionProtocol {
    All,
    OrbitalsAndEigenvalues,
    OccupationsAndEigenvalues,
    ReturnResults,
    #[default]
    None,
}

/// What a wavefunction protocol keeps, expressed over pointer names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavefunctionRetention {
    /// Keep every provided quantity and pointer.
    All,
    /// Drop the wavefunction payload entirely.
    Nothing,
    /// Keep the base set plus these pointers and their backing quantities.
    Pointers(&'static [&'static str]),
}

const RETURN_RESULT_POINTERS: &[&str] = &[
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

const ORBITALS_AND_EIGENVALUES_POINTERS: &[&str] =
    &["orbitals_a", "orbitals_b", "eigenvalues_a", "eigenvalues_b"];

const OCCUPATIONS_AND_EIGENVALUES_POINTERS: &[&str] =
    &["occupations_a", "occupations_b", "eigenvalues_a", "eigenvalues_b"];

impl WavefunctionProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            WavefunctionProtocol::All => "all",
            WavefunctionProtocol::OrbitalsAndEigenvalues => "orbitals_and_eigenvalues",
            WavefunctionProtocol::OccupationsAndEigenvalues => "occupations_and_eigenvalues",
            WavefunctionProtocol::ReturnResults => "return_results",
            WavefunctionProtocol::None => "none",
        }
    }

    /// The retention rule this tier expands to.
    ///
    /// Every pointer set implicitly includes the base pair (basis descriptor,
    /// spin-restriction flag), and a retained pointer always drags its
    /// backing storage name along.
    pub fn retention(&self) -> WavefunctionRetention {
        match self {
            WavefunctionProtocol::All => WavefunctionRetention::All,
            WavefunctionProtocol::None => WavefunctionRetention::Nothing,
            WavefunctionProtocol::ReturnResults => {
                WavefunctionRetention::Pointers(RETURN_RESULT_POINTERS)
            }
            WavefunctionProtocol::OrbitalsAndEigenvalues => {
                WavefunctionRetention::Pointers(ORBITALS_AND_EIGENVALUES_POINTERS)
            }
            WavefunctionProtocol::OccupationsAndEigenvalues => {
                WavefunctionRetention::Pointers(OCCUPATIONS_AND_EIGENVALUES_POINTERS)
            }
        }
    }
}

impl FromStr for WavefunctionProtocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(WavefunctionProtocol::All),
            "orbitals_and_eigenvalues" => Ok(WavefunctionProtocol::OrbitalsAndEigenvalues),
            "occupations_and_eigenvalues" => Ok(WavefunctionProtocol::OccupationsAndEigenvalues),
            "return_results" => Ok(WavefunctionProtocol::ReturnResults),
            "none" => Ok(WavefunctionProtocol::None),
            _ => Err(ValidationError::policy("wavefunction", s)),
        }
    }
}

/// Program-native files to keep from a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeFilesProtocol {
    All,
    Input,
    #[default]
    None,
}

impl NativeFilesProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeFilesProtocol::All => "all",
            NativeFilesProtocol::Input => "input",
            NativeFilesProtocol::None => "none",
        }
    }

    /// Filters a file mapping down to the retained subset.
    ///
    /// The `input` subset always materializes an `input` key, null-valued
    /// when the file was not provided; keys outside the subset are simply
    /// absent from the result.
    pub fn apply(&self, files: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        match self {
            NativeFilesProtocol::All => files,
            NativeFilesProtocol::None => BTreeMap::new(),
            NativeFilesProtocol::Input => {
                let mut kept = BTreeMap::new();
                let value = files.get("input").cloned().unwrap_or(Value::Null);
                kept.insert("input".to_string(), value);
                kept
            }
        }
    }
}

impl FromStr for NativeFilesProtocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(NativeFilesProtocol::All),
            "input" => Ok(NativeFilesProtocol::Input),
            "none" => Ok(NativeFilesProtocol::None),
            _ => Err(ValidationError::policy("native_files", s)),
        }
    }
}

macro_rules! protocol_serde {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

protocol_serde!(TrajectoryProtocol);
protocol_serde!(WavefunctionProtocol);
protocol_serde!(NativeFilesProtocol);

/// Whether a consumer may apply automatic error correction per component.
///
/// Permissive by default: a component absent from `policies` falls back to
/// `default_policy`. Queried by orchestration layers deciding whether to
/// retry a failed sub-step; nothing in this crate enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCorrectionPolicy {
    #[serde(default = "default_true")]
    pub default_policy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<BTreeMap<String, bool>>,
}

fn default_true() -> bool {
    true
}

impl Default for ErrorCorrectionPolicy {
    fn default() -> Self {
        Self {
            default_policy: true,
            policies: None,
        }
    }
}

impl ErrorCorrectionPolicy {
    /// Whether correction is allowed for the named component.
    pub fn allows(&self, policy: &str) -> bool {
        match &self.policies {
            Some(policies) => policies.get(policy).copied().unwrap_or(self.default_policy),
            None => self.default_policy,
        }
    }
}

/// Raw wire form of [`AtomicProtocols`], bound before protocol strings are
/// parsed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AtomicProtocolsData {
    #[serde(default)]
    pub wavefunction: Option<String>,
    #[serde(default)]
    pub stdout: Option<bool>,
    #[serde(default)]
    pub error_correction: Option<ErrorCorrectionPolicy>,
    #[serde(default)]
    pub native_files: Option<String>,
}

/// Protocols regarding the manipulation of single-point result data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomicProtocols {
    pub wavefunction: WavefunctionProtocol,
    pub stdout: bool,
    pub error_correction: ErrorCorrectionPolicy,
    pub native_files: NativeFilesProtocol,
}

impl Default for AtomicProtocols {
    fn default() -> Self {
        Self {
            wavefunction: WavefunctionProtocol::None,
            stdout: true,
            error_correction: ErrorCorrectionPolicy::default(),
            native_files: NativeFilesProtocol::None,
        }
    }
}

impl AtomicProtocols {
    /// Parses the raw wire form, rejecting unknown protocol spellings.
    pub fn build(data: AtomicProtocolsData) -> Result<Self, ValidationError> {
        Ok(Self {
            wavefunction: match data.wavefunction {
                Some(s) => s.parse()?,
                None => WavefunctionProtocol::default(),
            },
            stdout: data.stdout.unwrap_or(true),
            error_correction: data.error_correction.unwrap_or_default(),
            native_files: match data.native_files {
                Some(s) => s.parse()?,
                None => NativeFilesProtocol::default(),
            },
        })
    }
}

/// Raw wire form of [`OptimizationProtocols`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizationProtocolsData {
    #[serde(default)]
    pub trajectory: Option<String>,
}

/// Protocols regarding the manipulation of optimization result data.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OptimizationProtocols {
    pub trajectory: TrajectoryProtocol,
}

impl OptimizationProtocols {
    /// Parses the raw wire form, rejecting unknown protocol spellings.
    pub fn build(data: OptimizationProtocolsData) -> Result<Self, ValidationError> {
        Ok(Self {
            trajectory: match data.trajectory {
                Some(s) => s.parse()?,
                None => TrajectoryProtocol::default(),
            },
        })
    }
}

impl<'de> Deserialize<'de> for OptimizationProtocols {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = OptimizationProtocolsData::deserialize(deserializer)?;
        OptimizationProtocols::build(data).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for AtomicProtocols {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = AtomicProtocolsData::deserialize(deserializer)?;
        AtomicProtocols::build(data).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trajectory_retained_indices() {
        assert_eq!(TrajectoryProtocol::All.retained_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(TrajectoryProtocol::InitialAndFinal.retained_indices(5), vec![0, 4]);
        assert_eq!(TrajectoryProtocol::Final.retained_indices(5), vec![4]);
        assert_eq!(TrajectoryProtocol::None.retained_indices(5), Vec::<usize>::new());
    }

    #[test]
    fn trajectory_retained_indices_short() {
        assert_eq!(TrajectoryProtocol::InitialAndFinal.retained_indices(1), vec![0]);
        assert!(TrajectoryProtocol::InitialAndFinal.retained_indices(0).is_empty());
        assert!(TrajectoryProtocol::Final.retained_indices(0).is_empty());
    }

    #[test]
    fn unknown_protocol_string_is_policy_error() {
        let err = "some".parse::<TrajectoryProtocol>().unwrap_err();
        assert_eq!(err.to_string(), "protocol `trajectory:some` is not understood");

        let err = "everything".parse::<WavefunctionProtocol>().unwrap_err();
        assert!(err.to_string().contains("is not understood"));

        assert!("stdout".parse::<NativeFilesProtocol>().is_err());
    }

    #[test]
    fn wavefunction_tiers_expand_to_pointer_sets() {
        match WavefunctionProtocol::OrbitalsAndEigenvalues.retention() {
            WavefunctionRetention::Pointers(names) => {
                assert_eq!(names, ORBITALS_AND_EIGENVALUES_POINTERS)
            }
            other => panic!("unexpected retention {other:?}"),
        }
        assert_eq!(WavefunctionProtocol::All.retention(), WavefunctionRetention::All);
        assert_eq!(WavefunctionProtocol::None.retention(), WavefunctionRetention::Nothing);
    }

    #[test]
    fn native_files_subsets() {
        let files: BTreeMap<String, Value> = [
            ("input".to_string(), Value::String("task scf energy".into())),
            ("gms.dat".to_string(), Value::String("$DATA".into())),
        ]
        .into();

        let all = NativeFilesProtocol::All.apply(files.clone());
        assert_eq!(all.len(), 2);

        let none = NativeFilesProtocol::None.apply(files.clone());
        assert!(none.is_empty());

        let input = NativeFilesProtocol::Input.apply(files);
        assert_eq!(input.keys().collect::<Vec<_>>(), vec!["input"]);
        assert_eq!(input["input"], Value::String("task scf energy".into()));
    }

    #[test]
    fn native_files_input_subset_materializes_missing_key() {
        let files: BTreeMap<String, Value> =
            [("gms.dat".to_string(), Value::String("$DATA".into()))].into();
        let kept = NativeFilesProtocol::Input.apply(files);
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["input"]);
        assert_eq!(kept["input"], Value::Null);
    }

    #[test]
    fn error_correction_permissive_by_default() {
        let policy = ErrorCorrectionPolicy::default();
        assert!(policy.allows("a"));

        let policy = ErrorCorrectionPolicy {
            default_policy: true,
            policies: Some([("a".to_string(), false)].into()),
        };
        assert!(!policy.allows("a"));
        assert!(policy.allows("b"));

        let policy = ErrorCorrectionPolicy {
            default_policy: false,
            policies: None,
        };
        assert!(!policy.allows("a"));

        let policy = ErrorCorrectionPolicy {
            default_policy: false,
            policies: Some([("a".to_string(), true)].into()),
        };
        assert!(policy.allows("a"));
        assert!(!policy.allows("b"));
    }

    #[test]
    fn atomic_protocols_build_defaults() {
        let protocols = AtomicProtocols::build(AtomicProtocolsData::default()).unwrap();
        assert_eq!(protocols.wavefunction, WavefunctionProtocol::None);
        assert!(protocols.stdout);
        assert_eq!(protocols.native_files, NativeFilesProtocol::None);
        assert!(protocols.error_correction.allows("x"));
    }

    #[test]
    fn protocols_round_trip_wire_strings() {
        let data: AtomicProtocolsData = serde_json::from_value(serde_json::json!({
            "wavefunction": "orbitals_and_eigenvalues",
            "stdout": false,
        }))
        .unwrap();
        let protocols = AtomicProtocols::build(data).unwrap();
        assert_eq!(protocols.wavefunction, WavefunctionProtocol::OrbitalsAndEigenvalues);
        assert!(!protocols.stdout);

        let json = serde_json::to_value(&protocols).unwrap();
        assert_eq!(json["wavefunction"], "orbitals_and_eigenvalues");
        assert_eq!(json["native_files"], "none");
    }

    #[test]
    fn bad_protocol_string_fails_build() {
        let data: AtomicProtocolsData =
            serde_json::from_value(serde_json::json!({"wavefunction": "sometimes"})).unwrap();
        let err = AtomicProtocols::build(data).unwrap_err();
        assert_eq!(err.to_string(), "protocol `wavefunction:sometimes` is not understood");
    }
}
