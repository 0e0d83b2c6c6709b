//! A pure Rust library for validated quantum-chemistry computation records.
//! It defines the typed data model for single-point, optimization, and
//! torsion-drive schemas, enforces their structural invariants at
//! construction, and converts records between the two supported schema
//! generations.
//!
//! # Features
//!
//! - **Numeric-array coercion** — Wire literals (scalars, numeric strings,
//!   nested lists) cast to a declared element type and shape; arrays always
//!   travel flat, with shape reapplied from schema metadata
//! - **Protocol trimming** — Declarative retention of trajectories,
//!   wavefunction quantities, and program-native files, chosen once per
//!   record
//! - **Pointer resolution** — Alias fields naming a sibling quantity resolve
//!   after the whole payload is bound, never eagerly
//! - **Basis validation** — Shell and effective-core-potential invariants
//!   with the total basis-function count computed up front
//! - **Version conversion** — Typed structural remap from the current
//!   generation to the legacy layout, recursing through nested records and
//!   refusing any other target
//!
//! # Quick Start
//!
//! Every record kind pairs a raw `*Data` wire form with a validated type;
//! construction is all-or-nothing:
//!
//! ```
//! use qcrecords::model::basis::{BasisSet, BasisSetData};
//! use qcrecords::ErrorCorrectionPolicy;
//!
//! let data: BasisSetData = serde_json::from_value(serde_json::json!({
//!     "name": "sto-3g",
//!     "center_data": {
//!         "h": {
//!             "electron_shells": [{
//!                 "harmonic_type": "spherical",
//!                 "angular_momentum": [0],
//!                 "exponents": [3.42525091, 0.62391373, 0.16885540],
//!                 "coefficients": [[0.15432897, 0.53532814, 0.44463454]]
//!             }]
//!         }
//!     },
//!     "atom_map": ["h", "h"]
//! }))?;
//!
//! let basis = BasisSet::build(data)?;
//! assert_eq!(basis.nbf, 2);
//! assert!(!basis.center_data["h"].electron_shells[0].is_contracted());
//!
//! // error-correction policies are permissive unless told otherwise
//! let policy = ErrorCorrectionPolicy::default();
//! assert!(policy.allows("scf_convergence"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`model`] — Shared leaves: arrays, basis sets, molecules, protocols
//! - [`v2`] — Current-generation records with two-phase validating builders
//! - [`v1`] — Legacy-generation layouts targeted by downgrade conversion
//! - [`convert`] — `convert_v`, [`Versioned`] results, and loss accounting
//! - [`error`] — The [`ValidationError`] taxonomy
//!
//! # Concurrency
//!
//! Everything here is synchronous and free of shared mutable state; records
//! validate and convert independently on any number of threads.

pub mod convert;
pub mod error;
pub mod model;
pub mod v1;
pub mod v2;

pub use error::ValidationError;

pub use model::array::{validate_array, validate_scalar, ArrayLiteral, Dim, NumericArray, Scalar};
pub use model::basis::{BasisCenter, BasisSet, EcpPotential, EcpType, ElectronShell, HarmonicType};
pub use model::common::{ComputeError, Driver, Model, Provenance};
pub use model::molecule::Molecule;
pub use model::protocols::{
    AtomicProtocols, ErrorCorrectionPolicy, NativeFilesProtocol, OptimizationProtocols,
    TrajectoryProtocol, WavefunctionProtocol,
};

pub use convert::{ConversionError, ConversionLoss, SchemaVersion, Versioned};
