//! Legacy-generation (schema version 1) record layouts.
//!
//! Produced by downgrade conversion from validated version-2 records; see
//! [`crate::convert`]. Shared leaf machinery (arrays, basis sets, molecules,
//! protocols) is identical across generations and lives in [`crate::model`].

pub mod atomic;
pub mod optimization;
pub mod torsion;

pub use atomic::{AtomicInput, AtomicResult, QCInputSpecification};
pub use optimization::{OptimizationInput, OptimizationResult, OptimizationSpecification};
pub use torsion::{TorsionDriveInput, TorsionDriveResult};
