//! Cross-generation record conversion.
//!
//! Exactly two schema generations exist. `convert_v` on a record either
//! returns the identical instance (when the target is its own version),
//! performs the typed structural remap down to the legacy layout, or fails
//! with [`ConversionError::Unsupported`] — it never guesses a mapping, since
//! a silent mis-conversion would corrupt scientific provenance.
//!
//! Downgrades are pure: the source record is consumed, nothing external is
//! consulted, and fields with no legacy slot accumulate into a
//! [`ConversionLoss`] keyed by field path. The loss record is not attached
//! to the converted output; it exists for auditing by the converter's
//! internals and tests.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::v1;
use crate::v2;

/// The two supported schema generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    V1,
    V2,
}

impl SchemaVersion {
    pub fn as_u32(&self) -> u32 {
        match self {
            SchemaVersion::V1 => 1,
            SchemaVersion::V2 => 2,
        }
    }
}

/// Errors that can occur during version conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The requested target version has no defined mapping from this record.
    #[error("cannot convert {kind} to schema version {requested}")]
    Unsupported {
        /// Record kind being converted.
        kind: &'static str,
        /// The version that was asked for.
        requested: u32,
    },
}

fn check_convertible_version(
    requested: u32,
    kind: &'static str,
) -> Result<SchemaVersion, ConversionError> {
    match requested {
        1 => Ok(SchemaVersion::V1),
        2 => Ok(SchemaVersion::V2),
        _ => Err(ConversionError::Unsupported { kind, requested }),
    }
}

/// A record of either generation, as returned by `convert_v`.
#[derive(Debug, Clone, PartialEq)]
pub enum Versioned<Current, Legacy> {
    V2(Current),
    V1(Legacy),
}

impl<Current, Legacy> Versioned<Current, Legacy> {
    pub fn schema_version(&self) -> u32 {
        match self {
            Versioned::V2(_) => 2,
            Versioned::V1(_) => 1,
        }
    }

    pub fn into_v2(self) -> Option<Current> {
        match self {
            Versioned::V2(record) => Some(record),
            Versioned::V1(_) => None,
        }
    }

    pub fn into_v1(self) -> Option<Legacy> {
        match self {
            Versioned::V1(record) => Some(record),
            Versioned::V2(_) => None,
        }
    }
}

/// Fields dropped by a downgrade because the target generation has no slot
/// for them, keyed by their path in the source record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionLoss {
    dropped: BTreeMap<String, Value>,
}

impl ConversionLoss {
    fn record(&mut self, path: impl Into<String>, value: &impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.dropped.insert(path.into(), value);
    }

    fn absorb(&mut self, prefix: &str, other: ConversionLoss) {
        for (path, value) in other.dropped {
            self.dropped.insert(format!("{prefix}.{path}"), value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty()
    }

    /// The dropped fields, keyed by source path.
    pub fn dropped(&self) -> &BTreeMap<String, Value> {
        &self.dropped
    }
}

// ====  Single-point records  ===================================================

impl v2::AtomicSpecification {
    /// The legacy layout has no program or protocols on the leaf; the program
    /// is handed back for the caller to relocate, the protocols are lost.
    pub(crate) fn downgrade(self) -> (v1::QCInputSpecification, String, ConversionLoss) {
        let mut loss = ConversionLoss::default();
        loss.record("protocols", &self.protocols);
        let spec = v1::QCInputSpecification {
            schema_name: "qcschema_input".to_string(),
            schema_version: 1,
            driver: self.driver,
            model: self.model,
            keywords: self.keywords,
            extras: self.extras,
        };
        (spec, self.program, loss)
    }
}

impl v2::AtomicInput {
    pub(crate) fn downgrade(self) -> (v1::AtomicInput, ConversionLoss) {
        let input = v1::AtomicInput {
            id: self.id,
            schema_name: "qcschema_input".to_string(),
            schema_version: 1,
            molecule: self.molecule,
            driver: self.driver,
            model: self.model,
            keywords: self.keywords,
            protocols: self.protocols,
            extras: self.extras,
            provenance: self.provenance,
        };
        (input, ConversionLoss::default())
    }

    /// Converts to the requested schema version.
    pub fn convert_v(
        self,
        target_version: u32,
    ) -> Result<Versioned<Self, v1::AtomicInput>, ConversionError> {
        match check_convertible_version(target_version, "AtomicInput")? {
            SchemaVersion::V2 => Ok(Versioned::V2(self)),
            SchemaVersion::V1 => {
                debug!(kind = "AtomicInput", "downgrading record to schema version 1");
                Ok(Versioned::V1(self.downgrade().0))
            }
        }
    }
}

impl v2::AtomicResult {
    pub(crate) fn downgrade(self) -> (v1::AtomicResult, ConversionLoss) {
        let result = v1::AtomicResult {
            id: self.id,
            schema_name: "qcschema_output".to_string(),
            schema_version: 1,
            molecule: self.molecule,
            driver: self.driver,
            model: self.model,
            keywords: self.keywords,
            protocols: self.protocols,
            extras: self.extras,
            properties: self.properties,
            wavefunction: self.wavefunction,
            return_result: self.return_result,
            stdout: self.stdout,
            stderr: self.stderr,
            native_files: self.native_files,
            success: self.success,
            error: self.error,
            provenance: self.provenance,
        };
        (result, ConversionLoss::default())
    }

    /// Converts to the requested schema version.
    pub fn convert_v(
        self,
        target_version: u32,
    ) -> Result<Versioned<Self, v1::AtomicResult>, ConversionError> {
        match check_convertible_version(target_version, "AtomicResult")? {
            SchemaVersion::V2 => Ok(Versioned::V2(self)),
            SchemaVersion::V1 => {
                debug!(kind = "AtomicResult", "downgrading record to schema version 1");
                Ok(Versioned::V1(self.downgrade().0))
            }
        }
    }
}

// ====  Optimization records  ===================================================

impl v2::OptimizationSpecification {
    /// Standalone remap: `program` becomes `procedure`, the leaf's program
    /// relocates into the keywords, the extras and the remaining leaf are
    /// lost — the legacy specification has no slot for a nested leaf.
    pub(crate) fn downgrade(self) -> (v1::OptimizationSpecification, ConversionLoss) {
        let mut loss = ConversionLoss::default();
        loss.record("extras", &self.extras);
        loss.record("specification", &self.specification);

        let mut keywords = self.keywords;
        keywords.insert(
            "program".to_string(),
            Value::String(self.specification.program),
        );

        let spec = v1::OptimizationSpecification {
            schema_name: "qcschema_optimization_specification".to_string(),
            procedure: self.program,
            keywords,
            protocols: self.protocols,
        };
        (spec, loss)
    }
}

impl v2::OptimizationInput {
    /// The wrapper specification dissolves: keywords, protocols, and extras
    /// hoist onto the record, the leaf becomes the legacy input
    /// specification, and the leaf's program relocates into the keywords.
    /// The optimizer program itself has no legacy slot on the input record.
    pub(crate) fn downgrade(self) -> (v1::OptimizationInput, ConversionLoss) {
        let mut loss = ConversionLoss::default();
        let v2::OptimizationSpecification {
            schema_name: _,
            program,
            keywords: mut hoisted_keywords,
            protocols,
            extras,
            specification,
        } = self.specification;

        loss.record("specification.program", &program);
        let (input_specification, leaf_program, leaf_loss) = specification.downgrade();
        loss.absorb("specification.specification", leaf_loss);
        hoisted_keywords.insert("program".to_string(), Value::String(leaf_program));

        let input = v1::OptimizationInput {
            id: self.id,
            schema_name: "qcschema_optimization_input".to_string(),
            schema_version: 1,
            keywords: hoisted_keywords,
            extras,
            protocols,
            input_specification,
            initial_molecule: self.initial_molecule,
            provenance: self.provenance,
        };
        (input, loss)
    }

    /// Converts to the requested schema version.
    pub fn convert_v(
        self,
        target_version: u32,
    ) -> Result<Versioned<Self, v1::OptimizationInput>, ConversionError> {
        match check_convertible_version(target_version, "OptimizationInput")? {
            SchemaVersion::V2 => Ok(Versioned::V2(self)),
            SchemaVersion::V1 => {
                debug!(kind = "OptimizationInput", "downgrading record to schema version 1");
                Ok(Versioned::V1(self.downgrade().0))
            }
        }
    }
}

impl v2::OptimizationResult {
    pub(crate) fn downgrade(self) -> (v1::OptimizationResult, ConversionLoss) {
        let mut loss = ConversionLoss::default();
        // the aggregate properties block is new in this generation
        loss.record("properties", &self.properties);

        let (input, input_loss) = self.input_data.downgrade();
        loss.absorb("input_data", input_loss);

        let trajectory: Vec<v1::AtomicResult> = self
            .trajectory_results
            .into_iter()
            .map(|result| result.downgrade().0)
            .collect();
        let energies: Vec<Option<f64>> = self
            .trajectory_properties
            .iter()
            .map(|props| props.return_energy)
            .collect();

        // nested extras merge into the record's own, record keys winning
        let mut extras = input.extras;
        extras.extend(self.extras);

        let result = v1::OptimizationResult {
            id: self.id,
            schema_name: "qcschema_optimization_output".to_string(),
            schema_version: 1,
            keywords: input.keywords,
            extras,
            protocols: input.protocols,
            input_specification: input.input_specification,
            initial_molecule: input.initial_molecule,
            final_molecule: self.final_molecule,
            trajectory,
            energies,
            stdout: self.stdout,
            stderr: self.stderr,
            success: self.success,
            error: None,
            provenance: self.provenance,
        };
        (result, loss)
    }

    /// Converts to the requested schema version, recursing through every
    /// trajectory element.
    pub fn convert_v(
        self,
        target_version: u32,
    ) -> Result<Versioned<Self, v1::OptimizationResult>, ConversionError> {
        match check_convertible_version(target_version, "OptimizationResult")? {
            SchemaVersion::V2 => Ok(Versioned::V2(self)),
            SchemaVersion::V1 => {
                debug!(kind = "OptimizationResult", "downgrading record to schema version 1");
                Ok(Versioned::V1(self.downgrade().0))
            }
        }
    }
}

// ====  Torsion-drive records  ==================================================

impl v2::TorsionDriveInput {
    pub(crate) fn downgrade(self) -> (v1::TorsionDriveInput, ConversionLoss) {
        let mut loss = ConversionLoss::default();

        let (input_specification, leaf_program, leaf_loss) = self.input_specification.downgrade();
        if !leaf_program.is_empty() {
            loss.record("input_specification.program", &leaf_program);
        }
        loss.absorb("input_specification", leaf_loss);

        let (optimization_spec, opt_loss) = self.optimization_spec.downgrade();
        loss.absorb("optimization_spec", opt_loss);

        let input = v1::TorsionDriveInput {
            schema_name: "qcschema_torsion_drive_input".to_string(),
            schema_version: 1,
            keywords: self.keywords,
            extras: self.extras,
            input_specification,
            initial_molecule: self.initial_molecule,
            optimization_spec,
            provenance: self.provenance,
        };
        (input, loss)
    }

    /// Converts to the requested schema version.
    pub fn convert_v(
        self,
        target_version: u32,
    ) -> Result<Versioned<Self, v1::TorsionDriveInput>, ConversionError> {
        match check_convertible_version(target_version, "TorsionDriveInput")? {
            SchemaVersion::V2 => Ok(Versioned::V2(self)),
            SchemaVersion::V1 => {
                debug!(kind = "TorsionDriveInput", "downgrading record to schema version 1");
                Ok(Versioned::V1(self.downgrade().0))
            }
        }
    }
}

impl v2::TorsionDriveResult {
    pub(crate) fn downgrade(self) -> (v1::TorsionDriveResult, ConversionLoss) {
        let mut loss = ConversionLoss::default();

        let (input_specification, leaf_program, leaf_loss) = self.input_specification.downgrade();
        if !leaf_program.is_empty() {
            loss.record("input_specification.program", &leaf_program);
        }
        loss.absorb("input_specification", leaf_loss);

        let (optimization_spec, opt_loss) = self.optimization_spec.downgrade();
        loss.absorb("optimization_spec", opt_loss);

        let mut optimization_history = BTreeMap::new();
        for (angle, runs) in self.optimization_history {
            let mut converted = Vec::with_capacity(runs.len());
            for (index, run) in runs.into_iter().enumerate() {
                let (run, run_loss) = run.downgrade();
                loss.absorb(&format!("optimization_history.{angle}[{index}]"), run_loss);
                converted.push(run);
            }
            optimization_history.insert(angle, converted);
        }

        let result = v1::TorsionDriveResult {
            schema_name: "qcschema_torsion_drive_output".to_string(),
            schema_version: 1,
            keywords: self.keywords,
            extras: self.extras,
            input_specification,
            initial_molecule: self.initial_molecule,
            optimization_spec,
            final_energies: self.final_energies,
            final_molecules: self.final_molecules,
            optimization_history,
            stdout: self.stdout,
            stderr: self.stderr,
            success: self.success,
            provenance: self.provenance,
        };
        (result, loss)
    }

    /// Converts to the requested schema version, recursing through every
    /// optimization run of every scan angle.
    pub fn convert_v(
        self,
        target_version: u32,
    ) -> Result<Versioned<Self, v1::TorsionDriveResult>, ConversionError> {
        match check_convertible_version(target_version, "TorsionDriveResult")? {
            SchemaVersion::V2 => Ok(Versioned::V2(self)),
            SchemaVersion::V1 => {
                debug!(kind = "TorsionDriveResult", "downgrading record to schema version 1");
                Ok(Versioned::V1(self.downgrade().0))
            }
        }
    }
}

// ====  Legacy records  =========================================================

// A legacy record converts to itself; there is no defined upgrade mapping,
// so any other target fails loud.
macro_rules! legacy_identity_only {
    ($ty:ty, $current:ty, $kind:literal) => {
        impl $ty {
            /// Converts to the requested schema version.
            pub fn convert_v(
                self,
                target_version: u32,
            ) -> Result<Versioned<$current, Self>, ConversionError> {
                match check_convertible_version(target_version, $kind)? {
                    SchemaVersion::V1 => Ok(Versioned::V1(self)),
                    SchemaVersion::V2 => Err(ConversionError::Unsupported {
                        kind: $kind,
                        requested: 2,
                    }),
                }
            }
        }
    };
}

legacy_identity_only!(v1::AtomicInput, v2::AtomicInput, "AtomicInput");
legacy_identity_only!(v1::AtomicResult, v2::AtomicResult, "AtomicResult");
legacy_identity_only!(v1::OptimizationInput, v2::OptimizationInput, "OptimizationInput");
legacy_identity_only!(v1::OptimizationResult, v2::OptimizationResult, "OptimizationResult");
legacy_identity_only!(v1::TorsionDriveInput, v2::TorsionDriveInput, "TorsionDriveInput");
legacy_identity_only!(v1::TorsionDriveResult, v2::TorsionDriveResult, "TorsionDriveResult");
