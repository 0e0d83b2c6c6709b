//! Legacy-generation single-point records.
//!
//! These layouts exist as conversion targets: they are produced from
//! already-validated version-2 records by the converter, never re-validated,
//! and serialize to the legacy wire form.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::common::{ComputeError, Driver, Model, Provenance};
use crate::model::molecule::Molecule;
use crate::model::protocols::AtomicProtocols;
use crate::v2::atomic::{AtomicResultProperties, ReturnResult, WavefunctionProperties};

/// The legacy leaf specification: driver and model without a program slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QCInputSpecification {
    pub schema_name: String,
    pub schema_version: u32,
    pub driver: Driver,
    pub model: Model,
    pub keywords: Map<String, Value>,
    pub extras: Map<String, Value>,
}

/// A legacy single-point computation directive.
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

/// A legacy single-point computation result.
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
