//! Error types for record validation.
//!
//! This module defines the error type used throughout record construction.
//! Errors are categorized by detection site: numeric coercion, shape casting,
//! pointer resolution, protocol selection, structural invariants, and
//! cross-field sequencing.

use thiserror::Error;

/// Errors that can occur while validating a record or one of its fields.
///
/// Validation is all-or-nothing: the first error aborts construction and no
/// partial record is ever returned. Every variant carries enough context
/// (field name, offending value or label) to diagnose without re-running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// An element of a numeric literal could not be converted to the
    /// declared element type.
    #[error("could not cast `{value}` to a {dtype} array")]
    TypeCoercion {
        /// Target element type name.
        dtype: &'static str,
        /// Display form of the offending literal.
        value: String,
    },

    /// A flat numeric payload is not castable to the shape the schema
    /// declares for the field.
    #[error("`{field}` is not castable to shape {shape}")]
    Shape {
        /// Field holding the payload.
        field: String,
        /// Formatted shape pattern, e.g. `(7, -1)`.
        shape: String,
    },

    /// A pointer field names a sibling quantity that is not present.
    #[error("return quantity `{target}` referenced by `{field}` does not exist in the values")]
    Reference {
        /// The pointer field being resolved.
        field: String,
        /// The name it points at.
        target: String,
    },

    /// A protocol string does not name any known variant of its family.
    #[error("protocol `{family}:{value}` is not understood")]
    Policy {
        /// Protocol family, e.g. `trajectory` or `wavefunction`.
        family: &'static str,
        /// The unrecognized value.
        value: String,
    },

    /// A structural invariant of the record is violated.
    #[error("{0}")]
    Structural(String),

    /// A validator ran before the sibling field it depends on was bound,
    /// or that sibling is missing from the input entirely.
    #[error("{0}")]
    CrossFieldDependency(String),
}

impl ValidationError {
    /// Creates a [`TypeCoercion`](ValidationError::TypeCoercion) error.
    pub fn type_coercion(dtype: &'static str, value: impl ToString) -> Self {
        Self::TypeCoercion {
            dtype,
            value: value.to_string(),
        }
    }

    /// Creates a [`Shape`](ValidationError::Shape) error.
    pub fn shape(field: impl Into<String>, shape: impl Into<String>) -> Self {
        Self::Shape {
            field: field.into(),
            shape: shape.into(),
        }
    }

    /// Creates a [`Reference`](ValidationError::Reference) error.
    pub fn reference(field: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Reference {
            field: field.into(),
            target: target.into(),
        }
    }

    /// Creates a [`Policy`](ValidationError::Policy) error.
    pub fn policy(family: &'static str, value: impl Into<String>) -> Self {
        Self::Policy {
            family,
            value: value.into(),
        }
    }

    /// Creates a [`Structural`](ValidationError::Structural) error.
    pub fn structural(detail: impl Into<String>) -> Self {
        Self::Structural(detail.into())
    }

    /// Creates a [`CrossFieldDependency`](ValidationError::CrossFieldDependency) error.
    pub fn cross_field(detail: impl Into<String>) -> Self {
        Self::CrossFieldDependency(detail.into())
    }
}
