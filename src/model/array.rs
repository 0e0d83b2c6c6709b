//! Typed numeric-array coercion and the flat wire representation.
//!
//! Wire payloads carry numeric fields as scalars, numeric strings, or nested
//! lists. [`validate_array`] coerces such a literal to a declared element
//! type and casts it to a declared shape pattern. On the wire an array is
//! always a flat, row-major sequence of scalars; the logical shape lives in
//! schema metadata and is reapplied by record builders, never read from the
//! payload itself.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;

/// An untyped numeric literal as it appears on the wire.
///
/// Deserializes from a scalar, a numeric string, or an arbitrarily nested
/// list of the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayLiteral {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ArrayLiteral>),
}

impl fmt::Display for ArrayLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLiteral::Int(v) => write!(f, "{v}"),
            ArrayLiteral::Float(v) => write!(f, "{v}"),
            ArrayLiteral::Text(v) => f.write_str(v),
            ArrayLiteral::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Element types an array can be coerced to.
pub trait Scalar: Copy + PartialEq + fmt::Debug {
    /// Type name used in coercion diagnostics.
    const DTYPE: &'static str;

    /// Converts a single leaf literal, or `None` when it is not representable.
    fn coerce(literal: &ArrayLiteral) -> Option<Self>;
}

impl Scalar for f64 {
    const DTYPE: &'static str = "float";

    fn coerce(literal: &ArrayLiteral) -> Option<Self> {
        match literal {
            ArrayLiteral::Int(v) => Some(*v as f64),
            ArrayLiteral::Float(v) => Some(*v),
            ArrayLiteral::Text(s) => s.trim().parse::<f64>().ok(),
            ArrayLiteral::List(_) => None,
        }
    }
}

impl Scalar for i64 {
    const DTYPE: &'static str = "int";

    fn coerce(literal: &ArrayLiteral) -> Option<Self> {
        match literal {
            ArrayLiteral::Int(v) => Some(*v),
            ArrayLiteral::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            ArrayLiteral::Float(_) => None,
            ArrayLiteral::Text(s) => s.trim().parse::<i64>().ok(),
            ArrayLiteral::List(_) => None,
        }
    }
}

/// One dimension of a shape pattern.
///
/// A pattern contains fixed extents and at most one [`Dim::Any`] wildcard,
/// which absorbs whatever the flat length leaves over. Symbolic dimensions
/// (atom count, basis size) are resolved to [`Dim::Fixed`] by the caller
/// before casting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Fixed(usize),
    Any,
}

fn format_pattern(pattern: &[Dim]) -> String {
    let dims: Vec<String> = pattern
        .iter()
        .map(|d| match d {
            Dim::Fixed(n) => n.to_string(),
            Dim::Any => "-1".to_string(),
        })
        .collect();
    format!("({})", dims.join(", "))
}

fn resolve_pattern(pattern: &[Dim], len: usize) -> Option<Vec<usize>> {
    let mut fixed: usize = 1;
    let mut wildcards = 0usize;
    for dim in pattern {
        match dim {
            Dim::Fixed(n) => fixed = fixed.checked_mul(*n)?,
            Dim::Any => wildcards += 1,
        }
    }

    let inferred = match wildcards {
        0 => {
            if fixed != len {
                return None;
            }
            None
        }
        1 => {
            if fixed == 0 {
                if len != 0 {
                    return None;
                }
                Some(0)
            } else {
                if len % fixed != 0 {
                    return None;
                }
                Some(len / fixed)
            }
        }
        _ => return None,
    };

    Some(
        pattern
            .iter()
            .map(|d| match d {
                Dim::Fixed(n) => *n,
                // resolve_pattern rejects patterns with >1 wildcard above
                Dim::Any => inferred.unwrap_or(0),
            })
            .collect(),
    )
}

/// A shaped, typed numeric array.
///
/// Invariant: `data.len()` equals the product of `shape`. Data is row-major.
/// Serializes as the flat data sequence only; deserializing without external
/// shape metadata yields a rank-1 array.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Scalar> NumericArray<T> {
    /// Wraps flat data as a rank-1 array.
    pub fn from_flat(data: Vec<T>) -> Self {
        let shape = vec![data.len()];
        Self { shape, data }
    }

    /// Casts the array to a shape pattern, consuming it.
    ///
    /// The flat data is untouched; only the logical shape changes. Fails with
    /// a [`ValidationError::Shape`] naming `field` when the flat length does
    /// not fit the pattern.
    pub fn cast(mut self, field: &str, pattern: &[Dim]) -> Result<Self, ValidationError> {
        match resolve_pattern(pattern, self.data.len()) {
            Some(shape) => {
                self.shape = shape;
                Ok(self)
            }
            None => Err(ValidationError::shape(field, format_pattern(pattern))),
        }
    }

    /// The logical shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// The flat, row-major data.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The sole element of a one-element array, if it is one.
    pub fn scalar(&self) -> Option<T> {
        if self.data.len() == 1 {
            Some(self.data[0])
        } else {
            None
        }
    }

    /// Consumes the array, returning the flat data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Serialize> Serialize for NumericArray<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.iter())
    }
}

impl<'de, T: Scalar> Deserialize<'de> for NumericArray<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let literal = ArrayLiteral::deserialize(deserializer)?;
        validate_array("array", &literal, &[Dim::Any]).map_err(serde::de::Error::custom)
    }
}

fn flatten_into<T: Scalar>(
    literal: &ArrayLiteral,
    out: &mut Vec<T>,
) -> Result<(), ValidationError> {
    match literal {
        ArrayLiteral::List(items) => {
            for item in items {
                flatten_into(item, out)?;
            }
            Ok(())
        }
        leaf => match T::coerce(leaf) {
            Some(v) => {
                out.push(v);
                Ok(())
            }
            None => Err(ValidationError::type_coercion(T::DTYPE, leaf)),
        },
    }
}

/// Coerces a wire literal to a typed array of the declared shape.
///
/// The literal is flattened depth-first, every leaf is converted to `T`
/// (failing with [`ValidationError::TypeCoercion`] on the first leaf that is
/// not representable), and the flat result is cast to `pattern` (failing with
/// [`ValidationError::Shape`] naming `field`).
pub fn validate_array<T: Scalar>(
    field: &str,
    literal: &ArrayLiteral,
    pattern: &[Dim],
) -> Result<NumericArray<T>, ValidationError> {
    let mut data = Vec::new();
    flatten_into(literal, &mut data)?;
    NumericArray::from_flat(data).cast(field, pattern)
}

/// Coerces a wire literal expected to hold exactly one scalar.
pub fn validate_scalar<T: Scalar>(
    field: &str,
    literal: &ArrayLiteral,
) -> Result<T, ValidationError> {
    let arr = validate_array::<T>(field, literal, &[Dim::Fixed(1)])?;
    Ok(arr.data[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: serde_json::Value) -> ArrayLiteral {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn coerces_mixed_leaves_to_float() {
        let v = lit(serde_json::json!([130.70939, "23.808861", 6, [1, "2.5"]]));
        let arr = validate_array::<f64>("exponents", &v, &[Dim::Any]).unwrap();
        assert_eq!(arr.data(), &[130.70939, 23.808861, 6.0, 1.0, 2.5]);
        assert_eq!(arr.shape(), &[5]);
    }

    #[test]
    fn coerces_int_array() {
        let v = lit(serde_json::json!([2, 2.0, "2"]));
        let arr = validate_array::<i64>("r_exponents", &v, &[Dim::Any]).unwrap();
        assert_eq!(arr.data(), &[2, 2, 2]);
    }

    #[test]
    fn rejects_non_numeric_text() {
        let v = lit(serde_json::json!([1.0, "abc"]));
        let err = validate_array::<f64>("geometry", &v, &[Dim::Any]).unwrap_err();
        assert_eq!(err.to_string(), "could not cast `abc` to a float array");
    }

    #[test]
    fn rejects_fractional_int() {
        let v = lit(serde_json::json!([2.5]));
        assert!(validate_array::<i64>("r_exponents", &v, &[Dim::Any]).is_err());
    }

    #[test]
    fn casts_with_wildcard() {
        let v = lit(serde_json::json!([1, 2, 3, 4, 5, 6]));
        let arr = validate_array::<f64>("gradient", &v, &[Dim::Any, Dim::Fixed(3)]).unwrap();
        assert_eq!(arr.shape(), &[2, 3]);

        let arr = validate_array::<f64>("matrix", &v, &[Dim::Fixed(3), Dim::Any]).unwrap();
        assert_eq!(arr.shape(), &[3, 2]);
    }

    #[test]
    fn cast_failure_names_field_and_pattern() {
        let v = lit(serde_json::json!([1, 2, 3, 4]));
        let err = validate_array::<f64>("quad", &v, &[Dim::Fixed(3), Dim::Fixed(3)]).unwrap_err();
        assert_eq!(err.to_string(), "`quad` is not castable to shape (3, 3)");

        let err = validate_array::<f64>("mat", &v, &[Dim::Fixed(3), Dim::Any]).unwrap_err();
        assert_eq!(err.to_string(), "`mat` is not castable to shape (3, -1)");
    }

    #[test]
    fn nested_literal_flattens_row_major() {
        let v = lit(serde_json::json!([[1, 2, 3], [4, 5, 6]]));
        let arr = validate_array::<f64>("m", &v, &[Dim::Fixed(2), Dim::Fixed(3)]).unwrap();
        assert_eq!(arr.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(arr.shape(), &[2, 3]);
    }

    #[test]
    fn scalar_collapse() {
        let v = lit(serde_json::json!([5.0]));
        let arr = validate_array::<f64>("e", &v, &[Dim::Any]).unwrap();
        assert_eq!(arr.scalar(), Some(5.0));

        let v = lit(serde_json::json!("-5.0"));
        assert_eq!(validate_scalar::<f64>("e", &v).unwrap(), -5.0);
    }

    #[test]
    fn serializes_flat_regardless_of_rank() {
        let v = lit(serde_json::json!([[1, 2], [3, 4]]));
        let arr = validate_array::<f64>("m", &v, &[Dim::Fixed(2), Dim::Fixed(2)]).unwrap();
        let json = serde_json::to_value(&arr).unwrap();
        assert_eq!(json, serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn flatten_then_recast_round_trips() {
        let v = lit(serde_json::json!([[1, 2], [3, 4], [5, 6]]));
        let arr = validate_array::<f64>("m", &v, &[Dim::Fixed(3), Dim::Fixed(2)]).unwrap();

        let wire = serde_json::to_value(&arr).unwrap();
        let back: NumericArray<f64> = serde_json::from_value(wire).unwrap();
        assert_eq!(back.shape(), &[6]);

        let back = back.cast("m", &[Dim::Fixed(3), Dim::Fixed(2)]).unwrap();
        assert_eq!(back, arr);
    }

    #[test]
    fn zero_sized_patterns() {
        let v = lit(serde_json::json!([]));
        let arr = validate_array::<f64>("empty", &v, &[Dim::Fixed(0), Dim::Any]).unwrap();
        assert_eq!(arr.shape(), &[0, 0]);
        assert!(arr.is_empty());
    }
}
