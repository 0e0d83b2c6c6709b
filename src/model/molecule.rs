//! Minimal molecular carrier nested inside records.
//!
//! Records own molecules but never construct them from scratch; building
//! blocks like symbol normalization, fragment handling, and geometry hashing
//! live with upstream collaborators. This type validates only what the wire
//! contract needs: a geometry castable to `(natom, 3)` and connectivity that
//! stays inside the atom range.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::array::{validate_array, ArrayLiteral, Dim, NumericArray};

/// Raw wire form of a [`Molecule`].
#[derive(Debug, Clone, Deserialize)]
pub struct MoleculeData {
    pub symbols: Vec<String>,
    pub geometry: ArrayLiteral,
    #[serde(default)]
    pub molecular_charge: Option<f64>,
    #[serde(default)]
    pub molecular_multiplicity: Option<u32>,
    #[serde(default)]
    pub connectivity: Option<Vec<(usize, usize, f64)>>,
}

/// A validated molecule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Molecule {
    pub schema_name: String,
    pub symbols: Vec<String>,
    /// Cartesian coordinates, shape `(natom, 3)`, flat on the wire.
    pub geometry: NumericArray<f64>,
    pub molecular_charge: f64,
    pub molecular_multiplicity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<Vec<(usize, usize, f64)>>,
}

impl Molecule {
    /// Validates the geometry shape and connectivity indices.
    pub fn build(data: MoleculeData) -> Result<Self, ValidationError> {
        let natom = data.symbols.len();
        let geometry = validate_array::<f64>(
            "geometry",
            &data.geometry,
            &[Dim::Fixed(natom), Dim::Fixed(3)],
        )?;

        if let Some(connectivity) = &data.connectivity {
            for &(i, j, _) in connectivity {
                if i >= natom || j >= natom {
                    return Err(ValidationError::structural(format!(
                        "connectivity entry ({i}, {j}) is out of range for {natom} atoms"
                    )));
                }
                if i == j {
                    return Err(ValidationError::structural(format!(
                        "connectivity entry ({i}, {j}) bonds an atom to itself"
                    )));
                }
            }
        }

        Ok(Self {
            schema_name: "qcschema_molecule".to_string(),
            symbols: data.symbols,
            geometry,
            molecular_charge: data.molecular_charge.unwrap_or(0.0),
            molecular_multiplicity: data.molecular_multiplicity.unwrap_or(1),
            connectivity: data.connectivity,
        })
    }

    /// Number of atoms.
    #[inline]
    pub fn natom(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn water_data() -> MoleculeData {
        serde_json::from_value(json!({
            "symbols": ["O", "H", "H"],
            "geometry": [0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 0.0],
        }))
        .unwrap()
    }

    #[test]
    fn builds_from_flat_geometry() {
        let mol = Molecule::build(water_data()).unwrap();
        assert_eq!(mol.natom(), 3);
        assert_eq!(mol.geometry.shape(), &[3, 3]);
        assert_eq!(mol.molecular_charge, 0.0);
        assert_eq!(mol.molecular_multiplicity, 1);
    }

    #[test]
    fn builds_from_nested_geometry() {
        let data: MoleculeData = serde_json::from_value(json!({
            "symbols": ["C", "C"],
            "geometry": [[1.54, -1.01, 0.93], [4.07, -0.09, -0.02]],
            "connectivity": [[0, 1, 1.0]],
        }))
        .unwrap();
        let mol = Molecule::build(data).unwrap();
        assert_eq!(mol.geometry.shape(), &[2, 3]);
    }

    #[test]
    fn geometry_length_must_match_symbols() {
        let data: MoleculeData = serde_json::from_value(json!({
            "symbols": ["O", "H"],
            "geometry": [0.0, 0.0, 0.0],
        }))
        .unwrap();
        let err = Molecule::build(data).unwrap_err();
        assert!(err.to_string().contains("castable to shape"));
    }

    #[test]
    fn connectivity_out_of_range() {
        let data: MoleculeData = serde_json::from_value(json!({
            "symbols": ["O", "H", "H"],
            "geometry": [0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 0.0],
            "connectivity": [[0, 7, 1.0]],
        }))
        .unwrap();
        assert!(Molecule::build(data).is_err());
    }

    #[test]
    fn serializes_geometry_flat() {
        let mol = Molecule::build(water_data()).unwrap();
        let json = serde_json::to_value(&mol).unwrap();
        assert_eq!(
            json["geometry"],
            json!([0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 0.0])
        );
    }
}
