//! Current-generation (schema version 2) records.
//!
//! Each record kind pairs a raw `*Data` wire form with a validated type:
//!
//! - [`atomic`] – Single-point specifications, inputs, and results.
//! - [`optimization`] – Geometry-optimization wrappers and trajectories.
//! - [`torsion`] – Torsion-drive scans over optimization runs.

pub mod atomic;
pub mod optimization;
pub mod torsion;

pub use atomic::{
    AtomicInput, AtomicInputData, AtomicResult, AtomicResultData, AtomicResultProperties,
    AtomicResultPropertiesData, AtomicSpecification, AtomicSpecificationData, ReturnResult,
    WavefunctionData, WavefunctionProperties,
};
pub use optimization::{
    OptimizationInput, OptimizationInputData, OptimizationProperties, OptimizationResult,
    OptimizationResultData, OptimizationSpecification, OptimizationSpecificationData,
};
pub use torsion::{
    TDKeywords, TorsionDriveInput, TorsionDriveInputData, TorsionDriveResult,
    TorsionDriveResultData,
};

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared wire-form fixtures, ported from the upstream schema test data.

    use serde_json::{json, Value};

    pub fn water_json() -> Value {
        json!({
            "symbols": ["O", "H", "H"],
            "geometry": [0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 0.0]
        })
    }

    pub fn ethane_json() -> Value {
        json!({
            "symbols": ["C", "C", "H", "H", "H", "H", "H", "H"],
            "geometry": [
                [1.54034068369141, -1.01730823913235, 0.93128102073425],
                [4.07197633001232, -0.09756825926424, -0.02203578938791],
                [0.00025636057017, 0.00139534039687, 0.00111211603233],
                [1.30983130616505, -3.03614919350581, 0.54918567185649],
                [1.38003941036405, -0.71812565437083, 2.97078783593882],
                [5.61209917480096, -1.11612498901607, 0.90799157528946],
                [4.30241880148479, 1.92102238874847, 0.36057345099335],
                [4.23222331256867, -0.39619160402976, -2.06158817835790]
            ],
            "connectivity": [
                [0, 1, 1.0], [0, 2, 1.0], [0, 3, 1.0], [0, 4, 1.0],
                [1, 5, 1.0], [1, 6, 1.0], [1, 7, 1.0]
            ]
        })
    }

    pub fn result_json(return_result: f64) -> Value {
        json!({
            "molecule": water_json(),
            "driver": "energy",
            "model": {"method": "UFF"},
            "return_result": return_result,
            "success": true,
            "properties": {},
            "provenance": {"creator": "qcel"},
            "stdout": "I ran."
        })
    }

    pub fn optimization_json() -> Value {
        let trajectory: Vec<Value> = (0..5).map(|x| result_json(x as f64)).collect();
        let energies: Vec<Value> = (0..5).map(|x| json!({"return_energy": x as f64})).collect();

        json!({
            "input_data": {
                "specification": {
                    "program": "geomeTRIC",
                    "keywords": {"coordsys": "hdlc"},
                    "extras": {"spec_scratch": true},
                    "specification": {
                        "program": "rdkit",
                        "driver": "gradient",
                        "model": {"method": "UFF"}
                    }
                },
                "initial_molecule": water_json()
            },
            "final_molecule": water_json(),
            "trajectory_results": trajectory,
            "trajectory_properties": energies,
            "success": true,
            "provenance": {"creator": "qcel"},
            "properties": {"return_energy": 4.0, "optimization_iterations": 5},
            "extras": {"result_scratch": 1}
        })
    }

    pub fn torsiondrive_input_json() -> Value {
        json!({
            "keywords": {"dihedrals": [[2, 0, 1, 5]], "grid_spacing": [180]},
            "input_specification": {
                "driver": "gradient",
                "model": {"method": "UFF"}
            },
            "initial_molecule": [ethane_json(), ethane_json()],
            "optimization_spec": {
                "program": "geomeTRIC",
                "keywords": {"coordsys": "hdlc", "maxiter": 500},
                "specification": {
                    "program": "rdkit",
                    "driver": "gradient",
                    "model": {"method": "UFF"}
                }
            }
        })
    }

    pub fn torsiondrive_json() -> Value {
        let mut data = torsiondrive_input_json();
        let object = data.as_object_mut().unwrap();
        object.insert("success".into(), json!(true));
        object.insert("provenance".into(), json!({"creator": "qcel"}));
        object.insert("final_energies".into(), json!({"180": -2.3, "0": -4.5}));
        object.insert(
            "final_molecules".into(),
            json!({"180": ethane_json(), "0": ethane_json()}),
        );
        object.insert(
            "optimization_history".into(),
            json!({
                "180": [optimization_json(), optimization_json()],
                "0": [optimization_json()]
            }),
        );
        data
    }
}
