use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::physics::bc::BoundaryCondition;
use crate::physics::materials::{Material, MaterialDecl, MaterialLibrary};

/// Declarative problem document as read from JSON.
///
/// Condition entries are kept as raw maps so that a missing or unknown `type`
/// is reported with the boundary-condition error taxonomy rather than as a
/// generic parse failure.
#[derive(Debug, Deserialize)]
pub struct ProblemDecl {
    #[serde(default)]
    pub boundary_conditions: Vec<Value>,
    #[serde(default)]
    pub temperature_conditions: Vec<Value>,
    #[serde(default)]
    pub materials: Vec<MaterialDecl>,
}

/// Boundary conditions and materials of one simulation.
pub struct Problem {
    /// Hydrogen transport conditions.
    pub boundary_conditions: Vec<BoundaryCondition>,
    /// Heat transfer conditions.
    pub temperature_conditions: Vec<BoundaryCondition>,
    pub materials: Arc<MaterialLibrary>,
}

impl Problem {
    pub fn new(
        boundary_conditions: Vec<BoundaryCondition>,
        temperature_conditions: Vec<BoundaryCondition>,
        materials: Vec<Material>,
    ) -> Result<Self> {
        Ok(Self {
            boundary_conditions,
            temperature_conditions,
            materials: Arc::new(MaterialLibrary::new(materials)?),
        })
    }

    pub fn from_json(source: &str) -> Result<Self> {
        let decl: ProblemDecl = serde_json::from_str(source)?;
        Self::from_decl(decl)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let decl: ProblemDecl = serde_json::from_value(value)?;
        Self::from_decl(decl)
    }

    /// Every declaration is validated here, before any constraint is built.
    pub fn from_decl(decl: ProblemDecl) -> Result<Self> {
        let boundary_conditions = decl
            .boundary_conditions
            .iter()
            .map(BoundaryCondition::from_value)
            .collect::<Result<Vec<_>>>()?;
        let temperature_conditions = decl
            .temperature_conditions
            .iter()
            .map(BoundaryCondition::from_value)
            .collect::<Result<Vec<_>>>()?;
        let materials = decl
            .materials
            .into_iter()
            .map(Material::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::new(boundary_conditions, temperature_conditions, materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoundaryError;
    use serde_json::json;

    #[test]
    fn bogus_kind_fails_the_whole_problem() {
        let err = Problem::from_value(json!({
            "boundary_conditions": [
                {"type": "dc", "surfaces": 1, "value": 0.0},
                {"type": "bogus", "surfaces": 2}
            ],
            "materials": [{"id": 1}]
        }))
        .err()
        .expect("bogus kind must fail");
        assert!(matches!(err, BoundaryError::UnknownConditionType(k) if k == "bogus"));
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = Problem::from_json("{ not json").err().expect("must fail");
        assert!(matches!(err, BoundaryError::Json(_)));
    }

    #[test]
    fn partial_material_is_rejected() {
        let err = Problem::from_value(json!({
            "boundary_conditions": [],
            "materials": [{"id": 1, "E_S": 0.2}]
        }))
        .err()
        .expect("partial material must fail");
        assert!(matches!(err, BoundaryError::InvalidConfiguration(_)));
    }
}
