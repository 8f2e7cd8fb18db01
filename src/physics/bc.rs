//! Boundary-condition descriptors.
//!
//! Declarations arrive as loosely typed key/value maps; they are turned once
//! into the closed [`ConditionKind`] enum so the assembler can match
//! exhaustively.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::expression::Coefficient;
use super::laws::{Arrhenius, SolubilityLaw};
use crate::error::{BoundaryError, Result};

/// A lone value or a list of values.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Non-empty set of surface-marker ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surfaces(BTreeSet<u32>);

impl Surfaces {
    pub fn new(ids: impl IntoIterator<Item = u32>) -> Result<Self> {
        let set: BTreeSet<u32> = ids.into_iter().collect();
        if set.is_empty() {
            return Err(BoundaryError::MalformedCondition(
                "boundary condition has an empty surface list".into(),
            ));
        }
        Ok(Self(set))
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl From<u32> for Surfaces {
    fn from(id: u32) -> Self {
        Surfaces(BTreeSet::from([id]))
    }
}

impl TryFrom<OneOrMany<u32>> for Surfaces {
    type Error = BoundaryError;

    fn try_from(raw: OneOrMany<u32>) -> Result<Self> {
        Surfaces::new(raw.into_vec())
    }
}

/// Unknown field a condition acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldTarget {
    /// Component of the hydrogen transport space; 0 is the mobile solute.
    Component(usize),
    Temperature,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Index(usize),
    Name(String),
}

impl TryFrom<RawField> for FieldTarget {
    type Error = BoundaryError;

    fn try_from(raw: RawField) -> Result<Self> {
        match raw {
            RawField::Index(i) => Ok(FieldTarget::Component(i)),
            RawField::Name(name) => match name.as_str() {
                "T" | "temperature" => Ok(FieldTarget::Temperature),
                "solute" => Ok(FieldTarget::Component(0)),
                other => other.parse().map(FieldTarget::Component).map_err(|_| {
                    BoundaryError::MalformedCondition(format!("unknown field `{other}`"))
                }),
            },
        }
    }
}

/// Kind-specific parameters of a boundary condition.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionKind {
    /// `dc`: prescribed value.
    FixedValue { value: Coefficient },
    /// `solubility`: Sieverts' law equilibrium with a gas at `pressure`.
    Solubility {
        solubility: Arrhenius,
        pressure: Coefficient,
    },
    /// `dc_imp`: surface concentration set by an implanted flux.
    ImplantationRecombination {
        implanted_flux: Coefficient,
        implantation_depth: Coefficient,
        diffusivity: Arrhenius,
        /// `None` means instantaneous recombination.
        recombination: Option<Arrhenius>,
    },
    /// `flux`: prescribed inward flux.
    Flux { value: Coefficient },
    /// `recomb`: recombination-limited outflux `-K(T) c^order`.
    Recombination { kr: Arrhenius, order: f64 },
    /// `convective_flux`: heat exchange `-h (T - T_ext)`.
    ConvectiveHeat {
        h_coeff: Coefficient,
        t_ext: Coefficient,
    },
    /// `mass_flux`: mass exchange with a liquid `-h (c_interface - c_ext)`.
    MassTransfer {
        h_coeff: Coefficient,
        c_ext: Coefficient,
        law: SolubilityLaw,
        liquid: Arrhenius,
        solubility: Arrhenius,
    },
}

impl ConditionKind {
    /// Declaration tag of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ConditionKind::FixedValue { .. } => "dc",
            ConditionKind::Solubility { .. } => "solubility",
            ConditionKind::ImplantationRecombination { .. } => "dc_imp",
            ConditionKind::Flux { .. } => "flux",
            ConditionKind::Recombination { .. } => "recomb",
            ConditionKind::ConvectiveHeat { .. } => "convective_flux",
            ConditionKind::MassTransfer { .. } => "mass_flux",
        }
    }

    fn default_field(&self) -> FieldTarget {
        match self {
            ConditionKind::ConvectiveHeat { .. } => FieldTarget::Temperature,
            _ => FieldTarget::Component(0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryCondition {
    pub surfaces: Surfaces,
    pub field: FieldTarget,
    pub kind: ConditionKind,
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let surfaces: Vec<u32> = self.surfaces.iter().collect();
        write!(f, "{} on surfaces {:?} ({:?})", self.kind.name(), surfaces, self.field)
    }
}

impl BoundaryCondition {
    /// Condition on the kind's default field.
    pub fn new(kind: ConditionKind, surfaces: impl Into<Surfaces>) -> Self {
        Self {
            field: kind.default_field(),
            surfaces: surfaces.into(),
            kind,
        }
    }

    /// Parse one declaration of the problem description.
    pub fn from_value(decl: &Value) -> Result<Self> {
        let map = decl.as_object().ok_or_else(|| {
            BoundaryError::MalformedCondition(format!("expected a key/value map, got {decl}"))
        })?;
        let type_bc = match map.get("type") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(BoundaryError::MalformedCondition(format!(
                    "boundary condition type must be a string, got {other}"
                )))
            }
            None => {
                return Err(BoundaryError::MalformedCondition(
                    "missing boundary condition type key".into(),
                ))
            }
        };

        let kind = match type_bc {
            "dc" => {
                let p: ValueParams = params(type_bc, decl)?;
                ConditionKind::FixedValue { value: p.value }
            }
            "solubility" => {
                let p: SolubilityParams = params(type_bc, decl)?;
                ConditionKind::Solubility {
                    solubility: Arrhenius::new(p.s_0, p.e_s),
                    pressure: p.pressure,
                }
            }
            "dc_imp" => {
                let p: ImplantationParams = params(type_bc, decl)?;
                let recombination = match (p.k_0, p.e_k) {
                    (Some(k_0), Some(e_k)) => Some(Arrhenius::new(k_0, e_k)),
                    (None, None) => None,
                    _ => {
                        return Err(BoundaryError::InvalidConfiguration(
                            "dc_imp: K_0 and E_K must be given together".into(),
                        ))
                    }
                };
                ConditionKind::ImplantationRecombination {
                    implanted_flux: p.implanted_flux,
                    implantation_depth: p.implantation_depth,
                    diffusivity: Arrhenius::new(p.d_0, p.e_d),
                    recombination,
                }
            }
            "flux" => {
                let p: ValueParams = params(type_bc, decl)?;
                ConditionKind::Flux { value: p.value }
            }
            "recomb" => {
                let p: RecombParams = params(type_bc, decl)?;
                ConditionKind::Recombination {
                    kr: Arrhenius::new(p.kr_0, p.e_kr),
                    order: p.order,
                }
            }
            "convective_flux" => {
                let p: ConvectiveParams = params(type_bc, decl)?;
                ConditionKind::ConvectiveHeat {
                    h_coeff: p.h_coeff,
                    t_ext: p.t_ext,
                }
            }
            "mass_flux" => {
                let p: MassFluxParams = params(type_bc, decl)?;
                ConditionKind::MassTransfer {
                    h_coeff: p.h_coeff,
                    c_ext: p.c_ext,
                    law: p.solubility_law.parse()?,
                    liquid: Arrhenius::new(p.pre_exp_liquid, p.activation_energy_liquid),
                    solubility: Arrhenius::new(p.s_0, p.e_s),
                }
            }
            other => return Err(BoundaryError::UnknownConditionType(other.to_string())),
        };

        let common: CommonParams = params(type_bc, decl)?;
        let surfaces = Surfaces::try_from(common.surfaces)?;
        let field = match (common.field, common.component) {
            (Some(_), Some(_)) => {
                return Err(BoundaryError::MalformedCondition(format!(
                    "{type_bc}: give either `field` or `component`, not both"
                )))
            }
            (Some(field), None) => field.into(),
            (None, Some(component)) => FieldTarget::Component(component),
            (None, None) => kind.default_field(),
        };

        Ok(Self {
            surfaces,
            field,
            kind,
        })
    }
}

fn params<P: DeserializeOwned>(type_bc: &str, decl: &Value) -> Result<P> {
    P::deserialize(decl)
        .map_err(|e| BoundaryError::MalformedCondition(format!("{type_bc}: {e}")))
}

#[derive(Deserialize)]
struct CommonParams {
    surfaces: OneOrMany<u32>,
    #[serde(default)]
    field: Option<FieldTargetDecl>,
    #[serde(default)]
    component: Option<usize>,
}

#[derive(Deserialize)]
#[serde(try_from = "RawField")]
struct FieldTargetDecl(FieldTarget);

impl TryFrom<RawField> for FieldTargetDecl {
    type Error = BoundaryError;

    fn try_from(raw: RawField) -> Result<Self> {
        FieldTarget::try_from(raw).map(FieldTargetDecl)
    }
}

impl From<FieldTargetDecl> for FieldTarget {
    fn from(decl: FieldTargetDecl) -> Self {
        decl.0
    }
}

#[derive(Deserialize)]
struct ValueParams {
    value: Coefficient,
}

#[derive(Deserialize)]
struct SolubilityParams {
    #[serde(rename = "S_0")]
    s_0: f64,
    #[serde(rename = "E_S")]
    e_s: f64,
    pressure: Coefficient,
}

#[derive(Deserialize)]
struct ImplantationParams {
    implanted_flux: Coefficient,
    implantation_depth: Coefficient,
    #[serde(rename = "D_0")]
    d_0: f64,
    #[serde(rename = "E_D")]
    e_d: f64,
    #[serde(rename = "K_0", default)]
    k_0: Option<f64>,
    #[serde(rename = "E_K", default)]
    e_k: Option<f64>,
}

#[derive(Deserialize)]
struct RecombParams {
    #[serde(rename = "Kr_0")]
    kr_0: f64,
    #[serde(rename = "E_Kr")]
    e_kr: f64,
    order: f64,
}

#[derive(Deserialize)]
struct ConvectiveParams {
    h_coeff: Coefficient,
    #[serde(rename = "T_ext")]
    t_ext: Coefficient,
}

#[derive(Deserialize)]
struct MassFluxParams {
    h_coeff: Coefficient,
    c_ext: Coefficient,
    solubility_law: String,
    pre_exp_liquid: f64,
    activation_energy_liquid: f64,
    #[serde(rename = "S_0")]
    s_0: f64,
    #[serde(rename = "E_S")]
    e_s: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_type_is_malformed() {
        let err = BoundaryCondition::from_value(&json!({"surfaces": 1, "value": 0.0})).unwrap_err();
        assert!(matches!(err, BoundaryError::MalformedCondition(_)));
    }

    #[test]
    fn unknown_type_is_named() {
        let err = BoundaryCondition::from_value(&json!({"type": "bogus", "surfaces": 1}))
            .unwrap_err();
        match err {
            BoundaryError::UnknownConditionType(kind) => assert_eq!(kind, "bogus"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn lone_surface_is_promoted_to_a_set() {
        let lone = BoundaryCondition::from_value(&json!({"type": "dc", "surfaces": 3, "value": 1.0}))
            .unwrap();
        let list =
            BoundaryCondition::from_value(&json!({"type": "dc", "surfaces": [3], "value": 1.0}))
                .unwrap();
        assert_eq!(lone, list);
        assert_eq!(lone.surfaces.iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn empty_surface_list_is_malformed() {
        let err = BoundaryCondition::from_value(&json!({"type": "dc", "surfaces": [], "value": 1.0}))
            .unwrap_err();
        assert!(matches!(err, BoundaryError::MalformedCondition(_)));
    }

    #[test]
    fn missing_parameter_is_malformed() {
        let err = BoundaryCondition::from_value(&json!({"type": "recomb", "surfaces": 1, "Kr_0": 1.0}))
            .unwrap_err();
        match err {
            BoundaryError::MalformedCondition(msg) => assert!(msg.starts_with("recomb")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn convective_flux_defaults_to_temperature() {
        let bc = BoundaryCondition::from_value(&json!({
            "type": "convective_flux", "surfaces": [1, 2], "h_coeff": 10.0, "T_ext": 300.0
        }))
        .unwrap();
        assert_eq!(bc.field, FieldTarget::Temperature);
    }

    #[test]
    fn component_and_field_keys() {
        let by_component = BoundaryCondition::from_value(&json!({
            "type": "dc", "surfaces": 1, "value": 0.0, "component": 1
        }))
        .unwrap();
        let by_field = BoundaryCondition::from_value(&json!({
            "type": "dc", "surfaces": 1, "value": 0.0, "field": "1"
        }))
        .unwrap();
        assert_eq!(by_component.field, FieldTarget::Component(1));
        assert_eq!(by_field.field, FieldTarget::Component(1));
    }

    #[test]
    fn partial_recombination_in_implantation_is_rejected() {
        let err = BoundaryCondition::from_value(&json!({
            "type": "dc_imp", "surfaces": 1, "implanted_flux": 1e20,
            "implantation_depth": 1e-9, "D_0": 1e-7, "E_D": 0.2, "K_0": 1e-25
        }))
        .unwrap_err();
        assert!(matches!(err, BoundaryError::InvalidConfiguration(_)));
    }

    #[test]
    fn mass_flux_rejects_unknown_law() {
        let err = BoundaryCondition::from_value(&json!({
            "type": "mass_flux", "surfaces": 1, "h_coeff": 1.0, "c_ext": 0.0,
            "solubility_law": "raoult", "pre_exp_liquid": 1.0,
            "activation_energy_liquid": 0.0, "S_0": 1.0, "E_S": 0.0
        }))
        .unwrap_err();
        match err {
            BoundaryError::InvalidConfiguration(msg) => assert!(msg.contains("raoult")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
