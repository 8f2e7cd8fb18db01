use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::bc::OneOrMany;
use super::laws::Arrhenius;
use crate::discretization::mesh::VolumeMarkers;
use crate::error::{BoundaryError, Result};

/// Material as declared in the problem description.
#[derive(Clone, Debug, Deserialize)]
pub struct MaterialDecl {
    pub id: OneOrMany<usize>,
    #[serde(rename = "S_0")]
    pub s_0: Option<f64>,
    #[serde(rename = "E_S")]
    pub e_s: Option<f64>,
    #[serde(rename = "D_0")]
    pub d_0: Option<f64>,
    #[serde(rename = "E_D")]
    pub e_d: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Subdomain ids occupied by this material.
    pub ids: Vec<usize>,
    pub solubility: Option<Arrhenius>,
    pub diffusivity: Option<Arrhenius>,
}

fn arrhenius_pair(
    id: &[usize],
    what: &str,
    pre: Option<f64>,
    energy: Option<f64>,
) -> Result<Option<Arrhenius>> {
    match (pre, energy) {
        (Some(p), Some(e)) => Ok(Some(Arrhenius::new(p, e))),
        (None, None) => Ok(None),
        _ => Err(BoundaryError::InvalidConfiguration(format!(
            "material {id:?} defines only part of its {what} parameters"
        ))),
    }
}

impl TryFrom<MaterialDecl> for Material {
    type Error = BoundaryError;

    fn try_from(decl: MaterialDecl) -> Result<Self> {
        let ids = decl.id.into_vec();
        if ids.is_empty() {
            return Err(BoundaryError::InvalidConfiguration(
                "material declared without an id".into(),
            ));
        }
        let solubility = arrhenius_pair(&ids, "solubility (S_0, E_S)", decl.s_0, decl.e_s)?;
        let diffusivity = arrhenius_pair(&ids, "diffusivity (D_0, E_D)", decl.d_0, decl.e_d)?;
        Ok(Material {
            ids,
            solubility,
            diffusivity,
        })
    }
}

impl Material {
    pub fn new(id: usize) -> Self {
        Self {
            ids: vec![id],
            solubility: None,
            diffusivity: None,
        }
    }

    pub fn with_solubility(mut self, s_0: f64, e_s: f64) -> Self {
        self.solubility = Some(Arrhenius::new(s_0, e_s));
        self
    }
}

/// Materials of the problem, indexed by subdomain id.
#[derive(Clone, Debug, Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    by_subdomain: HashMap<usize, usize>,
}

impl MaterialLibrary {
    pub fn new(materials: Vec<Material>) -> Result<Self> {
        let mut by_subdomain = HashMap::new();
        for (idx, mat) in materials.iter().enumerate() {
            for &id in &mat.ids {
                if by_subdomain.insert(id, idx).is_some() {
                    return Err(BoundaryError::InvalidConfiguration(format!(
                        "subdomain {id} is claimed by more than one material"
                    )));
                }
            }
        }
        Ok(Self {
            materials,
            by_subdomain,
        })
    }

    pub fn resolve(&self, subdomain_id: usize) -> Result<&Material> {
        self.by_subdomain
            .get(&subdomain_id)
            .map(|&idx| &self.materials[idx])
            .ok_or(BoundaryError::MaterialNotFound(subdomain_id))
    }

    /// Conservation of chemical potential is switched on as soon as any
    /// material declares solubility parameters.
    pub fn chemical_potential_active(&self) -> bool {
        self.materials.iter().any(|m| m.solubility.is_some())
    }

    /// Solubility of the material in every cell, resolved once.
    pub fn cell_solubilities(&self, volume_markers: &VolumeMarkers) -> Result<CellSolubility> {
        let table = volume_markers
            .0
            .iter()
            .map(|&subdomain| {
                let mat = self.resolve(subdomain)?;
                mat.solubility.ok_or_else(|| {
                    BoundaryError::InvalidConfiguration(format!(
                        "material {:?} has no solubility parameters but chemical potential \
                         conservation is active",
                        mat.ids
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CellSolubility(table.into()))
    }
}

/// Cell index -> solubility of the occupying material.
#[derive(Clone, Debug)]
pub struct CellSolubility(Arc<[Arrhenius]>);

impl CellSolubility {
    #[inline]
    pub fn get(&self, cell: usize) -> Arrhenius {
        self.0[cell]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
