//! Chemical-potential formulation.
//!
//! When materials with different solubilities meet, the transport problem is
//! solved for `theta = c / S(T)`, which is continuous across the interface.
//! Concentrations prescribed on the boundary are converted to `theta` with the
//! solubility of the material occupying the evaluation cell, and the solute
//! seen by flux laws is converted back to `c = theta S(T)`.

use std::sync::Arc;

use num_dual::DualNum;

use super::expression::PointwiseExpression;
use super::materials::CellSolubility;
use super::{Point, TemperatureField};

/// Cell-wise conversion between concentration and chemical potential.
#[derive(Clone, Debug)]
pub struct ChemicalPotential {
    solubility: CellSolubility,
}

impl ChemicalPotential {
    pub fn new(solubility: CellSolubility) -> Self {
        Self { solubility }
    }

    #[inline]
    pub fn to_theta(&self, c: f64, cell: usize, temperature: f64) -> f64 {
        c / self.solubility.get(cell).at(temperature)
    }

    #[inline]
    pub fn to_concentration<T: DualNum<f64>>(&self, theta: T, cell: usize, temperature: &T) -> T {
        theta * self.solubility.get(cell).at_dual(temperature)
    }
}

/// Dirichlet value expressed in chemical potential.
pub struct ThetaValue {
    concentration: Arc<dyn PointwiseExpression>,
    potential: ChemicalPotential,
    temperature: Arc<dyn TemperatureField>,
}

impl ThetaValue {
    pub fn new(
        concentration: Arc<dyn PointwiseExpression>,
        potential: ChemicalPotential,
        temperature: Arc<dyn TemperatureField>,
    ) -> Self {
        Self {
            concentration,
            potential,
            temperature,
        }
    }
}

impl PointwiseExpression for ThetaValue {
    fn value(&self, cell: usize, x: Point) -> f64 {
        let c = self.concentration.value(cell, x);
        self.potential
            .to_theta(c, cell, self.temperature.temperature(cell, x))
    }

    fn set_time(&self, t: f64) {
        self.concentration.set_time(t);
    }

    fn time(&self) -> f64 {
        self.concentration.time()
    }
}
