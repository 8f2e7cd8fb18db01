use std::sync::Arc;

use super::expression::{Expression, PointwiseExpression};
use super::laws::{self, Arrhenius};
use super::{Point, TemperatureField};
use crate::discretization::mesh::{Mesh, SurfaceMarkers};
use crate::discretization::space::SubSpace;

/// Sieverts' law surface concentration `S(T) sqrt(p)`.
pub struct SolubilityValue {
    solubility: Arrhenius,
    pressure: Arc<Expression>,
    temperature: Arc<dyn TemperatureField>,
}

impl SolubilityValue {
    pub fn new(
        solubility: Arrhenius,
        pressure: Arc<Expression>,
        temperature: Arc<dyn TemperatureField>,
    ) -> Self {
        Self {
            solubility,
            pressure,
            temperature,
        }
    }
}

impl PointwiseExpression for SolubilityValue {
    fn value(&self, cell: usize, x: Point) -> f64 {
        laws::solubility_concentration(
            self.solubility,
            self.pressure.eval(x),
            self.temperature.temperature(cell, x),
        )
    }

    fn set_time(&self, t: f64) {
        self.pressure.set_time(t);
    }

    fn time(&self) -> f64 {
        self.pressure.time()
    }
}

/// Surface concentration under implantation, see [`laws::implantation_concentration`].
pub struct ImplantationValue {
    implanted_flux: Arc<Expression>,
    implantation_depth: Arc<Expression>,
    diffusivity: Arrhenius,
    recombination: Option<Arrhenius>,
    temperature: Arc<dyn TemperatureField>,
}

impl ImplantationValue {
    pub fn new(
        implanted_flux: Arc<Expression>,
        implantation_depth: Arc<Expression>,
        diffusivity: Arrhenius,
        recombination: Option<Arrhenius>,
        temperature: Arc<dyn TemperatureField>,
    ) -> Self {
        Self {
            implanted_flux,
            implantation_depth,
            diffusivity,
            recombination,
            temperature,
        }
    }
}

impl PointwiseExpression for ImplantationValue {
    fn value(&self, cell: usize, x: Point) -> f64 {
        laws::implantation_concentration(
            self.implanted_flux.eval(x),
            self.implantation_depth.eval(x),
            self.diffusivity,
            self.recombination,
            self.temperature.temperature(cell, x),
        )
    }

    fn set_time(&self, t: f64) {
        self.implanted_flux.set_time(t);
        self.implantation_depth.set_time(t);
    }

    fn time(&self) -> f64 {
        self.implanted_flux.time()
    }
}

/// Essential constraint: `value` imposed on `space` over every facet tagged `surface`.
#[derive(Clone)]
pub struct DirichletConstraint {
    pub space: SubSpace,
    pub value: Arc<dyn PointwiseExpression>,
    pub surface: u32,
}

impl DirichletConstraint {
    /// `(cell, value)` for every boundary face of the surface, evaluated at the
    /// face centroid.
    pub fn boundary_values(&self, mesh: &Mesh, markers: &SurfaceMarkers) -> Vec<(usize, f64)> {
        markers
            .faces(self.surface)
            .filter_map(|face_idx| {
                let cell = mesh.boundary_cell(face_idx)?;
                let x = Point::from(mesh.faces[face_idx].centroid);
                Some((cell, self.value.value(cell, x)))
            })
            .collect()
    }

    /// Strong imposition on an interleaved solution vector
    /// (`u[cell * num_vars + component]`).
    pub fn apply(&self, mesh: &Mesh, markers: &SurfaceMarkers, u: &mut [f64], num_vars: usize) {
        let component = self.space.component();
        for (cell, value) in self.boundary_values(mesh, markers) {
            u[cell * num_vars + component] = value;
        }
    }
}
