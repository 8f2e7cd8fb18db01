use std::sync::Arc;

use nalgebra::DVector;
use num_dual::DualNum;

use super::expression::Expression;
use super::laws::{self, Arrhenius, SolubilityLaw};
use super::theta::ChemicalPotential;
use super::{Point, TemperatureField};
use crate::discretization::mesh::{Mesh, SurfaceMarkers};

/// Where the laws read the temperature from.
#[derive(Clone)]
pub enum TemperatureSource {
    /// Known field shared with the heat problem.
    Field(Arc<dyn TemperatureField>),
    /// Temperature is the given component of the unknown vector.
    Unknown(usize),
}

/// Local unknowns seen by a flux law on one boundary face.
#[derive(Clone, Debug)]
pub struct BoundaryState<T> {
    /// Value of the field the term is attached to.
    pub value: T,
    /// Mobile hydrogen concentration (converted from theta when needed).
    pub solute: T,
    pub temperature: T,
    pub x: Point,
}

/// Flux law of a natural boundary term.
#[derive(Clone)]
pub enum NaturalLaw {
    Flux {
        value: Arc<Expression>,
    },
    Recombination {
        kr: Arrhenius,
        order: f64,
    },
    ConvectiveHeat {
        h_coeff: Arc<Expression>,
        t_ext: Arc<Expression>,
    },
    MassTransfer {
        h_coeff: Arc<Expression>,
        c_ext: Arc<Expression>,
        law: SolubilityLaw,
        liquid: Arrhenius,
        solubility: Arrhenius,
    },
}

impl NaturalLaw {
    /// Flux entering the domain, `g` in `-g |face|`.
    pub fn flux<T: DualNum<f64>>(&self, state: &BoundaryState<T>) -> T {
        match self {
            NaturalLaw::Flux { value } => T::from(value.eval(state.x)),
            NaturalLaw::Recombination { kr, order } => {
                let kr = kr.at_dual(&state.temperature);
                laws::recombination_flux(&kr, &state.solute, *order)
            }
            NaturalLaw::ConvectiveHeat { h_coeff, t_ext } => {
                -((state.value.clone() - T::from(t_ext.eval(state.x))) * h_coeff.eval(state.x))
            }
            NaturalLaw::MassTransfer {
                h_coeff,
                c_ext,
                law,
                liquid,
                solubility,
            } => {
                let s_metal = solubility.at_dual(&state.temperature);
                let s_liquid = liquid.at_dual(&state.temperature);
                let c_interface = law.interface_concentration(&state.solute, &s_metal, &s_liquid);
                -((c_interface - T::from(c_ext.eval(state.x))) * h_coeff.eval(state.x))
            }
        }
    }
}

pub struct BoundaryTerm {
    /// Index of the field inside a cell block.
    pub field: usize,
    pub surface: u32,
    pub law: NaturalLaw,
}

/// Natural boundary terms of one residual.
///
/// For each boundary face tagged with the term's surface, `-g |face|` is added
/// to the row of the term's field in the face's cell.
pub struct WeakFormContribution {
    num_vars: usize,
    terms: Vec<BoundaryTerm>,
    temperature: TemperatureSource,
    potential: Option<ChemicalPotential>,
}

impl WeakFormContribution {
    pub fn new(
        num_vars: usize,
        temperature: TemperatureSource,
        potential: Option<ChemicalPotential>,
    ) -> Self {
        Self {
            num_vars,
            terms: Vec::new(),
            temperature,
            potential,
        }
    }

    pub fn push(&mut self, term: BoundaryTerm) {
        self.terms.push(term);
    }

    pub fn terms(&self) -> &[BoundaryTerm] {
        &self.terms
    }

    /// Boundary residual for the unknowns `u`.
    pub fn residual<T>(&self, mesh: &Mesh, markers: &SurfaceMarkers, u: &DVector<T>) -> DVector<T>
    where
        T: nalgebra::Scalar + DualNum<f64> + num_traits::Zero,
    {
        let mut residual = DVector::zeros(mesh.cells.len() * self.num_vars);
        self.add_to(mesh, markers, u, &mut residual);
        residual
    }

    /// Accumulate the boundary terms into an existing residual.
    pub fn add_to<T>(
        &self,
        mesh: &Mesh,
        markers: &SurfaceMarkers,
        u: &DVector<T>,
        residual: &mut DVector<T>,
    ) where
        T: nalgebra::Scalar + DualNum<f64> + num_traits::Zero,
    {
        let m = self.num_vars;
        let u = u.as_slice();

        for term in &self.terms {
            for face_idx in markers.faces(term.surface) {
                let Some(k) = mesh.boundary_cell(face_idx) else {
                    continue;
                };
                let face = &mesh.faces[face_idx];
                let state = self.boundary_state(&u[k * m..(k + 1) * m], k, term.field, face.centroid);
                let g = term.law.flux(&state);
                residual[k * m + term.field] -= g * face.area;
            }
        }
    }

    fn boundary_state<T: DualNum<f64>>(
        &self,
        u_k: &[T],
        cell: usize,
        field: usize,
        centroid: [f64; 3],
    ) -> BoundaryState<T> {
        let x = Point::from(centroid);
        let temperature = match &self.temperature {
            TemperatureSource::Field(f) => T::from(f.temperature(cell, x)),
            TemperatureSource::Unknown(i) => u_k[*i].clone(),
        };
        let solute = match &self.potential {
            Some(chem) => chem.to_concentration(u_k[0].clone(), cell, &temperature),
            None => u_k[0].clone(),
        };
        BoundaryState {
            value: u_k[field].clone(),
            solute,
            temperature,
            x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::generator::{create_line_mesh, mark_line_ends};
    use crate::physics::CellTemperature;
    use approx::assert_relative_eq;

    #[test]
    fn prescribed_flux_enters_boundary_rows() {
        let mesh = create_line_mesh(0.0, 1.0, 4);
        let markers = mark_line_ends(&mesh, 1, 2);
        let mut form = WeakFormContribution::new(
            1,
            TemperatureSource::Field(Arc::new(CellTemperature::uniform(4, 300.0))),
            None,
        );
        form.push(BoundaryTerm {
            field: 0,
            surface: 1,
            law: NaturalLaw::Flux {
                value: Arc::new(Expression::constant(5.0)),
            },
        });

        let r = form.residual(&mesh, &markers, &DVector::from_element(4, 1.0));
        assert_relative_eq!(r[0], -5.0);
        assert_relative_eq!(r.rows(1, 3).norm(), 0.0);
    }

    #[test]
    fn convective_heat_cools_a_hot_wall() {
        let law = NaturalLaw::ConvectiveHeat {
            h_coeff: Arc::new(Expression::constant(10.0)),
            t_ext: Arc::new(Expression::constant(300.0)),
        };
        let state = BoundaryState {
            value: 350.0,
            solute: 0.0,
            temperature: 350.0,
            x: Point::from([0.0; 3]),
        };
        assert_relative_eq!(law.flux(&state), -500.0);
    }

    #[test]
    fn mass_transfer_laws_differ_by_exponent() {
        let h = Arc::new(Expression::constant(1.0));
        let c_ext = Arc::new(Expression::constant(0.0));
        let make = |law| NaturalLaw::MassTransfer {
            h_coeff: h.clone(),
            c_ext: c_ext.clone(),
            law,
            liquid: Arrhenius::new(1.0, 0.0),
            solubility: Arrhenius::new(2.0, 0.0),
        };
        let state = BoundaryState {
            value: 6.0,
            solute: 6.0,
            temperature: 500.0,
            x: Point::from([0.0; 3]),
        };
        assert_relative_eq!(make(SolubilityLaw::Sievert).flux(&state), -3.0);
        assert_relative_eq!(make(SolubilityLaw::Henry).flux(&state), -9.0);
    }
}
