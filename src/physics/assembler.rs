//! Translation of declared boundary conditions into essential constraints and
//! natural residual terms.

use std::sync::Arc;

use log::{debug, info, warn};

use super::bc::{BoundaryCondition, ConditionKind, FieldTarget};
use super::essential::{DirichletConstraint, ImplantationValue, SolubilityValue};
use super::expression::{ExpressionCompiler, ExpressionRegistry, PointwiseExpression};
use super::theta::{ChemicalPotential, ThetaValue};
use super::weak_form::{BoundaryTerm, NaturalLaw, TemperatureSource, WeakFormContribution};
use super::TemperatureField;
use crate::discretization::Discretization;
use crate::error::{BoundaryError, Result};
use crate::problem::Problem;

pub struct BoundaryAssembler<'a> {
    problem: &'a Problem,
    discretization: &'a Discretization,
    temperature: Arc<dyn TemperatureField>,
    compiler: &'a dyn ExpressionCompiler,
}

impl<'a> BoundaryAssembler<'a> {
    pub fn new(
        problem: &'a Problem,
        discretization: &'a Discretization,
        temperature: Arc<dyn TemperatureField>,
        compiler: &'a dyn ExpressionCompiler,
    ) -> Self {
        Self {
            problem,
            discretization,
            temperature,
            compiler,
        }
    }

    /// Cell-wise solubility table, only when chemical potential conservation is active.
    fn chemical_potential(&self) -> Result<Option<ChemicalPotential>> {
        let materials = &self.problem.materials;
        if !materials.chemical_potential_active() {
            return Ok(None);
        }
        let table = materials.cell_solubilities(&self.discretization.volume_markers)?;
        warn!(
            "Chemical potential conservation switched on by material solubility ({} cells resolved)",
            table.len()
        );
        Ok(Some(ChemicalPotential::new(table)))
    }

    fn hydrogen_component(&self, bc: &BoundaryCondition) -> Result<usize> {
        match bc.field {
            FieldTarget::Component(i) if i < self.discretization.space.num_vars() => Ok(i),
            FieldTarget::Component(i) => Err(BoundaryError::InvalidConfiguration(format!(
                "{bc}: component {i} does not exist in the hydrogen transport space"
            ))),
            FieldTarget::Temperature => Err(BoundaryError::InvalidConfiguration(format!(
                "{bc}: targets the temperature but is declared with the hydrogen transport \
                 conditions"
            ))),
        }
    }

    /// Dirichlet constraints of the hydrogen transport problem.
    ///
    /// Returns one constraint per (condition, surface) pair together with every
    /// expression created on the way, in creation order.
    pub fn build_essential_constraints(
        &self,
    ) -> Result<(Vec<DirichletConstraint>, ExpressionRegistry)> {
        let mut bcs = Vec::new();
        let mut expressions = ExpressionRegistry::default();
        let mut potential: Option<Option<ChemicalPotential>> = None;

        for bc in &self.problem.boundary_conditions {
            let mut value: Arc<dyn PointwiseExpression> = match &bc.kind {
                ConditionKind::FixedValue { value } => {
                    let e: Arc<dyn PointwiseExpression> = value.compile(self.compiler)?;
                    e
                }
                ConditionKind::Solubility {
                    solubility,
                    pressure,
                } => {
                    let pressure = pressure.compile(self.compiler)?;
                    expressions.push(pressure.clone());
                    Arc::new(SolubilityValue::new(
                        *solubility,
                        pressure,
                        self.temperature.clone(),
                    ))
                }
                ConditionKind::ImplantationRecombination {
                    implanted_flux,
                    implantation_depth,
                    diffusivity,
                    recombination,
                } => {
                    let phi = implanted_flux.compile(self.compiler)?;
                    let r_p = implantation_depth.compile(self.compiler)?;
                    expressions.push(phi.clone());
                    expressions.push(r_p.clone());
                    Arc::new(ImplantationValue::new(
                        phi,
                        r_p,
                        *diffusivity,
                        *recombination,
                        self.temperature.clone(),
                    ))
                }
                ConditionKind::Flux { .. }
                | ConditionKind::Recombination { .. }
                | ConditionKind::ConvectiveHeat { .. }
                | ConditionKind::MassTransfer { .. } => continue,
            };

            let component = self.hydrogen_component(bc)?;
            let space = self.discretization.space.select(component)?;

            if component == 0 {
                if potential.is_none() {
                    potential = Some(self.chemical_potential()?);
                }
                if let Some(Some(chem)) = &potential {
                    // the untransformed value keeps its time updated
                    expressions.push(value.clone());
                    value = Arc::new(ThetaValue::new(
                        value,
                        chem.clone(),
                        self.temperature.clone(),
                    ));
                }
            }
            expressions.push(value.clone());

            for surface in bc.surfaces.iter() {
                debug!("Dirichlet {} -> {:?} on surface {}", bc.kind.name(), space, surface);
                bcs.push(DirichletConstraint {
                    space,
                    value: value.clone(),
                    surface,
                });
            }
        }

        info!(
            "Built {} Dirichlet constraints, {} expressions to update",
            bcs.len(),
            expressions.len()
        );
        Ok((bcs, expressions))
    }

    /// Natural boundary terms of the hydrogen transport residual.
    pub fn build_natural_terms(&self) -> Result<(WeakFormContribution, ExpressionRegistry)> {
        let mut expressions = ExpressionRegistry::default();
        let mut terms = Vec::new();

        for bc in &self.problem.boundary_conditions {
            let Some(law) = self.natural_law(&bc.kind, &mut expressions)? else {
                continue;
            };
            let field = self.hydrogen_component(bc)?;
            push_terms(&mut terms, bc, field, law);
        }

        let potential = if terms.is_empty() {
            None
        } else {
            self.chemical_potential()?
        };
        let mut form = WeakFormContribution::new(
            self.discretization.space.num_vars(),
            TemperatureSource::Field(self.temperature.clone()),
            potential,
        );
        for term in terms {
            form.push(term);
        }

        info!(
            "Built {} natural boundary terms, {} expressions to update",
            form.terms().len(),
            expressions.len()
        );
        Ok((form, expressions))
    }

    /// Dirichlet constraints of the heat transfer problem.
    pub fn build_temperature_constraints(
        &self,
    ) -> Result<(Vec<DirichletConstraint>, ExpressionRegistry)> {
        let mut bcs = Vec::new();
        let mut expressions = ExpressionRegistry::default();

        for bc in &self.problem.temperature_conditions {
            check_heat_condition(bc)?;
            let ConditionKind::FixedValue { value } = &bc.kind else {
                continue;
            };
            let value: Arc<dyn PointwiseExpression> = value.compile(self.compiler)?;
            expressions.push(value.clone());

            let space = self.discretization.temperature_space.select(0)?;
            for surface in bc.surfaces.iter() {
                debug!("Dirichlet T on surface {}", surface);
                bcs.push(DirichletConstraint {
                    space,
                    value: value.clone(),
                    surface,
                });
            }
        }
        Ok((bcs, expressions))
    }

    /// Natural boundary terms of the heat transfer residual, where the
    /// temperature is the unknown.
    pub fn build_temperature_terms(&self) -> Result<(WeakFormContribution, ExpressionRegistry)> {
        let mut expressions = ExpressionRegistry::default();
        let mut form = WeakFormContribution::new(
            self.discretization.temperature_space.num_vars(),
            TemperatureSource::Unknown(0),
            None,
        );

        let mut terms = Vec::new();
        for bc in &self.problem.temperature_conditions {
            check_heat_condition(bc)?;
            if let Some(law) = self.natural_law(&bc.kind, &mut expressions)? {
                push_terms(&mut terms, bc, 0, law);
            }
        }
        for term in terms {
            form.push(term);
        }
        Ok((form, expressions))
    }

    /// Flux law of a natural condition, `None` for essential kinds.
    fn natural_law(
        &self,
        kind: &ConditionKind,
        expressions: &mut ExpressionRegistry,
    ) -> Result<Option<NaturalLaw>> {
        let law = match kind {
            ConditionKind::FixedValue { .. }
            | ConditionKind::Solubility { .. }
            | ConditionKind::ImplantationRecombination { .. } => return Ok(None),
            ConditionKind::Flux { value } => {
                let value = value.compile(self.compiler)?;
                expressions.push(value.clone());
                NaturalLaw::Flux { value }
            }
            ConditionKind::Recombination { kr, order } => NaturalLaw::Recombination {
                kr: *kr,
                order: *order,
            },
            ConditionKind::ConvectiveHeat { h_coeff, t_ext } => {
                let h_coeff = h_coeff.compile(self.compiler)?;
                let t_ext = t_ext.compile(self.compiler)?;
                expressions.push(h_coeff.clone());
                expressions.push(t_ext.clone());
                NaturalLaw::ConvectiveHeat { h_coeff, t_ext }
            }
            ConditionKind::MassTransfer {
                h_coeff,
                c_ext,
                law,
                liquid,
                solubility,
            } => {
                let h_coeff = h_coeff.compile(self.compiler)?;
                let c_ext = c_ext.compile(self.compiler)?;
                expressions.push(h_coeff.clone());
                expressions.push(c_ext.clone());
                NaturalLaw::MassTransfer {
                    h_coeff,
                    c_ext,
                    law: *law,
                    liquid: *liquid,
                    solubility: *solubility,
                }
            }
        };
        Ok(Some(law))
    }
}

fn push_terms(terms: &mut Vec<BoundaryTerm>, bc: &BoundaryCondition, field: usize, law: NaturalLaw) {
    for surface in bc.surfaces.iter() {
        debug!("Natural {} on field {} surface {}", bc.kind.name(), field, surface);
        terms.push(BoundaryTerm {
            field,
            surface,
            law: law.clone(),
        });
    }
}

/// Heat transfer accepts `dc`, `flux` and `convective_flux` on the temperature.
fn check_heat_condition(bc: &BoundaryCondition) -> Result<()> {
    match bc.kind {
        ConditionKind::FixedValue { .. }
        | ConditionKind::Flux { .. }
        | ConditionKind::ConvectiveHeat { .. } => {}
        ConditionKind::Solubility { .. }
        | ConditionKind::ImplantationRecombination { .. }
        | ConditionKind::Recombination { .. }
        | ConditionKind::MassTransfer { .. } => {
            return Err(BoundaryError::InvalidConfiguration(format!(
                "{bc}: not a heat transfer condition"
            )))
        }
    }
    match bc.field {
        FieldTarget::Temperature | FieldTarget::Component(0) => Ok(()),
        FieldTarget::Component(_) => Err(BoundaryError::InvalidConfiguration(format!(
            "{bc}: heat transfer conditions act on the temperature only"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::generator::{create_line_mesh, mark_line_ends, mark_volumes};
    use crate::discretization::space::{Field, FunctionSpace, SubSpace};
    use crate::physics::expression::NamedExpressions;
    use crate::physics::{CellTemperature, Point};
    use approx::assert_relative_eq;
    use serde_json::json;

    fn discretization(num_cells: usize, fields: &[&str]) -> Discretization {
        let mesh = create_line_mesh(0.0, 1.0, num_cells);
        Discretization {
            space: FunctionSpace::new(fields.iter().map(|f| Field::from(*f)).collect()),
            temperature_space: FunctionSpace::scalar("T"),
            surface_markers: mark_line_ends(&mesh, 1, 2),
            volume_markers: Arc::new(mark_volumes(&mesh, |_| 1)),
        }
    }

    fn uniform_temperature(num_cells: usize, t: f64) -> Arc<dyn TemperatureField> {
        Arc::new(CellTemperature::uniform(num_cells, t))
    }

    #[test]
    fn one_constraint_per_condition_and_surface() {
        let problem = Problem::from_value(json!({
            "boundary_conditions": [
                {"type": "dc", "surfaces": [1, 2], "value": 0.0},
                {"type": "dc", "surfaces": 3, "value": 1.0},
                {"type": "recomb", "surfaces": 2, "Kr_0": 1e-25, "E_Kr": 0.5, "order": 2}
            ],
            "materials": [{"id": 1, "D_0": 1e-7, "E_D": 0.2}]
        }))
        .unwrap();
        let disc = discretization(4, &["c"]);
        let compiler = NamedExpressions::new();
        let assembler = BoundaryAssembler::new(&problem, &disc, uniform_temperature(4, 500.0), &compiler);

        let (bcs, exprs) = assembler.build_essential_constraints().unwrap();
        assert_eq!(bcs.len(), 3);
        assert_eq!(exprs.len(), 2);
        assert!(bcs.iter().all(|bc| bc.space == SubSpace::Whole));
    }

    #[test]
    fn theta_keeps_both_expressions() {
        let problem = Problem::from_value(json!({
            "boundary_conditions": [
                {"type": "solubility", "surfaces": 1, "S_0": 1e21, "E_S": 0.2, "pressure": 1e5},
                {"type": "dc", "surfaces": 2, "value": 0.0, "component": 1}
            ],
            "materials": [{"id": 1, "S_0": 1e21, "E_S": 0.2}]
        }))
        .unwrap();
        let disc = discretization(4, &["c", "trap"]);
        let compiler = NamedExpressions::new();
        let assembler = BoundaryAssembler::new(&problem, &disc, uniform_temperature(4, 500.0), &compiler);

        let (bcs, exprs) = assembler.build_essential_constraints().unwrap();
        // pressure, Sieverts value, theta value; then the trap value
        assert_eq!(exprs.len(), 4);
        assert_eq!(bcs[0].space, SubSpace::Component(0));
        assert_eq!(bcs[1].space, SubSpace::Component(1));

        // same material on the surface: theta = sqrt(p)
        let x = Point::from([0.0; 3]);
        assert_relative_eq!(bcs[0].value.value(0, x), 1e5f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn missing_material_is_reported_at_setup() {
        let problem = Problem::from_value(json!({
            "boundary_conditions": [{"type": "dc", "surfaces": 1, "value": 1e20}],
            "materials": [{"id": 5, "S_0": 1e21, "E_S": 0.2}]
        }))
        .unwrap();
        let disc = discretization(3, &["c"]);
        let compiler = NamedExpressions::new();
        let assembler = BoundaryAssembler::new(&problem, &disc, uniform_temperature(3, 500.0), &compiler);

        let err = assembler.build_essential_constraints().err().unwrap();
        assert!(matches!(err, BoundaryError::MaterialNotFound(1)));
    }

    #[test]
    fn natural_terms_register_their_expressions() {
        let problem = Problem::from_value(json!({
            "boundary_conditions": [
                {"type": "flux", "surfaces": [1, 2], "value": "pulse"},
                {"type": "mass_flux", "surfaces": 2, "h_coeff": 1e-3, "c_ext": 0.0,
                 "solubility_law": "henry", "pre_exp_liquid": 1e20,
                 "activation_energy_liquid": 0.1, "S_0": 1e21, "E_S": 0.2},
                {"type": "dc", "surfaces": 1, "value": 0.0}
            ],
            "materials": [{"id": 1}]
        }))
        .unwrap();
        let disc = discretization(3, &["c"]);
        let compiler = NamedExpressions::new().with("pulse", |t: f64, _: Point| if t < 1.0 { 1e18 } else { 0.0 });
        let assembler = BoundaryAssembler::new(&problem, &disc, uniform_temperature(3, 500.0), &compiler);

        let (form, exprs) = assembler.build_natural_terms().unwrap();
        assert_eq!(form.terms().len(), 3);
        assert_eq!(exprs.len(), 3);
    }

    #[test]
    fn temperature_condition_in_hydrogen_list_is_rejected() {
        let problem = Problem::from_value(json!({
            "boundary_conditions": [
                {"type": "convective_flux", "surfaces": 1, "h_coeff": 10.0, "T_ext": 300.0}
            ]
        }))
        .unwrap();
        let disc = discretization(3, &["c"]);
        let compiler = NamedExpressions::new();
        let assembler = BoundaryAssembler::new(&problem, &disc, uniform_temperature(3, 500.0), &compiler);
        assert!(matches!(
            assembler.build_natural_terms(),
            Err(BoundaryError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn heat_conditions() {
        let problem = Problem::from_value(json!({
            "boundary_conditions": [],
            "temperature_conditions": [
                {"type": "dc", "surfaces": 1, "value": 800.0},
                {"type": "convective_flux", "surfaces": 2, "h_coeff": 10.0, "T_ext": 300.0}
            ]
        }))
        .unwrap();
        let disc = discretization(3, &["c"]);
        let compiler = NamedExpressions::new();
        let assembler = BoundaryAssembler::new(&problem, &disc, uniform_temperature(3, 500.0), &compiler);

        let (bcs, exprs) = assembler.build_temperature_constraints().unwrap();
        assert_eq!(bcs.len(), 1);
        assert_eq!(exprs.len(), 1);

        let (form, exprs) = assembler.build_temperature_terms().unwrap();
        assert_eq!(form.terms().len(), 1);
        assert_eq!(exprs.len(), 2);
    }

    #[test]
    fn recombination_in_heat_list_is_rejected() {
        let problem = Problem::from_value(json!({
            "temperature_conditions": [
                {"type": "recomb", "surfaces": 1, "Kr_0": 1.0, "E_Kr": 0.0, "order": 2}
            ]
        }))
        .unwrap();
        let disc = discretization(3, &["c"]);
        let compiler = NamedExpressions::new();
        let assembler = BoundaryAssembler::new(&problem, &disc, uniform_temperature(3, 500.0), &compiler);
        assert!(matches!(
            assembler.build_temperature_terms(),
            Err(BoundaryError::InvalidConfiguration(_))
        ));
    }
}
