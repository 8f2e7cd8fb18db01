use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nalgebra::DVector;
use num_dual::{DualDVec64, jacobian};
use serde_json::json;

use permea_rs::discretization::Discretization;
use permea_rs::discretization::generator::{create_line_mesh, mark_line_ends, mark_volumes};
use permea_rs::discretization::mesh::Mesh;
use permea_rs::discretization::space::FunctionSpace;
use permea_rs::physics::CellTemperature;
use permea_rs::physics::expression::NamedExpressions;
use permea_rs::{BoundaryAssembler, Problem};

fn problem_sizes() -> Vec<usize> {
    vec![100, 1000]
}

fn problem() -> Problem {
    Problem::from_value(json!({
        "boundary_conditions": [
            {"type": "dc", "surfaces": 1, "value": 1e20},
            {"type": "recomb", "surfaces": 2, "Kr_0": 3.2e-15, "E_Kr": 1.16, "order": 2},
            {"type": "mass_flux", "surfaces": 2, "h_coeff": 1e-3, "c_ext": 0.0,
             "solubility_law": "sievert", "pre_exp_liquid": 1e20,
             "activation_energy_liquid": 0.1, "S_0": 1.87e24, "E_S": 1.04}
        ],
        "materials": [
            {"id": 1, "S_0": 1.87e24, "E_S": 1.04},
            {"id": 2, "S_0": 3.14e24, "E_S": 0.57}
        ]
    }))
    .expect("benchmark problem is valid")
}

fn setup(size: usize) -> (Mesh, Discretization) {
    let mesh = create_line_mesh(0.0, 1.0, size);
    let disc = Discretization {
        space: FunctionSpace::scalar("c"),
        temperature_space: FunctionSpace::scalar("T"),
        surface_markers: mark_line_ends(&mesh, 1, 2),
        volume_markers: Arc::new(mark_volumes(&mesh, |c| if c[0] < 0.5 { 1 } else { 2 })),
    };
    (mesh, disc)
}

fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("boundary_assembly");
    let problem = problem();
    let compiler = NamedExpressions::new();
    for &size in &problem_sizes() {
        let (_, disc) = setup(size);
        let temperature = Arc::new(CellTemperature::uniform(size, 600.0));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &_| {
            b.iter(|| {
                let assembler =
                    BoundaryAssembler::new(&problem, &disc, temperature.clone(), &compiler);
                let essential = assembler.build_essential_constraints().expect("essential");
                let natural = assembler.build_natural_terms().expect("natural");
                std::hint::black_box((essential, natural));
            });
        });
    }
    group.finish();
}

fn bench_boundary_jacobian(c: &mut Criterion) {
    let mut group = c.benchmark_group("boundary_jacobian");
    let problem = problem();
    let compiler = NamedExpressions::new();
    for &size in &problem_sizes() {
        let (mesh, disc) = setup(size);
        let temperature = Arc::new(CellTemperature::uniform(size, 600.0));
        let assembler = BoundaryAssembler::new(&problem, &disc, temperature, &compiler);
        let (form, _) = assembler.build_natural_terms().expect("natural");
        let init = DVector::from_element(size, 1e-3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &_| {
            b.iter(|| {
                let (_res, jac) = jacobian(
                    |arg: DVector<DualDVec64>| form.residual(&mesh, &disc.surface_markers, &arg),
                    init.clone(),
                );
                std::hint::black_box(jac);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_assembly, bench_boundary_jacobian);
criterion_main!(benches);
