use std::fs;
use std::sync::Arc;

use nalgebra::DVector;
use permea_rs::discretization::generator::{create_line_mesh, mark_line_ends, mark_volumes};
use permea_rs::discretization::space::FunctionSpace;
use permea_rs::discretization::Discretization;
use permea_rs::physics::expression::NamedExpressions;
use permea_rs::physics::{CellTemperature, Point};
use permea_rs::{BoundaryAssembler, BoundaryError, Problem};

const DEMO_PROBLEM: &str = r#"{
    "boundary_conditions": [
        {"type": "solubility", "surfaces": 1, "S_0": 1.87e24, "E_S": 1.04, "pressure": "pressure_ramp"},
        {"type": "recomb", "surfaces": 2, "Kr_0": 3.2e-15, "E_Kr": 1.16, "order": 2}
    ],
    "temperature_conditions": [
        {"type": "dc", "surfaces": 1, "value": 700.0},
        {"type": "convective_flux", "surfaces": 2, "h_coeff": 5e3, "T_ext": 400.0}
    ],
    "materials": [
        {"id": 1, "S_0": 1.87e24, "E_S": 1.04, "D_0": 4.1e-7, "E_D": 0.39},
        {"id": 2, "S_0": 3.14e24, "E_S": 0.57, "D_0": 6.6e-7, "E_D": 0.39}
    ]
}"#;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let source = match std::env::args().nth(1) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Failed to read {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => DEMO_PROBLEM.to_string(),
    };

    if let Err(e) = run(&source) {
        eprintln!("Boundary setup failed: {}", e);
        std::process::exit(1);
    }
}

fn run(source: &str) -> Result<(), BoundaryError> {
    let problem = Problem::from_json(source)?;

    let num_cells = 20;
    let mesh = create_line_mesh(0.0, 1e-3, num_cells);
    let disc = Discretization {
        space: FunctionSpace::scalar("c"),
        temperature_space: FunctionSpace::scalar("T"),
        surface_markers: mark_line_ends(&mesh, 1, 2),
        volume_markers: Arc::new(mark_volumes(&mesh, |c| if c[0] < 5e-4 { 1 } else { 2 })),
    };

    // initial linear profile, overwritten by the heat boundary values every step
    let mut temp: Vec<f64> = mesh.cells.iter().map(|c| 700.0 - 2e5 * c.centroid[0]).collect();
    let temperature = Arc::new(CellTemperature::new(temp.clone()));
    let compiler = NamedExpressions::new()
        .with("pressure_ramp", |t: f64, _: Point| 1e5 * t.min(1.0));

    let assembler = BoundaryAssembler::new(&problem, &disc, temperature.clone(), &compiler);
    let (bcs, mut expressions) = assembler.build_essential_constraints()?;
    let (form, natural_expressions) = assembler.build_natural_terms()?;
    let (t_bcs, t_expressions) = assembler.build_temperature_constraints()?;
    let (t_form, t_natural_expressions) = assembler.build_temperature_terms()?;
    expressions.extend(natural_expressions);
    expressions.extend(t_expressions);
    expressions.extend(t_natural_expressions);

    println!("--- Boundary setup ---");
    println!("Hydrogen Dirichlet constraints: {}", bcs.len());
    println!("Hydrogen natural terms:         {}", form.terms().len());
    println!("Thermal Dirichlet constraints:  {}", t_bcs.len());
    println!("Thermal natural terms:          {}", t_form.terms().len());
    println!("Expressions to update:          {}", expressions.len());
    println!("----------------------\n");

    let num_vars = disc.space.num_vars();
    let mut u = vec![0.0; num_cells * num_vars];

    for t in [0.0, 0.25, 0.5, 1.0, 2.0] {
        expressions.set_time(t);

        for bc in &t_bcs {
            bc.apply(&mesh, &disc.surface_markers, &mut temp, 1);
        }
        temperature.update(&temp)?;
        for bc in &bcs {
            bc.apply(&mesh, &disc.surface_markers, &mut u, num_vars);
        }

        let r = form.residual(&mesh, &disc.surface_markers, &DVector::from_column_slice(&u));
        let r_t = t_form.residual(&mesh, &disc.surface_markers, &DVector::from_column_slice(&temp));

        println!(
            "t = {:>5.2} | theta_left = {:.4e} | |R_c| = {:.4e} | |R_T| = {:.4e}",
            t,
            u[0],
            r.norm(),
            r_t.norm()
        );
    }

    Ok(())
}
