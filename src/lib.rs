//! Boundary-condition engine for coupled hydrogen transport and heat transfer.
//!
//! Declared conditions are turned into Dirichlet constraints on the discrete
//! solution and natural terms added to the residual, together with the
//! time-dependent expressions the stepping loop has to refresh every step.

pub mod discretization;
pub mod error;
pub mod physics;
pub mod problem;

pub use error::{BoundaryError, Result};
pub use physics::assembler::BoundaryAssembler;
pub use problem::Problem;
