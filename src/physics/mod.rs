pub mod assembler;
pub mod bc;
pub mod essential;
pub mod expression;
pub mod laws;
pub mod materials;
pub mod theta;
pub mod weak_form;

use std::sync::RwLock;

use expression::{Expression, PointwiseExpression};

use crate::error::{BoundaryError, Result};

/// Geometric point in space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<[f64; 3]> for Point {
    fn from(p: [f64; 3]) -> Self {
        Point {
            x: p[0],
            y: p[1],
            z: p[2],
        }
    }
}

/// Read-only view of the temperature field shared with the heat problem.
pub trait TemperatureField: Send + Sync {
    /// Temperature [K] at `x` inside `cell`.
    fn temperature(&self, cell: usize, x: Point) -> f64;
}

/// A prescribed temperature `T(t, x)`.
impl TemperatureField for Expression {
    fn temperature(&self, cell: usize, x: Point) -> f64 {
        self.value(cell, x)
    }
}

/// Cell-wise temperature produced by a separately solved heat problem.
/// The heat solver is the only writer and updates it between steps.
///
/// Holds exactly one value per mesh cell. The number of cells is fixed at
/// construction; asking for a cell outside the table panics.
#[derive(Debug, Default)]
pub struct CellTemperature {
    values: RwLock<Vec<f64>>,
}

impl CellTemperature {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    pub fn uniform(num_cells: usize, temperature: f64) -> Self {
        Self::new(vec![temperature; num_cells])
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the cell values with a new heat solution of the same size.
    pub fn update(&self, values: &[f64]) -> Result<()> {
        let mut guard = self.values.write().unwrap_or_else(|e| e.into_inner());
        if values.len() != guard.len() {
            return Err(BoundaryError::InvalidConfiguration(format!(
                "temperature update has {} values for {} cells",
                values.len(),
                guard.len()
            )));
        }
        guard.copy_from_slice(values);
        Ok(())
    }
}

impl TemperatureField for CellTemperature {
    fn temperature(&self, cell: usize, _x: Point) -> f64 {
        let guard = self.values.read().unwrap_or_else(|e| e.into_inner());
        match guard.get(cell) {
            Some(t) => *t,
            None => panic!("no temperature for cell {cell}, field holds {} cells", guard.len()),
        }
    }
}
