pub mod generator;
pub mod mesh;
pub mod space;

use std::sync::Arc;

use mesh::{SurfaceMarkers, VolumeMarkers};
use space::FunctionSpace;

/// Everything the boundary engine needs to know about the discretisation.
pub struct Discretization {
    /// Hydrogen transport space (solute plus optional trap components).
    pub space: FunctionSpace,
    pub temperature_space: FunctionSpace,
    pub surface_markers: SurfaceMarkers,
    pub volume_markers: Arc<VolumeMarkers>,
}
