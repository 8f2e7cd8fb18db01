use std::collections::BTreeMap;

/// The complete computational grid.
pub struct Mesh {
    pub cells: Vec<Cell>,
    pub faces: Vec<Face>,
    pub nodes: Vec<Node>,
}

/// A single control volume.
pub struct Cell {
    pub id: usize,
    pub volume: f64,
    pub centroid: [f64; 3],
    pub face_ids: Vec<usize>,
}

/// An interface between two cells.
pub struct Face {
    pub area: f64,
    pub normal: [f64; 3],
    /// Tuple of (cell1_id, optional cell2_id). `None` indicates a boundary face.
    pub neighbor_cell_ids: (usize, Option<usize>),
    pub centroid: [f64; 3],
}

pub struct Node {
    pub position: [f64; 3],
}

impl Mesh {
    /// Cell owning a boundary face, `None` for interior faces.
    pub fn boundary_cell(&self, face_idx: usize) -> Option<usize> {
        match self.faces.get(face_idx)?.neighbor_cell_ids {
            (k, None) => Some(k),
            (_, Some(_)) => None,
        }
    }
}

/// Surface-marker field: boundary face index -> surface id.
#[derive(Clone, Debug, Default)]
pub struct SurfaceMarkers {
    tags: BTreeMap<usize, u32>,
}

impl SurfaceMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, face_idx: usize, surface: u32) {
        self.tags.insert(face_idx, surface);
    }

    /// Faces tagged with `surface`, in ascending face order.
    pub fn faces(&self, surface: u32) -> impl Iterator<Item = usize> + '_ {
        self.tags
            .iter()
            .filter(move |(_, s)| **s == surface)
            .map(|(f, _)| *f)
    }
}

/// Volume-marker field: cell index -> subdomain id.
#[derive(Clone, Debug, Default)]
pub struct VolumeMarkers(pub Vec<usize>);
