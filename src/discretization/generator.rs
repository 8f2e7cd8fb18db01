use super::mesh::{Cell, Face, Mesh, Node, SurfaceMarkers, VolumeMarkers};

/// Build a 1D line of `num_cells` cells on `[x_min, x_min + width]`.
/// Every cell has unit cross-section, so face areas are 1.
/// Face 0 is the left boundary and face `num_cells` is the right boundary.
///
/// Panics if `num_cells` is zero.
pub fn create_line_mesh(x_min: f64, width: f64, num_cells: usize) -> Mesh {
    assert!(num_cells > 0, "a line mesh needs at least one cell");
    let dx = width / num_cells as f64;

    let nodes: Vec<Node> = (0..num_cells)
        .map(|i| Node {
            position: [x_min + (i as f64 + 0.5) * dx, 0.0, 0.0],
        })
        .collect();

    let cells = (0..num_cells)
        .map(|i| Cell {
            id: i,
            volume: dx,
            centroid: nodes[i].position,
            face_ids: vec![i, i + 1],
        })
        .collect();

    let mut faces = Vec::with_capacity(num_cells + 1);
    faces.push(Face {
        area: 1.0,
        normal: [-1.0, 0.0, 0.0],
        neighbor_cell_ids: (0, None),
        centroid: [x_min, 0.0, 0.0],
    });
    for i in 1..num_cells {
        faces.push(Face {
            area: 1.0,
            normal: [1.0, 0.0, 0.0],
            neighbor_cell_ids: (i - 1, Some(i)),
            centroid: [x_min + i as f64 * dx, 0.0, 0.0],
        });
    }
    faces.push(Face {
        area: 1.0,
        normal: [1.0, 0.0, 0.0],
        neighbor_cell_ids: (num_cells - 1, None),
        centroid: [x_min + width, 0.0, 0.0],
    });

    Mesh {
        cells,
        faces,
        nodes,
    }
}

/// Tag the two end faces of a line mesh.
pub fn mark_line_ends(mesh: &Mesh, left: u32, right: u32) -> SurfaceMarkers {
    let mut markers = SurfaceMarkers::new();
    markers.mark(0, left);
    markers.mark(mesh.faces.len() - 1, right);
    markers
}

/// Assign a subdomain id to every cell from its centroid.
pub fn mark_volumes(mesh: &Mesh, subdomain: impl Fn([f64; 3]) -> usize) -> VolumeMarkers {
    VolumeMarkers(mesh.cells.iter().map(|c| subdomain(c.centroid)).collect())
}
