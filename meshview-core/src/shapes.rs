//! Generators for simple meshes and grids

use crate::grid::{Cell, CellGrid, CellKind};
use crate::mesh::PolyMesh;
use crate::{Point3f, Vector3f};

/// A UV sphere at default resolution.
pub fn sphere(radius: f32, center: Point3f) -> PolyMesh {
    sphere_with_resolution(radius, center, 16, 32)
}

/// A UV sphere with `stacks` latitude bands and `slices` longitude segments.
pub fn sphere_with_resolution(
    radius: f32,
    center: Point3f,
    stacks: usize,
    slices: usize,
) -> PolyMesh {
    let stacks = stacks.max(2);
    let slices = slices.max(3);

    let mut points = Vec::with_capacity(2 + (stacks - 1) * slices);
    points.push(center + Vector3f::new(0.0, 0.0, radius));
    for i in 1..stacks {
        let theta = std::f32::consts::PI * i as f32 / stacks as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        for j in 0..slices {
            let phi = std::f32::consts::TAU * j as f32 / slices as f32;
            let (sin_p, cos_p) = phi.sin_cos();
            points.push(
                center
                    + Vector3f::new(
                        radius * sin_t * cos_p,
                        radius * sin_t * sin_p,
                        radius * cos_t,
                    ),
            );
        }
    }
    points.push(center + Vector3f::new(0.0, 0.0, -radius));
    let south = points.len() - 1;

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + (j % slices);
    let mut triangles = Vec::new();
    for j in 0..slices {
        triangles.push([0, ring(1, j), ring(1, j + 1)]);
        triangles.push([south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let a = ring(i, j);
            let b = ring(i, j + 1);
            let c = ring(i + 1, j);
            let d = ring(i + 1, j + 1);
            triangles.push([a, b, d]);
            triangles.push([a, d, c]);
        }
    }

    PolyMesh {
        points,
        triangles,
        colors: None,
    }
}

/// An axis-aligned rectangle in the XY plane, subdivided into a regular
/// triangle grid. The +Z direction is its normal.
pub fn plane(center: Point3f, size: [f32; 2], resolution: [usize; 2]) -> PolyMesh {
    let nx = resolution[0].max(1);
    let ny = resolution[1].max(1);
    let dx = size[0] / nx as f32;
    let dy = size[1] / ny as f32;
    let x0 = center.x - size[0] / 2.0;
    let y0 = center.y - size[1] / 2.0;

    let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            points.push(Point3f::new(
                x0 + i as f32 * dx,
                y0 + j as f32 * dy,
                center.z,
            ));
        }
    }

    let idx = |i: usize, j: usize| j * (nx + 1) + i;
    let mut triangles = Vec::with_capacity(nx * ny * 2);
    for j in 0..ny {
        for i in 0..nx {
            let a = idx(i, j);
            let b = idx(i + 1, j);
            let c = idx(i + 1, j + 1);
            let d = idx(i, j + 1);
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }

    PolyMesh {
        points,
        triangles,
        colors: None,
    }
}

/// A regular hexahedral beam with one corner at the origin: `cells` cells
/// along each axis spanning `size`.
pub fn beam_grid(cells: [usize; 3], size: [f32; 3]) -> CellGrid {
    let n = [cells[0].max(1), cells[1].max(1), cells[2].max(1)];
    let counts = [n[0] + 1, n[1] + 1, n[2] + 1];
    let step = [
        size[0] / n[0] as f32,
        size[1] / n[1] as f32,
        size[2] / n[2] as f32,
    ];

    let mut points = Vec::with_capacity(counts[0] * counts[1] * counts[2]);
    for k in 0..counts[2] {
        for j in 0..counts[1] {
            for i in 0..counts[0] {
                points.push(Point3f::new(
                    i as f32 * step[0],
                    j as f32 * step[1],
                    k as f32 * step[2],
                ));
            }
        }
    }

    let idx = |i: usize, j: usize, k: usize| (k * counts[1] + j) * counts[0] + i;
    let mut grid_cells = Vec::with_capacity(n[0] * n[1] * n[2]);
    for k in 0..n[2] {
        for j in 0..n[1] {
            for i in 0..n[0] {
                grid_cells.push(Cell {
                    kind: CellKind::Hexahedron,
                    indices: vec![
                        idx(i, j, k),
                        idx(i + 1, j, k),
                        idx(i + 1, j + 1, k),
                        idx(i, j + 1, k),
                        idx(i, j, k + 1),
                        idx(i + 1, j, k + 1),
                        idx(i + 1, j + 1, k + 1),
                        idx(i, j + 1, k + 1),
                    ],
                });
            }
        }
    }

    CellGrid {
        points,
        cells: grid_cells,
        scalars: None,
        scalar_name: None,
        vectors: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_is_closed() {
        let mesh = sphere(1.0, Point3f::origin());
        // Euler characteristic of a closed surface of genus zero.
        let v = mesh.point_count() as isize;
        let f = mesh.triangle_count() as isize;
        let e = mesh.edges().len() as isize;
        assert_eq!(v - e + f, 2);
        for p in &mesh.points {
            assert_relative_eq!((p - Point3f::origin()).norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_plane_layout() {
        let mesh = plane(Point3f::new(0.0, 0.0, 2.0), [4.0, 2.0], [4, 2]);
        assert_eq!(mesh.point_count(), 5 * 3);
        assert_eq!(mesh.triangle_count(), 4 * 2 * 2);
        for p in &mesh.points {
            assert_eq!(p.z, 2.0);
            assert!(p.x >= -2.0 && p.x <= 2.0);
            assert!(p.y >= -1.0 && p.y <= 1.0);
        }
    }

    #[test]
    fn test_beam_surface_quads() {
        let grid = beam_grid([2, 2, 2], [1.0, 1.0, 1.0]);
        assert_eq!(grid.point_count(), 27);
        assert_eq!(grid.cell_count(), 8);
        let (triangles, _) = grid.extract_surface();
        // 6 sides of 4 quads each, two triangles per quad.
        assert_eq!(triangles.len(), 48);
    }

    #[test]
    fn test_beam_matches_requested_size() {
        let grid = beam_grid([2, 2, 10], [1.0, 1.0, 5.0]);
        assert_eq!(grid.point_count(), 3 * 3 * 11);
        let max_z = grid.points.iter().map(|p| p.z).fold(f32::MIN, f32::max);
        assert_eq!(max_z, 5.0);
    }
}
