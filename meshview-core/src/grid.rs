//! Cell grids: unstructured grids and polydata-style cell collections

use crate::error::{Error, Result};
use crate::mesh::triangulate_polygon;
use crate::traits::Transformable;
use crate::transform::Transform3D;
use crate::{Point3f, Vector3f};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The cell shapes understood by the grid model, numbered as in the VTK
/// legacy file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Vertex,
    PolyVertex,
    Line,
    PolyLine,
    Triangle,
    Polygon,
    Quad,
    Tetra,
    Hexahedron,
    Wedge,
    Pyramid,
}

impl CellKind {
    /// Map a VTK cell type id to a kind, if supported.
    pub fn from_vtk_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Vertex),
            2 => Some(Self::PolyVertex),
            3 => Some(Self::Line),
            4 => Some(Self::PolyLine),
            5 => Some(Self::Triangle),
            7 => Some(Self::Polygon),
            9 => Some(Self::Quad),
            10 => Some(Self::Tetra),
            12 => Some(Self::Hexahedron),
            13 => Some(Self::Wedge),
            14 => Some(Self::Pyramid),
            _ => None,
        }
    }

    /// The VTK cell type id for this kind.
    pub fn vtk_id(&self) -> u32 {
        match self {
            Self::Vertex => 1,
            Self::PolyVertex => 2,
            Self::Line => 3,
            Self::PolyLine => 4,
            Self::Triangle => 5,
            Self::Polygon => 7,
            Self::Quad => 9,
            Self::Tetra => 10,
            Self::Hexahedron => 12,
            Self::Wedge => 13,
            Self::Pyramid => 14,
        }
    }

    /// Fixed point count for the kind, or `None` for variable-size cells.
    pub fn point_count(&self) -> Option<usize> {
        match self {
            Self::Vertex => Some(1),
            Self::Line => Some(2),
            Self::Triangle => Some(3),
            Self::Quad => Some(4),
            Self::Tetra => Some(4),
            Self::Hexahedron => Some(8),
            Self::Wedge => Some(6),
            Self::Pyramid => Some(5),
            Self::PolyVertex | Self::PolyLine | Self::Polygon => None,
        }
    }

    fn min_point_count(&self) -> usize {
        match self {
            Self::PolyVertex => 1,
            Self::PolyLine => 2,
            Self::Polygon => 3,
            _ => self.point_count().unwrap_or(1),
        }
    }

    /// Faces of a volume cell as local vertex index loops; empty for cells
    /// of dimension two or lower.
    fn faces(&self) -> &'static [&'static [usize]] {
        match self {
            Self::Tetra => &[&[0, 1, 2], &[0, 1, 3], &[1, 2, 3], &[0, 2, 3]],
            Self::Hexahedron => &[
                &[0, 1, 2, 3],
                &[4, 5, 6, 7],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
            ],
            Self::Wedge => &[
                &[0, 1, 2],
                &[3, 4, 5],
                &[0, 1, 4, 3],
                &[1, 2, 5, 4],
                &[2, 0, 3, 5],
            ],
            Self::Pyramid => &[
                &[0, 1, 2, 3],
                &[0, 1, 4],
                &[1, 2, 4],
                &[2, 3, 4],
                &[3, 0, 4],
            ],
            _ => &[],
        }
    }
}

/// One cell of a grid: its kind and the point indices it connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub indices: Vec<usize>,
}

impl Cell {
    /// Create a cell, validating the index count against the kind.
    pub fn new(kind: CellKind, indices: Vec<usize>) -> Result<Self> {
        match kind.point_count() {
            Some(expected) if indices.len() != expected => Err(Error::InvalidData(format!(
                "{:?} cell needs {} points, got {}",
                kind,
                expected,
                indices.len()
            ))),
            None if indices.len() < kind.min_point_count() => Err(Error::InvalidData(format!(
                "{:?} cell needs at least {} points, got {}",
                kind,
                kind.min_point_count(),
                indices.len()
            ))),
            _ => Ok(Self { kind, indices }),
        }
    }
}

/// A grid of heterogeneous cells over a shared point set, with optional
/// per-point scalar and vector data as read from legacy grid files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellGrid {
    pub points: Vec<Point3f>,
    pub cells: Vec<Cell>,
    pub scalars: Option<Vec<f32>>,
    pub scalar_name: Option<String>,
    pub vectors: Option<Vec<Vector3f>>,
}

impl CellGrid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            cells: Vec::new(),
            scalars: None,
            scalar_name: None,
            vectors: None,
        }
    }

    /// Create a grid from points and cells, validating cell indices.
    pub fn from_cells(points: Vec<Point3f>, cells: Vec<Cell>) -> Result<Self> {
        for cell in &cells {
            for &i in &cell.indices {
                if i >= points.len() {
                    return Err(Error::InvalidData(format!(
                        "Cell index {} out of range for {} points",
                        i,
                        points.len()
                    )));
                }
            }
        }
        Ok(Self {
            points,
            cells,
            scalars: None,
            scalar_name: None,
            vectors: None,
        })
    }

    /// Get the number of points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Get the number of cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if the grid is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Attach a named per-point scalar array.
    pub fn set_scalars(&mut self, name: impl Into<String>, values: Vec<f32>) -> Result<()> {
        if values.len() != self.points.len() {
            return Err(Error::ScalarLengthMismatch {
                expected: self.points.len(),
                actual: values.len(),
            });
        }
        self.scalars = Some(values);
        self.scalar_name = Some(name.into());
        Ok(())
    }

    /// Attach a per-point vector array.
    pub fn set_vectors(&mut self, values: Vec<Vector3f>) -> Result<()> {
        if values.len() != self.points.len() {
            return Err(Error::InvalidData(format!(
                "Vector array length {} does not match point count {}",
                values.len(),
                self.points.len()
            )));
        }
        self.vectors = Some(values);
        Ok(())
    }

    /// Rotate the grid about the X axis, in degrees.
    pub fn rotate_x(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_x(degrees));
    }

    /// Rotate the grid about the Y axis, in degrees.
    pub fn rotate_y(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_y(degrees));
    }

    /// Rotate the grid about the Z axis, in degrees.
    pub fn rotate_z(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_z(degrees));
    }

    /// Translate the grid by an offset.
    pub fn translate(&mut self, offset: Vector3f) {
        self.transform(&Transform3D::translation(offset));
    }

    /// Extract the exterior surface of the grid.
    ///
    /// Faces shared by two volume cells are interior and dropped; the
    /// remainder is fan-triangulated for filling. The second return value is
    /// the outline edge set of the surviving polygons (plus any line cells),
    /// used for wireframe and edge display. All indices refer to
    /// `self.points`, so per-point scalars apply unchanged.
    pub fn extract_surface(&self) -> (Vec<[usize; 3]>, Vec<[usize; 2]>) {
        let mut counted: HashMap<Vec<usize>, (Vec<usize>, usize)> = HashMap::new();
        let mut triangles = Vec::new();
        let mut edge_set: HashSet<[usize; 2]> = HashSet::new();

        for cell in &self.cells {
            match cell.kind {
                CellKind::Vertex | CellKind::PolyVertex => {}
                CellKind::Line | CellKind::PolyLine => {
                    polyline_edges(&cell.indices, &mut edge_set);
                }
                CellKind::Triangle | CellKind::Quad | CellKind::Polygon => {
                    // 2D cells are surface by definition.
                    triangulate_polygon(&cell.indices, &mut triangles);
                    outline_edges(&cell.indices, &mut edge_set);
                }
                CellKind::Tetra | CellKind::Hexahedron | CellKind::Wedge | CellKind::Pyramid => {
                    for face in cell.kind.faces() {
                        let global: Vec<usize> =
                            face.iter().map(|&i| cell.indices[i]).collect();
                        let mut key = global.clone();
                        key.sort_unstable();
                        let entry = counted.entry(key).or_insert((global, 0));
                        entry.1 += 1;
                    }
                }
            }
        }

        for (face, count) in counted.into_values() {
            if count == 1 {
                triangulate_polygon(&face, &mut triangles);
                outline_edges(&face, &mut edge_set);
            }
        }

        triangles.sort_unstable();
        let mut edges: Vec<[usize; 2]> = edge_set.into_iter().collect();
        edges.sort_unstable();
        (triangles, edges)
    }
}

impl Default for CellGrid {
    fn default() -> Self {
        Self::new()
    }
}

fn outline_edges(polygon: &[usize], set: &mut HashSet<[usize; 2]>) {
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        set.insert(if a < b { [a, b] } else { [b, a] });
    }
}

fn polyline_edges(indices: &[usize], set: &mut HashSet<[usize; 2]>) {
    for pair in indices.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        set.insert(if a < b { [a, b] } else { [b, a] });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_hex_points(z0: f32, z1: f32) -> Vec<Point3f> {
        vec![
            Point3f::new(0.0, 0.0, z0),
            Point3f::new(1.0, 0.0, z0),
            Point3f::new(1.0, 1.0, z0),
            Point3f::new(0.0, 1.0, z0),
            Point3f::new(0.0, 0.0, z1),
            Point3f::new(1.0, 0.0, z1),
            Point3f::new(1.0, 1.0, z1),
            Point3f::new(0.0, 1.0, z1),
        ]
    }

    #[test]
    fn test_cell_arity_checked() {
        assert!(Cell::new(CellKind::Hexahedron, vec![0; 8]).is_ok());
        assert!(Cell::new(CellKind::Hexahedron, vec![0; 7]).is_err());
        assert!(Cell::new(CellKind::PolyLine, vec![0]).is_err());
        assert!(Cell::new(CellKind::Polygon, vec![0, 1, 2, 3, 4]).is_ok());
    }

    #[test]
    fn test_cell_index_range_checked() {
        let points = unit_hex_points(0.0, 1.0);
        let cell = Cell::new(CellKind::Hexahedron, vec![0, 1, 2, 3, 4, 5, 6, 8]).unwrap();
        assert!(CellGrid::from_cells(points, vec![cell]).is_err());
    }

    #[test]
    fn test_single_hex_surface() {
        let points = unit_hex_points(0.0, 1.0);
        let cell = Cell::new(CellKind::Hexahedron, (0..8).collect()).unwrap();
        let grid = CellGrid::from_cells(points, vec![cell]).unwrap();
        let (triangles, edges) = grid.extract_surface();
        // 6 quads fan into 12 triangles; a cube has 12 edges.
        assert_eq!(triangles.len(), 12);
        assert_eq!(edges.len(), 12);
    }

    #[test]
    fn test_shared_face_is_interior() {
        let mut points = unit_hex_points(0.0, 1.0);
        points.extend(unit_hex_points(1.0, 2.0).into_iter().skip(4));
        // Second hex stacked on the first, sharing points 4..8.
        let lower = Cell::new(CellKind::Hexahedron, (0..8).collect()).unwrap();
        let upper =
            Cell::new(CellKind::Hexahedron, vec![4, 5, 6, 7, 8, 9, 10, 11]).unwrap();
        let grid = CellGrid::from_cells(points, vec![lower, upper]).unwrap();
        let (triangles, edges) = grid.extract_surface();
        // 10 exterior quads out of 12 faces; the shared quad never shows up.
        assert_eq!(triangles.len(), 20);
        assert_eq!(edges.len(), 20);
    }

    #[test]
    fn test_tetra_surface() {
        let points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ];
        let cell = Cell::new(CellKind::Tetra, vec![0, 1, 2, 3]).unwrap();
        let grid = CellGrid::from_cells(points, vec![cell]).unwrap();
        let (triangles, edges) = grid.extract_surface();
        assert_eq!(triangles.len(), 4);
        assert_eq!(edges.len(), 6);
    }

    #[test]
    fn test_flat_cells_pass_through() {
        let points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let quad = Cell::new(CellKind::Quad, vec![0, 1, 2, 3]).unwrap();
        let line = Cell::new(CellKind::PolyLine, vec![0, 1, 2]).unwrap();
        let grid = CellGrid::from_cells(points, vec![quad, line]).unwrap();
        let (triangles, edges) = grid.extract_surface();
        assert_eq!(triangles.len(), 2);
        // Quad outline has 4 edges; the polyline adds 0-1 and 1-2, both
        // already present.
        assert_eq!(edges.len(), 4);
    }

    #[test]
    fn test_scalar_length_validated() {
        let points = unit_hex_points(0.0, 1.0);
        let cell = Cell::new(CellKind::Hexahedron, (0..8).collect()).unwrap();
        let mut grid = CellGrid::from_cells(points, vec![cell]).unwrap();
        let err = grid.set_scalars("sample", vec![1.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ScalarLengthMismatch {
                expected: 8,
                actual: 3
            }
        ));
        assert!(grid.set_scalars("sample", vec![1.0; 8]).is_ok());
    }
}
