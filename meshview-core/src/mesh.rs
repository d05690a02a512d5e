//! Polygonal surface meshes

use crate::error::{Error, Result};
use crate::traits::Transformable;
use crate::transform::Transform3D;
use crate::{Point3f, Vector3f};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A triangulated surface mesh.
///
/// Faces are stored as triangles; polygon input is fan-triangulated on
/// construction. Optional per-vertex colors come from file loaders and are
/// used when no scalar field is mapped over the mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolyMesh {
    pub points: Vec<Point3f>,
    pub triangles: Vec<[usize; 3]>,
    pub colors: Option<Vec<[u8; 3]>>,
}

impl PolyMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            triangles: Vec::new(),
            colors: None,
        }
    }

    /// Create a mesh from points and triangle faces
    pub fn from_triangles(points: Vec<Point3f>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        for tri in &triangles {
            for &i in tri {
                if i >= points.len() {
                    return Err(Error::InvalidData(format!(
                        "Face index {} out of range for {} points",
                        i,
                        points.len()
                    )));
                }
            }
        }
        Ok(Self {
            points,
            triangles,
            colors: None,
        })
    }

    /// Create a mesh from points and polygon faces.
    ///
    /// Polygons with more than three vertices are fan-triangulated about
    /// their first vertex.
    pub fn from_polygons(points: Vec<Point3f>, polygons: &[Vec<usize>]) -> Result<Self> {
        let mut triangles = Vec::new();
        for poly in polygons {
            if poly.len() < 3 {
                return Err(Error::InvalidData(format!(
                    "Polygon with {} vertices cannot be triangulated",
                    poly.len()
                )));
            }
            triangulate_polygon(poly, &mut triangles);
        }
        Self::from_triangles(points, triangles)
    }

    /// Get the number of points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Per-vertex normals, area-weighted over the incident triangles.
    pub fn vertex_normals(&self) -> Vec<Vector3f> {
        compute_vertex_normals(&self.points, &self.triangles)
    }

    /// The unique undirected edges of the triangulation.
    pub fn edges(&self) -> Vec<[usize; 2]> {
        unique_edges(&self.triangles)
    }

    /// Set vertex colors; ignored if the length does not match the point count.
    pub fn set_colors(&mut self, colors: Vec<[u8; 3]>) {
        if colors.len() == self.points.len() {
            self.colors = Some(colors);
        }
    }

    /// Rotate the mesh about the X axis, in degrees.
    pub fn rotate_x(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_x(degrees));
    }

    /// Rotate the mesh about the Y axis, in degrees.
    pub fn rotate_y(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_y(degrees));
    }

    /// Rotate the mesh about the Z axis, in degrees.
    pub fn rotate_z(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_z(degrees));
    }

    /// Translate the mesh by an offset.
    pub fn translate(&mut self, offset: Vector3f) {
        self.transform(&Transform3D::translation(offset));
    }
}

impl Default for PolyMesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan-triangulate a polygon about its first vertex.
pub fn triangulate_polygon(indices: &[usize], out: &mut Vec<[usize; 3]>) {
    for i in 1..indices.len().saturating_sub(1) {
        out.push([indices[0], indices[i], indices[i + 1]]);
    }
}

/// Area-weighted vertex normals for a triangulated point set.
///
/// Points not referenced by any triangle get a +Z normal so the output
/// always lines up with `points`.
pub fn compute_vertex_normals(points: &[Point3f], triangles: &[[usize; 3]]) -> Vec<Vector3f> {
    let mut normals = vec![Vector3f::zeros(); points.len()];
    for tri in triangles {
        let v0 = points[tri[0]];
        let v1 = points[tri[1]];
        let v2 = points[tri[2]];
        // Cross product magnitude is twice the triangle area, so the
        // accumulated normals come out area weighted.
        let n = (v1 - v0).cross(&(v2 - v0));
        for &i in tri {
            normals[i] += n;
        }
    }
    for n in &mut normals {
        let len = n.norm();
        if len > 1e-12 {
            *n /= len;
        } else {
            *n = Vector3f::new(0.0, 0.0, 1.0);
        }
    }
    normals
}

/// Unique undirected edges of a triangle list, sorted for determinism.
pub fn unique_edges(triangles: &[[usize; 3]]) -> Vec<[usize; 2]> {
    let mut set = HashSet::new();
    for tri in triangles {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            set.insert(if a < b { [a, b] } else { [b, a] });
        }
    }
    let mut edges: Vec<[usize; 2]> = set.into_iter().collect();
    edges.sort_unstable();
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad_mesh() -> PolyMesh {
        let points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        PolyMesh::from_polygons(points, &[vec![0, 1, 2, 3]]).unwrap()
    }

    #[test]
    fn test_fan_triangulation() {
        let mesh = quad_mesh();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_degenerate_polygon_rejected() {
        let points = vec![Point3f::origin(), Point3f::new(1.0, 0.0, 0.0)];
        let result = PolyMesh::from_polygons(points, &[vec![0, 1]]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_face_index_out_of_range() {
        let points = vec![Point3f::origin(), Point3f::new(1.0, 0.0, 0.0)];
        let result = PolyMesh::from_triangles(points, vec![[0, 1, 2]]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_vertex_normals_flat_quad() {
        let mesh = quad_mesh();
        let normals = mesh.vertex_normals();
        assert_eq!(normals.len(), 4);
        for n in normals {
            assert_relative_eq!(n.z.abs(), 1.0, epsilon = 1e-6);
            assert_relative_eq!(n.x, 0.0, epsilon = 1e-6);
            assert_relative_eq!(n.y, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_unique_edges() {
        let mesh = quad_mesh();
        // Two triangles sharing the diagonal: 5 unique edges, not 6.
        let edges = mesh.edges();
        assert_eq!(edges.len(), 5);
        assert!(edges.contains(&[0, 2]));
    }

    #[test]
    fn test_isolated_point_gets_default_normal() {
        let points = vec![Point3f::origin()];
        let normals = compute_vertex_normals(&points, &[]);
        assert_eq!(normals, vec![Vector3f::new(0.0, 0.0, 1.0)]);
    }
}
