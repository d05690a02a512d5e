//! Scene state accumulated by a plotting session

use crate::error::{Error, Result};
use crate::mesh::compute_vertex_normals;
use crate::options::MeshOptions;
use crate::{Point3f, Vector3f};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to one mesh entry of a [`Scene`], returned when the mesh is added
/// and required by the update operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshId(pub(crate) usize);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Camera pose: position, focal point and the view-up direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    pub position: Point3f,
    pub focal_point: Point3f,
    pub view_up: Vector3f,
}

impl CameraSpec {
    pub fn new(position: Point3f, focal_point: Point3f, view_up: Vector3f) -> Self {
        Self {
            position,
            focal_point,
            view_up,
        }
    }
}

impl From<([f32; 3], [f32; 3], [f32; 3])> for CameraSpec {
    fn from((position, focal_point, view_up): ([f32; 3], [f32; 3], [f32; 3])) -> Self {
        Self {
            position: Point3f::new(position[0], position[1], position[2]),
            focal_point: Point3f::new(focal_point[0], focal_point[1], focal_point[2]),
            view_up: Vector3f::new(view_up[0], view_up[1], view_up[2]),
        }
    }
}

/// An on-screen text annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub text: String,
    pub font_size: f32,
}

impl TextAnnotation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: 18.0,
        }
    }
}

/// A draw-ready mesh entry: triangulated geometry with derived normals and
/// edges, plus the optional scalar field and display options.
///
/// The revision counter increments on every mutation so a renderer can skip
/// re-uploading geometry that has not changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMesh {
    pub points: Vec<Point3f>,
    pub triangles: Vec<[usize; 3]>,
    pub edges: Vec<[usize; 2]>,
    pub normals: Vec<Vector3f>,
    /// Per-vertex colors from a file, used when no scalars are mapped.
    pub colors: Option<Vec<[u8; 3]>>,
    pub scalars: Option<Vec<f32>>,
    pub options: MeshOptions,
    revision: u64,
}

impl SceneMesh {
    /// Assemble an entry from triangulated geometry. Normals are computed
    /// here so they always line up with the points.
    pub fn from_parts(
        points: Vec<Point3f>,
        triangles: Vec<[usize; 3]>,
        edges: Vec<[usize; 2]>,
        colors: Option<Vec<[u8; 3]>>,
    ) -> Self {
        let normals = compute_vertex_normals(&points, &triangles);
        Self {
            points,
            triangles,
            edges,
            normals,
            colors,
            scalars: None,
            options: MeshOptions::default(),
            revision: 0,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn has_scalars(&self) -> bool {
        self.scalars.is_some()
    }

    /// Replace the scalar field. The length must match the point count;
    /// mismatches are rejected, never truncated or padded.
    pub fn set_scalars(&mut self, scalars: &[f32]) -> Result<()> {
        if scalars.len() != self.points.len() {
            return Err(Error::ScalarLengthMismatch {
                expected: self.points.len(),
                actual: scalars.len(),
            });
        }
        self.scalars = Some(scalars.to_vec());
        self.revision += 1;
        Ok(())
    }

    /// Replace the point coordinates in place and recompute normals. The
    /// point count cannot change through this call.
    pub fn set_points(&mut self, points: &[Point3f]) -> Result<()> {
        if points.len() != self.points.len() {
            return Err(Error::PointCountMismatch {
                expected: self.points.len(),
                actual: points.len(),
            });
        }
        self.points.copy_from_slice(points);
        self.normals = compute_vertex_normals(&self.points, &self.triangles);
        self.revision += 1;
        Ok(())
    }

    /// Mark the entry changed after direct field mutation.
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The range scalars are color-mapped through: the explicit option when
    /// set, otherwise the scalar min/max. `None` without scalars.
    pub fn value_range(&self) -> Option<[f32; 2]> {
        if let Some(range) = self.options.value_range {
            return Some(range);
        }
        let scalars = self.scalars.as_ref()?;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in scalars {
            min = min.min(v);
            max = max.max(v);
        }
        if min > max {
            return None;
        }
        Some([min, max])
    }
}

/// Everything a render call draws: mesh entries in insertion order, text
/// annotations, the camera, background color and the axes-widget flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
    pub annotations: Vec<TextAnnotation>,
    pub camera: Option<CameraSpec>,
    pub background: [f32; 3],
    pub show_axes: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            annotations: Vec::new(),
            camera: None,
            background: [0.3, 0.3, 0.3],
            show_axes: false,
        }
    }

    /// Add a mesh entry; draw order follows insertion order.
    pub fn add_mesh(&mut self, mesh: SceneMesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Result<&SceneMesh> {
        self.meshes.get(id.0).ok_or(Error::MeshNotFound(id))
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Result<&mut SceneMesh> {
        self.meshes.get_mut(id.0).ok_or(Error::MeshNotFound(id))
    }

    /// Bounding box over all mesh entries; `None` for an empty scene.
    pub fn bounds(&self) -> Option<(Point3f, Point3f)> {
        let mut bounds: Option<(Point3f, Point3f)> = None;
        for mesh in &self.meshes {
            for p in &mesh.points {
                match &mut bounds {
                    None => bounds = Some((*p, *p)),
                    Some((min, max)) => {
                        min.x = min.x.min(p.x);
                        min.y = min.y.min(p.y);
                        min.z = min.z.min(p.z);
                        max.x = max.x.max(p.x);
                        max.y = max.y.max(p.y);
                        max.z = max.z.max(p.z);
                    }
                }
            }
        }
        bounds
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_entry() -> SceneMesh {
        let points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        SceneMesh::from_parts(points, vec![[0, 1, 2]], vec![[0, 1], [1, 2], [0, 2]], None)
    }

    #[test]
    fn test_scalar_mismatch_rejected() {
        let mut mesh = triangle_entry();
        let err = mesh.set_scalars(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::ScalarLengthMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(!mesh.has_scalars());
        assert!(mesh.set_scalars(&[1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn test_point_count_fixed_by_update() {
        let mut mesh = triangle_entry();
        let err = mesh.set_points(&[Point3f::origin()]).unwrap_err();
        assert!(matches!(
            err,
            Error::PointCountMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_updates_bump_revision() {
        let mut mesh = triangle_entry();
        assert_eq!(mesh.revision(), 0);
        mesh.set_scalars(&[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(mesh.revision(), 1);
        let moved: Vec<_> = mesh
            .points
            .iter()
            .map(|p| Point3f::new(p.x, p.y, p.z + 1.0))
            .collect();
        mesh.set_points(&moved).unwrap();
        assert_eq!(mesh.revision(), 2);
    }

    #[test]
    fn test_update_recomputes_normals() {
        let mut mesh = triangle_entry();
        // Tip the triangle onto the XZ plane; normals must follow.
        let tipped = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ];
        mesh.set_points(&tipped).unwrap();
        for n in &mesh.normals {
            assert!(n.y.abs() > 0.99);
        }
    }

    #[test]
    fn test_value_range_explicit_wins() {
        let mut mesh = triangle_entry();
        mesh.set_scalars(&[-1.0, 0.0, 3.0]).unwrap();
        assert_eq!(mesh.value_range(), Some([-1.0, 3.0]));
        mesh.options.value_range = Some([-5.0, 5.0]);
        assert_eq!(mesh.value_range(), Some([-5.0, 5.0]));
    }

    #[test]
    fn test_mesh_lookup_errors() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(triangle_entry());
        assert!(scene.mesh(id).is_ok());
        let missing = MeshId(42);
        assert!(matches!(
            scene.mesh(missing),
            Err(Error::MeshNotFound(MeshId(42)))
        ));
    }

    #[test]
    fn test_scene_bounds_union() {
        let mut scene = Scene::new();
        assert!(scene.bounds().is_none());
        scene.add_mesh(triangle_entry());
        let mut far = triangle_entry();
        let shifted: Vec<_> = far
            .points
            .iter()
            .map(|p| Point3f::new(p.x + 10.0, p.y, p.z))
            .collect();
        far.set_points(&shifted).unwrap();
        scene.add_mesh(far);
        let (min, max) = scene.bounds().unwrap();
        assert_eq!(min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3f::new(11.0, 1.0, 0.0));
    }
}
