//! Core traits for meshview

use crate::grid::CellGrid;
use crate::mesh::PolyMesh;
use crate::options::RenderOptions;
use crate::scene::{CameraSpec, Scene, SceneMesh};
use crate::transform::Transform3D;
use crate::{Point3f, Result};

/// Trait for objects with spatial extent.
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}

/// Trait for objects that can be transformed in place.
pub trait Transformable {
    /// Apply a transformation to the object
    fn transform(&mut self, transform: &Transform3D);
}

/// Conversion into a draw-ready scene entry.
///
/// Implementations extract everything a renderer might need regardless of the
/// eventual display style: filled triangles, the wireframe edge set, and any
/// data the source carries (vertex colors, point scalars).
pub trait ToSceneMesh {
    fn to_scene_mesh(&self) -> SceneMesh;
}

/// A CPU-side RGBA frame read back from a renderer.
#[derive(Debug, Clone)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

/// The seam between a plotting session and a graphics backend.
///
/// The session validates and mutates scene state; everything that touches a
/// window or the GPU goes through this trait, which also lets tests stand in
/// a backend that only counts calls.
pub trait RenderBackend {
    /// Draw the scene. Blocks while `options.interactive` is set; returns
    /// the camera pose in effect when the render finished.
    fn render(&mut self, scene: &Scene, options: &RenderOptions) -> Result<CameraSpec>;

    /// Render offscreen at the given pixel size and read the frame back.
    fn screenshot(&mut self, scene: &Scene, size: [u32; 2]) -> Result<RgbaFrame>;

    /// Release windows and GPU resources. Idempotent.
    fn close(&mut self);
}

fn bounds_of(points: &[Point3f]) -> (Point3f, Point3f) {
    if points.is_empty() {
        return (Point3f::origin(), Point3f::origin());
    }
    let mut min = points[0];
    let mut max = points[0];
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }
    (min, max)
}

impl Drawable for PolyMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(&self.points)
    }
}

impl Drawable for CellGrid {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(&self.points)
    }
}

impl Drawable for SceneMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(&self.points)
    }
}

impl Transformable for PolyMesh {
    fn transform(&mut self, transform: &Transform3D) {
        for p in &mut self.points {
            *p = transform.transform_point(p);
        }
    }
}

impl Transformable for CellGrid {
    fn transform(&mut self, transform: &Transform3D) {
        for p in &mut self.points {
            *p = transform.transform_point(p);
        }
        if let Some(vectors) = &mut self.vectors {
            for v in vectors {
                *v = transform.transform_vector(v);
            }
        }
    }
}

impl ToSceneMesh for PolyMesh {
    fn to_scene_mesh(&self) -> SceneMesh {
        SceneMesh::from_parts(
            self.points.clone(),
            self.triangles.clone(),
            self.edges(),
            self.colors.clone(),
        )
    }
}

impl ToSceneMesh for CellGrid {
    fn to_scene_mesh(&self) -> SceneMesh {
        let (triangles, edges) = self.extract_surface();
        let mut entry = SceneMesh::from_parts(self.points.clone(), triangles, edges, None);
        // File-loaded point scalars become the default color mapping.
        entry.scalars = self.scalars.clone();
        entry
    }
}

impl ToSceneMesh for [Point3f] {
    fn to_scene_mesh(&self) -> SceneMesh {
        SceneMesh::from_parts(self.to_vec(), Vec::new(), Vec::new(), None)
    }
}

impl ToSceneMesh for Vec<Point3f> {
    fn to_scene_mesh(&self) -> SceneMesh {
        self.as_slice().to_scene_mesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, CellKind};

    #[test]
    fn test_mesh_center() {
        let points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(2.0, 4.0, 6.0),
        ];
        let mesh = PolyMesh {
            points,
            triangles: Vec::new(),
            colors: None,
        };
        assert_eq!(mesh.center(), Point3f::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_grid_scalars_carry_into_scene() {
        let points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let cell = Cell::new(CellKind::Triangle, vec![0, 1, 2]).unwrap();
        let mut grid = CellGrid::from_cells(points, vec![cell]).unwrap();
        grid.set_scalars("height", vec![0.0, 0.5, 1.0]).unwrap();

        let entry = grid.to_scene_mesh();
        assert_eq!(entry.scalars.as_deref(), Some(&[0.0, 0.5, 1.0][..]));
        assert_eq!(entry.triangles.len(), 1);
        assert_eq!(entry.edges.len(), 3);
    }

    #[test]
    fn test_point_set_to_scene() {
        let points = vec![Point3f::origin(); 5];
        let entry = points.to_scene_mesh();
        assert_eq!(entry.point_count(), 5);
        assert!(entry.triangles.is_empty());
        assert_eq!(entry.normals.len(), 5);
    }
}
