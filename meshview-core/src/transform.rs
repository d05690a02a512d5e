//! Rigid transforms applied to meshes and grids

use crate::{Point3f, Vector3f};
use nalgebra::{Matrix4, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D transformation applied to mesh points.
///
/// Angles are taken in degrees, matching the mesh-level convenience methods
/// like [`crate::PolyMesh::rotate_x`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(offset: Vector3f) -> Self {
        Self {
            matrix: Matrix4::new_translation(&offset),
        }
    }

    /// Rotation about the X axis, in degrees
    pub fn rotation_x(degrees: f32) -> Self {
        Self::rotation_about(Vector3::x_axis(), degrees)
    }

    /// Rotation about the Y axis, in degrees
    pub fn rotation_y(degrees: f32) -> Self {
        Self::rotation_about(Vector3::y_axis(), degrees)
    }

    /// Rotation about the Z axis, in degrees
    pub fn rotation_z(degrees: f32) -> Self {
        Self::rotation_about(Vector3::z_axis(), degrees)
    }

    /// Rotation about an arbitrary axis, in degrees
    pub fn rotation_about(axis: Unit<Vector3<f32>>, degrees: f32) -> Self {
        Self {
            matrix: Rotation3::from_axis_angle(&axis, degrees.to_radians()).to_homogeneous(),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3f) -> Point3f {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3f::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Apply the rotational part to a vector
    pub fn transform_vector(&self, vector: &Vector3f) -> Vector3f {
        self.matrix.fixed_view::<3, 3>(0, 0) * vector
    }

    /// Compose this transformation with another
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotate_x_quarter_turn() {
        let t = Transform3D::rotation_x(90.0);
        let p = t.transform_point(&Point3f::new(0.0, 1.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_translation() {
        let t = Transform3D::translation(Vector3f::new(1.0, -2.0, 3.0));
        let p = t.transform_point(&Point3f::origin());
        assert_eq!(p, Point3f::new(1.0, -2.0, 3.0));
        // Vectors are unaffected by translation.
        let v = t.transform_vector(&Vector3f::new(0.0, 1.0, 0.0));
        assert_eq!(v, Vector3f::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_compose_order() {
        let t = Transform3D::translation(Vector3f::new(1.0, 0.0, 0.0))
            .compose(Transform3D::rotation_z(90.0));
        // Rotation applies first, then the translation.
        let p = t.transform_point(&Point3f::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }
}
