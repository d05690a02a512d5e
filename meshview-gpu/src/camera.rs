//! Camera math for scene rendering
//!
//! A [`CameraSpec`] holds the pose the session API deals in (position, focal
//! point, view-up). This module turns that pose into view and projection
//! matrices, derives a pose that frames a bounding box, and implements the
//! orbit/pan/dolly motions the interactive window drives.

use meshview_core::{CameraSpec, Point3f, Scene, Vector3f};
use nalgebra::{Matrix4, Perspective3, Rotation3, Unit};

/// Vertical field of view in radians.
pub fn fov_y() -> f32 {
    30.0_f32.to_radians()
}

/// Perspective3 produces OpenGL clip space with z in [-1, 1]; wgpu clips
/// z to [0, 1].
fn depth_range_correction() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.5, 0.5, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// View matrix for a camera pose.
pub fn view_matrix(spec: &CameraSpec) -> Matrix4<f32> {
    Matrix4::look_at_rh(&spec.position, &spec.focal_point, &spec.view_up)
}

/// Projection matrix with wgpu depth range.
pub fn projection_matrix(aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let perspective = Perspective3::new(aspect, fov_y(), near, far);
    depth_range_correction() * perspective.into_inner()
}

/// Near and far clip planes bracketing a scene of the given radius seen
/// from the given distance.
pub fn clip_planes(distance: f32, radius: f32) -> (f32, f32) {
    let radius = radius.max(1e-3);
    let near = (distance - 2.0 * radius).max(distance * 1e-3).max(1e-4);
    let far = distance + 2.0 * radius;
    (near, far.max(near * 2.0))
}

/// Combined view-projection matrix for a pose looking at a scene of the
/// given radius.
pub fn view_projection(spec: &CameraSpec, aspect: f32, radius: f32) -> Matrix4<f32> {
    let distance = (spec.position - spec.focal_point).norm();
    let (near, far) = clip_planes(distance, radius);
    projection_matrix(aspect, near, far) * view_matrix(spec)
}

/// A camera pose that frames the bounding box from an isometric direction.
pub fn fit_camera(bounds: (Point3f, Point3f)) -> CameraSpec {
    let (min, max) = bounds;
    let center = Point3f::from((min.coords + max.coords) * 0.5);
    let radius = ((max - min).norm() * 0.5).max(1e-3);
    let distance = radius / (fov_y() * 0.5).tan() + radius;
    let direction = Vector3f::new(1.0, 1.0, 1.0).normalize();
    CameraSpec::new(center + direction * distance, center, Vector3f::z())
}

/// The pose a render starts from: the scene camera when one was set,
/// otherwise a pose fitted to the scene bounds.
pub fn initial_camera(scene: &Scene) -> CameraSpec {
    if let Some(spec) = scene.camera {
        return spec;
    }
    match scene.bounds() {
        Some(bounds) => fit_camera(bounds),
        None => CameraSpec::new(
            Point3f::new(3.0, 3.0, 3.0),
            Point3f::origin(),
            Vector3f::z(),
        ),
    }
}

/// Mouse-driven camera motion about a focal point.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub spec: CameraSpec,
}

impl OrbitCamera {
    pub fn new(spec: CameraSpec) -> Self {
        Self { spec }
    }

    pub fn distance(&self) -> f32 {
        (self.spec.position - self.spec.focal_point).norm()
    }

    /// Rotate the eye about the focal point. Angles are radians; positive
    /// `dx` orbits right, positive `dy` orbits up.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let offset = self.spec.position - self.spec.focal_point;
        if offset.norm() <= 0.0 {
            return;
        }
        let up = self.spec.view_up.normalize();
        let yawed = Rotation3::from_axis_angle(&Unit::new_normalize(up), -dx) * offset;

        let right = yawed.cross(&up);
        if right.norm() <= 1e-6 {
            self.spec.position = self.spec.focal_point + yawed;
            return;
        }
        let pitched = Rotation3::from_axis_angle(&Unit::new_normalize(right), dy) * yawed;
        // Stop short of the poles so view_up never degenerates.
        if pitched.normalize().dot(&up).abs() < 0.995 {
            self.spec.position = self.spec.focal_point + pitched;
        } else {
            self.spec.position = self.spec.focal_point + yawed;
        }
    }

    /// Slide the eye and focal point together in the view plane. Deltas are
    /// pixels; `viewport_height` scales them to world units.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let distance = self.distance();
        if distance <= 0.0 || viewport_height <= 0.0 {
            return;
        }
        let forward = (self.spec.focal_point - self.spec.position) / distance;
        let right = forward.cross(&self.spec.view_up);
        if right.norm() <= 1e-6 {
            return;
        }
        let right = right.normalize();
        let up = right.cross(&forward);
        let world_per_pixel = 2.0 * distance * (fov_y() * 0.5).tan() / viewport_height;
        let shift = right * (-dx * world_per_pixel) + up * (dy * world_per_pixel);
        self.spec.position += shift;
        self.spec.focal_point += shift;
    }

    /// Move the eye along the view direction. Positive `amount` moves in.
    pub fn dolly(&mut self, amount: f32) {
        let offset = self.spec.position - self.spec.focal_point;
        let norm = offset.norm();
        if norm <= 0.0 {
            return;
        }
        let distance = (norm * 0.9_f32.powf(amount)).max(1e-4);
        self.spec.position = self.spec.focal_point + offset / norm * distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn looking_down_x() -> CameraSpec {
        CameraSpec::new(
            Point3f::new(5.0, 0.0, 0.0),
            Point3f::origin(),
            Vector3f::z(),
        )
    }

    #[test]
    fn test_view_matrix_moves_focal_point_onto_axis() {
        let view = view_matrix(&looking_down_x());
        let focal = view.transform_point(&Point3::origin());
        assert_relative_eq!(focal.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(focal.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(focal.z, -5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_projection_maps_near_plane_to_zero_depth() {
        let proj = projection_matrix(1.0, 1.0, 10.0);
        let on_near = proj.transform_point(&Point3::new(0.0, 0.0, -1.0));
        let on_far = proj.transform_point(&Point3::new(0.0, 0.0, -10.0));
        assert_relative_eq!(on_near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(on_far.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_fit_camera_sees_whole_box() {
        let bounds = (Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        let spec = fit_camera(bounds);
        assert_relative_eq!(spec.focal_point.x, 0.0, epsilon = 1e-6);
        let radius = 3.0_f32.sqrt();
        let distance = (spec.position - spec.focal_point).norm();
        assert!(distance > radius / (fov_y() * 0.5).tan());
    }

    #[test]
    fn test_initial_camera_prefers_scene_camera() {
        let mut scene = Scene::new();
        // Empty scene falls back to a fixed pose at the origin.
        assert_eq!(initial_camera(&scene).focal_point, Point3f::origin());

        scene.camera = Some(looking_down_x());
        assert_eq!(initial_camera(&scene).position, Point3f::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_orbit_preserves_distance() {
        let mut camera = OrbitCamera::new(looking_down_x());
        let before = camera.distance();
        camera.orbit(0.3, 0.2);
        assert_relative_eq!(camera.distance(), before, epsilon = 1e-4);
        // The focal point does not move when orbiting.
        assert_eq!(camera.spec.focal_point, Point3f::origin());
    }

    #[test]
    fn test_orbit_stops_at_poles() {
        let mut camera = OrbitCamera::new(looking_down_x());
        for _ in 0..100 {
            camera.orbit(0.0, 0.3);
        }
        let toward_up = (camera.spec.position - camera.spec.focal_point)
            .normalize()
            .dot(&camera.spec.view_up);
        assert!(toward_up.abs() < 0.9999);
    }

    #[test]
    fn test_pan_shifts_both_points() {
        let mut camera = OrbitCamera::new(looking_down_x());
        camera.pan(50.0, 0.0, 600.0);
        let moved = camera.spec.focal_point - Point3f::origin();
        assert!(moved.norm() > 0.0);
        assert_relative_eq!(camera.distance(), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_dolly_clamps_at_focal_point() {
        let mut camera = OrbitCamera::new(looking_down_x());
        camera.dolly(1.0);
        assert!(camera.distance() < 5.0);
        for _ in 0..1000 {
            camera.dolly(5.0);
        }
        assert!(camera.distance() > 0.0);
    }
}
