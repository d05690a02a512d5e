//! Plotting sessions
//!
//! A [`Plotter`] accumulates meshes, text and a camera pose, then draws
//! them on demand. The session owns its scene for its whole lifetime:
//! meshes go in, coordinates and scalars change between renders, and
//! nothing persists after [`Plotter::close`].

use std::path::Path;

use meshview_core::{
    CameraSpec, Error, MeshId, MeshOptions, Point3f, RenderBackend, RenderOptions, Result, Scene,
    TextAnnotation, ToSceneMesh,
};

use crate::offscreen::OffscreenRenderer;
use crate::window::{WindowRenderer, DEFAULT_WINDOW_SIZE};

/// A plotting session.
///
/// ```no_run
/// use meshview_core::{shapes, MeshOptions, Point3f, RenderOptions};
/// use meshview_plot::Plotter;
///
/// let mut plotter = Plotter::new();
/// let sphere = shapes::sphere(1.0, Point3f::origin());
/// plotter.add_mesh(&sphere, None, MeshOptions::surface()).unwrap();
/// plotter.render(&RenderOptions::default()).unwrap();
/// plotter.close();
/// ```
pub struct Plotter {
    scene: Scene,
    backend: Option<Box<dyn RenderBackend>>,
    off_screen: bool,
    title: String,
    closed: bool,
}

impl Plotter {
    pub fn new() -> Self {
        Self::with_title("meshview")
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            scene: Scene::new(),
            backend: None,
            off_screen: false,
            title: title.into(),
            closed: false,
        }
    }

    /// A session that renders to offscreen textures instead of a window.
    pub fn off_screen() -> Self {
        let mut plotter = Self::new();
        plotter.off_screen = true;
        plotter
    }

    /// Use a caller-supplied backend instead of the default window.
    pub fn with_backend(mut self, backend: Box<dyn RenderBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The camera pose from the last render, or the one set by
    /// [`set_camera_position`](Plotter::set_camera_position).
    pub fn camera_position(&self) -> Option<CameraSpec> {
        self.scene.camera
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    /// Add a mesh to the scene. Meshes draw in the order they were added.
    ///
    /// `scalars` attaches a per-point value array for color mapping; its
    /// length must match the mesh point count or the whole add is rejected
    /// and the scene is left unchanged.
    pub fn add_mesh(
        &mut self,
        data: &impl ToSceneMesh,
        scalars: Option<&[f32]>,
        options: MeshOptions,
    ) -> Result<MeshId> {
        self.ensure_open()?;
        let mut entry = data.to_scene_mesh();
        entry.options = options;
        if let Some(values) = scalars {
            entry.set_scalars(values)?;
        }
        Ok(self.scene.add_mesh(entry))
    }

    /// Add a line of text to the window overlay.
    pub fn add_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        self.scene.annotations.push(TextAnnotation::new(text));
        Ok(())
    }

    /// Set the camera pose used by the next render.
    pub fn set_camera_position(
        &mut self,
        position: [f32; 3],
        focal_point: [f32; 3],
        view_up: [f32; 3],
    ) -> Result<()> {
        self.ensure_open()?;
        self.scene.camera = Some(CameraSpec::from((position, focal_point, view_up)));
        Ok(())
    }

    pub fn set_background(&mut self, color: [f32; 3]) -> Result<()> {
        self.ensure_open()?;
        self.scene.background = color;
        Ok(())
    }

    /// Show the orientation axes widget.
    pub fn add_axes(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.scene.show_axes = true;
        Ok(())
    }

    /// Draw the scene.
    ///
    /// With `options.interactive` this blocks until the user closes the
    /// window. The camera pose in effect when the render finished is
    /// returned, and becomes the starting pose of the next render.
    pub fn render(&mut self, options: &RenderOptions) -> Result<CameraSpec> {
        self.ensure_open()?;
        if self.backend.is_none() {
            let backend: Box<dyn RenderBackend> = if self.off_screen {
                Box::new(OffscreenRenderer::new()?)
            } else {
                let size = options.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
                Box::new(WindowRenderer::new(&self.title, size)?)
            };
            self.backend = Some(backend);
        }
        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| Error::Render("No render backend".to_string()))?;
        let camera = backend.render(&self.scene, options)?;
        self.scene.camera = Some(camera);
        Ok(camera)
    }

    /// Replace the point coordinates of a mesh. The point count cannot
    /// change. With `render` set, a passive frame is drawn immediately;
    /// otherwise the change shows up on the next render call.
    pub fn update_coordinates(
        &mut self,
        id: MeshId,
        points: &[Point3f],
        render: bool,
    ) -> Result<()> {
        self.ensure_open()?;
        self.scene.mesh_mut(id)?.set_points(points)?;
        if render {
            self.render(&RenderOptions::new().non_interactive().keep_open())?;
        }
        Ok(())
    }

    /// Replace the scalar array of a mesh. The length must match the mesh
    /// point count. Draws a passive frame when `render` is set.
    pub fn update_scalars(&mut self, id: MeshId, scalars: &[f32], render: bool) -> Result<()> {
        self.ensure_open()?;
        self.scene.mesh_mut(id)?.set_scalars(scalars)?;
        if render {
            self.render(&RenderOptions::new().non_interactive().keep_open())?;
        }
        Ok(())
    }

    /// Render offscreen and write the frame to `path` as an image. The
    /// format follows the file extension; PNG is the usual choice.
    pub fn screenshot(&mut self, path: impl AsRef<Path>, size: Option<[u32; 2]>) -> Result<()> {
        self.ensure_open()?;
        let size = size.unwrap_or(DEFAULT_WINDOW_SIZE);
        let frame = match self.backend.as_mut() {
            Some(backend) => backend.screenshot(&self.scene, size)?,
            None => {
                let mut backend = OffscreenRenderer::new()?;
                let frame = backend.screenshot(&self.scene, size)?;
                if self.off_screen {
                    self.backend = Some(Box::new(backend));
                }
                frame
            }
        };

        let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.pixels)
            .ok_or_else(|| Error::Render("Frame size does not match pixel data".to_string()))?;
        image
            .save(path.as_ref())
            .map_err(|e| Error::Render(format!("Failed to write image: {}", e)))?;
        log::info!("Wrote screenshot to {}", path.as_ref().display());
        Ok(())
    }

    /// End the session and release the window and GPU resources. Safe to
    /// call more than once; every operation after this fails with
    /// [`Error::SessionClosed`].
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.close();
        }
        self.closed = true;
    }
}

impl Default for Plotter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Plotter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Display a single mesh in a one-off interactive session.
pub fn plot(data: &impl ToSceneMesh, options: MeshOptions) -> Result<CameraSpec> {
    let mut plotter = Plotter::new();
    plotter.add_mesh(data, None, options)?;
    let camera = plotter.render(&RenderOptions::default())?;
    plotter.close();
    Ok(camera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::{shapes, RgbaFrame, Vector3f};
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counts {
        renders: usize,
        closes: usize,
    }

    /// Stand-in backend that records calls instead of touching a GPU.
    struct CountingBackend {
        counts: Rc<RefCell<Counts>>,
    }

    impl CountingBackend {
        fn pair() -> (Rc<RefCell<Counts>>, Box<dyn RenderBackend>) {
            let counts = Rc::new(RefCell::new(Counts::default()));
            let backend = Box::new(CountingBackend {
                counts: counts.clone(),
            });
            (counts, backend)
        }
    }

    impl RenderBackend for CountingBackend {
        fn render(&mut self, _scene: &Scene, _options: &RenderOptions) -> Result<CameraSpec> {
            self.counts.borrow_mut().renders += 1;
            Ok(CameraSpec::new(
                Point3f::new(9.0, 0.0, 0.0),
                Point3f::origin(),
                Vector3f::z(),
            ))
        }

        fn screenshot(&mut self, _scene: &Scene, size: [u32; 2]) -> Result<RgbaFrame> {
            Ok(RgbaFrame {
                width: size[0],
                height: size[1],
                pixels: vec![0; (size[0] * size[1] * 4) as usize],
            })
        }

        fn close(&mut self) {
            self.counts.borrow_mut().closes += 1;
        }
    }

    fn counting_plotter() -> (Rc<RefCell<Counts>>, Plotter) {
        let (counts, backend) = CountingBackend::pair();
        (counts, Plotter::new().with_backend(backend))
    }

    #[test]
    fn test_add_mesh_rejects_scalar_mismatch() {
        let (_, mut plotter) = counting_plotter();
        let sphere = shapes::sphere(1.0, Point3f::origin());

        let result = plotter.add_mesh(&sphere, Some(&[1.0, 2.0]), MeshOptions::surface());
        assert!(matches!(
            result,
            Err(Error::ScalarLengthMismatch { actual: 2, .. })
        ));
        // The rejected mesh must not appear in the scene.
        assert!(plotter.scene().meshes.is_empty());
    }

    #[test]
    fn test_add_mesh_keeps_insertion_order() {
        let (_, mut plotter) = counting_plotter();
        let sphere = shapes::sphere(1.0, Point3f::origin());
        let plane = shapes::plane(Point3f::origin(), [2.0, 2.0], [1, 1]);

        let first = plotter
            .add_mesh(&sphere, None, MeshOptions::surface().with_color([1.0, 0.0, 0.0]))
            .unwrap();
        let second = plotter.add_mesh(&plane, None, MeshOptions::wireframe()).unwrap();
        assert_ne!(first, second);

        let scene = plotter.scene();
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.mesh(first).unwrap().options.color, [1.0, 0.0, 0.0]);
        assert_eq!(scene.mesh(first).unwrap().point_count(), sphere.point_count());
        assert_eq!(scene.mesh(second).unwrap().point_count(), plane.point_count());
    }

    #[test]
    fn test_update_without_render_defers_draw() {
        let (counts, mut plotter) = counting_plotter();
        let plane = shapes::plane(Point3f::origin(), [2.0, 2.0], [1, 1]);
        let id = plotter.add_mesh(&plane, None, MeshOptions::surface()).unwrap();

        let lifted: Vec<Point3f> = plane
            .points
            .iter()
            .map(|p| Point3f::new(p.x, p.y, p.z + 1.0))
            .collect();
        plotter.update_coordinates(id, &lifted, false).unwrap();
        plotter
            .update_scalars(id, &vec![0.5; plane.point_count()], false)
            .unwrap();
        assert_eq!(counts.borrow().renders, 0);

        // The scene still took the mutation.
        assert_eq!(plotter.scene().mesh(id).unwrap().points[0].z, 1.0);
        assert!(plotter.scene().mesh(id).unwrap().has_scalars());
    }

    #[test]
    fn test_update_with_render_draws_once() {
        let (counts, mut plotter) = counting_plotter();
        let plane = shapes::plane(Point3f::origin(), [2.0, 2.0], [1, 1]);
        let id = plotter.add_mesh(&plane, None, MeshOptions::surface()).unwrap();

        plotter
            .update_scalars(id, &vec![1.0; plane.point_count()], true)
            .unwrap();
        assert_eq!(counts.borrow().renders, 1);
    }

    #[test]
    fn test_update_unknown_mesh_fails() {
        let (_, mut other) = counting_plotter();
        let sphere = shapes::sphere(1.0, Point3f::origin());
        other.add_mesh(&sphere, None, MeshOptions::surface()).unwrap();
        let stale = other
            .add_mesh(&sphere, None, MeshOptions::surface())
            .unwrap();

        // A handle from another session does not resolve here.
        let (_, mut plotter) = counting_plotter();
        plotter.add_mesh(&sphere, None, MeshOptions::surface()).unwrap();
        let result = plotter.update_scalars(stale, &[1.0], false);
        assert!(matches!(result, Err(Error::MeshNotFound(_))));
    }

    #[test]
    fn test_update_rejects_point_count_change() {
        let (_, mut plotter) = counting_plotter();
        let plane = shapes::plane(Point3f::origin(), [2.0, 2.0], [1, 1]);
        let id = plotter.add_mesh(&plane, None, MeshOptions::surface()).unwrap();

        let result = plotter.update_coordinates(id, &[Point3f::origin()], false);
        assert!(matches!(result, Err(Error::PointCountMismatch { .. })));
    }

    #[test]
    fn test_render_writes_camera_back() {
        let (counts, mut plotter) = counting_plotter();
        plotter
            .add_mesh(
                &shapes::sphere(1.0, Point3f::origin()),
                None,
                MeshOptions::surface(),
            )
            .unwrap();

        let camera = plotter
            .render(&RenderOptions::new().non_interactive())
            .unwrap();
        assert_eq!(counts.borrow().renders, 1);
        assert_eq!(camera.position, Point3f::new(9.0, 0.0, 0.0));
        assert_eq!(plotter.camera_position(), Some(camera));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (counts, mut plotter) = counting_plotter();
        plotter.close();
        plotter.close();
        assert_eq!(counts.borrow().closes, 1);
    }

    #[test]
    fn test_operations_after_close_fail() {
        let (_, mut plotter) = counting_plotter();
        let sphere = shapes::sphere(1.0, Point3f::origin());
        let id = plotter.add_mesh(&sphere, None, MeshOptions::surface()).unwrap();
        plotter.close();

        assert!(matches!(
            plotter.add_mesh(&sphere, None, MeshOptions::surface()),
            Err(Error::SessionClosed)
        ));
        assert!(matches!(plotter.add_text("late"), Err(Error::SessionClosed)));
        assert!(matches!(
            plotter.render(&RenderOptions::default()),
            Err(Error::SessionClosed)
        ));
        assert!(matches!(
            plotter.update_scalars(id, &[1.0], false),
            Err(Error::SessionClosed)
        ));
    }

    #[test]
    fn test_add_text_appends_annotations() {
        let (_, mut plotter) = counting_plotter();
        plotter.add_text("first line").unwrap();
        plotter.add_text("second line").unwrap();
        let scene = plotter.scene();
        assert_eq!(scene.annotations.len(), 2);
        assert_eq!(scene.annotations[0].text, "first line");
    }

    #[test]
    fn test_set_camera_position_round_trips() {
        let (_, mut plotter) = counting_plotter();
        plotter
            .set_camera_position([11.9, 6.1, 3.6], [0.0, 0.375, 2.0], [-0.43, 0.9, -0.07])
            .unwrap();
        let camera = plotter.camera_position().unwrap();
        assert_eq!(camera.position, Point3f::new(11.9, 6.1, 3.6));
        assert_eq!(camera.focal_point, Point3f::new(0.0, 0.375, 2.0));
    }

    #[test]
    fn test_screenshot_writes_image() {
        let (_, mut plotter) = counting_plotter();
        plotter
            .add_mesh(
                &shapes::sphere(1.0, Point3f::origin()),
                None,
                MeshOptions::surface(),
            )
            .unwrap();

        let path = "test_plotter_screenshot.png";
        plotter.screenshot(path, Some([8, 8])).unwrap();
        assert!(std::path::Path::new(path).exists());
        fs::remove_file(path).unwrap();
    }
}
