//! Headless render backend
//!
//! Draws every frame into an offscreen texture instead of a window. Used
//! for screenshot-only sessions and anywhere a display is unavailable.

use meshview_core::{CameraSpec, RenderBackend, RenderOptions, Result, RgbaFrame, Scene};
use meshview_gpu::{
    camera, render_offscreen, GpuContext, OverlayRenderer, SceneRenderer, OFFSCREEN_FORMAT,
};

use crate::window::DEFAULT_WINDOW_SIZE;

pub struct OffscreenRenderer {
    context: GpuContext,
    renderer: SceneRenderer,
    overlay: OverlayRenderer,
    size: [u32; 2],
    last_frame: Option<RgbaFrame>,
}

impl OffscreenRenderer {
    pub fn new() -> Result<Self> {
        let context = GpuContext::new_blocking()?;
        let renderer = SceneRenderer::new(&context, OFFSCREEN_FORMAT);
        let overlay = OverlayRenderer::new(&context, OFFSCREEN_FORMAT);
        Ok(Self {
            context,
            renderer,
            overlay,
            size: DEFAULT_WINDOW_SIZE,
            last_frame: None,
        })
    }

    /// The frame produced by the most recent render call.
    pub fn last_frame(&self) -> Option<&RgbaFrame> {
        self.last_frame.as_ref()
    }
}

impl RenderBackend for OffscreenRenderer {
    fn render(&mut self, scene: &Scene, options: &RenderOptions) -> Result<CameraSpec> {
        if let Some(size) = options.window_size {
            self.size = size;
        }
        let spec = camera::initial_camera(scene);
        let frame = render_offscreen(
            &self.context,
            &mut self.renderer,
            &mut self.overlay,
            scene,
            &spec,
            self.size,
        )?;
        self.last_frame = Some(frame);
        Ok(spec)
    }

    fn screenshot(&mut self, scene: &Scene, size: [u32; 2]) -> Result<RgbaFrame> {
        let spec = camera::initial_camera(scene);
        render_offscreen(
            &self.context,
            &mut self.renderer,
            &mut self.overlay,
            scene,
            &spec,
            size,
        )
    }

    fn close(&mut self) {
        self.last_frame = None;
    }
}
