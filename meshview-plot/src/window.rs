//! Interactive render window
//!
//! Owns the winit event loop, the window and the wgpu surface for a
//! plotting session. Interactive renders block inside the event loop until
//! the user dismisses the window; passive renders pump pending events and
//! present a single frame so update-and-render animation loops stay live.
//!
//! Mouse bindings: left drag orbits, right drag pans, the wheel dollies.
//! Keys: `r` resets the camera to the fitted view, `q` and Escape close
//! the window.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use meshview_core::{
    CameraSpec, Error, RenderBackend, RenderOptions, Result, RgbaFrame, Scene,
};
use meshview_gpu::{
    camera, render_offscreen, GpuContext, OrbitCamera, OverlayRenderer, SceneRenderer,
    OFFSCREEN_FORMAT,
};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    platform::pump_events::EventLoopExtPumpEvents,
    platform::run_on_demand::EventLoopExtRunOnDemand,
    window::{Window, WindowBuilder},
};

/// Window and screenshot size used when a render does not give one.
pub const DEFAULT_WINDOW_SIZE: [u32; 2] = [1024, 768];

/// Radians of orbit per pixel of mouse drag.
const ORBIT_SPEED: f32 = 0.01;

// winit allows one event loop per process, created on the main thread.
// Closed sessions park it here so the next session can pick it up again.
thread_local! {
    static EVENT_LOOP_SLOT: RefCell<Option<EventLoop<()>>> = RefCell::new(None);
}

fn take_event_loop() -> Result<EventLoop<()>> {
    if let Some(event_loop) = EVENT_LOOP_SLOT.with(|slot| slot.borrow_mut().take()) {
        return Ok(event_loop);
    }
    EventLoop::new().map_err(|e| Error::Render(format!("Failed to create event loop: {}", e)))
}

fn park_event_loop(event_loop: EventLoop<()>) {
    EVENT_LOOP_SLOT.with(|slot| *slot.borrow_mut() = Some(event_loop));
}

struct WindowState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    renderer: SceneRenderer,
    overlay: OverlayRenderer,
}

/// A windowed render backend.
///
/// The window opens on creation and survives across render calls until a
/// render with `autoclose` tears it down; the next render opens a fresh one.
pub struct WindowRenderer {
    event_loop: Option<EventLoop<()>>,
    context: GpuContext,
    state: Option<WindowState>,
    offscreen: Option<(SceneRenderer, OverlayRenderer)>,
    title: String,
}

impl WindowRenderer {
    pub fn new(title: impl Into<String>, size: [u32; 2]) -> Result<Self> {
        let title = title.into();
        let event_loop = take_event_loop()?;
        let window = build_window(&event_loop, &title, size)?;

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| Error::Render(format!("Failed to create surface: {}", e)))?;
        let context = pollster::block_on(GpuContext::with_surface(instance, &surface))?;
        let state = configure_state(&context, window, surface);

        Ok(Self {
            event_loop: Some(event_loop),
            context,
            state: Some(state),
            offscreen: None,
            title,
        })
    }

    /// Open a new window if the previous render closed it, and apply a
    /// requested size change to an existing one.
    fn ensure_window(&mut self, options: &RenderOptions) -> Result<()> {
        if let Some(state) = &self.state {
            if let Some([width, height]) = options.window_size {
                let current = state.window.inner_size();
                if current.width != width || current.height != height {
                    let _ = state
                        .window
                        .request_inner_size(PhysicalSize::new(width, height));
                }
            }
            return Ok(());
        }

        let event_loop = self
            .event_loop
            .as_ref()
            .ok_or_else(|| Error::Render("Event loop is gone".to_string()))?;
        let size = options.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
        let window = build_window(event_loop, &self.title, size)?;
        let surface = self
            .context
            .instance
            .create_surface(window.clone())
            .map_err(|e| Error::Render(format!("Failed to create surface: {}", e)))?;
        self.state = Some(configure_state(&self.context, window, surface));
        Ok(())
    }

    /// Block in the event loop until the user dismisses the window.
    fn run_interactive(&mut self, scene: &Scene, orbit: &mut OrbitCamera) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or_else(|| Error::Render("Event loop is gone".to_string()))?;
        let context = &self.context;

        let home = scene.bounds().map(camera::fit_camera);
        let mut last_cursor: Option<PhysicalPosition<f64>> = None;
        let mut left_down = false;
        let mut right_down = false;
        let mut render_error: Option<Error> = None;

        state.window.request_redraw();
        event_loop
            .run_on_demand(|event, target| {
                target.set_control_flow(ControlFlow::Poll);

                match event {
                    Event::WindowEvent { event, .. } => match event {
                        WindowEvent::CloseRequested => {
                            target.exit();
                        }
                        WindowEvent::Resized(new_size) => {
                            resize(context, state, new_size);
                        }
                        WindowEvent::MouseInput {
                            state: pressed,
                            button,
                            ..
                        } => match button {
                            MouseButton::Left => {
                                left_down = pressed == ElementState::Pressed;
                            }
                            MouseButton::Right => {
                                right_down = pressed == ElementState::Pressed;
                            }
                            _ => {}
                        },
                        WindowEvent::CursorMoved { position, .. } => {
                            if let Some(last) = last_cursor {
                                let dx = (position.x - last.x) as f32;
                                let dy = (position.y - last.y) as f32;
                                if left_down {
                                    orbit.orbit(dx * ORBIT_SPEED, dy * ORBIT_SPEED);
                                } else if right_down {
                                    orbit.pan(dx, dy, state.config.height as f32);
                                }
                            }
                            last_cursor = Some(position);
                        }
                        WindowEvent::MouseWheel { delta, .. } => {
                            let amount = match delta {
                                MouseScrollDelta::LineDelta(_, y) => y,
                                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                            };
                            orbit.dolly(amount);
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.state == ElementState::Pressed {
                                match &event.logical_key {
                                    Key::Character(c) => match c.as_str() {
                                        "q" | "Q" => target.exit(),
                                        "r" | "R" => {
                                            if let Some(home) = home {
                                                orbit.spec = home;
                                            }
                                        }
                                        _ => {}
                                    },
                                    Key::Named(NamedKey::Escape) => target.exit(),
                                    _ => {}
                                }
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            if let Err(e) = draw_frame(context, state, scene, orbit) {
                                render_error = Some(e);
                                target.exit();
                            } else {
                                state.window.request_redraw();
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }
            })
            .map_err(|e| Error::Render(format!("Event loop error: {}", e)))?;

        match render_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Process pending events and present one frame. Returns `true` when the
    /// user closed the window while we were not looking.
    fn render_passive(&mut self, scene: &Scene, orbit: &OrbitCamera) -> Result<bool> {
        let Some(state) = self.state.as_mut() else {
            return Ok(true);
        };
        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or_else(|| Error::Render("Event loop is gone".to_string()))?;
        let context = &self.context;

        let mut close_requested = false;
        let _ = event_loop.pump_events(Some(Duration::ZERO), |event, _target| {
            if let Event::WindowEvent { event, .. } = event {
                match event {
                    WindowEvent::CloseRequested => close_requested = true,
                    WindowEvent::Resized(new_size) => resize(context, state, new_size),
                    _ => {}
                }
            }
        });
        if close_requested {
            return Ok(true);
        }

        draw_frame(context, state, scene, orbit)?;
        Ok(false)
    }
}

impl RenderBackend for WindowRenderer {
    fn render(&mut self, scene: &Scene, options: &RenderOptions) -> Result<CameraSpec> {
        self.ensure_window(options)?;
        let mut orbit = OrbitCamera::new(camera::initial_camera(scene));

        let mut close_window = options.autoclose;
        if options.interactive {
            self.run_interactive(scene, &mut orbit)?;
        } else {
            close_window |= self.render_passive(scene, &orbit)?;
        }
        if close_window {
            self.state = None;
        }
        Ok(orbit.spec)
    }

    fn screenshot(&mut self, scene: &Scene, size: [u32; 2]) -> Result<RgbaFrame> {
        if self.offscreen.is_none() {
            self.offscreen = Some((
                SceneRenderer::new(&self.context, OFFSCREEN_FORMAT),
                OverlayRenderer::new(&self.context, OFFSCREEN_FORMAT),
            ));
        }
        let (renderer, overlay) = self
            .offscreen
            .as_mut()
            .ok_or_else(|| Error::Render("Offscreen renderer is gone".to_string()))?;
        let spec = camera::initial_camera(scene);
        render_offscreen(&self.context, renderer, overlay, scene, &spec, size)
    }

    fn close(&mut self) {
        self.state = None;
        self.offscreen = None;
    }
}

impl Drop for WindowRenderer {
    fn drop(&mut self) {
        self.state = None;
        if let Some(event_loop) = self.event_loop.take() {
            park_event_loop(event_loop);
        }
    }
}

fn build_window(event_loop: &EventLoop<()>, title: &str, size: [u32; 2]) -> Result<Arc<Window>> {
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(size[0], size[1]))
        .build(event_loop)
        .map_err(|e| Error::Render(format!("Failed to create window: {}", e)))?;
    log::info!("Opened render window {}x{}", size[0], size[1]);
    Ok(Arc::new(window))
}

fn configure_state(
    context: &GpuContext,
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
) -> WindowState {
    let caps = surface.get_capabilities(&context.adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .unwrap_or(caps.formats[0]);

    let inner = window.inner_size();
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: inner.width.max(1),
        height: inner.height.max(1),
        present_mode: caps.present_modes[0],
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&context.device, &config);

    let renderer = SceneRenderer::new(context, format);
    let overlay = OverlayRenderer::new(context, format);
    WindowState {
        window,
        surface,
        config,
        renderer,
        overlay,
    }
}

fn resize(context: &GpuContext, state: &mut WindowState, new_size: PhysicalSize<u32>) {
    if new_size.width > 0 && new_size.height > 0 {
        state.config.width = new_size.width;
        state.config.height = new_size.height;
        state.surface.configure(&context.device, &state.config);
    }
}

fn draw_frame(
    context: &GpuContext,
    state: &mut WindowState,
    scene: &Scene,
    orbit: &OrbitCamera,
) -> Result<()> {
    let size = [state.config.width, state.config.height];

    let frame = match state.surface.get_current_texture() {
        Ok(frame) => frame,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            state.surface.configure(&context.device, &state.config);
            state
                .surface
                .get_current_texture()
                .map_err(|e| Error::Render(format!("Failed to get surface texture: {:?}", e)))?
        }
        Err(wgpu::SurfaceError::Timeout) => return Ok(()),
        Err(e) => {
            return Err(Error::Render(format!(
                "Failed to get surface texture: {:?}",
                e
            )));
        }
    };
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let aspect = size[0] as f32 / size[1] as f32;
    let radius = scene
        .bounds()
        .map(|(min, max)| ((max - min).norm() * 0.5).max(1e-3))
        .unwrap_or(1.0);
    let (near, far) = camera::clip_planes(orbit.distance(), radius);
    state.renderer.update_camera(
        context,
        camera::view_matrix(&orbit.spec),
        camera::projection_matrix(aspect, near, far),
        orbit.spec.position.coords,
    );

    let mut encoder = context
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Window Encoder"),
        });
    state
        .renderer
        .render(context, &mut encoder, &view, scene, size);
    state
        .overlay
        .draw(context, &mut encoder, &view, scene, &orbit.spec, size);
    context.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}
