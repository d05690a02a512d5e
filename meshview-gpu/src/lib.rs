//! GPU rendering for meshview
//!
//! This crate turns a [`meshview_core::Scene`] into pixels with wgpu. It
//! provides device management, surface and wireframe pipelines, rainbow
//! color mapping for scalar data, camera math, an egui overlay for text
//! annotations and the scalar bar, and offscreen rendering with CPU
//! readback for screenshots.

pub mod camera;
pub mod colormap;
pub mod device;
pub mod offscreen;
pub mod overlay;
pub mod renderer;

pub use camera::{fit_camera, initial_camera, OrbitCamera};
pub use colormap::{map_scalars, rainbow};
pub use device::GpuContext;
pub use offscreen::{render_offscreen, OFFSCREEN_FORMAT};
pub use overlay::OverlayRenderer;
pub use renderer::SceneRenderer;
