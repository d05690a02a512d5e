//! Plotting sessions for meshview
//!
//! This crate is the user-facing surface of meshview: a [`Plotter`] session
//! accumulates meshes, scalars, text and a camera, and draws them into an
//! interactive window or an offscreen frame. Coordinates and scalars can be
//! swapped between renders, which is how caller-driven animation works:
//!
//! ```no_run
//! use meshview_core::{shapes, MeshOptions, RenderOptions};
//! use meshview_plot::Plotter;
//!
//! let grid = shapes::beam_grid([2, 2, 10], [1.0, 1.0, 5.0]);
//! let mut plotter = Plotter::new();
//! let id = plotter.add_mesh(&grid, None, MeshOptions::surface()).unwrap();
//! plotter
//!     .render(&RenderOptions::new().non_interactive().keep_open())
//!     .unwrap();
//! for frame in 0..100 {
//!     let phase = frame as f32 * 0.1;
//!     let points: Vec<_> = grid
//!         .points
//!         .iter()
//!         .map(|p| p + meshview_core::Vector3f::new(0.0, phase.sin() * p.z, 0.0))
//!         .collect();
//!     plotter.update_coordinates(id, &points, true).unwrap();
//! }
//! plotter.close();
//! ```

pub mod offscreen;
pub mod plotter;
pub mod window;

pub use offscreen::OffscreenRenderer;
pub use plotter::{plot, Plotter};
pub use window::{WindowRenderer, DEFAULT_WINDOW_SIZE};
