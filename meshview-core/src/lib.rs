//! Core data structures and traits for meshview
//!
//! This crate provides the mesh display data model: surface meshes and cell
//! grids, the scene a plotting session accumulates, per-mesh display options,
//! transforms, and the traits that connect the session to a graphics backend.

pub mod error;
pub mod grid;
pub mod mesh;
pub mod options;
pub mod scene;
pub mod shapes;
pub mod traits;
pub mod transform;

pub use error::*;
pub use grid::*;
pub use mesh::*;
pub use options::*;
pub use scene::*;
pub use traits::*;
pub use transform::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Rotation3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;
