//! File import and export for meshview
//!
//! Supported formats:
//! - PLY: ASCII and binary, with optional per-vertex colors
//! - VTK legacy: ASCII and binary, POLYDATA and UNSTRUCTURED_GRID datasets
//!
//! The free functions dispatch on file extension; the per-format readers
//! and writers are also exported for direct use.

pub mod ply;
pub mod vtk;

pub use ply::{PlyFormat, PlyReader, PlyWriteOptions, PlyWriter};
pub use vtk::{VtkReader, VtkWriter};

use meshview_core::{CellGrid, Error, PolyMesh, Result, SceneMesh, ToSceneMesh};
use std::path::Path;

/// Trait for reading surface meshes
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<PolyMesh>;
}

/// Trait for writing surface meshes
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &PolyMesh, path: P) -> Result<()>;
}

/// Trait for reading cell grids
pub trait GridReader {
    fn read_grid<P: AsRef<Path>>(path: P) -> Result<CellGrid>;
}

/// Trait for writing cell grids
pub trait GridWriter {
    fn write_grid<P: AsRef<Path>>(grid: &CellGrid, path: P) -> Result<()>;
}

/// A dataset loaded from disk, in whichever form the file held it.
#[derive(Debug, Clone)]
pub enum LoadedMesh {
    Poly(PolyMesh),
    Grid(CellGrid),
}

impl LoadedMesh {
    pub fn point_count(&self) -> usize {
        match self {
            LoadedMesh::Poly(mesh) => mesh.point_count(),
            LoadedMesh::Grid(grid) => grid.point_count(),
        }
    }
}

impl ToSceneMesh for LoadedMesh {
    fn to_scene_mesh(&self) -> SceneMesh {
        match self {
            LoadedMesh::Poly(mesh) => mesh.to_scene_mesh(),
            LoadedMesh::Grid(grid) => grid.to_scene_mesh(),
        }
    }
}

/// Read a surface mesh from a file, detecting the format from the extension.
///
/// Grid files are reduced to their exterior surface; per-point data is
/// dropped in the process. Use [`read_any`] to keep the grid form.
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<PolyMesh> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| Error::UnsupportedFormat("No file extension".to_string()))?;

    match extension.to_lowercase().as_str() {
        "ply" => PlyReader::read_mesh(path),
        "vtk" => {
            let grid = VtkReader::read_grid(path)?;
            let (triangles, _edges) = grid.extract_surface();
            PolyMesh::from_triangles(grid.points, triangles)
        }
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}

/// Read a cell grid from a file, detecting the format from the extension.
pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<CellGrid> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| Error::UnsupportedFormat("No file extension".to_string()))?;

    match extension.to_lowercase().as_str() {
        "vtk" => VtkReader::read_grid(path),
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}

/// Read whatever dataset a file holds, detecting the format from the
/// extension.
pub fn read_any<P: AsRef<Path>>(path: P) -> Result<LoadedMesh> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| Error::UnsupportedFormat("No file extension".to_string()))?;

    match extension.to_lowercase().as_str() {
        "ply" => Ok(LoadedMesh::Poly(PlyReader::read_mesh(path)?)),
        "vtk" => Ok(LoadedMesh::Grid(VtkReader::read_grid(path)?)),
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}

/// Write a surface mesh to a file, detecting the format from the extension.
pub fn write_mesh<P: AsRef<Path>>(mesh: &PolyMesh, path: P) -> Result<()> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| Error::UnsupportedFormat("No file extension".to_string()))?;

    match extension.to_lowercase().as_str() {
        "ply" => PlyWriter::write_mesh(mesh, path),
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}

/// Write a cell grid to a file, detecting the format from the extension.
pub fn write_grid<P: AsRef<Path>>(grid: &CellGrid, path: P) -> Result<()> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| Error::UnsupportedFormat("No file extension".to_string()))?;

    match extension.to_lowercase().as_str() {
        "vtk" => VtkWriter::write_grid(grid, path),
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}
