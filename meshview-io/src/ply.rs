//! PLY format support

use crate::{MeshReader, MeshWriter};
use meshview_core::{triangulate_polygon, Error, Point3f, PolyMesh, Result};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// PLY storage formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

/// PLY write options
#[derive(Debug, Clone)]
pub struct PlyWriteOptions {
    pub format: PlyFormat,
    pub comments: Vec<String>,
}

impl Default for PlyWriteOptions {
    fn default() -> Self {
        Self {
            format: PlyFormat::Ascii,
            comments: Vec::new(),
        }
    }
}

impl PlyWriteOptions {
    pub fn ascii() -> Self {
        Self::default()
    }

    pub fn binary_little_endian() -> Self {
        Self {
            format: PlyFormat::BinaryLittleEndian,
            ..Self::default()
        }
    }

    pub fn binary_big_endian() -> Self {
        Self {
            format: PlyFormat::BinaryBigEndian,
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }
}

pub struct PlyReader;
pub struct PlyWriter;

impl MeshReader for PlyReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<PolyMesh> {
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);

        // ply-rs handles ASCII and both binary encodings from the header.
        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let mut points = Vec::new();
        let mut colors = Vec::new();
        let mut all_colored = true;
        if let Some(vertex_element) = ply.payload.get("vertex") {
            for vertex in vertex_element {
                let x = extract_property_value(vertex, "x")?;
                let y = extract_property_value(vertex, "y")?;
                let z = extract_property_value(vertex, "z")?;
                points.push(Point3f::new(x, y, z));

                match (
                    color_component(vertex, "red"),
                    color_component(vertex, "green"),
                    color_component(vertex, "blue"),
                ) {
                    (Some(r), Some(g), Some(b)) => colors.push([r, g, b]),
                    _ => all_colored = false,
                }
            }
        }

        let mut triangles = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                let indices = extract_face_indices(face)?;
                if indices.len() < 3 {
                    return Err(Error::InvalidData(format!(
                        "Face with {} vertices cannot be triangulated",
                        indices.len()
                    )));
                }
                triangulate_polygon(&indices, &mut triangles);
            }
        }

        let mut mesh = PolyMesh::from_triangles(points, triangles)?;
        if all_colored && !colors.is_empty() {
            mesh.set_colors(colors);
        }
        log::info!(
            "Loaded PLY mesh: {} points, {} triangles",
            mesh.point_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}

impl PlyWriter {
    /// Write a mesh with explicit format and header options.
    pub fn write_mesh_with_options<P: AsRef<Path>>(
        mesh: &PolyMesh,
        path: P,
        options: &PlyWriteOptions,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();
        ply.header.encoding = match options.format {
            PlyFormat::Ascii => Encoding::Ascii,
            PlyFormat::BinaryLittleEndian => Encoding::BinaryLittleEndian,
            PlyFormat::BinaryBigEndian => Encoding::BinaryBigEndian,
        };
        for comment in &options.comments {
            ply.header.comments.push(comment.clone());
        }

        let has_colors = mesh.colors.is_some();
        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.point_count();
        for name in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        }
        if has_colors {
            for name in ["red", "green", "blue"] {
                vertex_element.properties.add(PropertyDef::new(
                    name.to_string(),
                    PropertyType::Scalar(ScalarType::UChar),
                ));
            }
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.triangle_count();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        let mut vertices = Vec::new();
        for (i, point) in mesh.points.iter().enumerate() {
            let mut vertex = DefaultElement::new();
            vertex.insert("x".to_string(), Property::Float(point.x));
            vertex.insert("y".to_string(), Property::Float(point.y));
            vertex.insert("z".to_string(), Property::Float(point.z));
            if let Some(colors) = &mesh.colors {
                vertex.insert("red".to_string(), Property::UChar(colors[i][0]));
                vertex.insert("green".to_string(), Property::UChar(colors[i][1]));
                vertex.insert("blue".to_string(), Property::UChar(colors[i][2]));
            }
            vertices.push(vertex);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        let mut faces = Vec::new();
        for tri in &mesh.triangles {
            let mut face = DefaultElement::new();
            let indices = vec![tri[0] as i32, tri[1] as i32, tri[2] as i32];
            face.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(face);
        }
        ply.payload.insert("face".to_string(), faces);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;
        Ok(())
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &PolyMesh, path: P) -> Result<()> {
        Self::write_mesh_with_options(mesh, path, &PlyWriteOptions::default())
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract a color component as a byte, if present in any usual encoding
fn color_component(element: &DefaultElement, name: &str) -> Option<u8> {
    match element.get(name) {
        Some(Property::UChar(val)) => Some(*val),
        Some(Property::Int(val)) => u8::try_from(*val).ok(),
        Some(Property::UInt(val)) => u8::try_from(*val).ok(),
        Some(Property::Float(val)) => Some((val.clamp(0.0, 1.0) * 255.0).round() as u8),
        _ => None,
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    match element
        .get("vertex_indices")
        .or_else(|| element.get("vertex_index"))
    {
        Some(Property::ListInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUChar(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        _ => Err(Error::InvalidData("Face indices not found".to_string())),
    }
}
