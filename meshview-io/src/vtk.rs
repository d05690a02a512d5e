//! VTK legacy format support
//!
//! Reads ASCII and binary legacy `.vtk` files holding POLYDATA or
//! UNSTRUCTURED_GRID datasets, including per-point SCALARS and VECTORS
//! arrays, and writes grids back out as ASCII UNSTRUCTURED_GRID. Binary
//! payloads are big endian, as the format specifies.

use crate::{GridReader, GridWriter};
use byteorder::{BigEndian, ReadBytesExt};
use meshview_core::{Cell, CellGrid, CellKind, Error, Point3f, Result, Vector3f};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// VTK legacy storage formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VtkFormat {
    Ascii,
    Binary,
}

/// Element types of VTK data arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VtkDataType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

fn parse_data_type(name: &str) -> Result<VtkDataType> {
    match name {
        "char" => Ok(VtkDataType::I8),
        "unsigned_char" => Ok(VtkDataType::U8),
        "short" => Ok(VtkDataType::I16),
        "unsigned_short" => Ok(VtkDataType::U16),
        "int" => Ok(VtkDataType::I32),
        "unsigned_int" => Ok(VtkDataType::U32),
        "long" => Ok(VtkDataType::I64),
        "unsigned_long" => Ok(VtkDataType::U64),
        "float" => Ok(VtkDataType::F32),
        "double" => Ok(VtkDataType::F64),
        other => Err(Error::InvalidData(format!(
            "Unknown VTK data type: {}",
            other
        ))),
    }
}

/// Which dataset attribute block a SCALARS/VECTORS section belongs to
#[derive(Debug, Clone, Copy)]
enum DataTarget {
    Point(usize),
    Cell(usize),
}

pub struct VtkReader;
pub struct VtkWriter;

impl GridReader for VtkReader {
    fn read_grid<P: AsRef<Path>>(path: P) -> Result<CellGrid> {
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);
        let grid = Self::read_grid_data(&mut reader)?;
        log::info!(
            "Loaded VTK grid: {} points, {} cells",
            grid.point_count(),
            grid.cell_count()
        );
        Ok(grid)
    }
}

impl VtkReader {
    /// Read a legacy VTK dataset from a reader.
    pub fn read_grid_data<R: BufRead>(reader: &mut R) -> Result<CellGrid> {
        let format = read_header(reader)?;

        let mut points: Vec<Point3f> = Vec::new();
        let mut cells: Vec<Cell> = Vec::new();
        let mut raw_cells: Option<Vec<Vec<usize>>> = None;
        let mut cell_types: Option<Vec<u32>> = None;
        let mut scalars: Option<(String, Vec<f32>)> = None;
        let mut vectors: Option<Vec<Vector3f>> = None;
        let mut data_target: Option<DataTarget> = None;

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let parts: Vec<&str> = trimmed.split_whitespace().collect();

            match parts[0] {
                "POINTS" => {
                    let n = parse_count(&parts, 1, "POINTS")?;
                    let dtype = parse_data_type(parts.get(2).copied().unwrap_or("float"))?;
                    let values = read_values(reader, format, dtype, n * 3, Vec::new())?;
                    points = values
                        .chunks_exact(3)
                        .map(|c| Point3f::new(c[0], c[1], c[2]))
                        .collect();
                }
                "POLYGONS" | "VERTICES" | "LINES" => {
                    let section = parts[0];
                    let count = parse_count(&parts, 1, section)?;
                    let total = parse_count(&parts, 2, section)?;
                    let data = read_indices(reader, format, total)?;
                    for list in split_size_prefixed(&data, count, section)? {
                        let kind = match (section, list.len()) {
                            ("POLYGONS", 3) => CellKind::Triangle,
                            ("POLYGONS", 4) => CellKind::Quad,
                            ("POLYGONS", _) => CellKind::Polygon,
                            ("VERTICES", 1) => CellKind::Vertex,
                            ("VERTICES", _) => CellKind::PolyVertex,
                            ("LINES", 2) => CellKind::Line,
                            (_, _) => CellKind::PolyLine,
                        };
                        cells.push(Cell::new(kind, list)?);
                    }
                }
                "CELLS" => {
                    let count = parse_count(&parts, 1, "CELLS")?;
                    let total = parse_count(&parts, 2, "CELLS")?;
                    let data = read_indices(reader, format, total)?;
                    raw_cells = Some(split_size_prefixed(&data, count, "CELLS")?);
                }
                "CELL_TYPES" => {
                    let count = parse_count(&parts, 1, "CELL_TYPES")?;
                    let data = read_indices(reader, format, count)?;
                    cell_types = Some(data.into_iter().map(|v| v as u32).collect());
                }
                "POINT_DATA" => {
                    let n = parse_count(&parts, 1, "POINT_DATA")?;
                    data_target = Some(DataTarget::Point(n));
                }
                "CELL_DATA" => {
                    let n = parse_count(&parts, 1, "CELL_DATA")?;
                    data_target = Some(DataTarget::Cell(n));
                }
                "SCALARS" => {
                    let name = parts.get(1).copied().unwrap_or("scalars").to_string();
                    let dtype = parse_data_type(parts.get(2).copied().unwrap_or("float"))?;
                    let ncomp: usize = parts.get(3).and_then(|s| s.parse().ok()).unwrap_or(1);
                    let (n, is_point) = expect_target(data_target, "SCALARS")?;
                    let carry = consume_lookup_table(reader, format)?;
                    let values = read_values(reader, format, dtype, n * ncomp, carry)?;
                    if is_point {
                        let first_component = values
                            .chunks(ncomp.max(1))
                            .map(|c| c[0])
                            .collect::<Vec<f32>>();
                        scalars = Some((name, first_component));
                    }
                }
                "VECTORS" => {
                    let dtype = parse_data_type(parts.get(2).copied().unwrap_or("float"))?;
                    let (n, is_point) = expect_target(data_target, "VECTORS")?;
                    let values = read_values(reader, format, dtype, n * 3, Vec::new())?;
                    if is_point {
                        vectors = Some(
                            values
                                .chunks_exact(3)
                                .map(|c| Vector3f::new(c[0], c[1], c[2]))
                                .collect(),
                        );
                    }
                }
                "NORMALS" => {
                    let dtype = parse_data_type(parts.get(2).copied().unwrap_or("float"))?;
                    let (n, _) = expect_target(data_target, "NORMALS")?;
                    read_values(reader, format, dtype, n * 3, Vec::new())?;
                }
                "TEXTURE_COORDINATES" => {
                    let dim: usize = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(2);
                    let dtype = parse_data_type(parts.get(3).copied().unwrap_or("float"))?;
                    let (n, _) = expect_target(data_target, "TEXTURE_COORDINATES")?;
                    read_values(reader, format, dtype, n * dim, Vec::new())?;
                }
                "LOOKUP_TABLE" => {
                    // Standalone RGBA table referenced by name; values unused.
                    let size = parse_count(&parts, 2, "LOOKUP_TABLE")?;
                    read_values(reader, format, VtkDataType::F32, size * 4, Vec::new())?;
                }
                "FIELD" => {
                    let arrays = parse_count(&parts, 2, "FIELD")?;
                    skip_field_arrays(reader, format, arrays)?;
                }
                "METADATA" => {
                    skip_metadata(reader)?;
                }
                other => {
                    return Err(Error::InvalidData(format!(
                        "Unsupported VTK section: {}",
                        other
                    )));
                }
            }
        }

        match (raw_cells, cell_types) {
            (Some(raw), Some(types)) => {
                if raw.len() != types.len() {
                    return Err(Error::InvalidData(format!(
                        "CELLS holds {} cells but CELL_TYPES lists {}",
                        raw.len(),
                        types.len()
                    )));
                }
                for (list, type_id) in raw.into_iter().zip(types) {
                    let kind = CellKind::from_vtk_id(type_id).ok_or_else(|| {
                        Error::InvalidData(format!("Unsupported VTK cell type: {}", type_id))
                    })?;
                    cells.push(Cell::new(kind, list)?);
                }
            }
            (None, None) => {}
            _ => {
                return Err(Error::InvalidData(
                    "CELLS and CELL_TYPES sections must both be present".to_string(),
                ));
            }
        }

        let mut grid = CellGrid::from_cells(points, cells)?;
        if let Some((name, values)) = scalars {
            grid.set_scalars(name, values)?;
        }
        if let Some(values) = vectors {
            grid.set_vectors(values)?;
        }
        Ok(grid)
    }
}

impl GridWriter for VtkWriter {
    fn write_grid<P: AsRef<Path>>(grid: &CellGrid, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# vtk DataFile Version 3.0")?;
        writeln!(w, "meshview grid")?;
        writeln!(w, "ASCII")?;
        writeln!(w, "DATASET UNSTRUCTURED_GRID")?;

        writeln!(w, "POINTS {} float", grid.point_count())?;
        for p in &grid.points {
            writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
        }

        let total: usize = grid.cells.iter().map(|c| c.indices.len() + 1).sum();
        writeln!(w, "CELLS {} {}", grid.cell_count(), total)?;
        for cell in &grid.cells {
            write!(w, "{}", cell.indices.len())?;
            for i in &cell.indices {
                write!(w, " {}", i)?;
            }
            writeln!(w)?;
        }
        writeln!(w, "CELL_TYPES {}", grid.cell_count())?;
        for cell in &grid.cells {
            writeln!(w, "{}", cell.kind.vtk_id())?;
        }

        if grid.scalars.is_some() || grid.vectors.is_some() {
            writeln!(w, "POINT_DATA {}", grid.point_count())?;
        }
        if let Some(scalars) = &grid.scalars {
            // Section lines are whitespace-delimited, so the name cannot
            // carry spaces.
            let name = grid
                .scalar_name
                .as_deref()
                .unwrap_or("scalars")
                .replace(char::is_whitespace, "_");
            writeln!(w, "SCALARS {} float 1", name)?;
            writeln!(w, "LOOKUP_TABLE default")?;
            for v in scalars {
                writeln!(w, "{}", v)?;
            }
        }
        if let Some(vectors) = &grid.vectors {
            writeln!(w, "VECTORS vectors float")?;
            for v in vectors {
                writeln!(w, "{} {} {}", v.x, v.y, v.z)?;
            }
        }

        w.flush()?;
        Ok(())
    }
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<VtkFormat> {
    let version = read_required_line(reader)?;
    if !version.starts_with("# vtk DataFile Version") {
        return Err(Error::InvalidData(
            "Not a VTK legacy file: missing version line".to_string(),
        ));
    }
    let _title = read_required_line(reader)?;
    let format = match read_required_line(reader)?.trim() {
        "ASCII" => VtkFormat::Ascii,
        "BINARY" => VtkFormat::Binary,
        other => {
            return Err(Error::InvalidData(format!(
                "Unknown VTK format: {}",
                other
            )));
        }
    };
    let dataset = read_required_line(reader)?;
    let mut dataset_parts = dataset.split_whitespace();
    match (dataset_parts.next(), dataset_parts.next()) {
        (Some("DATASET"), Some("POLYDATA")) | (Some("DATASET"), Some("UNSTRUCTURED_GRID")) => {}
        (Some("DATASET"), Some(other)) => {
            return Err(Error::UnsupportedFormat(format!("VTK dataset {}", other)));
        }
        _ => {
            return Err(Error::InvalidData("Malformed DATASET line".to_string()));
        }
    }
    Ok(format)
}

fn read_required_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(Error::InvalidData(
            "Unexpected end of file in VTK header".to_string(),
        ));
    }
    Ok(line.trim_end().to_string())
}

fn parse_count(parts: &[&str], index: usize, section: &str) -> Result<usize> {
    parts
        .get(index)
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| Error::InvalidData(format!("Malformed {} line", section)))
}

fn expect_target(target: Option<DataTarget>, section: &str) -> Result<(usize, bool)> {
    match target {
        Some(DataTarget::Point(n)) => Ok((n, true)),
        Some(DataTarget::Cell(n)) => Ok((n, false)),
        None => Err(Error::InvalidData(format!(
            "{} section before POINT_DATA or CELL_DATA",
            section
        ))),
    }
}

/// Consume the LOOKUP_TABLE line that follows a SCALARS declaration.
///
/// ASCII writers occasionally leave it out; in that case the line already
/// holds scalar values, which are returned as carry. For binary data the
/// line is required, since payload bytes cannot be rewound.
fn consume_lookup_table<R: BufRead>(reader: &mut R, format: VtkFormat) -> Result<Vec<f32>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(Error::InvalidData(
            "Unexpected end of file after SCALARS".to_string(),
        ));
    }
    if line.trim_start().starts_with("LOOKUP_TABLE") {
        return Ok(Vec::new());
    }
    match format {
        VtkFormat::Ascii => line
            .split_whitespace()
            .map(parse_ascii_f32)
            .collect::<Result<Vec<f32>>>(),
        VtkFormat::Binary => Err(Error::InvalidData(
            "Binary SCALARS section is missing its LOOKUP_TABLE line".to_string(),
        )),
    }
}

fn parse_ascii_f32(token: &str) -> Result<f32> {
    token
        .parse::<f32>()
        .map_err(|_| Error::InvalidData(format!("Invalid number: {}", token)))
}

/// Read `count` numeric values of the section's element type, converted to
/// f32. `carry` holds values already consumed from a shared line.
fn read_values<R: BufRead>(
    reader: &mut R,
    format: VtkFormat,
    dtype: VtkDataType,
    count: usize,
    carry: Vec<f32>,
) -> Result<Vec<f32>> {
    let mut values = carry;
    match format {
        VtkFormat::Ascii => {
            let mut line = String::new();
            while values.len() < count {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    return Err(Error::InvalidData(
                        "Unexpected end of file in VTK data".to_string(),
                    ));
                }
                for token in line.split_whitespace() {
                    values.push(parse_ascii_f32(token)?);
                }
            }
            values.truncate(count);
        }
        VtkFormat::Binary => {
            values.reserve(count);
            for _ in 0..count {
                let v = match dtype {
                    VtkDataType::I8 => reader.read_i8()? as f32,
                    VtkDataType::U8 => reader.read_u8()? as f32,
                    VtkDataType::I16 => reader.read_i16::<BigEndian>()? as f32,
                    VtkDataType::U16 => reader.read_u16::<BigEndian>()? as f32,
                    VtkDataType::I32 => reader.read_i32::<BigEndian>()? as f32,
                    VtkDataType::U32 => reader.read_u32::<BigEndian>()? as f32,
                    VtkDataType::I64 => reader.read_i64::<BigEndian>()? as f32,
                    VtkDataType::U64 => reader.read_u64::<BigEndian>()? as f32,
                    VtkDataType::F32 => reader.read_f32::<BigEndian>()?,
                    VtkDataType::F64 => reader.read_f64::<BigEndian>()? as f32,
                };
                values.push(v);
            }
        }
    }
    Ok(values)
}

/// Read `count` connectivity integers. Binary connectivity is always i32.
fn read_indices<R: BufRead>(
    reader: &mut R,
    format: VtkFormat,
    count: usize,
) -> Result<Vec<usize>> {
    let mut values = Vec::with_capacity(count);
    match format {
        VtkFormat::Ascii => {
            let mut line = String::new();
            while values.len() < count {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    return Err(Error::InvalidData(
                        "Unexpected end of file in VTK connectivity".to_string(),
                    ));
                }
                for token in line.split_whitespace() {
                    let v = token.parse::<i64>().map_err(|_| {
                        Error::InvalidData(format!("Invalid index: {}", token))
                    })?;
                    values.push(to_index(v)?);
                }
            }
            values.truncate(count);
        }
        VtkFormat::Binary => {
            for _ in 0..count {
                let v = reader.read_i32::<BigEndian>()?;
                values.push(to_index(v as i64)?);
            }
        }
    }
    Ok(values)
}

fn to_index(v: i64) -> Result<usize> {
    usize::try_from(v).map_err(|_| Error::InvalidData(format!("Negative index: {}", v)))
}

/// Split a `[n, i0..in, n, i0..in, ...]` connectivity block into per-cell
/// index lists.
fn split_size_prefixed(
    data: &[usize],
    expected: usize,
    section: &str,
) -> Result<Vec<Vec<usize>>> {
    let mut lists = Vec::with_capacity(expected);
    let mut i = 0;
    while i < data.len() {
        let n = data[i];
        i += 1;
        if i + n > data.len() {
            return Err(Error::InvalidData(format!(
                "{} entry runs past the section",
                section
            )));
        }
        lists.push(data[i..i + n].to_vec());
        i += n;
    }
    if lists.len() != expected {
        return Err(Error::InvalidData(format!(
            "{} declares {} cells but holds {}",
            section,
            expected,
            lists.len()
        )));
    }
    Ok(lists)
}

fn skip_field_arrays<R: BufRead>(reader: &mut R, format: VtkFormat, arrays: usize) -> Result<()> {
    for _ in 0..arrays {
        let header = loop {
            let line = read_required_line(reader)?;
            if !line.trim().is_empty() {
                break line;
            }
        };
        let parts: Vec<&str> = header.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(Error::InvalidData(format!(
                "Malformed FIELD array line: {}",
                header
            )));
        }
        let ncomp: usize = parts[1]
            .parse()
            .map_err(|_| Error::InvalidData(format!("Malformed FIELD array line: {}", header)))?;
        let ntuples: usize = parts[2]
            .parse()
            .map_err(|_| Error::InvalidData(format!("Malformed FIELD array line: {}", header)))?;
        let dtype = parse_data_type(parts[3])?;
        read_values(reader, format, dtype, ncomp * ntuples, Vec::new())?;
    }
    Ok(())
}

fn skip_metadata<R: BufRead>(reader: &mut R) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 || line.trim().is_empty() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_vtk_input() {
        let content = "not a vtk file\n";
        let result = VtkReader::read_grid_data(&mut content.as_bytes());
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_rejects_unknown_format_line() {
        let content = "# vtk DataFile Version 3.0\ntitle\nEBCDIC\nDATASET POLYDATA\n";
        let result = VtkReader::read_grid_data(&mut content.as_bytes());
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_rejects_unsupported_dataset() {
        let content = "# vtk DataFile Version 3.0\ntitle\nASCII\nDATASET STRUCTURED_POINTS\n";
        let result = VtkReader::read_grid_data(&mut content.as_bytes());
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_rejects_unknown_cell_type() {
        let content = "\
# vtk DataFile Version 3.0
one line cell
ASCII
DATASET UNSTRUCTURED_GRID
POINTS 2 float
0 0 0
1 0 0
CELLS 1 3
2 0 1
CELL_TYPES 1
42
";
        let result = VtkReader::read_grid_data(&mut content.as_bytes());
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_split_size_prefixed_validates() {
        assert!(split_size_prefixed(&[3, 0, 1], 1, "POLYGONS").is_err());
        assert!(split_size_prefixed(&[2, 0, 1], 2, "POLYGONS").is_err());
        let lists = split_size_prefixed(&[2, 0, 1, 3, 2, 3, 4], 2, "POLYGONS").unwrap();
        assert_eq!(lists, vec![vec![0, 1], vec![2, 3, 4]]);
    }
}
