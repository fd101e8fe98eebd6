use crate::core::io::traits::TriangulationFile;
use crate::core::models::ids::VertexId;
use crate::core::models::manifold::Manifold;
use crate::core::models::topology::Topology;
use crate::core::models::triangulation::{FoliatedTriangulation, TriangulationError};
use nalgebra::Point3;
use slotmap::SecondaryMap;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on vertex storage reserved from a header count.
const MAX_PREALLOCATED_VERTICES: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum TriError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: TriParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(&'static str),
    #[error("Stored triangulation is invalid: {0}")]
    Triangulation(#[from] TriangulationError),
}

#[derive(Debug, Error)]
pub enum TriParseErrorKind {
    #[error("Invalid integer for {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float for {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Expected {expected} fields, found {found}")]
    WrongFieldCount { expected: usize, found: usize },
    #[error("Unknown topology '{0}'")]
    InvalidTopology(String),
    #[error("Unknown record '{0}'")]
    UnknownRecord(String),
    #[error("Record '{0}' is out of order")]
    UnexpectedRecord(String),
}

/// Native plain-text snapshot of a foliated triangulation.
///
/// ```text
/// TOPOLOGY spherical
/// FOLIATION 1 1
/// VERTICES 2
/// 1 0 0 1
/// ...
/// CELLS 1
/// 0 1 2 3
/// END
/// ```
///
/// Vertex lines hold `x y z timevalue`; cell lines hold zero-based indices
/// into the vertex list. Blank lines and lines starting with `#` are ignored.
pub struct TriFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Vertices(usize),
    Cells(usize),
}

fn parse_field<T: FromStr>(
    value: &str,
    line: usize,
    make_kind: impl FnOnce(String) -> TriParseErrorKind,
) -> Result<T, TriError> {
    value.parse().map_err(|_| TriError::Parse {
        line,
        kind: make_kind(value.to_string()),
    })
}

fn expect_fields<'a>(
    fields: &'a [&'a str],
    expected: usize,
    line: usize,
) -> Result<&'a [&'a str], TriError> {
    if fields.len() != expected {
        return Err(TriError::Parse {
            line,
            kind: TriParseErrorKind::WrongFieldCount {
                expected,
                found: fields.len(),
            },
        });
    }
    Ok(fields)
}

fn int(field: &'static str) -> impl FnOnce(String) -> TriParseErrorKind {
    move |value| TriParseErrorKind::InvalidInt { field, value }
}

fn float(field: &'static str) -> impl FnOnce(String) -> TriParseErrorKind {
    move |value| TriParseErrorKind::InvalidFloat { field, value }
}

impl TriangulationFile for TriFile {
    type Error = TriError;

    fn read_from(reader: &mut impl BufRead) -> Result<Manifold, Self::Error> {
        let mut topology: Option<Topology> = None;
        let mut foliation: Option<(f64, f64)> = None;
        let mut triangulation: Option<FoliatedTriangulation> = None;
        let mut ids: Vec<VertexId> = Vec::new();
        let mut section = Section::Header;
        let mut finished = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = trimmed.split_whitespace().collect();

            match section {
                Section::Vertices(remaining) => {
                    let tri = triangulation
                        .as_mut()
                        .ok_or(TriError::MissingRecord("VERTICES"))?;
                    let f = expect_fields(&fields, 4, line_num)?;
                    let x: f64 = parse_field(f[0], line_num, float("x"))?;
                    let y: f64 = parse_field(f[1], line_num, float("y"))?;
                    let z: f64 = parse_field(f[2], line_num, float("z"))?;
                    let t: i32 = parse_field(f[3], line_num, int("timevalue"))?;
                    ids.push(tri.add_vertex(Point3::new(x, y, z), t));
                    section = if remaining > 1 {
                        Section::Vertices(remaining - 1)
                    } else {
                        Section::Header
                    };
                    continue;
                }
                Section::Cells(remaining) => {
                    let tri = triangulation
                        .as_mut()
                        .ok_or(TriError::MissingRecord("VERTICES"))?;
                    let f = expect_fields(&fields, 4, line_num)?;
                    let mut vertices = [VertexId::default(); 4];
                    for (slot, value) in vertices.iter_mut().zip(f) {
                        let index: usize = parse_field(value, line_num, int("vertex index"))?;
                        *slot = *ids.get(index).ok_or_else(|| {
                            TriError::Inconsistency(format!(
                                "cell on line {} references vertex {} but only {} vertices exist",
                                line_num,
                                index,
                                ids.len()
                            ))
                        })?;
                    }
                    tri.add_cell(vertices)?;
                    section = if remaining > 1 {
                        Section::Cells(remaining - 1)
                    } else {
                        Section::Header
                    };
                    continue;
                }
                Section::Header => {}
            }

            match fields[0] {
                "TOPOLOGY" => {
                    let f = expect_fields(&fields, 2, line_num)?;
                    topology = Some(Topology::from_str(f[1]).map_err(|_| TriError::Parse {
                        line: line_num,
                        kind: TriParseErrorKind::InvalidTopology(f[1].to_string()),
                    })?);
                }
                "FOLIATION" => {
                    let f = expect_fields(&fields, 3, line_num)?;
                    let radius: f64 = parse_field(f[1], line_num, float("initial radius"))?;
                    let spacing: f64 = parse_field(f[2], line_num, float("foliation spacing"))?;
                    foliation = Some((radius, spacing));
                }
                "VERTICES" => {
                    if triangulation.is_some() {
                        return Err(TriError::Parse {
                            line: line_num,
                            kind: TriParseErrorKind::UnexpectedRecord("VERTICES".into()),
                        });
                    }
                    let f = expect_fields(&fields, 2, line_num)?;
                    let count: usize = parse_field(f[1], line_num, int("vertex count"))?;
                    let topology = topology.ok_or(TriError::MissingRecord("TOPOLOGY"))?;
                    let (radius, spacing) = foliation.ok_or(TriError::MissingRecord("FOLIATION"))?;
                    triangulation = Some(FoliatedTriangulation::new(topology, radius, spacing));
                    ids.reserve(count.min(MAX_PREALLOCATED_VERTICES));
                    if count > 0 {
                        section = Section::Vertices(count);
                    }
                }
                "CELLS" => {
                    if triangulation.is_none() {
                        return Err(TriError::MissingRecord("VERTICES"));
                    }
                    let f = expect_fields(&fields, 2, line_num)?;
                    let count: usize = parse_field(f[1], line_num, int("cell count"))?;
                    if count > 0 {
                        section = Section::Cells(count);
                    }
                }
                "END" => {
                    finished = true;
                    break;
                }
                other => {
                    return Err(TriError::Parse {
                        line: line_num,
                        kind: TriParseErrorKind::UnknownRecord(other.to_string()),
                    });
                }
            }
        }

        match section {
            Section::Vertices(remaining) => {
                return Err(TriError::Inconsistency(format!(
                    "file ended with {} vertices still expected",
                    remaining
                )));
            }
            Section::Cells(remaining) => {
                return Err(TriError::Inconsistency(format!(
                    "file ended with {} cells still expected",
                    remaining
                )));
            }
            Section::Header => {}
        }
        if !finished {
            return Err(TriError::MissingRecord("END"));
        }
        let triangulation = triangulation.ok_or(TriError::MissingRecord("VERTICES"))?;
        Ok(Manifold::new(triangulation)?)
    }

    fn write_to(manifold: &Manifold, writer: &mut impl Write) -> Result<(), Self::Error> {
        let tri = manifold.triangulation();
        writeln!(
            writer,
            "# {}3 triangulation: {}",
            tri.topology().prefix(),
            manifold.geometry()
        )?;
        writeln!(writer, "TOPOLOGY {}", tri.topology())?;
        writeln!(
            writer,
            "FOLIATION {} {}",
            tri.initial_radius(),
            tri.foliation_spacing()
        )?;

        let mut index: SecondaryMap<VertexId, usize> = SecondaryMap::new();
        writeln!(writer, "VERTICES {}", tri.number_of_vertices())?;
        for (i, (id, vertex)) in tri.vertices().enumerate() {
            index.insert(id, i);
            writeln!(
                writer,
                "{} {} {} {}",
                vertex.point.x, vertex.point.y, vertex.point.z, vertex.timevalue
            )?;
        }

        writeln!(writer, "CELLS {}", tri.number_of_cells())?;
        for (id, cell) in tri.cells() {
            let mut fields = [0usize; 4];
            for (slot, v) in fields.iter_mut().zip(cell.vertices) {
                *slot = *index.get(v).ok_or_else(|| {
                    TriError::Inconsistency(format!("cell {:?} references a missing vertex", id))
                })?;
            }
            writeln!(
                writer,
                "{} {} {} {}",
                fields[0], fields[1], fields[2], fields[3]
            )?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
