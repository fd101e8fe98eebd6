use crate::core::models::ids::VertexId;
use crate::core::models::manifold::Manifold;
use slotmap::SecondaryMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Geomview OFF export of a triangulation's 2-skeleton.
///
/// Every vertex is written followed by every triangular face, which is what
/// OFF viewers need to render the foliation. The format cannot carry
/// timevalues, so it is write-only; use [`TriFile`](super::tri::TriFile) for
/// snapshots that must be loaded again.
pub struct OffFile;

impl OffFile {
    pub fn write_to(manifold: &Manifold, writer: &mut impl Write) -> io::Result<()> {
        let tri = manifold.triangulation();
        let faces = tri.faces();

        writeln!(writer, "OFF")?;
        writeln!(writer, "{} {} 0", tri.number_of_vertices(), faces.len())?;

        let mut index: SecondaryMap<VertexId, usize> = SecondaryMap::new();
        for (i, (id, vertex)) in tri.vertices().enumerate() {
            index.insert(id, i);
            writeln!(
                writer,
                "{} {} {}",
                vertex.point.x, vertex.point.y, vertex.point.z
            )?;
        }
        for face in faces {
            let mut fields = [0usize; 3];
            for (slot, v) in fields.iter_mut().zip(face) {
                *slot = index.get(v).copied().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("face references missing vertex {:?}", v),
                    )
                })?;
            }
            writeln!(writer, "3 {} {} {}", fields[0], fields[1], fields[2])?;
        }
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(manifold: &Manifold, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(manifold, &mut writer)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::ManifoldBuilder;
    use crate::core::models::topology::Topology;

    #[test]
    fn header_counts_vertices_and_faces() {
        let manifold = ManifoldBuilder::new(Topology::Spherical, 2, 2).build().unwrap();
        let mut out = Vec::new();
        OffFile::write_to(&manifold, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("OFF"));
        let g = manifold.geometry();
        assert_eq!(lines.next(), Some(format!("{} {} 0", g.n0, g.n2).as_str()));
        assert_eq!(text.lines().count(), 2 + g.n0 + g.n2);
        assert!(text.lines().skip(2 + g.n0).all(|l| l.starts_with("3 ")));
    }
}
