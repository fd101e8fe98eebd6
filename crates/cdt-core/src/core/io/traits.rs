use crate::core::models::manifold::Manifold;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing triangulation snapshots.
///
/// Implementors handle format-specific parsing and serialization; loading a
/// snapshot always yields a validated [`Manifold`].
pub trait TriangulationFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a manifold from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Return
    ///
    /// Returns the reconstructed manifold with freshly counted geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails, I/O operations encounter issues, or
    /// the stored triangulation is not a valid foliated triangulation.
    fn read_from(reader: &mut impl BufRead) -> Result<Manifold, Self::Error>;

    /// Writes a manifold to a writer.
    ///
    /// # Arguments
    ///
    /// * `manifold` - The manifold to write.
    /// * `writer` - The writer to output to.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(manifold: &Manifold, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a manifold from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Manifold, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a manifold to a file path, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(manifold: &Manifold, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(manifold, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
