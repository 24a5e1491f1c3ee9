use crate::core::models::curve::Measurement;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading measurement table formats.
///
/// Implementors handle format-specific parsing and return the rows in file order,
/// together with format metadata.
pub trait MeasurementFile {
    /// The type of metadata associated with the file format.
    type Metadata;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads all measurement rows from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the table structure cannot be understood or I/O fails.
    /// Individual unparsable cells are not errors; they surface as non-finite values.
    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(Vec<Measurement>, Self::Metadata), Self::Error>;

    /// Reads all measurement rows from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(Vec<Measurement>, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
