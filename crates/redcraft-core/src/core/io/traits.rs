use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Common interface for the text formats a fitted structure is written to.
///
/// Implementors only describe how a value is serialized to a writer; opening
/// and buffering the destination file is shared.
pub trait StructureFile {
    /// What is being written (a chain, a list of coupling rows, ...).
    type Value: ?Sized;

    /// Format options that are not part of the value itself.
    type Metadata: Default;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Writes `value` to `writer` using `metadata`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(
        value: &Self::Value,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes `value` with default metadata.
    fn write_value_to(value: &Self::Value, writer: &mut impl Write) -> Result<(), Self::Error> {
        Self::write_to(value, &Self::Metadata::default(), writer)
    }

    /// Creates (or truncates) `path` and writes `value` to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        value: &Self::Value,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(value, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
