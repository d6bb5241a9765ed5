use crate::core::io::traits::StructureFile;
use nalgebra::Point3;
use std::io::{self, Write};

/// One REDCAT input row: the two nuclei of a coupling, its static coupling
/// constant, the measured value and its error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedcatEntry {
    pub from: Point3<f64>,
    pub to: Point3<f64>,
    pub dmax: f64,
    pub value: f64,
    pub error: f64,
}

pub struct RedcatFile;

impl StructureFile for RedcatFile {
    type Value = [RedcatEntry];
    type Metadata = ();
    type Error = io::Error;

    fn write_to(
        entries: &[RedcatEntry],
        _metadata: &(),
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for e in entries {
            writeln!(
                writer,
                "{:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4}",
                e.from.x, e.from.y, e.from.z, e.to.x, e.to.y, e.to.z, e.dmax, e.value, e.error
            )?;
        }
        Ok(())
    }
}
