use super::OutputError;
use super::records::{
    EnergyRecord, NodeRecord, NonaffinitySample, SnapshotHeader, StressSample,
};
use crate::core::lattice::network::Network;
use csv::WriterBuilder;
use std::io::Write;

/// Writes a snapshot of every node position together with its three bond stiffnesses.
///
/// The output starts with a `N,strain,modulus,probability` header and its values, followed
/// by a `row,col,x,y,s0,s1,s2` table with one row per node.
pub fn write_positions<W: Write>(
    writer: W,
    network: &Network,
    header: &SnapshotHeader,
) -> Result<(), OutputError> {
    let mut csv = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    csv.write_record(["N", "strain", "modulus", "probability"])?;
    csv.serialize((header.size, header.strain, header.modulus, header.probability))?;
    csv.write_record(["row", "col", "x", "y", "s0", "s1", "s2"])?;

    let geometry = network.geometry();
    for row in 0..geometry.size() {
        for col in 0..geometry.size() {
            let node = geometry.index(row, col);
            let position = network.position(row, col);
            let [s0, s1, s2] = *network.stiffness().node(node);
            csv.serialize(NodeRecord {
                row,
                col,
                x: position.x,
                y: position.y,
                s0,
                s1,
                s2,
            })?;
        }
    }

    csv.flush()?;
    Ok(())
}

pub fn write_stress_series<W: Write>(
    writer: W,
    samples: &[StressSample],
) -> Result<(), OutputError> {
    let mut csv = WriterBuilder::new().from_writer(writer);
    for sample in samples {
        csv.serialize(sample)?;
    }
    csv.flush()?;
    Ok(())
}

/// Appends one energy row without a header, so repeated runs accumulate in one file.
pub fn append_energy<W: Write>(writer: W, record: &EnergyRecord) -> Result<(), OutputError> {
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.serialize(record)?;
    csv.flush()?;
    Ok(())
}

/// Streams non-affinity samples as they are produced.
pub struct NonaffinityWriter<W: Write> {
    csv: csv::Writer<W>,
}

impl<W: Write> NonaffinityWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            csv: WriterBuilder::new().from_writer(writer),
        }
    }

    pub fn write(&mut self, sample: &NonaffinitySample) -> Result<(), OutputError> {
        self.csv.serialize(sample)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.csv.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, OutputError> {
        self.csv
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }
}
