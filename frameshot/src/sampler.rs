//! Whole-circuit sampling entry points.
//!
//! These size a [`FrameSimulator`] from a validated circuit, run it, and
//! either hand back in-memory sample tables or stream the record through a
//! [`RecordWriter`].

use bitplane::{BitTable, BitVec, BitsMut};

use crate::circuit::Circuit;
use crate::frame::{FrameSimulator, SimError};
use crate::writer::RecordWriter;

/// Samples the full measurement record: one row per measurement, one bit
/// per shot.
///
/// # Errors
///
/// Returns circuit validation and execution failures.
pub fn sample_measurements(circuit: &Circuit, num_shots: usize, seed: Option<u64>) -> Result<BitTable, SimError> {
    let mut simulator = FrameSimulator::for_circuit(circuit, num_shots, seed)?;
    simulator.execute(circuit)?;
    Ok(record_to_table(&simulator, num_shots))
}

/// Samples the declared detectors and observables: a (detector × shot)
/// table and an (observable × shot) table.
///
/// # Errors
///
/// Returns circuit validation and execution failures.
pub fn sample_detection_events(
    circuit: &Circuit,
    num_shots: usize,
    seed: Option<u64>,
) -> Result<(BitTable, BitTable), SimError> {
    let mut simulator = FrameSimulator::for_circuit(circuit, num_shots, seed)?;
    simulator.execute(circuit)?;

    let detectors = simulator.detector_record();
    let mut detector_table = BitTable::zeros(detectors.stored(), num_shots);
    for index in 0..detectors.stored() {
        detector_table.row_mut(index).assign(&detectors.row(index));
    }
    Ok((detector_table, simulator.observables().clone()))
}

/// Streams the measurement record to `writer`, flushing 1024-row blocks as
/// they fill; a supplied reference sample turns the stream into per-shot
/// deviations from it.
///
/// # Errors
///
/// Returns circuit validation and execution failures, and propagates writer
/// I/O errors verbatim.
pub fn write_measurements<Writer: RecordWriter + ?Sized>(
    circuit: &Circuit,
    num_shots: usize,
    seed: Option<u64>,
    ref_sample: Option<&BitVec>,
    writer: &mut Writer,
) -> Result<(), SimError> {
    let mut simulator = FrameSimulator::for_circuit(circuit, num_shots, seed)?;
    match ref_sample {
        Some(reference) => simulator.execute_streaming(circuit, writer, reference),
        None => {
            let empty = BitVec::zeros(0);
            simulator.execute_streaming(circuit, writer, &empty)
        }
    }
}

fn record_to_table(simulator: &FrameSimulator, num_shots: usize) -> BitTable {
    let record = simulator.record();
    let mut table = BitTable::zeros(record.stored(), num_shots);
    for index in 0..record.stored() {
        table.row_mut(index).assign(&record.row(index));
    }
    table
}
