//! Batched Pauli-frame sampling of Clifford+noise circuits.
//!
//! `frameshot` executes a parsed circuit across thousands of Monte-Carlo
//! shots at once: per-shot Pauli error frames live in (qubit × shot) bit
//! tables, gates are word-parallel plane operations, measurements append
//! rows to a lookback-bounded record, and detectors/observables fold record
//! rows into parity tables for decoders.
//!
//! # Quick start
//!
//! ```
//! use frameshot::{sample_measurements, Circuit, GateId};
//! use bitplane::Bits;
//!
//! let mut circuit = Circuit::new();
//! circuit.append(GateId::R, [0]);
//! circuit.append(GateId::PauliX, [0]);
//! circuit.append(GateId::M, [0]);
//!
//! let samples = sample_measurements(&circuit, 256, Some(0)).unwrap();
//! assert_eq!(samples.row(0).count_ones(), 256);
//! ```
//!
//! # Architecture
//!
//! Built on [`paulibit`] for Pauli/Clifford algebra, which in turn uses
//! [`bitplane`] for bit-table storage. One simulator instance is
//! single-threaded; parallelism across shots comes from the word-level bit
//! operations, and independent instances can run on separate threads with
//! no shared mutable state beyond the immutable gate catalogue.

pub mod circuit;
pub mod frame;
pub mod gates;
pub mod record;
pub mod rng;
pub mod sampler;
pub mod writer;

pub use circuit::{Circuit, CircuitError, CircuitOp, GateTarget, Instruction, QubitId};
pub use frame::{FrameSimulator, SimError};
pub use gates::{ArgCount, Gate, GateCatalogue, GateFlags, GateId, GATE_CATALOGUE};
pub use record::{MeasureRecordBatch, RecordError, FLUSH_BLOCK_ROWS};
pub use rng::{seeded_rng, SampleRng};
pub use sampler::{sample_detection_events, sample_measurements, write_measurements};
pub use writer::{BitPackedWriter, CaptureWriter, Char01Writer, RecordWriter};
