//! Batched Pauli-frame simulation.
//!
//! One simulator instance tracks the accumulated X/Z error components of
//! every shot at once: the frame tables are (qubit × shot) bit matrices, so
//! a Clifford gate is a handful of row XOR/swap operations that advance all
//! shots in lockstep, one shot per bit position within a word.
//!
//! Measurement outcomes are made random through frame randomization: resets
//! and collapses XOR a fresh random multiple of the measured Pauli into the
//! frame, standing in for the unknown sign of the anticommuting stabilizer.
//! A qubit later rotated into a conjugate basis therefore measures random,
//! while reset-then-measure stays deterministic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitplane::{BitTable, BitVec, Bits, BitsMut};
use itertools::Itertools;
use paulibit::{SingleQubitAction, TwoQubitAction, UnitaryAction};
use thiserror::Error;

use crate::circuit::{Circuit, CircuitError, CircuitOp, GateTarget, Instruction};
use crate::gates::{GateId, GATE_CATALOGUE};
use crate::record::{MeasureRecordBatch, RecordError, FLUSH_BLOCK_ROWS};
use crate::rng::{
    sample_non_identity_pauli_bits, scatter_biased_bits, seeded_rng, AliasSampler, GeometricSkips, SampleRng,
};
use crate::writer::RecordWriter;

/// A failure surfaced while executing a circuit.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    #[error("instruction {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: RecordError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("interrupted before instruction {index}")]
    Interrupted { index: usize },
}

enum MeasureBasis {
    X,
    Y,
    Z,
}

/// Per-shot Pauli frames propagated through a circuit.
#[must_use]
pub struct FrameSimulator {
    num_qubits: usize,
    num_shots: usize,
    x_table: BitTable,
    z_table: BitTable,
    sweep_table: BitTable,
    record: MeasureRecordBatch,
    det_record: MeasureRecordBatch,
    obs_table: BitTable,
    last_correlated_error_occurred: BitVec,
    rng: SampleRng,
    scratch: BitVec,
    scratch2: BitVec,
    ticks: u64,
    interrupt: Option<Arc<AtomicBool>>,
    instruction_index: usize,
}

impl FrameSimulator {
    /// Sizes a simulator for `circuit` after validating it.
    ///
    /// # Errors
    ///
    /// Returns the circuit's first structural violation.
    pub fn for_circuit(circuit: &Circuit, num_shots: usize, seed: Option<u64>) -> Result<Self, CircuitError> {
        circuit.validate()?;
        Ok(FrameSimulator::new(
            circuit.max_qubit().map_or(0, |qubit| qubit as usize + 1),
            num_shots,
            circuit.sweep_bit_count(),
            circuit.observable_count(),
            circuit.max_lookback(),
            seed,
        ))
    }

    pub fn new(
        num_qubits: usize,
        num_shots: usize,
        sweep_bit_count: usize,
        observable_count: usize,
        max_lookback: usize,
        seed: Option<u64>,
    ) -> Self {
        let mut simulator = FrameSimulator {
            num_qubits,
            num_shots,
            x_table: BitTable::zeros(num_qubits, num_shots),
            z_table: BitTable::zeros(num_qubits, num_shots),
            sweep_table: BitTable::zeros(sweep_bit_count, num_shots),
            record: MeasureRecordBatch::new(num_shots, max_lookback),
            det_record: MeasureRecordBatch::new(num_shots, 0),
            obs_table: BitTable::zeros(observable_count, num_shots),
            last_correlated_error_occurred: BitVec::zeros(num_shots),
            rng: seeded_rng(seed),
            scratch: BitVec::zeros(num_shots),
            scratch2: BitVec::zeros(num_shots),
            ticks: 0,
            interrupt: None,
            instruction_index: 0,
        };
        simulator.randomize_phases();
        simulator
    }

    /// Fresh random Z components on every qubit, as an all-qubit reset
    /// leaves them.
    fn randomize_phases(&mut self) {
        for qubit in 0..self.num_qubits {
            self.z_table.row_mut(qubit).randomize(&mut self.rng);
        }
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[must_use]
    pub fn num_shots(&self) -> usize {
        self.num_shots
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn record(&self) -> &MeasureRecordBatch {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut MeasureRecordBatch {
        &mut self.record
    }

    #[must_use]
    pub fn detector_record(&self) -> &MeasureRecordBatch {
        &self.det_record
    }

    /// Observable parity accumulator, one row per declared observable.
    #[must_use]
    pub fn observables(&self) -> &BitTable {
        &self.obs_table
    }

    /// Per-shot classical input bits for `sweep[k]` targets.
    pub fn sweep_table_mut(&mut self) -> &mut BitTable {
        &mut self.sweep_table
    }

    /// Requests cooperative cancellation, checked between instructions.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    /// Runs `circuit` to completion, accumulating the record in memory.
    ///
    /// # Errors
    ///
    /// Surfaces record underflows, interrupts, and writer I/O failures with
    /// the offending instruction index.
    pub fn execute(&mut self, circuit: &Circuit) -> Result<(), SimError> {
        self.instruction_index = 0;
        self.run_block(circuit)
    }

    /// Runs `circuit`, flushing full 1024-row record blocks to `writer` as
    /// they accumulate and finishing with the bit path; set bits of
    /// `ref_sample` invert the corresponding rows so the stream carries the
    /// deviation from the reference sample.
    ///
    /// # Errors
    ///
    /// As [`FrameSimulator::execute`].
    pub fn execute_streaming<Writer, Ref>(
        &mut self,
        circuit: &Circuit,
        writer: &mut Writer,
        ref_sample: &Ref,
    ) -> Result<(), SimError>
    where
        Writer: RecordWriter + ?Sized,
        Ref: Bits + ?Sized,
    {
        self.instruction_index = 0;
        self.run_block_streaming(circuit, writer, ref_sample)?;
        self.record.final_write_unwritten_results_to(writer, ref_sample)?;
        Ok(())
    }

    fn run_block(&mut self, block: &Circuit) -> Result<(), SimError> {
        for op in &block.ops {
            match op {
                CircuitOp::Instruction(instruction) => {
                    self.check_interrupt()?;
                    self.dispatch(instruction)?;
                    self.instruction_index += 1;
                }
                CircuitOp::Repeat { repetitions, block } => {
                    self.instruction_index += 1;
                    for _ in 0..*repetitions {
                        self.run_block(block)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn run_block_streaming<Writer, Ref>(
        &mut self,
        block: &Circuit,
        writer: &mut Writer,
        ref_sample: &Ref,
    ) -> Result<(), SimError>
    where
        Writer: RecordWriter + ?Sized,
        Ref: Bits + ?Sized,
    {
        for op in &block.ops {
            match op {
                CircuitOp::Instruction(instruction) => {
                    self.check_interrupt()?;
                    self.dispatch(instruction)?;
                    self.instruction_index += 1;
                    if self.record.unwritten() >= FLUSH_BLOCK_ROWS {
                        self.record.intermediate_write_unwritten_results_to(writer, ref_sample)?;
                    }
                }
                CircuitOp::Repeat { repetitions, block } => {
                    self.instruction_index += 1;
                    for _ in 0..*repetitions {
                        self.run_block_streaming(block, writer, ref_sample)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_interrupt(&self) -> Result<(), SimError> {
        match &self.interrupt {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(SimError::Interrupted {
                index: self.instruction_index,
            }),
            _ => Ok(()),
        }
    }

    /// The dense jump table: one arm per gate id.
    fn dispatch(&mut self, instruction: &Instruction) -> Result<(), SimError> {
        use GateId::*;
        match instruction.gate {
            Identity => {}
            Tick => self.ticks += 1,
            PauliX => self.do_deterministic_pauli(instruction, true, false),
            PauliY => self.do_deterministic_pauli(instruction, true, true),
            PauliZ => self.do_deterministic_pauli(instruction, false, true),
            H | HXY | HYZ | S | SDag | SqrtX | SqrtXDag | SqrtY | SqrtYDag | CXyz | CZyx => {
                self.do_single_qubit_unitary(instruction);
            }
            CX | CY | CZ | Swap => self.do_two_qubit_unitary(instruction)?,
            M => self.do_measure(instruction, &MeasureBasis::Z, false),
            MX => self.do_measure(instruction, &MeasureBasis::X, false),
            MY => self.do_measure(instruction, &MeasureBasis::Y, false),
            MR => self.do_measure(instruction, &MeasureBasis::Z, true),
            MRX => self.do_measure(instruction, &MeasureBasis::X, true),
            MRY => self.do_measure(instruction, &MeasureBasis::Y, true),
            R => self.do_reset(instruction, &MeasureBasis::Z),
            RX => self.do_reset(instruction, &MeasureBasis::X),
            RY => self.do_reset(instruction, &MeasureBasis::Y),
            XError => self.do_pauli_error(instruction, true, false),
            YError => self.do_pauli_error(instruction, true, true),
            ZError => self.do_pauli_error(instruction, false, true),
            Depolarize1 => self.do_depolarize1(instruction),
            Depolarize2 => self.do_depolarize2(instruction),
            PauliChannel1 => self.do_pauli_channel1(instruction),
            PauliChannel2 => self.do_pauli_channel2(instruction),
            CorrelatedError => self.do_correlated_error(instruction, false),
            ElseCorrelatedError => self.do_correlated_error(instruction, true),
            Detector => self.do_detector(instruction)?,
            ObservableInclude => self.do_observable_include(instruction)?,
            Repeat => unreachable!("validation rejects REPEAT as an instruction"),
        }
        Ok(())
    }

    // ========== Unitary handlers ==========

    /// Deterministic X/Y/Z gates inject the flip on every shot, keeping the
    /// frame absolute for Pauli-only determinism.
    fn do_deterministic_pauli(&mut self, instruction: &Instruction, x_component: bool, z_component: bool) {
        for &target in &instruction.targets {
            let qubit = target.qubit().expect("validated target") as usize;
            if x_component {
                self.x_table.row_mut(qubit).invert_bits();
            }
            if z_component {
                self.z_table.row_mut(qubit).invert_bits();
            }
        }
    }

    fn do_single_qubit_unitary(&mut self, instruction: &Instruction) {
        for &target in &instruction.targets {
            let qubit = target.qubit().expect("validated target") as usize;
            match instruction.gate {
                // X ↔ Z
                GateId::H => {
                    self.scratch.assign(&self.x_table.row(qubit));
                    let z_row = self.z_table.row(qubit);
                    self.x_table.row_mut(qubit).assign(&z_row);
                    self.z_table.row_mut(qubit).assign(&self.scratch);
                }
                // X → Y: an X error gains a Z component; S† acts the same
                // on frames.
                GateId::S | GateId::SDag => {
                    let x_row = self.x_table.row(qubit);
                    self.z_table.row_mut(qubit).xor_assign(&x_row);
                }
                // Z → Y, likewise phase-free on frames.
                GateId::SqrtX | GateId::SqrtXDag => {
                    let z_row = self.z_table.row(qubit);
                    self.x_table.row_mut(qubit).xor_assign(&z_row);
                }
                _ => {
                    let action = match GATE_CATALOGUE.gate(instruction.gate).unitary {
                        Some(UnitaryAction::Single(action)) => action,
                        _ => unreachable!("single-qubit unitary has a single-qubit action"),
                    };
                    self.apply_single_action(&action, qubit);
                }
            }
        }
    }

    fn apply_single_action(&mut self, action: &SingleQubitAction, qubit: usize) {
        self.scratch.assign(&self.x_table.row(qubit));
        self.scratch2.assign(&self.z_table.row(qubit));
        {
            let mut x_row = self.x_table.row_mut(qubit);
            x_row.clear_bits();
            if action.x_image.kind.x_bit() {
                x_row.xor_assign(&self.scratch);
            }
            if action.z_image.kind.x_bit() {
                x_row.xor_assign(&self.scratch2);
            }
        }
        {
            let mut z_row = self.z_table.row_mut(qubit);
            z_row.clear_bits();
            if action.x_image.kind.z_bit() {
                z_row.xor_assign(&self.scratch);
            }
            if action.z_image.kind.z_bit() {
                z_row.xor_assign(&self.scratch2);
            }
        }
    }

    fn do_two_qubit_unitary(&mut self, instruction: &Instruction) -> Result<(), SimError> {
        for (&control, &target) in instruction.targets.iter().tuples() {
            let target_qubit = target.qubit().expect("validated target") as usize;
            match control {
                GateTarget::Qubit(control_qubit) => {
                    self.apply_quantum_pair(instruction.gate, control_qubit as usize, target_qubit);
                }
                GateTarget::Record(lookback) => {
                    let row = self
                        .record
                        .lookback(lookback as usize)
                        .map_err(|source| SimError::Record {
                            index: self.instruction_index,
                            source,
                        })?;
                    self.scratch.assign(&row);
                    self.apply_classical_pauli(instruction.gate, target_qubit);
                }
                GateTarget::Sweep(sweep_bit) => {
                    self.scratch.assign(&self.sweep_table.row(sweep_bit as usize));
                    self.apply_classical_pauli(instruction.gate, target_qubit);
                }
                other => unreachable!("validation rejects control {other}"),
            }
        }
        Ok(())
    }

    fn apply_quantum_pair(&mut self, gate: GateId, control: usize, target: usize) {
        match gate {
            // X_c → X_c X_t, Z_t → Z_c Z_t
            GateId::CX => {
                {
                    let (mut target_row, control_row) = self.x_table.rows2_mut(target, control);
                    target_row.xor_assign(&control_row);
                }
                let (mut control_row, target_row) = self.z_table.rows2_mut(control, target);
                control_row.xor_assign(&target_row);
            }
            // X_a → X_a Z_b, X_b → Z_a X_b
            GateId::CZ => {
                {
                    let x_control = self.x_table.row(control);
                    self.z_table.row_mut(target).xor_assign(&x_control);
                }
                let x_target = self.x_table.row(target);
                self.z_table.row_mut(control).xor_assign(&x_target);
            }
            GateId::Swap => {
                self.x_table.swap_rows(control, target);
                self.z_table.swap_rows(control, target);
            }
            _ => {
                let action = match GATE_CATALOGUE.gate(gate).unitary {
                    Some(UnitaryAction::Pair(action)) => action,
                    _ => unreachable!("two-qubit unitary has a pair action"),
                };
                self.apply_pair_action(&action, control, target);
            }
        }
    }

    fn apply_pair_action(&mut self, action: &TwoQubitAction, first: usize, second: usize) {
        let old = [
            BitVec::from_view(&self.x_table.row(first)),
            BitVec::from_view(&self.z_table.row(first)),
            BitVec::from_view(&self.x_table.row(second)),
            BitVec::from_view(&self.z_table.row(second)),
        ];
        let rebuild = |table: &mut BitTable, qubit: usize, component: fn(&paulibit::PairImage) -> bool| {
            let mut row = table.row_mut(qubit);
            row.clear_bits();
            for (source, image) in old.iter().zip(&action.images) {
                if component(image) {
                    row.xor_assign(source);
                }
            }
        };
        rebuild(&mut self.x_table, first, |image| image.first.x_bit());
        rebuild(&mut self.z_table, first, |image| image.first.z_bit());
        rebuild(&mut self.x_table, second, |image| image.second.x_bit());
        rebuild(&mut self.z_table, second, |image| image.second.z_bit());
    }

    /// Record-controlled or sweep-controlled Pauli; the control row is in
    /// `scratch`.
    fn apply_classical_pauli(&mut self, gate: GateId, target: usize) {
        match gate {
            GateId::CX => self.x_table.row_mut(target).xor_assign(&self.scratch),
            GateId::CY => {
                self.x_table.row_mut(target).xor_assign(&self.scratch);
                self.z_table.row_mut(target).xor_assign(&self.scratch);
            }
            GateId::CZ => self.z_table.row_mut(target).xor_assign(&self.scratch),
            _ => unreachable!("only CX/CY/CZ take classical controls"),
        }
    }

    // ========== Collapsing handlers ==========

    fn do_measure(&mut self, instruction: &Instruction, basis: &MeasureBasis, also_reset: bool) {
        for &target in &instruction.targets {
            let qubit = target.qubit().expect("validated target") as usize;

            // The recorded bit is the frame component that anticommutes
            // with the measured observable.
            match basis {
                MeasureBasis::Z => self.scratch.assign(&self.x_table.row(qubit)),
                MeasureBasis::X => self.scratch.assign(&self.z_table.row(qubit)),
                MeasureBasis::Y => {
                    self.scratch.assign(&self.x_table.row(qubit));
                    self.scratch.xor_assign(&self.z_table.row(qubit));
                }
            }
            if target.is_inverted() {
                self.scratch.invert_bits();
            }
            self.record.record_result(&self.scratch);

            // Collapse: add a fresh random multiple of the measured Pauli.
            match basis {
                MeasureBasis::Z => self.z_table.row_mut(qubit).randomize(&mut self.rng),
                MeasureBasis::X => self.x_table.row_mut(qubit).randomize(&mut self.rng),
                MeasureBasis::Y => {
                    self.scratch2.randomize(&mut self.rng);
                    self.x_table.row_mut(qubit).xor_assign(&self.scratch2);
                    self.z_table.row_mut(qubit).xor_assign(&self.scratch2);
                }
            }

            if also_reset {
                self.reset_qubit(qubit, basis);
            }
        }
    }

    fn do_reset(&mut self, instruction: &Instruction, basis: &MeasureBasis) {
        for &target in &instruction.targets {
            let qubit = target.qubit().expect("validated target") as usize;
            self.reset_qubit(qubit, basis);
        }
    }

    /// After a reset only multiples of the reset basis survive as harmless
    /// errors, so the frame becomes a random multiple of that basis.
    fn reset_qubit(&mut self, qubit: usize, basis: &MeasureBasis) {
        match basis {
            MeasureBasis::Z => {
                self.x_table.row_mut(qubit).clear_bits();
                self.z_table.row_mut(qubit).randomize(&mut self.rng);
            }
            MeasureBasis::X => {
                self.z_table.row_mut(qubit).clear_bits();
                self.x_table.row_mut(qubit).randomize(&mut self.rng);
            }
            MeasureBasis::Y => {
                self.x_table.row_mut(qubit).randomize(&mut self.rng);
                self.scratch2.assign(&self.x_table.row(qubit));
                self.z_table.row_mut(qubit).assign(&self.scratch2);
            }
        }
    }

    // ========== Noise handlers ==========

    fn do_pauli_error(&mut self, instruction: &Instruction, x_component: bool, z_component: bool) {
        let probability = instruction.args[0];
        if probability <= 0.0 {
            return;
        }
        for &target in &instruction.targets {
            let qubit = target.qubit().expect("validated target") as usize;
            if x_component && z_component {
                self.scratch.clear_bits();
                scatter_biased_bits(&mut self.scratch, probability, &mut self.rng);
                self.x_table.row_mut(qubit).xor_assign(&self.scratch);
                self.z_table.row_mut(qubit).xor_assign(&self.scratch);
            } else if x_component {
                let mut row = self.x_table.row_mut(qubit);
                scatter_biased_bits(&mut row, probability, &mut self.rng);
            } else {
                let mut row = self.z_table.row_mut(qubit);
                scatter_biased_bits(&mut row, probability, &mut self.rng);
            }
        }
    }

    fn do_depolarize1(&mut self, instruction: &Instruction) {
        let probability = instruction.args[0];
        if probability <= 0.0 {
            return;
        }
        for &target in &instruction.targets {
            let qubit = target.qubit().expect("validated target") as usize;
            let mut skips = GeometricSkips::new(probability);
            let mut shot = skips.next_skip(&mut self.rng);
            while shot < self.num_shots {
                let bits = sample_non_identity_pauli_bits(1, &mut self.rng);
                if bits & 1 != 0 {
                    self.x_table.negate((qubit, shot));
                }
                if bits & 2 != 0 {
                    self.z_table.negate((qubit, shot));
                }
                shot = shot.saturating_add(skips.next_skip(&mut self.rng).saturating_add(1));
            }
        }
    }

    fn do_depolarize2(&mut self, instruction: &Instruction) {
        let probability = instruction.args[0];
        if probability <= 0.0 {
            return;
        }
        for (&first, &second) in instruction.targets.iter().tuples() {
            let first = first.qubit().expect("validated target") as usize;
            let second = second.qubit().expect("validated target") as usize;
            let mut skips = GeometricSkips::new(probability);
            let mut shot = skips.next_skip(&mut self.rng);
            while shot < self.num_shots {
                let bits = sample_non_identity_pauli_bits(2, &mut self.rng);
                if bits & 1 != 0 {
                    self.x_table.negate((first, shot));
                }
                if bits & 2 != 0 {
                    self.z_table.negate((first, shot));
                }
                if bits & 4 != 0 {
                    self.x_table.negate((second, shot));
                }
                if bits & 8 != 0 {
                    self.z_table.negate((second, shot));
                }
                shot = shot.saturating_add(skips.next_skip(&mut self.rng).saturating_add(1));
            }
        }
    }

    fn do_pauli_channel1(&mut self, instruction: &Instruction) {
        let total: f64 = instruction.args.iter().sum();
        if total <= 0.0 {
            return;
        }
        let sampler = AliasSampler::new(&instruction.args);
        for &target in &instruction.targets {
            let qubit = target.qubit().expect("validated target") as usize;
            let mut skips = GeometricSkips::new(total);
            let mut shot = skips.next_skip(&mut self.rng);
            while shot < self.num_shots {
                // Channel order is (X, Y, Z).
                let (x_component, z_component) = single_code_components(sampler.sample(&mut self.rng) + 1);
                if x_component {
                    self.x_table.negate((qubit, shot));
                }
                if z_component {
                    self.z_table.negate((qubit, shot));
                }
                shot = shot.saturating_add(skips.next_skip(&mut self.rng).saturating_add(1));
            }
        }
    }

    fn do_pauli_channel2(&mut self, instruction: &Instruction) {
        let total: f64 = instruction.args.iter().sum();
        if total <= 0.0 {
            return;
        }
        let sampler = AliasSampler::new(&instruction.args);
        for (&first, &second) in instruction.targets.iter().tuples() {
            let first = first.qubit().expect("validated target") as usize;
            let second = second.qubit().expect("validated target") as usize;
            let mut skips = GeometricSkips::new(total);
            let mut shot = skips.next_skip(&mut self.rng);
            while shot < self.num_shots {
                // Channel order is (IX, IY, IZ, XI, XX, …, ZZ).
                let pattern = sampler.sample(&mut self.rng) + 1;
                let (first_x, first_z) = single_code_components(pattern / 4);
                let (second_x, second_z) = single_code_components(pattern % 4);
                if first_x {
                    self.x_table.negate((first, shot));
                }
                if first_z {
                    self.z_table.negate((first, shot));
                }
                if second_x {
                    self.x_table.negate((second, shot));
                }
                if second_z {
                    self.z_table.negate((second, shot));
                }
                shot = shot.saturating_add(skips.next_skip(&mut self.rng).saturating_add(1));
            }
        }
    }

    fn do_correlated_error(&mut self, instruction: &Instruction, else_form: bool) {
        let probability = instruction.args[0];
        if else_form {
            self.scratch.clear_bits();
            if probability > 0.0 {
                scatter_biased_bits(&mut self.scratch, probability, &mut self.rng);
            }
            // Only shots where no earlier member of the chain fired.
            self.scratch.and_not_assign(&self.last_correlated_error_occurred);
            self.last_correlated_error_occurred.or_assign(&self.scratch);
        } else {
            self.scratch.clear_bits();
            if probability > 0.0 {
                scatter_biased_bits(&mut self.scratch, probability, &mut self.rng);
            }
            self.last_correlated_error_occurred.assign(&self.scratch);
        }

        for &target in &instruction.targets {
            let (kind, qubit) = match target {
                GateTarget::Pauli(kind, qubit) => (kind, qubit as usize),
                other => unreachable!("validation rejects target {other}"),
            };
            if kind.x_bit() {
                self.x_table.row_mut(qubit).xor_assign(&self.scratch);
            }
            if kind.z_bit() {
                self.z_table.row_mut(qubit).xor_assign(&self.scratch);
            }
        }
    }

    // ========== Annotations ==========

    fn do_detector(&mut self, instruction: &Instruction) -> Result<(), SimError> {
        self.scratch.clear_bits();
        for &target in &instruction.targets {
            let lookback = match target {
                GateTarget::Record(lookback) => lookback as usize,
                other => unreachable!("validation rejects target {other}"),
            };
            let row = self.record.lookback(lookback).map_err(|source| SimError::Record {
                index: self.instruction_index,
                source,
            })?;
            self.scratch.xor_assign(&row);
        }
        self.det_record.record_result(&self.scratch);
        Ok(())
    }

    fn do_observable_include(&mut self, instruction: &Instruction) -> Result<(), SimError> {
        let observable = instruction.args[0] as usize;
        for &target in &instruction.targets {
            let lookback = match target {
                GateTarget::Record(lookback) => lookback as usize,
                other => unreachable!("validation rejects target {other}"),
            };
            let row = self.record.lookback(lookback).map_err(|source| SimError::Record {
                index: self.instruction_index,
                source,
            })?;
            self.obs_table.row_mut(observable).xor_assign(&row);
        }
        Ok(())
    }
}

/// X/Z components of a channel code in (I, X, Y, Z) order.
fn single_code_components(code: usize) -> (bool, bool) {
    match code {
        0 => (false, false),
        1 => (true, false),
        2 => (true, true),
        3 => (false, true),
        _ => unreachable!("channel codes are two bits"),
    }
}
