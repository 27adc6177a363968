//! Parsed circuit model: targets, instructions, and repeat blocks.
//!
//! The textual parser lives outside this crate; circuits arrive (or are
//! built programmatically) in the parsed form described here, preserving
//! source order. [`Circuit::validate`] checks the structural rules that the
//! parser is required to uphold: target kinds against gate flags, argument
//! arity and ranges, and repeat-block invariants.

use std::fmt;

use paulibit::PauliKind;
use smallvec::SmallVec;
use thiserror::Error;

use crate::gates::{ArgCount, GateFlags, GateId, GATE_CATALOGUE};

pub type QubitId = u32;

/// One target token of an instruction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GateTarget {
    /// A plain qubit index.
    Qubit(QubitId),
    /// A qubit measured with the result inverted (`!q`).
    Inverted(QubitId),
    /// A Pauli-prefixed qubit, one component of a correlated error.
    Pauli(PauliKind, QubitId),
    /// A measurement-record lookback `rec[-k]`, k ≥ 1.
    Record(u32),
    /// A per-shot classical input bit `sweep[k]`.
    Sweep(u32),
}

impl GateTarget {
    /// Lookback target; `k` counts backwards from the latest measurement.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    #[must_use]
    pub fn rec(k: u32) -> GateTarget {
        assert!(k >= 1, "record lookback must be at least 1");
        GateTarget::Record(k)
    }

    /// The qubit this target addresses, if any.
    #[must_use]
    pub fn qubit(self) -> Option<QubitId> {
        match self {
            GateTarget::Qubit(q) | GateTarget::Inverted(q) | GateTarget::Pauli(_, q) => Some(q),
            GateTarget::Record(_) | GateTarget::Sweep(_) => None,
        }
    }

    #[must_use]
    pub fn is_inverted(self) -> bool {
        matches!(self, GateTarget::Inverted(_))
    }
}

impl fmt::Display for GateTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateTarget::Qubit(q) => write!(formatter, "{q}"),
            GateTarget::Inverted(q) => write!(formatter, "!{q}"),
            GateTarget::Pauli(kind, q) => write!(formatter, "{}{q}", kind.to_char()),
            GateTarget::Record(k) => write!(formatter, "rec[-{k}]"),
            GateTarget::Sweep(k) => write!(formatter, "sweep[{k}]"),
        }
    }
}

/// One instruction: a gate, its parenthesized arguments, and its targets.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub gate: GateId,
    pub args: SmallVec<[f64; 2]>,
    pub targets: Vec<GateTarget>,
}

impl Instruction {
    pub fn new(gate: GateId, args: impl IntoIterator<Item = f64>, targets: Vec<GateTarget>) -> Self {
        Instruction {
            gate,
            args: args.into_iter().collect(),
            targets,
        }
    }

    /// Instruction over plain qubit targets with no arguments.
    pub fn on_qubits(gate: GateId, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Instruction::new(gate, [], qubits.into_iter().map(GateTarget::Qubit).collect())
    }
}

/// A flat instruction, or a counted block.
#[derive(Clone, Debug, PartialEq)]
pub enum CircuitOp {
    Instruction(Instruction),
    Repeat { repetitions: u64, block: Circuit },
}

/// An ordered sequence of operations, preserving source order.
#[derive(Clone, Debug, Default, PartialEq)]
#[must_use]
pub struct Circuit {
    pub ops: Vec<CircuitOp>,
}

/// A structural rule of the parsed form was violated.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CircuitError {
    #[error("instruction {index} ({gate}): expected {expected} parens argument(s), got {actual}")]
    ArgCountMismatch {
        index: usize,
        gate: &'static str,
        expected: u8,
        actual: usize,
    },
    #[error("instruction {index} ({gate}): argument {value} is not a probability in [0, 1]")]
    ProbabilityOutOfRange {
        index: usize,
        gate: &'static str,
        value: f64,
    },
    #[error("instruction {index} ({gate}): channel probabilities sum to {total}, which exceeds 1")]
    ProbabilitiesSumAboveOne {
        index: usize,
        gate: &'static str,
        total: f64,
    },
    #[error("instruction {index} ({gate}): argument {value} is not a valid observable index")]
    BadObservableIndex {
        index: usize,
        gate: &'static str,
        value: f64,
    },
    #[error("instruction {index} ({gate}): target {target} is not allowed here")]
    InvalidTarget {
        index: usize,
        gate: &'static str,
        target: GateTarget,
    },
    #[error("instruction {index} ({gate}): takes target pairs, got {actual} target(s)")]
    OddPairTargets {
        index: usize,
        gate: &'static str,
        actual: usize,
    },
    #[error("instruction {index} ({gate}): qubit pair repeats target {target}")]
    RepeatedPairTarget {
        index: usize,
        gate: &'static str,
        target: GateTarget,
    },
    #[error("instruction {index}: REPEAT must appear as a block, not an instruction")]
    RepeatAsInstruction { index: usize },
    #[error("repeat block at instruction {index} runs zero times")]
    ZeroRepetitions { index: usize },
    #[error("repeat block at instruction {index} has an empty body")]
    EmptyRepeatBody { index: usize },
}

impl Circuit {
    pub fn new() -> Self {
        Circuit::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.ops.push(CircuitOp::Instruction(instruction));
    }

    /// Appends `gate` applied to plain qubit targets.
    pub fn append(&mut self, gate: GateId, qubits: impl IntoIterator<Item = QubitId>) {
        self.push(Instruction::on_qubits(gate, qubits));
    }

    /// Appends `gate(args…)` applied to plain qubit targets.
    pub fn append_with_args(
        &mut self,
        gate: GateId,
        args: impl IntoIterator<Item = f64>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) {
        self.push(Instruction::new(
            gate,
            args,
            qubits.into_iter().map(GateTarget::Qubit).collect(),
        ));
    }

    /// Appends a `REPEAT repetitions { block }`.
    pub fn push_repeat(&mut self, repetitions: u64, block: Circuit) {
        self.ops.push(CircuitOp::Repeat { repetitions, block });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Checks the structural invariants the parser is required to uphold.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, with the offending instruction's
    /// position in source order.
    pub fn validate(&self) -> Result<(), CircuitError> {
        let mut index = 0;
        self.validate_block(&mut index)
    }

    fn validate_block(&self, index: &mut usize) -> Result<(), CircuitError> {
        for op in &self.ops {
            match op {
                CircuitOp::Instruction(instruction) => {
                    validate_instruction(instruction, *index)?;
                    *index += 1;
                }
                CircuitOp::Repeat { repetitions, block } => {
                    if *repetitions == 0 {
                        return Err(CircuitError::ZeroRepetitions { index: *index });
                    }
                    if block.is_empty() {
                        return Err(CircuitError::EmptyRepeatBody { index: *index });
                    }
                    *index += 1;
                    block.validate_block(index)?;
                }
            }
        }
        Ok(())
    }

    /// Highest qubit index addressed, if any.
    #[must_use]
    pub fn max_qubit(&self) -> Option<QubitId> {
        self.fold_instructions(None, |acc, instruction| {
            instruction
                .targets
                .iter()
                .filter_map(|target| target.qubit())
                .max()
                .map_or(acc, |q| Some(acc.map_or(q, |a: QubitId| a.max(q))))
        })
    }

    /// Number of sweep input bits referenced.
    #[must_use]
    pub fn sweep_bit_count(&self) -> usize {
        self.fold_instructions(0, |acc, instruction| {
            instruction
                .targets
                .iter()
                .filter_map(|target| match target {
                    GateTarget::Sweep(k) => Some(*k as usize + 1),
                    _ => None,
                })
                .max()
                .map_or(acc, |count| acc.max(count))
        })
    }

    /// Largest `rec[-k]` lookback referenced.
    #[must_use]
    pub fn max_lookback(&self) -> usize {
        self.fold_instructions(0, |acc, instruction| {
            instruction
                .targets
                .iter()
                .filter_map(|target| match target {
                    GateTarget::Record(k) => Some(*k as usize),
                    _ => None,
                })
                .max()
                .map_or(acc, |lookback| acc.max(lookback))
        })
    }

    /// Total measurement results produced per shot, with repeats unrolled.
    #[must_use]
    pub fn measurement_count(&self) -> usize {
        self.weighted_count(|instruction| {
            if GATE_CATALOGUE.gate(instruction.gate).produces_results() {
                instruction.targets.len()
            } else {
                0
            }
        })
    }

    /// Total detectors declared, with repeats unrolled.
    #[must_use]
    pub fn detector_count(&self) -> usize {
        self.weighted_count(|instruction| usize::from(instruction.gate == GateId::Detector))
    }

    /// Number of observable accumulator rows needed.
    #[must_use]
    pub fn observable_count(&self) -> usize {
        self.fold_instructions(0, |acc, instruction| {
            if instruction.gate == GateId::ObservableInclude {
                let observable = instruction.args.first().copied().unwrap_or(0.0) as usize;
                acc.max(observable + 1)
            } else {
                acc
            }
        })
    }

    fn weighted_count(&self, per_instruction: impl Fn(&Instruction) -> usize + Copy) -> usize {
        let mut total = 0usize;
        for op in &self.ops {
            match op {
                CircuitOp::Instruction(instruction) => total += per_instruction(instruction),
                CircuitOp::Repeat { repetitions, block } => {
                    total += (*repetitions as usize) * block.weighted_count(per_instruction);
                }
            }
        }
        total
    }

    fn fold_instructions<Acc: Copy>(&self, initial: Acc, fold: impl Fn(Acc, &Instruction) -> Acc + Copy) -> Acc {
        let mut acc = initial;
        for op in &self.ops {
            match op {
                CircuitOp::Instruction(instruction) => acc = fold(acc, instruction),
                CircuitOp::Repeat { block, .. } => acc = block.fold_instructions(acc, fold),
            }
        }
        acc
    }
}

fn validate_instruction(instruction: &Instruction, index: usize) -> Result<(), CircuitError> {
    let gate = GATE_CATALOGUE.gate(instruction.gate);
    let name = gate.name;

    if gate.flags.contains(GateFlags::BLOCK) {
        return Err(CircuitError::RepeatAsInstruction { index });
    }

    if let ArgCount::Exactly(expected) = gate.arg_count {
        if instruction.args.len() != expected as usize {
            return Err(CircuitError::ArgCountMismatch {
                index,
                gate: name,
                expected,
                actual: instruction.args.len(),
            });
        }
    }

    if gate.flags.contains(GateFlags::ARG_IS_PROBABILITY) {
        for &value in &instruction.args {
            if !(0.0..=1.0).contains(&value) {
                return Err(CircuitError::ProbabilityOutOfRange { index, gate: name, value });
            }
        }
        let total: f64 = instruction.args.iter().sum();
        if instruction.args.len() > 1 && total > 1.0 + 1e-9 {
            return Err(CircuitError::ProbabilitiesSumAboveOne { index, gate: name, total });
        }
    }

    if gate.id == GateId::ObservableInclude {
        let value = instruction.args[0];
        if value < 0.0 || value.fract() != 0.0 {
            return Err(CircuitError::BadObservableIndex { index, gate: name, value });
        }
    }

    let invalid = |target: GateTarget| CircuitError::InvalidTarget {
        index,
        gate: name,
        target,
    };

    if gate.flags.contains(GateFlags::TAKES_PAULI_TARGETS) {
        for &target in &instruction.targets {
            match target {
                GateTarget::Pauli(kind, _) if !kind.is_identity() => {}
                other => return Err(invalid(other)),
            }
        }
        return Ok(());
    }

    if gate.flags.contains(GateFlags::ANNOTATION) {
        for &target in &instruction.targets {
            match target {
                GateTarget::Record(k) if k >= 1 && gate.flags.contains(GateFlags::TAKES_RECORD_TARGETS) => {}
                other => return Err(invalid(other)),
            }
        }
        return Ok(());
    }

    if gate.flags.contains(GateFlags::MEASUREMENT) {
        for &target in &instruction.targets {
            match target {
                GateTarget::Qubit(_) | GateTarget::Inverted(_) => {}
                other => return Err(invalid(other)),
            }
        }
        return Ok(());
    }

    if gate.flags.contains(GateFlags::TWO_QUBIT) {
        if instruction.targets.len() % 2 != 0 {
            return Err(CircuitError::OddPairTargets {
                index,
                gate: name,
                actual: instruction.targets.len(),
            });
        }
        let classical_controls = gate.flags.contains(GateFlags::TAKES_RECORD_TARGETS);
        for pair in instruction.targets.chunks_exact(2) {
            let (control, target) = (pair[0], pair[1]);
            match control {
                GateTarget::Qubit(_) => {}
                GateTarget::Record(k) if classical_controls && k >= 1 => {}
                GateTarget::Sweep(_) if classical_controls => {}
                other => return Err(invalid(other)),
            }
            match target {
                GateTarget::Qubit(q) => {
                    if control == GateTarget::Qubit(q) {
                        return Err(CircuitError::RepeatedPairTarget {
                            index,
                            gate: name,
                            target,
                        });
                    }
                }
                other => return Err(invalid(other)),
            }
        }
        return Ok(());
    }

    // Remaining families (single-qubit unitaries, resets, qubit-targeted
    // noise) take plain qubit targets only.
    for &target in &instruction.targets {
        match target {
            GateTarget::Qubit(_) => {}
            other => return Err(invalid(other)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(qubit: QubitId) -> Instruction {
        Instruction::on_qubits(GateId::H, [qubit])
    }

    #[test]
    fn validates_simple_circuit() {
        let mut circuit = Circuit::new();
        circuit.push(h(0));
        circuit.append(GateId::CX, [0, 1]);
        circuit.append(GateId::M, [0, 1]);
        circuit.push(Instruction::new(
            GateId::Detector,
            [],
            vec![GateTarget::rec(1), GateTarget::rec(2)],
        ));
        assert_eq!(circuit.validate(), Ok(()));
        assert_eq!(circuit.max_qubit(), Some(1));
        assert_eq!(circuit.measurement_count(), 2);
        assert_eq!(circuit.detector_count(), 1);
        assert_eq!(circuit.max_lookback(), 2);
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let mut circuit = Circuit::new();
        circuit.append_with_args(GateId::XError, [1.5], [0]);
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::ProbabilityOutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_arg_count_mismatch() {
        let mut circuit = Circuit::new();
        circuit.append_with_args(GateId::PauliChannel1, [0.1, 0.1], [0]);
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::ArgCountMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn rejects_channel_sum_above_one() {
        let mut circuit = Circuit::new();
        circuit.append_with_args(GateId::PauliChannel1, [0.5, 0.4, 0.3], [0]);
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::ProbabilitiesSumAboveOne { .. })
        ));
    }

    #[test]
    fn rejects_record_target_on_unitary() {
        let mut circuit = Circuit::new();
        circuit.push(Instruction::new(GateId::H, [], vec![GateTarget::rec(1)]));
        assert!(matches!(circuit.validate(), Err(CircuitError::InvalidTarget { .. })));
    }

    #[test]
    fn allows_record_controlled_cx() {
        let mut circuit = Circuit::new();
        circuit.append(GateId::M, [0]);
        circuit.push(Instruction::new(
            GateId::CX,
            [],
            vec![GateTarget::rec(1), GateTarget::Qubit(1)],
        ));
        assert_eq!(circuit.validate(), Ok(()));
    }

    #[test]
    fn rejects_aliased_pair() {
        let mut circuit = Circuit::new();
        circuit.append(GateId::CZ, [2, 2]);
        assert!(matches!(circuit.validate(), Err(CircuitError::RepeatedPairTarget { .. })));
    }

    #[test]
    fn rejects_empty_or_zero_repeat() {
        let mut circuit = Circuit::new();
        circuit.push_repeat(0, {
            let mut block = Circuit::new();
            block.push(h(0));
            block
        });
        assert!(matches!(circuit.validate(), Err(CircuitError::ZeroRepetitions { index: 0 })));

        let mut circuit = Circuit::new();
        circuit.push_repeat(3, Circuit::new());
        assert!(matches!(circuit.validate(), Err(CircuitError::EmptyRepeatBody { index: 0 })));
    }

    #[test]
    fn counts_unroll_repeats() {
        let mut round = Circuit::new();
        round.append(GateId::MR, [2, 4, 8]);
        let mut circuit = Circuit::new();
        circuit.append(GateId::R, [0, 1, 2]);
        circuit.push_repeat(98, round);
        assert_eq!(circuit.measurement_count(), 98 * 3);
        assert_eq!(circuit.max_qubit(), Some(8));
    }

    #[test]
    fn correlated_error_takes_pauli_targets_only() {
        let mut circuit = Circuit::new();
        circuit.push(Instruction::new(
            GateId::CorrelatedError,
            [0.25],
            vec![
                GateTarget::Pauli(PauliKind::X, 0),
                GateTarget::Pauli(PauliKind::Y, 2),
            ],
        ));
        assert_eq!(circuit.validate(), Ok(()));

        let mut bad = Circuit::new();
        bad.push(Instruction::new(
            GateId::CorrelatedError,
            [0.25],
            vec![GateTarget::Qubit(0)],
        ));
        assert!(matches!(bad.validate(), Err(CircuitError::InvalidTarget { .. })));
    }
}
