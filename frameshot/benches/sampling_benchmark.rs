use criterion::{black_box, criterion_group, criterion_main, Criterion};
use frameshot::{sample_measurements, Circuit, GateId, GateTarget, Instruction};

/// Repetition-code memory: d data qubits interleaved with d-1 ancillas.
fn repetition_round(distance: u32, p_error: f64, compare_with_previous: bool) -> Circuit {
    let data: Vec<u32> = (0..distance).map(|index| 2 * index).collect();
    let ancilla: Vec<u32> = (0..distance - 1).map(|index| 2 * index + 1).collect();

    let mut round = Circuit::new();
    round.append_with_args(GateId::Depolarize1, [p_error], data);
    for &a in &ancilla {
        round.append(GateId::CX, [a - 1, a]);
        round.append(GateId::CX, [a + 1, a]);
    }
    round.append(GateId::MR, ancilla);
    for k in 1..distance {
        let mut lookbacks = vec![GateTarget::rec(k)];
        if compare_with_previous {
            lookbacks.push(GateTarget::rec(k + distance - 1));
        }
        round.push(Instruction::new(GateId::Detector, [], lookbacks));
    }
    round
}

fn repetition_code(distance: u32, rounds: u64, p_error: f64) -> Circuit {
    let mut circuit = Circuit::new();
    circuit.append(GateId::R, 0..2 * distance - 1);
    for op in repetition_round(distance, p_error, false).ops {
        circuit.ops.push(op);
    }
    circuit.push_repeat(rounds - 1, repetition_round(distance, p_error, true));
    circuit.append(GateId::M, (0..distance).map(|index| 2 * index));
    circuit
}

fn sample_repetition_code(criterion: &mut Criterion) {
    let circuit = repetition_code(11, 50, 0.001);
    circuit.validate().unwrap();
    criterion.bench_function("repetition_d11_r50_4096shots", |bencher| {
        bencher.iter(|| {
            let samples = sample_measurements(black_box(&circuit), 4096, Some(0)).unwrap();
            black_box(samples);
        });
    });
}

criterion_group!(benches, sample_repetition_code);
criterion_main!(benches);
