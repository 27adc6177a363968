use paulibit::PauliKind::{I, X, Y, Z};
use paulibit::{PairImage, PauliImage, SingleQubitAction, Tableau, TwoQubitAction, UnitaryAction};
use proptest::prelude::*;

fn single(x_kind: paulibit::PauliKind, x_neg: bool, z_kind: paulibit::PauliKind, z_neg: bool) -> UnitaryAction {
    UnitaryAction::Single(SingleQubitAction::from_images(
        PauliImage::new(x_kind, x_neg),
        PauliImage::new(z_kind, z_neg),
    ))
}

fn gate_set() -> Vec<UnitaryAction> {
    vec![
        // H, S, S_DAG, SQRT_X, C_XYZ
        single(Z, false, X, false),
        single(Y, false, Z, false),
        single(Y, true, Z, false),
        single(X, false, Y, true),
        single(Y, false, X, false),
        // CX, CZ, SWAP
        UnitaryAction::Pair(TwoQubitAction::from_images([
            PairImage::new(X, X, false),
            PairImage::new(Z, I, false),
            PairImage::new(I, X, false),
            PairImage::new(Z, Z, false),
        ])),
        UnitaryAction::Pair(TwoQubitAction::from_images([
            PairImage::new(X, Z, false),
            PairImage::new(Z, I, false),
            PairImage::new(Z, X, false),
            PairImage::new(I, Z, false),
        ])),
        UnitaryAction::Pair(TwoQubitAction::from_images([
            PairImage::new(I, X, false),
            PairImage::new(I, Z, false),
            PairImage::new(X, I, false),
            PairImage::new(Z, I, false),
        ])),
    ]
}

proptest! {
    /// Any sequence of catalogue-style Clifford gates keeps the generator
    /// rows a symplectic basis.
    #[test]
    fn gate_sequences_preserve_symplectic_form(
        picks in prop::collection::vec((0usize..8, 0usize..5, 0usize..5), 1..40),
    ) {
        let gates = gate_set();
        let mut tableau = Tableau::identity(5);
        for (gate_index, first, second) in picks {
            match &gates[gate_index] {
                action @ UnitaryAction::Single(_) => tableau.apply(action, &[first]),
                action @ UnitaryAction::Pair(_) => {
                    if first == second {
                        continue;
                    }
                    tableau.apply(action, &[first, second]);
                }
            }
        }
        prop_assert!(tableau.is_symplectic());
    }
}

#[test]
fn s_and_s_dag_cancel() {
    let s = single(Y, false, Z, false);
    let s_dag = single(Y, true, Z, false);
    let mut tableau = Tableau::identity(3);
    tableau.apply(&s, &[1]);
    tableau.apply(&s_dag, &[1]);
    assert_eq!(tableau, Tableau::identity(3));
}

#[test]
fn sqrt_x_cycle() {
    // SQRT_X: X→X, Z→−Y; applying it twice conjugates by X.
    let sqrt_x = single(X, false, Y, true);
    let mut tableau = Tableau::identity(1);
    tableau.apply(&sqrt_x, &[0]);
    assert_eq!(tableau.z_image(0).to_string(), "-Y");
    tableau.apply(&sqrt_x, &[0]);
    assert_eq!(tableau.x_image(0).to_string(), "+X");
    assert_eq!(tableau.z_image(0).to_string(), "-Z");
}

#[test]
fn swap_exchanges_images() {
    let swap = UnitaryAction::Pair(TwoQubitAction::from_images([
        PairImage::new(I, X, false),
        PairImage::new(I, Z, false),
        PairImage::new(X, I, false),
        PairImage::new(Z, I, false),
    ]));
    let mut tableau = Tableau::identity(2);
    tableau.apply(&swap, &[0, 1]);
    assert_eq!(tableau.x_image(0).to_string(), "+IX");
    assert_eq!(tableau.z_image(1).to_string(), "+ZI");
}

#[test]
fn c_xyz_cycles_all_three() {
    let c_xyz = single(Y, false, X, false);
    let mut tableau = Tableau::identity(1);
    tableau.apply(&c_xyz, &[0]);
    assert_eq!(tableau.x_image(0).to_string(), "+Y");
    assert_eq!(tableau.z_image(0).to_string(), "+X");
    tableau.apply(&c_xyz, &[0]);
    tableau.apply(&c_xyz, &[0]);
    assert_eq!(tableau, Tableau::identity(1), "C_XYZ has order three");
}
