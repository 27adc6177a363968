use bitplane::view::Bits;
use paulibit::{PauliKind, PauliString};
use proptest::prelude::*;

/// A Pauli product together with its accumulated i-exponent, for comparing
/// group products exactly.
#[derive(Debug, PartialEq)]
struct PhasedProduct {
    planes: PauliString,
    exponent: u8,
}

fn phased(string: &PauliString) -> PhasedProduct {
    let mut planes = string.clone();
    let exponent = 2 * u8::from(string.sign());
    planes.set_sign(false);
    PhasedProduct { planes, exponent }
}

fn multiply(left: &PhasedProduct, right: &PhasedProduct) -> PhasedProduct {
    let mut planes = left.planes.clone();
    let log_i = planes.mul_assign_right_with_log_i(&right.planes.as_ref());
    PhasedProduct {
        planes,
        exponent: (left.exponent + right.exponent + log_i) % 4,
    }
}

fn pauli_strategy(num_qubits: usize) -> impl Strategy<Value = PauliString> {
    (prop::collection::vec(0u8..4, num_qubits), any::<bool>()).prop_map(move |(kinds, sign)| {
        let mut result = PauliString::identity(num_qubits);
        for (qubit, code) in kinds.into_iter().enumerate() {
            let kind = match code {
                0 => PauliKind::I,
                1 => PauliKind::X,
                2 => PauliKind::Z,
                _ => PauliKind::Y,
            };
            result.set_kind(qubit, kind);
        }
        result.set_sign(sign);
        result
    })
}

proptest! {
    #[test]
    fn product_is_associative(
        first in pauli_strategy(9),
        second in pauli_strategy(9),
        third in pauli_strategy(9),
    ) {
        let (a, b, c) = (phased(&first), phased(&second), phased(&third));
        let left = multiply(&multiply(&a, &b), &c);
        let right = multiply(&a, &multiply(&b, &c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn phase_parity_matches_commutation(
        first in pauli_strategy(7),
        second in pauli_strategy(7),
    ) {
        let commutes = first.commutes(&second.as_ref());
        let mut product = first.clone();
        let log_i = product.mul_assign_right_with_log_i(&second.as_ref());
        prop_assert_eq!(log_i % 2 == 0, commutes);
    }

    #[test]
    fn squares_are_identity_planes(first in pauli_strategy(8)) {
        let mut product = first.clone();
        let log_i = product.mul_assign_right_with_log_i(&first.as_ref());
        prop_assert!(product.xs().is_zero());
        prop_assert!(product.zs().is_zero());
        // P² = +I for Hermitian P once the untouched lhs sign is folded in.
        prop_assert_eq!((log_i + 2 * u8::from(product.sign())) % 4, 0);
    }

    #[test]
    fn ref_and_owned_agree(first in pauli_strategy(12)) {
        let view = first.as_ref();
        prop_assert_eq!(view.to_owned(), first.clone());
        for qubit in 0..12 {
            prop_assert_eq!(view.kind_at(qubit), first.kind_at(qubit));
        }
    }
}

#[test]
fn random_pauli_is_reproducible() {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    let first = PauliString::random(40, &mut SmallRng::seed_from_u64(11));
    let second = PauliString::random(40, &mut SmallRng::seed_from_u64(11));
    assert_eq!(first, second);
}
