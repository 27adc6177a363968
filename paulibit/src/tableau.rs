use bitplane::{BitTable, BitVec, Bits, BitsMut, Word};

use crate::actions::{SingleQubitAction, TwoQubitAction, UnitaryAction};
use crate::kind::PauliKind;
use crate::pauli::PauliString;

/// Clifford tableau: the images of the generators X₀…X_{n−1}, Z₀…Z_{n−1}.
///
/// Row `r < n` is the image of `X_r`; row `n + r` is the image of `Z_r`.
/// Storage is qubit-major: `x_planes.row(q)` holds, for every generator row,
/// the X component of that row's Pauli at qubit `q` (and `z_planes`
/// likewise), with one sign bit per row. Conjugating by a gate on one or two
/// qubits therefore touches a handful of `2n`-bit plane rows and runs
/// word-parallel across all generator rows at once.
#[derive(Clone, Debug, Eq, PartialEq)]
#[must_use]
pub struct Tableau {
    num_qubits: usize,
    x_planes: BitTable,
    z_planes: BitTable,
    signs: BitVec,
}

impl Tableau {
    /// The identity Clifford: X_i ↦ X_i, Z_i ↦ Z_i, all signs positive.
    pub fn identity(num_qubits: usize) -> Self {
        let rows = 2 * num_qubits;
        let mut tableau = Tableau {
            num_qubits,
            x_planes: BitTable::zeros(num_qubits, rows),
            z_planes: BitTable::zeros(num_qubits, rows),
            signs: BitVec::zeros(rows),
        };
        for qubit in 0..num_qubits {
            tableau.x_planes.set((qubit, qubit), true);
            tableau.z_planes.set((qubit, num_qubits + qubit), true);
        }
        tableau
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Conjugate by a catalogue unitary acting on `qubits`.
    ///
    /// # Panics
    ///
    /// Panics if the qubit count does not match the action arity or a qubit
    /// repeats.
    pub fn apply(&mut self, action: &UnitaryAction, qubits: &[usize]) {
        match action {
            UnitaryAction::Single(single) => {
                assert_eq!(qubits.len(), 1, "single-qubit action takes one qubit");
                self.apply_single(single, qubits[0]);
            }
            UnitaryAction::Pair(pair) => {
                assert_eq!(qubits.len(), 2, "two-qubit action takes two qubits");
                self.apply_pair(pair, qubits[0], qubits[1]);
            }
        }
    }

    /// Conjugate all generator rows by a single-qubit gate on `qubit`.
    pub fn apply_single(&mut self, action: &SingleQubitAction, qubit: usize) {
        let old_x = BitVec::from_view(&self.x_planes.row(qubit));
        let old_z = BitVec::from_view(&self.z_planes.row(qubit));

        replace_plane(
            &mut self.x_planes,
            qubit,
            [
                (action.x_image.kind.x_bit(), &old_x),
                (action.z_image.kind.x_bit(), &old_z),
            ],
        );
        replace_plane(
            &mut self.z_planes,
            qubit,
            [
                (action.x_image.kind.z_bit(), &old_x),
                (action.z_image.kind.z_bit(), &old_z),
            ],
        );

        let flip_x = word_mask(action.sign_flip[PauliKind::X as usize]);
        let flip_z = word_mask(action.sign_flip[PauliKind::Z as usize]);
        let flip_y = word_mask(action.sign_flip[PauliKind::Y as usize]);
        let sign_words = self.signs.words_mut();
        for (index, sign_word) in sign_words.iter_mut().enumerate() {
            let x = old_x.words()[index];
            let z = old_z.words()[index];
            *sign_word ^= (flip_x & x & !z) | (flip_z & !x & z) | (flip_y & x & z);
        }
    }

    /// Conjugate all generator rows by a two-qubit gate on `(first, second)`.
    ///
    /// # Panics
    ///
    /// Panics if the qubits coincide.
    pub fn apply_pair(&mut self, action: &TwoQubitAction, first: usize, second: usize) {
        assert!(first != second, "two-qubit action requires distinct qubits");
        let old = [
            BitVec::from_view(&self.x_planes.row(first)),
            BitVec::from_view(&self.z_planes.row(first)),
            BitVec::from_view(&self.x_planes.row(second)),
            BitVec::from_view(&self.z_planes.row(second)),
        ];

        let select = |component: fn(&crate::actions::PairImage) -> bool| {
            [
                (component(&action.images[0]), &old[0]),
                (component(&action.images[1]), &old[1]),
                (component(&action.images[2]), &old[2]),
                (component(&action.images[3]), &old[3]),
            ]
        };
        replace_plane(&mut self.x_planes, first, select(|image| image.first.x_bit()));
        replace_plane(&mut self.z_planes, first, select(|image| image.first.z_bit()));
        replace_plane(&mut self.x_planes, second, select(|image| image.second.x_bit()));
        replace_plane(&mut self.z_planes, second, select(|image| image.second.z_bit()));

        let rows = 2 * self.num_qubits;
        let mut flip = BitVec::zeros(rows);
        {
            let flip_words = flip.words_mut();
            for (index, flip_word) in flip_words.iter_mut().enumerate() {
                let planes = [
                    old[0].words()[index],
                    old[1].words()[index],
                    old[2].words()[index],
                    old[3].words()[index],
                ];
                let mut acc: Word = 0;
                for (pattern, &flips) in action.sign_flip.iter().enumerate().skip(1) {
                    if flips {
                        let mut term = Word::MAX;
                        for (bit, &plane) in planes.iter().enumerate() {
                            term &= if pattern & (1 << bit) != 0 { plane } else { !plane };
                        }
                        acc |= term;
                    }
                }
                *flip_word = acc;
            }
        }
        // The NOT terms above set padding bits; clear them before folding.
        flip.and_assign(&BitVec::ones(rows));
        self.signs.xor_assign(&flip);
    }

    /// The image Pauli of generator row `row` (`row < n`: X images,
    /// otherwise Z images).
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    pub fn row(&self, row: usize) -> PauliString {
        assert!(row < 2 * self.num_qubits, "generator row {row} out of range");
        let mut result = PauliString::identity(self.num_qubits);
        for qubit in 0..self.num_qubits {
            let kind = PauliKind::from_xz(self.x_planes.get((qubit, row)), self.z_planes.get((qubit, row)));
            result.set_kind(qubit, kind);
        }
        result.set_sign(self.signs.index(row));
        result
    }

    pub fn x_image(&self, qubit: usize) -> PauliString {
        self.row(qubit)
    }

    pub fn z_image(&self, qubit: usize) -> PauliString {
        self.row(self.num_qubits + qubit)
    }

    /// Whether the rows form a symplectic basis: `X_i` and `Z_i` images
    /// anticommute pairwise and everything else commutes.
    #[must_use]
    pub fn is_symplectic(&self) -> bool {
        let rows: Vec<PauliString> = (0..2 * self.num_qubits).map(|row| self.row(row)).collect();
        for (left_index, left) in rows.iter().enumerate() {
            for (right_index, right) in rows.iter().enumerate().skip(left_index + 1) {
                let conjugate_pair = right_index == left_index + self.num_qubits;
                if left.commutes(&right.as_ref()) == conjugate_pair {
                    return false;
                }
            }
        }
        true
    }
}

fn word_mask(flag: bool) -> Word {
    if flag {
        Word::MAX
    } else {
        0
    }
}

/// Overwrite plane row `row` with the XOR of the selected sources.
fn replace_plane<const SOURCES: usize>(planes: &mut BitTable, row: usize, sources: [(bool, &BitVec); SOURCES]) {
    let mut target = planes.row_mut(row);
    target.clear_bits();
    for (selected, source) in sources {
        if selected {
            target.xor_assign(source);
        }
    }
}
