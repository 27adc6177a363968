use crate::kind::PauliKind;
use crate::pauli::PauliString;

/// Signed single-qubit Pauli, the image of a generator under conjugation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PauliImage {
    pub kind: PauliKind,
    pub neg: bool,
}

impl PauliImage {
    #[must_use]
    pub const fn new(kind: PauliKind, neg: bool) -> Self {
        PauliImage { kind, neg }
    }
}

/// Signed two-qubit Pauli, the image of a generator of a qubit pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PairImage {
    pub first: PauliKind,
    pub second: PauliKind,
    pub neg: bool,
}

impl PairImage {
    #[must_use]
    pub const fn new(first: PauliKind, second: PauliKind, neg: bool) -> Self {
        PairImage { first, second, neg }
    }

    fn to_string_form(self) -> PauliString {
        let mut result = PauliString::identity(2);
        result.set_kind(0, self.first);
        result.set_kind(1, self.second);
        result.set_sign(self.neg);
        result
    }
}

/// Conjugation action of a single-qubit Clifford gate.
///
/// `x_image` and `z_image` are the images of X and Z; `sign_flip` is indexed
/// by the xz-encoded input kind and records which inputs pick up a −1. The
/// Y entry is derived from the generator images, so constructing an action
/// from images can never produce an inconsistent table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SingleQubitAction {
    pub x_image: PauliImage,
    pub z_image: PauliImage,
    pub sign_flip: [bool; 4],
}

impl SingleQubitAction {
    /// Builds the full action from the images of X and Z.
    ///
    /// # Panics
    ///
    /// Panics if the images do not describe a Clifford (the conjugated Y
    /// would carry an imaginary phase), which cannot happen for the
    /// catalogue's tables.
    #[must_use]
    pub fn from_images(x_image: PauliImage, z_image: PauliImage) -> Self {
        // Y = iXZ, so conj(Y) = i · conj(X) · conj(Z).
        let mut product = PauliString::single(x_image.kind, 0, 1);
        let z_factor = PauliString::single(z_image.kind, 0, 1);
        let mut exponent = 1 + product.mul_assign_right_with_log_i(&z_factor.as_ref());
        exponent += 2 * u8::from(x_image.neg) + 2 * u8::from(z_image.neg);
        exponent %= 4;
        assert!(exponent % 2 == 0, "single-qubit action is not Clifford");

        let mut sign_flip = [false; 4];
        sign_flip[PauliKind::X as usize] = x_image.neg;
        sign_flip[PauliKind::Z as usize] = z_image.neg;
        sign_flip[PauliKind::Y as usize] = exponent == 2;
        SingleQubitAction {
            x_image,
            z_image,
            sign_flip,
        }
    }
}

/// Conjugation action of a two-qubit Clifford gate.
///
/// `images` are the images of X⊗I, Z⊗I, I⊗X, I⊗Z in that order; `sign_flip`
/// is indexed by `x_a | z_a << 1 | x_b << 2 | z_b << 3` and is derived from
/// the generator images by exact Pauli multiplication.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TwoQubitAction {
    pub images: [PairImage; 4],
    pub sign_flip: [bool; 16],
}

impl TwoQubitAction {
    /// Builds the full action from the four generator images.
    ///
    /// # Panics
    ///
    /// Panics if the images do not describe a Clifford.
    #[must_use]
    pub fn from_images(images: [PairImage; 4]) -> Self {
        let mut sign_flip = [false; 16];
        for pattern in 1usize..16 {
            let x_a = pattern & 0b0001 != 0;
            let z_a = pattern & 0b0010 != 0;
            let x_b = pattern & 0b0100 != 0;
            let z_b = pattern & 0b1000 != 0;

            // The canonical input I/X/Y/Z ⊗ I/X/Y/Z equals
            // i^(#Y) · X_a^{x_a} Z_a^{z_a} X_b^{x_b} Z_b^{z_b}; conjugate
            // factor by factor, accumulating the log-i exponent.
            let mut exponent = u8::from(x_a && z_a) + u8::from(x_b && z_b);
            let mut product = PauliString::identity(2);
            for (included, image) in [x_a, z_a, x_b, z_b].into_iter().zip(images) {
                if included {
                    exponent = (exponent + product.mul_assign_right_with_log_i(&image.to_string_form().as_ref())) % 4;
                }
            }
            assert!(exponent % 2 == 0, "two-qubit action is not Clifford");
            sign_flip[pattern] = exponent == 2;
        }
        TwoQubitAction { images, sign_flip }
    }
}

/// Conjugation action of a catalogue unitary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnitaryAction {
    Single(SingleQubitAction),
    Pair(TwoQubitAction),
}

#[cfg(test)]
mod tests {
    use super::*;
    use PauliKind::{I, X, Y, Z};

    #[test]
    fn hadamard_flips_y() {
        let action = SingleQubitAction::from_images(PauliImage::new(Z, false), PauliImage::new(X, false));
        assert!(!action.sign_flip[X as usize]);
        assert!(!action.sign_flip[Z as usize]);
        assert!(action.sign_flip[Y as usize], "H Y H = -Y");
    }

    #[test]
    fn sqrt_z_sends_y_to_minus_x() {
        // S: X→Y, Z→Z, so S Y S† = S (iXZ) S† = i·Y·Z = -X.
        let action = SingleQubitAction::from_images(PauliImage::new(Y, false), PauliImage::new(Z, false));
        assert!(action.sign_flip[Y as usize]);
    }

    #[test]
    fn pauli_x_action_negates_z_and_y() {
        let action = SingleQubitAction::from_images(PauliImage::new(X, false), PauliImage::new(Z, true));
        assert!(!action.sign_flip[X as usize]);
        assert!(action.sign_flip[Z as usize]);
        assert!(action.sign_flip[Y as usize]);
    }

    #[test]
    fn cx_sign_table_on_y_pairs() {
        let action = TwoQubitAction::from_images([
            PairImage::new(X, X, false),
            PairImage::new(Z, I, false),
            PairImage::new(I, X, false),
            PairImage::new(Z, Z, false),
        ]);
        // CX (Y⊗Y) CX† = (XZ⊗X)(iXZ... ) = -(X⊗Z); verified against the
        // matrix identity CX·(Y⊗Y)·CX = -X⊗Z.
        let pattern = 0b0001 | 0b0010 | 0b0100 | 0b1000;
        assert!(action.sign_flip[pattern]);
        // CX (X⊗I) CX = X⊗X stays positive.
        assert!(!action.sign_flip[0b0001]);
    }
}
