use std::fmt;
use std::str::FromStr;

use bitplane::{BitVec, BitView, Bits, BitsMut};
use rand::Rng;
use sorted_iter::SortedIterator;
use thiserror::Error;

use crate::kind::PauliKind;

/// Owned, bit-packed Pauli product with a real sign.
///
/// The X and Z planes each hold one bit per qubit; `sign` is true for a −1
/// phase. Imaginary phases are never stored: they arise transiently during
/// multiplication and are folded into the sign through the log-i bookkeeping
/// of [`PauliString::mul_assign_right_with_log_i`].
///
/// Arithmetic takes [`PauliStringRef`] arguments so that callers holding
/// borrowed plane data never need to copy; conversions between the owned and
/// borrowed forms are explicit ([`PauliString::as_ref`],
/// [`PauliStringRef::to_owned`]).
#[derive(Clone, Eq, Hash, PartialEq)]
#[must_use]
pub struct PauliString {
    num_qubits: usize,
    sign: bool,
    xs: BitVec,
    zs: BitVec,
}

/// Borrowed view of a Pauli product: length, sign, and two bit spans.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub struct PauliStringRef<'life> {
    pub num_qubits: usize,
    pub sign: bool,
    pub xs: BitView<'life>,
    pub zs: BitView<'life>,
}

impl PauliString {
    /// The identity product on `num_qubits` qubits.
    pub fn identity(num_qubits: usize) -> Self {
        PauliString {
            num_qubits,
            sign: false,
            xs: BitVec::zeros(num_qubits),
            zs: BitVec::zeros(num_qubits),
        }
    }

    /// Uniformly random planes and sign.
    pub fn random<R: Rng + ?Sized>(num_qubits: usize, rng: &mut R) -> Self {
        let mut result = PauliString::identity(num_qubits);
        result.xs.randomize(rng);
        result.zs.randomize(rng);
        result.sign = rng.gen();
        result
    }

    /// A single-qubit `kind` embedded at `qubit` in an `num_qubits`-qubit
    /// identity.
    pub fn single(kind: PauliKind, qubit: usize, num_qubits: usize) -> Self {
        let mut result = PauliString::identity(num_qubits);
        result.set_kind(qubit, kind);
        result
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[must_use]
    pub fn sign(&self) -> bool {
        self.sign
    }

    pub fn set_sign(&mut self, sign: bool) {
        self.sign = sign;
    }

    #[must_use]
    pub fn xs(&self) -> &BitVec {
        &self.xs
    }

    #[must_use]
    pub fn zs(&self) -> &BitVec {
        &self.zs
    }

    /// # Panics
    ///
    /// Panics if `qubit` is out of range.
    #[must_use]
    pub fn kind_at(&self, qubit: usize) -> PauliKind {
        PauliKind::from_xz(self.xs.index(qubit), self.zs.index(qubit))
    }

    /// # Panics
    ///
    /// Panics if `qubit` is out of range.
    pub fn set_kind(&mut self, qubit: usize, kind: PauliKind) {
        self.xs.assign_index(qubit, kind.x_bit());
        self.zs.assign_index(qubit, kind.z_bit());
    }

    pub fn as_ref(&self) -> PauliStringRef<'_> {
        PauliStringRef {
            num_qubits: self.num_qubits,
            sign: self.sign,
            xs: self.xs.as_view(),
            zs: self.zs.as_view(),
        }
    }

    /// Qubits with a non-identity component, in increasing order.
    pub fn support(&self) -> impl SortedIterator<Item = usize> + '_ {
        self.xs.support().union(self.zs.support())
    }

    #[must_use]
    pub fn weight(&self) -> usize {
        self.support().count()
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.xs.is_zero() && self.zs.is_zero() && !self.sign
    }

    /// Whether this product commutes with `rhs`: the symplectic inner
    /// product of the planes is zero.
    #[must_use]
    pub fn commutes(&self, rhs: &PauliStringRef<'_>) -> bool {
        !(self.xs.dot(&rhs.zs) ^ self.zs.dot(&rhs.xs))
    }

    /// Right-multiply by `rhs` in place and return the accumulated log-i
    /// phase exponent (0..4, with `rhs.sign` contributing 2).
    ///
    /// The planes become the plane-XOR of the operands; `self.sign` is left
    /// untouched so that chained updates can accumulate exponents and fold
    /// them once. A chain that represents a Hermitian product must net to an
    /// even exponent; [`PauliString::mul_assign_right`] asserts that.
    ///
    /// # Panics
    ///
    /// Panics if the operands have different lengths.
    pub fn mul_assign_right_with_log_i(&mut self, rhs: &PauliStringRef<'_>) -> u8 {
        assert_eq!(self.num_qubits, rhs.num_qubits, "Pauli strings have different lengths");
        let mut forward_count: u64 = 0;
        let mut backward_count: u64 = 0;
        {
            let rhs_x_words = rhs.xs.words();
            let rhs_z_words = rhs.zs.words();
            let x_words = self.xs.words_mut();
            for (index, x_word) in x_words.iter_mut().enumerate() {
                let x1 = *x_word;
                let x2 = rhs_x_words[index];
                let z2 = rhs_z_words[index];
                // Defer the z-plane update; read z1 from the old plane.
                let z1 = self.zs.words()[index];
                let anticommuting = (x1 & z2) ^ (z1 & x2);
                // Pairs advancing the X→Y→Z→X cycle contribute +i, the rest
                // of the anticommuting pairs contribute −i.
                let forward = (x1 & z1 & !x2 & z2) | (x1 & !z1 & x2 & z2) | (!x1 & z1 & x2 & !z2);
                forward_count += u64::from((anticommuting & forward).count_ones());
                backward_count += u64::from((anticommuting & !forward).count_ones());
                *x_word = x1 ^ x2;
            }
        }
        self.zs.xor_assign(&rhs.zs);
        let mut log_i = (forward_count + 3 * backward_count) % 4;
        if rhs.sign {
            log_i = (log_i + 2) % 4;
        }
        log_i as u8
    }

    /// Right-multiply by `rhs`, folding the phase into the sign.
    ///
    /// # Panics
    ///
    /// Debug-asserts that the accumulated log-i exponent is even, i.e. that
    /// the product is Hermitian-real.
    pub fn mul_assign_right(&mut self, rhs: &PauliStringRef<'_>) {
        let log_i = self.mul_assign_right_with_log_i(rhs);
        debug_assert!(log_i % 2 == 0, "Pauli product has imaginary phase i^{log_i}");
        self.sign ^= (log_i >> 1) & 1 != 0;
    }
}

impl PauliStringRef<'_> {
    pub fn to_owned(&self) -> PauliString {
        let mut result = PauliString::identity(self.num_qubits);
        result.sign = self.sign;
        result.xs.words_mut().copy_from_slice(self.xs.words());
        result.zs.words_mut().copy_from_slice(self.zs.words());
        result
    }

    /// # Panics
    ///
    /// Panics if `qubit` is out of range.
    #[must_use]
    pub fn kind_at(&self, qubit: usize) -> PauliKind {
        PauliKind::from_xz(self.xs.index(qubit), self.zs.index(qubit))
    }

    #[must_use]
    pub fn commutes(&self, rhs: &PauliStringRef<'_>) -> bool {
        !(self.xs.dot(&rhs.zs) ^ self.zs.dot(&rhs.xs))
    }
}

/// Failure to parse a Pauli string literal.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PauliParseError {
    #[error("character {symbol:?} at position {position} is not a Pauli")]
    UnexpectedCharacter { symbol: char, position: usize },
    #[error("empty Pauli string")]
    Empty,
}

impl FromStr for PauliString {
    type Err = PauliParseError;

    /// Parses `"XIZY"` style literals with an optional `+`/`-` prefix;
    /// `_` is accepted as an alias for `I`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (sign, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        if body.is_empty() {
            return Err(PauliParseError::Empty);
        }
        let mut result = PauliString::identity(body.chars().count());
        result.sign = sign;
        for (position, symbol) in body.chars().enumerate() {
            let kind = PauliKind::from_char(symbol)
                .ok_or(PauliParseError::UnexpectedCharacter { symbol, position })?;
            result.set_kind(position, kind);
        }
        Ok(result)
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", if self.sign { '-' } else { '+' })?;
        for qubit in 0..self.num_qubits {
            write!(formatter, "{}", self.kind_at(qubit).to_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for PauliString {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, formatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pauli(text: &str) -> PauliString {
        text.parse().unwrap()
    }

    #[test]
    fn parse_display_roundtrip() {
        for text in ["+XIZY", "-IIII", "+X", "-YZ"] {
            assert_eq!(pauli(text).to_string(), text);
        }
        assert_eq!(pauli("XYZ").to_string(), "+XYZ");
        assert_eq!(pauli("_X_").to_string(), "+IXI");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            "XQ".parse::<PauliString>(),
            Err(PauliParseError::UnexpectedCharacter { symbol: 'Q', position: 1 })
        );
        assert_eq!("".parse::<PauliString>(), Err(PauliParseError::Empty));
        assert_eq!("-".parse::<PauliString>(), Err(PauliParseError::Empty));
    }

    #[test]
    fn single_qubit_products() {
        // X·Y = iZ, Y·X = −iZ, and cyclic relatives.
        let cases = [
            ("X", "Y", "Z", 1),
            ("Y", "Z", "X", 1),
            ("Z", "X", "Y", 1),
            ("Y", "X", "Z", 3),
            ("Z", "Y", "X", 3),
            ("X", "Z", "Y", 3),
            ("X", "X", "I", 0),
            ("Y", "Y", "I", 0),
            ("Z", "Z", "I", 0),
            ("I", "Y", "Y", 0),
        ];
        for (left, right, expected, exponent) in cases {
            let mut product = pauli(left);
            let log_i = product.mul_assign_right_with_log_i(&pauli(right).as_ref());
            assert_eq!(log_i, exponent, "{left}*{right}");
            assert_eq!(product.to_string(), format!("+{expected}"), "{left}*{right}");
        }
    }

    #[test]
    fn negative_rhs_contributes_two() {
        let mut product = pauli("X");
        let log_i = product.mul_assign_right_with_log_i(&pauli("-X").as_ref());
        assert_eq!(log_i, 2);
    }

    #[test]
    fn mul_assign_right_folds_sign() {
        let mut product = pauli("XY");
        product.mul_assign_right(&pauli("YX").as_ref());
        // XY·YX = (X·Y)⊗(Y·X) = (iZ)⊗(−iZ) = ZZ.
        assert_eq!(product.to_string(), "+ZZ");

        let mut product = pauli("XX");
        product.mul_assign_right(&pauli("YY").as_ref());
        // XX·YY = (iZ)(iZ) = −ZZ.
        assert_eq!(product.to_string(), "-ZZ");
    }

    #[test]
    fn commutation_matches_overlap_parity() {
        assert!(!pauli("X").commutes(&pauli("Z").as_ref()));
        assert!(pauli("XX").commutes(&pauli("ZZ").as_ref()));
        assert!(pauli("XIZ").commutes(&pauli("IYI").as_ref()));
        assert!(!pauli("XYZ").commutes(&pauli("ZYZ").as_ref()));
    }

    #[test]
    fn support_and_weight() {
        let product = pauli("IXIYZ");
        assert_eq!(product.support().collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(product.weight(), 3);
    }
}
