//! Pauli and Clifford algebra over bit-packed planes.
//!
//! A Pauli product on `n` qubits is stored as two `n`-bit planes (X and Z
//! components) plus a sign; a Clifford is stored as the images of the `2n`
//! generators, laid out qubit-major so that gate conjugation is a handful of
//! word-parallel plane operations regardless of `n`.
//!
//! Built on [`bitplane`] for storage.

pub mod actions;
pub mod kind;
pub mod pauli;
pub mod tableau;

pub use actions::{PairImage, PauliImage, SingleQubitAction, TwoQubitAction, UnitaryAction};
pub use kind::PauliKind;
pub use pauli::{PauliParseError, PauliString, PauliStringRef};
pub use tableau::Tableau;
