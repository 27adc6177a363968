//! The closed gate catalogue.
//!
//! Gates are identified by [`GateId`] (a dense `u8`), described by an
//! immutable [`Gate`] record, and looked up by name through a perfect hash:
//! names are case-insensitive and ignore underscores, the hash seed is
//! searched at build time until no two catalogue names share a slot, and a
//! lookup confirms its candidate with a normalized exact compare.
//!
//! The catalogue is process-wide: built once on first use, never torn down,
//! and safely shared between simulator instances.

use std::ops::BitOr;

use derive_more::TryFrom;
use once_cell::sync::Lazy;
use paulibit::PauliKind::{I, X, Y, Z};
use paulibit::{PairImage, PauliImage, SingleQubitAction, TwoQubitAction, UnitaryAction};

/// Dense gate identifier; the catalogue is indexed by it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, TryFrom)]
#[try_from(repr)]
#[repr(u8)]
pub enum GateId {
    Identity = 0,
    PauliX,
    PauliY,
    PauliZ,
    H,
    HXY,
    HYZ,
    S,
    SDag,
    SqrtX,
    SqrtXDag,
    SqrtY,
    SqrtYDag,
    CXyz,
    CZyx,
    CX,
    CY,
    CZ,
    Swap,
    M,
    MX,
    MY,
    MR,
    MRX,
    MRY,
    R,
    RX,
    RY,
    XError,
    YError,
    ZError,
    Depolarize1,
    Depolarize2,
    PauliChannel1,
    PauliChannel2,
    CorrelatedError,
    ElseCorrelatedError,
    Detector,
    ObservableInclude,
    Tick,
    Repeat,
}

pub const GATE_COUNT: usize = GateId::Repeat as usize + 1;

/// Behavioral flags of a gate; validation and dispatch key off these.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct GateFlags(u16);

impl GateFlags {
    pub const NONE: GateFlags = GateFlags(0);
    /// Unitary Clifford; has a conjugation action.
    pub const UNITARY: GateFlags = GateFlags(1 << 0);
    /// Operates on target pairs.
    pub const TWO_QUBIT: GateFlags = GateFlags(1 << 1);
    pub const RESET: GateFlags = GateFlags(1 << 2);
    pub const MEASUREMENT: GateFlags = GateFlags(1 << 3);
    /// Appends rows to the measurement record.
    pub const PRODUCES_RESULTS: GateFlags = GateFlags(1 << 4);
    pub const NOISE: GateFlags = GateFlags(1 << 5);
    /// Targets are Pauli-prefixed qubits (correlated-error components).
    pub const TAKES_PAULI_TARGETS: GateFlags = GateFlags(1 << 6);
    /// Accepts `rec[-k]` / `sweep[k]` targets.
    pub const TAKES_RECORD_TARGETS: GateFlags = GateFlags(1 << 7);
    pub const TAKES_PARENS_ARG: GateFlags = GateFlags(1 << 8);
    /// Every parens argument must lie in [0, 1].
    pub const ARG_IS_PROBABILITY: GateFlags = GateFlags(1 << 9);
    /// No quantum action; detectors, observables, ticks.
    pub const ANNOTATION: GateFlags = GateFlags(1 << 10);
    /// Block-structured control flow rather than an instruction.
    pub const BLOCK: GateFlags = GateFlags(1 << 11);

    #[must_use]
    pub fn contains(self, other: GateFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for GateFlags {
    type Output = GateFlags;
    fn bitor(self, rhs: GateFlags) -> GateFlags {
        GateFlags(self.0 | rhs.0)
    }
}

/// Parens-argument arity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArgCount {
    Exactly(u8),
    Any,
}

/// Immutable description of one catalogue gate.
#[derive(Clone, Debug)]
pub struct Gate {
    pub id: GateId,
    /// Canonical uppercase name.
    pub name: &'static str,
    /// Alternative names accepted by lookup.
    pub aliases: &'static [&'static str],
    pub flags: GateFlags,
    pub arg_count: ArgCount,
    /// Conjugation action for unitary gates.
    pub unitary: Option<UnitaryAction>,
    /// Inverse gate; present for every unitary gate.
    pub inverse: Option<GateId>,
}

impl Gate {
    #[must_use]
    pub fn is_unitary(&self) -> bool {
        self.flags.contains(GateFlags::UNITARY)
    }

    #[must_use]
    pub fn is_two_qubit(&self) -> bool {
        self.flags.contains(GateFlags::TWO_QUBIT)
    }

    #[must_use]
    pub fn produces_results(&self) -> bool {
        self.flags.contains(GateFlags::PRODUCES_RESULTS)
    }
}

const HASH_TABLE_SIZE: usize = 2048;

/// Name-indexed registry of every supported gate.
pub struct GateCatalogue {
    gates: Vec<Gate>,
    hash_seed: u64,
    hash_table: Vec<Option<(&'static str, GateId)>>,
}

/// The process-wide catalogue; built on first access.
pub static GATE_CATALOGUE: Lazy<GateCatalogue> = Lazy::new(GateCatalogue::build);

impl GateCatalogue {
    /// # Panics
    ///
    /// Panics if `name` is not in the catalogue.
    #[must_use]
    pub fn at(&self, name: &str) -> &Gate {
        self.try_at(name)
            .unwrap_or_else(|| panic!("unknown gate name {name:?}"))
    }

    #[must_use]
    pub fn try_at(&self, name: &str) -> Option<&Gate> {
        self.name_to_id(name.as_bytes()).map(|id| self.gate(id))
    }

    /// Case-insensitive, underscore-ignoring name lookup.
    #[must_use]
    pub fn name_to_id(&self, name: &[u8]) -> Option<GateId> {
        let slot = gate_name_hash(self.hash_seed, name) as usize % HASH_TABLE_SIZE;
        let (stored_name, id) = self.hash_table[slot]?;
        normalized_name_eq(stored_name.as_bytes(), name).then_some(id)
    }

    #[must_use]
    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id as usize]
    }

    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.iter()
    }

    fn build() -> GateCatalogue {
        let gates = gate_records();
        for (index, gate) in gates.iter().enumerate() {
            assert_eq!(gate.id as usize, index, "catalogue order must match ids");
        }

        // Search for a seed that makes the truncated hash collision-free
        // over the closed catalogue (canonical names and aliases).
        let mut names: Vec<(&'static str, GateId)> = Vec::new();
        for gate in &gates {
            names.push((gate.name, gate.id));
            for &alias in gate.aliases {
                names.push((alias, gate.id));
            }
        }
        let (hash_seed, hash_table) = (0u64..)
            .find_map(|seed| {
                let mut table: Vec<Option<(&'static str, GateId)>> = vec![None; HASH_TABLE_SIZE];
                for &(name, id) in &names {
                    let slot = gate_name_hash(seed, name.as_bytes()) as usize % HASH_TABLE_SIZE;
                    if table[slot].is_some() {
                        return None;
                    }
                    table[slot] = Some((name, id));
                }
                Some((seed, table))
            })
            .expect("some seed yields a collision-free table");

        GateCatalogue {
            gates,
            hash_seed,
            hash_table,
        }
    }
}

/// Multiplicative byte hash over the normalized name: uppercase with
/// underscores stripped.
fn gate_name_hash(seed: u64, name: &[u8]) -> u64 {
    let mut hash = seed ^ 0xcbf2_9ce4_8422_2325;
    for &byte in name {
        if byte == b'_' {
            continue;
        }
        hash = (hash ^ u64::from(byte.to_ascii_uppercase())).wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn normalized_name_eq(left: &[u8], right: &[u8]) -> bool {
    let mut left_iter = left.iter().filter(|&&byte| byte != b'_');
    let mut right_iter = right.iter().filter(|&&byte| byte != b'_');
    loop {
        match (left_iter.next(), right_iter.next()) {
            (None, None) => return true,
            (Some(&l), Some(&r)) => {
                if l.to_ascii_uppercase() != r.to_ascii_uppercase() {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

fn unitary_single(
    id: GateId,
    name: &'static str,
    aliases: &'static [&'static str],
    inverse: GateId,
    x_image: PauliImage,
    z_image: PauliImage,
) -> Gate {
    Gate {
        id,
        name,
        aliases,
        flags: GateFlags::UNITARY,
        arg_count: ArgCount::Exactly(0),
        unitary: Some(UnitaryAction::Single(SingleQubitAction::from_images(x_image, z_image))),
        inverse: Some(inverse),
    }
}

fn unitary_pair(
    id: GateId,
    name: &'static str,
    aliases: &'static [&'static str],
    inverse: GateId,
    images: [PairImage; 4],
    extra_flags: GateFlags,
) -> Gate {
    Gate {
        id,
        name,
        aliases,
        flags: GateFlags::UNITARY | GateFlags::TWO_QUBIT | extra_flags,
        arg_count: ArgCount::Exactly(0),
        unitary: Some(UnitaryAction::Pair(TwoQubitAction::from_images(images))),
        inverse: Some(inverse),
    }
}

fn plain(id: GateId, name: &'static str, aliases: &'static [&'static str], flags: GateFlags, arg_count: ArgCount) -> Gate {
    Gate {
        id,
        name,
        aliases,
        flags,
        arg_count,
        unitary: None,
        inverse: None,
    }
}

#[allow(clippy::too_many_lines)]
fn gate_records() -> Vec<Gate> {
    use GateId::*;

    let image = PauliImage::new;
    let pair = PairImage::new;
    let measurement = GateFlags::MEASUREMENT | GateFlags::PRODUCES_RESULTS;
    let noise = GateFlags::NOISE | GateFlags::TAKES_PARENS_ARG | GateFlags::ARG_IS_PROBABILITY;

    vec![
        unitary_single(Identity, "I", &[], Identity, image(X, false), image(Z, false)),
        unitary_single(PauliX, "X", &[], PauliX, image(X, false), image(Z, true)),
        unitary_single(PauliY, "Y", &[], PauliY, image(X, true), image(Z, true)),
        unitary_single(PauliZ, "Z", &[], PauliZ, image(X, true), image(Z, false)),
        unitary_single(H, "H", &["H_XZ"], H, image(Z, false), image(X, false)),
        unitary_single(HXY, "H_XY", &[], HXY, image(Y, false), image(Z, true)),
        unitary_single(HYZ, "H_YZ", &[], HYZ, image(X, true), image(Y, false)),
        unitary_single(S, "S", &["SQRT_Z"], SDag, image(Y, false), image(Z, false)),
        unitary_single(SDag, "S_DAG", &["SQRT_Z_DAG"], S, image(Y, true), image(Z, false)),
        unitary_single(SqrtX, "SQRT_X", &[], SqrtXDag, image(X, false), image(Y, true)),
        unitary_single(SqrtXDag, "SQRT_X_DAG", &[], SqrtX, image(X, false), image(Y, false)),
        unitary_single(SqrtY, "SQRT_Y", &[], SqrtYDag, image(Z, true), image(X, false)),
        unitary_single(SqrtYDag, "SQRT_Y_DAG", &[], SqrtY, image(Z, false), image(X, true)),
        unitary_single(CXyz, "C_XYZ", &[], CZyx, image(Y, false), image(X, false)),
        unitary_single(CZyx, "C_ZYX", &[], CXyz, image(Z, false), image(Y, false)),
        unitary_pair(
            CX,
            "CX",
            &["CNOT", "ZCX"],
            CX,
            [
                pair(X, X, false),
                pair(Z, I, false),
                pair(I, X, false),
                pair(Z, Z, false),
            ],
            GateFlags::TAKES_RECORD_TARGETS,
        ),
        unitary_pair(
            CY,
            "CY",
            &["ZCY"],
            CY,
            [
                pair(X, Y, false),
                pair(Z, I, false),
                pair(Z, X, false),
                pair(Z, Z, false),
            ],
            GateFlags::TAKES_RECORD_TARGETS,
        ),
        unitary_pair(
            CZ,
            "CZ",
            &["ZCZ"],
            CZ,
            [
                pair(X, Z, false),
                pair(Z, I, false),
                pair(Z, X, false),
                pair(I, Z, false),
            ],
            GateFlags::TAKES_RECORD_TARGETS,
        ),
        unitary_pair(
            Swap,
            "SWAP",
            &[],
            Swap,
            [
                pair(I, X, false),
                pair(I, Z, false),
                pair(X, I, false),
                pair(Z, I, false),
            ],
            GateFlags::NONE,
        ),
        plain(M, "M", &["MZ"], measurement, ArgCount::Exactly(0)),
        plain(MX, "MX", &[], measurement, ArgCount::Exactly(0)),
        plain(MY, "MY", &[], measurement, ArgCount::Exactly(0)),
        plain(MR, "MR", &["MRZ"], measurement | GateFlags::RESET, ArgCount::Exactly(0)),
        plain(MRX, "MRX", &[], measurement | GateFlags::RESET, ArgCount::Exactly(0)),
        plain(MRY, "MRY", &[], measurement | GateFlags::RESET, ArgCount::Exactly(0)),
        plain(R, "R", &["RZ"], GateFlags::RESET, ArgCount::Exactly(0)),
        plain(RX, "RX", &[], GateFlags::RESET, ArgCount::Exactly(0)),
        plain(RY, "RY", &[], GateFlags::RESET, ArgCount::Exactly(0)),
        plain(XError, "X_ERROR", &[], noise, ArgCount::Exactly(1)),
        plain(YError, "Y_ERROR", &[], noise, ArgCount::Exactly(1)),
        plain(ZError, "Z_ERROR", &[], noise, ArgCount::Exactly(1)),
        plain(Depolarize1, "DEPOLARIZE1", &[], noise, ArgCount::Exactly(1)),
        plain(Depolarize2, "DEPOLARIZE2", &[], noise | GateFlags::TWO_QUBIT, ArgCount::Exactly(1)),
        plain(PauliChannel1, "PAULI_CHANNEL_1", &[], noise, ArgCount::Exactly(3)),
        plain(
            PauliChannel2,
            "PAULI_CHANNEL_2",
            &[],
            noise | GateFlags::TWO_QUBIT,
            ArgCount::Exactly(15),
        ),
        plain(
            CorrelatedError,
            "CORRELATED_ERROR",
            &["E"],
            noise | GateFlags::TAKES_PAULI_TARGETS,
            ArgCount::Exactly(1),
        ),
        plain(
            ElseCorrelatedError,
            "ELSE_CORRELATED_ERROR",
            &[],
            noise | GateFlags::TAKES_PAULI_TARGETS,
            ArgCount::Exactly(1),
        ),
        // Parens arguments on DETECTOR are coordinate annotations; any
        // number is accepted and sampling ignores them.
        plain(
            Detector,
            "DETECTOR",
            &[],
            GateFlags::ANNOTATION | GateFlags::TAKES_RECORD_TARGETS | GateFlags::TAKES_PARENS_ARG,
            ArgCount::Any,
        ),
        plain(
            ObservableInclude,
            "OBSERVABLE_INCLUDE",
            &[],
            GateFlags::ANNOTATION | GateFlags::TAKES_RECORD_TARGETS | GateFlags::TAKES_PARENS_ARG,
            ArgCount::Exactly(1),
        ),
        plain(Tick, "TICK", &[], GateFlags::ANNOTATION, ArgCount::Exactly(0)),
        plain(Repeat, "REPEAT", &[], GateFlags::BLOCK, ArgCount::Exactly(0)),
    ]
}
