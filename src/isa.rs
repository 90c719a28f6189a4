//! The 6800 instruction set model.
//!
//! This module holds the static description of the instruction set that the
//! parser, code generator, and executor all consult:
//! - [`Mnemonic`]: every executable mnemonic of the 6800.
//! - [`AddrMode`]: the six operand encodings.
//! - [`Descriptor`]: opcode, length, cycle count, and flag effects of one mnemonic/mode pair.
//! - [`PseudoOp`]: the assembler directives, which have no opcode.
//! - [`InstructionSet`]: the lookup tables, indexed both by mnemonic and by opcode byte.
//!
//! The tables are built once and never mutated. [`InstructionSet::m6800`] gives
//! access to the shared instance:
//!
//! ```
//! use m6800_ensemble::isa::{AddrMode, InstructionSet, Mnemonic};
//!
//! let isa = InstructionSet::m6800();
//! let ldaa = isa.descriptor(Mnemonic::LDAA, AddrMode::Immediate).unwrap();
//! assert_eq!(ldaa.opcode, 0x86);
//! assert_eq!(ldaa.len, 2);
//!
//! let entry = isa.decode(0x4A).unwrap();
//! assert_eq!(entry.mnemonic, Mnemonic::DECA);
//! assert_eq!(entry.mode, AddrMode::Implied);
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

/// The operand encoding of an instruction.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum AddrMode {
    /// No operand (e.g., `DECA`).
    Implied,
    /// Literal operand (e.g., `LDAA #$05`).
    Immediate,
    /// 8-bit address (e.g., `LDAA $10`).
    Direct,
    /// 16-bit address (e.g., `LDAA $1000`).
    Extended,
    /// Unsigned 8-bit offset from the index register (e.g., `LDAA 4,X`).
    Indexed,
    /// Signed 8-bit displacement from the next instruction (e.g., `BNE LOOP`).
    Relative,
}
impl AddrMode {
    /// The number of operand bytes following the opcode in this mode.
    ///
    /// `wide` indicates a 16-bit immediate (`LDX`, `LDS`, `CPX`).
    pub fn operand_len(self, wide: bool) -> u8 {
        match self {
            AddrMode::Implied   => 0,
            AddrMode::Immediate => if wide { 2 } else { 1 },
            AddrMode::Direct    => 1,
            AddrMode::Extended  => 2,
            AddrMode::Indexed   => 1,
            AddrMode::Relative  => 1,
        }
    }
}
impl std::fmt::Display for AddrMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddrMode::Implied   => f.write_str("implied"),
            AddrMode::Immediate => f.write_str("immediate"),
            AddrMode::Direct    => f.write_str("direct"),
            AddrMode::Extended  => f.write_str("extended"),
            AddrMode::Indexed   => f.write_str("indexed"),
            AddrMode::Relative  => f.write_str("relative"),
        }
    }
}

macro_rules! mnemonic_enum {
    ($($m:ident),+ $(,)?) => {
        /// An executable mnemonic of the 6800.
        ///
        /// Parsing is case-insensitive.
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
        #[allow(missing_docs, clippy::upper_case_acronyms)]
        pub enum Mnemonic {
            $($m),+
        }

        impl Mnemonic {
            /// Every mnemonic, in declaration order.
            pub const ALL: &'static [Mnemonic] = &[$(Self::$m),+];
        }

        impl std::str::FromStr for Mnemonic {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match &*s.to_uppercase() {
                    $(stringify!($m) => Ok(Self::$m)),+,
                    _ => Err(())
                }
            }
        }

        impl std::fmt::Display for Mnemonic {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$m => f.write_str(stringify!($m))),+
                }
            }
        }
    };
}
mnemonic_enum! {
    ABA, ADCA, ADCB, ADDA, ADDB, ANDA, ANDB, ASL, ASLA, ASLB, ASR, ASRA, ASRB,
    BCC, BCS, BEQ, BGE, BGT, BHI, BITA, BITB, BLE, BLS, BLT, BMI, BNE, BPL, BRA, BSR, BVC, BVS,
    CBA, CLC, CLI, CLR, CLRA, CLRB, CLV, CMPA, CMPB, COM, COMA, COMB, CPX,
    DAA, DEC, DECA, DECB, DES, DEX, EORA, EORB, INC, INCA, INCB, INS, INX, JMP, JSR,
    LDAA, LDAB, LDS, LDX, LSR, LSRA, LSRB, NEG, NEGA, NEGB, NOP, ORAA, ORAB,
    PSHA, PSHB, PULA, PULB, ROL, ROLA, ROLB, ROR, RORA, RORB, RTI, RTS,
    SBA, SBCA, SBCB, SEC, SEI, SEV, STAA, STAB, STS, STX, SUBA, SUBB, SWI,
    TAB, TAP, TBA, TPA, TST, TSTA, TSTB, TSX, TXS, WAI
}

impl Mnemonic {
    /// Whether the immediate form of this mnemonic takes a 16-bit operand.
    pub fn wide_immediate(self) -> bool {
        matches!(self, Mnemonic::LDX | Mnemonic::LDS | Mnemonic::CPX)
    }

    /// Flags this mnemonic affects, and which of those it forces clear or set.
    fn flag_effects(self) -> (FlagSet, FlagSet, FlagSet) {
        use Mnemonic::*;

        let (affects, clears, sets) = match self {
            ABA | ADCA | ADCB | ADDA | ADDB => ("HNZVC", "", ""),
            DAA => ("NZVC", "", ""),
            SBA | CBA | SUBA | SUBB | SBCA | SBCB | CMPA | CMPB => ("NZVC", "", ""),
            NEG | NEGA | NEGB => ("NZVC", "", ""),
            ASL | ASLA | ASLB | ASR | ASRA | ASRB | ROL | ROLA | ROLB | ROR | RORA | RORB => ("NZVC", "", ""),
            LSR | LSRA | LSRB => ("NZVC", "N", ""),
            ANDA | ANDB | BITA | BITB | EORA | EORB | ORAA | ORAB => ("NZV", "V", ""),
            LDAA | LDAB | STAA | STAB | TAB | TBA => ("NZV", "V", ""),
            LDX | LDS | STX | STS => ("NZV", "V", ""),
            CPX => ("NZV", "", ""),
            INC | INCA | INCB | DEC | DECA | DECB => ("NZV", "", ""),
            CLR | CLRA | CLRB => ("NZVC", "NVC", "Z"),
            COM | COMA | COMB => ("NZVC", "V", "C"),
            TST | TSTA | TSTB => ("NZVC", "VC", ""),
            INX | DEX => ("Z", "", ""),
            CLC => ("C", "C", ""),
            SEC => ("C", "", "C"),
            CLV => ("V", "V", ""),
            SEV => ("V", "", "V"),
            CLI => ("I", "I", ""),
            SEI | SWI => ("I", "", "I"),
            TAP | RTI => ("HINZVC", "", ""),
            BCC | BCS | BEQ | BGE | BGT | BHI | BLE | BLS | BLT | BMI | BNE | BPL | BRA | BSR | BVC | BVS
            | DES | INS | JMP | JSR | NOP | PSHA | PSHB | PULA | PULB | RTS | TPA | TSX | TXS | WAI => ("", "", ""),
        };

        (FlagSet::parse(affects), FlagSet::parse(clears), FlagSet::parse(sets))
    }
}

/// A set of condition flags (`H`, `I`, `N`, `Z`, `V`, `C`).
///
/// The bit layout matches the condition code register.
#[derive(Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct FlagSet(u8);
impl FlagSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);
    /// Half-carry.
    pub const H: Self = Self(1 << 5);
    /// Interrupt mask.
    pub const I: Self = Self(1 << 4);
    /// Negative.
    pub const N: Self = Self(1 << 3);
    /// Zero.
    pub const Z: Self = Self(1 << 2);
    /// Overflow.
    pub const V: Self = Self(1 << 1);
    /// Carry.
    pub const C: Self = Self(1 << 0);

    const LETTERS: [(char, FlagSet); 6] = [
        ('H', Self::H), ('I', Self::I), ('N', Self::N),
        ('Z', Self::Z), ('V', Self::V), ('C', Self::C)
    ];

    /// Builds a set from flag letters (e.g., `"NZV"`). Unknown letters are ignored.
    pub fn parse(letters: &str) -> Self {
        Self::LETTERS.iter()
            .filter(|(l, _)| letters.contains(*l))
            .fold(Self::EMPTY, |acc, &(_, f)| acc | f)
    }
    /// True if every flag of `other` is in this set.
    pub fn contains(&self, other: FlagSet) -> bool {
        self.0 & other.0 == other.0
    }
    /// True if no flags are in this set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
    /// The raw bits of this set.
    pub fn bits(&self) -> u8 {
        self.0
    }
}
impl std::ops::BitOr for FlagSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}
impl std::ops::BitOrAssign for FlagSet {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}
impl std::fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Write;

        f.write_str("FlagSet(")?;
        for (l, flag) in Self::LETTERS {
            f.write_char(if self.contains(flag) { l } else { '-' })?;
        }
        f.write_char(')')
    }
}

/// The static properties of one mnemonic in one addressing mode.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Descriptor {
    /// The opcode byte.
    pub opcode: u8,
    /// Total instruction length in bytes (opcode included).
    pub len: u8,
    /// Machine cycles taken by the instruction.
    pub cycles: u8,
    /// Flags the instruction may change.
    pub affects: FlagSet,
    /// Flags the instruction always clears.
    pub clears: FlagSet,
    /// Flags the instruction always sets.
    pub sets: FlagSet,
}

/// One entry of the reverse (opcode-indexed) table.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct OpcodeEntry {
    /// The mnemonic this opcode encodes.
    pub mnemonic: Mnemonic,
    /// The addressing mode this opcode encodes.
    pub mode: AddrMode,
    /// The descriptor of this mnemonic/mode pair.
    pub desc: Descriptor,
}

/// How many values a pseudo-op accepts.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Arity {
    /// No operands.
    None,
    /// Exactly one operand.
    One,
    /// One or more comma-separated operands.
    OneOrMore,
}

/// An assembler directive.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum PseudoOp {
    /// `ORG`: sets the location counter.
    Org,
    /// `EQU`: defines the statement's label as a constant.
    Equ,
    /// `FCB`: emits one byte per value.
    Fcb,
    /// `FDB`: emits one big-endian word per value.
    Fdb,
    /// `RMB`: reserves bytes without emitting them.
    Rmb,
    /// `END`: stops assembly.
    End,
}
impl PseudoOp {
    /// Every pseudo-op.
    pub const ALL: [PseudoOp; 6] = [Self::Org, Self::Equ, Self::Fcb, Self::Fdb, Self::Rmb, Self::End];

    /// How many operands this pseudo-op requires.
    pub fn arity(self) -> Arity {
        match self {
            PseudoOp::Org | PseudoOp::Equ | PseudoOp::Rmb => Arity::One,
            PseudoOp::Fcb | PseudoOp::Fdb => Arity::OneOrMore,
            PseudoOp::End => Arity::None,
        }
    }
    /// A short description, as shown in help text.
    pub fn description(self) -> &'static str {
        match self {
            PseudoOp::Org => "set origin",
            PseudoOp::Equ => "equate symbol to value",
            PseudoOp::Fcb => "form constant byte(s)",
            PseudoOp::Fdb => "form double byte(s)",
            PseudoOp::Rmb => "reserve memory bytes",
            PseudoOp::End => "end of program",
        }
    }
}
impl std::str::FromStr for PseudoOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_uppercase() {
            "ORG" => Ok(Self::Org),
            "EQU" => Ok(Self::Equ),
            "FCB" => Ok(Self::Fcb),
            "FDB" => Ok(Self::Fdb),
            "RMB" => Ok(Self::Rmb),
            "END" => Ok(Self::End),
            _ => Err(())
        }
    }
}
impl std::fmt::Display for PseudoOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PseudoOp::Org => f.write_str("ORG"),
            PseudoOp::Equ => f.write_str("EQU"),
            PseudoOp::Fcb => f.write_str("FCB"),
            PseudoOp::Fdb => f.write_str("FDB"),
            PseudoOp::Rmb => f.write_str("RMB"),
            PseudoOp::End => f.write_str("END"),
        }
    }
}

/// Errors raised while building an [`InstructionSet`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IsaErr {
    /// Two mnemonic/mode pairs were given the same opcode.
    OpcodeCollision {
        /// The shared opcode.
        opcode: u8,
        /// The pair that claimed the opcode first.
        first: (Mnemonic, AddrMode),
        /// The pair that claimed it second.
        second: (Mnemonic, AddrMode),
    },
    /// A mnemonic was given the same addressing mode twice.
    DuplicateMode(Mnemonic, AddrMode),
}
impl std::fmt::Display for IsaErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsaErr::OpcodeCollision { opcode, first: (m1, a1), second: (m2, a2) } => {
                write!(f, "opcode ${opcode:02X} is claimed by both {m1} ({a1}) and {m2} ({a2})")
            },
            IsaErr::DuplicateMode(m, a) => write!(f, "{m} lists {a} mode more than once"),
        }
    }
}
impl std::error::Error for IsaErr {}
impl crate::err::Error for IsaErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        Some("every opcode byte must decode to exactly one instruction".into())
    }
}

/// A row of the opcode table: mnemonic, mode, opcode, cycles.
pub type OpcodeRow = (Mnemonic, AddrMode, u8, u8);

/// The lookup tables of the instruction set.
///
/// This is constructed once (see [`InstructionSet::m6800`]) and only read afterwards.
#[derive(Debug)]
pub struct InstructionSet {
    by_mnemonic: HashMap<Mnemonic, Vec<(AddrMode, Descriptor)>>,
    by_opcode: [Option<OpcodeEntry>; 256],
}
impl InstructionSet {
    /// Builds the 6800 instruction set.
    ///
    /// Prefer [`InstructionSet::m6800`], which builds it once per process.
    pub fn new() -> Result<Self, IsaErr> {
        Self::from_rows(opcode_rows())
    }

    /// Builds an instruction set from opcode rows,
    /// failing if two rows share an opcode or a mnemonic repeats a mode.
    pub fn from_rows(rows: &[OpcodeRow]) -> Result<Self, IsaErr> {
        let mut by_mnemonic: HashMap<Mnemonic, Vec<(AddrMode, Descriptor)>> = HashMap::new();
        let mut by_opcode = [None; 256];

        for &(mnemonic, mode, opcode, cycles) in rows {
            let (affects, clears, sets) = mnemonic.flag_effects();
            let desc = Descriptor {
                opcode,
                len: 1 + mode.operand_len(mnemonic.wide_immediate()),
                cycles,
                affects,
                clears,
                sets,
            };

            let slot: &mut Option<OpcodeEntry> = &mut by_opcode[usize::from(opcode)];
            if let Some(prev) = slot {
                return Err(IsaErr::OpcodeCollision {
                    opcode,
                    first: (prev.mnemonic, prev.mode),
                    second: (mnemonic, mode)
                });
            }
            *slot = Some(OpcodeEntry { mnemonic, mode, desc });

            let modes = by_mnemonic.entry(mnemonic).or_default();
            if modes.iter().any(|&(m, _)| m == mode) {
                return Err(IsaErr::DuplicateMode(mnemonic, mode));
            }
            modes.push((mode, desc));
            modes.sort_by_key(|&(m, _)| m);
        }

        Ok(Self { by_mnemonic, by_opcode })
    }

    /// The shared 6800 instruction set.
    ///
    /// # Panics
    ///
    /// Panics on first use if the built-in opcode table is inconsistent.
    pub fn m6800() -> &'static InstructionSet {
        static ISA: OnceLock<InstructionSet> = OnceLock::new();

        ISA.get_or_init(|| {
            InstructionSet::new()
                .unwrap_or_else(|e| panic!("6800 opcode table is inconsistent: {e}"))
        })
    }

    /// All addressing modes (and their descriptors) supported by a mnemonic, in [`AddrMode`] order.
    pub fn modes(&self, mnemonic: Mnemonic) -> &[(AddrMode, Descriptor)] {
        self.by_mnemonic.get(&mnemonic).map_or(&[], Vec::as_slice)
    }
    /// Checks whether a mnemonic supports a given addressing mode.
    pub fn supports(&self, mnemonic: Mnemonic, mode: AddrMode) -> bool {
        self.descriptor(mnemonic, mode).is_some()
    }
    /// Gets the descriptor of a mnemonic in a given addressing mode.
    pub fn descriptor(&self, mnemonic: Mnemonic, mode: AddrMode) -> Option<&Descriptor> {
        self.modes(mnemonic).iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, d)| d)
    }
    /// Looks up an opcode byte.
    pub fn decode(&self, opcode: u8) -> Option<&OpcodeEntry> {
        self.by_opcode[usize::from(opcode)].as_ref()
    }
    /// Number of opcodes defined.
    pub fn opcode_count(&self) -> usize {
        self.by_opcode.iter().flatten().count()
    }

    /// Checks whether a word is a mnemonic or pseudo-op (case-insensitive).
    pub fn is_keyword(&self, word: &str) -> bool {
        word.parse::<Mnemonic>().is_ok_and(|m| self.by_mnemonic.contains_key(&m))
            || word.parse::<PseudoOp>().is_ok()
    }
}

/// The 6800 opcode map.
fn opcode_rows() -> &'static [OpcodeRow] {
    use AddrMode::*;
    use Mnemonic::*;

    const ROWS: &[OpcodeRow] = &[
        // inherent
        (NOP,  Implied, 0x01, 2), (TAP,  Implied, 0x06, 2), (TPA,  Implied, 0x07, 2),
        (INX,  Implied, 0x08, 4), (DEX,  Implied, 0x09, 4), (CLV,  Implied, 0x0A, 2),
        (SEV,  Implied, 0x0B, 2), (CLC,  Implied, 0x0C, 2), (SEC,  Implied, 0x0D, 2),
        (CLI,  Implied, 0x0E, 2), (SEI,  Implied, 0x0F, 2), (SBA,  Implied, 0x10, 2),
        (CBA,  Implied, 0x11, 2), (TAB,  Implied, 0x16, 2), (TBA,  Implied, 0x17, 2),
        (DAA,  Implied, 0x19, 2), (ABA,  Implied, 0x1B, 2),
        (TSX,  Implied, 0x30, 4), (INS,  Implied, 0x31, 4), (PULA, Implied, 0x32, 4),
        (PULB, Implied, 0x33, 4), (DES,  Implied, 0x34, 4), (TXS,  Implied, 0x35, 4),
        (PSHA, Implied, 0x36, 4), (PSHB, Implied, 0x37, 4), (RTS,  Implied, 0x39, 5),
        (RTI,  Implied, 0x3B, 10), (WAI, Implied, 0x3E, 9), (SWI,  Implied, 0x3F, 12),

        // accumulator A
        (NEGA, Implied, 0x40, 2), (COMA, Implied, 0x43, 2), (LSRA, Implied, 0x44, 2),
        (RORA, Implied, 0x46, 2), (ASRA, Implied, 0x47, 2), (ASLA, Implied, 0x48, 2),
        (ROLA, Implied, 0x49, 2), (DECA, Implied, 0x4A, 2), (INCA, Implied, 0x4C, 2),
        (TSTA, Implied, 0x4D, 2), (CLRA, Implied, 0x4F, 2),

        // accumulator B
        (NEGB, Implied, 0x50, 2), (COMB, Implied, 0x53, 2), (LSRB, Implied, 0x54, 2),
        (RORB, Implied, 0x56, 2), (ASRB, Implied, 0x57, 2), (ASLB, Implied, 0x58, 2),
        (ROLB, Implied, 0x59, 2), (DECB, Implied, 0x5A, 2), (INCB, Implied, 0x5C, 2),
        (TSTB, Implied, 0x5D, 2), (CLRB, Implied, 0x5F, 2),

        // branches
        (BRA, Relative, 0x20, 4), (BHI, Relative, 0x22, 4), (BLS, Relative, 0x23, 4),
        (BCC, Relative, 0x24, 4), (BCS, Relative, 0x25, 4), (BNE, Relative, 0x26, 4),
        (BEQ, Relative, 0x27, 4), (BVC, Relative, 0x28, 4), (BVS, Relative, 0x29, 4),
        (BPL, Relative, 0x2A, 4), (BMI, Relative, 0x2B, 4), (BGE, Relative, 0x2C, 4),
        (BLT, Relative, 0x2D, 4), (BGT, Relative, 0x2E, 4), (BLE, Relative, 0x2F, 4),
        (BSR, Relative, 0x8D, 8),

        // read-modify-write memory
        (NEG, Indexed, 0x60, 7), (NEG, Extended, 0x70, 6),
        (COM, Indexed, 0x63, 7), (COM, Extended, 0x73, 6),
        (LSR, Indexed, 0x64, 7), (LSR, Extended, 0x74, 6),
        (ROR, Indexed, 0x66, 7), (ROR, Extended, 0x76, 6),
        (ASR, Indexed, 0x67, 7), (ASR, Extended, 0x77, 6),
        (ASL, Indexed, 0x68, 7), (ASL, Extended, 0x78, 6),
        (ROL, Indexed, 0x69, 7), (ROL, Extended, 0x79, 6),
        (DEC, Indexed, 0x6A, 7), (DEC, Extended, 0x7A, 6),
        (INC, Indexed, 0x6C, 7), (INC, Extended, 0x7C, 6),
        (TST, Indexed, 0x6D, 7), (TST, Extended, 0x7D, 6),
        (JMP, Indexed, 0x6E, 4), (JMP, Extended, 0x7E, 3),
        (CLR, Indexed, 0x6F, 7), (CLR, Extended, 0x7F, 6),

        // accumulator A, memory operand
        (SUBA, Immediate, 0x80, 2), (SUBA, Direct, 0x90, 3), (SUBA, Indexed, 0xA0, 5), (SUBA, Extended, 0xB0, 4),
        (CMPA, Immediate, 0x81, 2), (CMPA, Direct, 0x91, 3), (CMPA, Indexed, 0xA1, 5), (CMPA, Extended, 0xB1, 4),
        (SBCA, Immediate, 0x82, 2), (SBCA, Direct, 0x92, 3), (SBCA, Indexed, 0xA2, 5), (SBCA, Extended, 0xB2, 4),
        (ANDA, Immediate, 0x84, 2), (ANDA, Direct, 0x94, 3), (ANDA, Indexed, 0xA4, 5), (ANDA, Extended, 0xB4, 4),
        (BITA, Immediate, 0x85, 2), (BITA, Direct, 0x95, 3), (BITA, Indexed, 0xA5, 5), (BITA, Extended, 0xB5, 4),
        (LDAA, Immediate, 0x86, 2), (LDAA, Direct, 0x96, 3), (LDAA, Indexed, 0xA6, 5), (LDAA, Extended, 0xB6, 4),
                                    (STAA, Direct, 0x97, 4), (STAA, Indexed, 0xA7, 6), (STAA, Extended, 0xB7, 5),
        (EORA, Immediate, 0x88, 2), (EORA, Direct, 0x98, 3), (EORA, Indexed, 0xA8, 5), (EORA, Extended, 0xB8, 4),
        (ADCA, Immediate, 0x89, 2), (ADCA, Direct, 0x99, 3), (ADCA, Indexed, 0xA9, 5), (ADCA, Extended, 0xB9, 4),
        (ORAA, Immediate, 0x8A, 2), (ORAA, Direct, 0x9A, 3), (ORAA, Indexed, 0xAA, 5), (ORAA, Extended, 0xBA, 4),
        (ADDA, Immediate, 0x8B, 2), (ADDA, Direct, 0x9B, 3), (ADDA, Indexed, 0xAB, 5), (ADDA, Extended, 0xBB, 4),
        (CPX,  Immediate, 0x8C, 3), (CPX,  Direct, 0x9C, 4), (CPX,  Indexed, 0xAC, 6), (CPX,  Extended, 0xBC, 5),
                                                             (JSR,  Indexed, 0xAD, 8), (JSR,  Extended, 0xBD, 9),
        (LDS,  Immediate, 0x8E, 3), (LDS,  Direct, 0x9E, 4), (LDS,  Indexed, 0xAE, 6), (LDS,  Extended, 0xBE, 5),
                                    (STS,  Direct, 0x9F, 5), (STS,  Indexed, 0xAF, 7), (STS,  Extended, 0xBF, 6),

        // accumulator B, memory operand
        (SUBB, Immediate, 0xC0, 2), (SUBB, Direct, 0xD0, 3), (SUBB, Indexed, 0xE0, 5), (SUBB, Extended, 0xF0, 4),
        (CMPB, Immediate, 0xC1, 2), (CMPB, Direct, 0xD1, 3), (CMPB, Indexed, 0xE1, 5), (CMPB, Extended, 0xF1, 4),
        (SBCB, Immediate, 0xC2, 2), (SBCB, Direct, 0xD2, 3), (SBCB, Indexed, 0xE2, 5), (SBCB, Extended, 0xF2, 4),
        (ANDB, Immediate, 0xC4, 2), (ANDB, Direct, 0xD4, 3), (ANDB, Indexed, 0xE4, 5), (ANDB, Extended, 0xF4, 4),
        (BITB, Immediate, 0xC5, 2), (BITB, Direct, 0xD5, 3), (BITB, Indexed, 0xE5, 5), (BITB, Extended, 0xF5, 4),
        (LDAB, Immediate, 0xC6, 2), (LDAB, Direct, 0xD6, 3), (LDAB, Indexed, 0xE6, 5), (LDAB, Extended, 0xF6, 4),
                                    (STAB, Direct, 0xD7, 4), (STAB, Indexed, 0xE7, 6), (STAB, Extended, 0xF7, 5),
        (EORB, Immediate, 0xC8, 2), (EORB, Direct, 0xD8, 3), (EORB, Indexed, 0xE8, 5), (EORB, Extended, 0xF8, 4),
        (ADCB, Immediate, 0xC9, 2), (ADCB, Direct, 0xD9, 3), (ADCB, Indexed, 0xE9, 5), (ADCB, Extended, 0xF9, 4),
        (ORAB, Immediate, 0xCA, 2), (ORAB, Direct, 0xDA, 3), (ORAB, Indexed, 0xEA, 5), (ORAB, Extended, 0xFA, 4),
        (ADDB, Immediate, 0xCB, 2), (ADDB, Direct, 0xDB, 3), (ADDB, Indexed, 0xEB, 5), (ADDB, Extended, 0xFB, 4),
        (LDX,  Immediate, 0xCE, 3), (LDX,  Direct, 0xDE, 4), (LDX,  Indexed, 0xEE, 6), (LDX,  Extended, 0xFE, 5),
                                    (STX,  Direct, 0xDF, 5), (STX,  Indexed, 0xEF, 7), (STX,  Extended, 0xFF, 6),
    ];

    ROWS
}
