//! Resolving tokens into statements.
//!
//! The parser takes the [`Token`]s produced by the [`lex`] module and decides,
//! for each one, what the statement is:
//! - an instruction, with its addressing mode and operand picked out ([`Instr`]),
//! - a pseudo-op, with its values ([`PseudoStmt`]),
//! - a label on its own line ([`StmtKind::Label`]),
//! - or an error ([`ParseErr`]).
//!
//! A statement does not know its address until the assembler's first pass assigns one.
//!
//! ```
//! use m6800_ensemble::isa::{AddrMode, InstructionSet};
//! use m6800_ensemble::parse::{lex, Parser, StmtKind};
//!
//! let isa = InstructionSet::m6800();
//! let token = lex::tokenize_line(" LDAA $10", 1, isa).unwrap();
//! let stmt = Parser::new(isa).resolve(token);
//!
//! let Ok(StmtKind::Instr(instr)) = stmt.kind else { panic!("expected instruction") };
//! assert_eq!(instr.mode, AddrMode::Direct);
//! ```

pub mod lex;

use std::borrow::Cow;

use logos::Logos;

use crate::isa::{AddrMode, Arity, Descriptor, InstructionSet, Mnemonic, PseudoOp};
use lex::{Atom, HexLit, LexErr, Token};

/// A resolved operand value.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum OperandValue {
    /// A literal value.
    Immediate(u16),
    /// A symbol, resolved during code generation.
    Label(String),
    /// A numeric address, encoded as one byte in direct mode or two in extended mode.
    DirectOrExtendedAddress(u16),
    /// An offset from the index register.
    IndexedOffset(u8),
}

/// An executable instruction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Instr {
    /// The mnemonic.
    pub mnemonic: Mnemonic,
    /// The chosen addressing mode.
    pub mode: AddrMode,
    /// The operand (if the mode has one).
    pub operand: Option<OperandValue>,
    /// The opcode table entry for this mnemonic and mode.
    pub desc: Descriptor,
}

/// A pseudo-op, along with its values.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PseudoStmt {
    /// The pseudo-op.
    pub op: PseudoOp,
    /// Its values. These are either [`OperandValue::Immediate`] or [`OperandValue::Label`].
    pub args: Vec<OperandValue>,
}

/// What a statement is.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StmtKind {
    /// A line with a label and nothing else.
    Label,
    /// An instruction.
    Instr(Instr),
    /// A pseudo-op.
    Directive(PseudoStmt),
}

/// A token after it has been resolved.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResolvedInstruction {
    /// The source token.
    pub token: Token,
    /// What this statement is, or why it could not be resolved.
    pub kind: Result<StmtKind, ParseErr>,
    /// The location counter when this statement was reached.
    pub address: u16,
}
impl ResolvedInstruction {
    /// Whether this statement is a pseudo-op.
    pub fn is_pseudo_op(&self) -> bool {
        matches!(self.kind, Ok(StmtKind::Directive(_)))
    }
    /// The addressing mode chosen for this statement (if it is an instruction).
    pub fn mode(&self) -> Option<AddrMode> {
        match &self.kind {
            Ok(StmtKind::Instr(i)) => Some(i.mode),
            _ => None
        }
    }
    /// The operand values of this statement.
    pub fn operands(&self) -> &[OperandValue] {
        match &self.kind {
            Ok(StmtKind::Instr(i)) => match &i.operand {
                Some(op) => std::slice::from_ref(op),
                None => &[],
            },
            Ok(StmtKind::Directive(d)) => &d.args,
            _ => &[]
        }
    }
    /// The error raised resolving this statement (if any).
    pub fn error(&self) -> Option<&ParseErr> {
        self.kind.as_ref().err()
    }
}

/// Any errors raised while resolving a token.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseErr {
    /// The line (or its operand field) could not be tokenized.
    Lex(LexErr),
    /// The mnemonic is neither an instruction nor a pseudo-op.
    UnknownMnemonic(String),
    /// The operand field does not match any operand format.
    InvalidOperand(String),
    /// An indexed offset is above 255.
    OffsetOutOfRange(String),
    /// The operand is not compatible with any addressing mode of the mnemonic.
    NoMatchingMode {
        /// The mnemonic.
        mnemonic: Mnemonic,
        /// The modes the mnemonic supports.
        supported: Vec<AddrMode>,
        /// The operand text given.
        got: String,
    },
    /// A pseudo-op was given the wrong number of values.
    WrongArity {
        /// The pseudo-op.
        op: PseudoOp,
        /// The number of values given.
        got: usize,
    },
    /// `EQU` appeared without a label.
    EquWithoutLabel,
    /// A pseudo-op value is not a literal or label.
    InvalidValue(PseudoOp, String),
}
impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErr::Lex(e) => std::fmt::Display::fmt(e, f),
            ParseErr::UnknownMnemonic(m) => write!(f, "Unknown mnemonic or directive: '{m}'"),
            ParseErr::InvalidOperand(s) => write!(f, "Invalid operand format: '{s}'"),
            ParseErr::OffsetOutOfRange(s) => write!(f, "Invalid or out-of-range indexed offset: '{s}'"),
            ParseErr::NoMatchingMode { mnemonic, supported, got } => {
                let modes = supported.iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let got = match got.is_empty() {
                    true  => "None",
                    false => got,
                };
                write!(f, "Invalid or missing operands for '{mnemonic}'. Expected modes: {modes}. Got: '{got}'")
            },
            ParseErr::WrongArity { op, got } => {
                let expected = match op.arity() {
                    Arity::None => "no operands",
                    Arity::One => "exactly one operand",
                    Arity::OneOrMore => "at least one operand",
                };
                write!(f, "{op} expects {expected}, got {got}")
            },
            ParseErr::EquWithoutLabel => f.write_str("EQU requires a label"),
            ParseErr::InvalidValue(op, s) => write!(f, "Invalid value for {op}: '{s}'"),
        }
    }
}
impl std::error::Error for ParseErr {}
impl crate::err::Error for ParseErr {
    fn help(&self) -> Option<Cow<str>> {
        match self {
            ParseErr::Lex(e) => crate::err::Error::help(e),
            ParseErr::UnknownMnemonic(_) => Some("check the spelling of the mnemonic".into()),
            ParseErr::InvalidOperand(_) => Some("operands are '#value', '$hex', decimal, 'offset,X', or a label".into()),
            ParseErr::OffsetOutOfRange(_) => Some("indexed offsets must be in the range [0, 255]".into()),
            ParseErr::NoMatchingMode { .. } => None,
            ParseErr::WrongArity { op, .. } => Some(format!("{op} ({})", op.description()).into()),
            ParseErr::EquWithoutLabel => Some("write the symbol being defined before EQU (e.g., 'SIZE EQU 10')".into()),
            ParseErr::InvalidValue(..) => Some("values are numeric literals, character literals, or labels".into()),
        }
    }
}
impl From<LexErr> for ParseErr {
    fn from(value: LexErr) -> Self {
        ParseErr::Lex(value)
    }
}

/// The shape of an instruction's operand, before an addressing mode has been picked.
#[derive(Debug, PartialEq, Eq, Clone)]
enum Operand {
    Immediate(u16),
    Indexed(u8),
    Address { value: u16, short: bool },
    Label(String),
}

fn atoms(text: &str) -> Result<Vec<Atom>, ParseErr> {
    Atom::lexer(text)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ParseErr::Lex)
}

fn literal(atom: &Atom) -> Option<u16> {
    match *atom {
        Atom::Hex(HexLit { value, .. }) | Atom::Bin(value) | Atom::Dec(value) | Atom::Char(value) => Some(value),
        _ => None
    }
}

/// Figures out the shape of an instruction operand.
fn classify(text: &str) -> Result<Operand, ParseErr> {
    let invalid = || ParseErr::InvalidOperand(text.to_string());

    match atoms(text)?.as_slice() {
        [Atom::Hash, lit] => literal(lit).map(Operand::Immediate).ok_or_else(invalid),
        [offset, Atom::Comma, Atom::Ident(reg)] if reg == "X" => {
            let value = match offset {
                Atom::Hex(HexLit { value, digits }) if *digits <= 2 => *value,
                Atom::Dec(value) => *value,
                Atom::Hex(_) => return Err(ParseErr::OffsetOutOfRange(text.to_string())),
                _ => return Err(invalid()),
            };
            u8::try_from(value)
                .map(Operand::Indexed)
                .map_err(|_| ParseErr::OffsetOutOfRange(text.to_string()))
        },
        [Atom::Hex(HexLit { value, digits })] => Ok(Operand::Address { value: *value, short: *digits <= 2 }),
        [Atom::Dec(value)] => Ok(Operand::Address { value: *value, short: *value <= 0xFF }),
        [Atom::Ident(label)] => Ok(Operand::Label(label.clone())),
        _ => Err(invalid())
    }
}

/// Resolves tokens against an instruction set.
#[derive(Clone, Copy)]
pub struct Parser<'a> {
    isa: &'a InstructionSet
}
impl<'a> Parser<'a> {
    /// Creates a parser for the given instruction set.
    pub fn new(isa: &'a InstructionSet) -> Self {
        Self { isa }
    }

    /// Resolves a token into a statement. The statement's address is left at 0.
    pub fn resolve(&self, token: Token) -> ResolvedInstruction {
        let kind = self.resolve_kind(&token);
        ResolvedInstruction { token, kind, address: 0 }
    }

    fn resolve_kind(&self, token: &Token) -> Result<StmtKind, ParseErr> {
        if let Some(e) = token.error {
            return Err(ParseErr::Lex(e));
        }
        let Some(mnemonic) = &token.mnemonic else {
            return Ok(StmtKind::Label);
        };

        if let Ok(m) = mnemonic.parse::<Mnemonic>() {
            self.resolve_instr(m, &token.operands).map(StmtKind::Instr)
        } else if let Ok(op) = mnemonic.parse::<PseudoOp>() {
            resolve_pseudo(op, token).map(StmtKind::Directive)
        } else {
            Err(ParseErr::UnknownMnemonic(mnemonic.clone()))
        }
    }

    /// Picks the addressing mode of an instruction.
    ///
    /// With no operand, this is implied mode.
    /// Otherwise, the operand's shape decides, in this order of preference:
    /// - immediate,
    /// - indexed,
    /// - for labels: relative, then extended, then direct,
    /// - for short addresses: relative, then direct, then extended,
    /// - for long addresses: relative, then extended.
    fn resolve_instr(&self, mnemonic: Mnemonic, text: &str) -> Result<Instr, ParseErr> {
        use AddrMode::*;

        let supports = |mode| self.isa.supports(mnemonic, mode);
        let first_supported = |modes: &[AddrMode]| modes.iter().copied().find(|&m| supports(m));

        let chosen = match text.is_empty() {
            true => supports(Implied).then_some((Implied, None)),
            false => match classify(text)? {
                Operand::Immediate(v) if supports(Immediate) => Some((Immediate, Some(OperandValue::Immediate(v)))),
                Operand::Indexed(o) if supports(Indexed) => Some((Indexed, Some(OperandValue::IndexedOffset(o)))),
                Operand::Label(l) => first_supported(&[Relative, Extended, Direct])
                    .map(|m| (m, Some(OperandValue::Label(l)))),
                Operand::Address { value, short } => {
                    let order: &[_] = match short {
                        true  => &[Relative, Direct, Extended],
                        false => &[Relative, Extended],
                    };
                    first_supported(order).map(|m| (m, Some(OperandValue::DirectOrExtendedAddress(value))))
                },
                _ => None
            }
        };

        let Some((mode, operand)) = chosen else {
            return Err(ParseErr::NoMatchingMode {
                mnemonic,
                supported: self.isa.modes(mnemonic).iter().map(|&(m, _)| m).collect(),
                got: text.to_string()
            });
        };
        let desc = *self.isa.descriptor(mnemonic, mode)
            .unwrap_or_else(|| unreachable!("mode was checked to be supported"));

        Ok(Instr { mnemonic, mode, operand, desc })
    }

    /// Resolves every token in order.
    pub fn resolve_all(&self, tokens: impl IntoIterator<Item=Token>) -> Vec<ResolvedInstruction> {
        tokens.into_iter()
            .map(|t| self.resolve(t))
            .collect()
    }
}

/// Parses one pseudo-op value: a literal (optionally prefixed with `#`) or a label.
fn pseudo_value(atoms: &[Atom]) -> Option<OperandValue> {
    let atoms = match atoms {
        [Atom::Hash, rest @ ..] => rest,
        rest => rest,
    };

    match atoms {
        [Atom::Ident(l)] => Some(OperandValue::Label(l.clone())),
        [lit] => literal(lit).map(OperandValue::Immediate),
        _ => None
    }
}

fn resolve_pseudo(op: PseudoOp, token: &Token) -> Result<PseudoStmt, ParseErr> {
    let atoms = atoms(&token.operands)?;
    let groups: Vec<&[Atom]> = match atoms.is_empty() {
        true  => vec![],
        false => atoms.split(|a| *a == Atom::Comma).collect(),
    };

    let arity_ok = match op.arity() {
        Arity::None => groups.is_empty(),
        Arity::One => groups.len() == 1,
        Arity::OneOrMore => !groups.is_empty(),
    };
    if !arity_ok {
        return Err(ParseErr::WrongArity { op, got: groups.len() });
    }
    if op == PseudoOp::Equ && token.label.is_none() {
        return Err(ParseErr::EquWithoutLabel);
    }

    let args = groups.into_iter()
        .map(|g| pseudo_value(g).ok_or_else(|| ParseErr::InvalidValue(op, token.operands.clone())))
        .collect::<Result<_, _>>()?;

    Ok(PseudoStmt { op, args })
}
