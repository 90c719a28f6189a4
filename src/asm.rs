//! Assembling 6800 assembly source into object code.
//!
//! Assembly happens in two passes over the statements of the source:
//! 1. The first pass assigns an address to each statement and defines labels
//!    in the [`SymbolTable`].
//! 2. The second pass encodes each statement with the [`CodeGenerator`],
//!    which can only read the table through a [`Symbols`] view.
//!
//! The second pass only runs if the first pass found no errors. Both passes continue
//! past a bad line, so one run reports every error it can find.
//!
//! The module's key function is [`assemble`], which produces an [`Assembly`]:
//! ```
//! use m6800_ensemble::asm::assemble;
//!
//! let asm = assemble("
//!     START EQU $0100
//!           ORG START
//!     LOOP  LDAA #$05
//!           DECA
//!           BNE LOOP
//!           END
//! ");
//! assert!(asm.success);
//! assert_eq!(asm.object_code, [0x86, 0x05, 0x4A, 0x26, 0xFC]);
//! assert_eq!(asm.symbols.lookup("LOOP"), Some(0x0100));
//! ```

use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::isa::{AddrMode, InstructionSet, Mnemonic, PseudoOp};
use crate::parse::lex::{tokenize, Token};
use crate::parse::{Instr, OperandValue, ParseErr, Parser, PseudoStmt, ResolvedInstruction, StmtKind};

/// Assembles source text with the 6800 instruction set.
///
/// See [`Assembler::assemble`].
pub fn assemble(src: &str) -> Assembly {
    Assembler::new(InstructionSet::m6800()).assemble(src)
}

/// The broad class of an assembly error.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrorClass {
    /// The line could not be split into fields.
    Lexical,
    /// The line has an unknown mnemonic, a malformed operand, or no compatible addressing mode.
    Syntax,
    /// A label was redefined or never defined.
    Symbol,
    /// A value does not fit where it is placed.
    Range,
    /// The bytes generated for a statement do not match the length counted for it.
    CodeGenMismatch,
}

/// Kinds of errors that can occur from assembling given assembly code.
///
/// See [`AsmErr`] for this error type with line information included.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AsmErrKind {
    /// The line could not be resolved into a statement (pass 1).
    Parse(ParseErr),
    /// A label was defined more than once (pass 1).
    RedefinedLabel(String),
    /// A label was used but never defined (pass 1 for pseudo-op values, pass 2 for operands).
    UndefinedSymbol(String),
    /// The location counter ran past the end of memory (pass 1).
    LocationOverflow,
    /// An 8-bit immediate is above 255 (pass 2).
    ImmediateOutOfRange(u16),
    /// A direct address is above `$FF` (pass 2).
    DirectOutOfRange(u16),
    /// An `FCB` value is above 255 (pass 2).
    ByteOutOfRange(u16),
    /// A branch target is further than a signed byte can reach (pass 2).
    BranchOutOfRange {
        /// The target label.
        target: String,
        /// The offset which would be needed.
        offset: i32,
    },
    /// A relative-mode operand was not a label (pass 2).
    RelativeNeedsLabel,
    /// The operand does not fit the instruction's addressing mode (pass 2).
    BadOperand(Mnemonic, AddrMode),
    /// The bytes generated for an instruction do not match its length (pass 2).
    LengthMismatch {
        /// The mnemonic.
        mnemonic: Mnemonic,
        /// The addressing mode.
        mode: AddrMode,
        /// The length counted in the first pass.
        expected: u8,
        /// The number of bytes generated.
        got: usize,
    },
}
impl AsmErrKind {
    /// The class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            AsmErrKind::Parse(ParseErr::Lex(_)) => ErrorClass::Lexical,
            AsmErrKind::Parse(_)                => ErrorClass::Syntax,
            AsmErrKind::RedefinedLabel(_)       => ErrorClass::Symbol,
            AsmErrKind::UndefinedSymbol(_)      => ErrorClass::Symbol,
            AsmErrKind::LocationOverflow        => ErrorClass::Range,
            AsmErrKind::ImmediateOutOfRange(_)  => ErrorClass::Range,
            AsmErrKind::DirectOutOfRange(_)     => ErrorClass::Range,
            AsmErrKind::ByteOutOfRange(_)       => ErrorClass::Range,
            AsmErrKind::BranchOutOfRange { .. } => ErrorClass::Range,
            AsmErrKind::RelativeNeedsLabel      => ErrorClass::Syntax,
            AsmErrKind::BadOperand(..)          => ErrorClass::Syntax,
            AsmErrKind::LengthMismatch { .. }   => ErrorClass::CodeGenMismatch,
        }
    }
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e)               => std::fmt::Display::fmt(e, f),
            Self::RedefinedLabel(l)      => write!(f, "Label '{l}' redefined"),
            Self::UndefinedSymbol(l)     => write!(f, "Undefined symbol: '{l}'"),
            Self::LocationOverflow       => f.write_str("Location counter overflowed past $FFFF"),
            Self::ImmediateOutOfRange(v) => write!(f, "Immediate value {v} out of 8-bit range"),
            Self::DirectOutOfRange(a)    => write!(f, "Direct address ${a:04X} out of range (must be $00-$FF)"),
            Self::ByteOutOfRange(v)      => write!(f, "FCB value {v} out of byte range"),
            Self::BranchOutOfRange { target, offset } => write!(f, "Branch target '{target}' out of range (offset {offset})"),
            Self::RelativeNeedsLabel     => f.write_str("Operand for relative mode must be a label"),
            Self::BadOperand(m, mode)    => write!(f, "Operand does not fit {m} in {mode} mode"),
            Self::LengthMismatch { mnemonic, mode, expected, got } => {
                write!(f, "Code generation mismatch for {mnemonic} ({mode}): expected {expected} byte(s), generated {got}")
            },
        }
    }
}

/// Error from assembling given assembly code.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AsmErr {
    /// The kind of error.
    pub kind: AsmErrKind,
    /// The line number (starting from 1) of the offending line.
    pub line: usize,
    /// The offending line, trimmed.
    pub source_line: String,
}
impl AsmErr {
    /// Creates a new [`AsmErr`] for the line of the given token.
    pub fn new(kind: AsmErrKind, token: &Token) -> Self {
        AsmErr { kind, line: token.line_no, source_line: token.text.clone() }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error (L:{}): {} -> '{}'", self.line, self.kind, self.source_line)
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            AsmErrKind::Parse(e) => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for AsmErr {
    fn line(&self) -> Option<usize> {
        Some(self.line)
    }

    fn help(&self) -> Option<Cow<str>> {
        match &self.kind {
            AsmErrKind::Parse(e)               => crate::err::Error::help(e),
            AsmErrKind::RedefinedLabel(_)      => Some("labels must be unique within a file, try renaming one of the labels".into()),
            AsmErrKind::UndefinedSymbol(_)     => Some("try adding this label before an instruction or pseudo-op".into()),
            AsmErrKind::LocationOverflow       => Some("the program does not fit below $FFFF; try a lower ORG".into()),
            AsmErrKind::ImmediateOutOfRange(_) => Some(format!("8-bit immediates must be in the range [0, {}]", u8::MAX).into()),
            AsmErrKind::DirectOutOfRange(_)    => Some("use a 4-digit address to select extended mode".into()),
            AsmErrKind::ByteOutOfRange(_)      => Some("use FDB for 16-bit values".into()),
            AsmErrKind::BranchOutOfRange { .. } => Some("branches reach from -128 to +127 bytes past the next instruction; try JMP".into()),
            AsmErrKind::RelativeNeedsLabel     => Some("branch to a label instead of a numeric address".into()),
            AsmErrKind::BadOperand(..)         => None,
            AsmErrKind::LengthMismatch { .. }  => None,
        }
    }
}

/// A label definition table.
///
/// Labels are case-insensitive and can only be defined once.
/// The first assembler pass fills this table in, and the second only reads it
/// through [`SymbolTable::view`].
#[derive(PartialEq, Eq, Clone, Default)]
pub struct SymbolTable {
    labels: HashMap<String, u16>
}
impl SymbolTable {
    /// Creates an empty symbol table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a label, failing if it already has a value.
    pub fn define(&mut self, label: &str, value: u16) -> Result<(), AsmErrKind> {
        match self.labels.entry(label.to_uppercase()) {
            Entry::Occupied(e) => Err(AsmErrKind::RedefinedLabel(e.key().clone())),
            Entry::Vacant(e) => {
                trace!(label = e.key().as_str(), value, "defined symbol");
                e.insert(value);
                Ok(())
            }
        }
    }

    /// Gets the value of a label (if it exists).
    pub fn lookup(&self, label: &str) -> Option<u16> {
        self.labels.get(&label.to_uppercase()).copied()
    }

    /// Checks whether a label is defined.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains_key(&label.to_uppercase())
    }

    /// Gets the label defined at a given value (if one exists).
    ///
    /// If several labels share the value, the alphabetically first is returned.
    pub fn rev_lookup(&self, value: u16) -> Option<&str> {
        self.labels.iter()
            .filter(|&(_, &v)| v == value)
            .map(|(l, _)| &**l)
            .min()
    }

    /// Removes every label.
    pub fn clear(&mut self) {
        self.labels.clear();
    }

    /// The number of labels defined.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no labels are defined.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Gets an iterable of the mapping from labels to values.
    pub fn iter(&self) -> impl Iterator<Item=(&str, u16)> + '_ {
        self.labels.iter().map(|(l, &v)| (&**l, v))
    }

    /// A read-only view of this table.
    pub fn view(&self) -> Symbols<'_> {
        Symbols(self)
    }
}
impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sorted: BTreeMap<_, _> = self.iter().map(|(l, v)| (l, Addr(v))).collect();
        f.debug_tuple("SymbolTable").field(&sorted).finish()
    }
}

/// A read-only view of a [`SymbolTable`].
#[derive(Debug, Clone, Copy)]
pub struct Symbols<'a>(&'a SymbolTable);
impl Symbols<'_> {
    /// Gets the value of a label (if it exists).
    pub fn lookup(&self, label: &str) -> Option<u16> {
        self.0.lookup(label)
    }
    /// Checks whether a label is defined.
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }
}

struct Addr(u16);
impl std::fmt::Debug for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:04X}", self.0)
    }
}

/// Encodes resolved statements into bytes.
#[derive(Clone, Copy)]
pub struct CodeGenerator<'a> {
    isa: &'a InstructionSet,
    symbols: Symbols<'a>,
}
impl<'a> CodeGenerator<'a> {
    /// Creates a code generator which resolves labels with the given view.
    pub fn new(isa: &'a InstructionSet, symbols: Symbols<'a>) -> Self {
        Self { isa, symbols }
    }

    /// Gets the numeric value of an operand, resolving labels.
    pub fn value_of(&self, value: &OperandValue) -> Result<u16, AsmErrKind> {
        match value {
            OperandValue::Immediate(v) | OperandValue::DirectOrExtendedAddress(v) => Ok(*v),
            OperandValue::IndexedOffset(o) => Ok(u16::from(*o)),
            OperandValue::Label(l) => self.symbols.lookup(l)
                .ok_or_else(|| AsmErrKind::UndefinedSymbol(l.clone())),
        }
    }

    /// Generates the bytes of a statement.
    ///
    /// Label-only lines and pseudo-ops other than `FCB` and `FDB` produce no bytes.
    pub fn generate(&self, stmt: &ResolvedInstruction) -> Result<Vec<u8>, AsmErrKind> {
        match &stmt.kind {
            Ok(StmtKind::Label) => Ok(vec![]),
            Ok(StmtKind::Instr(instr)) => self.encode_instr(instr, stmt.address),
            Ok(StmtKind::Directive(d)) => self.encode_pseudo(d),
            Err(e) => Err(AsmErrKind::Parse(e.clone())),
        }
    }

    fn encode_instr(&self, instr: &Instr, addr: u16) -> Result<Vec<u8>, AsmErrKind> {
        let &Instr { mnemonic, mode, ref operand, desc: counted } = instr;
        let desc = self.isa.descriptor(mnemonic, mode)
            .ok_or(AsmErrKind::BadOperand(mnemonic, mode))?;

        let mut bytes = vec![desc.opcode];
        match (mode, operand) {
            (AddrMode::Implied, None) => {},
            (AddrMode::Immediate, Some(OperandValue::Immediate(v))) => match mnemonic.wide_immediate() {
                true  => bytes.extend(v.to_be_bytes()),
                false => bytes.push(u8::try_from(*v).map_err(|_| AsmErrKind::ImmediateOutOfRange(*v))?),
            },
            (AddrMode::Direct, Some(v)) => {
                let addr = self.value_of(v)?;
                bytes.push(u8::try_from(addr).map_err(|_| AsmErrKind::DirectOutOfRange(addr))?);
            },
            (AddrMode::Extended, Some(v)) => bytes.extend(self.value_of(v)?.to_be_bytes()),
            (AddrMode::Indexed, Some(OperandValue::IndexedOffset(o))) => bytes.push(*o),
            (AddrMode::Relative, Some(OperandValue::Label(l))) => {
                let target = self.symbols.lookup(l)
                    .ok_or_else(|| AsmErrKind::UndefinedSymbol(l.clone()))?;
                let offset = i32::from(target) - (i32::from(addr) + 2);
                let offset = i8::try_from(offset)
                    .map_err(|_| AsmErrKind::BranchOutOfRange { target: l.clone(), offset })?;
                bytes.push(offset as u8);
            },
            (AddrMode::Relative, Some(_)) => return Err(AsmErrKind::RelativeNeedsLabel),
            _ => return Err(AsmErrKind::BadOperand(mnemonic, mode)),
        }

        match bytes.len() == usize::from(counted.len) {
            true  => Ok(bytes),
            false => Err(AsmErrKind::LengthMismatch { mnemonic, mode, expected: counted.len, got: bytes.len() }),
        }
    }

    fn encode_pseudo(&self, stmt: &PseudoStmt) -> Result<Vec<u8>, AsmErrKind> {
        match stmt.op {
            PseudoOp::Fcb => stmt.args.iter()
                .map(|a| {
                    let v = self.value_of(a)?;
                    u8::try_from(v).map_err(|_| AsmErrKind::ByteOutOfRange(v))
                })
                .collect(),
            PseudoOp::Fdb => {
                let mut bytes = Vec::with_capacity(2 * stmt.args.len());
                for a in &stmt.args {
                    bytes.extend(self.value_of(a)?.to_be_bytes());
                }
                Ok(bytes)
            },
            PseudoOp::Org | PseudoOp::Equ | PseudoOp::Rmb | PseudoOp::End => Ok(vec![]),
        }
    }
}

/// One row of the assembly listing.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ListingRecord {
    /// The address of the statement (4 hex digits), or `----` for rows not tied to a line.
    pub address: String,
    /// The generated bytes in hex, or an error marker (`ERROR`, `CG_ERR`).
    pub bytes: String,
    /// The source line, trimmed.
    pub source: String,
    /// A comment on the statement, or the error message.
    pub comment: String,
}
impl ListingRecord {
    fn new(address: impl Into<String>, bytes: impl Into<String>, source: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            bytes: bytes.into(),
            source: source.into(),
            comment: comment.into(),
        }
    }
}
impl std::fmt::Display for ListingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let row = format!("{:<6}{:<12}{:<32}{}", self.address, self.bytes, self.source, self.comment);
        f.write_str(row.trim_end())
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The result of assembling a source text.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// Whether assembly produced no errors.
    pub success: bool,
    /// The generated bytes, in statement order.
    ///
    /// Gaps left by `ORG` and `RMB` are not represented here.
    /// [`Assembly::records`] gives each piece with its address.
    pub object_code: Vec<u8>,
    /// One row per processed line (plus summary rows if the first pass failed).
    pub listing: Vec<ListingRecord>,
    /// Every error found.
    pub errors: Vec<AsmErr>,
    /// The last `ORG` address (or 0 if there was none).
    pub origin: u16,
    /// The labels defined in the first pass.
    pub symbols: SymbolTable,
    records: Vec<(u16, Vec<u8>)>,
}
impl Assembly {
    /// The errors, rendered as diagnostic strings.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// The bytes of each statement that generated any, along with the address they belong at.
    pub fn records(&self) -> impl Iterator<Item=(u16, &[u8])> + '_ {
        self.records.iter().map(|(addr, bytes)| (*addr, bytes.as_slice()))
    }
}

/// The location counter of the first pass.
struct Cursor {
    lc: u32,
}
impl Cursor {
    /// The address of the next byte, failing once the LC has run past `$FFFF`.
    fn addr(&self) -> Result<u16, AsmErrKind> {
        u16::try_from(self.lc).map_err(|_| AsmErrKind::LocationOverflow)
    }
    /// Computes the LC after n more bytes, failing if that would run past the end of memory.
    fn peek_shift(&self, n: u32) -> Result<u32, AsmErrKind> {
        match self.lc + n {
            new_lc if new_lc > 0x10000 => Err(AsmErrKind::LocationOverflow),
            new_lc => Ok(new_lc),
        }
    }
}

/// Evaluates the value of a pseudo-op in the first pass.
///
/// Labels used here must be defined on an earlier line.
fn first_value(stmt: &PseudoStmt, symbols: &SymbolTable) -> Result<u16, AsmErrKind> {
    match stmt.args.first() {
        Some(OperandValue::Label(l)) => symbols.lookup(l).ok_or_else(|| AsmErrKind::UndefinedSymbol(l.clone())),
        Some(OperandValue::Immediate(n) | OperandValue::DirectOrExtendedAddress(n)) => Ok(*n),
        Some(OperandValue::IndexedOffset(n)) => Ok(u16::from(*n)),
        None => unreachable!("pseudo-op arity should have been checked by the parser"),
    }
}

/// The output of the first pass.
struct FirstPass {
    stmts: Vec<ResolvedInstruction>,
    symbols: SymbolTable,
    errors: Vec<AsmErr>,
    rows: Vec<ListingRecord>,
    origin: u16,
}

/// A two-pass assembler over an instruction set.
#[derive(Clone, Copy)]
pub struct Assembler<'a> {
    isa: &'a InstructionSet
}
impl<'a> Assembler<'a> {
    /// Creates an assembler for the given instruction set.
    pub fn new(isa: &'a InstructionSet) -> Self {
        Self { isa }
    }

    /// Assembles source text.
    ///
    /// This always returns an [`Assembly`]. If any line had an error,
    /// [`Assembly::success`] is false and [`Assembly::errors`] lists every error.
    /// If the first pass fails, the second pass does not run and no object code is generated.
    pub fn assemble(&self, src: &str) -> Assembly {
        debug!("starting pass 1");
        let FirstPass { stmts, symbols, errors, mut rows, origin } = self.first_pass(src);
        debug!(statements = stmts.len(), symbols = symbols.len(), errors = errors.len(), "pass 1 done");

        if !errors.is_empty() {
            rows.extend({
                errors.iter().map(|e| ListingRecord::new("----", "ERROR", "", e.to_string()))
            });

            return Assembly {
                success: false,
                object_code: vec![],
                listing: rows,
                errors,
                origin,
                symbols,
                records: vec![],
            };
        }

        debug!("starting pass 2");
        let mut errors = vec![];
        let mut listing = vec![];
        let mut records = vec![];
        let gen = CodeGenerator::new(self.isa, symbols.view());

        for stmt in &stmts {
            let addr = format!("{:04X}", stmt.address);
            let text = &*stmt.token.text;
            let comment = stmt.token.comment.as_deref().unwrap_or("");

            match &stmt.kind {
                Ok(StmtKind::Label) => listing.push(ListingRecord::new(addr, "", text, "; No object code")),
                Ok(StmtKind::Directive(d)) if !matches!(d.op, PseudoOp::Fcb | PseudoOp::Fdb) => {
                    let note = match (d.op, d.args.first()) {
                        (PseudoOp::Org, Some(a)) => format!("; ORG to ${:04X}", gen.value_of(a).unwrap_or(stmt.address)),
                        (PseudoOp::Equ, Some(a)) => {
                            let label = stmt.token.label.as_deref().unwrap_or("");
                            let value = gen.value_of(a).ok().or_else(|| symbols.lookup(label)).unwrap_or(0);
                            format!("; {label} EQU ${value:04X}")
                        },
                        (PseudoOp::Rmb, Some(a)) => format!("; RMB {} byte(s)", gen.value_of(a).unwrap_or(0)),
                        _ => String::from("; END of program"),
                    };
                    listing.push(ListingRecord::new(addr, "", text, note));
                    if d.op == PseudoOp::End { break; }
                },
                Ok(_) => match gen.generate(stmt) {
                    Ok(bytes) => {
                        trace!(address = stmt.address, len = bytes.len(), "generated");
                        listing.push(ListingRecord::new(addr, hex_bytes(&bytes), text, comment));
                        records.push((stmt.address, bytes));
                    },
                    Err(e) => {
                        listing.push(ListingRecord::new(addr, "CG_ERR", text, e.to_string()));
                        errors.push(AsmErr::new(e, &stmt.token));
                    }
                },
                Err(e) => {
                    listing.push(ListingRecord::new(addr, "ERROR", text, e.to_string()));
                    errors.push(AsmErr::new(AsmErrKind::Parse(e.clone()), &stmt.token));
                }
            }
        }

        let object_code: Vec<u8> = records.iter()
            .flat_map(|(_, b)| b.iter().copied())
            .collect();
        debug!(bytes = object_code.len(), errors = errors.len(), "pass 2 done");

        Assembly {
            success: errors.is_empty(),
            object_code,
            listing,
            errors,
            origin,
            symbols,
            records,
        }
    }

    /// Resolves every line, assigns addresses, and defines labels.
    fn first_pass(&self, src: &str) -> FirstPass {
        let parser = Parser::new(self.isa);
        let mut cursor = Cursor { lc: 0 };
        let mut symbols = SymbolTable::new();
        let mut stmts = vec![];
        let mut errors = vec![];
        let mut rows = vec![];
        let mut origin = 0;

        for token in tokenize(src, self.isa) {
            let mut stmt = parser.resolve(token);
            // only a line that emits nothing and defines nothing can sit at $10000
            stmt.address = cursor.addr().unwrap_or(u16::MAX);

            let result = match &stmt.kind {
                Ok(kind) => Self::define(kind, &stmt.token, &mut cursor, &mut symbols),
                Err(e) => Err(AsmErrKind::Parse(e.clone())),
            };

            let addr = format!("{:04X}", stmt.address);
            let stop = match result {
                Ok(Some(new_origin)) => {
                    origin = new_origin;
                    stmt.address = new_origin;
                    false
                },
                Ok(None) => matches!(&stmt.kind, Ok(StmtKind::Directive(PseudoStmt { op: PseudoOp::End, .. }))),
                Err(e) => {
                    rows.push(ListingRecord::new(&*addr, "ERROR", &*stmt.token.text, e.to_string()));
                    errors.push(AsmErr::new(e, &stmt.token));
                    stmts.push(stmt);
                    continue;
                }
            };

            rows.push(ListingRecord::new(addr, "", &*stmt.token.text, ""));
            stmts.push(stmt);
            if stop { break; }
        }

        FirstPass { stmts, symbols, errors, rows, origin }
    }

    /// Applies one statement to the location counter and symbol table.
    ///
    /// Nothing is changed if this fails.
    /// On success, this returns the new origin if the statement was an `ORG`.
    fn define(kind: &StmtKind, token: &Token, cursor: &mut Cursor, symbols: &mut SymbolTable) -> Result<Option<u16>, AsmErrKind> {
        let here = cursor.addr();
        let (label_value, len, new_origin) = match kind {
            StmtKind::Label => (here?, 0, None),
            StmtKind::Instr(i) => (here?, u32::from(i.desc.len), None),
            StmtKind::Directive(d) => match d.op {
                PseudoOp::Org => {
                    let org = first_value(d, symbols)?;
                    (org, 0, Some(org))
                },
                PseudoOp::Equ => (first_value(d, symbols)?, 0, None),
                PseudoOp::Fcb => (here?, d.args.len() as u32, None),
                PseudoOp::Fdb => (here?, 2 * d.args.len() as u32, None),
                PseudoOp::Rmb => (here?, u32::from(first_value(d, symbols)?), None),
                PseudoOp::End if token.label.is_none() => (0, 0, None),
                PseudoOp::End => (here?, 0, None),
            }
        };

        let next_lc = match new_origin {
            Some(org) => u32::from(org),
            None => cursor.peek_shift(len)?,
        };
        if let Some(label) = &token.label {
            symbols.define(label, label_value)?;
        }
        cursor.lc = next_lc;

        Ok(new_origin)
    }
}
