//! Tokenizing 6800 assembly.
//!
//! Assembly is tokenized a line at a time. Each line that holds anything
//! other than whitespace or a comment becomes a [`Token`], which splits the line
//! into its label, mnemonic, operand, and comment fields.
//!
//! The operand field is kept as raw text on the [`Token`].
//! The parser breaks it into [`Atom`]s once it knows which mnemonic it belongs to.

use std::num::IntErrorKind;
use std::ops::Range;

use logos::{Lexer, Logos};

use crate::isa::InstructionSet;

/// The fields of one line of assembly.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    /// The line number (starting from 1).
    pub line_no: usize,
    /// The full line, trimmed.
    pub text: String,
    /// The label field, uppercased.
    pub label: Option<String>,
    /// The mnemonic field, uppercased.
    pub mnemonic: Option<String>,
    /// The operand field, trimmed. This is empty if there are no operands.
    pub operands: String,
    /// The comment, including its `;` or `*` marker.
    pub comment: Option<String>,
    /// If the line could not be split into fields, this holds the reason.
    pub error: Option<LexErr>,
}
impl Token {
    fn new(line_no: usize, text: &str) -> Self {
        Self {
            line_no,
            text: text.to_string(),
            label: None,
            mnemonic: None,
            operands: String::new(),
            comment: None,
            error: None,
        }
    }

    fn fail(mut self, err: LexErr) -> Self {
        self.label = None;
        self.mnemonic = None;
        self.operands.clear();
        self.error = Some(err);
        self
    }

    /// Whether this is a lexical-error token.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// The pieces a line is split on.
#[derive(Debug, Logos, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[ \t\r\f]+", error = LexErr)]
enum Field {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word,

    #[token(":")]
    Colon,

    #[regex(r"[;*][^\n]*")]
    Comment,
}

struct Word<'s> {
    text: &'s str,
    span: Range<usize>,
}
impl<'s> Word<'s> {
    fn current(lx: &Lexer<'s, Field>) -> Self {
        Self { text: lx.slice(), span: lx.span() }
    }
}

/// Mnemonics are 2 to 5 letters.
fn is_mnemonic_shaped(word: &str) -> bool {
    (2..=5).contains(&word.len()) && word.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Finds where the comment of an operand field starts, skipping over character literals.
fn comment_start(rest: &str) -> Option<usize> {
    let mut quoted = false;
    rest.char_indices()
        .find(|&(_, c)| {
            if c == '\'' { quoted = !quoted; }
            !quoted && matches!(c, ';' | '*')
        })
        .map(|(i, _)| i)
}

/// Splits one line of assembly into its fields.
///
/// Blank lines and comment-only lines produce no token.
/// Lines which cannot be split produce a token whose [`Token::error`] is set.
///
/// When a line starts with two words and no colon, the first is the label
/// unless it is a mnemonic or pseudo-op of `isa`. A lone word that is not
/// mnemonic-shaped is taken to be a label.
pub fn tokenize_line(line: &str, line_no: usize, isa: &InstructionSet) -> Option<Token> {
    let mut tok = Token::new(line_no, line.trim());
    let mut fields = Field::lexer(line);

    let first = match fields.next() {
        None | Some(Ok(Field::Comment)) => return None,
        Some(Ok(Field::Word)) => Word::current(&fields),
        Some(Ok(Field::Colon) | Err(_)) => return Some(tok.fail(LexErr::InvalidSymbol)),
    };
    let mut next = fields.next();

    let mnemonic = if next == Some(Ok(Field::Colon)) {
        tok.label = Some(first.text.to_uppercase());

        match fields.next() {
            Some(Ok(Field::Word)) => {
                let m = Word::current(&fields);
                next = fields.next();
                m
            },
            None => return Some(tok),
            Some(Ok(Field::Comment)) => {
                tok.comment = Some(fields.slice().trim_end().to_string());
                return Some(tok);
            },
            Some(Ok(Field::Colon) | Err(_)) => return Some(tok.fail(LexErr::ExpectedMnemonic)),
        }
    } else if isa.is_keyword(first.text) {
        first
    } else {
        match next {
            Some(Ok(Field::Word)) => {
                tok.label = Some(first.text.to_uppercase());
                let m = Word::current(&fields);
                next = fields.next();
                m
            },
            None | Some(Ok(Field::Comment)) if !is_mnemonic_shaped(first.text) => {
                tok.label = Some(first.text.to_uppercase());
                if next.is_some() {
                    tok.comment = Some(fields.slice().trim_end().to_string());
                }
                return Some(tok);
            },
            _ => first
        }
    };

    if !is_mnemonic_shaped(mnemonic.text) {
        return Some(tok.fail(LexErr::InvalidMnemonic));
    }
    tok.mnemonic = Some(mnemonic.text.to_uppercase());

    match next {
        None => {},
        Some(Ok(Field::Comment)) => tok.comment = Some(fields.slice().trim_end().to_string()),
        Some(_) => {
            let start = fields.span().start;
            if start == mnemonic.span.end {
                return Some(tok.fail(LexErr::MissingSeparator));
            }

            let rest = &line[start..];
            let (operands, comment) = match comment_start(rest) {
                Some(i) => (&rest[..i], Some(&rest[i..])),
                None => (rest, None),
            };
            tok.operands = operands.trim().to_string();
            tok.comment = comment.map(|c| c.trim_end().to_string());
        }
    }

    Some(tok)
}

/// Tokenizes a full source text, one [`Token`] per non-blank, non-comment line.
pub fn tokenize(src: &str, isa: &InstructionSet) -> Vec<Token> {
    src.lines()
        .enumerate()
        .filter_map(|(i, line)| tokenize_line(line, i + 1, isa))
        .collect()
}

/// A hex literal, along with how many digits it was written with.
///
/// The digit count decides between direct and extended addressing.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct HexLit {
    /// The literal's value.
    pub value: u16,
    /// The number of hex digits written.
    pub digits: usize,
}

/// A unit of operand text.
#[derive(Debug, Logos, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t]+", error = LexErr)]
pub enum Atom {
    // As with the line fields, these regexes span over some invalid text
    // (e.g., `$12G4`), which the validator then rejects.

    /// Marks an immediate operand.
    #[token("#")]
    Hash,

    /// A hex literal (e.g., `$1F`).
    #[regex(r"\$\w*", lex_hex)]
    Hex(HexLit),

    /// A binary literal (e.g., `%1010`).
    #[regex(r"%\w*", lex_bin)]
    Bin(u16),

    /// A decimal literal (e.g., `42`).
    #[regex(r"\d\w*", lex_dec)]
    Dec(u16),

    /// A character literal (e.g., `'A'`).
    #[regex(r"'[^'\n]*'?", lex_char)]
    Char(u16),

    /// A label, uppercased.
    #[regex(r"[A-Za-z_]\w*", |lx| lx.slice().to_uppercase())]
    Ident(String),

    /// Separates operands.
    #[token(",")]
    Comma,
}

/// Any errors raised in attempting to tokenize a line.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum LexErr {
    /// Numeric literal cannot fit within the range of a u16.
    DoesNotFitU16,
    /// Hex literal (starting with $) has invalid hex digits.
    InvalidHex,
    /// Hex literal (starting with $) doesn't have digits after it.
    InvalidHexEmpty,
    /// Binary literal (starting with %) has digits other than 0 and 1.
    InvalidBin,
    /// Binary literal (starting with %) doesn't have digits after it.
    InvalidBinEmpty,
    /// Numeric literal could not be parsed as a decimal literal because it has invalid digits.
    InvalidNumeric,
    /// Int parsing failed but the reason why is unknown.
    UnknownIntErr,
    /// Character literal does not hold exactly one character between quotes.
    InvalidChar,
    /// A label with a colon was followed by something other than a mnemonic or comment.
    ExpectedMnemonic,
    /// The mnemonic field is not 2 to 5 letters.
    InvalidMnemonic,
    /// The mnemonic and the operand field are not separated by whitespace.
    MissingSeparator,
    /// A symbol was used which does not start a label, mnemonic, or comment.
    #[default]
    InvalidSymbol
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::DoesNotFitU16    => f.write_str("numeric literal does not fit 16-bit unsigned integer"),
            LexErr::InvalidHex       => f.write_str("invalid hex literal"),
            LexErr::InvalidHexEmpty  => f.write_str("invalid hex literal"),
            LexErr::InvalidBin       => f.write_str("invalid binary literal"),
            LexErr::InvalidBinEmpty  => f.write_str("invalid binary literal"),
            LexErr::InvalidNumeric   => f.write_str("invalid decimal literal"),
            LexErr::UnknownIntErr    => f.write_str("could not parse integer"),
            LexErr::InvalidChar      => f.write_str("invalid character literal"),
            LexErr::ExpectedMnemonic => f.write_str("expected mnemonic after label"),
            LexErr::InvalidMnemonic  => f.write_str("invalid mnemonic"),
            LexErr::MissingSeparator => f.write_str("missing whitespace between mnemonic and operands"),
            LexErr::InvalidSymbol    => f.write_str("invalid line format"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::DoesNotFitU16    => Some(format!("the range for a 16-bit unsigned integer is [{}, {}]", u16::MIN, u16::MAX).into()),
            LexErr::InvalidHex       => Some("a hex literal starts with '$' and consists of 0-9, A-F".into()),
            LexErr::InvalidHexEmpty  => Some("there should be hex digits (0-9, A-F) here".into()),
            LexErr::InvalidBin       => Some("a binary literal starts with '%' and consists of 0 and 1".into()),
            LexErr::InvalidBinEmpty  => Some("there should be binary digits (0, 1) here".into()),
            LexErr::InvalidNumeric   => Some("a decimal literal only consists of digits 0-9".into()),
            LexErr::UnknownIntErr    => None,
            LexErr::InvalidChar      => Some("a character literal is a single character in single quotes (e.g., 'A')".into()),
            LexErr::ExpectedMnemonic => Some("a label can only be followed by a mnemonic, a pseudo-op, or a comment".into()),
            LexErr::InvalidMnemonic  => Some("mnemonics are 2 to 5 letters".into()),
            LexErr::MissingSeparator => Some("add a space after the mnemonic".into()),
            LexErr::InvalidSymbol    => Some("a line starts with a label, a mnemonic, or a comment (';' or '*')".into()),
        }
    }
}

/// Helper that converts an int error kind to its corresponding LexErr, based on the provided inputs.
fn convert_int_error(e: &IntErrorKind, invalid_digits_err: LexErr, empty_err: LexErr) -> LexErr {
    match e {
        IntErrorKind::Empty        => empty_err,
        IntErrorKind::InvalidDigit => invalid_digits_err,
        IntErrorKind::PosOverflow  => LexErr::DoesNotFitU16,
        IntErrorKind::NegOverflow  => LexErr::DoesNotFitU16,
        IntErrorKind::Zero         => unreachable!("IntErrorKind::Zero should not be emitted in parsing u16"),
        _ => LexErr::UnknownIntErr,
    }
}
fn lex_hex(lx: &Lexer<'_, Atom>) -> Result<HexLit, LexErr> {
    let Some(hex) = lx.slice().strip_prefix('$') else {
        unreachable!("Lexer slice should have contained a $");
    };

    u16::from_str_radix(hex, 16)
        .map(|value| HexLit { value, digits: hex.len() })
        .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidHex, LexErr::InvalidHexEmpty))
}
fn lex_bin(lx: &Lexer<'_, Atom>) -> Result<u16, LexErr> {
    let Some(bin) = lx.slice().strip_prefix('%') else {
        unreachable!("Lexer slice should have contained a %");
    };

    u16::from_str_radix(bin, 2)
        .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidBin, LexErr::InvalidBinEmpty))
}
fn lex_dec(lx: &Lexer<'_, Atom>) -> Result<u16, LexErr> {
    lx.slice().parse::<u16>()
        .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidNumeric, LexErr::InvalidNumeric))
}
fn lex_char(lx: &Lexer<'_, Atom>) -> Result<u16, LexErr> {
    let inner = lx.slice()
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or(LexErr::InvalidChar)?;

    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => u16::try_from(u32::from(c)).map_err(|_| LexErr::DoesNotFitU16),
        _ => Err(LexErr::InvalidChar)
    }
}
