//! Error interface for this crate.
//!
//! Each stage of the crate has its own error type:
//! - [`LexErr`]: a line or literal could not be lexed.
//! - [`ParseErr`]: a statement's mnemonic or operands could not be resolved.
//! - [`AsmErr`]: a statement could not be assembled.
//! - [`SimErr`]: execution faulted.
//!
//! All of them implement [`Error`], which adds source line and help information
//! on top of [`std::error::Error`]. [`Report`] formats both together.

use std::borrow::Cow;

pub use crate::asm::{AsmErr, AsmErrKind, ErrorClass};
pub use crate::isa::IsaErr;
pub use crate::parse::lex::LexErr;
pub use crate::parse::ParseErr;
pub use crate::sim::SimErr;

/// Unified error interface for all errors in this crate.
pub trait Error: std::error::Error {
    /// The line number (starting from 1) this error occurred on, if known.
    fn line(&self) -> Option<usize> {
        None
    }

    /// A help message to display alongside this error, if there is one.
    fn help(&self) -> Option<Cow<str>>;
}

/// Displays an error with its help message.
///
/// ```
/// use m6800_ensemble::asm::assemble;
/// use m6800_ensemble::err::Report;
///
/// let asm = assemble(" ADDB UNKNOWN");
/// let report = Report(&asm.errors[0]).to_string();
/// assert!(report.starts_with("Error (L:1): "));
/// assert!(report.contains("help: "));
/// ```
pub struct Report<'e, E: ?Sized>(pub &'e E);
impl<E: Error + ?Sized> std::fmt::Display for Report<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)?;
        if let Some(help) = self.0.help() {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}
