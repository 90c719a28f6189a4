//! A Motorola 6800 assembler and simulator.
//!
//! This is meant to be the core of a teaching environment for 6800 assembly:
//! source text goes in, and a listing, object code, and a steppable CPU come out.
//!
//! # Usage
//!
//! To convert 6800 source code to object code, assemble it:
//! ```
//! use m6800_ensemble::asm::assemble;
//!
//! let code = "
//!     START EQU $0100
//!           ORG START
//!     LOOP  LDAA #$05
//!           DECA
//!           BNE LOOP
//!           END
//! ";
//! let asm = assemble(code);
//! assert!(asm.success);
//! assert_eq!(asm.object_code, [0x86, 0x05, 0x4A, 0x26, 0xFC]);
//!
//! for row in &asm.listing {
//!     println!("{row}");
//! }
//! ```
//!
//! Assembly never stops at the first error. Every diagnosable problem is
//! reported in [`asm::Assembly::errors`], with its line number:
//! ```
//! # use m6800_ensemble::asm::assemble;
//! let asm = assemble(" ADDB UNKNOWN");
//! assert!(!asm.success);
//! assert!(asm.object_code.is_empty());
//! assert_eq!(asm.error_messages(), ["Error (L:1): Undefined symbol: 'UNKNOWN' -> 'ADDB UNKNOWN'"]);
//! ```
//!
//! Once assembled, the code can be executed with the simulator:
//! ```
//! # use m6800_ensemble::asm::assemble;
//! # let asm = assemble(" ORG $0100\n LDAA #$10\n LDAB #$20\n ABA\n SWI\n END");
//! use m6800_ensemble::sim::Simulator;
//!
//! let mut simulator = Simulator::new(Default::default());
//! simulator.load_assembly(&asm);
//! simulator.run();
//! println!("{}", simulator.snapshot());
//! ```
//!
//! See the [`sim`] module for stepping and breakpoints.
#![warn(missing_docs)]

pub mod isa;
pub mod parse;
pub mod asm;
pub mod sim;
pub mod err;
