//! Property-based tests for assembler invariants.
//!
//! These tests check label resolution, branch encoding, and
//! instruction lengths over generated programs.

use m6800_ensemble::asm::assemble;
use m6800_ensemble::isa::{AddrMode, Descriptor, InstructionSet, Mnemonic};
use proptest::prelude::*;

/// Every mnemonic/mode pair of the instruction set.
fn all_forms() -> Vec<(Mnemonic, AddrMode, Descriptor)> {
    let isa = InstructionSet::m6800();
    Mnemonic::ALL
        .iter()
        .flat_map(|&m| isa.modes(m).iter().map(move |&(mode, desc)| (m, mode, desc)))
        .collect()
}

/// Source text for one instruction in the given mode.
fn instruction_src(m: Mnemonic, mode: AddrMode, byte: u8, word: u16) -> String {
    match mode {
        AddrMode::Implied => format!(" {m}"),
        AddrMode::Immediate if m.wide_immediate() => format!(" {m} #${word:04X}"),
        AddrMode::Immediate => format!(" {m} #${byte:02X}"),
        AddrMode::Direct => format!(" {m} ${byte:02X}"),
        AddrMode::Extended => format!(" {m} ${word:04X}"),
        AddrMode::Indexed => format!(" {m} ${byte:02X},X"),
        AddrMode::Relative => format!(" {m} NEXT\nNEXT NOP"),
    }
}

/// Decodes a relative branch at `addr` back into its target.
fn branch_target(addr: u16, offset: u8) -> u16 {
    addr.wrapping_add(2).wrapping_add(offset as i8 as u16)
}

// ========== Encoding Property Tests ==========

proptest! {
    /// Property: the bytes generated for an instruction match its descriptor's length and opcode
    #[test]
    fn prop_length_matches_descriptor(
        form in prop::sample::select(all_forms()),
        byte in 0u8..=255u8,
        word in 0x0100u16..=0xFFFFu16,
    ) {
        let (m, mode, desc) = form;
        let src = instruction_src(m, mode, byte, word);
        let asm = assemble(&src);
        prop_assert!(asm.success, "{} failed: {:?}", src, asm.error_messages());

        let (_, bytes) = asm.records().next().unwrap();
        prop_assert_eq!(bytes.len(), usize::from(desc.len), "{} ({})", m, mode);
        prop_assert_eq!(bytes[0], desc.opcode);
    }

    /// Property: a forward branch decodes back to its label
    #[test]
    fn prop_forward_branch_round_trip(origin in 0x0000u16..0xF000, gap in 0usize..=127) {
        let src = format!(" ORG ${origin:04X}\n BRA TARGET\n{}TARGET NOP\n END", " NOP\n".repeat(gap));
        let asm = assemble(&src);
        prop_assert!(asm.success, "{:?}", asm.error_messages());

        let target = asm.symbols.lookup("TARGET").unwrap();
        prop_assert_eq!(asm.object_code[0], 0x20);
        prop_assert_eq!(branch_target(origin, asm.object_code[1]), target);
    }

    /// Property: a backward branch decodes back to its label
    #[test]
    fn prop_backward_branch_round_trip(origin in 0x0000u16..0xF000, gap in 0usize..=125) {
        let src = format!(" ORG ${origin:04X}\nTARGET NOP\n{} BNE TARGET\n END", " NOP\n".repeat(gap));
        let asm = assemble(&src);
        prop_assert!(asm.success, "{:?}", asm.error_messages());

        let branch_addr = origin + 1 + gap as u16;
        let offset = *asm.object_code.last().unwrap();
        prop_assert_eq!(branch_target(branch_addr, offset), origin);
    }

    /// Property: branches one byte past the reachable range are rejected
    #[test]
    fn prop_branch_out_of_range(gap in 128usize..=200) {
        let src = format!(" BRA TARGET\n{}TARGET NOP", " NOP\n".repeat(gap));
        prop_assert!(!assemble(&src).success);
    }
}

// ========== Label Property Tests ==========

proptest! {
    /// Property: a label resolves to the same address whether it is defined before or after its use
    #[test]
    fn prop_forward_and_backward_labels(origin in 0x0100u16..0xF000, filler in 0usize..16) {
        let pad = " NOP\n".repeat(filler);
        let backward = format!(" ORG ${origin:04X}\n{pad}DATA FCB 1\n LDAA DATA\n JMP DATA");
        let forward = format!(" ORG ${origin:04X}\n{pad} LDAA DATA\n JMP DATA\nDATA FCB 1");

        for src in [backward, forward] {
            let asm = assemble(&src);
            prop_assert!(asm.success, "{:?}", asm.error_messages());

            let data = asm.symbols.lookup("DATA").unwrap();
            let [hi, lo] = data.to_be_bytes();
            let code: Vec<_> = asm.records().map(|(_, b)| b.to_vec()).collect();
            prop_assert!(code.contains(&vec![0xB6, hi, lo]), "LDAA DATA in {:02X?}", code);
            prop_assert!(code.contains(&vec![0x7E, hi, lo]), "JMP DATA in {:02X?}", code);
        }
    }

    /// Property: defining a label twice is always rejected
    #[test]
    fn prop_redefinition_rejected(value in 0u16..=0xFFFF, kind in 0usize..3) {
        let second = match kind {
            0 => "TWICE NOP".to_string(),
            1 => format!("TWICE EQU ${value:04X}"),
            _ => "TWICE ORG $2000".to_string(),
        };
        let asm = assemble(&format!("TWICE NOP\n{second}"));
        prop_assert!(!asm.success);
        prop_assert!(asm.object_code.is_empty());
    }
}
