//! Fetch, decode, and execute for the 6800.
//!
//! The [`Executor`] decodes an opcode through the reverse index of the
//! [`InstructionSet`], fetches the operand bytes its addressing mode requires,
//! and applies the instruction to a [`Cpu`].
//!
//! Flags are derived from the operand and result bits of each operation
//! rather than looked up.

use crate::isa::{AddrMode, InstructionSet, Mnemonic};

use super::mem::{Ccr, Cpu};
use super::SimErr;

/// Address of the software interrupt vector.
pub const SWI_VECTOR: u16 = 0xFFFA;

/// Anything that can cause a step to abruptly fail to finish.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StepBreak {
    /// `WAI` pushed the machine state and is waiting for an interrupt.
    Wait,
    /// A simulation error occurred.
    Err(SimErr),
}
impl From<SimErr> for StepBreak {
    fn from(value: SimErr) -> Self {
        Self::Err(value)
    }
}

/// Summary of one executed instruction.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Executed {
    /// The mnemonic that was executed.
    pub mnemonic: Mnemonic,
    /// Its addressing mode.
    pub mode: AddrMode,
    /// Cycles the instruction takes.
    pub cycles: u8,
    /// Address of the opcode byte.
    pub addr: u16,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Acc { A, B }
impl Acc {
    fn get(self, cpu: &Cpu) -> u8 {
        match self {
            Acc::A => cpu.a,
            Acc::B => cpu.b,
        }
    }
    fn set(self, cpu: &mut Cpu, value: u8) {
        match self {
            Acc::A => cpu.a = value,
            Acc::B => cpu.b = value,
        }
    }
}

/// The accumulator a mnemonic operates on, if it names one.
fn accumulator(mnemonic: Mnemonic) -> Option<Acc> {
    use Mnemonic::*;

    match mnemonic {
        ADCA | ADDA | ANDA | ASLA | ASRA | BITA | CLRA | CMPA | COMA | DECA | EORA | INCA | LDAA
        | LSRA | NEGA | ORAA | PSHA | PULA | ROLA | RORA | SBCA | STAA | SUBA | TSTA => Some(Acc::A),
        ADCB | ADDB | ANDB | ASLB | ASRB | BITB | CLRB | CMPB | COMB | DECB | EORB | INCB | LDAB
        | LSRB | NEGB | ORAB | PSHB | PULB | ROLB | RORB | SBCB | STAB | SUBB | TSTB => Some(Acc::B),
        _ => None,
    }
}

/// 8-bit add with carry in. Sets H, N, Z, V, C.
pub fn add8(ccr: &mut Ccr, a: u8, m: u8, carry: bool) -> u8 {
    let sum = u16::from(a) + u16::from(m) + u16::from(carry);
    let r = sum as u8;

    ccr.h = (a & 0x0F) + (m & 0x0F) + u8::from(carry) > 0x0F;
    ccr.set_nz(r);
    ccr.v = (a ^ r) & (m ^ r) & 0x80 != 0;
    ccr.c = sum > 0xFF;
    r
}

/// 8-bit subtract with borrow in. Sets N, Z, V, C.
pub fn sub8(ccr: &mut Ccr, a: u8, m: u8, borrow: bool) -> u8 {
    let r = a.wrapping_sub(m).wrapping_sub(u8::from(borrow));

    ccr.set_nz(r);
    ccr.v = (a ^ m) & (a ^ r) & 0x80 != 0;
    ccr.c = u16::from(m) + u16::from(borrow) > u16::from(a);
    r
}

/// Decimal adjust of A after a BCD add.
pub fn daa(ccr: &mut Ccr, a: u8) -> u8 {
    let lo = a & 0x0F;
    let hi = a >> 4;

    let mut correction = 0u8;
    let mut carry = ccr.c;
    if ccr.h || lo > 9 {
        correction |= 0x06;
    }
    if ccr.c || hi > 9 || (hi >= 9 && lo > 9) {
        correction |= 0x60;
        carry = true;
    }

    let r = a.wrapping_add(correction);
    ccr.set_nz(r);
    ccr.v = (a ^ r) & (correction ^ r) & 0x80 != 0;
    ccr.c = carry;
    r
}

fn logic(ccr: &mut Ccr, r: u8) -> u8 {
    ccr.set_nz(r);
    ccr.v = false;
    r
}

fn shifted(ccr: &mut Ccr, r: u8, carry: bool) -> u8 {
    ccr.set_nz(r);
    ccr.c = carry;
    ccr.v = ccr.n ^ ccr.c;
    r
}

fn asl(ccr: &mut Ccr, m: u8) -> u8 { shifted(ccr, m << 1, m & 0x80 != 0) }
fn asr(ccr: &mut Ccr, m: u8) -> u8 { shifted(ccr, (m >> 1) | (m & 0x80), m & 1 != 0) }
fn lsr(ccr: &mut Ccr, m: u8) -> u8 { shifted(ccr, m >> 1, m & 1 != 0) }
fn rol(ccr: &mut Ccr, m: u8) -> u8 {
    let r = (m << 1) | u8::from(ccr.c);
    shifted(ccr, r, m & 0x80 != 0)
}
fn ror(ccr: &mut Ccr, m: u8) -> u8 {
    let r = (m >> 1) | (u8::from(ccr.c) << 7);
    shifted(ccr, r, m & 1 != 0)
}
fn neg(ccr: &mut Ccr, m: u8) -> u8 {
    let r = 0u8.wrapping_sub(m);
    ccr.set_nz(r);
    ccr.v = r == 0x80;
    ccr.c = r != 0;
    r
}
fn com(ccr: &mut Ccr, m: u8) -> u8 {
    let r = !m;
    ccr.set_nz(r);
    ccr.v = false;
    ccr.c = true;
    r
}
fn clr(ccr: &mut Ccr, _: u8) -> u8 {
    ccr.n = false;
    ccr.z = true;
    ccr.v = false;
    ccr.c = false;
    0
}
fn inc(ccr: &mut Ccr, m: u8) -> u8 {
    let r = m.wrapping_add(1);
    ccr.set_nz(r);
    ccr.v = m == 0x7F;
    r
}
fn dec(ccr: &mut Ccr, m: u8) -> u8 {
    let r = m.wrapping_sub(1);
    ccr.set_nz(r);
    ccr.v = m == 0x80;
    r
}
fn tst(ccr: &mut Ccr, m: u8) -> u8 {
    ccr.set_nz(m);
    ccr.v = false;
    ccr.c = false;
    m
}

/// Whether a conditional branch is taken under the given flags.
pub fn branch_taken(mnemonic: Mnemonic, ccr: &Ccr) -> bool {
    use Mnemonic::*;

    let lt = ccr.n ^ ccr.v;
    match mnemonic {
        BRA | BSR => true,
        BCC => !ccr.c,
        BCS => ccr.c,
        BEQ => ccr.z,
        BNE => !ccr.z,
        BGE => !lt,
        BLT => lt,
        BGT => !(ccr.z || lt),
        BLE => ccr.z || lt,
        BHI => !(ccr.c || ccr.z),
        BLS => ccr.c || ccr.z,
        BMI => ccr.n,
        BPL => !ccr.n,
        BVC => !ccr.v,
        BVS => ccr.v,
        _ => false,
    }
}

/// Executes instructions on a [`Cpu`].
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    isa: &'static InstructionSet,
}
impl Default for Executor {
    fn default() -> Self {
        Self::new(InstructionSet::m6800())
    }
}
impl Executor {
    /// Creates an executor over the given instruction set.
    pub fn new(isa: &'static InstructionSet) -> Self {
        Self { isa }
    }

    /// Fetches, decodes, and executes one instruction at PC.
    ///
    /// An opcode with no entry in the instruction set fails with [`SimErr::UnknownOpcode`].
    /// PC is left past the offending byte.
    pub fn step(&self, cpu: &mut Cpu) -> Result<Executed, StepBreak> {
        let addr = cpu.pc;
        let opcode = cpu.fetch();
        let entry = *self.isa.decode(opcode)
            .ok_or(SimErr::UnknownOpcode { opcode, addr })?;

        execute(cpu, entry.mnemonic, entry.mode)?;
        Ok(Executed {
            mnemonic: entry.mnemonic,
            mode: entry.mode,
            cycles: entry.desc.cycles,
            addr,
        })
    }
}

/// Fetches the operand of a memory-referencing mode and computes its address.
fn effective_addr(cpu: &mut Cpu, mode: AddrMode) -> Result<u16, SimErr> {
    match mode {
        AddrMode::Direct   => Ok(u16::from(cpu.fetch())),
        AddrMode::Extended => Ok(cpu.fetch_word()),
        AddrMode::Indexed  => {
            let off = cpu.fetch();
            Ok(cpu.x.wrapping_add(u16::from(off)))
        },
        m => Err(SimErr::InvalidMode(m)),
    }
}

/// Fetches an 8-bit operand value.
fn operand8(cpu: &mut Cpu, mode: AddrMode) -> Result<u8, SimErr> {
    match mode {
        AddrMode::Immediate => Ok(cpu.fetch()),
        m => {
            let ea = effective_addr(cpu, m)?;
            Ok(cpu.mem.read(ea))
        }
    }
}

/// Fetches a 16-bit operand value.
fn operand16(cpu: &mut Cpu, mode: AddrMode) -> Result<u16, SimErr> {
    match mode {
        AddrMode::Immediate => Ok(cpu.fetch_word()),
        m => {
            let ea = effective_addr(cpu, m)?;
            cpu.mem.read_word(ea)
        }
    }
}

/// Applies a read-modify-write operation to an accumulator or to memory.
fn modify(cpu: &mut Cpu, mnemonic: Mnemonic, mode: AddrMode, op: fn(&mut Ccr, u8) -> u8) -> Result<(), SimErr> {
    match accumulator(mnemonic) {
        Some(acc) => {
            let m = acc.get(cpu);
            let r = op(&mut cpu.ccr, m);
            acc.set(cpu, r);
        },
        None => {
            let ea = effective_addr(cpu, mode)?;
            let r = op(&mut cpu.ccr, cpu.mem.read(ea));
            cpu.mem.write(ea, r);
        }
    }
    Ok(())
}

fn push_state(cpu: &mut Cpu) {
    cpu.push_word(cpu.pc);
    cpu.push_word(cpu.x);
    cpu.push_byte(cpu.a);
    cpu.push_byte(cpu.b);
    cpu.push_byte(cpu.ccr.to_byte());
}

fn execute(cpu: &mut Cpu, mnemonic: Mnemonic, mode: AddrMode) -> Result<(), StepBreak> {
    use Mnemonic::*;

    let acc = accumulator(mnemonic).unwrap_or(Acc::A);
    match mnemonic {
        ABA => cpu.a = add8(&mut cpu.ccr, cpu.a, cpu.b, false),
        SBA => cpu.a = sub8(&mut cpu.ccr, cpu.a, cpu.b, false),
        CBA => { sub8(&mut cpu.ccr, cpu.a, cpu.b, false); },
        ADDA | ADDB | ADCA | ADCB => {
            let m = operand8(cpu, mode)?;
            let lhs = acc.get(cpu);
            let carry = matches!(mnemonic, ADCA | ADCB) && cpu.ccr.c;
            let r = add8(&mut cpu.ccr, lhs, m, carry);
            acc.set(cpu, r);
        },
        SUBA | SUBB | SBCA | SBCB => {
            let m = operand8(cpu, mode)?;
            let lhs = acc.get(cpu);
            let borrow = matches!(mnemonic, SBCA | SBCB) && cpu.ccr.c;
            let r = sub8(&mut cpu.ccr, lhs, m, borrow);
            acc.set(cpu, r);
        },
        CMPA | CMPB => {
            let m = operand8(cpu, mode)?;
            let lhs = acc.get(cpu);
            sub8(&mut cpu.ccr, lhs, m, false);
        },
        ANDA | ANDB | BITA | BITB => {
            let m = operand8(cpu, mode)?;
            let lhs = acc.get(cpu);
            let r = logic(&mut cpu.ccr, lhs & m);
            if matches!(mnemonic, ANDA | ANDB) {
                acc.set(cpu, r);
            }
        },
        ORAA | ORAB => {
            let m = operand8(cpu, mode)?;
            let lhs = acc.get(cpu);
            let r = logic(&mut cpu.ccr, lhs | m);
            acc.set(cpu, r);
        },
        EORA | EORB => {
            let m = operand8(cpu, mode)?;
            let lhs = acc.get(cpu);
            let r = logic(&mut cpu.ccr, lhs ^ m);
            acc.set(cpu, r);
        },
        LDAA | LDAB => {
            let m = operand8(cpu, mode)?;
            let r = logic(&mut cpu.ccr, m);
            acc.set(cpu, r);
        },
        STAA | STAB => {
            let ea = effective_addr(cpu, mode)?;
            let lhs = acc.get(cpu);
            let r = logic(&mut cpu.ccr, lhs);
            cpu.mem.write(ea, r);
        },
        DAA => cpu.a = daa(&mut cpu.ccr, cpu.a),

        ASL | ASLA | ASLB => modify(cpu, mnemonic, mode, asl)?,
        ASR | ASRA | ASRB => modify(cpu, mnemonic, mode, asr)?,
        LSR | LSRA | LSRB => modify(cpu, mnemonic, mode, lsr)?,
        ROL | ROLA | ROLB => modify(cpu, mnemonic, mode, rol)?,
        ROR | RORA | RORB => modify(cpu, mnemonic, mode, ror)?,
        NEG | NEGA | NEGB => modify(cpu, mnemonic, mode, neg)?,
        COM | COMA | COMB => modify(cpu, mnemonic, mode, com)?,
        CLR | CLRA | CLRB => modify(cpu, mnemonic, mode, clr)?,
        INC | INCA | INCB => modify(cpu, mnemonic, mode, inc)?,
        DEC | DECA | DECB => modify(cpu, mnemonic, mode, dec)?,
        TST | TSTA | TSTB => modify(cpu, mnemonic, mode, tst)?,

        LDX | LDS => {
            let m = operand16(cpu, mode)?;
            cpu.ccr.set_nz16(m);
            cpu.ccr.v = false;
            match mnemonic {
                LDX => cpu.x = m,
                _   => cpu.sp = m,
            }
        },
        STX | STS => {
            let ea = effective_addr(cpu, mode)?;
            let value = match mnemonic {
                STX => cpu.x,
                _   => cpu.sp,
            };
            cpu.mem.write_word(ea, value)?;
            cpu.ccr.set_nz16(value);
            cpu.ccr.v = false;
        },
        CPX => {
            let m = operand16(cpu, mode)?;
            let r = cpu.x.wrapping_sub(m);
            cpu.ccr.set_nz16(r);
            cpu.ccr.v = (cpu.x ^ m) & (cpu.x ^ r) & 0x8000 != 0;
        },
        INX => {
            cpu.x = cpu.x.wrapping_add(1);
            cpu.ccr.z = cpu.x == 0;
        },
        DEX => {
            cpu.x = cpu.x.wrapping_sub(1);
            cpu.ccr.z = cpu.x == 0;
        },
        INS => cpu.sp = cpu.sp.wrapping_add(1),
        DES => cpu.sp = cpu.sp.wrapping_sub(1),
        TSX => cpu.x = cpu.sp.wrapping_add(1),
        TXS => cpu.sp = cpu.x.wrapping_sub(1),

        TAB => cpu.b = logic(&mut cpu.ccr, cpu.a),
        TBA => cpu.a = logic(&mut cpu.ccr, cpu.b),
        TAP => cpu.ccr = Ccr::from_byte(cpu.a),
        TPA => cpu.a = cpu.ccr.to_byte(),
        PSHA | PSHB => cpu.push_byte(acc.get(cpu)),
        PULA | PULB => {
            let v = cpu.pop_byte();
            acc.set(cpu, v);
        },

        CLC => cpu.ccr.c = false,
        SEC => cpu.ccr.c = true,
        CLV => cpu.ccr.v = false,
        SEV => cpu.ccr.v = true,
        CLI => cpu.ccr.i = false,
        SEI => cpu.ccr.i = true,
        NOP => {},

        BCC | BCS | BEQ | BGE | BGT | BHI | BLE | BLS | BLT | BMI | BNE | BPL | BRA | BSR | BVC | BVS => {
            let offset = cpu.fetch() as i8;
            let target = cpu.pc.wrapping_add(offset as u16);
            if mnemonic == BSR {
                cpu.push_word(cpu.pc);
            }
            if branch_taken(mnemonic, &cpu.ccr) {
                cpu.pc = target;
            }
        },
        JMP => cpu.pc = effective_addr(cpu, mode)?,
        JSR => {
            let ea = effective_addr(cpu, mode)?;
            cpu.push_word(cpu.pc);
            cpu.pc = ea;
        },
        RTS => cpu.pc = cpu.pop_word(),
        RTI => {
            cpu.ccr = Ccr::from_byte(cpu.pop_byte());
            cpu.b = cpu.pop_byte();
            cpu.a = cpu.pop_byte();
            cpu.x = cpu.pop_word();
            cpu.pc = cpu.pop_word();
        },
        SWI => {
            push_state(cpu);
            cpu.ccr.i = true;
            cpu.pc = cpu.mem.read_word(SWI_VECTOR)?;
        },
        WAI => if !cpu.ccr.i {
            push_state(cpu);
            return Err(StepBreak::Wait);
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::isa::{AddrMode, Mnemonic};
    use crate::sim::mem::{Ccr, Cpu};
    use crate::sim::SimErr;

    use super::{add8, branch_taken, daa, sub8, Executor, StepBreak};

    /// Loads the bytes at 0x0100 and executes `steps` instructions.
    fn run_bytes(bytes: &[u8], steps: usize) -> Cpu {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, bytes).unwrap();
        cpu.pc = 0x0100;

        let exec = Executor::default();
        for _ in 0..steps {
            exec.step(&mut cpu).unwrap();
        }
        cpu
    }

    #[test]
    fn test_add_sub_exhaustive() {
        for carry in [false, true] {
            let cin = u8::from(carry);
            for a in 0..=255u8 {
                for m in 0..=255u8 {
                    let mut ccr = Ccr::default();
                    let r = add8(&mut ccr, a, m, carry);
                    let wide = u16::from(a) + u16::from(m) + u16::from(cin);
                    let signed = i16::from(a as i8) + i16::from(m as i8) + i16::from(cin);
                    assert_eq!(r, wide as u8);
                    assert_eq!(ccr.c, wide > 0xFF, "add {a:02X} {m:02X} {cin} C");
                    assert_eq!(ccr.v, !(-128..=127).contains(&signed), "add {a:02X} {m:02X} {cin} V");
                    assert_eq!(ccr.n, r & 0x80 != 0);
                    assert_eq!(ccr.z, r == 0);
                    assert_eq!(ccr.h, (a & 0xF) + (m & 0xF) + cin > 0xF, "add {a:02X} {m:02X} {cin} H");

                    let mut ccr = Ccr::default();
                    let r = sub8(&mut ccr, a, m, carry);
                    let wide = i16::from(a) - i16::from(m) - i16::from(cin);
                    let signed = i16::from(a as i8) - i16::from(m as i8) - i16::from(cin);
                    assert_eq!(r, wide as u8);
                    assert_eq!(ccr.c, wide < 0, "sub {a:02X} {m:02X} {cin} C");
                    assert_eq!(ccr.v, !(-128..=127).contains(&signed), "sub {a:02X} {m:02X} {cin} V");
                    assert_eq!(ccr.n, r & 0x80 != 0);
                    assert_eq!(ccr.z, r == 0);
                }
            }
        }
    }

    #[test]
    fn test_carry_in() {
        let mut ccr = Ccr::default();
        assert_eq!(add8(&mut ccr, 0xFF, 0x00, true), 0x00);
        assert!(ccr.c && ccr.z && ccr.h);

        let mut ccr = Ccr::default();
        assert_eq!(sub8(&mut ccr, 0x00, 0x00, true), 0xFF);
        assert!(ccr.c && ccr.n);

        // SEC; LDAA #$7F; ADCA #$00
        let cpu = run_bytes(&[0x0D, 0x86, 0x7F, 0x89, 0x00], 3);
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.ccr.v && cpu.ccr.n && cpu.ccr.h);
        assert!(!cpu.ccr.c && !cpu.ccr.z);

        // SEC; LDAA #$80; SBCA #$00
        let cpu = run_bytes(&[0x0D, 0x86, 0x80, 0x82, 0x00], 3);
        assert_eq!(cpu.a, 0x7F);
        assert!(cpu.ccr.v);
        assert!(!cpu.ccr.c && !cpu.ccr.n);

        // SEC; LDAB #$FF; ADCB #$FF
        let cpu = run_bytes(&[0x0D, 0xC6, 0xFF, 0xC9, 0xFF], 3);
        assert_eq!(cpu.b, 0xFF);
        assert!(cpu.ccr.c && cpu.ccr.h && cpu.ccr.n);
        assert!(!cpu.ccr.v);

        // SEC; LDAB #$00; SBCB #$FF
        let cpu = run_bytes(&[0x0D, 0xC6, 0x00, 0xC2, 0xFF], 3);
        assert_eq!(cpu.b, 0x00);
        assert!(cpu.ccr.c && cpu.ccr.z);
        assert!(!cpu.ccr.v);

        // carry clear: ADCA adds nothing extra
        let cpu = run_bytes(&[0x0C, 0x86, 0x7F, 0x89, 0x00], 3);
        assert_eq!(cpu.a, 0x7F);
        assert!(!cpu.ccr.v);
    }

    #[test]
    fn test_daa() {
        let cases = [
            // (a, h, c, result, carry)
            (0x3C, false, false, 0x42, false),
            (0x9A, false, false, 0x00, true),
            (0x12, true,  false, 0x18, false),
            (0xA0, false, false, 0x00, true),
            (0x8A, false, false, 0x90, false),
            (0x15, false, true,  0x75, true),
        ];
        for (a, h, c, result, carry) in cases {
            let mut ccr = Ccr { h, c, ..Default::default() };
            assert_eq!(daa(&mut ccr, a), result, "DAA {a:02X}");
            assert_eq!(ccr.c, carry, "DAA {a:02X} carry");
        }

        // 0x38 + 0x45 = 0x83 in BCD
        let cpu = run_bytes(&[0x86, 0x38, 0x8B, 0x45, 0x19], 3);
        assert_eq!(cpu.a, 0x83);
        assert!(!cpu.ccr.c);
    }

    #[test]
    fn test_loads_stores() {
        // LDAA #$80; STAA $20; LDAB $20; LDX #$1234; STX $0300
        let cpu = run_bytes(&[0x86, 0x80, 0x97, 0x20, 0xD6, 0x20, 0xCE, 0x12, 0x34, 0xFF, 0x03, 0x00], 5);
        assert_eq!(cpu.mem.read(0x20), 0x80);
        assert_eq!(cpu.b, 0x80);
        assert!(!cpu.ccr.n && !cpu.ccr.v);
        assert_eq!(cpu.x, 0x1234);
        assert_eq!(cpu.mem.read_word(0x0300), Ok(0x1234));
    }

    #[test]
    fn test_indexed_wraps() {
        // LDX #$FFFF; LDAA 2,X
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0xCE, 0xFF, 0xFF, 0xA6, 0x02]).unwrap();
        cpu.mem.write(0x0001, 0x42);
        cpu.pc = 0x0100;
        let exec = Executor::default();
        exec.step(&mut cpu).unwrap();
        exec.step(&mut cpu).unwrap();
        assert_eq!(cpu.a, 0x42);
    }

    #[test]
    fn test_unary() {
        let mut ccr = Ccr::default();
        assert_eq!(super::inc(&mut ccr, 0x7F), 0x80);
        assert!(ccr.v && ccr.n);
        assert_eq!(super::dec(&mut ccr, 0x80), 0x7F);
        assert!(ccr.v && !ccr.n);

        let mut ccr = Ccr::default();
        assert_eq!(super::neg(&mut ccr, 0x80), 0x80);
        assert!(ccr.v && ccr.c);
        assert_eq!(super::neg(&mut ccr, 0x00), 0x00);
        assert!(!ccr.v && !ccr.c && ccr.z);

        let mut ccr = Ccr::default();
        assert_eq!(super::com(&mut ccr, 0xF0), 0x0F);
        assert!(ccr.c && !ccr.v);

        let mut ccr = Ccr { n: true, v: true, c: true, ..Default::default() };
        assert_eq!(super::clr(&mut ccr, 0x55), 0);
        assert!(ccr.z && !ccr.n && !ccr.v && !ccr.c);

        let mut ccr = Ccr { v: true, c: true, ..Default::default() };
        assert_eq!(super::tst(&mut ccr, 0x90), 0x90);
        assert!(ccr.n && !ccr.v && !ccr.c);
    }

    #[test]
    fn test_shifts() {
        let mut ccr = Ccr::default();
        assert_eq!(super::asl(&mut ccr, 0x81), 0x02);
        assert!(ccr.c && !ccr.n && ccr.v);

        assert_eq!(super::asr(&mut ccr, 0x81), 0xC0);
        assert!(ccr.c && ccr.n && !ccr.v);

        assert_eq!(super::lsr(&mut ccr, 0x01), 0x00);
        assert!(ccr.c && ccr.z && !ccr.n && ccr.v);

        let mut ccr = Ccr { c: true, ..Default::default() };
        assert_eq!(super::rol(&mut ccr, 0x40), 0x81);
        assert!(!ccr.c && ccr.n && ccr.v);

        let mut ccr = Ccr { c: true, ..Default::default() };
        assert_eq!(super::ror(&mut ccr, 0x01), 0x80);
        assert!(ccr.c && ccr.n && !ccr.v);
    }

    #[test]
    fn test_memory_rmw() {
        // INC $0040 (extended); COM 0,X
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0x7C, 0x00, 0x40, 0x63, 0x00]).unwrap();
        cpu.mem.write(0x0040, 0x09);
        cpu.x = 0x0040;
        cpu.pc = 0x0100;
        let exec = Executor::default();
        exec.step(&mut cpu).unwrap();
        exec.step(&mut cpu).unwrap();
        assert_eq!(cpu.mem.read(0x0040), !0x0A);
    }

    #[test]
    fn test_branch_conditions() {
        use Mnemonic::*;

        let flags = |n, z, v, c| Ccr { n, z, v, c, ..Default::default() };
        let zero = flags(false, true, false, false);
        assert!(branch_taken(BEQ, &zero));
        assert!(!branch_taken(BNE, &zero));
        assert!(branch_taken(BLE, &zero));
        assert!(!branch_taken(BGT, &zero));
        assert!(branch_taken(BLS, &zero));
        assert!(!branch_taken(BHI, &zero));

        // N != V: less than
        let lt = flags(true, false, false, false);
        assert!(branch_taken(BLT, &lt));
        assert!(!branch_taken(BGE, &lt));
        assert!(branch_taken(BMI, &lt));
        let ge = flags(true, false, true, false);
        assert!(branch_taken(BGE, &ge));
        assert!(branch_taken(BGT, &ge));
        assert!(branch_taken(BVS, &ge));

        let carry = flags(false, false, false, true);
        assert!(branch_taken(BCS, &carry));
        assert!(!branch_taken(BCC, &carry));
        assert!(!branch_taken(BHI, &carry));
        assert!(branch_taken(BPL, &carry));
        assert!(branch_taken(BVC, &carry));
        assert!(branch_taken(BRA, &carry));
    }

    #[test]
    fn test_branch_backward() {
        // LDAA #$05; DECA; BNE -3
        let mut cpu = run_bytes(&[0x86, 0x05, 0x4A, 0x26, 0xFD], 3);
        assert_eq!(cpu.pc, 0x0102);
        let exec = Executor::default();
        for _ in 0..8 {
            exec.step(&mut cpu).unwrap();
        }
        assert_eq!(cpu.a, 0);
        assert_eq!(cpu.pc, 0x0105);
    }

    #[test]
    fn test_subroutines() {
        // 0100: JSR $0110; 0103: NOP; 0110: BSR +1; 0112: NOP; 0113: RTS
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0xBD, 0x01, 0x10, 0x01]).unwrap();
        cpu.mem.load(0x0110, &[0x8D, 0x01, 0x01, 0x39]).unwrap();
        cpu.pc = 0x0100;
        let exec = Executor::default();

        exec.step(&mut cpu).unwrap();
        assert_eq!(cpu.pc, 0x0110);
        assert_eq!(cpu.sp, 0x01FD);
        assert_eq!(cpu.mem.read_word(0x01FE), Ok(0x0103));

        exec.step(&mut cpu).unwrap();
        assert_eq!(cpu.pc, 0x0113);
        assert_eq!(cpu.sp, 0x01FB);

        exec.step(&mut cpu).unwrap(); // RTS to 0112
        assert_eq!(cpu.pc, 0x0112);
        exec.step(&mut cpu).unwrap(); // NOP
        exec.step(&mut cpu).unwrap(); // RTS to 0103
        assert_eq!(cpu.pc, 0x0103);
        assert_eq!(cpu.sp, 0x01FF);
    }

    #[test]
    fn test_swi_rti() {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0x3F]).unwrap();
        cpu.mem.load(0x0200, &[0x3B]).unwrap();
        cpu.mem.write_word(0xFFFA, 0x0200).unwrap();
        cpu.pc = 0x0100;
        cpu.a = 0x11;
        cpu.b = 0x22;
        cpu.x = 0x3344;
        cpu.ccr.c = true;
        let exec = Executor::default();

        exec.step(&mut cpu).unwrap();
        assert_eq!(cpu.pc, 0x0200);
        assert_eq!(cpu.sp, 0x01F8);
        assert!(cpu.ccr.i);
        assert_eq!(cpu.mem.read(0x01F9), 0xC1);
        assert_eq!(cpu.mem.read(0x01FA), 0x22);
        assert_eq!(cpu.mem.read(0x01FB), 0x11);
        assert_eq!(cpu.mem.read_word(0x01FC), Ok(0x3344));
        assert_eq!(cpu.mem.read_word(0x01FE), Ok(0x0101));

        cpu.a = 0;
        cpu.x = 0;
        exec.step(&mut cpu).unwrap();
        assert_eq!((cpu.a, cpu.b, cpu.x, cpu.pc, cpu.sp), (0x11, 0x22, 0x3344, 0x0101, 0x01FF));
        assert!(cpu.ccr.c && !cpu.ccr.i);
    }

    #[test]
    fn test_wai() {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0x3E, 0x3E]).unwrap();
        cpu.pc = 0x0100;
        let exec = Executor::default();

        assert_eq!(exec.step(&mut cpu), Err(StepBreak::Wait));
        assert_eq!(cpu.sp, 0x01F8);

        // masked: no-op
        cpu.ccr.i = true;
        let sp = cpu.sp;
        assert!(exec.step(&mut cpu).is_ok());
        assert_eq!(cpu.sp, sp);
    }

    #[test]
    fn test_transfers() {
        // LDS #$0100; TSX; TXS; LDAA #$3F; TAP; TPA; TAB
        let cpu = run_bytes(&[0x8E, 0x01, 0x00, 0x30, 0x35, 0x86, 0x3F, 0x06, 0x07, 0x16], 7);
        assert_eq!(cpu.x, 0x0101);
        assert_eq!(cpu.sp, 0x0100);
        assert_eq!(cpu.a, 0xFF);
        assert_eq!(cpu.b, 0xFF);
        assert!(cpu.ccr.h && cpu.ccr.i && cpu.ccr.n && !cpu.ccr.z);
    }

    #[test]
    fn test_index_flags() {
        // LDX #$0001; DEX; CPX #$0000
        let cpu = run_bytes(&[0xCE, 0x00, 0x01, 0x09, 0x8C, 0x00, 0x00], 2);
        assert_eq!(cpu.x, 0);
        assert!(cpu.ccr.z);

        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0x8C, 0x80, 0x00]).unwrap();
        cpu.pc = 0x0100;
        cpu.x = 0x7FFF;
        cpu.ccr.c = true;
        Executor::default().step(&mut cpu).unwrap();
        assert!(cpu.ccr.v && cpu.ccr.n && !cpu.ccr.z);
        assert!(cpu.ccr.c, "CPX leaves C alone");
    }

    #[test]
    fn test_step_report() {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0xB6, 0x12, 0x34]).unwrap();
        cpu.pc = 0x0100;
        let done = Executor::default().step(&mut cpu).unwrap();
        assert_eq!(done.mnemonic, Mnemonic::LDAA);
        assert_eq!(done.mode, AddrMode::Extended);
        assert_eq!(done.cycles, 4);
        assert_eq!(done.addr, 0x0100);
        assert_eq!(cpu.pc, 0x0103);
    }

    #[test]
    fn test_unknown_opcode() {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.pc = 0x0200;
        assert_eq!(
            Executor::default().step(&mut cpu),
            Err(StepBreak::Err(SimErr::UnknownOpcode { opcode: 0x00, addr: 0x0200 }))
        );
    }

    #[test]
    fn test_word_fault() {
        // LDX $FFFF
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0xFE, 0xFF, 0xFF]).unwrap();
        cpu.pc = 0x0100;
        assert_eq!(
            Executor::default().step(&mut cpu),
            Err(StepBreak::Err(SimErr::AddressOutOfRange(0x10000)))
        );
    }
}
