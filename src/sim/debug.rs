//! Breakpoints for the simulator.
//!
//! A [`Breakpoint`] in the [`Simulator`]'s breakpoint set is checked after every step.
//! [`Simulator::add_breakpoint`] covers the common case of breaking at an address.
//!
//! [`Simulator`]: super::Simulator
//! [`Simulator::add_breakpoint`]: super::Simulator::add_breakpoint
use super::mem::Cpu;

/// A register of the 6800 that a breakpoint can watch.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum Reg {
    /// Accumulator A.
    A,
    /// Accumulator B.
    B,
    /// Index register.
    X,
    /// Stack pointer.
    SP,
    /// Condition code register, as its packed byte.
    CCR,
}
impl Reg {
    /// Reads the register's current value.
    pub fn read(self, cpu: &Cpu) -> u16 {
        match self {
            Reg::A   => u16::from(cpu.a),
            Reg::B   => u16::from(cpu.b),
            Reg::X   => cpu.x,
            Reg::SP  => cpu.sp,
            Reg::CCR => u16::from(cpu.ccr.to_byte()),
        }
    }
}
impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reg::A   => f.write_str("A"),
            Reg::B   => f.write_str("B"),
            Reg::X   => f.write_str("X"),
            Reg::SP  => f.write_str("SP"),
            Reg::CCR => f.write_str("CCR"),
        }
    }
}

/// A condition that stops execution.
///
/// [`Breakpoint::PC`] is the usual kind; the others watch machine state
/// and fire after any step that leaves it matching.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub enum Breakpoint {
    /// PC holds this address, i.e. the instruction there is about to execute.
    PC(u16),

    /// A register's value satisfies the comparator.
    Reg {
        /// Register to watch.
        reg: Reg,
        /// Condition on its value.
        value: Comparator
    },
    /// The byte at an address satisfies the comparator.
    Mem {
        /// Address to watch.
        addr: u16,
        /// Condition on its value.
        value: Comparator
    },
}

impl Breakpoint where Breakpoint: Send + Sync {}

impl Breakpoint {
    /// Whether the CPU state matches this breakpoint.
    pub fn check(&self, cpu: &Cpu) -> bool {
        match *self {
            Breakpoint::PC(addr) => cpu.pc == addr,
            Breakpoint::Reg { reg, value } => value.check(reg.read(cpu)),
            Breakpoint::Mem { addr, value } => value.check(u16::from(cpu.mem.read(addr))),
        }
    }
}
impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Breakpoint::PC(addr) => write!(f, "PC == ${addr:04X}"),
            Breakpoint::Reg { reg, value } => write!(f, "{reg} {value}"),
            Breakpoint::Mem { addr, value } => write!(f, "mem[${addr:04X}] {value}"),
        }
    }
}
impl std::fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Breakpoint({self})")
    }
}

/// A test against a watched value.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum Comparator {
    /// value == n
    Eq(u16),
    /// value != n
    Ne(u16),
    /// value < n
    Lt(u16),
    /// value <= n
    Le(u16),
    /// value > n
    Gt(u16),
    /// value >= n
    Ge(u16),
    /// The bits of `mask` in the value equal `bits`.
    ///
    /// With [`Reg::CCR`], this can watch individual flags:
    /// `Mask { mask: 0x04, bits: 0x04 }` fires when Z is set.
    Mask {
        /// Bits to test.
        mask: u16,
        /// Expected state of the tested bits.
        bits: u16
    },
}
impl Comparator {
    /// Whether `value` passes this test.
    pub fn check(self, value: u16) -> bool {
        match self {
            Comparator::Eq(n) => value == n,
            Comparator::Ne(n) => value != n,
            Comparator::Lt(n) => value < n,
            Comparator::Le(n) => value <= n,
            Comparator::Gt(n) => value > n,
            Comparator::Ge(n) => value >= n,
            Comparator::Mask { mask, bits } => value & mask == bits & mask,
        }
    }
}
impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (op, n) = match *self {
            Comparator::Eq(n) => ("==", n),
            Comparator::Ne(n) => ("!=", n),
            Comparator::Lt(n) => ("<", n),
            Comparator::Le(n) => ("<=", n),
            Comparator::Gt(n) => (">", n),
            Comparator::Ge(n) => (">=", n),
            Comparator::Mask { mask, bits } => return write!(f, "& ${mask:X} == ${bits:X}"),
        };
        write!(f, "{op} ${n:X}")
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::mem::Cpu;

    use super::{Breakpoint, Comparator, Reg};

    #[test]
    fn test_check() {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.pc = 0x0105;
        cpu.a = 0x30;
        cpu.mem.write(0x0040, 0x07);

        assert!(Breakpoint::PC(0x0105).check(&cpu));
        assert!(!Breakpoint::PC(0x0100).check(&cpu));
        assert!(Breakpoint::Reg { reg: Reg::A, value: Comparator::Ge(0x30) }.check(&cpu));
        assert!(!Breakpoint::Reg { reg: Reg::A, value: Comparator::Lt(0x30) }.check(&cpu));
        assert!(Breakpoint::Reg { reg: Reg::SP, value: Comparator::Eq(0x01FF) }.check(&cpu));
        assert!(Breakpoint::Reg { reg: Reg::CCR, value: Comparator::Eq(0xC0) }.check(&cpu));
        assert!(Breakpoint::Mem { addr: 0x0040, value: Comparator::Ne(0) }.check(&cpu));
        assert!(!Breakpoint::Mem { addr: 0x0041, value: Comparator::Gt(0) }.check(&cpu));

        let z_set = Breakpoint::Reg { reg: Reg::CCR, value: Comparator::Mask { mask: 0x04, bits: 0x04 } };
        assert!(!z_set.check(&cpu));
        cpu.ccr.z = true;
        assert!(z_set.check(&cpu));
    }

    #[test]
    fn test_debug_fmt() {
        assert_eq!(format!("{:?}", Breakpoint::PC(0x0100)), "Breakpoint(PC == $0100)");
        assert_eq!(
            format!("{:?}", Breakpoint::Reg { reg: Reg::X, value: Comparator::Gt(0x10) }),
            "Breakpoint(X > $10)"
        );
        assert_eq!(
            format!("{:?}", Breakpoint::Mem { addr: 0x20, value: Comparator::Mask { mask: 0x80, bits: 0 } }),
            "Breakpoint(mem[$0020] & $80 == $0)"
        );
    }
}
