//! Observers of simulator execution.
//!
//! A front end can attach a [`SimObserver`] to a [`Simulator`] with
//! [`Simulator::set_observer`]. The simulator calls it synchronously after
//! every executed step (with a [`CpuSnapshot`]) and whenever execution stops
//! (with a [`HaltReason`]).
//!
//! Closures can be used directly through [`Callbacks`]:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use m6800_ensemble::sim::{Simulator, SimFlags};
//! use m6800_ensemble::sim::observer::{Callbacks, CpuSnapshot, HaltReason};
//!
//! let steps = Arc::new(Mutex::new(0));
//! let counter = Arc::clone(&steps);
//!
//! let mut sim = Simulator::new(SimFlags::default());
//! sim.set_observer(Callbacks {
//!     on_step: move |_: &CpuSnapshot| *counter.lock().unwrap() += 1,
//!     on_halt: |_: &HaltReason| {},
//! });
//! sim.load(&[0x01, 0x01], 0x0100);
//! sim.step();
//! sim.step();
//! assert_eq!(*steps.lock().unwrap(), 2);
//! ```
//!
//! [`Simulator`]: super::Simulator
//! [`Simulator::set_observer`]: super::Simulator::set_observer

use super::debug::Breakpoint;
use super::mem::{hex_rows, Ccr, Cpu};
use super::SimErr;

/// The state of the CPU at one point in time.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CpuSnapshot {
    /// Accumulator A.
    pub a: u8,
    /// Accumulator B.
    pub b: u8,
    /// Index register.
    pub x: u16,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer.
    pub sp: u16,
    /// The flags.
    pub ccr: Ccr,
    /// The flags, packed.
    pub ccr_byte: u8,
    /// Address of the first byte of `memory`.
    pub mem_start: u16,
    /// A window of memory around PC.
    pub memory: Vec<u8>,
}
impl CpuSnapshot {
    /// Captures the CPU state with a memory window of `window` bytes.
    ///
    /// The window starts at the 16-byte row containing `PC - 8`.
    pub fn capture(cpu: &Cpu, window: usize) -> Self {
        let mem_start = cpu.pc.saturating_sub(8) & 0xFFF0;
        Self {
            a: cpu.a,
            b: cpu.b,
            x: cpu.x,
            pc: cpu.pc,
            sp: cpu.sp,
            ccr: cpu.ccr,
            ccr_byte: cpu.ccr.to_byte(),
            mem_start,
            memory: cpu.mem.window(mem_start, window).to_vec(),
        }
    }
}
impl std::fmt::Display for CpuSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "A: {:02X}  B: {:02X}  X: {:04X}", self.a, self.b, self.x)?;
        write!(f, "PC: {:04X} SP: {:04X} CCR: {}", self.pc, self.sp, self.ccr)?;
        if !self.memory.is_empty() {
            write!(f, "\n{}", hex_rows(self.mem_start, &self.memory))?;
        }
        Ok(())
    }
}

/// Why execution stopped.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum HaltReason {
    /// The CPU was already halted.
    Halted,
    /// An opcode with no instruction was fetched.
    UnknownOpcode {
        /// The opcode byte.
        opcode: u8,
        /// The address it was fetched from.
        addr: u16
    },
    /// A runtime fault occurred.
    Fault(SimErr),
    /// PC reached a breakpoint.
    Breakpoint(u16),
    /// A register or memory watch fired, with PC at the given address.
    Watch {
        /// The watch that fired.
        bp: Breakpoint,
        /// PC when it fired.
        pc: u16
    },
    /// The run hit its step ceiling.
    StepLimit(u64),
    /// The run was stopped externally.
    Stopped,
    /// `WAI` is waiting for an interrupt.
    Wait,
}
impl HaltReason {
    /// Whether this reason latches the CPU into the halted state.
    pub fn halts_cpu(&self) -> bool {
        !matches!(self, HaltReason::Breakpoint(_) | HaltReason::Watch { .. } | HaltReason::Stopped)
    }
}
impl From<SimErr> for HaltReason {
    fn from(value: SimErr) -> Self {
        match value {
            SimErr::UnknownOpcode { opcode, addr } => HaltReason::UnknownOpcode { opcode, addr },
            e => HaltReason::Fault(e),
        }
    }
}
impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::Halted => f.write_str("CPU is halted"),
            HaltReason::UnknownOpcode { opcode, addr } => write!(f, "unknown opcode ${opcode:02X} at ${addr:04X}"),
            HaltReason::Fault(e) => write!(f, "runtime fault: {e}"),
            HaltReason::Breakpoint(addr) => write!(f, "breakpoint hit at ${addr:04X}"),
            HaltReason::Watch { bp, pc } => write!(f, "watch {bp} hit at ${pc:04X}"),
            HaltReason::StepLimit(n) => write!(f, "step limit of {n} reached"),
            HaltReason::Stopped => f.write_str("stopped by request"),
            HaltReason::Wait => f.write_str("waiting for interrupt"),
        }
    }
}

/// Receives simulator events.
pub trait SimObserver {
    /// Called after each executed step.
    fn on_step(&mut self, _snapshot: &CpuSnapshot) {}
    /// Called when execution stops.
    fn on_halt(&mut self, _reason: &HaltReason) {}
}

/// A [`SimObserver`] built from two closures.
pub struct Callbacks<S, H> {
    /// Called after each executed step.
    pub on_step: S,
    /// Called when execution stops.
    pub on_halt: H,
}
impl<S, H> SimObserver for Callbacks<S, H>
    where S: FnMut(&CpuSnapshot),
          H: FnMut(&HaltReason)
{
    fn on_step(&mut self, snapshot: &CpuSnapshot) {
        (self.on_step)(snapshot)
    }
    fn on_halt(&mut self, reason: &HaltReason) {
        (self.on_halt)(reason)
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::debug::{Breakpoint, Comparator, Reg};
    use crate::sim::mem::Cpu;
    use crate::sim::SimErr;

    use super::{CpuSnapshot, HaltReason};

    #[test]
    fn test_snapshot_window() {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.mem.load(0x0100, &[0x86, 0x05]).unwrap();
        cpu.pc = 0x0105;
        cpu.a = 0x30;

        let snap = CpuSnapshot::capture(&cpu, 32);
        assert_eq!(snap.mem_start, 0x00F0);
        assert_eq!(snap.memory.len(), 32);
        assert_eq!(snap.memory[0x10], 0x86);
        assert_eq!(snap.ccr_byte, 0xC0);

        cpu.pc = 0x0003;
        assert_eq!(CpuSnapshot::capture(&cpu, 32).mem_start, 0x0000);

        cpu.pc = 0xFFFF;
        let snap = CpuSnapshot::capture(&cpu, 32);
        assert_eq!(snap.mem_start, 0xFFF0);
        assert_eq!(snap.memory.len(), 16);
    }

    #[test]
    fn test_snapshot_display() {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.pc = 0x0105;
        cpu.a = 0x30;
        cpu.b = 0x20;
        let text = CpuSnapshot::capture(&cpu, 0).to_string();
        assert_eq!(text, "A: 30  B: 20  X: 0000\nPC: 0105 SP: 01FF CCR: H:0 I:0 N:0 Z:0 V:0 C:0");
    }

    #[test]
    fn test_halt_reason() {
        let reason = HaltReason::from(SimErr::UnknownOpcode { opcode: 0x02, addr: 0x0300 });
        assert_eq!(reason, HaltReason::UnknownOpcode { opcode: 0x02, addr: 0x0300 });
        assert_eq!(reason.to_string(), "unknown opcode $02 at $0300");
        assert!(reason.halts_cpu());

        let reason = HaltReason::from(SimErr::AddressOutOfRange(0x10000));
        assert!(matches!(reason, HaltReason::Fault(_)));
        assert!(!HaltReason::Breakpoint(0x0100).halts_cpu());
        assert!(!HaltReason::Stopped.halts_cpu());

        let watch = HaltReason::Watch {
            bp: Breakpoint::Reg { reg: Reg::A, value: Comparator::Eq(0x10) },
            pc: 0x0102,
        };
        assert!(!watch.halts_cpu());
        assert_eq!(watch.to_string(), "watch A == $10 hit at $0102");
    }
}
