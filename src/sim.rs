//! Simulating and execution for 6800 object code.
//!
//! This module consists of:
//! - [`Simulator`]: The struct that drives execution of loaded code.
//! - [`mem`]: The module handling the CPU registers, flags, and memory.
//! - [`exec`]: The module handling fetch, decode, and execute of single instructions.
//! - [`debug`]: The module handling types of breakpoints for the simulator.
//! - [`observer`]: The module handling step and halt observers.
//!
//! # Usage
//!
//! To simulate some code, create a `Simulator`, load bytes into it, and run it:
//!
//! ```
//! use m6800_ensemble::asm::assemble;
//! use m6800_ensemble::sim::Simulator;
//!
//! let asm = assemble("
//!         ORG $0100
//!         LDAA #$10
//!         LDAB #$20
//!         ABA
//!         SWI
//!         END
//! ");
//! let mut sim = Simulator::new(Default::default());
//! assert!(sim.load_assembly(&asm));
//!
//! sim.step();
//! sim.step();
//! sim.step();
//! assert_eq!(sim.cpu.a, 0x30);
//! assert_eq!(sim.cpu.pc, 0x0105);
//! ```
//!
//! ## Flags
//!
//! The simulator is configured with [`SimFlags`]. For example, to lower the step ceiling
//! of [`Simulator::run`]:
//!
//! ```
//! # use m6800_ensemble::sim::{Simulator, SimFlags};
//! let mut sim = Simulator::new(SimFlags { max_steps: 1000, ..Default::default() });
//! ```
//!
//! ## Execution
//!
//! [`Simulator::step`] executes one instruction. [`Simulator::run`] executes until
//! the CPU halts, a breakpoint is reached, the step ceiling is hit, or [`Simulator::stop`]
//! is called (possibly from another thread, through [`Simulator::run_flag`]).
pub mod mem;
pub mod exec;
pub mod debug;
pub mod observer;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::asm::Assembly;
use crate::isa::AddrMode;

use self::debug::Breakpoint;
use self::exec::{Executor, StepBreak};
use self::mem::{Cpu, MachineInitStrategy};
use self::observer::{CpuSnapshot, HaltReason, SimObserver};

/// Errors that can occur during simulation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SimErr {
    /// An opcode with no instruction was fetched.
    UnknownOpcode {
        /// The opcode byte.
        opcode: u8,
        /// The address it was fetched from.
        addr: u16
    },
    /// An access reached past the end of memory.
    AddressOutOfRange(u32),
    /// A program image did not fit in memory.
    LoadOutOfRange {
        /// Where the image was to be loaded.
        start: u16,
        /// The length of the image.
        len: usize
    },
    /// An instruction was decoded with a mode it cannot take a memory operand in.
    InvalidMode(AddrMode),
}
impl std::fmt::Display for SimErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimErr::UnknownOpcode { opcode, addr } => write!(f, "unknown opcode ${opcode:02X} at ${addr:04X}"),
            SimErr::AddressOutOfRange(addr) => write!(f, "address ${addr:X} is out of range"),
            SimErr::LoadOutOfRange { start, len } => write!(f, "{len} byte(s) at ${start:04X} do not fit in memory"),
            SimErr::InvalidMode(mode) => write!(f, "{mode} mode has no effective address"),
        }
    }
}
impl std::error::Error for SimErr {}
impl crate::err::Error for SimErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            SimErr::UnknownOpcode { .. } => Some("execution reached data or uninitialized memory; check that the program ends in a branch or SWI".into()),
            SimErr::AddressOutOfRange(_) => Some("16-bit values cannot be read from or written to $FFFF".into()),
            SimErr::LoadOutOfRange { .. } => Some("load the program at a lower address".into()),
            SimErr::InvalidMode(_) => None,
        }
    }
}

/// Handle to the flag that keeps [`Simulator::run`] going.
///
/// Storing `false` into it stops the run before its next step. A stop stored while
/// no run is active stops the next run before it executes anything. Once a run
/// honours a stop, the flag is set back to `true`.
pub type RunFlag = Arc<AtomicBool>;

/// Configuration flags for [`Simulator`].
///
/// These can be modified after the `Simulator` is created with [`Simulator::new`]
/// and their effects should still apply.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SimFlags {
    /// The most steps a single [`Simulator::run`] executes before it forces a halt.
    ///
    /// By default, this is `1_000_000`.
    pub max_steps: u64,

    /// The stack pointer after a reset.
    ///
    /// By default, this is `0x01FF`.
    pub reset_sp: u16,

    /// The creation strategy for memory on reset.
    ///
    /// By default, memory is zeroed.
    pub machine_init: MachineInitStrategy,

    /// The number of bytes of memory captured in each [`CpuSnapshot`].
    ///
    /// By default, this is 32.
    pub mem_window: usize,
}
impl Default for SimFlags {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            reset_sp: 0x01FF,
            machine_init: Default::default(),
            mem_window: 32,
        }
    }
}

/// Executes 6800 code.
pub struct Simulator {
    // ------------------ SIMULATION STATE ------------------
    // Calling [`Simulator::reset_cpu`] resets these values.

    /// The CPU registers and memory.
    pub cpu: Cpu,

    /// The number of instructions successfully run since the last reset.
    pub instructions_run: u64,

    /// The number of machine cycles taken since the last reset.
    pub cycles: u64,

    /// The reason the last execution stopped, if it has.
    last_stop: Option<HaltReason>,

    // ------------------ CONFIG/DEBUG STATE ------------------

    executor: Executor,

    /// Configuration settings for the simulator.
    ///
    /// See [`SimFlags`] for more details on what configuration
    /// settings are available.
    pub flags: SimFlags,

    /// Breakpoints for the simulator.
    ///
    /// These are cleared by [`Simulator::reset_cpu`].
    pub breakpoints: HashSet<Breakpoint>,

    /// Run control. If unset, [`Simulator::run`] stops.
    run_flag: RunFlag,

    observer: Option<Box<dyn SimObserver + Send>>,
}
impl Simulator where Simulator: Send {}

impl Simulator {
    /// Creates a new simulator in its reset state, with nothing loaded.
    pub fn new(flags: SimFlags) -> Self {
        Self {
            cpu: Cpu::new(flags.reset_sp, &mut flags.machine_init.generator()),
            instructions_run: 0,
            cycles: 0,
            last_stop: None,

            executor: Executor::default(),
            flags,
            breakpoints: Default::default(),
            run_flag: Arc::new(AtomicBool::new(true)),
            observer: None,
        }
    }

    /// Copies bytes into memory at `start` and points PC at them.
    ///
    /// This clears the halted state. If the bytes do not fit in memory,
    /// nothing is loaded and this returns `false`.
    pub fn load(&mut self, bytes: &[u8], start: u16) -> bool {
        match self.cpu.mem.load(start, bytes) {
            Ok(()) => {
                debug!(start, len = bytes.len(), "loaded program");
                self.start_at(start);
                true
            },
            Err(e) => {
                warn!("load failed: {e}");
                false
            }
        }
    }

    /// Loads every record of a successful assembly at its own address.
    ///
    /// PC is set to the first record's address (or the assembly's origin if it has no code).
    /// Returns `false` if the assembly failed.
    pub fn load_assembly(&mut self, asm: &Assembly) -> bool {
        if !asm.success {
            warn!("refusing to load a failed assembly");
            return false;
        }

        let start = asm.records().next().map_or(asm.origin, |(addr, _)| addr);
        for (addr, bytes) in asm.records() {
            if let Err(e) = self.cpu.mem.load(addr, bytes) {
                warn!("load failed: {e}");
                return false;
            }
        }
        debug!(start, len = asm.object_code.len(), "loaded assembly");
        self.start_at(start);
        true
    }

    fn start_at(&mut self, pc: u16) {
        self.cpu.pc = pc;
        self.cpu.halted = false;
        self.last_stop = None;
    }

    /// Resets the CPU, clearing registers, memory, counters, and breakpoints.
    ///
    /// PC is set to `start`, or 0 if not provided. Flags are preserved.
    pub fn reset_cpu(&mut self, start: Option<u16>) {
        self.cpu.reset(self.flags.reset_sp, &mut self.flags.machine_init.generator());
        self.cpu.pc = start.unwrap_or(0);
        self.breakpoints.clear();
        self.instructions_run = 0;
        self.cycles = 0;
        self.last_stop = None;
        debug!(pc = self.cpu.pc, "reset CPU");
    }

    /// Attaches an observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl SimObserver + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }
    /// Detaches the current observer.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Adds a breakpoint at an address. Returns `false` if one was already there.
    pub fn add_breakpoint(&mut self, addr: u16) -> bool {
        self.breakpoints.insert(Breakpoint::PC(addr))
    }
    /// Removes the breakpoint at an address. Returns `false` if there was none.
    pub fn remove_breakpoint(&mut self, addr: u16) -> bool {
        self.breakpoints.remove(&Breakpoint::PC(addr))
    }
    /// Removes all breakpoints.
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Whether the CPU is halted.
    ///
    /// A halted CPU executes nothing until it is reset or reloaded.
    pub fn is_halted(&self) -> bool {
        self.cpu.halted
    }
    /// The reason the last execution stopped.
    pub fn halt_reason(&self) -> Option<&HaltReason> {
        self.last_stop.as_ref()
    }

    /// Captures the current CPU state.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot::capture(&self.cpu, self.flags.mem_window)
    }

    /// Gets a handle to the run flag, which can be used to stop [`Simulator::run`]
    /// from another thread.
    pub fn run_flag(&self) -> RunFlag {
        Arc::clone(&self.run_flag)
    }

    /// Requests that the current (or next) [`Simulator::run`] stop before its next step.
    pub fn stop(&self) {
        self.run_flag.store(false, Ordering::Relaxed);
    }

    fn stopped(&mut self, reason: HaltReason) {
        if reason.halts_cpu() {
            self.cpu.halted = true;
        }
        match &reason {
            HaltReason::StepLimit(_) | HaltReason::Fault(_) | HaltReason::UnknownOpcode { .. } => warn!("execution stopped: {reason}"),
            _ => debug!("execution stopped: {reason}"),
        }
        if let Some(obs) = &mut self.observer {
            obs.on_halt(&reason);
        }
        self.last_stop = Some(reason);
    }

    fn notify_step(&mut self) {
        if let Some(obs) = &mut self.observer {
            obs.on_step(&CpuSnapshot::capture(&self.cpu, self.flags.mem_window));
        }
    }

    /// Simulates one step, executing one instruction.
    ///
    /// This returns `false` if the CPU was already halted, if this step halted it,
    /// or if PC is now at a breakpoint. Otherwise, it returns `true`.
    pub fn step(&mut self) -> bool {
        if self.cpu.halted {
            debug!("step refused, CPU is halted");
            if let Some(obs) = &mut self.observer {
                obs.on_halt(&HaltReason::Halted);
            }
            self.last_stop.get_or_insert(HaltReason::Halted);
            return false;
        }

        match self.executor.step(&mut self.cpu) {
            Ok(done) => {
                trace!(addr = done.addr, "{} ({})", done.mnemonic, done.mode);
                self.instructions_run += 1;
                self.cycles += u64::from(done.cycles);
                self.notify_step();
            },
            Err(StepBreak::Wait) => {
                self.instructions_run += 1;
                self.notify_step();
                self.stopped(HaltReason::Wait);
            },
            Err(StepBreak::Err(e)) => self.stopped(HaltReason::from(e)),
        }

        if self.cpu.halted {
            return false;
        }
        let pc = self.cpu.pc;
        if self.breakpoints.contains(&Breakpoint::PC(pc)) {
            self.stopped(HaltReason::Breakpoint(pc));
            return false;
        }
        let watch = self.breakpoints.iter().copied().find(|bp| bp.check(&self.cpu));
        if let Some(bp) = watch {
            self.stopped(HaltReason::Watch { bp, pc });
            return false;
        }
        true
    }

    /// Executes until [`Simulator::step`] returns `false`, [`Simulator::stop`] is called,
    /// or [`SimFlags::max_steps`] steps have run.
    ///
    /// Reaching the step ceiling halts the CPU.
    pub fn run(&mut self) {
        let mut steps = 0;
        loop {
            if !self.run_flag.swap(true, Ordering::Relaxed) {
                self.stopped(HaltReason::Stopped);
                break;
            }
            if steps >= self.flags.max_steps {
                self.stopped(HaltReason::StepLimit(steps));
                break;
            }
            steps += 1;
            if !self.step() {
                break;
            }
        }

        debug!(steps, cycles = self.cycles, "run finished");
    }
}
impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("cpu", &self.cpu)
            .field("instructions_run", &self.instructions_run)
            .field("cycles", &self.cycles)
            .field("flags", &self.flags)
            .field("breakpoints", &self.breakpoints)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::asm::assemble;

    use super::debug::{Breakpoint, Comparator, Reg};
    use super::observer::{Callbacks, CpuSnapshot, HaltReason};
    use super::{SimErr, SimFlags, Simulator};

    fn sim_with(bytes: &[u8], start: u16) -> Simulator {
        let mut sim = Simulator::new(SimFlags::default());
        assert!(sim.load(bytes, start));
        sim
    }

    #[test]
    fn test_add_then_swi() {
        let mut sim = sim_with(&[0x86, 0x10, 0xC6, 0x20, 0x1B, 0x3F], 0x0100);
        assert!(sim.step());
        assert!(sim.step());
        assert!(sim.step());
        assert_eq!(sim.cpu.a, 0x30);
        assert_eq!(sim.cpu.b, 0x20);
        assert_eq!(sim.cpu.pc, 0x0105);

        // SWI, through the zeroed vector
        assert!(sim.step());
        assert_eq!(sim.cpu.pc, 0x0000);
        assert!(sim.cpu.ccr.i);
        assert_eq!(sim.cpu.sp, 0x01F8);

        // $00 is not an opcode
        assert!(!sim.step());
        assert!(sim.is_halted());
        assert_eq!(sim.halt_reason(), Some(&HaltReason::UnknownOpcode { opcode: 0x00, addr: 0x0000 }));

        // stays halted
        assert!(!sim.step());
        assert_eq!(sim.instructions_run, 4);
        assert_eq!(sim.cycles, 2 + 2 + 2 + 12);
    }

    #[test]
    fn test_breakpoint_stops_before() {
        let asm = assemble("
                ORG $0100
                LDAA #$03
        LOOP    DECA
                BNE LOOP
        DONE    NOP
                END
        ");
        let done = asm.symbols.lookup("DONE").unwrap();

        let mut sim = Simulator::new(SimFlags::default());
        assert!(sim.load_assembly(&asm));
        sim.add_breakpoint(done);
        sim.run();

        assert_eq!(sim.cpu.pc, done);
        assert_eq!(sim.cpu.a, 0);
        assert!(!sim.is_halted());
        assert_eq!(sim.halt_reason(), Some(&HaltReason::Breakpoint(done)));

        // resuming runs past it
        sim.remove_breakpoint(done);
        sim.run();
        assert!(sim.is_halted());
    }

    #[test]
    fn test_step_limit() {
        // BRA to self
        let mut sim = sim_with(&[0x20, 0xFE], 0x0200);
        sim.flags.max_steps = 50;
        sim.run();

        assert!(sim.is_halted());
        assert_eq!(sim.halt_reason(), Some(&HaltReason::StepLimit(50)));
        assert_eq!(sim.instructions_run, 50);
        assert_eq!(sim.cpu.pc, 0x0200);
    }

    #[test]
    fn test_stop_from_observer() {
        let mut sim = sim_with(&[0x20, 0xFE], 0x0200);
        let flag = sim.run_flag();
        let halts = Arc::new(Mutex::new(vec![]));
        let seen = Arc::clone(&halts);

        let mut count = 0;
        sim.set_observer(Callbacks {
            on_step: move |_: &CpuSnapshot| {
                count += 1;
                if count == 10 {
                    flag.store(false, std::sync::atomic::Ordering::Relaxed);
                }
            },
            on_halt: move |r: &HaltReason| seen.lock().unwrap().push(r.clone()),
        });
        sim.run();

        assert_eq!(sim.instructions_run, 10);
        assert!(!sim.is_halted());
        assert_eq!(*halts.lock().unwrap(), [HaltReason::Stopped]);

        // the stop was consumed, so the next run continues
        sim.flags.max_steps = 5;
        sim.run();
        assert_eq!(sim.instructions_run, 15);
    }

    #[test]
    fn test_stop_before_run() {
        let mut sim = sim_with(&[0x20, 0xFE], 0x0200);
        sim.run_flag().store(false, std::sync::atomic::Ordering::Relaxed);
        sim.run();
        assert_eq!(sim.instructions_run, 0);
        assert_eq!(sim.halt_reason(), Some(&HaltReason::Stopped));

        sim.stop();
        sim.run();
        assert_eq!(sim.instructions_run, 0);

        sim.flags.max_steps = 3;
        sim.run();
        assert_eq!(sim.instructions_run, 3);
        assert_eq!(sim.halt_reason(), Some(&HaltReason::StepLimit(3)));
    }

    #[test]
    fn test_halted_step_notifies() {
        let mut sim = sim_with(&[0x00], 0x0100);
        let halts = Arc::new(Mutex::new(vec![]));
        let seen = Arc::clone(&halts);
        sim.set_observer(Callbacks {
            on_step: |_: &CpuSnapshot| {},
            on_halt: move |r: &HaltReason| seen.lock().unwrap().push(r.clone()),
        });

        assert!(!sim.step());
        assert!(!sim.step());
        sim.run();

        let unknown = HaltReason::UnknownOpcode { opcode: 0x00, addr: 0x0100 };
        assert_eq!(*halts.lock().unwrap(), [unknown.clone(), HaltReason::Halted, HaltReason::Halted]);
        assert_eq!(sim.halt_reason(), Some(&unknown));
    }

    #[test]
    fn test_watch_breakpoint() {
        // LDAA #$10; LDAB #$20; NOP
        let mut sim = sim_with(&[0x86, 0x10, 0xC6, 0x20, 0x01], 0x0100);
        let watch = Breakpoint::Reg { reg: Reg::A, value: Comparator::Eq(0x10) };
        sim.breakpoints.insert(watch);

        assert!(!sim.step());
        assert!(!sim.is_halted());
        assert_eq!(sim.halt_reason(), Some(&HaltReason::Watch { bp: watch, pc: 0x0102 }));

        // a PC breakpoint at the same spot wins
        sim.reset_cpu(Some(0x0100));
        assert!(sim.load(&[0x86, 0x10, 0xC6, 0x20, 0x01], 0x0100));
        sim.breakpoints.insert(watch);
        sim.add_breakpoint(0x0102);
        assert!(!sim.step());
        assert_eq!(sim.halt_reason(), Some(&HaltReason::Breakpoint(0x0102)));
    }

    #[test]
    fn test_observer_snapshots() {
        let mut sim = sim_with(&[0x86, 0x10, 0xC6, 0x20, 0x1B, 0x3F], 0x0100);
        let snaps = Arc::new(Mutex::new(vec![]));
        let sink = Arc::clone(&snaps);
        sim.set_observer(Callbacks {
            on_step: move |s: &CpuSnapshot| sink.lock().unwrap().push(s.clone()),
            on_halt: |_: &HaltReason| {},
        });
        sim.step();
        sim.step();
        sim.step();

        let snaps = snaps.lock().unwrap();
        assert_eq!(snaps.len(), 3);
        assert_eq!(snaps[0].a, 0x10);
        assert_eq!(snaps[2].a, 0x30);
        assert_eq!(snaps[2].pc, 0x0105);
        assert_eq!(snaps[2].memory.len(), 32);
        assert_eq!(*snaps.last().unwrap(), sim.snapshot());
    }

    #[test]
    fn test_wait_halts() {
        // CLI; WAI
        let mut sim = sim_with(&[0x0E, 0x3E], 0x0100);
        sim.run();
        assert!(sim.is_halted());
        assert_eq!(sim.halt_reason(), Some(&HaltReason::Wait));
        assert_eq!(sim.cpu.sp, 0x01F8);
    }

    #[test]
    fn test_fault_halts() {
        // LDX $FFFF
        let mut sim = sim_with(&[0xFE, 0xFF, 0xFF], 0x0100);
        assert!(!sim.step());
        assert!(sim.is_halted());
        assert_eq!(sim.halt_reason(), Some(&HaltReason::Fault(SimErr::AddressOutOfRange(0x10000))));
    }

    #[test]
    fn test_load() {
        let mut sim = Simulator::new(SimFlags::default());
        assert!(!sim.load(&[1, 2, 3], 0xFFFE));
        assert!(sim.load(&[1, 2], 0xFFFE));
        assert_eq!(sim.cpu.pc, 0xFFFE);

        // reload clears halted
        sim.cpu.halted = true;
        assert!(!sim.step());
        assert_eq!(sim.halt_reason(), Some(&HaltReason::Halted));
        assert!(sim.load(&[0x01], 0x0100));
        assert!(!sim.is_halted());
        assert!(sim.step());
    }

    #[test]
    fn test_load_failed_assembly() {
        let mut sim = Simulator::new(SimFlags::default());
        assert!(!sim.load_assembly(&assemble(" ADDB UNKNOWN")));
    }

    #[test]
    fn test_reset() {
        let mut sim = sim_with(&[0x86, 0x10], 0x0100);
        sim.add_breakpoint(0x0102);
        sim.breakpoints.insert(Breakpoint::Reg { reg: Reg::A, value: Comparator::Eq(0x10) });
        assert!(!sim.step());

        sim.reset_cpu(Some(0x0100));
        assert!(sim.breakpoints.is_empty());
        assert_eq!(sim.cpu.pc, 0x0100);
        assert_eq!(sim.cpu.a, 0);
        assert_eq!(sim.cpu.sp, 0x01FF);
        assert_eq!(sim.cpu.mem.read(0x0100), 0);
        assert_eq!(sim.instructions_run, 0);
        assert_eq!(sim.halt_reason(), None);

        sim.reset_cpu(None);
        assert_eq!(sim.cpu.pc, 0);
    }

    #[test]
    fn test_breakpoint_set() {
        let mut sim = Simulator::new(SimFlags::default());
        assert!(sim.add_breakpoint(0x0100));
        assert!(!sim.add_breakpoint(0x0100));
        assert!(sim.remove_breakpoint(0x0100));
        assert!(!sim.remove_breakpoint(0x0100));
        sim.add_breakpoint(1);
        sim.add_breakpoint(2);
        sim.clear_breakpoints();
        assert!(sim.breakpoints.is_empty());
    }

    #[test]
    fn test_run_loop_program() {
        let asm = assemble("
        START   EQU $0100
                ORG START
        LOOP    LDAA #$05
                DECA
                BNE LOOP
                END
        ");
        let mut sim = Simulator::new(SimFlags { max_steps: 200, ..Default::default() });
        assert!(sim.load_assembly(&asm));
        assert_eq!(sim.cpu.pc, 0x0100);
        sim.run();

        // LDAA reloads A every pass, so this never exits
        assert_eq!(sim.halt_reason(), Some(&HaltReason::StepLimit(200)));
    }
}
