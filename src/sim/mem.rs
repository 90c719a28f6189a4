//! CPU state for the 6800 simulator.
//!
//! This module consists of:
//! - [`Ccr`]: The condition code register.
//! - [`Memory`]: The 64KB address space.
//! - [`Cpu`]: The registers, memory, and stack operations.
//! - [`MachineInitStrategy`]: How memory is filled when the machine is reset.

use rand::rngs::StdRng;
use rand::Rng;

use super::SimErr;

/// The number of addressable bytes.
pub const MEM_SIZE: usize = 0x10000;

/// The condition code register.
///
/// Bits 7 and 6 of the register are unused and always read as 1.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Ccr {
    /// Half-carry (carry out of bit 3).
    pub h: bool,
    /// Interrupt mask.
    pub i: bool,
    /// Negative.
    pub n: bool,
    /// Zero.
    pub z: bool,
    /// Two's complement overflow.
    pub v: bool,
    /// Carry or borrow.
    pub c: bool,
}
impl Ccr {
    /// Unpacks the register from a byte (`11HINZVC`).
    pub fn from_byte(b: u8) -> Self {
        Self {
            h: b & 0x20 != 0,
            i: b & 0x10 != 0,
            n: b & 0x08 != 0,
            z: b & 0x04 != 0,
            v: b & 0x02 != 0,
            c: b & 0x01 != 0,
        }
    }
    /// Packs the register into a byte (`11HINZVC`).
    pub fn to_byte(self) -> u8 {
        0xC0
            | (u8::from(self.h) << 5)
            | (u8::from(self.i) << 4)
            | (u8::from(self.n) << 3)
            | (u8::from(self.z) << 2)
            | (u8::from(self.v) << 1)
            | u8::from(self.c)
    }
    /// Sets N and Z from an 8-bit result.
    pub fn set_nz(&mut self, result: u8) {
        self.n = result & 0x80 != 0;
        self.z = result == 0;
    }
    /// Sets N and Z from a 16-bit result.
    pub fn set_nz16(&mut self, result: u16) {
        self.n = result & 0x8000 != 0;
        self.z = result == 0;
    }
}
impl std::fmt::Debug for Ccr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ccr({:#04X}: {self})", self.to_byte())
    }
}
impl std::fmt::Display for Ccr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b = |flag: bool| u8::from(flag);
        write!(f, "H:{} I:{} N:{} Z:{} V:{} C:{}",
            b(self.h), b(self.i), b(self.n), b(self.z), b(self.v), b(self.c)
        )
    }
}

/// Trait that describes types that can be used to fill memory.
pub trait ByteFiller {
    /// Generate the data.
    fn generate(&mut self) -> u8;
}
impl ByteFiller for () {
    /// This creates unseeded, non-deterministic values.
    fn generate(&mut self) -> u8 {
        rand::random()
    }
}
impl ByteFiller for u8 {
    /// Sets each byte to the given value.
    fn generate(&mut self) -> u8 {
        *self
    }
}
impl ByteFiller for StdRng {
    /// This creates values from the standard random number generator.
    ///
    /// This can be used to create deterministic, seeded values.
    fn generate(&mut self) -> u8 {
        self.gen()
    }
}

/// Strategy used to fill memory when the [`Simulator`] resets the machine.
///
/// [`Simulator`]: super::Simulator
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MachineInitStrategy {
    /// Fills each byte randomly and non-deterministically.
    Unseeded,

    /// Fills each byte randomly and deterministically.
    Seeded {
        /// The seed the RNG was initialized with.
        seed: u64
    },

    /// Fills each byte with a known value.
    Known {
        /// The value to fill each byte with.
        value: u8
    }
}
impl Default for MachineInitStrategy {
    fn default() -> Self {
        MachineInitStrategy::Known { value: 0 }
    }
}
impl MachineInitStrategy {
    pub(super) fn generator(&self) -> impl ByteFiller {
        use rand::SeedableRng;

        match self {
            MachineInitStrategy::Unseeded => MIGenerator::Unseeded,
            MachineInitStrategy::Seeded { seed } => MIGenerator::Seeded(Box::new(StdRng::seed_from_u64(*seed))),
            MachineInitStrategy::Known { value } => MIGenerator::Known(*value),
        }
    }
}

enum MIGenerator {
    Unseeded,
    Seeded(Box<StdRng>),
    Known(u8)
}
impl ByteFiller for MIGenerator {
    fn generate(&mut self) -> u8 {
        match self {
            MIGenerator::Unseeded  => ().generate(),
            MIGenerator::Seeded(r) => r.generate(),
            MIGenerator::Known(k)  => k.generate(),
        }
    }
}

/// Formats bytes as hex rows of 16, each prefixed with the address of its first byte.
pub fn hex_rows(start: u16, bytes: &[u8]) -> String {
    bytes.chunks(16)
        .enumerate()
        .map(|(i, row)| {
            let bytes: Vec<_> = row.iter().map(|b| format!("{b:02X}")).collect();
            format!("{:04X}: {}", usize::from(start) + 16 * i, bytes.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The 64KB address space.
///
/// Words are stored big-endian (high byte at the lower address).
#[derive(Clone)]
pub struct Memory {
    data: Box<[u8; MEM_SIZE]>
}
impl Memory {
    /// Creates a new memory, filling every byte with the filler.
    pub fn new(filler: &mut impl ByteFiller) -> Self {
        Self {
            data: std::iter::repeat_with(|| filler.generate())
                .take(MEM_SIZE)
                .collect::<Box<_>>()
                .try_into()
                .unwrap_or_else(|_| unreachable!("iterator should have had {MEM_SIZE} elements"))
        }
    }

    /// Overwrites every byte with the filler.
    pub fn fill(&mut self, filler: &mut impl ByteFiller) {
        self.data.iter_mut().for_each(|b| *b = filler.generate());
    }

    /// Reads a byte.
    pub fn read(&self, addr: u16) -> u8 {
        self.data[usize::from(addr)]
    }
    /// Writes a byte.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.data[usize::from(addr)] = value;
    }

    /// Reads a big-endian word.
    ///
    /// This fails if the word would extend past `$FFFF`.
    pub fn read_word(&self, addr: u16) -> Result<u16, SimErr> {
        let lo_addr = addr.checked_add(1).ok_or(SimErr::AddressOutOfRange(MEM_SIZE as u32))?;
        Ok(u16::from_be_bytes([self.read(addr), self.read(lo_addr)]))
    }
    /// Writes a big-endian word.
    ///
    /// This fails if the word would extend past `$FFFF`.
    pub fn write_word(&mut self, addr: u16, value: u16) -> Result<(), SimErr> {
        let lo_addr = addr.checked_add(1).ok_or(SimErr::AddressOutOfRange(MEM_SIZE as u32))?;
        let [hi, lo] = value.to_be_bytes();
        self.write(addr, hi);
        self.write(lo_addr, lo);
        Ok(())
    }

    /// Copies an image into memory starting at `start`.
    ///
    /// This fails (leaving memory untouched) if the image does not fit before the end of memory.
    pub fn load(&mut self, start: u16, bytes: &[u8]) -> Result<(), SimErr> {
        let begin = usize::from(start);
        let end = begin + bytes.len();
        match self.data.get_mut(begin..end) {
            Some(dest) => {
                dest.copy_from_slice(bytes);
                Ok(())
            },
            None => Err(SimErr::LoadOutOfRange { start, len: bytes.len() }),
        }
    }

    /// Gets up to `len` bytes starting at `start`, stopping at the end of memory.
    pub fn window(&self, start: u16, len: usize) -> &[u8] {
        let begin = usize::from(start);
        &self.data[begin..(begin + len).min(MEM_SIZE)]
    }

    /// Formats a hex dump of up to `len` bytes starting at `start`, 16 bytes per row.
    ///
    /// ```
    /// use m6800_ensemble::sim::mem::Memory;
    ///
    /// let mut mem = Memory::new(&mut 0);
    /// mem.load(0x0100, &[0x86, 0x05, 0x4A]).unwrap();
    /// assert_eq!(mem.dump(0x0100, 4), "0100: 86 05 4A 00");
    /// ```
    pub fn dump(&self, start: u16, len: usize) -> String {
        hex_rows(start, self.window(start, len))
    }

    /// Accesses the full address space.
    pub fn as_slice(&self) -> &[u8] {
        &*self.data
    }
}
impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("len", &MEM_SIZE)
            .finish_non_exhaustive()
    }
}

/// The registers and memory of the 6800.
#[derive(Debug, Clone)]
pub struct Cpu {
    /// Accumulator A.
    pub a: u8,
    /// Accumulator B.
    pub b: u8,
    /// Index register.
    pub x: u16,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer. This points to the next free byte of the stack.
    pub sp: u16,
    /// Condition code register.
    pub ccr: Ccr,
    /// Memory.
    pub mem: Memory,
    /// Whether the CPU has stopped executing.
    pub halted: bool,
}
impl Cpu {
    /// Creates a CPU in its reset state.
    pub fn new(reset_sp: u16, filler: &mut impl ByteFiller) -> Self {
        Self {
            a: 0,
            b: 0,
            x: 0,
            pc: 0,
            sp: reset_sp,
            ccr: Ccr::default(),
            mem: Memory::new(filler),
            halted: false,
        }
    }

    /// Returns the CPU to its reset state, refilling memory.
    pub fn reset(&mut self, reset_sp: u16, filler: &mut impl ByteFiller) {
        self.a = 0;
        self.b = 0;
        self.x = 0;
        self.pc = 0;
        self.sp = reset_sp;
        self.ccr = Ccr::default();
        self.mem.fill(filler);
        self.halted = false;
    }

    /// Pushes a byte: writes at SP, then decrements SP.
    pub fn push_byte(&mut self, value: u8) {
        self.mem.write(self.sp, value);
        self.sp = self.sp.wrapping_sub(1);
    }
    /// Pops a byte: increments SP, then reads at SP.
    pub fn pop_byte(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.mem.read(self.sp)
    }
    /// Pushes a word, low byte first.
    pub fn push_word(&mut self, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.push_byte(lo);
        self.push_byte(hi);
    }
    /// Pops a word, high byte first.
    pub fn pop_word(&mut self) -> u16 {
        let hi = self.pop_byte();
        let lo = self.pop_byte();
        u16::from_be_bytes([hi, lo])
    }

    /// Reads the byte at PC and advances PC.
    pub fn fetch(&mut self) -> u8 {
        let b = self.mem.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        b
    }
    /// Reads the word at PC and advances PC past it.
    pub fn fetch_word(&mut self) -> u16 {
        let hi = self.fetch();
        let lo = self.fetch();
        u16::from_be_bytes([hi, lo])
    }
}

#[cfg(test)]
mod tests {
    use super::{Ccr, Cpu, MachineInitStrategy, Memory, MEM_SIZE};
    use crate::sim::SimErr;

    #[test]
    fn test_ccr_byte() {
        assert_eq!(Ccr::default().to_byte(), 0xC0);

        let ccr = Ccr::from_byte(0x3F);
        assert!(ccr.h && ccr.i && ccr.n && ccr.z && ccr.v && ccr.c);
        assert_eq!(ccr.to_byte(), 0xFF);

        let ccr = Ccr::from_byte(0b0001_0101);
        assert_eq!(ccr, Ccr { i: true, z: true, c: true, ..Default::default() });
        assert_eq!(ccr.to_string(), "H:0 I:1 N:0 Z:1 V:0 C:1");
    }

    #[test]
    fn test_stack_order() {
        let mut cpu = Cpu::new(0x01FF, &mut 0);
        cpu.push_word(0x1234);
        assert_eq!(cpu.sp, 0x01FD);
        // low byte at the higher address
        assert_eq!(cpu.mem.read(0x01FF), 0x34);
        assert_eq!(cpu.mem.read(0x01FE), 0x12);

        cpu.push_byte(0xAB);
        assert_eq!(cpu.pop_byte(), 0xAB);
        assert_eq!(cpu.pop_word(), 0x1234);
        assert_eq!(cpu.sp, 0x01FF);
    }

    #[test]
    fn test_stack_wraps() {
        let mut cpu = Cpu::new(0x0000, &mut 0);
        cpu.push_byte(0x55);
        assert_eq!(cpu.sp, 0xFFFF);
        assert_eq!(cpu.pop_byte(), 0x55);
        assert_eq!(cpu.sp, 0x0000);
    }

    #[test]
    fn test_words() {
        let mut mem = Memory::new(&mut 0);
        mem.write_word(0x1000, 0xBEEF).unwrap();
        assert_eq!(mem.read(0x1000), 0xBE);
        assert_eq!(mem.read(0x1001), 0xEF);
        assert_eq!(mem.read_word(0x1000), Ok(0xBEEF));
        assert_eq!(mem.read_word(0xFFFE), Ok(0));
        assert_eq!(mem.read_word(0xFFFF), Err(SimErr::AddressOutOfRange(0x10000)));
        assert_eq!(mem.write_word(0xFFFF, 1), Err(SimErr::AddressOutOfRange(0x10000)));
    }

    #[test]
    fn test_load_bounds() {
        let mut mem = Memory::new(&mut 0);
        assert!(mem.load(0xFFFE, &[1, 2]).is_ok());
        assert_eq!(mem.load(0xFFFE, &[1, 2, 3]), Err(SimErr::LoadOutOfRange { start: 0xFFFE, len: 3 }));
        assert_eq!(mem.window(0xFFFE, 8), [1, 2]);
        assert!(mem.load(0, &vec![7; MEM_SIZE]).is_ok());
    }

    #[test]
    fn test_init_strategy() {
        let mut a = Memory::new(&mut MachineInitStrategy::Seeded { seed: 7 }.generator());
        let b = Memory::new(&mut MachineInitStrategy::Seeded { seed: 7 }.generator());
        assert_eq!(a.as_slice(), b.as_slice());

        a.fill(&mut MachineInitStrategy::Known { value: 0xA5 }.generator());
        assert!(a.as_slice().iter().all(|&b| b == 0xA5));
        assert_eq!(MachineInitStrategy::default(), MachineInitStrategy::Known { value: 0 });
    }

    #[test]
    fn test_dump() {
        let mut mem = Memory::new(&mut 0);
        mem.load(0x0010, &(0..18).collect::<Vec<u8>>()).unwrap();
        assert_eq!(
            mem.dump(0x0010, 18),
            "0010: 00 01 02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F\n0020: 10 11"
        );
    }
}
