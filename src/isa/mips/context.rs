//! Byte-exact snapshots of [`CpuState`], used to swap cores in and out of a shared
//! execution slot.
//!
//! Layout, all little-endian:
//!
//! | words  | content                                              |
//! |--------|------------------------------------------------------|
//! | 0..6   | current_instruction, current_pc, next_instruction, next_pc, hi, lo |
//! | 6..38  | general-purpose registers                            |
//! | 38..70 | coprocessor-0 registers                              |
//! | 70..72 | cycles_remaining (`i64`)                             |

use crate::{
    config::arch_config::{CP0_REGFILE_CNT, REGFILE_CNT, WordType},
    device::Bus,
    isa::mips::executor::{CpuState, MipsCPU},
    utils::UnsignedInteger,
};

const WORD: usize = size_of::<WordType>();
const GPR_OFFSET: usize = 6 * WORD;
const CP0_OFFSET: usize = GPR_OFFSET + REGFILE_CNT * WORD;
const CYCLES_OFFSET: usize = CP0_OFFSET + CP0_REGFILE_CNT * WORD;

/// Size in bytes of a context blob.
pub const CONTEXT_SIZE: usize = CYCLES_OFFSET + size_of::<i64>();

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ContextError {
    #[error("context buffer holds {got} bytes, {needed} needed")]
    BufferTooSmall { needed: usize, got: usize },
    #[error("context blob is {got} bytes, expected {expected}")]
    SizeMismatch { expected: usize, got: usize },
}

impl CpuState {
    fn write_to(&self, dst: &mut [u8]) {
        let header = [
            self.current_instruction,
            self.current_pc,
            self.next_instruction,
            self.next_pc,
            self.hi,
            self.lo,
        ];
        let words = header
            .iter()
            .chain(self.gpr.iter())
            .chain(self.cp0.iter());
        for (chunk, word) in dst[..CYCLES_OFFSET].chunks_exact_mut(WORD).zip(words) {
            word.write_le_slice(chunk);
        }
        dst[CYCLES_OFFSET..CONTEXT_SIZE].copy_from_slice(&self.cycles_remaining.to_le_bytes());
    }

    fn read_from(src: &[u8]) -> Self {
        let word = |idx: usize| WordType::from_le_slice(&src[idx * WORD..]);

        let mut state = CpuState {
            current_instruction: word(0),
            current_pc: word(1),
            next_instruction: word(2),
            next_pc: word(3),
            hi: word(4),
            lo: word(5),
            ..CpuState::default()
        };
        for i in 0..REGFILE_CNT {
            state.gpr[i] = word(GPR_OFFSET / WORD + i);
        }
        for i in 0..CP0_REGFILE_CNT {
            state.cp0[i] = word(CP0_OFFSET / WORD + i);
        }

        let mut cycles = [0u8; size_of::<i64>()];
        cycles.copy_from_slice(&src[CYCLES_OFFSET..CONTEXT_SIZE]);
        state.cycles_remaining = i64::from_le_bytes(cycles);
        state
    }
}

impl<B: Bus> MipsCPU<B> {
    /// Copy the full state into `dst`. With `None` only the required size is reported.
    pub fn get_context(&self, dst: Option<&mut [u8]>) -> Result<usize, ContextError> {
        let Some(dst) = dst else {
            return Ok(CONTEXT_SIZE);
        };
        if dst.len() < CONTEXT_SIZE {
            return Err(ContextError::BufferTooSmall {
                needed: CONTEXT_SIZE,
                got: dst.len(),
            });
        }

        self.state.write_to(dst);
        Ok(CONTEXT_SIZE)
    }

    /// Replace the full state from a blob produced by [`MipsCPU::get_context`] and
    /// reselect the address space of `next_pc`. Nothing is revalidated.
    pub fn set_context(&mut self, src: &[u8]) -> Result<(), ContextError> {
        if src.len() != CONTEXT_SIZE {
            return Err(ContextError::SizeMismatch {
                expected: CONTEXT_SIZE,
                got: src.len(),
            });
        }

        self.state = CpuState::read_from(src);
        self.bus.select_address_space(self.state.next_pc);
        log::debug!(
            "context restored, pc = {:#010x}, next = {:#010x}",
            self.state.current_pc,
            self.state.next_pc
        );
        Ok(())
    }

    pub fn snapshot(&self) -> [u8; CONTEXT_SIZE] {
        let mut blob = [0u8; CONTEXT_SIZE];
        self.state.write_to(&mut blob);
        blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        isa::mips::{cop0::cp0_index, cpu_tester::*},
        ram::Ram,
    };

    #[test]
    fn test_context_size() {
        assert_eq!(CONTEXT_SIZE, 288);
        let cpu = MipsCPU::new(Ram::new());
        assert_eq!(cpu.get_context(None), Ok(CONTEXT_SIZE));

        let mut small = [0u8; 16];
        assert_eq!(
            cpu.get_context(Some(&mut small[..])),
            Err(ContextError::BufferTooSmall {
                needed: CONTEXT_SIZE,
                got: 16
            })
        );
    }

    #[test]
    fn test_layout() {
        let cpu = TestCPUBuilder::new()
            .reg(1, 0x1111_1111)
            .reg(31, 0x3131_3131)
            .hi(0xaaaa_aaaa)
            .lo(0xbbbb_bbbb)
            .cp0(cp0_index::EPC, 0x1414_1414)
            .build();
        let blob = cpu.snapshot();

        let word = |i: usize| u32::from_le_bytes(blob[i * 4..i * 4 + 4].try_into().unwrap());
        assert_eq!(word(1), TEST_PC);
        assert_eq!(word(3), TEST_PC + 4);
        assert_eq!(word(4), 0xaaaa_aaaa);
        assert_eq!(word(5), 0xbbbb_bbbb);
        assert_eq!(word(7), 0x1111_1111);
        assert_eq!(word(37), 0x3131_3131);
        assert_eq!(word(38 + cp0_index::EPC), 0x1414_1414);
    }

    #[test]
    fn test_round_trip() {
        let mut cpu = TestCPUBuilder::new()
            .reg(5, 0xdead_beef)
            .cp0(cp0_index::STATUS, 0x0040_0004)
            .build();
        cpu.execute(3);
        let saved = cpu.state.clone();

        let mut blob = vec![0u8; CONTEXT_SIZE + 8];
        assert_eq!(cpu.get_context(Some(blob.as_mut_slice())), Ok(CONTEXT_SIZE));

        let mut other = MipsCPU::new(Ram::new());
        other.set_context(&blob[..CONTEXT_SIZE]).unwrap();
        assert_eq!(other.state, saved);
        assert_eq!(other.bus().active_segment(), TEST_PC >> 29);

        assert_eq!(
            other.set_context(&blob),
            Err(ContextError::SizeMismatch {
                expected: CONTEXT_SIZE,
                got: CONTEXT_SIZE + 8
            })
        );
    }
}
