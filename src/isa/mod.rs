use crate::config::arch_config::WordType;

pub mod mips;

/// What a debugger front-end needs from a CPU core.
pub trait DebugTarget {
    type Reg: Copy;

    fn read_pc(&self) -> WordType;
    fn write_pc(&mut self, new_pc: WordType);

    fn read_reg(&self, reg: Self::Reg) -> WordType;
    fn write_reg(&mut self, reg: Self::Reg, value: WordType);

    /// Retire exactly one instruction.
    fn step(&mut self);
}
