use std::{
    fmt::Debug,
    ops::{Index, IndexMut},
};

use bitflags::bitflags;

use crate::{
    config::arch_config::{CP0_REG_NAME, CP0_REGFILE_CNT, WordType},
    isa::mips::trap::Exception,
};

#[allow(non_upper_case_globals)]
pub mod cp0_index {
    pub const RANDOM: usize = 1;
    pub const BADVADDR: usize = 8;
    pub const STATUS: usize = 12;
    pub const CAUSE: usize = 13;
    pub const EPC: usize = 14;
}

bitflags! {
    /// STATUS register. Bits 5:0 form the {KU, IE} mode stack: current, previous, old.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Interrupt enable, current.
        const IEC = 1 << 0;
        /// User mode, current.
        const KUC = 1 << 1;
        const IEP = 1 << 2;
        const KUP = 1 << 3;
        const IEO = 1 << 4;
        const KUO = 1 << 5;
        /// Isolate cache.
        const ISC = 1 << 16;
        /// Swap caches.
        const SWC = 1 << 17;
        /// Boot exception vectors.
        const BEV = 1 << 22;
    }
}

impl Status {
    pub const MODE_STACK_MASK: WordType = 0x3f;

    /// Push the mode stack: enter kernel mode with interrupts disabled.
    #[must_use]
    pub fn push_mode(raw: WordType) -> WordType {
        (raw & !Self::MODE_STACK_MASK) | ((raw << 2) & Self::MODE_STACK_MASK)
    }

    /// Pop the mode stack. The old pair is left in place.
    #[must_use]
    pub fn pop_mode(raw: WordType) -> WordType {
        (raw & !0xf) | ((raw >> 2) & 0xf)
    }
}

/// View over the CAUSE register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cause(pub WordType);

impl Cause {
    pub const EXC_CODE_MASK: WordType = 0x7c;
    pub const BRANCH_DELAY: WordType = 1 << 31;

    pub fn exception_code(&self) -> WordType {
        (self.0 & Self::EXC_CODE_MASK) >> 2
    }

    pub fn exception(&self) -> Option<Exception> {
        Exception::try_from(self.exception_code()).ok()
    }

    pub fn branch_delay(&self) -> bool {
        self.0 & Self::BRANCH_DELAY != 0
    }

    /// Replace the exception code and branch-delay flag, keeping the other bits.
    #[must_use]
    pub fn with_exception(self, exception: Exception, branch_delay: bool) -> Self {
        let mut raw = self.0 & !(Self::EXC_CODE_MASK | Self::BRANCH_DELAY);
        raw |= exception.code() << 2;
        if branch_delay {
            raw |= Self::BRANCH_DELAY;
        }
        Self(raw)
    }
}

/// Coprocessor-0 register bank. Only RANDOM, BADVADDR, STATUS, CAUSE and EPC mean
/// anything to the core; the rest is plain storage.
#[derive(Clone, PartialEq, Eq)]
pub struct Cp0RegFile {
    data: [WordType; CP0_REGFILE_CNT],
}

impl Index<usize> for Cp0RegFile {
    type Output = WordType;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<usize> for Cp0RegFile {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl Debug for Cp0RegFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "cp0 {{")?;
        for (i, val) in self.data.iter().enumerate() {
            if i % 8 == 0 {
                write!(f, "  ")?;
            }

            write!(f, "{:>6}: 0x{:08x}  ", CP0_REG_NAME[i], val)?;

            if i % 8 == 7 {
                writeln!(f)?;
            }
        }

        write!(f, "}}")
    }
}

impl Cp0RegFile {
    pub fn new() -> Self {
        Self {
            data: [0; CP0_REGFILE_CNT],
        }
    }

    pub fn status(&self) -> Status {
        Status::from_bits_retain(self.data[cp0_index::STATUS])
    }

    pub fn cause(&self) -> Cause {
        Cause(self.data[cp0_index::CAUSE])
    }

    pub fn set_cause(&mut self, cause: Cause) {
        self.data[cp0_index::CAUSE] = cause.0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordType> {
        self.data.iter()
    }
}
