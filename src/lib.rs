pub mod config;
pub mod cpu;
pub mod device;
pub mod isa;
pub mod load;
pub mod ram;
pub mod utils;

pub use config::{ram_config, vector_config};

use std::path::Path;

use crate::{
    config::arch_config::WordType,
    isa::mips::{MipsCPU, MipsReg},
    load::LoadError,
    ram::Ram,
    vector_config::RESET_VECTOR,
};

#[derive(thiserror::Error, Debug)]
pub enum EmulatorError {
    #[error("cannot read image: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// One core wired to the reference [`Ram`] bus.
pub struct Emulator {
    cpu: MipsCPU<Ram>,
}

impl Emulator {
    /// Raw image, mapped at the reset vector.
    pub fn from_binary(path: &Path) -> Result<Self, EmulatorError> {
        let bytes = std::fs::read(path)?;
        let mut ram = Ram::new();
        load::load_bin(&mut ram, &bytes)?;
        Ok(Self::from_ram(ram, RESET_VECTOR))
    }

    /// ELF image. Execution starts at the ELF entry point.
    pub fn from_elf(path: &Path) -> Result<Self, EmulatorError> {
        let bytes = std::fs::read(path)?;
        let mut ram = Ram::new();
        let entry = load::load_elf(&mut ram, &bytes)?;
        Ok(Self::from_ram(ram, entry))
    }

    pub fn from_ram(ram: Ram, entry: WordType) -> Self {
        let mut cpu = MipsCPU::new(ram);
        if entry != RESET_VECTOR {
            cpu.set_reg(MipsReg::Pc, entry);
        }
        Self { cpu }
    }

    pub fn from_cpu(cpu: MipsCPU<Ram>) -> Self {
        Self { cpu }
    }

    /// Returns the cycles actually consumed.
    pub fn run(&mut self, cycles: i64) -> i64 {
        self.cpu.execute(cycles)
    }

    pub fn step(&mut self) {
        self.cpu.step();
    }

    pub fn cpu(&self) -> &MipsCPU<Ram> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut MipsCPU<Ram> {
        &mut self.cpu
    }

    pub fn into_cpu(self) -> MipsCPU<Ram> {
        self.cpu
    }
}
