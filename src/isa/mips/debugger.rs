use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use phf::phf_map;

use crate::{
    config::arch_config::{CP0_REGFILE_CNT, REG_NAME, REGFILE_CNT, WordType},
    device::Bus,
    isa::{
        DebugTarget,
        mips::{executor::MipsCPU, trap::trap_controller::TrapController},
    },
};

/// Registers visible to debug tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipsReg {
    /// Address of the instruction retiring next.
    Pc,
    /// Address of the prefetched delay slot.
    Oc,
    Hi,
    Lo,
    /// No architectural stack pointer; always reads as 0.
    Sp,
    R(u8),
    Cp0(u8),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RegisterError {
    #[error("unknown register name `{0}`")]
    UnknownName(String),
    #[error("register index {0} out of range")]
    OutOfRange(u8),
}

static FIXED_NAMES: phf::Map<&'static str, MipsReg> = phf_map! {
    "PC" => MipsReg::Pc,
    "OC" => MipsReg::Oc,
    "HI" => MipsReg::Hi,
    "LO" => MipsReg::Lo,
    "SP" => MipsReg::Sp,
    "RANDOM" => MipsReg::Cp0(1),
    "BADVADDR" => MipsReg::Cp0(8),
    "STATUS" => MipsReg::Cp0(12),
    "CAUSE" => MipsReg::Cp0(13),
    "EPC" => MipsReg::Cp0(14),
};

/// Both banks hold 32 registers; out-of-range `R`/`Cp0` indices wrap.
const REG_IDX_MASK: u8 = 31;

const ALL_CNT: usize = 4 + REGFILE_CNT + CP0_REGFILE_CNT;

impl MipsReg {
    /// Every register a dump should show, in display order.
    pub const ALL: [MipsReg; ALL_CNT] = {
        let mut all = [MipsReg::Pc; ALL_CNT];
        all[1] = MipsReg::Oc;
        all[2] = MipsReg::Hi;
        all[3] = MipsReg::Lo;
        let mut i = 0;
        while i < REGFILE_CNT {
            all[4 + i] = MipsReg::R(i as u8);
            all[4 + REGFILE_CNT + i] = MipsReg::Cp0(i as u8);
            i += 1;
        }
        all
    };
}

fn parse_index(digits: &str, limit: usize) -> Option<Result<u8, RegisterError>> {
    let idx: u8 = digits.parse().ok()?;
    if (idx as usize) < limit {
        Some(Ok(idx))
    } else {
        Some(Err(RegisterError::OutOfRange(idx)))
    }
}

impl FromStr for MipsReg {
    type Err = RegisterError;

    /// Case-insensitive: `pc`, `OC`, `hi`, `r5`, `CP0R12`, `status`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();

        if let Some(reg) = FIXED_NAMES.get(name.as_str()) {
            return Ok(*reg);
        }
        if let Some(idx) = REG_NAME.iter().position(|n| n.eq_ignore_ascii_case(&name)) {
            return Ok(MipsReg::R(idx as u8));
        }
        if let Some(idx) = name.strip_prefix("CP0R") {
            if let Some(idx) = parse_index(idx, CP0_REGFILE_CNT) {
                return idx.map(MipsReg::Cp0);
            }
        }
        if let Some(idx) = name.strip_prefix('R') {
            if let Some(idx) = parse_index(idx, REGFILE_CNT) {
                return idx.map(MipsReg::R);
            }
        }

        Err(RegisterError::UnknownName(s.to_string()))
    }
}

impl Display for MipsReg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MipsReg::Pc => write!(f, "PC"),
            MipsReg::Oc => write!(f, "OC"),
            MipsReg::Hi => write!(f, "HI"),
            MipsReg::Lo => write!(f, "LO"),
            MipsReg::Sp => write!(f, "SP"),
            MipsReg::R(idx) => write!(f, "R{}", idx),
            MipsReg::Cp0(idx) => write!(f, "CP0R{}", idx),
        }
    }
}

impl<B: Bus> MipsCPU<B> {
    pub fn get_reg(&self, reg: MipsReg) -> WordType {
        match reg {
            MipsReg::Pc => self.state.current_pc,
            MipsReg::Oc => self.state.next_pc,
            MipsReg::Hi => self.state.hi,
            MipsReg::Lo => self.state.lo,
            MipsReg::Sp => self.get_sp(),
            MipsReg::R(idx) => self.state.gpr.read_one(idx & REG_IDX_MASK),
            MipsReg::Cp0(idx) => self.state.cp0[(idx & REG_IDX_MASK) as usize],
        }
    }

    /// PC writes restart the pipeline at the new address. OC writes only refill the
    /// delay slot. Either one takes an address error if the target is invalid.
    pub fn set_reg(&mut self, reg: MipsReg, value: WordType) {
        let primed = match reg {
            MipsReg::Pc => self.restart_at(value),
            MipsReg::Oc => self.prime(value),
            MipsReg::Hi => {
                self.state.hi = value;
                Ok(())
            }
            MipsReg::Lo => {
                self.state.lo = value;
                Ok(())
            }
            MipsReg::Sp => {
                self.set_sp(value);
                Ok(())
            }
            MipsReg::R(idx) => {
                self.state.gpr.write(idx & REG_IDX_MASK, value);
                Ok(())
            }
            MipsReg::Cp0(idx) => {
                self.state.cp0[(idx & REG_IDX_MASK) as usize] = value;
                Ok(())
            }
        };

        if let Err(exception) = primed {
            log::debug!("debug write {} = {:#010x} faulted", reg, value);
            TrapController::raise(self, exception);
        }
    }

    pub fn get_sp(&self) -> WordType {
        0
    }

    pub fn set_sp(&mut self, _value: WordType) {}
}

impl<B: Bus> DebugTarget for MipsCPU<B> {
    type Reg = MipsReg;

    fn read_pc(&self) -> WordType {
        self.state.current_pc
    }

    fn write_pc(&mut self, new_pc: WordType) {
        self.set_reg(MipsReg::Pc, new_pc);
    }

    fn read_reg(&self, reg: MipsReg) -> WordType {
        self.get_reg(reg)
    }

    fn write_reg(&mut self, reg: MipsReg, value: WordType) {
        self.set_reg(reg, value);
    }

    fn step(&mut self) {
        MipsCPU::step(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugEvent {
    StepCompleted { pc: WordType },
    BreakpointHit { pc: WordType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Breakpoint {
    pub pc: WordType,
}

impl Breakpoint {
    pub fn new(pc: WordType) -> Self {
        Self { pc }
    }
}

/// Breakpoints are matched against the address of the instruction about to retire,
/// so images in ROM can be debugged without patching them.
pub struct Debugger<T: DebugTarget> {
    breakpoints: BTreeSet<Breakpoint>,
    target: T,
}

impl<T: DebugTarget> Debugger<T> {
    pub fn new(target: T) -> Self {
        Self {
            breakpoints: BTreeSet::new(),
            target,
        }
    }

    pub fn breakpoints(&self) -> &BTreeSet<Breakpoint> {
        &self.breakpoints
    }

    pub fn set_breakpoint(&mut self, addr: WordType) {
        self.breakpoints.insert(Breakpoint::new(addr));
    }

    pub fn clear_breakpoint(&mut self, addr: WordType) {
        self.breakpoints.remove(&Breakpoint::new(addr));
    }

    fn on_breakpoint(&self) -> bool {
        self.breakpoints
            .contains(&Breakpoint::new(self.target.read_pc()))
    }

    pub fn step(&mut self) -> DebugEvent {
        self.target.step();
        DebugEvent::StepCompleted {
            pc: self.target.read_pc(),
        }
    }

    /// Run at most `max_steps` instructions. A breakpoint under the current PC is
    /// stepped over first.
    pub fn continue_until(&mut self, max_steps: u64) -> DebugEvent {
        let mut rest = max_steps;
        while rest > 0 {
            self.target.step();
            rest -= 1;

            if self.on_breakpoint() {
                return DebugEvent::BreakpointHit {
                    pc: self.target.read_pc(),
                };
            }
        }

        DebugEvent::StepCompleted {
            pc: self.target.read_pc(),
        }
    }

    pub fn read_pc(&self) -> WordType {
        self.target.read_pc()
    }

    pub fn write_pc(&mut self, new_pc: WordType) {
        self.target.write_pc(new_pc)
    }

    pub fn read_reg(&self, reg: T::Reg) -> WordType {
        self.target.read_reg(reg)
    }

    pub fn write_reg(&mut self, reg: T::Reg, val: WordType) {
        self.target.write_reg(reg, val)
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }
}
