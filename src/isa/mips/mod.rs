mod cpu_tester;

pub mod context;
pub mod cop0;
pub mod debugger;
pub mod decoder;
pub mod executor;
pub mod instruction;
pub mod scheduler;
pub mod trap;

pub use context::{CONTEXT_SIZE, ContextError};
pub use debugger::{MipsReg, RegisterError};
pub use executor::{CpuState, MipsCPU};
pub use scheduler::{Scheduler, SchedulerError};
pub use trap::Exception;

/// Identity reported to host tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuIdentity {
    pub name: &'static str,
    pub family: &'static str,
    pub version: &'static str,
    pub credits: &'static str,
}

pub const IDENTITY: CpuIdentity = CpuIdentity {
    name: "MIPS",
    family: "MIPS-I R3000",
    version: "1.0",
    credits: "mips-emulator contributors",
};
