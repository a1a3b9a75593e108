pub(super) mod exec_function;
pub mod exec_mapping;

use crate::{
    device::Bus,
    isa::mips::{executor::MipsCPU, trap::Exception},
};

pub(super) type ExecFn<B> = fn(MipsInstrInfo, &mut MipsCPU<B>) -> Result<(), Exception>;

/// Every MIPS-I opcode the core knows about.
///
/// Opcode classes that are deliberately left unimplemented decode to
/// [`MipsInstr::Stub`] and only advance the pipeline.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipsInstr {
    // SPECIAL
    SLL,
    SRL,
    SRA,
    SLLV,
    SRLV,
    SRAV,
    JR,
    JALR,
    SYSCALL,
    BREAK,
    MFHI,
    MTHI,
    MFLO,
    MTLO,
    MULT,
    MULTU,
    DIV,
    DIVU,
    ADD,
    ADDU,
    SUB,
    SUBU,
    AND,
    OR,
    XOR,
    NOR,
    SLT,
    SLTU,

    // REGIMM
    BLTZ,
    BGEZ,
    BLTZAL,
    BGEZAL,

    J,
    JAL,
    BEQ,
    BNE,
    BLEZ,
    BGTZ,

    ADDI,
    ADDIU,
    SLTI,
    SLTIU,
    ANDI,
    ORI,
    XORI,
    LUI,

    // COP0
    MFC0,
    MTC0,
    RFE,

    LB,
    LH,
    LW,
    LBU,
    LHU,
    SB,
    SH,
    SW,

    Stub(Unimplemented),
}

/// Opcode classes that decode but have no semantics beyond a pipeline advance.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unimplemented {
    /// CFC0, CTC0, BC0 and CP0 operations other than RFE.
    Cop0,
    Cop1,
    Cop2,
    LWL,
    LWR,
    SWL,
    SWR,
    LWC1,
    LWC2,
    SWC1,
    SWC2,
}

/// Operand fields, extracted once per instruction.
///
/// `imm` is the raw 16-bit field; each semantic decides between sign and zero extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipsInstrInfo {
    None,
    R { rs: u8, rt: u8, rd: u8, shamt: u8 },
    I { rs: u8, rt: u8, imm: u16 },
    J { target: u32 },
    Cop { rt: u8, rd: u8 },
}

/// Run `f` and retire the instruction with a sequential advance.
#[inline(always)]
pub(super) fn normal_exec<B, F>(cpu: &mut MipsCPU<B>, f: F) -> Result<(), Exception>
where
    B: Bus,
    F: FnOnce(&mut MipsCPU<B>) -> Result<(), Exception>,
{
    f(cpu)?;
    cpu.advance();
    Ok(())
}
