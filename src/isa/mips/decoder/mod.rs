use std::fmt::Display;

use crate::isa::mips::instruction::{MipsInstr, MipsInstrInfo, Unimplemented};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeInstr(pub MipsInstr, pub MipsInstrInfo);

impl Display for DecodeInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}, {:?}", self.0, self.1)
    }
}

// ========================================
//  field extractors
// ========================================

#[inline]
pub fn op(raw: u32) -> u8 {
    (raw >> 26) as u8
}

#[inline]
pub fn rs(raw: u32) -> u8 {
    ((raw >> 21) & 0x1f) as u8
}

#[inline]
pub fn rt(raw: u32) -> u8 {
    ((raw >> 16) & 0x1f) as u8
}

#[inline]
pub fn rd(raw: u32) -> u8 {
    ((raw >> 11) & 0x1f) as u8
}

#[inline]
pub fn shamt(raw: u32) -> u8 {
    ((raw >> 6) & 0x1f) as u8
}

#[inline]
pub fn funct(raw: u32) -> u8 {
    (raw & 0x3f) as u8
}

#[inline]
pub fn imm(raw: u32) -> u16 {
    raw as u16
}

#[inline]
pub fn target(raw: u32) -> u32 {
    raw & 0x03ff_ffff
}

/// Coprocessor-operation flag (bit 25).
#[inline]
pub fn co(raw: u32) -> bool {
    raw & (1 << 25) != 0
}

mod opcode {
    pub const SPECIAL: u8 = 0x00;
    pub const REGIMM: u8 = 0x01;
    pub const J: u8 = 0x02;
    pub const JAL: u8 = 0x03;
    pub const BEQ: u8 = 0x04;
    pub const BNE: u8 = 0x05;
    pub const BLEZ: u8 = 0x06;
    pub const BGTZ: u8 = 0x07;
    pub const ADDI: u8 = 0x08;
    pub const ADDIU: u8 = 0x09;
    pub const SLTI: u8 = 0x0a;
    pub const SLTIU: u8 = 0x0b;
    pub const ANDI: u8 = 0x0c;
    pub const ORI: u8 = 0x0d;
    pub const XORI: u8 = 0x0e;
    pub const LUI: u8 = 0x0f;
    pub const COP0: u8 = 0x10;
    pub const COP1: u8 = 0x11;
    pub const COP2: u8 = 0x12;
    pub const LB: u8 = 0x20;
    pub const LH: u8 = 0x21;
    pub const LWL: u8 = 0x22;
    pub const LW: u8 = 0x23;
    pub const LBU: u8 = 0x24;
    pub const LHU: u8 = 0x25;
    pub const LWR: u8 = 0x26;
    pub const SB: u8 = 0x28;
    pub const SH: u8 = 0x29;
    pub const SWL: u8 = 0x2a;
    pub const SW: u8 = 0x2b;
    pub const SWR: u8 = 0x2e;
    pub const LWC1: u8 = 0x31;
    pub const LWC2: u8 = 0x32;
    pub const SWC1: u8 = 0x39;
    pub const SWC2: u8 = 0x3a;
}

fn decode_special(raw: u32) -> Option<MipsInstr> {
    let instr = match funct(raw) {
        0x00 => MipsInstr::SLL,
        0x02 => MipsInstr::SRL,
        0x03 => MipsInstr::SRA,
        0x04 => MipsInstr::SLLV,
        0x06 => MipsInstr::SRLV,
        0x07 => MipsInstr::SRAV,
        0x08 => MipsInstr::JR,
        0x09 => MipsInstr::JALR,
        0x0c => MipsInstr::SYSCALL,
        0x0d => MipsInstr::BREAK,
        0x10 => MipsInstr::MFHI,
        0x11 => MipsInstr::MTHI,
        0x12 => MipsInstr::MFLO,
        0x13 => MipsInstr::MTLO,
        0x18 => MipsInstr::MULT,
        0x19 => MipsInstr::MULTU,
        0x1a => MipsInstr::DIV,
        0x1b => MipsInstr::DIVU,
        0x20 => MipsInstr::ADD,
        0x21 => MipsInstr::ADDU,
        0x22 => MipsInstr::SUB,
        0x23 => MipsInstr::SUBU,
        0x24 => MipsInstr::AND,
        0x25 => MipsInstr::OR,
        0x26 => MipsInstr::XOR,
        0x27 => MipsInstr::NOR,
        0x2a => MipsInstr::SLT,
        0x2b => MipsInstr::SLTU,
        _ => return None,
    };
    Some(instr)
}

fn decode_regimm(raw: u32) -> Option<MipsInstr> {
    let instr = match rt(raw) {
        0x00 => MipsInstr::BLTZ,
        0x01 => MipsInstr::BGEZ,
        0x10 => MipsInstr::BLTZAL,
        0x11 => MipsInstr::BGEZAL,
        _ => return None,
    };
    Some(instr)
}

fn decode_cop0(raw: u32) -> MipsInstr {
    if co(raw) {
        return if funct(raw) == 0x10 {
            MipsInstr::RFE
        } else {
            MipsInstr::Stub(Unimplemented::Cop0)
        };
    }

    match rs(raw) {
        0x00 => MipsInstr::MFC0,
        0x04 => MipsInstr::MTC0,
        _ => MipsInstr::Stub(Unimplemented::Cop0),
    }
}

/// Decode a raw instruction word. `None` means the encoding is reserved.
pub fn decode(raw: u32) -> Option<DecodeInstr> {
    use opcode::*;

    let r_info = MipsInstrInfo::R {
        rs: rs(raw),
        rt: rt(raw),
        rd: rd(raw),
        shamt: shamt(raw),
    };
    let i_info = MipsInstrInfo::I {
        rs: rs(raw),
        rt: rt(raw),
        imm: imm(raw),
    };

    let decoded = match op(raw) {
        SPECIAL => DecodeInstr(decode_special(raw)?, r_info),
        REGIMM => DecodeInstr(decode_regimm(raw)?, i_info),
        J => DecodeInstr(MipsInstr::J, MipsInstrInfo::J { target: target(raw) }),
        JAL => DecodeInstr(MipsInstr::JAL, MipsInstrInfo::J { target: target(raw) }),
        BEQ => DecodeInstr(MipsInstr::BEQ, i_info),
        BNE => DecodeInstr(MipsInstr::BNE, i_info),
        BLEZ => DecodeInstr(MipsInstr::BLEZ, i_info),
        BGTZ => DecodeInstr(MipsInstr::BGTZ, i_info),
        ADDI => DecodeInstr(MipsInstr::ADDI, i_info),
        ADDIU => DecodeInstr(MipsInstr::ADDIU, i_info),
        SLTI => DecodeInstr(MipsInstr::SLTI, i_info),
        SLTIU => DecodeInstr(MipsInstr::SLTIU, i_info),
        ANDI => DecodeInstr(MipsInstr::ANDI, i_info),
        ORI => DecodeInstr(MipsInstr::ORI, i_info),
        XORI => DecodeInstr(MipsInstr::XORI, i_info),
        LUI => DecodeInstr(MipsInstr::LUI, i_info),
        COP0 => match decode_cop0(raw) {
            MipsInstr::RFE => DecodeInstr(MipsInstr::RFE, MipsInstrInfo::None),
            instr => DecodeInstr(
                instr,
                MipsInstrInfo::Cop {
                    rt: rt(raw),
                    rd: rd(raw),
                },
            ),
        },
        COP1 => DecodeInstr(MipsInstr::Stub(Unimplemented::Cop1), MipsInstrInfo::None),
        COP2 => DecodeInstr(MipsInstr::Stub(Unimplemented::Cop2), MipsInstrInfo::None),
        LB => DecodeInstr(MipsInstr::LB, i_info),
        LH => DecodeInstr(MipsInstr::LH, i_info),
        LW => DecodeInstr(MipsInstr::LW, i_info),
        LBU => DecodeInstr(MipsInstr::LBU, i_info),
        LHU => DecodeInstr(MipsInstr::LHU, i_info),
        SB => DecodeInstr(MipsInstr::SB, i_info),
        SH => DecodeInstr(MipsInstr::SH, i_info),
        SW => DecodeInstr(MipsInstr::SW, i_info),
        LWL => DecodeInstr(MipsInstr::Stub(Unimplemented::LWL), i_info),
        LWR => DecodeInstr(MipsInstr::Stub(Unimplemented::LWR), i_info),
        SWL => DecodeInstr(MipsInstr::Stub(Unimplemented::SWL), i_info),
        SWR => DecodeInstr(MipsInstr::Stub(Unimplemented::SWR), i_info),
        LWC1 => DecodeInstr(MipsInstr::Stub(Unimplemented::LWC1), i_info),
        LWC2 => DecodeInstr(MipsInstr::Stub(Unimplemented::LWC2), i_info),
        SWC1 => DecodeInstr(MipsInstr::Stub(Unimplemented::SWC1), i_info),
        SWC2 => DecodeInstr(MipsInstr::Stub(Unimplemented::SWC2), i_info),
        _ => return None,
    };

    Some(decoded)
}
