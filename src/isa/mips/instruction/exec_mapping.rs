use crate::{
    config::arch_config::WordType,
    device::Bus,
    isa::mips::{
        instruction::{ExecFn, MipsInstr, MipsInstrInfo, exec_function::*, normal_exec},
        trap::{Exception, trap_controller::TrapController},
    },
};

pub(in crate::isa::mips) fn get_exec_func<B: Bus>(instr: MipsInstr) -> ExecFn<B> {
    match instr {
        // Arith
        MipsInstr::ADD => exec_arith::<B, ExecAdd>,
        MipsInstr::ADDU => exec_arith::<B, ExecAddu>,
        MipsInstr::SUB => exec_arith::<B, ExecSub>,
        MipsInstr::SUBU => exec_arith::<B, ExecSubu>,
        MipsInstr::ADDI => exec_arith_imm::<B, ExecAdd, true>,
        MipsInstr::ADDIU => exec_arith_imm::<B, ExecAddu, true>,

        // Cond set
        MipsInstr::SLT => exec_arith::<B, ExecSignedLess>,
        MipsInstr::SLTU => exec_arith::<B, ExecUnsignedLess>,
        MipsInstr::SLTI => exec_arith_imm::<B, ExecSignedLess, true>,
        MipsInstr::SLTIU => exec_arith_imm::<B, ExecUnsignedLess, true>,

        // Bit
        MipsInstr::AND => exec_arith::<B, ExecAnd>,
        MipsInstr::OR => exec_arith::<B, ExecOr>,
        MipsInstr::XOR => exec_arith::<B, ExecXor>,
        MipsInstr::NOR => exec_arith::<B, ExecNor>,
        MipsInstr::ANDI => exec_arith_imm::<B, ExecAnd, false>,
        MipsInstr::ORI => exec_arith_imm::<B, ExecOr, false>,
        MipsInstr::XORI => exec_arith_imm::<B, ExecXor, false>,
        MipsInstr::LUI => exec_arith_imm::<B, ExecLoadUpper, false>,

        // Shift
        MipsInstr::SLL => exec_shift::<B, ExecSLL, false>,
        MipsInstr::SRL => exec_shift::<B, ExecSRL, false>,
        MipsInstr::SRA => exec_shift::<B, ExecSRA, false>,
        MipsInstr::SLLV => exec_shift::<B, ExecSLL, true>,
        MipsInstr::SRLV => exec_shift::<B, ExecSRL, true>,
        MipsInstr::SRAV => exec_shift::<B, ExecSRA, true>,

        // Multiply / divide
        MipsInstr::MULT => exec_mul_div::<B, ExecMult>,
        MipsInstr::MULTU => exec_mul_div::<B, ExecMultu>,
        MipsInstr::DIV => exec_mul_div::<B, ExecDiv>,
        MipsInstr::DIVU => exec_mul_div::<B, ExecDivu>,

        MipsInstr::MFHI => |info, cpu| {
            if let MipsInstrInfo::R { rd, .. } = info {
                normal_exec(cpu, |cpu| {
                    if rd != 0 {
                        cpu.state.gpr.write(rd, cpu.state.hi);
                    }
                    Ok(())
                })
            } else {
                std::unreachable!();
            }
        },
        MipsInstr::MFLO => |info, cpu| {
            if let MipsInstrInfo::R { rd, .. } = info {
                normal_exec(cpu, |cpu| {
                    if rd != 0 {
                        cpu.state.gpr.write(rd, cpu.state.lo);
                    }
                    Ok(())
                })
            } else {
                std::unreachable!();
            }
        },
        MipsInstr::MTHI => |info, cpu| {
            if let MipsInstrInfo::R { rs, rd, .. } = info {
                normal_exec(cpu, |cpu| {
                    if rd != 0 {
                        return Err(Exception::ReservedInstruction);
                    }
                    cpu.state.hi = cpu.state.gpr.read_one(rs);
                    Ok(())
                })
            } else {
                std::unreachable!();
            }
        },
        MipsInstr::MTLO => |info, cpu| {
            if let MipsInstrInfo::R { rs, rd, .. } = info {
                normal_exec(cpu, |cpu| {
                    if rd != 0 {
                        return Err(Exception::ReservedInstruction);
                    }
                    cpu.state.lo = cpu.state.gpr.read_one(rs);
                    Ok(())
                })
            } else {
                std::unreachable!();
            }
        },

        // Branch
        MipsInstr::BEQ => exec_branch::<B, ExecEqual>,
        MipsInstr::BNE => exec_branch::<B, ExecNotEqual>,
        MipsInstr::BLEZ => exec_branch_zero::<B, ExecSignedLessEqual>,
        MipsInstr::BGTZ => exec_branch_zero::<B, ExecSignedGreat>,
        MipsInstr::BLTZ => exec_branch_regimm::<B, ExecSignedLess, false>,
        MipsInstr::BGEZ => exec_branch_regimm::<B, ExecSignedGreatEqual, false>,
        MipsInstr::BLTZAL => exec_branch_regimm::<B, ExecSignedLess, true>,
        MipsInstr::BGEZAL => exec_branch_regimm::<B, ExecSignedGreatEqual, true>,

        // Jump
        MipsInstr::J => |info, cpu| {
            if let MipsInstrInfo::J { target } = info {
                let target = jump_target(cpu.state.next_pc, target);
                cpu.redirect(target)
            } else {
                std::unreachable!();
            }
        },
        MipsInstr::JAL => |info, cpu| {
            if let MipsInstrInfo::J { target } = info {
                let link = cpu.state.next_pc.wrapping_add(4);
                cpu.state.gpr.write(31, link);
                let target = jump_target(cpu.state.next_pc, target);
                cpu.redirect(target)
            } else {
                std::unreachable!();
            }
        },
        MipsInstr::JR => |info, cpu| {
            if let MipsInstrInfo::R { rs, rd, .. } = info {
                if rd != 0 {
                    return Err(Exception::ReservedInstruction);
                }
                let target = cpu.state.gpr.read_one(rs);
                cpu.redirect(target)
            } else {
                std::unreachable!();
            }
        },
        MipsInstr::JALR => |info, cpu| {
            if let MipsInstrInfo::R { rs, rd, .. } = info {
                if rd != 0 {
                    let link = cpu.state.next_pc.wrapping_add(4);
                    cpu.state.gpr.write(rd, link);
                }
                let target = cpu.state.gpr.read_one(rs);
                cpu.redirect(target)
            } else {
                std::unreachable!();
            }
        },

        // Traps
        MipsInstr::SYSCALL => |_info, _cpu| Err(Exception::Syscall),
        MipsInstr::BREAK => |_info, _cpu| Err(Exception::Breakpoint),

        // COP0
        MipsInstr::MFC0 => |info, cpu| {
            if let MipsInstrInfo::Cop { rt, rd } = info {
                normal_exec(cpu, |cpu| {
                    if rt != 0 {
                        cpu.state.gpr.write(rt, cpu.state.cp0[rd as usize]);
                    }
                    Ok(())
                })
            } else {
                std::unreachable!();
            }
        },
        MipsInstr::MTC0 => |info, cpu| {
            if let MipsInstrInfo::Cop { rt, rd } = info {
                normal_exec(cpu, |cpu| {
                    cpu.state.cp0[rd as usize] = cpu.state.gpr.read_one(rt);
                    Ok(())
                })
            } else {
                std::unreachable!();
            }
        },
        MipsInstr::RFE => |_info, cpu| {
            normal_exec(cpu, |cpu| {
                TrapController::rfe(cpu);
                Ok(())
            })
        },

        // Load
        MipsInstr::LB => exec_load::<B, u8, true>,
        MipsInstr::LBU => exec_load::<B, u8, false>,
        MipsInstr::LH => exec_load::<B, u16, true>,
        MipsInstr::LHU => exec_load::<B, u16, false>,
        MipsInstr::LW => exec_load::<B, u32, false>,

        // Store
        MipsInstr::SB => exec_store::<B, u8>,
        MipsInstr::SH => exec_store::<B, u16>,
        MipsInstr::SW => exec_store::<B, u32>,

        MipsInstr::Stub(_) => |_info, cpu| {
            log::debug!(
                "unimplemented instruction {:#010x} at {:#010x} skipped",
                cpu.state.current_instruction,
                cpu.state.current_pc
            );
            cpu.advance();
            Ok(())
        },
    }
}

/// J/JAL keep the 256 MB segment of the delay slot.
#[inline]
fn jump_target(next_pc: WordType, target: u32) -> WordType {
    (next_pc & 0xf000_0000) | (target << 2)
}
