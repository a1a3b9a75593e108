use crate::{
    config::arch_config::WordType,
    cpu::RegFile,
    device::Bus,
    isa::mips::{
        CpuIdentity, IDENTITY,
        cop0::{Cp0RegFile, Status, cp0_index},
        decoder::{DecodeInstr, decode},
        instruction::exec_mapping::get_exec_func,
        trap::{Exception, trap_controller::TrapController},
    },
    utils::{UnsignedInteger, align_mask},
    vector_config::RESET_VECTOR,
};

/// Complete architectural state of one core, pipeline included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuState {
    /// Instruction retiring on the next step, and its address.
    pub current_instruction: u32,
    pub current_pc: WordType,
    /// Prefetched delay-slot instruction, and its address.
    pub next_instruction: u32,
    pub next_pc: WordType,
    pub hi: WordType,
    pub lo: WordType,
    pub gpr: RegFile,
    pub cp0: Cp0RegFile,
    pub cycles_remaining: i64,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            current_instruction: 0,
            current_pc: 0,
            next_instruction: 0,
            next_pc: 0,
            hi: 0,
            lo: 0,
            gpr: RegFile::new(),
            cp0: Cp0RegFile::new(),
            cycles_remaining: 0,
        }
    }
}

pub struct MipsCPU<B: Bus> {
    pub(super) state: CpuState,
    pub(super) bus: B,
}

impl<B: Bus> MipsCPU<B> {
    /// Build a core on top of `bus` and bring it out of reset.
    pub fn new(bus: B) -> Self {
        let mut cpu = Self {
            state: CpuState::default(),
            bus,
        };
        cpu.reset();
        cpu
    }

    pub fn identity(&self) -> CpuIdentity {
        IDENTITY
    }

    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Kernel mode, interrupts off, boot vectors, both pipeline slots primed at the
    /// reset vector.
    pub fn reset(&mut self) {
        self.state = CpuState::default();
        self.state.cp0[cp0_index::STATUS] = Status::BEV.bits();

        if let Err(exception) = self.restart_at(RESET_VECTOR) {
            TrapController::raise(self, exception);
        }
        log::debug!("reset, first fetch at {:#010x}", self.state.current_pc);
    }

    /// Run for `cycles` cycles. At least one instruction always retires.
    /// Returns the number of cycles consumed.
    pub fn execute(&mut self, cycles: i64) -> i64 {
        let cycles = cycles.max(1);
        self.state.cycles_remaining = cycles;

        loop {
            self.step();
            self.state.cycles_remaining -= 1;
            if self.state.cycles_remaining <= 0 {
                break;
            }
        }

        cycles - self.state.cycles_remaining
    }

    /// Retire the instruction in the current slot.
    pub fn step(&mut self) {
        let raw = self.state.current_instruction;
        let pc = self.state.current_pc;

        let Some(DecodeInstr(instr, info)) = decode(raw) else {
            log::warn!("Reserved instruction: {:#010x} at {:#010x}", raw, pc);
            TrapController::raise(self, Exception::ReservedInstruction);
            return;
        };

        log::trace!("{:#010x}: {:?}, {:?}", pc, instr, info);

        if let Err(exception) = get_exec_func::<B>(instr)(info, self) {
            TrapController::raise(self, exception);
        }
    }

    /// External interrupt lines are not latched on this core.
    pub fn set_irq_line(&mut self, _line: u32, _state: bool) {}

    pub fn set_nmi_line(&mut self, _state: bool) {}

    // ======================================
    //                Pipeline
    // ======================================

    fn shift_slots(&mut self) {
        self.state.current_pc = self.state.next_pc;
        self.state.current_instruction = self.state.next_instruction;
    }

    /// Sequential advance: the prefetched slot retires next.
    pub(in crate::isa::mips) fn advance(&mut self) {
        self.shift_slots();
        self.state.next_pc = self.state.next_pc.wrapping_add(4);
        self.state.next_instruction = self.bus.fetch_instruction(self.state.next_pc);
    }

    /// Validate `target` and fetch it into the `next_*` slot.
    pub(in crate::isa::mips) fn prime(&mut self, target: WordType) -> Result<(), Exception> {
        self.check_address::<u32>(target, Exception::AddressErrorLoad)?;

        self.bus.select_address_space(target);
        self.state.next_pc = target;
        self.state.next_instruction = self.bus.fetch_instruction(target);
        Ok(())
    }

    /// Taken branch: the delay slot retires next, then `target`.
    pub(in crate::isa::mips) fn redirect(&mut self, target: WordType) -> Result<(), Exception> {
        self.shift_slots();
        log::trace!(
            "redirect to {:#010x} after delay slot {:#010x}",
            target,
            self.state.current_pc
        );
        self.prime(target)
    }

    /// Discard both slots and continue at `target`.
    pub(in crate::isa::mips) fn restart_at(&mut self, target: WordType) -> Result<(), Exception> {
        self.prime(target)?;
        self.advance();
        Ok(())
    }

    // ======================================
    //            Address checks
    // ======================================

    pub(in crate::isa::mips) fn in_user_mode(&self) -> bool {
        self.state.cp0.status().contains(Status::KUC)
    }

    pub(in crate::isa::mips) fn is_valid_address(&self, addr: WordType, mask: WordType) -> bool {
        if addr & mask != 0 {
            return false;
        }
        !(self.in_user_mode() && addr & 0x8000_0000 != 0)
    }

    /// Check an access of width `T`, latching BADVADDR on failure.
    pub(in crate::isa::mips) fn check_address<T: UnsignedInteger>(
        &mut self,
        addr: WordType,
        fault: Exception,
    ) -> Result<(), Exception> {
        if self.is_valid_address(addr, align_mask::<T>()) {
            Ok(())
        } else {
            self.state.cp0[cp0_index::BADVADDR] = addr;
            Err(fault)
        }
    }

    /// Loads and stores are dropped while the caches are isolated or swapped.
    pub(in crate::isa::mips) fn cache_isolated(&self) -> bool {
        self.state
            .cp0
            .status()
            .intersects(Status::ISC | Status::SWC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        isa::mips::{cpu_tester::*, instruction::MipsInstr},
        ram::Ram,
        utils::negative_of,
        vector_config::{RAM_EXCEPTION_VECTOR, ROM_EXCEPTION_VECTOR},
    };

    #[test]
    fn test_reset() {
        let cpu = MipsCPU::new(Ram::new());
        assert_eq!(cpu.state.current_pc, RESET_VECTOR);
        assert_eq!(cpu.state.next_pc, RESET_VECTOR + 4);
        assert_eq!(cpu.state.cp0[cp0_index::STATUS], Status::BEV.bits());
        assert_eq!(cpu.bus().active_segment(), 0b101);
    }

    #[test]
    fn test_execute_budget() {
        let mut cpu = TestCPUBuilder::new().build();
        assert_eq!(cpu.execute(10), 10);
        assert_eq!(cpu.state.cycles_remaining, 0);
        assert_eq!(cpu.state.current_pc, TEST_PC + 40);

        // one instruction always retires
        assert_eq!(cpu.execute(0), 1);
        assert_eq!(cpu.execute(-5), 1);
        assert_eq!(cpu.state.current_pc, TEST_PC + 48);
    }

    #[test]
    fn test_execute_min_budget() {
        let mut cpu = TestCPUBuilder::new().build();
        assert_eq!(cpu.execute(i64::MIN), 1);
        assert_eq!(cpu.state.cycles_remaining, 0);
        assert_eq!(cpu.state.current_pc, TEST_PC + 4);
    }

    #[test]
    fn test_exec_arith() {
        let mut tester = ExecTester::new();

        for _ in 1..=100 {
            tester.test_rand_r(MipsInstr::ADDU, |lhs, rhs| lhs.wrapping_add(rhs));
            tester.test_rand_r(MipsInstr::SUBU, |lhs, rhs| lhs.wrapping_sub(rhs));
            tester.test_rand_r(MipsInstr::AND, |lhs, rhs| lhs & rhs);
            tester.test_rand_r(MipsInstr::OR, |lhs, rhs| lhs | rhs);
            tester.test_rand_r(MipsInstr::XOR, |lhs, rhs| lhs ^ rhs);
            tester.test_rand_r(MipsInstr::NOR, |lhs, rhs| !(lhs | rhs));
            tester.test_rand_r(MipsInstr::SLT, |lhs, rhs| {
                ((lhs as i32) < (rhs as i32)) as WordType
            });
            tester.test_rand_r(MipsInstr::SLTU, |lhs, rhs| (lhs < rhs) as WordType);

            tester.test_rand_i(MipsInstr::ADDIU, |lhs, imm| {
                lhs.wrapping_add(imm as i16 as i32 as WordType)
            });
            tester.test_rand_i(MipsInstr::ANDI, |lhs, imm| lhs & imm as WordType);
            tester.test_rand_i(MipsInstr::ORI, |lhs, imm| lhs | imm as WordType);
            tester.test_rand_i(MipsInstr::XORI, |lhs, imm| lhs ^ imm as WordType);
            tester.test_rand_i(MipsInstr::SLTI, |lhs, imm| {
                ((lhs as i32) < (imm as i16 as i32)) as WordType
            });
            tester.test_rand_i(MipsInstr::SLTIU, |lhs, imm| {
                (lhs < imm as i16 as i32 as WordType) as WordType
            });
        }

        run_test_exec_decode(
            0x2441_fffb, // addiu $1, $2, -5
            |builder| builder.reg(2, 10),
            |checker| checker.reg(1, 5).pc(TEST_PC + 4),
        );

        run_test_exec_decode(
            0x3c01_1234, // lui $1, 0x1234
            |builder| builder.reg(1, 0xffff_ffff),
            |checker| checker.reg(1, 0x1234_0000),
        );
    }

    #[test]
    fn test_overflow() {
        // add $3, $1, $2
        run_test_exec_decode(
            0x0022_1820,
            |builder| builder.reg(1, 0x7fff_ffff).reg(2, 1).reg(3, 0x55),
            |checker| {
                checker
                    .reg(3, 0x55)
                    .exception(Exception::Overflow)
                    .cp0(cp0_index::EPC, TEST_PC)
                    .pc(ROM_EXCEPTION_VECTOR)
            },
        );

        // addu $3, $1, $2
        run_test_exec_decode(
            0x0022_1821,
            |builder| builder.reg(1, 0x7fff_ffff).reg(2, 1),
            |checker| checker.reg(3, 0x8000_0000).pc(TEST_PC + 4),
        );

        // sub $3, $1, $2
        run_test_exec_decode(
            0x0022_1822,
            |builder| builder.reg(1, 0x8000_0000).reg(2, 1).status(0),
            |checker| {
                checker
                    .reg(3, 0)
                    .exception(Exception::Overflow)
                    .pc(RAM_EXCEPTION_VECTOR)
            },
        );

        // addi $1, $2, 1
        run_test_exec_decode(
            0x2041_0001,
            |builder| builder.reg(2, 0x7fff_ffff),
            |checker| checker.reg(1, 0).exception(Exception::Overflow),
        );

        // addi $1, $2, -1 does not overflow on negative operands
        run_test_exec_decode(
            0x2041_ffff,
            |builder| builder.reg(2, negative_of(5)),
            |checker| checker.reg(1, negative_of(6)).pc(TEST_PC + 4),
        );

        // overflow still traps when rd is r0
        run_test_exec_decode(
            0x0022_0020, // add $0, $1, $2
            |builder| builder.reg(1, 0x7fff_ffff).reg(2, 1),
            |checker| checker.exception(Exception::Overflow),
        );
    }

    #[test]
    fn test_shift() {
        run_test_exec_decode(
            0x0003_1100, // sll $2, $3, 4
            |builder| builder.reg(3, 0x8000_0001),
            |checker| checker.reg(2, 0x10),
        );
        run_test_exec_decode(
            0x0003_1102, // srl $2, $3, 4
            |builder| builder.reg(3, 0x8000_0000),
            |checker| checker.reg(2, 0x0800_0000),
        );
        run_test_exec_decode(
            0x0003_1103, // sra $2, $3, 4
            |builder| builder.reg(3, 0x8000_0000),
            |checker| checker.reg(2, 0xf800_0000),
        );
        run_test_exec_decode(
            0x0083_1007, // srav $2, $3, $4
            |builder| builder.reg(3, 0x8000_0000).reg(4, 0xffff_ff04),
            |checker| checker.reg(2, 0xf800_0000),
        );
        run_test_exec_decode(
            0x0083_1004, // sllv $2, $3, $4
            |builder| builder.reg(3, 1).reg(4, 33),
            |checker| checker.reg(2, 2),
        );
    }

    #[test]
    fn test_mult_div() {
        run_test_exec_decode(
            0x0022_0018, // mult $1, $2
            |builder| builder.reg(1, negative_of(3)).reg(2, 5),
            |checker| checker.hi(0xffff_ffff).lo(negative_of(15)),
        );
        run_test_exec_decode(
            0x0022_0019, // multu $1, $2
            |builder| builder.reg(1, 0xffff_ffff).reg(2, 2),
            |checker| checker.hi(1).lo(0xffff_fffe),
        );
        run_test_exec_decode(
            0x0022_001a, // div $1, $2
            |builder| builder.reg(1, negative_of(7)).reg(2, 2),
            |checker| checker.hi(negative_of(1)).lo(negative_of(3)),
        );
        run_test_exec_decode(
            0x0022_001b, // divu $1, $2
            |builder| builder.reg(1, 7).reg(2, 2),
            |checker| checker.hi(1).lo(3),
        );

        // division by zero
        run_test_exec_decode(
            0x0022_001a,
            |builder| builder.reg(1, negative_of(7)).reg(2, 0),
            |checker| checker.hi(negative_of(7)).lo(1).pc(TEST_PC + 4),
        );
        run_test_exec_decode(
            0x0022_001a,
            |builder| builder.reg(1, 7).reg(2, 0),
            |checker| checker.hi(7).lo(0xffff_ffff),
        );
        run_test_exec_decode(
            0x0022_001b,
            |builder| builder.reg(1, 7).reg(2, 0),
            |checker| checker.hi(7).lo(0xffff_ffff),
        );
        run_test_exec_decode(
            0x0022_001a,
            |builder| builder.reg(1, 0x8000_0000).reg(2, negative_of(1)),
            |checker| checker.hi(0).lo(0x8000_0000),
        );

        // mflo $3 / mfhi $4 / mthi $5 / mtlo $5
        run_test_exec_decode(
            0x0000_1812,
            |builder| builder.lo(0x1234),
            |checker| checker.reg(3, 0x1234),
        );
        run_test_exec_decode(
            0x0000_2010,
            |builder| builder.hi(0x4321),
            |checker| checker.reg(4, 0x4321),
        );
        run_test_exec_decode(
            0x00a0_0011,
            |builder| builder.reg(5, 0xabcd),
            |checker| checker.hi(0xabcd),
        );
        run_test_exec_decode(
            0x00a0_0013,
            |builder| builder.reg(5, 0xabcd),
            |checker| checker.lo(0xabcd),
        );
    }

    #[test]
    fn test_malformed_encodings() {
        // jr $1 with rd = 2
        run_test_exec_decode(
            0x0020_1008,
            |builder| builder.reg(1, 0x8000_2000),
            |checker| checker.exception(Exception::ReservedInstruction),
        );
        // mthi $5 with rd = 1
        run_test_exec_decode(
            0x00a0_0811,
            |builder| builder.reg(5, 1).hi(7),
            |checker| checker.hi(7).exception(Exception::ReservedInstruction),
        );
        // mult $1, $2 with rd = 3
        run_test_exec_decode(
            0x0022_1818,
            |builder| builder.reg(1, 2).reg(2, 3),
            |checker| checker.lo(0).exception(Exception::ReservedInstruction),
        );
        // divu with rd = 1
        run_test_exec_decode(
            0x0022_081b,
            |builder| builder.reg(1, 2).reg(2, 3),
            |checker| checker.exception(Exception::ReservedInstruction),
        );
        // blez $1 with rt = 2
        run_test_exec_decode(
            0x1822_0004,
            |builder| builder,
            |checker| checker.exception(Exception::ReservedInstruction),
        );
        // unknown funct
        run_test_exec_decode(
            0x0000_0001,
            |builder| builder,
            |checker| checker.exception(Exception::ReservedInstruction),
        );
    }

    #[test]
    fn test_load_store() {
        // lw $3, 8($2)
        run_test_exec_decode(
            0x8c43_0008,
            |builder| builder.reg(2, DATA_BASE).mem::<u32>(DATA_BASE + 8, 123),
            |checker| checker.reg(3, 123).pc(TEST_PC + 4),
        );
        // lb $3, -1($2)
        run_test_exec_decode(
            0x8043_ffff,
            |builder| builder.reg(2, DATA_BASE + 1).mem::<u8>(DATA_BASE, 0x80),
            |checker| checker.reg(3, 0xffff_ff80),
        );
        // lbu $3, 0($2)
        run_test_exec_decode(
            0x9043_0000,
            |builder| builder.reg(2, DATA_BASE).mem::<u8>(DATA_BASE, 0x80),
            |checker| checker.reg(3, 0x80),
        );
        // lh $3, 2($2)
        run_test_exec_decode(
            0x8443_0002,
            |builder| builder.reg(2, DATA_BASE).mem::<u16>(DATA_BASE + 2, 0x8001),
            |checker| checker.reg(3, 0xffff_8001),
        );
        // lhu $3, 2($2)
        run_test_exec_decode(
            0x9443_0002,
            |builder| builder.reg(2, DATA_BASE).mem::<u16>(DATA_BASE + 2, 0x8001),
            |checker| checker.reg(3, 0x8001),
        );
        // sw $3, -4($2)
        run_test_exec_decode(
            0xac43_fffc,
            |builder| builder.reg(2, DATA_BASE + 8).reg(3, 0xdead_beef),
            |checker| checker.mem::<u32>(DATA_BASE + 4, 0xdead_beef),
        );
        // sh / sb truncate
        run_test_exec_decode(
            0xa443_0000,
            |builder| builder.reg(2, DATA_BASE).reg(3, 0x1234_5678),
            |checker| checker.mem::<u32>(DATA_BASE, 0x5678),
        );
        run_test_exec_decode(
            0xa043_0003,
            |builder| builder.reg(2, DATA_BASE).reg(3, 0x1234_5678),
            |checker| checker.mem::<u32>(DATA_BASE, 0x7800_0000),
        );
    }

    #[test]
    fn test_address_errors() {
        for offset in [1u16, 2] {
            // lw $3, offset($0)
            run_test_exec_decode(
                0x8c03_0000 | offset as u32,
                |builder| builder.reg(3, 0x77),
                |checker| {
                    checker
                        .reg(3, 0x77)
                        .exception(Exception::AddressErrorLoad)
                        .cp0(cp0_index::BADVADDR, offset as WordType)
                },
            );
        }

        run_test_exec_decode(
            0x8c03_0004,
            |builder| builder.mem::<u32>(4, 0x99),
            |checker| checker.reg(3, 0x99).pc(TEST_PC + 4),
        );

        // sh $3, 1($0)
        run_test_exec_decode(
            0xa403_0001,
            |builder| builder,
            |checker| {
                checker
                    .exception(Exception::AddressErrorStore)
                    .cp0(cp0_index::BADVADDR, 1)
            },
        );

        // user mode cannot reach kseg0
        run_test_exec_decode(
            0x8c43_0000, // lw $3, 0($2)
            |builder| builder.pc(0x0000_1000).status(Status::KUC.bits()).reg(2, DATA_BASE),
            |checker| {
                checker
                    .exception(Exception::AddressErrorLoad)
                    .cp0(cp0_index::BADVADDR, DATA_BASE)
                    .status(Status::KUP.bits())
                    .pc(RAM_EXCEPTION_VECTOR)
            },
        );
    }

    #[test]
    fn test_r0_writes_suppressed() {
        let setup = |b: TestCPUBuilder| b.reg(1, 0x1234).reg(2, 0x5678).hi(9).lo(9);
        for raw in [
            0x0022_0021u32, // addu $0, $1, $2
            0x0001_0100,    // sll $0, $1, 4
            0x0000_0010,    // mfhi $0
            0x0000_0012,    // mflo $0
            0x2420_0005,    // addiu $0, $1, 5
            0x3c00_1234,    // lui $0, 0x1234
            0x8c00_0000,    // lw $0, 0($0)
            0x4000_6000,    // mfc0 $0, $12
            0x0020_0009,    // jalr $0, $1
        ] {
            run_test_exec_decode(raw, setup, |checker| checker.reg(0, 0));
        }
    }

    #[test]
    fn test_cache_isolation() {
        run_test_exec_decode(
            0xac43_0000, // sw $3, 0($2)
            |builder| {
                builder
                    .reg(2, DATA_BASE)
                    .reg(3, 0x55)
                    .status(Status::ISC.bits())
            },
            |checker| checker.mem::<u32>(DATA_BASE, 0).pc(TEST_PC + 4),
        );
        run_test_exec_decode(
            0x8c43_0001, // lw $3, 1($2) is not even checked
            |builder| builder.reg(2, DATA_BASE).status(Status::SWC.bits()),
            |checker| checker.reg(3, 0).pc(TEST_PC + 4),
        );
    }

    #[test]
    fn test_stubs_advance() {
        for raw in [
            0x8841_0000u32, // lwl
            0xb841_0000,    // swr
            0x4600_0000,    // cop1
            0x4800_0000,    // cop2
            0x4042_6000,    // cfc0
            0xc441_0000,    // lwc1
        ] {
            run_test_exec_decode(
                raw,
                |builder| builder.reg(1, DATA_BASE).reg(2, 3),
                |checker| checker.reg(1, DATA_BASE).reg(2, 3).pc(TEST_PC + 4),
            );
        }
    }

    #[test]
    fn test_branch_decode() {
        // beq $1, $2, 4
        run_test_exec_decode(
            0x1022_0004,
            |builder| builder.reg(1, 5).reg(2, 5),
            |checker| checker.pc(TEST_PC + 4).next_pc(TEST_PC + 4 + 16),
        );
        run_test_exec_decode(
            0x1022_0004,
            |builder| builder.reg(1, 5).reg(2, 6),
            |checker| checker.pc(TEST_PC + 4).next_pc(TEST_PC + 8),
        );
        // bne $1, $2, -4
        run_test_exec_decode(
            0x1422_fffc,
            |builder| builder.reg(1, 5).reg(2, 6),
            |checker| checker.next_pc(TEST_PC + 4 - 16),
        );
        // bgtz $1, 2
        run_test_exec_decode(
            0x1c20_0002,
            |builder| builder.reg(1, 1),
            |checker| checker.next_pc(TEST_PC + 12),
        );
        // blez $1, 2
        run_test_exec_decode(
            0x1820_0002,
            |builder| builder.reg(1, 1),
            |checker| checker.next_pc(TEST_PC + 8),
        );
        // bltz $1, 2
        run_test_exec_decode(
            0x0420_0002,
            |builder| builder.reg(1, negative_of(1)),
            |checker| checker.next_pc(TEST_PC + 12),
        );
        // bgezal $1, 2 links even when not taken
        run_test_exec_decode(
            0x0431_0002,
            |builder| builder.reg(1, negative_of(1)),
            |checker| checker.reg(31, TEST_PC + 8).next_pc(TEST_PC + 8),
        );
        // bltzal $31, 2 tests the link value, which is negative in kseg0
        run_test_exec_decode(
            0x07f0_0002,
            |builder| builder.reg(31, 1),
            |checker| checker.reg(31, TEST_PC + 8).next_pc(TEST_PC + 12),
        );
    }

    #[test]
    fn test_jump_decode() {
        // j 0x0000400 << 2
        run_test_exec_decode(
            0x0800_0400,
            |builder| builder,
            |checker| checker.next_pc((TEST_PC & 0xf000_0000) | 0x1000),
        );
        // jal 0x0000400 << 2
        run_test_exec_decode(
            0x0c00_0400,
            |builder| builder,
            |checker| {
                checker
                    .reg(31, TEST_PC + 8)
                    .next_pc((TEST_PC & 0xf000_0000) | 0x1000)
            },
        );
        // jr $1
        run_test_exec_decode(
            0x0020_0008,
            |builder| builder.reg(1, 0x8000_2468),
            |checker| checker.pc(TEST_PC + 4).next_pc(0x8000_2468),
        );
        // jalr $5, $1
        run_test_exec_decode(
            0x0020_2809,
            |builder| builder.reg(1, 0x8000_2468),
            |checker| checker.reg(5, TEST_PC + 8).next_pc(0x8000_2468),
        );
        // jr to a misaligned target faults in the branch
        run_test_exec_decode(
            0x0020_0008,
            |builder| builder.reg(1, 0x8000_2466),
            |checker| {
                checker
                    .exception(Exception::AddressErrorLoad)
                    .cp0(cp0_index::BADVADDR, 0x8000_2466)
                    .cp0(cp0_index::EPC, TEST_PC)
                    .branch_delay(true)
            },
        );
    }

    #[test]
    fn test_delay_slot() {
        let program = [
            0x1000_0002, // b +2
            0x2401_0001, // addiu $1, $0, 1   (delay slot)
            0x2402_0002, // addiu $2, $0, 2   (skipped)
            0x2403_0003, // addiu $3, $0, 3   (target)
        ];
        let mut cpu = TestCPUBuilder::new().program(&program).build();
        cpu.execute(3);
        CPUChecker::new(&mut cpu)
            .reg(1, 1)
            .reg(2, 0)
            .reg(3, 3)
            .pc(TEST_PC + 16);
    }

    #[test]
    fn test_exception_in_delay_slot() {
        let program = [
            0x1000_0002, // b +2
            0x0000_000c, // syscall (delay slot)
        ];
        let mut cpu = TestCPUBuilder::new().program(&program).build();
        cpu.execute(2);
        CPUChecker::new(&mut cpu)
            .exception(Exception::Syscall)
            .branch_delay(true)
            .cp0(cp0_index::EPC, TEST_PC);
    }

    #[test]
    fn test_syscall_break_rfe() {
        let user_pc = 0x0000_2000;
        run_test_exec_decode(
            0x0000_000c,
            |builder| {
                builder
                    .pc(user_pc)
                    .status((Status::KUC | Status::IEC | Status::BEV).bits())
            },
            |checker| {
                checker
                    .exception(Exception::Syscall)
                    .cp0(cp0_index::EPC, user_pc)
                    .branch_delay(false)
                    .status((Status::KUP | Status::IEP | Status::BEV).bits())
                    .pc(ROM_EXCEPTION_VECTOR)
            },
        );
        run_test_exec_decode(
            0x0000_000d,
            |builder| builder,
            |checker| checker.exception(Exception::Breakpoint),
        );
        run_test_exec_decode(
            0x4200_0010,
            |builder| builder.status(0b00_11_00),
            |checker| checker.status(0b00_00_11).pc(TEST_PC + 4),
        );
    }

    #[test]
    fn test_cop0_moves() {
        // mtc0 $2, $14
        run_test_exec_decode(
            0x4082_7000,
            |builder| builder.reg(2, 0x8000_1234),
            |checker| checker.cp0(cp0_index::EPC, 0x8000_1234),
        );
        // mfc0 $2, $13
        run_test_exec_decode(
            0x4002_6800,
            |builder| builder.cp0(cp0_index::CAUSE, 0x30),
            |checker| checker.reg(2, 0x30),
        );
    }
}
