#![cfg(test)]
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

use crate::{
    config::arch_config::{REGFILE_CNT, WordType},
    device::Bus,
    isa::mips::{
        cop0::{Cause, cp0_index},
        executor::MipsCPU,
        instruction::{MipsInstr, MipsInstrInfo, exec_mapping::get_exec_func},
        trap::{Exception, trap_controller::TrapController},
    },
    ram::Ram,
    utils::UnsignedInteger,
    vector_config::{RAM_EXCEPTION_VECTOR, ROM_EXCEPTION_VECTOR},
};

/// Where test programs start, in kseg0.
pub(super) const TEST_PC: WordType = 0x8000_1000;
/// Scratch data area, in kseg0.
pub(super) const DATA_BASE: WordType = 0x8000_8000;

pub(super) struct TestCPUBuilder {
    cpu: MipsCPU<Ram>,
    pc: WordType,
}

impl TestCPUBuilder {
    pub(super) fn new() -> Self {
        Self {
            cpu: MipsCPU::new(Ram::new()),
            pc: TEST_PC,
        }
    }

    pub(super) fn reg(mut self, idx: u8, value: WordType) -> Self {
        self.cpu.state.gpr.write(idx, value);
        self
    }

    pub(super) fn hi(mut self, value: WordType) -> Self {
        self.cpu.state.hi = value;
        self
    }

    pub(super) fn lo(mut self, value: WordType) -> Self {
        self.cpu.state.lo = value;
        self
    }

    /// Pipeline start address; applied by [`TestCPUBuilder::build`].
    pub(super) fn pc(mut self, value: WordType) -> Self {
        self.pc = value;
        self
    }

    pub(super) fn cp0(mut self, idx: usize, value: WordType) -> Self {
        self.cpu.state.cp0[idx] = value;
        self
    }

    pub(super) fn status(self, value: WordType) -> Self {
        self.cp0(cp0_index::STATUS, value)
    }

    pub(super) fn mem<T: UnsignedInteger>(mut self, addr: WordType, value: T) -> Self {
        self.cpu.bus.write(addr, value);
        self
    }

    pub(super) fn program_at(mut self, addr: WordType, instrs: &[u32]) -> Self {
        assert!(self.cpu.bus.load_program(addr, instrs));
        self
    }

    pub(super) fn program(self, instrs: &[u32]) -> Self {
        let pc = self.pc;
        self.program_at(pc, instrs)
    }

    pub(super) fn build(mut self) -> MipsCPU<Ram> {
        self.cpu.restart_at(self.pc).unwrap();
        self.cpu
    }
}

pub(super) struct CPUChecker<'a> {
    pub(super) cpu: &'a mut MipsCPU<Ram>,
}

impl<'a> CPUChecker<'a> {
    pub(super) fn new(cpu: &'a mut MipsCPU<Ram>) -> Self {
        // raw storage, not the masked read
        assert_eq!(cpu.state.gpr[0], 0, "r0 was written");
        Self { cpu }
    }

    pub(super) fn reg(self, idx: u8, value: WordType) -> Self {
        assert_eq!(
            self.cpu.state.gpr.read_one(idx),
            value,
            "Register #{} incorrect",
            idx,
        );
        self
    }

    pub(super) fn hi(self, value: WordType) -> Self {
        assert_eq!(self.cpu.state.hi, value, "HI incorrect");
        self
    }

    pub(super) fn lo(self, value: WordType) -> Self {
        assert_eq!(self.cpu.state.lo, value, "LO incorrect");
        self
    }

    /// Address of the instruction retiring next.
    pub(super) fn pc(self, value: WordType) -> Self {
        assert_eq!(self.cpu.state.current_pc, value, "PC incorrect");
        self
    }

    pub(super) fn next_pc(self, value: WordType) -> Self {
        assert_eq!(self.cpu.state.next_pc, value, "next PC incorrect");
        self
    }

    pub(super) fn mem<T>(self, addr: WordType, value: WordType) -> Self
    where
        T: UnsignedInteger,
    {
        assert_eq!(
            self.cpu.bus.read::<T>(addr).into(),
            value,
            "Memory value incorrect at {:#010x}",
            addr
        );
        self
    }

    pub(super) fn cp0(self, idx: usize, value: WordType) -> Self {
        assert_eq!(
            self.cpu.state.cp0[idx], value,
            "CP0 register #{} incorrect",
            idx
        );
        self
    }

    pub(super) fn status(self, value: WordType) -> Self {
        self.cp0(cp0_index::STATUS, value)
    }

    /// The last exception taken was `exception` and the core sits at a vector.
    pub(super) fn exception(self, exception: Exception) -> Self {
        let cause = self.cpu.state.cp0.cause();
        assert_eq!(cause.exception(), Some(exception), "CAUSE code incorrect");
        let pc = self.cpu.state.current_pc;
        assert!(
            pc == ROM_EXCEPTION_VECTOR || pc == RAM_EXCEPTION_VECTOR,
            "PC {:#010x} is not an exception vector",
            pc
        );
        self
    }

    pub(super) fn branch_delay(self, set: bool) -> Self {
        assert_eq!(
            Cause(self.cpu.state.cp0[cp0_index::CAUSE]).branch_delay(),
            set,
            "CAUSE.BD incorrect"
        );
        self
    }
}

/// Run one semantic directly, bypassing fetch and decode.
pub(super) fn run_test_exec<F, G>(instr: MipsInstr, info: MipsInstrInfo, build: F, check: G)
where
    F: FnOnce(TestCPUBuilder) -> TestCPUBuilder,
    G: FnOnce(CPUChecker) -> CPUChecker,
{
    let mut cpu = build(TestCPUBuilder::new()).build();
    if let Err(exception) = get_exec_func::<Ram>(instr)(info, &mut cpu) {
        TrapController::raise(&mut cpu, exception);
    }
    check(CPUChecker::new(&mut cpu));
}

/// Place `raw_instr` at the builder's PC and retire it.
pub(super) fn run_test_exec_decode<F, G>(raw_instr: u32, build: F, check: G)
where
    F: FnOnce(TestCPUBuilder) -> TestCPUBuilder,
    G: FnOnce(CPUChecker) -> CPUChecker,
{
    let mut cpu = build(TestCPUBuilder::new())
        .program(&[raw_instr])
        .build();
    cpu.step();
    check(CPUChecker::new(&mut cpu));
}

pub(super) struct ExecTester {
    rng: ChaCha12Rng,
}

impl ExecTester {
    pub(super) fn new() -> Self {
        Self {
            rng: ChaCha12Rng::seed_from_u64(3000),
        }
    }

    pub(super) fn rand_imm16(&mut self) -> u16 {
        self.rng.random()
    }

    pub(super) fn rand_word(&mut self) -> WordType {
        self.rng.random_range(0..=WordType::MAX)
    }

    pub(super) fn rand_word2(&mut self) -> (WordType, WordType) {
        (self.rand_word(), self.rand_word())
    }

    pub(super) fn rand_reg_idx(&mut self) -> u8 {
        self.rng.random_range(1..REGFILE_CNT) as u8
    }

    pub(super) fn rand_reg_idx2(&mut self) -> (u8, u8) {
        (self.rand_reg_idx(), self.rand_reg_idx())
    }

    pub(super) fn rand_unique_reg_idx2(&mut self) -> (u8, u8) {
        let idx1 = self.rand_reg_idx();
        let mut idx2 = self.rand_reg_idx();
        while idx1 == idx2 {
            idx2 = self.rand_reg_idx();
        }
        (idx1, idx2)
    }

    pub(super) fn test_rand_r_with(
        &mut self,
        instr: MipsInstr,
        lhs: WordType,
        rhs: WordType,
        expected: WordType,
    ) {
        let rd = self.rand_reg_idx();
        let (rs, rt) = self.rand_unique_reg_idx2();
        let info = MipsInstrInfo::R {
            rs,
            rt,
            rd,
            shamt: 0,
        };

        run_test_exec(
            instr,
            info,
            |builder| builder.reg(rs, lhs).reg(rt, rhs),
            |checker| checker.reg(rd, expected).pc(TEST_PC + 4),
        );
    }

    pub(super) fn test_rand_r<F>(&mut self, instr: MipsInstr, calc: F)
    where
        F: FnOnce(WordType, WordType) -> WordType,
    {
        let (val1, val2) = self.rand_word2();
        self.test_rand_r_with(instr, val1, val2, calc(val1, val2));
    }

    pub(super) fn test_rand_i_with(
        &mut self,
        instr: MipsInstr,
        lhs: WordType,
        imm: u16,
        expected: WordType,
    ) {
        let (rt, rs) = self.rand_reg_idx2();
        let info = MipsInstrInfo::I { rs, rt, imm };

        run_test_exec(
            instr,
            info,
            |builder| builder.reg(rs, lhs),
            |checker| checker.reg(rt, expected).pc(TEST_PC + 4),
        );
    }

    /// `calc` receives the raw 16-bit immediate.
    pub(super) fn test_rand_i<F>(&mut self, instr: MipsInstr, calc: F)
    where
        F: FnOnce(WordType, u16) -> WordType,
    {
        let val = self.rand_word();
        let imm = self.rand_imm16();
        self.test_rand_i_with(instr, val, imm, calc(val, imm));
    }
}
