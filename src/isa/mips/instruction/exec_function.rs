use crate::{
    config::arch_config::{SignedWordType, WordType},
    device::Bus,
    isa::mips::{executor::MipsCPU, instruction::MipsInstrInfo, trap::Exception},
    utils::{TruncateFrom, UnsignedInteger, sign_extend, word_extend},
};

/// ExecTrait will generate operation result to `exec_xxx` function.
/// ExecTrait::exec only do calculate.
/// `exec_xxx` function interact with other mod in CPU.
pub(super) trait ExecTrait<T> {
    fn exec(a: WordType, b: WordType) -> T;
}

// ========================================
//  register/immediate arithmetic
// ========================================

/// `rd = rs op rt`. The result is computed before the `rd == 0` check so trapping
/// forms still fault.
pub(super) fn exec_arith<B, F>(info: MipsInstrInfo, cpu: &mut MipsCPU<B>) -> Result<(), Exception>
where
    B: Bus,
    F: ExecTrait<Result<WordType, Exception>>,
{
    if let MipsInstrInfo::R { rs, rt, rd, .. } = info {
        let (val1, val2) = cpu.state.gpr.read(rs, rt);
        let rst = F::exec(val1, val2)?;
        if rd != 0 {
            cpu.state.gpr.write(rd, rst);
        }
    } else {
        std::unreachable!();
    }

    cpu.advance();
    Ok(())
}

/// `rt = rs op imm`. `SIGNED` selects word extension of the immediate, otherwise it
/// is zero extended.
pub(super) fn exec_arith_imm<B, F, const SIGNED: bool>(
    info: MipsInstrInfo,
    cpu: &mut MipsCPU<B>,
) -> Result<(), Exception>
where
    B: Bus,
    F: ExecTrait<Result<WordType, Exception>>,
{
    if let MipsInstrInfo::I { rs, rt, imm } = info {
        let val = cpu.state.gpr.read_one(rs);
        let imm = if SIGNED {
            word_extend(imm)
        } else {
            imm as WordType
        };
        let rst = F::exec(val, imm)?;
        if rt != 0 {
            cpu.state.gpr.write(rt, rst);
        }
    } else {
        std::unreachable!();
    }

    cpu.advance();
    Ok(())
}

/// Shift by `shamt`, or by `rs & 31` when `VARIABLE`. Nothing is computed for `rd == 0`.
pub(super) fn exec_shift<B, F, const VARIABLE: bool>(
    info: MipsInstrInfo,
    cpu: &mut MipsCPU<B>,
) -> Result<(), Exception>
where
    B: Bus,
    F: ExecTrait<WordType>,
{
    if let MipsInstrInfo::R { rs, rt, rd, shamt } = info {
        if rd != 0 {
            let amount = if VARIABLE {
                cpu.state.gpr.read_one(rs) & 31
            } else {
                shamt as WordType
            };
            let rst = F::exec(cpu.state.gpr.read_one(rt), amount);
            cpu.state.gpr.write(rd, rst);
        }
    } else {
        std::unreachable!();
    }

    cpu.advance();
    Ok(())
}

/// MULT/MULTU/DIV/DIVU: `F` yields `(hi, lo)`.
pub(super) fn exec_mul_div<B, F>(info: MipsInstrInfo, cpu: &mut MipsCPU<B>) -> Result<(), Exception>
where
    B: Bus,
    F: ExecTrait<(WordType, WordType)>,
{
    if let MipsInstrInfo::R { rs, rt, rd, .. } = info {
        if rd != 0 {
            return Err(Exception::ReservedInstruction);
        }
        let (val1, val2) = cpu.state.gpr.read(rs, rt);
        (cpu.state.hi, cpu.state.lo) = F::exec(val1, val2);
    } else {
        std::unreachable!();
    }

    cpu.advance();
    Ok(())
}

// ========================================
//  branches
// ========================================

#[inline]
fn branch_target<B: Bus>(cpu: &MipsCPU<B>, imm: u16) -> WordType {
    cpu.state.next_pc.wrapping_add(word_extend(imm) << 2)
}

#[inline]
fn branch_if<B: Bus>(cpu: &mut MipsCPU<B>, taken: bool, imm: u16) -> Result<(), Exception> {
    if taken {
        let target = branch_target(cpu, imm);
        cpu.redirect(target)
    } else {
        cpu.advance();
        Ok(())
    }
}

/// BEQ/BNE: compare `rs` against `rt`.
pub(super) fn exec_branch<B, F>(info: MipsInstrInfo, cpu: &mut MipsCPU<B>) -> Result<(), Exception>
where
    B: Bus,
    F: ExecTrait<bool>,
{
    if let MipsInstrInfo::I { rs, rt, imm } = info {
        let (val1, val2) = cpu.state.gpr.read(rs, rt);
        branch_if(cpu, F::exec(val1, val2), imm)
    } else {
        std::unreachable!();
    }
}

/// BLEZ/BGTZ: compare `rs` against zero, the `rt` field must be zero.
pub(super) fn exec_branch_zero<B, F>(
    info: MipsInstrInfo,
    cpu: &mut MipsCPU<B>,
) -> Result<(), Exception>
where
    B: Bus,
    F: ExecTrait<bool>,
{
    if let MipsInstrInfo::I { rs, rt, imm } = info {
        if rt != 0 {
            return Err(Exception::ReservedInstruction);
        }
        let val = cpu.state.gpr.read_one(rs);
        branch_if(cpu, F::exec(val, 0), imm)
    } else {
        std::unreachable!();
    }
}

/// REGIMM branches. With `LINK`, r31 is written before `rs` is read.
pub(super) fn exec_branch_regimm<B, F, const LINK: bool>(
    info: MipsInstrInfo,
    cpu: &mut MipsCPU<B>,
) -> Result<(), Exception>
where
    B: Bus,
    F: ExecTrait<bool>,
{
    if let MipsInstrInfo::I { rs, imm, .. } = info {
        if LINK {
            let link = cpu.state.next_pc.wrapping_add(4);
            cpu.state.gpr.write(31, link);
        }
        let val = cpu.state.gpr.read_one(rs);
        branch_if(cpu, F::exec(val, 0), imm)
    } else {
        std::unreachable!();
    }
}

// ========================================
//  memory
// ========================================

pub(super) fn exec_load<B, T, const EXTEND: bool>(
    info: MipsInstrInfo,
    cpu: &mut MipsCPU<B>,
) -> Result<(), Exception>
where
    B: Bus,
    T: UnsignedInteger,
{
    if cpu.cache_isolated() {
        cpu.advance();
        return Ok(());
    }

    if let MipsInstrInfo::I { rs, rt, imm } = info {
        let addr = cpu.state.gpr.read_one(rs).wrapping_add(word_extend(imm));
        cpu.check_address::<T>(addr, Exception::AddressErrorLoad)?;

        if rt != 0 {
            let mut data: WordType = cpu.bus.read::<T>(addr).into();
            if EXTEND {
                data = sign_extend(data, T::BITS as u32);
            }
            cpu.state.gpr.write(rt, data);
        }
    } else {
        std::unreachable!();
    }

    cpu.advance();
    Ok(())
}

pub(super) fn exec_store<B, T>(info: MipsInstrInfo, cpu: &mut MipsCPU<B>) -> Result<(), Exception>
where
    B: Bus,
    T: UnsignedInteger,
{
    if cpu.cache_isolated() {
        cpu.advance();
        return Ok(());
    }

    if let MipsInstrInfo::I { rs, rt, imm } = info {
        let (base, val) = cpu.state.gpr.read(rs, rt);
        let addr = base.wrapping_add(word_extend(imm));
        cpu.check_address::<T>(addr, Exception::AddressErrorStore)?;

        cpu.bus.write(addr, T::truncate_from(val));
    } else {
        std::unreachable!();
    }

    cpu.advance();
    Ok(())
}

// ========================================
//  ExecTrait implementations
// ========================================

#[inline]
fn add_overflows(a: WordType, b: WordType, rst: WordType) -> bool {
    (!(a ^ b) & (a ^ rst)) & 0x8000_0000 != 0
}

#[inline]
fn sub_overflows(a: WordType, b: WordType, rst: WordType) -> bool {
    ((a ^ b) & (a ^ rst)) & 0x8000_0000 != 0
}

pub(super) struct ExecAdd;
impl ExecTrait<Result<WordType, Exception>> for ExecAdd {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        let rst = a.wrapping_add(b);
        if add_overflows(a, b, rst) {
            return Err(Exception::Overflow);
        }
        Ok(rst)
    }
}

pub(super) struct ExecAddu;
impl ExecTrait<Result<WordType, Exception>> for ExecAddu {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok(a.wrapping_add(b))
    }
}

pub(super) struct ExecSub;
impl ExecTrait<Result<WordType, Exception>> for ExecSub {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        let rst = a.wrapping_sub(b);
        if sub_overflows(a, b, rst) {
            return Err(Exception::Overflow);
        }
        Ok(rst)
    }
}

pub(super) struct ExecSubu;
impl ExecTrait<Result<WordType, Exception>> for ExecSubu {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok(a.wrapping_sub(b))
    }
}

pub(super) struct ExecAnd;
impl ExecTrait<Result<WordType, Exception>> for ExecAnd {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok(a & b)
    }
}

pub(super) struct ExecOr;
impl ExecTrait<Result<WordType, Exception>> for ExecOr {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok(a | b)
    }
}

pub(super) struct ExecXor;
impl ExecTrait<Result<WordType, Exception>> for ExecXor {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok(a ^ b)
    }
}

pub(super) struct ExecNor;
impl ExecTrait<Result<WordType, Exception>> for ExecNor {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok(!(a | b))
    }
}

/// LUI ignores `rs`.
pub(super) struct ExecLoadUpper;
impl ExecTrait<Result<WordType, Exception>> for ExecLoadUpper {
    fn exec(_a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok(b << 16)
    }
}

pub(super) struct ExecSLL;
impl ExecTrait<WordType> for ExecSLL {
    fn exec(a: WordType, b: WordType) -> WordType {
        a << b
    }
}

pub(super) struct ExecSRL;
impl ExecTrait<WordType> for ExecSRL {
    fn exec(a: WordType, b: WordType) -> WordType {
        a >> b
    }
}

pub(super) struct ExecSRA;
impl ExecTrait<WordType> for ExecSRA {
    fn exec(a: WordType, b: WordType) -> WordType {
        ((a as SignedWordType) >> b) as WordType
    }
}

pub(super) struct ExecEqual;
impl ExecTrait<bool> for ExecEqual {
    fn exec(a: WordType, b: WordType) -> bool {
        a == b
    }
}

pub(super) struct ExecNotEqual;
impl ExecTrait<bool> for ExecNotEqual {
    fn exec(a: WordType, b: WordType) -> bool {
        a != b
    }
}

pub(super) struct ExecSignedLess;
impl ExecTrait<bool> for ExecSignedLess {
    fn exec(a: WordType, b: WordType) -> bool {
        (a as SignedWordType) < (b as SignedWordType)
    }
}

impl ExecTrait<Result<WordType, Exception>> for ExecSignedLess {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok(<ExecSignedLess as ExecTrait<bool>>::exec(a, b) as WordType)
    }
}

pub(super) struct ExecUnsignedLess;
impl ExecTrait<Result<WordType, Exception>> for ExecUnsignedLess {
    fn exec(a: WordType, b: WordType) -> Result<WordType, Exception> {
        Ok((a < b) as WordType)
    }
}

pub(super) struct ExecSignedGreatEqual;
impl ExecTrait<bool> for ExecSignedGreatEqual {
    fn exec(a: WordType, b: WordType) -> bool {
        (a as SignedWordType) >= (b as SignedWordType)
    }
}

pub(super) struct ExecSignedLessEqual;
impl ExecTrait<bool> for ExecSignedLessEqual {
    fn exec(a: WordType, b: WordType) -> bool {
        (a as SignedWordType) <= (b as SignedWordType)
    }
}

pub(super) struct ExecSignedGreat;
impl ExecTrait<bool> for ExecSignedGreat {
    fn exec(a: WordType, b: WordType) -> bool {
        (a as SignedWordType) > (b as SignedWordType)
    }
}

pub(super) struct ExecMult;
impl ExecTrait<(WordType, WordType)> for ExecMult {
    fn exec(a: WordType, b: WordType) -> (WordType, WordType) {
        let rst = (a as SignedWordType as i64).wrapping_mul(b as SignedWordType as i64) as u64;
        ((rst >> 32) as WordType, rst as WordType)
    }
}

pub(super) struct ExecMultu;
impl ExecTrait<(WordType, WordType)> for ExecMultu {
    fn exec(a: WordType, b: WordType) -> (WordType, WordType) {
        let rst = (a as u64) * (b as u64);
        ((rst >> 32) as WordType, rst as WordType)
    }
}

/// Division by zero leaves the dividend in HI and saturates LO towards the sign
/// opposite the dividend's, as the R3000 does.
pub(super) struct ExecDiv;
impl ExecTrait<(WordType, WordType)> for ExecDiv {
    fn exec(a: WordType, b: WordType) -> (WordType, WordType) {
        let (dividend, divisor) = (a as SignedWordType, b as SignedWordType);
        if divisor == 0 {
            let lo = if dividend < 0 { 1 } else { WordType::MAX };
            return (a, lo);
        }
        (
            dividend.wrapping_rem(divisor) as WordType,
            dividend.wrapping_div(divisor) as WordType,
        )
    }
}

pub(super) struct ExecDivu;
impl ExecTrait<(WordType, WordType)> for ExecDivu {
    fn exec(a: WordType, b: WordType) -> (WordType, WordType) {
        if b == 0 {
            return (a, WordType::MAX);
        }
        (a % b, a / b)
    }
}
