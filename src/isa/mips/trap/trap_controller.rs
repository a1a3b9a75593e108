use crate::{
    device::Bus,
    isa::mips::{
        cop0::{Status, cp0_index},
        executor::MipsCPU,
        trap::Exception,
    },
    vector_config::{RAM_EXCEPTION_VECTOR, ROM_EXCEPTION_VECTOR},
};

pub(in crate::isa::mips) struct TrapController {}

impl TrapController {
    /// Enter the exception handler for `exception` raised by the current instruction.
    pub fn raise<B: Bus>(cpu: &mut MipsCPU<B>, exception: Exception) {
        let state = &mut cpu.state;

        // A delay-slot instruction resumes at its branch.
        let in_delay_slot = state.current_pc != state.next_pc.wrapping_sub(4);
        state.cp0[cp0_index::EPC] = if in_delay_slot {
            state.current_pc.wrapping_sub(4)
        } else {
            state.current_pc
        };

        let cause = state.cp0.cause().with_exception(exception, in_delay_slot);
        state.cp0.set_cause(cause);

        let status = state.cp0[cp0_index::STATUS];
        state.cp0[cp0_index::STATUS] = Status::push_mode(status);

        let vector = if Status::from_bits_retain(status).contains(Status::BEV) {
            ROM_EXCEPTION_VECTOR
        } else {
            RAM_EXCEPTION_VECTOR
        };

        log::debug!(
            "{:?} at {:#010x}, epc = {:#010x}, vector = {:#010x}",
            exception,
            state.current_pc,
            state.cp0[cp0_index::EPC],
            vector
        );

        // Both slots are refilled so the slot after the faulting instruction never retires.
        // Vectors are aligned kernel addresses and the core is in kernel mode now.
        if let Err(nested) = cpu.restart_at(vector) {
            log::error!("{:?} while entering exception vector {:#010x}", nested, vector);
        }
    }

    /// Return from exception: pop the STATUS mode stack. PC is left alone.
    pub fn rfe<B: Bus>(cpu: &mut MipsCPU<B>) {
        let status = cpu.state.cp0[cp0_index::STATUS];
        cpu.state.cp0[cp0_index::STATUS] = Status::pop_mode(status);
        log::debug!(
            "rfe, status {:#010x} -> {:#010x}",
            status,
            cpu.state.cp0[cp0_index::STATUS]
        );
    }
}
