use num_enum::{IntoPrimitive, TryFromPrimitive};

pub mod trap_controller;

/// Exception codes as stored in CAUSE[6:2].
///
/// TLB codes are kept for parity with the instruction set; there is no MMU, so they
/// are never raised. `Interrupt` is likewise never raised since the interrupt lines
/// are not latched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum Exception {
    Interrupt = 0,
    TlbLoad = 2,
    TlbStore = 3,
    AddressErrorLoad = 4,
    AddressErrorStore = 5,
    Syscall = 8,
    Breakpoint = 9,
    ReservedInstruction = 10,
    Overflow = 12,
}

impl Exception {
    #[inline]
    pub fn code(self) -> u32 {
        self.into()
    }
}
