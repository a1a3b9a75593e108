use crate::{config::arch_config::WordType, utils::UnsignedInteger};

/// Memory/bus boundary the CPU core is wired to.
///
/// Accesses never fail at this level: alignment and privilege are checked by the core
/// before it touches the bus, and the bus decides what unmapped addresses do.
pub trait Bus {
    /// Instruction-stream read through the currently selected address space.
    fn fetch_instruction(&mut self, addr: WordType) -> u32 {
        self.read::<u32>(addr)
    }

    fn read<T>(&mut self, addr: WordType) -> T
    where
        T: UnsignedInteger;

    fn write<T>(&mut self, addr: WordType, data: T)
    where
        T: UnsignedInteger;

    /// Bank/segment switch hook, called whenever control flow is redirected.
    /// Flat address spaces leave this as a no-op.
    fn select_address_space(&mut self, _addr: WordType) {}
}
