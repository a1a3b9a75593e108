use crate::{
    config::arch_config::WordType,
    device::Bus,
    ram_config::{self, PHYS_MASK, ROM_BASE_ADDR},
    utils::UnsignedInteger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Ram(usize),
    Rom(usize),
    Unmapped,
}

/// Reference little-endian bus: main RAM at physical 0 and a boot ROM at
/// physical `0x1fc00000`, both reachable through kuseg, kseg0 and kseg1.
pub struct Ram {
    data: Box<[u8]>,
    rom: Box<[u8]>,
    active_segment: WordType,
}

impl Ram {
    pub fn new() -> Self {
        Self {
            data: vec![0u8; ram_config::SIZE].into_boxed_slice(),
            rom: vec![0u8; ram_config::ROM_SIZE].into_boxed_slice(),
            active_segment: 0,
        }
    }

    fn region<T: UnsignedInteger>(&self, addr: WordType) -> Region {
        let phys = addr & PHYS_MASK;
        let width = T::BITS / 8;

        let ram_offset = phys.wrapping_sub(ram_config::BASE_ADDR) as usize;
        if ram_offset + width <= self.data.len() {
            return Region::Ram(ram_offset);
        }

        let rom_offset = phys.wrapping_sub(ROM_BASE_ADDR) as usize;
        if phys >= ROM_BASE_ADDR && rom_offset + width <= self.rom.len() {
            return Region::Rom(rom_offset);
        }

        Region::Unmapped
    }

    /// Copy `bytes` into whichever region backs `start_addr`.
    /// Returns `false` when the section does not fit.
    pub fn insert_section(&mut self, bytes: &[u8], start_addr: WordType) -> bool {
        let phys = start_addr & PHYS_MASK;
        let (target, offset) = if phys >= ROM_BASE_ADDR {
            (&mut self.rom, (phys - ROM_BASE_ADDR) as usize)
        } else {
            (&mut self.data, (phys - ram_config::BASE_ADDR) as usize)
        };

        match target.get_mut(offset..offset + bytes.len()) {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                true
            }
            None => {
                log::error!(
                    "section of {:#x} bytes at {:#010x} is out of range",
                    bytes.len(),
                    start_addr
                );
                false
            }
        }
    }

    /// Store a sequence of instruction words starting at `addr`.
    pub fn load_program(&mut self, addr: WordType, instrs: &[u32]) -> bool {
        let bytes: Vec<u8> = instrs.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.insert_section(&bytes, addr)
    }

    /// Top three address bits of the last `select_address_space` target.
    pub fn active_segment(&self) -> WordType {
        self.active_segment
    }
}

impl Bus for Ram {
    fn read<T>(&mut self, addr: WordType) -> T
    where
        T: UnsignedInteger,
    {
        match self.region::<T>(addr) {
            Region::Ram(offset) => T::from_le_slice(&self.data[offset..]),
            Region::Rom(offset) => T::from_le_slice(&self.rom[offset..]),
            Region::Unmapped => {
                log::trace!("read from unmapped address {:#010x}", addr);
                T::default()
            }
        }
    }

    fn write<T>(&mut self, addr: WordType, data: T)
    where
        T: UnsignedInteger,
    {
        match self.region::<T>(addr) {
            Region::Ram(offset) => data.write_le_slice(&mut self.data[offset..]),
            Region::Rom(_) => log::trace!("write to boot ROM at {:#010x} dropped", addr),
            Region::Unmapped => log::trace!("write to unmapped address {:#010x} dropped", addr),
        }
    }

    fn select_address_space(&mut self, addr: WordType) {
        self.active_segment = addr >> 29;
    }
}
