use xmas_elf::{ElfFile, header, program};

use crate::{config::arch_config::WordType, ram::Ram, vector_config::RESET_VECTOR};

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("invalid elf: {0}")]
    InvalidElf(&'static str),
    #[error("elf is not a little-endian 32-bit MIPS image")]
    UnsupportedElf,
    #[error("section at {addr:#010x} ({len:#x} bytes) does not fit the bus")]
    OutOfRange { addr: WordType, len: usize },
}

/// Load every `PT_LOAD` segment at its virtual address. Returns the entry point.
pub fn load_elf(ram: &mut Ram, elf_data: &[u8]) -> Result<WordType, LoadError> {
    let elf = ElfFile::new(elf_data).map_err(LoadError::InvalidElf)?;
    let elf_header = elf.header;

    if !matches!(elf_header.pt1.class(), header::Class::ThirtyTwo)
        || !matches!(elf_header.pt1.data(), header::Data::LittleEndian)
        || !matches!(elf_header.pt2.machine().as_machine(), header::Machine::Mips)
    {
        return Err(LoadError::UnsupportedElf);
    }

    for ph in elf.program_iter() {
        if ph.get_type().map_err(LoadError::InvalidElf)? != program::Type::Load {
            continue;
        }

        let start_addr = ph.virtual_addr() as WordType;
        let offset = ph.offset() as usize;
        let file_size = ph.file_size() as usize;
        let data = elf_data
            .get(offset..offset + file_size)
            .ok_or(LoadError::InvalidElf("segment exceeds file"))?;

        log::debug!(
            "loading segment at {:#010x}, {:#x} bytes",
            start_addr,
            file_size
        );
        if !ram.insert_section(data, start_addr) {
            return Err(LoadError::OutOfRange {
                addr: start_addr,
                len: file_size,
            });
        }
    }

    Ok(elf_header.pt2.entry_point() as WordType)
}

/// Raw images are placed at the reset vector, i.e. the start of the boot ROM.
pub fn load_bin(ram: &mut Ram, raw_data: &[u8]) -> Result<WordType, LoadError> {
    if !ram.insert_section(raw_data, RESET_VECTOR) {
        return Err(LoadError::OutOfRange {
            addr: RESET_VECTOR,
            len: raw_data.len(),
        });
    }
    Ok(RESET_VECTOR)
}
