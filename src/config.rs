#![allow(unused)]

pub mod ram_config {
    use crate::config::arch_config::WordType;

    /// Physical base of main memory.
    pub const BASE_ADDR: WordType = 0x0000_0000;
    pub const SIZE: usize = 0x20_0000;

    /// Physical base of the boot ROM (seen at `0xbfc00000` through kseg1).
    pub const ROM_BASE_ADDR: WordType = 0x1fc0_0000;
    pub const ROM_SIZE: usize = 0x8_0000;

    /// kuseg/kseg0/kseg1 all alias the same 512 MB physical window.
    pub const PHYS_MASK: WordType = 0x1fff_ffff;
}

pub mod vector_config {
    use crate::config::arch_config::WordType;

    pub const RESET_VECTOR: WordType = 0xbfc0_0000;
    pub const ROM_EXCEPTION_VECTOR: WordType = 0xbfc0_0180;
    pub const RAM_EXCEPTION_VECTOR: WordType = 0x8000_0080;
}

pub mod arch_config {
    use crate::gen_name_list;

    pub type WordType = u32;
    pub type SignedWordType = i32;
    pub const XLEN: usize = 32;

    pub const REGFILE_CNT: usize = 32;
    pub const CP0_REGFILE_CNT: usize = 32;

    /// Conventional o32 ABI names, used for dumps and debug register lookup.
    pub const REG_NAME: [&str; REGFILE_CNT] = [
        "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", //
        "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", //
        "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", //
        "t8", "t9", "k0", "k1", "gp", "sp", "fp", "ra",
    ];

    pub const CP0_REG_NAME: [&str; CP0_REGFILE_CNT] = gen_name_list!("cp0r"; 0, 31);
}
