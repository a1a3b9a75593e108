use std::{
    fmt::Debug,
    ops::{Index, IndexMut},
};

use crate::config::arch_config::{REG_NAME, REGFILE_CNT, WordType};

#[derive(Clone, PartialEq, Eq)]
pub struct RegFile {
    data: [WordType; REGFILE_CNT],
}

impl Index<usize> for RegFile {
    type Output = WordType;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<usize> for RegFile {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl Debug for RegFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "reg_file {{")?;
        for (i, val) in self.data.iter().enumerate() {
            if i % 8 == 0 {
                write!(f, "  ")?;
            }

            write!(f, "{:>4}: 0x{:08x}  ", REG_NAME[i], val)?;

            if i % 8 == 7 {
                writeln!(f)?;
            }
        }

        write!(f, "}}")
    }
}

impl RegFile {
    pub fn new() -> Self {
        Self {
            data: [0; REGFILE_CNT],
        }
    }

    /// `r0` is hardwired to zero whatever the backing store holds.
    #[inline]
    pub fn read(&self, id1: u8, id2: u8) -> (WordType, WordType) {
        (self.read_one(id1), self.read_one(id2))
    }

    #[inline]
    pub fn read_one(&self, id: u8) -> WordType {
        if id == 0 { 0 } else { self.data[id as usize] }
    }

    /// id == 0 will be ignored.
    #[inline]
    pub fn write(&mut self, id: u8, data: WordType) {
        if id == 0u8 {
            return;
        }

        self.data[id as usize] = data
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordType> {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_register() {
        let mut reg_file = RegFile::new();
        reg_file.write(0, 0xdead_beef);
        assert_eq!(reg_file.read_one(0), 0);

        // Even a raw store behind the masking read is invisible.
        reg_file[0] = 0x1234;
        assert_eq!(reg_file.read(0, 0), (0, 0));
    }

    #[test]
    fn test_read_write() {
        let mut reg_file = RegFile::new();
        reg_file.write(5, 0x55);
        reg_file.write(31, 0xffff_ffff);
        assert_eq!(reg_file.read(5, 31), (0x55, 0xffff_ffff));
        assert_eq!(reg_file[5], 0x55);
    }
}
