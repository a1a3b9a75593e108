use std::fmt::{Debug, Display};

use crate::config::arch_config::{SignedWordType, WordType, XLEN};

pub fn sign_extend(value: WordType, from_bits: u32) -> WordType {
    let sign_bit = XLEN as u32 - from_bits;
    ((value << sign_bit) as SignedWordType >> sign_bit) as WordType
}

/// Sign-extend a 16-bit immediate field ("word-extend").
#[inline]
pub fn word_extend(imm: u16) -> WordType {
    imm as i16 as SignedWordType as WordType
}

/// get the negative of given number of [`WordType`] in 2's complement.
pub fn negative_of(value: WordType) -> WordType {
    (!value).wrapping_add(1)
}

/// Alignment mask of an access of `T`: 0 for bytes, 1 for halfwords, 3 for words.
#[inline]
pub fn align_mask<T: UnsignedInteger>() -> WordType {
    (T::BITS / 8 - 1) as WordType
}

// ========================================
//  gen_name_list ["a1", "a2", "a3", ... ]
// ========================================

/// # Examples
/// ```
/// assert_eq!(gen_name_list("a"; 0, 5), ["a0", "a1", "a2", "a3", "a4", "a5"])
/// ```
#[macro_export]
macro_rules! gen_name_list {
    ($base:literal; $begin: literal, $end: literal) => {
        seq_macro::seq!(N in $begin..= $end {
            [ #(concat!($base, stringify!(N)),) *]
        })
    }
}

pub trait TruncateFrom<T>: Sized {
    fn truncate_from(value: T) -> Self;
}

macro_rules! impl_truncate_from {
    ($from:ty, $to:ty) => {
        impl TruncateFrom<$from> for $to {
            fn truncate_from(val: $from) -> Self {
                val as $to
            }
        }
    };
}

impl_truncate_from!(u32, u8);
impl_truncate_from!(u32, u16);
impl_truncate_from!(u32, u32);

/// Widths the bus can move in one access.
pub trait UnsignedInteger:
    Copy + Sized + Into<WordType> + Default + PartialEq + Eq + Debug + Display + TruncateFrom<WordType>
{
    const MAX: Self;
    const BITS: usize;

    fn from_le_slice(bytes: &[u8]) -> Self;
    fn write_le_slice(self, bytes: &mut [u8]);
}

macro_rules! impl_unsigned_integer {
    ($T:ty) => {
        impl UnsignedInteger for $T {
            const MAX: $T = <$T>::MAX;
            const BITS: usize = <$T>::BITS as usize;

            #[inline]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; size_of::<$T>()];
                buf.copy_from_slice(&bytes[..size_of::<$T>()]);
                <$T>::from_le_bytes(buf)
            }

            #[inline]
            fn write_le_slice(self, bytes: &mut [u8]) {
                bytes[..size_of::<$T>()].copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_unsigned_integer!(u8);
impl_unsigned_integer!(u16);
impl_unsigned_integer!(u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x123, 12), 0x123);
        assert_eq!(sign_extend(0x7FF, 12), 0x7FF);
        assert_eq!(sign_extend(0xFFF, 12), !0);
        assert_eq!(sign_extend(0x80, 8), 0xffff_ff80);
        assert_eq!(sign_extend(0x8000, 16), 0xffff_8000);
    }

    #[test]
    fn test_word_extend() {
        assert_eq!(word_extend(0x7fff), 0x0000_7fff);
        assert_eq!(word_extend(0x8000), 0xffff_8000);
        assert_eq!(word_extend(0xffff), negative_of(1));
    }

    #[test]
    fn test_get_negative_of() {
        assert_eq!(negative_of(1), !0);
        assert_eq!(negative_of(2), !0 - 1);
    }

    #[test]
    fn test_align_mask() {
        assert_eq!(align_mask::<u8>(), 0);
        assert_eq!(align_mask::<u16>(), 1);
        assert_eq!(align_mask::<u32>(), 3);
    }

    #[test]
    fn test_le_slice() {
        let mut buf = [0u8; 4];
        0x1234_5678u32.write_le_slice(&mut buf);
        assert_eq!(buf, [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(u16::from_le_slice(&buf[2..]), 0x1234);
        assert_eq!(u8::from_le_slice(&buf[1..]), 0x56);
    }
}
