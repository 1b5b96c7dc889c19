//! Volatile access to a block of 32-bit registers.

use core::ptr::{read_volatile, write_volatile};

/// Base address of a register block.
///
/// Construction is the only unsafe step: once a block exists, reads and
/// writes at word offsets inside it are sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be word aligned and every offset later passed to
    /// [`read`](Self::read) / [`write`](Self::write) must address a valid,
    /// word-sized register (or memory) for as long as the block is used.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address.
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Address of the register at `offset`.
    pub const fn addr(&self, offset: usize) -> usize {
        self.base.wrapping_add(offset)
    }

    /// Sub-block starting at `offset`.
    pub const fn block(&self, offset: usize) -> Self {
        Self {
            base: self.addr(offset),
        }
    }

    /// Read the register at `offset`.
    pub fn read(&self, offset: usize) -> u32 {
        // SAFETY: the constructor's contract covers every offset used with
        // this block.
        unsafe { read_volatile(self.addr(offset) as *const u32) }
    }

    /// Write the register at `offset`.
    pub fn write(&self, offset: usize, value: u32) {
        // SAFETY: as for `read`.
        unsafe { write_volatile(self.addr(offset) as *mut u32, value) }
    }

    /// Read-modify-write of the register at `offset`.
    pub fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32) {
        self.write(offset, f(self.read(offset)));
    }
}

/// Host register file for backend tests: a word array standing in for a
/// register block.
#[cfg(test)]
pub(crate) struct RegisterFile<const WORDS: usize> {
    words: core::cell::UnsafeCell<[u32; WORDS]>,
}

#[cfg(test)]
impl<const WORDS: usize> RegisterFile<WORDS> {
    pub(crate) fn new() -> Self {
        Self {
            words: core::cell::UnsafeCell::new([0; WORDS]),
        }
    }

    pub(crate) fn mmio(&self) -> Mmio {
        // SAFETY: the array outlives every test that uses the block and
        // tests only use offsets below `WORDS * 4`.
        unsafe { Mmio::new(self.words.get() as usize) }
    }

    pub(crate) fn word(&self, offset: usize) -> u32 {
        self.mmio().read(offset)
    }

    pub(crate) fn set_word(&self, offset: usize, value: u32) {
        self.mmio().write(offset, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_offsets_compose() {
        let regs = RegisterFile::<8>::new();
        let block = regs.mmio().block(0x8);
        block.write(0x4, 0xDEAD_BEEF);
        assert_eq!(regs.word(0xC), 0xDEAD_BEEF);
        assert_eq!(block.addr(0x4), regs.mmio().addr(0xC));
    }

    #[test]
    fn modify_keeps_other_bits() {
        let regs = RegisterFile::<1>::new();
        regs.set_word(0, 0b1010);
        regs.mmio().modify(0, |v| v | 0b0001);
        assert_eq!(regs.word(0), 0b1011);
    }
}
