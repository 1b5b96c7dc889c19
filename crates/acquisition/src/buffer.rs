//! DMA result buffer.
//!
//! The engine writes the buffer behind the compiler's back, so every CPU
//! access is volatile and goes through a raw pointer. The buffer lives in a
//! `static` and only hands out its address ([`ResultBuffer::endpoint`]) and
//! element-wise volatile reads.

use core::cell::UnsafeCell;

use platform::{DataType, Endpoint};

/// Element types the engine can write.
pub trait DmaWord: Copy + Into<i32> {
    /// Matching DMA access width.
    const DATA_TYPE: DataType;
}

impl DmaWord for u8 {
    const DATA_TYPE: DataType = DataType::Byte;
}

impl DmaWord for i8 {
    const DATA_TYPE: DataType = DataType::Byte;
}

impl DmaWord for u16 {
    const DATA_TYPE: DataType = DataType::HalfWord;
}

impl DmaWord for i16 {
    const DATA_TYPE: DataType = DataType::HalfWord;
}

impl DmaWord for i32 {
    const DATA_TYPE: DataType = DataType::Word;
}

/// Fixed-capacity, word-aligned buffer written by the DMA engine.
#[repr(C, align(4))]
pub struct ResultBuffer<T, const N: usize> {
    cells: UnsafeCell<[T; N]>,
}

// SAFETY: the CPU only performs volatile element reads and (on host) volatile
// element writes through `cells`; no reference to the array is ever created,
// so concurrent engine writes cannot alias a Rust reference.
unsafe impl<T: DmaWord + Send, const N: usize> Sync for ResultBuffer<T, N> {}

impl<T: DmaWord, const N: usize> ResultBuffer<T, N> {
    /// Buffer with every element set to `fill`.
    pub const fn new(fill: T) -> Self {
        Self {
            cells: UnsafeCell::new([fill; N]),
        }
    }

    /// Capacity in elements.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Address of the first element.
    pub fn addr(&self) -> usize {
        self.cells.get() as usize
    }

    /// Destination endpoint covering the whole buffer.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::memory(
            self.addr(),
            u32::try_from(N).unwrap_or(u32::MAX),
            T::DATA_TYPE,
        )
    }

    /// Volatile read of element `index`.
    pub fn read(&self, index: usize) -> Option<T> {
        if index >= N {
            return None;
        }
        // SAFETY: `index < N`, so the pointer stays inside the array owned by
        // `cells`; the read is volatile because the engine writes the memory.
        Some(unsafe { core::ptr::read_volatile(self.cells.get().cast::<T>().add(index)) })
    }

    /// Volatile reads of every element, in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..N).filter_map(move |i| self.read(i))
    }

    /// Volatile write of element `index`, standing in for the engine on host.
    #[cfg(any(test, feature = "std"))]
    pub fn write(&self, index: usize, value: T) -> bool {
        if index >= N {
            return false;
        }
        // SAFETY: bounds checked above; host tests are the only writers.
        unsafe { core::ptr::write_volatile(self.cells.get().cast::<T>().add(index), value) };
        true
    }
}
