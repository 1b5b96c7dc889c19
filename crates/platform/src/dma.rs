//! DMA abstraction layer
//!
//! A [`TransferDescriptor`] describes one move between a fixed peripheral
//! register and an advancing memory region. The [`DmaEngine`] trait is the
//! narrow interface to the engine's validate / load / launch primitives; every
//! primitive answers with [`ConfigFlags`], of which only [`ConfigFlags::Ok`]
//! means success.

/// Number of DMA channels on the SoC.
pub const CHANNEL_COUNT: usize = 2;

/// DMA channel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(pub u8);

impl Channel {
    /// Acquisition channel. The external RX trigger slot is wired to channel 0.
    pub const ACQUISITION: Self = Self(0);
    /// Stimulus channel. The external TX trigger slot is wired to channel 1.
    pub const STIMULUS: Self = Self(1);

    /// Channel number as an array index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// `true` if the channel exists on this SoC.
    pub const fn is_valid(self) -> bool {
        self.index() < CHANNEL_COUNT
    }
}

/// Width of one data unit moved by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataType {
    /// 8 bits
    Byte,
    /// 16 bits
    HalfWord,
    /// 32 bits
    Word,
}

impl DataType {
    /// Size of one data unit in bytes.
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::HalfWord => 2,
            Self::Word => 4,
        }
    }
}

/// Trigger slot pacing a register endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// No pacing: the engine moves data as fast as the bus grants.
    Memory,
    /// External reception slot (VCO decoder, filter output).
    ExtRx,
    /// External transmission slot (current DACs).
    ExtTx,
}

/// One side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endpoint {
    /// Fixed peripheral register: the address never advances.
    Register {
        /// Register address.
        addr: usize,
        /// Access width.
        data_type: DataType,
        /// Pacing slot.
        trigger: Trigger,
    },
    /// Memory region: the address advances by one data unit per element.
    Memory {
        /// Start address.
        addr: usize,
        /// Region capacity in data units.
        capacity_du: u32,
        /// Access width.
        data_type: DataType,
    },
}

impl Endpoint {
    /// Fixed register endpoint.
    pub const fn register(addr: usize, data_type: DataType, trigger: Trigger) -> Self {
        Self::Register {
            addr,
            data_type,
            trigger,
        }
    }

    /// Advancing memory endpoint.
    pub const fn memory(addr: usize, capacity_du: u32, data_type: DataType) -> Self {
        Self::Memory {
            addr,
            capacity_du,
            data_type,
        }
    }

    /// Address of the first access.
    pub const fn addr(&self) -> usize {
        match *self {
            Self::Register { addr, .. } | Self::Memory { addr, .. } => addr,
        }
    }

    /// Access width.
    pub const fn data_type(&self) -> DataType {
        match *self {
            Self::Register { data_type, .. } | Self::Memory { data_type, .. } => data_type,
        }
    }

    /// `true` for memory endpoints.
    pub const fn advances(&self) -> bool {
        matches!(self, Self::Memory { .. })
    }

    /// Pacing slot; memory endpoints are paced by bus grants.
    pub const fn trigger(&self) -> Trigger {
        match *self {
            Self::Register { trigger, .. } => trigger,
            Self::Memory { .. } => Trigger::Memory,
        }
    }

    /// `true` if the address is a multiple of the access width.
    pub const fn is_aligned(&self) -> bool {
        matches!(self.addr().checked_rem(self.data_type().size_bytes()), Some(0))
    }
}

/// Transfer dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dimensions {
    /// Linear transfer of `size_d1_du` elements.
    OneD,
    /// `rows` repetitions of a `size_d1_du`-element row.
    TwoD {
        /// Number of rows.
        rows: u32,
    },
}

/// Repeat mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    /// The transfer runs once.
    Single,
    /// The engine re-issues the transfer on completion until stopped.
    Circular,
}

/// Completion signalling at the end of each transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferEnd {
    /// Software polls the engine status.
    Polling,
    /// The engine raises a transaction-done interrupt.
    Interrupt,
}

/// Address realignment policy passed to [`DmaEngine::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Realign {
    /// The engine may narrow the access width to fix a misaligned address.
    Enabled,
    /// Misaligned addresses are rejected.
    Disabled,
}

/// Integrity check policy passed to [`DmaEngine::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegrityChecks {
    /// Check overlap, bounds and trigger compatibility.
    Perform,
    /// Only the cheap checks.
    Skip,
}

/// Result of a DMA engine primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConfigFlags {
    /// Accepted.
    Ok = 0,
    /// Window size incompatible with the transaction size.
    WindowSize = 1,
    /// Source and destination widths cannot be combined.
    TypeMismatch = 2,
    /// Address not aligned to the access width.
    Misaligned = 3,
    /// Transfer runs past the end of a memory region.
    OutOfBounds = 4,
    /// Source and destination regions overlap.
    Overlap = 5,
    /// Trigger slot cannot pace this endpoint.
    IncompatibleTrigger = 6,
    /// The channel still carries a transfer.
    Busy = 7,
    /// Loaded descriptor does not match the one being launched.
    NotLoaded = 8,
}

impl ConfigFlags {
    /// `true` only for [`ConfigFlags::Ok`].
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Engine primitive that produced a [`ConfigFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaStage {
    /// [`DmaEngine::validate`]
    Validate,
    /// [`DmaEngine::load`]
    Load,
    /// [`DmaEngine::launch`]
    Launch,
}

/// One DMA move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferDescriptor {
    /// Channel carrying the transfer.
    pub channel: Channel,
    /// Where data is read.
    pub src: Endpoint,
    /// Where data is written.
    pub dst: Endpoint,
    /// Dimensionality.
    pub dim: Dimensions,
    /// Elements per row (the whole transfer for [`Dimensions::OneD`]).
    pub size_d1_du: u32,
    /// Repeat mode.
    pub mode: TransferMode,
    /// Completion signalling.
    pub end: TransferEnd,
    /// Raise a window-done interrupt every `window_du` written elements.
    /// Zero disables the window interrupt.
    pub window_du: u32,
    /// Forward everything read to the stream peripheral behind the HW FIFO
    /// (the dLC in the RX path).
    pub hw_fifo: bool,
}

impl TransferDescriptor {
    /// Elements moved per transaction, `None` on overflow.
    pub fn elements_per_cycle(&self) -> Option<u32> {
        match self.dim {
            Dimensions::OneD => Some(self.size_d1_du),
            Dimensions::TwoD { rows } => self.size_d1_du.checked_mul(rows),
        }
    }

    /// `true` if the engine raises window-done interrupts.
    pub const fn signals_window(&self) -> bool {
        self.window_du != 0
    }

    /// `true` if the engine raises transaction-done interrupts.
    pub const fn signals_transaction(&self) -> bool {
        matches!(self.end, TransferEnd::Interrupt)
    }

    /// `true` if any completion is signalled by interrupt.
    pub const fn uses_interrupts(&self) -> bool {
        self.signals_window() || self.signals_transaction()
    }

    /// `true` in circular mode.
    pub const fn is_circular(&self) -> bool {
        matches!(self.mode, TransferMode::Circular)
    }
}

/// DMA engine primitives.
///
/// Implemented by the register backend on target and by
/// [`crate::mocks::MockDma`] on host.
pub trait DmaEngine {
    /// Check a descriptor against the engine's constraints.
    fn validate(
        &self,
        descriptor: &TransferDescriptor,
        realign: Realign,
        checks: IntegrityChecks,
    ) -> ConfigFlags;

    /// Write a validated descriptor into the channel registers.
    fn load(&mut self, descriptor: &TransferDescriptor) -> ConfigFlags;

    /// Start the loaded transfer.
    fn launch(&mut self, descriptor: &TransferDescriptor) -> ConfigFlags;

    /// Stop re-issuing a circular transfer. The current transaction drains.
    fn stop_circular(&mut self, channel: Channel);

    /// `true` while the channel carries a transfer.
    fn is_busy(&self, channel: Channel) -> bool;
}

impl<T: DmaEngine + ?Sized> DmaEngine for &mut T {
    fn validate(
        &self,
        descriptor: &TransferDescriptor,
        realign: Realign,
        checks: IntegrityChecks,
    ) -> ConfigFlags {
        (**self).validate(descriptor, realign, checks)
    }

    fn load(&mut self, descriptor: &TransferDescriptor) -> ConfigFlags {
        (**self).load(descriptor)
    }

    fn launch(&mut self, descriptor: &TransferDescriptor) -> ConfigFlags {
        (**self).launch(descriptor)
    }

    fn stop_circular(&mut self, channel: Channel) {
        (**self).stop_circular(channel);
    }

    fn is_busy(&self, channel: Channel) -> bool {
        (**self).is_busy(channel)
    }
}
