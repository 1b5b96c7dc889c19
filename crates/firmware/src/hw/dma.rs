//! DMA engine register backend.
//!
//! One register block per channel. Writing the row size starts the
//! transaction; in circular mode the engine restarts it on completion until
//! the mode register is switched back to single.

use platform::{
    Channel, ConfigFlags, DataType, Dimensions, DmaEngine, Endpoint, IntegrityChecks, Realign,
    TransferDescriptor, TransferMode, Trigger, CHANNEL_COUNT,
};

use super::map::DMA_CHANNEL_STRIDE;
use super::mmio::Mmio;

/// Per-channel register offsets.
pub mod reg {
    /// Source address.
    pub const SRC_PTR: usize = 0x00;
    /// Destination address.
    pub const DST_PTR: usize = 0x04;
    /// Row size in data units; writing it starts the transaction.
    pub const SIZE_D1: usize = 0x0C;
    /// Number of rows.
    pub const SIZE_D2: usize = 0x10;
    /// Bit 0: ready (idle). Bit 1: window done.
    pub const STATUS: usize = 0x14;
    /// Source increment per element, in bytes.
    pub const SRC_INC_D1: usize = 0x18;
    /// Destination increment per element, in bytes.
    pub const DST_INC_D1: usize = 0x20;
    /// Trigger slots: RX in the low half, TX in the high half.
    pub const SLOT: usize = 0x28;
    /// Source access width.
    pub const SRC_DATA_TYPE: usize = 0x2C;
    /// Destination access width.
    pub const DST_DATA_TYPE: usize = 0x30;
    /// 0 single, 1 circular.
    pub const MODE: usize = 0x38;
    /// 0 one-dimensional, 1 two-dimensional.
    pub const DIM_CONFIG: usize = 0x3C;
    /// Forward reads to the stream peripheral.
    pub const HW_FIFO_EN: usize = 0x40;
    /// Window size in data units; zero disables the window interrupt.
    pub const WINDOW_SIZE: usize = 0x5C;
    /// Bit 0: transaction-done interrupt. Bit 1: window-done interrupt.
    pub const INTERRUPT_EN: usize = 0x64;
    /// Transaction-done flag; cleared on read.
    pub const TRANSACTION_IFR: usize = 0x68;
    /// Window-done flag; cleared on read.
    pub const WINDOW_IFR: usize = 0x6C;
}

const STATUS_READY: u32 = 1 << 0;
const SLOT_EXT_RX: u32 = 1 << 0;
const SLOT_EXT_TX: u32 = 1 << 1;

/// Register backend of the DMA engine.
#[derive(Debug)]
pub struct CheepDma {
    regs: Mmio,
    loaded: [Option<TransferDescriptor>; CHANNEL_COUNT],
}

impl CheepDma {
    /// Engine whose channel 0 block is at `regs`.
    pub const fn new(regs: Mmio) -> Self {
        Self {
            regs,
            loaded: [None; CHANNEL_COUNT],
        }
    }

    fn channel(&self, channel: Channel) -> Option<Mmio> {
        if !channel.is_valid() {
            return None;
        }
        channel
            .index()
            .checked_mul(DMA_CHANNEL_STRIDE)
            .map(|offset| self.regs.block(offset))
    }

    /// Consume the window-done flag of `channel`.
    pub fn take_window_done(&self, channel: Channel) -> bool {
        self.channel(channel)
            .is_some_and(|regs| regs.read(reg::WINDOW_IFR) != 0)
    }

    /// Consume the transaction-done flag of `channel`.
    pub fn take_transaction_done(&self, channel: Channel) -> bool {
        self.channel(channel)
            .is_some_and(|regs| regs.read(reg::TRANSACTION_IFR) != 0)
    }
}

impl DmaEngine for CheepDma {
    fn validate(
        &self,
        descriptor: &TransferDescriptor,
        realign: Realign,
        checks: IntegrityChecks,
    ) -> ConfigFlags {
        check(descriptor, realign, checks)
    }

    fn load(&mut self, descriptor: &TransferDescriptor) -> ConfigFlags {
        let Some(regs) = self.channel(descriptor.channel) else {
            return ConfigFlags::IncompatibleTrigger;
        };
        if self.is_busy(descriptor.channel) {
            return ConfigFlags::Busy;
        }
        let (Some(src_type), Some(dst_type)) = (
            access_width(&descriptor.src, Realign::Enabled),
            access_width(&descriptor.dst, Realign::Enabled),
        ) else {
            return ConfigFlags::Misaligned;
        };

        regs.write(reg::SRC_PTR, bus_addr(descriptor.src.addr()));
        regs.write(reg::DST_PTR, bus_addr(descriptor.dst.addr()));
        regs.write(reg::SRC_INC_D1, increment(&descriptor.src, src_type));
        regs.write(reg::DST_INC_D1, increment(&descriptor.dst, dst_type));
        regs.write(reg::SRC_DATA_TYPE, type_code(src_type));
        regs.write(reg::DST_DATA_TYPE, type_code(dst_type));
        regs.write(reg::SLOT, slots(descriptor));
        match descriptor.dim {
            Dimensions::OneD => regs.write(reg::DIM_CONFIG, 0),
            Dimensions::TwoD { rows } => {
                regs.write(reg::DIM_CONFIG, 1);
                regs.write(reg::SIZE_D2, rows);
            }
        }
        regs.write(reg::MODE, mode_code(descriptor.mode));
        regs.write(reg::HW_FIFO_EN, u32::from(descriptor.hw_fifo));
        regs.write(reg::WINDOW_SIZE, descriptor.window_du);
        regs.write(
            reg::INTERRUPT_EN,
            u32::from(descriptor.signals_transaction()) | (u32::from(descriptor.signals_window()) << 1),
        );

        if let Some(slot) = self.loaded.get_mut(descriptor.channel.index()) {
            *slot = Some(*descriptor);
        }
        ConfigFlags::Ok
    }

    fn launch(&mut self, descriptor: &TransferDescriptor) -> ConfigFlags {
        let Some(regs) = self.channel(descriptor.channel) else {
            return ConfigFlags::IncompatibleTrigger;
        };
        let loaded = self.loaded.get(descriptor.channel.index()).copied().flatten();
        if loaded != Some(*descriptor) {
            return ConfigFlags::NotLoaded;
        }
        if self.is_busy(descriptor.channel) {
            return ConfigFlags::Busy;
        }
        regs.write(reg::SIZE_D1, descriptor.size_d1_du);
        ConfigFlags::Ok
    }

    fn stop_circular(&mut self, channel: Channel) {
        if let Some(regs) = self.channel(channel) {
            // The running cycle completes, then the channel goes idle.
            regs.write(reg::MODE, mode_code(TransferMode::Single));
            regs.write(reg::INTERRUPT_EN, 0);
        }
        if let Some(slot) = self.loaded.get_mut(channel.index()) {
            *slot = None;
        }
    }

    fn is_busy(&self, channel: Channel) -> bool {
        self.channel(channel)
            .is_some_and(|regs| regs.read(reg::STATUS) & STATUS_READY == 0)
    }
}

/// Engine-side validation of a descriptor.
///
/// Cheap checks always run; bounds, overlap and trigger pairing only with
/// [`IntegrityChecks::Perform`].
pub fn check(
    descriptor: &TransferDescriptor,
    realign: Realign,
    checks: IntegrityChecks,
) -> ConfigFlags {
    if !descriptor.channel.is_valid() {
        return ConfigFlags::IncompatibleTrigger;
    }
    let cycle = match descriptor.elements_per_cycle() {
        Some(0) | None => return ConfigFlags::OutOfBounds,
        Some(cycle) => cycle,
    };
    let (Some(src_type), Some(dst_type)) = (
        access_width(&descriptor.src, realign),
        access_width(&descriptor.dst, realign),
    ) else {
        return ConfigFlags::Misaligned;
    };
    if descriptor.window_du != 0
        && (descriptor.window_du > cycle || cycle.checked_rem(descriptor.window_du) != Some(0))
    {
        return ConfigFlags::WindowSize;
    }
    // Without the stream peripheral in between the engine can only widen.
    if !descriptor.hw_fifo && dst_type.size_bytes() < src_type.size_bytes() {
        return ConfigFlags::TypeMismatch;
    }
    if checks == IntegrityChecks::Skip {
        return ConfigFlags::Ok;
    }

    match (descriptor.src.trigger(), descriptor.dst.trigger()) {
        (Trigger::ExtTx, _) | (_, Trigger::ExtRx) => return ConfigFlags::IncompatibleTrigger,
        (Trigger::ExtRx, Trigger::ExtTx) => return ConfigFlags::IncompatibleTrigger,
        _ => {}
    }
    for endpoint in [descriptor.src, descriptor.dst] {
        if let Endpoint::Memory { capacity_du, .. } = endpoint {
            if cycle > capacity_du {
                return ConfigFlags::OutOfBounds;
            }
        }
    }
    if overlaps(&descriptor.src, &descriptor.dst) {
        return ConfigFlags::Overlap;
    }
    ConfigFlags::Ok
}

/// Access width the engine will use, `None` if the address is misaligned and
/// realignment is not allowed. Realignment narrows to the widest aligned
/// width.
fn access_width(endpoint: &Endpoint, realign: Realign) -> Option<DataType> {
    if endpoint.is_aligned() {
        return Some(endpoint.data_type());
    }
    match realign {
        Realign::Disabled => None,
        Realign::Enabled => [DataType::HalfWord, DataType::Byte]
            .into_iter()
            .filter(|t| t.size_bytes() < endpoint.data_type().size_bytes())
            .find(|t| endpoint.addr().checked_rem(t.size_bytes()) == Some(0)),
    }
}

fn overlaps(a: &Endpoint, b: &Endpoint) -> bool {
    let span = |e: &Endpoint| -> (usize, usize) {
        let len = match *e {
            Endpoint::Memory {
                capacity_du,
                data_type,
                ..
            } => (capacity_du as usize).saturating_mul(data_type.size_bytes()),
            Endpoint::Register { data_type, .. } => data_type.size_bytes(),
        };
        (e.addr(), e.addr().saturating_add(len))
    };
    let ((a_start, a_end), (b_start, b_end)) = (span(a), span(b));
    a_start < b_end && b_start < a_end
}

fn increment(endpoint: &Endpoint, width: DataType) -> u32 {
    if endpoint.advances() {
        match width {
            DataType::Byte => 1,
            DataType::HalfWord => 2,
            DataType::Word => 4,
        }
    } else {
        0
    }
}

const fn type_code(width: DataType) -> u32 {
    match width {
        DataType::Word => 0,
        DataType::HalfWord => 1,
        DataType::Byte => 2,
    }
}

const fn mode_code(mode: TransferMode) -> u32 {
    match mode {
        TransferMode::Single => 0,
        TransferMode::Circular => 1,
    }
}

fn slots(descriptor: &TransferDescriptor) -> u32 {
    let rx = match descriptor.src.trigger() {
        Trigger::ExtRx => SLOT_EXT_RX,
        Trigger::Memory | Trigger::ExtTx => 0,
    };
    let tx = match descriptor.dst.trigger() {
        Trigger::ExtTx => SLOT_EXT_TX,
        Trigger::Memory | Trigger::ExtRx => 0,
    };
    rx | (tx << 16)
}

/// Bus addresses are 32-bit on the SoC.
#[allow(clippy::cast_possible_truncation)]
const fn bus_addr(addr: usize) -> u32 {
    addr as u32
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::hw::mmio::RegisterFile;

    const FILTER_RX: usize = 0x3006_0010;
    const BUFFER: usize = 0x0000_9000;

    fn acquisition() -> TransferDescriptor {
        TransferDescriptor {
            channel: Channel::ACQUISITION,
            src: Endpoint::register(FILTER_RX, DataType::Word, Trigger::ExtRx),
            dst: Endpoint::memory(BUFFER, 436, DataType::Byte),
            dim: Dimensions::OneD,
            size_d1_du: 64,
            mode: TransferMode::Circular,
            end: platform::TransferEnd::Interrupt,
            window_du: 16,
            hw_fifo: true,
        }
    }

    fn check_all(d: &TransferDescriptor) -> ConfigFlags {
        check(d, Realign::Disabled, IntegrityChecks::Perform)
    }

    #[test]
    fn filter_chain_descriptor_is_accepted() {
        assert_eq!(check_all(&acquisition()), ConfigFlags::Ok);
    }

    #[test]
    fn window_must_divide_the_cycle() {
        let d = TransferDescriptor {
            window_du: 50,
            ..acquisition()
        };
        assert_eq!(check_all(&d), ConfigFlags::WindowSize);
    }

    #[test]
    fn narrowing_needs_the_stream_peripheral() {
        let d = TransferDescriptor {
            hw_fifo: false,
            ..acquisition()
        };
        assert_eq!(check_all(&d), ConfigFlags::TypeMismatch);
    }

    #[test]
    fn buffer_must_hold_a_cycle() {
        let d = TransferDescriptor {
            dst: Endpoint::memory(BUFFER, 32, DataType::Byte),
            ..acquisition()
        };
        assert_eq!(check_all(&d), ConfigFlags::OutOfBounds);
        assert_eq!(
            check(&d, Realign::Disabled, IntegrityChecks::Skip),
            ConfigFlags::Ok
        );
    }

    #[test]
    fn misaligned_source_needs_realign() {
        let d = TransferDescriptor {
            src: Endpoint::register(FILTER_RX + 2, DataType::Word, Trigger::ExtRx),
            ..acquisition()
        };
        assert_eq!(check_all(&d), ConfigFlags::Misaligned);
        assert_eq!(
            check(&d, Realign::Enabled, IntegrityChecks::Perform),
            ConfigFlags::Ok
        );
        assert_eq!(access_width(&d.src, Realign::Enabled), Some(DataType::HalfWord));
    }

    #[test]
    fn tx_slot_cannot_pace_a_source() {
        let d = TransferDescriptor {
            src: Endpoint::register(FILTER_RX, DataType::Word, Trigger::ExtTx),
            ..acquisition()
        };
        assert_eq!(check_all(&d), ConfigFlags::IncompatibleTrigger);
    }

    #[test]
    fn register_inside_the_buffer_overlaps() {
        let d = TransferDescriptor {
            src: Endpoint::register(BUFFER + 8, DataType::Word, Trigger::ExtRx),
            ..acquisition()
        };
        assert_eq!(check_all(&d), ConfigFlags::Overlap);
    }

    #[test]
    fn load_programs_the_channel_block() {
        let regs = RegisterFile::<128>::new();
        let stim = DMA_CHANNEL_STRIDE;
        regs.set_word(reg::STATUS, STATUS_READY);
        regs.set_word(stim + reg::STATUS, STATUS_READY);
        let mut dma = CheepDma::new(regs.mmio());

        let d = acquisition();
        assert_eq!(dma.load(&d), ConfigFlags::Ok);
        assert_eq!(regs.word(reg::SRC_PTR), FILTER_RX as u32);
        assert_eq!(regs.word(reg::DST_PTR), BUFFER as u32);
        assert_eq!(regs.word(reg::SRC_INC_D1), 0);
        assert_eq!(regs.word(reg::DST_INC_D1), 1);
        assert_eq!(regs.word(reg::SRC_DATA_TYPE), 0);
        assert_eq!(regs.word(reg::DST_DATA_TYPE), 2);
        assert_eq!(regs.word(reg::SLOT), SLOT_EXT_RX);
        assert_eq!(regs.word(reg::MODE), 1);
        assert_eq!(regs.word(reg::HW_FIFO_EN), 1);
        assert_eq!(regs.word(reg::WINDOW_SIZE), 16);
        assert_eq!(regs.word(reg::INTERRUPT_EN), 0b11);
        // Nothing starts before launch, and the other channel is untouched.
        assert_eq!(regs.word(reg::SIZE_D1), 0);
        assert_eq!(regs.word(stim + reg::MODE), 0);

        assert_eq!(dma.launch(&d), ConfigFlags::Ok);
        assert_eq!(regs.word(reg::SIZE_D1), 64);
    }

    #[test]
    fn launch_requires_the_loaded_descriptor() {
        let regs = RegisterFile::<128>::new();
        regs.set_word(reg::STATUS, STATUS_READY);
        let mut dma = CheepDma::new(regs.mmio());
        assert_eq!(dma.launch(&acquisition()), ConfigFlags::NotLoaded);

        assert!(dma.load(&acquisition()).is_ok());
        let other = TransferDescriptor {
            window_du: 32,
            ..acquisition()
        };
        assert_eq!(dma.launch(&other), ConfigFlags::NotLoaded);
    }

    #[test]
    fn busy_channel_refuses_a_load() {
        let regs = RegisterFile::<128>::new();
        let mut dma = CheepDma::new(regs.mmio());
        assert!(dma.is_busy(Channel::ACQUISITION));
        assert_eq!(dma.load(&acquisition()), ConfigFlags::Busy);
    }

    #[test]
    fn stop_circular_falls_back_to_single() {
        let regs = RegisterFile::<128>::new();
        regs.set_word(reg::STATUS, STATUS_READY);
        let mut dma = CheepDma::new(regs.mmio());
        assert!(dma.load(&acquisition()).is_ok());
        dma.stop_circular(Channel::ACQUISITION);
        assert_eq!(regs.word(reg::MODE), 0);
        assert_eq!(regs.word(reg::INTERRUPT_EN), 0);
        assert_eq!(dma.launch(&acquisition()), ConfigFlags::NotLoaded);
    }

    #[test]
    fn interrupt_flags_are_per_channel() {
        let regs = RegisterFile::<128>::new();
        let dma = CheepDma::new(regs.mmio());
        regs.set_word(DMA_CHANNEL_STRIDE + reg::WINDOW_IFR, 1);
        assert!(!dma.take_window_done(Channel::ACQUISITION));
        assert!(dma.take_window_done(Channel::STIMULUS));
        assert!(!dma.take_window_done(Channel(7)));
    }
}
