//! Always-on machine timer.
//!
//! Runs at 1 MHz once [`RvTimer::init`] has set the prescaler, so ticks are
//! microseconds. Hart 0 comparator drives the machine timer interrupt.

use embedded_hal::delay::DelayNs;

use super::mmio::Mmio;

mod reg {
    pub const CTRL: usize = 0x000;
    pub const INTR_ENABLE0: usize = 0x100;
    pub const INTR_STATE0: usize = 0x104;
    pub const CFG0: usize = 0x10C;
    pub const TIMER_V_LOWER0: usize = 0x110;
    pub const TIMER_V_UPPER0: usize = 0x114;
    pub const COMPARE_LOWER0_0: usize = 0x118;
    pub const COMPARE_UPPER0_0: usize = 0x11C;
}

const TICK_HZ: u32 = 1_000_000;
const STEP_SHIFT: u32 = 16;

/// rv_timer block.
#[derive(Debug)]
pub struct RvTimer {
    regs: Mmio,
}

impl RvTimer {
    /// Timer whose register block is at `regs`.
    pub const fn new(regs: Mmio) -> Self {
        Self { regs }
    }

    /// Prescale the system clock down to 1 MHz and start counting.
    pub fn init(&mut self, sysclk_hz: u32) {
        let prescale = sysclk_hz.checked_div(TICK_HZ).unwrap_or(1).saturating_sub(1) & 0xFFF;
        self.regs.write(reg::CTRL, 0);
        self.disarm();
        self.regs.write(reg::CFG0, prescale | (1 << STEP_SHIFT));
        self.regs.write(reg::TIMER_V_LOWER0, 0);
        self.regs.write(reg::TIMER_V_UPPER0, 0);
        self.regs.write(reg::CTRL, 1);
    }

    /// Microseconds since [`init`](Self::init).
    pub fn now(&self) -> u64 {
        loop {
            let upper = self.regs.read(reg::TIMER_V_UPPER0);
            let lower = self.regs.read(reg::TIMER_V_LOWER0);
            // A carry between the two reads shows up as a changed upper half.
            if self.regs.read(reg::TIMER_V_UPPER0) == upper {
                return (u64::from(upper) << 32) | u64::from(lower);
            }
        }
    }

    /// Raise the timer interrupt `us` microseconds from now.
    pub fn arm_deadline(&mut self, us: u32) {
        let deadline = self.now().saturating_add(u64::from(us));
        // Upper half first at all ones so no intermediate compare value
        // fires early.
        self.regs.write(reg::COMPARE_UPPER0_0, u32::MAX);
        self.regs.write(reg::COMPARE_LOWER0_0, low_half(deadline));
        self.regs.write(reg::COMPARE_UPPER0_0, high_half(deadline));
        self.regs.write(reg::INTR_ENABLE0, 1);
    }

    /// Cancel a pending deadline.
    pub fn disarm(&mut self) {
        self.regs.write(reg::INTR_ENABLE0, 0);
        self.regs.write(reg::COMPARE_UPPER0_0, u32::MAX);
        self.regs.write(reg::COMPARE_LOWER0_0, u32::MAX);
        self.regs.write(reg::INTR_STATE0, 1);
    }

    /// Consume the expiry flag.
    pub fn take_expired(&mut self) -> bool {
        let expired = self.regs.read(reg::INTR_STATE0) & 1 != 0;
        if expired {
            self.disarm();
        }
        expired
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn low_half(v: u64) -> u32 {
    v as u32
}

#[allow(clippy::cast_possible_truncation)]
const fn high_half(v: u64) -> u32 {
    (v >> 32) as u32
}

impl DelayNs for RvTimer {
    fn delay_ns(&mut self, ns: u32) {
        let start = self.now();
        let ticks = u64::from(ns.div_ceil(1_000));
        while self.now().saturating_sub(start) < ticks {
            core::hint::spin_loop();
        }
    }
}
