//! Acquisition session state machine.
//!
//! A session never resets the shared counters. It records their values when
//! it starts (and the gate counter again when bypass is armed) and reports
//! everything relative to those baselines.

use platform::{Channel, InterruptFlags};

use crate::error::ModeError;

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Streaming samples through the gate into the result buffer.
    Acquiring,
    /// Bypass programmed, no gate event seen yet.
    BypassArmed,
    /// At least one gate event seen in bypass.
    BypassActive,
    /// Torn down. Terminal.
    Done,
}

impl Mode {
    /// `true` if the state machine allows `self -> to`.
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Acquiring, Self::BypassArmed)
                | (Self::BypassArmed, Self::BypassActive)
                | (Self::Acquiring | Self::BypassArmed | Self::BypassActive, Self::Done)
        )
    }
}

/// Counter values relative to the session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionSnapshot {
    /// Mode when the snapshot was taken.
    pub mode: Mode,
    /// Awaited acquisition target, if any.
    pub target: Option<u32>,
    /// Window-done interrupts on the acquisition channel.
    pub windows: u32,
    /// Transaction-done interrupts on the acquisition channel.
    pub transactions: u32,
    /// Gate events since bypass was armed.
    pub gate_events: u32,
    /// Wakes spent by the wait that produced this snapshot.
    pub wakes: u32,
}

impl SessionSnapshot {
    /// Windows plus transactions.
    pub const fn progress(&self) -> u32 {
        self.windows.saturating_add(self.transactions)
    }
}

/// One acquisition session.
#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    channel: Channel,
    target: Option<u32>,
    base_windows: u32,
    base_transactions: u32,
    base_gate: u32,
}

impl Session {
    /// Start a session on `channel`, baselining every counter.
    pub fn start(flags: &InterruptFlags, channel: Channel) -> Self {
        Self {
            mode: Mode::Acquiring,
            channel,
            target: None,
            base_windows: flags.window_count(channel),
            base_transactions: flags.transaction_count(channel),
            base_gate: flags.gate_count(),
        }
    }

    /// Current mode.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Acquisition channel.
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Awaited target.
    pub const fn target(&self) -> Option<u32> {
        self.target
    }

    pub(crate) fn set_target(&mut self, target: u32) {
        self.target = Some(target);
    }

    /// Window-done interrupts since the session started.
    pub fn windows(&self, flags: &InterruptFlags) -> u32 {
        flags
            .window_count(self.channel)
            .saturating_sub(self.base_windows)
    }

    /// Transaction-done interrupts since the session started.
    pub fn transactions(&self, flags: &InterruptFlags) -> u32 {
        flags
            .transaction_count(self.channel)
            .saturating_sub(self.base_transactions)
    }

    /// Windows plus transactions since the session started.
    pub fn progress(&self, flags: &InterruptFlags) -> u32 {
        self.windows(flags).saturating_add(self.transactions(flags))
    }

    /// Gate events since the last rebase.
    pub fn gate_events(&self, flags: &InterruptFlags) -> u32 {
        flags.gate_count().saturating_sub(self.base_gate)
    }

    /// Forget gate events seen so far.
    pub(crate) fn rebase_gate(&mut self, flags: &InterruptFlags) {
        self.base_gate = flags.gate_count();
    }

    /// Require `expected`.
    pub fn require(&self, expected: Mode) -> Result<(), ModeError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(ModeError::WrongMode {
                expected,
                actual: self.mode,
            })
        }
    }

    /// Move to `to` if the state machine allows it.
    pub fn transition(&mut self, to: Mode) -> Result<(), ModeError> {
        if self.mode.can_transition(to) {
            self.mode = to;
            Ok(())
        } else {
            Err(ModeError::IllegalTransition {
                from: self.mode,
                to,
            })
        }
    }

    /// Counters relative to the baselines.
    pub fn snapshot(&self, flags: &InterruptFlags, wakes: u32) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            target: self.target,
            windows: self.windows(flags),
            transactions: self.transactions(flags),
            gate_events: self.gate_events(flags),
            wakes,
        }
    }
}
