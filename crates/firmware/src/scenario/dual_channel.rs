//! Dual-channel acquisition.
//!
//! Channel 1 streams the stimulus table into the current DACs while channel 0
//! moves VCO counts through the encoder gate into the result buffer. Once
//! enough windows have completed the gate is widened and switched to bypass,
//! and the run ends on the first gate event.

use acquisition::{AcquisitionError, Coordinator, ResultBuffer, SessionSnapshot};
use embedded_hal::delay::DelayNs;
use platform::{
    Channel, CurrentDac, DacId, DataType, Dimensions, DmaEngine, EncoderGate, Endpoint,
    InterruptControl, InterruptWait, TransferDescriptor, TransferEnd, TransferMode, Trigger,
    VcoDecoder,
};

use super::{settle, Rig};
use crate::profile::{DualChannelProfile, Scenario};
use crate::{golden, stimulus};

/// Stimulus transfer: the stimulus table, circularly, into the DAC current
/// register.
pub fn stimulus_descriptor(dac_current_register: usize) -> TransferDescriptor {
    TransferDescriptor {
        channel: Channel::STIMULUS,
        src: stimulus::endpoint(),
        dst: Endpoint::register(dac_current_register, DataType::HalfWord, Trigger::ExtTx),
        dim: Dimensions::OneD,
        size_d1_du: stimulus::len_du(),
        mode: TransferMode::Circular,
        end: TransferEnd::Interrupt,
        window_du: 0,
        hw_fifo: false,
    }
}

/// Acquisition transfer: VCO counts through the gate into `results`.
pub fn acquisition_descriptor<const N: usize>(
    profile: &DualChannelProfile,
    vco_count_register: usize,
    results: &ResultBuffer<i16, N>,
) -> TransferDescriptor {
    TransferDescriptor {
        channel: Channel::ACQUISITION,
        src: Endpoint::register(vco_count_register, DataType::HalfWord, Trigger::ExtRx),
        dst: results.endpoint(),
        dim: Dimensions::OneD,
        size_d1_du: profile.cycle_du(),
        mode: TransferMode::Circular,
        end: TransferEnd::Interrupt,
        window_du: profile.window_du,
        hw_fifo: true,
    }
}

/// Run the scenario.
///
/// The VCO and both DACs are switched off before returning, on success and
/// on failure.
pub fn run<D, G, I, V, C, T, const N: usize>(
    profile: &DualChannelProfile,
    rig: Rig<'_, D, G, I>,
    vco: &mut V,
    dac: &mut C,
    delay: &mut T,
    results: &ResultBuffer<i16, N>,
) -> Result<SessionSnapshot, AcquisitionError>
where
    D: DmaEngine,
    G: EncoderGate,
    I: InterruptControl + InterruptWait,
    V: VcoDecoder,
    C: CurrentDac,
    T: DelayNs,
{
    platform::info!("scenario {}", Scenario::DualChannel.name());
    let mut coordinator = rig.into_coordinator(profile.coordinator_config());

    let result = acquire(profile, &mut coordinator, vco, dac, delay, results);
    settle(&mut coordinator, &result);

    vco.enable(false, false);
    dac.enable(false, false);
    result
}

fn acquire<D, G, I, V, C, T, const N: usize>(
    profile: &DualChannelProfile,
    coordinator: &mut Coordinator<'_, D, G, I>,
    vco: &mut V,
    dac: &mut C,
    delay: &mut T,
    results: &ResultBuffer<i16, N>,
) -> Result<SessionSnapshot, AcquisitionError>
where
    D: DmaEngine,
    G: EncoderGate,
    I: InterruptControl + InterruptWait,
    V: VcoDecoder,
    C: CurrentDac,
    T: DelayNs,
{
    dac.enable(true, true);
    dac.calibrate(DacId::Dac1, profile.dac_calibration);
    dac.calibrate(DacId::Dac2, profile.dac_calibration);
    dac.set_refresh_rate(profile.dac_refresh_cycles);

    let ready = coordinator.configure(&stimulus_descriptor(dac.current_register_addr()))?;
    coordinator.arm(ready)?;

    vco.enable(true, false);
    vco.set_refresh_rate(profile.vco_refresh_cycles);

    coordinator.program_gate(&profile.dlc, profile.cycle_du())?;
    // Let the oscillators settle so the first samples do not cross a burst of levels.
    delay.delay_us(profile.settle_us);
    let level = coordinator.seed_level(vco.count())?;
    platform::debug!("initial level {}", level);

    let ready = coordinator.configure(&acquisition_descriptor(
        profile,
        vco.count_register_addr(),
        results,
    ))?;
    coordinator.arm(ready)?;

    coordinator.await_progress(profile.target)?;
    coordinator.switch_to_bypass(profile.bypass_log_level_width())?;
    let snapshot = coordinator.await_gate_event(profile.gate_events)?;

    coordinator.finalize(results, &golden::DUAL_CHANNEL)?;
    Ok(SessionSnapshot {
        mode: coordinator.mode(),
        ..snapshot
    })
}
