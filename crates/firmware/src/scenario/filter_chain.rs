//! Filter-chain acquisition.
//!
//! The decimation filter output is read word by word, encoded by the gate and
//! stored as one byte per event. The filter is only configured and started
//! once the DMA is armed, so no output is produced before the engine listens.

use acquisition::{AcquisitionError, Coordinator, ResultBuffer, SessionSnapshot};
use platform::{
    Channel, DataType, DecimationFilter, Dimensions, DmaEngine, EncoderGate, Endpoint,
    InterruptControl, InterruptWait, TransferDescriptor, TransferEnd, TransferMode, Trigger,
};

use super::{settle, Rig};
use crate::golden;
use crate::profile::{FilterChainProfile, Scenario};

/// Acquisition transfer: filter output through the gate into `results`.
pub fn descriptor<const N: usize>(
    profile: &FilterChainProfile,
    filter_rx_register: usize,
    results: &ResultBuffer<u8, N>,
) -> TransferDescriptor {
    TransferDescriptor {
        channel: Channel::ACQUISITION,
        src: Endpoint::register(filter_rx_register, DataType::Word, Trigger::ExtRx),
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
/// Filter parameters are checked before any hardware is touched. The filter
/// is stopped before returning.
pub fn run<D, G, I, F, const N: usize>(
    profile: &FilterChainProfile,
    rig: Rig<'_, D, G, I>,
    filter: &mut F,
    results: &ResultBuffer<u8, N>,
) -> Result<SessionSnapshot, AcquisitionError>
where
    D: DmaEngine,
    G: EncoderGate,
    I: InterruptControl + InterruptWait,
    F: DecimationFilter,
{
    platform::info!("scenario {}", Scenario::FilterChain(profile.path).name());
    profile.filter.validate()?;

    let mut coordinator = rig.into_coordinator(profile.coordinator_config());
    let result = acquire(profile, &mut coordinator, filter, results);
    settle(&mut coordinator, &result);

    filter.stop();
    result
}

fn acquire<D, G, I, F, const N: usize>(
    profile: &FilterChainProfile,
    coordinator: &mut Coordinator<'_, D, G, I>,
    filter: &mut F,
    results: &ResultBuffer<u8, N>,
) -> Result<SessionSnapshot, AcquisitionError>
where
    D: DmaEngine,
    G: EncoderGate,
    I: InterruptControl + InterruptWait,
    F: DecimationFilter,
{
    coordinator.program_gate(&profile.dlc, profile.cycle_du())?;

    let ready = coordinator.configure(&descriptor(profile, filter.rx_register_addr(), results))?;
    coordinator.arm(ready)?;

    filter.configure(&profile.filter)?;
    filter.start();

    let snapshot = coordinator.await_progress(profile.target)?;
    coordinator.finalize(results, &golden::FILTER_CHAIN)?;
    Ok(SessionSnapshot {
        mode: coordinator.mode(),
        ..snapshot
    })
}
