//! Dual-channel acquisition image.
//!
//! Streams the stimulus table into the current DACs, captures the VCO counts
//! through the encoder gate and reports the integrity result through SoC
//! control.

#![no_std]
#![no_main]

use acquisition::ResultBuffer;
use defmt_rtt as _;
use panic_halt as _;
use platform::InterruptWait;
use static_cell::StaticCell;

use firmware::boot::{self, Shared};
use firmware::hw::hart::Hart;
use firmware::hw::{trap, Board, MemoryMap};
use firmware::DualChannelProfile;

static BOARD: StaticCell<Board> = StaticCell::new();
static RESULTS: ResultBuffer<i16, 500> = ResultBuffer::new(0);

#[riscv_rt::entry]
fn main() -> ! {
    let map = MemoryMap::CHEEP;
    // SAFETY: the entry point runs once, on the SoC `map` describes.
    let (board, mut hart) = unsafe { (BOARD.init(Board::new(&map)), Hart::new(&map)) };

    boot::init(board, &map);
    hart.unmask_global();

    let code = boot::run_dual_channel(
        board,
        &mut hart,
        Shared {
            flags: &trap::FLAGS,
            cancel: &trap::CANCEL,
        },
        &DualChannelProfile::default(),
        &RESULTS,
    );
    board.soc.exit(code)
}
