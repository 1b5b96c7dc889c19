//! Filter-chain acquisition image.
//!
//! Reads the decimation filter output through the encoder gate, once through
//! the SES filter and once through the CIC decimator. The first failing
//! session decides the exit code.

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
use firmware::{FilterChainProfile, FilterPath};

static BOARD: StaticCell<Board> = StaticCell::new();
static SES_RESULTS: ResultBuffer<u8, 512> = ResultBuffer::new(0);
static CIC_RESULTS: ResultBuffer<u8, 512> = ResultBuffer::new(0);

#[riscv_rt::entry]
fn main() -> ! {
    let map = MemoryMap::CHEEP;
    // SAFETY: the entry point runs once, on the SoC `map` describes.
    let (board, mut hart) = unsafe { (BOARD.init(Board::new(&map)), Hart::new(&map)) };

    boot::init(board, &map);
    hart.unmask_global();

    let shared = Shared {
        flags: &trap::FLAGS,
        cancel: &trap::CANCEL,
    };
    let mut code = platform::config::EXIT_SUCCESS;
    for (path, results) in [(FilterPath::Ses, &SES_RESULTS), (FilterPath::Cic, &CIC_RESULTS)] {
        let profile = FilterChainProfile::new(path);
        let run = boot::run_filter_chain(board, &mut hart, shared, &profile, results);
        if code == platform::config::EXIT_SUCCESS {
            code = run;
        }
    }
    board.soc.exit(code)
}
