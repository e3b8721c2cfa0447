// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Seesaw FOTA bootloader for RP2040.
//!
//! Runs from the first 64 KiB of flash at every reset: evaluates the INFO
//! markers, swaps or rolls back the application image if required, then
//! quiesces the peripherals and chainloads the application vector table.

#![no_std]
#![no_main]

mod boot;
mod flash;

use defmt_rtt as _;
use panic_probe as _;

use seesaw_common::{layout, run_boot_sequence, BootPath};

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

#[entry]
fn main() -> ! {
    defmt::println!("Bootloader init");

    let (mut timer, mut led_pin) = seesaw_common::init_board();
    seesaw_common::blink(&mut led_pin, &mut timer, 3, 100);

    let mut storage = flash::XipFlash::new();

    let report = run_boot_sequence(&mut storage);
    match report.path {
        BootPath::Plain => defmt::println!("Nothing to swap"),
        BootPath::Activate => defmt::println!("Swapped in the staged image"),
        BootPath::Rollback => defmt::println!("Rolled back to the previous firmware"),
    }
    if let Some(e) = report.swap_error {
        defmt::println!("Swap aborted: readback mismatch in sector {}", e.sector);
    }

    defmt::println!("Handing over to the application");
    boot::quiesce();
    unsafe { boot::chainload(layout::APP.base) }
}
