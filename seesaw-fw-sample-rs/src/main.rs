// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Sample application firmware for the seesaw bootloader.
//!
//! Commits the running image so the armed rollback is disarmed, reports
//! how this boot came about, then idles blinking. Holding GP2 low at reset
//! runs a full update rehearsal instead: a copy of the running image is
//! staged through the regular API (`initialize_download_slot` ->
//! `write_aligned` per page -> `mark_download_slot_valid`) and
//! `perform_update` reboots into the bootloader, which swaps the copy in.
//! A transport-fed update follows the same sequence, with
//! `verify_image_sha256` between the last write and the validity mark.

#![no_std]
#![no_main]

use defmt_rtt as _;
use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};
use panic_probe as _;
use rp2040_hal as hal;

use seesaw_common::layout::{APP, FLASH_PAGE_SIZE, SWAP_LEN};
use seesaw_common::{OnChipFlash, Updater};

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

/// Stage a copy of the running image and reboot into the update. The
/// bootloader swaps the copy in and this firmware comes back up reporting
/// a fresh update. Returns only if staging fails.
fn rehearse_update(updater: &mut Updater<OnChipFlash>) {
    defmt::println!("Staging a copy of the running image");
    updater.initialize_download_slot();

    let mut page = [0u8; FLASH_PAGE_SIZE as usize];
    let mut offset = 0u32;
    while offset < SWAP_LEN {
        // Read the running image through the XIP view
        for (i, byte) in page.iter_mut().enumerate() {
            *byte = unsafe { ((APP.base + offset + i as u32) as *const u8).read_volatile() };
        }
        if updater.write_aligned(offset, &page).is_err() {
            defmt::println!("Staging failed, withdrawing the slot");
            updater.mark_download_slot_invalid();
            return;
        }
        offset += FLASH_PAGE_SIZE;
    }

    updater.mark_download_slot_valid();
    defmt::println!("Slot marked valid, rebooting into the update");
    seesaw_common::perform_update();
}

#[entry]
fn main() -> ! {
    defmt::println!("Firmware started");

    // --- Inline peripheral init (need the GP2 trigger pin) ---
    let mut pac = unsafe { hal::pac::Peripherals::steal() };

    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
    let clocks = hal::clocks::init_clocks_and_plls(
        12_000_000u32,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .unwrap();

    let mut timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut led_pin = pins.gpio25.into_push_pull_output();
    let mut update_pin = pins.gpio2.into_pull_up_input();

    seesaw_common::blink(&mut led_pin, &mut timer, 5, 100);

    let flash = unsafe { OnChipFlash::new() };
    let mut updater = Updater::new(flash);

    if updater.is_after_firmware_update() {
        defmt::println!("Running freshly swapped-in firmware");
    }
    if updater.is_after_rollback() {
        defmt::println!("Previous update failed, rolled back to this image");
    }

    // Mark this image healthy; without this the next reset swaps back.
    updater.firmware_commit();
    defmt::println!("Firmware committed");

    // GP2 held low at reset: exercise the update path for real
    if update_pin.is_low().unwrap_or(false) {
        rehearse_update(&mut updater);
    }

    let mut blink_counter = 0u32;
    loop {
        blink_counter += 1;
        if blink_counter >= 500_000 {
            blink_counter = 0;
            if led_pin.is_set_high().unwrap_or(false) {
                led_pin.set_low().ok();
            } else {
                led_pin.set_high().ok();
            }
        }
    }
}
