// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! RP2040 board support for application firmware.
//!
//! Flash erase/program go through the bootrom routines. On RP2040 the full
//! sequence is connect_internal_flash / flash_exit_xip / op /
//! flash_flush_cache / flash_enter_cmd_xip, and it must run with
//! interrupts masked: vectors and handlers live in XIP and are unreadable
//! while the flash controller is busy.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use rp2040_hal as hal;
use rp2040_hal::fugit::ExtU32;

use crate::layout::{FLASH_BASE, FLASH_SECTOR_SIZE};
use crate::storage::FlashStorage;

/// The on-chip QSPI flash, driven through the bootrom.
///
/// Construction is unsafe: the caller asserts that nothing else touches
/// the flash controller while this handle exists and that none of the
/// operations are invoked from interrupt context.
pub struct OnChipFlash {
    _private: (),
}

impl OnChipFlash {
    /// # Safety
    /// See the type-level contract.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl FlashStorage for OnChipFlash {
    fn erase(&mut self, offset: u32, len: u32) {
        cortex_m::interrupt::free(|_| unsafe {
            hal::rom_data::connect_internal_flash();
            hal::rom_data::flash_exit_xip();
            hal::rom_data::flash_range_erase(offset, len as usize, FLASH_SECTOR_SIZE, 0x20);
            hal::rom_data::flash_flush_cache();
            hal::rom_data::flash_enter_cmd_xip();
        });
    }

    fn program(&mut self, offset: u32, data: &[u8]) {
        cortex_m::interrupt::free(|_| unsafe {
            hal::rom_data::connect_internal_flash();
            hal::rom_data::flash_exit_xip();
            hal::rom_data::flash_range_program(offset, data.as_ptr(), data.len());
            hal::rom_data::flash_flush_cache();
            hal::rom_data::flash_enter_cmd_xip();
        });
    }

    fn read(&self, offset: u32, buf: &mut [u8]) {
        let base = (FLASH_BASE + offset) as *const u8;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = unsafe { base.add(i).read_volatile() };
        }
    }
}

/// Arm a one-millisecond hardware watchdog and wait for it to fire. The
/// bootloader evaluates the update markers on the way back up.
pub fn perform_update() -> ! {
    let pac = unsafe { hal::pac::Peripherals::steal() };
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
    watchdog.enable_tick_generation(12);
    watchdog.start(1.millis());
    loop {
        cortex_m::asm::nop();
    }
}

pub type LedPin =
    hal::gpio::Pin<hal::gpio::bank0::Gpio25, hal::gpio::FunctionSioOutput, hal::gpio::PullDown>;

/// Initialize RP2040 clocks, timer and the on-board LED.
///
/// # Safety
/// Uses `Peripherals::steal` — caller must ensure exclusive peripheral access.
pub fn init_board() -> (hal::Timer, LedPin) {
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

    let timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    (timer, pins.gpio25.into_push_pull_output())
}

/// Blink an LED a specified number of times.
pub fn blink(led: &mut impl OutputPin, timer: &mut impl DelayNs, count: u32, period_ms: u32) {
    for _ in 0..count {
        led.set_high().ok();
        timer.delay_ms(period_ms);
        led.set_low().ok();
        timer.delay_ms(period_ms);
    }
}
