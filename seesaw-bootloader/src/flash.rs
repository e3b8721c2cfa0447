// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash driver for the boot sequence.
//!
//! Erase and program go through the bootrom. While one of those runs, the
//! serial flash is in command mode and XIP fetches stall, so nothing on
//! the way to the bootrom call may execute from flash: the wrapper
//! functions are placed in `.data` (copied to RAM by the startup code) and
//! the bootrom entry points are resolved up front, while XIP is still
//! alive, and carried in the driver itself. The swap engine performs
//! thousands of erase/program calls per update boot through this driver;
//! the application-side driver in `seesaw-common` keeps the simpler
//! per-call `rom_data` wrappers instead.

use seesaw_common::layout::{FLASH_BASE, FLASH_SECTOR_SIZE};
use seesaw_common::FlashStorage;

/// Bootrom command byte for a 4 KiB sector erase.
const SECTOR_ERASE_CMD: u8 = 0x20;

/// The bootrom flash entry points, resolved through the ROM table.
#[derive(Clone, Copy)]
struct RomRoutines {
    connect_internal_flash: unsafe extern "C" fn(),
    exit_xip: unsafe extern "C" fn(),
    range_erase: unsafe extern "C" fn(u32, usize, u32, u8),
    range_program: unsafe extern "C" fn(u32, *const u8, usize),
    flush_cache: unsafe extern "C" fn(),
    enter_cmd_xip: unsafe extern "C" fn(),
}

/// Ask the bootrom for the entry point registered under `tag`. The ROM
/// keeps halfword pointers to its function table at 0x14 and to the table
/// walker at 0x18.
unsafe fn rom_table_lookup(tag: [u8; 2]) -> usize {
    type TableWalker = unsafe extern "C" fn(*const u16, u32) -> usize;
    let table = (0x14 as *const u16).read() as *const u16;
    let walk: TableWalker = core::mem::transmute((0x18 as *const u16).read() as usize);
    walk(table, u16::from_le_bytes(tag) as u32)
}

impl RomRoutines {
    /// Resolve every entry point this driver needs. The table walk itself
    /// runs from ROM and XIP, so it must happen before any flash operation.
    fn resolve() -> Self {
        unsafe {
            Self {
                connect_internal_flash: core::mem::transmute(rom_table_lookup(*b"IF")),
                exit_xip: core::mem::transmute(rom_table_lookup(*b"EX")),
                range_erase: core::mem::transmute(rom_table_lookup(*b"RE")),
                range_program: core::mem::transmute(rom_table_lookup(*b"RP")),
                flush_cache: core::mem::transmute(rom_table_lookup(*b"FC")),
                enter_cmd_xip: core::mem::transmute(rom_table_lookup(*b"CX")),
            }
        }
    }
}

/// Runs from RAM; XIP is unusable between `exit_xip` and `enter_cmd_xip`.
#[link_section = ".data"]
#[inline(never)]
unsafe fn erase_raw(rom: &RomRoutines, offset: u32, len: u32) {
    (rom.connect_internal_flash)();
    (rom.exit_xip)();
    (rom.range_erase)(offset, len as usize, FLASH_SECTOR_SIZE, SECTOR_ERASE_CMD);
    (rom.flush_cache)();
    (rom.enter_cmd_xip)();
}

/// Runs from RAM; XIP is unusable between `exit_xip` and `enter_cmd_xip`.
#[link_section = ".data"]
#[inline(never)]
unsafe fn program_raw(rom: &RomRoutines, offset: u32, data: *const u8, len: usize) {
    (rom.connect_internal_flash)();
    (rom.exit_xip)();
    (rom.range_program)(offset, data, len);
    (rom.flush_cache)();
    (rom.enter_cmd_xip)();
}

/// The on-chip flash as seen by the boot sequence.
pub struct XipFlash {
    rom: RomRoutines,
}

impl XipFlash {
    /// Resolve the bootrom entry points and hand out the driver. Must be
    /// constructed before the first erase or program, while XIP still
    /// works.
    pub fn new() -> Self {
        Self {
            rom: RomRoutines::resolve(),
        }
    }
}

impl FlashStorage for XipFlash {
    fn erase(&mut self, offset: u32, len: u32) {
        cortex_m::interrupt::free(|_| unsafe { erase_raw(&self.rom, offset, len) });
    }

    fn program(&mut self, offset: u32, data: &[u8]) {
        cortex_m::interrupt::free(|_| unsafe {
            program_raw(&self.rom, offset, data.as_ptr(), data.len())
        });
    }

    fn read(&self, offset: u32, buf: &mut [u8]) {
        let base = (FLASH_BASE + offset) as *const u8;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = unsafe { base.add(i).read_volatile() };
        }
    }
}
