// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Fixed flash partition map.
//!
//! Four regions on the 2 MiB on-board QSPI flash, all resolved at build
//! time. Addresses are CPU-visible XIP addresses; flash driver calls take
//! device offsets (`FlashRegion::offset`).
//!
//! ```text
//! 0x1000_0000  bootloader (64 KiB, incl. boot2)
//! 0x1001_0000  INFO       (one 4 KiB sector: markers + swap journal)
//! 0x1002_0000  APP        (768 KiB, executes in place)
//! 0x100E_0000  DOWNLOAD   (768 KiB, staging slot)
//! ```

pub const FLASH_BASE: u32 = 0x1000_0000;
pub const FLASH_SIZE: u32 = 2 * 1024 * 1024;

pub const FLASH_SECTOR_SIZE: u32 = 4096;
pub const FLASH_PAGE_SIZE: u32 = 256;

/// Byte length of each swappable image region.
pub const SWAP_LEN: u32 = 0x000C_0000;
pub const SECTORS_PER_IMAGE: u32 = APP.sectors();

/// A flash region addressable both as XIP memory and as a device offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlashRegion {
    /// XIP (CPU-visible) base address.
    pub base: u32,
    pub len: u32,
}

impl FlashRegion {
    /// Device offset for erase/program calls.
    pub const fn offset(&self) -> u32 {
        self.base - FLASH_BASE
    }

    pub const fn end(&self) -> u32 {
        self.base + self.len
    }

    pub const fn sectors(&self) -> u32 {
        self.len / FLASH_SECTOR_SIZE
    }
}

pub const INFO: FlashRegion = FlashRegion {
    base: 0x1001_0000,
    len: FLASH_SECTOR_SIZE,
};

pub const APP: FlashRegion = FlashRegion {
    base: 0x1002_0000,
    len: SWAP_LEN,
};

pub const DOWNLOAD: FlashRegion = FlashRegion {
    base: 0x100E_0000,
    len: SWAP_LEN,
};

// --- Marker cells inside the INFO sector ---

/// Byte offset of the `DOWNLOAD_VALID` cell.
pub const DOWNLOAD_VALID_OFFSET: u32 = 0x00;
/// Byte offset of the `FIRMWARE_SWAPPED` cell.
pub const FIRMWARE_SWAPPED_OFFSET: u32 = 0x04;
/// Byte offset of the `SHOULD_ROLLBACK` cell.
pub const SHOULD_ROLLBACK_OFFSET: u32 = 0x08;
/// Byte offset of the `IS_AFTER_ROLLBACK` cell.
pub const AFTER_ROLLBACK_OFFSET: u32 = 0x0C;

/// Swap progress journal: one page, one bit per sector pair
/// (erased = pending, programmed to 0 = exchanged).
pub const SWAP_JOURNAL_OFFSET: u32 = 0x100;
pub const SWAP_JOURNAL_BYTES: u32 = SECTORS_PER_IMAGE.div_ceil(8);

// Compile-time layout checks
const _: () = assert!(APP.len == DOWNLOAD.len);
const _: () = assert!(SWAP_LEN % FLASH_SECTOR_SIZE == 0);
const _: () = assert!(INFO.base % FLASH_SECTOR_SIZE == 0);
const _: () = assert!(APP.base % FLASH_SECTOR_SIZE == 0);
const _: () = assert!(DOWNLOAD.base % FLASH_SECTOR_SIZE == 0);
const _: () = assert!(INFO.end() <= APP.base);
const _: () = assert!(APP.end() <= DOWNLOAD.base);
const _: () = assert!(DOWNLOAD.end() <= FLASH_BASE + FLASH_SIZE);
const _: () = assert!(SWAP_JOURNAL_OFFSET % FLASH_PAGE_SIZE == 0);
const _: () = assert!(SWAP_JOURNAL_OFFSET + SWAP_JOURNAL_BYTES <= FLASH_SECTOR_SIZE);
const _: () = assert!(FLASH_PAGE_SIZE % 16 == 0); // cipher block unit
