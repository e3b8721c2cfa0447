// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Sector-by-sector exchange of the application and download regions.
//!
//! Each iteration lifts one sector pair into RAM, erases both sectors and
//! programs them back crosswise. Interrupts stay disabled for the whole
//! exchange; vectors live in XIP and are unreadable while the flash
//! controller is busy.
//!
//! Progress is journaled in the INFO sector: one bit per sector pair,
//! cleared (1 -> 0, no erase needed) once the pair is exchanged and
//! verified. A swap interrupted by power loss therefore resumes where it
//! stopped on the next boot instead of re-toggling sectors it already
//! exchanged. The journal is reset to all-ones by the boot transition that
//! retires the swap request. While a pair sits erased its contents exist
//! only in RAM; power loss inside that window loses the pair.

use crate::layout::{
    APP, DOWNLOAD, FLASH_PAGE_SIZE, FLASH_SECTOR_SIZE, INFO, SECTORS_PER_IMAGE,
    SWAP_JOURNAL_BYTES, SWAP_JOURNAL_OFFSET,
};
use crate::storage::FlashStorage;

const SECTOR: usize = FLASH_SECTOR_SIZE as usize;
const PAGE: usize = FLASH_PAGE_SIZE as usize;

/// Readback after programming did not match the source buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapError {
    /// Index of the sector pair that failed.
    pub sector: u32,
}

/// Exchange the contents of the application and download regions.
///
/// Sector pairs already recorded in the journal are skipped, so calling
/// this again after an interruption completes the same exchange. On a
/// readback mismatch the exchange aborts; the caller is expected to retire
/// the swap request regardless and let the armed rollback recover the
/// device.
pub fn swap_images<F: FlashStorage>(flash: &mut F) -> Result<(), SwapError> {
    critical_section::with(|_| {
        let mut app_buf = [0u8; SECTOR];
        let mut dl_buf = [0u8; SECTOR];

        for i in 0..SECTORS_PER_IMAGE {
            if !sector_pending(flash, i) {
                continue;
            }

            let app_off = APP.offset() + i * FLASH_SECTOR_SIZE;
            let dl_off = DOWNLOAD.offset() + i * FLASH_SECTOR_SIZE;

            flash.read(app_off, &mut app_buf);
            flash.read(dl_off, &mut dl_buf);

            flash.erase(app_off, FLASH_SECTOR_SIZE);
            flash.erase(dl_off, FLASH_SECTOR_SIZE);

            program_sector(flash, app_off, &dl_buf);
            program_sector(flash, dl_off, &app_buf);

            if !sector_matches(flash, app_off, &dl_buf) || !sector_matches(flash, dl_off, &app_buf)
            {
                return Err(SwapError { sector: i });
            }

            mark_sector_done(flash, i);
        }
        Ok(())
    })
}

fn program_sector<F: FlashStorage>(flash: &mut F, offset: u32, data: &[u8; SECTOR]) {
    for (i, page) in data.chunks(PAGE).enumerate() {
        flash.program(offset + (i * PAGE) as u32, page);
    }
}

fn sector_matches<F: FlashStorage>(flash: &F, offset: u32, expected: &[u8; SECTOR]) -> bool {
    let mut page = [0u8; PAGE];
    for (i, want) in expected.chunks(PAGE).enumerate() {
        flash.read(offset + (i * PAGE) as u32, &mut page);
        if page != want {
            return false;
        }
    }
    true
}

// --- Swap journal ---

fn sector_pending<F: FlashStorage>(flash: &F, sector: u32) -> bool {
    let mut byte = [0u8; 1];
    flash.read(INFO.offset() + SWAP_JOURNAL_OFFSET + sector / 8, &mut byte);
    byte[0] & (1 << (sector % 8)) != 0
}

fn mark_sector_done<F: FlashStorage>(flash: &mut F, sector: u32) {
    // Program the journal page in place: clearing one more bit never needs
    // an erase, and re-programming the unchanged bytes is a no-op on NOR.
    let mut page = [0xFFu8; PAGE];
    flash.read(
        INFO.offset() + SWAP_JOURNAL_OFFSET,
        &mut page[..SWAP_JOURNAL_BYTES as usize],
    );
    page[(sector / 8) as usize] &= !(1 << (sector % 8));
    flash.program(INFO.offset() + SWAP_JOURNAL_OFFSET, &page);
}
