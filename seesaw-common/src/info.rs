// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! INFO sector codec.
//!
//! The INFO sector is the only persistent state the bootloader owns. Cells
//! are read by direct loads; every write goes through this module, which
//! rewrites the whole sector: copy to a RAM buffer, patch, erase, program
//! back page by page. The erase and the re-program run inside one critical
//! section — the flash controller shares the XIP bus with the running code,
//! so no interrupt handler may execute in between.
//!
//! If power is lost between the erase and the end of the re-program, the
//! sector reads all-ones: every cell decodes as "not set" and the next
//! boot takes the plain branch. That is the canonical safe state.

use crate::layout::{
    AFTER_ROLLBACK_OFFSET, DOWNLOAD_VALID_OFFSET, FIRMWARE_SWAPPED_OFFSET, FLASH_PAGE_SIZE,
    FLASH_SECTOR_SIZE, INFO, SHOULD_ROLLBACK_OFFSET, SWAP_JOURNAL_BYTES, SWAP_JOURNAL_OFFSET,
};
use crate::markers::BootMarkers;
use crate::storage::FlashStorage;

const SECTOR: usize = FLASH_SECTOR_SIZE as usize;
const PAGE: usize = FLASH_PAGE_SIZE as usize;

/// Read one marker cell.
pub fn read_marker<F: FlashStorage>(flash: &F, marker_offset: u32) -> u32 {
    debug_assert!(marker_offset + 4 <= FLASH_SECTOR_SIZE);
    let mut word = [0u8; 4];
    flash.read(INFO.offset() + marker_offset, &mut word);
    u32::from_le_bytes(word)
}

/// Snapshot all four marker cells.
pub fn read_markers<F: FlashStorage>(flash: &F) -> BootMarkers {
    BootMarkers {
        download_valid: read_marker(flash, DOWNLOAD_VALID_OFFSET),
        firmware_swapped: read_marker(flash, FIRMWARE_SWAPPED_OFFSET),
        should_rollback: read_marker(flash, SHOULD_ROLLBACK_OFFSET),
        after_rollback: read_marker(flash, AFTER_ROLLBACK_OFFSET),
    }
}

/// Update a single marker cell, preserving every other byte of the sector.
///
/// A write that would not change the cell is skipped, so repeated commits
/// cost no erase cycle. Must not be called from interrupt context.
pub fn write_marker<F: FlashStorage>(flash: &mut F, marker_offset: u32, value: u32) {
    if read_marker(flash, marker_offset) == value {
        return;
    }
    rewrite_sector(flash, &[(marker_offset, value)], false);
}

/// Apply a boot transition: several marker cells at once, optionally
/// resetting the swap journal back to all-ones, in a single erase/program
/// cycle. Skipped entirely when the sector already holds the target state.
pub fn apply_boot_transition<F: FlashStorage>(
    flash: &mut F,
    updates: &[(u32, u32)],
    reset_journal: bool,
) {
    let cells_current = updates
        .iter()
        .all(|&(offset, value)| read_marker(flash, offset) == value);
    if cells_current && (!reset_journal || journal_is_clean(flash)) {
        return;
    }
    rewrite_sector(flash, updates, reset_journal);
}

fn journal_is_clean<F: FlashStorage>(flash: &F) -> bool {
    let mut journal = [0u8; SWAP_JOURNAL_BYTES as usize];
    flash.read(INFO.offset() + SWAP_JOURNAL_OFFSET, &mut journal);
    journal.iter().all(|&b| b == 0xFF)
}

fn rewrite_sector<F: FlashStorage>(flash: &mut F, updates: &[(u32, u32)], reset_journal: bool) {
    let mut sector = [0u8; SECTOR];
    flash.read(INFO.offset(), &mut sector);

    for &(offset, value) in updates {
        debug_assert!(offset + 4 <= FLASH_SECTOR_SIZE);
        let at = offset as usize;
        sector[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
    if reset_journal {
        let at = SWAP_JOURNAL_OFFSET as usize;
        sector[at..at + SWAP_JOURNAL_BYTES as usize].fill(0xFF);
    }

    critical_section::with(|_| {
        flash.erase(INFO.offset(), FLASH_SECTOR_SIZE);
        for (i, page) in sector.chunks(PAGE).enumerate() {
            flash.program(INFO.offset() + (i * PAGE) as u32, page);
        }
    });
}
