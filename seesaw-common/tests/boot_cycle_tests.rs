// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Full update cycles: stage, reboot, swap, commit or roll back.
//!
//! Each test drives the same code the bootloader binary runs, against the
//! simulated flash, with `Updater` standing in for the application between
//! "reboots".

use seesaw_common::boot::run_boot_sequence;
use seesaw_common::info::read_marker;
use seesaw_common::layout::{
    AFTER_ROLLBACK_OFFSET, APP, DOWNLOAD, DOWNLOAD_VALID_OFFSET, FIRMWARE_SWAPPED_OFFSET,
    SHOULD_ROLLBACK_OFFSET,
};
use seesaw_common::markers::BootPath;
use seesaw_common::sim::SimFlash;
use seesaw_common::{FlashStorage, Updater};

fn make_image(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

/// Put a firmware image into the APP region, as if it were already running.
fn install_app(sim: &mut SimFlash, image: &[u8]) {
    sim.program(APP.offset(), image);
}

/// Application-side staging: initialize the slot, stream the image, mark it.
fn stage_image(sim: &mut SimFlash, image: &[u8]) {
    let mut updater = Updater::new(&mut *sim);
    updater.initialize_download_slot();
    updater.write_aligned(0, image).unwrap();
    updater.mark_download_slot_valid();
}

fn app_contents(sim: &SimFlash, len: usize) -> &[u8] {
    sim.contents(APP.offset(), len as u32)
}

// =============================================================================
// S1: cold boot with an erased INFO sector
// =============================================================================

#[test]
fn test_cold_boot_takes_plain_branch_and_writes_cleared_markers() {
    let mut sim = SimFlash::new();

    let report = run_boot_sequence(&mut sim);
    assert_eq!(report.path, BootPath::Plain);
    assert_eq!(report.swap_error, None);

    // The cells are now the explicit cleared encoding, not erased 0xFF
    assert_eq!(read_marker(&sim, FIRMWARE_SWAPPED_OFFSET), 0x0000_0000);
    assert_eq!(read_marker(&sim, DOWNLOAD_VALID_OFFSET), 0x0000_0000);

    let updater = Updater::new(&mut sim);
    assert!(!updater.is_after_firmware_update());
    assert!(!updater.is_after_rollback());
}

// =============================================================================
// S2: stage an image and activate it
// =============================================================================

#[test]
fn test_update_boot_swaps_staged_image_in() {
    let mut sim = SimFlash::new();
    let original = make_image(0x11, 4096);
    let staged = make_image(0x77, 4096);
    install_app(&mut sim, &original);
    stage_image(&mut sim, &staged);

    let report = run_boot_sequence(&mut sim);
    assert_eq!(report.path, BootPath::Activate);
    assert_eq!(report.swap_error, None);

    // APP now runs the new image; the old one is parked in DOWNLOAD
    assert_eq!(app_contents(&sim, 4096), &staged[..]);
    assert_eq!(sim.contents(DOWNLOAD.offset(), 4096), &original[..]);

    assert_eq!(read_marker(&sim, FIRMWARE_SWAPPED_OFFSET), 0x1234_5678);
    assert_eq!(read_marker(&sim, SHOULD_ROLLBACK_OFFSET), 0x0DEA_DEAD);
    assert_eq!(read_marker(&sim, DOWNLOAD_VALID_OFFSET), 0x0000_0000);

    let updater = Updater::new(&mut sim);
    assert!(updater.is_after_firmware_update());
    assert!(!updater.is_after_rollback());
}

// =============================================================================
// S3: the new image never commits -> rollback
// =============================================================================

#[test]
fn test_uncommitted_update_rolls_back_on_next_boot() {
    let mut sim = SimFlash::new();
    let original = make_image(0x11, 4096);
    let staged = make_image(0x77, 4096);
    install_app(&mut sim, &original);
    stage_image(&mut sim, &staged);

    run_boot_sequence(&mut sim);
    // The new image runs but never calls firmware_commit

    let report = run_boot_sequence(&mut sim);
    assert_eq!(report.path, BootPath::Rollback);

    assert_eq!(app_contents(&sim, 4096), &original[..]);
    assert_eq!(read_marker(&sim, AFTER_ROLLBACK_OFFSET), 0xBEEF_BEEF);
    assert_eq!(read_marker(&sim, SHOULD_ROLLBACK_OFFSET), 0x0000_0000);

    let updater = Updater::new(&mut sim);
    assert!(updater.is_after_rollback());
    assert!(!updater.is_after_firmware_update());
}

// =============================================================================
// S4: the new image commits -> it stays
// =============================================================================

#[test]
fn test_committed_update_survives_the_next_boot() {
    let mut sim = SimFlash::new();
    let original = make_image(0x11, 4096);
    let staged = make_image(0x77, 4096);
    install_app(&mut sim, &original);
    stage_image(&mut sim, &staged);

    run_boot_sequence(&mut sim);
    Updater::new(&mut sim).firmware_commit();

    let report = run_boot_sequence(&mut sim);
    assert_eq!(report.path, BootPath::Plain);

    assert_eq!(app_contents(&sim, 4096), &staged[..]);
    assert_eq!(read_marker(&sim, AFTER_ROLLBACK_OFFSET), 0x0000_0000);

    let updater = Updater::new(&mut sim);
    assert!(!updater.is_after_firmware_update());
    assert!(!updater.is_after_rollback());
}

// =============================================================================
// Commit and withdrawal
// =============================================================================

#[test]
fn test_commit_clears_rollback_arm_regardless_of_prior_state() {
    let mut sim = SimFlash::new();
    stage_image(&mut sim, &make_image(0x42, 4096));
    run_boot_sequence(&mut sim);
    assert_eq!(read_marker(&sim, SHOULD_ROLLBACK_OFFSET), 0x0DEA_DEAD);

    let mut updater = Updater::new(&mut sim);
    updater.firmware_commit();
    updater.firmware_commit(); // idempotent
    drop(updater);
    assert_eq!(read_marker(&sim, SHOULD_ROLLBACK_OFFSET), 0x0000_0000);
}

#[test]
fn test_invalidated_slot_boots_plain() {
    let mut sim = SimFlash::new();
    let original = make_image(0x11, 4096);
    install_app(&mut sim, &original);
    stage_image(&mut sim, &make_image(0x77, 4096));

    Updater::new(&mut sim).mark_download_slot_invalid();
    assert_eq!(read_marker(&sim, DOWNLOAD_VALID_OFFSET), 0x0000_0000);

    let report = run_boot_sequence(&mut sim);
    assert_eq!(report.path, BootPath::Plain);
    assert_eq!(app_contents(&sim, 4096), &original[..]);
}

// =============================================================================
// Swap verification failure
// =============================================================================

#[test]
fn test_readback_failure_still_retires_the_swap_request() {
    use seesaw_common::swap::SwapError;

    let mut sim = SimFlash::new();
    install_app(&mut sim, &make_image(0x11, 4096));
    stage_image(&mut sim, &make_image(0x77, 4096));

    // A stuck-at-zero bit while programming the application half
    // (byte 32 of the staged pattern has its low bit set)
    sim.corrupt_program_once(APP.offset() + 32, 0xFE);

    let report = run_boot_sequence(&mut sim);
    assert_eq!(report.path, BootPath::Activate);
    assert_eq!(report.swap_error, Some(SwapError { sector: 0 }));

    // The slot must be re-validated before any future swap, and the armed
    // rollback is what recovers the device if the mixed image cannot boot.
    assert_eq!(read_marker(&sim, DOWNLOAD_VALID_OFFSET), 0x0000_0000);
    assert_eq!(read_marker(&sim, SHOULD_ROLLBACK_OFFSET), 0x0DEA_DEAD);
}

// =============================================================================
// Steady state
// =============================================================================

#[test]
fn test_back_to_back_plain_boots_do_not_wear_the_info_sector() {
    let mut sim = SimFlash::new();
    run_boot_sequence(&mut sim);

    let ops_before = sim.ops();
    let report = run_boot_sequence(&mut sim);
    assert_eq!(report.path, BootPath::Plain);
    assert_eq!(sim.ops(), ops_before, "steady-state boot touched the flash");
}

// =============================================================================
// Two consecutive updates
// =============================================================================

#[test]
fn test_second_update_cycle_after_commit() {
    let mut sim = SimFlash::new();
    let v1 = make_image(0x01, 4096);
    let v2 = make_image(0x02, 4096);
    let v3 = make_image(0x03, 4096);
    install_app(&mut sim, &v1);

    stage_image(&mut sim, &v2);
    run_boot_sequence(&mut sim);
    Updater::new(&mut sim).firmware_commit();

    stage_image(&mut sim, &v3);
    let report = run_boot_sequence(&mut sim);
    assert_eq!(report.path, BootPath::Activate);
    assert_eq!(app_contents(&sim, 4096), &v3[..]);

    // v2 is now the rollback target
    run_boot_sequence(&mut sim);
    assert_eq!(app_contents(&sim, 4096), &v2[..]);
}
