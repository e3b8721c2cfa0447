// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot-time image management.
//!
//! Runs right after reset, before any application code: decide between
//! rollback, activation and a plain boot, drive the swap engine if needed,
//! and retire the decision into the INFO sector. The hardware half
//! (peripheral quiesce, vector-table jump) stays in the bootloader binary;
//! this module is the part that must also run against the simulated
//! backend.

use crate::info;
use crate::layout::{
    AFTER_ROLLBACK_OFFSET, DOWNLOAD_VALID_OFFSET, FIRMWARE_SWAPPED_OFFSET, SHOULD_ROLLBACK_OFFSET,
};
use crate::markers::{
    BootPath, AFTER_ROLLBACK_MAGIC, FIRMWARE_SWAPPED_MAGIC, MARKER_CLEAR, ROLLBACK_ARMED_MAGIC,
};
use crate::storage::FlashStorage;
use crate::swap::{swap_images, SwapError};

/// What the boot sequence did, for the bootloader binary to log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootReport {
    pub path: BootPath,
    /// Set when the swap engine aborted on a readback mismatch. The marker
    /// transition is applied regardless; the armed rollback is the
    /// recovery path.
    pub swap_error: Option<SwapError>,
}

/// Evaluate the markers, swap if required and write back the next state.
///
/// Every branch ends with `DOWNLOAD_VALID` cleared: the staging slot must
/// be re-validated by the application before any future swap. All marker
/// updates of a branch land in one sector rewrite, so an interruption
/// leaves either the previous state or the erased sector — both of which
/// re-run or plainly boot on the next attempt.
pub fn run_boot_sequence<F: FlashStorage>(flash: &mut F) -> BootReport {
    let markers = info::read_markers(flash);
    let path = BootPath::decide(&markers);
    let mut swap_error = None;

    match path {
        BootPath::Rollback => {
            swap_error = swap_images(flash).err();
            info::apply_boot_transition(
                flash,
                &[
                    (SHOULD_ROLLBACK_OFFSET, MARKER_CLEAR),
                    (FIRMWARE_SWAPPED_OFFSET, MARKER_CLEAR),
                    (AFTER_ROLLBACK_OFFSET, AFTER_ROLLBACK_MAGIC),
                    (DOWNLOAD_VALID_OFFSET, MARKER_CLEAR),
                ],
                true,
            );
        }
        BootPath::Activate => {
            swap_error = swap_images(flash).err();
            info::apply_boot_transition(
                flash,
                &[
                    (FIRMWARE_SWAPPED_OFFSET, FIRMWARE_SWAPPED_MAGIC),
                    (AFTER_ROLLBACK_OFFSET, MARKER_CLEAR),
                    (SHOULD_ROLLBACK_OFFSET, ROLLBACK_ARMED_MAGIC),
                    (DOWNLOAD_VALID_OFFSET, MARKER_CLEAR),
                ],
                true,
            );
        }
        BootPath::Plain => {
            info::apply_boot_transition(
                flash,
                &[
                    (SHOULD_ROLLBACK_OFFSET, MARKER_CLEAR),
                    (FIRMWARE_SWAPPED_OFFSET, MARKER_CLEAR),
                    (DOWNLOAD_VALID_OFFSET, MARKER_CLEAR),
                ],
                true,
            );
        }
    }

    BootReport { path, swap_error }
}
