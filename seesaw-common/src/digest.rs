// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Trailing-digest image check.
//!
//! Build convention: the last 32 bytes of a staged image are the SHA-256
//! of everything before them. The check streams the image out of flash in
//! page-size chunks, so it works on images far larger than RAM.

use sha2::{Digest, Sha256};

use crate::fota::FotaError;
use crate::layout::FLASH_PAGE_SIZE;
use crate::storage::FlashStorage;

pub const DIGEST_LEN: u32 = 32;

/// Hash `image_len - 32` bytes starting at `region_offset` and compare
/// against the 32 bytes that follow. The caller has already validated
/// `image_len` alignment and bounds.
pub fn check_trailing_digest<F: FlashStorage>(
    flash: &F,
    region_offset: u32,
    image_len: u32,
) -> Result<(), FotaError> {
    let payload_len = image_len - DIGEST_LEN;

    let mut hasher = Sha256::new();
    let mut chunk = [0u8; FLASH_PAGE_SIZE as usize];
    let mut done: u32 = 0;
    while done < payload_len {
        let n = (payload_len - done).min(FLASH_PAGE_SIZE);
        flash.read(region_offset + done, &mut chunk[..n as usize]);
        hasher.update(&chunk[..n as usize]);
        done += n;
    }

    let mut stored = [0u8; DIGEST_LEN as usize];
    flash.read(region_offset + payload_len, &mut stored);

    if hasher.finalize()[..] == stored[..] {
        Ok(())
    } else {
        Err(FotaError::DigestMismatch)
    }
}
