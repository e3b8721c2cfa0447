// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Application-side FOTA API.
//!
//! The running firmware stages a new image with this handle: initialize
//! the download slot, stream page-aligned chunks into it, optionally check
//! the trailing digest, mark the slot valid and reboot. After an update
//! boot the new image calls [`Updater::firmware_commit`] to disarm the
//! rollback; if it never does, the next reset swaps the previous image
//! back in.
//!
//! None of these operations may be called from interrupt context.

use crate::info;
use crate::layout::{
    AFTER_ROLLBACK_OFFSET, DOWNLOAD, DOWNLOAD_VALID_OFFSET, FIRMWARE_SWAPPED_OFFSET,
    FLASH_PAGE_SIZE, SHOULD_ROLLBACK_OFFSET, SWAP_LEN,
};
use crate::markers::{
    AFTER_ROLLBACK_MAGIC, FIRMWARE_SWAPPED_MAGIC, MARKER_CLEAR, SWAP_REQUESTED_MAGIC,
};
use crate::storage::FlashStorage;

#[cfg(feature = "encryption")]
use crate::cipher::EcbContext;

/// Errors reported at the API boundary. Nothing is recovered internally;
/// the application decides whether to retry the download or abort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FotaError {
    /// Write offset or length not page-aligned, or past the end of the
    /// download slot. No flash was touched.
    Misaligned,
    /// Digest check called with a length that is not page-aligned, too
    /// short to carry a digest, or larger than the slot.
    BadImageSize,
    /// The trailing digest does not match the image contents.
    DigestMismatch,
    /// Decryption key is not 16, 24 or 32 bytes.
    BadKeyLength,
}

/// Handle for staging firmware updates from the running application.
pub struct Updater<F: FlashStorage> {
    flash: F,
    #[cfg(feature = "encryption")]
    cipher: Option<EcbContext>,
}

impl<F: FlashStorage> Updater<F> {
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            #[cfg(feature = "encryption")]
            cipher: None,
        }
    }

    /// Prepare the download slot for a new image: commit the previous
    /// activation (even if already committed), then erase the whole slot.
    /// Must be called before any [`Updater::write_aligned`].
    pub fn initialize_download_slot(&mut self) {
        self.firmware_commit();
        self.flash.erase(DOWNLOAD.offset(), SWAP_LEN);
    }

    /// Stream a chunk of the new image into the download slot.
    ///
    /// `offset` and `data.len()` must be multiples of the flash page size
    /// and stay inside the slot; violations return
    /// [`FotaError::Misaligned`] without touching flash. With a decryption
    /// key installed, each page is deciphered before programming.
    pub fn write_aligned(&mut self, offset: u32, data: &[u8]) -> Result<(), FotaError> {
        let len = data.len() as u32;
        let end = offset.checked_add(len).ok_or(FotaError::Misaligned)?;
        if offset % FLASH_PAGE_SIZE != 0 || len % FLASH_PAGE_SIZE != 0 || end > SWAP_LEN {
            return Err(FotaError::Misaligned);
        }

        for (i, page) in data.chunks(FLASH_PAGE_SIZE as usize).enumerate() {
            let dest = DOWNLOAD.offset() + offset + (i as u32) * FLASH_PAGE_SIZE;
            self.program_page(dest, page);
        }
        Ok(())
    }

    #[cfg(not(feature = "encryption"))]
    fn program_page(&mut self, dest: u32, page: &[u8]) {
        self.flash.program(dest, page);
    }

    #[cfg(feature = "encryption")]
    fn program_page(&mut self, dest: u32, page: &[u8]) {
        match &self.cipher {
            Some(context) => {
                let mut clear = [0u8; FLASH_PAGE_SIZE as usize];
                clear.copy_from_slice(page);
                for block in clear.chunks_mut(16) {
                    context.decrypt_block(block);
                }
                self.flash.program(dest, &clear);
            }
            None => self.flash.program(dest, page),
        }
    }

    /// Install the AES key used to decipher incoming pages. Key length
    /// selects AES-128/192/256.
    #[cfg(feature = "encryption")]
    pub fn set_decryption_key(&mut self, key: &[u8]) -> Result<(), FotaError> {
        self.cipher = Some(EcbContext::new(key)?);
        Ok(())
    }

    /// Check the staged image against its trailing SHA-256 digest: the
    /// last 32 bytes of an `image_len`-byte image must equal the digest of
    /// the bytes before them.
    #[cfg(feature = "sha256")]
    pub fn verify_image_sha256(&self, image_len: u32) -> Result<(), FotaError> {
        if image_len % FLASH_PAGE_SIZE != 0 || image_len < FLASH_PAGE_SIZE || image_len > SWAP_LEN {
            return Err(FotaError::BadImageSize);
        }
        crate::digest::check_trailing_digest(&self.flash, DOWNLOAD.offset(), image_len)
    }

    /// Mark the staged image as valid: the next boot will swap it in.
    pub fn mark_download_slot_valid(&mut self) {
        info::write_marker(&mut self.flash, DOWNLOAD_VALID_OFFSET, SWAP_REQUESTED_MAGIC);
    }

    /// Withdraw the staged image; the next boot will not swap.
    pub fn mark_download_slot_invalid(&mut self) {
        info::write_marker(&mut self.flash, DOWNLOAD_VALID_OFFSET, MARKER_CLEAR);
    }

    /// Disarm the rollback: the running image is healthy. Safe to call any
    /// number of times.
    pub fn firmware_commit(&mut self) {
        info::write_marker(&mut self.flash, SHOULD_ROLLBACK_OFFSET, MARKER_CLEAR);
    }

    /// True iff the running image was swapped in at the previous boot.
    pub fn is_after_firmware_update(&self) -> bool {
        info::read_marker(&self.flash, FIRMWARE_SWAPPED_OFFSET) == FIRMWARE_SWAPPED_MAGIC
    }

    /// True iff the previous boot rolled back to this image.
    pub fn is_after_rollback(&self) -> bool {
        info::read_marker(&self.flash, AFTER_ROLLBACK_OFFSET) == AFTER_ROLLBACK_MAGIC
    }
}
