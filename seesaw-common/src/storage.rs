// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash backend seam.
//!
//! All core logic is written against this trait so it runs identically on
//! the on-chip QSPI flash and on the simulated backend used by the host
//! tests. Offsets are device offsets (XIP address minus the flash base).

/// Raw NOR flash operations.
///
/// Implementations are responsible for masking interrupts around the
/// hardware primitives; callers that need a multi-step sequence to be
/// uninterruptible wrap it in `critical_section::with`.
pub trait FlashStorage {
    /// Erase `len` bytes starting at `offset`.
    /// Both must be multiples of the erase sector size.
    fn erase(&mut self, offset: u32, len: u32);

    /// Program `data` at `offset` into previously erased flash.
    /// `offset` and `data.len()` must be multiples of the program page size.
    fn program(&mut self, offset: u32, data: &[u8]);

    /// Read `buf.len()` bytes starting at `offset`.
    fn read(&self, offset: u32, buf: &mut [u8]);
}

impl<F: FlashStorage + ?Sized> FlashStorage for &mut F {
    fn erase(&mut self, offset: u32, len: u32) {
        (**self).erase(offset, len)
    }

    fn program(&mut self, offset: u32, data: &[u8]) {
        (**self).program(offset, data)
    }

    fn read(&self, offset: u32, buf: &mut [u8]) {
        (**self).read(offset, buf)
    }
}
