// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! AES-ECB ingest decryption.
//!
//! Images may be delivered encrypted with a device key shared out of band.
//! ECB over 16-byte blocks matches the on-wire format of the original
//! delivery pipeline; the flash page unit is a whole number of cipher
//! blocks, so pages decrypt independently.

use aes::cipher::{BlockDecrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use crate::fota::FotaError;

/// Keyed ECB context. The variant is picked from the key length.
pub enum EcbContext {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl EcbContext {
    pub fn new(key: &[u8]) -> Result<Self, FotaError> {
        match key.len() {
            16 => Ok(Self::Aes128(
                Aes128::new_from_slice(key).map_err(|_| FotaError::BadKeyLength)?,
            )),
            24 => Ok(Self::Aes192(
                Aes192::new_from_slice(key).map_err(|_| FotaError::BadKeyLength)?,
            )),
            32 => Ok(Self::Aes256(
                Aes256::new_from_slice(key).map_err(|_| FotaError::BadKeyLength)?,
            )),
            _ => Err(FotaError::BadKeyLength),
        }
    }

    /// Decrypt one 16-byte block in place.
    pub fn decrypt_block(&self, block: &mut [u8]) {
        let block = aes::Block::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes192(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}
