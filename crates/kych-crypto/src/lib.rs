//! # kych-crypto: Key derivation and unwrapping for the legacy keychain
//!
//! The algorithms are fixed by the file format: PBKDF2-HMAC-SHA1 (1000
//! iterations) turns a passphrase into the 24-byte master key; 3DES in CBC
//! mode with PKCS#7 padding protects everything else. The padding check is
//! the only password-correctness signal the format offers, so decryption
//! failures collapse to the empty result instead of raising.
//!
//! Key material never outlives its scope: the key newtypes and every
//! intermediate plaintext are zeroed on drop.

mod cipher_des;
mod kdf;
mod keys;
mod pipeline;
#[cfg(test)]
pub(crate) mod testutil;

pub use cipher_des::{BLOCK_SIZE, KEY_LEN, decrypt_cbc};
pub use kdf::{PBKDF2_ITERATIONS, derive_master_key};
pub use keys::{ContentKey, MasterKey, WrappingKey};
pub use pipeline::{
    MAGIC_CMS_IV, decrypt_ssgp, recover_wrapping_key, unwrap_item_key, unwrap_private_key,
};

/// Errors surfaced to callers handing us key material.
///
/// Everything downstream of a well-formed key degrades silently (empty
/// results) per the recovery policy; only malformed inputs are errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("wrapping key must be {KEY_LEN} bytes, got {len}")]
    BadKeyLength { len: usize },
}
