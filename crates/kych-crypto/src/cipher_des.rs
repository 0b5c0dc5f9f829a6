//! 3DES-CBC decryption with explicit PKCS#7 validation.
//!
//! The padding check doubles as the password-correctness signal: a wrong
//! key produces garbage padding, and garbage padding produces the empty
//! result. Callers treat "empty" as "this item did not decrypt" and move on.

use cipher::block_padding::NoPadding;
use cipher::{BlockDecryptMut, KeyIvInit};
use des::TdesEde3;
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

/// 3DES block size in bytes.
pub const BLOCK_SIZE: usize = 8;

/// 3DES-EDE3 key length; also the length of every key this format wraps.
pub const KEY_LEN: usize = 24;

type Des3CbcDec = cbc::Decryptor<TdesEde3>;

/// Decrypts 3DES-CBC ciphertext and strips PKCS#7 padding.
///
/// Returns the empty result when:
/// - the ciphertext is empty or not a multiple of the block size,
/// - the key or IV has the wrong length,
/// - the final padding byte is outside `1..=8`,
/// - any padding byte disagrees with the padding length.
///
/// The padding comparison runs in constant time over the claimed pad.
pub fn decrypt_cbc(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Zeroizing<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Zeroizing::new(Vec::new());
    }
    let Ok(decryptor) = Des3CbcDec::new_from_slices(key, iv) else {
        return Zeroizing::new(Vec::new());
    };

    let mut buf = Zeroizing::new(ciphertext.to_vec());
    if decryptor.decrypt_padded_mut::<NoPadding>(&mut buf).is_err() {
        return Zeroizing::new(Vec::new());
    }

    let pad = usize::from(*buf.last().expect("ciphertext is non-empty"));
    if pad == 0 || pad > BLOCK_SIZE {
        return Zeroizing::new(Vec::new());
    }
    let body_len = buf.len() - pad;
    let mut ok = Choice::from(1u8);
    for b in &buf[body_len..] {
        ok &= b.ct_eq(&(pad as u8));
    }
    if !bool::from(ok) {
        return Zeroizing::new(Vec::new());
    }

    buf.truncate(body_len);
    buf
}
