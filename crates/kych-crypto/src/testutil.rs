//! Forward (encrypting) helpers for tests. Decryption is the product; these
//! exist so fixtures can be built from chosen plaintexts.

use cipher::block_padding::{NoPadding, Pkcs7};
use cipher::{BlockEncryptMut, KeyIvInit};
use des::TdesEde3;

use crate::BLOCK_SIZE;

type Des3CbcEnc = cbc::Encryptor<TdesEde3>;

/// 3DES-CBC encrypt with PKCS#7 padding (the inverse of
/// [`crate::decrypt_cbc`]).
pub(crate) fn encrypt_pkcs7(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let padded = (plaintext.len() / BLOCK_SIZE + 1) * BLOCK_SIZE;
    let mut buf = vec![0u8; padded];
    buf[..plaintext.len()].copy_from_slice(plaintext);
    let encryptor = Des3CbcEnc::new_from_slices(key, iv).expect("test key/iv sizes");
    encryptor
        .encrypt_padded_mut::<Pkcs7>(&mut buf, plaintext.len())
        .expect("buffer sized for padding")
        .to_vec()
}

/// 3DES-CBC encrypt of an exact number of blocks, no padding added. Used to
/// forge specific padding bytes and to build the inner stage of key wraps.
pub(crate) fn encrypt_raw(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
    assert_eq!(plaintext.len() % BLOCK_SIZE, 0, "raw encrypt needs whole blocks");
    let mut buf = plaintext.to_vec();
    let encryptor = Des3CbcEnc::new_from_slices(key, iv).expect("test key/iv sizes");
    encryptor
        .encrypt_padded_mut::<NoPadding>(&mut buf, plaintext.len())
        .expect("whole blocks")
        .to_vec()
}
