//! Passphrase-to-master-key derivation.
//!
//! Fixed by the DB blob format: PBKDF2-HMAC-SHA1, 1000 iterations, the
//! 20-byte salt from the blob, 24 bytes out.

use hmac::Hmac;
use sha1::Sha1;

use crate::keys::MasterKey;
use crate::KEY_LEN;

/// PBKDF2 iteration count used by the keychain DB blob.
pub const PBKDF2_ITERATIONS: u32 = 1000;

/// Derives the master key from a passphrase and the DB blob salt.
pub fn derive_master_key(passphrase: &[u8], salt: &[u8; 20]) -> MasterKey {
    let mut out = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha1>>(passphrase, salt, PBKDF2_ITERATIONS, &mut out)
        .expect("HMAC-SHA1 accepts any key length");
    MasterKey::new(out)
}
