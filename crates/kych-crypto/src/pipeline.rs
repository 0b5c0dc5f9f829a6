//! The key pipeline: DB wrapping-key recovery, the two-stage CMS-style item
//! unwrap, private-key unwrap, and SSGP payload decryption.
//!
//! Every stage follows the silent-failure policy: anything that does not
//! decrypt cleanly is `None`/empty, and the caller keeps walking. The lone
//! top-level signal is a wrapping key that cannot be recovered at all.

use zeroize::Zeroizing;

use crate::cipher_des::{decrypt_cbc, KEY_LEN};
use crate::keys::{ContentKey, MasterKey, WrappingKey};

/// Fixed IV for the first stage of the CMS-style key unwrap (Apple CSP
/// `wrapKeyCms`).
pub const MAGIC_CMS_IV: [u8; 8] = [0x4A, 0xDD, 0xA2, 0x2C, 0x79, 0xE8, 0x21, 0x05];

/// Length of the first-stage prefix that gets byte-reversed during an item
/// key unwrap.
const CMS_REVERSE_LEN: usize = 32;

/// Length of the label prefix on an unwrapped private key.
const PRIVATE_KEY_LABEL_LEN: usize = 12;

/// Decrypts the DB blob ciphertext with the master key and takes the
/// 24-byte wrapping key from the front. `None` when the plaintext comes up
/// short: a wrong passphrase and a corrupt blob are indistinguishable here
/// and are reported identically.
pub fn recover_wrapping_key(
    master: &MasterKey,
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Option<WrappingKey> {
    let plain = decrypt_cbc(master.as_bytes(), iv, ciphertext);
    if plain.len() < KEY_LEN {
        return None;
    }
    let key: [u8; KEY_LEN] = plain[..KEY_LEN].try_into().expect("checked length");
    Some(WrappingKey::new(key))
}

/// Two-stage unwrap of a per-item content key from the symmetric-key table.
///
/// Stage one decrypts the blob under the fixed CMS IV; the first 32 bytes of
/// that plaintext are byte-reversed and decrypted again under the item's own
/// IV. Skipping a 4-byte prefix leaves the 24-byte content key, and anything
/// else is a failed unwrap.
pub fn unwrap_item_key(
    wrapping: &WrappingKey,
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Option<ContentKey> {
    let stage1 = decrypt_cbc(wrapping.as_bytes(), &MAGIC_CMS_IV, ciphertext);
    if stage1.len() < CMS_REVERSE_LEN {
        return None;
    }
    let mut reversed = Zeroizing::new(stage1[..CMS_REVERSE_LEN].to_vec());
    reversed.reverse();

    let stage2 = decrypt_cbc(wrapping.as_bytes(), iv, &reversed);
    let key_bytes = stage2.get(4..)?;
    if key_bytes.len() != KEY_LEN {
        return None;
    }
    let key: [u8; KEY_LEN] = key_bytes.try_into().expect("checked length");
    Some(ContentKey::new(key))
}

/// Two-stage unwrap of a private key blob.
///
/// Same construction as [`unwrap_item_key`], except the whole first-stage
/// plaintext is reversed and the result splits into a 12-byte label and the
/// raw key material.
pub fn unwrap_private_key(
    wrapping: &WrappingKey,
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Option<(Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>)> {
    let stage1 = decrypt_cbc(wrapping.as_bytes(), &MAGIC_CMS_IV, ciphertext);
    if stage1.is_empty() {
        return None;
    }
    let mut reversed = Zeroizing::new(stage1.to_vec());
    reversed.reverse();

    let stage2 = decrypt_cbc(wrapping.as_bytes(), iv, &reversed);
    if stage2.len() < PRIVATE_KEY_LABEL_LEN {
        return None;
    }
    let label = Zeroizing::new(stage2[..PRIVATE_KEY_LABEL_LEN].to_vec());
    let key_material = Zeroizing::new(stage2[PRIVATE_KEY_LABEL_LEN..].to_vec());
    Some((label, key_material))
}

/// Decrypts an SSGP payload tail with the item's content key and the IV
/// carried in the payload header. Empty on any failure.
pub fn decrypt_ssgp(
    content_key: &ContentKey,
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Zeroizing<Vec<u8>> {
    decrypt_cbc(content_key.as_bytes(), iv, ciphertext)
}
