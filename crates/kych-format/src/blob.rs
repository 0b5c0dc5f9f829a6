//! Blob layouts: the encrypted-key common blob, the DB blob carried in the
//! metadata table, SSGP payloads, and the system unlock blob.
//!
//! Parsers here return `Option`: a malformed blob means the record (or
//! credential file) is skipped, never that the walk stops.

use bytes::Bytes;

use crate::image::Image;
use crate::layout;

/// A `COMMON_BLOB`-prefixed encrypted key area: blob IV plus the ciphertext
/// between `startCryptoBlob` and `totalLength`.
#[derive(Debug, Clone)]
pub struct EncryptedKeyBlob {
    pub version: u32,
    pub start_crypto_blob: u32,
    pub total_length: u32,
    pub iv: [u8; 8],
    pub ciphertext: Bytes,
}

impl EncryptedKeyBlob {
    /// Parses a key blob area. `None` when the magic is wrong or the
    /// declared crypto-blob bounds fall outside the buffer.
    pub fn parse(area: &Bytes) -> Option<Self> {
        use layout::key_blob as kb;
        let magic = read_be(area, kb::MAGIC)?;
        if magic != layout::BLOB_MAGIC {
            return None;
        }
        let version = read_be(area, kb::VERSION)?;
        let start_crypto_blob = read_be(area, kb::START_CRYPTO_BLOB)?;
        let total_length = read_be(area, kb::TOTAL_LENGTH)?;
        let iv: [u8; 8] = area.get(kb::IV..kb::IV + kb::IV_LEN)?.try_into().ok()?;

        let (start, total) = (start_crypto_blob as usize, total_length as usize);
        if start > total || total > area.len() {
            return None;
        }
        Some(Self {
            version,
            start_crypto_blob,
            total_length,
            iv,
            ciphertext: area.slice(start..total),
        })
    }
}

/// The DB blob: key-derivation salt, IV, and the ciphertext hiding the
/// 24-byte database wrapping key.
#[derive(Debug, Clone)]
pub struct DbBlob {
    pub version: u32,
    pub salt: [u8; 20],
    pub iv: [u8; 8],
    pub ciphertext: Bytes,
}

impl DbBlob {
    /// Parses the DB blob at its fixed offset inside the metadata table.
    pub fn parse(image: &Image, metadata_table_offset: u32) -> Option<Self> {
        use layout::db_blob as db;
        let base = layout::header::SIZE
            + metadata_table_offset as usize
            + db::OFFSET_IN_METADATA_TABLE;

        let version = image.read_u32(base + db::VERSION)?;
        let start = image.read_u32(base + db::START_CRYPTO_BLOB)? as usize;
        let total = image.read_u32(base + db::TOTAL_LENGTH)? as usize;
        let salt: [u8; 20] = image.read_array(base + db::SALT)?;
        let iv: [u8; 8] = image.read_array(base + db::IV)?;
        if start > total {
            return None;
        }
        let ciphertext = image.read_bytes(base + start, total - start)?;
        Some(Self {
            version,
            salt,
            iv,
            ciphertext,
        })
    }
}

/// A parsed SSGP payload from a password record.
#[derive(Debug, Clone)]
pub struct SsgpBlob {
    /// 20-byte content-key lookup tag (magic + label).
    pub tag: [u8; 20],
    pub iv: [u8; 8],
    pub ciphertext: Bytes,
}

impl SsgpBlob {
    /// Parses the opaque payload area of a password record. `None` when the
    /// area is shorter than the SSGP header.
    pub fn parse(payload: &Bytes) -> Option<Self> {
        use layout::ssgp;
        let tag: [u8; 20] = payload.get(..ssgp::TAG_LEN)?.try_into().ok()?;
        let iv: [u8; 8] = payload
            .get(ssgp::IV..ssgp::IV + ssgp::IV_LEN)?
            .try_into()
            .ok()?;
        Some(Self {
            tag,
            iv,
            ciphertext: payload.slice(ssgp::SIZE.min(payload.len())..),
        })
    }
}

/// The system unlock blob (`/var/db/SystemKey`) carrying the pre-unwrapped
/// master key for the system keychain.
#[derive(Debug, Clone)]
pub struct UnlockBlob {
    pub master_key: [u8; 24],
}

impl UnlockBlob {
    pub fn parse(data: &[u8]) -> Option<Self> {
        use layout::unlock_blob as ub;
        let master_key: [u8; 24] = data
            .get(ub::MASTER_KEY..ub::MASTER_KEY + ub::MASTER_KEY_LEN)?
            .try_into()
            .ok()?;
        Some(Self { master_key })
    }
}

fn read_be(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(bytes.try_into().expect("4-byte slice")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BLOB_MAGIC, db_blob, header};

    #[test]
    fn encrypted_key_blob_rejects_wrong_magic() {
        let mut area = vec![0u8; 64];
        area[..4].copy_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        assert!(EncryptedKeyBlob::parse(&Bytes::from(area)).is_none());
    }

    #[test]
    fn encrypted_key_blob_rejects_bounds_outside_buffer() {
        let mut area = vec![0u8; 32];
        area[..4].copy_from_slice(&BLOB_MAGIC.to_be_bytes());
        area[8..12].copy_from_slice(&24u32.to_be_bytes()); // start
        area[12..16].copy_from_slice(&4096u32.to_be_bytes()); // total > len
        assert!(EncryptedKeyBlob::parse(&Bytes::from(area)).is_none());
    }

    #[test]
    fn encrypted_key_blob_slices_ciphertext() {
        let mut area = vec![0u8; 40];
        area[..4].copy_from_slice(&BLOB_MAGIC.to_be_bytes());
        area[8..12].copy_from_slice(&24u32.to_be_bytes());
        area[12..16].copy_from_slice(&40u32.to_be_bytes());
        area[16..24].copy_from_slice(&[7; 8]);
        area[24..40].copy_from_slice(&[9; 16]);
        let blob = EncryptedKeyBlob::parse(&Bytes::from(area)).unwrap();
        assert_eq!(blob.iv, [7; 8]);
        assert_eq!(&blob.ciphertext[..], &[9; 16]);
    }

    #[test]
    fn db_blob_reads_salt_iv_and_ciphertext() {
        let table_offset = 0u32;
        let blob_base = header::SIZE + db_blob::OFFSET_IN_METADATA_TABLE;
        let mut data = vec![0u8; blob_base + db_blob::SIZE + 32];
        let b = blob_base;
        data[b..b + 4].copy_from_slice(&BLOB_MAGIC.to_be_bytes());
        data[b + 8..b + 12].copy_from_slice(&(db_blob::SIZE as u32).to_be_bytes());
        data[b + 12..b + 16].copy_from_slice(&((db_blob::SIZE + 32) as u32).to_be_bytes());
        data[b + db_blob::SALT..b + db_blob::SALT + 20].copy_from_slice(&[0xAA; 20]);
        data[b + db_blob::IV..b + db_blob::IV + 8].copy_from_slice(&[0xBB; 8]);
        data[b + db_blob::SIZE..].copy_from_slice(&[0xCC; 32]);

        let image = Image::from(data);
        let blob = DbBlob::parse(&image, table_offset).unwrap();
        assert_eq!(blob.salt, [0xAA; 20]);
        assert_eq!(blob.iv, [0xBB; 8]);
        assert_eq!(&blob.ciphertext[..], &[0xCC; 32]);
    }

    #[test]
    fn db_blob_truncated_is_none() {
        let image = Image::from(vec![0u8; 16]);
        assert!(DbBlob::parse(&image, 0).is_none());
    }

    #[test]
    fn ssgp_splits_tag_iv_ciphertext() {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"ssgp");
        payload.extend_from_slice(&[1; 16]); // label
        payload.extend_from_slice(&[2; 8]); // iv
        payload.extend_from_slice(&[3; 16]); // ciphertext
        let blob = SsgpBlob::parse(&Bytes::from(payload)).unwrap();
        assert_eq!(&blob.tag[..4], b"ssgp");
        assert_eq!(blob.iv, [2; 8]);
        assert_eq!(&blob.ciphertext[..], &[3; 16]);
    }

    #[test]
    fn ssgp_too_short_is_none() {
        assert!(SsgpBlob::parse(&Bytes::from_static(b"ssgp")).is_none());
    }

    #[test]
    fn unlock_blob_reads_master_key() {
        let mut data = vec![0u8; 48];
        data[8..32].copy_from_slice(&[0x42; 24]);
        let blob = UnlockBlob::parse(&data).unwrap();
        assert_eq!(blob.master_key, [0x42; 24]);
    }

    #[test]
    fn unlock_blob_too_short_is_none() {
        assert!(UnlockBlob::parse(&[0u8; 20]).is_none());
    }
}
