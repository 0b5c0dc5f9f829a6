//! Offset tables for every fixed record layout in the container.
//!
//! The on-disk structures are packed big-endian; rather than projecting
//! host structs onto the buffer, each layout is a table of `(offset, width)`
//! facts consumed through [`crate::Image`] / [`crate::View`]. All offsets
//! are relative to the start of their structure.

/// Width of one offset slot in the schema and table vectors.
pub const ATOM: usize = 4;

/// 3DES block size; ciphertext areas must be a positive multiple of this.
pub const BLOCK_SIZE: usize = 8;

/// Expected `COMMON_BLOB` magic for key and DB blobs.
pub const BLOB_MAGIC: u32 = 0xFADE_0711;

/// ASCII group marker trailing a key-blob ciphertext (`"ssgp"`).
pub const SECURE_STORAGE_GROUP: &[u8; 4] = b"ssgp";

/// File header: signature, version, header size, schema offset, auth offset.
pub mod header {
    pub const SIGNATURE: usize = 0;
    pub const VERSION: usize = 4;
    pub const HEADER_SIZE: usize = 8;
    pub const SCHEMA_OFFSET: usize = 12;
    pub const AUTH_OFFSET: usize = 16;
    pub const SIZE: usize = 20;

    pub const MAGIC: &[u8; 4] = b"kych";
}

/// Schema directory header; the table-offset vector follows immediately.
pub mod schema {
    pub const SCHEMA_SIZE: usize = 0;
    pub const TABLE_COUNT: usize = 4;
    pub const SIZE: usize = 8;
}

/// Table header; the record-offset vector follows immediately.
pub mod table {
    pub const TABLE_SIZE: usize = 0;
    pub const TABLE_ID: usize = 4;
    pub const RECORD_COUNT: usize = 8;
    pub const RECORDS: usize = 12;
    pub const INDEXES_OFFSET: usize = 16;
    pub const FREE_LIST_HEAD: usize = 20;
    pub const RECORD_NUMBERS_COUNT: usize = 24;
    pub const SIZE: usize = 28;
}

/// Generic-password record header. `RECORD_SIZE` and `SSGP_AREA` are inline
/// values; the remaining fields are column offsets.
pub mod generic_password {
    pub const RECORD_SIZE: usize = 0;
    pub const RECORD_NUMBER: usize = 4;
    pub const SSGP_AREA: usize = 16;
    pub const CREATION_DATE: usize = 24;
    pub const MOD_DATE: usize = 28;
    pub const DESCRIPTION: usize = 32;
    pub const COMMENT: usize = 36;
    pub const CREATOR: usize = 40;
    pub const TYPE: usize = 44;
    pub const SCRIPT_CODE: usize = 48;
    pub const PRINT_NAME: usize = 52;
    pub const ALIAS: usize = 56;
    pub const INVISIBLE: usize = 60;
    pub const NEGATIVE: usize = 64;
    pub const CUSTOM_ICON: usize = 68;
    pub const PROTECTED: usize = 72;
    pub const ACCOUNT: usize = 76;
    pub const SERVICE: usize = 80;
    pub const GENERIC: usize = 84;
    pub const SIZE: usize = 88;
}

/// Internet-password record header; identical to the generic layout through
/// `ACCOUNT`, then the internet-only columns.
pub mod internet_password {
    pub const RECORD_SIZE: usize = 0;
    pub const SSGP_AREA: usize = 16;
    pub const CREATION_DATE: usize = 24;
    pub const MOD_DATE: usize = 28;
    pub const DESCRIPTION: usize = 32;
    pub const COMMENT: usize = 36;
    pub const CREATOR: usize = 40;
    pub const TYPE: usize = 44;
    pub const PRINT_NAME: usize = 52;
    pub const ALIAS: usize = 56;
    pub const PROTECTED: usize = 72;
    pub const ACCOUNT: usize = 76;
    pub const SECURITY_DOMAIN: usize = 80;
    pub const SERVER: usize = 84;
    pub const PROTOCOL: usize = 88;
    pub const AUTH_TYPE: usize = 92;
    pub const PORT: usize = 96;
    pub const PATH: usize = 100;
    pub const SIZE: usize = 104;
}

/// AppleShare-password record header.
pub mod appleshare {
    pub const RECORD_SIZE: usize = 0;
    pub const SSGP_AREA: usize = 16;
    pub const CREATION_DATE: usize = 24;
    pub const MOD_DATE: usize = 28;
    pub const DESCRIPTION: usize = 32;
    pub const COMMENT: usize = 36;
    pub const CREATOR: usize = 40;
    pub const TYPE: usize = 44;
    pub const PRINT_NAME: usize = 52;
    pub const ALIAS: usize = 56;
    pub const PROTECTED: usize = 72;
    pub const ACCOUNT: usize = 76;
    pub const VOLUME: usize = 80;
    pub const SERVER: usize = 84;
    pub const PROTOCOL: usize = 88;
    pub const AUTH_TYPE: usize = 92;
    pub const ADDRESS: usize = 96;
    pub const SIGNATURE: usize = 100;
    pub const SIZE: usize = 104;
}

/// X.509 certificate record header. `CERT_SIZE` is an inline value; the DER
/// image starts immediately after the header.
pub mod certificate {
    pub const RECORD_SIZE: usize = 0;
    pub const CERT_SIZE: usize = 16;
    pub const CERT_TYPE: usize = 24;
    pub const CERT_ENCODING: usize = 28;
    pub const PRINT_NAME: usize = 32;
    pub const ALIAS: usize = 36;
    pub const SUBJECT: usize = 40;
    pub const ISSUER: usize = 44;
    pub const SERIAL_NUMBER: usize = 48;
    pub const SUBJECT_KEY_IDENTIFIER: usize = 52;
    pub const PUBLIC_KEY_HASH: usize = 56;
    pub const SIZE: usize = 60;
}

/// Key record header (public- and private-key tables, per Apple's
/// `KeySchema`). `BLOB_SIZE` is an inline value; the key blob starts
/// immediately after the header.
pub mod seckey {
    pub const RECORD_SIZE: usize = 0;
    pub const BLOB_SIZE: usize = 16;
    pub const KEY_CLASS: usize = 24;
    pub const PRINT_NAME: usize = 28;
    pub const ALIAS: usize = 32;
    pub const PERMANENT: usize = 36;
    pub const PRIVATE: usize = 40;
    pub const MODIFIABLE: usize = 44;
    pub const LABEL: usize = 48;
    pub const APPLICATION_TAG: usize = 52;
    pub const KEY_CREATOR: usize = 56;
    pub const KEY_TYPE: usize = 60;
    pub const KEY_SIZE_IN_BITS: usize = 64;
    pub const EFFECTIVE_KEY_SIZE: usize = 68;
    pub const START_DATE: usize = 72;
    pub const END_DATE: usize = 76;
    pub const SENSITIVE: usize = 80;
    pub const ALWAYS_SENSITIVE: usize = 84;
    pub const EXTRACTABLE: usize = 88;
    pub const NEVER_EXTRACTABLE: usize = 92;
    pub const SIZE: usize = 132;
}

/// Record header in the symmetric-key table: size, record number, then an
/// opaque region up to the blob area.
pub mod keyblob_record {
    pub const RECORD_SIZE: usize = 0;
    pub const RECORD_NUMBER: usize = 4;
    pub const SIZE: usize = 0x84;
}

/// `COMMON_BLOB`-prefixed key blob: magic, version, crypto-blob bounds, IV.
pub mod key_blob {
    pub const MAGIC: usize = 0;
    pub const VERSION: usize = 4;
    pub const START_CRYPTO_BLOB: usize = 8;
    pub const TOTAL_LENGTH: usize = 12;
    pub const IV: usize = 16;
    pub const IV_LEN: usize = 8;
    pub const SIZE: usize = 24;

    /// Offset from `TOTAL_LENGTH` to the 20-byte label tag trailing the
    /// ciphertext (8 unknown bytes, then `"ssgp"` + 16-byte label).
    pub const TAG_GAP: usize = 8;
    pub const TAG_LEN: usize = 20;
}

/// DB blob inside the metadata table: blob bounds, database signature,
/// parameters, then the KDF salt, IV, and the wrapped-key ciphertext bounds.
pub mod db_blob {
    pub const MAGIC: usize = 0;
    pub const VERSION: usize = 4;
    pub const START_CRYPTO_BLOB: usize = 8;
    pub const TOTAL_LENGTH: usize = 12;
    pub const RANDOM_SIGNATURE: usize = 16;
    pub const SEQUENCE: usize = 32;
    pub const IDLE_TIMEOUT: usize = 36;
    pub const LOCK_ON_SLEEP: usize = 40;
    pub const SALT: usize = 44;
    pub const SALT_LEN: usize = 20;
    pub const IV: usize = 64;
    pub const IV_LEN: usize = 8;
    pub const BLOB_SIGNATURE: usize = 72;
    pub const SIZE: usize = 92;

    /// Offset of the DB blob from the metadata table's base.
    pub const OFFSET_IN_METADATA_TABLE: usize = 0x38;
}

/// SSGP payload embedded in password records: magic, label, IV, ciphertext.
pub mod ssgp {
    pub const MAGIC: usize = 0;
    pub const LABEL: usize = 4;
    pub const LABEL_LEN: usize = 16;
    pub const IV: usize = 20;
    pub const IV_LEN: usize = 8;
    pub const SIZE: usize = 28;

    /// The first 20 bytes of the payload are the content-key lookup tag.
    pub const TAG_LEN: usize = 20;
}

/// System unlock blob (`/var/db/SystemKey`): common blob, master key,
/// signature.
pub mod unlock_blob {
    pub const MAGIC: usize = 0;
    pub const VERSION: usize = 4;
    pub const MASTER_KEY: usize = 8;
    pub const MASTER_KEY_LEN: usize = 24;
    pub const BLOB_SIGNATURE: usize = 32;
    pub const SIZE: usize = 48;
}

/// Rounds a length-prefixed value's length up to the 4-byte storage grid.
pub fn round_up_to_atom(len: usize) -> usize {
    len.div_ceil(ATOM) * ATOM
}
