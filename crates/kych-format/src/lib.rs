//! # kych-format: Binary container parsing for the legacy keychain database
//!
//! The `.keychain` container is a big-endian, offset-addressed database:
//!
//! ```text
//! [file header]["kych", version, headerSize, schemaOffset, authOffset]
//! [schema]     [schemaSize, tableCount][tableOffset; tableCount]
//! [table]*     [table header][recordOffset; ...][records]
//! ```
//!
//! Table offsets are relative to the end of the file header; record offsets
//! are relative to their table's base; column offsets inside a record are
//! relative to the record's base and carry a flag in their low bit.
//!
//! Everything here is a pure function over a fully buffered [`Image`].
//! Structural problems (truncation, wrong signature) are [`FormatError`]s;
//! per-record and per-field problems degrade to empty values so that as much
//! of a damaged database as possible can still be read.

mod blob;
mod container;
mod image;
pub mod layout;
mod record;

pub use blob::{DbBlob, EncryptedKeyBlob, SsgpBlob, UnlockBlob};
pub use container::{
    Header, Schema, Table, TableDirectory, TableHeader, parse_header, parse_schema, parse_table,
};
pub use image::{Image, View, cstr};
pub use record::{
    RawKeyBlob, appleshare, certificate, generic_password, internet_password, key, key_blob,
};

/// Errors for structural problems in the container.
///
/// Only the outer shell of the file can produce these; once the table
/// directory is built, damage is reported through empty values instead.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("keychain image is truncated (needed {needed} bytes at offset {offset})")]
    Truncated { offset: usize, needed: usize },

    #[error("not a keychain file: signature {found:02x?} != \"kych\"")]
    BadSignature { found: [u8; 4] },
}
