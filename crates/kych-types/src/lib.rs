//! # kych-types: Core types for `kych`
//!
//! Shared types used across the keychain reader:
//! - Table identity ([`RecordClass`], the CSSM record-type constants)
//! - Small wire values ([`FourCc`], [`KeyTag`])
//! - Secret material ([`SecretBytes`], zeroed on drop)
//! - Emitted records ([`GenericPasswordRecord`], [`InternetPasswordRecord`],
//!   [`AppleShareRecord`], [`CertificateRecord`], [`KeyRecord`])
//! - Non-fatal diagnostics ([`TableNotice`])

use std::fmt::{self, Debug, Display};

use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Record classes (CSSM record-type constants)
// ============================================================================

/// The purpose of a table inside the keychain database, identified by its
/// CSSM record-type constant.
///
/// The application-defined range (`0x8000_0000..`) carries the password and
/// certificate tables; key tables live in the low standard range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecordClass {
    /// Database metadata table; its record area holds the DB blob.
    Metadata,
    GenericPassword,
    InternetPassword,
    AppleSharePassword,
    X509Certificate,
    PublicKey,
    PrivateKey,
    SymmetricKey,
    /// Any table id this reader does not act on (schema tables, CRLs, ...).
    Other(u32),
}

impl RecordClass {
    pub const METADATA: u32 = 0x8000_8000;
    pub const GENERIC_PASSWORD: u32 = 0x8000_0000;
    pub const INTERNET_PASSWORD: u32 = 0x8000_0001;
    pub const APPLESHARE_PASSWORD: u32 = 0x8000_0002;
    pub const X509_CERTIFICATE: u32 = 0x8000_1000;
    pub const PUBLIC_KEY: u32 = 0x0000_000F;
    pub const PRIVATE_KEY: u32 = 0x0000_0010;
    pub const SYMMETRIC_KEY: u32 = 0x0000_0011;

    /// Maps a table id from the schema directory to its class.
    pub fn from_id(id: u32) -> Self {
        match id {
            Self::METADATA => RecordClass::Metadata,
            Self::GENERIC_PASSWORD => RecordClass::GenericPassword,
            Self::INTERNET_PASSWORD => RecordClass::InternetPassword,
            Self::APPLESHARE_PASSWORD => RecordClass::AppleSharePassword,
            Self::X509_CERTIFICATE => RecordClass::X509Certificate,
            Self::PUBLIC_KEY => RecordClass::PublicKey,
            Self::PRIVATE_KEY => RecordClass::PrivateKey,
            Self::SYMMETRIC_KEY => RecordClass::SymmetricKey,
            other => RecordClass::Other(other),
        }
    }

    /// The CSSM record-type constant for this class.
    pub fn id(self) -> u32 {
        match self {
            RecordClass::Metadata => Self::METADATA,
            RecordClass::GenericPassword => Self::GENERIC_PASSWORD,
            RecordClass::InternetPassword => Self::INTERNET_PASSWORD,
            RecordClass::AppleSharePassword => Self::APPLESHARE_PASSWORD,
            RecordClass::X509Certificate => Self::X509_CERTIFICATE,
            RecordClass::PublicKey => Self::PUBLIC_KEY,
            RecordClass::PrivateKey => Self::PRIVATE_KEY,
            RecordClass::SymmetricKey => Self::SYMMETRIC_KEY,
            RecordClass::Other(id) => id,
        }
    }
}

impl Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::Metadata => write!(f, "metadata"),
            RecordClass::GenericPassword => write!(f, "generic password"),
            RecordClass::InternetPassword => write!(f, "internet password"),
            RecordClass::AppleSharePassword => write!(f, "appleshare password"),
            RecordClass::X509Certificate => write!(f, "X.509 certificate"),
            RecordClass::PublicKey => write!(f, "public key"),
            RecordClass::PrivateKey => write!(f, "private key"),
            RecordClass::SymmetricKey => write!(f, "symmetric key"),
            RecordClass::Other(id) => write!(f, "record type {id:#010x}"),
        }
    }
}

// ============================================================================
// Small wire values
// ============================================================================

/// A four-character code column value (`Creator`, `Type`, `Protocol`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FourCc(pub [u8; 4]);

impl Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            for b in self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(
                f,
                "{:02x}{:02x}{:02x}{:02x}",
                self.0[0], self.0[1], self.0[2], self.0[3]
            )
        }
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

/// The 20-byte tag joining an encrypted item payload to its wrapped content
/// key in the symmetric-key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KeyTag(pub [u8; 20]);

impl Display for KeyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for KeyTag {
    fn from(value: [u8; 20]) -> Self {
        Self(value)
    }
}

// ============================================================================
// Secret material
// ============================================================================

/// Decrypted secret bytes (a password, an unwrapped key, a key label).
///
/// Zeroed on drop. `Debug` prints only the length; serialization renders the
/// bytes as lowercase hex so dumps stay line-oriented.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for SecretBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for SecretBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = String::with_capacity(self.0.len() * 2);
        for b in &self.0 {
            out.push_str(&format!("{b:02x}"));
        }
        serializer.serialize_str(&out)
    }
}

// ============================================================================
// Emitted records
// ============================================================================

/// A decrypted generic-password item.
///
/// String-like columns keep their raw bytes (length-prefixed values are
/// returned 4-byte padded, as stored); absent columns are empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenericPasswordRecord {
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub description: Bytes,
    pub creator: Option<FourCc>,
    pub type_code: Option<FourCc>,
    pub print_name: Bytes,
    pub alias: Bytes,
    pub account: Bytes,
    pub service: Bytes,
    /// Opaque encrypted payload area (SSGP), empty when the item carries none.
    #[serde(skip)]
    pub ssgp: Bytes,
    /// Decrypted password; `None` when no content key matched or the
    /// payload failed to decrypt.
    pub password: Option<SecretBytes>,
}

/// A decrypted internet-password item.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InternetPasswordRecord {
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub description: Bytes,
    pub comment: Bytes,
    pub creator: Option<FourCc>,
    pub type_code: Option<FourCc>,
    pub print_name: Bytes,
    pub alias: Bytes,
    pub protected: Bytes,
    pub account: Bytes,
    pub security_domain: Bytes,
    pub server: Bytes,
    pub protocol: Option<FourCc>,
    pub auth_type: Bytes,
    pub port: u32,
    pub path: Bytes,
    #[serde(skip)]
    pub ssgp: Bytes,
    pub password: Option<SecretBytes>,
}

/// A decrypted AppleShare-password item (not written by modern macOS).
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppleShareRecord {
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub description: Bytes,
    pub comment: Bytes,
    pub creator: Option<FourCc>,
    pub type_code: Option<FourCc>,
    pub print_name: Bytes,
    pub alias: Bytes,
    pub protected: Bytes,
    pub account: Bytes,
    pub volume: Bytes,
    pub server: Bytes,
    pub protocol: Option<FourCc>,
    pub address: Bytes,
    pub signature: Bytes,
    #[serde(skip)]
    pub ssgp: Bytes,
    pub password: Option<SecretBytes>,
}

/// An X.509 certificate item; `certificate` is the DER image as stored.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CertificateRecord {
    pub cert_type: u32,
    pub cert_encoding: u32,
    pub print_name: Bytes,
    pub alias: Bytes,
    pub subject: Bytes,
    pub issuer: Bytes,
    pub serial_number: Bytes,
    pub subject_key_identifier: Bytes,
    pub public_key_hash: Bytes,
    pub certificate: Bytes,
}

/// A key item from the public- or private-key table.
///
/// For public keys `key_blob` is the stored key material itself; for private
/// keys it is ciphertext and the orchestrator fills `unwrapped_label` /
/// `key_material` after the two-stage unwrap.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KeyRecord {
    pub print_name: Bytes,
    pub label: Bytes,
    pub key_class: u32,
    pub private: u32,
    pub key_type: u32,
    pub key_size_bits: u32,
    pub effective_key_size: u32,
    pub extractable: u32,
    /// Creator module id, NUL-trimmed.
    pub creator_module: String,
    #[serde(skip)]
    pub blob_iv: Option<[u8; 8]>,
    #[serde(skip)]
    pub key_blob: Bytes,
    pub unwrapped_label: Option<SecretBytes>,
    pub key_material: Option<SecretBytes>,
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Emitted when a table the reader expects to iterate is absent from the
/// schema directory. Non-fatal: the dump continues without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableNotice {
    pub class: RecordClass,
}

impl Display for TableNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} table is not available", self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(RecordClass::METADATA, RecordClass::Metadata; "metadata")]
    #[test_case(RecordClass::GENERIC_PASSWORD, RecordClass::GenericPassword; "generic")]
    #[test_case(RecordClass::INTERNET_PASSWORD, RecordClass::InternetPassword; "internet")]
    #[test_case(RecordClass::APPLESHARE_PASSWORD, RecordClass::AppleSharePassword; "appleshare")]
    #[test_case(RecordClass::X509_CERTIFICATE, RecordClass::X509Certificate; "certificate")]
    #[test_case(RecordClass::PUBLIC_KEY, RecordClass::PublicKey; "public key")]
    #[test_case(RecordClass::PRIVATE_KEY, RecordClass::PrivateKey; "private key")]
    #[test_case(RecordClass::SYMMETRIC_KEY, RecordClass::SymmetricKey; "symmetric key")]
    fn record_class_id_roundtrip(id: u32, class: RecordClass) {
        assert_eq!(RecordClass::from_id(id), class);
        assert_eq!(class.id(), id);
    }

    #[test]
    fn unknown_record_class_is_preserved() {
        let class = RecordClass::from_id(0x8000_0300);
        assert_eq!(class, RecordClass::Other(0x8000_0300));
        assert_eq!(class.id(), 0x8000_0300);
    }

    #[test]
    fn fourcc_displays_printable_codes_as_text() {
        assert_eq!(FourCc(*b"htps").to_string(), "htps");
        assert_eq!(FourCc(*b"ftp ").to_string(), "ftp ");
        assert_eq!(FourCc([0x01, 0x02, 0x03, 0x04]).to_string(), "01020304");
    }

    #[test]
    fn key_tag_displays_as_hex() {
        let tag = KeyTag([0xAB; 20]);
        assert_eq!(tag.to_string(), "ab".repeat(20));
    }

    #[test]
    fn secret_bytes_debug_hides_contents() {
        let secret = SecretBytes::from(b"hunter2".as_slice());
        assert_eq!(format!("{secret:?}"), "SecretBytes(7 bytes)");
    }

    #[test]
    fn secret_bytes_serializes_as_hex() {
        let secret = SecretBytes::from(vec![0xDE, 0xAD]);
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"dead\"");
    }

    #[test]
    fn table_notice_display() {
        let notice = TableNotice {
            class: RecordClass::GenericPassword,
        };
        assert_eq!(notice.to_string(), "generic password table is not available");
    }
}
